//! Active network configuration with transactional replacement

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{Mutex, RwLock};

use osd_network_core::{NetworkConfig, Result};
use osd_network_validate::NetworkValidator;

use crate::applier::NetworkApplier;
use crate::cancel::Cancellation;
use crate::converge::QuorumPolicy;

static TRANSACTION_SEQ: AtomicU64 = AtomicU64::new(0);

/// Record of one attempt to change the active configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique transaction ID
    pub id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub state: TransactionState,
    /// Error that ended the transaction, if any
    pub error: Option<String>,
}

/// Transaction states
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TransactionState {
    /// New configuration is being applied
    Applying,
    /// New configuration applied and made active
    Committed,
    /// Apply failed and the previous configuration was re-applied
    RolledBack,
    /// Apply failed and the host was left as the failed attempt put it
    Failed,
}

impl Transaction {
    fn begin() -> Self {
        let started_at = Utc::now();
        let seq = TRANSACTION_SEQ.fetch_add(1, Ordering::Relaxed);
        Self {
            id: format!("txn_{}_{}", started_at.timestamp_millis(), seq),
            started_at,
            finished_at: None,
            state: TransactionState::Applying,
            error: None,
        }
    }

    fn finish(&mut self, state: TransactionState, error: Option<String>) {
        self.state = state;
        self.error = error;
        self.finished_at = Some(Utc::now());
    }
}

/// Owner of the active network configuration.
///
/// Writers are serialized; a new configuration only becomes active once it
/// has been applied successfully.
pub struct NetworkState {
    applier: Arc<NetworkApplier>,
    validator: NetworkValidator,
    active: RwLock<Option<Arc<NetworkConfig>>>,
    last_transaction: RwLock<Option<Transaction>>,
    write_lock: Mutex<()>,
    rollback_on_failure: bool,
}

impl NetworkState {
    pub fn new(applier: Arc<NetworkApplier>) -> Self {
        Self {
            applier,
            validator: NetworkValidator::new(),
            active: RwLock::new(None),
            last_transaction: RwLock::new(None),
            write_lock: Mutex::new(()),
            rollback_on_failure: true,
        }
    }

    /// Re-apply the previous configuration when an apply fails.
    pub fn with_rollback_on_failure(mut self, rollback_on_failure: bool) -> Self {
        self.rollback_on_failure = rollback_on_failure;
        self
    }

    pub fn applier(&self) -> &Arc<NetworkApplier> {
        &self.applier
    }

    /// Snapshot of the active configuration.
    pub async fn active(&self) -> Option<Arc<NetworkConfig>> {
        self.active.read().await.clone()
    }

    pub async fn last_transaction(&self) -> Option<Transaction> {
        self.last_transaction.read().await.clone()
    }

    /// Replace the active configuration.
    ///
    /// Once a configuration is active the host is live and only one routable
    /// device per category is required; before that the seed probe decides.
    pub async fn replace(
        &self,
        config: NetworkConfig,
        timeout: Duration,
        cancel: &Cancellation,
    ) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let policy = self.update_policy().await;
        self.commit(config, timeout, policy, cancel).await
    }

    pub async fn replace_with_policy(
        &self,
        config: NetworkConfig,
        timeout: Duration,
        policy: QuorumPolicy,
        cancel: &Cancellation,
    ) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.commit(config, timeout, policy, cancel).await
    }

    /// Merge `patch` onto the active configuration and apply the result.
    /// With nothing active yet the patch is taken as a full configuration.
    pub async fn patch(&self, patch: &Value, timeout: Duration, cancel: &Cancellation) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let config = match self.active().await {
            Some(current) => current.merge_patch(patch)?,
            None => serde_json::from_value(patch.clone())?,
        };

        let policy = self.update_policy().await;
        self.commit(config, timeout, policy, cancel).await
    }

    /// Policy for an update that does not name one explicitly.
    async fn update_policy(&self) -> QuorumPolicy {
        if self.active.read().await.is_some() {
            QuorumPolicy::Any
        } else {
            self.applier.default_policy()
        }
    }

    /// Validate, apply and activate `config`. Caller holds the write lock.
    async fn commit(
        &self,
        config: NetworkConfig,
        timeout: Duration,
        policy: QuorumPolicy,
        cancel: &Cancellation,
    ) -> Result<()> {
        self.validator.validate(&config)?;

        let mut transaction = Transaction::begin();
        info!("Starting network transaction {}", transaction.id);
        *self.last_transaction.write().await = Some(transaction.clone());

        let result = self
            .applier
            .apply_with_policy(&config, timeout, policy, cancel)
            .await;

        match result {
            Ok(()) => {
                *self.active.write().await = Some(Arc::new(config));
                transaction.finish(TransactionState::Committed, None);
                info!("Committed network transaction {}", transaction.id);
            }
            Err(ref e) => {
                error!("Network transaction {} failed: {}", transaction.id, e);
                let state = self.roll_back(&transaction, timeout, cancel).await;
                transaction.finish(state, Some(e.to_string()));
            }
        }

        *self.last_transaction.write().await = Some(transaction);
        result
    }

    async fn roll_back(
        &self,
        transaction: &Transaction,
        timeout: Duration,
        cancel: &Cancellation,
    ) -> TransactionState {
        if !self.rollback_on_failure {
            return TransactionState::Failed;
        }
        let Some(previous) = self.active().await else {
            return TransactionState::Failed;
        };

        warn!(
            "Re-applying previous network configuration after transaction {}",
            transaction.id
        );
        match self
            .applier
            .apply_with_policy(&previous, timeout, QuorumPolicy::Any, cancel)
            .await
        {
            Ok(()) => TransactionState::RolledBack,
            Err(e) => {
                error!("Rollback of transaction {} failed: {}", transaction.id, e);
                TransactionState::Failed
            }
        }
    }
}

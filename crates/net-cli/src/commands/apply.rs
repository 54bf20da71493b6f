//! Apply command

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use osd_network_apply::{Cancellation, NetworkApplier, QuorumPolicy};
use osd_network_validate::NetworkValidator;

use super::read_config;

pub struct ApplyCommand {
    applier: Arc<NetworkApplier>,
    validator: NetworkValidator,
}

impl ApplyCommand {
    pub fn new(applier: Arc<NetworkApplier>) -> Self {
        Self {
            applier,
            validator: NetworkValidator::new(),
        }
    }

    /// Apply the configuration at `config_path`. Without an explicit
    /// `policy` the seed probe decides.
    pub async fn execute(
        &self,
        config_path: &Path,
        timeout: Duration,
        policy: Option<QuorumPolicy>,
        cancel: &Cancellation,
    ) -> Result<()> {
        println!("Applying network configuration: {}", config_path.display());

        let config = read_config(config_path)?;
        self.validator
            .validate(&config)
            .with_context(|| "Configuration validation failed")?;
        println!("✓ Configuration validation passed");

        let policy = policy.unwrap_or_else(|| self.applier.default_policy());
        self.applier
            .apply_with_policy(&config, timeout, policy, cancel)
            .await
            .with_context(|| "Failed to apply network configuration")?;

        println!("✓ Network configuration applied");
        Ok(())
    }
}

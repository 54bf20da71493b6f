//! Waiting for configured devices to become routable

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use osd_network_core::{NetworkConfig, NetworkError, Result};

use crate::cancel::Cancellation;
use crate::system::LinkStateProbe;

/// How many devices of each category must be routable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuorumPolicy {
    /// Every device of every non-empty category
    All,
    /// At least one device of every non-empty category
    Any,
}

/// Outcome of one polling cycle
#[derive(Debug, Default)]
struct CycleReport {
    converged: bool,
    pending: Vec<String>,
}

/// Polls device state until a configuration has converged.
pub struct ConvergenceWaiter {
    probe: Arc<dyn LinkStateProbe>,
    poll_interval: Duration,
}

impl ConvergenceWaiter {
    pub fn new(probe: Arc<dyn LinkStateProbe>) -> Self {
        Self {
            probe,
            poll_interval: Duration::from_millis(500),
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Devices polled for each category: interface bridges, bond bridges
    /// and VLAN devices.
    pub fn device_categories(config: &NetworkConfig) -> [Vec<String>; 3] {
        [
            config.interfaces.iter().map(|i| i.name.clone()).collect(),
            config.bonds.iter().map(|b| b.name.clone()).collect(),
            config.vlans.iter().map(|v| v.device_name()).collect(),
        ]
    }

    /// Wait until `config` satisfies `policy`, failing after `timeout`.
    pub async fn wait(
        &self,
        config: &NetworkConfig,
        timeout: Duration,
        policy: QuorumPolicy,
        cancel: &Cancellation,
    ) -> Result<()> {
        let categories = Self::device_categories(config);
        let deadline = Instant::now() + timeout;
        let mut pending: Vec<String> = categories.iter().flatten().cloned().collect();

        info!(
            "Waiting up to {:?} for {} devices to become routable ({:?})",
            timeout,
            pending.len(),
            policy
        );

        loop {
            if cancel.is_cancelled() {
                return Err(NetworkError::Cancelled);
            }
            if Instant::now() >= deadline {
                return Err(NetworkError::ConvergenceTimeout { timeout, pending });
            }

            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {}
                _ = cancel.cancelled() => return Err(NetworkError::Cancelled),
            }

            let report = self.poll_cycle(&categories, policy, cancel).await?;
            if report.converged {
                info!("Network converged");
                return Ok(());
            }

            debug!("Still waiting for: {}", report.pending.join(", "));
            pending = report.pending;
        }
    }

    async fn poll_cycle(
        &self,
        categories: &[Vec<String>],
        policy: QuorumPolicy,
        cancel: &Cancellation,
    ) -> Result<CycleReport> {
        let mut report = CycleReport {
            converged: true,
            pending: Vec::new(),
        };

        for devices in categories.iter().filter(|d| !d.is_empty()) {
            let mut all_routable = true;
            let mut any_routable = false;

            for device in devices {
                if cancel.is_cancelled() {
                    return Err(NetworkError::Cancelled);
                }

                let routable = self.probe.is_routable(device).await;
                if !routable {
                    report.pending.push(device.clone());
                }
                all_routable &= routable;
                any_routable |= routable;
            }

            let satisfied = match policy {
                QuorumPolicy::All => all_routable,
                QuorumPolicy::Any => any_routable,
            };
            report.converged &= satisfied;
        }

        Ok(report)
    }
}

//! Wait command

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use osd_network_apply::{Cancellation, ConvergenceWaiter, QuorumPolicy};

use super::read_config;

pub struct WaitCommand {
    waiter: ConvergenceWaiter,
}

impl WaitCommand {
    pub fn new(waiter: ConvergenceWaiter) -> Self {
        Self { waiter }
    }

    /// Block until the devices of `config_path` are routable under `policy`.
    pub async fn execute(
        &self,
        config_path: &Path,
        timeout: Duration,
        policy: QuorumPolicy,
        cancel: &Cancellation,
    ) -> Result<()> {
        let config = read_config(config_path)?;

        self.waiter
            .wait(&config, timeout, policy, cancel)
            .await
            .with_context(|| "Network did not come up")?;

        println!("✓ Network is up");
        Ok(())
    }
}

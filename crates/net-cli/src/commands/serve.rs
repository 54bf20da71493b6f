//! Serve command
//!
//! Brings up the boot network configuration, starts the boot units and then
//! serves the REST API until interrupted.

use std::sync::Arc;

use anyhow::{Context, Result};
use log::info;
use osd_network_api::{app, AppContext};
use osd_network_apply::{cancellation, Cancellation, NetworkState, QuorumPolicy};

use super::read_config;
use crate::settings::DaemonSettings;

pub struct ServeCommand {
    settings: DaemonSettings,
    state: Arc<NetworkState>,
}

impl ServeCommand {
    pub fn new(settings: DaemonSettings, state: Arc<NetworkState>) -> Self {
        Self { settings, state }
    }

    /// Apply the network seed, if any, and enable the boot units.
    ///
    /// A seeded configuration must bring up every device before the units
    /// are started.
    pub async fn boot(&self, cancel: &Cancellation) -> Result<()> {
        let seed = &self.settings.network_seed_file;

        if seed.exists() {
            info!("Applying network seed {}", seed.display());
            let config = read_config(seed)?;
            self.state
                .replace_with_policy(
                    config,
                    self.settings.boot_apply_timeout(),
                    QuorumPolicy::All,
                    cancel,
                )
                .await
                .with_context(|| format!("Failed to apply network seed {}", seed.display()))?;
        } else {
            info!("No network seed at {}", seed.display());
        }

        let units = &self.settings.boot_units;
        if !units.is_empty() {
            info!("Starting {}", units.join(", "));
            self.state
                .applier()
                .services()
                .enable(units, true)
                .await
                .with_context(|| "Failed to start boot units")?;
        }

        Ok(())
    }

    pub async fn execute(&self) -> Result<()> {
        let (handle, cancel) = cancellation();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Shutting down");
                handle.cancel();
            }
        });

        self.boot(&cancel).await?;

        let context = AppContext::new(Arc::clone(&self.state))
            .with_apply_timeout(self.settings.api_apply_timeout())
            .with_shutdown(cancel.clone());

        let address = &self.settings.listen_address;
        let listener = tokio::net::TcpListener::bind(address)
            .await
            .with_context(|| format!("Failed to listen on {}", address))?;
        info!("Listening on {}", address);

        axum::serve(listener, app(Arc::new(context)))
            .with_graceful_shutdown(async move { cancel.cancelled().await })
            .await
            .with_context(|| "API server failed")?;

        Ok(())
    }
}

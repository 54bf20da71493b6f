//! CLI commands

pub mod apply;
pub mod render;
pub mod serve;
pub mod validate;
pub mod wait;

pub use apply::ApplyCommand;
pub use render::RenderCommand;
pub use serve::ServeCommand;
pub use validate::ValidateCommand;
pub use wait::WaitCommand;

use std::path::Path;

use anyhow::{Context, Result};
use osd_network_apply::{cancellation, Cancellation};
use osd_network_core::NetworkConfig;

/// Read a JSON network configuration document.
pub fn read_config(path: &Path) -> Result<NetworkConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;

    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse network configuration: {}", path.display()))
}

/// Cancellation fired by Ctrl-C.
pub fn interrupt_cancellation() -> Cancellation {
    let (handle, cancel) = cancellation();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Interrupted, cancelling");
            handle.cancel();
        }
    });
    cancel
}

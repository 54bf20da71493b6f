use std::sync::Arc;
use std::time::Duration;

use osd_network_apply::{Cancellation, NetworkState};

/// Default time a request waits for the network to converge
pub const DEFAULT_APPLY_TIMEOUT: Duration = Duration::from_secs(10);

/// Shared state handed to every request handler
#[derive(Clone)]
pub struct AppContext {
    pub network_state: Arc<NetworkState>,
    pub apply_timeout: Duration,
    /// Fired when the daemon shuts down
    pub shutdown: Cancellation,
}

impl AppContext {
    pub fn new(network_state: Arc<NetworkState>) -> Self {
        Self {
            network_state,
            apply_timeout: DEFAULT_APPLY_TIMEOUT,
            shutdown: Cancellation::never(),
        }
    }

    pub fn with_apply_timeout(mut self, apply_timeout: Duration) -> Self {
        self.apply_timeout = apply_timeout;
        self
    }

    pub fn with_shutdown(mut self, shutdown: Cancellation) -> Self {
        self.shutdown = shutdown;
        self
    }
}

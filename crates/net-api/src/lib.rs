//! OSD Network API
//!
//! REST endpoints for reading and changing the host network configuration

pub mod context;
pub mod network;
pub mod response;


use std::sync::Arc;

use axum::Router;
use tower_http::trace::TraceLayer;

pub use context::AppContext;
pub use network::NetworkAPI;
pub use response::{ApiError, SyncResponse};

/// Complete application router with request tracing.
pub fn app(context: Arc<AppContext>) -> Router {
    Router::new()
        .merge(NetworkAPI::router())
        .layer(TraceLayer::new_for_http())
        .with_state(context)
}

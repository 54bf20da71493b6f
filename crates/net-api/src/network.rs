//! Network configuration endpoint

use std::future::Future;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::routing::get;
use axum::Router;
use log::{error, info, warn};
use serde_json::Value;

use osd_network_core::{NetworkConfig, NetworkError};

use crate::context::AppContext;
use crate::response::{ApiError, SyncResponse};

pub const NETWORK_PATH: &str = "/1.0/system/network";

/// Handlers for `/1.0/system/network`
pub struct NetworkAPI;

impl NetworkAPI {
    pub fn router() -> Router<Arc<AppContext>> {
        Router::new().route(
            NETWORK_PATH,
            get(get_network)
                .put(put_network)
                .patch(patch_network)
                .fallback(unsupported_method),
        )
    }
}

async fn get_network(State(ctx): State<Arc<AppContext>>) -> Result<SyncResponse, ApiError> {
    let metadata = match ctx.network_state.active().await {
        Some(config) => serde_json::to_value(config.as_ref()).map_err(NetworkError::from)?,
        None => Value::Null,
    };
    Ok(SyncResponse::new(metadata))
}

async fn put_network(
    State(ctx): State<Arc<AppContext>>,
    body: Bytes,
) -> Result<SyncResponse, ApiError> {
    let config: NetworkConfig = serde_json::from_slice(&body).map_err(NetworkError::from)?;

    info!("Replacing network configuration");
    let state = Arc::clone(&ctx.network_state);
    let (timeout, shutdown) = (ctx.apply_timeout, ctx.shutdown.clone());
    run_detached(async move { state.replace(config, timeout, &shutdown).await }).await?;

    Ok(SyncResponse::empty())
}

async fn patch_network(
    State(ctx): State<Arc<AppContext>>,
    body: Bytes,
) -> Result<SyncResponse, ApiError> {
    let patch: Value = serde_json::from_slice(&body).map_err(NetworkError::from)?;

    info!("Updating network configuration");
    let state = Arc::clone(&ctx.network_state);
    let (timeout, shutdown) = (ctx.apply_timeout, ctx.shutdown.clone());
    run_detached(async move { state.patch(&patch, timeout, &shutdown).await }).await?;

    Ok(SyncResponse::empty())
}

/// Run a change on its own task so it commits or rolls back even when the
/// client goes away.
async fn run_detached<F>(change: F) -> Result<(), ApiError>
where
    F: Future<Output = osd_network_core::Result<()>> + Send + 'static,
{
    match tokio::spawn(change).await {
        Ok(result) => result.map_err(log_failure),
        Err(e) => {
            error!("Network configuration task aborted: {}", e);
            Err(ApiError::internal(e))
        }
    }
}

async fn unsupported_method() -> ApiError {
    ApiError::not_implemented()
}

fn log_failure(err: NetworkError) -> ApiError {
    warn!("Network configuration request failed: {}", err);
    err.into()
}

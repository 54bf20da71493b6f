//! Response envelopes
//!
//! Successful calls answer with a `sync` envelope carrying the result in
//! `metadata`; failures answer with an `error` envelope.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;
use serde_json::{json, Value};

use osd_network_core::NetworkError;

/// Successful response envelope
#[derive(Debug, Serialize)]
pub struct SyncResponse {
    #[serde(rename = "type")]
    pub response_type: &'static str,
    pub status: &'static str,
    pub status_code: u16,
    pub metadata: Value,
}

impl SyncResponse {
    pub fn new(metadata: Value) -> Self {
        Self {
            response_type: "sync",
            status: "Success",
            status_code: StatusCode::OK.as_u16(),
            metadata,
        }
    }

    /// Success without a payload
    pub fn empty() -> Self {
        Self::new(json!({}))
    }
}

impl IntoResponse for SyncResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Error response envelope
#[derive(Debug, Serialize)]
struct ErrorBody {
    #[serde(rename = "type")]
    response_type: &'static str,
    error: String,
    error_code: u16,
}

/// Failure reported to the client
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl ToString) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.to_string(),
        }
    }

    pub fn internal(message: impl ToString) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.to_string(),
        }
    }

    pub fn not_implemented() -> Self {
        Self {
            status: StatusCode::NOT_IMPLEMENTED,
            message: "not implemented".to_string(),
        }
    }
}

/// Every failure to change the network is the client's to resolve.
impl From<NetworkError> for ApiError {
    fn from(err: NetworkError) -> Self {
        ApiError::bad_request(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            response_type: "error",
            error: self.message,
            error_code: self.status.as_u16(),
        };
        (self.status, Json(body)).into_response()
    }
}

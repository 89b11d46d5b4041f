//! Error taxonomy and the structured error envelope.
//!
//! Every failure a request can hit is one [`GatewayError`] variant. The
//! variant decides the `kind` string and the local HTTP status; rendering
//! always goes through [`ErrorEnvelope`] so clients see one JSON shape.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Service name stamped on every error envelope.
pub const SERVICE_NAME: &str = "deposit-gateway";

/// Errors that can occur while serving one request.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Required path parameter missing or malformed.
    #[error("binding error: {0}")]
    Binding(String),

    /// Outbound call could not be completed (DNS, refused, timeout).
    #[error("transport error: {0}")]
    Transport(String),

    /// Inbound or outbound body could not be fully read.
    #[error("read error: {0}")]
    Read(String),

    /// JSON could not be parsed into the expected shape.
    #[error("decode error: {0}")]
    Decode(#[source] serde_json::Error),

    /// Local data could not be serialized back to JSON.
    #[error("marshal error: {0}")]
    Marshal(#[source] serde_json::Error),

    /// The upstream envelope reported a non-200 status.
    #[error("upstream reported status {status}: {body}")]
    Upstream { status: String, body: String },

    /// Missing or incorrect local bearer key.
    #[error("unauthorized")]
    Unauthorized,
}

impl GatewayError {
    /// Stable machine-readable kind.
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::Binding(_) => "binding_error",
            GatewayError::Transport(_) => "transport_error",
            GatewayError::Read(_) => "read_error",
            GatewayError::Decode(_) => "decode_error",
            GatewayError::Marshal(_) => "marshal_error",
            GatewayError::Upstream { .. } => "upstream_error",
            GatewayError::Unauthorized => "unauthorized",
        }
    }

    /// Local HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::Unauthorized => StatusCode::UNAUTHORIZED,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    /// Build the envelope written to the client.
    pub fn envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            service: SERVICE_NAME,
            status: self.status().as_u16(),
            kind: self.kind(),
            error: self.to_string(),
        }
    }
}

/// Uniform JSON body for every failure response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorEnvelope {
    pub service: &'static str,
    pub status: u16,
    pub kind: &'static str,
    pub error: String,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        crate::observability::metrics::record_error(self.kind());
        (self.status(), Json(self.envelope())).into_response()
    }
}

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

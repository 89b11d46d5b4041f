//! Response normalization.
//!
//! The upstream is inconsistent about what it returns, so each operation gets
//! its own contract:
//!
//! ```text
//! fetch (no id)      → decode array of objects  → JSON, upstream status
//! fetch (id)         → decode one object        → JSON, upstream status
//! create             → CreateReply::classify
//!                        Envelope(200)          → JSON, 200
//!                        Envelope(other)        → upstream_error, 400
//!                        Passthrough            → raw bytes, 200
//! update/upload/
//! publish            → body as a JSON string    → upstream status
//! ```

use axum::{
    body::Bytes,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::{Map, Number, Value};

use crate::gateway::client::UpstreamResponse;
use crate::gateway::error::GatewayError;
use crate::gateway::translate::OperationKind;

const APPLICATION_JSON: &str = "application/json";

/// What the dispatcher writes back for one request.
#[derive(Debug)]
pub enum NormalizedResponse {
    /// Upstream bytes forwarded untouched.
    Raw {
        status: StatusCode,
        content_type: Option<String>,
        body: Bytes,
    },
    /// Serialized JSON produced by the gateway.
    Json { status: StatusCode, body: Vec<u8> },
    /// Structured error envelope.
    Error(GatewayError),
}

impl NormalizedResponse {
    pub fn status(&self) -> StatusCode {
        match self {
            NormalizedResponse::Raw { status, .. } | NormalizedResponse::Json { status, .. } => *status,
            NormalizedResponse::Error(e) => e.status(),
        }
    }

    fn json<T: serde::Serialize + ?Sized>(status: StatusCode, value: &T) -> Result<Self, GatewayError> {
        let body = serde_json::to_vec(value).map_err(GatewayError::Marshal)?;
        Ok(NormalizedResponse::Json { status, body })
    }
}

impl From<GatewayError> for NormalizedResponse {
    fn from(err: GatewayError) -> Self {
        NormalizedResponse::Error(err)
    }
}

impl IntoResponse for NormalizedResponse {
    fn into_response(self) -> Response {
        match self {
            NormalizedResponse::Raw {
                status,
                content_type,
                body,
            } => {
                let content_type = content_type
                    .and_then(|ct| HeaderValue::from_str(&ct).ok())
                    .unwrap_or_else(|| HeaderValue::from_static(APPLICATION_JSON));
                (status, [(header::CONTENT_TYPE, content_type)], body).into_response()
            }
            NormalizedResponse::Json { status, body } => (
                status,
                [(header::CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON))],
                body,
            )
                .into_response(),
            NormalizedResponse::Error(e) => e.into_response(),
        }
    }
}

/// Shape of a create reply.
///
/// Presence of a numeric `status` key is checked explicitly, so an upstream
/// `"status": 0` is an envelope and never confused with a missing field.
/// Anything that is not a JSON object, including bytes that do not parse,
/// passes through.
#[derive(Debug, Clone, PartialEq)]
pub enum CreateReply {
    Envelope {
        status: Number,
        fields: Map<String, Value>,
    },
    Passthrough,
}

impl CreateReply {
    pub fn classify(body: &[u8]) -> Self {
        let Ok(Value::Object(fields)) = serde_json::from_slice::<Value>(body) else {
            return CreateReply::Passthrough;
        };
        let status = match fields.get("status") {
            Some(Value::Number(status)) => status.clone(),
            _ => return CreateReply::Passthrough,
        };
        CreateReply::Envelope { status, fields }
    }
}

/// Map an upstream reply onto the local contract for `kind`.
pub fn normalize(
    kind: OperationKind,
    has_reference: bool,
    response: UpstreamResponse,
) -> Result<NormalizedResponse, GatewayError> {
    match kind {
        OperationKind::Fetch if has_reference => decode_record(response),
        OperationKind::Fetch => decode_collection(response),
        OperationKind::Create => normalize_create(response),
        OperationKind::UpdateMetadata | OperationKind::UploadFile | OperationKind::Publish => {
            passthrough_as_string(response)
        }
    }
}

fn decode_collection(response: UpstreamResponse) -> Result<NormalizedResponse, GatewayError> {
    let records: Vec<Map<String, Value>> =
        serde_json::from_slice(&response.body).map_err(GatewayError::Decode)?;
    NormalizedResponse::json(response.status, &records)
}

fn decode_record(response: UpstreamResponse) -> Result<NormalizedResponse, GatewayError> {
    let record: Map<String, Value> = serde_json::from_slice(&response.body).map_err(GatewayError::Decode)?;
    NormalizedResponse::json(response.status, &record)
}

fn normalize_create(response: UpstreamResponse) -> Result<NormalizedResponse, GatewayError> {
    match CreateReply::classify(&response.body) {
        CreateReply::Envelope { status, fields } => {
            if status.as_u64() == Some(200) {
                NormalizedResponse::json(StatusCode::OK, &fields)
            } else {
                Err(GatewayError::Upstream {
                    status: status.to_string(),
                    body: String::from_utf8_lossy(&response.body).into_owned(),
                })
            }
        }
        CreateReply::Passthrough => Ok(NormalizedResponse::Raw {
            status: StatusCode::OK,
            content_type: response.content_type,
            body: response.body,
        }),
    }
}

fn passthrough_as_string(response: UpstreamResponse) -> Result<NormalizedResponse, GatewayError> {
    let text = String::from_utf8_lossy(&response.body);
    NormalizedResponse::json(response.status, &*text)
}

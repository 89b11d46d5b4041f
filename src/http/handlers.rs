//! Operation handlers.
//!
//! Each handler binds path parameters and the body into an
//! [`InboundRequest`] and hands it to the gateway. Binding failures that axum
//! reports as rejections are turned into `binding_error` / `read_error`
//! envelopes so every failure shares one JSON shape.

use axum::{
    body::Bytes,
    extract::{
        rejection::{BytesRejection, PathRejection},
        Path, State,
    },
    Json,
};
use serde::Serialize;

use crate::gateway::{
    DepositionReference, FileTarget, GatewayError, InboundRequest, NormalizedResponse, OperationKind,
};
use crate::http::server::AppState;

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub upstream: String,
}

/// `GET /status`
pub async fn status(State(state): State<AppState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        upstream: state.gateway.endpoint().base_url().to_string(),
    })
}

/// `GET /docs`
pub async fn list_depositions(State(state): State<AppState>) -> NormalizedResponse {
    state.gateway.dispatch(InboundRequest::new(OperationKind::Fetch)).await
}

/// `GET /docs/{id}`
pub async fn get_deposition(
    State(state): State<AppState>,
    id: Result<Path<u64>, PathRejection>,
) -> NormalizedResponse {
    let id = match bind_id(id) {
        Ok(id) => id,
        Err(e) => return reject(OperationKind::Fetch, e),
    };
    let inbound = InboundRequest::new(OperationKind::Fetch).with_deposition(id);
    state.gateway.dispatch(inbound).await
}

/// `POST /create`
pub async fn create_deposition(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> NormalizedResponse {
    let body = match bind_body(body) {
        Ok(body) => body,
        Err(e) => return reject(OperationKind::Create, e),
    };
    let inbound = InboundRequest::new(OperationKind::Create).with_body(body);
    state.gateway.dispatch(inbound).await
}

/// `PUT /update/{id}`
pub async fn update_metadata(
    State(state): State<AppState>,
    id: Result<Path<u64>, PathRejection>,
    body: Result<Bytes, BytesRejection>,
) -> NormalizedResponse {
    let kind = OperationKind::UpdateMetadata;
    let (id, body) = match (bind_id(id), bind_body(body)) {
        (Ok(id), Ok(body)) => (id, body),
        (Err(e), _) | (_, Err(e)) => return reject(kind, e),
    };
    let inbound = InboundRequest::new(kind).with_deposition(id).with_body(body);
    state.gateway.dispatch(inbound).await
}

/// `PUT /add/{bucket}/{file}`
pub async fn upload_file(
    State(state): State<AppState>,
    target: Result<Path<String>, PathRejection>,
    body: Result<Bytes, BytesRejection>,
) -> NormalizedResponse {
    let kind = OperationKind::UploadFile;
    let Path(tail) = match target {
        Ok(tail) => tail,
        Err(e) => return reject(kind, binding(e)),
    };
    let body = match bind_body(body) {
        Ok(body) => body,
        Err(e) => return reject(kind, e),
    };

    let (bucket, file_name) = FileTarget::split_tail(&tail);
    let inbound = InboundRequest::new(kind)
        .with_target(bucket.map(str::to_string), file_name.map(str::to_string))
        .with_body(body);
    state.gateway.dispatch(inbound).await
}

/// `POST /publish/{id}`
pub async fn publish_deposition(
    State(state): State<AppState>,
    id: Result<Path<u64>, PathRejection>,
) -> NormalizedResponse {
    let id = match bind_id(id) {
        Ok(id) => id,
        Err(e) => return reject(OperationKind::Publish, e),
    };
    let inbound = InboundRequest::new(OperationKind::Publish).with_deposition(id);
    state.gateway.dispatch(inbound).await
}

/// `PUT /add`, `PUT /update`, `POST /publish` without their path parameters.
///
/// Routed through the translator so the missing parameter is reported the
/// same way as an id of 0.
pub async fn upload_without_target(State(state): State<AppState>) -> NormalizedResponse {
    state.gateway.dispatch(InboundRequest::new(OperationKind::UploadFile)).await
}

pub async fn update_without_id(State(state): State<AppState>) -> NormalizedResponse {
    state.gateway.dispatch(InboundRequest::new(OperationKind::UpdateMetadata)).await
}

pub async fn publish_without_id(State(state): State<AppState>) -> NormalizedResponse {
    state.gateway.dispatch(InboundRequest::new(OperationKind::Publish)).await
}

fn bind_id(id: Result<Path<u64>, PathRejection>) -> Result<Option<DepositionReference>, GatewayError> {
    let Path(id) = id.map_err(binding)?;
    Ok(DepositionReference::new(id))
}

fn bind_body(body: Result<Bytes, BytesRejection>) -> Result<Bytes, GatewayError> {
    body.map_err(|e| GatewayError::Read(e.body_text()))
}

fn binding(rejection: PathRejection) -> GatewayError {
    GatewayError::Binding(rejection.body_text())
}

fn reject(kind: OperationKind, err: GatewayError) -> NormalizedResponse {
    tracing::warn!(operation = kind.as_str(), kind = err.kind(), error = %err, "Request rejected");
    crate::observability::metrics::record_request(kind.as_str(), err.kind());
    NormalizedResponse::Error(err)
}

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use subtle::ConstantTimeEq;

use crate::gateway::GatewayError;
use crate::http::server::AppState;

/// Require `Authorization: Bearer <api_key>` when a key is configured.
pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, GatewayError> {
    let Some(api_key) = state.api_key.as_ref() else {
        return Ok(next.run(request).await);
    };

    let presented = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    // Constant-time comparison
    let accepted = presented.is_some_and(|key| bool::from(key.as_bytes().ct_eq(api_key.expose().as_bytes())));
    if accepted {
        return Ok(next.run(request).await);
    }

    tracing::warn!(path = %request.uri().path(), "Rejected request with missing or wrong API key");
    Err(GatewayError::Unauthorized)
}

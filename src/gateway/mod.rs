//! Deposition gateway core.
//!
//! # Data Flow
//! ```text
//! InboundRequest (bound by http::handlers)
//!     → translate.rs (upstream URL, credential, body)
//!     → client.rs (read or write channel)
//!     → credential scrub of the reply body
//!     → normalize.rs (collection / record / envelope / passthrough)
//!     → NormalizedResponse (written once by axum)
//! ```
//!
//! # Design Decisions
//! - No state survives a request; the endpoint and clients are read-only
//! - Every failure becomes a `NormalizedResponse::Error` at the point it occurs
//! - The credential only ever exists inside the outbound URL's query

pub mod client;
pub mod error;
pub mod normalize;
pub mod params;
pub mod translate;

use std::time::Instant;

use crate::config::schema::UpstreamConfig;
use crate::observability::metrics;

pub use client::{UpstreamClients, UpstreamResponse};
pub use error::{ErrorEnvelope, GatewayError, GatewayResult};
pub use normalize::{normalize, CreateReply, NormalizedResponse};
pub use params::{DepositionReference, FileTarget};
pub use translate::{translate, InboundRequest, OperationKind, TrafficClass, UpstreamEndpoint, UpstreamRequest};

/// Errors raised while assembling a [`Gateway`].
#[derive(Debug, thiserror::Error)]
pub enum GatewayBuildError {
    #[error("invalid upstream base URL: {0}")]
    Endpoint(#[from] url::ParseError),

    #[error("failed to build upstream client: {0}")]
    Client(#[from] reqwest::Error),
}

/// The translate → execute → normalize pipeline shared by every handler.
#[derive(Debug, Clone)]
pub struct Gateway {
    endpoint: UpstreamEndpoint,
    clients: UpstreamClients,
    verbose: bool,
}

impl Gateway {
    pub fn new(endpoint: UpstreamEndpoint, clients: UpstreamClients, verbose: bool) -> Self {
        Self {
            endpoint,
            clients,
            verbose,
        }
    }

    pub fn from_config(config: &UpstreamConfig, verbose: bool) -> Result<Self, GatewayBuildError> {
        let endpoint = UpstreamEndpoint::from_config(config)?;
        let clients = UpstreamClients::new(config)?;
        Ok(Self::new(endpoint, clients, verbose))
    }

    pub fn endpoint(&self) -> &UpstreamEndpoint {
        &self.endpoint
    }

    /// Serve one inbound request. Always yields exactly one response.
    pub async fn dispatch(&self, inbound: InboundRequest) -> NormalizedResponse {
        let kind = inbound.kind;
        match self.exchange(inbound).await {
            Ok(response) => {
                metrics::record_request(kind.as_str(), "ok");
                response
            }
            Err(e) => {
                tracing::warn!(
                    operation = kind.as_str(),
                    kind = e.kind(),
                    error = %e,
                    "Request failed"
                );
                metrics::record_request(kind.as_str(), e.kind());
                NormalizedResponse::Error(e)
            }
        }
    }

    async fn exchange(&self, inbound: InboundRequest) -> GatewayResult<NormalizedResponse> {
        let kind = inbound.kind;
        let has_reference = inbound.deposition.is_some();

        let request = translate(&self.endpoint, &inbound)?;
        let class = request.class;
        if self.verbose {
            tracing::info!(operation = kind.as_str(), method = %request.method, url = %request.redacted_url(), "Upstream request");
        } else {
            tracing::debug!(operation = kind.as_str(), method = %request.method, url = %request.redacted_url(), "Upstream request");
        }

        let started = Instant::now();
        let mut response = self.clients.execute(request).await?;
        metrics::record_upstream(kind.as_str(), class.as_str(), started);

        response.body = self.endpoint.credential().scrub_bytes(response.body);
        if self.verbose {
            tracing::info!(
                operation = kind.as_str(),
                status = response.status.as_u16(),
                bytes = response.body.len(),
                body = %String::from_utf8_lossy(&response.body),
                "Upstream response"
            );
        } else {
            tracing::debug!(
                operation = kind.as_str(),
                status = response.status.as_u16(),
                bytes = response.body.len(),
                "Upstream response"
            );
        }

        normalize(kind, has_reference, response)
    }
}

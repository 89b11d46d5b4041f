//! Upstream HTTP client.
//!
//! # Responsibilities
//! - Hold one long-lived `reqwest::Client` per traffic class
//! - Apply per-call timeout and connection pool settings
//! - Return raw status, content type and body bytes
//! - Keep transport failures distinct from upstream-reported ones
//!
//! # Design Decisions
//! - Both clients are cheap `Clone` handles over a shared pool
//! - Errors are stripped of their URL so the credential never renders

use std::time::Duration;

use axum::body::Bytes;
use axum::http::StatusCode;
use reqwest::{header::CONTENT_TYPE, Client};

use crate::config::schema::{ClientConfig, UpstreamConfig};
use crate::gateway::error::GatewayError;
use crate::gateway::translate::{TrafficClass, UpstreamRequest};

/// Raw upstream reply.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: Bytes,
}

/// The read and write channels to the upstream host.
#[derive(Debug, Clone)]
pub struct UpstreamClients {
    read: Client,
    write: Client,
}

impl UpstreamClients {
    /// Build both clients from configuration.
    pub fn new(config: &UpstreamConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            read: build_client(&config.read)?,
            write: build_client(&config.write)?,
        })
    }

    fn channel(&self, class: TrafficClass) -> &Client {
        match class {
            TrafficClass::Read => &self.read,
            TrafficClass::Write => &self.write,
        }
    }

    /// Perform one upstream call.
    pub async fn execute(&self, request: UpstreamRequest) -> Result<UpstreamResponse, GatewayError> {
        let client = self.channel(request.class);

        let mut builder = client.request(request.method, request.url);
        if let Some(content_type) = request.content_type {
            builder = builder.header(CONTENT_TYPE, content_type);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|e| {
            let e = e.without_url();
            if e.is_timeout() {
                GatewayError::Transport(format!("upstream timed out: {e}"))
            } else {
                GatewayError::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = response
            .bytes()
            .await
            .map_err(|e| GatewayError::Read(e.without_url().to_string()))?;

        Ok(UpstreamResponse {
            status,
            content_type,
            body,
        })
    }
}

fn build_client(config: &ClientConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .pool_idle_timeout(Duration::from_secs(config.pool_idle_timeout_secs))
        .pool_max_idle_per_host(config.pool_max_idle_per_host)
        .user_agent(concat!("deposit-gateway/", env!("CARGO_PKG_VERSION")))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::AccessToken;
    use crate::gateway::translate::{translate, InboundRequest, OperationKind, UpstreamEndpoint};

    #[tokio::test]
    async fn test_connection_refused_is_transport_error_without_token() {
        // Nothing listens on port 1.
        let endpoint = UpstreamEndpoint::new("http://127.0.0.1:1/api", AccessToken::new("hidden-tok")).unwrap();
        let request = translate(&endpoint, &InboundRequest::new(OperationKind::Fetch)).unwrap();

        let clients = UpstreamClients::new(&UpstreamConfig::default()).unwrap();
        let err = clients.execute(request).await.unwrap_err();

        assert!(matches!(err, GatewayError::Transport(_)));
        assert!(!err.to_string().contains("hidden-tok"));
    }
}

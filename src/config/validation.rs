//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Check the upstream base URL can carry resource paths
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;

use url::Url;

use crate::config::schema::{ClientConfig, GatewayConfig};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field (e.g., "upstream.base_url").
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Check every field that serde cannot.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }
    if config.listener.max_body_size == 0 {
        errors.push(ValidationError::new("listener.max_body_size", "must be greater than 0"));
    }
    if config.listener.request_timeout_secs == 0 {
        errors.push(ValidationError::new("listener.request_timeout_secs", "must be greater than 0"));
    }

    match Url::parse(&config.upstream.base_url) {
        Ok(url) => {
            if !matches!(url.scheme(), "http" | "https") {
                errors.push(ValidationError::new(
                    "upstream.base_url",
                    format!("unsupported scheme '{}'", url.scheme()),
                ));
            } else if url.cannot_be_a_base() {
                errors.push(ValidationError::new("upstream.base_url", "cannot carry path segments"));
            }
            if url.query().is_some() {
                errors.push(ValidationError::new("upstream.base_url", "must not contain a query"));
            }
        }
        Err(e) => {
            errors.push(ValidationError::new("upstream.base_url", e.to_string()));
        }
    }

    if config.upstream.access_token.is_empty() {
        errors.push(ValidationError::new("upstream.access_token", "must not be empty"));
    }

    let listener_timeout = config.listener.request_timeout_secs;
    validate_client("upstream.read", &config.upstream.read, listener_timeout, &mut errors);
    validate_client("upstream.write", &config.upstream.write, listener_timeout, &mut errors);

    if !LOG_LEVELS.contains(&config.observability.log_level.to_ascii_lowercase().as_str()) {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("unknown level '{}'", config.observability.log_level),
        ));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if matches!(&config.auth.api_key, Some(key) if key.is_empty()) {
        errors.push(ValidationError::new("auth.api_key", "must not be empty when set"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Upstream calls must time out before the listener does, otherwise the
/// client gets an empty 408 instead of a transport error envelope.
fn validate_client(prefix: &str, client: &ClientConfig, listener_timeout: u64, errors: &mut Vec<ValidationError>) {
    if client.request_timeout_secs == 0 {
        errors.push(ValidationError::new(
            format!("{prefix}.request_timeout_secs"),
            "must be greater than 0",
        ));
    } else if listener_timeout > 0 && client.request_timeout_secs >= listener_timeout {
        errors.push(ValidationError::new(
            format!("{prefix}.request_timeout_secs"),
            format!("must be below listener.request_timeout_secs ({listener_timeout})"),
        ));
    }
    if client.connect_timeout_secs == 0 {
        errors.push(ValidationError::new(
            format!("{prefix}.connect_timeout_secs"),
            "must be greater than 0",
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::AccessToken;

    fn valid() -> GatewayConfig {
        let mut config = GatewayConfig::default();
        config.upstream.access_token = AccessToken::new("token");
        config
    }

    #[test]
    fn test_default_with_token_is_valid() {
        assert_eq!(validate_config(&valid()), Ok(()));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = GatewayConfig::default();
        config.listener.bind_address = "nowhere".into();
        config.upstream.base_url = "ftp://example.org".into();
        config.upstream.read.request_timeout_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"listener.bind_address"));
        assert!(fields.contains(&"upstream.base_url"));
        assert!(fields.contains(&"upstream.access_token"));
        assert!(fields.contains(&"upstream.read.request_timeout_secs"));
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn test_upstream_timeout_must_undercut_listener() {
        let mut config = valid();
        config.upstream.write.request_timeout_secs = 600;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "upstream.write.request_timeout_secs");

        config.upstream.write.request_timeout_secs = config.listener.request_timeout_secs;
        assert!(validate_config(&config).is_err());

        config.listener.request_timeout_secs = 900;
        config.upstream.write.request_timeout_secs = 600;
        assert_eq!(validate_config(&config), Ok(()));
    }

    #[test]
    fn test_rejects_base_url_with_query() {
        let mut config = valid();
        config.upstream.base_url = "https://example.org/api?access_token=leak".into();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "upstream.base_url");
    }

    #[test]
    fn test_empty_api_key() {
        let mut config = valid();
        config.auth.api_key = Some(AccessToken::new(""));
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_metrics_address_checked_only_when_enabled() {
        let mut config = valid();
        config.observability.metrics_address = "bogus".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        assert!(validate_config(&config).is_err());
    }
}

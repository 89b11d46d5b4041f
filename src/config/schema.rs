//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use std::borrow::Cow;
use std::fmt;

use axum::body::Bytes;
use serde::{Deserialize, Serialize, Serializer};

/// Root configuration for the deposition gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Local listener (bind address, limits).
    pub listener: ListenerConfig,

    /// Upstream deposition service and its two client channels.
    pub upstream: UpstreamConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Optional bearer key protecting the local surface.
    pub auth: AuthConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8350").
    pub bind_address: String,

    /// Maximum inbound body size in bytes (file uploads included).
    pub max_body_size: usize,

    /// Upper bound on a whole inbound exchange, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8350".to_string(),
            max_body_size: 100 * 1024 * 1024, // 100MB
            request_timeout_secs: 300,
        }
    }
}

/// Upstream deposition service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL of the deposition API (e.g., "https://zenodo.org/api").
    pub base_url: String,

    /// Access token appended to every outbound URL.
    pub access_token: AccessToken,

    /// Client used for read (GET) traffic.
    pub read: ClientConfig,

    /// Client used for mutating traffic.
    pub write: ClientConfig,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "https://zenodo.org/api".to_string(),
            access_token: AccessToken::default(),
            read: ClientConfig::default(),
            write: ClientConfig::default(),
        }
    }
}

/// Tuning for one outbound client.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Total time allowed for one upstream call, in seconds.
    pub request_timeout_secs: u64,

    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,

    /// How long an idle pooled connection is kept, in seconds.
    pub pool_idle_timeout_secs: u64,

    /// Maximum idle connections kept per upstream host.
    pub pool_max_idle_per_host: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 60,
            connect_timeout_secs: 10,
            pool_idle_timeout_secs: 90,
            pool_max_idle_per_host: 16,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log every upstream exchange at info level.
    pub verbose: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            verbose: false,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9350".to_string(),
        }
    }
}

/// Local authentication.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AuthConfig {
    /// Bearer key required on operation routes. Disabled when unset.
    pub api_key: Option<AccessToken>,
}

/// A secret string that never renders its value.
///
/// `Debug`, `Display` and `Serialize` all print `***`. The raw value is only
/// reachable through [`AccessToken::expose`].
#[derive(Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct AccessToken(String);

pub const REDACTED: &str = "***";

impl AccessToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw secret. Only the URL builder should call this.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The secret as it appears on the wire: raw, and form-urlencoded the way
    /// it is written into the upstream query.
    fn forms(&self) -> Vec<String> {
        if self.0.is_empty() {
            return Vec::new();
        }
        let encoded: String = url::form_urlencoded::byte_serialize(self.0.as_bytes()).collect();
        if encoded == self.0 {
            vec![self.0.clone()]
        } else {
            vec![self.0.clone(), encoded]
        }
    }

    /// Replace every occurrence of the secret, raw or encoded, in `text`.
    pub fn scrub<'a>(&self, text: &'a str) -> Cow<'a, str> {
        let mut out = Cow::Borrowed(text);
        for form in self.forms() {
            if out.contains(form.as_str()) {
                out = Cow::Owned(out.replace(form.as_str(), REDACTED));
            }
        }
        out
    }

    /// Byte-level [`scrub`](Self::scrub). Returns the input untouched when the
    /// secret does not occur.
    pub fn scrub_bytes(&self, bytes: Bytes) -> Bytes {
        self.forms()
            .iter()
            .fold(bytes, |bytes, form| replace_bytes(bytes, form.as_bytes()))
    }
}

fn replace_bytes(bytes: Bytes, needle: &[u8]) -> Bytes {
    if needle.is_empty() || !bytes.windows(needle.len()).any(|w| w == needle) {
        return bytes;
    }

    let mut out = Vec::with_capacity(bytes.len());
    let mut rest = &bytes[..];
    while let Some(pos) = rest.windows(needle.len()).position(|w| w == needle) {
        out.extend_from_slice(&rest[..pos]);
        out.extend_from_slice(REDACTED.as_bytes());
        rest = &rest[pos + needle.len()..];
    }
    out.extend_from_slice(rest);
    Bytes::from(out)
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl fmt::Display for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl Serialize for AccessToken {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(REDACTED)
    }
}

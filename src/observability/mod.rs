//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Every request produces:
//!     → logging.rs (structured log events via tracing)
//!     → tracing.rs (one span per inbound request, keyed by request id)
//!     → metrics.rs (counters and upstream latency histograms)
//!
//! Consumers:
//!     → stdout (fmt subscriber)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - `RUST_LOG` overrides the configured level
//! - Request ID flows into every log line of a request through its span
//! - Metrics are cheap when no recorder is installed

pub mod logging;
pub mod metrics;
pub mod tracing;

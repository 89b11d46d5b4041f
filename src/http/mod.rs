//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID assigned and propagated)
//!     → auth.rs (optional bearer key on operation routes)
//!     → handlers.rs (bind path params and body → InboundRequest)
//!     → gateway (translate, call upstream, normalize)
//!     → one response written per request
//! ```

pub mod auth;
pub mod handlers;
pub mod request;
pub mod server;

pub use request::{MakeRequestUuid, X_REQUEST_ID};
pub use server::{AppState, HttpServer};

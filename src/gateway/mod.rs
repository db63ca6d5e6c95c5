//! Authenticated forwarding gateway.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     → OPTIONS? answer preflight (no other checks)
//!     → guard.rs (route → configured → bearer token)
//!     → pipeline.rs (bounded body read, JSON parse)
//!     → upstream.rs (single POST to the provider)
//!     → pipeline.rs (relay status, content-type, body)
//!     → cors.rs (merge CORS headers into every response)
//! ```
//!
//! # Design Decisions
//! - Every step is terminal on failure; the first rejection wins
//! - Local rejections share one JSON shape: `{"error": <message>}`
//! - Upstream statuses are relayed, never reinterpreted or retried
//! - No state is shared between requests beyond immutable config

pub mod cors;
pub mod error;
pub mod guard;
pub mod pipeline;
pub mod upstream;

pub use cors::CorsPolicy;
pub use error::{GatewayError, SetupError};
pub use guard::{BearerGuard, ConfiguredGuard, Guard, RouteGuard, CHAT_COMPLETIONS_PATH};
pub use pipeline::{Decision, Gateway};
pub use upstream::{HttpUpstream, Upstream, UpstreamError, UpstreamResponse};

//! Chat completion gateway library.

pub mod config;
pub mod gateway;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::GatewayConfig;
pub use gateway::Gateway;
pub use http::HttpServer;
pub use lifecycle::Shutdown;

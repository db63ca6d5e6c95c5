//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the chat gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, body limit).
    pub listener: ListenerConfig,

    /// Caller authentication and cross-origin settings.
    pub auth: AuthConfig,

    /// The single upstream completion endpoint.
    pub upstream: UpstreamConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8787").
    pub bind_address: String,

    /// Largest request body accepted, in bytes.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8787".to_string(),
            max_body_bytes: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Caller-facing authentication configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Shared secret callers present as a bearer token.
    /// Empty means the gateway is not configured and refuses to forward.
    pub proxy_token: String,

    /// Value of `access-control-allow-origin` on every response.
    pub cors_allow_origin: String,
}

impl AuthConfig {
    /// Whether a proxy secret has been provisioned.
    pub fn is_configured(&self) -> bool {
        !self.proxy_token.is_empty()
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            proxy_token: String::new(),
            cors_allow_origin: "*".to_string(),
        }
    }
}

// Secrets stay out of debug output and therefore out of logs.
impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("proxy_token", &redact(&self.proxy_token))
            .field("cors_allow_origin", &self.cors_allow_origin)
            .finish()
    }
}

/// Upstream provider configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Full URL of the upstream chat-completions endpoint.
    pub url: String,

    /// API key sent upstream as `Authorization: Bearer <api_key>`.
    pub api_key: String,

    /// Sent as `x-title` to identify the application upstream.
    pub app_title: String,

    /// Sent as `http-referer` to identify the application upstream.
    pub app_referer: String,

    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Total time allowed for the upstream exchange in seconds.
    pub request_timeout_secs: u64,

    /// Honour `HTTP_PROXY`/`HTTPS_PROXY` for the outbound call.
    pub system_proxy: bool,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: "https://openrouter.ai/api/v1/chat/completions".to_string(),
            api_key: String::new(),
            app_title: "Metly".to_string(),
            app_referer: "https://metly.app".to_string(),
            connect_timeout_secs: 10,
            request_timeout_secs: 120,
            system_proxy: true,
        }
    }
}

impl std::fmt::Debug for UpstreamConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamConfig")
            .field("url", &self.url)
            .field("api_key", &redact(&self.api_key))
            .field("app_title", &self.app_title)
            .field("app_referer", &self.app_referer)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("system_proxy", &self.system_proxy)
            .finish()
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() {
        "<unset>"
    } else {
        "<redacted>"
    }
}

//! Outbound call to the upstream completion provider.
//!
//! # Responsibilities
//! - POST the parsed payload to the fixed upstream URL
//! - Attach the upstream API key and the identification headers
//! - Capture status, content-type and the raw body for relay
//!
//! # Design Decisions
//! - Exactly one attempt per forwarded request, never retried
//! - Non-2xx statuses are data, not errors
//! - Connect and total timeouts are explicit and come from config

use std::time::Duration;

use async_trait::async_trait;
use axum::body::Bytes;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    StatusCode,
};
use serde_json::Value;
use thiserror::Error;

use crate::config::UpstreamConfig;
use crate::gateway::error::SetupError;

/// What the upstream answered, kept verbatim for relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub content_type: Option<HeaderValue>,
    pub body: Bytes,
}

/// The upstream could not produce a response at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpstreamError {
    #[error("upstream timed out")]
    Timeout,
    #[error("upstream transport failure: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for UpstreamError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            UpstreamError::Timeout
        } else {
            UpstreamError::Transport(e.to_string())
        }
    }
}

/// Anything that can carry a validated payload to the provider.
#[async_trait]
pub trait Upstream: Send + Sync {
    async fn forward(&self, payload: &Value) -> Result<UpstreamResponse, UpstreamError>;
}

/// The production upstream: a pooled reqwest client aimed at one URL.
#[derive(Debug, Clone)]
pub struct HttpUpstream {
    client: reqwest::Client,
    url: String,
    headers: HeaderMap,
}

impl HttpUpstream {
    /// Build the client and the fixed upstream headers.
    pub fn new(config: &UpstreamConfig) -> Result<Self, SetupError> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs));
        if !config.system_proxy {
            builder = builder.no_proxy();
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            url: config.url.clone(),
            headers: upstream_headers(config)?,
        })
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn forward(&self, payload: &Value) -> Result<UpstreamResponse, UpstreamError> {
        let response = self
            .client
            .post(&self.url)
            .headers(self.headers.clone())
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        let content_type = response.headers().get(CONTENT_TYPE).cloned();
        let body = response.bytes().await?;

        Ok(UpstreamResponse {
            status,
            content_type,
            body,
        })
    }
}

/// Fixed outbound headers: content type, provider key, and app identification.
pub fn upstream_headers(config: &UpstreamConfig) -> Result<HeaderMap, SetupError> {
    fn value(name: &'static str, raw: &str) -> Result<HeaderValue, SetupError> {
        HeaderValue::from_str(raw).map_err(|source| SetupError::InvalidHeader { name, source })
    }

    let mut authorization = value("authorization", &format!("Bearer {}", config.api_key))?;
    authorization.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(AUTHORIZATION, authorization);
    headers.insert("x-title", value("x-title", &config.app_title)?);
    headers.insert("http-referer", value("http-referer", &config.app_referer)?);
    Ok(headers)
}

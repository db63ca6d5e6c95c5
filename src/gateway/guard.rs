//! Ordered request guards.
//!
//! # Responsibilities
//! - Match the single recognized path (exact, case-sensitive)
//! - Refuse to serve when no proxy secret is provisioned
//! - Authenticate the caller's bearer token
//!
//! # Design Decisions
//! - Guards inspect only the request head; the body is read afterwards
//! - Guards run in a fixed order and the first rejection wins
//! - Each guard is independent and testable in isolation

use axum::http::{header::AUTHORIZATION, request::Parts, HeaderMap, HeaderValue};

use crate::config::AuthConfig;
use crate::gateway::error::GatewayError;

/// The only path the gateway serves.
pub const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";

/// A single admission check over the request head.
pub trait Guard: Send + Sync + std::fmt::Debug {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Returns the rejection if the request must not proceed.
    fn check(&self, head: &Parts) -> Result<(), GatewayError>;
}

/// Accepts exactly one path.
#[derive(Debug, Clone)]
pub struct RouteGuard {
    path: String,
}

impl RouteGuard {
    /// Guard that admits only `path`.
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl Default for RouteGuard {
    fn default() -> Self {
        Self::new(CHAT_COMPLETIONS_PATH)
    }
}

impl Guard for RouteGuard {
    fn name(&self) -> &'static str {
        "route"
    }

    fn check(&self, head: &Parts) -> Result<(), GatewayError> {
        if head.uri.path() == self.path {
            Ok(())
        } else {
            Err(GatewayError::NotFound)
        }
    }
}

/// Fails every request while the deployment has no proxy secret.
#[derive(Debug, Clone, Copy)]
pub struct ConfiguredGuard {
    configured: bool,
}

impl ConfiguredGuard {
    /// Guard that admits requests only when `configured` is true.
    pub fn new(configured: bool) -> Self {
        Self { configured }
    }
}

impl Guard for ConfiguredGuard {
    fn name(&self) -> &'static str {
        "configured"
    }

    fn check(&self, _head: &Parts) -> Result<(), GatewayError> {
        if self.configured {
            Ok(())
        } else {
            Err(GatewayError::Unconfigured)
        }
    }
}

/// Compares the presented bearer token with the shared secret.
#[derive(Clone)]
pub struct BearerGuard {
    token: String,
}

impl BearerGuard {
    /// Guard that admits requests presenting `token`.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl std::fmt::Debug for BearerGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerGuard").finish_non_exhaustive()
    }
}

impl Guard for BearerGuard {
    fn name(&self) -> &'static str {
        "bearer"
    }

    fn check(&self, head: &Parts) -> Result<(), GatewayError> {
        // An empty secret never authenticates anyone.
        if !self.token.is_empty() && bearer_token(&head.headers) == self.token.as_bytes() {
            Ok(())
        } else {
            Err(GatewayError::Unauthorized)
        }
    }
}

/// Token from the `authorization` header.
///
/// A literal `Bearer ` prefix is stripped when present; otherwise the raw
/// header value is the token. Compared as bytes, so non-ASCII secrets work.
/// A missing header yields an empty token.
pub fn bearer_token(headers: &HeaderMap) -> &[u8] {
    let raw = headers
        .get(AUTHORIZATION)
        .map(HeaderValue::as_bytes)
        .unwrap_or_default();
    raw.strip_prefix(b"Bearer ").unwrap_or(raw)
}

/// The guard chain in evaluation order: route, configuration, authentication.
pub fn default_guards(auth: &AuthConfig) -> Vec<Box<dyn Guard>> {
    vec![
        Box::new(RouteGuard::default()),
        Box::new(ConfiguredGuard::new(auth.is_configured())),
        Box::new(BearerGuard::new(auth.proxy_token.clone())),
    ]
}

/// Run guards in order, stopping at the first rejection.
pub fn run_guards(guards: &[Box<dyn Guard>], head: &Parts) -> Result<(), GatewayError> {
    for guard in guards {
        if let Err(rejection) = guard.check(head) {
            tracing::debug!(guard = guard.name(), reason = %rejection, "Guard rejected request");
            return Err(rejection);
        }
    }
    Ok(())
}

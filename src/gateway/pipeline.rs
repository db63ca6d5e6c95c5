//! The request pipeline: preflight, guards, body, forward, relay.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::{Body, Bytes},
    http::{header::CONTENT_TYPE, HeaderValue, Method, Request},
    response::{IntoResponse, Response},
};
use serde_json::Value;

use crate::config::GatewayConfig;
use crate::gateway::cors::CorsPolicy;
use crate::gateway::error::{GatewayError, SetupError};
use crate::gateway::guard::{default_guards, run_guards, Guard};
use crate::gateway::upstream::{Upstream, UpstreamResponse};
use crate::http::request::request_id;
use crate::observability::metrics;

/// Terminal outcome of one request.
#[derive(Debug)]
pub enum Decision {
    /// CORS preflight; no other checks ran.
    Preflight,
    /// Refused locally, or the upstream was unreachable.
    Rejected(GatewayError),
    /// The upstream answered; relayed unchanged.
    Forwarded(UpstreamResponse),
}

impl Decision {
    /// Label used for metrics and logs.
    pub fn outcome(&self) -> &'static str {
        match self {
            Decision::Preflight => "preflight",
            Decision::Rejected(_) => "rejected",
            Decision::Forwarded(_) => "forwarded",
        }
    }

    /// Render the decision as an HTTP response with the CORS headers merged in.
    pub fn into_response(self, cors: &CorsPolicy) -> Response {
        let mut response = match self {
            Decision::Preflight => Response::new(Body::empty()),
            Decision::Rejected(err) => err.into_response(),
            Decision::Forwarded(upstream) => relay(upstream),
        };
        cors.apply(response.headers_mut());
        response
    }
}

fn relay(upstream: UpstreamResponse) -> Response {
    let content_type = upstream
        .content_type
        .unwrap_or_else(|| HeaderValue::from_static("application/json"));

    let mut response = Response::new(Body::from(upstream.body));
    *response.status_mut() = upstream.status;
    response.headers_mut().insert(CONTENT_TYPE, content_type);
    response
}

/// Authenticated forwarding gateway.
///
/// Stateless apart from immutable configuration, so one instance is shared
/// by every concurrent request.
pub struct Gateway {
    guards: Vec<Box<dyn Guard>>,
    upstream: Arc<dyn Upstream>,
    cors: CorsPolicy,
    max_body_bytes: usize,
}

impl Gateway {
    /// Create a gateway from validated config and an upstream transport.
    pub fn new(config: &GatewayConfig, upstream: Arc<dyn Upstream>) -> Result<Self, SetupError> {
        Ok(Self {
            guards: default_guards(&config.auth),
            upstream,
            cors: CorsPolicy::new(&config.auth.cors_allow_origin)?,
            max_body_bytes: config.listener.max_body_bytes,
        })
    }

    /// Handle one request end to end.
    pub async fn handle(&self, request: Request<Body>) -> Response {
        let start = Instant::now();
        let request_id = request_id(request.headers()).to_string();
        let method = request.method().clone();
        let path = request.uri().path().to_string();

        let decision = self.decide(request).await;

        match &decision {
            Decision::Preflight => {
                tracing::debug!(request_id = %request_id, path = %path, "Preflight answered");
            }
            Decision::Rejected(err @ GatewayError::Upstream(_)) => {
                tracing::error!(
                    request_id = %request_id,
                    error = %err,
                    "Upstream request failed"
                );
            }
            Decision::Rejected(err) => {
                tracing::warn!(
                    request_id = %request_id,
                    method = %method,
                    path = %path,
                    status = err.status().as_u16(),
                    reason = %err,
                    "Request rejected"
                );
            }
            Decision::Forwarded(upstream) => {
                tracing::info!(
                    request_id = %request_id,
                    status = upstream.status.as_u16(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Relayed upstream response"
                );
            }
        }

        let outcome = decision.outcome();
        let response = decision.into_response(&self.cors);
        metrics::record_request(outcome, response.status().as_u16(), start);
        response
    }

    /// Walk the pipeline and stop at the first terminal step.
    pub async fn decide(&self, request: Request<Body>) -> Decision {
        if request.method() == Method::OPTIONS {
            return Decision::Preflight;
        }

        let (head, body) = request.into_parts();

        if let Err(rejection) = run_guards(&self.guards, &head) {
            return Decision::Rejected(rejection);
        }

        let payload = match read_body(body, self.max_body_bytes).await.and_then(|b| parse_json(&b)) {
            Ok(payload) => payload,
            Err(rejection) => return Decision::Rejected(rejection),
        };

        let started = Instant::now();
        let result = self.upstream.forward(&payload).await;
        metrics::record_upstream(
            result.as_ref().ok().map(|r| r.status.as_u16()),
            started.elapsed(),
        );

        match result {
            Ok(upstream) => Decision::Forwarded(upstream),
            Err(e) => Decision::Rejected(e.into()),
        }
    }
}

async fn read_body(body: Body, limit: usize) -> Result<Bytes, GatewayError> {
    // The only failure mode of a buffered axum body we can attribute to the
    // caller is the length limit.
    axum::body::to_bytes(body, limit)
        .await
        .map_err(|_| GatewayError::PayloadTooLarge)
}

/// Parse the body as JSON.
///
/// Empty and malformed bodies are invalid, and so are the falsy documents
/// `null`, `false`, `0` and `""`: none of them is a usable completion request.
pub fn parse_json(body: &[u8]) -> Result<Value, GatewayError> {
    let payload: Value = serde_json::from_slice(body).map_err(|_| GatewayError::InvalidJson)?;
    if is_falsy(&payload) {
        return Err(GatewayError::InvalidJson);
    }
    Ok(payload)
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => true,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

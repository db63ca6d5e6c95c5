//! Gateway error taxonomy and its wire representation.

use axum::{
    http::{header::InvalidHeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::gateway::upstream::UpstreamError;

/// Every way the gateway itself can refuse or fail a request.
///
/// Non-2xx answers from the upstream are not errors here: they are relayed
/// unchanged as a forwarded response.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Path is not the chat-completions endpoint.
    #[error("Not found")]
    NotFound,
    /// No proxy secret was provisioned for this deployment.
    #[error("Proxy not configured")]
    Unconfigured,
    /// Missing or wrong bearer token.
    #[error("Unauthorized")]
    Unauthorized,
    /// Body exceeded the configured limit.
    #[error("Payload too large")]
    PayloadTooLarge,
    /// Body is not parseable JSON.
    #[error("Invalid JSON")]
    InvalidJson,
    /// The upstream could not be reached or did not answer in time.
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

impl GatewayError {
    /// HTTP status reported to the caller.
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::NotFound => StatusCode::NOT_FOUND,
            GatewayError::Unconfigured => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::Unauthorized => StatusCode::UNAUTHORIZED,
            GatewayError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            GatewayError::InvalidJson => StatusCode::BAD_REQUEST,
            GatewayError::Upstream(UpstreamError::Timeout) => StatusCode::GATEWAY_TIMEOUT,
            GatewayError::Upstream(UpstreamError::Transport(_)) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Message placed in the `error` field of the response body.
    ///
    /// Transport details stay in the logs; callers get a fixed message.
    pub fn public_message(&self) -> &'static str {
        match self {
            GatewayError::NotFound => "Not found",
            GatewayError::Unconfigured => "Proxy not configured",
            GatewayError::Unauthorized => "Unauthorized",
            GatewayError::PayloadTooLarge => "Payload too large",
            GatewayError::InvalidJson => "Invalid JSON",
            GatewayError::Upstream(UpstreamError::Timeout) => "Upstream timed out",
            GatewayError::Upstream(UpstreamError::Transport(_)) => "Upstream request failed",
        }
    }
}

/// Fixed error body shape: `{"error": <message>}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        (
            self.status(),
            Json(ErrorBody {
                error: self.public_message(),
            }),
        )
            .into_response()
    }
}

/// Failures while assembling the gateway at startup.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("invalid value for header '{name}': {source}")]
    InvalidHeader {
        name: &'static str,
        #[source]
        source: InvalidHeaderValue,
    },
    #[error("failed to build upstream client: {0}")]
    Client(#[from] reqwest::Error),
}

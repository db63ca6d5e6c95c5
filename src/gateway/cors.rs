//! Cross-origin headers merged into every gateway response.

use axum::http::{
    header::{
        ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    },
    HeaderMap, HeaderValue,
};

use crate::gateway::error::SetupError;

pub const ALLOWED_HEADERS: &str = "authorization,content-type";
pub const ALLOWED_METHODS: &str = "GET,POST,OPTIONS";

/// The three CORS headers, pre-encoded once at startup.
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    allow_origin: HeaderValue,
}

impl CorsPolicy {
    /// Encode the allowed origin; fails if it is not a valid header value.
    pub fn new(allow_origin: &str) -> Result<Self, SetupError> {
        let allow_origin =
            HeaderValue::from_str(allow_origin).map_err(|source| SetupError::InvalidHeader {
                name: "access-control-allow-origin",
                source,
            })?;
        Ok(Self { allow_origin })
    }

    /// Merge the CORS headers into `headers`, replacing any existing values.
    pub fn apply(&self, headers: &mut HeaderMap) {
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, self.allow_origin.clone());
        headers.insert(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOWED_HEADERS),
        );
        headers.insert(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOWED_METHODS),
        );
    }
}

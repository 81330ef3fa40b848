//! REST backend error types

use serde::Serialize;
use thiserror::Error;

/// Backend error with classification
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct BackendError {
    pub kind: BackendErrorKind,
    pub message: String,
}

impl BackendError {
    pub fn new(kind: BackendErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Network, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Unauthorized, message)
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Server, message)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Decode, message)
    }

    pub fn missing_token() -> Self {
        Self::new(BackendErrorKind::MissingToken, "Not logged in")
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::InvalidRequest, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::NotFound, message)
    }

    /// Classify a non-success HTTP status
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        match status.as_u16() {
            401 | 403 => Self::unauthorized(format!("Credentials rejected: {body}")),
            400 | 422 => Self::invalid_request(format!("Invalid request: {body}")),
            404 => Self::not_found(format!("Not found: {body}")),
            _ => Self::server(format!("HTTP {status}: {body}")),
        }
    }
}

/// Error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendErrorKind {
    /// Timeout, connection refused, body read failure
    Network,
    /// 401/403: the credential was rejected
    Unauthorized,
    /// 5xx and any other unexpected status
    Server,
    /// Body could not be decoded
    Decode,
    /// Authenticated call attempted while logged out
    MissingToken,
    /// 400/422, or rejected locally before sending
    InvalidRequest,
    /// 404
    NotFound,
}

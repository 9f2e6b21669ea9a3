//! Error types for the Honeycomb API client.
//!
//! # Design
//! `NotFound` is a unit variant so callers can compare against it directly.
//! Every other failure carries enough detail for debugging, and
//! `ApiError::kind` folds the variants into the four categories callers
//! branch on.

use serde::Deserialize;
use thiserror::Error;
use ureq::http::StatusCode;

use crate::http::HttpResponse;

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors returned by `Client` and the resource facades.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    /// The resource does not exist: a 404 from the server, or no match in a
    /// client-side scan of a collection.
    #[error("resource not found")]
    NotFound,

    /// The API key was rejected (401) or lacks the required permission (403).
    #[error("unauthorized (HTTP {status}): {message}")]
    Unauthorized { status: u16, message: String },

    /// The server rejected the request body or parameters (4xx other than
    /// 401, 403 and 404).
    #[error("invalid request (HTTP {status}): {message}")]
    InvalidRequest { status: u16, message: String },

    /// The server failed (5xx) or answered with any other unexpected status.
    #[error("server error (HTTP {status}): {message}")]
    Server { status: u16, message: String },

    /// The request never produced a complete response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The deadline attached to the request expired.
    #[error("request timed out")]
    Timeout,

    /// A success response body could not be decoded into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The base URL and path do not combine into a valid address.
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// A configuration value is missing, empty or malformed.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// An item-level operation was called with an empty identifier.
    #[error("identifier must not be empty")]
    MissingId,
}

/// Coarse classification of an `ApiError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    /// The request was rejected, either by the server or before it was sent.
    InvalidRequest,
    Auth,
    /// Server failures, transport failures and undecodable responses.
    Server,
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::NotFound => ErrorKind::NotFound,
            ApiError::Unauthorized { .. } => ErrorKind::Auth,
            ApiError::InvalidRequest { .. }
            | ApiError::Serialization(_)
            | ApiError::InvalidUrl(_)
            | ApiError::Config(_)
            | ApiError::MissingId => ErrorKind::InvalidRequest,
            ApiError::Server { .. }
            | ApiError::Transport(_)
            | ApiError::Timeout
            | ApiError::Deserialization(_) => ErrorKind::Server,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound)
    }

    /// HTTP status carried by the error.
    ///
    /// `NotFound` is a sentinel shared by server 404s and client-side misses
    /// (such as `Markers::get`), so it reports `None`; match on the variant.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized { status, .. }
            | ApiError::InvalidRequest { status, .. }
            | ApiError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Map a non-success response to the matching variant.
    ///
    /// The message is taken from an `{"error": "..."}` body when present,
    /// otherwise from the raw body, otherwise from the status reason.
    pub fn from_response(response: &HttpResponse) -> Self {
        let status = response.status;
        if status == 404 {
            return ApiError::NotFound;
        }
        let message = error_message(status, &response.body);
        match status {
            401 | 403 => ApiError::Unauthorized { status, message },
            400..=499 => ApiError::InvalidRequest { status, message },
            _ => ApiError::Server { status, message },
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

fn error_message(status: u16, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        return parsed.error;
    }
    let trimmed = body.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }
    reason_phrase(status).to_string()
}

fn reason_phrase(status: u16) -> &'static str {
    StatusCode::from_u16(status)
        .ok()
        .and_then(|status| status.canonical_reason())
        .unwrap_or("Unexpected Status")
}

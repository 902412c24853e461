//! Failure classification for backend calls.
//!
//! Every failed attempt is first captured as a [`Failure`] (what actually went
//! wrong on the wire) and then turned into an [`ApiError`] by [`classify`].
//! Only `ApiError` ever leaves the HTTP layer.

use std::fmt;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

const TIMEOUT_MESSAGE: &str = "Request timeout. Please try again.";
const NETWORK_MESSAGE: &str = "Network error. Please check your connection.";
const PARSE_MESSAGE: &str = "Failed to parse response";
const STATUS_FALLBACK_MESSAGE: &str = "An error occurred";
const UNKNOWN_MESSAGE: &str = "An unknown error occurred";

/// Closed set of failure kinds surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// No response reached us.
    NetworkError,
    /// Client-side deadline exceeded.
    Timeout,
    /// HTTP 5xx.
    ServerError,
    /// HTTP 4xx.
    ClientError,
    /// Response body could not be decoded.
    ParseError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::NetworkError => "NETWORK_ERROR",
            ErrorCode::Timeout => "TIMEOUT",
            ErrorCode::ServerError => "SERVER_ERROR",
            ErrorCode::ClientError => "CLIENT_ERROR",
            ErrorCode::ParseError => "PARSE_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified backend failure.
///
/// Built only by [`classify`]; `retryable` is decided at that point and never
/// changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{message}")]
pub struct ApiError {
    code: ErrorCode,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<u16>,
    retryable: bool,
}

impl ApiError {
    fn new(code: ErrorCode, message: impl Into<String>, status: Option<u16>, retryable: bool) -> Self {
        Self {
            code,
            message: message.into(),
            status,
            retryable,
        }
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// HTTP status, present only for `CLIENT_ERROR` and `SERVER_ERROR`.
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn retryable(&self) -> bool {
        self.retryable
    }
}

/// Raw outcome of one failed attempt, before classification.
#[derive(Debug)]
pub enum Failure {
    /// The request never produced a response (connect, DNS, reset, deadline).
    Transport { timed_out: bool, message: String },
    /// The server answered with a non-success status.
    Status {
        status: u16,
        /// Response body, when it decoded as JSON.
        body: Option<Value>,
        /// Transport-level description of the failure.
        message: String,
    },
    /// A success response whose body could not be decoded.
    Parse(String),
    /// Anything else (request building, serialization, ...).
    Other(String),
}

impl Failure {
    pub fn status(status: u16, body: Option<Value>) -> Self {
        Failure::Status {
            status,
            body,
            message: format!("Request failed with status code {}", status),
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::Transport { message, .. } => write!(f, "transport failure: {}", message),
            Failure::Status { message, .. } => f.write_str(message),
            Failure::Parse(message) => write!(f, "parse failure: {}", message),
            Failure::Other(message) => f.write_str(message),
        }
    }
}

impl From<reqwest::Error> for Failure {
    fn from(error: reqwest::Error) -> Self {
        // Order matters: a timed out body read is both a timeout and a body error.
        if error.is_timeout() {
            return Failure::Transport {
                timed_out: true,
                message: error.to_string(),
            };
        }
        if error.is_connect() || error.is_request() || error.is_body() {
            return Failure::Transport {
                timed_out: false,
                message: error.to_string(),
            };
        }
        if error.is_decode() {
            return Failure::Parse(error.to_string());
        }
        if let Some(status) = error.status() {
            return Failure::status(status.as_u16(), None);
        }
        Failure::Other(error.to_string())
    }
}

impl From<serde_json::Error> for Failure {
    fn from(error: serde_json::Error) -> Self {
        Failure::Parse(error.to_string())
    }
}

/// Turns a raw failure into the error callers see.
///
/// Pure and total: every input maps to some `ApiError`.
pub fn classify(failure: &Failure) -> ApiError {
    match failure {
        Failure::Transport { timed_out: true, .. } => {
            ApiError::new(ErrorCode::Timeout, TIMEOUT_MESSAGE, None, true)
        }
        Failure::Transport { .. } => {
            ApiError::new(ErrorCode::NetworkError, NETWORK_MESSAGE, None, true)
        }
        Failure::Status {
            status,
            body,
            message,
        } => classify_status(*status, body.as_ref(), message),
        Failure::Parse(_) => ApiError::new(ErrorCode::ParseError, PARSE_MESSAGE, None, false),
        Failure::Other(message) => {
            let message = if message.is_empty() {
                UNKNOWN_MESSAGE
            } else {
                message.as_str()
            };
            ApiError::new(ErrorCode::NetworkError, message, None, false)
        }
    }
}

fn classify_status(status: u16, body: Option<&Value>, transport_message: &str) -> ApiError {
    let message = body
        .and_then(server_message)
        .or_else(|| Some(transport_message).filter(|m| !m.is_empty()))
        .unwrap_or(STATUS_FALLBACK_MESSAGE);

    match status {
        400..=499 => ApiError::new(ErrorCode::ClientError, message, Some(status), false),
        500.. => ApiError::new(ErrorCode::ServerError, message, Some(status), true),
        // 1xx/3xx that were not followed: not a shape we know how to handle
        _ => ApiError::new(
            ErrorCode::NetworkError,
            format!("Unexpected response status {}", status),
            None,
            false,
        ),
    }
}

/// The backend's own `message` field, when it is a non-empty string.
fn server_message(body: &Value) -> Option<&str> {
    body.get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
}

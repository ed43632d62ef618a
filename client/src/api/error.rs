//! Error types for backend calls.
//!
//! Every call on [`super::BankApiClient`] fails with an [`ApiError`]. The
//! variants separate what happened locally (no token, bad URL) from what the
//! backend said (status + extracted message) and from transport failures.

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Message shown when an authenticated call is attempted without a token.
pub const UNAUTHORIZED_MESSAGE: &str = "Unauthorized: No access token found";

/// Errors that can occur while talking to the banking backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No access token was available; the request was never sent.
    #[error("{}", UNAUTHORIZED_MESSAGE)]
    Unauthorized,

    /// The configured base URL (or a derived endpoint) is not a valid URL.
    #[error("invalid backend url: {0}")]
    InvalidUrl(String),

    /// The backend answered with a non-success status.
    #[error("backend returned {status}: {message}")]
    Backend {
        /// HTTP status returned.
        status: StatusCode,
        /// Message extracted from the error payload.
        message: String,
    },

    /// The request could not be sent or the connection failed mid-flight.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered 2xx but the body did not match the contract.
    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl ApiError {
    /// The text a user should see for this error. Backend messages are
    /// passed through verbatim; everything else gets `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::Unauthorized => UNAUTHORIZED_MESSAGE.to_string(),
            ApiError::Backend { message, .. } if !message.trim().is_empty() => message.clone(),
            _ => fallback.to_string(),
        }
    }

    /// HTTP status, when the backend actually answered.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Backend { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Pulls a human-readable message out of a backend error payload.
///
/// The backend is a REST framework that reports errors in a handful of
/// shapes; keys are tried in this order:
///
/// 1. `{"detail": "..."}`
/// 2. `{"error": "..."}`
/// 3. `{"message": "..."}`
/// 4. `{"non_field_errors": ["..."]}`
/// 5. `{"<field>": ["..."]}` (first field, first message)
///
/// A bare JSON string is returned as-is.
pub fn extract_error_message(body: &Value) -> Option<String> {
    match body {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Object(map) => {
            for key in ["detail", "error", "message"] {
                if let Some(msg) = map.get(key).and_then(first_text) {
                    return Some(msg);
                }
            }
            if let Some(msg) = map.get("non_field_errors").and_then(first_text) {
                return Some(msg);
            }
            map.iter().find_map(|(field, value)| {
                first_text(value).map(|msg| format!("{}: {}", field, msg))
            })
        }
        Value::Array(items) => items.iter().find_map(first_text),
        _ => None,
    }
}

fn first_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Array(items) => items.iter().find_map(first_text),
        _ => None,
    }
}

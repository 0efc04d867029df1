//! Error types for the catalog client.
//!
//! # Design
//! One `ApiError` enum covers every failure a page can observe. Validation
//! errors never leave the form; the rest reach the page, which turns them into
//! a toast via `user_message`. Server failures keep the backend's structured
//! envelope so callers can branch on `error_code`.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

use crate::http::{HttpResponse, TransportError};
use crate::types::ErrorEnvelope;

pub const NETWORK_ERROR_MESSAGE: &str =
    "Unable to connect to the server. Please check your network connection.";
pub const UNKNOWN_ERROR_MESSAGE: &str = "An unexpected error occurred";
pub const UNCONFIRMED_ERROR_CODE: &str = "USER_NOT_CONFIRMED";

/// Field name to message map produced by client-side validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.insert(field.into(), message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

/// Login rejection.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    /// Credentials were refused. `message` is safe to show to the user.
    #[error("{message}")]
    Rejected { message: String },

    /// The account exists but sign-up was never confirmed. The caller must
    /// route to the confirmation flow instead of showing a dead end.
    #[error("{message}")]
    UnconfirmedAccount { username: String, message: String },
}

/// Errors surfaced by the catalog client.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ApiError {
    /// Client-side validation blocked the submit; no request was sent.
    #[error("validation failed: {0}")]
    Validation(FieldErrors),

    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The server answered with a non-2xx status.
    #[error("HTTP {status} {error_code}: {message}")]
    Server {
        status: u16,
        error_code: String,
        message: String,
        details: Option<BTreeMap<String, serde_json::Value>>,
    },

    /// No response was received.
    #[error("{0}")]
    Network(String),

    /// The request could not be built or sent.
    #[error("request failed: {0}")]
    Request(String),

    /// A 2xx response body did not match the expected shape.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// Durable session storage could not be read or written.
    #[error("session storage failed: {0}")]
    Storage(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn error_code(&self) -> &str {
        match self {
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::Auth(AuthError::Rejected { .. }) => "AUTH_ERROR",
            ApiError::Auth(AuthError::UnconfirmedAccount { .. }) => UNCONFIRMED_ERROR_CODE,
            ApiError::Server { error_code, .. } => error_code,
            ApiError::Network(_) => "NETWORK_ERROR",
            ApiError::Request(_) => "REQUEST_ERROR",
            ApiError::Deserialization(_) => "DESERIALIZATION_ERROR",
            ApiError::Storage(_) => "STORAGE_ERROR",
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Text for a toast notification.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Validation(errors) => format!("Please fix the highlighted fields ({errors})"),
            ApiError::Auth(err) => err.to_string(),
            ApiError::Server { message, .. } => message.clone(),
            ApiError::Network(message) => message.clone(),
            ApiError::Request(message) => message.clone(),
            ApiError::Deserialization(_) => UNKNOWN_ERROR_MESSAGE.to_string(),
            ApiError::Storage(message) => message.clone(),
        }
    }

    /// Normalize a non-2xx response into `ApiError::Server`.
    ///
    /// Accepts the backend envelope, a bare `{"detail": ...}` body, or
    /// anything else (which becomes `UNKNOWN_ERROR`).
    pub fn from_response(response: &HttpResponse) -> ApiError {
        if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(&response.body) {
            return ApiError::Server {
                status: response.status,
                error_code: envelope.error_code,
                message: envelope.message,
                details: envelope.details,
            };
        }

        let detail = serde_json::from_str::<serde_json::Value>(&response.body)
            .ok()
            .and_then(|v| match v.get("detail") {
                Some(serde_json::Value::String(s)) => Some(s.clone()),
                Some(other) if !other.is_null() => Some(other.to_string()),
                _ => None,
            });

        match detail {
            Some(message) => ApiError::Server {
                status: response.status,
                error_code: format!("HTTP_{}", response.status),
                message,
                details: None,
            },
            None => ApiError::Server {
                status: response.status,
                error_code: "UNKNOWN_ERROR".to_string(),
                message: UNKNOWN_ERROR_MESSAGE.to_string(),
                details: None,
            },
        }
    }
}

impl From<TransportError> for ApiError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::NoResponse(cause) => {
                tracing::debug!(%cause, "transport produced no response");
                ApiError::Network(NETWORK_ERROR_MESSAGE.to_string())
            }
            TransportError::InvalidRequest(message) => ApiError::Request(message),
        }
    }
}

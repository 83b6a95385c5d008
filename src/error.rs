//! Error types for the Kayako client.
//!
//! This module defines `KayakoError`, the unified error type returned by
//! every mapper, codec and transport operation.
//!
//! # Security
//!
//! Error messages built from server responses are sanitized so that the API
//! key and secret key never leak into logs or error values. Use
//! `sanitize_message()` when constructing error messages from external
//! sources.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// The operation an entity is being validated or dispatched for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Single resource fetch.
    Get,
    /// Collection fetch.
    GetAll,
    /// POST of a new resource.
    Create,
    /// PUT of an existing resource.
    Update,
    /// DELETE of an existing resource.
    Delete,
    /// Re-fetch of an existing resource.
    Refresh,
}

impl Operation {
    /// Returns true for operations that change remote state.
    #[must_use]
    pub fn is_mutation(self) -> bool {
        matches!(self, Operation::Create | Operation::Update | Operation::Delete)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Get => "get",
            Operation::GetAll => "get all",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::Refresh => "refresh",
        };
        f.write_str(name)
    }
}

/// Unified error type for all Kayako client operations.
#[derive(Error, Debug)]
pub enum KayakoError {
    /// Configuration error - missing or invalid settings.
    #[error("configuration error: {0}")]
    Config(String),

    /// A client was used before its configuration was provided.
    #[error("client is not initialized: {0} was never set")]
    Uninitialized(&'static str),

    /// A field required for the operation has no value.
    #[error("value for API field '{field}' is required to {operation}")]
    MissingRequiredField {
        /// Wire name of the missing field.
        field: String,
        /// The operation that required it.
        operation: Operation,
    },

    /// An operation was attempted in a lifecycle state that forbids it.
    #[error("illegal state: {0}")]
    IllegalState(String),

    /// A single-resource fetch returned nothing.
    #[error("{controller} not found: {id}")]
    NotFound {
        /// Controller path that was queried.
        controller: String,
        /// Positional parameters, joined with `/`.
        id: String,
    },

    /// A value does not match any declared constant of its kind.
    #[error("invalid value {value:?} for {constant}")]
    InvalidEnumValue {
        /// The rejected value.
        value: String,
        /// Owner and prefix of the constant family, e.g. `Comment::CREATOR_TYPE`.
        constant: String,
    },

    /// A wire value had an unexpected shape.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// What the mapper needed.
        expected: String,
        /// What it got.
        found: String,
    },

    /// Caller supplied a malformed value.
    #[error("validation error: {0}")]
    Validation(String),

    /// Authentication failed - API key or signature rejected.
    #[error("authentication failed - check KAYAKO_API_KEY and KAYAKO_SECRET_KEY")]
    Authentication,

    /// HTTP request failed during transmission.
    #[error("HTTP request failed: {0}")]
    Http(#[source] reqwest::Error),

    /// HTTP client initialization failed.
    #[error("HTTP client error: {0}")]
    HttpClient(#[source] reqwest::Error),

    /// HTTP response returned a non-success status code.
    #[error("HTTP {status}: {body}")]
    HttpStatus {
        /// The HTTP status code returned.
        status: reqwest::StatusCode,
        /// The response body, sanitized and truncated.
        body: String,
    },

    /// Request timed out.
    #[error("request timed out after {duration:?} - the server may be slow or unreachable")]
    Timeout {
        /// How long we waited before timing out.
        duration: Duration,
        /// The operation that timed out.
        operation: String,
    },

    /// Rate limited by the server (HTTP 429).
    #[error("rate limited by server - please wait before retrying")]
    RateLimited {
        /// Suggested retry delay, if provided by server.
        retry_after: Option<Duration>,
    },

    /// Server temporarily unavailable (HTTP 502/503/504).
    #[error("service temporarily unavailable ({status})")]
    ServiceUnavailable {
        /// The specific status code.
        status: reqwest::StatusCode,
    },

    /// The response body could not be decoded.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// A local file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization or deserialization failed.
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Connection test failed.
    #[error("connection test failed: {message}")]
    ConnectionTest {
        /// Details about why the connection test failed.
        message: String,
    },
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = KayakoError> = std::result::Result<T, E>;

impl KayakoError {
    /// Creates a configuration error for a missing environment variable.
    pub fn missing_env(var_name: &str) -> Self {
        KayakoError::Config(format!(
            "missing required environment variable: {}",
            var_name
        ))
    }

    /// Creates a configuration error for an invalid value.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        KayakoError::Config(message.into())
    }

    /// Creates a missing required field error.
    pub fn missing_field(field: impl Into<String>, operation: Operation) -> Self {
        KayakoError::MissingRequiredField {
            field: field.into(),
            operation,
        }
    }

    /// Creates an illegal state error.
    pub fn illegal_state(message: impl Into<String>) -> Self {
        KayakoError::IllegalState(message.into())
    }

    /// Creates a not found error for a controller and its parameters.
    pub fn not_found(controller: impl Into<String>, params: &[String]) -> Self {
        KayakoError::NotFound {
            controller: controller.into(),
            id: params.join("/"),
        }
    }

    /// Creates an invalid enum value error.
    pub fn invalid_enum(value: impl Into<String>, constant: impl Into<String>) -> Self {
        KayakoError::InvalidEnumValue {
            value: value.into(),
            constant: constant.into(),
        }
    }

    /// Creates a type mismatch error.
    pub fn type_mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        KayakoError::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        KayakoError::Validation(message.into())
    }

    /// Creates a decode error.
    pub fn decode(message: impl Into<String>) -> Self {
        KayakoError::Decode(message.into())
    }

    /// Creates a timeout error.
    pub fn timeout(duration: Duration, operation: impl Into<String>) -> Self {
        KayakoError::Timeout {
            duration,
            operation: operation.into(),
        }
    }

    /// Creates a connection test error.
    pub fn connection_test(message: impl Into<String>) -> Self {
        KayakoError::ConnectionTest {
            message: message.into(),
        }
    }

    /// Returns true if the error came from the network or the wire protocol.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            KayakoError::Authentication
                | KayakoError::Http(_)
                | KayakoError::HttpStatus { .. }
                | KayakoError::Timeout { .. }
                | KayakoError::RateLimited { .. }
                | KayakoError::ServiceUnavailable { .. }
                | KayakoError::Decode(_)
                | KayakoError::Serialization(_)
        )
    }

    /// Returns true if this error is transient and an idempotent request may be retried.
    ///
    /// Retryable errors include:
    /// - Rate limiting (HTTP 429)
    /// - Service unavailable (HTTP 502, 503, 504)
    /// - Timeouts
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            KayakoError::RateLimited { .. } => true,
            KayakoError::ServiceUnavailable { .. } => true,
            KayakoError::Timeout { .. } => true,
            KayakoError::Http(e) => e.is_timeout() || e.is_connect(),
            KayakoError::HttpStatus { status, .. } => {
                status.as_u16() == 429 || status.is_server_error()
            }
            _ => false,
        }
    }

    /// Returns true if this is a rate limit error, indicating we should back off.
    #[must_use]
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, KayakoError::RateLimited { .. })
            || matches!(self, KayakoError::HttpStatus { status, .. } if status.as_u16() == 429)
    }

    /// Returns the suggested delay before retry, if any.
    #[must_use]
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            KayakoError::RateLimited { retry_after } => *retry_after,
            KayakoError::ServiceUnavailable { .. } => Some(Duration::from_millis(500)),
            KayakoError::Timeout { .. } => Some(Duration::from_millis(100)),
            _ => None,
        }
    }

    /// Replaces every occurrence of the given secrets with `[REDACTED]`.
    ///
    /// Empty secrets are ignored.
    #[must_use]
    pub fn sanitize_message(message: &str, secrets: &[&str]) -> String {
        secrets
            .iter()
            .filter(|s| !s.is_empty())
            .fold(message.to_string(), |acc, secret| {
                acc.replace(secret, "[REDACTED]")
            })
    }

    /// Creates a sanitized version of this error's display message.
    #[must_use]
    pub fn sanitized_display(&self, secrets: &[&str]) -> String {
        Self::sanitize_message(&self.to_string(), secrets)
    }
}

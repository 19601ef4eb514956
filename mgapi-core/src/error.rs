//! Error types for mgapi
//!
//! This module provides the single error type every mgapi operation reports
//! through. It defines two families:
//!
//! - **Error**: Client-side errors for configuration, arguments, transport and
//!   decoding (uses thiserror)
//! - **RemoteError**: Wire-format errors decoded from the service's `error`
//!   object, including the nested sub-errors of compound operations
//!
//! # Error Taxonomy
//!
//! - Configuration errors are raised while building a client and are fatal
//! - Invalid-argument errors are raised before any I/O happens
//! - Transport errors (`Http`, `Connection`, `Decode`) are surfaced as-is
//! - Remote errors are surfaced unless they signal an invalid session, in
//!   which case the dispatcher re-authenticates and retries exactly once
//! - An empty response body is terminal
//!
//! # Examples
//!
//! ```rust
//! use mgapi_core::{Error, RemoteError, RemoteSubError};
//!
//! let error = RemoteError::new("JSONRPCError", "Incorrect login credentials")
//!     .with_error(RemoteSubError::new("InvalidUserException", "Incorrect login credentials"));
//! assert!(error.is_session_invalid());
//!
//! let error = Error::Http { status: 404, reason: "Not Found".into() };
//! assert_eq!(error.name(), "404");
//! assert_eq!(error.message(), "Not Found");
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for mgapi operations
pub type Result<T> = std::result::Result<T, Error>;

/// Nested error names that mean the held credentials must be replaced.
///
/// Matched as lowercase substrings of each nested error's name.
pub const SESSION_INVALID_INDICATORS: &[&str] = &["invaliduserexception", "dbunavailableexception"];

/// Client-level error type for mgapi operations
///
/// Every failure of a logical call reaches the caller as one of these
/// variants; none are swallowed. Only the first session-invalidity
/// `Remote` error of a call is absorbed by the dispatcher.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Required identity fields are missing or inconsistent
    ///
    /// Raised when a client is built, never at call time.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A call was issued with an unusable argument (empty method, no calls)
    ///
    /// Raised before any transport interaction.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The service answered with a non-200 HTTP status
    #[error("HTTP error {status}: {reason}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Canonical reason phrase for the status
        reason: String,
    },

    /// Connection-level failure: DNS, refused connection, timeout, body read
    #[error("Connection error: {0}")]
    Connection(String),

    /// The response body could not be decoded into the RPC envelope
    #[error("Decode error: {0}")]
    Decode(String),

    /// The request could not be encoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The transport succeeded but the body was empty
    #[error("No data returned")]
    EmptyResponse,

    /// Structured error reported by the remote service
    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),

    /// The caller's bounded wait elapsed before the call completed
    #[error("Request timeout")]
    Timeout,

    /// Unexpected client-side failure, such as a panicked call task
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Short error name, mirroring the `name` field of a remote error
    ///
    /// HTTP failures use the numeric status as their name (`"404"`).
    pub fn name(&self) -> String {
        match self {
            Error::Config(_) => "ConfigError".to_string(),
            Error::InvalidArgument(_) => "InvalidArgument".to_string(),
            Error::Http { status, .. } => status.to_string(),
            Error::Connection(_) => "ConnectionError".to_string(),
            Error::Decode(_) => "DecodeError".to_string(),
            Error::Serialization(_) => "SerializationError".to_string(),
            Error::EmptyResponse => "EmptyResponse".to_string(),
            Error::Remote(e) => e.name.clone(),
            Error::Timeout => "Timeout".to_string(),
            Error::Internal(_) => "InternalError".to_string(),
        }
    }

    /// Human-readable message without the variant prefix
    pub fn message(&self) -> String {
        match self {
            Error::Config(m)
            | Error::InvalidArgument(m)
            | Error::Connection(m)
            | Error::Decode(m)
            | Error::Serialization(m)
            | Error::Internal(m) => m.clone(),
            Error::Http { reason, .. } => reason.clone(),
            Error::EmptyResponse => "no data returned".to_string(),
            Error::Remote(e) => e.message.clone(),
            Error::Timeout => "request timed out".to_string(),
        }
    }

    /// Label used for metrics and log fields
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Config(_) => "config",
            Error::InvalidArgument(_) => "invalid_argument",
            Error::Http { .. } => "http",
            Error::Connection(_) => "connection",
            Error::Decode(_) => "decode",
            Error::Serialization(_) => "serialization",
            Error::EmptyResponse => "empty_response",
            Error::Remote(_) => "remote",
            Error::Timeout => "timeout",
            Error::Internal(_) => "internal",
        }
    }

    /// True for a remote error that warrants re-authentication
    pub fn is_session_invalid(&self) -> bool {
        matches!(self, Error::Remote(e) if e.is_session_invalid())
    }

    /// The decoded remote error, if this is one
    pub fn as_remote(&self) -> Option<&RemoteError> {
        match self {
            Error::Remote(e) => Some(e),
            _ => None,
        }
    }
}

/// Error object returned by the service in place of a result
///
/// Compound operations (multicalls, batched writes) list the failing
/// sub-operations in `errors`.
///
/// # Examples
///
/// ```rust
/// use mgapi_core::RemoteError;
///
/// let json = r#"{"name":"JSONRPCError","message":"","errors":[{"name":"MissingMethodException","message":""}]}"#;
/// let error: RemoteError = serde_json::from_str(json).unwrap();
/// assert_eq!(error.errors.len(), 1);
/// assert!(!error.is_session_invalid());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteError {
    /// Error class name, e.g. `JSONRPCError`
    #[serde(default)]
    pub name: String,

    /// Human-readable description
    #[serde(default)]
    pub message: String,

    /// Nested errors, in the order the service reported them
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<RemoteSubError>,
}

impl RemoteError {
    /// Create a remote error without nested errors
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            errors: Vec::new(),
        }
    }

    /// Append a nested error
    pub fn with_error(mut self, error: RemoteSubError) -> Self {
        self.errors.push(error);
        self
    }

    /// Whether any nested error says the session is no longer accepted
    ///
    /// Only the nested list is inspected; the top-level name is usually a
    /// generic `JSONRPCError`.
    pub fn is_session_invalid(&self) -> bool {
        self.errors.iter().any(RemoteSubError::is_session_invalid)
    }
}

impl std::fmt::Display for RemoteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.name, self.message)?;
        if !self.errors.is_empty() {
            let names: Vec<&str> = self.errors.iter().map(|e| e.name.as_str()).collect();
            write!(f, " [{}]", names.join(", "))?;
        }
        Ok(())
    }
}

impl std::error::Error for RemoteError {}

/// One entry of a remote error's nested `errors` list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteSubError {
    /// Exception name, e.g. `InvalidUserException`
    #[serde(default)]
    pub name: String,
    /// Human-readable description
    #[serde(default)]
    pub message: String,
}

impl RemoteSubError {
    /// Create a nested error
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }

    fn is_session_invalid(&self) -> bool {
        let name = self.name.to_lowercase();
        SESSION_INVALID_INDICATORS
            .iter()
            .any(|indicator| name.contains(indicator))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_invalid_user_exception_is_session_invalid() {
        let error = RemoteError::new("JSONRPCError", "Incorrect login")
            .with_error(RemoteSubError::new("InvalidUserException", "Incorrect login"));

        assert!(error.is_session_invalid());
        assert!(Error::Remote(error).is_session_invalid());
    }

    #[test]
    fn test_db_unavailable_is_session_invalid() {
        let error = RemoteError::new("JSONRPCError", "")
            .with_error(RemoteSubError::new("DbUnavailableException", ""));

        assert!(error.is_session_invalid());
    }

    #[test]
    fn test_indicator_match_is_case_insensitive_substring() {
        let error = RemoteError::new("JSONRPCError", "")
            .with_error(RemoteSubError::new("Geotab.Checkmate.INVALIDUSEREXCEPTION", ""));

        assert!(error.is_session_invalid());
    }

    #[test]
    fn test_top_level_name_is_not_inspected() {
        let error = RemoteError::new("InvalidUserException", "no nested errors");
        assert!(!error.is_session_invalid());
    }

    #[test]
    fn test_other_nested_error_is_terminal() {
        let error = RemoteError::new("JSONRPCError", "")
            .with_error(RemoteSubError::new("MissingMethodException", ""));

        assert!(!error.is_session_invalid());
        assert!(!Error::Remote(error).is_session_invalid());
    }

    #[test]
    fn test_any_matching_nested_error_is_enough() {
        let error = RemoteError::new("JSONRPCError", "")
            .with_error(RemoteSubError::new("ArgumentException", ""))
            .with_error(RemoteSubError::new("InvalidUserException", ""));

        assert!(error.is_session_invalid());
    }

    #[test]
    fn test_http_error_name_and_message() {
        let error = Error::Http {
            status: 404,
            reason: "Not Found".to_string(),
        };

        assert_eq!(error.name(), "404");
        assert_eq!(error.message(), "Not Found");
        assert_eq!(error.kind(), "http");
        assert!(!error.is_session_invalid());
    }

    #[test]
    fn test_remote_error_name_and_message_pass_through() {
        let error = Error::from(RemoteError::new("JSONRPCError", "boom"));

        assert_eq!(error.name(), "JSONRPCError");
        assert_eq!(error.message(), "boom");
        assert!(error.as_remote().is_some());
    }

    #[test]
    fn test_remote_error_deserialization_with_missing_fields() {
        let error: RemoteError = serde_json::from_value(json!({"message": "only message"})).unwrap();

        assert_eq!(error.name, "");
        assert_eq!(error.message, "only message");
        assert!(error.errors.is_empty());
    }

    #[test]
    fn test_remote_error_serialization_omits_empty_errors() {
        let serialized = serde_json::to_string(&RemoteError::new("A", "b")).unwrap();
        assert!(!serialized.contains("errors"));
    }

    #[test]
    fn test_remote_error_display_lists_nested_names() {
        let error = RemoteError::new("JSONRPCError", "failed")
            .with_error(RemoteSubError::new("InvalidUserException", ""));
        let display = format!("{}", error);

        assert!(display.contains("JSONRPCError"));
        assert!(display.contains("InvalidUserException"));
    }

    #[test]
    fn test_empty_response_display() {
        assert_eq!(Error::EmptyResponse.to_string(), "No data returned");
    }
}

//! Client configuration and identity validation
//!
//! A [`ClientConfig`] is immutable once a client is built. It carries the
//! identity used to authenticate, the root server, and the transport
//! options (`ssl`, `compression`).
//!
//! # Identity Rules
//!
//! - A user name is always required
//! - At least one authentication factor is required: a password or a
//!   pre-issued session id
//! - A pre-issued session id also needs the database and the server that
//!   issued it (the default server cannot have issued a routed session)
//!
//! Violations are reported as `Error::Config` when the client is built.

use mgapi_core::{Error, Result, DEFAULT_SERVER};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Response compression requested from the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    /// Ask for gzip and decompress transparently
    #[default]
    Gzip,
    /// Ask for an uncompressed body
    None,
}

impl Compression {
    /// Value of the `Accept-Encoding` request header
    pub fn accept_encoding(self) -> &'static str {
        match self {
            Compression::Gzip => "gzip",
            Compression::None => "identity",
        }
    }
}

/// Immutable per-client settings
///
/// Secrets are never serialized, so a config can be logged or written back
/// without leaking them.
#[derive(Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// User to authenticate as
    pub user_name: String,
    /// Password for the authentication exchange
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
    /// Pre-issued session token
    #[serde(default, skip_serializing)]
    pub session_id: Option<String>,
    /// Database to authenticate against
    #[serde(default)]
    pub database: Option<String>,
    /// Root server host
    #[serde(default = "default_server")]
    pub server: String,
    /// Use https (default) or plain http
    #[serde(default = "default_ssl")]
    pub ssl: bool,
    /// Response compression preference
    #[serde(default)]
    pub compression: Compression,
    /// Per-exchange transport timeout in milliseconds
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,
}

fn default_server() -> String {
    DEFAULT_SERVER.to_string()
}

fn default_ssl() -> bool {
    true
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("user_name", &self.user_name)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("session_id", &self.session_id.as_ref().map(|_| "<redacted>"))
            .field("database", &self.database)
            .field("server", &self.server)
            .field("ssl", &self.ssl)
            .field("compression", &self.compression)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .finish()
    }
}

impl ClientConfig {
    /// Create a configuration with defaults for everything but the user
    pub fn new(user_name: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
            password: None,
            session_id: None,
            database: None,
            server: default_server(),
            ssl: true,
            compression: Compression::default(),
            request_timeout_ms: None,
        }
    }

    /// Check the identity rules and normalize the server host
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` naming the first missing field.
    pub fn validate(mut self) -> Result<Self> {
        if self.user_name.trim().is_empty() {
            return Err(Error::Config("Must supply userName".to_string()));
        }

        let has_password = non_empty(&self.password).is_some();
        let has_session_id = non_empty(&self.session_id).is_some();
        if !has_password && !has_session_id {
            return Err(Error::Config(
                "Must supply password or sessionId".to_string(),
            ));
        }

        self.server = normalize_host(&self.server).to_string();
        if self.server.is_empty() {
            return Err(Error::Config("Must supply a non-empty server".to_string()));
        }

        if has_session_id {
            if non_empty(&self.database).is_none() {
                return Err(Error::Config(
                    "Must supply database with sessionId".to_string(),
                ));
            }
            if self.server == DEFAULT_SERVER {
                return Err(Error::Config(
                    "Must supply the issuing server with sessionId".to_string(),
                ));
            }
        }

        Ok(self)
    }

    /// Transport-level timeout, if configured
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }

    /// URL scheme implied by the `ssl` flag
    pub fn scheme(&self) -> &'static str {
        if self.ssl {
            "https"
        } else {
            "http"
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// Reduce a server string to a bare host
///
/// Strips a leading `scheme://` and trailing slashes, so `https://my3.geotab.com/`
/// and `my3.geotab.com` address the same server.
pub fn normalize_host(server: &str) -> &str {
    let server = server.trim();
    let host = match server.find("://") {
        Some(idx) => &server[idx + 3..],
        None => server,
    };
    host.trim_end_matches('/')
}

//! Client builder for identity, transport and observability options
//!
//! The `ClientBuilder` provides a fluent API for configuring a client
//! before it is built. It allows you to:
//! - Supply the identity (password or pre-issued session)
//! - Pick the root server, scheme and response compression
//! - Configure observability (OpenTelemetry)
//! - Swap the HTTP transport for another [`Transport`]
//!
//! Building performs no network I/O. Authentication happens on the first
//! call, or explicitly through [`MgClient::authenticate`].
//!
//! # Examples
//!
//! ```rust,no_run
//! use mgapi_client::ClientBuilder;
//!
//! # async fn example() -> mgapi_core::Result<()> {
//! // Password identity
//! let client = ClientBuilder::new("user@example.com")
//!     .password("secret")
//!     .database("demo_db")
//!     .build()?;
//!
//! // Pre-issued session with observability
//! let client2 = ClientBuilder::new("user@example.com")
//!     .session_id("3fc6d3a1-session")
//!     .database("demo_db")
//!     .server("my3.geotab.com")
//!     .with_default_observability()
//!     .service_name("fleet-sync")
//!     .build()?;
//! # Ok(())
//! # }
//! ```

use crate::config::{ClientConfig, Compression};
use crate::dispatcher::Dispatcher;
use crate::session::SessionManager;
use crate::transport::{HttpTransport, Transport};
use crate::{ClientMetrics, MgClient};
use mgapi_core::{Error, Result};
use std::sync::Arc;
use std::time::Duration;

/// Builder for configuring and creating an [`MgClient`]
pub struct ClientBuilder {
    config: ClientConfig,
    transport: Option<Arc<dyn Transport>>,
    observability_config: Option<mgapi_core::ObservabilityConfig>,
    service_name: Option<String>,
}

impl ClientBuilder {
    /// Create a new client builder for `user_name`
    pub fn new(user_name: impl Into<String>) -> Self {
        Self::from_config(ClientConfig::new(user_name))
    }

    /// Start from an existing configuration
    pub fn from_config(config: ClientConfig) -> Self {
        Self {
            config,
            transport: None,
            observability_config: None,
            service_name: None,
        }
    }

    /// Authenticate with a password
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.config.password = Some(password.into());
        self
    }

    /// Reuse a pre-issued session
    ///
    /// Requires `database` and the issuing `server` as well.
    pub fn session_id(mut self, session_id: impl Into<String>) -> Self {
        self.config.session_id = Some(session_id.into());
        self
    }

    /// Database to authenticate against
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.config.database = Some(database.into());
        self
    }

    /// Root server host (default `my.geotab.com`)
    pub fn server(mut self, server: impl Into<String>) -> Self {
        self.config.server = server.into();
        self
    }

    /// Use https (default) or plain http
    pub fn ssl(mut self, ssl: bool) -> Self {
        self.config.ssl = ssl;
        self
    }

    /// Response compression (default gzip)
    pub fn compression(mut self, compression: Compression) -> Self {
        self.config.compression = compression;
        self
    }

    /// Timeout of each HTTP exchange
    ///
    /// This bounds the transport, not the logical call. See
    /// [`MgClient::call_with_timeout`] for a bounded wait on a whole call.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        let millis = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self.config.request_timeout_ms = Some(millis);
        self
    }

    /// Use a custom transport instead of HTTP
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Enable OpenTelemetry observability with custom configuration
    pub fn with_observability(mut self, config: mgapi_core::ObservabilityConfig) -> Self {
        self.observability_config = Some(config);
        self
    }

    /// Enable OpenTelemetry observability with default configuration
    pub fn with_default_observability(mut self) -> Self {
        self.observability_config = Some(mgapi_core::ObservabilityConfig::default());
        self
    }

    /// Set service name for observability (used if observability is enabled)
    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = Some(name.into());
        self
    }

    /// Validate the configuration and build the client
    ///
    /// # Errors
    ///
    /// - `Error::Config` for an incomplete identity or an HTTP client that
    ///   cannot be constructed
    /// - `Error::Internal` if observability fails to initialize, or is
    ///   requested outside a Tokio runtime (the OTLP exporters need one)
    pub fn build(self) -> Result<MgClient> {
        let config = self.config.validate()?;

        // Initialize observability if configured
        let metrics = if let Some(mut obs) = self.observability_config {
            if let Some(name) = self.service_name {
                obs.service_name = name;
            }

            if tokio::runtime::Handle::try_current().is_err() {
                return Err(Error::Internal(
                    "observability requires a Tokio runtime".to_string(),
                ));
            }

            mgapi_core::init_observability(obs.clone()).map_err(|e| {
                Error::Internal(format!("Failed to initialize observability: {}", e))
            })?;

            Some(Arc::new(ClientMetrics::new(obs.service_name)))
        } else {
            None
        };

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::new(&config)?),
        };

        let session = Arc::new(SessionManager::new(
            &config,
            transport.clone(),
            metrics.clone(),
        ));
        let dispatcher = Dispatcher::new(
            session.clone(),
            transport,
            config.compression,
            metrics.clone(),
        );

        tracing::info!(
            user = %config.user_name,
            server = %config.server,
            preissued_session = config.session_id.is_some(),
            "Client built"
        );

        Ok(MgClient {
            config: Arc::new(config),
            session,
            dispatcher,
            metrics,
        })
    }
}

impl std::fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("config", &self.config)
            .field("custom_transport", &self.transport.is_some())
            .field("observability_config", &self.observability_config)
            .field("service_name", &self.service_name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let builder = ClientBuilder::new("user@example.com");

        assert_eq!(builder.config.user_name, "user@example.com");
        assert_eq!(builder.config.server, "my.geotab.com");
        assert!(builder.config.ssl);
        assert_eq!(builder.config.compression, Compression::Gzip);
        assert!(builder.transport.is_none());
        assert!(builder.observability_config.is_none());
        assert!(builder.service_name.is_none());
    }

    #[test]
    fn test_builder_chaining() {
        let builder = ClientBuilder::new("user@example.com")
            .password("secret")
            .database("demo_db")
            .server("https://my3.geotab.com/")
            .ssl(false)
            .compression(Compression::None)
            .request_timeout(Duration::from_millis(1500))
            .service_name("test-service");

        assert_eq!(builder.config.password.as_deref(), Some("secret"));
        assert_eq!(builder.config.database.as_deref(), Some("demo_db"));
        assert!(!builder.config.ssl);
        assert_eq!(builder.config.compression, Compression::None);
        assert_eq!(builder.config.request_timeout_ms, Some(1500));
        assert_eq!(
            builder.config.request_timeout(),
            Some(Duration::from_millis(1500))
        );
        assert_eq!(builder.service_name, Some("test-service".to_string()));
    }

    #[test]
    fn test_build_normalizes_server() {
        let client = ClientBuilder::new("user@example.com")
            .password("secret")
            .server("https://my3.geotab.com/")
            .build()
            .unwrap();

        assert_eq!(client.config().server, "my3.geotab.com");
        assert_eq!(client.root_server(), "my3.geotab.com");
    }

    #[test]
    fn test_build_requires_authentication_factor() {
        let err = ClientBuilder::new("user@example.com").build().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.message().contains("password"));
    }

    #[test]
    fn test_build_session_requires_database() {
        let err = ClientBuilder::new("user@example.com")
            .session_id("abc")
            .server("my3.geotab.com")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_builder_observability_config() {
        let config = mgapi_core::ObservabilityConfig::new("test-client")
            .with_endpoint("http://localhost:4317")
            .with_log_level("debug");

        let builder = ClientBuilder::new("user@example.com").with_observability(config);

        let obs_config = builder.observability_config.unwrap();
        assert_eq!(obs_config.service_name, "test-client");
        assert_eq!(obs_config.log_level, "debug");
    }

    #[test]
    fn test_observability_outside_runtime_is_error() {
        let err = ClientBuilder::new("user@example.com")
            .password("secret")
            .with_default_observability()
            .build()
            .unwrap_err();

        assert!(matches!(err, Error::Internal(_)));
        assert!(err.message().contains("Tokio runtime"));
    }

    #[test]
    fn test_invalid_config_reported_before_observability() {
        let err = ClientBuilder::new("user@example.com")
            .with_default_observability()
            .build()
            .unwrap_err();

        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_builder_default_observability() {
        let builder = ClientBuilder::new("user@example.com").with_default_observability();

        let obs_config = builder.observability_config.unwrap();
        assert_eq!(obs_config.service_name, "mgapi");
    }
}

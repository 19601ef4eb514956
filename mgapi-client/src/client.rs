//! Session-authenticated JSON-RPC client over HTTP
//!
//! This module provides the main `MgClient` type. It wraps the session
//! manager and the dispatcher behind typed `call`, `multicall` and
//! `authenticate` methods.
//!
//! # Client Lifecycle
//!
//! 1. **Build**: Validate the identity ([`ClientBuilder`](crate::ClientBuilder)); no I/O
//! 2. **Authenticate**: Implicitly on the first call, or explicitly
//! 3. **Use**: Calls go to the home server the authentication pointed at
//! 4. **Renew**: A rejected session is re-authenticated once per call
//!
//! # Cloning
//!
//! `MgClient` is cheaply cloneable using `Arc` internally. All clones
//! share the same credentials and server pointer, so one authentication
//! serves every task.
//!
//! # Examples
//!
//! ```rust,no_run
//! use mgapi_client::MgClient;
//! use serde_json::json;
//!
//! # async fn example() -> mgapi_core::Result<()> {
//! let client = MgClient::builder("user@example.com")
//!     .password("secret")
//!     .database("demo_db")
//!     .build()?;
//!
//! let version: String = client.call("GetVersion", ()).await?;
//! let devices: Vec<serde_json::Value> = client
//!     .call("Get", json!({"typeName": "Device", "resultsLimit": 10}))
//!     .await?;
//! # Ok(())
//! # }
//! ```

use crate::config::ClientConfig;
use crate::dispatcher::{Dispatcher, TimeoutNotifier};
use crate::multicall::{MultiCall, MultiCallResponse};
use crate::session::SessionManager;
use crate::{ClientBuilder, ClientMetrics};
use mgapi_core::{
    params_from_value, AuthenticateResult, Credentials, Error, Result, MULTICALL_METHOD,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;

/// JSON-RPC client bound to one identity
#[derive(Clone)]
pub struct MgClient {
    /// Validated configuration
    pub(crate) config: Arc<ClientConfig>,
    /// Credentials and server pointer
    pub(crate) session: Arc<SessionManager>,
    /// Call execution with re-authentication
    pub(crate) dispatcher: Dispatcher,
    /// Metrics for observability
    pub(crate) metrics: Option<Arc<ClientMetrics>>,
}

impl MgClient {
    /// Start building a client for `user_name`
    pub fn builder(user_name: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(user_name)
    }

    /// The validated configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Authenticate now, replacing any held credentials
    ///
    /// Always performs an exchange against the root server. On success the
    /// credentials are stored and, if the result names another server,
    /// later calls go there.
    ///
    /// # Errors
    ///
    /// Transport and remote errors are returned unchanged. Held state is
    /// left untouched on failure.
    pub async fn authenticate(&self) -> Result<AuthenticateResult> {
        self.session.authenticate().await
    }

    /// Invoke `method` and deserialize its result
    ///
    /// `params` must serialize to an object, or to `null` / `()` for no
    /// params. Credentials are attached automatically, authenticating
    /// first if none are held.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidArgument` for an empty method or non-object params,
    ///   before any I/O
    /// - `Error::Remote` for a protocol error (after at most one
    ///   re-authentication when the session was rejected)
    /// - `Error::Http` / `Error::Connection` / `Error::EmptyResponse` /
    ///   `Error::Decode` for transport failures, never retried
    pub async fn call<P, R>(&self, method: &str, params: P) -> Result<R>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let params = to_params(params)?;
        let result = self.dispatcher.call(method, params).await?;
        from_result(result)
    }

    /// Invoke `method` with a bounded wait
    ///
    /// When `timeout` elapses first, `on_timeout` fires and
    /// `Error::Timeout` is returned. The call itself is not cancelled: it
    /// completes in the background (including any authentication it
    /// triggered) and its result is dropped.
    pub async fn call_with_timeout<P, R>(
        &self,
        method: &str,
        params: P,
        timeout: Duration,
        on_timeout: Option<TimeoutNotifier>,
    ) -> Result<R>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let params = to_params(params)?;
        let result = self
            .dispatcher
            .call_with_timeout(method, params, timeout, on_timeout)
            .await?;
        from_result(result)
    }

    /// Execute `(method, params)` pairs as one `ExecuteMultiCall`
    ///
    /// Results come back in input order.
    ///
    /// # Errors
    ///
    /// `Error::InvalidArgument` for an empty list, before any I/O. If any
    /// sub-call fails the whole batch fails with one `Error::Remote`.
    pub async fn multicall(&self, calls: Vec<(String, Option<Value>)>) -> Result<Vec<Value>> {
        let batch = MultiCall::from_pairs(calls)?;
        self.execute(batch).await.map(MultiCallResponse::into_results)
    }

    /// Execute a [`MultiCall`] batch
    #[tracing::instrument(skip(self, batch), fields(calls = batch.len()))]
    pub async fn execute(&self, batch: MultiCall) -> Result<MultiCallResponse> {
        let expected = batch.len();
        tracing::debug!(methods = ?batch.methods(), "Executing multicall");
        let params = batch.into_params()?;

        if let Some(ref m) = self.metrics {
            m.record_multicall(expected as u64);
        }

        let result = self.dispatcher.call(MULTICALL_METHOD, params).await?;
        MultiCallResponse::from_result(result, expected)
    }

    /// Execute a [`MultiCall`] batch with a bounded wait
    ///
    /// Same non-cancelling semantics as [`MgClient::call_with_timeout`].
    pub async fn multicall_with_timeout(
        &self,
        batch: MultiCall,
        timeout: Duration,
        on_timeout: Option<TimeoutNotifier>,
    ) -> Result<MultiCallResponse> {
        if batch.is_empty() {
            return Err(Error::InvalidArgument("Must provide calls".to_string()));
        }

        let client = self.clone();
        self.dispatcher
            .with_deadline(
                MULTICALL_METHOD,
                async move { client.execute(batch).await },
                timeout,
                on_timeout,
            )
            .await
    }

    /// Replace the held credentials without a network exchange
    ///
    /// The client stores its own copy. The server pointer is unchanged.
    pub async fn set_credentials(&self, credentials: &Credentials) {
        self.session.set_credentials(credentials).await;
    }

    /// A copy of the held credentials, if any
    pub async fn credentials(&self) -> Option<Credentials> {
        self.session.credentials().await
    }

    /// The root server authentication is sent to
    pub fn root_server(&self) -> &str {
        self.session.root_server()
    }

    /// The server calls are currently sent to
    pub async fn direct_server(&self) -> String {
        self.session.direct_server().await
    }
}

impl std::fmt::Debug for MgClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MgClient")
            .field("config", &self.config)
            .field("session", &self.session)
            .field("metrics_enabled", &self.metrics.is_some())
            .finish()
    }
}

fn to_params<P: Serialize>(params: P) -> Result<Map<String, Value>> {
    let value = serde_json::to_value(params).map_err(|e| Error::Serialization(e.to_string()))?;
    params_from_value(value)
}

fn from_result<R: DeserializeOwned>(result: Value) -> Result<R> {
    serde_json::from_value(result).map_err(|e| Error::Decode(e.to_string()))
}

//! Call dispatch with transparent authentication and one retry
//!
//! Every logical call moves through the same states:
//!
//! ```text
//! Unauthenticated -> Authenticating -> Sending
//!     Sending -> Success
//!     Sending -> RemoteError (session invalid, budget left) -> Authenticating -> Sending
//!     Sending -> RemoteError (terminal) | TransportError (terminal)
//! ```
//!
//! The retry budget is one re-authentication per logical call. It lives in
//! the call's own stack frame, so concurrent calls never share it.
//! Transport errors never trigger re-authentication.
//!
//! # Bounded Waits
//!
//! [`Dispatcher::with_deadline`] races a spawned call against a timer. When
//! the timer wins the caller gets `Error::Timeout` and the optional
//! notification fires, but the spawned call is *not* cancelled: it runs to
//! completion and its outcome is dropped.

use crate::config::Compression;
use crate::metrics::ClientMetrics;
use crate::session::SessionManager;
use crate::transport::{exchange, Transport};
use mgapi_core::{Error, Result, RpcRequest, CREDENTIALS_PARAM};
use serde_json::{Map, Value};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Notification fired when a bounded wait elapses
pub type TimeoutNotifier = Box<dyn FnOnce() + Send + 'static>;

/// Re-authentications allowed per logical call
const MAX_REAUTHENTICATIONS: u32 = 1;

/// Retry budget of one logical call
#[derive(Debug, Default)]
struct RetryState {
    retries: u32,
}

impl RetryState {
    /// Consume one retry if any is left
    fn try_retry(&mut self) -> bool {
        if self.retries < MAX_REAUTHENTICATIONS {
            self.retries += 1;
            true
        } else {
            false
        }
    }
}

/// Executes logical calls against the session's current server
#[derive(Clone)]
pub struct Dispatcher {
    session: Arc<SessionManager>,
    transport: Arc<dyn Transport>,
    compression: Compression,
    metrics: Option<Arc<ClientMetrics>>,
}

impl Dispatcher {
    /// Create a dispatcher sharing the session's transport
    pub fn new(
        session: Arc<SessionManager>,
        transport: Arc<dyn Transport>,
        compression: Compression,
        metrics: Option<Arc<ClientMetrics>>,
    ) -> Self {
        Self {
            session,
            transport,
            compression,
            metrics,
        }
    }

    /// Execute one logical call
    ///
    /// The held credentials are inserted into `params` under
    /// `credentials`, replacing any caller-supplied value.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidArgument` for an empty method, before any I/O
    /// - authentication errors from an implicit or forced authentication
    /// - the call's transport or remote error
    #[tracing::instrument(skip(self, params))]
    pub async fn call(&self, method: &str, params: Map<String, Value>) -> Result<Value> {
        validate_method(method)?;

        let start = Instant::now();
        let outcome = self.dispatch(method, params).await;
        let duration = start.elapsed().as_secs_f64();

        match &outcome {
            Ok(_) => {
                if let Some(ref m) = self.metrics {
                    m.record_call(method, "success", duration);
                }
                tracing::debug!(duration_secs = duration, "Call completed successfully");
            }
            Err(error) => {
                if let Some(ref m) = self.metrics {
                    m.record_call(method, "error", duration);
                    m.record_error(error.kind());
                }
                tracing::error!(error = %error, kind = error.kind(), "Call failed");
            }
        }

        outcome
    }

    async fn dispatch(&self, method: &str, mut params: Map<String, Value>) -> Result<Value> {
        let mut retry = RetryState::default();

        loop {
            let (credentials, generation) = self.session.ensure_credentials().await?;
            let credentials = serde_json::to_value(&credentials)
                .map_err(|e| Error::Serialization(e.to_string()))?;
            params.insert(CREDENTIALS_PARAM.to_string(), credentials);

            let request = RpcRequest::new(method, params);
            let host = self.session.target_host(&request).await;

            let outcome =
                exchange(self.transport.as_ref(), &host, &request, self.compression).await;
            match outcome {
                Ok(result) => return Ok(result),
                Err(error) if error.is_session_invalid() && retry.try_retry() => {
                    tracing::warn!(error = %error, attempt = retry.retries, "Session rejected, re-authenticating");
                    if let Some(ref m) = self.metrics {
                        m.record_reauthentication(method);
                    }
                    self.session.renew(generation).await?;
                    params = request.params;
                }
                Err(error) => return Err(error),
            }
        }
    }

    /// Run `call` with a best-effort deadline
    ///
    /// `method` is validated before anything is spawned.
    pub async fn call_with_timeout(
        &self,
        method: &str,
        params: Map<String, Value>,
        timeout: Duration,
        on_timeout: Option<TimeoutNotifier>,
    ) -> Result<Value> {
        validate_method(method)?;

        let dispatcher = self.clone();
        let owned_method = method.to_string();
        self.with_deadline(
            method,
            async move { dispatcher.call(&owned_method, params).await },
            timeout,
            on_timeout,
        )
        .await
    }

    /// Race a spawned logical call against a timer
    ///
    /// Dropping the join handle on expiry detaches the task instead of
    /// aborting it, so an in-flight authentication or call still completes.
    pub(crate) async fn with_deadline<T, F>(
        &self,
        label: &str,
        call: F,
        timeout: Duration,
        on_timeout: Option<TimeoutNotifier>,
    ) -> Result<T>
    where
        T: Send + 'static,
        F: Future<Output = Result<T>> + Send + 'static,
    {
        let handle = tokio::spawn(call);

        match tokio::time::timeout(timeout, handle).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(join_error)) => Err(Error::Internal(format!("Call task failed: {}", join_error))),
            Err(_) => {
                tracing::warn!(
                    method = %label,
                    timeout = ?timeout,
                    "Call timed out, leaving it to complete in the background"
                );
                if let Some(ref m) = self.metrics {
                    m.record_timeout(label);
                }
                if let Some(notify) = on_timeout {
                    notify();
                }
                Err(Error::Timeout)
            }
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("session", &self.session)
            .field("compression", &self.compression)
            .finish_non_exhaustive()
    }
}

fn validate_method(method: &str) -> Result<()> {
    if method.trim().is_empty() {
        return Err(Error::InvalidArgument("Must provide method".to_string()));
    }
    Ok(())
}

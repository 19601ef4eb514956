//! Session lifecycle: credentials, authentication and server redirection
//!
//! The [`SessionManager`] owns the state shared by every call on a client:
//!
//! - the [`Credentials`] issued by the last successful authentication (or
//!   injected from outside),
//! - the server pointer: the host non-authentication calls are sent to.
//!
//! # Authentication
//!
//! The `Authenticate` exchange always goes to the root server. On success
//! the returned credentials replace the held ones and, unless the response
//! path is `ThisServer`, the server pointer moves to the returned home
//! server. On failure nothing changes.
//!
//! # Concurrency
//!
//! Exchanges are serialized through an async mutex so concurrent calls do
//! not authenticate twice for the same reason. Every credentials change
//! bumps a generation counter; a call that saw an invalid session passes
//! the generation it used to [`SessionManager::renew`], which skips the
//! exchange if another call has already replaced those credentials.

use crate::config::{normalize_host, ClientConfig, Compression};
use crate::metrics::ClientMetrics;
use crate::transport::{exchange, Transport};
use mgapi_core::{
    AuthenticateResult, Credentials, Error, Result, RpcRequest, AUTHENTICATE_METHOD,
};
use serde_json::{json, Map};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

#[derive(Debug)]
struct SessionState {
    credentials: Option<Credentials>,
    direct_server: String,
    generation: u64,
}

/// Owner of credentials and the server pointer
pub struct SessionManager {
    user_name: String,
    password: Option<String>,
    database: Option<String>,
    root_server: String,
    compression: Compression,
    transport: Arc<dyn Transport>,
    state: RwLock<SessionState>,
    auth_lock: Mutex<()>,
    metrics: Option<Arc<ClientMetrics>>,
}

impl SessionManager {
    /// Create a session manager for a validated configuration
    ///
    /// A configured session id seeds the credentials, so the first call
    /// skips authentication.
    pub fn new(
        config: &ClientConfig,
        transport: Arc<dyn Transport>,
        metrics: Option<Arc<ClientMetrics>>,
    ) -> Self {
        let credentials = match (&config.session_id, &config.database) {
            (Some(session_id), Some(database)) => Some(Credentials::new(
                config.user_name.clone(),
                database.clone(),
                session_id.clone(),
            )),
            _ => None,
        };

        Self {
            user_name: config.user_name.clone(),
            password: config.password.clone(),
            database: config.database.clone(),
            root_server: config.server.clone(),
            compression: config.compression,
            transport,
            state: RwLock::new(SessionState {
                credentials,
                direct_server: config.server.clone(),
                generation: 0,
            }),
            auth_lock: Mutex::new(()),
            metrics,
        }
    }

    /// The root server authentication is sent to
    pub fn root_server(&self) -> &str {
        &self.root_server
    }

    /// The server non-authentication calls are sent to
    pub async fn direct_server(&self) -> String {
        self.state.read().await.direct_server.clone()
    }

    /// A copy of the held credentials, if any
    pub async fn credentials(&self) -> Option<Credentials> {
        self.state.read().await.credentials.clone()
    }

    /// Replace the held credentials without a network exchange
    ///
    /// The manager keeps its own copy; later changes to the caller's value
    /// do not affect the session.
    pub async fn set_credentials(&self, credentials: &Credentials) {
        let mut state = self.state.write().await;
        state.credentials = Some(credentials.clone());
        state.generation += 1;
        tracing::debug!(generation = state.generation, "Credentials injected");
    }

    /// Host a request must be sent to
    pub async fn target_host(&self, request: &RpcRequest) -> String {
        if request.is_authenticate() {
            self.root_server.clone()
        } else {
            self.direct_server().await
        }
    }

    /// Authenticate against the root server
    ///
    /// Always performs an exchange.
    ///
    /// # Errors
    ///
    /// Transport and remote errors are returned unchanged; a result that
    /// does not carry credentials is an `Error::Decode`. Held state is only
    /// mutated on success.
    #[tracing::instrument(skip(self), fields(user = %self.user_name, server = %self.root_server))]
    pub async fn authenticate(&self) -> Result<AuthenticateResult> {
        let _guard = self.auth_lock.lock().await;
        self.authenticate_locked().await.map(|(result, _)| result)
    }

    /// Held credentials with their generation, authenticating first if none
    pub(crate) async fn ensure_credentials(&self) -> Result<(Credentials, u64)> {
        if let Some(held) = self.snapshot().await {
            return Ok(held);
        }

        let _guard = self.auth_lock.lock().await;
        // Another call may have authenticated while this one waited.
        if let Some(held) = self.snapshot().await {
            return Ok(held);
        }

        tracing::debug!("No credentials held, authenticating");
        let (result, generation) = self.authenticate_locked().await?;
        Ok((result.credentials, generation))
    }

    /// Replace credentials that the server rejected
    ///
    /// `stale_generation` is the generation of the credentials the rejected
    /// call carried.
    pub(crate) async fn renew(&self, stale_generation: u64) -> Result<()> {
        let _guard = self.auth_lock.lock().await;

        let current = self.state.read().await.generation;
        if current != stale_generation {
            tracing::debug!(
                stale_generation,
                current,
                "Credentials already renewed by a concurrent call"
            );
            return Ok(());
        }

        self.authenticate_locked().await.map(|_| ())
    }

    async fn snapshot(&self) -> Option<(Credentials, u64)> {
        let state = self.state.read().await;
        state
            .credentials
            .as_ref()
            .map(|credentials| (credentials.clone(), state.generation))
    }

    /// Caller must hold `auth_lock`.
    async fn authenticate_locked(&self) -> Result<(AuthenticateResult, u64)> {
        let mut params = Map::new();
        params.insert("userName".to_string(), json!(self.user_name));
        params.insert("password".to_string(), json!(self.password));
        params.insert("database".to_string(), json!(self.database));
        params.insert("server".to_string(), json!(self.root_server));
        let request = RpcRequest::new(AUTHENTICATE_METHOD, params);

        let outcome = exchange(
            self.transport.as_ref(),
            &self.root_server,
            &request,
            self.compression,
        )
        .await
        .and_then(|value| {
            serde_json::from_value::<AuthenticateResult>(value)
                .map_err(|e| Error::Decode(format!("Invalid authentication result: {}", e)))
        });

        match outcome {
            Ok(result) => {
                let generation = self.apply(&result).await;
                if let Some(ref m) = self.metrics {
                    m.record_authentication("success");
                }
                tracing::info!(generation, "Authenticated");
                Ok((result, generation))
            }
            Err(error) => {
                if let Some(ref m) = self.metrics {
                    m.record_authentication("failure");
                }
                tracing::warn!(error = %error, "Authentication failed");
                Err(error)
            }
        }
    }

    async fn apply(&self, result: &AuthenticateResult) -> u64 {
        let mut state = self.state.write().await;

        if let Some(target) = result.redirect_target() {
            let host = normalize_host(target).to_string();
            if host != state.direct_server {
                tracing::info!(from = %state.direct_server, to = %host, "Redirected to home server");
                if let Some(ref m) = self.metrics {
                    m.record_redirect();
                }
            }
            state.direct_server = host;
        }

        state.credentials = Some(result.credentials.clone());
        state.generation += 1;
        state.generation
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("user_name", &self.user_name)
            .field("database", &self.database)
            .field("root_server", &self.root_server)
            .finish_non_exhaustive()
    }
}

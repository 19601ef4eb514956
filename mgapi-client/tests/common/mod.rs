//! Common test utilities for mgapi-client integration tests
//!
//! This module provides a scripted in-memory transport and canned response
//! bodies, so session and dispatch behavior can be tested without a real
//! server. HTTP-level behavior is tested against `wiremock` instead.

#![allow(dead_code)]

use futures::future::BoxFuture;
use mgapi_client::{ClientBuilder, MgClient, Transport, TransportRequest};
use mgapi_core::{codec, Error, Result, RpcRequest, AUTHENTICATE_METHOD};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One exchange seen by the transport
#[derive(Debug, Clone)]
pub struct Exchange {
    pub host: String,
    pub request: RpcRequest,
}

impl Exchange {
    /// Session id carried in the `credentials` param, if any
    pub fn session_id(&self) -> Option<String> {
        self.request
            .params
            .get("credentials")
            .and_then(|c| c.get("sessionId"))
            .and_then(Value::as_str)
            .map(str::to_string)
    }
}

/// What the transport answers with
#[derive(Debug, Clone)]
pub enum Reply {
    /// Response body as JSON
    Json(Value),
    /// Raw response body
    Raw(Vec<u8>),
    /// Response body delivered after a delay
    Delayed(Duration, Value),
    /// Transport failure
    Fail(Error),
}

type Handler = Box<dyn Fn(&Exchange) -> Reply + Send + Sync>;

/// In-memory transport that records exchanges and answers from a script
pub struct ScriptedTransport {
    handler: Handler,
    exchanges: Mutex<Vec<Exchange>>,
    completed: AtomicUsize,
}

impl ScriptedTransport {
    /// Answer exchanges in order from `replies`
    ///
    /// Panics if more exchanges happen than replies were scripted.
    pub fn replay(replies: Vec<Reply>) -> Arc<Self> {
        let queue = Mutex::new(VecDeque::from(replies));
        Self::with_handler(move |exchange| {
            queue.lock().unwrap().pop_front().unwrap_or_else(|| {
                panic!("unscripted exchange: {}", exchange.request.method)
            })
        })
    }

    /// Answer each exchange with `handler`
    pub fn with_handler<F>(handler: F) -> Arc<Self>
    where
        F: Fn(&Exchange) -> Reply + Send + Sync + 'static,
    {
        Arc::new(Self {
            handler: Box::new(handler),
            exchanges: Mutex::new(Vec::new()),
            completed: AtomicUsize::new(0),
        })
    }

    /// Every exchange so far, in send order
    pub fn exchanges(&self) -> Vec<Exchange> {
        self.exchanges.lock().unwrap().clone()
    }

    /// Hosts of every exchange, in send order
    pub fn hosts(&self) -> Vec<String> {
        self.exchanges().into_iter().map(|e| e.host).collect()
    }

    /// Methods of every exchange, in send order
    pub fn methods(&self) -> Vec<String> {
        self.exchanges()
            .into_iter()
            .map(|e| e.request.method)
            .collect()
    }

    /// Number of exchanges for `method`
    pub fn count(&self, method: &str) -> usize {
        self.exchanges()
            .iter()
            .filter(|e| e.request.method == method)
            .count()
    }

    /// Number of authentication exchanges
    pub fn authentications(&self) -> usize {
        self.count(AUTHENTICATE_METHOD)
    }

    /// Number of exchanges whose reply has been delivered
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

impl Transport for ScriptedTransport {
    fn send<'a>(&'a self, request: TransportRequest<'a>) -> BoxFuture<'a, Result<Vec<u8>>> {
        let decoded = codec::decode_request(&request.body).expect("undecodable request body");
        let exchange = Exchange {
            host: request.host.to_string(),
            request: decoded,
        };
        let reply = (self.handler)(&exchange);
        self.exchanges.lock().unwrap().push(exchange);

        Box::pin(async move {
            let outcome = match reply {
                Reply::Json(body) => Ok(body.to_string().into_bytes()),
                Reply::Raw(body) => Ok(body),
                Reply::Delayed(delay, body) => {
                    tokio::time::sleep(delay).await;
                    Ok(body.to_string().into_bytes())
                }
                Reply::Fail(error) => Err(error),
            };
            self.completed.fetch_add(1, Ordering::SeqCst);
            outcome
        })
    }
}

/// Successful `Authenticate` response body
pub fn auth_result(path: &str, session_id: &str) -> Value {
    json!({
        "result": {
            "path": path,
            "credentials": {
                "userName": "user@example.com",
                "database": "demo_db",
                "sessionId": session_id
            }
        }
    })
}

/// Successful call response body
pub fn success(result: Value) -> Value {
    json!({ "result": result })
}

/// Remote error body with one nested error
pub fn remote_error(nested_name: &str, message: &str) -> Value {
    json!({
        "error": {
            "name": "JSONRPCError",
            "message": message,
            "errors": [{ "name": nested_name, "message": message }]
        }
    })
}

/// Remote error body signalling an invalid session
pub fn invalid_user_error() -> Value {
    remote_error("InvalidUserException", "Incorrect login credentials")
}

/// Remote error body signalling an unavailable database
pub fn db_unavailable_error() -> Value {
    remote_error("DbUnavailableException", "Database is unavailable")
}

/// Password client on the default root server
pub fn builder(transport: Arc<ScriptedTransport>) -> ClientBuilder {
    ClientBuilder::new("user@example.com")
        .password("secret")
        .database("demo_db")
        .transport(transport)
}

/// Built password client on the default root server
pub fn client(transport: Arc<ScriptedTransport>) -> MgClient {
    builder(transport).build().unwrap()
}

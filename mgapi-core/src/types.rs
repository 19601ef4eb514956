//! Wire types for the service's JSON-RPC envelope
//!
//! The service speaks a simplified JSON-RPC dialect over a single HTTP
//! endpoint:
//!
//! - **Request**: `{ "method": ..., "params": { ... } }`, form-encoded
//! - **Response**: `{ "result": ... }` or `{ "error": { name, message, errors } }`
//!
//! There is no `jsonrpc` version field and no request id; one HTTP exchange
//! carries exactly one call. Compound work is expressed as a single
//! `ExecuteMultiCall` call whose result is a positional array.
//!
//! # Sessions
//!
//! `Authenticate` returns an [`AuthenticateResult`]: the [`Credentials`] to
//! attach to every later call, and a `path` naming the home server those
//! calls should be sent to (or [`THIS_SERVER`] to keep using the server that
//! was contacted).

use crate::error::{RemoteError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Server contacted when no server is configured
pub const DEFAULT_SERVER: &str = "my.geotab.com";

/// Redirection sentinel meaning "keep using the server you contacted"
pub const THIS_SERVER: &str = "ThisServer";

/// Path of the RPC endpoint on every server
pub const API_PATH: &str = "/apiv1";

/// Method name of the authentication exchange
pub const AUTHENTICATE_METHOD: &str = "Authenticate";

/// Method name of the batched call
pub const MULTICALL_METHOD: &str = "ExecuteMultiCall";

/// Parameter key the dispatcher fills with the held credentials
pub const CREDENTIALS_PARAM: &str = "credentials";

/// Session token set issued by a successful authentication
///
/// Opaque to the client apart from the three fields it needs to seed a
/// session from a pre-issued token. Any further fields the service returns
/// are kept in `extra` and sent back unchanged.
///
/// # Examples
///
/// ```rust
/// use mgapi_core::Credentials;
///
/// let credentials = Credentials::new("user@example.com", "fleet", "abc1234");
/// let json = serde_json::to_value(&credentials).unwrap();
/// assert_eq!(json["sessionId"], "abc1234");
/// assert_eq!(json["userName"], "user@example.com");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    /// User the session belongs to
    pub user_name: String,
    /// Database the session is bound to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    /// Server-issued session token
    pub session_id: String,
    /// Fields the client does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Credentials {
    /// Build credentials from a pre-issued session token
    pub fn new(
        user_name: impl Into<String>,
        database: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            user_name: user_name.into(),
            database: Some(database.into()),
            session_id: session_id.into(),
            extra: Map::new(),
        }
    }
}

/// Result payload of the `Authenticate` call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthenticateResult {
    /// Credentials to attach to subsequent calls
    pub credentials: Credentials,
    /// Home server for subsequent calls, or [`THIS_SERVER`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl AuthenticateResult {
    /// The host later calls must be redirected to, if any
    ///
    /// Returns `None` when the path is absent, empty, or the
    /// [`THIS_SERVER`] sentinel.
    pub fn redirect_target(&self) -> Option<&str> {
        match self.path.as_deref() {
            Some(path) if !path.is_empty() && path != THIS_SERVER => Some(path),
            _ => None,
        }
    }
}

/// A named remote call with its parameter mapping
///
/// `params` is always an object on the wire; the dispatcher inserts the
/// `credentials` key before transmission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    /// Remote method name
    pub method: String,
    /// Parameter mapping
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl RpcRequest {
    /// Create a request
    pub fn new(method: impl Into<String>, params: Map<String, Value>) -> Self {
        Self {
            method: method.into(),
            params,
        }
    }

    /// Whether this request is the authentication exchange
    ///
    /// Compared case-insensitively so `authenticate` issued through the
    /// generic call path is routed to the root server as well.
    pub fn is_authenticate(&self) -> bool {
        self.method.eq_ignore_ascii_case(AUTHENTICATE_METHOD)
    }
}

/// Decoded response body: a result or a remote error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    /// Successful result, absent on error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Remote error, absent on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RemoteError>,
}

impl RpcResponse {
    /// Create a success response
    pub fn success(result: Value) -> Self {
        Self {
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response
    pub fn failure(error: RemoteError) -> Self {
        Self {
            result: None,
            error: Some(error),
        }
    }

    /// Collapse into the call outcome
    ///
    /// An `error` wins over a `result`; a response with neither yields
    /// `null`.
    pub fn into_result(self) -> Result<Value> {
        match self.error {
            Some(error) => Err(error.into()),
            None => Ok(self.result.unwrap_or(Value::Null)),
        }
    }
}

/// One entry of an `ExecuteMultiCall` batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiCallEntry {
    /// Remote method name
    pub method: String,
    /// Parameter mapping, empty when the caller gave none
    #[serde(default)]
    pub params: Map<String, Value>,
}

/// Convert caller-supplied parameters into a parameter mapping
///
/// `null` becomes an empty mapping; anything other than an object is
/// rejected as an invalid argument.
pub fn params_from_value(params: Value) -> Result<Map<String, Value>> {
    match params {
        Value::Null => Ok(Map::new()),
        Value::Object(map) => Ok(map),
        other => Err(crate::Error::InvalidArgument(format!(
            "params must be an object, got {}",
            json_type_name(&other)
        ))),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

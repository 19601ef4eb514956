//! Core wire types and codec for mgapi
//!
//! This crate provides the foundation shared by the mgapi client:
//!
//! - **Types**: Credentials, requests, responses and multicall entries
//! - **Codec**: The form-encoded `JSON-RPC=` request envelope and response decoding
//! - **Error handling**: The error taxonomy every call reports through
//! - **Observability**: OpenTelemetry integration for traces, metrics and logs
//!
//! # Overview
//!
//! The remote service exposes one HTTP endpoint (`/apiv1`) that accepts a
//! named method and a parameter object, and answers with either a result or
//! a structured error. This crate is transport-agnostic: it encodes and
//! decodes envelopes, and leaves sending them to `mgapi-client`.
//!
//! # Example
//!
//! ```rust
//! use mgapi_core::{codec, RpcRequest};
//!
//! let request = RpcRequest::new("GetVersion", Default::default());
//! let body = codec::encode_request(&request).unwrap();
//!
//! let decoded = codec::decode_request(&body).unwrap();
//! assert_eq!(decoded.method, "GetVersion");
//!
//! let result = codec::decode_response(br#"{"result":"5.7.1234.6"}"#).unwrap();
//! assert_eq!(result, "5.7.1234.6");
//! ```

pub mod codec;
pub mod error;
pub mod observability;
pub mod types;

pub use error::{Error, RemoteError, RemoteSubError, Result, SESSION_INVALID_INDICATORS};
pub use observability::{init_observability, shutdown_observability, ObservabilityConfig};
pub use types::{
    params_from_value, AuthenticateResult, Credentials, MultiCallEntry, RpcRequest, RpcResponse,
    API_PATH, AUTHENTICATE_METHOD, CREDENTIALS_PARAM, DEFAULT_SERVER, MULTICALL_METHOD, THIS_SERVER,
};

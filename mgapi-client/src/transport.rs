//! HTTP transport for the single RPC endpoint
//!
//! The client core only needs one capability from the network: POST an
//! encoded body to `/apiv1` on a host and get back the raw response bytes,
//! or a transport error. [`Transport`] is that seam; [`HttpTransport`] is
//! the reqwest-backed implementation used by default.
//!
//! # Error Mapping
//!
//! - Non-200 status → `Error::Http { status, reason }` with the canonical
//!   reason phrase (`404` → `"Not Found"`)
//! - Connection, DNS, TLS, timeout or body read failure → `Error::Connection`
//!
//! Neither is ever retried by the transport.

use crate::config::{ClientConfig, Compression};
use futures::future::BoxFuture;
use mgapi_core::{codec, Error, Result, RpcRequest, API_PATH};
use reqwest::header::{ACCEPT_ENCODING, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde_json::Value;

/// Content type of the request body
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// One outgoing exchange
#[derive(Debug, Clone)]
pub struct TransportRequest<'a> {
    /// Bare host, without scheme or trailing slash
    pub host: &'a str,
    /// Endpoint path, always `/apiv1` for RPC calls
    pub path: &'a str,
    /// Form-encoded body (`JSON-RPC=...`)
    pub body: String,
    /// Compression to request for the response
    pub compression: Compression,
}

/// Sends one encoded request and yields the raw response body
///
/// Implementations must decompress the body before returning it and must
/// report any non-200 status as `Error::Http`.
pub trait Transport: Send + Sync {
    /// Perform one POST exchange
    fn send<'a>(&'a self, request: TransportRequest<'a>) -> BoxFuture<'a, Result<Vec<u8>>>;
}

/// reqwest-backed [`Transport`]
///
/// gzip decoding is enabled on the underlying client and keys off the
/// response's `Content-Encoding`. Each request states its own
/// `Accept-Encoding`: `gzip`, or `identity` for `Compression::None`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    scheme: &'static str,
}

impl HttpTransport {
    /// Build a transport from the client configuration
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the HTTP client cannot be constructed
    /// (e.g. the TLS backend fails to initialize).
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut builder = Client::builder()
            .gzip(true)
            .user_agent(concat!("mgapi/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }

        let client = builder
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            scheme: config.scheme(),
        })
    }

    fn url(&self, request: &TransportRequest<'_>) -> String {
        format!("{}://{}{}", self.scheme, request.host, request.path)
    }

    async fn post(&self, request: TransportRequest<'_>) -> Result<Vec<u8>> {
        let url = self.url(&request);

        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .header(ACCEPT_ENCODING, request.compression.accept_encoding())
            .body(request.body)
            .send()
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            tracing::debug!(url = %url, status = status.as_u16(), "Non-200 response");
            return Err(Error::Http {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

impl Transport for HttpTransport {
    fn send<'a>(&'a self, request: TransportRequest<'a>) -> BoxFuture<'a, Result<Vec<u8>>> {
        Box::pin(self.post(request))
    }
}

/// Encode, send and decode one RPC exchange
pub(crate) async fn exchange(
    transport: &dyn Transport,
    host: &str,
    request: &RpcRequest,
    compression: Compression,
) -> Result<Value> {
    let body = codec::encode_request(request)?;
    tracing::debug!(host = %host, method = %request.method, bytes = body.len(), "Sending request");

    let raw = transport
        .send(TransportRequest {
            host,
            path: API_PATH,
            body,
            compression,
        })
        .await?;

    codec::decode_response(&raw)
}

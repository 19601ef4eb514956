//! Session-authenticated JSON-RPC client over HTTP
//!
//! This crate provides a client for a JSON-RPC style service that sits
//! behind a single `/apiv1` endpoint and authenticates with a session
//! token. It keeps the session alive on the caller's behalf.
//!
//! # Core Features
//!
//! - **Lazy Authentication**: The first call authenticates; later calls reuse the session
//! - **Home-Server Routing**: Calls follow the server named by authentication
//! - **Transparent Renewal**: A rejected session is renewed and the call retried once
//! - **Multicall**: Several calls in one `ExecuteMultiCall` exchange, results in order
//! - **Bounded Waits**: Deadlines that report a timeout without cancelling the call
//! - **Observability**: OpenTelemetry integration for traces and metrics
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use mgapi_client::MgClient;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = MgClient::builder("user@example.com")
//!         .password("secret")
//!         .database("demo_db")
//!         .build()?;
//!
//!     let users: Vec<serde_json::Value> = client
//!         .call("Get", json!({"typeName": "User", "resultsLimit": 5}))
//!         .await?;
//!     println!("{} users", users.len());
//!
//!     Ok(())
//! }
//! ```
//!
//! # Reusing a Session
//!
//! ```rust,no_run
//! use mgapi_client::ClientBuilder;
//!
//! # async fn example() -> mgapi_core::Result<()> {
//! let client = ClientBuilder::new("user@example.com")
//!     .session_id("3fc6d3a1-session")
//!     .database("demo_db")
//!     .server("my3.geotab.com")
//!     .build()?;
//!
//! // No authentication exchange happens here
//! let version: String = client.call("GetVersion", ()).await?;
//! # Ok(())
//! # }
//! ```

mod client;
mod client_builder;
mod config;
mod dispatcher;
mod metrics;
mod multicall;
mod session;
mod transport;

pub use client::MgClient;
pub use client_builder::ClientBuilder;
pub use config::{normalize_host, ClientConfig, Compression};
pub use dispatcher::{Dispatcher, TimeoutNotifier};
pub use metrics::ClientMetrics;
pub use multicall::{MultiCall, MultiCallResponse};
pub use session::SessionManager;
pub use transport::{HttpTransport, Transport, TransportRequest, FORM_CONTENT_TYPE};

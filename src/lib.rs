//! MGAPI - session-authenticated JSON-RPC over HTTP
//!
//! This is the convenience crate that re-exports the MGAPI sub-crates.
//! Use it if you want a single dependency for the client and its wire
//! types.
//!
//! # Architecture
//!
//! - **mgapi-core**: Wire types, envelope codec, error taxonomy, observability
//! - **mgapi-client**: Configuration, transport, session, dispatch and multicall
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use mgapi::MgClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = MgClient::builder("user@example.com")
//!         .password("secret")
//!         .database("demo_db")
//!         .build()?;
//!
//!     let version: String = client.call("GetVersion", ()).await?;
//!     println!("Server version: {}", version);
//!
//!     Ok(())
//! }
//! ```

// Re-export all public APIs from sub-crates
pub use mgapi_client as client;
pub use mgapi_core as core;

// Convenience re-exports of the most commonly used types
pub use mgapi_client::{ClientBuilder, MgClient, MultiCall};
pub use mgapi_core::{Credentials, Error, Result};

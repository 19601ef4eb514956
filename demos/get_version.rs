//! Authenticate and fetch the server version
//!
//! Reads the identity from the environment:
//!
//! ```text
//! MGAPI_USER=user@example.com MGAPI_PASSWORD=secret MGAPI_DATABASE=demo_db \
//!     cargo run --example get_version
//! ```
//!
//! `MGAPI_SERVER` overrides the root server.

use mgapi::{ClientBuilder, MgClient};
use std::env;

fn env_var(name: &str) -> Result<String, Box<dyn std::error::Error>> {
    env::var(name).map_err(|_| format!("{} is not set", name).into())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mgapi_client=debug".into()),
        )
        .init();

    let mut builder = ClientBuilder::new(env_var("MGAPI_USER")?)
        .password(env_var("MGAPI_PASSWORD")?)
        .database(env_var("MGAPI_DATABASE")?);
    if let Ok(server) = env::var("MGAPI_SERVER") {
        builder = builder.server(server);
    }
    let client: MgClient = builder.build()?;

    let auth = client.authenticate().await?;
    println!("Authenticated as {}", auth.credentials.user_name);
    println!("Home server: {}", client.direct_server().await);

    let version: String = client.call("GetVersion", ()).await?;
    println!("Server version: {}", version);

    Ok(())
}

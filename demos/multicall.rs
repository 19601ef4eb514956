//! Batch several calls into one exchange
//!
//! Uses the same environment variables as the `get_version` demo and
//! prints the device count, the first few users and the server time.

use mgapi::{ClientBuilder, MultiCall};
use serde_json::{json, Value};
use std::env;
use std::time::Duration;

fn env_var(name: &str) -> Result<String, Box<dyn std::error::Error>> {
    env::var(name).map_err(|_| format!("{} is not set", name).into())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mgapi_client=info".into()),
        )
        .init();

    let client = ClientBuilder::new(env_var("MGAPI_USER")?)
        .password(env_var("MGAPI_PASSWORD")?)
        .database(env_var("MGAPI_DATABASE")?)
        .build()?;

    let mut batch = MultiCall::new();
    let devices = batch.add("GetCountOf", json!({"typeName": "Device"}))?;
    let users = batch.add("Get", json!({"typeName": "User", "resultsLimit": 5}))?;
    let time = batch.add("GetSystemTimeUtc", ())?;

    let responses = client
        .multicall_with_timeout(
            batch,
            Duration::from_secs(30),
            Some(Box::new(|| eprintln!("Multicall is taking longer than 30s"))),
        )
        .await?;

    let device_count: u64 = responses.get(devices)?;
    let users: Vec<Value> = responses.get(users)?;
    let time: String = responses.get(time)?;

    println!("Devices: {}", device_count);
    for user in &users {
        println!("User: {}", user["name"]);
    }
    println!("Server time: {}", time);

    Ok(())
}

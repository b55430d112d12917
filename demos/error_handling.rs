//! Example demonstrating error handling with a bearer-token connector.
//!
//! This example shows how to:
//! - Branch on `ErrorKind` instead of matching every variant
//! - Read server-declared error codes and reasons
//! - Tell a refused login apart from a transient network failure
//!
//! Run with: `cargo run --example error_handling -- <host> <client-id> <client-secret>`

use authwire::{Connector, Credentials, Error, ErrorKind, MemoryTokenStore};
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct OrderLookup {
    order_id: u64,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct Order {
    order_id: u64,
    status: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter("authwire=info")
        .init();

    let mut args = std::env::args().skip(1);
    let host = args.next().unwrap_or_else(|| "api.example.com".to_string());
    let client_id = args.next().unwrap_or_else(|| "client-id".to_string());
    let client_secret = args.next().unwrap_or_else(|| "client-secret".to_string());

    let connector = Connector::new(
        host,
        Credentials::bearer(client_id, client_secret),
        MemoryTokenStore::new(),
    )?;

    println!("=== Example 1: Branching on the error kind ===");
    match connector
        .send::<_, Order>("orders/get", &OrderLookup { order_id: 42 })
        .await
    {
        Ok(response) => println!("Order: {:?}", response.data),
        Err(e) => match e.kind() {
            ErrorKind::Unauthorized => {
                println!("Login refused, check the client credentials");
                println!("  Code: {:?}", e.code());
                println!("  Reason: {}", e.reason());
            }
            ErrorKind::Network => {
                println!("Network problem (timeout: {}): {}", e.is_timeout(), e);
            }
            ErrorKind::Application => {
                println!("Server rejected the request: {}", e);
            }
            ErrorKind::InvalidResponse | ErrorKind::Serialization => {
                println!("Protocol mismatch: {}", e);
                if let Some(raw) = e.raw_response() {
                    println!(
                        "  Raw response (first 200 chars): {}",
                        raw.chars().take(200).collect::<String>()
                    );
                }
            }
        },
    }
    println!();

    println!("=== Example 2: Matching a specific server error ===");
    match connector
        .send::<_, Order>("orders/get", &OrderLookup { order_id: 0 })
        .await
    {
        Ok(response) => println!("Unexpected success: {:?}", response.data),
        Err(Error::Application {
            code,
            reason,
            status,
        }) => {
            println!("Application error!");
            println!("  Code: {}", code);
            println!("  Reason: {}", reason);
            println!("  Status: {}", status);
        }
        Err(e) => println!("Other error: {}", e),
    }

    Ok(())
}

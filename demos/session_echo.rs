//! Sends one request through a session-token connector.
//!
//! This example shows how to:
//! - Build a connector from a uid/master-token pair
//! - Persist the session token between runs with a custom `TokenStore`
//! - Send a typed request and read the typed reply
//!
//! Run with: `cargo run --example session_echo -- <host> <uid> <master-token>`

use authwire::{Connector, Credentials, Error, TokenStore};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Serialize, Deserialize)]
struct EchoData {
    key_a: i64,
    message: String,
}

/// Keeps the session token in a file next to the binary.
struct FileTokenStore {
    path: PathBuf,
}

impl TokenStore for FileTokenStore {
    fn credential(&self) -> Option<String> {
        std::fs::read_to_string(&self.path)
            .ok()
            .map(|token| token.trim().to_string())
    }

    fn set_credential(&self, credential: &str) {
        if let Err(e) = std::fs::write(&self.path, credential) {
            tracing::warn!(error = %e, path = %self.path.display(), "Could not persist session token");
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_env_filter("authwire=debug,session_echo=info")
        .init();

    let mut args = std::env::args().skip(1);
    let host = args.next().unwrap_or_else(|| "api.example.com".to_string());
    let uid = args.next().unwrap_or_else(|| "test".to_string());
    let master_token = args.next().unwrap_or_else(|| "test".to_string());

    let connector = Connector::builder()
        .host(host)
        .credentials(Credentials::session(uid, master_token))
        .token_store(FileTokenStore {
            path: PathBuf::from(".session-token"),
        })
        // Logs raw bodies; keep it off in production.
        .debug(true)
        .build()?;

    let sent = EchoData {
        key_a: 1024,
        message: "This is a test".to_string(),
    };

    let response = connector.send::<_, EchoData>("echo", &sent).await?;

    println!("Server response: {:?}", response.data);
    println!("Request latency: {:?}", response.latency);
    println!("Re-authenticated: {}", response.was_reauthenticated());

    Ok(())
}

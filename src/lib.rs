//! # authwire - an authenticated JSON-over-HTTPS API connector
//!
//! authwire hides HTTP transport, JSON encoding and token lifecycle behind a
//! single call: [`Connector::send`]. The connector obtains a credential from
//! long-lived credential material, attaches it to every request, notices when
//! the server rejects it, re-authenticates once and retries the call once.
//!
//! ## Quick Start
//!
//! ```no_run
//! use authwire::{Connector, Credentials, MemoryTokenStore};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize)]
//! struct CreateNote {
//!     title: String,
//! }
//!
//! #[derive(Deserialize)]
//! struct Note {
//!     id: u64,
//!     title: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), authwire::Error> {
//!     let connector = Connector::builder()
//!         .host("api.example.com")
//!         .credentials(Credentials::session("device-42", "master-token"))
//!         .token_store(MemoryTokenStore::new())
//!         .build()?;
//!
//!     // POST https://api.example.com/api/notes/create
//!     let note = connector
//!         .send::<_, Note>("notes/create", &CreateNote { title: "hello".to_string() })
//!         .await?;
//!     println!("Created note {} ({})", note.data.id, note.data.title);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Credential material
//!
//! Two strategies are supported, chosen by the [`Credentials`] variant:
//!
//! - **Session**: a uid/master-token pair is posted to `auth`; the returned
//!   session token travels in a `Session-Token` header. The server marks error
//!   bodies with an `Error` response header, and error code 70 means the
//!   session is missing or expired.
//! - **Bearer**: a client id/secret pair is posted to `auth/token` with the
//!   client-credentials grant; the returned access token travels as
//!   `Authorization: Bearer`. The server signals errors with HTTP status
//!   codes, and 401 means the token was rejected.
//!
//! ## Error Handling
//!
//! Every failure is an [`Error`]; [`Error::kind`] reduces it to an
//! [`ErrorKind`] for branching:
//!
//! ```no_run
//! use authwire::{Connector, ErrorKind};
//!
//! # async fn example(connector: Connector) {
//! match connector.send::<_, serde_json::Value>("echo", &serde_json::json!({})).await {
//!     Ok(response) => println!("Success: {:?}", response.data),
//!     Err(e) => match e.kind() {
//!         ErrorKind::Unauthorized => eprintln!("Login needed: {}", e.reason()),
//!         ErrorKind::Network => eprintln!("Try again later: {}", e),
//!         _ => eprintln!("Request failed: {}", e),
//!     },
//! }
//! # }
//! ```
//!
//! ## Token persistence
//!
//! Implement [`TokenStore`] to keep the credential across restarts. The
//! connector reads it once when built and writes every new credential back.

mod auth;
mod client;
pub mod endpoint;
mod error;
pub mod protocol;
mod response;
mod store;

pub use auth::Credentials;
pub use client::{Connector, ConnectorBuilder};
pub use error::{Error, ErrorCode, ErrorKind, Result};
pub use protocol::Convention;
pub use response::Response;
pub use store::{MemoryTokenStore, TokenStore};

//! Credential material and the auth sub-protocol.
//!
//! A connector is built with one [`Credentials`] value. It decides which
//! operation trades the long-lived material for a short-lived credential, how
//! that credential is attached to later requests, and which wire
//! [`Convention`] the server speaks.

use crate::error::{Error, ErrorCode, Result};
use crate::protocol::{
    Convention, CLIENT_CREDENTIALS_GRANT, SESSION_AUTH_OPERATION, SESSION_TOKEN_HEADER,
    TOKEN_AUTH_OPERATION,
};
use http::header::AUTHORIZATION;
use http::{HeaderName, HeaderValue, StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Long-lived secrets used only to obtain a credential.
///
/// # Examples
///
/// ```
/// use authwire::Credentials;
///
/// let session = Credentials::session("device-42", "master-token");
/// assert_eq!(session.auth_operation(), "auth");
///
/// let bearer = Credentials::bearer("client-id", "client-secret");
/// assert_eq!(bearer.auth_operation(), "auth/token");
///
/// // Secrets never show up in debug output.
/// assert!(!format!("{:?}", bearer).contains("client-secret"));
/// ```
#[derive(Clone)]
pub enum Credentials {
    /// A uid/master-token pair exchanged for a session token. The server
    /// flags errors with a response header and expects the session token in
    /// a `Session-Token` request header.
    Session {
        /// The account or device identifier.
        uid: String,
        /// The long-lived master token.
        master_token: String,
    },

    /// An OAuth client id/secret pair exchanged for a bearer access token
    /// with the client-credentials grant. The server signals errors with HTTP
    /// status codes and expects `Authorization: Bearer <token>`.
    Bearer {
        /// The OAuth client id.
        client_id: String,
        /// The OAuth client secret.
        client_secret: String,
    },
}

impl Credentials {
    /// Creates session credential material.
    pub fn session(uid: impl Into<String>, master_token: impl Into<String>) -> Self {
        Credentials::Session {
            uid: uid.into(),
            master_token: master_token.into(),
        }
    }

    /// Creates client-credentials material.
    pub fn bearer(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Credentials::Bearer {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// The operation that issues credentials. It never receives one.
    pub fn auth_operation(&self) -> &'static str {
        match self {
            Credentials::Session { .. } => SESSION_AUTH_OPERATION,
            Credentials::Bearer { .. } => TOKEN_AUTH_OPERATION,
        }
    }

    /// The error-signaling convention of servers using this kind of material.
    pub fn convention(&self) -> Convention {
        match self {
            Credentials::Session { .. } => Convention::HeaderFlagged,
            Credentials::Bearer { .. } => Convention::StatusCoded,
        }
    }

    /// Builds the request header that carries `credential`.
    pub(crate) fn credential_header(&self, credential: &str) -> Result<(HeaderName, HeaderValue)> {
        let (name, value) = match self {
            Credentials::Session { .. } => (
                HeaderName::from_static(SESSION_TOKEN_HEADER),
                HeaderValue::try_from(credential),
            ),
            Credentials::Bearer { .. } => (
                AUTHORIZATION,
                HeaderValue::try_from(format!("Bearer {}", credential)),
            ),
        };
        let mut value = value
            .map_err(|e| Error::Internal(format!("Credential is not a valid header value: {}", e)))?;
        value.set_sensitive(true);
        Ok((name, value))
    }

    pub(crate) fn auth_request(&self) -> AuthRequest<'_> {
        match self {
            Credentials::Session { uid, master_token } => {
                AuthRequest::Session(SessionAuthRequest { uid, master_token })
            }
            Credentials::Bearer {
                client_id,
                client_secret,
            } => AuthRequest::Token(TokenRequest {
                grant_type: CLIENT_CREDENTIALS_GRANT,
                client_id,
                client_secret,
            }),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Session { uid, .. } => f
                .debug_struct("Session")
                .field("uid", uid)
                .field("master_token", &"<redacted>")
                .finish(),
            Credentials::Bearer { client_id, .. } => f
                .debug_struct("Bearer")
                .field("client_id", client_id)
                .field("client_secret", &"<redacted>")
                .finish(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub(crate) enum AuthRequest<'a> {
    Session(SessionAuthRequest<'a>),
    Token(TokenRequest<'a>),
}

#[derive(Debug, Serialize)]
pub(crate) struct SessionAuthRequest<'a> {
    uid: &'a str,
    master_token: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SessionAuthResponse {
    #[serde(default)]
    auth: bool,
    #[serde(default)]
    session_token: String,
}

impl SessionAuthResponse {
    pub(crate) fn into_credential(self) -> Result<String> {
        if !self.auth || self.session_token.is_empty() {
            return Err(Error::Internal("invalid auth response".to_string()));
        }
        Ok(self.session_token)
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct TokenRequest<'a> {
    grant_type: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    #[serde(default)]
    access_token: String,
    #[serde(default)]
    error: Option<ErrorCode>,
    #[serde(default)]
    error_description: String,
}

impl TokenResponse {
    /// An empty access token is a refusal even on HTTP 200.
    pub(crate) fn into_credential(self, status: StatusCode) -> Result<String> {
        if !self.access_token.is_empty() {
            return Ok(self.access_token);
        }

        let reason = if self.error_description.is_empty() {
            "token endpoint returned no access token".to_string()
        } else {
            self.error_description
        };
        Err(Error::Unauthorized {
            code: self.error,
            reason,
            status,
        })
    }
}

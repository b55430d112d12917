//! Error types for connector calls.
//!
//! Every failure, whether it happened on the wire, while encoding the request,
//! while decoding the reply, or was declared by the server itself, surfaces as
//! one [`Error`]. Callers branch on [`Error::kind`] rather than on individual
//! variants when all they need is "retry later", "log in again" or "give up".

use http::StatusCode;
use serde::Deserialize;
use std::fmt;

/// The closed set of failure categories a caller can branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The request never produced an HTTP response (connect failure, timeout, ...).
    Network,
    /// The request could not be built: encoding, configuration or internal failures.
    Serialization,
    /// The server answered but the body could not be decoded.
    InvalidResponse,
    /// The server rejected the credential, or refused to issue one.
    Unauthorized,
    /// The server declared a business error unrelated to authentication.
    Application,
}

impl ErrorKind {
    /// Returns a stable lowercase name for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Network => "network",
            ErrorKind::Serialization => "serialization",
            ErrorKind::InvalidResponse => "invalid_response",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::Application => "application",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A server-declared error identifier.
///
/// Header-flagged servers report numeric codes (`{"code": 70}`), status-coded
/// servers report string ids (`{"error": "invalid_client"}`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ErrorCode {
    /// A numeric code.
    Number(i64),
    /// A textual identifier.
    Text(String),
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCode::Number(code) => write!(f, "{}", code),
            ErrorCode::Text(code) => f.write_str(code),
        }
    }
}

impl From<i64> for ErrorCode {
    fn from(code: i64) -> Self {
        ErrorCode::Number(code)
    }
}

impl From<&str> for ErrorCode {
    fn from(code: &str) -> Self {
        ErrorCode::Text(code.to_string())
    }
}

/// The error type for connector calls.
///
/// # Examples
///
/// ```no_run
/// use authwire::{Connector, Credentials, Error, ErrorKind};
///
/// # async fn example() -> Result<(), Error> {
/// let connector = Connector::builder()
///     .host("api.example.com")
///     .credentials(Credentials::session("uid", "master-token"))
///     .build()?;
///
/// match connector.send::<_, serde_json::Value>("echo", &serde_json::json!({})).await {
///     Ok(response) => println!("Success: {:?}", response.data),
///     Err(e) if e.kind() == ErrorKind::Unauthorized => {
///         eprintln!("Credential material was rejected: {}", e.reason());
///     }
///     Err(Error::Application { code, reason, .. }) => {
///         eprintln!("Server said [{}] {}", code, reason);
///     }
///     Err(e) => eprintln!("Other error: {}", e),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A network-level error occurred (connection failed, DNS lookup failed,
    /// the request timed out, etc.).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Failed to serialize the request body. No request was sent.
    #[error("Failed to serialize request: {0}")]
    SerializationFailed(String),

    /// Invalid configuration was provided, such as a malformed header.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// The composed request URL could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The server answered, but not in a way the connector can act on.
    ///
    /// Raised when an auth exchange succeeds at the HTTP level without
    /// actually granting a session.
    #[error("Internal error: {0}")]
    Internal(String),

    /// Failed to deserialize a response body, on either the success or the
    /// error path.
    #[error("Failed to deserialize response (status {status}): {serde_error}")]
    DeserializationFailed {
        /// The raw response body that failed to deserialize
        raw_response: String,
        /// The serde error message
        serde_error: String,
        /// The HTTP status code
        status: StatusCode,
    },

    /// The server rejected the credential, or the auth exchange was refused.
    #[error("Unauthorized (status {status}): {reason}")]
    Unauthorized {
        /// The server's own error identifier, when it sent one
        code: Option<ErrorCode>,
        /// Human-readable reason
        reason: String,
        /// The HTTP status code
        status: StatusCode,
    },

    /// The server declared an application error.
    #[error("Application error [{code}] (status {status}): {reason}")]
    Application {
        /// The server's error identifier
        code: ErrorCode,
        /// Human-readable reason
        reason: String,
        /// The HTTP status code
        status: StatusCode,
    },
}

impl Error {
    /// Returns the category of this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use authwire::{Error, ErrorKind};
    /// use http::StatusCode;
    ///
    /// let err = Error::Unauthorized {
    ///     code: Some(70.into()),
    ///     reason: "session required".to_string(),
    ///     status: StatusCode::OK,
    /// };
    /// assert_eq!(err.kind(), ErrorKind::Unauthorized);
    ///
    /// let err = Error::SerializationFailed("key must be a string".to_string());
    /// assert_eq!(err.kind(), ErrorKind::Serialization);
    /// ```
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Network(_) => ErrorKind::Network,
            Error::SerializationFailed(_)
            | Error::ConfigurationError(_)
            | Error::InvalidUrl(_)
            | Error::Internal(_) => ErrorKind::Serialization,
            Error::DeserializationFailed { .. } => ErrorKind::InvalidResponse,
            Error::Unauthorized { .. } => ErrorKind::Unauthorized,
            Error::Application { .. } => ErrorKind::Application,
        }
    }

    /// Returns `true` if the server rejected the credential.
    pub fn is_unauthorized(&self) -> bool {
        self.kind() == ErrorKind::Unauthorized
    }

    /// Returns `true` if the request hit the per-request timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Network(e) if e.is_timeout())
    }

    /// Returns the human-readable reason, without the kind prefix used by `Display`.
    pub fn reason(&self) -> String {
        match self {
            Error::Network(e) => e.to_string(),
            Error::SerializationFailed(reason)
            | Error::ConfigurationError(reason)
            | Error::Internal(reason) => reason.clone(),
            Error::InvalidUrl(e) => e.to_string(),
            Error::DeserializationFailed { serde_error, .. } => serde_error.clone(),
            Error::Unauthorized { reason, .. } | Error::Application { reason, .. } => {
                reason.clone()
            }
        }
    }

    /// Returns the HTTP status code if a response was received.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Network(e) => e.status(),
            Error::DeserializationFailed { status, .. }
            | Error::Unauthorized { status, .. }
            | Error::Application { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns the server-declared error code, if any.
    pub fn code(&self) -> Option<&ErrorCode> {
        match self {
            Error::Unauthorized { code, .. } => code.as_ref(),
            Error::Application { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Returns the raw response body for decode failures.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Error::DeserializationFailed { raw_response, .. } => Some(raw_response),
            _ => None,
        }
    }
}

/// A specialized `Result` type for connector calls.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_cover_internal_failures() {
        assert_eq!(
            Error::ConfigurationError("bad header".to_string()).kind(),
            ErrorKind::Serialization
        );
        assert_eq!(
            Error::Internal("invalid auth response".to_string()).kind(),
            ErrorKind::Serialization
        );
        let parse_err = url::Url::parse("not a url").unwrap_err();
        assert_eq!(Error::InvalidUrl(parse_err).kind(), ErrorKind::Serialization);
    }

    #[test]
    fn test_application_error_accessors() {
        let err = Error::Application {
            code: ErrorCode::Number(12),
            reason: "quota exceeded".to_string(),
            status: StatusCode::OK,
        };

        assert_eq!(err.kind(), ErrorKind::Application);
        assert!(!err.is_unauthorized());
        assert_eq!(err.reason(), "quota exceeded");
        assert_eq!(err.status(), Some(StatusCode::OK));
        assert_eq!(err.code(), Some(&ErrorCode::Number(12)));
        assert_eq!(
            err.to_string(),
            "Application error [12] (status 200 OK): quota exceeded"
        );
    }

    #[test]
    fn test_error_code_accepts_numbers_and_strings() {
        let code: ErrorCode = serde_json::from_str("70").unwrap();
        assert_eq!(code, ErrorCode::Number(70));

        let code: ErrorCode = serde_json::from_str("\"invalid_client\"").unwrap();
        assert_eq!(code, ErrorCode::Text("invalid_client".to_string()));
        assert_eq!(code.to_string(), "invalid_client");
    }

    #[test]
    fn test_deserialization_failure_keeps_raw_body() {
        let err = Error::DeserializationFailed {
            raw_response: "<html>".to_string(),
            serde_error: "expected value".to_string(),
            status: StatusCode::BAD_GATEWAY,
        };

        assert_eq!(err.kind(), ErrorKind::InvalidResponse);
        assert_eq!(err.raw_response(), Some("<html>"));
        assert_eq!(err.status(), Some(StatusCode::BAD_GATEWAY));
        assert!(err.code().is_none());
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(ErrorKind::InvalidResponse.to_string(), "invalid_response");
        assert_eq!(ErrorKind::Unauthorized.as_str(), "unauthorized");
    }
}

//! Wire conventions and response classification.
//!
//! Servers speaking to this connector signal failures in one of two ways,
//! captured by [`Convention`]. Both are normalized into the same [`Error`]
//! taxonomy before the connector decides whether to re-authenticate.

use crate::error::{Error, ErrorCode, Result};
use http::{HeaderMap, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

/// Path segment placed between the host and the operation name.
pub const API_PATH_PREFIX: &str = "/api/";

/// Per-request timeout applied unless the builder overrides it.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Operation used by the session strategy to obtain a session token.
pub const SESSION_AUTH_OPERATION: &str = "auth";

/// Operation used by the bearer strategy to obtain an access token.
pub const TOKEN_AUTH_OPERATION: &str = "auth/token";

/// Request header carrying the session token.
pub const SESSION_TOKEN_HEADER: &str = "session-token";

/// Response header marking the body as an error payload.
pub const ERROR_MARKER_HEADER: &str = "error";

/// Error code a header-flagged server uses for "session missing or expired".
pub const SESSION_REQUIRED_CODE: i64 = 70;

/// OAuth grant type sent by the bearer strategy.
pub const CLIENT_CREDENTIALS_GRANT: &str = "client_credentials";

/// How a server tells success bodies from error bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Convention {
    /// An `Error` response header flags the body as an error payload,
    /// whatever the status code. The payload is
    /// `{"error": {"code": .., "reason": ..}}`.
    HeaderFlagged,

    /// Any non-2xx status flags the body as an error payload shaped
    /// `{"error": .., "error_description": ..}`. A 401 always means the
    /// credential was rejected.
    StatusCoded,
}

#[derive(Debug, Deserialize)]
struct FlaggedErrorEnvelope {
    error: FlaggedError,
}

#[derive(Debug, Deserialize)]
struct FlaggedError {
    code: ErrorCode,
    #[serde(default)]
    reason: String,
}

#[derive(Debug, Deserialize)]
struct StatusErrorBody {
    error: ErrorCode,
    #[serde(default, alias = "message")]
    error_description: String,
}

impl Convention {
    /// Turns one HTTP response into either the decoded success payload or a
    /// classified error.
    pub(crate) fn classify<Res>(
        self,
        status: StatusCode,
        headers: &HeaderMap,
        raw_body: &str,
    ) -> Result<Res>
    where
        Res: DeserializeOwned,
    {
        match self {
            Convention::HeaderFlagged => {
                if headers.contains_key(ERROR_MARKER_HEADER) {
                    let envelope: FlaggedErrorEnvelope = decode(status, raw_body)?;
                    let FlaggedError { code, reason } = envelope.error;

                    if code == ErrorCode::Number(SESSION_REQUIRED_CODE) {
                        return Err(Error::Unauthorized {
                            code: Some(code),
                            reason,
                            status,
                        });
                    }
                    return Err(Error::Application {
                        code,
                        reason,
                        status,
                    });
                }
                decode(status, raw_body)
            }
            Convention::StatusCoded => {
                if status == StatusCode::UNAUTHORIZED {
                    // The body is informative only; a 401 stands on its own.
                    let (code, reason) = match serde_json::from_str::<StatusErrorBody>(raw_body) {
                        Ok(body) => (Some(body.error), body.error_description),
                        Err(_) => (None, raw_body.trim().to_string()),
                    };
                    let reason = if reason.is_empty() {
                        status
                            .canonical_reason()
                            .unwrap_or("Unauthorized")
                            .to_string()
                    } else {
                        reason
                    };
                    return Err(Error::Unauthorized {
                        code,
                        reason,
                        status,
                    });
                }

                if !status.is_success() {
                    let body: StatusErrorBody = decode(status, raw_body)?;
                    return Err(Error::Application {
                        code: body.error,
                        reason: body.error_description,
                        status,
                    });
                }
                decode(status, raw_body)
            }
        }
    }
}

fn decode<T>(status: StatusCode, raw_body: &str) -> Result<T>
where
    T: DeserializeOwned,
{
    serde_json::from_str::<T>(raw_body).map_err(|e| {
        tracing::error!(
            error = %e,
            status = status.as_u16(),
            raw_response = %raw_body,
            "Failed to deserialize response"
        );

        Error::DeserializationFailed {
            raw_response: raw_body.to_string(),
            serde_error: e.to_string(),
            status,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use http::HeaderValue;
    use serde_json::Value;

    fn flagged() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ERROR_MARKER_HEADER, HeaderValue::from_static("1"));
        headers
    }

    #[test]
    fn test_header_flagged_success_ignores_status() {
        let data: Value = Convention::HeaderFlagged
            .classify(StatusCode::INTERNAL_SERVER_ERROR, &HeaderMap::new(), r#"{"ok":true}"#)
            .unwrap();
        assert_eq!(data["ok"], true);
    }

    #[test]
    fn test_header_flagged_session_required_is_unauthorized() {
        let err = Convention::HeaderFlagged
            .classify::<Value>(
                StatusCode::OK,
                &flagged(),
                r#"{"error":{"code":70,"reason":"session required"}}"#,
            )
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        assert_eq!(err.reason(), "session required");
        assert_eq!(err.code(), Some(&ErrorCode::Number(70)));
    }

    #[test]
    fn test_header_flagged_other_code_is_application() {
        let err = Convention::HeaderFlagged
            .classify::<Value>(
                StatusCode::OK,
                &flagged(),
                r#"{"error":{"code":12,"reason":"no such record"}}"#,
            )
            .unwrap_err();

        match err {
            Error::Application { code, reason, status } => {
                assert_eq!(code, ErrorCode::Number(12));
                assert_eq!(reason, "no such record");
                assert_eq!(status, StatusCode::OK);
            }
            other => panic!("Expected Application, got {:?}", other),
        }
    }

    #[test]
    fn test_header_flagged_garbled_error_body() {
        let err = Convention::HeaderFlagged
            .classify::<Value>(StatusCode::OK, &flagged(), "oops")
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidResponse);
        assert_eq!(err.raw_response(), Some("oops"));
    }

    #[test]
    fn test_status_coded_401_without_body() {
        let err = Convention::StatusCoded
            .classify::<Value>(StatusCode::UNAUTHORIZED, &HeaderMap::new(), "")
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        assert_eq!(err.reason(), "Unauthorized");
        assert!(err.code().is_none());
    }

    #[test]
    fn test_status_coded_401_with_body() {
        let err = Convention::StatusCoded
            .classify::<Value>(
                StatusCode::UNAUTHORIZED,
                &HeaderMap::new(),
                r#"{"error":"invalid_token","error_description":"token expired"}"#,
            )
            .unwrap_err();

        assert_eq!(err.code(), Some(&ErrorCode::Text("invalid_token".to_string())));
        assert_eq!(err.reason(), "token expired");
    }

    #[test]
    fn test_status_coded_non_2xx_is_application() {
        let err = Convention::StatusCoded
            .classify::<Value>(
                StatusCode::CONFLICT,
                &HeaderMap::new(),
                r#"{"error":"duplicate","message":"already exists"}"#,
            )
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Application);
        assert_eq!(err.reason(), "already exists");
        assert_eq!(err.status(), Some(StatusCode::CONFLICT));
    }

    #[test]
    fn test_status_coded_undecodable_error_body() {
        let err = Convention::StatusCoded
            .classify::<Value>(StatusCode::BAD_GATEWAY, &HeaderMap::new(), "<html>")
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidResponse);
        assert_eq!(err.status(), Some(StatusCode::BAD_GATEWAY));
    }

    #[test]
    fn test_status_coded_ignores_error_header() {
        let data: Value = Convention::StatusCoded
            .classify(StatusCode::OK, &flagged(), r#"{"n":1}"#)
            .unwrap();
        assert_eq!(data["n"], 1);
    }
}

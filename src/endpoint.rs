//! Endpoint targets: where an operation is sent.

use crate::protocol::API_PATH_PREFIX;
use crate::Result;
use url::Url;

/// The host half of every request URL.
///
/// Operations are appended below [`API_PATH_PREFIX`], so operation `echo` on
/// host `api.example.com` resolves to `https://api.example.com/api/echo`.
#[derive(Debug, Clone)]
pub struct Endpoint {
    /// The host, optionally with port and, in plain-host mode, the scheme.
    pub host: String,

    /// Whether `host` already carries its scheme (e.g. `http://localhost:8080`).
    /// When `false`, `https://` is prefixed.
    pub host_includes_protocol: bool,
}

impl Endpoint {
    /// Creates a new `Endpoint`.
    pub fn new(host: impl Into<String>, host_includes_protocol: bool) -> Self {
        Self {
            host: host.into(),
            host_includes_protocol,
        }
    }

    /// Composes the URL for `operation`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidUrl`] if the result is not a valid URL.
    ///
    /// # Examples
    ///
    /// ```
    /// use authwire::endpoint::Endpoint;
    ///
    /// let endpoint = Endpoint::new("api.example.com", false);
    /// assert_eq!(
    ///     endpoint.url_for("echo").unwrap().as_str(),
    ///     "https://api.example.com/api/echo"
    /// );
    ///
    /// let endpoint = Endpoint::new("http://localhost:8080", true);
    /// assert_eq!(
    ///     endpoint.url_for("auth/token").unwrap().as_str(),
    ///     "http://localhost:8080/api/auth/token"
    /// );
    /// ```
    pub fn url_for(&self, operation: &str) -> Result<Url> {
        let scheme = if self.host_includes_protocol {
            ""
        } else {
            "https://"
        };
        let host = self.host.trim_end_matches('/');
        let operation = operation.trim_start_matches('/');

        let url = Url::parse(&format!("{scheme}{host}{API_PATH_PREFIX}{operation}"))?;
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tolerates_stray_slashes() {
        let endpoint = Endpoint::new("api.example.com/", false);
        assert_eq!(
            endpoint.url_for("/echo").unwrap().as_str(),
            "https://api.example.com/api/echo"
        );
    }

    #[test]
    fn test_keeps_port() {
        let endpoint = Endpoint::new("api.example.com:8443", false);
        assert_eq!(
            endpoint.url_for("echo").unwrap().as_str(),
            "https://api.example.com:8443/api/echo"
        );
    }

    #[test]
    fn test_rejects_invalid_host() {
        let endpoint = Endpoint::new("bad host", false);
        assert!(matches!(
            endpoint.url_for("echo"),
            Err(crate::Error::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_host_without_scheme_in_plain_host_mode_is_invalid() {
        // "api.example.com/api/echo" has no scheme at all.
        let endpoint = Endpoint::new("api.example.com", true);
        assert!(endpoint.url_for("echo").is_err());
    }
}

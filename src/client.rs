//! The connector: one `send` call, one credential, at most one re-authentication.
//!
//! The [`Connector`] type is the main entry point. Use [`ConnectorBuilder`] to
//! configure and create connectors.

use crate::{
    auth::{Credentials, SessionAuthResponse, TokenResponse},
    endpoint::Endpoint,
    protocol::DEFAULT_TIMEOUT,
    store::{MemoryTokenStore, TokenStore},
    Error, Response, Result,
};
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderName, HeaderValue};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};

/// Emits a step-level trace event when the connector was built with `debug(true)`.
macro_rules! step {
    ($connector:expr, $($arg:tt)+) => {
        if $connector.inner.debug {
            tracing::debug!($($arg)+);
        }
    };
}

/// A client for a JSON-over-HTTPS API that manages its own credential.
///
/// Every call is a `POST` of a JSON body to `<host>/api/<operation>`. The
/// connector attaches the current credential, and when the server rejects it,
/// trades the configured [`Credentials`] for a new one and retries the call
/// once. Callers never handle tokens.
///
/// Connectors are cheap to clone and may be shared between tasks. Concurrent
/// calls that hit the same expired credential re-authenticate only once.
///
/// # Examples
///
/// ```no_run
/// use authwire::{Connector, Credentials, MemoryTokenStore};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize)]
/// struct Ping { message: String }
///
/// #[derive(Deserialize)]
/// struct Pong { message: String }
///
/// # async fn example() -> Result<(), authwire::Error> {
/// let connector = Connector::builder()
///     .host("api.example.com")
///     .credentials(Credentials::session("device-42", "master-token"))
///     .token_store(MemoryTokenStore::new())
///     .build()?;
///
/// let pong = connector
///     .send::<_, Pong>("echo", &Ping { message: "hi".to_string() })
///     .await?;
/// println!("Server said: {}", pong.data.message);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Connector {
    inner: Arc<ConnectorInner>,
}

struct ConnectorInner {
    http_client: reqwest::Client,
    endpoint: Endpoint,
    credentials: Credentials,
    token_store: Box<dyn TokenStore>,
    extra_headers: HeaderMap,
    debug: bool,
    /// Never held across network I/O or `TokenStore` calls.
    credential: RwLock<Option<String>>,
    /// Serializes authentication exchanges.
    auth_gate: Mutex<()>,
}

impl Connector {
    /// Creates a new `ConnectorBuilder` for configuring a connector.
    pub fn builder() -> ConnectorBuilder {
        ConnectorBuilder::new()
    }

    /// Creates a connector with default configuration.
    ///
    /// The initial credential is read from `token_store`.
    ///
    /// # Errors
    ///
    /// Returns an error if `host` does not form a valid URL.
    pub fn new(
        host: impl Into<String>,
        credentials: Credentials,
        token_store: impl TokenStore + 'static,
    ) -> Result<Self> {
        Self::builder()
            .host(host)
            .credentials(credentials)
            .token_store(token_store)
            .build()
    }

    /// Sends `request` to `operation` and decodes the reply.
    ///
    /// If the server rejects the current credential (or none is held yet),
    /// the connector authenticates and retries exactly once. The outcome of
    /// the retry is returned as is, even if it is another rejection.
    ///
    /// # Errors
    ///
    /// * [`Error::SerializationFailed`] if `request` cannot be encoded; nothing is sent.
    /// * [`Error::Network`] on transport failures and timeouts.
    /// * [`Error::DeserializationFailed`] if a body cannot be decoded.
    /// * [`Error::Unauthorized`] if the credential material is refused, or the
    ///   retried call is rejected again.
    /// * [`Error::Application`] for server-declared errors.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use authwire::{Connector, Credentials, MemoryTokenStore};
    /// use serde_json::{json, Value};
    ///
    /// # async fn example() -> Result<(), authwire::Error> {
    /// let connector = Connector::new(
    ///     "api.example.com",
    ///     Credentials::bearer("client-id", "client-secret"),
    ///     MemoryTokenStore::new(),
    /// )?;
    ///
    /// let reply = connector.send::<_, Value>("orders/list", &json!({"page": 1})).await?;
    /// println!("{}", reply.data);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn send<Req, Res>(&self, operation: &str, request: &Req) -> Result<Response<Res>>
    where
        Req: Serialize + ?Sized,
        Res: DeserializeOwned,
    {
        let start_time = Instant::now();
        step!(self, operation = operation, "Sending request");

        let body = encode(request)?;

        let credential = self.current_credential().await;
        match self
            .exchange(operation, &body, credential.as_deref(), start_time, 1)
            .await
        {
            Err(e) if e.is_unauthorized() => {
                tracing::warn!(
                    error = %e,
                    operation = operation,
                    "Credential rejected, re-authenticating"
                );

                self.reauthenticate(credential.as_deref()).await?;

                step!(self, operation = operation, "Resending request");
                let credential = self.current_credential().await;
                self.exchange(operation, &body, credential.as_deref(), start_time, 2)
                    .await
            }
            result => result,
        }
    }

    /// Trades the credential material for a fresh credential right away.
    ///
    /// `send` does this on its own when needed; call this to fail fast at
    /// startup, or after switching accounts in the token store.
    ///
    /// # Errors
    ///
    /// Returns the auth exchange's error unchanged.
    pub async fn authenticate(&self) -> Result<()> {
        let _gate = self.inner.auth_gate.lock().await;
        self.authenticate_locked().await
    }

    /// Returns `true` if a credential is currently held.
    pub async fn has_credential(&self) -> bool {
        self.inner.credential.read().await.is_some()
    }

    async fn current_credential(&self) -> Option<String> {
        self.inner.credential.read().await.clone()
    }

    /// Renews the credential unless a concurrent call already replaced `stale`.
    async fn reauthenticate(&self, stale: Option<&str>) -> Result<()> {
        let _gate = self.inner.auth_gate.lock().await;

        {
            let current = self.inner.credential.read().await;
            if current.is_some() && current.as_deref() != stale {
                step!(self, "Credential already renewed by a concurrent call");
                return Ok(());
            }
        }

        self.authenticate_locked().await
    }

    /// Runs the auth exchange. Callers must hold the auth gate.
    async fn authenticate_locked(&self) -> Result<()> {
        *self.inner.credential.write().await = None;

        let credentials = &self.inner.credentials;
        let operation = credentials.auth_operation();
        let body = encode(&credentials.auth_request())?;
        let start_time = Instant::now();

        step!(self, operation = operation, "Authenticating");

        let credential = match credentials {
            Credentials::Session { .. } => {
                let response = self
                    .exchange::<SessionAuthResponse>(operation, &body, None, start_time, 1)
                    .await?;
                response.data.into_credential()?
            }
            Credentials::Bearer { .. } => {
                let response = self
                    .exchange::<TokenResponse>(operation, &body, None, start_time, 1)
                    .await?;
                let status = response.status;
                response.data.into_credential(status)?
            }
        };

        credentials.credential_header(&credential)?;

        *self.inner.credential.write().await = Some(credential.clone());
        self.inner.token_store.set_credential(&credential);

        tracing::info!(
            operation = operation,
            latency_ms = start_time.elapsed().as_millis(),
            "Authenticated"
        );
        Ok(())
    }

    /// Performs a single HTTP exchange and classifies its outcome.
    async fn exchange<Res>(
        &self,
        operation: &str,
        body: &[u8],
        credential: Option<&str>,
        start_time: Instant,
        attempt: usize,
    ) -> Result<Response<Res>>
    where
        Res: DeserializeOwned,
    {
        let operation = operation.trim_start_matches('/');
        let url = self.inner.endpoint.url_for(operation)?;
        // The auth operation issues credentials; it never receives one, and
        // its bodies carry secrets.
        let is_auth = operation == self.inner.credentials.auth_operation();

        tracing::debug!(
            operation = operation,
            url = %url,
            attempt = attempt,
            "Executing HTTP request"
        );
        if !is_auth {
            step!(
                self,
                raw_request = %String::from_utf8_lossy(body),
                "Request body"
            );
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        for (name, value) in &self.inner.extra_headers {
            headers.insert(name.clone(), value.clone());
        }

        if !is_auth {
            if let Some(credential) = credential {
                let (name, value) = self.inner.credentials.credential_header(credential)?;
                headers.insert(name, value);
            }
        }

        let response = self
            .inner
            .http_client
            .post(url)
            .headers(headers)
            .body(body.to_vec())
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(
                    error = %e,
                    operation = operation,
                    timeout = e.is_timeout(),
                    "Request failed"
                );
                Error::Network(e)
            })?;

        let status = response.status();
        let headers = response.headers().clone();
        let latency = start_time.elapsed();

        tracing::info!(
            operation = operation,
            status = status.as_u16(),
            latency_ms = latency.as_millis(),
            attempts = attempt,
            "Received HTTP response"
        );

        let raw_body = response.text().await?;
        if !is_auth {
            step!(self, raw_response = %raw_body, "Response body");
        }

        let data = self
            .inner
            .credentials
            .convention()
            .classify::<Res>(status, &headers, &raw_body)?;

        Ok(Response::new(
            data, raw_body, status, headers, latency, attempt,
        ))
    }
}

fn encode<T>(value: &T) -> Result<Vec<u8>>
where
    T: Serialize + ?Sized,
{
    serde_json::to_vec(value).map_err(|e| Error::SerializationFailed(e.to_string()))
}

/// Builder for configuring and creating a [`Connector`].
///
/// # Examples
///
/// ```no_run
/// use authwire::{ConnectorBuilder, Credentials, MemoryTokenStore};
/// use std::time::Duration;
///
/// # fn example() -> Result<(), authwire::Error> {
/// let connector = ConnectorBuilder::new()
///     .host("http://localhost:8080")
///     .host_includes_protocol(true)
///     .credentials(Credentials::session("device-42", "master-token"))
///     .token_store(MemoryTokenStore::new())
///     .extra_header("X-Client-Version", "1.4.2")?
///     .timeout(Duration::from_secs(10))
///     .debug(true)
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct ConnectorBuilder {
    host: Option<String>,
    credentials: Option<Credentials>,
    token_store: Option<Box<dyn TokenStore>>,
    extra_headers: HeaderMap,
    host_includes_protocol: bool,
    debug: bool,
    timeout: Duration,
}

impl ConnectorBuilder {
    /// Creates a new `ConnectorBuilder` with default settings.
    pub fn new() -> Self {
        Self {
            host: None,
            credentials: None,
            token_store: None,
            extra_headers: HeaderMap::new(),
            host_includes_protocol: false,
            debug: false,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Sets the API host, e.g. `api.example.com` or `api.example.com:8443`.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Sets the credential material used to authenticate.
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Sets where the credential is persisted.
    ///
    /// Defaults to a fresh [`MemoryTokenStore`].
    pub fn token_store(mut self, token_store: impl TokenStore + 'static) -> Self {
        self.token_store = Some(Box::new(token_store));
        self
    }

    /// Enables verbose step tracing, including raw request and response bodies.
    ///
    /// Events are emitted at `DEBUG` level through `tracing`.
    pub fn debug(mut self, enabled: bool) -> Self {
        self.debug = enabled;
        self
    }

    /// Declares that the host string already carries its scheme
    /// (e.g. `http://localhost:8080`). Otherwise `https://` is prefixed.
    pub fn host_includes_protocol(mut self, enabled: bool) -> Self {
        self.host_includes_protocol = enabled;
        self
    }

    /// Adds a header that will be included in every request.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn extra_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let name = HeaderName::try_from(name.as_ref())
            .map_err(|e| Error::ConfigurationError(format!("Invalid header name: {}", e)))?;
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|e| Error::ConfigurationError(format!("Invalid header value: {}", e)))?;
        self.extra_headers.insert(name, value);
        Ok(self)
    }

    /// Adds several headers that will be included in every request.
    ///
    /// # Errors
    ///
    /// Returns an error if any header name or value is invalid.
    pub fn extra_headers<I, K, V>(self, headers: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        headers
            .into_iter()
            .try_fold(self, |builder, (name, value)| builder.extra_header(name, value))
    }

    /// Sets the per-request timeout. Defaults to 60 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builds the configured `Connector`, loading the stored credential.
    ///
    /// # Errors
    ///
    /// Returns an error if the host or credentials are missing, the host does
    /// not form a valid URL, or the HTTP client cannot be created.
    pub fn build(self) -> Result<Connector> {
        let host = self
            .host
            .filter(|host| !host.trim().is_empty())
            .ok_or_else(|| Error::ConfigurationError("Host is required".to_string()))?;

        let credentials = self
            .credentials
            .ok_or_else(|| Error::ConfigurationError("Credentials are required".to_string()))?;

        let endpoint = Endpoint::new(host, self.host_includes_protocol);
        endpoint.url_for(credentials.auth_operation())?;

        let http_client = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| {
                Error::ConfigurationError(format!("Failed to build HTTP client: {}", e))
            })?;

        let token_store = self
            .token_store
            .unwrap_or_else(|| Box::new(MemoryTokenStore::new()));
        let credential = token_store.credential().filter(|credential| {
            if credential.is_empty() {
                return false;
            }
            // An unattachable token is dropped so the server's rejection
            // drives a fresh login instead of failing every call.
            let attachable = credentials.credential_header(credential).is_ok();
            if !attachable {
                tracing::warn!("Ignoring stored credential that is not a valid header value");
            }
            attachable
        });

        if self.debug {
            tracing::debug!(
                host = %endpoint.host,
                credentials = ?credentials,
                stored_credential = credential.is_some(),
                "Connector created"
            );
        }

        Ok(Connector {
            inner: Arc::new(ConnectorInner {
                http_client,
                endpoint,
                credentials,
                token_store,
                extra_headers: self.extra_headers,
                debug: self.debug,
                credential: RwLock::new(credential),
                auth_gate: Mutex::new(()),
            }),
        })
    }
}

impl Default for ConnectorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn test_host_is_required() {
        let result = Connector::builder()
            .credentials(Credentials::session("uid", "secret"))
            .build();
        assert!(matches!(result, Err(Error::ConfigurationError(_))));
    }

    #[test]
    fn test_credentials_are_required() {
        let result = Connector::builder().host("api.example.com").build();
        assert!(matches!(result, Err(Error::ConfigurationError(_))));
    }

    #[test]
    fn test_invalid_extra_header() {
        let result = Connector::builder().extra_header("bad header", "value");
        match result {
            Err(e) => assert_eq!(e.kind(), ErrorKind::Serialization),
            Ok(_) => panic!("Expected invalid header name to be rejected"),
        }
    }

    #[test]
    fn test_invalid_host_is_rejected_at_build() {
        let result = Connector::builder()
            .host("bad host")
            .credentials(Credentials::session("uid", "secret"))
            .build();
        assert!(matches!(result, Err(Error::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_initial_credential_comes_from_store() {
        let connector = Connector::new(
            "api.example.com",
            Credentials::session("uid", "secret"),
            MemoryTokenStore::with_credential("stored"),
        )
        .unwrap();
        assert!(connector.has_credential().await);

        let connector = Connector::new(
            "api.example.com",
            Credentials::session("uid", "secret"),
            MemoryTokenStore::with_credential(""),
        )
        .unwrap();
        assert!(!connector.has_credential().await);
    }

    #[tokio::test]
    async fn test_unattachable_stored_credential_is_dropped() {
        let connector = Connector::new(
            "api.example.com",
            Credentials::bearer("id", "secret"),
            MemoryTokenStore::with_credential("bad\ntoken"),
        )
        .unwrap();
        assert!(!connector.has_credential().await);
    }
}

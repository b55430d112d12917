//! Response wrapper that preserves both parsed data and raw response details.
//!
//! The [`Response`] type wraps the decoded success payload along with metadata
//! about the exchange that produced it, including whether the connector had to
//! re-authenticate before the server accepted the call.

use http::{HeaderMap, StatusCode};
use std::time::Duration;

/// A successful reply to [`Connector::send`](crate::Connector::send).
///
/// # Type Parameters
///
/// * `T` - The type of the decoded response data
///
/// # Examples
///
/// ```no_run
/// use authwire::{Connector, Credentials};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize)]
/// struct Lookup { id: u64 }
///
/// #[derive(Deserialize)]
/// struct Record { name: String }
///
/// # async fn example() -> Result<(), authwire::Error> {
/// let connector = Connector::builder()
///     .host("api.example.com")
///     .credentials(Credentials::session("uid", "master-token"))
///     .build()?;
///
/// let response = connector.send::<_, Record>("records/get", &Lookup { id: 7 }).await?;
///
/// println!("Record: {}", response.data.name);
/// println!("Took {:?} over {} attempt(s)", response.latency, response.attempts);
/// if response.was_reauthenticated() {
///     println!("Session had expired and was renewed");
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Response<T> {
    /// The decoded response data.
    pub data: T,

    /// The raw response body as a string.
    pub raw_body: String,

    /// The HTTP status code of the response.
    pub status: StatusCode,

    /// The response headers.
    pub headers: HeaderMap,

    /// Time from the first attempt until the successful response, including
    /// any re-authentication in between.
    pub latency: Duration,

    /// `1` if the first attempt succeeded, `2` if the connector had to
    /// re-authenticate and retry.
    pub attempts: usize,
}

impl<T> Response<T> {
    /// Creates a new `Response`.
    pub fn new(
        data: T,
        raw_body: String,
        status: StatusCode,
        headers: HeaderMap,
        latency: Duration,
        attempts: usize,
    ) -> Self {
        Self {
            data,
            raw_body,
            status,
            headers,
            latency,
            attempts,
        }
    }

    /// Maps the response data to a different type, keeping the metadata.
    ///
    /// # Examples
    ///
    /// ```
    /// # use authwire::Response;
    /// # use http::{HeaderMap, StatusCode};
    /// # use std::time::Duration;
    /// let response = Response::new(
    ///     42,
    ///     "42".to_string(),
    ///     StatusCode::OK,
    ///     HeaderMap::new(),
    ///     Duration::from_millis(100),
    ///     1,
    /// );
    ///
    /// let string_response = response.map(|n| n.to_string());
    /// assert_eq!(string_response.data, "42");
    /// ```
    pub fn map<U, F>(self, f: F) -> Response<U>
    where
        F: FnOnce(T) -> U,
    {
        Response {
            data: f(self.data),
            raw_body: self.raw_body,
            status: self.status,
            headers: self.headers,
            latency: self.latency,
            attempts: self.attempts,
        }
    }

    /// Returns `true` if the credential was renewed before this response.
    ///
    /// # Examples
    ///
    /// ```
    /// # use authwire::Response;
    /// # use http::{HeaderMap, StatusCode};
    /// # use std::time::Duration;
    /// let response = Response::new(
    ///     (),
    ///     String::new(),
    ///     StatusCode::OK,
    ///     HeaderMap::new(),
    ///     Duration::from_millis(100),
    ///     2,
    /// );
    ///
    /// assert!(response.was_reauthenticated());
    /// ```
    pub fn was_reauthenticated(&self) -> bool {
        self.attempts > 1
    }

    /// Returns a header value by name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }

    /// Discards the metadata and returns the decoded data.
    pub fn into_inner(self) -> T {
        self.data
    }
}

impl<T> AsRef<T> for Response<T> {
    fn as_ref(&self) -> &T {
        &self.data
    }
}

impl<T> std::ops::Deref for Response<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

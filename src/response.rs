//! Response wrapper that keeps the parsed entity next to the raw exchange.

use http::header::{AsHeaderName, LOCATION};
use http::{HeaderMap, StatusCode};
use std::time::Duration;

/// Header Redmine (and most reverse proxies) use to tag a request.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// A successful Redmine response.
///
/// Derefs to the parsed data, so `response.subject` works for a
/// `Response<Issue>`.
///
/// # Examples
///
/// ```no_run
/// use redmine_client::{Client, Issue};
///
/// # async fn example() -> Result<(), redmine_client::Error> {
/// let client = Client::builder()
///     .host("https://redmine.example.com")?
///     .api_key("0123456789abcdef")?
///     .build()?;
///
/// let issue = client.get::<Issue>("42", None).await?;
///
/// println!("{} took {:?}", issue.subject, issue.latency);
/// if let Some(id) = issue.correlation_id() {
///     println!("request id: {id}");
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Response<T> {
    /// The deserialized response data.
    pub data: T,

    /// The raw response body. Empty for downloads and bodiless responses.
    pub raw_body: String,

    /// The HTTP status code of the response.
    pub status: StatusCode,

    /// The response headers.
    pub headers: HeaderMap,

    /// Time from sending the request until the body was read.
    pub latency: Duration,
}

impl<T> Response<T> {
    pub(crate) fn new(
        data: T,
        raw_body: String,
        status: StatusCode,
        headers: HeaderMap,
        latency: Duration,
    ) -> Self {
        Self {
            data,
            raw_body,
            status,
            headers,
            latency,
        }
    }

    /// Maps the response data while keeping the exchange metadata, e.g. to
    /// reduce a `Response<PagedResult<Issue>>` to its ids.
    pub fn map<U, F>(self, f: F) -> Response<U>
    where
        F: FnOnce(T) -> U,
    {
        let Response {
            data,
            raw_body,
            status,
            headers,
            latency,
        } = self;
        Response::new(f(data), raw_body, status, headers, latency)
    }

    /// Consumes the response and returns the data.
    pub fn into_inner(self) -> T {
        self.data
    }

    /// Returns a header value by name, if it is valid UTF-8.
    pub fn header(&self, name: impl AsHeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Returns the `X-Request-Id` the server tagged this exchange with.
    pub fn correlation_id(&self) -> Option<&str> {
        self.header(REQUEST_ID_HEADER)
    }

    /// `true` when Redmine answered `201 Created`.
    pub fn is_created(&self) -> bool {
        self.status == StatusCode::CREATED
    }

    /// The `Location` Redmine sends for a created resource.
    pub fn location(&self) -> Option<&str> {
        self.header(LOCATION)
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

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    fn response<T>(data: T, status: StatusCode, headers: HeaderMap) -> Response<T> {
        Response::new(data, String::new(), status, headers, Duration::ZERO)
    }

    #[test]
    fn test_correlation_id() {
        let mut headers = HeaderMap::new();
        headers.insert("X-Request-Id", HeaderValue::from_static("req-7f3a"));

        assert_eq!(response((), StatusCode::OK, headers).correlation_id(), Some("req-7f3a"));
        assert_eq!(response((), StatusCode::OK, HeaderMap::new()).correlation_id(), None);
    }

    #[test]
    fn test_created_location() {
        let mut headers = HeaderMap::new();
        headers.insert(
            LOCATION,
            HeaderValue::from_static("https://redmine.example.com/issues/9"),
        );

        let created = response(9u64, StatusCode::CREATED, headers);
        assert!(created.is_created());
        assert_eq!(created.location(), Some("https://redmine.example.com/issues/9"));

        let ids = created.map(|id| vec![id]);
        assert_eq!(ids.data, vec![9]);
        assert_eq!(ids.status, StatusCode::CREATED);
    }
}

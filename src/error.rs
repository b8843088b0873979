//! Error types for Redmine API calls.
//!
//! Every HTTP failure is translated into a dedicated variant at the transport
//! boundary, so callers match on [`Error::NotFound`] or
//! [`Error::UnprocessableEntity`] instead of inspecting status codes. Local
//! (de)serialization failures keep the underlying error as their `source`.

use http::{Method, StatusCode};

use crate::rate_limit::RateLimitInfo;

/// Boxed underlying cause carried by (de)serialization errors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The main error type for Redmine API calls.
///
/// # Examples
///
/// ```no_run
/// use redmine_client::{Client, Error, Issue};
///
/// # async fn example() -> Result<(), Error> {
/// let client = Client::builder().host("https://redmine.example.com")?.build()?;
///
/// match client.get::<Issue>("42", None).await {
///     Ok(issue) => println!("Subject: {}", issue.subject),
///     Err(Error::NotFound { url, .. }) => eprintln!("no such issue at {url}"),
///     Err(e) if e.is_transient() => eprintln!("try again later: {e}"),
///     Err(e) => eprintln!("request failed: {e}"),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// An argument supplied by the caller was empty or malformed.
    ///
    /// Raised before any network traffic, e.g. for a host that is not a valid
    /// absolute HTTP(S) URL.
    #[error("Invalid argument `{name}`: {reason}")]
    InvalidArgument {
        /// The name of the offending argument
        name: &'static str,
        /// Why it was rejected
        reason: String,
    },

    /// A locally checked precondition on an entity or request did not hold.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The server rejected the entity (HTTP 422).
    ///
    /// `message` holds every server-side error joined with newlines.
    #[error("{message}")]
    UnprocessableEntity {
        /// The aggregated, human-readable message
        message: String,
        /// The individual error strings returned by the server
        errors: Vec<String>,
    },

    /// The requested resource does not exist (HTTP 404).
    #[error("Resource not found: {method} {url}")]
    NotFound {
        /// The HTTP method of the failed request
        method: Method,
        /// The requested URL
        url: String,
    },

    /// The request conflicts with the current server state (HTTP 409).
    #[error("Conflict for {method} {url}: {raw_response}")]
    Conflict {
        /// The HTTP method of the failed request
        method: Method,
        /// The requested URL
        url: String,
        /// The raw response body
        raw_response: String,
    },

    /// The credentials were missing or rejected (HTTP 401).
    #[error("Unauthorized: {method} {url}")]
    Unauthorized {
        /// The HTTP method of the failed request
        method: Method,
        /// The requested URL
        url: String,
    },

    /// The authenticated user may not perform this request (HTTP 403).
    #[error("Forbidden: {method} {url}")]
    Forbidden {
        /// The HTTP method of the failed request
        method: Method,
        /// The requested URL
        url: String,
    },

    /// The client-side timeout expired before the exchange completed.
    ///
    /// Carries the transport error when the timeout came from `reqwest`.
    #[error("Request timed out")]
    Timeout(#[source] Option<reqwest::Error>),

    /// The server gave up waiting for the request (HTTP 408).
    #[error("Server timed out waiting for {method} {url}")]
    RequestTimeout {
        /// The HTTP method of the failed request
        method: Method,
        /// The requested URL
        url: String,
        /// The raw response body
        raw_response: String,
    },

    /// A network-level error occurred (connection refused, DNS failure, ...).
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// The server is overloaded or a gateway failed (429, 502, 503, 504, other 5xx).
    #[error("Service unavailable (status {status}) for {method} {url}")]
    ServiceUnavailable {
        /// The HTTP status code
        status: StatusCode,
        /// The HTTP method of the failed request
        method: Method,
        /// The requested URL
        url: String,
        /// The raw response body
        raw_response: String,
        /// `Retry-After` and related headers, when the server sent them
        rate_limit_info: Option<RateLimitInfo>,
    },

    /// The server failed while handling the request (HTTP 500).
    #[error("Internal server error for {method} {url}: {raw_response}")]
    InternalServerError {
        /// The HTTP method of the failed request
        method: Method,
        /// The requested URL
        url: String,
        /// The raw response body
        raw_response: String,
    },

    /// An entity could not be written as a request body.
    #[error("Failed to serialize {format} payload: {message}")]
    Serialization {
        /// The wire format (`xml` or `json`)
        format: &'static str,
        /// The message of the underlying error
        message: String,
        /// The underlying error
        #[source]
        source: Option<BoxError>,
    },

    /// A response body could not be read into the expected entity.
    #[error("Failed to deserialize {format} payload: {message}")]
    Deserialization {
        /// The wire format (`xml` or `json`)
        format: &'static str,
        /// The message of the underlying error
        message: String,
        /// The underlying error
        #[source]
        source: Option<BoxError>,
    },

    /// The caller cancelled the request through its [`CancellationToken`](crate::CancellationToken).
    #[error("Request was cancelled")]
    Cancelled,

    /// Any other non-2xx response.
    #[error("HTTP error {status} for {method} {url}: {raw_response}")]
    Api {
        /// The HTTP status code
        status: StatusCode,
        /// The HTTP method of the failed request
        method: Method,
        /// The requested URL
        url: String,
        /// The `X-Request-Id` header of the response, when present
        correlation_id: Option<String>,
        /// The raw response body
        raw_response: String,
    },

    /// The client could not be configured (bad header value, TLS setup, ...).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A [`RetryPolicy`](crate::retry::RetryPolicy) ran out of attempts.
    #[error("Max retries exceeded after {attempts} attempts: {last_error}")]
    MaxRetriesExceeded {
        /// The number of attempts made
        attempts: usize,
        /// The last error encountered
        last_error: Box<Error>,
    },
}

impl Error {
    pub(crate) fn invalid_argument(name: &'static str, reason: impl Into<String>) -> Self {
        Error::InvalidArgument {
            name,
            reason: reason.into(),
        }
    }

    pub(crate) fn serialization<E>(format: &'static str, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Serialization {
            format,
            message: source.to_string(),
            source: Some(Box::new(source)),
        }
    }

    pub(crate) fn deserialization<E>(format: &'static str, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Deserialization {
            format,
            message: source.to_string(),
            source: Some(Box::new(source)),
        }
    }

    pub(crate) fn malformed(format: &'static str, message: impl Into<String>) -> Self {
        Error::Deserialization {
            format,
            message: message.into(),
            source: None,
        }
    }

    /// Returns `true` if repeating the same request may succeed.
    ///
    /// Timeouts (client or 408), network failures, 5xx responses and 429 are
    /// transient; every other variant is permanent. The client never retries
    /// on its own, this is the hook for a caller-side [`RetryPolicy`](crate::retry::RetryPolicy).
    ///
    /// # Examples
    ///
    /// ```
    /// use redmine_client::Error;
    /// use http::{Method, StatusCode};
    ///
    /// let err = Error::ServiceUnavailable {
    ///     status: StatusCode::SERVICE_UNAVAILABLE,
    ///     method: Method::GET,
    ///     url: "https://redmine.example.com/issues.json".to_string(),
    ///     raw_response: String::new(),
    ///     rate_limit_info: None,
    /// };
    /// assert!(err.is_transient());
    ///
    /// let err = Error::NotFound {
    ///     method: Method::GET,
    ///     url: "https://redmine.example.com/issues/1.json".to_string(),
    /// };
    /// assert!(!err.is_transient());
    /// ```
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::Timeout(_)
                | Error::RequestTimeout { .. }
                | Error::Network(_)
                | Error::ServiceUnavailable { .. }
                | Error::InternalServerError { .. }
        )
    }

    /// Returns `true` if the request was abandoned on this side: either the
    /// caller cancelled it or the client timeout expired. A server-side 408
    /// is not a cancellation.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Error::Cancelled | Error::Timeout(_))
    }

    /// Returns the HTTP status code behind this error, if it came from a response.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::UnprocessableEntity { .. } => Some(StatusCode::UNPROCESSABLE_ENTITY),
            Error::NotFound { .. } => Some(StatusCode::NOT_FOUND),
            Error::Conflict { .. } => Some(StatusCode::CONFLICT),
            Error::Unauthorized { .. } => Some(StatusCode::UNAUTHORIZED),
            Error::Forbidden { .. } => Some(StatusCode::FORBIDDEN),
            Error::RequestTimeout { .. } => Some(StatusCode::REQUEST_TIMEOUT),
            Error::InternalServerError { .. } => Some(StatusCode::INTERNAL_SERVER_ERROR),
            Error::ServiceUnavailable { status, .. } | Error::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns the raw response body if this error kept one.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Error::Conflict { raw_response, .. }
            | Error::RequestTimeout { raw_response, .. }
            | Error::ServiceUnavailable { raw_response, .. }
            | Error::InternalServerError { raw_response, .. }
            | Error::Api { raw_response, .. } => Some(raw_response),
            _ => None,
        }
    }

    /// Returns rate limit information parsed from the failed response.
    pub fn rate_limit_info(&self) -> Option<&RateLimitInfo> {
        match self {
            Error::ServiceUnavailable {
                rate_limit_info, ..
            } => rate_limit_info.as_ref(),
            _ => None,
        }
    }

    /// Returns the recommended delay from rate limit information, capped by `max_wait`.
    pub fn rate_limit_delay(
        &self,
        max_wait: std::time::Duration,
    ) -> Option<std::time::Duration> {
        self.rate_limit_info()?.delay(max_wait)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::Timeout(Some(err))
        } else {
            Error::Network(err)
        }
    }
}

/// A specialized `Result` type for Redmine API calls.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialization_error_surfaces_inner_message() {
        let inner = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let err = Error::serialization("xml", inner);

        assert_eq!(err.to_string(), "Failed to serialize xml payload: disk full");
        let source = std::error::Error::source(&err).map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("disk full"));
    }

    #[test]
    fn test_transient_classification() {
        assert!(Error::Timeout(None).is_transient());
        assert!(Error::InternalServerError {
            method: Method::GET,
            url: String::new(),
            raw_response: String::new(),
        }
        .is_transient());
        assert!(!Error::Cancelled.is_transient());
        assert!(!Error::Validation("id is required".to_string()).is_transient());
    }

    #[test]
    fn test_cancellation_is_distinct_from_network_failure() {
        assert!(Error::Cancelled.is_cancellation());
        assert!(Error::Timeout(None).is_cancellation());
        assert!(!Error::Cancelled.is_transient());
    }

    #[test]
    fn test_server_timeout_is_transient_but_not_cancellation() {
        let err = Error::RequestTimeout {
            method: Method::PUT,
            url: "https://redmine.example.com/issues/1.json".to_string(),
            raw_response: "slow upload".to_string(),
        };

        assert!(err.is_transient());
        assert!(!err.is_cancellation());
        assert_eq!(err.status(), Some(StatusCode::REQUEST_TIMEOUT));
        assert_eq!(err.raw_response(), Some("slow upload"));
    }

    #[test]
    fn test_status_mapping() {
        let err = Error::Forbidden {
            method: Method::DELETE,
            url: String::new(),
        };
        assert_eq!(err.status(), Some(StatusCode::FORBIDDEN));
        assert_eq!(Error::Cancelled.status(), None);
    }
}

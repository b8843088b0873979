//! Redmine client: typed operations over a single-attempt HTTP transport.
//!
//! The [`Client`] type is the main entry point. Use [`ClientBuilder`] to
//! configure and create clients.

use crate::{
    cancel::run_cancellable,
    entity::{ErrorInfo, Upload},
    host::validate_host,
    rate_limit::RateLimitInfo,
    request::{self, RedmineRequest, RequestOptions, SWITCH_USER_HEADER},
    response::REQUEST_ID_HEADER,
    serialization::{Entity, RedmineSerializer},
    transfer::{DownloadProgress, ProgressReporter},
    Authentication, CancellationToken, ClientConfig, Error, Format, PagedResult, Response, Result,
};
use http::header::{ACCEPT, CONTENT_TYPE};
use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::Instrument;
use url::Url;

const OCTET_STREAM: &str = "application/octet-stream";

/// A Redmine REST API client.
///
/// Cloning is cheap and every clone shares one connection pool. The client
/// holds only read-only configuration, so concurrent calls never interfere.
/// Each call makes exactly one HTTP attempt; see
/// [`RetryPolicy`](crate::retry::RetryPolicy) for retrying transient errors.
///
/// # Examples
///
/// ```no_run
/// use redmine_client::{Client, Format, Issue, IdentifiableName, RequestOptions};
///
/// # async fn example() -> Result<(), redmine_client::Error> {
/// let client = Client::builder()
///     .host("https://redmine.example.com")?
///     .api_key("0123456789abcdef")?
///     .format(Format::Xml)
///     .build()?;
///
/// let open = RequestOptions::new()
///     .with_query_param("project_id", "1")
///     .with_query_param("status_id", "open");
/// let page = client.list::<Issue>(Some(&open)).await?;
/// println!("{} of {} issues", page.items.len(), page.total_count);
///
/// let issue = Issue {
///     project: Some(IdentifiableName::new(1)),
///     subject: "Printer on fire".to_string(),
///     ..Issue::default()
/// };
/// let created = client.create(&issue, None).await?;
/// println!("Created #{:?}", created.id);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http_client: reqwest::Client,
    host: Url,
    format: Format,
    default_headers: HeaderMap,
    impersonate: Option<String>,
    timeout: Option<Duration>,
    span: tracing::Span,
}

/// A successful exchange before its body is interpreted.
struct RawResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: String,
    latency: Duration,
}

impl RawResponse {
    fn into_response<T>(self, data: T) -> Response<T> {
        Response::new(data, self.body, self.status, self.headers, self.latency)
    }

    fn is_empty(&self) -> bool {
        self.status == StatusCode::NO_CONTENT || self.body.trim().is_empty()
    }
}

impl Client {
    /// Largest page Redmine serves.
    pub const MAX_PAGE_SIZE: u64 = 100;

    /// Creates a new `ClientBuilder` for configuring a client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// The validated base URL, always ending in `/`.
    pub fn host(&self) -> &Url {
        &self.inner.host
    }

    /// The wire format used for every payload.
    pub fn format(&self) -> Format {
        self.inner.format
    }

    /// Fetches a single entity, e.g. `GET issues/42.json`.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] for unknown ids, [`Error::InvalidArgument`] for a
    /// blank id, and any transport or deserialization error.
    pub async fn get<T: Entity>(
        &self,
        id: &str,
        options: Option<&RequestOptions>,
    ) -> Result<Response<T>> {
        let path = request::entity_path(T::COLLECTION, id, self.extension())?;
        let raw = self
            .execute(RedmineRequest::new(Method::GET, path, options))
            .await?;
        let data = self.decode::<T>(&raw)?;
        Ok(raw.into_response(data))
    }

    /// Fetches one page of a top-level collection, e.g. `GET issues.json`.
    ///
    /// Use [`RequestOptions::with_pagination`] to pick the page and
    /// [`list_in`](Self::list_in) for nested resources.
    pub async fn list<T: Entity>(
        &self,
        options: Option<&RequestOptions>,
    ) -> Result<Response<PagedResult<T>>> {
        let path = self.top_level_path::<T>()?;
        self.fetch_page(path, options).await
    }

    /// Fetches one page of a nested collection, e.g.
    /// `GET projects/1/issue_categories.json`.
    pub async fn list_in<T: Entity>(
        &self,
        parent_id: &str,
        options: Option<&RequestOptions>,
    ) -> Result<Response<PagedResult<T>>> {
        let path = self.nested_path::<T>(parent_id)?;
        self.fetch_page(path, options).await
    }

    /// Fetches every page of a top-level collection.
    ///
    /// Starts at the `offset` in `options` (default 0) and requests pages of
    /// `limit` items (default [`MAX_PAGE_SIZE`](Self::MAX_PAGE_SIZE)) until
    /// `total_count` items have been seen or the server returns an empty page.
    pub async fn list_all<T: Entity>(&self, options: Option<&RequestOptions>) -> Result<Vec<T>> {
        let mut options = options.cloned().unwrap_or_default();
        let limit = query_number(&options, "limit")
            .filter(|limit| *limit > 0)
            .unwrap_or(Self::MAX_PAGE_SIZE);
        let mut offset = query_number(&options, "offset").unwrap_or(0);
        let mut items = Vec::new();

        loop {
            options = options.with_pagination(offset, limit);
            let page = self.list::<T>(Some(&options)).await?.into_inner();

            let fetched = page.items.len() as u64;
            items.extend(page.items);
            offset += fetched;

            tracing::debug!(
                parent: &self.inner.span,
                resource = T::COLLECTION,
                fetched = items.len(),
                total_count = page.total_count,
                "Fetched page"
            );

            if fetched == 0 || offset >= page.total_count {
                return Ok(items);
            }
        }
    }

    /// Returns the `total_count` of a top-level collection without
    /// materializing its items.
    pub async fn count<T: Entity>(&self, options: Option<&RequestOptions>) -> Result<u64> {
        let path = self.top_level_path::<T>()?;
        let options = options
            .cloned()
            .unwrap_or_default()
            .with_query_param("limit", "1");
        let raw = self
            .execute(RedmineRequest::new(Method::GET, path, Some(&options)))
            .await?;

        self.inner
            .format
            .count::<T>(&raw.body)
            .inspect_err(|e| self.log_decode_failure(e, &raw.body))
    }

    /// Creates an entity in a top-level collection (`POST issues.json`) and
    /// returns the server's copy with its assigned id.
    pub async fn create<T: Entity>(
        &self,
        entity: &T,
        options: Option<&RequestOptions>,
    ) -> Result<Response<T>> {
        let path = self.top_level_path::<T>()?;
        self.submit(Method::POST, path, entity, options).await
    }

    /// Creates an entity under its parent, e.g. `POST projects/1/issue_categories.json`.
    pub async fn create_in<T: Entity>(
        &self,
        parent_id: &str,
        entity: &T,
        options: Option<&RequestOptions>,
    ) -> Result<Response<T>> {
        let path = self.nested_path::<T>(parent_id)?;
        self.submit(Method::POST, path, entity, options).await
    }

    /// Replaces the writable fields of an entity (`PUT issues/42.json`).
    ///
    /// Redmine answers with an empty body, so nothing is deserialized.
    pub async fn update<T: Entity>(
        &self,
        id: &str,
        entity: &T,
        options: Option<&RequestOptions>,
    ) -> Result<Response<()>> {
        let path = request::entity_path(T::COLLECTION, id, self.extension())?;
        let body = self.encode(entity)?;
        let request = RedmineRequest::new(Method::PUT, path, options)
            .with_body(body.into_bytes(), self.inner.format.content_type())?;

        let raw = self.execute(request).await?;
        Ok(raw.into_response(()))
    }

    /// Deletes an entity (`DELETE issues/42.json`).
    pub async fn delete<T: Entity>(
        &self,
        id: &str,
        options: Option<&RequestOptions>,
    ) -> Result<Response<()>> {
        let path = request::entity_path(T::COLLECTION, id, self.extension())?;
        let raw = self
            .execute(RedmineRequest::new(Method::DELETE, path, options))
            .await?;
        Ok(raw.into_response(()))
    }

    /// Uploads raw file content to `uploads.<format>`.
    ///
    /// The returned [`Upload`] carries the token to reference when attaching
    /// the file, see [`Upload::attach`].
    pub async fn upload_file(
        &self,
        content: Vec<u8>,
        filename: Option<&str>,
        options: Option<&RequestOptions>,
    ) -> Result<Response<Upload>> {
        let path = request::collection_path(Upload::COLLECTION, self.extension());
        let mut options = options.cloned().unwrap_or_default();
        if let Some(filename) = filename {
            options = options.with_query_param("filename", filename);
        }

        let request = RedmineRequest::new(Method::POST, path, Some(&options))
            .with_body(content, OCTET_STREAM)?;
        let raw = self.execute(request).await?;
        let data = self.decode::<Upload>(&raw)?;
        Ok(raw.into_response(data))
    }

    /// Downloads a file, typically an attachment's `content_url`.
    ///
    /// `address` may be relative to the host or absolute, but must point at
    /// the configured Redmine so credentials never leave it. `progress` is
    /// called at most once per 64 KiB and once at the end.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] for an address on another origin,
    /// [`Error::Cancelled`] if the token fires while the body is streaming.
    pub async fn download_file<F>(
        &self,
        address: &str,
        options: Option<&RequestOptions>,
        progress: F,
    ) -> Result<Response<Vec<u8>>>
    where
        F: FnMut(DownloadProgress) + Send,
    {
        let resolved = self
            .inner
            .host
            .join(address)
            .map_err(|e| Error::invalid_argument("address", format!("{address:?}: {e}")))?;
        if resolved.origin() != self.inner.host.origin() {
            return Err(Error::invalid_argument(
                "address",
                format!("{resolved} is not on {}", self.inner.host),
            ));
        }

        let request = RedmineRequest::new(Method::GET, resolved.to_string(), options);
        let token = request.cancellation.clone();

        self.guarded(token.as_ref(), async move {
            let start = Instant::now();
            let response = self.dispatch(&request).await?;
            let status = response.status();
            let headers = response.headers().clone();
            let content_length = response.content_length();

            let mut reporter = ProgressReporter::new(content_length, progress);
            let mut bytes = Vec::with_capacity(
                content_length
                    .and_then(|len| usize::try_from(len).ok())
                    .unwrap_or(8192),
            );

            let mut response = response;
            while let Some(chunk) = response.chunk().await? {
                reporter.advance(chunk.len());
                bytes.extend_from_slice(&chunk);
            }
            let total = reporter.finish();

            let latency = start.elapsed();
            tracing::info!(
                status = status.as_u16(),
                bytes = total,
                latency_ms = latency.as_millis() as u64,
                "Downloaded file"
            );

            Ok(Response::new(bytes, String::new(), status, headers, latency))
        })
        .await
    }

    async fn fetch_page<T: Entity>(
        &self,
        path: String,
        options: Option<&RequestOptions>,
    ) -> Result<Response<PagedResult<T>>> {
        let raw = self
            .execute(RedmineRequest::new(Method::GET, path, options))
            .await?;
        let page = self
            .inner
            .format
            .deserialize_paged::<T>(&raw.body)
            .inspect_err(|e| self.log_decode_failure(e, &raw.body))?;
        Ok(raw.into_response(page))
    }

    async fn submit<T: Entity>(
        &self,
        method: Method,
        path: String,
        entity: &T,
        options: Option<&RequestOptions>,
    ) -> Result<Response<T>> {
        let body = self.encode(entity)?;
        let request = RedmineRequest::new(method, path, options)
            .with_body(body.into_bytes(), self.inner.format.content_type())?;

        let raw = self.execute(request).await?;
        let data = self.decode::<T>(&raw)?;
        Ok(raw.into_response(data))
    }

    /// Sends `request` and reads the whole body as text.
    async fn execute(&self, request: RedmineRequest) -> Result<RawResponse> {
        let token = request.cancellation.clone();

        self.guarded(token.as_ref(), async {
            let start = Instant::now();
            let response = self.dispatch(&request).await?;

            let status = response.status();
            let headers = response.headers().clone();
            let body = response.text().await?;
            let latency = start.elapsed();

            tracing::info!(
                status = status.as_u16(),
                latency_ms = latency.as_millis() as u64,
                "Received HTTP response"
            );

            Ok(RawResponse {
                status,
                headers,
                body,
                latency,
            })
        })
        .await
    }

    /// Runs `fut` inside the client's span unless `token` fires first.
    async fn guarded<T, F>(&self, token: Option<&CancellationToken>, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let span = self.inner.span.clone();
        match run_cancellable(token, fut.instrument(span)).await {
            Ok(result) => result,
            Err(cancelled) => {
                tracing::warn!(parent: &self.inner.span, "Request cancelled by caller");
                Err(cancelled)
            }
        }
    }

    /// Sends one attempt and turns non-2xx statuses into errors.
    async fn dispatch(&self, request: &RedmineRequest) -> Result<reqwest::Response> {
        let url = request.url(&self.inner.host)?;

        tracing::debug!(
            method = %request.method,
            url = %url,
            "Executing HTTP request"
        );

        let mut builder = self
            .inner
            .http_client
            .request(request.method.clone(), url.clone())
            .headers(self.inner.default_headers.clone())
            .header(ACCEPT, self.inner.format.content_type());

        if let Some(login) = request.impersonate.as_ref().or(self.inner.impersonate.as_ref()) {
            builder = builder.header(SWITCH_USER_HEADER, impersonation_header(login)?);
        }

        builder = builder.headers(request.headers.clone());

        if let Some(timeout) = self.inner.timeout {
            builder = builder.timeout(timeout);
        }

        if let Some(body) = &request.body {
            builder = builder
                .header(CONTENT_TYPE, body.content_type)
                .body(body.bytes.clone());
        }

        let response = builder.send().await.map_err(|e| {
            let error = Error::from(e);
            tracing::warn!(
                error = %error,
                method = %request.method,
                url = %url,
                "Request failed"
            );
            error
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let headers = response.headers().clone();
        let raw_response = response.text().await.map_err(|e| {
            let error = Error::from(e);
            tracing::warn!(
                error = %error,
                status = status.as_u16(),
                url = %url,
                "Failed to read error response body"
            );
            error
        })?;
        Err(self.error_for_status(&request.method, &url, status, &headers, raw_response))
    }

    /// Maps a non-2xx response onto the error taxonomy.
    fn error_for_status(
        &self,
        method: &Method,
        url: &Url,
        status: StatusCode,
        headers: &HeaderMap,
        raw_response: String,
    ) -> Error {
        if status.is_client_error() {
            tracing::error!(
                status = status.as_u16(),
                method = %method,
                url = %url,
                response = %raw_response,
                "Client error (4xx)"
            );
        } else if status.is_server_error() {
            tracing::warn!(
                status = status.as_u16(),
                method = %method,
                url = %url,
                response = %raw_response,
                "Server error (5xx)"
            );
        }

        let method = method.clone();
        let url = url.to_string();

        match status {
            StatusCode::UNAUTHORIZED => Error::Unauthorized { method, url },
            StatusCode::FORBIDDEN => Error::Forbidden { method, url },
            StatusCode::NOT_FOUND => Error::NotFound { method, url },
            StatusCode::CONFLICT => Error::Conflict {
                method,
                url,
                raw_response,
            },
            StatusCode::UNPROCESSABLE_ENTITY => self.unprocessable(&raw_response),
            StatusCode::REQUEST_TIMEOUT => Error::RequestTimeout {
                method,
                url,
                raw_response,
            },
            StatusCode::INTERNAL_SERVER_ERROR => Error::InternalServerError {
                method,
                url,
                raw_response,
            },
            status if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() => {
                Error::ServiceUnavailable {
                    status,
                    method,
                    url,
                    raw_response,
                    rate_limit_info: RateLimitInfo::from_headers(headers),
                }
            }
            status => Error::Api {
                status,
                method,
                url,
                correlation_id: headers
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .map(str::to_owned),
                raw_response,
            },
        }
    }

    /// Folds a 422 errors envelope into one message, one error per line.
    fn unprocessable(&self, raw_response: &str) -> Error {
        let errors: Vec<String> = match self.inner.format.deserialize_paged::<ErrorInfo>(raw_response)
        {
            Ok(page) => page
                .items
                .into_iter()
                .map(|error| error.message)
                .filter(|message| !message.trim().is_empty())
                .collect(),
            Err(e) => {
                tracing::debug!(error = %e, "Unreadable 422 error envelope");
                Vec::new()
            }
        };

        let message = if errors.is_empty() {
            "Unprocessable entity".to_string()
        } else {
            errors.join("\n").trim_end().to_string()
        };

        Error::UnprocessableEntity { message, errors }
    }

    fn encode<T: Entity>(&self, entity: &T) -> Result<String> {
        self.inner.format.serialize(entity).inspect_err(|e| {
            tracing::error!(parent: &self.inner.span, error = %e, entity = T::ROOT, "Failed to serialize request body");
        })
    }

    /// Bodiless responses decode to `T::default()`.
    fn decode<T: Entity>(&self, raw: &RawResponse) -> Result<T> {
        if raw.is_empty() {
            return Ok(T::default());
        }
        self.inner
            .format
            .deserialize::<T>(&raw.body)
            .inspect_err(|e| self.log_decode_failure(e, &raw.body))
    }

    fn log_decode_failure(&self, error: &Error, raw_response: &str) {
        tracing::error!(
            parent: &self.inner.span,
            error = %error,
            raw_response = %raw_response,
            "Failed to deserialize response"
        );
    }

    fn extension(&self) -> &'static str {
        self.inner.format.format()
    }

    fn top_level_path<T: Entity>(&self) -> Result<String> {
        match T::PARENT {
            None => Ok(request::collection_path(T::COLLECTION, self.extension())),
            Some(parent) => Err(Error::Validation(format!(
                "{} are only reachable under {parent}/<id>",
                T::COLLECTION
            ))),
        }
    }

    fn nested_path<T: Entity>(&self, parent_id: &str) -> Result<String> {
        let parent = T::PARENT.ok_or_else(|| {
            Error::Validation(format!("{} is not a nested resource", T::COLLECTION))
        })?;
        request::nested_path(parent, parent_id, T::COLLECTION, self.extension())
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("host", &self.inner.host.as_str())
            .field("format", &self.inner.format)
            .field("impersonate", &self.inner.impersonate)
            .field("timeout", &self.inner.timeout)
            .finish_non_exhaustive()
    }
}

fn query_number(options: &RequestOptions, key: &str) -> Option<u64> {
    options.query.get(key)?.parse().ok()
}

fn impersonation_header(login: &str) -> Result<HeaderValue> {
    if login.trim().is_empty() {
        return Err(Error::invalid_argument("impersonate", "must not be empty"));
    }
    HeaderValue::from_str(login)
        .map_err(|e| Error::invalid_argument("impersonate", format!("not a valid header value: {e}")))
}

/// Builder for configuring and creating a [`Client`].
///
/// # Examples
///
/// ```no_run
/// use redmine_client::{Authentication, ClientBuilder, Format};
/// use std::time::Duration;
///
/// # fn example() -> Result<(), redmine_client::Error> {
/// let client = ClientBuilder::new()
///     .host("redmine.example.com")?
///     .format(Format::Json)
///     .authentication(Authentication::basic("jsmith", "secret"))
///     .timeout(Duration::from_secs(30))
///     .default_header("User-Agent", "my-app/1.0")?
///     .span(tracing::info_span!("redmine", tenant = "acme"))
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct ClientBuilder {
    host: Option<Url>,
    format: Format,
    authentication: Authentication,
    impersonate: Option<String>,
    default_headers: HeaderMap,
    timeout: Option<Duration>,
    span: Option<tracing::Span>,
}

impl ClientBuilder {
    /// Creates a new `ClientBuilder`: JSON, anonymous, no timeout.
    pub fn new() -> Self {
        Self {
            host: None,
            format: Format::default(),
            authentication: Authentication::None,
            impersonate: None,
            default_headers: HeaderMap::new(),
            timeout: None,
            span: None,
        }
    }

    /// Sets the Redmine base URL. A missing scheme defaults to `https://`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the host is blank or malformed.
    pub fn host(mut self, host: impl AsRef<str>) -> Result<Self> {
        self.host = Some(validate_host(host.as_ref())?);
        Ok(self)
    }

    /// Sets the wire format.
    pub fn format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    /// Sets the credentials sent with every request.
    pub fn authentication(mut self, authentication: Authentication) -> Self {
        self.authentication = authentication;
        self
    }

    /// Authenticates with an API access key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for a blank key.
    pub fn api_key(self, key: impl Into<String>) -> Result<Self> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(Error::invalid_argument("api_key", "must not be empty"));
        }
        Ok(self.authentication(Authentication::ApiKey(key)))
    }

    /// Impersonates `login` on every request unless a call overrides it.
    pub fn impersonate(mut self, login: impl Into<String>) -> Self {
        self.impersonate = Some(login.into());
        self
    }

    /// Adds a default header that will be included in all requests.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn default_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let name = HeaderName::try_from(name.as_ref())
            .map_err(|e| Error::Configuration(format!("Invalid header name: {}", e)))?;
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|e| Error::Configuration(format!("Invalid header value: {}", e)))?;
        self.default_headers.insert(name, value);
        Ok(self)
    }

    /// Sets the per-request timeout. Expiry surfaces as [`Error::Timeout`].
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the span every request is recorded under.
    ///
    /// Defaults to an `info` span named `redmine` carrying the host.
    pub fn span(mut self, span: tracing::Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Applies every setting present in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the configured host is invalid.
    pub fn from_config(mut self, config: &ClientConfig) -> Result<Self> {
        self = self
            .host(&config.host)?
            .format(config.format)
            .authentication(config.authentication());
        if let Some(login) = &config.impersonate {
            self = self.impersonate(login.clone());
        }
        if let Some(timeout) = config.timeout() {
            self = self.timeout(timeout);
        }
        Ok(self)
    }

    /// Builds the configured `Client`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if no host was set, and
    /// [`Error::InvalidArgument`] for unusable credentials.
    pub fn build(self) -> Result<Client> {
        let host = self
            .host
            .ok_or_else(|| Error::Configuration("Host is required".to_string()))?;

        let mut default_headers = self.default_headers;
        self.authentication.apply(&mut default_headers)?;

        if let Some(login) = &self.impersonate {
            impersonation_header(login)?;
        }

        let http_client = reqwest::Client::builder()
            .user_agent(concat!("redmine-client/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        let span = self
            .span
            .unwrap_or_else(|| tracing::info_span!("redmine", host = %host));

        Ok(Client {
            inner: Arc::new(ClientInner {
                http_client,
                host,
                format: self.format,
                default_headers,
                impersonate: self.impersonate,
                timeout: self.timeout,
                span,
            }),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(format: Format) -> Client {
        Client::builder()
            .host("https://redmine.example.com")
            .unwrap()
            .format(format)
            .build()
            .unwrap()
    }

    #[test]
    fn test_build_requires_host() {
        assert!(matches!(
            ClientBuilder::new().build(),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn test_blank_api_key_rejected() {
        let builder = Client::builder().host("redmine.example.com").unwrap();
        assert!(matches!(
            builder.api_key(""),
            Err(Error::InvalidArgument { name: "api_key", .. })
        ));
    }

    #[test]
    fn test_status_mapping() {
        let client = client(Format::Json);
        let url = Url::parse("https://redmine.example.com/issues.json").unwrap();
        let map = |status: u16| {
            client.error_for_status(
                &Method::GET,
                &url,
                StatusCode::from_u16(status).unwrap(),
                &HeaderMap::new(),
                String::new(),
            )
        };

        assert!(matches!(map(401), Error::Unauthorized { .. }));
        assert!(matches!(map(403), Error::Forbidden { .. }));
        assert!(matches!(map(404), Error::NotFound { .. }));
        assert!(matches!(map(409), Error::Conflict { .. }));
        let server_timeout = map(408);
        assert!(matches!(server_timeout, Error::RequestTimeout { .. }));
        assert!(server_timeout.is_transient());
        assert!(!server_timeout.is_cancellation());
        assert!(matches!(map(500), Error::InternalServerError { .. }));
        for status in [429, 502, 503, 504, 507] {
            let err = map(status);
            assert!(matches!(err, Error::ServiceUnavailable { .. }), "{status}");
            assert!(err.is_transient());
        }
        assert!(matches!(
            map(418),
            Error::Api { status, .. } if status == StatusCode::IM_A_TEAPOT
        ));
    }

    #[test]
    fn test_unknown_status_keeps_correlation_id() {
        let client = client(Format::Json);
        let url = Url::parse("https://redmine.example.com/issues.json").unwrap();
        let mut headers = HeaderMap::new();
        headers.insert("x-request-id", HeaderValue::from_static("abc-123"));

        let err = client.error_for_status(
            &Method::POST,
            &url,
            StatusCode::PAYLOAD_TOO_LARGE,
            &headers,
            "too big".to_string(),
        );

        match err {
            Error::Api {
                correlation_id,
                raw_response,
                ..
            } => {
                assert_eq!(correlation_id.as_deref(), Some("abc-123"));
                assert_eq!(raw_response, "too big");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn test_unprocessable_joins_messages() {
        let err = client(Format::Json)
            .unprocessable(r#"{"errors":["Name cannot be blank","Identifier is too short"]}"#);
        match err {
            Error::UnprocessableEntity { message, errors } => {
                assert_eq!(message, "Name cannot be blank\nIdentifier is too short");
                assert_eq!(errors.len(), 2);
            }
            other => panic!("expected UnprocessableEntity, got {other:?}"),
        }

        let err = client(Format::Xml).unprocessable(
            r#"<errors type="array"><error>Subject cannot be blank</error></errors>"#,
        );
        assert_eq!(err.to_string(), "Subject cannot be blank");
    }

    #[test]
    fn test_unprocessable_fallback_message() {
        assert_eq!(
            client(Format::Xml).unprocessable("").to_string(),
            "Unprocessable entity"
        );
        assert_eq!(
            client(Format::Json).unprocessable("{}").to_string(),
            "Unprocessable entity"
        );
    }

    #[test]
    fn test_nested_resources_need_a_parent() {
        let client = client(Format::Json);
        assert!(matches!(
            client.top_level_path::<crate::IssueCategory>(),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            client.nested_path::<crate::Issue>("1"),
            Err(Error::Validation(_))
        ));
        assert_eq!(
            client.nested_path::<crate::IssueCategory>("1").unwrap(),
            "projects/1/issue_categories.json"
        );
    }
}

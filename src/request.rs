//! Per-request options and the resolved request handed to the transport.

use http::{HeaderMap, HeaderName, HeaderValue, Method};
use std::collections::HashMap;
use url::Url;

use crate::{CancellationToken, Error, Result};

/// Header used by administrators to act as another user.
pub const SWITCH_USER_HEADER: HeaderName = HeaderName::from_static("x-redmine-switch-user");

/// Optional settings for a single API call.
///
/// # Examples
///
/// ```
/// use redmine_client::{CancellationToken, RequestOptions};
///
/// let token = CancellationToken::new();
/// let options = RequestOptions::new()
///     .with_query_param("status_id", "open")
///     .with_pagination(25, 25)
///     .with_include(&["journals", "attachments"])
///     .impersonate("jsmith")
///     .with_cancellation(token.clone());
///
/// assert_eq!(options.query.get("include").map(String::as_str), Some("journals,attachments"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Query parameters. Order is irrelevant to Redmine.
    pub query: HashMap<String, String>,

    /// Login to impersonate via `X-Redmine-Switch-User` (admin only).
    pub impersonate: Option<String>,

    /// Additional headers for this request.
    pub headers: HeaderMap,

    /// Aborts the request when cancelled.
    pub cancellation: Option<CancellationToken>,
}

impl RequestOptions {
    /// Creates empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a query parameter, replacing any previous value for `key`.
    pub fn with_query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Adds multiple query parameters.
    pub fn with_query_params(
        mut self,
        params: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        self.query.extend(params);
        self
    }

    /// Sets `offset` and `limit`.
    pub fn with_pagination(self, offset: u64, limit: u64) -> Self {
        self.with_query_param("offset", offset.to_string())
            .with_query_param("limit", limit.to_string())
    }

    /// Asks Redmine to embed associated data, e.g. `journals` on an issue.
    pub fn with_include(self, associations: &[&str]) -> Self {
        self.with_query_param("include", associations.join(","))
    }

    /// Performs the request as `login`.
    pub fn impersonate(mut self, login: impl Into<String>) -> Self {
        self.impersonate = Some(login.into());
        self
    }

    /// Adds a header to the request.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let name = HeaderName::try_from(name.as_ref())
            .map_err(|e| Error::Configuration(format!("Invalid header name: {}", e)))?;
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|e| Error::Configuration(format!("Invalid header value: {}", e)))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Attaches a cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }
}

/// A request body and its MIME type.
#[derive(Debug, Clone)]
pub(crate) struct Body {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
}

/// A fully described request, ready for the transport.
#[derive(Debug, Clone)]
pub(crate) struct RedmineRequest {
    pub method: Method,
    pub path: String,
    pub query: HashMap<String, String>,
    pub headers: HeaderMap,
    pub body: Option<Body>,
    pub impersonate: Option<String>,
    pub cancellation: Option<CancellationToken>,
}

impl RedmineRequest {
    pub fn new(method: Method, path: String, options: Option<&RequestOptions>) -> Self {
        let options = options.cloned().unwrap_or_default();
        Self {
            method,
            path,
            query: options.query,
            headers: options.headers,
            body: None,
            impersonate: options.impersonate,
            cancellation: options.cancellation,
        }
    }

    /// Attaches a body. GET requests never carry one.
    pub fn with_body(mut self, bytes: Vec<u8>, content_type: &'static str) -> Result<Self> {
        if self.method == Method::GET {
            return Err(Error::Validation(format!(
                "GET {} cannot carry a request body",
                self.path
            )));
        }
        self.body = Some(Body {
            bytes,
            content_type,
        });
        Ok(self)
    }

    /// Resolves the path and query against `host`.
    pub fn url(&self, host: &Url) -> Result<Url> {
        let mut url = host
            .join(&self.path)
            .map_err(|e| Error::invalid_argument("path", format!("{:?}: {e}", self.path)))?;

        if !self.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &self.query {
                pairs.append_pair(key, value);
            }
        }

        Ok(url)
    }
}

/// `<resource>.<format>`, e.g. `issues.json`.
pub(crate) fn collection_path(resource: &str, format: &str) -> String {
    format!("{resource}.{format}")
}

/// `<resource>/<id>.<format>`, e.g. `issues/42.xml`.
pub(crate) fn entity_path(resource: &str, id: &str, format: &str) -> Result<String> {
    let id = validate_id("id", id)?;
    Ok(format!("{resource}/{id}.{format}"))
}

/// `<parent>/<parent_id>/<resource>.<format>`, e.g. `projects/1/issue_categories.json`.
pub(crate) fn nested_path(
    parent: &str,
    parent_id: &str,
    resource: &str,
    format: &str,
) -> Result<String> {
    let parent_id = validate_id("parent_id", parent_id)?;
    Ok(format!("{parent}/{parent_id}/{resource}.{format}"))
}

/// Ids are numeric or project identifiers; anything that would change the
/// path shape is rejected.
fn validate_id<'a>(name: &'static str, id: &'a str) -> Result<&'a str> {
    let id = id.trim();
    if id.is_empty() {
        return Err(Error::invalid_argument(name, "must not be empty"));
    }
    if id.contains(['/', '?', '#', '\\']) || id == "." || id == ".." {
        return Err(Error::invalid_argument(
            name,
            format!("{id:?} is not a valid resource id"),
        ));
    }
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        assert_eq!(collection_path("issues", "json"), "issues.json");
        assert_eq!(entity_path("issues", "42", "xml").unwrap(), "issues/42.xml");
        assert_eq!(
            nested_path("projects", "redmine", "issue_categories", "json").unwrap(),
            "projects/redmine/issue_categories.json"
        );
    }

    #[test]
    fn test_invalid_ids() {
        assert!(matches!(
            entity_path("issues", "", "json"),
            Err(Error::InvalidArgument { name: "id", .. })
        ));
        assert!(entity_path("issues", "1/../../admin", "json").is_err());
        assert!(entity_path("issues", "1?x=2", "json").is_err());
        assert!(matches!(
            nested_path("projects", " ", "issue_categories", "json"),
            Err(Error::InvalidArgument {
                name: "parent_id",
                ..
            })
        ));
    }

    #[test]
    fn test_url_keeps_sub_path_and_query() {
        let host = Url::parse("https://example.com/redmine/").unwrap();
        let options = RequestOptions::new()
            .with_query_param("project_id", "1")
            .with_query_param("subject", "a b");
        let request = RedmineRequest::new(Method::GET, "issues.json".to_string(), Some(&options));

        let url = request.url(&host).unwrap();
        assert_eq!(url.path(), "/redmine/issues.json");

        let query: HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(query.get("project_id").map(String::as_str), Some("1"));
        assert_eq!(query.get("subject").map(String::as_str), Some("a b"));
    }

    #[test]
    fn test_get_rejects_body() {
        let request = RedmineRequest::new(Method::GET, "issues.json".to_string(), None);
        assert!(matches!(
            request.with_body(b"{}".to_vec(), "application/json"),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_with_header() {
        let options = RequestOptions::new()
            .with_header("X-Custom", "value")
            .unwrap();
        assert_eq!(options.headers.get("x-custom").unwrap(), "value");

        assert!(matches!(
            RequestOptions::new().with_header("bad header", "v"),
            Err(Error::Configuration(_))
        ));
    }
}

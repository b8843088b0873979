//! Credentials attached to every request.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use http::header::AUTHORIZATION;
use http::{HeaderMap, HeaderName, HeaderValue};

use crate::{Error, Result};

/// Header carrying a Redmine API access key.
pub const API_KEY_HEADER: HeaderName = HeaderName::from_static("x-redmine-api-key");

/// How the client authenticates against Redmine.
#[derive(Clone, Default, PartialEq, Eq)]
pub enum Authentication {
    /// Anonymous access.
    #[default]
    None,

    /// An API access key from "My account", sent as `X-Redmine-API-Key`.
    ApiKey(String),

    /// HTTP Basic with login and password.
    Basic {
        /// The login
        username: String,
        /// The password
        password: String,
    },
}

impl Authentication {
    /// Authenticates with an API access key.
    pub fn api_key(key: impl Into<String>) -> Self {
        Authentication::ApiKey(key.into())
    }

    /// Authenticates with HTTP Basic credentials.
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Authentication::Basic {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Adds the credential headers to `headers`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the key is blank or contains
    /// characters that are not allowed in a header.
    pub(crate) fn apply(&self, headers: &mut HeaderMap) -> Result<()> {
        match self {
            Authentication::None => {}
            Authentication::ApiKey(key) => {
                if key.trim().is_empty() {
                    return Err(Error::invalid_argument("api_key", "must not be empty"));
                }
                headers.insert(API_KEY_HEADER, secret_value("api_key", key)?);
            }
            Authentication::Basic { username, password } => {
                if username.is_empty() {
                    return Err(Error::invalid_argument("username", "must not be empty"));
                }
                let token = STANDARD.encode(format!("{username}:{password}"));
                headers.insert(AUTHORIZATION, secret_value("password", &format!("Basic {token}"))?);
            }
        }
        Ok(())
    }
}

fn secret_value(name: &'static str, value: &str) -> Result<HeaderValue> {
    let mut value = HeaderValue::from_str(value)
        .map_err(|e| Error::invalid_argument(name, format!("not a valid header value: {e}")))?;
    value.set_sensitive(true);
    Ok(value)
}

impl std::fmt::Debug for Authentication {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Authentication::None => f.write_str("None"),
            Authentication::ApiKey(_) => f.write_str("ApiKey(<redacted>)"),
            Authentication::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_header() {
        let mut headers = HeaderMap::new();
        Authentication::api_key("abc123").apply(&mut headers).unwrap();

        assert_eq!(headers.get("x-redmine-api-key").unwrap(), "abc123");
        assert!(headers.get("x-redmine-api-key").unwrap().is_sensitive());
    }

    #[test]
    fn test_basic_header() {
        let mut headers = HeaderMap::new();
        Authentication::basic("jsmith", "secret")
            .apply(&mut headers)
            .unwrap();

        // base64("jsmith:secret")
        assert_eq!(
            headers.get(AUTHORIZATION).unwrap(),
            "Basic anNtaXRoOnNlY3JldA=="
        );
    }

    #[test]
    fn test_blank_api_key_is_rejected() {
        let mut headers = HeaderMap::new();
        let err = Authentication::api_key("  ").apply(&mut headers).unwrap_err();

        assert!(matches!(err, Error::InvalidArgument { name: "api_key", .. }));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let rendered = format!("{:?}", Authentication::basic("jsmith", "secret"));
        assert!(rendered.contains("jsmith"));
        assert!(!rendered.contains("secret"));
    }
}

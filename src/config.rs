//! Plain-data client settings, e.g. loaded from a config file.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{Authentication, Format};

/// Settings a [`Client`](crate::Client) can be built from.
///
/// Credentials resolve as: API key if present, otherwise Basic when a
/// username is present, otherwise anonymous.
///
/// # Examples
///
/// ```
/// use redmine_client::{Client, ClientConfig};
///
/// let config: ClientConfig = serde_json::from_str(
///     r#"{ "host": "https://redmine.example.com", "format": "xml", "api_key": "abc", "timeout_secs": 30 }"#,
/// ).unwrap();
///
/// let client = Client::builder().from_config(&config).unwrap().build().unwrap();
/// assert_eq!(client.host().as_str(), "https://redmine.example.com/");
/// ```
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the Redmine installation.
    pub host: String,

    /// Wire format, `json` unless set.
    pub format: Format,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Login to impersonate on every request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impersonate: Option<String>,

    /// Per-request timeout in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl ClientConfig {
    /// The credentials described by this config.
    pub fn authentication(&self) -> Authentication {
        match (&self.api_key, &self.username) {
            (Some(key), _) => Authentication::api_key(key.clone()),
            (None, Some(username)) => {
                Authentication::basic(username.clone(), self.password.clone().unwrap_or_default())
            }
            (None, None) => Authentication::None,
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redacted = |secret: &Option<String>| secret.as_ref().map(|_| "<redacted>");

        f.debug_struct("ClientConfig")
            .field("host", &self.host)
            .field("format", &self.format)
            .field("api_key", &redacted(&self.api_key))
            .field("username", &self.username)
            .field("password", &redacted(&self.password))
            .field("impersonate", &self.impersonate)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

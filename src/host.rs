//! Validation of the configured Redmine host.
//!
//! A malformed host is rejected when the client is built instead of surfacing
//! later as an obscure connection error.

use url::{Host, Url};

use crate::{Error, Result};

const MAX_DOMAIN_LEN: usize = 255;
const MAX_LABEL_LEN: usize = 63;

/// Marks a punycode A-label; `url` converts internationalized names to these.
const ACE_PREFIX: &str = "xn--";

/// Parses and validates a Redmine base URL.
///
/// A host without a scheme is taken as `https://`. The returned URL always
/// ends with `/` so resource paths can be joined onto it, which keeps
/// sub-path installs such as `https://example.com/redmine` working.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] for blank input, schemes other than
/// `http`/`https`, or a domain name that breaks the label rules.
///
/// # Examples
///
/// ```
/// use redmine_client::validate_host;
///
/// let url = validate_host("https://example.com/redmine").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/redmine/");
///
/// assert!(validate_host("http://-bad-.com").is_err());
/// ```
pub fn validate_host(host: &str) -> Result<Url> {
    let host = host.trim();
    if host.is_empty() {
        return Err(Error::invalid_argument("host", "must not be empty"));
    }

    let candidate = if host.contains("://") {
        host.to_string()
    } else {
        format!("https://{host}")
    };

    let mut url = Url::parse(&candidate)
        .map_err(|e| Error::invalid_argument("host", format!("{host:?} is not a valid URL: {e}")))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::invalid_argument(
            "host",
            format!("unsupported scheme {:?}", url.scheme()),
        ));
    }

    match url.host() {
        Some(Host::Domain(domain)) => validate_domain(domain)?,
        Some(Host::Ipv4(_)) | Some(Host::Ipv6(_)) => {}
        None => return Err(Error::invalid_argument("host", "URL has no host")),
    }

    url.set_query(None);
    url.set_fragment(None);
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}

/// Checks RFC 1035 style label rules on a domain name.
///
/// `domain` is the ASCII form, so internationalized names arrive as `xn--`
/// labels and only their punycode part is checked for double hyphens.
fn validate_domain(domain: &str) -> Result<()> {
    if domain.len() > MAX_DOMAIN_LEN {
        return Err(Error::invalid_argument(
            "host",
            format!("domain is longer than {MAX_DOMAIN_LEN} characters"),
        ));
    }

    for label in domain.split('.') {
        let reason = if label.is_empty() {
            Some("contains an empty label".to_string())
        } else if label.len() > MAX_LABEL_LEN {
            Some(format!("label {label:?} is longer than {MAX_LABEL_LEN} characters"))
        } else if !starts_and_ends_alphanumeric(label) {
            Some(format!("label {label:?} must start and end with a letter or digit"))
        } else if label.strip_prefix(ACE_PREFIX).unwrap_or(label).contains("--") {
            Some(format!("label {label:?} contains consecutive hyphens"))
        } else if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            Some(format!("label {label:?} contains invalid characters"))
        } else {
            None
        };

        if let Some(reason) = reason {
            return Err(Error::invalid_argument("host", format!("{domain:?} {reason}")));
        }
    }

    Ok(())
}

fn starts_and_ends_alphanumeric(label: &str) -> bool {
    let mut chars = label.chars();
    let first = chars.next();
    let last = chars.next_back().or(first);
    matches!((first, last), (Some(a), Some(b)) if a.is_ascii_alphanumeric() && b.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_invalid(host: &str) {
        match validate_host(host) {
            Err(Error::InvalidArgument { name, .. }) => assert_eq!(name, "host"),
            other => panic!("expected InvalidArgument for {host:?}, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_hosts() {
        assert_eq!(
            validate_host("https://example.com").unwrap().as_str(),
            "https://example.com/"
        );
        assert_eq!(
            validate_host("redmine.example.org").unwrap().as_str(),
            "https://redmine.example.org/"
        );
        assert!(validate_host("http://localhost:3000").is_ok());
        assert!(validate_host("http://127.0.0.1:8080").is_ok());
        assert!(validate_host("http://[::1]:8080").is_ok());
        assert!(validate_host("http://a1.b-c.io/").is_ok());
    }

    #[test]
    fn test_internationalized_hosts() {
        assert_eq!(
            validate_host("https://bücher.de").unwrap().as_str(),
            "https://xn--bcher-kva.de/"
        );
        assert!(validate_host("xn--bcher-kva.example").is_ok());
        assert_invalid("http://xn--a--b.example");
    }

    #[test]
    fn test_invalid_hosts() {
        assert_invalid("");
        assert_invalid("   ");
        assert_invalid("http://-bad-.com");
        assert_invalid("http://a..b.com");
        assert_invalid("http://bad-.com");
        assert_invalid("http://a--b.com");
        assert_invalid("ftp://example.com");
        assert_invalid(&format!("http://{}.com", "a".repeat(64)));
        assert_invalid(&format!("http://{}", ["abcdefghij"; 24].join(".")));
    }

    #[test]
    fn test_sub_path_and_query_are_normalized() {
        let url = validate_host("https://example.com/redmine?x=1#top").unwrap();
        assert_eq!(url.as_str(), "https://example.com/redmine/");
        assert_eq!(url.join("issues.json").unwrap().path(), "/redmine/issues.json");
    }
}

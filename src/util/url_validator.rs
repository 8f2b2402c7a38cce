use thiserror::Error;
use url::Url;

/// Errors that can occur while validating the configured feed URL.
#[derive(Error, Debug)]
pub enum UrlValidationError {
    /// The URL string could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The URL uses a scheme other than http or https.
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    /// The URL has no host component.
    #[error("URL has no host")]
    MissingHost,
}

/// Validates the feed source URL from configuration.
///
/// The feed URL is operator-supplied, so loopback and private hosts are
/// accepted (local mirrors and test servers are legitimate sources). Only
/// the shape is enforced: an http(s) scheme and a non-empty host.
///
/// # Examples
///
/// ```
/// use habr_relay::util::validate_feed_url;
///
/// let url = validate_feed_url("https://habr.com/ru/rss/hub/infosecurity/all/?fl=ru").unwrap();
/// assert_eq!(url.host_str(), Some("habr.com"));
///
/// assert!(validate_feed_url("file:///etc/passwd").is_err());
/// ```
pub fn validate_feed_url(url_str: &str) -> Result<Url, UrlValidationError> {
    let url = Url::parse(url_str.trim())?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlValidationError::UnsupportedScheme(scheme.to_owned())),
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(url),
        _ => Err(UrlValidationError::MissingHost),
    }
}

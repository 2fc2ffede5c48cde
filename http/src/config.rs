//! Transport configuration.

use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

/// Default site base URL.
const DEFAULT_BASE_URL: &str = "https://example.com";
/// Default API base URL.
const DEFAULT_API_BASE_URL: &str = "https://api.example.com";
/// Default per-request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors building an [`HttpTransport`](crate::HttpTransport).
#[derive(Error, Debug)]
pub enum HttpConfigError {
    /// An environment variable held an unusable value
    #[error("Invalid value for {name}: {value}")]
    InvalidEnv {
        /// Variable name
        name: &'static str,
        /// Value found
        value: String,
    },

    /// A default header name or value is not valid HTTP
    #[error("Invalid default header {0}")]
    InvalidHeader(String),

    /// The underlying client could not be built
    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Configuration for [`HttpTransport`](crate::HttpTransport).
///
/// # Example
///
/// ```
/// use keyslot_http::HttpTransportConfig;
/// use std::time::Duration;
///
/// let config = HttpTransportConfig::default()
///     .with_base_url("http://localhost:3000")
///     .with_api_base_url("http://localhost:8000")
///     .with_timeout(Duration::from_secs(5))
///     .with_header("x-client", "dashboard");
/// assert_eq!(config.timeout, Duration::from_secs(5));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpTransportConfig {
    /// Base for relative URLs that do not contain `api`
    pub base_url: String,
    /// Base for relative URLs that contain `api`
    pub api_base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Headers sent with every request
    pub default_headers: BTreeMap<String, String>,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        let mut default_headers = BTreeMap::new();
        default_headers.insert("content-type".to_string(), "application/json".to_string());

        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            default_headers,
        }
    }
}

impl HttpTransportConfig {
    /// Defaults overridden by `KEYSLOT_BASE_URL`, `KEYSLOT_API_BASE_URL`
    /// and `KEYSLOT_TIMEOUT_SECS` where set.
    ///
    /// # Errors
    ///
    /// Returns [`HttpConfigError::InvalidEnv`] if `KEYSLOT_TIMEOUT_SECS` is
    /// not a whole number of seconds.
    pub fn from_env() -> Result<Self, HttpConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, HttpConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(base_url) = lookup("KEYSLOT_BASE_URL") {
            config.base_url = base_url;
        }
        if let Some(api_base_url) = lookup("KEYSLOT_API_BASE_URL") {
            config.api_base_url = api_base_url;
        }
        if let Some(value) = lookup("KEYSLOT_TIMEOUT_SECS") {
            let secs = value.trim().parse::<u64>().map_err(|_| HttpConfigError::InvalidEnv {
                name: "KEYSLOT_TIMEOUT_SECS",
                value,
            })?;
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Set the site base URL
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the API base URL
    #[must_use]
    pub fn with_api_base_url(mut self, api_base_url: impl Into<String>) -> Self {
        self.api_base_url = api_base_url.into();
        self
    }

    /// Use one base URL for every relative URL
    #[must_use]
    pub fn with_single_base_url(self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        self.with_base_url(base_url.clone()).with_api_base_url(base_url)
    }

    /// Set the per-request timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Add a default header
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(name.into().to_ascii_lowercase(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn default_sends_json_content_type() {
        let config = HttpTransportConfig::default();
        assert_eq!(
            config.default_headers.get("content-type").map(String::as_str),
            Some("application/json")
        );
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn env_overrides_defaults() -> Result<(), HttpConfigError> {
        let config = HttpTransportConfig::from_lookup(lookup(&[
            ("KEYSLOT_BASE_URL", "http://site"),
            ("KEYSLOT_API_BASE_URL", "http://api"),
            ("KEYSLOT_TIMEOUT_SECS", " 7 "),
        ]))?;
        assert_eq!(config.base_url, "http://site");
        assert_eq!(config.api_base_url, "http://api");
        assert_eq!(config.timeout, Duration::from_secs(7));
        Ok(())
    }

    #[test]
    fn env_rejects_bad_timeout() {
        let result = HttpTransportConfig::from_lookup(lookup(&[("KEYSLOT_TIMEOUT_SECS", "soon")]));
        assert!(matches!(
            result,
            Err(HttpConfigError::InvalidEnv { name: "KEYSLOT_TIMEOUT_SECS", .. })
        ));
    }

    #[test]
    fn missing_env_keeps_defaults() -> Result<(), HttpConfigError> {
        let config = HttpTransportConfig::from_lookup(lookup(&[]))?;
        assert_eq!(config, HttpTransportConfig::default());
        Ok(())
    }
}

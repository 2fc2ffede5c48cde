//! reqwest implementation of the transport contract

use crate::config::{HttpConfigError, HttpTransportConfig};
use keyslot_core::transport::{RequestOptions, Transport, TransportError, TransportFuture};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method};
use serde_json::{json, Value};

/// Resolve `url` against the configured base URLs.
///
/// Absolute `http(s)://` URLs are returned unchanged. Relative URLs that
/// contain `api` anywhere use `api_base_url`; the rest use `base_url`.
///
/// ```
/// use keyslot_http::{resolve_url, HttpTransportConfig};
///
/// let config = HttpTransportConfig::default()
///     .with_base_url("https://site.test/")
///     .with_api_base_url("https://api.site.test");
///
/// assert_eq!(resolve_url(&config, "/api/agents"), "https://api.site.test/api/agents");
/// assert_eq!(resolve_url(&config, "/health"), "https://site.test/health");
/// assert_eq!(resolve_url(&config, "http://other.test/x"), "http://other.test/x");
/// ```
#[must_use]
pub fn resolve_url(config: &HttpTransportConfig, url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        return url.to_string();
    }

    let base = if url.contains("api") {
        &config.api_base_url
    } else {
        &config.base_url
    };

    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        url.trim_start_matches('/')
    )
}

/// Query pairs for `params`.
///
/// `params` must be a JSON object (or `null`, meaning no query). Strings are
/// sent as-is, numbers and booleans in their JSON form, arrays as one pair per
/// element, and `null` members are skipped.
///
/// # Errors
///
/// Returns [`TransportError::InvalidRequest`] for non-object `params` and for
/// nested objects or arrays, which have no query-string form.
fn query_pairs(params: &Value) -> Result<Vec<(String, String)>, TransportError> {
    fn scalar(name: &str, value: &Value) -> Result<Option<String>, TransportError> {
        match value {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(s.clone())),
            Value::Bool(_) | Value::Number(_) => Ok(Some(value.to_string())),
            Value::Array(_) | Value::Object(_) => Err(TransportError::InvalidRequest(format!(
                "query parameter {name} is nested too deeply"
            ))),
        }
    }

    let members = match params {
        Value::Null => return Ok(Vec::new()),
        Value::Object(members) => members,
        other => {
            return Err(TransportError::InvalidRequest(format!(
                "query parameters must be a JSON object, got {other}"
            )))
        },
    };

    let mut pairs = Vec::with_capacity(members.len());
    for (name, value) in members {
        if let Value::Array(items) = value {
            for item in items {
                if let Some(v) = scalar(name, item)? {
                    pairs.push((name.clone(), v));
                }
            }
        } else if let Some(v) = scalar(name, value)? {
            pairs.push((name.clone(), v));
        }
    }
    Ok(pairs)
}

/// HTTP transport client
///
/// One request per call: no retry, no caching, no batching. Clones share
/// the underlying connection pool.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: Client,
    config: HttpTransportConfig,
}

impl HttpTransport {
    /// Build a client from `config`
    ///
    /// # Errors
    ///
    /// Returns [`HttpConfigError::InvalidHeader`] for unusable default
    /// headers and [`HttpConfigError::Client`] if reqwest cannot build the
    /// client.
    pub fn new(config: HttpTransportConfig) -> Result<Self, HttpConfigError> {
        let mut headers = HeaderMap::new();
        for (name, value) in &config.default_headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| HttpConfigError::InvalidHeader(name.clone()))?;
            let header_value =
                HeaderValue::from_str(value).map_err(|_| HttpConfigError::InvalidHeader(name.clone()))?;
            headers.insert(header_name, header_value);
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self { client, config })
    }

    /// Wrap an existing reqwest client
    ///
    /// `config.default_headers` and `config.timeout` are not applied; the
    /// client's own settings are used.
    #[must_use]
    pub const fn with_client(client: Client, config: HttpTransportConfig) -> Self {
        Self { client, config }
    }

    /// Configuration in use
    #[must_use]
    pub const fn config(&self) -> &HttpTransportConfig {
        &self.config
    }

    fn send<'a>(
        &'a self,
        method: Method,
        url: &'a str,
        body: Value,
        options: RequestOptions,
    ) -> TransportFuture<'a> {
        Box::pin(async move {
            let target = resolve_url(&self.config, url);
            let query = match options.params.as_ref() {
                Some(params) => query_pairs(params)?,
                None => Vec::new(),
            };

            let mut request = self.client.request(method.clone(), &target);
            if !query.is_empty() {
                request = request.query(&query);
            }
            for (name, value) in &options.headers {
                request = request.header(name, value);
            }
            if !body.is_null() {
                request = request.json(&body);
            }

            let response = request.send().await.map_err(|e| {
                tracing::warn!(%method, url = %target, error = %e, "HTTP request failed");
                TransportError::Connection(e.to_string())
            })?;

            let status = response.status();
            let bytes = response
                .bytes()
                .await
                .map_err(|e| TransportError::Connection(e.to_string()))?;
            tracing::debug!(%method, url = %target, status = status.as_u16(), "HTTP response");

            if status.is_success() {
                if bytes.is_empty() {
                    return Ok(Value::Null);
                }
                serde_json::from_slice(&bytes).map_err(|e| TransportError::Decode(e.to_string()))
            } else {
                let data = if bytes.is_empty() {
                    Value::Null
                } else {
                    serde_json::from_slice(&bytes)
                        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
                };
                Err(TransportError::rejected(json!({
                    "status": status.as_u16(),
                    "data": data,
                })))
            }
        })
    }
}

impl Transport for HttpTransport {
    fn get<'a>(&'a self, url: &'a str, options: RequestOptions) -> TransportFuture<'a> {
        self.send(Method::GET, url, Value::Null, options)
    }

    fn post<'a>(&'a self, url: &'a str, body: Value, options: RequestOptions) -> TransportFuture<'a> {
        self.send(Method::POST, url, body, options)
    }

    fn put<'a>(&'a self, url: &'a str, body: Value, options: RequestOptions) -> TransportFuture<'a> {
        self.send(Method::PUT, url, body, options)
    }

    fn patch<'a>(&'a self, url: &'a str, body: Value, options: RequestOptions) -> TransportFuture<'a> {
        self.send(Method::PATCH, url, body, options)
    }

    fn delete<'a>(&'a self, url: &'a str, body: Value, options: RequestOptions) -> TransportFuture<'a> {
        self.send(Method::DELETE, url, body, options)
    }
}

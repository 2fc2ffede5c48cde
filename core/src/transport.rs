//! Transport client contract.
//!
//! The core never performs I/O. Orchestrators reach the network through the
//! [`Transport`] trait: one outbound call per invocation, no retry, no batching.
//!
//! # Implementations
//!
//! - `HttpTransport` (in `keyslot-http`): reqwest-backed production client
//! - `MockTransport` (in `keyslot-testing`): scripted responses with
//!   controllable settlement order

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Boxed future returned by [`Transport`] calls.
pub type TransportFuture<'a> = Pin<Box<dyn Future<Output = Result<Value, TransportError>> + Send + 'a>>;

/// Request verbs an orchestrator can drive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verb {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `PATCH`
    Patch,
    /// `DELETE`
    Delete,
}

impl Verb {
    /// All verbs.
    pub const ALL: [Self; 5] = [Self::Get, Self::Post, Self::Put, Self::Patch, Self::Delete];

    /// Upper-case verb name, as used in action type tags.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-call transport options.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestOptions {
    /// Query parameters, as a JSON object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    /// Extra headers for this call.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

impl RequestOptions {
    /// Empty options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set query parameters.
    #[must_use]
    pub fn with_params(mut self, params: Value) -> Self {
        self.params = Some(params);
        self
    }

    /// Add a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// Errors raised by a transport call.
///
/// Only [`TransportError::Rejected`] carries structured detail; that detail is
/// what a failed slot records in its `ERROR` field.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    /// The remote answered with an error response.
    ///
    /// `response` is the structured detail, typically `{"status": 500, "data": ...}`.
    #[error("Request rejected: {response}")]
    Rejected {
        /// Structured response detail.
        response: Value,
    },

    /// The request never produced a response (DNS, connect, timeout, ...).
    #[error("Connection failed: {0}")]
    Connection(String),

    /// The response body could not be decoded.
    #[error("Response decoding failed: {0}")]
    Decode(String),

    /// The request could not be built from its options and was never sent.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl TransportError {
    /// A rejection carrying `response` as its detail.
    #[must_use]
    pub const fn rejected(response: Value) -> Self {
        Self::Rejected { response }
    }

    /// Structured response detail, if the error carries any.
    #[must_use]
    pub const fn response(&self) -> Option<&Value> {
        match self {
            Self::Rejected { response } => Some(response),
            Self::Connection(_) | Self::Decode(_) | Self::InvalidRequest(_) => None,
        }
    }

    /// HTTP status from the response detail, if present.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        self.response()
            .and_then(|r| r.get("status"))
            .and_then(Value::as_u64)
            .and_then(|s| u16::try_from(s).ok())
    }
}

/// Transport client consumed by orchestrators.
///
/// # Dyn Compatibility
///
/// Methods return [`TransportFuture`] instead of using `async fn` so the
/// trait can be used as `Arc<dyn Transport>`.
pub trait Transport: Send + Sync {
    /// Issue a `GET`.
    fn get<'a>(&'a self, url: &'a str, options: RequestOptions) -> TransportFuture<'a>;

    /// Issue a `POST` with a JSON body.
    fn post<'a>(&'a self, url: &'a str, body: Value, options: RequestOptions) -> TransportFuture<'a>;

    /// Issue a `PUT` with a JSON body.
    fn put<'a>(&'a self, url: &'a str, body: Value, options: RequestOptions) -> TransportFuture<'a>;

    /// Issue a `PATCH` with a JSON body.
    fn patch<'a>(&'a self, url: &'a str, body: Value, options: RequestOptions) -> TransportFuture<'a>;

    /// Issue a `DELETE` with a JSON body.
    fn delete<'a>(&'a self, url: &'a str, body: Value, options: RequestOptions) -> TransportFuture<'a>;

    /// Issue a call for `verb`.
    ///
    /// `GET` has no body; `body` is ignored for it.
    fn call<'a>(
        &'a self,
        verb: Verb,
        url: &'a str,
        body: Value,
        options: RequestOptions,
    ) -> TransportFuture<'a> {
        match verb {
            Verb::Get => self.get(url, options),
            Verb::Post => self.post(url, body, options),
            Verb::Put => self.put(url, body, options),
            Verb::Patch => self.patch(url, body, options),
            Verb::Delete => self.delete(url, body, options),
        }
    }
}

impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    fn get<'a>(&'a self, url: &'a str, options: RequestOptions) -> TransportFuture<'a> {
        (**self).get(url, options)
    }

    fn post<'a>(&'a self, url: &'a str, body: Value, options: RequestOptions) -> TransportFuture<'a> {
        (**self).post(url, body, options)
    }

    fn put<'a>(&'a self, url: &'a str, body: Value, options: RequestOptions) -> TransportFuture<'a> {
        (**self).put(url, body, options)
    }

    fn patch<'a>(&'a self, url: &'a str, body: Value, options: RequestOptions) -> TransportFuture<'a> {
        (**self).patch(url, body, options)
    }

    fn delete<'a>(&'a self, url: &'a str, body: Value, options: RequestOptions) -> TransportFuture<'a> {
        (**self).delete(url, body, options)
    }
}

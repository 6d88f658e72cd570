//! Request and response descriptors shared across the execution pipeline.

use indexmap::IndexMap;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Location where a parameter appears in the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ParameterLocation {
    /// Path parameter (e.g., /users/{id})
    Path,
    /// Query parameter (e.g., ?search=value)
    Query,
    /// Header parameter (e.g., X-Custom-Header)
    Header,
    /// Cookie parameter
    Cookie,
    /// Anything else the document declares
    Other(String),
}

impl From<String> for ParameterLocation {
    fn from(value: String) -> Self {
        match value.as_str() {
            "path" => ParameterLocation::Path,
            "query" => ParameterLocation::Query,
            "header" => ParameterLocation::Header,
            "cookie" => ParameterLocation::Cookie,
            _ => ParameterLocation::Other(value),
        }
    }
}

impl From<ParameterLocation> for String {
    fn from(value: ParameterLocation) -> Self {
        value.to_string()
    }
}

impl std::fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParameterLocation::Path => write!(f, "path"),
            ParameterLocation::Query => write!(f, "query"),
            ParameterLocation::Header => write!(f, "header"),
            ParameterLocation::Cookie => write!(f, "cookie"),
            ParameterLocation::Other(other) => write!(f, "{}", other),
        }
    }
}

/// How the transport should decode a response body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    /// Parse as JSON, falling back to a string when the body is not JSON
    #[default]
    Json,
    /// Keep the raw body as a string
    Text,
}

/// Passthrough options applied to the outgoing request.
///
/// Options are layered: the configuration's `base_options` first, then the
/// per-call options. See [`RequestOptions::merge`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    /// Extra headers
    pub headers: IndexMap<String, String>,
    /// Per-request timeout handed to the transport
    pub timeout: Option<Duration>,
    /// Response decoding
    pub response_type: Option<ResponseType>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        insert_header(&mut self.headers, name.into(), value.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_response_type(mut self, response_type: ResponseType) -> Self {
        self.response_type = Some(response_type);
        self
    }

    /// Layer `overrides` on top of `self`.
    ///
    /// Headers are merged case-insensitively with `overrides` winning; every
    /// other option is taken from `overrides` when set there.
    pub fn merge(&self, overrides: &RequestOptions) -> RequestOptions {
        let mut headers = self.headers.clone();
        for (name, value) in &overrides.headers {
            insert_header(&mut headers, name.clone(), value.clone());
        }

        RequestOptions {
            headers,
            timeout: overrides.timeout.or(self.timeout),
            response_type: overrides.response_type.or(self.response_type),
        }
    }
}

/// Insert a header, replacing any existing entry whose name differs only in case.
pub(crate) fn insert_header(headers: &mut IndexMap<String, String>, name: String, value: String) {
    if let Some(existing) = headers
        .keys()
        .find(|key| key.eq_ignore_ascii_case(&name))
        .cloned()
    {
        headers.shift_remove(&existing);
    }
    headers.insert(name, value);
}

/// A fully-formed HTTP request, ready for the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    /// HTTP method
    pub method: Method,
    /// Base path + substituted path + query string
    pub url: String,
    /// Final headers after all merges
    pub headers: IndexMap<String, String>,
    /// Serialized body, if any
    pub body: Option<String>,
    /// Timeout passthrough
    pub timeout: Option<Duration>,
    /// Response decoding passthrough
    pub response_type: ResponseType,
}

impl RequestDescriptor {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Response returned by a transport.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HttpResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: IndexMap<String, String>,
    pub data: Value,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

//! HTTP transport.

use crate::error::Result;
use crate::types::{HttpResponse, RequestDescriptor, ResponseType};
use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

/// Sends assembled requests.
///
/// Implementations must not interpret status codes: non-2xx responses are
/// returned as responses, only transport failures are errors.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: RequestDescriptor) -> Result<HttpResponse>;
}

/// [`HttpTransport`] backed by a shared `reqwest::Client`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    #[instrument(skip(self, request), fields(method = %request.method))]
    async fn send(&self, request: RequestDescriptor) -> Result<HttpResponse> {
        let url = Url::parse(&request.url)?;
        let mut builder = self.client.request(request.method.clone(), url);

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await?;
        let status = response.status();
        debug!("Response status: {}", status);

        let headers: IndexMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        // Get response bytes once
        let bytes = response.bytes().await?;
        let text = String::from_utf8_lossy(&bytes).to_string();
        let data = match request.response_type {
            ResponseType::Json if bytes.is_empty() => Value::Null,
            ResponseType::Json => serde_json::from_slice(&bytes).unwrap_or(Value::String(text)),
            ResponseType::Text => Value::String(text),
        };

        Ok(HttpResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            data,
        })
    }
}

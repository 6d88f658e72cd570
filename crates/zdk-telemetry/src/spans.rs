//! Span creation helpers for operation calls

use crate::attributes::*;

/// Attributes for tracing one HTTP call made for an OpenAPI operation
#[derive(Debug, Clone)]
pub struct OperationSpanAttributes {
    pub operation_id: String,
    pub method: String,
    /// Full request URL; the query string is dropped before recording
    pub url: String,
    pub status: Option<u16>,
    pub error: Option<String>,
    pub duration_ms: u64,
}

/// Create and record a span for an operation call.
///
/// Either `status` or `error` is expected to be set: a response of any
/// status records the code, a transport failure records the error text.
pub fn trace_operation_call(attrs: OperationSpanAttributes) {
    let span = tracing::info_span!(
        "execute_operation",
        { OPENAPI_OPERATION_ID } = %attrs.operation_id,
        { HTTP_REQUEST_METHOD } = %attrs.method,
        { URL_FULL } = redact_query(&attrs.url),
        { OPENAPI_DURATION_MS } = attrs.duration_ms,
        { HTTP_RESPONSE_STATUS_CODE } = tracing::field::Empty,
        { ERROR_TYPE } = tracing::field::Empty,
    );

    if let Some(status) = attrs.status {
        span.record(HTTP_RESPONSE_STATUS_CODE, status);
    }
    if let Some(error) = &attrs.error {
        span.record(ERROR_TYPE, error.as_str());
    }

    let _guard = span.enter();
}

/// The URL without its query string or fragment.
pub fn redact_query(url: &str) -> &str {
    url.split(['?', '#']).next().unwrap_or(url)
}

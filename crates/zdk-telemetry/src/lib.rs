//! # ZDK Telemetry
//!
//! OpenTelemetry integration for tracing OpenAPI operation calls.
//!
//! Every request sent by the executor is recorded as an `execute_operation`
//! span carrying HTTP semantic-convention attributes. Query strings are
//! stripped before recording since they may carry API keys.

mod spans;
mod tracer;

pub use spans::{OperationSpanAttributes, redact_query, trace_operation_call};
pub use tracer::{
    DEFAULT_FILTER, init_telemetry, register_span_processor, tracer_provider, try_init_telemetry,
};

/// OpenTelemetry span attribute constants.
pub mod attributes {
    // HTTP semantic conventions
    pub const HTTP_REQUEST_METHOD: &str = "http.request.method";
    pub const HTTP_RESPONSE_STATUS_CODE: &str = "http.response.status_code";
    pub const URL_FULL: &str = "url.full";
    pub const ERROR_TYPE: &str = "error.type";

    // OpenAPI attributes
    pub const OPENAPI_OPERATION_ID: &str = "openapi.operation.id";
    pub const OPENAPI_DURATION_MS: &str = "openapi.duration_ms";

    pub const SYSTEM_NAME: &str = "zdk.openapi";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attributes_constants() {
        assert_eq!(attributes::HTTP_REQUEST_METHOD, "http.request.method");
        assert_eq!(attributes::URL_FULL, "url.full");
        assert_eq!(attributes::SYSTEM_NAME, "zdk.openapi");
    }
}

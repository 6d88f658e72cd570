//! # ZDK OpenAPI
//!
//! Facade over the workspace crates: the operation executor and its
//! telemetry helpers.

pub use zdk_openapi_executor::*;
pub use zdk_telemetry as telemetry;

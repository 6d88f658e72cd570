//! # ZDK OpenAPI Executor
//!
//! Executes operations described by an OpenAPI 3.x document.
//!
//! ## Features
//!
//! - Parse OpenAPI v3.0+ specifications (JSON and YAML), inlining local `$ref`s
//! - Resolve operations by `operationId` with path-level parameter merging
//! - Negotiate security requirements (API key, HTTP basic, bearer, OAuth2)
//! - Place arguments into path, query, headers or the request body
//! - Step through OAuth2 flows, including PKCE authorization URLs
//!
//! ## Example
//!
//! ```no_run
//! use zdk_openapi_executor::{ExecutorConfig, OpenApiExecutor, RequestOptions, SpecSnapshot};
//! use serde_json::json;
//! use std::env;
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let executor = OpenApiExecutor::new().with_spec(SpecSnapshot::from_file("./api/openapi.yaml")?);
//! let config = ExecutorConfig::new().with_bearer_token(env::var("API_TOKEN")?);
//!
//! let response = executor
//!     .execute_operation("listPets", &config, &json!({ "limit": 10 }), &RequestOptions::new())
//!     .await?;
//! println!("{}: {}", response.status, response.data);
//! # Ok(())
//! # }
//! ```

mod auth;
mod config;
mod encoding;
mod error;
mod executor;
mod oauth;
mod params;
mod parser;
mod request;
mod resolver;
mod secret;
mod spec;
mod transport;
mod types;

pub use auth::{SecurityContribution, SecurityNegotiator};
pub use config::ExecutorConfig;
pub use encoding::encode_pairs;
pub use error::{OpenApiError, Result};
pub use executor::OpenApiExecutor;
pub use oauth::{
    AUTHORIZATION_URL_STAGE, AuthorizationRequest, FlowStage, StageOutcome, TOKEN_URL_STAGE,
    build_authorization_request, code_challenge, generate_code_verifier, token_operation,
};
pub use params::{PlacedParameters, place_parameters};
pub use parser::dereference;
pub use request::{FORM_URLENCODED, JSON, RequestAssembler};
pub use resolver::{OperationResolver, ResolvedOperation};
pub use secret::{Secret, SecretResolver};
pub use spec::{
    ApiKeyLocation, Components, OAuthFlow, OAuthFlows, Operation, Parameter, PathItem,
    RequestBody, SecurityRequirement, SecurityScheme, Server, ServerVariable, SpecSnapshot,
};
pub use transport::{HttpTransport, ReqwestTransport};
pub use types::{HttpResponse, ParameterLocation, RequestDescriptor, RequestOptions, ResponseType};

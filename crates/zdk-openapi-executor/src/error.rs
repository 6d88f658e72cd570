//! Error types for OpenAPI operation execution.

use thiserror::Error;

/// Result type for OpenAPI operations.
pub type Result<T> = std::result::Result<T, OpenApiError>;

/// Errors that can occur while resolving, authenticating and executing an operation.
///
/// Validation failures carry literal, user-facing messages; callers match on the
/// variant and may surface the message as-is.
#[derive(Error, Debug)]
pub enum OpenApiError {
    /// No spec was set on the executor before use
    #[error("No OpenApi spec has been set for this executor.")]
    SpecNotLoaded,

    /// OpenAPI spec parsing error
    #[error("Failed to parse OpenAPI spec: {0}")]
    ParseError(String),

    /// Invalid OpenAPI specification
    #[error("Invalid OpenAPI spec: {0}")]
    InvalidSpec(String),

    /// Operation not found
    #[error("No OpenApi operation with operationId {0} was found in the spec.")]
    OperationNotFound(String),

    /// None of the security requirement alternatives can be met by the configuration
    #[error("No supported security schemes were found in the configuration provided.")]
    UnsatisfiedSecurity,

    /// Security scheme type that cannot be executed (e.g. openIdConnect)
    #[error("Execution of {0} security schemes is not supported.")]
    UnsupportedSchemeType(String),

    /// apiKey placed somewhere other than a header or the query string
    #[error("apiKey security scheme in {0} is not supported.")]
    UnsupportedSecurityLocation(String),

    /// Required parameter absent from the arguments
    #[error("Parameter {0} is required for this operation.")]
    MissingRequiredParameter(String),

    /// Parameter declared in an unsupported location (e.g. cookie)
    #[error("Parameters with \"in\" set to {0} are not supported.")]
    UnsupportedParameterLocation(String),

    /// Invalid parameter value
    #[error("Invalid parameter value for '{0}': {1}")]
    InvalidParameter(String, String),

    /// Security scheme name not declared in components.securitySchemes
    #[error("No security scheme called {0} found.")]
    UnknownSecurityScheme(String),

    /// OAuth2 flow not declared on the scheme
    #[error("Security scheme {scheme} does not have a {flow} flow.")]
    UnknownFlow { scheme: String, flow: String },

    /// Stage is not a url-valued field of the flow
    #[error("Flow {flow} of security scheme {scheme} does not have a {stage} stage.")]
    UnknownStage {
        scheme: String,
        flow: String,
        stage: String,
    },

    /// Stage exists on the flow but cannot be executed
    #[error("Execution of the {stage} stage of the {flow} flow of security scheme {scheme} is not supported.")]
    UnsupportedStage {
        scheme: String,
        flow: String,
        stage: String,
    },

    /// A caller-supplied credential resolver failed
    #[error("Failed to resolve credential for security scheme {scheme}: {source}")]
    CredentialResolution {
        scheme: String,
        #[source]
        source: anyhow::Error,
    },

    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Failure raised by a custom transport
    #[error("Transport error: {0}")]
    Transport(#[source] anyhow::Error),

    /// URL parsing error
    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML parsing error
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// Configuration file parsing error
    #[error("Config error: {0}")]
    ConfigError(#[from] toml::de::Error),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

//! Executor facade tying the pipeline together.

use crate::auth::SecurityNegotiator;
use crate::config::ExecutorConfig;
use crate::error::{OpenApiError, Result};
use crate::oauth::{
    AUTHORIZATION_URL_STAGE, FlowStage, StageOutcome, TOKEN_URL_STAGE,
    build_authorization_request, token_operation,
};
use crate::params::place_parameters;
use crate::request::RequestAssembler;
use crate::resolver::{OperationResolver, ResolvedOperation};
use crate::spec::{SecurityScheme, SpecSnapshot};
use crate::transport::{HttpTransport, ReqwestTransport};
use crate::types::{HttpResponse, RequestDescriptor, RequestOptions};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument};
use zdk_telemetry::{OperationSpanAttributes, redact_query, trace_operation_call};

/// Executes OpenAPI operations against one spec snapshot.
///
/// # Example
///
/// ```no_run
/// use zdk_openapi_executor::{ExecutorConfig, OpenApiExecutor, RequestOptions, SpecSnapshot};
/// use serde_json::json;
///
/// # async fn example() -> Result<(), zdk_openapi_executor::OpenApiError> {
/// let executor = OpenApiExecutor::new().with_spec(SpecSnapshot::from_file("./api/openapi.yaml")?);
/// let config = ExecutorConfig::new().with_api_key(std::env::var("API_KEY").unwrap_or_default());
///
/// let response = executor
///     .execute_operation("getPet", &config, &json!({ "petId": "42" }), &RequestOptions::new())
///     .await?;
/// println!("{} {}", response.status, response.data);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct OpenApiExecutor {
    spec: Option<Arc<SpecSnapshot>>,
    transport: Arc<dyn HttpTransport>,
}

impl Default for OpenApiExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenApiExecutor {
    /// Executor without a spec, sending through [`ReqwestTransport`].
    pub fn new() -> Self {
        Self {
            spec: None,
            transport: Arc::new(ReqwestTransport::new()),
        }
    }

    pub fn with_spec(mut self, spec: SpecSnapshot) -> Self {
        self.set_spec(spec);
        self
    }

    pub fn set_spec(&mut self, spec: SpecSnapshot) {
        info!("Setting OpenAPI spec with {} paths", spec.paths.len());
        self.spec = Some(Arc::new(spec));
    }

    pub fn with_transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = transport;
        self
    }

    pub fn spec(&self) -> Result<&SpecSnapshot> {
        self.spec.as_deref().ok_or(OpenApiError::SpecNotLoaded)
    }

    /// Every operationId in the spec, in document order.
    pub fn operation_ids(&self) -> Result<Vec<String>> {
        Ok(OperationResolver::new(self.spec()?).operation_ids())
    }

    /// Run the full pipeline for an operation without sending anything.
    #[instrument(skip(self, config, args, options))]
    pub async fn build_request(
        &self,
        operation_id: &str,
        config: &ExecutorConfig,
        args: &Value,
        options: &RequestOptions,
    ) -> Result<RequestDescriptor> {
        let spec = self.spec()?;
        let operation = OperationResolver::new(spec).resolve(operation_id)?;
        self.prepare(&operation, spec.security_schemes(), config, args, options)
            .await
    }

    /// Build and send the request for `operation_id`.
    ///
    /// `args` must be a JSON object (or `null`). Non-2xx responses are
    /// returned as-is.
    pub async fn execute_operation(
        &self,
        operation_id: &str,
        config: &ExecutorConfig,
        args: &Value,
        options: &RequestOptions,
    ) -> Result<HttpResponse> {
        let request = self
            .build_request(operation_id, config, args, options)
            .await?;
        self.send(operation_id, request).await
    }

    /// Execute one stage of an OAuth2 flow declared in the spec.
    ///
    /// `authorizationUrl` returns a PKCE authorization URL without touching
    /// the network; `tokenUrl` performs the token request.
    #[instrument(skip(self, config, args))]
    pub async fn execute_security_scheme_stage(
        &self,
        scheme: &str,
        flow: &str,
        stage: &str,
        config: &ExecutorConfig,
        args: &Value,
    ) -> Result<StageOutcome> {
        let spec = self.spec()?;
        let target = FlowStage::locate(spec.security_schemes(), scheme, flow, stage)?;

        match stage {
            AUTHORIZATION_URL_STAGE => {
                let args = object_args(args)?;
                let request = build_authorization_request(target.url, target.flow, &args);
                debug!("Built authorization URL for {} {}", scheme, flow);
                Ok(StageOutcome::Authorization(request))
            }
            TOKEN_URL_STAGE => {
                let (operation, schemes) = token_operation(flow, target.url);
                // The token endpoint is absolute; a configured base path must not prefix it.
                let token_config = ExecutorConfig {
                    base_path: None,
                    ..config.clone()
                };
                let request = self
                    .prepare(&operation, &schemes, &token_config, args, &RequestOptions::new())
                    .await?;
                let response = self.send(&operation.operation_id, request).await?;
                Ok(StageOutcome::Response(response))
            }
            _ => Err(target.unsupported()),
        }
    }

    async fn prepare(
        &self,
        operation: &ResolvedOperation,
        schemes: &IndexMap<String, SecurityScheme>,
        config: &ExecutorConfig,
        args: &Value,
        options: &RequestOptions,
    ) -> Result<RequestDescriptor> {
        let args = object_args(args)?;
        let security = SecurityNegotiator::new(schemes, config)
            .negotiate(&operation.security)
            .await?;
        let placed = place_parameters(&operation.path, &operation.parameters, &args)?;
        RequestAssembler::new(config).assemble(operation, security, placed, options)
    }

    async fn send(&self, operation_id: &str, request: RequestDescriptor) -> Result<HttpResponse> {
        let method = request.method.to_string();
        let url = request.url.clone();
        debug!("Request URL: {} {}", method, redact_query(&url));

        let started = Instant::now();
        let result = self.transport.send(request).await;

        trace_operation_call(OperationSpanAttributes {
            operation_id: operation_id.to_string(),
            method,
            url,
            status: result.as_ref().ok().map(|response| response.status),
            error: result.as_ref().err().map(ToString::to_string),
            duration_ms: started.elapsed().as_millis() as u64,
        });

        result
    }
}

fn object_args(args: &Value) -> Result<Map<String, Value>> {
    match args {
        Value::Null => Ok(Map::new()),
        Value::Object(map) => Ok(map.clone()),
        _ => Err(OpenApiError::InvalidParameter(
            "args".to_string(),
            "Expected object".to_string(),
        )),
    }
}

//! Operation lookup.
//!
//! Finds an operation by `operationId` and flattens what it inherits from its
//! path item and from the document: parameters, security and base path.

use crate::error::{OpenApiError, Result};
use crate::spec::{Parameter, SecurityRequirement, Server, SpecSnapshot};
use reqwest::Method;
use tracing::debug;

/// An operation merged with everything it inherits.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedOperation {
    pub operation_id: String,
    pub method: Method,
    /// Path template, e.g. `/pets/{petId}`
    pub path: String,
    /// Operation parameters followed by inherited path-item parameters
    pub parameters: Vec<Parameter>,
    /// Media types declared by the request body, in document order
    pub request_body_content_types: Vec<String>,
    /// Security alternatives (operation-level, else document-level)
    pub security: Vec<SecurityRequirement>,
    /// Operation servers > path-item servers > global servers > ""
    pub base_path: String,
}

/// Resolves operations against one spec snapshot.
pub struct OperationResolver<'a> {
    spec: &'a SpecSnapshot,
}

impl<'a> OperationResolver<'a> {
    pub fn new(spec: &'a SpecSnapshot) -> Self {
        Self { spec }
    }

    /// Find `operation_id`, scanning paths and then methods in document order.
    ///
    /// The first match wins when an id is declared more than once.
    pub fn resolve(&self, operation_id: &str) -> Result<ResolvedOperation> {
        for (path, item) in &self.spec.paths {
            for (method, operation) in &item.operations {
                if operation.operation_id.as_deref() != Some(operation_id) {
                    continue;
                }

                debug!("Resolved {} to {} {}", operation_id, method, path);

                let mut parameters = operation.parameters.clone();
                for inherited in &item.parameters {
                    let overridden = parameters
                        .iter()
                        .any(|p| p.name == inherited.name && p.location == inherited.location);
                    if !overridden {
                        parameters.push(inherited.clone());
                    }
                }

                let security = operation
                    .security
                    .as_ref()
                    .or(self.spec.security.as_ref())
                    .cloned()
                    .unwrap_or_default();

                let base_path = first_server_url(&operation.servers)
                    .or_else(|| first_server_url(&item.servers))
                    .unwrap_or_else(|| self.global_base_path());

                let request_body_content_types = operation
                    .request_body
                    .as_ref()
                    .map(|body| body.content.keys().cloned().collect())
                    .unwrap_or_default();

                return Ok(ResolvedOperation {
                    operation_id: operation_id.to_string(),
                    method: method.clone(),
                    path: path.clone(),
                    parameters,
                    request_body_content_types,
                    security,
                    base_path,
                });
            }
        }

        Err(OpenApiError::OperationNotFound(operation_id.to_string()))
    }

    /// Base path from the document-level `servers`, or "" when none is declared.
    pub fn global_base_path(&self) -> String {
        first_server_url(&self.spec.servers).unwrap_or_default()
    }

    /// Every declared operationId, in document order.
    pub fn operation_ids(&self) -> Vec<String> {
        self.spec
            .paths
            .values()
            .flat_map(|item| item.operations.iter())
            .filter_map(|(_, operation)| operation.operation_id.clone())
            .collect()
    }
}

fn first_server_url(servers: &[Server]) -> Option<String> {
    servers.first().map(Server::resolved_url)
}

//! Request assembly.
//!
//! Merges the security contribution, the placed parameters and the layered
//! request options into one [`RequestDescriptor`].

use crate::auth::SecurityContribution;
use crate::config::ExecutorConfig;
use crate::encoding::encode_pairs;
use crate::error::Result;
use crate::params::PlacedParameters;
use crate::resolver::ResolvedOperation;
use crate::types::{RequestDescriptor, RequestOptions, insert_header};
use indexmap::IndexMap;
use serde_json::{Map, Value};

pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
pub const JSON: &str = "application/json";

/// Builds request descriptors for one configuration.
pub struct RequestAssembler<'a> {
    config: &'a ExecutorConfig,
}

impl<'a> RequestAssembler<'a> {
    pub fn new(config: &'a ExecutorConfig) -> Self {
        Self { config }
    }

    /// Assemble the final request.
    ///
    /// Header precedence, lowest first: security and parameter headers (and
    /// `Content-Type`), `base_options.headers`, then `options.headers`.
    pub fn assemble(
        &self,
        operation: &ResolvedOperation,
        security: SecurityContribution,
        placed: PlacedParameters,
        options: &RequestOptions,
    ) -> Result<RequestDescriptor> {
        let mut query = security.query;
        query.extend(placed.query);

        let mut headers = IndexMap::new();
        for (name, value) in security.headers.into_iter().chain(placed.headers) {
            insert_header(&mut headers, name, value);
        }

        let body = serialize_body(&placed.body, &operation.request_body_content_types)?;
        if let Some((_, content_type)) = &body {
            insert_header(&mut headers, "Content-Type".to_string(), content_type.to_string());
        }

        let merged = self.config.base_options.merge(options);
        for (name, value) in merged.headers {
            insert_header(&mut headers, name, value);
        }

        let base_path = self
            .config
            .base_path
            .as_deref()
            .unwrap_or(&operation.base_path);
        let mut url = format!("{}{}", base_path, placed.path);
        let query_string = encode_pairs(&query);
        if !query_string.is_empty() {
            url.push(if url.contains('?') { '&' } else { '?' });
            url.push_str(&query_string);
        }

        Ok(RequestDescriptor {
            method: operation.method.clone(),
            url,
            headers,
            body: body.map(|(body, _)| body),
            timeout: merged.timeout,
            response_type: merged.response_type.unwrap_or_default(),
        })
    }
}

/// Serialize the body bag; `None` when there is nothing to send.
///
/// Form encoding is used only when the operation accepts form data and does
/// not also accept JSON.
fn serialize_body(
    body: &Map<String, Value>,
    content_types: &[String],
) -> Result<Option<(String, &'static str)>> {
    if body.is_empty() {
        return Ok(None);
    }

    let accepts = |media: &str| content_types.iter().any(|c| c == media);
    if accepts(FORM_URLENCODED) && !accepts(JSON) {
        // Null fields are skipped, so a bag of nulls encodes to nothing
        let encoded = encode_pairs(body);
        if encoded.is_empty() {
            return Ok(None);
        }
        Ok(Some((encoded, FORM_URLENCODED)))
    } else {
        Ok(Some((serde_json::to_string(body)?, JSON)))
    }
}

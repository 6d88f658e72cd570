//! OpenAPI document loading.
//!
//! Reads a raw OpenAPI 3.0 document (JSON or YAML), inlines every local
//! `$ref` pointer and produces an immutable [`SpecSnapshot`].

use crate::error::{OpenApiError, Result};
use crate::spec::SpecSnapshot;
use serde_json::{Map, Value};
use std::path::Path;
use tracing::{debug, info};

impl SpecSnapshot {
    /// Load and parse an OpenAPI spec from a file.
    ///
    /// Files ending in `.json` are read as JSON, everything else as YAML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading OpenAPI spec from file: {}", path.display());
        let content = std::fs::read_to_string(path)?;

        let document: Value = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };

        Self::from_value(document)
    }

    /// Load and parse an OpenAPI spec from a URL.
    pub async fn from_url(url: &str) -> Result<Self> {
        info!("Loading OpenAPI spec from URL: {}", url);
        let response = reqwest::get(url).await?.error_for_status()?;
        let content = response.text().await?;
        Self::from_str(&content)
    }

    /// Parse an OpenAPI spec from a string.
    ///
    /// Tries JSON first, then YAML.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self> {
        let document: Value = serde_json::from_str(content)
            .or_else(|_| serde_yaml::from_str(content))
            .map_err(|e| OpenApiError::ParseError(e.to_string()))?;
        Self::from_value(document)
    }

    /// Build a snapshot from an already-parsed document.
    pub fn from_value(document: Value) -> Result<Self> {
        let dereferenced = dereference(&document)?;
        let spec: SpecSnapshot = serde_json::from_value(dereferenced)
            .map_err(|e| OpenApiError::ParseError(e.to_string()))?;

        debug!(
            "Loaded spec with {} paths and {} security schemes",
            spec.paths.len(),
            spec.components.security_schemes.len()
        );
        Ok(spec)
    }
}

/// Replace every local `$ref` in `document` with a copy of its target.
///
/// A reference that points back into its own expansion is left in place:
/// recursive schemas are legal and the executor never reads schemas.
pub fn dereference(document: &Value) -> Result<Value> {
    let mut active = Vec::new();
    inline_refs(document, document, &mut active)
}

fn inline_refs(node: &Value, root: &Value, active: &mut Vec<String>) -> Result<Value> {
    match node {
        Value::Object(map) => {
            if let Some(Value::String(reference)) = map.get("$ref") {
                return inline_ref(node, reference, root, active);
            }
            let mut out = Map::with_capacity(map.len());
            for (key, value) in map {
                out.insert(key.clone(), inline_refs(value, root, active)?);
            }
            Ok(Value::Object(out))
        }
        Value::Array(items) => items
            .iter()
            .map(|item| inline_refs(item, root, active))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        other => Ok(other.clone()),
    }
}

fn inline_ref(node: &Value, reference: &str, root: &Value, active: &mut Vec<String>) -> Result<Value> {
    let Some(fragment) = reference.strip_prefix('#') else {
        return Err(OpenApiError::InvalidSpec(format!(
            "external reference {} cannot be resolved",
            reference
        )));
    };

    if active.iter().any(|r| r == reference) {
        debug!("Leaving recursive reference {} unresolved", reference);
        return Ok(node.clone());
    }

    let pointer = urlencoding::decode(fragment)
        .map_err(|e| OpenApiError::InvalidSpec(format!("bad reference {}: {}", reference, e)))?;
    let target = root.pointer(&pointer).ok_or_else(|| {
        OpenApiError::InvalidSpec(format!("reference {} does not resolve", reference))
    })?;

    active.push(reference.to_string());
    let resolved = inline_refs(target, root, active);
    active.pop();
    resolved
}

//! Argument placement.
//!
//! Each caller argument is matched by name against the operation's declared
//! parameters and routed to the path, the query string or a header. Anything
//! that matches no parameter becomes a request-body field.

use crate::encoding::value_to_string;
use crate::error::{OpenApiError, Result};
use crate::spec::Parameter;
use crate::types::ParameterLocation;
use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::debug;

/// Headers owned by the negotiator and the assembler; header parameters with
/// these names are dropped.
const RESERVED_HEADERS: [&str; 3] = ["accept", "content-type", "authorization"];

/// Where each argument ended up.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlacedParameters {
    /// Path template with `{name}` tokens substituted
    pub path: String,
    pub query: IndexMap<String, Value>,
    pub headers: IndexMap<String, String>,
    /// Arguments matching no declared parameter
    pub body: Map<String, Value>,
}

/// Route `args` into path, query, headers and body.
pub fn place_parameters(
    template: &str,
    parameters: &[Parameter],
    args: &Map<String, Value>,
) -> Result<PlacedParameters> {
    if let Some(missing) = parameters
        .iter()
        .find(|p| p.required && !args.contains_key(&p.name))
    {
        return Err(OpenApiError::MissingRequiredParameter(missing.name.clone()));
    }

    let mut placed = PlacedParameters {
        path: template.to_string(),
        ..Default::default()
    };

    for (key, value) in args {
        let Some(parameter) = parameters.iter().find(|p| &p.name == key) else {
            placed.body.insert(key.clone(), value.clone());
            continue;
        };

        match &parameter.location {
            ParameterLocation::Query => {
                placed.query.insert(key.clone(), value.clone());
            }
            ParameterLocation::Path => {
                placed.path = placed
                    .path
                    .replace(&format!("{{{}}}", key), &value_to_string(value));
            }
            ParameterLocation::Header => {
                if RESERVED_HEADERS.iter().any(|h| h.eq_ignore_ascii_case(key)) {
                    debug!("Dropping reserved header parameter {}", key);
                    continue;
                }
                placed.headers.insert(key.clone(), value_to_string(value));
            }
            other => {
                return Err(OpenApiError::UnsupportedParameterLocation(other.to_string()));
            }
        }
    }

    Ok(placed)
}

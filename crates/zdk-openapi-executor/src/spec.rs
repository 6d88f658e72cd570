//! Typed view over a dereferenced OpenAPI 3.0 document.
//!
//! Only the parts the executor reads are modelled. Maps keep document order,
//! which the operation lookup relies on.

use crate::types::ParameterLocation;
use indexmap::IndexMap;
use reqwest::Method;
use serde::Deserialize;
use serde_json::Value;

/// One alternative of a `security` list: scheme name → required scopes.
pub type SecurityRequirement = IndexMap<String, Vec<String>>;

/// Immutable, fully-dereferenced OpenAPI document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpecSnapshot {
    #[serde(default)]
    pub openapi: Option<String>,
    #[serde(default)]
    pub servers: Vec<Server>,
    #[serde(default)]
    pub paths: IndexMap<String, PathItem>,
    #[serde(default)]
    pub security: Option<Vec<SecurityRequirement>>,
    #[serde(default)]
    pub components: Components,
}

impl SpecSnapshot {
    /// Declared security schemes, by name.
    pub fn security_schemes(&self) -> &IndexMap<String, SecurityScheme> {
        &self.components.security_schemes
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Components {
    #[serde(default)]
    pub security_schemes: IndexMap<String, SecurityScheme>,
}

/// A server entry (`servers[]`).
#[derive(Debug, Clone, Deserialize)]
pub struct Server {
    pub url: String,
    #[serde(default)]
    pub variables: IndexMap<String, ServerVariable>,
}

impl Server {
    /// Server URL with every `{variable}` replaced by its default and trailing
    /// slashes removed.
    pub fn resolved_url(&self) -> String {
        let mut url = self.url.clone();
        for (name, variable) in &self.variables {
            url = url.replace(&format!("{{{}}}", name), &variable.default);
        }
        url.trim_end_matches('/').to_string()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerVariable {
    pub default: String,
}

const HTTP_METHODS: [&str; 8] = [
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

/// A path item with its operations kept in document order.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(try_from = "RawPathItem")]
pub struct PathItem {
    pub servers: Vec<Server>,
    pub parameters: Vec<Parameter>,
    pub operations: Vec<(Method, Operation)>,
}

#[derive(Deserialize)]
struct RawPathItem {
    #[serde(default)]
    servers: Vec<Server>,
    #[serde(default)]
    parameters: Vec<Parameter>,
    #[serde(flatten)]
    rest: IndexMap<String, Value>,
}

impl TryFrom<RawPathItem> for PathItem {
    type Error = String;

    fn try_from(raw: RawPathItem) -> std::result::Result<Self, Self::Error> {
        let mut operations = Vec::new();
        for (key, value) in raw.rest {
            if !HTTP_METHODS.contains(&key.as_str()) {
                continue;
            }
            let method = Method::from_bytes(key.to_uppercase().as_bytes())
                .map_err(|e| format!("invalid method {}: {}", key, e))?;
            let operation: Operation = serde_json::from_value(value)
                .map_err(|e| format!("invalid {} operation: {}", key, e))?;
            operations.push((method, operation));
        }

        Ok(PathItem {
            servers: raw.servers,
            parameters: raw.parameters,
            operations,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub operation_id: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    pub request_body: Option<RequestBody>,
    pub security: Option<Vec<SecurityRequirement>>,
    #[serde(default)]
    pub servers: Vec<Server>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestBody {
    /// Media type → media type object (schema ignored)
    #[serde(default)]
    pub content: IndexMap<String, Value>,
    #[serde(default)]
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "in")]
    pub location: ParameterLocation,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub schema: Option<Value>,
    #[serde(default)]
    pub description: Option<String>,
}

impl Parameter {
    pub fn new(name: impl Into<String>, location: ParameterLocation) -> Self {
        Self {
            name: name.into(),
            location,
            required: false,
            schema: None,
            description: None,
        }
    }
}

/// Where an apiKey credential is placed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiKeyLocation {
    Header,
    Query,
    Other(String),
}

impl std::fmt::Display for ApiKeyLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiKeyLocation::Header => write!(f, "header"),
            ApiKeyLocation::Query => write!(f, "query"),
            ApiKeyLocation::Other(other) => write!(f, "{}", other),
        }
    }
}

/// A declared security scheme.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawSecurityScheme")]
pub enum SecurityScheme {
    ApiKey {
        name: String,
        location: ApiKeyLocation,
    },
    HttpBasic,
    HttpBearer,
    /// `type: http` with a scheme other than basic or bearer
    Http {
        scheme: String,
    },
    OAuth2 {
        flows: OAuthFlows,
    },
    OpenIdConnect {
        url: Option<String>,
    },
    Unsupported {
        kind: String,
    },
}

impl SecurityScheme {
    /// The declared `type` of the scheme.
    pub fn type_name(&self) -> &str {
        match self {
            SecurityScheme::ApiKey { .. } => "apiKey",
            SecurityScheme::HttpBasic | SecurityScheme::HttpBearer | SecurityScheme::Http { .. } => {
                "http"
            }
            SecurityScheme::OAuth2 { .. } => "oauth2",
            SecurityScheme::OpenIdConnect { .. } => "openIdConnect",
            SecurityScheme::Unsupported { kind } => kind,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSecurityScheme {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default, rename = "in")]
    location: Option<String>,
    #[serde(default)]
    scheme: Option<String>,
    #[serde(default)]
    flows: Option<OAuthFlows>,
    #[serde(default)]
    open_id_connect_url: Option<String>,
}

impl From<RawSecurityScheme> for SecurityScheme {
    fn from(raw: RawSecurityScheme) -> Self {
        match raw.kind.as_str() {
            "apiKey" => {
                let location = match raw.location.as_deref() {
                    Some("header") => ApiKeyLocation::Header,
                    Some("query") => ApiKeyLocation::Query,
                    Some(other) => ApiKeyLocation::Other(other.to_string()),
                    None => ApiKeyLocation::Other("undefined".to_string()),
                };
                SecurityScheme::ApiKey {
                    name: raw.name.unwrap_or_default(),
                    location,
                }
            }
            "http" => {
                let scheme = raw.scheme.unwrap_or_default();
                if scheme.eq_ignore_ascii_case("basic") {
                    SecurityScheme::HttpBasic
                } else if scheme.eq_ignore_ascii_case("bearer") {
                    SecurityScheme::HttpBearer
                } else {
                    SecurityScheme::Http { scheme }
                }
            }
            "oauth2" => SecurityScheme::OAuth2 {
                flows: raw.flows.unwrap_or_default(),
            },
            "openIdConnect" => SecurityScheme::OpenIdConnect {
                url: raw.open_id_connect_url,
            },
            _ => SecurityScheme::Unsupported { kind: raw.kind },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthFlows {
    pub implicit: Option<OAuthFlow>,
    pub password: Option<OAuthFlow>,
    pub client_credentials: Option<OAuthFlow>,
    pub authorization_code: Option<OAuthFlow>,
}

impl OAuthFlows {
    /// Look a flow up by its document key (e.g. `authorizationCode`).
    pub fn get(&self, name: &str) -> Option<&OAuthFlow> {
        match name {
            "implicit" => self.implicit.as_ref(),
            "password" => self.password.as_ref(),
            "clientCredentials" => self.client_credentials.as_ref(),
            "authorizationCode" => self.authorization_code.as_ref(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthFlow {
    pub authorization_url: Option<String>,
    pub token_url: Option<String>,
    pub refresh_url: Option<String>,
    #[serde(default)]
    pub scopes: IndexMap<String, String>,
    #[serde(flatten)]
    pub extensions: IndexMap<String, Value>,
}

impl OAuthFlow {
    /// The url stored under a string-valued key of the flow object.
    pub fn stage_url(&self, stage: &str) -> Option<&str> {
        match stage {
            "authorizationUrl" => self.authorization_url.as_deref(),
            "tokenUrl" => self.token_url.as_deref(),
            "refreshUrl" => self.refresh_url.as_deref(),
            other => self.extensions.get(other).and_then(Value::as_str),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_path_item_keeps_method_order() {
        let item: PathItem = serde_json::from_value(json!({
            "summary": "pets",
            "post": { "operationId": "createPet" },
            "get": { "operationId": "listPets" },
            "parameters": [{ "name": "tenant", "in": "header" }]
        }))
        .unwrap();

        let ids: Vec<_> = item
            .operations
            .iter()
            .map(|(method, op)| (method.as_str(), op.operation_id.clone().unwrap()))
            .collect();
        assert_eq!(
            ids,
            vec![("POST", "createPet".to_string()), ("GET", "listPets".to_string())]
        );
        assert_eq!(item.parameters[0].location, ParameterLocation::Header);
    }

    #[test]
    fn test_security_scheme_variants() {
        let schemes: IndexMap<String, SecurityScheme> = serde_json::from_value(json!({
            "key": { "type": "apiKey", "in": "cookie", "name": "session" },
            "basic": { "type": "http", "scheme": "Basic" },
            "bearer": { "type": "http", "scheme": "bearer" },
            "digest": { "type": "http", "scheme": "digest" },
            "oAuth": { "type": "oauth2" },
            "oidc": { "type": "openIdConnect", "openIdConnectUrl": "https://example.com/.well-known" },
            "custom": { "type": "mutualTLS" }
        }))
        .unwrap();

        assert_eq!(
            schemes["key"],
            SecurityScheme::ApiKey {
                name: "session".to_string(),
                location: ApiKeyLocation::Other("cookie".to_string())
            }
        );
        assert_eq!(schemes["basic"], SecurityScheme::HttpBasic);
        assert_eq!(schemes["bearer"], SecurityScheme::HttpBearer);
        assert_eq!(schemes["digest"].type_name(), "http");
        assert_eq!(schemes["oAuth"], SecurityScheme::OAuth2 { flows: OAuthFlows::default() });
        assert_eq!(schemes["oidc"].type_name(), "openIdConnect");
        assert_eq!(schemes["custom"].type_name(), "mutualTLS");
    }

    #[test]
    fn test_server_url_resolution() {
        let server: Server = serde_json::from_value(json!({
            "url": "https://{region}.example.com/{version}/",
            "variables": {
                "region": { "default": "eu", "enum": ["eu", "us"] },
                "version": { "default": "v2" }
            }
        }))
        .unwrap();
        assert_eq!(server.resolved_url(), "https://eu.example.com/v2");
    }

    #[test]
    fn test_flow_stage_urls() {
        let flow: OAuthFlow = serde_json::from_value(json!({
            "authorizationUrl": "https://example.com/authorize",
            "tokenUrl": "https://example.com/token",
            "scopes": { "read": "Read access" },
            "x-deviceUrl": "https://example.com/device"
        }))
        .unwrap();

        assert_eq!(flow.stage_url("tokenUrl"), Some("https://example.com/token"));
        assert_eq!(flow.stage_url("x-deviceUrl"), Some("https://example.com/device"));
        assert_eq!(flow.stage_url("refreshUrl"), None);
        assert_eq!(flow.stage_url("scopes"), None);
    }
}

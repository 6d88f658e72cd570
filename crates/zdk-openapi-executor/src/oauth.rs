//! OAuth2 flow stages.
//!
//! A stage is addressed by `(scheme, flow, stage)`, e.g.
//! `("oAuth", "authorizationCode", "authorizationUrl")`. The authorization
//! stage is computed locally with PKCE; the token stage is executed as a
//! synthetic operation through the regular request pipeline.

use crate::encoding::{encode_pairs, value_to_string};
use crate::error::{OpenApiError, Result};
use crate::request::FORM_URLENCODED;
use crate::resolver::ResolvedOperation;
use crate::spec::{OAuthFlow, Parameter, SecurityRequirement, SecurityScheme};
use crate::types::{HttpResponse, ParameterLocation};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use indexmap::IndexMap;
use rand::RngCore;
use reqwest::Method;
use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

pub const AUTHORIZATION_URL_STAGE: &str = "authorizationUrl";
pub const TOKEN_URL_STAGE: &str = "tokenUrl";

const CLIENT_CREDENTIALS_FLOW: &str = "clientCredentials";
const TOKEN_BASIC_SCHEME: &str = "basic";
const TOKEN_QUERY_PARAMETERS: [&str; 7] = [
    "code",
    "grant_type",
    "refresh_token",
    "client_id",
    "client_secret",
    "redirect_uri",
    "code_verifier",
];
const AUTHORIZATION_PARAMETERS: [&str; 3] = ["redirect_uri", "client_id", "response_type"];

/// Result of the authorization stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationRequest {
    /// PKCE verifier to keep for the token exchange
    pub code_verifier: String,
    /// URL to send the user agent to
    pub authorization_url: String,
}

/// Result of executing one flow stage.
#[derive(Debug, Clone, PartialEq)]
pub enum StageOutcome {
    Authorization(AuthorizationRequest),
    Response(HttpResponse),
}

/// A validated `(scheme, flow, stage)` triple.
#[derive(Debug)]
pub struct FlowStage<'a> {
    pub scheme: &'a str,
    pub flow_name: &'a str,
    pub stage: &'a str,
    pub flow: &'a OAuthFlow,
    /// The url stored under the stage key
    pub url: &'a str,
}

impl<'a> FlowStage<'a> {
    /// Validate that the scheme, flow and stage exist.
    pub fn locate(
        schemes: &'a IndexMap<String, SecurityScheme>,
        scheme: &'a str,
        flow_name: &'a str,
        stage: &'a str,
    ) -> Result<Self> {
        let definition = schemes
            .get(scheme)
            .ok_or_else(|| OpenApiError::UnknownSecurityScheme(scheme.to_string()))?;

        let SecurityScheme::OAuth2 { flows } = definition else {
            return Err(OpenApiError::UnsupportedSchemeType(
                definition.type_name().to_string(),
            ));
        };

        let flow = flows.get(flow_name).ok_or_else(|| OpenApiError::UnknownFlow {
            scheme: scheme.to_string(),
            flow: flow_name.to_string(),
        })?;

        let url = flow.stage_url(stage).ok_or_else(|| OpenApiError::UnknownStage {
            scheme: scheme.to_string(),
            flow: flow_name.to_string(),
            stage: stage.to_string(),
        })?;

        Ok(Self {
            scheme,
            flow_name,
            stage,
            flow,
            url,
        })
    }

    pub(crate) fn unsupported(&self) -> OpenApiError {
        OpenApiError::UnsupportedStage {
            scheme: self.scheme.to_string(),
            flow: self.flow_name.to_string(),
            stage: self.stage.to_string(),
        }
    }
}

/// A fresh PKCE code verifier: 32 random bytes, base64url without padding.
pub fn generate_code_verifier() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// S256 code challenge for a verifier.
pub fn code_challenge(code_verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(code_verifier.as_bytes()))
}

/// Build the authorization URL for a flow.
///
/// `redirect_uri`, `client_id` and `response_type` are taken from `args`,
/// followed by the PKCE challenge when `response_type` is `code`, any other
/// scalar args, and finally the flow's declared scopes.
pub fn build_authorization_request(
    authorization_url: &str,
    flow: &OAuthFlow,
    args: &Map<String, Value>,
) -> AuthorizationRequest {
    let code_verifier = generate_code_verifier();
    let mut query: IndexMap<String, Value> = IndexMap::new();

    for key in AUTHORIZATION_PARAMETERS {
        if let Some(value) = args.get(key) {
            query.insert(key.to_string(), Value::String(value_to_string(value)));
        }
    }

    if args.get("response_type").and_then(Value::as_str) == Some("code") {
        query.insert(
            "code_challenge".to_string(),
            Value::String(code_challenge(&code_verifier)),
        );
        query.insert(
            "code_challenge_method".to_string(),
            Value::String("S256".to_string()),
        );
    }

    let declares_scopes = !flow.scopes.is_empty();
    for (key, value) in args {
        let standard = AUTHORIZATION_PARAMETERS.contains(&key.as_str());
        let shadowed = declares_scopes && key == "scope";
        if standard || shadowed || query.contains_key(key) {
            continue;
        }
        if !value.is_object() && !value.is_array() {
            query.insert(key.clone(), value.clone());
        }
    }

    if declares_scopes {
        let scopes = flow.scopes.keys().cloned().collect::<Vec<_>>().join(" ");
        query.insert("scope".to_string(), Value::String(scopes));
    }

    let separator = if authorization_url.contains('?') { '&' } else { '?' };
    AuthorizationRequest {
        code_verifier,
        authorization_url: format!("{}{}{}", authorization_url, separator, encode_pairs(&query)),
    }
}

/// Synthetic operation describing a token request, plus the scheme
/// definitions it refers to.
///
/// `clientCredentials` authenticates with HTTP basic (client id and secret as
/// `username`/`password`) and sends a form body; every other flow sends its
/// grant fields as query parameters without authentication.
pub fn token_operation(
    flow_name: &str,
    token_url: &str,
) -> (ResolvedOperation, IndexMap<String, SecurityScheme>) {
    let mut schemes = IndexMap::new();

    let (parameters, request_body_content_types, security) = if flow_name == CLIENT_CREDENTIALS_FLOW
    {
        schemes.insert(TOKEN_BASIC_SCHEME.to_string(), SecurityScheme::HttpBasic);
        let requirement: SecurityRequirement =
            IndexMap::from([(TOKEN_BASIC_SCHEME.to_string(), Vec::new())]);
        (Vec::new(), vec![FORM_URLENCODED.to_string()], vec![requirement])
    } else {
        let parameters = TOKEN_QUERY_PARAMETERS
            .iter()
            .map(|name| Parameter::new(*name, ParameterLocation::Query))
            .collect();
        (parameters, Vec::new(), Vec::new())
    };

    let operation = ResolvedOperation {
        operation_id: format!("{}Token", flow_name),
        method: Method::POST,
        path: token_url.to_string(),
        parameters,
        request_body_content_types,
        security,
        base_path: String::new(),
    };

    (operation, schemes)
}

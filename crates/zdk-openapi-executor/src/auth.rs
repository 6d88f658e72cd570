//! Security negotiation.
//!
//! Picks the first security requirement alternative the configuration can
//! fully satisfy and computes the headers and query values it contributes:
//! - API Key (in header or query parameter)
//! - Bearer Token (Authorization: Bearer <token>)
//! - Basic Auth (Authorization: Basic <base64>)
//! - OAuth2 access token (Authorization: Bearer <token>)

use crate::config::ExecutorConfig;
use crate::error::{OpenApiError, Result};
use crate::secret::Secret;
use crate::spec::{ApiKeyLocation, SecurityRequirement, SecurityScheme};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use indexmap::IndexMap;
use serde_json::Value;
use tracing::debug;

/// Headers and query values contributed by the selected requirement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SecurityContribution {
    pub headers: IndexMap<String, String>,
    pub query: IndexMap<String, Value>,
}

/// Negotiates security for one request.
pub struct SecurityNegotiator<'a> {
    schemes: &'a IndexMap<String, SecurityScheme>,
    config: &'a ExecutorConfig,
}

impl<'a> SecurityNegotiator<'a> {
    pub fn new(schemes: &'a IndexMap<String, SecurityScheme>, config: &'a ExecutorConfig) -> Self {
        Self { schemes, config }
    }

    /// Select a requirement and resolve its credentials.
    ///
    /// An empty `requirements` list means the operation is unauthenticated.
    pub async fn negotiate(&self, requirements: &[SecurityRequirement]) -> Result<SecurityContribution> {
        let mut contribution = SecurityContribution::default();
        if requirements.is_empty() {
            return Ok(contribution);
        }

        let requirement = self.select(requirements)?;
        for (name, scopes) in requirement {
            let Some(scheme) = self.schemes.get(name) else {
                continue;
            };
            self.apply(name, scheme, scopes, &mut contribution).await?;
        }

        Ok(contribution)
    }

    /// First alternative whose every scheme is declared and has a credential.
    pub fn select<'r>(&self, requirements: &'r [SecurityRequirement]) -> Result<&'r SecurityRequirement> {
        for requirement in requirements {
            if self.is_satisfied(requirement)? {
                debug!(
                    "Selected security requirement {:?}",
                    requirement.keys().collect::<Vec<_>>()
                );
                return Ok(requirement);
            }
        }
        Err(OpenApiError::UnsatisfiedSecurity)
    }

    fn is_satisfied(&self, requirement: &SecurityRequirement) -> Result<bool> {
        let mut declared = Vec::with_capacity(requirement.len());
        for name in requirement.keys() {
            match self.schemes.get(name) {
                Some(scheme) => {
                    ensure_executable(scheme)?;
                    declared.push((name, scheme));
                }
                None => {
                    debug!("Security scheme {} is not declared in the spec", name);
                    return Ok(false);
                }
            }
        }

        Ok(declared
            .into_iter()
            .all(|(name, scheme)| self.has_credential(name, scheme)))
    }

    fn has_credential(&self, name: &str, scheme: &SecurityScheme) -> bool {
        match scheme {
            SecurityScheme::OAuth2 { .. } => self.config.access_token.is_some(),
            SecurityScheme::HttpBasic => self.config.has_basic_auth(),
            SecurityScheme::HttpBearer => self.config.bearer_token.is_some(),
            SecurityScheme::ApiKey { .. } => self.config.api_key_for(name).is_some(),
            _ => false,
        }
    }

    async fn apply(
        &self,
        name: &str,
        scheme: &SecurityScheme,
        scopes: &[String],
        contribution: &mut SecurityContribution,
    ) -> Result<()> {
        match scheme {
            SecurityScheme::OAuth2 { .. } => {
                let token = resolve(self.config.access_token.as_ref(), name, scopes).await?;
                contribution
                    .headers
                    .insert("Authorization".to_string(), format!("Bearer {}", token));
            }
            SecurityScheme::HttpBasic => {
                let username = self.config.username.as_deref().unwrap_or_default();
                let password = self.config.password.as_deref().unwrap_or_default();
                let encoded = STANDARD.encode(format!("{}:{}", username, password));
                contribution
                    .headers
                    .insert("Authorization".to_string(), format!("Basic {}", encoded));
            }
            SecurityScheme::HttpBearer => {
                let token = resolve(self.config.bearer_token.as_ref(), name, &[]).await?;
                contribution
                    .headers
                    .insert("Authorization".to_string(), format!("Bearer {}", token));
            }
            SecurityScheme::ApiKey {
                name: key_name,
                location,
            } => {
                let key = resolve(self.config.api_key_for(name), name, &[]).await?;
                match location {
                    ApiKeyLocation::Header => {
                        contribution.headers.insert(key_name.clone(), key);
                    }
                    ApiKeyLocation::Query => {
                        contribution.query.insert(key_name.clone(), Value::String(key));
                    }
                    ApiKeyLocation::Other(other) => {
                        return Err(OpenApiError::UnsupportedSecurityLocation(other.clone()));
                    }
                }
            }
            other => return Err(OpenApiError::UnsupportedSchemeType(other.type_name().to_string())),
        }
        Ok(())
    }
}

/// Fail fast on scheme kinds the executor cannot apply.
fn ensure_executable(scheme: &SecurityScheme) -> Result<()> {
    match scheme {
        SecurityScheme::ApiKey {
            location: ApiKeyLocation::Other(location),
            ..
        } => Err(OpenApiError::UnsupportedSecurityLocation(location.clone())),
        SecurityScheme::ApiKey { .. }
        | SecurityScheme::HttpBasic
        | SecurityScheme::HttpBearer
        | SecurityScheme::OAuth2 { .. } => Ok(()),
        other => Err(OpenApiError::UnsupportedSchemeType(other.type_name().to_string())),
    }
}

async fn resolve(secret: Option<&Secret>, scheme: &str, scopes: &[String]) -> Result<String> {
    let secret = secret.ok_or(OpenApiError::UnsatisfiedSecurity)?;
    secret
        .resolve(scheme, scopes)
        .await
        .map_err(|source| OpenApiError::CredentialResolution {
            scheme: scheme.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schemes(value: Value) -> IndexMap<String, SecurityScheme> {
        serde_json::from_value(value).unwrap()
    }

    fn requirements(value: Value) -> Vec<SecurityRequirement> {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn test_oauth2_bearer_from_access_token() {
        let schemes = schemes(json!({ "oAuth": { "type": "oauth2" } }));
        let config = ExecutorConfig::new().with_access_token("12345");

        let contribution = SecurityNegotiator::new(&schemes, &config)
            .negotiate(&requirements(json!([{ "oAuth": ["scope.a"] }])))
            .await
            .unwrap();
        assert_eq!(
            contribution.headers.get("Authorization").map(String::as_str),
            Some("Bearer 12345")
        );
    }

    #[tokio::test]
    async fn test_oauth2_resolver_receives_scopes() {
        let schemes = schemes(json!({ "oAuth": { "type": "oauth2" } }));
        let config = ExecutorConfig::new().with_access_token(Secret::from_fn(|name, scopes| {
            Ok(format!("{}-{}", name, scopes.join("+")))
        }));

        let contribution = SecurityNegotiator::new(&schemes, &config)
            .negotiate(&requirements(json!([{ "oAuth": ["a", "b"] }])))
            .await
            .unwrap();
        assert_eq!(contribution.headers["Authorization"], "Bearer oAuth-a+b");
    }

    #[tokio::test]
    async fn test_basic_and_bearer() {
        let schemes = schemes(json!({
            "basic": { "type": "http", "scheme": "basic" },
            "bearer": { "type": "http", "scheme": "bearer" }
        }));

        let config = ExecutorConfig::new().with_basic_auth("user", "pass");
        let contribution = SecurityNegotiator::new(&schemes, &config)
            .negotiate(&requirements(json!([{ "basic": [] }])))
            .await
            .unwrap();
        assert_eq!(contribution.headers["Authorization"], "Basic dXNlcjpwYXNz");

        let config = ExecutorConfig::new().with_bearer_token("tok");
        let contribution = SecurityNegotiator::new(&schemes, &config)
            .negotiate(&requirements(json!([{ "bearer": [] }])))
            .await
            .unwrap();
        assert_eq!(contribution.headers["Authorization"], "Bearer tok");
    }

    #[tokio::test]
    async fn test_api_key_in_query_and_header() {
        let schemes = schemes(json!({
            "queryKey": { "type": "apiKey", "in": "query", "name": "apikey" },
            "headerKey": { "type": "apiKey", "in": "header", "name": "X-API-Key" }
        }));
        let config = ExecutorConfig::new()
            .with_api_key("12345")
            .with_credential("headerKey", "named");

        let contribution = SecurityNegotiator::new(&schemes, &config)
            .negotiate(&requirements(json!([{ "queryKey": [], "headerKey": [] }])))
            .await
            .unwrap();
        assert_eq!(contribution.query.get("apikey"), Some(&json!("12345")));
        assert_eq!(contribution.headers["X-API-Key"], "named");
    }

    #[tokio::test]
    async fn test_api_key_resolver_receives_scheme_name() {
        struct Vault;

        #[async_trait::async_trait]
        impl crate::secret::SecretResolver for Vault {
            async fn resolve(&self, name: &str, scopes: &[String]) -> anyhow::Result<String> {
                assert!(scopes.is_empty());
                Ok(format!("key-for-{}", name))
            }
        }

        let schemes = schemes(json!({
            "partnerKey": { "type": "apiKey", "in": "header", "name": "X-API-Key" }
        }));
        let config = ExecutorConfig::new().with_api_key(Secret::from_resolver(std::sync::Arc::new(Vault)));

        let contribution = SecurityNegotiator::new(&schemes, &config)
            .negotiate(&requirements(json!([{ "partnerKey": [] }])))
            .await
            .unwrap();
        assert_eq!(contribution.headers["X-API-Key"], "key-for-partnerKey");
    }

    #[tokio::test]
    async fn test_cookie_api_key_fails_regardless_of_credentials() {
        let schemes = schemes(json!({
            "cookieKey": { "type": "apiKey", "in": "cookie", "name": "session" }
        }));

        for config in [ExecutorConfig::new(), ExecutorConfig::new().with_api_key("12345")] {
            let err = SecurityNegotiator::new(&schemes, &config)
                .negotiate(&requirements(json!([{ "cookieKey": [] }])))
                .await
                .unwrap_err();
            assert_eq!(err.to_string(), "apiKey security scheme in cookie is not supported.");
        }
    }

    #[tokio::test]
    async fn test_first_fully_satisfiable_alternative_wins() {
        let schemes = schemes(json!({
            "oAuth": { "type": "oauth2" },
            "basic": { "type": "http", "scheme": "basic" },
            "key": { "type": "apiKey", "in": "header", "name": "X-Key" }
        }));
        let config = ExecutorConfig::new().with_access_token("tok").with_api_key("k");

        let contribution = SecurityNegotiator::new(&schemes, &config)
            .negotiate(&requirements(json!([
                { "oAuth": [], "basic": [] },
                { "undeclared": [] },
                { "key": [] },
                { "oAuth": [] }
            ])))
            .await
            .unwrap();

        assert_eq!(contribution.headers.len(), 1);
        assert_eq!(contribution.headers["X-Key"], "k");
    }

    #[tokio::test]
    async fn test_unsatisfied_and_unsupported() {
        let schemes = schemes(json!({
            "bearer": { "type": "http", "scheme": "bearer" },
            "oidc": { "type": "openIdConnect", "openIdConnectUrl": "https://example.com" }
        }));
        let config = ExecutorConfig::new();

        let err = SecurityNegotiator::new(&schemes, &config)
            .negotiate(&requirements(json!([{ "bearer": [] }])))
            .await
            .unwrap_err();
        assert!(matches!(err, OpenApiError::UnsatisfiedSecurity));

        let err = SecurityNegotiator::new(&schemes, &config)
            .negotiate(&requirements(json!([{ "oidc": [] }])))
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Execution of openIdConnect security schemes is not supported."
        );
    }

    #[tokio::test]
    async fn test_empty_requirement_means_optional_auth() {
        let schemes = schemes(json!({ "bearer": { "type": "http", "scheme": "bearer" } }));
        let config = ExecutorConfig::new();

        let contribution = SecurityNegotiator::new(&schemes, &config)
            .negotiate(&requirements(json!([{ "bearer": [] }, {}])))
            .await
            .unwrap();
        assert_eq!(contribution, SecurityContribution::default());
    }

    #[tokio::test]
    async fn test_resolver_failure_is_wrapped() {
        let schemes = schemes(json!({ "bearer": { "type": "http", "scheme": "bearer" } }));
        let config = ExecutorConfig::new()
            .with_bearer_token(Secret::from_fn(|_, _| Err(anyhow::anyhow!("vault sealed"))));

        let err = SecurityNegotiator::new(&schemes, &config)
            .negotiate(&requirements(json!([{ "bearer": [] }])))
            .await
            .unwrap_err();
        assert!(matches!(err, OpenApiError::CredentialResolution { ref scheme, .. } if scheme == "bearer"));
    }
}

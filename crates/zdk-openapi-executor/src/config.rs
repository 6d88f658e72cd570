//! Credential and request configuration for the executor.
//!
//! An [`ExecutorConfig`] can be assembled in code with the builder methods,
//! or loaded from a TOML file where any value may reference an environment
//! variable as `${VAR_NAME}`:
//!
//! ```toml
//! base_path = "https://api.example.com"
//! api_key = "${PETSTORE_API_KEY}"
//!
//! [credentials]
//! partner_key = "${PARTNER_KEY}"
//!
//! [base_options]
//! timeout_secs = 30
//! response_type = "json"
//!
//! [base_options.headers]
//! X-Client = "zdk"
//! ```

use crate::error::Result;
use crate::secret::Secret;
use crate::types::{RequestOptions, ResponseType};
use indexmap::IndexMap;
use serde::Deserialize;
use std::env;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

/// Credentials and defaults applied to every request an executor builds.
#[derive(Debug, Clone, Default)]
pub struct ExecutorConfig {
    /// Generic apiKey credential, used when no scheme-specific one exists
    pub api_key: Option<Secret>,
    /// Credentials keyed by security scheme name
    pub credentials: IndexMap<String, Secret>,
    /// HTTP basic username
    pub username: Option<String>,
    /// HTTP basic password
    pub password: Option<String>,
    /// HTTP bearer token
    pub bearer_token: Option<Secret>,
    /// OAuth2 access token
    pub access_token: Option<Secret>,
    /// Overrides every base path resolved from the spec
    pub base_path: Option<String>,
    /// Lowest-precedence request options
    pub base_options: RequestOptions,
}

impl ExecutorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_api_key(mut self, key: impl Into<Secret>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the credential for one named security scheme.
    pub fn with_credential(mut self, scheme: impl Into<String>, secret: impl Into<Secret>) -> Self {
        self.credentials.insert(scheme.into(), secret.into());
        self
    }

    pub fn with_basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn with_bearer_token(mut self, token: impl Into<Secret>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    pub fn with_access_token(mut self, token: impl Into<Secret>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = Some(base_path.into());
        self
    }

    pub fn with_base_options(mut self, options: RequestOptions) -> Self {
        self.base_options = options;
        self
    }

    /// Credential for an apiKey scheme: the scheme-specific one if present,
    /// otherwise the generic `api_key`.
    pub fn api_key_for(&self, scheme: &str) -> Option<&Secret> {
        self.credentials.get(scheme).or(self.api_key.as_ref())
    }

    pub(crate) fn has_basic_auth(&self) -> bool {
        self.username.is_some() && self.password.is_some()
    }

    /// Load configuration from a TOML file.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading executor configuration from: {:?}", path);
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(contents)?;
        Ok(file.into_config())
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    api_key: Option<String>,
    #[serde(default)]
    credentials: IndexMap<String, String>,
    username: Option<String>,
    password: Option<String>,
    bearer_token: Option<String>,
    access_token: Option<String>,
    base_path: Option<String>,
    #[serde(default)]
    base_options: BaseOptionsFile,
}

#[derive(Debug, Default, Deserialize)]
struct BaseOptionsFile {
    #[serde(default)]
    headers: IndexMap<String, String>,
    timeout_secs: Option<u64>,
    response_type: Option<ResponseType>,
}

impl ConfigFile {
    fn into_config(self) -> ExecutorConfig {
        let resolve = |value: Option<String>| value.and_then(|v| resolve_env_var(&v));

        let credentials = self
            .credentials
            .into_iter()
            .filter_map(|(scheme, value)| resolve_env_var(&value).map(|v| (scheme, Secret::from(v))))
            .collect();

        let mut base_options = RequestOptions::new();
        for (name, value) in self.base_options.headers {
            if let Some(value) = resolve_env_var(&value) {
                base_options = base_options.with_header(name, value);
            }
        }
        base_options.timeout = self.base_options.timeout_secs.map(Duration::from_secs);
        base_options.response_type = self.base_options.response_type;

        ExecutorConfig {
            api_key: resolve(self.api_key).map(Secret::from),
            credentials,
            username: resolve(self.username),
            password: resolve(self.password),
            bearer_token: resolve(self.bearer_token).map(Secret::from),
            access_token: resolve(self.access_token).map(Secret::from),
            base_path: resolve(self.base_path),
            base_options,
        }
    }
}

/// Resolve a single ${VAR_NAME} reference
fn resolve_env_var(value: &str) -> Option<String> {
    if value.starts_with("${") && value.ends_with('}') {
        let var_name = &value[2..value.len() - 1];
        let resolved = env::var(var_name).ok();
        if resolved.is_none() {
            warn!("Environment variable {} is not set; ignoring value", var_name);
        }
        resolved
    } else {
        Some(value.to_string())
    }
}

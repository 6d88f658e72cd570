//! Resolvable credential values.
//!
//! A credential is either a literal, a synchronous function or an
//! asynchronous function of `(name, scopes)`. All three are wrapped into a
//! [`Secret`] when the configuration is built, so the negotiator only ever
//! awaits one shape.

use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;

/// Something that can produce a credential value on demand.
#[async_trait]
pub trait SecretResolver: Send + Sync {
    /// Produce the credential for the security scheme `name`.
    ///
    /// `name` is always the scheme's key under `components.securitySchemes`
    /// (e.g. `partnerKey`), never the header or query name an apiKey scheme
    /// declares. `scopes` carries the scopes the selected requirement asks
    /// for; it is empty for non-oauth2 schemes.
    async fn resolve(&self, name: &str, scopes: &[String]) -> anyhow::Result<String>;
}

struct Literal(String);

#[async_trait]
impl SecretResolver for Literal {
    async fn resolve(&self, _name: &str, _scopes: &[String]) -> anyhow::Result<String> {
        Ok(self.0.clone())
    }
}

struct SyncFn<F>(F);

#[async_trait]
impl<F> SecretResolver for SyncFn<F>
where
    F: Fn(&str, &[String]) -> anyhow::Result<String> + Send + Sync,
{
    async fn resolve(&self, name: &str, scopes: &[String]) -> anyhow::Result<String> {
        (self.0)(name, scopes)
    }
}

struct AsyncFn<F>(F);

#[async_trait]
impl<F, Fut> SecretResolver for AsyncFn<F>
where
    F: Fn(String, Vec<String>) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<String>> + Send + 'static,
{
    async fn resolve(&self, name: &str, scopes: &[String]) -> anyhow::Result<String> {
        (self.0)(name.to_string(), scopes.to_vec()).await
    }
}

/// A credential value that is resolved when a request is built.
#[derive(Clone)]
pub struct Secret(Arc<dyn SecretResolver>);

impl Secret {
    pub fn literal(value: impl Into<String>) -> Self {
        Self(Arc::new(Literal(value.into())))
    }

    /// Wrap a synchronous function of `(name, scopes)`.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&str, &[String]) -> anyhow::Result<String> + Send + Sync + 'static,
    {
        Self(Arc::new(SyncFn(f)))
    }

    /// Wrap an asynchronous function of `(name, scopes)`, e.g. a token refresher.
    pub fn from_async<F, Fut>(f: F) -> Self
    where
        F: Fn(String, Vec<String>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<String>> + Send + 'static,
    {
        Self(Arc::new(AsyncFn(f)))
    }

    /// Wrap a custom resolver.
    pub fn from_resolver(resolver: Arc<dyn SecretResolver>) -> Self {
        Self(resolver)
    }

    pub async fn resolve(&self, name: &str, scopes: &[String]) -> anyhow::Result<String> {
        self.0.resolve(name, scopes).await
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Secret(<redacted>)")
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Secret::literal(value)
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Secret::literal(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_literal_ignores_arguments() {
        let secret = Secret::from("12345");
        assert_eq!(secret.resolve("oAuth", &["a".to_string()]).await.unwrap(), "12345");
    }

    #[tokio::test]
    async fn test_sync_fn_receives_name_and_scopes() {
        let secret = Secret::from_fn(|name, scopes| Ok(format!("{}:{}", name, scopes.join(","))));
        let scopes = vec!["read".to_string(), "write".to_string()];
        assert_eq!(secret.resolve("oAuth", &scopes).await.unwrap(), "oAuth:read,write");
    }

    #[tokio::test]
    async fn test_async_fn_and_errors() {
        let secret = Secret::from_async(|name, _scopes| async move {
            if name == "broken" {
                anyhow::bail!("refresh failed");
            }
            Ok("fresh-token".to_string())
        });

        assert_eq!(secret.resolve("oAuth", &[]).await.unwrap(), "fresh-token");
        assert!(secret.resolve("broken", &[]).await.is_err());
    }

    #[test]
    fn test_debug_is_redacted() {
        let secret = Secret::from("hunter2");
        assert!(!format!("{:?}", secret).contains("hunter2"));
    }
}

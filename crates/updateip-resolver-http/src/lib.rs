// # HTTP Resolver
//
// This crate provides the address-reporting resolver for updateip.
//
// ## Behavior
//
// One plain GET per `resolve()` call, no parameters and no auth. The body is
// free-form text; the first IPv4-shaped substring in it is the answer. The
// status code is not inspected: an error page without an address yields
// `NoAddressFound` and carries the body for diagnostics.
//
// Works with services such as ipecho.net/plain, api.ipify.org, ifconfig.me/ip
// and icanhazip.com.

use updateip_core::config::ResolverConfig;
use updateip_core::traits::{IpResolver, ResolverFactory};
use updateip_core::{Error, IpAddress, Registry, Result, extract_ipv4};

use std::time::Duration;

/// Default per-request timeout
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Resolver backed by an HTTP address-reporting service
pub struct HttpIpResolver {
    /// URL to fetch the address from
    url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpIpResolver {
    /// Create a resolver with the default timeout
    ///
    /// # Parameters
    ///
    /// - `url`: URL to fetch the address from (e.g., "http://ipecho.net/plain")
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_timeout(url, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a resolver with a custom per-request timeout
    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
        }
    }
}

#[async_trait::async_trait]
impl IpResolver for HttpIpResolver {
    async fn resolve(&self) -> Result<IpAddress> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::unreachable(&self.url, e))?;

        let body = response
            .text()
            .await
            .map_err(|e| Error::body_read(&self.url, e))?;

        match extract_ipv4(&body) {
            Some(ip) => {
                tracing::debug!("Resolved {} from {}", ip, self.url);
                Ok(ip)
            }
            None => Err(Error::no_address(&self.url, body)),
        }
    }

    fn endpoint(&self) -> &str {
        &self.url
    }
}

/// Factory for creating HTTP resolvers
pub struct HttpResolverFactory;

impl ResolverFactory for HttpResolverFactory {
    fn create(&self, config: &ResolverConfig) -> Result<Box<dyn IpResolver>> {
        match config {
            ResolverConfig::Http { url, timeout_secs } => {
                config.validate()?;
                Ok(Box::new(HttpIpResolver::with_timeout(
                    url.clone(),
                    Duration::from_secs(*timeout_secs),
                )))
            }
            _ => Err(Error::config("Invalid config for HTTP resolver")),
        }
    }
}

/// Register the HTTP resolver with a registry
pub fn register(registry: &Registry) {
    registry.register_resolver("http", Box::new(HttpResolverFactory));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_creation() {
        let factory = HttpResolverFactory;

        let config = ResolverConfig::http("http://ipecho.net/plain");
        let resolver = factory.create(&config).unwrap();
        assert_eq!(resolver.endpoint(), "http://ipecho.net/plain");
    }

    #[test]
    fn test_factory_rejects_invalid_config() {
        let factory = HttpResolverFactory;

        assert!(factory.create(&ResolverConfig::http("")).is_err());

        let config = ResolverConfig::Custom {
            factory: "stun".to_string(),
            config: serde_json::json!({ "server": "stun.l.google.com:19302" }),
        };
        assert!(factory.create(&config).is_err());
    }

    #[test]
    fn test_register() {
        let registry = Registry::new();
        register(&registry);
        assert!(registry.has_resolver("http"));
        assert!(registry.create_resolver(&ResolverConfig::default()).is_ok());
    }
}

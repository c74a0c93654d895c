// # Dyndns HTTP Update Sink
//
// This crate provides the dyndns-style update consumer for updateip.
//
// ## Protocol
//
// One request per changed address: the ip field and the hostname field, sent
// as a form-encoded POST body (default) or GET query parameters, with HTTP
// Basic auth. The field names are configurable so the same sink works with
// any provider speaking the dyndns2 shape.
//
// Success means a 2xx status AND a body containing `good` or `nochg`. Anything
// else is an error and leaves the remembered address untouched, so the next
// poll cycle tries again.
//
// ## Security
//
// - The password NEVER appears in logs or `Debug` output
// - Credentials come from configuration only

use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;
use updateip_core::config::{HttpUpdateConfig, SinkConfig, UpdateMethod};
use updateip_core::traits::{IpConsumer, SinkFactory, UpdateOutcome};
use updateip_core::{Error, IpAddress, Registry, Result};

/// Bodies that mean the provider accepted the update
static SUCCESS_VOCABULARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"good|nochg").expect("success pattern compiles"));

/// Default HTTP timeout for update requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Consumer that pushes address changes to a dyndns-style endpoint
pub struct DynDnsSink {
    /// Name used in logs
    name: String,

    /// Provider update URL
    url: String,

    /// Field carrying the new address
    ip_field: String,

    /// Field carrying the hostname
    hostname_field: String,

    /// Hostname whose record is updated
    hostname: String,

    /// Basic auth username
    username: String,

    /// Basic auth password
    /// ⚠️ NEVER log this value
    password: String,

    /// Field encoding
    method: UpdateMethod,

    /// HTTP client for update requests
    client: reqwest::Client,

    /// Last address the provider confirmed
    last_applied: Option<IpAddress>,
}

// Custom Debug implementation that hides the password
impl std::fmt::Debug for DynDnsSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynDnsSink")
            .field("name", &self.name)
            .field("url", &self.url)
            .field("ip_field", &self.ip_field)
            .field("hostname_field", &self.hostname_field)
            .field("hostname", &self.hostname)
            .field("username", &self.username)
            .field("password", &"<REDACTED>")
            .field("method", &self.method)
            .field("last_applied", &self.last_applied)
            .finish()
    }
}

impl DynDnsSink {
    /// Create a sink with default field names, POST and the default timeout
    ///
    /// # Parameters
    ///
    /// - `url`: Provider update URL (e.g., "https://members.dyndns.org/nic/update")
    /// - `hostname`: Hostname whose record is updated
    /// - `username`, `password`: Basic auth credentials
    pub fn new(
        url: impl Into<String>,
        hostname: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        let config = HttpUpdateConfig::new(url, hostname, username, password);
        Self::build(config, DEFAULT_HTTP_TIMEOUT)
    }

    /// Create a sink from validated configuration
    pub fn from_config(config: &HttpUpdateConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(
            config.clone(),
            Duration::from_secs(config.timeout_secs),
        ))
    }

    fn build(config: HttpUpdateConfig, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        Self {
            name: config.name,
            url: config.url,
            ip_field: config.ip_field,
            hostname_field: config.hostname_field,
            hostname: config.hostname,
            username: config.username,
            password: config.password,
            method: config.method,
            client,
            last_applied: None,
        }
    }

    /// Last address the provider confirmed, if any
    pub fn last_applied(&self) -> Option<&IpAddress> {
        self.last_applied.as_ref()
    }

    /// Push `ip` to the provider unless it was the last one applied
    ///
    /// # Returns
    ///
    /// - `Ok(UpdateOutcome::Skipped)`: `ip` is already applied, no request made
    /// - `Ok(UpdateOutcome::Applied)`: Provider confirmed the update
    /// - `Err(Error)`: Request failed or was rejected; state is unchanged
    pub async fn apply_update(&mut self, ip: &IpAddress) -> Result<UpdateOutcome> {
        if self.last_applied.as_ref() == Some(ip) {
            tracing::debug!("{}: {} already applied, skipping", self.name, ip);
            return Ok(UpdateOutcome::Skipped);
        }

        let request = self.build_request(ip)?;

        let response = self
            .client
            .execute(request)
            .await
            .map_err(Error::transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatusNotOk {
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::body_read(&self.url, e))?;

        if !SUCCESS_VOCABULARY.is_match(&body) {
            return Err(Error::rejected(body.trim()));
        }

        tracing::info!("{}: {} -> {} ({})", self.name, self.hostname, ip, body.trim());
        self.last_applied = Some(ip.clone());
        Ok(UpdateOutcome::Applied)
    }

    fn build_request(&self, ip: &IpAddress) -> Result<reqwest::Request> {
        let fields = [
            (self.ip_field.as_str(), ip.as_str()),
            (self.hostname_field.as_str(), self.hostname.as_str()),
        ];

        let builder = match self.method {
            UpdateMethod::Get => self.client.get(&self.url).query(&fields),
            UpdateMethod::Post => self.client.post(&self.url).form(&fields),
        };

        builder
            .basic_auth(&self.username, Some(&self.password))
            .build()
            .map_err(Error::request_construction)
    }
}

#[async_trait]
impl IpConsumer for DynDnsSink {
    async fn on_update(&mut self, ip: &IpAddress) -> Result<UpdateOutcome> {
        self.apply_update(ip).await
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Factory for creating dyndns update sinks
pub struct DynDnsFactory;

impl SinkFactory for DynDnsFactory {
    fn create(&self, config: &SinkConfig) -> Result<Box<dyn IpConsumer>> {
        match config {
            SinkConfig::HttpUpdate(update) => Ok(Box::new(DynDnsSink::from_config(update)?)),
            _ => Err(Error::config("Invalid config for HTTP update sink")),
        }
    }
}

/// Register the dyndns update sink with a registry
///
/// # Example
///
/// ```rust
/// use updateip_core::Registry;
///
/// let registry = Registry::new();
/// updateip_sink_dyndns::register(&registry);
/// assert!(registry.has_sink("http_update"));
/// ```
pub fn register(registry: &Registry) {
    registry.register_sink("http_update", Box::new(DynDnsFactory));
}

//! Configuration types for updateip
//!
//! All configuration is provided at startup and treated as immutable for the
//! lifetime of the process.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Default address-reporting endpoint
pub const DEFAULT_RESOLVER_URL: &str = "http://ipecho.net/plain";

/// Main updateip configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateIpConfig {
    /// Where the public address comes from
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Downstream consumers, in registration order
    pub sinks: Vec<SinkConfig>,

    /// Poll loop settings
    #[serde(default)]
    pub poller: PollerConfig,
}

impl UpdateIpConfig {
    /// Create a configuration with default resolver and poller and no sinks
    pub fn new() -> Self {
        Self {
            resolver: ResolverConfig::default(),
            sinks: Vec::new(),
            poller: PollerConfig::default(),
        }
    }

    /// Parse a JSON document
    pub fn from_json_str(json: &str) -> Result<Self, crate::Error> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a JSON configuration file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, crate::Error> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.sinks.is_empty() {
            return Err(crate::Error::config("No sinks configured"));
        }

        self.resolver.validate()?;
        self.poller.validate()?;
        for sink in &self.sinks {
            sink.validate()?;
        }

        Ok(())
    }
}

impl Default for UpdateIpConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResolverConfig {
    /// Plain HTTP GET against an address-reporting service
    Http {
        /// URL to fetch the address from
        #[serde(default = "default_resolver_url")]
        url: String,
        /// Per-request timeout in seconds
        #[serde(default = "default_resolver_timeout_secs")]
        timeout_secs: u64,
    },

    /// Custom resolver
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl ResolverConfig {
    /// HTTP resolver for `url` with the default timeout
    pub fn http(url: impl Into<String>) -> Self {
        ResolverConfig::Http {
            url: url.into(),
            timeout_secs: default_resolver_timeout_secs(),
        }
    }

    /// Validate the resolver configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            ResolverConfig::Http { url, timeout_secs } => {
                validate_http_url("Resolver", url)?;
                if *timeout_secs == 0 {
                    return Err(crate::Error::config("Resolver timeout must be > 0"));
                }
                Ok(())
            }
            ResolverConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config("Custom resolver factory cannot be empty"));
                }
                if config.is_null() {
                    return Err(crate::Error::config("Custom resolver config cannot be null"));
                }
                Ok(())
            }
        }
    }

    /// Registry key for this resolver
    pub fn type_name(&self) -> &str {
        match self {
            ResolverConfig::Http { .. } => "http",
            ResolverConfig::Custom { factory, .. } => factory,
        }
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        ResolverConfig::http(DEFAULT_RESOLVER_URL)
    }
}

/// Consumer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SinkConfig {
    /// Write a line per new address to a standard stream
    Write {
        /// Name used in logs and output lines
        #[serde(default = "default_write_name")]
        name: String,
        /// Output stream
        #[serde(default)]
        target: WriteTarget,
    },

    /// Dyndns-style HTTP update endpoint
    HttpUpdate(HttpUpdateConfig),

    /// Custom consumer
    Custom {
        /// Factory name to use
        factory: String,
        /// Name used in logs
        name: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl SinkConfig {
    /// Validate the sink configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            SinkConfig::Write { name, .. } => {
                if name.is_empty() {
                    return Err(crate::Error::config("Write sink name cannot be empty"));
                }
                Ok(())
            }
            SinkConfig::HttpUpdate(config) => config.validate(),
            SinkConfig::Custom { factory, config, .. } => {
                if factory.is_empty() {
                    return Err(crate::Error::config("Custom sink factory cannot be empty"));
                }
                if config.is_null() {
                    return Err(crate::Error::config("Custom sink config cannot be null"));
                }
                Ok(())
            }
        }
    }

    /// Registry key for this sink
    pub fn type_name(&self) -> &str {
        match self {
            SinkConfig::Write { .. } => "write",
            SinkConfig::HttpUpdate(_) => "http_update",
            SinkConfig::Custom { factory, .. } => factory,
        }
    }

    /// Name used in logs
    pub fn name(&self) -> &str {
        match self {
            SinkConfig::Write { name, .. } => name,
            SinkConfig::HttpUpdate(config) => &config.name,
            SinkConfig::Custom { name, .. } => name,
        }
    }
}

/// Output stream for a write sink
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteTarget {
    #[default]
    Stdout,
    Stderr,
}

/// How the ip and hostname fields travel to the provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateMethod {
    /// GET with the fields in the query string
    Get,
    /// POST with a form-encoded body
    #[default]
    Post,
}

/// Dyndns-style update endpoint configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct HttpUpdateConfig {
    /// Name used in logs
    #[serde(default = "default_http_update_name")]
    pub name: String,

    /// Provider update URL
    pub url: String,

    /// Field carrying the new address
    #[serde(default = "default_ip_field")]
    pub ip_field: String,

    /// Field carrying the hostname
    #[serde(default = "default_hostname_field")]
    pub hostname_field: String,

    /// Hostname whose record is updated
    pub hostname: String,

    /// Basic auth username
    pub username: String,

    /// Basic auth password
    /// ⚠️ NEVER log this value
    pub password: String,

    /// Field encoding
    #[serde(default)]
    pub method: UpdateMethod,

    /// Per-request timeout in seconds
    #[serde(default = "default_update_timeout_secs")]
    pub timeout_secs: u64,
}

impl HttpUpdateConfig {
    /// Create a configuration with default field names, POST and default timeout
    pub fn new(
        url: impl Into<String>,
        hostname: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name: default_http_update_name(),
            url: url.into(),
            ip_field: default_ip_field(),
            hostname_field: default_hostname_field(),
            hostname: hostname.into(),
            username: username.into(),
            password: password.into(),
            method: UpdateMethod::default(),
            timeout_secs: default_update_timeout_secs(),
        }
    }

    /// Set the name used in logs
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the field names
    pub fn with_fields(mut self, ip_field: impl Into<String>, hostname_field: impl Into<String>) -> Self {
        self.ip_field = ip_field.into();
        self.hostname_field = hostname_field.into();
        self
    }

    /// Set the field encoding
    pub fn with_method(mut self, method: UpdateMethod) -> Self {
        self.method = method;
        self
    }

    /// Validate the update endpoint configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        validate_http_url("Update", &self.url)?;
        if self.ip_field.is_empty() || self.hostname_field.is_empty() {
            return Err(crate::Error::config("Update field names cannot be empty"));
        }
        if self.ip_field == self.hostname_field {
            return Err(crate::Error::config(
                "Update ip field and hostname field must differ",
            ));
        }
        if self.hostname.is_empty() {
            return Err(crate::Error::config("Update hostname cannot be empty"));
        }
        if self.username.is_empty() {
            return Err(crate::Error::config("Update username cannot be empty"));
        }
        if self.timeout_secs == 0 {
            return Err(crate::Error::config("Update timeout must be > 0"));
        }
        Ok(())
    }
}

// Custom Debug implementation that hides the password
impl fmt::Debug for HttpUpdateConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpUpdateConfig")
            .field("name", &self.name)
            .field("url", &self.url)
            .field("ip_field", &self.ip_field)
            .field("hostname_field", &self.hostname_field)
            .field("hostname", &self.hostname)
            .field("username", &self.username)
            .field("password", &"<REDACTED>")
            .field("method", &self.method)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Poll loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollerConfig {
    /// Fixed delay between cycles (in seconds)
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Capacity of each consumer inbox
    ///
    /// The notifier waits while an inbox is full, so a slow consumer slows
    /// the poll loop instead of queueing stale addresses.
    #[serde(default = "default_inbox_capacity")]
    pub inbox_capacity: usize,

    /// Capacity of the monitoring event channel
    ///
    /// When full, new events are dropped (with a warning log).
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl PollerConfig {
    /// Validate the poller configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.interval_secs == 0 {
            return Err(crate::Error::config("Poll interval must be > 0"));
        }
        if self.inbox_capacity == 0 {
            return Err(crate::Error::config("Inbox capacity must be > 0"));
        }
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }
        Ok(())
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            inbox_capacity: default_inbox_capacity(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn validate_http_url(what: &str, url: &str) -> Result<(), crate::Error> {
    if url.is_empty() {
        return Err(crate::Error::config(format!("{what} URL cannot be empty")));
    }
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(crate::Error::config(format!(
            "{what} URL must use HTTP or HTTPS scheme. Got: {url}"
        )));
    }
    Ok(())
}

fn default_resolver_url() -> String {
    DEFAULT_RESOLVER_URL.to_string()
}

fn default_resolver_timeout_secs() -> u64 {
    10
}

fn default_write_name() -> String {
    "writer".to_string()
}

fn default_http_update_name() -> String {
    "http_update".to_string()
}

fn default_ip_field() -> String {
    "myip".to_string()
}

fn default_hostname_field() -> String {
    "hostname".to_string()
}

fn default_update_timeout_secs() -> u64 {
    30
}

fn default_interval_secs() -> u64 {
    10
}

fn default_inbox_capacity() -> usize {
    1
}

fn default_event_channel_capacity() -> usize {
    100
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tokio_test::{assert_err, assert_ok};

    fn loopia() -> HttpUpdateConfig {
        HttpUpdateConfig::new(
            "https://dns.loopia.se/XDynDNSServer/XDynDNS.php",
            "mydomain.com",
            "username",
            "password",
        )
    }

    #[test]
    fn test_defaults() {
        let config = UpdateIpConfig::new();
        assert_eq!(config.poller.interval_secs, 10);
        assert_eq!(config.poller.inbox_capacity, 1);
        assert_eq!(config.resolver.type_name(), "http");

        let update = loopia();
        assert_eq!(update.ip_field, "myip");
        assert_eq!(update.hostname_field, "hostname");
        assert_eq!(update.method, UpdateMethod::Post);
    }

    #[test]
    fn test_validate_requires_sinks() {
        let config = UpdateIpConfig::new();
        assert_err!(config.validate());

        let mut config = UpdateIpConfig::new();
        config.sinks.push(SinkConfig::HttpUpdate(loopia()));
        assert_ok!(config.validate());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert_err!(ResolverConfig::http("ipecho.net/plain").validate());
        assert_err!(loopia().with_fields("host", "host").validate());

        let mut update = loopia();
        update.hostname.clear();
        assert_err!(update.validate());

        let poller = PollerConfig {
            interval_secs: 0,
            ..PollerConfig::default()
        };
        assert_err!(poller.validate());
    }

    #[test]
    fn test_parse_json_with_defaults() {
        let json = r#"{
            "sinks": [
                { "type": "write", "target": "stderr" },
                {
                    "type": "http_update",
                    "name": "loopia",
                    "url": "https://dns.loopia.se/XDynDNSServer/XDynDNS.php",
                    "hostname": "mydomain.com",
                    "username": "username",
                    "password": "password",
                    "method": "get"
                }
            ],
            "poller": { "interval_secs": 30 }
        }"#;

        let config = UpdateIpConfig::from_json_str(json).unwrap();
        assert_eq!(config.sinks.len(), 2);
        assert_eq!(config.poller.interval_secs, 30);
        assert_eq!(config.poller.inbox_capacity, 1);

        match &config.sinks[0] {
            SinkConfig::Write { name, target } => {
                assert_eq!(name, "writer");
                assert_eq!(*target, WriteTarget::Stderr);
            }
            other => panic!("unexpected sink: {other:?}"),
        }
        match &config.sinks[1] {
            SinkConfig::HttpUpdate(update) => {
                assert_eq!(update.name, "loopia");
                assert_eq!(update.method, UpdateMethod::Get);
                assert_eq!(update.ip_field, "myip");
                assert_eq!(update.timeout_secs, 30);
            }
            other => panic!("unexpected sink: {other:?}"),
        }
        match &config.resolver {
            ResolverConfig::Http { url, .. } => assert_eq!(url, DEFAULT_RESOLVER_URL),
            other => panic!("unexpected resolver: {other:?}"),
        }
    }

    #[test]
    fn test_parse_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "resolver": {{ "type": "http", "url": "https://api.ipify.org" }},
                 "sinks": [ {{ "type": "write" }} ] }}"#
        )
        .unwrap();

        let config = UpdateIpConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.sinks[0].type_name(), "write");
        match config.resolver {
            ResolverConfig::Http { url, timeout_secs } => {
                assert_eq!(url, "https://api.ipify.org");
                assert_eq!(timeout_secs, 10);
            }
            other => panic!("unexpected resolver: {other:?}"),
        }
    }

    #[test]
    fn test_invalid_json_is_reported() {
        let err = UpdateIpConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, crate::Error::Json(_)));

        let err = UpdateIpConfig::from_json_file("/nonexistent/updateip.json").unwrap_err();
        assert!(matches!(err, crate::Error::Io(_)));
    }

    #[test]
    fn test_password_not_exposed_in_debug() {
        let mut update = loopia();
        update.password = "secret_password_12345".to_string();

        let debug_str = format!("{:?}", update);
        assert!(!debug_str.contains("secret_password_12345"));
        assert!(debug_str.contains("HttpUpdateConfig"));
    }
}

//! Plugin-based registry for resolvers and consumers
//!
//! Resolver and sink kinds are registered by name at startup and looked up
//! from configuration, avoiding hardcoded if-else chains in the daemon.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use updateip_core::Registry;
//! use updateip_core::config::SinkConfig;
//!
//! let registry = Registry::with_builtins();
//! updateip_resolver_http::register(&registry);
//! updateip_sink_dyndns::register(&registry);
//!
//! let sink = registry.create_sink(&sink_config)?;
//! ```
//!
//! ## Registration
//!
//! Implementation crates expose a `register()` function:
//!
//! ```rust,ignore
//! pub fn register(registry: &Registry) {
//!     registry.register_sink("http_update", Box::new(DynDnsFactory));
//! }
//! ```

use crate::config::{ResolverConfig, SinkConfig};
use crate::consumer::writer::WriteSinkFactory;
use crate::error::{Error, Result};
use crate::traits::{IpConsumer, IpResolver, ResolverFactory, SinkFactory};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Registry of resolver and sink factories
///
/// ## Thread Safety
///
/// Interior mutability with RwLock allows concurrent reads and exclusive
/// writes. Factories never panic while the lock is held, so a poisoned lock
/// still holds a consistent map and is used as is.
#[derive(Default)]
pub struct Registry {
    /// Registered resolver factories
    resolvers: RwLock<HashMap<String, Box<dyn ResolverFactory>>>,

    /// Registered sink factories
    sinks: RwLock<HashMap<String, Box<dyn SinkFactory>>>,
}

impl Registry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the sinks built into this crate (`write`)
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        registry.register_sink("write", Box::new(WriteSinkFactory));
        registry
    }

    /// Register a resolver factory
    ///
    /// # Parameters
    ///
    /// - `name`: Resolver type name (e.g., "http")
    /// - `factory`: Factory object for creating resolver instances
    pub fn register_resolver(&self, name: impl Into<String>, factory: Box<dyn ResolverFactory>) {
        let mut resolvers = self.resolvers.write().unwrap_or_else(PoisonError::into_inner);
        resolvers.insert(name.into(), factory);
    }

    /// Register a sink factory
    ///
    /// # Parameters
    ///
    /// - `name`: Sink type name (e.g., "write", "http_update")
    /// - `factory`: Factory object for creating consumer instances
    pub fn register_sink(&self, name: impl Into<String>, factory: Box<dyn SinkFactory>) {
        let mut sinks = self.sinks.write().unwrap_or_else(PoisonError::into_inner);
        sinks.insert(name.into(), factory);
    }

    /// Create a resolver from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn IpResolver>)`: Created resolver instance
    /// - `Err(Error)`: If the type is not registered or creation fails
    pub fn create_resolver(&self, config: &ResolverConfig) -> Result<Box<dyn IpResolver>> {
        let resolver_type = config.type_name();
        let resolvers = self.resolvers.read().unwrap_or_else(PoisonError::into_inner);

        let factory = resolvers
            .get(resolver_type)
            .ok_or_else(|| Error::config(format!("Unknown resolver type: {}", resolver_type)))?;

        factory.create(config)
    }

    /// Create a consumer from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn IpConsumer>)`: Created consumer instance
    /// - `Err(Error)`: If the type is not registered or creation fails
    pub fn create_sink(&self, config: &SinkConfig) -> Result<Box<dyn IpConsumer>> {
        let sink_type = config.type_name();
        let sinks = self.sinks.read().unwrap_or_else(PoisonError::into_inner);

        let factory = sinks
            .get(sink_type)
            .ok_or_else(|| Error::config(format!("Unknown sink type: {}", sink_type)))?;

        factory.create(config)
    }

    /// List all registered resolver types
    pub fn list_resolvers(&self) -> Vec<String> {
        let resolvers = self.resolvers.read().unwrap_or_else(PoisonError::into_inner);
        resolvers.keys().cloned().collect()
    }

    /// List all registered sink types
    pub fn list_sinks(&self) -> Vec<String> {
        let sinks = self.sinks.read().unwrap_or_else(PoisonError::into_inner);
        sinks.keys().cloned().collect()
    }

    /// Check if a resolver type is registered
    pub fn has_resolver(&self, name: &str) -> bool {
        let resolvers = self.resolvers.read().unwrap_or_else(PoisonError::into_inner);
        resolvers.contains_key(name)
    }

    /// Check if a sink type is registered
    pub fn has_sink(&self, name: &str) -> bool {
        let sinks = self.sinks.read().unwrap_or_else(PoisonError::into_inner);
        sinks.contains_key(name)
    }
}

//! Core traits for updateip
//!
//! - [`IpResolver`]: Determine the current public address
//! - [`IpConsumer`]: Accept address updates and act on changes

pub mod ip_resolver;
pub mod consumer;

pub use ip_resolver::{IpResolver, ResolverFactory};
pub use consumer::{IpConsumer, SinkFactory, UpdateOutcome};

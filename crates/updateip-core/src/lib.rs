// # updateip-core
//
// Core library for the updateip public IP watcher.
//
// ## Architecture Overview
//
// - **IpResolver**: Trait for looking up the current public address
// - **IpConsumer**: Trait for downstream recipients of address updates
// - **Notifier**: Fans each resolved address out to every consumer's inbox
// - **Poller**: Resolves on a fixed interval and feeds the notifier
// - **Registry**: Plugin-based registry for resolvers and sinks
//
// ## Design Principles
//
// 1. **One owner per state**: each consumer's last applied address lives in
//    its own worker task, never shared
// 2. **Suppression at the edge**: the notifier always forwards; consumers
//    decide whether an update is redundant
// 3. **Next cycle is the retry**: no component retries or sleeps on its own
// 4. **Cancellable**: every loop stops on the shared shutdown signal

pub mod traits;
pub mod ip;
pub mod consumer;
pub mod notifier;
pub mod poller;
pub mod registry;
pub mod shutdown;
pub mod config;
pub mod error;

// Re-export core types for convenience
pub use traits::{IpConsumer, IpResolver, UpdateOutcome};
pub use ip::{IpAddress, extract_ipv4};
pub use consumer::{WriteSink, run_consumer};
pub use notifier::Notifier;
pub use poller::{PollEvent, Poller};
pub use registry::Registry;
pub use shutdown::{Shutdown, ShutdownTrigger};
pub use config::{HttpUpdateConfig, PollerConfig, ResolverConfig, SinkConfig, UpdateIpConfig};
pub use error::{Error, Result};

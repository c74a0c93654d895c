// # Consumer Trait
//
// Defines the interface for downstream recipients of address updates.
//
// ## Implementations
//
// - Write sink: [`WriteSink`](crate::WriteSink)
// - Dyndns HTTP update sink: `updateip-sink-dyndns` crate
//
// Consumers are registered with the [`Notifier`](crate::Notifier), which
// moves each one into its own worker task. The worker feeds it updates one at
// a time, in the order they were notified.

use crate::ip::IpAddress;
use async_trait::async_trait;

/// What a consumer did with an update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The downstream action was performed
    Applied,
    /// The address matched the last applied one; nothing was done
    Skipped,
}

/// Trait for consumer implementations
///
/// # Suppression
///
/// Each consumer remembers the last address it applied and returns
/// [`UpdateOutcome::Skipped`] for a repeat of that address. The notifier
/// always forwards; suppression is the consumer's job.
///
/// State is only advanced after a confirmed success, so a failed update is
/// attempted again when the same address arrives on the next cycle.
///
/// # Ownership
///
/// `on_update` takes `&mut self`: the worker task is the only owner, so no
/// locking is needed for the remembered address.
#[async_trait]
pub trait IpConsumer: Send {
    /// Handle one address update
    ///
    /// # Returns
    ///
    /// - `Ok(UpdateOutcome)`: Applied or skipped
    /// - `Err(Error)`: The downstream action failed; state is unchanged
    async fn on_update(&mut self, ip: &IpAddress) -> Result<UpdateOutcome, crate::Error>;

    /// Name used in logs
    fn name(&self) -> &str;
}

/// Helper trait for constructing consumers from configuration
pub trait SinkFactory: Send + Sync {
    /// Create an IpConsumer instance from configuration
    fn create(
        &self,
        config: &crate::config::SinkConfig,
    ) -> Result<Box<dyn IpConsumer>, crate::Error>;
}

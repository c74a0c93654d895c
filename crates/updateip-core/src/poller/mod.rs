//! Poll loop
//!
//! The Poller drives the whole pipeline:
//! - Resolving the public address on a fixed interval via IpResolver
//! - Handing every resolved address to the Notifier
//! - Logging resolver failures and carrying on
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   resolve()   ┌─────────────┐
//! │   Poller    │──────────────▶│ IpResolver  │
//! └─────────────┘               └─────────────┘
//!        │
//!        │ notify(ip)
//!        ▼
//! ┌─────────────┐        ┌─────────────┐
//! │  Notifier   │──────▶ │  Consumers  │
//! └─────────────┘        └─────────────┘
//! ```
//!
//! ## Cycle
//!
//! 1. Resolve the address
//! 2. On success, notify every consumer (the notifier always forwards)
//! 3. On failure, log and do nothing else
//! 4. Sleep for the fixed interval, whatever the outcome
//!
//! There is no backoff and no jitter: the next cycle is the retry.

use crate::config::PollerConfig;
use crate::error::Result;
use crate::ip::IpAddress;
use crate::notifier::Notifier;
use crate::shutdown::Shutdown;
use crate::traits::IpResolver;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Events emitted by the Poller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollEvent {
    /// Poller started
    Started {
        consumers_count: usize,
    },

    /// An address was resolved and handed to the consumers
    AddressResolved {
        ip: IpAddress,
        delivered: usize,
    },

    /// The resolver failed this cycle
    ResolveFailed {
        error: String,
    },

    /// Poller stopped
    Stopped {
        reason: String,
    },
}

/// Poll loop over one resolver and one notifier
///
/// ## Lifecycle
///
/// 1. Register consumers on a [`Notifier`]
/// 2. Create with [`Poller::new()`]
/// 3. Start with [`Poller::run()`] or [`Poller::run_with_shutdown()`]
/// 4. Loop runs until shutdown
pub struct Poller {
    /// Resolver queried each cycle
    resolver: Box<dyn IpResolver>,

    /// Fan-out to consumers
    notifier: Notifier,

    /// Fixed delay between cycles
    interval: Duration,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<PollEvent>,
}

impl Poller {
    /// Create a new poller
    ///
    /// # Returns
    ///
    /// A tuple of (poller, event_receiver) where event_receiver yields poll events
    pub fn new(
        resolver: Box<dyn IpResolver>,
        notifier: Notifier,
        config: &PollerConfig,
    ) -> Result<(Self, mpsc::Receiver<PollEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.event_channel_capacity);

        let poller = Self {
            resolver,
            notifier,
            interval: Duration::from_secs(config.interval_secs),
            event_tx: tx,
        };

        Ok((poller, rx))
    }

    /// Override the delay between cycles
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Run until Ctrl-C
    pub async fn run(&self) -> Result<()> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for Ctrl-C, running until dropped: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Run until `stop` completes, then shut down like [`Poller::run_with_shutdown`]
    pub async fn run_until(&self, stop: impl Future<Output = ()>) -> Result<()> {
        let (trigger, shutdown) = crate::shutdown::channel();

        let run = self.run_with_shutdown(shutdown);
        tokio::pin!(run);

        tokio::select! {
            result = &mut run => result,
            _ = stop => {
                trigger.trigger();
                run.await
            }
        }
    }

    /// Run until `shutdown` fires
    pub async fn run_with_shutdown(&self, mut shutdown: Shutdown) -> Result<()> {
        self.emit_event(PollEvent::Started {
            consumers_count: self.notifier.len(),
        });
        info!(
            "Polling {} every {:?} for {} consumer(s)",
            self.resolver.endpoint(),
            self.interval,
            self.notifier.len()
        );

        loop {
            tokio::select! {
                _ = shutdown.wait() => break,
                _ = self.poll_once() => {}
            }

            tokio::select! {
                _ = shutdown.wait() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        info!("Shutdown signal received, poller stopped");
        self.emit_event(PollEvent::Stopped {
            reason: "Shutdown signal".to_string(),
        });

        Ok(())
    }

    /// Run one cycle: resolve, then fan out on success
    ///
    /// Returns the number of consumers the address reached, or 0 when the
    /// resolver failed.
    pub async fn poll_once(&self) -> usize {
        match self.resolver.resolve().await {
            Ok(ip) => {
                debug!("Resolved {} from {}", ip, self.resolver.endpoint());
                let delivered = self.notifier.notify(&ip).await;
                self.emit_event(PollEvent::AddressResolved { ip, delivered });
                delivered
            }
            Err(e) => {
                warn!("Failed to resolve public address: {}", e);
                self.emit_event(PollEvent::ResolveFailed {
                    error: e.to_string(),
                });
                0
            }
        }
    }

    /// Emit a poll event
    fn emit_event(&self, event: PollEvent) {
        // Never block the loop on a slow observer.
        if let Err(mpsc::error::TrySendError::Full(_)) = self.event_tx.try_send(event) {
            warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_event_equality() {
        let event = PollEvent::AddressResolved {
            ip: IpAddress::new("203.0.113.7"),
            delivered: 2,
        };

        assert_eq!(event.clone(), event);
        assert_ne!(
            event,
            PollEvent::ResolveFailed {
                error: "boom".to_string()
            }
        );
    }
}

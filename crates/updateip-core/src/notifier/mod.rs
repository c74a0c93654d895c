//! Fan-out of resolved addresses to registered consumers
//!
//! ```text
//!                    ┌──────────┐
//!   IpAddress ──────▶│ Notifier │
//!                    └──────────┘
//!                 inbox │   │ inbox
//!                       ▼   ▼
//!              ┌────────────┐ ┌────────────┐
//!              │ worker #1  │ │ worker #2  │  ... one task per consumer
//!              └────────────┘ └────────────┘
//! ```
//!
//! ## Hand-off semantics
//!
//! Inboxes are bounded (capacity 1 by default). When an inbox is full,
//! [`Notifier::notify`] waits until that consumer takes the previous address.
//! Backpressure reaches the poll loop instead of queueing stale addresses.
//! There is no "inbox full" error.

use crate::consumer::run_consumer;
use crate::ip::IpAddress;
use crate::shutdown::Shutdown;
use crate::traits::IpConsumer;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Default inbox capacity
pub const DEFAULT_INBOX_CAPACITY: usize = 1;

/// Sending half bound to one consumer's worker
struct Inbox {
    name: String,
    tx: mpsc::Sender<IpAddress>,
}

/// Forwards every address to every registered consumer, in registration order
pub struct Notifier {
    inboxes: Vec<Inbox>,
    inbox_capacity: usize,
}

impl Notifier {
    /// Create a notifier with the default inbox capacity
    pub fn new() -> Self {
        Self::with_inbox_capacity(DEFAULT_INBOX_CAPACITY)
    }

    /// Create a notifier whose inboxes hold up to `capacity` addresses
    ///
    /// A capacity of 0 is raised to 1.
    pub fn with_inbox_capacity(capacity: usize) -> Self {
        Self {
            inboxes: Vec::new(),
            inbox_capacity: capacity.max(1),
        }
    }

    /// Register a consumer and spawn its worker task
    ///
    /// The worker runs until `shutdown` fires or the notifier is dropped.
    pub fn register(
        &mut self,
        consumer: Box<dyn IpConsumer>,
        shutdown: Shutdown,
    ) -> JoinHandle<()> {
        let (tx, rx) = mpsc::channel(self.inbox_capacity);
        let name = consumer.name().to_string();

        info!("Registering consumer {}", name);
        self.inboxes.push(Inbox { name, tx });

        tokio::spawn(run_consumer(consumer, rx, shutdown))
    }

    /// Hand `ip` to every registered inbox
    ///
    /// Does not wait for consumers to process the address, only for each
    /// inbox to accept it. Inboxes whose worker has stopped are skipped.
    ///
    /// # Returns
    ///
    /// The number of inboxes that accepted the address
    pub async fn notify(&self, ip: &IpAddress) -> usize {
        let mut delivered = 0;

        for inbox in &self.inboxes {
            match inbox.tx.send(ip.clone()).await {
                Ok(()) => {
                    debug!("Handed {} to {}", ip, inbox.name);
                    delivered += 1;
                }
                Err(_) => {
                    warn!("Consumer {} is no longer running, skipping", inbox.name);
                }
            }
        }

        delivered
    }

    /// Number of registered consumers
    pub fn len(&self) -> usize {
        self.inboxes.len()
    }

    /// Whether no consumers are registered
    pub fn is_empty(&self) -> bool {
        self.inboxes.is_empty()
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

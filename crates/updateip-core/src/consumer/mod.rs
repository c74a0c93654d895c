//! Consumer worker loop and built-in consumers
//!
//! Every registered consumer runs [`run_consumer`] on its own task. The loop
//! drains the inbox one address at a time, so updates for a single consumer
//! are handled strictly in the order they were notified.

pub mod writer;

pub use writer::WriteSink;

use crate::ip::IpAddress;
use crate::shutdown::Shutdown;
use crate::traits::{IpConsumer, UpdateOutcome};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// Drain `inbox` into `consumer` until shutdown or until the notifier is gone
///
/// Errors from the consumer are logged and the loop continues with the next
/// address. Shutdown interrupts both the wait for the next address and an
/// update in progress.
pub async fn run_consumer(
    mut consumer: Box<dyn IpConsumer>,
    mut inbox: mpsc::Receiver<IpAddress>,
    mut shutdown: Shutdown,
) {
    debug!("Consumer {} started", consumer.name());

    loop {
        let ip = tokio::select! {
            _ = shutdown.wait() => break,
            next = inbox.recv() => match next {
                Some(ip) => ip,
                None => {
                    debug!("Inbox for {} closed", consumer.name());
                    break;
                }
            },
        };

        let result = tokio::select! {
            _ = shutdown.wait() => break,
            result = consumer.on_update(&ip) => result,
        };

        match result {
            Ok(UpdateOutcome::Applied) => {
                debug!("Consumer {} applied {}", consumer.name(), ip);
            }
            Ok(UpdateOutcome::Skipped) => {
                debug!("Consumer {} already has {}, skipping", consumer.name(), ip);
            }
            Err(e) => {
                error!("Consumer {} failed to apply {}: {}", consumer.name(), ip, e);
            }
        }
    }

    info!("Consumer {} stopped", consumer.name());
}

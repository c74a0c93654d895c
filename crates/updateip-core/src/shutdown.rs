//! Process-wide shutdown signal
//!
//! A [`ShutdownTrigger`] fires once; every cloned [`Shutdown`] observes it.
//! The poller and each consumer worker select on [`Shutdown::wait`] at every
//! suspension point.

use tokio::sync::watch;

/// Sending half of the shutdown signal
#[derive(Debug)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

/// Receiving half of the shutdown signal
#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

/// Create a connected trigger/signal pair
pub fn channel() -> (ShutdownTrigger, Shutdown) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger { tx }, Shutdown { rx })
}

impl ShutdownTrigger {
    /// Signal shutdown to every subscriber
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    /// Another receiving half
    pub fn subscribe(&self) -> Shutdown {
        Shutdown {
            rx: self.tx.subscribe(),
        }
    }
}

impl Shutdown {
    /// Whether shutdown has been signalled
    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Wait until shutdown is signalled
    ///
    /// Also returns if the trigger is dropped, so a lost trigger cannot
    /// leave tasks running forever.
    pub async fn wait(&mut self) {
        // Err means the sender is gone.
        let _ = self.rx.wait_for(|triggered| *triggered).await;
    }
}

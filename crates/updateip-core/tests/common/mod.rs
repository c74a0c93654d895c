//! Test doubles and common utilities for pipeline contract tests
//!
//! These doubles stand in for the HTTP resolver and sinks so the poll loop,
//! fan-out and suppression rules can be checked without a network.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use updateip_core::config::PollerConfig;
use updateip_core::error::{Error, Result};
use updateip_core::{IpAddress, IpConsumer, IpResolver, PollEvent, UpdateOutcome};

/// A resolver that replays a fixed script of outcomes
///
/// `Ok(text)` resolves to `text`; `Err(body)` fails with `NoAddressFound`.
/// Once the script is exhausted, the last entry repeats.
pub struct ScriptedResolver {
    script: Mutex<VecDeque<std::result::Result<&'static str, &'static str>>>,
    last: Mutex<Option<std::result::Result<&'static str, &'static str>>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedResolver {
    pub fn new(script: Vec<std::result::Result<&'static str, &'static str>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            last: Mutex::new(None),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Resolver that always returns `ip`
    pub fn fixed(ip: &'static str) -> Self {
        Self::new(vec![Ok(ip)])
    }

    /// Shared handle on the call counter
    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait::async_trait]
impl IpResolver for ScriptedResolver {
    async fn resolve(&self) -> Result<IpAddress> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let next = {
            let mut script = self.script.lock().unwrap();
            let mut last = self.last.lock().unwrap();
            if let Some(step) = script.pop_front() {
                *last = Some(step);
            }
            (*last).expect("script must not be empty")
        };

        match next {
            Ok(ip) => Ok(IpAddress::new(ip)),
            Err(body) => Err(Error::no_address(self.endpoint(), body)),
        }
    }

    fn endpoint(&self) -> &str {
        "scripted"
    }
}

/// A resolver whose lookup never completes in test time
pub struct HangingResolver;

#[async_trait::async_trait]
impl IpResolver for HangingResolver {
    async fn resolve(&self) -> Result<IpAddress> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(IpAddress::new("0.0.0.0"))
    }

    fn endpoint(&self) -> &str {
        "hanging"
    }
}

/// Observations shared between a test and a [`ProbeConsumer`]
#[derive(Clone, Default)]
pub struct Probe {
    /// Every address handed to `on_update`
    pub notified: Arc<Mutex<Vec<String>>>,
    /// Addresses for which the downstream action ran
    pub downstream: Arc<Mutex<Vec<String>>>,
    /// When set, the downstream action fails
    pub reject: Arc<AtomicBool>,
    /// Number of updates that finished (applied, skipped or failed)
    pub finished: Arc<AtomicUsize>,
}

impl Probe {
    pub fn notified(&self) -> Vec<String> {
        self.notified.lock().unwrap().clone()
    }

    pub fn downstream(&self) -> Vec<String> {
        self.downstream.lock().unwrap().clone()
    }

    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }

    pub fn set_reject(&self, reject: bool) {
        self.reject.store(reject, Ordering::SeqCst);
    }
}

/// A consumer with the same suppression rules as the real sinks
///
/// The downstream action is recorded in the probe instead of hitting a
/// network. State advances only when the action succeeds.
pub struct ProbeConsumer {
    name: String,
    last_applied: Option<IpAddress>,
    delay: Duration,
    probe: Probe,
}

impl ProbeConsumer {
    pub fn new(name: &str) -> (Self, Probe) {
        let probe = Probe::default();
        let consumer = Self {
            name: name.to_string(),
            last_applied: None,
            delay: Duration::ZERO,
            probe: probe.clone(),
        };
        (consumer, probe)
    }

    /// Start with a previously applied address
    pub fn with_last_applied(mut self, ip: &str) -> Self {
        self.last_applied = Some(IpAddress::new(ip));
        self
    }

    /// Make the downstream action take `delay`
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn boxed(self) -> Box<dyn IpConsumer> {
        Box::new(self)
    }
}

#[async_trait::async_trait]
impl IpConsumer for ProbeConsumer {
    async fn on_update(&mut self, ip: &IpAddress) -> Result<UpdateOutcome> {
        self.probe.notified.lock().unwrap().push(ip.to_string());

        let result = if self.last_applied.as_ref() == Some(ip) {
            Ok(UpdateOutcome::Skipped)
        } else {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.probe.downstream.lock().unwrap().push(ip.to_string());

            if self.probe.reject.load(Ordering::SeqCst) {
                Err(Error::rejected("911 error"))
            } else {
                self.last_applied = Some(ip.clone());
                Ok(UpdateOutcome::Applied)
            }
        };

        self.probe.finished.fetch_add(1, Ordering::SeqCst);
        result
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Poller settings for tests (interval is overridden per test)
pub fn test_config() -> PollerConfig {
    PollerConfig {
        interval_secs: 1,
        inbox_capacity: 1,
        event_channel_capacity: 100,
    }
}

/// Drain every event currently queued
pub fn drain_events(rx: &mut tokio::sync::mpsc::Receiver<PollEvent>) -> Vec<PollEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Wait until `condition` holds, polling every 5ms, for at most 2 seconds
pub async fn eventually(mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not reached within 2 seconds"
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

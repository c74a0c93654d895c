//! Write sink: prints a line whenever the address changes

use crate::config::{SinkConfig, WriteTarget};
use crate::ip::IpAddress;
use crate::traits::{IpConsumer, SinkFactory, UpdateOutcome};
use async_trait::async_trait;
use std::io::Write;
use tracing::warn;

/// Consumer that writes `"<name>: New IP <ip>"` to an output on change
///
/// Output errors are the writer's concern: they are logged and the address
/// is still remembered, so this consumer never fails.
pub struct WriteSink<W> {
    name: String,
    output: W,
    last_ip: Option<IpAddress>,
}

impl<W: Write + Send> WriteSink<W> {
    /// Create a write sink over `output`
    pub fn new(name: impl Into<String>, output: W) -> Self {
        Self {
            name: name.into(),
            output,
            last_ip: None,
        }
    }

    /// The last address written
    pub fn last_ip(&self) -> Option<&IpAddress> {
        self.last_ip.as_ref()
    }

    /// Borrow the underlying output
    pub fn get_ref(&self) -> &W {
        &self.output
    }

    fn write_line(&mut self, ip: &IpAddress) -> std::io::Result<()> {
        writeln!(self.output, "{}: New IP {}", self.name, ip)?;
        self.output.flush()
    }
}

#[async_trait]
impl<W: Write + Send> IpConsumer for WriteSink<W> {
    async fn on_update(&mut self, ip: &IpAddress) -> crate::Result<UpdateOutcome> {
        if self.last_ip.as_ref() == Some(ip) {
            return Ok(UpdateOutcome::Skipped);
        }

        if let Err(e) = self.write_line(ip) {
            warn!("Write sink {} could not write {}: {}", self.name, ip, e);
        }
        self.last_ip = Some(ip.clone());
        Ok(UpdateOutcome::Applied)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Factory for write sinks on the standard streams
pub struct WriteSinkFactory;

impl SinkFactory for WriteSinkFactory {
    fn create(&self, config: &SinkConfig) -> crate::Result<Box<dyn IpConsumer>> {
        match config {
            SinkConfig::Write { name, target } => Ok(match target {
                WriteTarget::Stdout => Box::new(WriteSink::new(name.clone(), std::io::stdout())),
                WriteTarget::Stderr => Box::new(WriteSink::new(name.clone(), std::io::stderr())),
            }),
            _ => Err(crate::Error::config("Invalid config for write sink")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_writes_only_on_change() {
        let mut sink = WriteSink::new("stdout", Vec::new());

        let first = IpAddress::new("203.0.113.7");
        let second = IpAddress::new("203.0.113.8");

        assert_eq!(sink.on_update(&first).await.unwrap(), UpdateOutcome::Applied);
        assert_eq!(sink.on_update(&first).await.unwrap(), UpdateOutcome::Skipped);
        assert_eq!(sink.on_update(&second).await.unwrap(), UpdateOutcome::Applied);

        let output = String::from_utf8(sink.get_ref().clone()).unwrap();
        assert_eq!(
            output,
            "stdout: New IP 203.0.113.7\nstdout: New IP 203.0.113.8\n"
        );
        assert_eq!(sink.last_ip(), Some(&second));
    }

    #[tokio::test]
    async fn test_write_errors_do_not_fail_update() {
        let mut sink = WriteSink::new("broken", BrokenPipe);
        let ip = IpAddress::new("203.0.113.7");

        assert_eq!(sink.on_update(&ip).await.unwrap(), UpdateOutcome::Applied);
        assert_eq!(sink.last_ip(), Some(&ip));
        assert_eq!(sink.on_update(&ip).await.unwrap(), UpdateOutcome::Skipped);
    }

    #[test]
    fn test_factory_creation() {
        let factory = WriteSinkFactory;

        let config = SinkConfig::Write {
            name: "console".to_string(),
            target: WriteTarget::Stdout,
        };
        let sink = factory.create(&config).unwrap();
        assert_eq!(sink.name(), "console");

        let config = SinkConfig::HttpUpdate(crate::config::HttpUpdateConfig::new(
            "https://example.net/update",
            "mydomain.com",
            "user",
            "pass",
        ));
        assert!(factory.create(&config).is_err());
    }
}

// # updateipd - public IP watcher daemon
//
// Thin integration layer: reads configuration from the environment, builds
// the resolver, consumers and poll loop through the registry, and runs them
// until SIGTERM/SIGINT. All pipeline logic lives in updateip-core.
//
// ## Configuration
//
// All configuration is done via environment variables.
//
// `UPDATEIP_CONFIG_FILE` points at a JSON `UpdateIpConfig`; when set, the
// individual variables below are ignored (except the log level).
//
// ### Resolver
// - `UPDATEIP_RESOLVER_URL`: Address-reporting service (default http://ipecho.net/plain)
// - `UPDATEIP_POLL_INTERVAL`: Seconds between polls (default 10)
//
// ### Dyndns update sink (enabled when `UPDATEIP_UPDATE_URL` is set)
// - `UPDATEIP_UPDATE_URL`: Provider update URL
// - `UPDATEIP_UPDATE_METHOD`: get or post (default post)
// - `UPDATEIP_IP_FIELD`: Field carrying the address (default myip)
// - `UPDATEIP_HOSTNAME_FIELD`: Field carrying the hostname (default hostname)
// - `UPDATEIP_HOSTNAME`, `UPDATEIP_USERNAME`, `UPDATEIP_PASSWORD`
//
// ### Write sink
// - `UPDATEIP_ECHO`: true to print each new address to stdout
//
// ### Logging
// - `UPDATEIP_LOG_LEVEL`: trace, debug, info, warn, error (default info)
//
// ## Example
//
// ```bash
// export UPDATEIP_UPDATE_URL=https://members.dyndns.org/nic/update
// export UPDATEIP_HOSTNAME=mydomain.com
// export UPDATEIP_USERNAME=username
// export UPDATEIP_PASSWORD=password
// export UPDATEIP_ECHO=true
//
// updateipd
// ```

use anyhow::{Context, Result};
use std::process::ExitCode;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;
use updateip_core::config::{UpdateMethod, WriteTarget};
use updateip_core::{
    HttpUpdateConfig, Notifier, Poller, Registry, ResolverConfig, SinkConfig, UpdateIpConfig,
    shutdown,
};

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// How long running tasks get to finish after the shutdown signal
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum UpdateIpExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<UpdateIpExitCode> for ExitCode {
    fn from(code: UpdateIpExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Daemon configuration
struct Config {
    pipeline: UpdateIpConfig,
    log_level: Level,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`, which returns a variable's value if set
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let log_level = parse_log_level(
            &lookup("UPDATEIP_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        )?;

        let pipeline = match lookup("UPDATEIP_CONFIG_FILE") {
            Some(path) => UpdateIpConfig::from_json_file(&path)
                .with_context(|| format!("Failed to load UPDATEIP_CONFIG_FILE {}", path))?,
            None => pipeline_from_lookup(&lookup)?,
        };

        Ok(Self {
            pipeline,
            log_level,
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        self.pipeline.validate()?;

        for sink in &self.pipeline.sinks {
            if let SinkConfig::HttpUpdate(update) = sink
                && update.url.starts_with("http://")
            {
                warn!(
                    "Update URL for {} uses HTTP (not HTTPS); credentials travel in clear text",
                    update.name
                );
            }
        }

        Ok(())
    }
}

fn pipeline_from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<UpdateIpConfig> {
    let mut config = UpdateIpConfig::new();

    if let Some(url) = lookup("UPDATEIP_RESOLVER_URL") {
        config.resolver = ResolverConfig::http(url);
    }

    if let Some(interval) = lookup("UPDATEIP_POLL_INTERVAL") {
        config.poller.interval_secs = interval.trim().parse().with_context(|| {
            format!("UPDATEIP_POLL_INTERVAL must be a number of seconds. Got: {interval}")
        })?;
    }

    if lookup("UPDATEIP_ECHO").is_some_and(|v| is_truthy(&v)) {
        config.sinks.push(SinkConfig::Write {
            name: "stdout".to_string(),
            target: WriteTarget::Stdout,
        });
    }

    if let Some(url) = lookup("UPDATEIP_UPDATE_URL") {
        let required = |key: &str| {
            lookup(key).with_context(|| format!("{key} is required when UPDATEIP_UPDATE_URL is set"))
        };

        let mut update = HttpUpdateConfig::new(
            url,
            required("UPDATEIP_HOSTNAME")?,
            required("UPDATEIP_USERNAME")?,
            required("UPDATEIP_PASSWORD")?,
        );

        if let Some(method) = lookup("UPDATEIP_UPDATE_METHOD") {
            update = update.with_method(parse_method(&method)?);
        }
        if let Some(field) = lookup("UPDATEIP_IP_FIELD") {
            update.ip_field = field;
        }
        if let Some(field) = lookup("UPDATEIP_HOSTNAME_FIELD") {
            update.hostname_field = field;
        }

        config.sinks.push(SinkConfig::HttpUpdate(update));
    }

    if config.sinks.is_empty() {
        anyhow::bail!(
            "No consumers configured. \
            Set UPDATEIP_UPDATE_URL (with UPDATEIP_HOSTNAME, UPDATEIP_USERNAME, UPDATEIP_PASSWORD) \
            and/or UPDATEIP_ECHO=true"
        );
    }

    Ok(config)
}

fn parse_log_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!(
            "UPDATEIP_LOG_LEVEL '{}' is not valid. \
            Valid levels: trace, debug, info, warn, error",
            level
        ),
    }
}

fn parse_method(method: &str) -> Result<UpdateMethod> {
    match method.to_lowercase().as_str() {
        "get" => Ok(UpdateMethod::Get),
        "post" => Ok(UpdateMethod::Post),
        _ => anyhow::bail!(
            "UPDATEIP_UPDATE_METHOD '{}' is not supported. Supported methods: get, post",
            method
        ),
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return UpdateIpExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return UpdateIpExitCode::ConfigError.into();
    }

    if let Err(e) = config.validate() {
        error!("Configuration validation error: {:#}", e);
        return UpdateIpExitCode::ConfigError.into();
    }

    info!("Starting updateipd daemon");
    info!(
        "Configuration loaded: resolver {}, {} consumer(s), interval {}s",
        config.pipeline.resolver.type_name(),
        config.pipeline.sinks.len(),
        config.pipeline.poller.interval_secs
    );

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return UpdateIpExitCode::RuntimeError.into();
        }
    };

    rt.block_on(run_daemon(config.pipeline)).into()
}

/// Run the daemon until a shutdown signal arrives
async fn run_daemon(config: UpdateIpConfig) -> UpdateIpExitCode {
    let registry = Registry::with_builtins();

    #[cfg(feature = "http")]
    {
        info!("Registering HTTP resolver");
        updateip_resolver_http::register(&registry);
    }

    #[cfg(feature = "dyndns")]
    {
        info!("Registering dyndns update sink");
        updateip_sink_dyndns::register(&registry);
    }

    let (trigger, signal_rx) = shutdown::channel();

    let (mut tasks, poller) = match build_pipeline(&registry, &config, signal_rx.clone()) {
        Ok(parts) => parts,
        Err(e) => {
            error!("Startup error: {:#}", e);
            return UpdateIpExitCode::ConfigError;
        }
    };

    tasks.push(tokio::spawn(async move {
        if let Err(e) = poller.run_with_shutdown(signal_rx).await {
            error!("Poller stopped with error: {}", e);
        }
    }));

    info!("Daemon initialized successfully");

    let exit_code = match wait_for_shutdown().await {
        Ok(signal) => {
            info!("Received shutdown signal: {}", signal);
            UpdateIpExitCode::CleanShutdown
        }
        Err(e) => {
            error!("Shutdown error: {:#}", e);
            UpdateIpExitCode::RuntimeError
        }
    };

    trigger.trigger();
    info!("Shutting down daemon");

    let join_all = async {
        for task in tasks {
            if let Err(e) = task.await {
                error!("Task failed during shutdown: {}", e);
            }
        }
    };

    if tokio::time::timeout(SHUTDOWN_GRACE, join_all).await.is_err() {
        error!("Shutdown timeout after {:?}", SHUTDOWN_GRACE);
        return UpdateIpExitCode::RuntimeError;
    }

    exit_code
}

/// Build the resolver, consumer workers and poll loop from configuration
///
/// Returns the consumer worker handles and the poller, ready to run.
fn build_pipeline(
    registry: &Registry,
    config: &UpdateIpConfig,
    shutdown: updateip_core::Shutdown,
) -> Result<(Vec<JoinHandle<()>>, Poller)> {
    let resolver = registry
        .create_resolver(&config.resolver)
        .with_context(|| format!("Failed to create {} resolver", config.resolver.type_name()))?;
    info!("Resolving via {}", resolver.endpoint());

    let mut notifier = Notifier::with_inbox_capacity(config.poller.inbox_capacity);
    let mut workers = Vec::with_capacity(config.sinks.len());

    for sink_config in &config.sinks {
        let consumer = registry
            .create_sink(sink_config)
            .with_context(|| format!("Failed to create {} sink", sink_config.type_name()))?;
        info!("Registered consumer {} ({})", consumer.name(), sink_config.type_name());
        workers.push(notifier.register(consumer, shutdown.clone()));
    }

    let (poller, mut events) = Poller::new(resolver, notifier, &config.poller)?;

    // Nobody subscribes to monitoring events here; surface them at debug level.
    workers.push(tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            tracing::debug!("Poll event: {:?}", event);
        }
    }));

    Ok((workers, poller))
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// # Returns
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm =
        signal(SignalKind::terminate()).context("Failed to setup SIGTERM handler")?;
    let mut sigint =
        signal(SignalKind::interrupt()).context("Failed to setup SIGINT handler")?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .context("Failed to wait for CTRL-C")?;
    Ok("SIGINT")
}

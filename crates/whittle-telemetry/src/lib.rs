//! Logging initialization shared by the binary and any embedding host.

use serde::Deserialize;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Configuration for the logging subsystem.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default log level. Overridden by the RUST_LOG env var.
    pub log_level: String,
    /// Per-module level overrides (e.g. "whittle_engine" => "debug").
    pub module_levels: Vec<(String, String)>,
    /// Emit JSON lines instead of human-readable output.
    pub json_output: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_level: Level::INFO.to_string().to_lowercase(),
            module_levels: Vec::new(),
            json_output: false,
        }
    }
}

impl LogConfig {
    fn filter_directives(&self) -> String {
        let mut filter = self.log_level.clone();
        for (module, level) in &self.module_levels {
            filter.push_str(&format!(",{module}={level}"));
        }
        filter
    }
}

/// Initialize logging. Call once at startup; a second call is a no-op so
/// tests and embedders cannot poison each other.
pub fn init_logging(config: &LogConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.filter_directives()));

    let fmt_layer = if config.json_output {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed()
    };

    let _ = tracing_subscriber::registry()
        .with(fmt_layer.with_filter(env_filter))
        .try_init();
}

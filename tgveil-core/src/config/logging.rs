use serde::Deserialize;

/// Application-level structured logging (stdout).
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    /// Can be overridden at runtime via `RUST_LOG`.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Show the module path (target) in log lines.
    #[serde(default)]
    pub show_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
            show_target: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Optional Prometheus-style metrics scrape endpoint.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct MetricsConfig {
    /// Loopback TCP port to serve a text-exposition snapshot of [`crate::stats::Stats`] on.
    /// `None` disables the endpoint entirely.
    #[serde(default)]
    pub port: Option<u16>,
}

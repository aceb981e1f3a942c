//! Logging setup for provider binaries
//!
//! Logs always go to stderr: stdout carries the plugin handshake line and
//! Terraform treats anything else printed there as a protocol error.
//! Terraform forwards provider stderr into its own log when `TF_LOG` is set.
//!
//! The filter is taken from `TF_LOG_PROVIDER` (Terraform's level names such
//! as `DEBUG`), then `RUST_LOG` (full `EnvFilter` directives), then the
//! configured default level.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Log level used when neither environment variable is set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Builds the filter from the environment, falling back to `default_level`
pub fn env_filter(default_level: LogLevel) -> EnvFilter {
    if let Ok(level) = std::env::var("TF_LOG_PROVIDER") {
        let level = match level.trim().to_ascii_lowercase().as_str() {
            // TF_LOG=JSON means trace-level output
            "json" => "trace".to_string(),
            "off" => "off".to_string(),
            other => other.to_string(),
        };
        if let Ok(filter) = EnvFilter::try_new(&level) {
            return filter;
        }
    }

    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level.as_str()))
}

/// Installs the global subscriber; returns false if one was already set
pub fn init_logging(default_level: LogLevel) -> bool {
    tracing_subscriber::registry()
        .with(env_filter(default_level))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false),
        )
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn tf_log_provider_wins_over_rust_log() {
        std::env::set_var("TF_LOG_PROVIDER", "DEBUG");
        std::env::set_var("RUST_LOG", "error");

        let filter = env_filter(LogLevel::Info);
        assert_eq!(filter.to_string(), "debug");

        std::env::remove_var("TF_LOG_PROVIDER");
        std::env::remove_var("RUST_LOG");
    }

    #[test]
    #[serial]
    fn falls_back_to_default_level() {
        std::env::remove_var("TF_LOG_PROVIDER");
        std::env::remove_var("RUST_LOG");

        assert_eq!(env_filter(LogLevel::Warn).to_string(), "warn");
    }

    #[test]
    #[serial]
    fn json_level_maps_to_trace() {
        std::env::set_var("TF_LOG_PROVIDER", "JSON");
        assert_eq!(env_filter(LogLevel::Info).to_string(), "trace");
        std::env::remove_var("TF_LOG_PROVIDER");
    }

    #[test]
    fn second_init_reports_false() {
        init_logging(LogLevel::Info);
        assert!(!init_logging(LogLevel::Info));
    }
}

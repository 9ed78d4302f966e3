//! Logging and tracing setup
//!
//! Console output goes to stderr so that reports written to stdout stay
//! machine-readable. File output, when enabled, rolls daily and is always JSON.
//! It is written by a background worker that flushes when the guard returned
//! from [`LoggingConfig::init`] is dropped.

use std::io;
use tracing::{debug, Level};
use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Registry,
};

/// Error returned when the global subscriber cannot be installed
pub type LoggingInitError = Box<dyn std::error::Error + Send + Sync>;

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Maximum level for this crate's events
    pub level: Level,
    /// Emit JSON lines on the console instead of the pretty format
    pub json_format: bool,
    /// Directory for rolling log files, `None` for console only
    pub log_directory: Option<String>,
    /// File name prefix for rolling log files
    pub log_file_prefix: String,
    /// Report span open/close (replication and experiment timings)
    pub enable_span_events: bool,
    /// ANSI colors on the console
    pub enable_ansi: bool,
    /// Explicit filter directive, overrides `level` and `RUST_LOG`
    pub env_filter: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            json_format: false,
            log_directory: None,
            log_file_prefix: "service-counter-simulator".to_string(),
            enable_span_events: false,
            enable_ansi: true,
            env_filter: None,
        }
    }
}

impl LoggingConfig {
    /// Create a configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Pick a configuration from the command-line verbosity switches
    ///
    /// `debug` wins over `verbose`; with neither only warnings are shown so
    /// the text report is not interleaved with progress lines.
    pub fn from_flags(verbose: bool, debug: bool) -> Self {
        if debug {
            Self::new().with_level(Level::DEBUG).with_span_events()
        } else if verbose {
            Self::new().with_level(Level::INFO).with_span_events()
        } else {
            Self::new().with_level(Level::WARN)
        }
    }

    /// Set the log level
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Emit JSON on the console
    pub fn with_json_format(mut self) -> Self {
        self.json_format = true;
        self
    }

    /// Also write rolling log files under `directory`
    pub fn with_file_logging(mut self, directory: impl Into<String>) -> Self {
        self.log_directory = Some(directory.into());
        self
    }

    /// Set the log file prefix
    pub fn with_file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.log_file_prefix = prefix.into();
        self
    }

    /// Report span open and close events
    pub fn with_span_events(mut self) -> Self {
        self.enable_span_events = true;
        self
    }

    /// Disable ANSI colors
    pub fn without_ansi(mut self) -> Self {
        self.enable_ansi = false;
        self
    }

    /// Use an explicit filter directive
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Whether log files will be written
    pub fn logs_to_file(&self) -> bool {
        self.log_directory.is_some()
    }

    /// Filter directive used when neither `env_filter` nor `RUST_LOG` is set
    pub fn default_directive(&self) -> String {
        format!("{}={}", env!("CARGO_PKG_NAME").replace('-', "_"), self.level)
    }

    fn span_events(&self) -> FmtSpan {
        if self.enable_span_events {
            FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        }
    }

    fn filter(&self) -> Result<EnvFilter, LoggingInitError> {
        match &self.env_filter {
            Some(directive) => Ok(EnvFilter::try_new(directive)?),
            None => Ok(EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(self.default_directive()))),
        }
    }

    /// Install the global tracing subscriber
    ///
    /// Fails if a subscriber is already installed. When file logging is on,
    /// the returned guard must be held until the program is done logging;
    /// dropping it flushes the file writer.
    pub fn init(self) -> Result<Option<WorkerGuard>, LoggingInitError> {
        let registry = Registry::default().with(self.filter()?);
        let span_events = self.span_events();

        let console_json = self.json_format.then(|| {
            fmt::layer()
                .json()
                .with_writer(io::stderr)
                .with_span_events(span_events.clone())
        });
        let console_pretty = (!self.json_format).then(|| {
            fmt::layer()
                .with_writer(io::stderr)
                .with_ansi(self.enable_ansi)
                .with_target(false)
                .with_span_events(span_events.clone())
        });

        let (file_layer, guard) = match &self.log_directory {
            Some(directory) => {
                let appender = rolling::daily(directory, &self.log_file_prefix);
                let (writer, guard) = non_blocking(appender);
                let layer = fmt::layer().json().with_writer(writer).with_span_events(span_events);
                (Some(layer), Some(guard))
            }
            None => (None, None),
        };

        registry.with(console_json).with(console_pretty).with(file_layer).try_init()?;

        debug!(
            level = %self.level,
            json = self.json_format,
            to_file = self.logs_to_file(),
            "Logging initialized"
        );
        Ok(guard)
    }
}

/// Structured log event tagged with the simulation component
#[macro_export]
macro_rules! sim_event {
    ($level:ident, $message:expr, $($key:ident = $value:expr),* $(,)?) => {
        tracing::$level!(
            message = $message,
            component = "simulation",
            $($key = $value,)*
        );
    };
    ($level:ident, $message:expr) => {
        tracing::$level!(message = $message, component = "simulation");
    };
}

/// Timing span tagged with the performance component
#[macro_export]
macro_rules! perf_span {
    ($name:expr, $($key:ident = $value:expr),* $(,)?) => {
        tracing::info_span!(
            $name,
            component = "performance",
            $($key = $value,)*
        )
    };
    ($name:expr) => {
        tracing::info_span!($name, component = "performance")
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LoggingConfig::new();
        assert_eq!(config.level, Level::INFO);
        assert!(!config.json_format);
        assert!(!config.logs_to_file());
        assert_eq!(config.log_file_prefix, "service-counter-simulator");
        assert!(config.enable_ansi);
        assert_eq!(config.default_directive(), "service_counter_simulator=INFO");
    }

    #[test]
    fn test_builder() {
        let config = LoggingConfig::new()
            .with_level(Level::DEBUG)
            .with_json_format()
            .with_file_logging("run_logs")
            .with_file_prefix("counter")
            .with_span_events()
            .without_ansi()
            .with_env_filter("warn");

        assert_eq!(config.level, Level::DEBUG);
        assert!(config.json_format);
        assert_eq!(config.log_directory.as_deref(), Some("run_logs"));
        assert_eq!(config.log_file_prefix, "counter");
        assert!(config.enable_span_events);
        assert!(!config.enable_ansi);
        assert_eq!(config.env_filter.as_deref(), Some("warn"));
    }

    #[test]
    fn test_file_log_is_complete_once_guard_dropped() {
        const LINES: usize = 5_000;
        let dir = tempfile::TempDir::new().unwrap();

        let guard = LoggingConfig::new()
            .with_env_filter("info")
            .with_file_logging(dir.path().to_string_lossy().into_owned())
            .with_file_prefix("flush")
            .without_ansi()
            .init()
            .unwrap();
        assert!(guard.is_some());

        for line in 0..LINES {
            tracing::info!(line, "flush check");
        }
        drop(guard);

        let mut found = 0;
        for entry in std::fs::read_dir(dir.path()).unwrap() {
            let content = std::fs::read_to_string(entry.unwrap().path()).unwrap();
            found += content.lines().filter(|line| line.contains("flush check")).count();
        }
        assert_eq!(found, LINES);
    }

    #[test]
    fn test_from_flags() {
        assert_eq!(LoggingConfig::from_flags(false, false).level, Level::WARN);
        assert_eq!(LoggingConfig::from_flags(true, false).level, Level::INFO);
        assert_eq!(LoggingConfig::from_flags(true, true).level, Level::DEBUG);
        assert!(LoggingConfig::from_flags(false, true).enable_span_events);
    }
}

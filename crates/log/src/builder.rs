//! Logger builder implementation

use tracing_subscriber::{
    EnvFilter, fmt::writer::BoxMakeWriter, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::config::{Config, Format, WriterConfig};
use crate::error::{LogError, LogResult};

/// Logger builder
#[derive(Debug)]
pub struct LoggerBuilder {
    config: Config,
}

/// Proof that a subscriber was installed by this builder.
///
/// Hold it for the life of the process; a noop guard means another
/// subscriber was already in place.
#[derive(Debug)]
#[must_use = "dropping the guard early loses track of who owns the subscriber"]
pub struct LoggerGuard {
    installed: bool,
}

impl LoggerGuard {
    pub(crate) fn noop() -> Self {
        Self { installed: false }
    }

    /// Whether this guard installed the global subscriber.
    pub fn is_installed(&self) -> bool {
        self.installed
    }
}

macro_rules! create_fmt_layer {
    ($format:ident, $display:expr, $writer:expr) => {
        tracing_subscriber::fmt::layer()
            .$format()
            .with_writer($writer)
            .with_ansi($display.colors)
            .with_target($display.target)
            .with_file($display.source)
            .with_line_number($display.source)
            .with_thread_ids($display.thread_ids)
    };
}

macro_rules! create_json_layer {
    ($display:expr, $writer:expr) => {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer($writer)
            .with_current_span(true)
            .flatten_event($display.flatten)
            .with_target($display.target)
            .with_file($display.source)
            .with_line_number($display.source)
            .with_thread_ids($display.thread_ids)
    };
}

/// Install `registry + filter + layer`, dropping the timer when disabled.
macro_rules! try_init_layer {
    ($filter:ident, $layer:expr, $display:expr) => {
        if $display.time {
            tracing_subscriber::registry()
                .with($filter)
                .with($layer)
                .try_init()
        } else {
            tracing_subscriber::registry()
                .with($filter)
                .with($layer.without_time())
                .try_init()
        }
    };
}

fn make_writer(writer: WriterConfig) -> BoxMakeWriter {
    match writer {
        WriterConfig::Stderr => BoxMakeWriter::new(std::io::stderr),
        WriterConfig::Stdout => BoxMakeWriter::new(std::io::stdout),
    }
}

impl LoggerBuilder {
    /// Create builder from config
    #[must_use]
    pub fn from_config(config: Config) -> Self {
        Self { config }
    }

    /// Parse the filter without installing anything.
    pub fn filter(&self) -> LogResult<EnvFilter> {
        EnvFilter::try_new(&self.config.level).map_err(|e| LogError::Filter {
            filter: self.config.level.clone(),
            reason: e.to_string(),
        })
    }

    /// Build and install the global subscriber
    ///
    /// # Errors
    ///
    /// Returns error if the filter string cannot be parsed or a subscriber
    /// is already installed.
    pub fn build(self) -> LogResult<LoggerGuard> {
        let filter = self.filter()?;
        let display = &self.config.display;

        let result = match self.config.format {
            Format::Pretty => {
                let writer = make_writer(self.config.writer);
                try_init_layer!(filter, create_fmt_layer!(pretty, display, writer), display)
            }
            Format::Compact => {
                let writer = make_writer(self.config.writer);
                try_init_layer!(filter, create_fmt_layer!(compact, display, writer), display)
            }
            Format::Json => {
                let writer = make_writer(self.config.writer);
                try_init_layer!(filter, create_json_layer!(display, writer), display)
            }
        };

        result.map_err(|e| LogError::AlreadyInitialized(e.to_string()))?;
        tracing::debug!(level = %self.config.level, format = ?self.config.format, "logger initialized");
        Ok(LoggerGuard { installed: true })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_filter_is_rejected_before_install() {
        let builder = LoggerBuilder::from_config(Config {
            level: "rotor=notalevel".to_string(),
            ..Config::default()
        });
        let err = builder.filter().unwrap_err();
        assert!(matches!(err, LogError::Filter { .. }));
    }

    #[test]
    fn noop_guard_is_not_installed() {
        assert!(!LoggerGuard::noop().is_installed());
    }
}

//! Logging setup built on `tracing-subscriber`.
//!
//! The profile comes from `common.log_mode`:
//!
//! - `debug` *(default)*: `DEBUG` level, compact lines with file and line
//! - anything else: `INFO` level, compact lines (JSON with the `json-log`
//!   feature)
//!
//! `common.log.format` (`compact`, `full`, `pretty`, `json`) overrides the
//! format and `common.log.file` sends output to a file. `RUST_LOG` always wins
//! over the configured level.
//!
//! ```rust,ignore
//! use switchboard_runtime::config::ServiceConfig;
//! use switchboard_runtime::logging;
//!
//! logging::init_from_config(&ServiceConfig::from_settings(&settings));
//! ```

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::{Level, warn};
use tracing_subscriber::prelude::*;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::{LogMode, ServiceConfig};

/// Line format of the fmt layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One short line per event.
    #[default]
    Compact,
    /// The default `tracing-subscriber` format.
    Full,
    /// Multi-line, human oriented.
    Pretty,
    /// One JSON object per event.
    #[cfg(feature = "json-log")]
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "full" => Ok(Self::Full),
            "pretty" => Ok(Self::Pretty),
            #[cfg(feature = "json-log")]
            "json" => Ok(Self::Json),
            other => Err(format!("unsupported log format '{other}'")),
        }
    }
}

/// Where log lines go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    /// The file set with [`LoggingBuilder::file_path`].
    File,
}

/// Initializes logging from the service configuration.
///
/// A second call is a no-op.
pub fn init_from_config(config: &ServiceConfig) {
    if LoggingBuilder::from_config(config).try_init().is_ok() {
        tracing::debug!(mode = ?config.log_mode, "Logger started");
    }
}

/// A builder for the global subscriber.
///
/// ```rust,ignore
/// use switchboard_runtime::logging::{LogFormat, LoggingBuilder};
/// use tracing::Level;
///
/// LoggingBuilder::new()
///     .with_level(Level::DEBUG)
///     .format(LogFormat::Pretty)
///     .directive("hyper=warn")
///     .init();
/// ```
#[derive(Debug, Clone)]
pub struct LoggingBuilder {
    level: Level,
    directives: Vec<String>,
    format: LogFormat,
    output: LogOutput,
    file_path: Option<PathBuf>,
    with_target: bool,
    with_file: bool,
    with_line_number: bool,
}

impl Default for LoggingBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LoggingBuilder {
    /// Info level, compact lines on stdout.
    pub fn new() -> Self {
        Self {
            level: Level::INFO,
            directives: Vec::new(),
            format: LogFormat::Compact,
            output: LogOutput::Stdout,
            file_path: None,
            with_target: true,
            with_file: false,
            with_line_number: false,
        }
    }

    /// Applies the profile selected by `common.log_mode` and the `common.log.*`
    /// overrides. Lines go to stderr so CLI results own stdout.
    pub fn from_config(config: &ServiceConfig) -> Self {
        let builder = match config.log_mode {
            LogMode::Debug => Self::new()
                .with_level(Level::DEBUG)
                .with_file(true)
                .with_line_number(true),
            LogMode::Production => Self::new()
                .with_level(Level::INFO)
                .format(production_format()),
        };
        let mut builder = builder.output(LogOutput::Stderr);

        if let Some(name) = &config.log_format {
            match name.parse() {
                Ok(format) => builder.format = format,
                Err(e) => warn!(error = %e, "Keeping the default log format"),
            }
        }

        if let Some(path) = &config.log_file {
            builder = builder.file_path(path.clone()).output(LogOutput::File);
        }

        builder
    }

    /// Sets the base level.
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Adds a filter directive such as `hyper=warn`.
    pub fn directive(mut self, directive: &str) -> Self {
        self.directives.push(directive.to_string());
        self
    }

    /// Sets the line format.
    pub fn format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets the destination.
    pub fn output(mut self, output: LogOutput) -> Self {
        self.output = output;
        self
    }

    /// Sets the file used by [`LogOutput::File`].
    pub fn file_path(mut self, path: PathBuf) -> Self {
        self.file_path = Some(path);
        self
    }

    /// Includes the target (module path) in each line.
    pub fn with_target(mut self, enabled: bool) -> Self {
        self.with_target = enabled;
        self
    }

    /// Includes the source file in each line.
    pub fn with_file(mut self, enabled: bool) -> Self {
        self.with_file = enabled;
        self
    }

    /// Includes the source line number in each line.
    pub fn with_line_number(mut self, enabled: bool) -> Self {
        self.with_line_number = enabled;
        self
    }

    fn build_filter(&self) -> EnvFilter {
        let base = self.level.to_string().to_lowercase();
        let mut filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(base));
        for directive in &self.directives {
            match directive.parse() {
                Ok(d) => filter = filter.add_directive(d),
                Err(e) => warn!(directive = %directive, error = %e, "Ignoring log directive"),
            }
        }
        filter
    }

    /// Installs the subscriber, ignoring an already installed one.
    pub fn init(self) {
        let _ = self.try_init();
    }

    /// Installs the subscriber.
    pub fn try_init(self) -> Result<(), TryInitError> {
        let filter = self.build_filter();

        macro_rules! text_layer {
            ($layer:expr) => {
                $layer
                    .with_target(self.with_target)
                    .with_file(self.with_file)
                    .with_line_number(self.with_line_number)
            };
        }

        macro_rules! install {
            ($writer:expr) => {
                match self.format {
                    #[cfg(feature = "json-log")]
                    LogFormat::Json => tracing_subscriber::registry()
                        .with(fmt::layer().json().with_writer($writer))
                        .with(filter)
                        .try_init(),
                    LogFormat::Compact => tracing_subscriber::registry()
                        .with(text_layer!(fmt::layer().compact().with_writer($writer)))
                        .with(filter)
                        .try_init(),
                    LogFormat::Full => tracing_subscriber::registry()
                        .with(text_layer!(fmt::layer().with_writer($writer)))
                        .with(filter)
                        .try_init(),
                    LogFormat::Pretty => tracing_subscriber::registry()
                        .with(text_layer!(fmt::layer().pretty().with_writer($writer)))
                        .with(filter)
                        .try_init(),
                }
            };
        }

        match (self.output, self.file_path.as_deref()) {
            (LogOutput::Stdout, _) => install!(std::io::stdout),
            (LogOutput::Stderr, _) => install!(std::io::stderr),
            (LogOutput::File, Some(path)) => {
                let appender = tracing_appender::rolling::never(
                    path.parent().unwrap_or_else(|| Path::new(".")),
                    path.file_name()
                        .unwrap_or_else(|| OsStr::new("switchboard.log")),
                );
                install!(appender)
            }
            (LogOutput::File, None) => {
                warn!("File output requested without a path, logging to stdout");
                install!(std::io::stdout)
            }
        }
    }
}

#[cfg(feature = "json-log")]
fn production_format() -> LogFormat {
    LogFormat::Json
}

#[cfg(not(feature = "json-log"))]
fn production_format() -> LogFormat {
    LogFormat::Compact
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use switchboard_core::Settings;

    fn config(value: serde_json::Value) -> ServiceConfig {
        ServiceConfig::from_settings(&Settings::from(value))
    }

    #[test]
    fn test_log_format_parse() {
        assert_eq!("compact".parse::<LogFormat>(), Ok(LogFormat::Compact));
        assert_eq!("PRETTY".parse::<LogFormat>(), Ok(LogFormat::Pretty));
        assert_eq!("full".parse::<LogFormat>(), Ok(LogFormat::Full));
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_debug_profile_is_default() {
        let builder = LoggingBuilder::from_config(&config(json!({})));
        assert_eq!(builder.level, Level::DEBUG);
        assert!(builder.with_file);
        assert!(builder.with_line_number);
        assert_eq!(builder.output, LogOutput::Stderr);
    }

    #[test]
    fn test_production_profile() {
        let builder =
            LoggingBuilder::from_config(&config(json!({"common": {"log_mode": "production"}})));
        assert_eq!(builder.level, Level::INFO);
        assert!(!builder.with_file);
        assert_eq!(builder.format, production_format());
    }

    #[test]
    fn test_overrides_from_log_section() {
        let builder = LoggingBuilder::from_config(&config(json!({
            "common": {"log": {"format": "pretty", "file": "/tmp/switchboard-test.log"}}
        })));
        assert_eq!(builder.format, LogFormat::Pretty);
        assert_eq!(builder.output, LogOutput::File);
        assert_eq!(
            builder.file_path,
            Some(PathBuf::from("/tmp/switchboard-test.log"))
        );
    }

    #[test]
    fn test_unknown_format_keeps_profile_default() {
        let builder =
            LoggingBuilder::from_config(&config(json!({"common": {"log": {"format": "xml"}}})));
        assert_eq!(builder.format, LogFormat::Compact);
    }
}

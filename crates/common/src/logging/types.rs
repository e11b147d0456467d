//! Configuration types for the logging subsystem.

use std::path::PathBuf;

use tracing_appender::rolling::Rotation;
use tracing_subscriber::fmt::format::FmtSpan;

/// Configuration for the stdout/stderr logging layer.
#[derive(Debug, Clone)]
pub struct StdoutConfig {
    /// Use JSON format instead of compact format.
    pub json_format: bool,
    /// Span events to log (ENTER, EXIT, CLOSE, etc.).
    pub fmt_span: FmtSpan,
}

impl Default for StdoutConfig {
    fn default() -> Self {
        Self {
            json_format: false,
            // Log CLOSE events to capture span duration
            fmt_span: FmtSpan::CLOSE,
        }
    }
}

/// Configuration for file-based logging with rotation.
#[derive(Debug, Clone)]
pub struct FileLoggingConfig {
    /// Directory where log files will be written.
    pub directory: PathBuf,
    /// Base filename prefix (e.g., "stela" -> "stela.log").
    pub file_name_prefix: String,
    /// Rotation strategy (daily, hourly, never).
    pub rotation: Rotation,
    /// Use JSON format for file logs.
    pub json_format: bool,
}

impl FileLoggingConfig {
    pub fn new(directory: PathBuf, file_name_prefix: String) -> Self {
        Self {
            directory,
            file_name_prefix,
            rotation: Rotation::DAILY,
            json_format: false,
        }
    }

    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_json_format(mut self, json_format: bool) -> Self {
        self.json_format = json_format;
        self
    }
}

/// Top level logger configuration.
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Service name included in the startup line.
    pub service_name: String,
    /// Stdout layer setup.
    pub stdout_config: StdoutConfig,
    /// Optional file layer setup.
    pub file_logging_config: Option<FileLoggingConfig>,
}

impl LoggerConfig {
    /// Creates a new instance with the service name and defaults elsewhere.
    pub fn new(service_name: String) -> Self {
        Self {
            service_name,
            stdout_config: StdoutConfig::default(),
            file_logging_config: None,
        }
    }

    pub fn with_stdout_json(mut self, json_format: bool) -> Self {
        self.stdout_config.json_format = json_format;
        self
    }

    pub fn with_file_logging(mut self, config: FileLoggingConfig) -> Self {
        self.file_logging_config = Some(config);
        self
    }
}

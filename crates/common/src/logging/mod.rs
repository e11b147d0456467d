//! Logging subsystem.

mod manager;
mod types;

pub use manager::init;
pub use types::{FileLoggingConfig, LoggerConfig, StdoutConfig};

// Re-export tracing-appender types for convenience
pub use tracing_appender::rolling::Rotation;

/// Formats a service name with an optional label suffix.
pub fn format_service_name(base: &str, label: Option<&str>) -> String {
    match label {
        Some(label) => format!("{base}%{label}"),
        None => base.to_owned(),
    }
}

//! Logging initialization.

use tracing::info;
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::{fmt::layer, layer::SubscriberExt, util::SubscriberInitExt, Layer};

use super::types::LoggerConfig;

/// Initializes the logging subsystem with the provided config.
pub fn init(config: LoggerConfig) {
    // Default to INFO, still allowing override via RUST_LOG.
    let filt = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(tracing::Level::INFO.into())
        .from_env_lossy();

    // Configure stdout logging with JSON or compact format
    let stdout_layer = if config.stdout_config.json_format {
        layer()
            .json()
            .with_span_events(config.stdout_config.fmt_span.clone())
            .with_filter(filt)
            .boxed()
    } else {
        layer()
            .compact()
            .with_span_events(config.stdout_config.fmt_span.clone())
            .with_filter(filt)
            .boxed()
    };

    // Build optional file logging layer
    let file_layer = config.file_logging_config.as_ref().map(|file_config| {
        let file_appender = RollingFileAppender::new(
            file_config.rotation.clone(),
            &file_config.directory,
            &file_config.file_name_prefix,
        );

        let file_filt = tracing_subscriber::EnvFilter::builder()
            .with_default_directive(tracing::Level::INFO.into())
            .from_env_lossy();

        if file_config.json_format {
            layer()
                .json()
                .with_writer(file_appender)
                .with_ansi(false) // No color codes in files
                .with_filter(file_filt)
                .boxed()
        } else {
            layer()
                .compact()
                .with_writer(file_appender)
                .with_ansi(false) // No color codes in files
                .with_filter(file_filt)
                .boxed()
        }
    });

    tracing_subscriber::registry()
        .with(stdout_layer)
        .with(file_layer)
        .init();

    info!(service_name = %config.service_name, "logging initialized");
}

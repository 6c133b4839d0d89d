// Logging module - diagnostic tracing setup
//
// Diagnostics go to stderr (human format) and optionally to rotating JSON
// files. Stdout is left to the telemetry event stream.
//
// Precedence: RUST_LOG env var > config file level > default "info"

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogRotation, LoggingConfig};

fn default_filter(config: &LoggingConfig) -> String {
    format!("usage_relay={},tower_http=info", config.level)
}

fn file_appender(config: &LoggingConfig) -> tracing_appender::rolling::RollingFileAppender {
    match config.file_rotation {
        LogRotation::Hourly => {
            tracing_appender::rolling::hourly(&config.file_dir, &config.file_prefix)
        }
        LogRotation::Daily => tracing_appender::rolling::daily(&config.file_dir, &config.file_prefix),
        LogRotation::Never => tracing_appender::rolling::never(&config.file_dir, &config.file_prefix),
    }
}

/// Install the global subscriber
///
/// The returned guard must be kept alive for the duration of the program so
/// buffered file logs are flushed on exit.
pub fn init(config: &LoggingConfig) -> Option<WorkerGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(config).into());

    let mut guard = None;
    let file_layer = if config.file_enabled {
        match std::fs::create_dir_all(&config.file_dir) {
            Ok(()) => {
                // Writes happen on a background thread
                let (non_blocking, file_guard) = tracing_appender::non_blocking(file_appender(config));
                guard = Some(file_guard);
                Some(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking)
                        .with_ansi(false),
                )
            }
            Err(e) => {
                // Subscriber is not up yet
                eprintln!(
                    "Warning: Could not create log directory {:?}: {}",
                    config.file_dir, e
                );
                None
            }
        }
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    guard
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_uses_configured_level() {
        let config = LoggingConfig {
            level: "debug".to_string(),
            ..Default::default()
        };
        assert_eq!(default_filter(&config), "usage_relay=debug,tower_http=info");
    }
}

//! Observability configuration: diagnostic logging and telemetry events
//!
//! Two separate outputs are configured here:
//! - Logging: `tracing` diagnostics (level, optional rotating file)
//! - Events: the JSONL telemetry stream (`request`, `response_stream`, `usage_report`)

use serde::Deserialize;
use std::path::PathBuf;

// ─────────────────────────────────────────────────────────────────────────────
// Log Rotation
// ─────────────────────────────────────────────────────────────────────────────

/// Log file rotation strategy
#[derive(Debug, Clone, Default, PartialEq)]
pub enum LogRotation {
    /// Rotate log files hourly
    Hourly,
    /// Rotate log files daily (default)
    #[default]
    Daily,
    /// Never rotate - single log file
    Never,
}

impl LogRotation {
    /// Parse rotation string from config
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "hourly" => Self::Hourly,
            "never" => Self::Never,
            _ => Self::Daily,
        }
    }

    /// Convert to string for TOML serialization
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hourly => "hourly",
            Self::Daily => "daily",
            Self::Never => "never",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Logging Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Diagnostic logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Enable file logging (in addition to stderr)
    pub file_enabled: bool,
    /// Directory for log files
    pub file_dir: PathBuf,
    /// Log file rotation strategy
    pub file_rotation: LogRotation,
    /// Prefix for log file names (e.g., "usage-relay" -> "usage-relay.2024-01-15")
    pub file_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_enabled: false,
            file_dir: PathBuf::from("./logs/trace"),
            file_rotation: LogRotation::Daily,
            file_prefix: "usage-relay".to_string(),
        }
    }
}

/// Logging settings as loaded from config file
#[derive(Debug, Deserialize, Default)]
pub struct FileLogging {
    pub level: Option<String>,
    pub file_enabled: Option<bool>,
    pub file_dir: Option<String>,
    pub file_rotation: Option<String>,
    pub file_prefix: Option<String>,
}

impl LoggingConfig {
    /// Create from file config with defaults
    pub fn from_file(file: Option<FileLogging>) -> Self {
        let file = file.unwrap_or_default();
        let defaults = Self::default();

        Self {
            level: file.level.unwrap_or(defaults.level),
            file_enabled: file.file_enabled.unwrap_or(defaults.file_enabled),
            file_dir: file
                .file_dir
                .map(PathBuf::from)
                .unwrap_or(defaults.file_dir),
            file_rotation: file
                .file_rotation
                .map(|s| LogRotation::parse(&s))
                .unwrap_or(defaults.file_rotation),
            file_prefix: file.file_prefix.unwrap_or(defaults.file_prefix),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Telemetry Events
// ─────────────────────────────────────────────────────────────────────────────

/// Whether telemetry events are emitted at all
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogMode {
    /// Emit request/response/usage metadata (never bodies)
    #[default]
    Metadata,
    /// Emit nothing
    Off,
}

impl LogMode {
    /// Unknown values fall back to `Metadata`
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "off" => Self::Off,
            _ => Self::Metadata,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Metadata => "metadata",
            Self::Off => "off",
        }
    }

    pub fn is_enabled(&self) -> bool {
        *self != Self::Off
    }
}

/// Telemetry event output configuration
#[derive(Debug, Clone)]
pub struct EventsConfig {
    pub mode: LogMode,
    /// Append events to this JSONL file instead of stdout
    pub path: Option<PathBuf>,
    /// Events buffered before new ones are dropped
    pub channel_buffer: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            mode: LogMode::Metadata,
            path: None,
            channel_buffer: 1000,
        }
    }
}

/// `[events]` section as loaded from config file
#[derive(Debug, Deserialize, Default)]
pub struct FileEvents {
    pub mode: Option<String>,
    pub path: Option<String>,
    pub channel_buffer: Option<usize>,
}

impl EventsConfig {
    /// Create from file config, with env overrides for mode and path
    pub fn from_file(
        file: Option<FileEvents>,
        env_mode: Option<String>,
        env_path: Option<String>,
    ) -> Self {
        let file = file.unwrap_or_default();
        let defaults = Self::default();

        Self {
            mode: env_mode
                .or(file.mode)
                .map(|s| LogMode::parse(&s))
                .unwrap_or(defaults.mode),
            path: env_path
                .or(file.path)
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            channel_buffer: file
                .channel_buffer
                .filter(|n| *n > 0)
                .unwrap_or(defaults.channel_buffer),
        }
    }
}

//! Configuration for the relay
//!
//! Configuration is loaded in order of precedence:
//! 1. Environment variables (highest priority)
//! 2. Config file (~/.config/usage-relay/config.toml)
//! 3. Built-in defaults (lowest priority)
//!
//! The result is built once at startup and shared read-only behind an `Arc`.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;

// ─────────────────────────────────────────────────────────────────────────────
// Submodules
// ─────────────────────────────────────────────────────────────────────────────

mod observability;
mod serialization;
mod upstream;


// ─────────────────────────────────────────────────────────────────────────────
// Re-exports
// ─────────────────────────────────────────────────────────────────────────────

pub use observability::{
    EventsConfig, FileEvents, FileLogging, LogMode, LogRotation, LoggingConfig,
};
pub use upstream::{default_user_agent, FileUpstream, UpstreamConfig, DEFAULT_API_URL};

// ─────────────────────────────────────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────────────────────────────────────

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

const DEFAULT_BIND: &str = "0.0.0.0:8000";

// ─────────────────────────────────────────────────────────────────────────────
// Application Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Address to bind the relay to
    pub bind_addr: SocketAddr,

    /// Upstream API location and credentials
    pub upstream: UpstreamConfig,

    /// Telemetry event output
    pub events: EventsConfig,

    /// Diagnostic logging configuration
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            upstream: UpstreamConfig {
                api_url: DEFAULT_API_URL.to_string(),
                ..Default::default()
            },
            events: EventsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// File Configuration (deserialization layer)
// ─────────────────────────────────────────────────────────────────────────────

/// Config file structure
#[derive(Debug, Deserialize, Default)]
pub(crate) struct FileConfig {
    pub bind_addr: Option<String>,

    /// Optional [upstream] section
    pub upstream: Option<FileUpstream>,

    /// Optional [events] section
    pub events: Option<FileEvents>,

    /// Optional [logging] section
    pub logging: Option<FileLogging>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Configuration Loading
// ─────────────────────────────────────────────────────────────────────────────

impl Config {
    /// Get the config file path: ~/.config/usage-relay/config.toml
    /// Uses Unix-style ~/.config on all platforms for consistency
    pub fn config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|p| p.join(".config").join("usage-relay").join("config.toml"))
    }

    /// Create config file with defaults if it doesn't exist
    pub fn ensure_config_exists() {
        let Some(path) = Self::config_path() else {
            return;
        };

        if path.exists() {
            return;
        }

        if let Some(parent) = path.parent() {
            if std::fs::create_dir_all(parent).is_err() {
                return; // Config is optional
            }
        }

        let _ = std::fs::write(&path, Self::default().to_toml());
    }

    /// Load file config if it exists
    ///
    /// A file that exists but does not parse is an error: silently falling back
    /// to defaults would point the relay at the wrong upstream.
    fn load_file_config() -> Result<FileConfig> {
        let Some(path) = Self::config_path() else {
            return Ok(FileConfig::default());
        };

        match std::fs::read_to_string(&path) {
            Ok(contents) => toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(FileConfig::default()),
            Err(e) => Err(e)
                .with_context(|| format!("Failed to read config file {}", path.display())),
        }
    }

    /// Load configuration: env vars -> file -> defaults
    pub fn load() -> Result<Self> {
        let file = Self::load_file_config()?;
        Self::from_sources(file, &|key| std::env::var(key).ok())
    }

    /// Build configuration from an already-parsed file and an env lookup
    pub(crate) fn from_sources(
        file: FileConfig,
        env: &dyn Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        // Bind address: env > file > default
        let bind_raw = env("RELAY_BIND")
            .or(file.bind_addr)
            .unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind_addr = bind_raw
            .parse()
            .with_context(|| format!("Invalid bind address: {}", bind_raw))?;

        let upstream = UpstreamConfig::from_file(file.upstream, env);
        let events = EventsConfig::from_file(file.events, env("LOG_MODE"), env("RELAY_EVENT_LOG"));
        let logging = LoggingConfig::from_file(file.logging);

        Ok(Self {
            bind_addr,
            upstream,
            events,
            logging,
        })
    }
}

// Storage module - the telemetry event sink
//
// Events are written in JSON Lines format: one JSON object per line, so the
// stream can be piped into jq, a log shipper, or appended to a file.
//
// The proxy side holds an `EventSink` (cheap to clone, never blocks). A single
// `EventWriter` task owns the receiving end and does the actual I/O.

use crate::config::{EventsConfig, LogMode};
use crate::events::ProxyEvent;
use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// Handle used by request handlers to emit telemetry
///
/// Emission is fire-and-forget: a slow writer drops events rather than
/// stalling a response stream.
#[derive(Clone, Debug)]
pub struct EventSink {
    tx: Option<mpsc::Sender<ProxyEvent>>,
}

impl EventSink {
    /// A sink that discards everything (`LOG_MODE=off`)
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    pub fn emit(&self, event: ProxyEvent) {
        let Some(tx) = &self.tx else {
            return;
        };

        match tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                tracing::warn!(event = event.kind(), "Event channel full, dropping event");
            }
            Err(TrySendError::Closed(_)) => {
                tracing::debug!("Event writer stopped, dropping event");
            }
        }
    }
}

/// Create a connected sink/receiver pair
pub fn event_channel(buffer: usize) -> (EventSink, mpsc::Receiver<ProxyEvent>) {
    let (tx, rx) = mpsc::channel(buffer.max(1));
    (EventSink { tx: Some(tx) }, rx)
}

/// Where events end up
enum Output {
    Stdout,
    File(PathBuf),
}

/// Background task that writes events as they arrive
pub struct EventWriter {
    output: Output,
    event_rx: mpsc::Receiver<ProxyEvent>,
}

impl EventWriter {
    /// Write events to stdout
    pub fn stdout(event_rx: mpsc::Receiver<ProxyEvent>) -> Self {
        Self {
            output: Output::Stdout,
            event_rx,
        }
    }

    /// Append events to a JSONL file, creating its directory if needed
    pub fn file(path: PathBuf, event_rx: mpsc::Receiver<ProxyEvent>) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).context("Failed to create event log directory")?;
        }

        Ok(Self {
            output: Output::File(path),
            event_rx,
        })
    }

    /// Run until every `EventSink` has been dropped
    pub async fn run(mut self) -> Result<()> {
        match &self.output {
            Output::Stdout => tracing::debug!("Event writer started (stdout)"),
            Output::File(path) => tracing::info!("Event writer started: {}", path.display()),
        }

        while let Some(event) = self.event_rx.recv().await {
            if let Err(e) = self.write_event(&event) {
                tracing::error!("Failed to write event: {:?}", e);
                // Keep going; one failed write should not stop telemetry
            }
        }

        tracing::debug!("Event writer shutting down");
        Ok(())
    }

    fn write_event(&self, event: &ProxyEvent) -> Result<()> {
        let json = serde_json::to_string(event).context("Failed to serialize event")?;

        match &self.output {
            Output::Stdout => {
                let mut out = std::io::stdout().lock();
                writeln!(out, "{}", json).context("Failed to write to stdout")?;
                out.flush().context("Failed to flush stdout")?;
            }
            Output::File(path) => append_line(path, &json)?,
        }

        Ok(())
    }
}

fn append_line(path: &Path, line: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .context("Failed to open event log file")?;

    writeln!(file, "{}", line).context("Failed to write to event log file")?;

    // Flush immediately so events are visible even if the process crashes
    file.flush().context("Failed to flush event log file")?;

    Ok(())
}

/// Build the sink and, unless events are off, the writer that drains it
pub fn from_config(config: &EventsConfig) -> Result<(EventSink, Option<EventWriter>)> {
    if config.mode == LogMode::Off {
        return Ok((EventSink::disabled(), None));
    }

    let (sink, rx) = event_channel(config.channel_buffer);
    let writer = match &config.path {
        Some(path) => EventWriter::file(path.clone(), rx)?,
        None => EventWriter::stdout(rx),
    };
    Ok((sink, Some(writer)))
}

// SSE (Server-Sent Events) sniffing module
//
// The relay never rewrites the upstream stream. It only watches it pass by to
// find usage accounting. That takes two pieces:
//
// 1. **Framing** (`FrameBuffer`): split the raw byte stream on the blank-line
//    frame terminator, carrying any unterminated tail across chunks.
//
// 2. **Extraction** (`extract_usage`): pull `model` and `usage` out of a
//    completed frame's `data:` payload.
//
// OpenAI-compatible streams look like:
// ```
// : OPENROUTER PROCESSING
//
// data: {"id":"gen-1","model":"openai/gpt-4o","choices":[...]}
//
// data: {"id":"gen-1","model":"openai/gpt-4o","choices":[],"usage":{...}}
//
// data: [DONE]
// ```

mod sniffer;

pub use sniffer::{SniffContext, UsageSniffer};

use serde_json::Value;

/// Largest unterminated tail held before sniffing gives up on a response
pub const MAX_PENDING_BYTES: usize = 1024 * 1024;

const FRAME_TERMINATOR: &[u8] = b"\n\n";
const DONE_SENTINEL: &str = "[DONE]";

// ============================================================================
// Framing
// ============================================================================

/// Incremental SSE framer
///
/// Holds only bytes that have not yet been terminated by `\n\n`. Frames are
/// cut on raw bytes and then decoded lossily, so a multi-byte character split
/// across two chunks still decodes correctly.
#[derive(Debug, Default)]
pub struct FrameBuffer {
    pending: Vec<u8>,
    overflowed: bool,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return every frame it completed
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        if self.overflowed {
            return Vec::new();
        }

        // A terminator may straddle the previous tail and this chunk
        let mut search_from = self.pending.len().saturating_sub(FRAME_TERMINATOR.len() - 1);
        self.pending.extend_from_slice(chunk);

        let mut frames = Vec::new();
        let mut consumed = 0;
        while let Some(pos) = find_terminator(&self.pending[search_from..]) {
            let end = search_from + pos;
            frames.push(String::from_utf8_lossy(&self.pending[consumed..end]).into_owned());
            consumed = end + FRAME_TERMINATOR.len();
            search_from = consumed;
        }
        self.pending.drain(..consumed);

        if self.pending.len() > MAX_PENDING_BYTES {
            tracing::debug!(
                pending = self.pending.len(),
                "No SSE frame boundary within limit, sniffing stopped for this response"
            );
            self.overflowed = true;
            self.pending = Vec::new();
        }

        frames
    }

    /// Take the unterminated tail once the stream has ended
    pub fn finish(&mut self) -> Option<String> {
        if self.overflowed || self.pending.is_empty() {
            return None;
        }
        let tail = std::mem::take(&mut self.pending);
        Some(String::from_utf8_lossy(&tail).into_owned())
    }

    #[cfg(test)]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    #[cfg(test)]
    pub fn is_overflowed(&self) -> bool {
        self.overflowed
    }
}

fn find_terminator(buf: &[u8]) -> Option<usize> {
    buf.windows(FRAME_TERMINATOR.len())
        .position(|w| w == FRAME_TERMINATOR)
}

// ============================================================================
// Extraction
// ============================================================================

/// What a single frame told us
#[derive(Debug, Clone, PartialEq)]
pub enum SniffOutcome {
    /// Frame carried usage accounting
    Usage { model: String, usage: Value },
    /// End-of-stream sentinel
    Done,
    /// Comment, keep-alive, content delta, or anything unparseable
    NoUsage,
}

const DATA_PREFIX: &str = "data: ";

/// Inspect one complete frame for usage data. Never fails.
///
/// Only frames that begin with `data: ` are considered; the rest of the frame
/// is trimmed and parsed as a single JSON document.
pub fn extract_usage(frame: &str) -> SniffOutcome {
    let Some(data) = frame.strip_prefix(DATA_PREFIX) else {
        return SniffOutcome::NoUsage;
    };

    let data = data.trim();
    if data.is_empty() {
        return SniffOutcome::NoUsage;
    }
    if data == DONE_SENTINEL {
        return SniffOutcome::Done;
    }

    let Ok(payload) = serde_json::from_str::<Value>(data) else {
        return SniffOutcome::NoUsage;
    };

    // Opaque payload: any value under `usage`, null included, is reported as-is
    match payload.get("usage") {
        Some(usage) => SniffOutcome::Usage {
            model: payload
                .get("model")
                .and_then(|m| m.as_str())
                .unwrap_or("")
                .to_string(),
            usage: usage.clone(),
        },
        None => SniffOutcome::NoUsage,
    }
}

//! Pass-through stream wrapper that reports usage as frames go by

use std::fmt::Display;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::Stream;

use crate::events::ProxyEvent;
use crate::storage::EventSink;

use super::{extract_usage, FrameBuffer, SniffOutcome};

/// Per-response attribution for usage events
#[derive(Debug, Clone)]
pub struct SniffContext {
    pub user_id: Option<String>,
    pub path: String,
    pub sink: EventSink,
}

/// Wraps the upstream body. Every chunk is yielded unchanged and in order;
/// sniffing only ever reads a copy.
pub struct UsageSniffer<S> {
    inner: S,
    frames: FrameBuffer,
    context: SniffContext,
    usage_reports: usize,
    finished: bool,
}

impl<S> UsageSniffer<S> {
    pub fn new(inner: S, context: SniffContext) -> Self {
        Self {
            inner,
            frames: FrameBuffer::new(),
            context,
            usage_reports: 0,
            finished: false,
        }
    }

    fn observe(&mut self, frame: &str) {
        if let SniffOutcome::Usage { model, usage } = extract_usage(frame) {
            tracing::debug!(path = %self.context.path, model = %model, "Usage frame observed");
            self.usage_reports += 1;
            self.context.sink.emit(ProxyEvent::UsageReport {
                user_id: self.context.user_id.clone(),
                model,
                usage,
            });
        }
    }

    fn observe_chunk(&mut self, chunk: &[u8]) {
        for frame in self.frames.push(chunk) {
            self.observe(&frame);
        }
    }

    fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        if let Some(tail) = self.frames.finish() {
            self.observe(&tail);
        }
        tracing::debug!(
            path = %self.context.path,
            usage_reports = self.usage_reports,
            "Response stream complete"
        );
    }
}

impl<S, E> Stream for UsageSniffer<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: Display,
{
    type Item = Result<Bytes, E>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match Pin::new(&mut self.inner).poll_next(cx) {
            Poll::Ready(Some(Ok(chunk))) => {
                self.observe_chunk(&chunk);
                Poll::Ready(Some(Ok(chunk)))
            }
            Poll::Ready(Some(Err(e))) => {
                tracing::warn!(path = %self.context.path, "Upstream stream error: {}", e);
                self.finished = true;
                Poll::Ready(Some(Err(e)))
            }
            Poll::Ready(None) => {
                self.finish();
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<S> Drop for UsageSniffer<S> {
    fn drop(&mut self) {
        // Dropped before the upstream ended: the caller went away. Dropping
        // `inner` here closes the upstream connection.
        if !self.finished {
            tracing::debug!(
                path = %self.context.path,
                usage_reports = self.usage_reports,
                "Caller disconnected mid-stream, upstream request cancelled"
            );
        }
    }
}

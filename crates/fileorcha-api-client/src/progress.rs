//! Upload progress reporting.
//!
//! The file part of the multipart body is streamed in fixed-size chunks; each
//! chunk handed to the transport advances the reporter. Reported fractions are
//! monotonically non-decreasing and stay within `[0, 1]`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;

/// Receives the fraction of the file sent so far.
pub type ProgressCallback = Arc<dyn Fn(f64) + Send + Sync>;

pub(crate) const CHUNK_SIZE: usize = 64 * 1024;

/// Fractions are tracked in millionths so the high-water mark fits an atomic.
const SCALE: f64 = 1_000_000.0;

#[derive(Clone)]
pub struct ProgressReporter {
    inner: Arc<Inner>,
}

struct Inner {
    total: u64,
    sent: AtomicU64,
    /// Highest fraction reported, in millionths; `u64::MAX` before the first report.
    reported: AtomicU64,
    callback: Option<ProgressCallback>,
}

impl ProgressReporter {
    pub fn new(total: u64, callback: Option<ProgressCallback>) -> Self {
        Self {
            inner: Arc::new(Inner {
                total,
                sent: AtomicU64::new(0),
                reported: AtomicU64::new(u64::MAX),
                callback,
            }),
        }
    }

    /// Record `bytes` more handed to the transport.
    pub fn advance(&self, bytes: u64) {
        let sent = self.inner.sent.fetch_add(bytes, Ordering::SeqCst) + bytes;
        self.emit(self.fraction_for(sent));
    }

    /// Report completion once the server accepted the upload.
    pub fn finish(&self) {
        self.emit(1.0);
    }

    fn fraction_for(&self, sent: u64) -> f64 {
        if self.inner.total == 0 {
            1.0
        } else {
            (sent as f64 / self.inner.total as f64).clamp(0.0, 1.0)
        }
    }

    fn emit(&self, fraction: f64) {
        let scaled = (fraction * SCALE).round() as u64;
        let previous = self
            .inner
            .reported
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                (current == u64::MAX || scaled > current).then_some(scaled)
            });
        if previous.is_ok() {
            if let Some(callback) = &self.inner.callback {
                callback(scaled as f64 / SCALE);
            }
        }
    }
}

/// Split `bytes` into transport chunks without copying.
pub(crate) fn chunked(bytes: &Bytes, chunk_size: usize) -> Vec<Bytes> {
    let mut chunks = Vec::with_capacity(bytes.len() / chunk_size + 1);
    let mut start = 0;
    while start < bytes.len() {
        let end = (start + chunk_size).min(bytes.len());
        chunks.push(bytes.slice(start..end));
        start = end;
    }
    chunks
}

/// Body for the multipart file part that advances `reporter` as it is polled.
pub(crate) fn progress_body(bytes: &Bytes, reporter: ProgressReporter) -> reqwest::Body {
    let chunks = chunked(bytes, CHUNK_SIZE);
    let stream = futures::stream::iter(chunks.into_iter().map(move |chunk| {
        reporter.advance(chunk.len() as u64);
        Ok::<Bytes, std::io::Error>(chunk)
    }));
    reqwest::Body::wrap_stream(stream)
}

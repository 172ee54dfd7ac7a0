//! A capture session: one source, an optional sink and a frame count.

use tracing::debug;

use crate::capture::{CaptureSource, PcapSink};
use crate::domain::Frame;
use crate::error::CaptureError;

/// Owns everything that needs releasing when a capture ends.
///
/// `close` is the single teardown path. It runs at most once, whether it
/// is called after the count bound, after an interruption, on an error,
/// or from `Drop`.
pub struct CaptureSession<S: CaptureSource> {
    source: S,
    sink: Option<PcapSink>,
    count: u64,
    closed: bool,
}

impl<S: CaptureSource> CaptureSession<S> {
    pub fn new(source: S, sink: Option<PcapSink>) -> Self {
        Self {
            source,
            sink,
            count: 0,
            closed: false,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Frames recorded so far.
    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Count a frame and append it to the sink, if there is one.
    pub fn record(&mut self, frame: &Frame) -> Result<u64, CaptureError> {
        if let Some(sink) = self.sink.as_mut() {
            sink.append(frame)?;
        }
        self.count += 1;
        Ok(self.count)
    }

    /// Close source and sink. Returns the final frame count.
    pub fn close(&mut self) -> u64 {
        if !self.closed {
            self.closed = true;
            self.source.close();
            if let Some(sink) = self.sink.as_mut() {
                sink.close();
            }
            debug!(count = self.count, "capture session closed");
        }
        self.count
    }
}

impl<S: CaptureSource> Drop for CaptureSession<S> {
    fn drop(&mut self) {
        self.close();
    }
}

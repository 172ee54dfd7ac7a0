//! Daintree SNA capture (`.dcf`) reader.
//!
//! A text format: a `#Format=` header line, more `#` comment lines, then
//! one record per line. Each record starts with the frame index, a
//! timestamp in seconds, the frame length and the frame bytes in hex,
//! followed by radio metadata columns this reader ignores.

use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;

use super::{CaptureSource, FrameRead};
use crate::domain::Frame;
use crate::error::CaptureError;

const FORMAT_PREFIX: &[u8] = b"#Format=";

/// Reads frames from a Daintree SNA capture.
pub struct DaintreeReader<R> {
    reader: Option<R>,
    path: PathBuf,
    line_number: u64,
}

impl<R: BufRead> DaintreeReader<R> {
    /// Whether `head` looks like the start of a Daintree capture.
    pub fn is_daintree(head: &[u8]) -> bool {
        head.starts_with(FORMAT_PREFIX)
    }

    pub fn from_reader(reader: R, path: &Path) -> Result<Self, CaptureError> {
        Ok(Self {
            reader: Some(reader),
            path: path.to_path_buf(),
            line_number: 0,
        })
    }

    fn read_record(&mut self) -> Result<Option<Frame>, CaptureError> {
        let mut line = Vec::new();
        loop {
            let Some(reader) = self.reader.as_mut() else {
                return Ok(None);
            };

            line.clear();
            let read = reader
                .read_until(b'\n', &mut line)
                .map_err(|e| CaptureError::file(&self.path, e))?;
            if read == 0 {
                return Ok(None);
            }
            self.line_number += 1;

            let Ok(text) = std::str::from_utf8(&line) else {
                debug!(line = self.line_number, "skipping non-UTF-8 Daintree line");
                continue;
            };
            let record = text.trim();
            if record.is_empty() || record.starts_with('#') {
                continue;
            }

            match parse_record(record) {
                Some(frame) => return Ok(Some(frame)),
                None => debug!(line = self.line_number, "skipping malformed Daintree record"),
            }
        }
    }
}

impl<R: BufRead> CaptureSource for DaintreeReader<R> {
    fn next_frame(&mut self) -> Result<FrameRead, CaptureError> {
        Ok(match self.read_record()? {
            Some(frame) => FrameRead::Frame(frame),
            None => FrameRead::EndOfCapture,
        })
    }

    fn describe(&self) -> String {
        format!("daintree:{}", self.path.display())
    }

    fn close(&mut self) {
        if self.reader.take().is_some() {
            debug!(path = %self.path.display(), "closed Daintree capture");
        }
    }
}

/// Parse `<index> <timestamp> <length> <hex bytes> ...`.
///
/// Daintree records include the FCS.
fn parse_record(record: &str) -> Option<Frame> {
    let mut fields = record.split_whitespace();
    let _index: u64 = fields.next()?.parse().ok()?;
    let seconds: f64 = fields.next()?.parse().ok()?;
    let length: usize = fields.next()?.parse().ok()?;
    let data = decode_hex(fields.next()?)?;

    if data.len() != length {
        return None;
    }

    let timestamp = Duration::try_from_secs_f64(seconds).ok()?;

    Some(Frame::new(data, true).with_timestamp(timestamp))
}

fn decode_hex(text: &str) -> Option<Vec<u8>> {
    if text.len() % 2 != 0 {
        return None;
    }
    (0..text.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(text.get(i..i + 2)?, 16).ok())
        .collect()
}

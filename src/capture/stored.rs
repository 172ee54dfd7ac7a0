//! Stored capture files, with format detection.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::info;

use super::daintree::DaintreeReader;
use super::pcap::PcapReader;
use super::{CaptureSource, FrameRead};
use crate::error::CaptureError;

/// A capture file being replayed: libpcap first, Daintree SNA as fallback.
pub enum StoredCapture<R: BufRead = BufReader<File>> {
    Pcap(PcapReader<R>),
    Daintree(DaintreeReader<R>),
}

impl StoredCapture<BufReader<File>> {
    /// Open a capture file, picking the reader from the file header.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CaptureError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| CaptureError::file(path, e))?;
        Self::from_reader(BufReader::new(file), path)
    }
}

impl<R: BufRead> StoredCapture<R> {
    /// Sniff the header of `reader` and wrap it in the matching reader.
    pub fn from_reader(mut reader: R, path: &Path) -> Result<Self, CaptureError> {
        let head = reader.fill_buf().map_err(|e| CaptureError::file(path, e))?;

        if PcapReader::<R>::is_pcap(head) {
            info!(path = %path.display(), "reading pcap capture");
            return Ok(Self::Pcap(PcapReader::from_reader(reader, path)?));
        }

        if DaintreeReader::<R>::is_daintree(head) {
            info!(path = %path.display(), "not a pcap file, reading as Daintree SNA");
            return Ok(Self::Daintree(DaintreeReader::from_reader(reader, path)?));
        }

        Err(CaptureError::unreadable(
            path,
            "neither a pcap nor a Daintree SNA capture",
        ))
    }
}

impl<R: BufRead> CaptureSource for StoredCapture<R> {
    fn next_frame(&mut self) -> Result<FrameRead, CaptureError> {
        match self {
            Self::Pcap(reader) => reader.next_frame(),
            Self::Daintree(reader) => reader.next_frame(),
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::Pcap(reader) => reader.describe(),
            Self::Daintree(reader) => reader.describe(),
        }
    }

    fn close(&mut self) {
        match self {
            Self::Pcap(reader) => reader.close(),
            Self::Daintree(reader) => reader.close(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    #[test]
    fn test_unrecognised_header_fails() {
        let result = StoredCapture::from_reader(
            Cursor::new(b"GIF89a not a capture".to_vec()),
            Path::new("image.gif"),
        );
        assert!(matches!(result, Err(CaptureError::UnreadableCapture { .. })));
    }

    #[test]
    fn test_empty_file_fails() {
        let result = StoredCapture::from_reader(Cursor::new(Vec::new()), Path::new("empty"));
        assert!(matches!(result, Err(CaptureError::UnreadableCapture { .. })));
    }

    #[test]
    fn test_daintree_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("capture.dcf");
        let mut file = File::create(&path).unwrap();
        write!(file, "#Format=4\r\n1 0.5 3 020001 255 1\r\n").unwrap();
        drop(file);

        let mut capture = StoredCapture::open(&path).unwrap();
        assert!(matches!(capture, StoredCapture::Daintree(_)));
        assert!(matches!(capture.next_frame().unwrap(), FrameRead::Frame(_)));
        assert_eq!(capture.next_frame().unwrap(), FrameRead::EndOfCapture);
        capture.close();
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = StoredCapture::open(dir.path().join("nope.pcap"));
        assert!(matches!(result, Err(CaptureError::File { .. })));
    }
}

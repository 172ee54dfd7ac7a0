use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort a capture run.
///
/// Per-frame decode failures never show up here; those frames are skipped.
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Interface error: {0}")]
    Interface(String),

    #[error("Channel {channel} is not a valid IEEE 802.15.4 channel for device {device}")]
    InvalidChannel { channel: u8, device: String },

    #[error("Unreadable capture {path}: {reason}")]
    UnreadableCapture { path: PathBuf, reason: String },

    #[error("Capture file {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("pcap file {path}: {source}")]
    Pcap {
        path: PathBuf,
        #[source]
        source: pcap_file::PcapError,
    },

    #[error("Link type {0} cannot be written by the pcap sink")]
    UnsupportedLinkType(u32),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CaptureError {
    pub(crate) fn unreadable(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        CaptureError::UnreadableCapture {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn pcap(path: impl Into<PathBuf>, source: pcap_file::PcapError) -> Self {
        CaptureError::Pcap {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CaptureError::File {
            path: path.into(),
            source,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config error: {0}")]
    Invalid(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

//! zbsniff - ZigBee network key sniffer
//!
//! Captures IEEE 802.15.4 frames from a radio or reads them from a capture
//! file, decodes the MAC, NWK and APS layers and recovers network keys sent
//! in plaintext APS Transport Key commands.

pub mod capture;
pub mod config;
pub mod controller;
pub mod detector;
pub mod domain;
pub mod error;
pub mod extractor;
pub mod parser;
pub mod pipeline;
pub mod reporter;
pub mod utils;

pub use capture::{CaptureSource, FrameRead, LiveRadioSource, PcapSink, StoredCapture};
pub use config::Config;
pub use controller::{CaptureSummary, SniffController, SniffState, StopReason, StopSignal};
pub use domain::{Frame, KeyEvent, KeyMaterial, SuspiciousKeyEvent};
pub use error::{CaptureError, ConfigError};
pub use pipeline::{FrameOutcome, KeyScanner};
pub use reporter::{ConsoleReporter, KeyReporter};

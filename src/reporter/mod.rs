//! Reporting module for recovered keys.
//!
//! This module defines the `KeyReporter` trait and provides a console
//! implementation. Reports are the tool's output, so they go to stdout
//! rather than through the logger.

mod console_reporter;

pub use console_reporter::ConsoleReporter;

use crate::domain::{KeyEvent, SuspiciousKeyEvent};

/// Trait for reporting sniffing results.
pub trait KeyReporter {
    /// Report a recovered network key.
    fn report(&self, event: &KeyEvent);

    /// Report a plaintext Transport Key with an unexpected key type.
    fn report_suspicious(&self, event: &SuspiciousKeyEvent);

    /// Called when a live capture starts listening.
    fn on_listen(&self, device: &str, channel: u8);

    /// Called when a live capture ends.
    fn on_capture_end(&self, packet_count: u64);

    /// Called before a stored capture is processed.
    fn on_file_start(&self, path: &str);

    /// Called after a stored capture has been fully processed.
    fn on_file_end(&self, frame_count: u64);
}

//! Console-based key reporter.

use std::io::{self, Write};

use crate::domain::{KeyEvent, SuspiciousKeyEvent};
use crate::reporter::KeyReporter;

/// Reports recovered keys to the console.
pub struct ConsoleReporter {
    /// Whether to show frame position and signal strength
    verbose: bool,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self { verbose: false }
    }

    /// Enable or disable verbose output.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    fn format_event(&self, event: &KeyEvent) -> String {
        let key = &event.key;
        let mut output = String::new();

        if self.verbose {
            let rssi = event
                .rssi_dbm
                .map(|r| format!("{} dBm", r))
                .unwrap_or_else(|| "N/A".to_string());
            output.push_str(&format!(
                "Frame {} | RSSI: {} | Key sequence: {}\n",
                event.frame_index, rssi, key.sequence_number
            ));
        }

        output.push_str(&format!("NETWORK KEY FOUND:          {}\n", key.network_key_hex()));
        output.push_str(&format!("      (Wireshark):          {}\n", key.wire_key_hex()));
        output.push_str(&format!("  Destination MAC Address:  {}\n", key.destination_hex()));
        output.push_str(&format!("  Source MAC Address:       {}", key.source_hex()));

        output
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyReporter for ConsoleReporter {
    fn report(&self, event: &KeyEvent) {
        let output = self.format_event(event);
        let mut stdout = io::stdout().lock();
        let _ = writeln!(stdout, "{}", output);
    }

    fn report_suspicious(&self, event: &SuspiciousKeyEvent) {
        println!(
            "Possible key or false positive? Frame {} carries key type {:#04x}",
            event.frame_index, event.key_type
        );
    }

    fn on_listen(&self, device: &str, channel: u8) {
        println!(
            "\nListening on '{}', link-type IEEE802_15_4, capture size 127 bytes, channel {}",
            device, channel
        );
        println!("Press Ctrl+C to stop.\n");
    }

    fn on_capture_end(&self, packet_count: u64) {
        println!("{} packets captured", packet_count);
    }

    fn on_file_start(&self, path: &str) {
        println!("\nProcessing {}", path);
    }

    fn on_file_end(&self, frame_count: u64) {
        println!("Processed captured file ({} frames).", frame_count);
    }
}

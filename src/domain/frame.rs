//! Captured IEEE 802.15.4 frames.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::utils::{channel_frequency_mhz, crc16_kermit};

/// Length of the IEEE 802.15.4 frame check sequence
pub const FCS_LEN: usize = 2;

/// A single frame as it came off the radio or out of a capture file.
///
/// The FCS state is informational only. Capture is promiscuous, so frames
/// with a bad checksum are still decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// The PSDU, including the FCS when `fcs_present` is set
    pub data: Vec<u8>,
    /// Whether the last two bytes of `data` are the FCS
    pub fcs_present: bool,
    /// Received signal strength in dBm, when the source reports it
    pub rssi_dbm: Option<i8>,
    /// Channel the frame was received on, when known
    pub channel: Option<u8>,
    /// Capture time since the Unix epoch
    pub timestamp: Duration,
}

impl Frame {
    /// Create a frame stamped with the current time.
    pub fn new(data: Vec<u8>, fcs_present: bool) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();

        Self {
            data,
            fcs_present,
            rssi_dbm: None,
            channel: None,
            timestamp,
        }
    }

    pub fn with_rssi(mut self, rssi_dbm: i8) -> Self {
        self.rssi_dbm = Some(rssi_dbm);
        self
    }

    pub fn with_channel(mut self, channel: u8) -> Self {
        self.channel = Some(channel);
        self
    }

    pub fn with_timestamp(mut self, timestamp: Duration) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// The MAC frame without its FCS.
    pub fn mpdu(&self) -> &[u8] {
        if self.fcs_present && self.data.len() >= FCS_LEN {
            &self.data[..self.data.len() - FCS_LEN]
        } else {
            &self.data
        }
    }

    /// Checksum state of the frame.
    ///
    /// Returns `None` when the source did not capture the FCS.
    pub fn fcs_valid(&self) -> Option<bool> {
        if !self.fcs_present {
            return None;
        }
        if self.data.len() < FCS_LEN {
            return Some(false);
        }
        let split = self.data.len() - FCS_LEN;
        let expected = u16::from_le_bytes([self.data[split], self.data[split + 1]]);
        Some(crc16_kermit(&self.data[..split]) == expected)
    }

    /// RF center frequency of the capture channel.
    pub fn frequency_mhz(&self) -> Option<u32> {
        self.channel.map(channel_frequency_mhz)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Append a valid FCS to an MPDU.
pub fn append_fcs(mpdu: &[u8]) -> Vec<u8> {
    let mut data = mpdu.to_vec();
    data.extend_from_slice(&crc16_kermit(mpdu).to_le_bytes());
    data
}

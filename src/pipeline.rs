//! Per-frame key scanning: MAC → NWK → APS → Transport Key → key material.

use tracing::{debug, warn};

use crate::detector::{Detection, TransportKeyDetector};
use crate::domain::{Frame, KeyMaterial};
use crate::extractor::KeyExtractor;
use crate::parser::{ApsParser, MacParser, NwkParser};

/// What scanning one frame produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Undecodable, or not a plaintext Transport Key
    Skipped,
    /// Plaintext Transport Key carrying a non-network key type
    SuspiciousKeyType(u8),
    /// Plaintext network key
    Key(KeyMaterial),
}

/// Runs frames through every layer decoder, the detector and the extractor.
#[derive(Default)]
pub struct KeyScanner {
    mac: MacParser,
    nwk: NwkParser,
    aps: ApsParser,
    detector: TransportKeyDetector,
    extractor: KeyExtractor,
}

impl KeyScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan a single frame. Never fails: anything unexpected is skipped.
    pub fn scan(&self, frame: &Frame) -> FrameOutcome {
        let Some(mac) = self.mac.parse(frame) else {
            debug!(len = frame.len(), "skipping frame: no MAC data payload");
            return FrameOutcome::Skipped;
        };
        let Some(nwk) = self.nwk.parse(mac.payload) else {
            debug!(src = %mac.src_addr, "skipping frame: no NWK data payload");
            return FrameOutcome::Skipped;
        };
        let Some(aps) = self.aps.parse(nwk.payload) else {
            debug!(nwk_src = nwk.src_addr, "skipping frame: no APS payload");
            return FrameOutcome::Skipped;
        };

        match self.detector.detect(&aps) {
            Detection::Ignored => FrameOutcome::Skipped,
            Detection::UnexpectedKeyType(key_type) => {
                warn!(
                    key_type,
                    nwk_src = nwk.src_addr,
                    "plaintext Transport Key with unexpected key type, possible key or false positive"
                );
                FrameOutcome::SuspiciousKeyType(key_type)
            }
            Detection::NetworkKey(payload) => match self.extractor.extract(payload) {
                Some(key) => FrameOutcome::Key(key),
                None => FrameOutcome::Skipped,
            },
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_frames::*;
    use super::*;

    #[test]
    fn test_scan_finds_network_key() {
        let scanner = KeyScanner::new();
        let frame = transport_key_frame(0x01, 0x01);
        let payload = transport_key_payload(0x01);

        let FrameOutcome::Key(key) = scanner.scan(&frame) else {
            panic!("expected key material");
        };

        let mut expected = payload[2..18].to_vec();
        expected.reverse();
        assert_eq!(key.network_key.to_vec(), expected);
        assert_eq!(key.destination_hex(), "00:12:4b:00:04:03:02:01");
        assert_eq!(key.source_hex(), "00:0d:6f:00:14:13:12:11");
    }

    #[test]
    fn test_bad_fcs_is_still_scanned() {
        let scanner = KeyScanner::new();
        let mut frame = transport_key_frame(0x01, 0x01);
        let last = frame.data.len() - 1;
        frame.data[last] ^= 0xff;

        assert_eq!(frame.fcs_valid(), Some(false));
        assert!(matches!(scanner.scan(&frame), FrameOutcome::Key(_)));
    }

    #[test]
    fn test_security_bit_suppresses_extraction() {
        let scanner = KeyScanner::new();
        assert_eq!(scanner.scan(&transport_key_frame(0x21, 0x01)), FrameOutcome::Skipped);
    }

    #[test]
    fn test_broadcast_delivery_suppresses_extraction() {
        let scanner = KeyScanner::new();
        assert_eq!(scanner.scan(&transport_key_frame(0x09, 0x01)), FrameOutcome::Skipped);
    }

    #[test]
    fn test_unexpected_key_type_is_flagged() {
        let scanner = KeyScanner::new();
        assert_eq!(
            scanner.scan(&transport_key_frame(0x01, 0x02)),
            FrameOutcome::SuspiciousKeyType(0x02)
        );
    }

    #[test]
    fn test_truncated_frames_are_skipped() {
        let scanner = KeyScanner::new();
        let frame = transport_key_frame(0x01, 0x01);
        let mpdu = frame.mpdu().to_vec();

        for len in 0..mpdu.len() {
            let truncated = Frame::new(mpdu[..len].to_vec(), false);
            assert_eq!(scanner.scan(&truncated), FrameOutcome::Skipped, "len {}", len);
        }
    }

    #[test]
    fn test_data_frame_skipped() {
        let scanner = KeyScanner::new();
        assert_eq!(scanner.scan(&data_frame()), FrameOutcome::Skipped);
    }
}

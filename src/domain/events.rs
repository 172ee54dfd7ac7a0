//! Events produced while scanning frames for keys.

use std::time::Duration;

use super::key::KeyMaterial;

/// A network key recovered from a captured frame.
#[derive(Debug, Clone)]
pub struct KeyEvent {
    /// 1-based position of the frame in the capture
    pub frame_index: u64,
    /// Capture time of the frame
    pub timestamp: Duration,
    /// Signal strength of the frame, if recorded
    pub rssi_dbm: Option<i8>,
    /// The recovered key material
    pub key: KeyMaterial,
}

/// A plaintext Transport Key command carrying something other than a
/// network key. Might be a real key, might be a false positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuspiciousKeyEvent {
    /// 1-based position of the frame in the capture
    pub frame_index: u64,
    /// The key type byte found in the command
    pub key_type: u8,
}

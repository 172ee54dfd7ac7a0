//! APS Transport Key command detection.

use crate::parser::{
    ApsFrame, APS_COMMAND_FRAME, APS_DELIVERY_MODE_MASK, APS_FRAME_TYPE_MASK, APS_SECURITY_MASK,
};

/// APS command identifier of Transport Key
pub const TRANSPORT_KEY_COMMAND_ID: u8 = 0x05;
/// Key type of a standard network key
pub const NETWORK_KEY_TYPE: u8 = 0x01;
/// command id + key type + key + sequence number + destination + source
pub const MIN_TRANSPORT_KEY_LEN: usize = 35;

/// Outcome of inspecting an APS frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detection<'a> {
    /// Not a plaintext Transport Key command
    Ignored,
    /// A plaintext Transport Key command with a key type other than the
    /// network key. No other key type should travel unencrypted.
    UnexpectedKeyType(u8),
    /// A plaintext network key Transport Key command payload
    NetworkKey(&'a [u8]),
}

/// Detects plaintext APS Transport Key commands.
pub struct TransportKeyDetector;

impl TransportKeyDetector {
    pub fn new() -> Self {
        Self
    }

    /// Inspect an APS frame.
    ///
    /// Checks run in a fixed order and stop at the first failure.
    pub fn detect<'a>(&self, aps: &ApsFrame<'a>) -> Detection<'a> {
        self.inspect(aps.frame_control, aps.payload)
    }

    /// Inspect a raw APS frame control byte and payload.
    pub fn inspect<'a>(&self, frame_control: u8, payload: &'a [u8]) -> Detection<'a> {
        if frame_control & APS_FRAME_TYPE_MASK != APS_COMMAND_FRAME {
            return Detection::Ignored;
        }

        // Normal unicast delivery only
        if (frame_control & APS_DELIVERY_MODE_MASK) >> 2 != 0 {
            return Detection::Ignored;
        }

        if frame_control & APS_SECURITY_MASK != 0 {
            return Detection::Ignored;
        }

        if payload.len() < MIN_TRANSPORT_KEY_LEN {
            return Detection::Ignored;
        }

        if payload[0] != TRANSPORT_KEY_COMMAND_ID {
            return Detection::Ignored;
        }

        if payload[1] != NETWORK_KEY_TYPE {
            return Detection::UnexpectedKeyType(payload[1]);
        }

        Detection::NetworkKey(payload)
    }
}

impl Default for TransportKeyDetector {
    fn default() -> Self {
        Self::new()
    }
}

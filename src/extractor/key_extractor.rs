//! Transport Key payload slicing.

use macaddr::MacAddr8;

use crate::detector::MIN_TRANSPORT_KEY_LEN;
use crate::domain::{KeyMaterial, KEY_LEN};

/// Payload offsets of a network key Transport Key command
mod offsets {
    pub const KEY: usize = 2;
    pub const SEQUENCE_NUMBER: usize = 18;
    pub const DESTINATION: usize = 19;
    pub const SOURCE: usize = 27;
}

/// Slices key material out of a detected Transport Key payload.
pub struct KeyExtractor;

impl KeyExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract the key, sequence number and addresses.
    ///
    /// Returns `None` for payloads shorter than a Transport Key command, so
    /// partial key material is never produced.
    pub fn extract(&self, payload: &[u8]) -> Option<KeyMaterial> {
        if payload.len() < MIN_TRANSPORT_KEY_LEN {
            return None;
        }

        let mut network_key = [0u8; KEY_LEN];
        network_key.copy_from_slice(&payload[offsets::KEY..offsets::KEY + KEY_LEN]);
        network_key.reverse();

        Some(KeyMaterial {
            network_key,
            sequence_number: payload[offsets::SEQUENCE_NUMBER],
            destination: reversed_eui64(&payload[offsets::DESTINATION..offsets::SOURCE]),
            source: reversed_eui64(&payload[offsets::SOURCE..MIN_TRANSPORT_KEY_LEN]),
        })
    }
}

impl Default for KeyExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn reversed_eui64(wire: &[u8]) -> MacAddr8 {
    let mut octets = [0u8; 8];
    octets.copy_from_slice(wire);
    octets.reverse();
    MacAddr8::from(octets)
}

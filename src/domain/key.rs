//! Network key material recovered from an APS Transport Key command.

use std::fmt;

use macaddr::MacAddr8;

use crate::utils::format_octets;

/// Length of a ZigBee network key
pub const KEY_LEN: usize = 16;

/// Key material carried by a plaintext Transport Key command.
///
/// All multi-byte fields are stored reversed relative to the wire, which
/// is the order ZigBee tools display them in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyMaterial {
    /// The network key
    pub network_key: [u8; KEY_LEN],
    /// Key sequence number
    pub sequence_number: u8,
    /// Extended address of the device receiving the key
    pub destination: MacAddr8,
    /// Extended address of the trust center sending the key
    pub source: MacAddr8,
}

impl KeyMaterial {
    /// The key in on-air byte order, as Wireshark expects it in its key table.
    pub fn wire_key(&self) -> [u8; KEY_LEN] {
        let mut key = self.network_key;
        key.reverse();
        key
    }

    pub fn network_key_hex(&self) -> String {
        format_octets(&self.network_key)
    }

    pub fn wire_key_hex(&self) -> String {
        format_octets(&self.wire_key())
    }

    pub fn destination_hex(&self) -> String {
        format_octets(self.destination.as_bytes())
    }

    pub fn source_hex(&self) -> String {
        format_octets(self.source.as_bytes())
    }
}

impl fmt::Display for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "key {} (seq {}) {} -> {}",
            self.network_key_hex(),
            self.sequence_number,
            self.source_hex(),
            self.destination_hex()
        )
    }
}

//! Layer decoders for IEEE 802.15.4 / ZigBee frames.
//!
//! Each decoder strips its own header and hands back the payload for the
//! next layer. Decoding is total: short, malformed or uninteresting input
//! gives `None`, never an error, since promiscuous captures are full of
//! frames we do not care about.

mod aps_parser;
mod mac_parser;
mod nwk_parser;

pub use aps_parser::{
    ApsFrame, ApsParser, APS_COMMAND_FRAME, APS_DELIVERY_MODE_MASK, APS_FRAME_TYPE_MASK,
    APS_SECURITY_MASK,
};
pub use mac_parser::{MacAddress, MacFrame, MacParser};
pub use nwk_parser::{NwkFrame, NwkParser};

/// Bounds-checked little-endian reader over a byte slice.
struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn u8(&mut self) -> Option<u8> {
        let b = *self.data.get(self.pos)?;
        self.pos += 1;
        Some(b)
    }

    fn u16_le(&mut self) -> Option<u16> {
        let bytes = self.take(2)?;
        Some(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    fn u64_le(&mut self) -> Option<u64> {
        let bytes = self.take(8)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(bytes);
        Some(u64::from_le_bytes(buf))
    }

    fn take(&mut self, len: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(len)?;
        let bytes = self.data.get(self.pos..end)?;
        self.pos = end;
        Some(bytes)
    }

    fn skip(&mut self, len: usize) -> Option<()> {
        self.take(len).map(|_| ())
    }

    fn rest(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }
}

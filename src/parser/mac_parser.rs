//! IEEE 802.15.4 MAC header decoder.

use std::fmt;

use super::ByteReader;
use crate::domain::Frame;

/// MAC frame control fields
mod fcf {
    pub const FRAME_TYPE_MASK: u16 = 0x0007;
    pub const SECURITY: u16 = 1 << 3;
    pub const PAN_ID_COMPRESSION: u16 = 1 << 6;
    pub const SEQ_NUM_SUPPRESSION: u16 = 1 << 8;
    pub const IE_PRESENT: u16 = 1 << 9;
    pub const DST_ADDR_MODE_SHIFT: u16 = 10;
    pub const SRC_ADDR_MODE_SHIFT: u16 = 14;

    pub const FRAME_TYPE_DATA: u16 = 0x0001;
}

/// Addressing mode values (2-bit fields)
mod addr_mode {
    pub const NONE: u16 = 0;
    pub const SHORT: u16 = 2;
    pub const EXTENDED: u16 = 3;
}

/// An IEEE 802.15.4 device address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacAddress {
    None,
    Short(u16),
    Extended(u64),
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "-"),
            Self::Short(a) => write!(f, "0x{:04x}", a),
            Self::Extended(a) => write!(f, "0x{:016x}", a),
        }
    }
}

/// A decoded MAC data frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacFrame<'a> {
    pub frame_control: u16,
    pub sequence_number: Option<u8>,
    pub dst_pan: Option<u16>,
    pub dst_addr: MacAddress,
    pub src_pan: Option<u16>,
    pub src_addr: MacAddress,
    /// MAC payload, FCS excluded
    pub payload: &'a [u8],
}

/// Decoder for the outermost IEEE 802.15.4 MAC envelope.
///
/// Only unsecured data frames are decoded. Beacons, acknowledgments and
/// MAC commands never carry a ZigBee NWK frame, and MAC-secured payloads
/// are ciphertext.
pub struct MacParser;

impl MacParser {
    pub fn new() -> Self {
        Self
    }

    /// Decode the MAC header of a captured frame.
    pub fn parse<'a>(&self, frame: &'a Frame) -> Option<MacFrame<'a>> {
        self.parse_mpdu(frame.mpdu())
    }

    /// Decode a MAC frame that has already had its FCS removed.
    pub fn parse_mpdu<'a>(&self, data: &'a [u8]) -> Option<MacFrame<'a>> {
        let mut reader = ByteReader::new(data);
        let frame_control = reader.u16_le()?;

        if frame_control & fcf::FRAME_TYPE_MASK != fcf::FRAME_TYPE_DATA {
            return None;
        }
        if frame_control & (fcf::SECURITY | fcf::IE_PRESENT) != 0 {
            return None;
        }

        let sequence_number = if frame_control & fcf::SEQ_NUM_SUPPRESSION != 0 {
            None
        } else {
            Some(reader.u8()?)
        };

        let dst_mode = (frame_control >> fcf::DST_ADDR_MODE_SHIFT) & 0x3;
        let src_mode = (frame_control >> fcf::SRC_ADDR_MODE_SHIFT) & 0x3;

        let dst_pan = if dst_mode != addr_mode::NONE {
            Some(reader.u16_le()?)
        } else {
            None
        };
        let dst_addr = read_address(&mut reader, dst_mode)?;

        let pan_id_compressed = frame_control & fcf::PAN_ID_COMPRESSION != 0;
        let src_pan = if src_mode != addr_mode::NONE && !pan_id_compressed {
            Some(reader.u16_le()?)
        } else {
            None
        };
        let src_addr = read_address(&mut reader, src_mode)?;

        Some(MacFrame {
            frame_control,
            sequence_number,
            dst_pan,
            dst_addr,
            src_pan,
            src_addr,
            payload: reader.rest(),
        })
    }
}

impl Default for MacParser {
    fn default() -> Self {
        Self::new()
    }
}

fn read_address(reader: &mut ByteReader<'_>, mode: u16) -> Option<MacAddress> {
    match mode {
        addr_mode::NONE => Some(MacAddress::None),
        addr_mode::SHORT => reader.u16_le().map(MacAddress::Short),
        addr_mode::EXTENDED => reader.u64_le().map(MacAddress::Extended),
        // Reserved addressing mode
        _ => None,
    }
}

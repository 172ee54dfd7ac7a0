//! ZigBee network (NWK) layer header decoder.

use super::ByteReader;

/// NWK frame control fields
mod fcf {
    pub const FRAME_TYPE_MASK: u16 = 0x0003;
    pub const MULTICAST: u16 = 1 << 8;
    pub const SECURITY: u16 = 1 << 9;
    pub const SOURCE_ROUTE: u16 = 1 << 10;
    pub const DST_IEEE: u16 = 1 << 11;
    pub const SRC_IEEE: u16 = 1 << 12;

    pub const FRAME_TYPE_DATA: u16 = 0x0000;
}

/// A decoded NWK data frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NwkFrame<'a> {
    pub frame_control: u16,
    pub dst_addr: u16,
    pub src_addr: u16,
    pub radius: u8,
    pub sequence_number: u8,
    pub dst_ieee: Option<u64>,
    pub src_ieee: Option<u64>,
    pub payload: &'a [u8],
}

impl NwkFrame<'_> {
    pub fn protocol_version(&self) -> u8 {
        ((self.frame_control >> 2) & 0x0f) as u8
    }
}

/// Decoder for the ZigBee NWK header.
///
/// Only NWK data frames carry an APS frame. NWK commands and inter-PAN
/// frames are skipped, and so is anything with NWK security enabled
/// since the payload is then encrypted.
pub struct NwkParser;

impl NwkParser {
    pub fn new() -> Self {
        Self
    }

    /// Decode the NWK header from a MAC payload.
    pub fn parse<'a>(&self, data: &'a [u8]) -> Option<NwkFrame<'a>> {
        let mut reader = ByteReader::new(data);
        let frame_control = reader.u16_le()?;

        if frame_control & fcf::FRAME_TYPE_MASK != fcf::FRAME_TYPE_DATA {
            return None;
        }
        if frame_control & fcf::SECURITY != 0 {
            return None;
        }

        let dst_addr = reader.u16_le()?;
        let src_addr = reader.u16_le()?;
        let radius = reader.u8()?;
        let sequence_number = reader.u8()?;

        let dst_ieee = if frame_control & fcf::DST_IEEE != 0 {
            Some(reader.u64_le()?)
        } else {
            None
        };
        let src_ieee = if frame_control & fcf::SRC_IEEE != 0 {
            Some(reader.u64_le()?)
        } else {
            None
        };

        if frame_control & fcf::MULTICAST != 0 {
            reader.skip(1)?;
        }

        if frame_control & fcf::SOURCE_ROUTE != 0 {
            let relay_count = reader.u8()? as usize;
            let _relay_index = reader.u8()?;
            reader.skip(relay_count * 2)?;
        }

        Some(NwkFrame {
            frame_control,
            dst_addr,
            src_addr,
            radius,
            sequence_number,
            dst_ieee,
            src_ieee,
            payload: reader.rest(),
        })
    }
}

impl Default for NwkParser {
    fn default() -> Self {
        Self::new()
    }
}

//! ZigBee Application Support (APS) layer header decoder.

use super::ByteReader;

/// Frame type bits of the APS frame control byte
pub const APS_FRAME_TYPE_MASK: u8 = 0x03;
/// Delivery mode bits of the APS frame control byte
pub const APS_DELIVERY_MODE_MASK: u8 = 0x0c;
/// Security bit of the APS frame control byte
pub const APS_SECURITY_MASK: u8 = 0x20;
/// Frame type value of an APS command frame
pub const APS_COMMAND_FRAME: u8 = 0x01;

const ACK_FORMAT: u8 = 0x10;
const EXTENDED_HEADER: u8 = 0x80;

mod frame_type {
    pub const DATA: u8 = 0x00;
    pub const COMMAND: u8 = 0x01;
    pub const ACK: u8 = 0x02;
}

mod delivery_mode {
    pub const UNICAST: u8 = 0x00;
    pub const BROADCAST: u8 = 0x02;
    pub const GROUP: u8 = 0x03;
}

/// A decoded APS frame: the frame control byte plus what follows the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApsFrame<'a> {
    pub frame_control: u8,
    pub counter: u8,
    pub payload: &'a [u8],
}

impl ApsFrame<'_> {
    pub fn frame_type(&self) -> u8 {
        self.frame_control & APS_FRAME_TYPE_MASK
    }

    pub fn delivery_mode(&self) -> u8 {
        (self.frame_control & APS_DELIVERY_MODE_MASK) >> 2
    }

    pub fn is_secured(&self) -> bool {
        self.frame_control & APS_SECURITY_MASK != 0
    }
}

/// Decoder for the ZigBee APS header.
pub struct ApsParser;

impl ApsParser {
    pub fn new() -> Self {
        Self
    }

    /// Decode the APS header from a NWK payload.
    ///
    /// Inter-PAN frames and truncated headers yield `None`.
    pub fn parse<'a>(&self, data: &'a [u8]) -> Option<ApsFrame<'a>> {
        let mut reader = ByteReader::new(data);
        let frame_control = reader.u8()?;
        let ftype = frame_control & APS_FRAME_TYPE_MASK;
        let mode = (frame_control & APS_DELIVERY_MODE_MASK) >> 2;

        match ftype {
            frame_type::DATA => {
                skip_destination(&mut reader, mode)?;
                // cluster, profile, source endpoint
                reader.skip(5)?;
            }
            frame_type::COMMAND => {}
            frame_type::ACK => {
                if frame_control & ACK_FORMAT == 0 {
                    // destination endpoint, cluster, profile, source endpoint
                    reader.skip(6)?;
                }
            }
            _ => return None,
        }

        let counter = reader.u8()?;

        if frame_control & EXTENDED_HEADER != 0 {
            let ext_control = reader.u8()?;
            if ext_control & 0x03 != 0 {
                // block number
                reader.skip(1)?;
                if ftype == frame_type::ACK {
                    // ack bitfield
                    reader.skip(1)?;
                }
            }
        }

        Some(ApsFrame {
            frame_control,
            counter,
            payload: reader.rest(),
        })
    }
}

impl Default for ApsParser {
    fn default() -> Self {
        Self::new()
    }
}

fn skip_destination(reader: &mut ByteReader<'_>, mode: u8) -> Option<()> {
    match mode {
        delivery_mode::UNICAST | delivery_mode::BROADCAST => reader.skip(1),
        delivery_mode::GROUP => reader.skip(2),
        // Indirect addressing carries no destination field
        _ => Some(()),
    }
}

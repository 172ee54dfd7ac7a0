//! libpcap reader for IEEE 802.15.4 captures.
//!
//! The container is decoded by `pcap-file`; this module maps the 802.15.4
//! link types onto frames and strips the TAP pseudo-header.

use std::io::{self, BufRead};
use std::path::{Path, PathBuf};

use pcap_file::pcap as container;
use pcap_file::PcapError;
use tracing::{debug, warn};

use super::{CaptureSource, FrameRead};
use crate::domain::{Frame, FCS_LEN};
use crate::error::CaptureError;

/// IEEE 802.15.4 with the FCS at the end of the frame
pub const LINKTYPE_IEEE802_15_4_WITHFCS: u32 = 195;
/// IEEE 802.15.4 without FCS
pub const LINKTYPE_IEEE802_15_4_NOFCS: u32 = 230;
/// IEEE 802.15.4 with a TAP pseudo-header carrying per-frame metadata
pub const LINKTYPE_IEEE802_15_4_TAP: u32 = 283;

/// Microsecond and nanosecond magic numbers, as stored by either byte order
const MAGICS: [[u8; 4]; 4] = [
    [0xd4, 0xc3, 0xb2, 0xa1],
    [0xa1, 0xb2, 0xc3, 0xd4],
    [0x4d, 0x3c, 0xb2, 0xa1],
    [0xa1, 0xb2, 0x3c, 0x4d],
];

/// TAP TLV types
pub(crate) mod tap {
    pub const HEADER_LEN: usize = 4;
    pub const FCS_TYPE: u16 = 0;
    pub const RSS: u16 = 1;
    pub const CHANNEL_ASSIGNMENT: u16 = 3;
    pub const CHANNEL_CENTER_FREQUENCY: u16 = 11;

    pub const FCS_NONE: u8 = 0;
    pub const FCS_16_BIT: u8 = 1;
    pub const FCS_32_BIT: u8 = 2;
}

/// Reads frames from a libpcap file with an IEEE 802.15.4 link type.
pub struct PcapReader<R: io::Read> {
    reader: Option<container::PcapReader<R>>,
    path: PathBuf,
    linktype: u32,
    records: u64,
}

impl<R: BufRead> PcapReader<R> {
    /// Whether `head` starts with a pcap magic number.
    pub fn is_pcap(head: &[u8]) -> bool {
        head.get(..4)
            .is_some_and(|magic| MAGICS.iter().any(|m| m == magic))
    }

    /// Parse the global header and prepare to read records.
    pub fn from_reader(reader: R, path: &Path) -> Result<Self, CaptureError> {
        let reader = container::PcapReader::new(reader).map_err(|e| match e {
            PcapError::IoError(io) if io.kind() != io::ErrorKind::UnexpectedEof => {
                CaptureError::file(path, io)
            }
            other => CaptureError::unreadable(path, other.to_string()),
        })?;

        let linktype = u32::from(reader.header().datalink);
        if !is_802154(linktype) {
            return Err(CaptureError::unreadable(
                path,
                format!("link type {} is not IEEE 802.15.4", linktype),
            ));
        }

        debug!(path = %path.display(), linktype, "opened pcap capture");

        Ok(Self {
            reader: Some(reader),
            path: path.to_path_buf(),
            linktype,
            records: 0,
        })
    }

    pub fn linktype(&self) -> u32 {
        self.linktype
    }

    /// Read the next record, skipping records with an unusable TAP header.
    ///
    /// A damaged or truncated tail ends the capture with a warning; only
    /// I/O failures are fatal.
    fn read_record(&mut self) -> Result<Option<Frame>, CaptureError> {
        loop {
            let Some(reader) = self.reader.as_mut() else {
                return Ok(None);
            };

            let next = reader
                .next_packet()
                .map(|packet| packet.map(|p| (p.timestamp, p.data.into_owned())));

            let (timestamp, data) = match next {
                None => return Ok(None),
                Some(Ok(record)) => record,
                Some(Err(PcapError::IoError(e))) if e.kind() != io::ErrorKind::UnexpectedEof => {
                    return Err(CaptureError::file(&self.path, e));
                }
                Some(Err(e)) => {
                    warn!(
                        path = %self.path.display(),
                        record = self.records + 1,
                        "unreadable pcap record, stopping: {}", e
                    );
                    self.reader = None;
                    return Ok(None);
                }
            };
            self.records += 1;

            let frame = match self.linktype {
                LINKTYPE_IEEE802_15_4_WITHFCS => Some(Frame::new(data, true)),
                LINKTYPE_IEEE802_15_4_NOFCS => Some(Frame::new(data, false)),
                _ => parse_tap(&data),
            };

            match frame {
                Some(frame) => return Ok(Some(frame.with_timestamp(timestamp))),
                None => debug!(record = self.records, "skipping record with malformed TAP header"),
            }
        }
    }
}

impl<R: BufRead> CaptureSource for PcapReader<R> {
    fn next_frame(&mut self) -> Result<FrameRead, CaptureError> {
        Ok(match self.read_record()? {
            Some(frame) => FrameRead::Frame(frame),
            None => FrameRead::EndOfCapture,
        })
    }

    fn describe(&self) -> String {
        format!("pcap:{}", self.path.display())
    }

    fn close(&mut self) {
        if self.reader.take().is_some() {
            debug!(path = %self.path.display(), records = self.records, "closed pcap capture");
        }
    }
}

pub(crate) fn is_802154(linktype: u32) -> bool {
    matches!(
        linktype,
        LINKTYPE_IEEE802_15_4_WITHFCS | LINKTYPE_IEEE802_15_4_NOFCS | LINKTYPE_IEEE802_15_4_TAP
    )
}

/// Strip the IEEE 802.15.4 TAP pseudo-header and pick up its metadata.
///
/// TAP fields are little-endian regardless of the pcap byte order.
fn parse_tap(data: &[u8]) -> Option<Frame> {
    if data.len() < tap::HEADER_LEN || data[0] != 0 {
        return None;
    }
    let header_len = u16::from_le_bytes([data[2], data[3]]) as usize;
    if header_len < tap::HEADER_LEN || header_len > data.len() {
        return None;
    }

    let mut fcs_type = tap::FCS_16_BIT;
    let mut rssi = None;
    let mut channel = None;

    let mut offset = tap::HEADER_LEN;
    while offset + 4 <= header_len {
        let tlv_type = u16::from_le_bytes([data[offset], data[offset + 1]]);
        let tlv_len = u16::from_le_bytes([data[offset + 2], data[offset + 3]]) as usize;
        let value = data.get(offset + 4..offset + 4 + tlv_len)?;

        match tlv_type {
            tap::FCS_TYPE if tlv_len >= 1 => fcs_type = value[0],
            tap::RSS if tlv_len >= 4 => {
                let dbm = f32::from_le_bytes([value[0], value[1], value[2], value[3]]);
                rssi = Some(dbm.round().clamp(i8::MIN as f32, i8::MAX as f32) as i8);
            }
            tap::CHANNEL_ASSIGNMENT if tlv_len >= 2 => {
                channel = u8::try_from(u16::from_le_bytes([value[0], value[1]])).ok();
            }
            _ => {}
        }

        // TLV values are padded to a multiple of four bytes
        offset += 4 + tlv_len.div_ceil(4) * 4;
    }

    let psdu = &data[header_len..];
    let mut frame = match fcs_type {
        tap::FCS_NONE => Frame::new(psdu.to_vec(), false),
        tap::FCS_32_BIT => {
            let mpdu = psdu.get(..psdu.len().checked_sub(4)?)?;
            Frame::new(mpdu.to_vec(), false)
        }
        _ => Frame::new(psdu.to_vec(), psdu.len() >= FCS_LEN),
    };
    frame.rssi_dbm = rssi;
    frame.channel = channel;
    Some(frame)
}

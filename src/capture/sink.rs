//! pcap sink for live captures.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use pcap_file::pcap::{PcapHeader, PcapPacket, PcapWriter};
use pcap_file::DataLink;
use tracing::{debug, warn};

use super::pcap::{
    is_802154, tap, LINKTYPE_IEEE802_15_4_NOFCS, LINKTYPE_IEEE802_15_4_TAP,
    LINKTYPE_IEEE802_15_4_WITHFCS,
};
use crate::domain::{append_fcs, Frame};
use crate::error::CaptureError;

/// Appends live frames to a pcap file with an IEEE 802.15.4 link type.
///
/// With the TAP link type, signal strength and channel frequency travel
/// with each frame.
///
/// Every record is encoded into a staging buffer and handed to the file in
/// a single write, straight to the file descriptor with no user-space
/// buffer. A capture cut short by Ctrl+C therefore still ends on a record
/// boundary.
pub struct PcapSink {
    file: Option<File>,
    staging: PcapWriter<Vec<u8>>,
    path: PathBuf,
    linktype: u32,
    records: u64,
}

impl PcapSink {
    /// Create (or truncate) `path` and write the pcap global header.
    pub fn create(path: impl AsRef<Path>, linktype: u32) -> Result<Self, CaptureError> {
        let path = path.as_ref();
        if !is_802154(linktype) {
            return Err(CaptureError::UnsupportedLinkType(linktype));
        }

        let header = PcapHeader {
            datalink: DataLink::from(linktype),
            ..PcapHeader::default()
        };
        let mut staging = PcapWriter::with_header(Vec::new(), header)
            .map_err(|e| CaptureError::pcap(path, e))?;

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map_err(|e| CaptureError::file(path, e))?;

        file.write_all(staging.get_ref())
            .map_err(|e| CaptureError::file(path, e))?;
        staging.get_mut().clear();

        debug!(path = %path.display(), linktype, "created pcap sink");

        Ok(Self {
            file: Some(file),
            staging,
            path: path.to_path_buf(),
            linktype,
            records: 0,
        })
    }

    /// Create a sink using the TAP link type.
    pub fn create_tap(path: impl AsRef<Path>) -> Result<Self, CaptureError> {
        Self::create(path, LINKTYPE_IEEE802_15_4_TAP)
    }

    /// Append one frame as a complete record.
    pub fn append(&mut self, frame: &Frame) -> Result<(), CaptureError> {
        let Some(file) = self.file.as_mut() else {
            return Err(CaptureError::file(
                &self.path,
                std::io::Error::new(std::io::ErrorKind::NotConnected, "sink is closed"),
            ));
        };

        let data = encode_payload(frame, self.linktype);
        let packet = PcapPacket::new(frame.timestamp, data.len() as u32, &data);

        self.staging.get_mut().clear();
        self.staging
            .write_packet(&packet)
            .map_err(|e| CaptureError::pcap(&self.path, e))?;

        file.write_all(self.staging.get_ref())
            .map_err(|e| CaptureError::file(&self.path, e))?;
        self.records += 1;
        Ok(())
    }

    /// Number of records written so far.
    pub fn records(&self) -> u64 {
        self.records
    }

    pub fn linktype(&self) -> u32 {
        self.linktype
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sync and close the file. Closing twice is a no-op.
    pub fn close(&mut self) {
        if let Some(file) = self.file.take() {
            if let Err(e) = file.sync_all() {
                warn!(path = %self.path.display(), "failed to sync capture file: {}", e);
            }
            debug!(path = %self.path.display(), records = self.records, "closed pcap sink");
        }
    }
}

impl Drop for PcapSink {
    fn drop(&mut self) {
        self.close();
    }
}

/// Record body for `frame` under `linktype`.
fn encode_payload(frame: &Frame, linktype: u32) -> Vec<u8> {
    match linktype {
        LINKTYPE_IEEE802_15_4_WITHFCS if frame.fcs_present => frame.data.clone(),
        LINKTYPE_IEEE802_15_4_WITHFCS => append_fcs(frame.mpdu()),
        LINKTYPE_IEEE802_15_4_NOFCS => frame.mpdu().to_vec(),
        _ => {
            let mut data = encode_tap_header(frame);
            data.extend_from_slice(&frame.data);
            data
        }
    }
}

fn encode_tap_header(frame: &Frame) -> Vec<u8> {
    let mut header = vec![0x00, 0x00, 0x00, 0x00];

    let fcs_type = if frame.fcs_present {
        tap::FCS_16_BIT
    } else {
        tap::FCS_NONE
    };
    push_tlv(&mut header, tap::FCS_TYPE, &[fcs_type]);

    if let Some(rssi) = frame.rssi_dbm {
        push_tlv(&mut header, tap::RSS, &(rssi as f32).to_le_bytes());
    }

    if let (Some(channel), Some(mhz)) = (frame.channel, frame.frequency_mhz()) {
        let mut assignment = (channel as u16).to_le_bytes().to_vec();
        // channel page 0
        assignment.push(0);
        push_tlv(&mut header, tap::CHANNEL_ASSIGNMENT, &assignment);

        let khz = (mhz * 1000) as f32;
        push_tlv(&mut header, tap::CHANNEL_CENTER_FREQUENCY, &khz.to_le_bytes());
    }

    let len = header.len() as u16;
    header[2..4].copy_from_slice(&len.to_le_bytes());
    header
}

fn push_tlv(header: &mut Vec<u8>, tlv_type: u16, value: &[u8]) {
    header.extend_from_slice(&tlv_type.to_le_bytes());
    header.extend_from_slice(&(value.len() as u16).to_le_bytes());
    header.extend_from_slice(value);
    let padding = (4 - value.len() % 4) % 4;
    header.extend(std::iter::repeat(0u8).take(padding));
}

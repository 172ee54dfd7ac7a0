//! ZigBee Encapsulation Protocol (ZEP) receiver.
//!
//! Many sniffer dongles and simulators forward received 802.15.4 frames
//! as ZEP datagrams over UDP. This radio listens for them and turns each
//! datagram into a `Frame`.

use std::io::ErrorKind;
use std::net::{SocketAddr, UdpSocket};
use std::time::Duration;

use tracing::debug;

use super::RadioDevice;
use crate::domain::Frame;
use crate::error::CaptureError;

/// Default ZEP UDP port
pub const ZEP_DEFAULT_PORT: u16 = 17754;

/// How long a read blocks before giving the caller a chance to stop
const POLL_INTERVAL: Duration = Duration::from_millis(100);

const ZEP_PREAMBLE: &[u8; 2] = b"EX";
const ZEP_V1_HEADER_LEN: usize = 16;
const ZEP_V2_HEADER_LEN: usize = 32;
const ZEP_TYPE_DATA: u8 = 1;

/// Lowest and highest 2.4 GHz O-QPSK channel
const MIN_CHANNEL: u8 = 11;
const MAX_CHANNEL: u8 = 26;

/// A frame decoded from a ZEP datagram.
#[derive(Debug, Clone, PartialEq)]
struct ZepFrame {
    channel: u8,
    frame: Frame,
}

/// Radio backed by a UDP socket receiving ZEP datagrams.
pub struct ZepRadio {
    socket: Option<UdpSocket>,
    local_addr: SocketAddr,
    channel: u8,
    receiving: bool,
}

impl ZepRadio {
    /// Bind a ZEP receiver. `addr` is `<ip>:<port>`, defaulting to all
    /// interfaces on the standard ZEP port.
    pub fn open(addr: Option<&str>) -> Result<Self, CaptureError> {
        let addr: SocketAddr = match addr {
            Some(addr) => addr
                .parse()
                .map_err(|_| CaptureError::Interface(format!("invalid ZEP address '{}'", addr)))?,
            None => SocketAddr::from(([0, 0, 0, 0], ZEP_DEFAULT_PORT)),
        };

        let socket = UdpSocket::bind(addr)
            .map_err(|e| CaptureError::Interface(format!("cannot bind {}: {}", addr, e)))?;
        socket
            .set_read_timeout(Some(POLL_INTERVAL))
            .map_err(|e| CaptureError::Interface(format!("cannot configure {}: {}", addr, e)))?;
        let local_addr = socket.local_addr()?;

        Ok(Self {
            socket: Some(socket),
            local_addr,
            channel: MIN_CHANNEL,
            receiving: false,
        })
    }

    /// Address the receiver is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

impl RadioDevice for ZepRadio {
    fn device_info(&self) -> String {
        format!("zep://{}", self.local_addr)
    }

    fn is_valid_channel(&self, channel: u8) -> bool {
        (MIN_CHANNEL..=MAX_CHANNEL).contains(&channel)
    }

    fn set_channel(&mut self, channel: u8) -> Result<(), CaptureError> {
        if !self.is_valid_channel(channel) {
            return Err(CaptureError::InvalidChannel {
                channel,
                device: self.device_info(),
            });
        }
        self.channel = channel;
        Ok(())
    }

    fn sniffer_on(&mut self) -> Result<(), CaptureError> {
        if self.socket.is_none() {
            return Err(CaptureError::Interface("device is closed".to_string()));
        }
        self.receiving = true;
        Ok(())
    }

    fn sniffer_off(&mut self) {
        self.receiving = false;
    }

    fn read_next_frame(&mut self) -> Result<Option<Frame>, CaptureError> {
        let socket = self
            .socket
            .as_ref()
            .ok_or_else(|| CaptureError::Interface("device is closed".to_string()))?;

        let mut buf = [0u8; 512];
        let (len, peer) = match socket.recv_from(&mut buf) {
            Ok(received) => received,
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        if !self.receiving {
            return Ok(None);
        }

        let Some(zep) = parse_zep(&buf[..len]) else {
            debug!(%peer, len, "ignoring datagram that is not a ZEP data frame");
            return Ok(None);
        };

        if zep.channel != self.channel {
            return Ok(None);
        }

        Ok(Some(zep.frame.with_channel(zep.channel)))
    }

    fn close(&mut self) {
        self.receiving = false;
        if self.socket.take().is_some() {
            debug!(addr = %self.local_addr, "ZEP receiver closed");
        }
    }
}

/// Decode a ZEP v1 or v2 data datagram.
///
/// In CRC mode the frame keeps its FCS. In LQI mode the last two bytes
/// hold CC24xx-style metadata instead: RSSI, then CRC-ok bit and
/// correlation. The RSSI is kept and the metadata bytes dropped.
fn parse_zep(data: &[u8]) -> Option<ZepFrame> {
    if data.len() < 4 || &data[0..2] != ZEP_PREAMBLE {
        return None;
    }

    let (channel, crc_mode, len_offset, header_len) = match data[2] {
        1 => (data[3], *data.get(6)? != 0, 15, ZEP_V1_HEADER_LEN),
        2 => {
            if data[3] != ZEP_TYPE_DATA {
                return None;
            }
            (*data.get(4)?, *data.get(7)? != 0, 31, ZEP_V2_HEADER_LEN)
        }
        _ => return None,
    };

    let len = *data.get(len_offset)? as usize;
    let psdu = data.get(header_len..header_len + len)?;

    let frame = if crc_mode {
        Frame::new(psdu.to_vec(), true)
    } else {
        if psdu.len() < 2 {
            return None;
        }
        let (mpdu, metadata) = psdu.split_at(psdu.len() - 2);
        Frame::new(mpdu.to_vec(), false).with_rssi(metadata[0] as i8)
    };

    Some(ZepFrame { channel, frame })
}

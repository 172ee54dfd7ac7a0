//! Radio device capability.

use crate::domain::Frame;
use crate::error::CaptureError;

use super::zep_radio::ZepRadio;

/// An IEEE 802.15.4 radio that can be put into promiscuous receive mode.
///
/// The sniffer only needs this small surface; channel tuning and RF
/// details stay inside the implementation.
pub trait RadioDevice: Send {
    /// Short description of the device, shown when listening starts.
    fn device_info(&self) -> String;

    /// Whether the device can receive on `channel`.
    fn is_valid_channel(&self, channel: u8) -> bool;

    /// Tune to `channel`.
    fn set_channel(&mut self, channel: u8) -> Result<(), CaptureError>;

    /// Enable promiscuous reception.
    fn sniffer_on(&mut self) -> Result<(), CaptureError>;

    /// Disable reception. Safe to call when already off.
    fn sniffer_off(&mut self);

    /// Block until a frame arrives or the poll interval elapses.
    ///
    /// Returns `Ok(None)` when nothing was received in time.
    fn read_next_frame(&mut self) -> Result<Option<Frame>, CaptureError>;

    /// Release the device. Safe to call more than once.
    fn close(&mut self);
}

/// Open a radio by device identifier.
///
/// Supported identifiers:
/// - `zep` - ZEP receiver on the default UDP port
/// - `zep:<addr>:<port>` - ZEP receiver bound to the given socket address
pub fn open_radio(device_id: &str) -> Result<Box<dyn RadioDevice>, CaptureError> {
    let (kind, rest) = match device_id.split_once(':') {
        Some((kind, rest)) => (kind, Some(rest)),
        None => (device_id, None),
    };

    match kind {
        "zep" => Ok(Box::new(ZepRadio::open(rest)?)),
        _ => Err(CaptureError::Interface(format!(
            "unsupported device '{}'",
            device_id
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_device() {
        let result = open_radio("usb:1.2");
        assert!(matches!(result, Err(CaptureError::Interface(_))));
    }

    #[test]
    fn test_bad_zep_address() {
        let result = open_radio("zep:not-an-address");
        assert!(matches!(result, Err(CaptureError::Interface(_))));
    }

    #[test]
    fn test_open_zep_on_ephemeral_port() {
        let mut radio = open_radio("zep:127.0.0.1:0").unwrap();
        assert!(radio.is_valid_channel(11));
        assert!(!radio.is_valid_channel(10));
        radio.close();
        radio.close();
    }
}

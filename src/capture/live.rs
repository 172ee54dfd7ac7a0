//! Live capture from a radio device.

use tracing::{debug, info};

use super::{open_radio, CaptureSource, FrameRead, RadioDevice};
use crate::error::CaptureError;

/// Frames read live from a radio on one channel.
pub struct LiveRadioSource {
    radio: Box<dyn RadioDevice>,
    channel: u8,
    receiving: bool,
    closed: bool,
}

impl LiveRadioSource {
    /// Open the radio identified by `device_id`.
    pub fn open(device_id: &str, channel: u8) -> Result<Self, CaptureError> {
        let radio = open_radio(device_id)?;
        Ok(Self::new(radio, channel))
    }

    /// Wrap an already opened radio.
    pub fn new(radio: Box<dyn RadioDevice>, channel: u8) -> Self {
        Self {
            radio,
            channel,
            receiving: false,
            closed: false,
        }
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }

    /// Check that the radio supports the requested channel.
    pub fn validate_channel(&self) -> Result<(), CaptureError> {
        if self.radio.is_valid_channel(self.channel) {
            Ok(())
        } else {
            Err(CaptureError::InvalidChannel {
                channel: self.channel,
                device: self.radio.device_info(),
            })
        }
    }

    /// Tune the radio and enable reception.
    pub fn start(&mut self) -> Result<(), CaptureError> {
        if self.closed {
            return Err(CaptureError::Interface("device is closed".to_string()));
        }
        self.radio.set_channel(self.channel)?;
        self.radio.sniffer_on()?;
        self.receiving = true;
        info!(device = %self.radio.device_info(), channel = self.channel, "sniffer on");
        Ok(())
    }
}

impl CaptureSource for LiveRadioSource {
    fn next_frame(&mut self) -> Result<FrameRead, CaptureError> {
        if self.closed {
            return Ok(FrameRead::EndOfCapture);
        }

        Ok(match self.radio.read_next_frame()? {
            Some(mut frame) => {
                if frame.channel.is_none() {
                    frame.channel = Some(self.channel);
                }
                FrameRead::Frame(frame)
            }
            None => FrameRead::TimedOut,
        })
    }

    fn describe(&self) -> String {
        self.radio.device_info()
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        if self.receiving {
            self.radio.sniffer_off();
            self.receiving = false;
        }
        self.radio.close();
        self.closed = true;
        debug!(channel = self.channel, "radio closed");
    }
}

impl Drop for LiveRadioSource {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::fake_radio::{FakeRadio, RadioLog};
    use crate::domain::Frame;
    use std::sync::Arc;

    #[test]
    fn test_invalid_channel() {
        let log = Arc::new(RadioLog::default());
        let source = LiveRadioSource::new(Box::new(FakeRadio::new(log.clone())), 30);

        assert!(matches!(
            source.validate_channel(),
            Err(CaptureError::InvalidChannel { channel: 30, .. })
        ));
        drop(source);
        assert_eq!(RadioLog::get(&log.sniffer_off), 0);
        assert_eq!(RadioLog::get(&log.close), 1);
    }

    #[test]
    fn test_frames_are_stamped_with_channel() {
        let log = Arc::new(RadioLog::default());
        let radio = FakeRadio::new(log.clone())
            .with_script(vec![None, Some(Frame::new(vec![0x01], false))]);
        let mut source = LiveRadioSource::new(Box::new(radio), 25);
        source.validate_channel().unwrap();
        source.start().unwrap();

        assert_eq!(source.next_frame().unwrap(), FrameRead::TimedOut);
        let FrameRead::Frame(frame) = source.next_frame().unwrap() else {
            panic!("expected a frame");
        };
        assert_eq!(frame.channel, Some(25));
        assert_eq!(frame.frequency_mhz(), Some(2475));
    }

    #[test]
    fn test_close_is_idempotent() {
        let log = Arc::new(RadioLog::default());
        let mut source = LiveRadioSource::new(Box::new(FakeRadio::new(log.clone())), 11);
        source.start().unwrap();

        source.close();
        source.close();
        drop(source);

        assert_eq!(RadioLog::get(&log.sniffer_off), 1);
        assert_eq!(RadioLog::get(&log.close), 1);
    }

    #[test]
    fn test_read_after_close_ends_capture() {
        let log = Arc::new(RadioLog::default());
        let radio = FakeRadio::new(log).with_fill(Frame::new(vec![0x01], false));
        let mut source = LiveRadioSource::new(Box::new(radio), 11);
        source.close();
        assert_eq!(source.next_frame().unwrap(), FrameRead::EndOfCapture);
    }
}

//! Frame capture abstraction.
//!
//! This module defines the `CaptureSource` trait, implemented by a live
//! radio source and by stored capture files, together with the `RadioDevice`
//! trait that live sources drive and the pcap sink used to save live
//! captures.

mod daintree;
#[cfg(test)]
pub(crate) mod fake_radio;
mod live;
mod pcap;
mod radio;
mod sink;
mod stored;
mod zep_radio;

pub use daintree::DaintreeReader;
pub use live::LiveRadioSource;
pub use pcap::{
    PcapReader, LINKTYPE_IEEE802_15_4_NOFCS, LINKTYPE_IEEE802_15_4_TAP,
    LINKTYPE_IEEE802_15_4_WITHFCS,
};
pub use radio::{open_radio, RadioDevice};
pub use sink::PcapSink;
pub use stored::StoredCapture;
pub use zep_radio::{ZepRadio, ZEP_DEFAULT_PORT};

use crate::domain::Frame;
use crate::error::CaptureError;

/// Result of asking a source for its next frame.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameRead {
    /// A captured frame
    Frame(Frame),
    /// Nothing arrived within the poll interval; ask again
    TimedOut,
    /// The source has no more frames
    EndOfCapture,
}

/// A lazy sequence of captured frames.
///
/// Stored captures end with `EndOfCapture`. Live sources keep producing
/// frames or `TimedOut` until they are closed.
pub trait CaptureSource {
    /// Read the next frame, blocking at most for the source's poll interval.
    fn next_frame(&mut self) -> Result<FrameRead, CaptureError>;

    /// Human-readable description of where frames come from.
    fn describe(&self) -> String;

    /// Release the underlying device or file. Closing twice is a no-op.
    fn close(&mut self);
}

//! Capture control module.
//!
//! Runs the read loop for live and stored captures, enforces the frame
//! count bound and handles stop requests.

mod session;
mod sniff_controller;
mod stop;

pub use session::CaptureSession;
pub use sniff_controller::{CaptureSummary, SniffController, SniffState, StopReason};
pub use stop::StopSignal;

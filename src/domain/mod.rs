//! Domain models for ZigBee key sniffing.
//!
//! This module contains the core domain types that are independent
//! of any capture backend or file format.

mod events;
mod frame;
mod key;

pub use events::{KeyEvent, SuspiciousKeyEvent};
pub use frame::{append_fcs, Frame, FCS_LEN};
pub use key::{KeyMaterial, KEY_LEN};

//! Transport Key detection module.
//!
//! Decides whether a decoded APS frame carries a plaintext network key.

mod transport_key_detector;

pub use transport_key_detector::{
    Detection, TransportKeyDetector, MIN_TRANSPORT_KEY_LEN, NETWORK_KEY_TYPE,
    TRANSPORT_KEY_COMMAND_ID,
};

//! Key extraction module.
//!
//! Turns a validated Transport Key payload into `KeyMaterial`.

mod key_extractor;

pub use key_extractor::KeyExtractor;

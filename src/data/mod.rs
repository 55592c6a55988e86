//! Synthetic input data.
//!
//! `sample` builds snapshots of a disk galaxy with a known scale length and
//! scale height, used by `galscale synth` and by the end-to-end tests.

pub mod sample;

pub use sample::*;

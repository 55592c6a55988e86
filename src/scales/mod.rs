//! Structural scales of a galaxy (`GalaxyScales`).

pub mod galaxy;

pub use galaxy::*;

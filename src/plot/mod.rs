//! Terminal plots of profiles and their fitted models.

pub mod ascii;

pub use ascii::*;

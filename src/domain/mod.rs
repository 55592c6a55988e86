//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - profile model and scale enums (`ProfileModel`, `ScaleKind`, `RadialQuantity`)
//! - fit outputs (`ModelFit`, `ScaleEstimate`, `ScaleOutcome`)
//! - run configuration (`FitConfig`, `ProfileConfig`) and the JSON report schema

pub mod types;

pub use types::*;

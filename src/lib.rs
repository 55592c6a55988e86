//! `galaxy-scales` library crate.
//!
//! The binary (`galscale`) is a thin wrapper around this library so that:
//!
//! - the estimators and the sim setup are testable without spawning processes
//! - other tools can call `GalaxyScales` and `sim_setup` directly

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod plot;
pub mod profile;
pub mod report;
pub mod scales;
pub mod sim;

//! Reporting: formatted terminal output for a run.
//!
//! Formatting lives in one place so the profile and fitting code stays free of
//! presentation concerns, and output changes stay local.

pub mod format;

pub use format::*;

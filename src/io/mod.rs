//! Input/output helpers.
//!
//! - snapshot JSON read/write (`snapshot`)
//! - run report JSON and profile CSV exports (`export`)

pub mod export;
pub mod snapshot;

pub use export::*;
pub use snapshot::*;

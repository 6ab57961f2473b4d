//! Input/output helpers.
//!
//! - CSV ingest + validation (`ingest`)
//! - highscore JSON write/read and checkpoints (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;

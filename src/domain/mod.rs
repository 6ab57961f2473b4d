//! Domain types used throughout the search.
//!
//! This module defines:
//!
//! - the design-matrix capability (`DesignMatrix`, `PowerMatrix`)
//! - search and run configuration (`SearchConfig`, `DataSource`, `BnbRunConfig`)
//! - the serialized highscore schema (`HighscoreEntry`, `HighscoreFile`)
//! - progress snapshots (`ProgressSnapshot`)

pub mod design;
pub mod types;

pub use design::*;
pub use types::*;

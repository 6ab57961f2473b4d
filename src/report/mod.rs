//! Reporting utilities: progress lines, highscore tables, run summaries.

pub mod format;

pub use format::*;

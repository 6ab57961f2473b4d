//! `featselect` library crate.
//!
//! The binary (`fsel`) is a thin wrapper around this library so that:
//!
//! - the search is testable without spawning processes
//! - the branch-and-bound engine can be embedded with any `DesignMatrix`
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod domain;
pub mod error;
pub mod io;
pub mod math;
pub mod models;
pub mod report;
pub mod search;

//! Feature masks and the search-tree nodes built on them.

pub mod model;
pub mod node;

pub use model::*;
pub use node::*;

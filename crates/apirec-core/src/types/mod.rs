//! Shared domain types.

mod catalog;
mod recommendation;

pub use catalog::*;
pub use recommendation::*;

//! The resolved output of an engine run.

mod types;

pub use types::*;

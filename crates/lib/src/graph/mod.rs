//! Module identities, variant instances and dependency edges.

mod dag;
mod model;
mod types;

pub use dag::VariantDag;
pub use model::BuildGraph;
pub use types::*;

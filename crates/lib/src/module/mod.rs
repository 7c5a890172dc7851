//! Module declarations.
//!
//! A [`ModuleDecl`] is the engine's input record for one module: its kind,
//! its typed dependency list and the opt-in properties that drive variant
//! creation. Declarations are validated once, before the graph is built.

mod types;
mod validate;

pub use types::*;
pub use validate::validate_decl;

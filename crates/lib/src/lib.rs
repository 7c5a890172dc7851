//! varforge-lib: variant creation and dependency resolution for a
//! multi-target build system.
//!
//! Given module declarations and a [`config::BuildConfig`], the
//! [`engine::Engine`]:
//! - splits every module into the variants its consumers need, one axis at a time
//! - rewires each dependency edge onto the matching variant of its target
//! - orders transitive static link inputs consistently
//! - picks stub surfaces or implementations for shared dependencies across
//!   deployment boundaries
//! - checks link-type, API level and double-load rules
//!
//! The result is a [`manifest::Manifest`] plus collected diagnostics.

pub mod axis;
pub mod check;
pub mod config;
pub mod consts;
pub mod engine;
pub mod error;
pub mod graph;
pub mod link_order;
pub mod manifest;
pub mod module;
pub mod plan;
pub mod propagate;
pub mod resolve;
pub mod util;

pub use config::BuildConfig;
pub use engine::{Engine, Resolution};
pub use error::{Diagnostics, EngineError, ResolveError};
pub use manifest::Manifest;
pub use module::ModuleDecl;

//! Error types and diagnostic collection.
//!
//! Errors found while resolving one module never stop sibling modules from
//! finishing their own phase. They are collected into [`Diagnostics`] and the
//! run as a whole is reported as failed at the end.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::link_order::LinkOrderError;

/// Errors attributed to a single module or variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
  /// An edge resolved to a variant that was pruned.
  #[error("depends on disabled variant {dep}")]
  DisabledDependency { dep: String },

  /// An edge asked for a variation the target does not have.
  #[error("dependency {dep} has no variant with {axis}={label:?}")]
  MissingVariation { dep: String, axis: String, label: String },

  /// A link edge cycle was found.
  #[error("dependency cycle: {chain}")]
  DependencyCycle { chain: String },

  /// A dependency could not be planned, so neither can this variant.
  #[error("dependency {dep} failed")]
  DependencyFailed { dep: String },

  /// The declared static list disagrees with the transitive ordering.
  #[error("internal link order error: {0}")]
  LinkOrder(#[from] LinkOrderError),

  /// Mutually exclusive or invalid properties.
  #[error("invalid property '{property}': {message}")]
  Configuration { property: String, message: String },

  /// A dependency names a module that does not exist.
  #[error("depends on undefined module {dep:?}")]
  MissingDependency { dep: String },

  /// An edge violates ABI family or API level rules.
  #[error("link type violation with {dep}: {message}")]
  LinkType { dep: String, message: String },

  /// A library reachable at runtime from a stable interface is not double-loadable.
  #[error("links a library {dep:?} which is not a stable interface or marked double_loadable; dependency path: {path}")]
  DoubleLoad { dep: String, path: String },
}

/// Coarse error classes used for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
  GraphConsistency,
  Configuration,
  MissingDependency,
  LinkType,
  DoubleLoad,
}

impl ResolveError {
  pub fn category(&self) -> ErrorCategory {
    match self {
      ResolveError::DisabledDependency { .. }
      | ResolveError::MissingVariation { .. }
      | ResolveError::DependencyCycle { .. }
      | ResolveError::DependencyFailed { .. }
      | ResolveError::LinkOrder(_) => ErrorCategory::GraphConsistency,
      ResolveError::Configuration { .. } => ErrorCategory::Configuration,
      ResolveError::MissingDependency { .. } => ErrorCategory::MissingDependency,
      ResolveError::LinkType { .. } => ErrorCategory::LinkType,
      ResolveError::DoubleLoad { .. } => ErrorCategory::DoubleLoad,
    }
  }

  pub fn configuration(property: &str, message: impl Into<String>) -> Self {
    ResolveError::Configuration {
      property: property.to_string(),
      message: message.into(),
    }
  }
}

/// An error attributed to a module and, when known, one of its variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
  pub module: String,
  pub variant: Option<String>,
  pub error: ResolveError,
}

impl std::fmt::Display for Diagnostic {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match &self.variant {
      Some(variant) => write!(f, "{}: {}", variant, self.error),
      None => write!(f, "{}: {}", self.module, self.error),
    }
  }
}

/// Everything that went wrong during a run.
#[derive(Debug, Default)]
pub struct Diagnostics {
  /// Collected errors, in discovery order until [`Diagnostics::sort`] is called.
  pub errors: Vec<Diagnostic>,

  /// Undefined dependency names tolerated under `allow_missing_dependencies`.
  pub missing: BTreeSet<String>,
}

impl Diagnostics {
  pub fn push(&mut self, module: &str, variant: Option<String>, error: ResolveError) {
    self.errors.push(Diagnostic {
      module: module.to_string(),
      variant,
      error,
    });
  }

  pub fn extend(&mut self, other: impl IntoIterator<Item = Diagnostic>) {
    self.errors.extend(other);
  }

  /// Returns true if no errors were recorded.
  ///
  /// Tolerated missing dependencies do not count as failures.
  pub fn is_success(&self) -> bool {
    self.errors.is_empty()
  }

  pub fn error_count(&self) -> usize {
    self.errors.len()
  }

  pub fn count(&self, category: ErrorCategory) -> usize {
    self.errors.iter().filter(|d| d.error.category() == category).count()
  }

  pub fn by_category(&self, category: ErrorCategory) -> impl Iterator<Item = &Diagnostic> {
    self.errors.iter().filter(move |d| d.error.category() == category)
  }

  /// Order errors by module, variant and message so reports are stable.
  pub fn sort(&mut self) {
    self.errors.sort_by(|a, b| {
      (&a.module, &a.variant, a.error.to_string()).cmp(&(&b.module, &b.variant, b.error.to_string()))
    });
  }
}

/// Fatal outcome of a run.
#[derive(Debug, Error)]
pub enum EngineError {
  #[error("resolution failed with {count} error(s):\n{summary}")]
  Failed { count: usize, summary: String },

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("invalid json: {0}")]
  Json(#[from] serde_json::Error),
}

impl EngineError {
  pub fn from_diagnostics(diagnostics: &Diagnostics) -> Self {
    let summary = diagnostics
      .errors
      .iter()
      .map(|d| format!("  {}", d))
      .collect::<Vec<_>>()
      .join("\n");
    EngineError::Failed {
      count: diagnostics.error_count(),
      summary,
    }
  }
}

use serde::{Deserialize, Serialize};

use crate::graph::Artifact;
use crate::link_order::DepSet;
use crate::module::ExportBundle;
use crate::resolve::SharedLibSelection;

/// Everything a variant's link step consumes, in link order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkInputs {
  pub static_libs: Vec<Artifact>,
  pub whole_static_libs: Vec<Artifact>,
  pub shared_libs: Vec<SharedLibSelection>,
  pub objects: Vec<Artifact>,
  pub crt_begin: Vec<Artifact>,
  pub crt_end: Vec<Artifact>,
  pub runtime_libs: Vec<Artifact>,
  pub data: Vec<Artifact>,
  /// Include dirs and flags exported by direct dependencies.
  pub exported: ExportBundle,
}

/// The planned build actions of one variant.
#[derive(Debug, Clone)]
pub struct VariantPlan {
  pub artifact: Artifact,
  /// Transitive static link order, consumers first.
  pub link_order: DepSet<Artifact>,
  pub link_inputs: LinkInputs,
  /// Implementations linked directly because no deployment boundary separates them.
  pub same_unit_impls: DepSet<Artifact>,
  /// Interface handed to this variant's consumers.
  pub exports: ExportBundle,
  pub cflags: Vec<String>,
}

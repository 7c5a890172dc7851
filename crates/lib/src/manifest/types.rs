//! Manifest types.
//!
//! The manifest is the complete, serializable result of a resolution run:
//! one record per live variant, the stub surfaces offered by libraries and
//! the undefined dependencies that were tolerated.
//!
//! # Ordering
//!
//! Every map is a [`BTreeMap`] and every list is built in a deterministic
//! order, so two runs over the same input serialize identically and produce
//! the same [`Hashable::compute_hash`].
//!
//! # Example
//!
//! ```json
//! {
//!   "variants": {
//!     "libfoo[arch=arm64,link=static]": { "artifact": "libfoo/arm64_static/libfoo.a", ... }
//!   },
//!   "stub_surfaces": [ { "module": "libfoo", "version": "current", ... } ],
//!   "missing_dependencies": []
//! }
//! ```

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::graph::{Artifact, BuildGraph, VariantId, Variations};
use crate::link_order::LinkRank;
use crate::module::{ExportBundle, ModuleKind};
use crate::plan::{LinkInputs, VariantPlan};
use crate::resolve::{StubSurface, stub_surfaces};
use crate::util::hash::Hashable;

/// Planned actions of a variant, flattened for output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanRecord {
  pub link_order: Vec<Artifact>,
  pub link_inputs: LinkInputs,
  pub same_unit_impls: Vec<Artifact>,
  pub exports: ExportBundle,
  pub cflags: Vec<String>,
}

impl PlanRecord {
  /// Flatten `plan`, putting its link order in graph-wide `rank` order.
  pub fn from_plan(plan: &VariantPlan, rank: &LinkRank) -> Self {
    Self {
      link_order: rank.linearize(&plan.link_order),
      link_inputs: plan.link_inputs.clone(),
      same_unit_impls: plan.same_unit_impls.to_list(),
      exports: plan.exports.clone(),
      cflags: plan.cflags.clone(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantRecord {
  pub module: String,
  pub kind: ModuleKind,
  pub variations: Variations,
  pub artifact: Artifact,
  pub hidden: bool,
  pub installable: bool,
  /// Properties recorded by axis passes, per axis. Axes without properties are omitted.
  pub properties: BTreeMap<String, BTreeMap<String, String>>,
  /// `None` when the variant or one of its dependencies failed.
  pub plan: Option<PlanRecord>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
  /// Live variants keyed by their display name.
  pub variants: BTreeMap<String, VariantRecord>,
  pub stub_surfaces: Vec<StubSurface>,
  pub missing_dependencies: BTreeSet<String>,
}

impl Hashable for Manifest {}

impl Manifest {
  pub fn from_graph(
    graph: &BuildGraph,
    plans: &BTreeMap<VariantId, PlanRecord>,
    missing: &BTreeSet<String>,
  ) -> Self {
    let variants = graph
      .live_variants()
      .map(|variant| {
        let properties = graph
          .records
          .for_variant(variant.id)
          .into_iter()
          .filter(|(_, record)| !record.properties.is_empty())
          .map(|(axis, record)| (axis.to_string(), record.properties.clone()))
          .collect();
        let record = VariantRecord {
          module: graph.module(variant.module).name.clone(),
          kind: graph.module(variant.module).kind,
          variations: variant.variations.clone(),
          artifact: graph.artifact(variant.id),
          hidden: variant.hidden,
          installable: variant.installable,
          properties,
          plan: plans.get(&variant.id).cloned(),
        };
        (graph.variant_name(variant.id), record)
      })
      .collect();

    let stub_surfaces = graph
      .modules()
      .iter()
      .flat_map(|m| stub_surfaces(&m.decl))
      .collect();

    Self {
      variants,
      stub_surfaces,
      missing_dependencies: missing.clone(),
    }
  }

  /// Records of one module's variants, in name order.
  pub fn variants_of<'a>(&'a self, module: &'a str) -> impl Iterator<Item = (&'a String, &'a VariantRecord)> {
    self.variants.iter().filter(move |(_, r)| r.module == module)
  }

  /// Variants that are neither hidden nor uninstallable.
  pub fn installable(&self) -> impl Iterator<Item = (&String, &VariantRecord)> {
    self.variants.iter().filter(|(_, r)| !r.hidden && r.installable)
  }
}

//! Deployment boundaries and the stub-or-implementation decision.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::config::{BuildConfig, StubPolicy};
use crate::consts::{APEX_LABEL_PREFIX, AXIS_APEX, AXIS_VERSION};
use crate::graph::{Artifact, BuildGraph, VariantId};
use crate::module::{DependencyTag, ExportBundle};

use super::api_level::ApiLevel;

/// The deployment unit a variant effectively lives in.
///
/// A unit variant lives in its unit. The platform variant of a module that
/// some unit contains is attributed to the module's home unit.
pub fn effective_unit<'a>(graph: &'a BuildGraph, config: &'a BuildConfig, variant: VariantId) -> Option<&'a str> {
  let label = graph.variant(variant).label_or_default(AXIS_APEX);
  if let Some(unit) = label.strip_prefix(APEX_LABEL_PREFIX) {
    return Some(unit);
  }
  config.home_unit(&graph.module_of(variant).name)
}

/// Whether an edge from `source` to `target` leaves the source's deployment unit.
pub fn crosses_boundary(graph: &BuildGraph, config: &BuildConfig, source: VariantId, target: VariantId) -> bool {
  effective_unit(graph, config, source) != effective_unit(graph, config, target)
}

/// Inputs to [`choose_stub_or_impl`].
#[derive(Debug, Clone, Copy)]
pub struct SelectionRequest {
  pub tag: DependencyTag,
  /// The edge's resolved target.
  pub target: VariantId,
  pub source_bootstrap: bool,
  pub crosses_boundary: bool,
  pub policy: StubPolicy,
}

impl SelectionRequest {
  /// The request for a shared edge from `source` to its resolved `target`.
  pub fn for_edge(
    graph: &BuildGraph,
    config: &BuildConfig,
    source: VariantId,
    tag: DependencyTag,
    target: VariantId,
  ) -> Self {
    Self {
      tag,
      target,
      source_bootstrap: graph.module_of(source).decl.bootstrap,
      crosses_boundary: crosses_boundary(graph, config, source, target),
      policy: config.stub_policy,
    }
  }
}

/// The shared library variant a consumer links against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedLibSelection {
  pub module: String,
  pub variant: String,
  pub artifact: Artifact,
  pub exports: ExportBundle,
  /// Set when a stub surface was selected.
  pub stub_version: Option<ApiLevel>,
}

/// Choose between the implementation and a stub variant of a shared dependency.
///
/// An explicit pin is honored as resolved. Otherwise the highest stub is
/// chosen when the target has stubs, the policy allows it, the source is not
/// a bootstrap module and the edge crosses a deployment boundary.
pub fn choose_stub_or_impl(graph: &BuildGraph, request: &SelectionRequest) -> VariantId {
  if request.tag.explicit_version || request.tag.explicit_impl {
    return request.target;
  }
  match highest_stub(graph, request.target) {
    Some(stub)
      if request.policy == StubPolicy::LatestOnBoundary && !request.source_bootstrap && request.crosses_boundary =>
    {
      trace!(target = %graph.variant_name(stub), "stub selected across boundary");
      stub
    }
    _ => request.target,
  }
}

/// The stub variant with the highest version in the target's group.
fn highest_stub(graph: &BuildGraph, target: VariantId) -> Option<VariantId> {
  let module = graph.variant(target).module;
  let (level, label) = graph
    .offered_labels(target, AXIS_VERSION)
    .into_iter()
    .filter_map(|label| label.parse::<ApiLevel>().ok().map(|level| (level, label)))
    .max_by_key(|(level, _)| *level)?;
  trace!(%level, "highest stub version");

  let mut variations = graph.variant(target).variations.clone();
  variations.insert(AXIS_VERSION.to_string(), label.to_string());
  graph.lookup(module, &variations)
}

impl SharedLibSelection {
  /// Describe the variant a consumer links against.
  pub fn of(graph: &BuildGraph, variant: VariantId) -> Self {
    let module = graph.module_of(variant);
    let stub_version = graph
      .variant(variant)
      .label_or_default(AXIS_VERSION)
      .parse::<ApiLevel>()
      .ok();
    let exports = match (&stub_version, &module.decl.stubs) {
      (Some(_), Some(stubs)) => stubs.export.clone(),
      _ => module.decl.export.clone(),
    };

    Self {
      module: module.name.clone(),
      variant: graph.variant_name(variant),
      artifact: graph.artifact(variant),
      exports,
      stub_version,
    }
  }
}

//! Variant axes and the pass that splits the graph along one of them.
//!
//! Axes run in a fixed order. Each pass groups variants that differ only in
//! the axis being processed, asks the axis which labels the group needs,
//! creates the missing variants and rewires every edge onto the variant
//! matching the label the edge requests.

mod apex;
mod arch;
mod image;
mod link;
mod profile;
mod sanitize;
mod splitter;
mod version;

pub use apex::ApexAxis;
pub use arch::ArchAxis;
pub use image::ImageAxis;
pub use link::LinkAxis;
pub use profile::ProfileAxis;
pub use sanitize::SanitizeAxis;
pub use splitter::{PassStats, run_pass};
pub use version::VersionAxis;

use crate::config::BuildConfig;
use crate::graph::{BuildGraph, DepEdge, PassRecord, Variant};

/// Read-only view handed to axis callbacks.
#[derive(Clone, Copy)]
pub struct AxisContext<'a> {
  pub graph: &'a BuildGraph,
  pub config: &'a BuildConfig,
}

/// One dimension of variation.
pub trait Axis: Send + Sync {
  fn name(&self) -> &'static str;

  /// Called once before the pass, with the graph as earlier axes left it.
  fn prepare(&mut self, _ctx: &AxisContext<'_>) {}

  /// Labels needed by the group `variant` belongs to. A single empty label
  /// means no fan-out.
  fn split(&self, ctx: &AxisContext<'_>, variant: &Variant) -> Vec<String>;

  /// Label an edge requests from its target, given the source's own label.
  fn outgoing(&self, ctx: &AxisContext<'_>, source: &Variant, edge: &DepEdge, source_label: &str) -> String;

  /// Label the target actually provides for a request. Must always return a
  /// label the target offers.
  fn incoming(&self, ctx: &AxisContext<'_>, target: &Variant, desired: &str) -> String;

  /// Side effects for a variant that was just bound to `label`.
  fn mutate(&self, _ctx: &AxisContext<'_>, _variant: &Variant, label: &str) -> PassRecord {
    PassRecord::new(label)
  }
}

/// The standard axes in pipeline order.
pub fn standard_axes() -> Vec<Box<dyn Axis>> {
  vec![
    Box::new(ArchAxis),
    Box::new(ImageAxis),
    Box::new(LinkAxis),
    Box::new(ApexAxis),
    Box::new(SanitizeAxis),
    Box::new(VersionAxis),
    Box::new(ProfileAxis::default()),
  ]
}

/// Accept `desired` if the target's group offers it, else the group's first label.
pub(crate) fn offered_or_first(ctx: &AxisContext<'_>, target: &Variant, axis: &str, desired: &str) -> String {
  let offered = ctx.graph.offered_labels(target.id, axis);
  if offered.contains(&desired) {
    return desired.to_string();
  }
  offered
    .first()
    .map(|l| l.to_string())
    .unwrap_or_else(|| target.label_or_default(axis).to_string())
}

/// Accept `desired` if the target's group offers it, else the default label.
pub(crate) fn offered_or_default(ctx: &AxisContext<'_>, target: &Variant, axis: &str, desired: &str) -> String {
  if ctx.graph.offered_labels(target.id, axis).contains(&desired) {
    desired.to_string()
  } else {
    String::new()
  }
}

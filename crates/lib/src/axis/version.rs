use crate::consts::{AXIS_LINK, AXIS_VERSION, LINK_SHARED, PROP_STUB_VERSION};
use crate::graph::{DepEdge, PassRecord, Variant};
use crate::resolve::stub_surfaces;

use super::{Axis, AxisContext, offered_or_default};

/// Stub versions of shared libraries.
///
/// The empty label is the implementation. Pinned edges bind through an
/// exact constraint and never reach the transitions below.
pub struct VersionAxis;

impl Axis for VersionAxis {
  fn name(&self) -> &'static str {
    AXIS_VERSION
  }

  fn split(&self, ctx: &AxisContext<'_>, variant: &Variant) -> Vec<String> {
    let module = ctx.graph.module(variant.module);
    if !module.caps.stubs || variant.label_or_default(AXIS_LINK) != LINK_SHARED {
      return vec![String::new()];
    }
    std::iter::once(String::new())
      .chain(stub_surfaces(&module.decl).into_iter().map(|s| s.version.to_string()))
      .collect()
  }

  fn outgoing(&self, _ctx: &AxisContext<'_>, _source: &Variant, _edge: &DepEdge, _source_label: &str) -> String {
    String::new()
  }

  fn incoming(&self, ctx: &AxisContext<'_>, target: &Variant, desired: &str) -> String {
    offered_or_default(ctx, target, AXIS_VERSION, desired)
  }

  fn mutate(&self, _ctx: &AxisContext<'_>, _variant: &Variant, label: &str) -> PassRecord {
    if label.is_empty() {
      PassRecord::new(label)
    } else {
      PassRecord::new(label)
        .uninstallable()
        .with_property(PROP_STUB_VERSION, label)
    }
  }
}

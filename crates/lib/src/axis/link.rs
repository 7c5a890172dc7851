use crate::consts::{AXIS_LINK, LINK_SHARED, LINK_STATIC};
use crate::graph::{DepEdge, PassRecord, Variant};
use crate::module::DepKind;

use super::{Axis, AxisContext, offered_or_first};

/// Static or shared linkage of libraries.
pub struct LinkAxis;

impl Axis for LinkAxis {
  fn name(&self) -> &'static str {
    AXIS_LINK
  }

  fn split(&self, ctx: &AxisContext<'_>, variant: &Variant) -> Vec<String> {
    let module = ctx.graph.module(variant.module);
    if !module.caps.link_variants {
      return vec![String::new()];
    }
    let mut labels = Vec::new();
    if module.decl.static_enabled {
      labels.push(LINK_STATIC.to_string());
    }
    if module.decl.shared_enabled {
      labels.push(LINK_SHARED.to_string());
    }
    labels
  }

  fn outgoing(&self, _ctx: &AxisContext<'_>, _source: &Variant, edge: &DepEdge, source_label: &str) -> String {
    match edge.tag.kind {
      DepKind::Static | DepKind::WholeStatic => LINK_STATIC.to_string(),
      DepKind::Shared | DepKind::Runtime => LINK_SHARED.to_string(),
      _ => source_label.to_string(),
    }
  }

  fn incoming(&self, ctx: &AxisContext<'_>, target: &Variant, desired: &str) -> String {
    offered_or_first(ctx, target, AXIS_LINK, desired)
  }

  fn mutate(&self, _ctx: &AxisContext<'_>, _variant: &Variant, label: &str) -> PassRecord {
    PassRecord::new(label)
  }
}

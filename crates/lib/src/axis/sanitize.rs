use crate::consts::{AXIS_SANITIZE, PROP_SANITIZER};
use crate::graph::{DepEdge, PassRecord, Variant};

use super::{Axis, AxisContext, offered_or_first};

/// Sanitizer instrumentation.
pub struct SanitizeAxis;

impl Axis for SanitizeAxis {
  fn name(&self) -> &'static str {
    AXIS_SANITIZE
  }

  fn split(&self, ctx: &AxisContext<'_>, variant: &Variant) -> Vec<String> {
    let module = ctx.graph.module(variant.module);
    let sanitize = &module.decl.sanitize;
    if let Some(requested) = &sanitize.requested {
      return vec![requested.clone()];
    }
    if sanitize.never || !module.caps.sanitizable {
      return vec![String::new()];
    }
    std::iter::once(String::new())
      .chain(ctx.config.sanitizers.iter().cloned())
      .collect()
  }

  fn outgoing(&self, _ctx: &AxisContext<'_>, _source: &Variant, _edge: &DepEdge, source_label: &str) -> String {
    source_label.to_string()
  }

  fn incoming(&self, ctx: &AxisContext<'_>, target: &Variant, desired: &str) -> String {
    offered_or_first(ctx, target, AXIS_SANITIZE, desired)
  }

  fn mutate(&self, ctx: &AxisContext<'_>, variant: &Variant, label: &str) -> PassRecord {
    if label.is_empty() {
      return PassRecord::new(label);
    }
    let requested = ctx.graph.module(variant.module).decl.sanitize.requested.as_deref();
    let record = PassRecord::new(label).with_property(PROP_SANITIZER, label);
    if requested == Some(label) {
      record
    } else {
      // Only built for sanitized consumers.
      record.hidden().uninstallable()
    }
  }
}

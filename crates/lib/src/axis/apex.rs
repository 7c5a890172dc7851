use crate::consts::{APEX_LABEL_PREFIX, AXIS_APEX, PROP_UNIT};
use crate::graph::{DepEdge, PassRecord, Variant};

use super::{Axis, AxisContext};

/// Deployment unit membership.
///
/// Modules contained in units get one variant per unit next to the platform
/// variant. Unit variants are hidden from the default output.
pub struct ApexAxis;

impl Axis for ApexAxis {
  fn name(&self) -> &'static str {
    AXIS_APEX
  }

  fn split(&self, ctx: &AxisContext<'_>, variant: &Variant) -> Vec<String> {
    let module = ctx.graph.module(variant.module);
    let units = ctx.config.units_containing(&module.name);
    let mut labels = Vec::with_capacity(units.len() + 1);
    if !module.decl.apex_only {
      labels.push(String::new());
    }
    labels.extend(units.into_iter().map(|unit| format!("{}{}", APEX_LABEL_PREFIX, unit)));
    labels
  }

  fn outgoing(&self, _ctx: &AxisContext<'_>, _source: &Variant, edge: &DepEdge, source_label: &str) -> String {
    if edge.tag.deployment_exclude {
      String::new()
    } else {
      source_label.to_string()
    }
  }

  fn incoming(&self, ctx: &AxisContext<'_>, target: &Variant, desired: &str) -> String {
    let offered = ctx.graph.offered_labels(target.id, AXIS_APEX);
    if offered.contains(&desired) {
      return desired.to_string();
    }
    if offered.contains(&"") {
      return String::new();
    }
    offered.first().map(|l| l.to_string()).unwrap_or_default()
  }

  fn mutate(&self, _ctx: &AxisContext<'_>, _variant: &Variant, label: &str) -> PassRecord {
    match label.strip_prefix(APEX_LABEL_PREFIX) {
      Some(unit) => PassRecord::new(label).hidden().with_property(PROP_UNIT, unit),
      None => PassRecord::new(label),
    }
  }
}

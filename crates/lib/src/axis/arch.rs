use crate::config::{Bitness, BuildConfig};
use crate::consts::AXIS_ARCH;
use crate::graph::{DepEdge, PassRecord, Variant};
use crate::module::{ModuleDecl, Multilib};

use super::{Axis, AxisContext, offered_or_first};

/// Target architecture.
pub struct ArchAxis;

fn supported_archs<'a>(config: &'a BuildConfig, decl: &ModuleDecl) -> Vec<&'a str> {
  let targets = config.targets.iter();
  let archs: Vec<&str> = match decl.multilib {
    Multilib::Both => targets.map(|t| t.arch.as_str()).collect(),
    Multilib::First => targets.take(1).map(|t| t.arch.as_str()).collect(),
    Multilib::Lib32 => targets
      .filter(|t| t.bits == Bitness::Lib32)
      .map(|t| t.arch.as_str())
      .collect(),
    Multilib::Lib64 => targets
      .filter(|t| t.bits == Bitness::Lib64)
      .map(|t| t.arch.as_str())
      .collect(),
  };
  archs
}

impl Axis for ArchAxis {
  fn name(&self) -> &'static str {
    AXIS_ARCH
  }

  fn split(&self, ctx: &AxisContext<'_>, variant: &Variant) -> Vec<String> {
    let decl = &ctx.graph.module(variant.module).decl;
    supported_archs(ctx.config, decl).into_iter().map(String::from).collect()
  }

  fn outgoing(&self, _ctx: &AxisContext<'_>, _source: &Variant, _edge: &DepEdge, source_label: &str) -> String {
    source_label.to_string()
  }

  fn incoming(&self, ctx: &AxisContext<'_>, target: &Variant, desired: &str) -> String {
    offered_or_first(ctx, target, AXIS_ARCH, desired)
  }

  fn mutate(&self, ctx: &AxisContext<'_>, variant: &Variant, label: &str) -> PassRecord {
    let decl = &ctx.graph.module(variant.module).decl;
    let record = PassRecord::new(label);
    // An empty label means no configured target suits the module.
    if label.is_empty() || decl.disabled_archs.iter().any(|a| a == label) {
      record.disabled()
    } else {
      record
    }
  }
}

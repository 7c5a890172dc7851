//! Profile-guided optimization variants.
//!
//! Every statically linked dependency of a profiled module is rebuilt with
//! that module's profile. The variants are created on demand: a library only
//! gets a profile variant for each root that actually reaches it.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::consts::{AXIS_LINK, AXIS_PROFILE, LINK_STATIC, PROFILE_LABEL_PREFIX, PROP_PROFILE};
use crate::graph::{DepEdge, ModuleId, PassRecord, Variant, VariantId, Variations};
use crate::module::DepKind;
use crate::propagate::{Requirement, RequirementPropagator, RequirementStore};

use super::{Axis, AxisContext, offered_or_default};

type GroupKey = (ModuleId, Variations);

#[derive(Default)]
pub struct ProfileAxis {
  roots: BTreeMap<GroupKey, Requirement>,
  needs: BTreeMap<GroupKey, BTreeSet<Requirement>>,
}

impl ProfileAxis {
  fn key(ctx: &AxisContext<'_>, variant: VariantId) -> GroupKey {
    ctx.graph.group_key(variant, AXIS_PROFILE)
  }
}

impl Axis for ProfileAxis {
  fn name(&self) -> &'static str {
    AXIS_PROFILE
  }

  fn prepare(&mut self, ctx: &AxisContext<'_>) {
    self.roots.clear();
    self.needs.clear();

    let mut roots = Vec::new();
    for variant in ctx.graph.live_variants() {
      let module = ctx.graph.module(variant.module);
      if !module.decl.profile_guided || !module.caps.profile {
        continue;
      }
      if variant.label_or_default(AXIS_LINK) == LINK_STATIC {
        continue;
      }
      let Some(path) = ctx.config.profile_for(&module.name) else {
        continue;
      };
      let requirement = Requirement::new(format!("{}{}", PROFILE_LABEL_PREFIX, module.name), path);
      self.roots.insert(Self::key(ctx, variant.id), requirement.clone());
      roots.push((variant.id, requirement));
    }

    let mut store = RequirementStore::default();
    RequirementPropagator::new(DepKind::links_statically).propagate(ctx.graph, &roots, &mut store);

    for (variant, requirements) in store.iter() {
      self
        .needs
        .entry(Self::key(ctx, variant))
        .or_default()
        .extend(requirements.iter().cloned());
    }

    debug!(roots = roots.len(), reached = self.needs.len(), "profile requirements propagated");
  }

  fn split(&self, ctx: &AxisContext<'_>, variant: &Variant) -> Vec<String> {
    let key = Self::key(ctx, variant.id);
    if self.roots.contains_key(&key) {
      return vec![String::new()];
    }
    let names: BTreeSet<&str> = self
      .needs
      .get(&key)
      .into_iter()
      .flatten()
      .map(|r| r.name.as_str())
      .collect();
    std::iter::once(String::new())
      .chain(names.into_iter().map(String::from))
      .collect()
  }

  fn outgoing(&self, ctx: &AxisContext<'_>, source: &Variant, edge: &DepEdge, source_label: &str) -> String {
    if !edge.tag.kind.links_statically() {
      return String::new();
    }
    match self.roots.get(&Self::key(ctx, source.id)) {
      Some(requirement) => requirement.name.clone(),
      None => source_label.to_string(),
    }
  }

  fn incoming(&self, ctx: &AxisContext<'_>, target: &Variant, desired: &str) -> String {
    offered_or_default(ctx, target, AXIS_PROFILE, desired)
  }

  fn mutate(&self, ctx: &AxisContext<'_>, variant: &Variant, label: &str) -> PassRecord {
    let key = Self::key(ctx, variant.id);
    if label.is_empty() {
      return match self.roots.get(&key) {
        Some(requirement) => PassRecord::new(label).with_property(PROP_PROFILE, requirement.payload.clone()),
        None => PassRecord::new(label),
      };
    }

    let payload = self
      .needs
      .get(&key)
      .into_iter()
      .flatten()
      .find(|r| r.name == label)
      .map(|r| r.payload.clone())
      .unwrap_or_default();
    PassRecord::new(label)
      .hidden()
      .uninstallable()
      .with_property(PROP_PROFILE, payload)
  }
}

//! Requirement propagation along a restricted set of edge kinds.
//!
//! A root variant carries a requirement (a name and a payload). The
//! propagator pushes it onto every variant reachable from the root through
//! edges the walk is allowed to follow.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::graph::{BuildGraph, VariantId};
use crate::module::DepKind;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Requirement {
  pub name: String,
  pub payload: String,
}

impl Requirement {
  pub fn new(name: impl Into<String>, payload: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      payload: payload.into(),
    }
  }
}

/// Requirements accumulated per variant. Identical pairs collapse.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequirementStore {
  by_variant: BTreeMap<VariantId, BTreeSet<Requirement>>,
}

impl RequirementStore {
  /// Returns false if the variant already carried the requirement.
  pub fn add(&mut self, variant: VariantId, requirement: Requirement) -> bool {
    self.by_variant.entry(variant).or_default().insert(requirement)
  }

  pub fn get(&self, variant: VariantId) -> impl Iterator<Item = &Requirement> {
    self.by_variant.get(&variant).into_iter().flatten()
  }

  pub fn iter(&self) -> impl Iterator<Item = (VariantId, &BTreeSet<Requirement>)> {
    self.by_variant.iter().map(|(id, reqs)| (*id, reqs))
  }

  pub fn is_empty(&self) -> bool {
    self.by_variant.is_empty()
  }

  /// Number of `(variant, requirement)` pairs.
  pub fn len(&self) -> usize {
    self.by_variant.values().map(|r| r.len()).sum()
  }
}

/// Walks edges accepted by `follow` from each root.
pub struct RequirementPropagator {
  follow: fn(DepKind) -> bool,
}

impl RequirementPropagator {
  pub fn new(follow: fn(DepKind) -> bool) -> Self {
    Self { follow }
  }

  /// Propagate every root's requirement into `store`.
  ///
  /// Roots themselves are not recorded. Returns the number of pairs that
  /// were not already present, so a repeated call returns zero.
  pub fn propagate(&self, graph: &BuildGraph, roots: &[(VariantId, Requirement)], store: &mut RequirementStore) -> usize {
    let mut added = 0;

    for (root, requirement) in roots {
      let mut visited = BTreeSet::from([*root]);
      let mut stack = vec![*root];

      while let Some(current) = stack.pop() {
        for edge in &graph.variant(current).deps {
          if !(self.follow)(edge.tag.kind) {
            continue;
          }
          let Some(target) = edge.target.variant() else {
            continue;
          };
          if !graph.variant(target).is_live() || !visited.insert(target) {
            continue;
          }
          if store.add(target, requirement.clone()) {
            trace!(requirement = %requirement.name, variant = %graph.variant_name(target), "requirement added");
            added += 1;
          }
          stack.push(target);
        }
      }
    }

    added
  }
}

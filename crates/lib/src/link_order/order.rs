use std::collections::HashMap;

use thiserror::Error;

use crate::graph::Artifact;

use super::depset::DepSet;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkOrderError {
  /// A declared static library is missing from the transitive set.
  #[error("{artifact} is declared but absent from the transitive link order")]
  Inconsistent { artifact: String },
}

/// Graph-wide position of every artifact on a link line.
///
/// Flattening a [`DepSet`] only orders items that depend on each other, and
/// leaves unrelated items in whatever order the set was built. Sorting every
/// flattened list by one rank makes all consumers agree. Unranked artifacts
/// keep their flattened order after the ranked ones.
#[derive(Debug, Clone, Default)]
pub struct LinkRank {
  positions: HashMap<Artifact, usize>,
}

impl LinkRank {
  /// Rank artifacts in the order given. Repeats keep their first position.
  pub fn new(order: impl IntoIterator<Item = Artifact>) -> Self {
    let mut positions = HashMap::new();
    for (i, artifact) in order.into_iter().enumerate() {
      positions.entry(artifact).or_insert(i);
    }
    Self { positions }
  }

  fn position(&self, artifact: &Artifact) -> usize {
    self.positions.get(artifact).copied().unwrap_or(usize::MAX)
  }

  /// Flatten `set` and sort it by rank.
  pub fn linearize(&self, set: &DepSet<Artifact>) -> Vec<Artifact> {
    let mut list = set.to_list();
    list.sort_by_key(|a| self.position(a));
    list
  }
}

/// Reorder a consumer's declared static libraries by their position in the
/// ranked transitive link order. The first occurrence of a duplicate wins.
pub fn order_static_deps(
  direct: &[Artifact],
  transitive: &DepSet<Artifact>,
  rank: &LinkRank,
) -> Result<Vec<Artifact>, LinkOrderError> {
  let positions: HashMap<Artifact, usize> = rank
    .linearize(transitive)
    .into_iter()
    .enumerate()
    .map(|(i, a)| (a, i))
    .collect();

  let mut keyed = Vec::with_capacity(direct.len());
  for artifact in direct {
    let Some(&pos) = positions.get(artifact) else {
      return Err(LinkOrderError::Inconsistent {
        artifact: artifact.to_string(),
      });
    };
    keyed.push((pos, artifact.clone()));
  }

  keyed.sort_by_key(|(pos, _)| *pos);
  keyed.dedup_by_key(|(pos, _)| *pos);
  Ok(keyed.into_iter().map(|(_, a)| a).collect())
}

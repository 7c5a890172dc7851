//! Link dependency DAG over live variants.
//!
//! Built after every axis has run. Planning recurses over the same edges,
//! so cycles found here are reported before planning starts.

use std::collections::{BTreeSet, HashMap, HashSet};

use petgraph::algo::{tarjan_scc, toposort};
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::debug;

use super::model::BuildGraph;
use super::types::{Artifact, VariantId};

/// Directed graph of live variants connected by link edges, from dependency
/// to dependent.
pub struct VariantDag {
  graph: DiGraph<VariantId, ()>,
}

impl VariantDag {
  pub fn from_graph(build: &BuildGraph) -> Self {
    let mut graph = DiGraph::new();
    let mut nodes: HashMap<VariantId, NodeIndex> = HashMap::new();

    for variant in build.live_variants() {
      nodes.insert(variant.id, graph.add_node(variant.id));
    }

    for variant in build.live_variants() {
      let dependent = nodes[&variant.id];
      for edge in &variant.deps {
        if !edge.tag.kind.needs_plan() {
          continue;
        }
        if let Some(target) = edge.target.variant()
          && let Some(&dep) = nodes.get(&target)
        {
          graph.add_edge(dep, dependent, ());
        }
      }
    }

    debug!(nodes = graph.node_count(), edges = graph.edge_count(), "variant dag built");
    Self { graph }
  }

  /// Variants with dependencies before dependents, or `None` if there is a cycle.
  pub fn topological(&self) -> Option<Vec<VariantId>> {
    toposort(&self.graph, None)
      .ok()
      .map(|sorted| sorted.into_iter().map(|idx| self.graph[idx]).collect())
  }

  /// Every variant with its consumers before its dependencies, ties broken by
  /// artifact name.
  ///
  /// There is one such order per graph, so the link lines of two consumers
  /// agree on every pair of archives they share. Cycle members, which never
  /// become ready, follow in artifact order.
  pub fn link_rank(&self, build: &BuildGraph) -> Vec<VariantId> {
    let key = |idx: NodeIndex| (build.artifact(self.graph[idx]), idx);

    // Unemitted dependents per node. Edges run dependency -> dependent.
    let mut waiting: HashMap<NodeIndex, usize> = self
      .graph
      .node_indices()
      .map(|idx| (idx, self.graph.edges_directed(idx, Direction::Outgoing).count()))
      .collect();
    let mut ready: BTreeSet<(Artifact, NodeIndex)> = waiting
      .iter()
      .filter(|(_, count)| **count == 0)
      .map(|(idx, _)| key(*idx))
      .collect();

    let mut order = Vec::with_capacity(self.graph.node_count());
    let mut emitted = HashSet::new();
    while let Some((_, idx)) = ready.pop_first() {
      order.push(self.graph[idx]);
      emitted.insert(idx);
      for dep in self.graph.neighbors_directed(idx, Direction::Incoming) {
        if let Some(count) = waiting.get_mut(&dep) {
          *count -= 1;
          if *count == 0 {
            ready.insert(key(dep));
          }
        }
      }
    }

    let mut stuck: Vec<(Artifact, NodeIndex)> = self
      .graph
      .node_indices()
      .filter(|idx| !emitted.contains(idx))
      .map(key)
      .collect();
    stuck.sort();
    order.extend(stuck.into_iter().map(|(_, idx)| self.graph[idx]));
    order
  }

  /// Every cycle, each as its members sorted by id. Self loops count.
  pub fn cycles(&self) -> Vec<Vec<VariantId>> {
    let mut cycles: Vec<Vec<VariantId>> = tarjan_scc(&self.graph)
      .into_iter()
      .filter(|scc| scc.len() > 1 || self.graph.contains_edge(scc[0], scc[0]))
      .map(|scc| {
        let mut members: Vec<VariantId> = scc.into_iter().map(|idx| self.graph[idx]).collect();
        members.sort();
        members
      })
      .collect();
    cycles.sort();
    cycles
  }
}

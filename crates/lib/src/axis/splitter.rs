use std::collections::BTreeMap;

use rayon::prelude::*;
use tracing::{debug, trace};

use crate::config::BuildConfig;
use crate::error::{Diagnostics, ResolveError};
use crate::graph::{AxisConstraint, BuildGraph, DepEdge, EdgeTarget, ModuleId, Variant, VariantId, Variations};

use super::{Axis, AxisContext};

/// Counters for one axis pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassStats {
  pub axis: &'static str,
  pub groups: usize,
  /// Variants created by cloning.
  pub created: usize,
  /// Previously unbound variants bound in place.
  pub bound: usize,
  pub edge_errors: usize,
}

/// Run one axis over the whole graph.
///
/// Re-running a pass over a graph it already processed creates nothing.
pub fn run_pass(
  axis: &mut dyn Axis,
  graph: &mut BuildGraph,
  config: &BuildConfig,
  diagnostics: &mut Diagnostics,
) -> PassStats {
  let name = axis.name();
  axis.prepare(&AxisContext { graph: &*graph, config });
  let axis: &dyn Axis = axis;

  let mut stats = PassStats {
    axis: name,
    ..PassStats::default()
  };

  // Group variants that differ only in this axis. Members are in id order.
  let mut groups: BTreeMap<(ModuleId, Variations), Vec<VariantId>> = BTreeMap::new();
  for variant in graph.variants() {
    groups.entry(graph.group_key(variant.id, name)).or_default().push(variant.id);
  }
  stats.groups = groups.len();

  let representatives: Vec<VariantId> = groups
    .values()
    .map(|members| {
      members
        .iter()
        .copied()
        .find(|id| graph.variant(*id).label(name).is_none())
        .unwrap_or(members[0])
    })
    .collect();

  let planned: Vec<(VariantId, Vec<String>)> = {
    let ctx = AxisContext { graph: &*graph, config };
    representatives
      .par_iter()
      .map(|rep| (*rep, split_labels(axis, &ctx, ctx.graph.variant(*rep))))
      .collect()
  };

  // Create every variant before any mutate or edge transition runs.
  let mut touched = Vec::new();
  for (rep, labels) in planned {
    let (module, rest) = graph.group_key(rep, name);
    let mut rep_bound = graph.variant(rep).label(name).is_some();

    for label in &labels {
      let mut variations = rest.clone();
      variations.insert(name.to_string(), label.clone());
      if graph.lookup(module, &variations).is_some() {
        continue;
      }
      if rep_bound {
        let id = graph.clone_variant(rep, name, label);
        debug!(axis = name, variant = %graph.variant_name(id), "variant created");
        touched.push(id);
        stats.created += 1;
      } else {
        graph.bind(rep, name, label);
        touched.push(rep);
        stats.bound += 1;
        rep_bound = true;
      }
    }

    if !rep_bound {
      debug!(axis = name, variant = %graph.variant_name(rep), "unbound variant duplicates existing tuples, disabling");
      graph.variant_mut(rep).disabled = true;
    }
  }

  let records = {
    let ctx = AxisContext { graph: &*graph, config };
    touched
      .par_iter()
      .map(|id| {
        let variant = ctx.graph.variant(*id);
        (*id, axis.mutate(&ctx, variant, variant.label_or_default(name)))
      })
      .collect::<Vec<_>>()
  };
  for (id, record) in records {
    let variant = graph.variant_mut(id);
    variant.hidden |= record.hidden;
    variant.installable &= !record.uninstallable;
    variant.disabled |= record.disabled;
    graph.records.insert(id, name, record);
  }

  // Transitions are computed in parallel and applied in order.
  let updates = {
    let ctx = AxisContext { graph: &*graph, config };
    ctx
      .graph
      .variants()
      .par_iter()
      .filter(|source| source.is_live())
      .flat_map_iter(|source| {
        let source_label = source.label_or_default(name);
        source
          .deps
          .iter()
          .enumerate()
          .filter_map(|(index, edge)| {
            let target = edge.target.variant()?;
            Some((source.id, index, transition(axis, &ctx, source, edge, target, source_label)))
          })
          .collect::<Vec<_>>()
      })
      .collect::<Vec<_>>()
  };

  for (source, index, result) in updates {
    match result {
      Ok(target) => graph.set_edge_target(source, index, EdgeTarget::Variant(target)),
      Err(error) => {
        let module = graph.module_of(source).name.clone();
        diagnostics.push(&module, Some(graph.variant_name(source)), error);
        graph.set_edge_target(source, index, EdgeTarget::Unresolved);
        graph.mark_failed(source);
        stats.edge_errors += 1;
      }
    }
  }

  debug!(
    axis = name,
    groups = stats.groups,
    created = stats.created,
    bound = stats.bound,
    variants = graph.variant_count(),
    "axis pass complete"
  );
  stats
}

fn split_labels(axis: &dyn Axis, ctx: &AxisContext<'_>, variant: &Variant) -> Vec<String> {
  let mut labels: Vec<String> = Vec::new();
  for label in axis.split(ctx, variant) {
    if !labels.contains(&label) {
      labels.push(label);
    }
  }
  if labels.is_empty() {
    labels.push(String::new());
  }
  labels
}

fn transition(
  axis: &dyn Axis,
  ctx: &AxisContext<'_>,
  source: &Variant,
  edge: &DepEdge,
  target: VariantId,
  source_label: &str,
) -> Result<VariantId, ResolveError> {
  let name = axis.name();
  let current = ctx.graph.variant(target);

  let label = match edge.constraints.get(name) {
    Some(AxisConstraint::Exact(label)) => label.clone(),
    Some(AxisConstraint::Inherit) => axis.incoming(ctx, current, source_label),
    Some(AxisConstraint::Any) => return Ok(target),
    None => {
      let desired = axis.outgoing(ctx, source, edge, source_label);
      axis.incoming(ctx, current, &desired)
    }
  };

  let mut variations = current.variations.clone();
  variations.insert(name.to_string(), label.clone());
  trace!(axis = name, dep = %edge.name, %label, "edge transition");

  ctx
    .graph
    .lookup(current.module, &variations)
    .ok_or_else(|| ResolveError::MissingVariation {
      dep: ctx.graph.module(current.module).name.clone(),
      axis: name.to_string(),
      label,
    })
}

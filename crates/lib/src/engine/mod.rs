//! Pipeline driver.
//!
//! The engine owns the ordered axis list. A run builds the graph from
//! declarations, applies every axis pass, verifies the resolved edges,
//! checks graph invariants, plans every variant and emits a [`Manifest`].
//! Errors are collected across all phases; see [`Resolution::ensure_success`].

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::axis::{Axis, PassStats, run_pass, standard_axes};
use crate::check::InvariantChecker;
use crate::config::BuildConfig;
use crate::error::{Diagnostics, EngineError, ResolveError};
use crate::graph::{BuildGraph, EdgeTarget, VariantDag, VariantId};
use crate::manifest::{Manifest, PlanRecord};
use crate::module::ModuleDecl;
use crate::plan::ActionPlanner;

/// Result of a run. Always produced, even when errors were found.
#[derive(Debug)]
pub struct Resolution {
  pub graph: BuildGraph,
  pub manifest: Manifest,
  pub diagnostics: Diagnostics,
  pub passes: Vec<PassStats>,
}

impl Resolution {
  pub fn is_success(&self) -> bool {
    self.diagnostics.is_success()
  }

  /// Fail with every collected diagnostic if any error was found.
  pub fn ensure_success(&self) -> Result<(), EngineError> {
    if self.diagnostics.is_success() {
      Ok(())
    } else {
      Err(EngineError::from_diagnostics(&self.diagnostics))
    }
  }
}

pub struct Engine {
  config: BuildConfig,
  axes: Vec<Box<dyn Axis>>,
}

impl Engine {
  /// An engine running the standard axes.
  pub fn new(config: BuildConfig) -> Self {
    Self::with_axes(config, standard_axes())
  }

  /// An engine running `axes` in the given order.
  pub fn with_axes(config: BuildConfig, axes: Vec<Box<dyn Axis>>) -> Self {
    Self { config, axes }
  }

  pub fn config(&self) -> &BuildConfig {
    &self.config
  }

  pub fn run(&mut self, decls: Vec<ModuleDecl>) -> Resolution {
    let mut diagnostics = Diagnostics::default();
    let mut graph = BuildGraph::from_decls(decls, &self.config, &mut diagnostics);

    let mut passes = Vec::with_capacity(self.axes.len());
    for axis in self.axes.iter_mut() {
      passes.push(run_pass(axis.as_mut(), &mut graph, &self.config, &mut diagnostics));
    }

    reject_disabled_targets(&mut graph, &mut diagnostics);
    reject_cycles(&mut graph, &mut diagnostics);

    diagnostics.extend(InvariantChecker::new(&graph, &self.config).check());

    let plans = plan_all(&graph, &self.config, &mut diagnostics);
    let manifest = Manifest::from_graph(&graph, &plans, &diagnostics.missing);
    diagnostics.sort();

    info!(
      modules = graph.modules().len(),
      variants = manifest.variants.len(),
      errors = diagnostics.error_count(),
      missing = diagnostics.missing.len(),
      "resolution complete"
    );

    Resolution {
      graph,
      manifest,
      diagnostics,
      passes,
    }
  }
}

/// Edges must never end on a disabled variant.
fn reject_disabled_targets(graph: &mut BuildGraph, diagnostics: &mut Diagnostics) {
  let mut rejected: Vec<(VariantId, usize, VariantId)> = Vec::new();
  for variant in graph.live_variants() {
    for (index, edge) in variant.deps.iter().enumerate() {
      if let Some(target) = edge.target.variant()
        && graph.variant(target).disabled
      {
        rejected.push((variant.id, index, target));
      }
    }
  }

  for (source, index, target) in rejected {
    let module = graph.module_of(source).name.clone();
    diagnostics.push(
      &module,
      Some(graph.variant_name(source)),
      ResolveError::DisabledDependency {
        dep: graph.variant_name(target),
      },
    );
    graph.set_edge_target(source, index, EdgeTarget::Unresolved);
    graph.mark_failed(source);
  }
}

fn reject_cycles(graph: &mut BuildGraph, diagnostics: &mut Diagnostics) {
  let cycles = VariantDag::from_graph(graph).cycles();
  for members in cycles {
    let chain = members
      .iter()
      .map(|id| graph.variant_name(*id))
      .collect::<Vec<_>>()
      .join(" -> ");
    debug!(%chain, "dependency cycle");
    for id in members {
      let module = graph.module_of(id).name.clone();
      diagnostics.push(
        &module,
        Some(graph.variant_name(id)),
        ResolveError::DependencyCycle { chain: chain.clone() },
      );
      graph.mark_failed(id);
    }
  }
}

fn plan_all(graph: &BuildGraph, config: &BuildConfig, diagnostics: &mut Diagnostics) -> BTreeMap<VariantId, PlanRecord> {
  let mut planner = ActionPlanner::new(graph, config);
  let mut plans = BTreeMap::new();

  // Dependencies first keeps the planner's recursion shallow. With cycles
  // present, fall back to id order.
  let order = VariantDag::from_graph(graph)
    .topological()
    .unwrap_or_else(|| graph.live_variants().map(|v| v.id).collect());

  for id in order {
    if graph.is_failed(id) {
      continue;
    }
    match planner.plan(id) {
      Ok(plan) => {
        plans.insert(id, PlanRecord::from_plan(&plan, planner.rank()));
      }
      Err(error) => {
        diagnostics.push(&graph.module_of(id).name, Some(graph.variant_name(id)), error);
      }
    }
  }

  debug!(planned = plans.len(), "action planning complete");
  plans
}

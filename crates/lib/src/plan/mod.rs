//! Per-variant action planning.
//!
//! Plans are computed on demand and memoized. A variant's plan needs the
//! plans of its static and shared dependencies, so planning recurses along
//! those edges. Cycles must be removed before planning starts.
//!
//! Every flattened static list is sorted by one [`LinkRank`] computed over the
//! whole graph, so two consumers never disagree on the relative order of the
//! archives they both link.

mod types;

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use tracing::trace;

use crate::config::BuildConfig;
use crate::consts::{AXIS_LINK, AXIS_PROFILE, AXIS_SANITIZE, AXIS_VERSION, LINK_STATIC, PROP_PROFILE, PROP_SANITIZER};
use crate::error::ResolveError;
use crate::graph::{Artifact, BuildGraph, EdgeTarget, VariantDag, VariantId};
use crate::link_order::{DepSet, LinkRank, Order, order_static_deps};
use crate::module::{DepKind, ModuleKind};
use crate::resolve::{SelectionRequest, SharedLibSelection, choose_stub_or_impl};

pub use types::{LinkInputs, VariantPlan};

pub struct ActionPlanner<'a> {
  graph: &'a BuildGraph,
  config: &'a BuildConfig,
  rank: LinkRank,
  plans: HashMap<VariantId, Result<Arc<VariantPlan>, ResolveError>>,
  in_progress: BTreeSet<VariantId>,
}

impl<'a> ActionPlanner<'a> {
  pub fn new(graph: &'a BuildGraph, config: &'a BuildConfig) -> Self {
    let rank = LinkRank::new(
      VariantDag::from_graph(graph)
        .link_rank(graph)
        .into_iter()
        .map(|id| graph.artifact(id)),
    );
    Self {
      graph,
      config,
      rank,
      plans: HashMap::new(),
      in_progress: BTreeSet::new(),
    }
  }

  pub fn rank(&self) -> &LinkRank {
    &self.rank
  }

  /// Plan a variant, reusing earlier results.
  pub fn plan(&mut self, id: VariantId) -> Result<Arc<VariantPlan>, ResolveError> {
    if let Some(result) = self.plans.get(&id) {
      return result.clone();
    }
    if !self.in_progress.insert(id) {
      return Err(ResolveError::DependencyCycle {
        chain: self.graph.variant_name(id),
      });
    }
    let result = self.compute(id).map(Arc::new);
    self.in_progress.remove(&id);
    self.plans.insert(id, result.clone());
    result
  }

  /// Plan of a dependency, turning its failure into a failure of the consumer.
  fn dep_plan(&mut self, dep: VariantId) -> Result<Arc<VariantPlan>, ResolveError> {
    if self.graph.is_failed(dep) || !self.graph.variant(dep).is_live() {
      return Err(ResolveError::DependencyFailed {
        dep: self.graph.variant_name(dep),
      });
    }
    self.plan(dep).map_err(|_| ResolveError::DependencyFailed {
      dep: self.graph.variant_name(dep),
    })
  }

  fn compute(&mut self, id: VariantId) -> Result<VariantPlan, ResolveError> {
    let graph = self.graph;
    let variant = graph.variant(id);
    let module = graph.module(variant.module);
    let artifact = graph.artifact(id);

    if !variant.label_or_default(AXIS_VERSION).is_empty() {
      trace!(variant = %graph.variant_name(id), "stub variant has nothing to link");
      return Ok(VariantPlan {
        artifact,
        link_order: DepSet::empty(Order::Topological),
        link_inputs: LinkInputs::default(),
        same_unit_impls: DepSet::empty(Order::Preorder),
        exports: module.decl.stubs.as_ref().map(|s| s.export.clone()).unwrap_or_default(),
        cflags: Vec::new(),
      });
    }

    let mut inputs = LinkInputs::default();
    let mut exports = module.decl.export.clone();
    let mut declared_static: Vec<Artifact> = Vec::new();
    let mut whole: BTreeSet<Artifact> = BTreeSet::new();
    let mut transitive = DepSet::builder(Order::Topological);
    let mut impls = DepSet::builder(Order::Preorder);

    for edge in &variant.deps {
      let target = match edge.target {
        EdgeTarget::Variant(target) => target,
        EdgeTarget::Missing | EdgeTarget::Unresolved => continue,
      };

      match edge.tag.kind {
        DepKind::Static | DepKind::WholeStatic => {
          let plan = self.dep_plan(target)?;
          declared_static.push(plan.artifact.clone());
          if edge.tag.kind == DepKind::WholeStatic {
            whole.insert(plan.artifact.clone());
          }
          transitive.add_transitive(plan.link_order.clone());
          impls.add_transitive(plan.same_unit_impls.clone());
          inputs.exported.merge(&plan.exports);
          if edge.tag.reexport {
            exports.merge(&plan.exports);
          }
        }
        DepKind::Shared => {
          let request = SelectionRequest::for_edge(graph, self.config, id, edge.tag, target);
          let chosen = choose_stub_or_impl(graph, &request);
          let plan = self.dep_plan(chosen)?;
          let mut selection = SharedLibSelection::of(graph, chosen);
          selection.exports = plan.exports.clone();

          transitive.add_transitive(plan.link_order.clone());
          if selection.stub_version.is_none() && !edge.tag.deployment_exclude {
            impls.add_transitive(DepSet::new(
              Order::Preorder,
              vec![selection.artifact.clone()],
              vec![plan.same_unit_impls.clone()],
            ));
          }
          inputs.exported.merge(&selection.exports);
          if edge.tag.reexport {
            exports.merge(&selection.exports);
          }
          inputs.shared_libs.push(selection);
        }
        DepKind::Header => {
          let header_exports = &graph.module_of(target).decl.export;
          inputs.exported.merge(header_exports);
          if edge.tag.reexport {
            exports.merge(header_exports);
          }
        }
        DepKind::Object => inputs.objects.push(graph.artifact(target)),
        DepKind::CrtBegin => inputs.crt_begin.push(graph.artifact(target)),
        DepKind::CrtEnd => inputs.crt_end.push(graph.artifact(target)),
        DepKind::Runtime => inputs.runtime_libs.push(graph.artifact(target)),
        DepKind::Data => inputs.data.push(graph.artifact(target)),
      }
    }

    let transitive = transitive.build();
    let ordered = order_static_deps(&declared_static, &transitive, &self.rank)?;
    let (whole_static, static_libs): (Vec<Artifact>, Vec<Artifact>) =
      ordered.into_iter().partition(|a| whole.contains(a));
    inputs.static_libs = static_libs;
    inputs.whole_static_libs = whole_static;

    let link_order = if module.kind == ModuleKind::Library && variant.label_or_default(AXIS_LINK) == LINK_STATIC {
      DepSet::new(Order::Topological, vec![artifact.clone()], vec![transitive])
    } else {
      transitive
    };

    let mut cflags = Vec::new();
    if let Some(profile) = graph.records.property(id, AXIS_PROFILE, PROP_PROFILE) {
      cflags.push(format!("-fprofile-sample-use={}", profile));
    }
    if let Some(sanitizer) = graph.records.property(id, AXIS_SANITIZE, PROP_SANITIZER) {
      cflags.push(format!("-fsanitize={}", sanitizer));
    }

    Ok(VariantPlan {
      artifact,
      link_order,
      link_inputs: inputs,
      same_unit_impls: impls.build(),
      exports,
      cflags,
    })
  }
}

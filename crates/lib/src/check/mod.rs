//! Graph-wide invariants checked after every axis has run.
//!
//! - STL family compatibility on library edges.
//! - API level: a module built against an SDK may only link libraries built
//!   against the same or an older level, or stub surfaces.
//! - Double loading: libraries reachable at runtime from a stable interface
//!   must themselves be stable or safe to load twice.
//!
//! Shared edges are judged against the variant the consumer actually links,
//! which is a stub whenever the planner would pick one.

use std::collections::BTreeSet;

use rayon::prelude::*;
use tracing::debug;

use crate::config::BuildConfig;
use crate::consts::{AXIS_LINK, AXIS_VERSION, LINK_SHARED, PERMISSIVE_STLS};
use crate::error::{Diagnostic, ResolveError};
use crate::graph::{BuildGraph, DepEdge, Variant, VariantId};
use crate::module::{DepKind, ModuleDecl};
use crate::resolve::{ApiLevel, SelectionRequest, choose_stub_or_impl};

pub struct InvariantChecker<'a> {
  graph: &'a BuildGraph,
  config: &'a BuildConfig,
}

/// STL family of a declaration. `None` places no restriction.
fn stl_family(stl: Option<&str>) -> Option<&str> {
  match stl {
    None | Some("none") => None,
    Some(s) if PERMISSIVE_STLS.contains(&s) => None,
    Some("libc++") | Some("libc++_static") => Some("libc++"),
    Some(s) => Some(s),
  }
}

fn sdk_level(decl: &ModuleDecl) -> Option<ApiLevel> {
  decl.sdk_version.as_deref().and_then(|s| s.parse().ok())
}

impl<'a> InvariantChecker<'a> {
  pub fn new(graph: &'a BuildGraph, config: &'a BuildConfig) -> Self {
    Self { graph, config }
  }

  /// Run every check. Violations are sorted and never deduplicated away.
  pub fn check(&self) -> Vec<Diagnostic> {
    let mut violations: Vec<Diagnostic> = self
      .graph
      .variants()
      .par_iter()
      .filter(|v| v.is_live())
      .flat_map_iter(|v| {
        let mut found = self.check_link_types(v);
        found.extend(self.check_double_load(v));
        found
      })
      .collect();

    violations.sort_by(|a, b| {
      (&a.module, &a.variant, a.error.to_string()).cmp(&(&b.module, &b.variant, b.error.to_string()))
    });
    debug!(violations = violations.len(), "invariant check complete");
    violations
  }

  fn diagnostic(&self, source: &Variant, error: ResolveError) -> Diagnostic {
    Diagnostic {
      module: self.graph.module(source.module).name.clone(),
      variant: Some(self.graph.variant_name(source.id)),
      error,
    }
  }

  /// The variant `source` links through `edge`.
  fn linked_target(&self, source: VariantId, edge: &DepEdge) -> Option<VariantId> {
    let target = edge.target.variant()?;
    if edge.tag.kind != DepKind::Shared {
      return Some(target);
    }
    let request = SelectionRequest::for_edge(self.graph, self.config, source, edge.tag, target);
    Some(choose_stub_or_impl(self.graph, &request))
  }

  fn check_link_types(&self, source: &Variant) -> Vec<Diagnostic> {
    let from = &self.graph.module(source.module).decl;
    let mut found = Vec::new();

    for edge in &source.deps {
      if !edge.tag.kind.is_library() {
        continue;
      }
      let Some(target) = self.linked_target(source.id, edge) else {
        continue;
      };
      let to_variant = self.graph.variant(target);
      let to = &self.graph.module(to_variant.module).decl;

      if let (Some(a), Some(b)) = (stl_family(from.stl.as_deref()), stl_family(to.stl.as_deref()))
        && a != b
      {
        found.push(self.diagnostic(
          source,
          ResolveError::LinkType {
            dep: to.name.clone(),
            message: format!("incompatible STL: {:?} cannot link {:?}", from.stl, to.stl),
          },
        ));
      }

      if let Some(message) = api_level_violation(from, to, to_variant) {
        found.push(self.diagnostic(
          source,
          ResolveError::LinkType {
            dep: to.name.clone(),
            message,
          },
        ));
      }
    }
    found
  }

  fn check_double_load(&self, start: &Variant) -> Vec<Diagnostic> {
    let module = self.graph.module(start.module);
    if !module.decl.stable_interface
      || start.label_or_default(AXIS_LINK) != LINK_SHARED
      || !start.label_or_default(AXIS_VERSION).is_empty()
    {
      return Vec::new();
    }

    let mut found = Vec::new();
    let mut visited: BTreeSet<VariantId> = BTreeSet::from([start.id]);
    let mut stack: Vec<(VariantId, Vec<String>)> = vec![(start.id, vec![module.name.clone()])];

    while let Some((current, path)) = stack.pop() {
      for edge in &self.graph.variant(current).deps {
        if !edge.tag.kind.exercised_at_runtime() {
          continue;
        }
        let Some(target) = self.linked_target(current, edge) else {
          continue;
        };
        if !visited.insert(target) {
          continue;
        }
        let to_variant = self.graph.variant(target);
        let to = &self.graph.module(to_variant.module).decl;
        let mut next = path.clone();
        next.push(to.name.clone());

        if !to_variant.label_or_default(AXIS_VERSION).is_empty() {
          continue;
        }
        // Keep walking through system-only libraries: they may still reach
        // a vendor-available one.
        if !to.image.has_non_system_variants() || to.double_loadable {
          stack.push((target, next));
          continue;
        }
        if to.stable_interface {
          continue;
        }
        found.push(self.diagnostic(
          start,
          ResolveError::DoubleLoad {
            dep: to.name.clone(),
            path: next.join(" -> "),
          },
        ));
      }
    }
    found
  }
}

/// API level rule for one edge, or `None` if it holds.
fn api_level_violation(from: &ModuleDecl, to: &ModuleDecl, to_variant: &Variant) -> Option<String> {
  let source = sdk_level(from)?;
  if !to_variant.label_or_default(AXIS_VERSION).is_empty() {
    return None;
  }
  let Some(target) = sdk_level(to) else {
    return Some(format!("sdk_version {} module links a platform library", source));
  };
  match (source, target) {
    (ApiLevel::Current, _) => None,
    (_, ApiLevel::Current) => Some(format!("sdk_version {} module links a library built against current", source)),
    (ApiLevel::Numeric(s), ApiLevel::Numeric(t)) if t > s => {
      Some(format!("sdk_version {} module links a library built against {}", s, t))
    }
    _ => None,
  }
}

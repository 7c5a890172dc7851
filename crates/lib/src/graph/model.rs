//! The mutable build graph: modules, variants and their dependency edges.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, trace, warn};

use crate::config::BuildConfig;
use crate::consts::{AXIS_LINK, AXIS_VERSION, LINK_SHARED, LINK_STATIC};
use crate::error::{Diagnostics, ResolveError};
use crate::module::{DepKind, DependencyTag, ModuleDecl, ModuleKind, is_impl_pin, validate_decl};
use crate::resolve::ApiLevel;

use super::types::{
  Artifact, AxisConstraint, DepEdge, EdgeTarget, Module, ModuleId, PassRecords, Variant, VariantId, Variations,
};

/// Modules, their variants and the edges between them.
///
/// Variants are never removed. A `(module, variations)` tuple maps to at most
/// one variant.
#[derive(Debug, Default)]
pub struct BuildGraph {
  modules: Vec<Module>,
  variants: Vec<Variant>,
  by_name: BTreeMap<String, ModuleId>,
  tuples: BTreeMap<(ModuleId, Variations), VariantId>,
  failed: BTreeSet<VariantId>,
  /// Outputs of every axis pass, keyed by variant and axis.
  pub records: PassRecords,
}

impl BuildGraph {
  /// Build the initial graph with one unbound variant per module.
  ///
  /// Configuration problems and undefined dependencies are reported to
  /// `diagnostics`; the affected modules are still added.
  pub fn from_decls(decls: Vec<ModuleDecl>, config: &BuildConfig, diagnostics: &mut Diagnostics) -> Self {
    let mut graph = Self::default();

    for decl in decls {
      if graph.by_name.contains_key(&decl.name) {
        diagnostics.push(
          &decl.name,
          None,
          ResolveError::configuration("name", "module is defined more than once"),
        );
        continue;
      }
      for error in validate_decl(&decl, config) {
        diagnostics.push(&decl.name, None, error);
      }
      graph.add_module(decl);
    }

    let module_ids: Vec<ModuleId> = graph.modules.iter().map(|m| m.id).collect();
    for id in module_ids {
      let edges = graph.declared_edges(id, config, diagnostics);
      let variant = graph.modules[id.0].variants[0];
      graph.variants[variant.0].deps = edges;
    }

    debug!(
      modules = graph.modules.len(),
      missing = diagnostics.missing.len(),
      "build graph created"
    );
    graph
  }

  fn add_module(&mut self, decl: ModuleDecl) {
    let id = ModuleId(self.modules.len());
    let variant_id = VariantId(self.variants.len());

    trace!(module = %decl.name, kind = %decl.kind, "adding module");
    self.by_name.insert(decl.name.clone(), id);
    self.tuples.insert((id, Variations::new()), variant_id);
    self.variants.push(Variant {
      id: variant_id,
      module: id,
      variations: Variations::new(),
      disabled: !decl.enabled,
      hidden: false,
      installable: true,
      deps: Vec::new(),
    });
    self.modules.push(Module {
      id,
      name: decl.name.clone(),
      kind: decl.kind,
      caps: decl.kind.capabilities(),
      decl,
      variants: vec![variant_id],
    });
  }

  /// Turn a module's dependency declarations into edges on its initial variant.
  fn declared_edges(&self, id: ModuleId, config: &BuildConfig, diagnostics: &mut Diagnostics) -> Vec<DepEdge> {
    let module = &self.modules[id.0];
    let mut edges = Vec::with_capacity(module.decl.deps.len());

    for dep in &module.decl.deps {
      let (name, pin) = dep.name_and_version();
      let mut tag = DependencyTag::new(dep.kind);
      tag.reexport = dep.reexport;
      tag.deployment_exclude = dep.deployment_exclude;

      let mut constraints = BTreeMap::new();
      if dep.kind == DepKind::Header {
        constraints.insert(AXIS_LINK.to_string(), AxisConstraint::Any);
      }

      let Some(&target_id) = self.by_name.get(name) else {
        if config.allow_missing_dependencies {
          warn!(module = %module.name, dep = %name, "dependency on undefined module tolerated");
          diagnostics.missing.insert(name.to_string());
          edges.push(DepEdge {
            name: name.to_string(),
            tag,
            constraints,
            target: EdgeTarget::Missing,
          });
        } else {
          diagnostics.push(
            &module.name,
            None,
            ResolveError::MissingDependency { dep: name.to_string() },
          );
        }
        continue;
      };

      let target = &self.modules[target_id.0];
      if let Some(message) = link_mismatch(dep.kind, target) {
        diagnostics.push(&module.name, None, ResolveError::configuration("deps", message));
        continue;
      }
      if let Some(pin) = pin {
        if target.decl.stubs.is_none() {
          warn!(module = %module.name, dep = %dep.name, "version pin on library without stubs dropped");
        } else if is_impl_pin(pin) {
          tag.explicit_impl = true;
          constraints.insert(AXIS_VERSION.to_string(), AxisConstraint::Exact(String::new()));
        } else {
          match pin.parse::<ApiLevel>() {
            Ok(level) => {
              tag.explicit_version = true;
              constraints.insert(AXIS_VERSION.to_string(), AxisConstraint::Exact(level.to_string()));
            }
            Err(e) => diagnostics.push(&module.name, None, ResolveError::configuration("deps", e.to_string())),
          }
        }
      }

      edges.push(DepEdge {
        name: name.to_string(),
        tag,
        constraints,
        target: EdgeTarget::Variant(target.variants[0]),
      });
    }

    edges
  }

  pub fn modules(&self) -> &[Module] {
    &self.modules
  }

  pub fn module(&self, id: ModuleId) -> &Module {
    &self.modules[id.0]
  }

  pub fn module_by_name(&self, name: &str) -> Option<&Module> {
    self.by_name.get(name).map(|id| &self.modules[id.0])
  }

  pub fn module_of(&self, variant: VariantId) -> &Module {
    &self.modules[self.variants[variant.0].module.0]
  }

  pub fn variants(&self) -> &[Variant] {
    &self.variants
  }

  pub fn variant(&self, id: VariantId) -> &Variant {
    &self.variants[id.0]
  }

  pub fn variant_count(&self) -> usize {
    self.variants.len()
  }

  pub fn live_variants(&self) -> impl Iterator<Item = &Variant> {
    self.variants.iter().filter(|v| v.is_live())
  }

  /// Find the variant of `module` bound to exactly `variations`.
  pub fn lookup(&self, module: ModuleId, variations: &Variations) -> Option<VariantId> {
    self.tuples.get(&(module, variations.clone())).copied()
  }

  /// Variations of `variant` with `axis` removed: the key of its split group.
  pub fn group_key(&self, variant: VariantId, axis: &str) -> (ModuleId, Variations) {
    let v = &self.variants[variant.0];
    let mut rest = v.variations.clone();
    rest.remove(axis);
    (v.module, rest)
  }

  /// Labels bound on `axis` by the variants sharing `variant`'s group, in id order.
  pub fn offered_labels(&self, variant: VariantId, axis: &str) -> Vec<&str> {
    let key = self.group_key(variant, axis);
    let mut labels: Vec<&str> = Vec::new();
    for id in &self.modules[key.0.0].variants {
      let v = &self.variants[id.0];
      if self.group_key(*id, axis) != key {
        continue;
      }
      if let Some(label) = v.label(axis)
        && !labels.contains(&label)
      {
        labels.push(label);
      }
    }
    labels
  }

  /// Bind `axis` of an existing variant in place.
  pub(crate) fn bind(&mut self, id: VariantId, axis: &str, label: &str) {
    let v = &mut self.variants[id.0];
    self.tuples.remove(&(v.module, v.variations.clone()));
    v.variations.insert(axis.to_string(), label.to_string());
    self.tuples.insert((v.module, v.variations.clone()), id);
  }

  /// Create a copy of `from` bound to `label` on `axis`.
  ///
  /// The copy inherits flags, edges and pass records of earlier axes.
  pub(crate) fn clone_variant(&mut self, from: VariantId, axis: &str, label: &str) -> VariantId {
    let id = VariantId(self.variants.len());
    let mut variant = self.variants[from.0].clone();
    variant.id = id;
    variant.variations.insert(axis.to_string(), label.to_string());

    self.tuples.insert((variant.module, variant.variations.clone()), id);
    self.modules[variant.module.0].variants.push(id);
    self.variants.push(variant);
    self.records.copy_all(from, id);
    if self.failed.contains(&from) {
      self.failed.insert(id);
    }
    id
  }

  pub(crate) fn variant_mut(&mut self, id: VariantId) -> &mut Variant {
    &mut self.variants[id.0]
  }

  pub(crate) fn set_edge_target(&mut self, variant: VariantId, edge: usize, target: EdgeTarget) {
    self.variants[variant.0].deps[edge].target = target;
  }

  pub(crate) fn mark_failed(&mut self, variant: VariantId) {
    self.failed.insert(variant);
  }

  /// Whether an error has been reported for this variant.
  pub fn is_failed(&self, variant: VariantId) -> bool {
    self.failed.contains(&variant)
  }

  /// Human readable name, e.g. `libfoo[arch=arm64,link=static]`. Default
  /// labels are left out.
  pub fn variant_name(&self, id: VariantId) -> String {
    let v = &self.variants[id.0];
    let name = &self.modules[v.module.0].name;
    let labels: Vec<String> = v
      .variations
      .iter()
      .filter(|(_, label)| !label.is_empty())
      .map(|(axis, label)| format!("{}={}", axis, label))
      .collect();
    if labels.is_empty() {
      name.clone()
    } else {
      format!("{}[{}]", name, labels.join(","))
    }
  }

  /// The primary output of a variant.
  pub fn artifact(&self, id: VariantId) -> Artifact {
    let v = &self.variants[id.0];
    let module = &self.modules[v.module.0];
    let dir: Vec<&str> = v
      .variations
      .values()
      .filter(|label| !label.is_empty())
      .map(|label| label.as_str())
      .collect();
    let dir = if dir.is_empty() { "default".to_string() } else { dir.join("_") };
    let ext = match module.kind {
      ModuleKind::Library => match v.label_or_default(AXIS_LINK) {
        LINK_STATIC => ".a",
        LINK_SHARED => ".so",
        _ => "",
      },
      ModuleKind::Object | ModuleKind::Crt => ".o",
      ModuleKind::Binary | ModuleKind::Headers => "",
    };
    Artifact(format!("{}/{}/{}{}", module.name, dir, module.name, ext))
  }
}

/// Why a library edge of `kind` cannot land on `target`, if it cannot.
fn link_mismatch(kind: DepKind, target: &Module) -> Option<String> {
  if !kind.is_library() {
    return None;
  }
  if !target.caps.linkable {
    return Some(format!(
      "{} dependency on {} module {:?}, which cannot be linked",
      kind, target.kind, target.name
    ));
  }
  if !target.caps.link_variants {
    return match kind {
      DepKind::Header => None,
      _ => Some(format!(
        "{} dependency on {} module {:?}, which is not a library",
        kind, target.kind, target.name
      )),
    };
  }
  if kind.is_static() && !target.decl.static_enabled {
    return Some(format!("{} dependency on {:?}, which has no static variant", kind, target.name));
  }
  if kind == DepKind::Shared && !target.decl.shared_enabled {
    return Some(format!("shared dependency on {:?}, which has no shared variant", target.name));
  }
  None
}

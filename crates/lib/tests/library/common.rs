//! Shared helpers for library integration tests.

use varforge_lib::config::DeploymentUnit;
use varforge_lib::graph::Artifact;
use varforge_lib::manifest::{PlanRecord, VariantRecord};
use varforge_lib::{BuildConfig, Engine, ModuleDecl, Resolution};

/// One 64-bit target, so variant names stay short.
pub fn single_arch() -> BuildConfig {
  BuildConfig::single_target("arm64")
}

pub fn with_unit(mut config: BuildConfig, name: &str, modules: &[&str]) -> BuildConfig {
  config.deployment_units.push(DeploymentUnit::new(name, modules));
  config
}

pub fn resolve(decls: Vec<ModuleDecl>, config: BuildConfig) -> Resolution {
  Engine::new(config).run(decls)
}

/// Look up a variant record by display name.
pub fn record<'a>(res: &'a Resolution, name: &str) -> &'a VariantRecord {
  res.manifest.variants.get(name).unwrap_or_else(|| {
    panic!(
      "no variant {}, have: {:?}",
      name,
      res.manifest.variants.keys().collect::<Vec<_>>()
    )
  })
}

pub fn plan<'a>(res: &'a Resolution, name: &str) -> &'a PlanRecord {
  record(res, name)
    .plan
    .as_ref()
    .unwrap_or_else(|| panic!("variant {} was not planned: {:?}", name, res.diagnostics.errors))
}

/// Module names of a list of artifacts.
pub fn modules(artifacts: &[Artifact]) -> Vec<&str> {
  artifacts
    .iter()
    .map(|a| a.0.split('/').next().unwrap_or_default())
    .collect()
}

/// Number of variants of `module` bound to `label` on `axis`.
pub fn count_with_label(res: &Resolution, module: &str, axis: &str, label: &str) -> usize {
  res
    .manifest
    .variants_of(module)
    .filter(|(_, r)| r.variations.get(axis).map(|l| l.as_str()) == Some(label))
    .count()
}

//! Global build configuration.
//!
//! Everything here applies to the whole graph: which architectures exist,
//! which modules belong to which deployment unit, which sanitizer variants
//! are offered and where optimization profiles live.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bitness {
  Lib32,
  Lib64,
}

/// A target architecture the build produces code for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchTarget {
  pub arch: String,
  pub bits: Bitness,
}

impl ArchTarget {
  pub fn new(arch: &str, bits: Bitness) -> Self {
    Self {
      arch: arch.to_string(),
      bits,
    }
  }
}

/// An independently updatable unit and the modules it contains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentUnit {
  pub name: String,
  pub modules: Vec<String>,
}

impl DeploymentUnit {
  pub fn new(name: &str, modules: &[&str]) -> Self {
    Self {
      name: name.to_string(),
      modules: modules.iter().map(|m| m.to_string()).collect(),
    }
  }
}

/// How unpinned shared dependencies with stubs are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StubPolicy {
  /// Use the highest stub version when the edge crosses a deployment boundary.
  #[default]
  LatestOnBoundary,
  /// Always link the implementation unless the edge pins a version.
  ImplementationOnly,
}

/// Configuration for a resolution run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
  /// Target architectures, primary first.
  pub targets: Vec<ArchTarget>,

  /// Deployment units, in priority order. A module's home unit is the first one listing it.
  pub deployment_units: Vec<DeploymentUnit>,

  /// Sanitizer variants offered by sanitizable libraries.
  pub sanitizers: Vec<String>,

  /// Optimization profile path per module name.
  pub profiles: BTreeMap<String, String>,

  /// Record undefined dependencies instead of failing.
  pub allow_missing_dependencies: bool,

  pub stub_policy: StubPolicy,
}

impl Default for BuildConfig {
  fn default() -> Self {
    Self {
      targets: vec![
        ArchTarget::new("arm64", Bitness::Lib64),
        ArchTarget::new("arm", Bitness::Lib32),
      ],
      deployment_units: Vec::new(),
      sanitizers: Vec::new(),
      profiles: BTreeMap::new(),
      allow_missing_dependencies: false,
      stub_policy: StubPolicy::default(),
    }
  }
}

impl BuildConfig {
  /// Load a configuration from a JSON file. Missing fields take their defaults.
  pub fn from_json_file(path: &Path) -> Result<Self, EngineError> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
  }

  /// A configuration with a single 64-bit target.
  pub fn single_target(arch: &str) -> Self {
    Self {
      targets: vec![ArchTarget::new(arch, Bitness::Lib64)],
      ..Self::default()
    }
  }

  /// Names of the deployment units containing `module`, in configuration order.
  pub fn units_containing(&self, module: &str) -> Vec<&str> {
    self
      .deployment_units
      .iter()
      .filter(|u| u.modules.iter().any(|m| m == module))
      .map(|u| u.name.as_str())
      .collect()
  }

  /// The first deployment unit containing `module`.
  pub fn home_unit(&self, module: &str) -> Option<&str> {
    self.units_containing(module).into_iter().next()
  }

  pub fn profile_for(&self, module: &str) -> Option<&str> {
    self.profiles.get(module).map(|p| p.as_str())
  }
}

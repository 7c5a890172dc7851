//! Declaration-level checks for mutually exclusive or malformed properties.

use std::collections::BTreeMap;

use crate::config::BuildConfig;
use crate::error::ResolveError;
use crate::resolve::ApiLevel;

use super::types::{DepKind, ModuleDecl, ModuleKind, Partition};

/// Check a declaration for configuration errors.
///
/// Every problem is returned; none of them prevents the module from being
/// added to the graph.
pub fn validate_decl(decl: &ModuleDecl, config: &BuildConfig) -> Vec<ResolveError> {
  let mut errors = Vec::new();
  let caps = decl.kind.capabilities();

  if decl.kind == ModuleKind::Library && !decl.static_enabled && !decl.shared_enabled {
    errors.push(ResolveError::configuration(
      "static_enabled",
      "library builds neither a static nor a shared variant",
    ));
  }

  if decl.sanitize.never && decl.sanitize.requested.is_some() {
    errors.push(ResolveError::configuration(
      "sanitize",
      "'never' and 'requested' are mutually exclusive",
    ));
  }

  if let Some(stubs) = &decl.stubs {
    if !caps.stubs {
      errors.push(ResolveError::configuration(
        "stubs",
        format!("{} modules cannot declare stubs", decl.kind),
      ));
    } else if !decl.shared_enabled {
      errors.push(ResolveError::configuration(
        "stubs",
        "stubs require a shared variant",
      ));
    }
    for version in &stubs.versions {
      if let Err(e) = version.parse::<ApiLevel>() {
        errors.push(ResolveError::configuration("stubs.versions", e.to_string()));
      }
    }
  }

  if decl.stable_interface && decl.stubs.is_none() {
    errors.push(ResolveError::configuration(
      "stable_interface",
      "a stable interface must declare stubs",
    ));
  }

  if decl.profile_guided && !caps.profile {
    errors.push(ResolveError::configuration(
      "profile_guided",
      format!("{} modules cannot be profile guided", decl.kind),
    ));
  }

  if let Some(sdk) = &decl.sdk_version
    && let Err(e) = sdk.parse::<ApiLevel>()
  {
    errors.push(ResolveError::configuration("sdk_version", e.to_string()));
  }

  match decl.image.partition {
    Partition::Vendor if decl.image.vendor_available => errors.push(ResolveError::configuration(
      "vendor_available",
      "must not be set on modules installed in the vendor partition",
    )),
    Partition::Product if decl.image.product_available => errors.push(ResolveError::configuration(
      "product_available",
      "must not be set on modules installed in the product partition",
    )),
    _ => {}
  }

  if decl.apex_only && config.units_containing(&decl.name).is_empty() {
    errors.push(ResolveError::configuration(
      "apex_only",
      "module is not contained in any deployment unit",
    ));
  }

  errors.extend(check_version_pins(decl));
  errors
}

/// Pins are only meaningful on shared edges, and one library may not be
/// pinned to two different versions.
fn check_version_pins(decl: &ModuleDecl) -> Vec<ResolveError> {
  let mut errors = Vec::new();
  let mut pinned: BTreeMap<&str, &str> = BTreeMap::new();

  for dep in &decl.deps {
    let (name, version) = dep.name_and_version();
    let Some(version) = version else {
      continue;
    };

    if dep.kind != DepKind::Shared {
      errors.push(ResolveError::configuration(
        "deps",
        format!("version pin on {} dependency {:?}", dep.kind, dep.name),
      ));
      continue;
    }

    match pinned.get(name) {
      Some(previous) if *previous != version => {
        errors.push(ResolveError::configuration(
          "deps",
          format!(
            "duplicate shared libraries with different explicit versions: \"{}@{}\" and \"{}@{}\"",
            name, previous, name, version
          ),
        ));
      }
      _ => {
        pinned.insert(name, version);
      }
    }
  }

  errors
}

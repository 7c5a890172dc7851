//! Implementation of the `varforge resolve` command.
//!
//! Runs the engine over a declaration file and prints the resulting
//! manifest, either as a summary or as JSON.

use std::path::Path;

use anyhow::{Context, Result};

use varforge_lib::Engine;
use varforge_lib::util::hash::Hashable;

use crate::output::{OutputFormat, print_json, print_stat, print_success, print_warning};

use super::load_inputs;

pub fn cmd_resolve(decls: &Path, config: Option<&Path>, format: OutputFormat, all: bool) -> Result<()> {
  let (decls, config) = load_inputs(decls, config)?;
  let module_count = decls.len();

  let resolution = Engine::new(config).run(decls);
  resolution.ensure_success()?;
  let manifest = &resolution.manifest;

  if format.is_json() {
    return print_json(manifest);
  }

  let hash = manifest.compute_hash().context("Failed to compute manifest hash")?;
  print_success(&format!("Resolved {}", hash));
  print_stat("Modules", &module_count.to_string());
  print_stat("Variants", &manifest.variants.len().to_string());
  print_stat("Installable", &manifest.installable().count().to_string());
  print_stat("Stub surfaces", &manifest.stub_surfaces.len().to_string());

  println!();
  for (name, record) in &manifest.variants {
    if record.hidden && !all {
      continue;
    }
    println!("  {} {}", name, record.artifact);
  }

  for missing in &manifest.missing_dependencies {
    print_warning(&format!("missing dependency tolerated: {}", missing));
  }

  Ok(())
}

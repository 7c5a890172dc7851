use std::path::Path;

use anyhow::{Result, bail};

use varforge_lib::Engine;

use crate::output::{print_error, print_success};

use super::load_inputs;

pub fn cmd_check(decls: &Path, config: Option<&Path>) -> Result<()> {
  let (decls, config) = load_inputs(decls, config)?;
  let resolution = Engine::new(config).run(decls);

  if resolution.is_success() {
    print_success(&format!("{} variants, no errors", resolution.manifest.variants.len()));
    return Ok(());
  }

  for diagnostic in &resolution.diagnostics.errors {
    print_error(&format!("[{:?}] {}", diagnostic.error.category(), diagnostic));
  }
  bail!("{} error(s) found", resolution.diagnostics.error_count());
}

mod check;
mod resolve;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use varforge_lib::{BuildConfig, ModuleDecl};

pub use check::cmd_check;
pub use resolve::cmd_resolve;

/// Read the declaration list and the optional configuration file.
fn load_inputs(decls: &Path, config: Option<&Path>) -> Result<(Vec<ModuleDecl>, BuildConfig)> {
  let content = fs::read_to_string(decls).with_context(|| format!("Failed to read declarations: {}", decls.display()))?;
  let decls: Vec<ModuleDecl> =
    serde_json::from_str(&content).with_context(|| format!("Failed to parse declarations: {}", decls.display()))?;

  let config = match config {
    Some(path) => {
      BuildConfig::from_json_file(path).with_context(|| format!("Failed to load config: {}", path.display()))?
    }
    None => BuildConfig::default(),
  };

  Ok((decls, config))
}

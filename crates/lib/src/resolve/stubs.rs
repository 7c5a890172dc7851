use serde::{Deserialize, Serialize};

use crate::module::{ExportBundle, ModuleDecl};

use super::api_level::ApiLevel;

/// A narrow, versioned interface of a library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StubSurface {
  pub module: String,
  pub version: ApiLevel,
  pub symbols: Vec<String>,
  pub export: ExportBundle,
}

/// Stub surfaces of a declaration, lowest version first. `current` is
/// always present when the module declares stubs.
///
/// Unparsable versions are skipped; declaration validation reports them.
pub fn stub_surfaces(decl: &ModuleDecl) -> Vec<StubSurface> {
  let Some(stubs) = &decl.stubs else {
    return Vec::new();
  };

  let mut versions: Vec<ApiLevel> = stubs
    .versions
    .iter()
    .filter_map(|v| v.parse::<ApiLevel>().ok())
    .chain(std::iter::once(ApiLevel::Current))
    .collect();
  versions.sort();
  versions.dedup();

  versions
    .into_iter()
    .map(|version| StubSurface {
      module: decl.name.clone(),
      version,
      symbols: stubs.symbols.clone(),
      export: stubs.export.clone(),
    })
    .collect()
}

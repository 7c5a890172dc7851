use serde::{Deserialize, Serialize};

use crate::consts::{IMPL_VERSION_PIN, VERSION_PIN_SEPARATOR};

/// The closed set of module kinds the engine understands.
///
/// Behavior that differs per kind is expressed through [`Capabilities`],
/// resolved once when the module is added to the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleKind {
  /// A library that can be built as a static archive, a shared object, or both.
  Library,
  /// An executable.
  Binary,
  /// A relocatable object linked directly into consumers.
  Object,
  /// A header-only library.
  Headers,
  /// A crt begin/end object.
  Crt,
}

/// Which variant axes and roles apply to a module kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Capabilities {
  /// Splits into `static` and `shared` link variants.
  pub link_variants: bool,
  /// Can be the target of a library dependency edge.
  pub linkable: bool,
  /// May declare versioned stub surfaces.
  pub stubs: bool,
  /// Offers sanitizer variants to its consumers.
  pub sanitizable: bool,
  /// May own an optimization profile.
  pub profile: bool,
}

impl ModuleKind {
  pub fn capabilities(self) -> Capabilities {
    match self {
      ModuleKind::Library => Capabilities {
        link_variants: true,
        linkable: true,
        stubs: true,
        sanitizable: true,
        profile: true,
      },
      ModuleKind::Binary => Capabilities {
        link_variants: false,
        linkable: false,
        stubs: false,
        sanitizable: false,
        profile: true,
      },
      ModuleKind::Object => Capabilities {
        link_variants: false,
        linkable: true,
        stubs: false,
        sanitizable: true,
        profile: false,
      },
      ModuleKind::Headers | ModuleKind::Crt => Capabilities {
        link_variants: false,
        linkable: true,
        stubs: false,
        sanitizable: false,
        profile: false,
      },
    }
  }
}

impl std::fmt::Display for ModuleKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let s = match self {
      ModuleKind::Library => "library",
      ModuleKind::Binary => "binary",
      ModuleKind::Object => "object",
      ModuleKind::Headers => "headers",
      ModuleKind::Crt => "crt",
    };
    write!(f, "{}", s)
  }
}

/// The kind of a dependency edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepKind {
  Shared,
  Static,
  WholeStatic,
  Header,
  Runtime,
  Data,
  Object,
  CrtBegin,
  CrtEnd,
}

impl DepKind {
  /// Static or whole-static.
  pub fn is_static(self) -> bool {
    matches!(self, DepKind::Static | DepKind::WholeStatic)
  }

  /// Edges that are subject to library link-type rules.
  pub fn is_library(self) -> bool {
    matches!(
      self,
      DepKind::Shared | DepKind::Static | DepKind::WholeStatic | DepKind::Header
    )
  }

  /// Edges whose target's code ends up inside the consumer's own output.
  pub fn links_statically(self) -> bool {
    matches!(self, DepKind::Static | DepKind::WholeStatic | DepKind::Object)
  }

  /// Edges whose target is loaded when the consumer runs.
  pub fn exercised_at_runtime(self) -> bool {
    matches!(self, DepKind::Shared | DepKind::Runtime)
  }

  /// Edges the action planner has to follow to build link inputs.
  pub fn needs_plan(self) -> bool {
    matches!(self, DepKind::Shared | DepKind::Static | DepKind::WholeStatic)
  }
}

impl std::fmt::Display for DepKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let s = match self {
      DepKind::Shared => "shared",
      DepKind::Static => "static",
      DepKind::WholeStatic => "whole_static",
      DepKind::Header => "header",
      DepKind::Runtime => "runtime",
      DepKind::Data => "data",
      DepKind::Object => "object",
      DepKind::CrtBegin => "crt_begin",
      DepKind::CrtEnd => "crt_end",
    };
    write!(f, "{}", s)
  }
}

/// Semantic tag carried by every dependency edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DependencyTag {
  pub kind: DepKind,
  /// Re-export the dependency's interface to this module's consumers.
  pub reexport: bool,
  /// The edge is not followed inside deployment units.
  pub deployment_exclude: bool,
  /// The edge names a specific stub version (`libfoo@30`).
  pub explicit_version: bool,
  /// The edge forces the implementation (`libfoo@impl`).
  pub explicit_impl: bool,
}

impl DependencyTag {
  pub fn new(kind: DepKind) -> Self {
    Self {
      kind,
      reexport: false,
      deployment_exclude: false,
      explicit_version: false,
      explicit_impl: false,
    }
  }
}

/// A dependency as declared by a module.
///
/// `name` may carry a version pin: `libfoo@30` selects stub version 30 and
/// `libfoo@impl` forces the implementation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepDecl {
  pub name: String,
  pub kind: DepKind,
  #[serde(default)]
  pub reexport: bool,
  #[serde(default)]
  pub deployment_exclude: bool,
}

impl DepDecl {
  pub fn new(name: &str, kind: DepKind) -> Self {
    Self {
      name: name.to_string(),
      kind,
      reexport: false,
      deployment_exclude: false,
    }
  }

  /// Split the declared name into the module name and an optional version pin.
  pub fn name_and_version(&self) -> (&str, Option<&str>) {
    split_version_pin(&self.name)
  }
}

/// Split `name@version` into its parts. A trailing `@` is not a pin.
pub fn split_version_pin(name: &str) -> (&str, Option<&str>) {
  match name.rfind(VERSION_PIN_SEPARATOR) {
    Some(at) if at + 1 < name.len() => (&name[..at], Some(&name[at + 1..])),
    _ => (name, None),
  }
}

/// Whether a pin selects the implementation rather than a stub version.
pub fn is_impl_pin(version: &str) -> bool {
  version == IMPL_VERSION_PIN
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Multilib {
  /// Every configured target.
  #[default]
  Both,
  /// Only the primary (first) target.
  First,
  Lib32,
  Lib64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Partition {
  #[default]
  System,
  Vendor,
  Product,
}

/// Install-partition availability of a module.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageDecl {
  pub partition: Partition,
  pub vendor_available: bool,
  pub product_available: bool,
  pub recovery_available: bool,
  pub ramdisk_available: bool,
}

impl ImageDecl {
  /// Has a vendor or product variant in addition to the system one.
  pub fn has_non_system_variants(&self) -> bool {
    self.vendor_available || self.product_available
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SanitizeDecl {
  /// Sanitizer this module is always built with.
  pub requested: Option<String>,
  /// Never build sanitizer variants of this module.
  pub never: bool,
}

/// Interface bundle a library hands to its consumers.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportBundle {
  pub include_dirs: Vec<String>,
  pub flags: Vec<String>,
}

impl ExportBundle {
  pub fn is_empty(&self) -> bool {
    self.include_dirs.is_empty() && self.flags.is_empty()
  }

  /// Append `other`, keeping the first occurrence of each entry.
  pub fn merge(&mut self, other: &ExportBundle) {
    for dir in &other.include_dirs {
      if !self.include_dirs.contains(dir) {
        self.include_dirs.push(dir.clone());
      }
    }
    for flag in &other.flags {
      if !self.flags.contains(flag) {
        self.flags.push(flag.clone());
      }
    }
  }
}

/// Versioned stub surfaces offered by a library.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StubsDecl {
  /// Released versions. `current` is always added.
  pub versions: Vec<String>,
  /// Exported symbols shared by every stub surface.
  pub symbols: Vec<String>,
  /// Narrower interface exported by the stubs.
  pub export: ExportBundle,
}

/// A module declaration as handed to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleDecl {
  pub name: String,
  pub kind: ModuleKind,
  pub deps: Vec<DepDecl>,
  pub enabled: bool,
  pub multilib: Multilib,
  pub disabled_archs: Vec<String>,
  pub image: ImageDecl,
  pub static_enabled: bool,
  pub shared_enabled: bool,
  /// Only built inside deployment units, never for the platform.
  pub apex_only: bool,
  /// Always links implementations, even across deployment boundaries.
  pub bootstrap: bool,
  pub sanitize: SanitizeDecl,
  pub stubs: Option<StubsDecl>,
  pub export: ExportBundle,
  /// Participates in profile-guided optimization.
  pub profile_guided: bool,
  pub sdk_version: Option<String>,
  pub stl: Option<String>,
  pub double_loadable: bool,
  /// Exposes a stable interface across the system/vendor boundary.
  pub stable_interface: bool,
}

impl Default for ModuleDecl {
  fn default() -> Self {
    Self {
      name: String::new(),
      kind: ModuleKind::Library,
      deps: Vec::new(),
      enabled: true,
      multilib: Multilib::default(),
      disabled_archs: Vec::new(),
      image: ImageDecl::default(),
      static_enabled: true,
      shared_enabled: true,
      apex_only: false,
      bootstrap: false,
      sanitize: SanitizeDecl::default(),
      stubs: None,
      export: ExportBundle::default(),
      profile_guided: false,
      sdk_version: None,
      stl: None,
      double_loadable: false,
      stable_interface: false,
    }
  }
}

impl ModuleDecl {
  pub fn new(name: &str, kind: ModuleKind) -> Self {
    Self {
      name: name.to_string(),
      kind,
      ..Self::default()
    }
  }

  pub fn library(name: &str) -> Self {
    Self::new(name, ModuleKind::Library)
  }

  pub fn binary(name: &str) -> Self {
    Self::new(name, ModuleKind::Binary)
  }

  pub fn dep(mut self, name: &str, kind: DepKind) -> Self {
    self.deps.push(DepDecl::new(name, kind));
    self
  }

  pub fn static_dep(self, name: &str) -> Self {
    self.dep(name, DepKind::Static)
  }

  pub fn whole_static_dep(self, name: &str) -> Self {
    self.dep(name, DepKind::WholeStatic)
  }

  pub fn shared_dep(self, name: &str) -> Self {
    self.dep(name, DepKind::Shared)
  }

  pub fn with_stubs(mut self, versions: &[&str]) -> Self {
    self.stubs = Some(StubsDecl {
      versions: versions.iter().map(|v| v.to_string()).collect(),
      ..StubsDecl::default()
    });
    self
  }

  pub fn static_only(mut self) -> Self {
    self.shared_enabled = false;
    self
  }

  pub fn shared_only(mut self) -> Self {
    self.static_enabled = false;
    self
  }
}

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::module::{Capabilities, DependencyTag, ModuleDecl, ModuleKind};

/// Index of a module identity in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ModuleId(pub usize);

/// Index of a variant instance in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VariantId(pub usize);

impl std::fmt::Display for VariantId {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "v{}", self.0)
  }
}

/// Axis name to label bindings of a variant. An empty label means "default".
pub type Variations = BTreeMap<String, String>;

/// A build output produced by a variant.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Artifact(pub String);

impl std::fmt::Display for Artifact {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// A module identity. Unique per name.
#[derive(Debug, Clone)]
pub struct Module {
  pub id: ModuleId,
  pub name: String,
  pub kind: ModuleKind,
  pub caps: Capabilities,
  pub decl: ModuleDecl,
  /// Every variant ever created for this module, in creation order.
  pub variants: Vec<VariantId>,
}

/// How an edge constrains the target's label on one axis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisConstraint {
  /// Bind exactly this label. The target gets no say.
  Exact(String),
  /// Request the source's own label, subject to the target's incoming transition.
  Inherit,
  /// Accept whatever label the target defaults to.
  Any,
}

/// The concrete variant an edge currently points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeTarget {
  /// Resolution failed; the error was already reported.
  Unresolved,
  Variant(VariantId),
  /// Placeholder for an undefined module under `allow_missing_dependencies`.
  Missing,
}

impl EdgeTarget {
  pub fn variant(self) -> Option<VariantId> {
    match self {
      EdgeTarget::Variant(id) => Some(id),
      EdgeTarget::Unresolved | EdgeTarget::Missing => None,
    }
  }
}

/// An outgoing dependency edge of a variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepEdge {
  /// Target module name, without any version pin.
  pub name: String,
  pub tag: DependencyTag,
  /// Per-axis constraints. Axes without an entry use the axis transitions.
  pub constraints: BTreeMap<String, AxisConstraint>,
  pub target: EdgeTarget,
}

/// A variant instance: a module bound to one label per processed axis.
#[derive(Debug, Clone)]
pub struct Variant {
  pub id: VariantId,
  pub module: ModuleId,
  pub variations: Variations,
  /// Pruned. Must never be depended upon.
  pub disabled: bool,
  /// Built, but excluded from default top-level output.
  pub hidden: bool,
  pub installable: bool,
  pub deps: Vec<DepEdge>,
}

impl Variant {
  /// The label bound on `axis`, or `None` if the axis has not run yet.
  pub fn label(&self, axis: &str) -> Option<&str> {
    self.variations.get(axis).map(|s| s.as_str())
  }

  /// The label bound on `axis`, treating an unprocessed axis as the default.
  pub fn label_or_default(&self, axis: &str) -> &str {
    self.label(axis).unwrap_or("")
  }

  pub fn is_live(&self) -> bool {
    !self.disabled
  }
}

/// Output of one axis pass for one variant.
///
/// Passes never edit variants directly; they return a record that the
/// splitter merges into the graph's [`PassRecords`] accumulator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassRecord {
  pub label: String,
  pub hidden: bool,
  pub uninstallable: bool,
  pub disabled: bool,
  pub properties: BTreeMap<String, String>,
}

impl PassRecord {
  pub fn new(label: &str) -> Self {
    Self {
      label: label.to_string(),
      ..Self::default()
    }
  }

  pub fn hidden(mut self) -> Self {
    self.hidden = true;
    self
  }

  pub fn uninstallable(mut self) -> Self {
    self.uninstallable = true;
    self
  }

  pub fn disabled(mut self) -> Self {
    self.disabled = true;
    self
  }

  pub fn with_property(mut self, key: &str, value: impl Into<String>) -> Self {
    self.properties.insert(key.to_string(), value.into());
    self
  }
}

/// Accumulator of pass outputs keyed by `(variant, axis)`.
#[derive(Debug, Clone, Default)]
pub struct PassRecords {
  records: BTreeMap<(VariantId, String), PassRecord>,
}

impl PassRecords {
  pub fn insert(&mut self, variant: VariantId, axis: &str, record: PassRecord) {
    self.records.insert((variant, axis.to_string()), record);
  }

  pub fn get(&self, variant: VariantId, axis: &str) -> Option<&PassRecord> {
    self.records.get(&(variant, axis.to_string()))
  }

  pub fn property(&self, variant: VariantId, axis: &str, key: &str) -> Option<&str> {
    self
      .get(variant, axis)
      .and_then(|r| r.properties.get(key))
      .map(|s| s.as_str())
  }

  /// All records of one variant, keyed by axis.
  pub fn for_variant(&self, variant: VariantId) -> BTreeMap<&str, &PassRecord> {
    self
      .records
      .range((variant, String::new())..)
      .take_while(|((v, _), _)| *v == variant)
      .map(|((_, axis), record)| (axis.as_str(), record))
      .collect()
  }

  /// Copy every record of `from` onto `to`. Used when cloning a variant.
  pub fn copy_all(&mut self, from: VariantId, to: VariantId) {
    let copied: Vec<(String, PassRecord)> = self
      .for_variant(from)
      .into_iter()
      .map(|(axis, record)| (axis.to_string(), record.clone()))
      .collect();
    for (axis, record) in copied {
      self.records.insert((to, axis), record);
    }
  }
}

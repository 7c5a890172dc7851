//! API levels, also used as stub versions.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{CURRENT_API_LEVEL, FUTURE_API_LEVEL};

/// A released numeric level or the unreleased `current` level.
///
/// `Current` sorts above every numeric level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum ApiLevel {
  Numeric(u32),
  Current,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid api level {0:?}: must be a number or \"current\"")]
pub struct ApiLevelError(pub String);

impl FromStr for ApiLevel {
  type Err = ApiLevelError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      CURRENT_API_LEVEL | FUTURE_API_LEVEL => Ok(ApiLevel::Current),
      _ => s
        .parse::<u32>()
        .map(ApiLevel::Numeric)
        .map_err(|_| ApiLevelError(s.to_string())),
    }
  }
}

impl std::fmt::Display for ApiLevel {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      ApiLevel::Numeric(n) => write!(f, "{}", n),
      ApiLevel::Current => write!(f, "{}", CURRENT_API_LEVEL),
    }
  }
}

impl From<ApiLevel> for String {
  fn from(level: ApiLevel) -> Self {
    level.to_string()
  }
}

impl TryFrom<String> for ApiLevel {
  type Error = ApiLevelError;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    value.parse()
  }
}

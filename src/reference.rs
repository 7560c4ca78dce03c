//! Storage object references.

use crate::error::{ConcatError, ConcatResult};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// Opaque locator of an object in a storage backend.
///
/// The crate never interprets a reference beyond the optional
/// `scheme://path` split; what a path means is up to the [`Storage`]
/// implementation that receives it.
///
/// [`Storage`]: crate::storage::Storage
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Reference(String);

impl Reference {
  /// Creates a reference, rejecting blank locators.
  pub fn new(value: impl Into<String>) -> ConcatResult<Self> {
    let value = value.into();
    if value.trim().is_empty() {
      return Err(ConcatError::InvalidConfiguration(
        "file reference must not be empty".to_string(),
      ));
    }
    Ok(Self(value))
  }

  /// Returns the locator string.
  pub fn as_str(&self) -> &str {
    &self.0
  }

  /// Scheme part of a `scheme://path` locator.
  pub fn scheme(&self) -> Option<&str> {
    self.0.split_once("://").map(|(scheme, _)| scheme)
  }

  /// Everything after `scheme://`, or the whole locator when there is no scheme.
  pub fn path(&self) -> &str {
    match self.0.split_once("://") {
      Some((_, path)) => path,
      None => &self.0,
    }
  }
}

impl Display for Reference {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl AsRef<str> for Reference {
  fn as_ref(&self) -> &str {
    &self.0
  }
}

impl TryFrom<String> for Reference {
  type Error = ConcatError;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    Self::new(value)
  }
}

impl TryFrom<&str> for Reference {
  type Error = ConcatError;

  fn try_from(value: &str) -> Result<Self, Self::Error> {
    Self::new(value)
  }
}

impl From<Reference> for String {
  fn from(value: Reference) -> Self {
    value.0
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_scheme_and_path() {
    let r = Reference::new("kestra://long/url/file1.txt").unwrap();
    assert_eq!(r.scheme(), Some("kestra"));
    assert_eq!(r.path(), "long/url/file1.txt");
    assert_eq!(r.to_string(), "kestra://long/url/file1.txt");
  }

  #[test]
  fn test_without_scheme() {
    let r = Reference::new("plain/name").unwrap();
    assert_eq!(r.scheme(), None);
    assert_eq!(r.path(), "plain/name");
  }

  #[test]
  fn test_blank_is_rejected() {
    assert!(matches!(
      Reference::new("   "),
      Err(ConcatError::InvalidConfiguration(_))
    ));
    assert!(Reference::try_from("").is_err());
  }

  #[test]
  fn test_serde_as_plain_string() {
    let r = Reference::new("kestra://a").unwrap();
    assert_eq!(serde_json::to_string(&r).unwrap(), "\"kestra://a\"");
    let back: Reference = serde_json::from_str("\"kestra://a\"").unwrap();
    assert_eq!(back, r);
    assert!(serde_json::from_str::<Reference>("\"\"").is_err());
  }
}

//! Tuning knobs for the concat step.

use serde::{Deserialize, Serialize};

/// Default size of the copy buffer, in bytes.
pub const DEFAULT_BUFFER_SIZE: usize = 8192;

/// Configuration for a [`Concatenator`](crate::concat::Concatenator).
///
/// Hosts usually deserialize this from their own configuration:
///
/// ```rust
/// use concatweave::ConcatConfig;
///
/// let config: ConcatConfig = serde_json::from_str(r#"{"buffer_size": 65536}"#).unwrap();
/// assert_eq!(config.buffer_size, 65536);
/// assert_eq!(config.name, "concat");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConcatConfig {
  /// Component name used in logs.
  pub name: String,
  /// Size of the fixed buffer used to stream each object.
  pub buffer_size: usize,
}

impl Default for ConcatConfig {
  fn default() -> Self {
    Self {
      name: "concat".to_string(),
      buffer_size: DEFAULT_BUFFER_SIZE,
    }
  }
}

impl ConcatConfig {
  /// Sets the component name.
  #[must_use]
  pub fn with_name(mut self, name: impl Into<String>) -> Self {
    self.name = name.into();
    self
  }

  /// Sets the copy buffer size.
  #[must_use]
  pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
    self.buffer_size = buffer_size;
    self
  }

  /// Buffer size actually used; a zero-sized buffer would never make progress.
  pub fn effective_buffer_size(&self) -> usize {
    self.buffer_size.max(1)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_defaults() {
    let config = ConcatConfig::default();
    assert_eq!(config.name, "concat");
    assert_eq!(config.buffer_size, DEFAULT_BUFFER_SIZE);
  }

  #[test]
  fn test_builder() {
    let config = ConcatConfig::default()
      .with_name("merge-logs")
      .with_buffer_size(16);
    assert_eq!(config.name, "merge-logs");
    assert_eq!(config.effective_buffer_size(), 16);
  }

  #[test]
  fn test_zero_buffer_is_clamped() {
    assert_eq!(
      ConcatConfig::default()
        .with_buffer_size(0)
        .effective_buffer_size(),
      1
    );
  }

  #[test]
  fn test_partial_deserialize_keeps_defaults() {
    let config: ConcatConfig = serde_json::from_str(r#"{"name": "c1"}"#).unwrap();
    assert_eq!(config.name, "c1");
    assert_eq!(config.buffer_size, DEFAULT_BUFFER_SIZE);
  }
}

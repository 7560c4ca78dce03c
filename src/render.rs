//! Template rendering seam.
//!
//! The host owns the real expression engine. The crate only needs
//! `render(template) -> String`, expressed by the [`Renderer`] trait, plus
//! two small implementations for local runs and tests.

use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::LazyLock;
use thiserror::Error;

/// `{{ name }}` placeholder, compiled on first use.
static PLACEHOLDER: LazyLock<Result<Regex, regex::Error>> =
  LazyLock::new(|| Regex::new(r"\{\{\s*([A-Za-z0-9_.\-]+)\s*\}\}"));

/// Error raised by a [`Renderer`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("template render error: {message}")]
pub struct RenderError {
  /// Renderer-provided description.
  pub message: String,
}

impl RenderError {
  /// Creates a new render error.
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      message: message.into(),
    }
  }
}

/// Resolves placeholders in dynamic property values.
pub trait Renderer: Send + Sync {
  /// Renders `template` into a concrete string.
  fn render(&self, template: &str) -> Result<String, RenderError>;
}

/// Returns every template unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughRenderer;

impl Renderer for PassthroughRenderer {
  fn render(&self, template: &str) -> Result<String, RenderError> {
    Ok(template.to_string())
  }
}

/// Substitutes `{{ name }}` placeholders from a variable map.
///
/// Unknown variables are an error rather than an empty substitution.
#[derive(Debug, Clone, Default)]
pub struct VariableRenderer {
  variables: HashMap<String, String>,
}

impl VariableRenderer {
  /// Creates a renderer with no variables.
  pub fn new() -> Self {
    Self::default()
  }

  /// Adds or replaces a variable.
  #[must_use]
  pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
    self.variables.insert(name.into(), value.into());
    self
  }

  /// Adds or replaces a variable in place.
  pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
    self.variables.insert(name.into(), value.into());
  }
}

impl FromIterator<(String, String)> for VariableRenderer {
  fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
    Self {
      variables: iter.into_iter().collect(),
    }
  }
}

impl Renderer for VariableRenderer {
  fn render(&self, template: &str) -> Result<String, RenderError> {
    if !template.contains("{{") {
      return Ok(template.to_string());
    }

    let pattern = PLACEHOLDER
      .as_ref()
      .map_err(|e| RenderError::new(e.to_string()))?;
    let mut missing = None;
    let rendered = pattern.replace_all(template, |caps: &Captures<'_>| {
      let name = &caps[1];
      match self.variables.get(name) {
        Some(value) => value.clone(),
        None => {
          if missing.is_none() {
            missing = Some(name.to_string());
          }
          String::new()
        }
      }
    });

    match missing {
      Some(name) => Err(RenderError::new(format!(
        "variable '{}' is not defined",
        name
      ))),
      None => Ok(rendered.into_owned()),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_passthrough() {
    let r = PassthroughRenderer;
    assert_eq!(r.render("{{ a }}").unwrap(), "{{ a }}");
  }

  #[test]
  fn test_substitutes_variables() {
    let r = VariableRenderer::new()
      .with_variable("outputs.echo.uri", "kestra://ns/echo.txt")
      .with_variable("sep", ",");
    assert_eq!(
      r.render("{{outputs.echo.uri}}|{{ sep }}").unwrap(),
      "kestra://ns/echo.txt|,"
    );
  }

  #[test]
  fn test_plain_text_is_untouched() {
    let r = VariableRenderer::new();
    assert_eq!(r.render("kestra://a").unwrap(), "kestra://a");
  }

  #[test]
  fn test_missing_variable_is_an_error() {
    let r = VariableRenderer::new().with_variable("a", "1");
    let err = r.render("{{ a }} {{ nope }}").unwrap_err();
    assert_eq!(err.message, "variable 'nope' is not defined");
  }

  #[test]
  fn test_placeholder_pattern_is_shared_across_renders() {
    assert!(PLACEHOLDER.is_ok());
    let r = VariableRenderer::new().with_variable("n", "1");
    std::thread::scope(|scope| {
      for _ in 0..4 {
        scope.spawn(|| {
          for _ in 0..100 {
            assert_eq!(r.render("{{ n }}-{{n}}").unwrap(), "1-1");
          }
        });
      }
    });
  }

  #[test]
  fn test_from_iterator() {
    let r: VariableRenderer = vec![("x".to_string(), "y".to_string())]
      .into_iter()
      .collect();
    assert_eq!(r.render("{{ x }}").unwrap(), "y");
  }
}

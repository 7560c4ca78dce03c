//! # Input Resolver
//!
//! Normalizes the `files` property of a concat step into an ordered list of
//! [`Reference`]s.
//!
//! The property accepts two shapes:
//!
//! - a list of strings, each rendered individually:
//!   `files: ["kestra://a", "{{ outputs.b.uri }}"]`
//! - a single string rendered once and parsed as a JSON array of strings:
//!   `files: "{{ outputs.echo.files }}"` rendering to `["kestra://a", "kestra://b"]`
//!
//! Anything else is rejected before any storage I/O happens.

use crate::error::{ConcatError, ConcatResult};
use crate::reference::Reference;
use crate::render::Renderer;
use serde_json::Value;

/// The two accepted shapes of the `files` property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileListSpec {
  /// Literal list; every element may still hold placeholders.
  List(Vec<String>),
  /// Template that renders to a JSON array of strings.
  Template(String),
}

/// JSON type name used in configuration errors.
fn json_type_name(value: &Value) -> &'static str {
  match value {
    Value::Null => "null",
    Value::Bool(_) => "boolean",
    Value::Number(_) => "number",
    Value::String(_) => "string",
    Value::Array(_) => "array",
    Value::Object(_) => "object",
  }
}

impl TryFrom<Value> for FileListSpec {
  type Error = ConcatError;

  fn try_from(value: Value) -> Result<Self, Self::Error> {
    match value {
      Value::String(template) => Ok(FileListSpec::Template(template)),
      Value::Array(items) => items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
          Value::String(s) => Ok(s),
          other => Err(ConcatError::InvalidConfiguration(format!(
            "invalid `files` entry at index {} with type '{}'",
            index,
            json_type_name(&other)
          ))),
        })
        .collect::<ConcatResult<Vec<_>>>()
        .map(FileListSpec::List),
      other => Err(ConcatError::InvalidConfiguration(format!(
        "invalid `files` property with type '{}'",
        json_type_name(&other)
      ))),
    }
  }
}

impl From<Vec<String>> for FileListSpec {
  fn from(items: Vec<String>) -> Self {
    FileListSpec::List(items)
  }
}

impl From<String> for FileListSpec {
  fn from(template: String) -> Self {
    FileListSpec::Template(template)
  }
}

impl FileListSpec {
  /// Resolves the `files` property into references, preserving order and duplicates.
  ///
  /// List elements are rendered one by one. A template is rendered once and
  /// the resulting JSON array is taken as-is; its elements are not rendered
  /// a second time.
  pub fn resolve(&self, renderer: &dyn Renderer) -> ConcatResult<Vec<Reference>> {
    let rendered = match self {
      FileListSpec::List(items) => items
        .iter()
        .map(|item| renderer.render(item))
        .collect::<Result<Vec<_>, _>>()?,
      FileListSpec::Template(template) => {
        let payload = renderer.render(template)?;
        serde_json::from_str::<Vec<String>>(&payload).map_err(|e| {
          ConcatError::InvalidConfiguration(format!(
            "`files` must render to a JSON array of strings, got '{}': {}",
            payload, e
          ))
        })?
      }
    };

    rendered.into_iter().map(Reference::new).collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::render::{PassthroughRenderer, RenderError, VariableRenderer};
  use serde_json::json;

  fn strs(refs: &[Reference]) -> Vec<&str> {
    refs.iter().map(Reference::as_str).collect()
  }

  #[test]
  fn test_list_keeps_order_and_duplicates() {
    let spec = FileListSpec::try_from(json!(["kestra://b", "kestra://a", "kestra://b"])).unwrap();
    let refs = spec.resolve(&PassthroughRenderer).unwrap();
    assert_eq!(strs(&refs), vec!["kestra://b", "kestra://a", "kestra://b"]);
  }

  #[test]
  fn test_list_elements_are_rendered() {
    let renderer = VariableRenderer::new().with_variable("uri", "kestra://x");
    let spec = FileListSpec::List(vec!["{{ uri }}".into(), "kestra://y".into()]);
    let refs = spec.resolve(&renderer).unwrap();
    assert_eq!(strs(&refs), vec!["kestra://x", "kestra://y"]);
  }

  #[test]
  fn test_template_is_rendered_then_parsed() {
    let renderer =
      VariableRenderer::new().with_variable("files", r#"["kestra://a","kestra://b"]"#);
    let spec = FileListSpec::try_from(json!("{{ files }}")).unwrap();
    let refs = spec.resolve(&renderer).unwrap();
    assert_eq!(strs(&refs), vec!["kestra://a", "kestra://b"]);
  }

  #[test]
  fn test_literal_json_string() {
    let spec = FileListSpec::Template(r#"["kestra://a","kestra://b"]"#.into());
    let refs = spec.resolve(&PassthroughRenderer).unwrap();
    assert_eq!(strs(&refs), vec!["kestra://a", "kestra://b"]);
  }

  #[test]
  fn test_parsed_elements_are_not_rendered_again() {
    let renderer = VariableRenderer::new()
      .with_variable("files", r#"["{{ inner }}"]"#)
      .with_variable("inner", "kestra://should-not-appear");
    let spec = FileListSpec::Template("{{ files }}".into());
    let refs = spec.resolve(&renderer).unwrap();
    assert_eq!(strs(&refs), vec!["{{ inner }}"]);
  }

  #[test]
  fn test_empty_list_is_valid() {
    assert!(FileListSpec::List(vec![])
      .resolve(&PassthroughRenderer)
      .unwrap()
      .is_empty());
    assert!(FileListSpec::Template("[]".into())
      .resolve(&PassthroughRenderer)
      .unwrap()
      .is_empty());
  }

  #[test]
  fn test_malformed_payload_is_reported() {
    let spec = FileListSpec::Template("kestra://a".into());
    match spec.resolve(&PassthroughRenderer) {
      Err(ConcatError::InvalidConfiguration(msg)) => assert!(msg.contains("kestra://a")),
      other => panic!("unexpected result: {:?}", other),
    }
  }

  #[test]
  fn test_json_array_of_non_strings_is_rejected() {
    let spec = FileListSpec::Template("[1, 2]".into());
    assert!(matches!(
      spec.resolve(&PassthroughRenderer),
      Err(ConcatError::InvalidConfiguration(_))
    ));
  }

  #[test]
  fn test_wrong_types_name_the_type() {
    for (value, name) in [
      (json!(42), "number"),
      (json!({"a": "kestra://a"}), "object"),
      (json!(true), "boolean"),
      (Value::Null, "null"),
    ] {
      match FileListSpec::try_from(value) {
        Err(ConcatError::InvalidConfiguration(msg)) => {
          assert!(msg.contains(&format!("'{}'", name)), "{}", msg)
        }
        other => panic!("unexpected result: {:?}", other),
      }
    }
  }

  #[test]
  fn test_non_string_list_entry_is_rejected() {
    match FileListSpec::try_from(json!(["kestra://a", 3])) {
      Err(ConcatError::InvalidConfiguration(msg)) => assert!(msg.contains("index 1")),
      other => panic!("unexpected result: {:?}", other),
    }
  }

  #[test]
  fn test_blank_entry_is_rejected() {
    let spec = FileListSpec::List(vec!["kestra://a".into(), " ".into()]);
    assert!(matches!(
      spec.resolve(&PassthroughRenderer),
      Err(ConcatError::InvalidConfiguration(_))
    ));
  }

  struct FailingRenderer;

  impl Renderer for FailingRenderer {
    fn render(&self, _template: &str) -> Result<String, RenderError> {
      Err(RenderError::new("boom"))
    }
  }

  #[test]
  fn test_render_errors_propagate_verbatim() {
    let spec = FileListSpec::Template("{{ x }}".into());
    match spec.resolve(&FailingRenderer) {
      Err(ConcatError::TemplateRender(e)) => assert_eq!(e, RenderError::new("boom")),
      other => panic!("unexpected result: {:?}", other),
    }
  }
}

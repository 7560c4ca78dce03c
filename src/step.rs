//! # Concat step
//!
//! The unit a workflow host invokes. It carries the two declarative
//! properties of the step and drives a run through
//! resolve, concatenate and publish.
//!
//! ```yaml
//! - id: concat
//!   type: concat
//!   files:
//!     - "kestra://long/url/file1.txt"
//!     - "kestra://long/url/file2.txt"
//!   separator: "\n"
//! ```
//!
//! `files` may also be a single string that renders to a JSON array, e.g.
//! `files: "{{ outputs.echo.files }}"`. Both properties are dynamic and go
//! through the host's renderer.

use crate::concat::Concatenator;
use crate::context::RunContext;
use crate::error::{ConcatError, ConcatResult};
use crate::files::FileListSpec;
use crate::reference::Reference;
use crate::render::Renderer;
use crate::state::{ConcatState, StateTracker};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use scopeguard::ScopeGuard;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

/// Concatenates storage objects into one new object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Concat {
  /// Objects to concatenate: a list of references or a string rendering to
  /// a JSON array of references. Kept raw so a wrong shape is reported as a
  /// configuration error at run time.
  pub files: Value,
  /// Bytes written between two consecutive objects. No separator by default.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub separator: Option<String>,
}

/// Output of a successful run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConcatOutput {
  /// Reference of the concatenated object.
  pub uri: Reference,
  /// Size of the concatenated object in bytes.
  pub size: u64,
  /// Number of objects that went into it.
  pub files: usize,
  /// When the object was published.
  pub published_at: DateTime<Utc>,
}

impl Concat {
  /// Creates a step over `files` with no separator.
  pub fn new(files: impl Into<Value>) -> Self {
    Self {
      files: files.into(),
      separator: None,
    }
  }

  /// Sets the separator.
  #[must_use]
  pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
    self.separator = Some(separator.into());
    self
  }

  /// Parses a step from its declarative definition.
  pub fn from_definition(definition: Value) -> ConcatResult<Self> {
    serde_json::from_value(definition).map_err(|e| {
      ConcatError::InvalidConfiguration(format!("invalid concat step definition: {}", e))
    })
  }

  /// Renders the separator, if any, into the bytes to interpose.
  pub fn render_separator(&self, renderer: &dyn Renderer) -> ConcatResult<Option<Bytes>> {
    match &self.separator {
      Some(separator) => Ok(Some(Bytes::from(renderer.render(separator)?))),
      None => Ok(None),
    }
  }

  /// Runs the step.
  pub async fn run(&self, ctx: &RunContext) -> ConcatResult<ConcatOutput> {
    let mut tracker = StateTracker::new(ctx.config().name.clone());
    self.run_tracked(ctx, &mut tracker).await
  }

  /// Runs the step, recording every state it goes through in `tracker`.
  ///
  /// Whichever way the run ends short of `Done` (an error, cancellation, or
  /// the future being dropped) leaves the tracker in `Failed`.
  pub async fn run_tracked(
    &self,
    ctx: &RunContext,
    tracker: &mut StateTracker,
  ) -> ConcatResult<ConcatOutput> {
    let mut state = scopeguard::guard(tracker, |tracker| {
      tracker.fail();
    });

    state.transition(ConcatState::Resolving)?;
    let refs = FileListSpec::try_from(self.files.clone())?.resolve(ctx.renderer())?;
    let separator = self.render_separator(ctx.renderer())?;
    info!(
      component = %ctx.config().name,
      files = refs.len(),
      separator_bytes = separator.as_ref().map_or(0, Bytes::len),
      "concatenating files"
    );

    state.transition(ConcatState::Concatenating)?;
    let concatenator = Concatenator::new(ctx.config().clone());
    let sealed = concatenator
      .write(&refs, separator.as_deref(), ctx.storage(), ctx.cancellation())
      .await?;

    state.transition(ConcatState::Publishing)?;
    let size = sealed.size();
    let uri = concatenator
      .publish(sealed, ctx.storage(), ctx.cancellation())
      .await?;

    state.transition(ConcatState::Done)?;
    ScopeGuard::into_inner(state);

    Ok(ConcatOutput {
      uri,
      size,
      files: refs.len(),
      published_at: Utc::now(),
    })
  }
}

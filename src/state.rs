//! Operation-level state machine for a concat run.
//!
//! A run moves `Idle -> Resolving -> Concatenating -> Publishing -> Done`.
//! Any non-terminal state may move to `Failed`; `Done` and `Failed` are
//! terminal.

use crate::error::{ConcatError, ConcatResult};
use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

/// Phase of a single concat run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ConcatState {
  /// Nothing has happened yet.
  Idle,
  /// Turning the `files` property into references.
  Resolving,
  /// Copying object bytes into the destination.
  Concatenating,
  /// Finalizing and registering the destination.
  Publishing,
  /// The output object was published.
  Done,
  /// The run aborted; nothing was published.
  Failed,
}

impl ConcatState {
  /// Returns true for `Done` and `Failed`.
  pub fn is_terminal(self) -> bool {
    matches!(self, Self::Done | Self::Failed)
  }

  fn can_transition_to(self, next: ConcatState) -> bool {
    use ConcatState::*;
    match (self, next) {
      (Idle, Resolving) | (Resolving, Concatenating) | (Concatenating, Publishing) => true,
      (Publishing, Done) => true,
      (from, Failed) => !from.is_terminal(),
      _ => false,
    }
  }
}

impl fmt::Display for ConcatState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      ConcatState::Idle => "idle",
      ConcatState::Resolving => "resolving",
      ConcatState::Concatenating => "concatenating",
      ConcatState::Publishing => "publishing",
      ConcatState::Done => "done",
      ConcatState::Failed => "failed",
    };
    f.write_str(name)
  }
}

/// Tracks the state of one run and rejects out-of-order transitions.
#[derive(Debug)]
pub struct StateTracker {
  component: String,
  state: ConcatState,
  history: Vec<ConcatState>,
}

impl StateTracker {
  /// Creates a tracker in [`ConcatState::Idle`].
  pub fn new(component: impl Into<String>) -> Self {
    Self {
      component: component.into(),
      state: ConcatState::Idle,
      history: vec![ConcatState::Idle],
    }
  }

  /// Current state.
  pub fn state(&self) -> ConcatState {
    self.state
  }

  /// Every state visited so far, in order, starting with `Idle`.
  pub fn history(&self) -> &[ConcatState] {
    &self.history
  }

  /// Moves to `next`, failing if the transition is not allowed.
  pub fn transition(&mut self, next: ConcatState) -> ConcatResult<()> {
    if !self.state.can_transition_to(next) {
      return Err(ConcatError::InvalidTransition {
        from: self.state,
        to: next,
      });
    }
    debug!(
      component = %self.component,
      from = %self.state,
      to = %next,
      "concat state transition"
    );
    self.state = next;
    self.history.push(next);
    Ok(())
  }

  /// Moves to `Failed` unless already terminal.
  ///
  /// Returns true if the tracker changed state.
  pub fn fail(&mut self) -> bool {
    if self.state.is_terminal() {
      return false;
    }
    warn!(
      component = %self.component,
      from = %self.state,
      "concat run failed, destination discarded"
    );
    self.state = ConcatState::Failed;
    self.history.push(ConcatState::Failed);
    true
  }
}

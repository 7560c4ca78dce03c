//! # Error Handling
//!
//! Every failure of the concat step is reported as a [`ConcatError`]. The
//! step is fail-fast: the first error aborts the operation, the partially
//! written destination is discarded and the error is surfaced to the host
//! unchanged. Retrying is the host's decision at the step level;
//! [`ConcatError::is_retryable`] is only a hint.
//!
//! ## Taxonomy
//!
//! - **InvalidConfiguration**: `files` has the wrong shape or its rendered
//!   payload is not a JSON array of strings
//! - **TemplateRender**: the renderer rejected a template
//! - **ObjectNotFound**: a reference does not resolve to a readable object
//! - **InvalidReference**: the storage backend cannot address a reference
//! - **Io**: reading, writing or finalizing failed
//! - **Cancelled**: the host cancelled the run

use crate::render::RenderError;
use crate::state::ConcatState;
use std::io;
use thiserror::Error;

/// Error type for the concat step.
#[derive(Error, Debug)]
pub enum ConcatError {
  /// The step definition is malformed.
  #[error("invalid configuration: {0}")]
  InvalidConfiguration(String),
  /// The renderer failed to resolve a template.
  #[error(transparent)]
  TemplateRender(#[from] RenderError),
  /// A referenced object does not exist.
  #[error("object not found: {0}")]
  ObjectNotFound(String),
  /// The reference cannot be addressed by the storage backend.
  #[error("invalid reference '{reference}': {reason}")]
  InvalidReference {
    /// The offending reference.
    reference: String,
    /// Why it was rejected.
    reason: String,
  },
  /// Read, write or finalize failure.
  #[error("io error: {0}")]
  Io(#[from] io::Error),
  /// The host cancelled the operation.
  #[error("operation cancelled")]
  Cancelled,
  /// The operation state machine was driven out of order.
  #[error("invalid state transition from {from} to {to}")]
  InvalidTransition {
    /// State the tracker was in.
    from: ConcatState,
    /// State that was requested.
    to: ConcatState,
  },
}

impl ConcatError {
  /// Builds an [`ConcatError::InvalidReference`].
  pub fn invalid_reference(reference: impl Into<String>, reason: impl Into<String>) -> Self {
    Self::InvalidReference {
      reference: reference.into(),
      reason: reason.into(),
    }
  }

  /// Whether re-running the whole step could succeed.
  ///
  /// Only transient I/O failures qualify; configuration, template and
  /// lookup errors fail the same way every time.
  pub fn is_retryable(&self) -> bool {
    matches!(self, Self::Io(_))
  }
}

/// Result type for concat operations.
pub type ConcatResult<T> = Result<T, ConcatError>;

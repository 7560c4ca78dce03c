//! Collaborators the host hands to one step execution.

use crate::config::ConcatConfig;
use crate::render::{PassthroughRenderer, Renderer};
use crate::storage::Storage;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Execution context of a single concat run.
///
/// Storage and renderer are shared handles; the cancellation token lets the
/// host abort the run at its next I/O boundary.
#[derive(Clone)]
pub struct RunContext {
  storage: Arc<dyn Storage>,
  renderer: Arc<dyn Renderer>,
  cancellation: CancellationToken,
  config: ConcatConfig,
}

impl RunContext {
  /// Creates a context over `storage` with a pass-through renderer.
  pub fn new(storage: Arc<dyn Storage>) -> Self {
    Self {
      storage,
      renderer: Arc::new(PassthroughRenderer),
      cancellation: CancellationToken::new(),
      config: ConcatConfig::default(),
    }
  }

  /// Sets the renderer for dynamic properties.
  #[must_use]
  pub fn with_renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
    self.renderer = renderer;
    self
  }

  /// Sets the token the host uses to cancel the run.
  #[must_use]
  pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
    self.cancellation = token;
    self
  }

  /// Sets the step configuration.
  #[must_use]
  pub fn with_config(mut self, config: ConcatConfig) -> Self {
    self.config = config;
    self
  }

  /// Storage backend.
  pub fn storage(&self) -> &dyn Storage {
    self.storage.as_ref()
  }

  /// Template renderer.
  pub fn renderer(&self) -> &dyn Renderer {
    self.renderer.as_ref()
  }

  /// Cancellation token.
  pub fn cancellation(&self) -> &CancellationToken {
    &self.cancellation
  }

  /// Step configuration.
  pub fn config(&self) -> &ConcatConfig {
    &self.config
  }
}

impl std::fmt::Debug for RunContext {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("RunContext")
      .field("cancelled", &self.cancellation.is_cancelled())
      .field("config", &self.config)
      .finish_non_exhaustive()
  }
}

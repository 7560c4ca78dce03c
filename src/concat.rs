//! # Stream Concatenator
//!
//! Copies a sequence of storage objects, in order, into one new object.
//!
//! ## Behavior
//!
//! - Objects are opened and drained one at a time through a single
//!   fixed-size buffer; nothing is materialized in memory
//! - The separator is written before every object except the first
//! - The destination is a [`TempObject`]; any early return drops it, which
//!   deletes the partial file, so only a fully written destination is ever
//!   sealed and published
//! - The cancellation token is observed at every open, read and write
//!
//! ## Example
//!
//! ```rust,no_run
//! use concatweave::{ConcatConfig, Concatenator, MemoryStorage, Reference};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> Result<(), concatweave::ConcatError> {
//! let storage = MemoryStorage::new();
//! storage.put("kestra://a", "a")?;
//! storage.put("kestra://b", "b")?;
//! let refs = vec![Reference::new("kestra://a")?, Reference::new("kestra://b")?];
//!
//! let summary = Concatenator::new(ConcatConfig::default())
//!   .concatenate(&refs, Some(b"\n".as_slice()), &storage, &CancellationToken::new())
//!   .await?;
//! assert_eq!(summary.size, 3);
//! # Ok(())
//! # }
//! ```

use crate::config::ConcatConfig;
use crate::error::{ConcatError, ConcatResult};
use crate::reference::Reference;
use crate::storage::{ObjectReader, SealedObject, Storage, TempObject};
use std::future::Future;
use tokio::io::AsyncReadExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Result of a successful concatenation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConcatSummary {
  /// Reference of the published object.
  pub reference: Reference,
  /// Size of the published object in bytes.
  pub size: u64,
  /// Number of objects that were concatenated.
  pub files: usize,
}

/// Streams objects into a single destination.
#[derive(Debug, Clone, Default)]
pub struct Concatenator {
  config: ConcatConfig,
}

/// Runs `fut` unless the token fires first.
async fn until_cancelled<T, E>(
  cancel: &CancellationToken,
  fut: impl Future<Output = Result<T, E>>,
) -> ConcatResult<T>
where
  ConcatError: From<E>,
{
  tokio::select! {
    biased;
    _ = cancel.cancelled() => Err(ConcatError::Cancelled),
    result = fut => result.map_err(ConcatError::from),
  }
}

impl Concatenator {
  /// Creates a concatenator with the given configuration.
  pub fn new(config: ConcatConfig) -> Self {
    Self { config }
  }

  /// Configuration in use.
  pub fn config(&self) -> &ConcatConfig {
    &self.config
  }

  /// Concatenates `refs` into a new object and publishes it.
  pub async fn concatenate(
    &self,
    refs: &[Reference],
    separator: Option<&[u8]>,
    storage: &dyn Storage,
    cancel: &CancellationToken,
  ) -> ConcatResult<ConcatSummary> {
    let sealed = self.write(refs, separator, storage, cancel).await?;
    let size = sealed.size();
    let reference = self.publish(sealed, storage, cancel).await?;
    Ok(ConcatSummary {
      reference,
      size,
      files: refs.len(),
    })
  }

  /// Writes the concatenation into a scratch destination and seals it.
  ///
  /// The returned object is not visible in storage until it is published.
  pub async fn write(
    &self,
    refs: &[Reference],
    separator: Option<&[u8]>,
    storage: &dyn Storage,
    cancel: &CancellationToken,
  ) -> ConcatResult<SealedObject> {
    let mut dest = until_cancelled(cancel, storage.create_temp()).await?;
    let mut buf = vec![0u8; self.config.effective_buffer_size()];
    let separator = separator.filter(|s| !s.is_empty());

    for (index, reference) in refs.iter().enumerate() {
      if index > 0 {
        if let Some(separator) = separator {
          until_cancelled(cancel, dest.write_all(separator)).await?;
        }
      }

      let mut reader = until_cancelled(cancel, storage.open_read(reference))
        .await
        .inspect_err(|e| {
          warn!(
            component = %self.config.name,
            reference = %reference,
            error = %e,
            "failed to open object"
          )
        })?;
      let copied = copy_object(&mut reader, &mut dest, &mut buf, cancel).await?;
      debug!(
        component = %self.config.name,
        reference = %reference,
        index,
        bytes = copied,
        "appended object"
      );
    }

    until_cancelled(cancel, dest.seal()).await
  }

  /// Registers a sealed destination as a new object.
  ///
  /// Cancellation is honored up to the moment publishing starts; a started
  /// publish runs to completion.
  pub async fn publish(
    &self,
    sealed: SealedObject,
    storage: &dyn Storage,
    cancel: &CancellationToken,
  ) -> ConcatResult<Reference> {
    if cancel.is_cancelled() {
      return Err(ConcatError::Cancelled);
    }
    let size = sealed.size();
    let reference = storage.publish(sealed).await?;
    info!(
      component = %self.config.name,
      reference = %reference,
      bytes = size,
      "published concatenated object"
    );
    Ok(reference)
  }
}

/// Drains `reader` into `dest` through `buf`, returning the bytes copied.
async fn copy_object(
  reader: &mut ObjectReader,
  dest: &mut TempObject,
  buf: &mut [u8],
  cancel: &CancellationToken,
) -> ConcatResult<u64> {
  let mut copied = 0u64;
  loop {
    let n = until_cancelled(cancel, reader.read(buf)).await?;
    if n == 0 {
      return Ok(copied);
    }
    until_cancelled(cancel, dest.write_all(&buf[..n])).await?;
    copied += n as u64;
  }
}

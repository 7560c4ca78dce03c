//! # Storage
//!
//! The object-storage seam of the concat step. A backend has to do three
//! things: hand out a byte stream for a reference, create a scratch
//! destination, and turn a sealed destination into a new object.
//!
//! Destinations are file-backed through `tempfile`. A [`TempObject`] that is
//! dropped before it is sealed and published deletes its file, so every abort
//! path (error, cancellation, a host timeout dropping the future) discards
//! the partial output without extra bookkeeping.

mod local;
mod memory;

pub use local::LocalStorage;
pub use memory::MemoryStorage;

use crate::error::{ConcatError, ConcatResult};
use crate::reference::Reference;
use async_trait::async_trait;
use std::io;
use std::path::Path;
use std::pin::Pin;
use tempfile::{NamedTempFile, TempPath};
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncWriteExt};

/// Readable byte stream of a stored object.
pub type ObjectReader = Pin<Box<dyn AsyncRead + Send>>;

/// Backend that stores the objects concatenated by the step.
#[async_trait]
pub trait Storage: Send + Sync {
  /// Opens the object behind `reference` for reading.
  ///
  /// Fails with [`ConcatError::ObjectNotFound`] when nothing is stored there.
  ///
  /// [`ConcatError::ObjectNotFound`]: crate::error::ConcatError::ObjectNotFound
  async fn open_read(&self, reference: &Reference) -> ConcatResult<ObjectReader>;

  /// Creates an empty scratch destination owned by the caller.
  async fn create_temp(&self) -> ConcatResult<TempObject>;

  /// Registers a sealed destination as a new object and returns its reference.
  async fn publish(&self, object: SealedObject) -> ConcatResult<Reference>;
}

/// Writable scratch destination.
///
/// The backing file is removed when the value is dropped.
#[derive(Debug)]
pub struct TempObject {
  file: File,
  path: TempPath,
  written: u64,
}

impl TempObject {
  /// Creates a destination in the system temp directory.
  pub fn create() -> io::Result<Self> {
    Ok(Self::from_named(NamedTempFile::new()?))
  }

  /// Creates a destination inside `dir`.
  pub fn create_in(dir: impl AsRef<Path>) -> io::Result<Self> {
    Ok(Self::from_named(NamedTempFile::new_in(dir)?))
  }

  fn from_named(named: NamedTempFile) -> Self {
    let (file, path) = named.into_parts();
    Self {
      file: File::from_std(file),
      path,
      written: 0,
    }
  }

  /// Location of the backing file.
  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Bytes written so far.
  pub fn written(&self) -> u64 {
    self.written
  }

  /// Appends `buf` to the destination.
  pub async fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
    self.file.write_all(buf).await?;
    self.written += buf.len() as u64;
    Ok(())
  }

  /// Flushes and syncs the destination, closing the write handle.
  pub async fn seal(self) -> io::Result<SealedObject> {
    let TempObject {
      mut file,
      path,
      written,
    } = self;
    file.flush().await?;
    file.sync_all().await?;
    drop(file);
    Ok(SealedObject { path, size: written })
  }
}

/// Destination whose content is final and ready to publish.
///
/// Like [`TempObject`], dropping it removes the backing file.
#[derive(Debug)]
pub struct SealedObject {
  path: TempPath,
  size: u64,
}

impl SealedObject {
  /// Location of the backing file.
  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Size of the content in bytes.
  pub fn size(&self) -> u64 {
    self.size
  }

  /// Moves the backing file to `target`, refusing to overwrite.
  pub fn persist(self, target: impl AsRef<Path>) -> io::Result<()> {
    self
      .path
      .persist_noclobber(target)
      .map_err(|e| e.error)
  }
}

/// Random name for a newly published object.
pub(crate) fn object_id() -> String {
  format!("{:032x}", rand::random::<u128>())
}

/// Joins an output prefix and an object id into a relative object path.
///
/// Empty and `.` segments of the prefix are dropped, so the result never
/// starts with `/`. A `..` segment is rejected.
pub(crate) fn output_path(prefix: &str, id: &str) -> ConcatResult<String> {
  let mut segments = Vec::new();
  for segment in prefix.split('/') {
    match segment {
      "" | "." => {}
      ".." => {
        return Err(ConcatError::InvalidConfiguration(format!(
          "output prefix '{}' escapes the storage root",
          prefix
        )));
      }
      segment => segments.push(segment),
    }
  }
  segments.push(id);
  Ok(segments.join("/"))
}

/// Runs a blocking filesystem call on the blocking thread pool.
pub(crate) async fn blocking<T, F>(f: F) -> io::Result<T>
where
  F: FnOnce() -> io::Result<T> + Send + 'static,
  T: Send + 'static,
{
  tokio::task::spawn_blocking(f)
    .await
    .map_err(io::Error::other)?
}

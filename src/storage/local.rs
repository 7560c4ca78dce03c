//! Filesystem-backed object store.

use super::{ObjectReader, SealedObject, Storage, TempObject, blocking, object_id, output_path};
use crate::error::{ConcatError, ConcatResult};
use crate::reference::Reference;
use async_trait::async_trait;
use std::io;
use std::path::{Component, Path, PathBuf};
use tokio::fs::{self, File};
use tracing::debug;

const TEMP_DIR: &str = ".tmp";

/// Object store rooted at a local directory.
///
/// A reference `kestra://ns/flow/file.txt` addresses `<root>/ns/flow/file.txt`.
/// Scratch destinations live under `<root>/.tmp` so publishing is a rename
/// on the same filesystem.
#[derive(Debug, Clone)]
pub struct LocalStorage {
  root: PathBuf,
  scheme: String,
  output_prefix: String,
}

impl LocalStorage {
  /// Creates a store rooted at `root` using the `kestra` scheme.
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self {
      root: root.into(),
      scheme: "kestra".to_string(),
      output_prefix: "outputs".to_string(),
    }
  }

  /// Sets the scheme references must carry.
  #[must_use]
  pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
    self.scheme = scheme.into();
    self
  }

  /// Sets the directory, relative to the root, that receives published objects.
  #[must_use]
  pub fn with_output_prefix(mut self, prefix: impl Into<String>) -> Self {
    self.output_prefix = prefix.into();
    self
  }

  /// Root directory of the store.
  pub fn root(&self) -> &Path {
    &self.root
  }

  /// Builds the reference of a path relative to the root.
  pub fn reference_for(&self, relative: &str) -> ConcatResult<Reference> {
    Reference::new(format!(
      "{}://{}",
      self.scheme,
      relative.trim_start_matches('/')
    ))
  }

  /// Maps a reference to a file below the root.
  pub fn resolve_path(&self, reference: &Reference) -> ConcatResult<PathBuf> {
    match reference.scheme() {
      Some(scheme) if scheme == self.scheme => {}
      Some(scheme) => {
        return Err(ConcatError::invalid_reference(
          reference.as_str(),
          format!("unsupported scheme '{}', expected '{}'", scheme, self.scheme),
        ));
      }
      None => {
        return Err(ConcatError::invalid_reference(
          reference.as_str(),
          format!("missing '{}://' scheme", self.scheme),
        ));
      }
    }

    let relative = Path::new(reference.path().trim_start_matches('/'));
    if relative.as_os_str().is_empty() {
      return Err(ConcatError::invalid_reference(
        reference.as_str(),
        "empty object path",
      ));
    }
    let escapes = relative
      .components()
      .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
      return Err(ConcatError::invalid_reference(
        reference.as_str(),
        "path escapes the storage root",
      ));
    }

    Ok(self.root.join(relative))
  }
}

#[async_trait]
impl Storage for LocalStorage {
  async fn open_read(&self, reference: &Reference) -> ConcatResult<ObjectReader> {
    let path = self.resolve_path(reference)?;
    let file = match File::open(&path).await {
      Ok(file) => file,
      Err(e) if e.kind() == io::ErrorKind::NotFound => {
        return Err(ConcatError::ObjectNotFound(reference.to_string()));
      }
      Err(e) => return Err(e.into()),
    };
    if !file.metadata().await?.is_file() {
      return Err(ConcatError::ObjectNotFound(reference.to_string()));
    }
    debug!(reference = %reference, path = %path.display(), "opened local object");
    Ok(Box::pin(file))
  }

  async fn create_temp(&self) -> ConcatResult<TempObject> {
    let dir = self.root.join(TEMP_DIR);
    fs::create_dir_all(&dir).await?;
    Ok(blocking(move || TempObject::create_in(dir)).await?)
  }

  async fn publish(&self, object: SealedObject) -> ConcatResult<Reference> {
    let relative = output_path(&self.output_prefix, &object_id())?;
    let target = self.root.join(&relative);
    if let Some(parent) = target.parent() {
      fs::create_dir_all(parent).await?;
    }
    debug!(path = %target.display(), size = object.size(), "persisting local object");
    blocking(move || object.persist(target)).await?;
    self.reference_for(&relative)
  }
}

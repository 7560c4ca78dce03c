//! In-process object store.

use super::{ObjectReader, SealedObject, Storage, TempObject, blocking, object_id, output_path};
use crate::error::{ConcatError, ConcatResult};
use crate::reference::Reference;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::io::{self, Cursor};
use std::sync::{Arc, RwLock};

/// Object store keeping every object in memory, keyed by its reference.
///
/// Scratch destinations are still file-backed; publishing reads the sealed
/// file back into memory. Clones share the same objects.
#[derive(Debug, Clone)]
pub struct MemoryStorage {
  objects: Arc<RwLock<HashMap<String, Bytes>>>,
  output_prefix: String,
}

impl Default for MemoryStorage {
  fn default() -> Self {
    Self {
      objects: Arc::default(),
      output_prefix: "outputs".to_string(),
    }
  }
}

fn lock_error(e: impl ToString) -> ConcatError {
  ConcatError::Io(io::Error::other(format!("storage lock poisoned: {}", e.to_string())))
}

impl MemoryStorage {
  /// Creates an empty store.
  pub fn new() -> Self {
    Self::default()
  }

  /// Sets the path segment used in references of published objects.
  #[must_use]
  pub fn with_output_prefix(mut self, prefix: impl Into<String>) -> Self {
    self.output_prefix = prefix.into();
    self
  }

  /// Stores `data` under `reference`, replacing any previous object.
  pub fn put(&self, reference: impl Into<String>, data: impl Into<Bytes>) -> ConcatResult<()> {
    let mut objects = self.objects.write().map_err(lock_error)?;
    objects.insert(reference.into(), data.into());
    Ok(())
  }

  /// Returns the object stored under `reference`.
  pub fn get(&self, reference: &str) -> ConcatResult<Option<Bytes>> {
    let objects = self.objects.read().map_err(lock_error)?;
    Ok(objects.get(reference).cloned())
  }

  /// Whether an object is stored under `reference`.
  pub fn contains(&self, reference: &str) -> ConcatResult<bool> {
    let objects = self.objects.read().map_err(lock_error)?;
    Ok(objects.contains_key(reference))
  }

  /// Number of stored objects.
  pub fn len(&self) -> ConcatResult<usize> {
    let objects = self.objects.read().map_err(lock_error)?;
    Ok(objects.len())
  }

  /// Whether the store holds no objects.
  pub fn is_empty(&self) -> ConcatResult<bool> {
    Ok(self.len()? == 0)
  }
}

#[async_trait]
impl Storage for MemoryStorage {
  async fn open_read(&self, reference: &Reference) -> ConcatResult<ObjectReader> {
    match self.get(reference.as_str())? {
      Some(data) => Ok(Box::pin(Cursor::new(data))),
      None => Err(ConcatError::ObjectNotFound(reference.to_string())),
    }
  }

  async fn create_temp(&self) -> ConcatResult<TempObject> {
    Ok(blocking(TempObject::create).await?)
  }

  async fn publish(&self, object: SealedObject) -> ConcatResult<Reference> {
    let data = tokio::fs::read(object.path()).await?;
    let reference = Reference::new(format!(
      "mem://{}",
      output_path(&self.output_prefix, &object_id())?
    ))?;
    self.put(reference.as_str(), data)?;
    Ok(reference)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tokio::io::AsyncReadExt;

  #[tokio::test]
  async fn test_put_then_read() {
    let storage = MemoryStorage::new();
    storage.put("kestra://a", "alpha").unwrap();

    let mut reader = storage
      .open_read(&Reference::new("kestra://a").unwrap())
      .await
      .unwrap();
    let mut content = String::new();
    reader.read_to_string(&mut content).await.unwrap();
    assert_eq!(content, "alpha");
  }

  #[tokio::test]
  async fn test_missing_object() {
    let storage = MemoryStorage::new();
    let result = storage
      .open_read(&Reference::new("kestra://nope").unwrap())
      .await;
    assert!(matches!(result, Err(ConcatError::ObjectNotFound(r)) if r == "kestra://nope"));
  }

  #[tokio::test]
  async fn test_publish_registers_object_and_removes_temp() {
    let storage = MemoryStorage::new().with_output_prefix("concat");
    let mut temp = storage.create_temp().await.unwrap();
    let temp_path = temp.path().to_path_buf();
    temp.write_all(b"payload").await.unwrap();

    let reference = storage.publish(temp.seal().await.unwrap()).await.unwrap();
    assert!(reference.as_str().starts_with("mem://concat/"));
    assert_eq!(
      storage.get(reference.as_str()).unwrap(),
      Some(Bytes::from_static(b"payload"))
    );
    assert_eq!(storage.len().unwrap(), 1);
    assert!(!temp_path.exists());
  }

  #[test]
  fn test_clones_share_objects() {
    let storage = MemoryStorage::new();
    let clone = storage.clone();
    clone.put("kestra://shared", Bytes::new()).unwrap();
    assert!(storage.contains("kestra://shared").unwrap());
    assert!(!storage.is_empty().unwrap());
  }
}

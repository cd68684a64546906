use std::sync::{
  Mutex,
  atomic::{AtomicBool, AtomicU64, Ordering},
};

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;

use super::{Document, DocumentStore, StoreError};

/// In-memory document store used in offline mode and in tests. Ids are
/// assigned from a per-store counter and never reused.
#[derive(Default)]
pub struct MemoryStore {
  collections: Mutex<HashMap<String, Vec<Document>>>,
  next_id: AtomicU64,
  fail_writes: AtomicBool,
}

impl MemoryStore {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  /// Makes all subsequent `add`/`set` calls fail, to exercise the
  /// write-failure paths.
  pub fn set_fail_writes(&self, fail: bool) {
    self.fail_writes.store(fail, Ordering::SeqCst);
  }

  /// Number of documents currently held in a collection.
  #[must_use]
  pub fn len(&self, collection: &str) -> usize {
    self
      .collections
      .lock()
      .expect("store lock")
      .get(collection)
      .map_or(0, Vec::len)
  }

  #[must_use]
  pub fn is_empty(&self, collection: &str) -> bool {
    self.len(collection) == 0
  }

  /// Seeds a document with a chosen id, for test setups.
  pub fn seed(&self, collection: &str, id: &str, fields: Value) {
    self
      .collections
      .lock()
      .expect("store lock")
      .entry(collection.to_string())
      .or_default()
      .push(Document {
        id: id.to_string(),
        fields,
      });
  }

  fn check_writable(&self) -> Result<(), StoreError> {
    if self.fail_writes.load(Ordering::SeqCst) {
      Err(StoreError::Rejected("writes disabled".to_string()))
    } else {
      Ok(())
    }
  }
}

#[async_trait]
impl DocumentStore for MemoryStore {
  async fn get(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
    Ok(
      self
        .collections
        .lock()
        .expect("store lock")
        .get(collection)
        .cloned()
        .unwrap_or_default(),
    )
  }

  async fn add(&self, collection: &str, fields: Value) -> Result<String, StoreError> {
    self.check_writable()?;
    let id = format!("doc-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
    self
      .collections
      .lock()
      .expect("store lock")
      .entry(collection.to_string())
      .or_default()
      .push(Document {
        id: id.clone(),
        fields,
      });
    Ok(id)
  }

  async fn set(&self, collection: &str, id: &str, fields: Value) -> Result<(), StoreError> {
    self.check_writable()?;
    let mut collections = self.collections.lock().expect("store lock");
    let docs = collections.entry(collection.to_string()).or_default();
    if let Some(doc) = docs.iter_mut().find(|d| d.id == id) {
      doc.fields = fields;
    } else {
      // set() is an idempotent overwrite, absent documents are created.
      docs.push(Document {
        id: id.to_string(),
        fields,
      });
    }
    Ok(())
  }
}

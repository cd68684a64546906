use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
  #[error("Store request failed: {0}")]
  Transport(String),
  #[error("Store rejected the write: {0}")]
  Rejected(String),
  #[error("Malformed store response: {0}")]
  Malformed(String),
}

/// A document as the store hands it out: an opaque, store-assigned id and an
/// arbitrary bag of fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
  pub id: String,
  pub fields: Value,
}

/// The narrow interface to the hosted document store. Two collections are
/// used: `"markers"` and `"features"`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
  /// Fetches all documents of a collection.
  async fn get(&self, collection: &str) -> Result<Vec<Document>, StoreError>;
  /// Adds a document and returns the store-assigned id.
  async fn add(&self, collection: &str, fields: Value) -> Result<String, StoreError>;
  /// Overwrites the fields of an existing document. Idempotent.
  async fn set(&self, collection: &str, id: &str, fields: Value) -> Result<(), StoreError>;
}

/// REST client for a hosted document store:
/// `GET /{collection}`, `POST /{collection}` -> `{"id": ...}`,
/// `PUT /{collection}/{id}`.
pub struct HttpStore {
  base_url: String,
  client: surf::Client,
}

impl HttpStore {
  #[must_use]
  pub fn new(base_url: &str) -> Self {
    let client: surf::Client = surf::Config::new()
      .set_timeout(Some(Duration::from_secs(5)))
      .try_into()
      .expect("client");
    Self {
      base_url: base_url.trim_end_matches('/').to_string(),
      client,
    }
  }

  fn collection_url(&self, collection: &str) -> String {
    format!("{}/{}", self.base_url, urlencoding::encode(collection))
  }

  fn document_url(&self, collection: &str, id: &str) -> String {
    format!(
      "{}/{}/{}",
      self.base_url,
      urlencoding::encode(collection),
      urlencoding::encode(id)
    )
  }
}

#[async_trait]
impl DocumentStore for HttpStore {
  async fn get(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
    let mut response = self
      .client
      .get(self.collection_url(collection))
      .await
      .map_err(|e| StoreError::Transport(e.to_string()))?;
    let body: Value = response
      .body_json()
      .await
      .map_err(|e| StoreError::Malformed(e.to_string()))?;

    let docs = body
      .as_array()
      .ok_or_else(|| StoreError::Malformed("expected a document array".to_string()))?;
    docs
      .iter()
      .map(|doc| {
        let id = doc
          .get("id")
          .and_then(Value::as_str)
          .ok_or_else(|| StoreError::Malformed("document without id".to_string()))?;
        Ok(Document {
          id: id.to_string(),
          fields: doc.clone(),
        })
      })
      .collect()
  }

  async fn add(&self, collection: &str, fields: Value) -> Result<String, StoreError> {
    let mut response = self
      .client
      .post(self.collection_url(collection))
      .body_json(&fields)
      .map_err(|e| StoreError::Transport(e.to_string()))?
      .await
      .map_err(|e| StoreError::Transport(e.to_string()))?;
    if !response.status().is_success() {
      return Err(StoreError::Rejected(response.status().to_string()));
    }
    let body: Value = response
      .body_json()
      .await
      .map_err(|e| StoreError::Malformed(e.to_string()))?;
    body
      .get("id")
      .and_then(Value::as_str)
      .map(ToString::to_string)
      .ok_or_else(|| StoreError::Malformed("add response without id".to_string()))
  }

  async fn set(&self, collection: &str, id: &str, fields: Value) -> Result<(), StoreError> {
    let response = self
      .client
      .put(self.document_url(collection, id))
      .body_json(&fields)
      .map_err(|e| StoreError::Transport(e.to_string()))?
      .await
      .map_err(|e| StoreError::Transport(e.to_string()))?;
    if response.status().is_success() {
      Ok(())
    } else {
      Err(StoreError::Rejected(response.status().to_string()))
    }
  }
}

use std::sync::{
  Arc,
  mpsc::{Receiver, Sender},
};

use log::{error, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::coordinates::LngLat;
use crate::store::{Document, DocumentStore, MARKER_COLLECTION, StoreError};

/// A persisted point annotation. The id is assigned by the document store at
/// creation time and never changes; `display_key` mirrors it for labeling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
  pub lng: f32,
  pub lat: f32,
  pub id: String,
  pub display_key: String,
}

impl Marker {
  #[must_use]
  pub fn new(id: String, position: LngLat) -> Self {
    Self {
      lng: position.lng,
      lat: position.lat,
      display_key: id.clone(),
      id,
    }
  }

  #[must_use]
  pub fn position(&self) -> LngLat {
    LngLat::new(self.lng, self.lat)
  }

  fn from_document(doc: &Document) -> Option<Self> {
    let lng = doc.fields.get("lng").and_then(Value::as_f64)?;
    let lat = doc.fields.get("lat").and_then(Value::as_f64)?;
    #[allow(clippy::cast_possible_truncation)]
    let position = LngLat::new(lng as f32, lat as f32);
    Some(Marker::new(doc.id.clone(), position))
  }
}

fn position_fields(position: LngLat) -> Value {
  json!({ "lng": position.lng, "lat": position.lat })
}

/// Reads the whole `"markers"` collection. Documents without usable
/// coordinates are skipped with a log line.
pub async fn fetch_markers(client: &dyn DocumentStore) -> Result<Vec<Marker>, StoreError> {
  let docs = client.get(MARKER_COLLECTION).await?;
  Ok(
    docs
      .iter()
      .filter_map(|doc| {
        let marker = Marker::from_document(doc);
        if marker.is_none() {
          warn!("Skipping marker document {} without coordinates", doc.id);
        }
        marker
      })
      .collect(),
  )
}

/// Sends a new marker document and builds the local record from the
/// store-assigned id. The record must not be applied locally before this
/// resolves.
pub async fn create_marker(
  client: &dyn DocumentStore,
  position: LngLat,
) -> Result<Marker, StoreError> {
  let id = client
    .add(MARKER_COLLECTION, position_fields(position))
    .await?;
  Ok(Marker::new(id, position))
}

/// Overwrites a marker document's coordinates.
pub async fn persist_position(
  client: &dyn DocumentStore,
  id: &str,
  position: LngLat,
) -> Result<(), StoreError> {
  client
    .set(MARKER_COLLECTION, id, position_fields(position))
    .await
}

/// Store-completion events delivered back to the UI thread.
#[derive(Debug, Clone, PartialEq)]
pub enum MarkerEvent {
  /// Full hydration result, replaces the local collection wholesale.
  Hydrated(Vec<Marker>),
  /// A create confirmed by the store, appended with its assigned id.
  Created(Marker),
}

/// The authoritative local view of all markers, kept consistent with the
/// document store.
///
/// All mutation happens on the UI thread: store traffic runs on spawned
/// tasks whose results come back over a channel and are applied in
/// [`MarkerStore::process_pending_events`]. Creation is the one
/// non-optimistic path (the marker appears only once the store has assigned
/// an id); moves update local state first and persist fire-and-forget.
pub struct MarkerStore {
  markers: Vec<Marker>,
  client: Arc<dyn DocumentStore>,
  send: Sender<MarkerEvent>,
  recv: Receiver<MarkerEvent>,
}

impl MarkerStore {
  #[must_use]
  pub fn new(client: Arc<dyn DocumentStore>) -> Self {
    let (send, recv) = std::sync::mpsc::channel();
    Self {
      markers: Vec::new(),
      client,
      send,
      recv,
    }
  }

  #[must_use]
  pub fn markers(&self) -> &[Marker] {
    &self.markers
  }

  #[must_use]
  pub fn get(&self, id: &str) -> Option<&Marker> {
    self.markers.iter().find(|m| m.id == id)
  }

  #[must_use]
  pub fn len(&self) -> usize {
    self.markers.len()
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.markers.is_empty()
  }

  /// Kicks off initial hydration. A failed fetch logs and leaves the local
  /// collection at its default (empty); there is no retry.
  pub fn hydrate(&self) {
    let client = self.client.clone();
    let send = self.send.clone();
    tokio::spawn(async move {
      match fetch_markers(&*client).await {
        Ok(markers) => {
          let _ = send.send(MarkerEvent::Hydrated(markers));
        }
        Err(e) => error!("Failed to hydrate markers: {e}"),
      }
    });
  }

  /// Creates a marker at the clicked position. The local record is appended
  /// only after the store confirms and assigns an id; on failure nothing
  /// changes locally.
  pub fn create(&self, position: LngLat) {
    let client = self.client.clone();
    let send = self.send.clone();
    tokio::spawn(async move {
      match create_marker(&*client, position).await {
        Ok(marker) => {
          let _ = send.send(MarkerEvent::Created(marker));
        }
        Err(e) => error!("Failed to create marker: {e}"),
      }
    });
  }

  /// Moves a marker: optimistic local update (filter-then-append, same id),
  /// then a fire-and-forget persist. The moved marker migrates to the end of
  /// the collection; marker order carries no meaning. Returns false if the
  /// id is unknown.
  pub fn move_marker(&mut self, id: &str, position: LngLat) -> bool {
    if !self.apply_move(id, position) {
      return false;
    }
    let client = self.client.clone();
    let id = id.to_string();
    tokio::spawn(async move {
      if let Err(e) = persist_position(&*client, &id, position).await {
        error!("Failed to persist move of marker {id}: {e}");
      }
    });
    true
  }

  /// The local half of a move. Exposed separately so the optimistic-update
  /// property can be tested without a runtime.
  pub fn apply_move(&mut self, id: &str, position: LngLat) -> bool {
    if !self.markers.iter().any(|m| m.id == id) {
      return false;
    }
    self.markers.retain(|m| m.id != id);
    self.markers.push(Marker::new(id.to_string(), position));
    true
  }

  /// Applies a single store-completion event.
  pub fn apply(&mut self, event: MarkerEvent) {
    match event {
      MarkerEvent::Hydrated(markers) => self.markers = markers,
      MarkerEvent::Created(marker) => self.markers.push(marker),
    }
  }

  /// Drains pending store completions. Called once per frame; returns true
  /// if anything changed so the caller can request a repaint.
  pub fn process_pending_events(&mut self) -> bool {
    let mut changed = false;
    for event in self.recv.try_iter().collect::<Vec<_>>() {
      self.apply(event);
      changed = true;
    }
    changed
  }
}

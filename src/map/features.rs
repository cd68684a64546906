use std::sync::{
  Arc,
  mpsc::{Receiver, Sender},
};

use log::{error, warn};
use serde::{Deserialize, Serialize};

use super::coordinates::LngLat;
use crate::store::{Document, DocumentStore, FEATURE_COLLECTION, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeometryKind {
  LineString,
  Polygon,
}

/// A drawn vector shape: a geometry kind, its vertices, and an opaque
/// property bag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
  pub kind: GeometryKind,
  pub coordinates: Vec<LngLat>,
  #[serde(default)]
  pub properties: serde_json::Value,
}

impl Feature {
  #[must_use]
  pub fn new(kind: GeometryKind, coordinates: Vec<LngLat>) -> Self {
    Self {
      kind,
      coordinates,
      properties: serde_json::Value::Object(serde_json::Map::new()),
    }
  }

  /// Parses the canonical stored-geometry schema:
  /// `{"geometry": {"type": "...", "coordinates": [{"lng": .., "lat": ..}, ..]},
  ///   "properties": {..}}`.
  fn from_document(doc: &Document) -> Option<Self> {
    let geometry = doc.fields.get("geometry")?;
    let kind = match geometry.get("type")?.as_str()? {
      "LineString" => GeometryKind::LineString,
      "Polygon" => GeometryKind::Polygon,
      _ => return None,
    };
    let coordinates = geometry
      .get("coordinates")?
      .as_array()?
      .iter()
      .map(|c| serde_json::from_value::<LngLat>(c.clone()).ok())
      .collect::<Option<Vec<_>>>()?;
    let properties = doc
      .fields
      .get("properties")
      .cloned()
      .unwrap_or(serde_json::Value::Object(serde_json::Map::new()));
    Some(Self {
      kind,
      coordinates,
      properties,
    })
  }
}

/// Reads the `"features"` collection. Documents that do not match the
/// canonical geometry schema are skipped with a log line.
pub async fn fetch_features(client: &dyn DocumentStore) -> Result<Vec<Feature>, StoreError> {
  let docs = client.get(FEATURE_COLLECTION).await?;
  Ok(
    docs
      .iter()
      .filter_map(|doc| {
        let feature = Feature::from_document(doc);
        if feature.is_none() {
          warn!("Skipping feature document {} with unusable geometry", doc.id);
        }
        feature
      })
      .collect(),
  )
}

enum FeatureEvent {
  Hydrated(Vec<Feature>),
}

/// Client-side set of drawn features. Hydrated once from the store at
/// startup; edits stay local, nothing is ever written back.
pub struct FeatureSet {
  features: Vec<Feature>,
  client: Arc<dyn DocumentStore>,
  send: Sender<FeatureEvent>,
  recv: Receiver<FeatureEvent>,
}

impl FeatureSet {
  #[must_use]
  pub fn new(client: Arc<dyn DocumentStore>) -> Self {
    let (send, recv) = std::sync::mpsc::channel();
    Self {
      features: Vec::new(),
      client,
      send,
      recv,
    }
  }

  #[must_use]
  pub fn features(&self) -> &[Feature] {
    &self.features
  }

  #[must_use]
  pub fn len(&self) -> usize {
    self.features.len()
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.features.is_empty()
  }

  pub fn push(&mut self, feature: Feature) {
    self.features.push(feature);
  }

  /// The vertex closest to `target` across all features, with its squared
  /// coordinate-space distance. The caller decides the hit radius.
  #[must_use]
  pub fn nearest_vertex(&self, target: LngLat) -> Option<(usize, usize, f32)> {
    self
      .features
      .iter()
      .enumerate()
      .flat_map(|(fi, feature)| {
        feature.coordinates.iter().enumerate().map(move |(vi, c)| {
          let dx = c.lng - target.lng;
          let dy = c.lat - target.lat;
          (fi, vi, dx * dx + dy * dy)
        })
      })
      .min_by(|a, b| a.2.total_cmp(&b.2))
  }

  pub fn set_vertex(&mut self, feature_idx: usize, vertex_idx: usize, position: LngLat) {
    if let Some(vertex) = self
      .features
      .get_mut(feature_idx)
      .and_then(|f| f.coordinates.get_mut(vertex_idx))
    {
      *vertex = position;
    }
  }

  /// Kicks off the one hydration read. A failure logs and leaves the set
  /// empty.
  pub fn hydrate(&self) {
    let client = self.client.clone();
    let send = self.send.clone();
    tokio::spawn(async move {
      match fetch_features(&*client).await {
        Ok(features) => {
          let _ = send.send(FeatureEvent::Hydrated(features));
        }
        Err(e) => error!("Failed to hydrate features: {e}"),
      }
    });
  }

  /// Drains pending hydration results. Returns true if anything changed.
  pub fn process_pending_events(&mut self) -> bool {
    let mut changed = false;
    for event in self.recv.try_iter().collect::<Vec<_>>() {
      let FeatureEvent::Hydrated(features) = event;
      self.features = features;
      changed = true;
    }
    changed
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::store::MemoryStore;
  use serde_json::json;

  #[tokio::test]
  async fn hydrates_canonical_schema_and_skips_malformed() {
    let store = MemoryStore::new();
    store.seed(
      FEATURE_COLLECTION,
      "f1",
      json!({
        "geometry": {
          "type": "LineString",
          "coordinates": [
            {"lng": -121.89, "lat": 37.69},
            {"lng": -121.90, "lat": 37.70},
          ],
        },
        "properties": {},
      }),
    );
    store.seed(FEATURE_COLLECTION, "broken", json!({"geometry": {"type": "Blob"}}));

    let features = fetch_features(&store).await.unwrap();
    assert_eq!(features.len(), 1);
    assert_eq!(features[0].kind, GeometryKind::LineString);
    assert_eq!(features[0].coordinates.len(), 2);
  }

  #[test]
  fn nearest_vertex_picks_the_closest() {
    let mut set = FeatureSet::new(Arc::new(MemoryStore::new()));
    set.push(Feature::new(
      GeometryKind::Polygon,
      vec![LngLat::new(0., 0.), LngLat::new(1., 0.), LngLat::new(0., 1.)],
    ));
    let (fi, vi, _) = set.nearest_vertex(LngLat::new(0.9, 0.1)).unwrap();
    assert_eq!((fi, vi), (0, 1));

    set.set_vertex(0, 1, LngLat::new(2., 2.));
    assert!(set.features()[0].coordinates[1].exact_eq(&LngLat::new(2., 2.)));
  }
}

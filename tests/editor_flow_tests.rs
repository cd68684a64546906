use std::sync::Arc;

use mapmark::EditorState;
use mapmark::map::{coordinates::LngLat, draw_mode::DrawMode, features::GeometryKind};
use mapmark::store::{DocumentStore, FEATURE_COLLECTION, MemoryStore};
use serde_json::json;

async fn settle() {
  for _ in 0..16 {
    tokio::task::yield_now().await;
  }
}

#[tokio::test]
async fn click_without_draw_mode_places_a_marker() {
  let mut state = EditorState::new(Arc::new(MemoryStore::new()));
  state.handle_map_click(LngLat::new(-121.89, 37.69));
  settle().await;
  state.process_pending_events();

  assert_eq!(state.markers().len(), 1);
  assert!(!state.markers().markers()[0].id.is_empty());
}

#[tokio::test]
async fn popup_replacement_and_drag_clearing() {
  let client = Arc::new(MemoryStore::new());
  let mut state = EditorState::new(client);
  state.handle_map_click(LngLat::new(0., 0.));
  state.handle_map_click(LngLat::new(1., 1.));
  settle().await;
  state.process_pending_events();
  let ids: Vec<String> = state
    .markers()
    .markers()
    .iter()
    .map(|m| m.id.clone())
    .collect();
  assert_eq!(ids.len(), 2);

  state.handle_marker_toggle(&ids[0]);
  state.handle_marker_toggle(&ids[1]);
  assert!(state.selection().is_shown(&ids[1]));
  assert!(!state.selection().is_shown(&ids[0]));

  // Dragging the other marker still clears the popup.
  state.handle_marker_drag_start();
  state.handle_marker_drag_end(&ids[0], LngLat::new(2., 2.));
  assert_eq!(state.selection().shown(), None);
}

#[tokio::test]
async fn draw_polygon_then_edit_vertex() {
  let mut state = EditorState::new(Arc::new(MemoryStore::new()));

  state.select_mode(DrawMode::Polygon);
  state.handle_map_click(LngLat::new(0., 0.));
  state.handle_map_click(LngLat::new(0.01, 0.));
  state.handle_map_click(LngLat::new(0., 0.01));
  state.handle_map_double_click();
  assert_eq!(state.features().len(), 1);
  assert_eq!(state.features().features()[0].kind, GeometryKind::Polygon);

  // Draw mode toggles off, then editing grabs the second vertex.
  state.select_mode(DrawMode::Polygon);
  state.select_mode(DrawMode::Editing);
  assert!(state.handle_surface_drag_start(LngLat::new(0.0101, 0.)));
  state.handle_surface_drag(LngLat::new(0.02, 0.02));
  state.handle_surface_drag_end();
  assert!(state.features().features()[0].coordinates[1].exact_eq(&LngLat::new(0.02, 0.02)));

  // Clicks while drawing never created markers.
  assert!(state.markers().is_empty());
}

#[tokio::test]
async fn features_hydrate_read_only() {
  let client = Arc::new(MemoryStore::new());
  client.seed(
    FEATURE_COLLECTION,
    "f1",
    json!({
      "geometry": {
        "type": "Polygon",
        "coordinates": [
          {"lng": 0.0, "lat": 0.0},
          {"lng": 1.0, "lat": 0.0},
          {"lng": 0.0, "lat": 1.0},
        ],
      },
      "properties": {"name": "test"},
    }),
  );

  let mut state = EditorState::new(client.clone());
  state.hydrate();
  settle().await;
  state.process_pending_events();
  assert_eq!(state.features().len(), 1);

  // Local edits never flow back to the store.
  state.select_mode(DrawMode::Editing);
  assert!(state.handle_surface_drag_start(LngLat::new(1.001, 0.)));
  state.handle_surface_drag(LngLat::new(3., 3.));
  state.handle_surface_drag_end();
  settle().await;

  let docs = client.get(FEATURE_COLLECTION).await.unwrap();
  assert_eq!(docs[0].fields["geometry"]["coordinates"][1]["lng"], 1.0);
}

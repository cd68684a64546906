use serde::{Deserialize, Serialize};

use super::{
  coordinates::LngLat,
  features::{Feature, FeatureSet, GeometryKind},
};

/// Squared coordinate-space distance within which an editing drag grabs a
/// vertex.
const VERTEX_HIT_RADIUS_SQ: f32 = 0.0001;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrawMode {
  Polyline,
  Polygon,
  Editing,
}

impl DrawMode {
  #[must_use]
  pub fn name(&self) -> &'static str {
    match self {
      DrawMode::Polyline => "Draw Polyline",
      DrawMode::Polygon => "Draw Polygon",
      DrawMode::Editing => "Edit Feature",
    }
  }

  #[must_use]
  pub fn all() -> &'static [DrawMode] {
    &[DrawMode::Polyline, DrawMode::Polygon, DrawMode::Editing]
  }

  fn handler(self) -> Box<dyn ModeHandler> {
    match self {
      DrawMode::Polyline => Box::new(LineHandler::new(GeometryKind::LineString)),
      DrawMode::Polygon => Box::new(LineHandler::new(GeometryKind::Polygon)),
      DrawMode::Editing => Box::new(EditingHandler::default()),
    }
  }
}

/// The narrow interface the drawing-editor surface drives. A handler
/// consumes positions from the map surface and mutates the feature set.
pub trait ModeHandler {
  /// A primary click at a map position.
  fn handle_click(&mut self, position: LngLat, features: &mut FeatureSet);

  /// The finish gesture (double-click). Commits pending geometry when it is
  /// complete, otherwise drops it.
  fn finish(&mut self, features: &mut FeatureSet);

  /// In-progress vertices for preview rendering.
  fn preview(&self) -> &[LngLat] {
    &[]
  }

  /// Returns true if the handler grabbed something at this position and the
  /// drag belongs to it rather than to the camera.
  fn handle_drag_start(&mut self, _position: LngLat, _features: &FeatureSet) -> bool {
    false
  }

  fn handle_drag(&mut self, _position: LngLat, _features: &mut FeatureSet) {}

  fn handle_drag_end(&mut self) {}
}

/// Accumulates clicked vertices into a pending line or polygon.
struct LineHandler {
  kind: GeometryKind,
  pending: Vec<LngLat>,
}

impl LineHandler {
  fn new(kind: GeometryKind) -> Self {
    Self {
      kind,
      pending: Vec::new(),
    }
  }

  fn min_vertices(&self) -> usize {
    match self.kind {
      GeometryKind::LineString => 2,
      GeometryKind::Polygon => 3,
    }
  }
}

impl ModeHandler for LineHandler {
  fn handle_click(&mut self, position: LngLat, _features: &mut FeatureSet) {
    self.pending.push(position);
  }

  fn finish(&mut self, features: &mut FeatureSet) {
    let pending = std::mem::take(&mut self.pending);
    if pending.len() >= self.min_vertices() {
      features.push(Feature::new(self.kind, pending));
    }
  }

  fn preview(&self) -> &[LngLat] {
    &self.pending
  }
}

/// Grabs the nearest existing vertex and drags it.
#[derive(Default)]
struct EditingHandler {
  grabbed: Option<(usize, usize)>,
}

impl ModeHandler for EditingHandler {
  fn handle_click(&mut self, _position: LngLat, _features: &mut FeatureSet) {}

  fn finish(&mut self, _features: &mut FeatureSet) {
    self.grabbed = None;
  }

  fn handle_drag_start(&mut self, position: LngLat, features: &FeatureSet) -> bool {
    self.grabbed = features
      .nearest_vertex(position)
      .filter(|(_, _, dist_sq)| *dist_sq <= VERTEX_HIT_RADIUS_SQ)
      .map(|(fi, vi, _)| (fi, vi));
    self.grabbed.is_some()
  }

  fn handle_drag(&mut self, position: LngLat, features: &mut FeatureSet) {
    if let Some((fi, vi)) = self.grabbed {
      features.set_vertex(fi, vi, position);
    }
  }

  fn handle_drag_end(&mut self) {
    self.grabbed = None;
  }
}

struct ActiveMode {
  mode: DrawMode,
  handler: Box<dyn ModeHandler>,
}

/// Translates toolbar selections into mode-handler instances. At most one
/// mode is active; a handler exists exactly as long as its mode is selected.
#[derive(Default)]
pub struct ModeSelector {
  active: Option<ActiveMode>,
}

impl ModeSelector {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  /// Selecting the active mode deselects it; anything else installs a fresh
  /// handler instance.
  pub fn select(&mut self, mode: DrawMode) {
    if self.active_mode() == Some(mode) {
      self.active = None;
    } else {
      self.active = Some(ActiveMode {
        mode,
        handler: mode.handler(),
      });
    }
  }

  #[must_use]
  pub fn active_mode(&self) -> Option<DrawMode> {
    self.active.as_ref().map(|a| a.mode)
  }

  pub fn handler_mut(&mut self) -> Option<&mut dyn ModeHandler> {
    // Unboxing through a closure fails to unify the trait object lifetime;
    // the match lets the coercion happen at the return position.
    match self.active.as_mut() {
      Some(a) => Some(a.handler.as_mut()),
      None => None,
    }
  }

  #[must_use]
  pub fn preview(&self) -> &[LngLat] {
    self.active.as_ref().map_or(&[], |a| a.handler.preview())
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use super::*;
  use crate::store::MemoryStore;
  use rstest::rstest;

  fn empty_features() -> FeatureSet {
    FeatureSet::new(Arc::new(MemoryStore::new()))
  }

  #[rstest]
  #[case(DrawMode::Polyline)]
  #[case(DrawMode::Polygon)]
  #[case(DrawMode::Editing)]
  fn selecting_twice_deselects(#[case] mode: DrawMode) {
    let mut selector = ModeSelector::new();
    selector.select(mode);
    assert_eq!(selector.active_mode(), Some(mode));
    selector.select(mode);
    assert_eq!(selector.active_mode(), None);
    assert!(selector.handler_mut().is_none());
  }

  #[test]
  fn reselect_installs_fresh_handler() {
    let mut selector = ModeSelector::new();
    let mut features = empty_features();

    selector.select(DrawMode::Polyline);
    selector
      .handler_mut()
      .unwrap()
      .handle_click(LngLat::new(1., 1.), &mut features);
    assert_eq!(selector.preview().len(), 1);

    selector.select(DrawMode::Polygon);
    selector.select(DrawMode::Polyline);
    assert!(selector.preview().is_empty(), "pending state must be gone");
  }

  #[test]
  fn polyline_commits_on_finish() {
    let mut selector = ModeSelector::new();
    let mut features = empty_features();
    selector.select(DrawMode::Polyline);
    let handler = selector.handler_mut().unwrap();
    handler.handle_click(LngLat::new(0., 0.), &mut features);
    handler.handle_click(LngLat::new(1., 1.), &mut features);
    handler.finish(&mut features);
    assert_eq!(features.len(), 1);
    assert_eq!(features.features()[0].kind, GeometryKind::LineString);
    assert!(selector.preview().is_empty());
  }

  #[test]
  fn incomplete_polygon_is_dropped() {
    let mut selector = ModeSelector::new();
    let mut features = empty_features();
    selector.select(DrawMode::Polygon);
    let handler = selector.handler_mut().unwrap();
    handler.handle_click(LngLat::new(0., 0.), &mut features);
    handler.handle_click(LngLat::new(1., 0.), &mut features);
    handler.finish(&mut features);
    assert!(features.is_empty());
  }

  #[test]
  fn editing_drags_the_grabbed_vertex() {
    let mut selector = ModeSelector::new();
    let mut features = empty_features();
    features.push(Feature::new(
      GeometryKind::LineString,
      vec![LngLat::new(0., 0.), LngLat::new(1., 0.)],
    ));

    selector.select(DrawMode::Editing);
    let handler = selector.handler_mut().unwrap();
    assert!(handler.handle_drag_start(LngLat::new(1.001, 0.), &features));
    handler.handle_drag(LngLat::new(2., 2.), &mut features);
    handler.handle_drag_end();
    assert!(features.features()[0].coordinates[1].exact_eq(&LngLat::new(2., 2.)));
  }

  #[test]
  fn editing_drag_far_from_vertices_grabs_nothing() {
    let mut selector = ModeSelector::new();
    let features = empty_features();
    selector.select(DrawMode::Editing);
    let handler = selector.handler_mut().unwrap();
    assert!(!handler.handle_drag_start(LngLat::new(50., 50.), &features));
  }
}

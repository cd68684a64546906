use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{
  coordinates::{LngLat, Viewport},
  draw_mode::{DrawMode, ModeSelector},
  features::FeatureSet,
  marker::MarkerStore,
  selection::SelectionState,
};
use crate::store::DocumentStore;

/// The two fixed map styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MapStyle {
  #[default]
  Normal,
  Street,
}

impl MapStyle {
  #[must_use]
  pub fn name(&self) -> &'static str {
    match self {
      MapStyle::Normal => "Normal View",
      MapStyle::Street => "Street View",
    }
  }

  /// Identifier handed to the map surface.
  #[must_use]
  pub fn style_id(&self) -> &'static str {
    match self {
      MapStyle::Normal => "normal",
      MapStyle::Street => "street",
    }
  }

  #[must_use]
  pub fn toggled(self) -> Self {
    match self {
      MapStyle::Normal => MapStyle::Street,
      MapStyle::Street => MapStyle::Normal,
    }
  }

  /// Label for the toggle control: it names the action, i.e. the style the
  /// toggle switches to, not the current one.
  #[must_use]
  pub fn action_label(&self) -> &'static str {
    self.toggled().name()
  }
}

/// All editor state in one owned container, passed by reference to the UI
/// handlers that need it.
pub struct EditorState {
  markers: MarkerStore,
  features: FeatureSet,
  selection: SelectionState,
  modes: ModeSelector,
  viewport: Viewport,
  style: MapStyle,
  show_markers: bool,
}

impl EditorState {
  #[must_use]
  pub fn new(client: Arc<dyn DocumentStore>) -> Self {
    Self {
      markers: MarkerStore::new(client.clone()),
      features: FeatureSet::new(client),
      selection: SelectionState::new(),
      modes: ModeSelector::new(),
      viewport: Viewport::default(),
      style: MapStyle::default(),
      show_markers: true,
    }
  }

  /// Initial load: markers and features are read from the store once.
  pub fn hydrate(&self) {
    self.markers.hydrate();
    self.features.hydrate();
  }

  /// Drains store completions. Returns true if a repaint is warranted.
  pub fn process_pending_events(&mut self) -> bool {
    let markers_changed = self.markers.process_pending_events();
    let features_changed = self.features.process_pending_events();
    markers_changed || features_changed
  }

  #[must_use]
  pub fn markers(&self) -> &MarkerStore {
    &self.markers
  }

  pub fn markers_mut(&mut self) -> &mut MarkerStore {
    &mut self.markers
  }

  #[must_use]
  pub fn features(&self) -> &FeatureSet {
    &self.features
  }

  #[must_use]
  pub fn selection(&self) -> &SelectionState {
    &self.selection
  }

  #[must_use]
  pub fn modes(&self) -> &ModeSelector {
    &self.modes
  }

  #[must_use]
  pub fn viewport(&self) -> Viewport {
    self.viewport
  }

  #[must_use]
  pub fn style(&self) -> MapStyle {
    self.style
  }

  #[must_use]
  pub fn markers_visible(&self) -> bool {
    self.show_markers
  }

  /// A primary click on the map surface. An active draw mode consumes it;
  /// otherwise it places a new marker at the clicked position.
  pub fn handle_map_click(&mut self, position: LngLat) {
    if let Some(handler) = self.modes.handler_mut() {
      handler.handle_click(position, &mut self.features);
    } else {
      self.markers.create(position);
    }
  }

  /// A double-click on the map surface finishes pending draw geometry.
  pub fn handle_map_double_click(&mut self) {
    if let Some(handler) = self.modes.handler_mut() {
      handler.finish(&mut self.features);
    }
  }

  /// Toggle-open interaction on a marker icon.
  pub fn handle_marker_toggle(&mut self, id: &str) {
    self.selection.toggle_popup(id);
  }

  pub fn handle_marker_drag_start(&mut self) {
    self.selection.drag_started();
  }

  /// Drag-end with the marker's new position: optimistic local move plus
  /// fire-and-forget persist, and the popup is cleared whichever marker was
  /// dragged.
  pub fn handle_marker_drag_end(&mut self, id: &str, position: LngLat) {
    self.markers.move_marker(id, position);
    self.selection.drag_ended();
  }

  pub fn close_popup(&mut self) {
    self.selection.close_popup();
  }

  pub fn select_mode(&mut self, mode: DrawMode) {
    self.modes.select(mode);
  }

  /// Returns true if the editing handler grabbed a vertex and the drag
  /// belongs to the drawing editor rather than the camera.
  pub fn handle_surface_drag_start(&mut self, position: LngLat) -> bool {
    self
      .modes
      .handler_mut()
      .is_some_and(|handler| handler.handle_drag_start(position, &self.features))
  }

  pub fn handle_surface_drag(&mut self, position: LngLat) {
    if let Some(handler) = self.modes.handler_mut() {
      handler.handle_drag(position, &mut self.features);
    }
  }

  pub fn handle_surface_drag_end(&mut self) {
    if let Some(handler) = self.modes.handler_mut() {
      handler.handle_drag_end();
    }
  }

  pub fn toggle_style(&mut self) {
    self.style = self.style.toggled();
  }

  pub fn set_style(&mut self, style: MapStyle) {
    self.style = style;
  }

  pub fn toggle_marker_visibility(&mut self) {
    self.show_markers = !self.show_markers;
  }

  /// Camera change from the map surface; the record is replaced wholesale.
  pub fn set_viewport(&mut self, viewport: Viewport) {
    self.viewport = viewport;
  }
}

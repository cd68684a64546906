use egui::{Color32, PointerButton, Pos2, Rect, Response, Sense, Stroke, Ui, Widget};
use log::debug;

use crate::{
  config::Config,
  map::{
    coordinates::LngLat,
    draw_mode::DrawMode,
    editor::{EditorState, MapStyle},
    features::GeometryKind,
  },
};

/// Screen-space radius within which a pointer interaction hits a marker.
const MARKER_HIT_RADIUS: f32 = 12.;
const MARKER_RADIUS: f32 = 6.;

/// What the current primary-button drag is attached to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
enum DragTarget {
  #[default]
  None,
  Marker(String),
  Vertex,
  Pan,
}

/// The map surface: draws the style background, features, and markers, and
/// translates pointer gestures into editor-state calls.
pub struct MapSurface {
  drag: DragTarget,
}

impl MapSurface {
  #[must_use]
  pub fn new() -> Self {
    Self {
      drag: DragTarget::None,
    }
  }
}

impl Default for MapSurface {
  fn default() -> Self {
    Self::new()
  }
}

/// Widget pairing of surface and state so the caller can
/// `ui.add(SurfaceWidget { .. })`.
pub struct SurfaceWidget<'a> {
  pub surface: &'a mut MapSurface,
  pub state: &'a mut EditorState,
}

impl Widget for SurfaceWidget<'_> {
  fn ui(self, ui: &mut Ui) -> Response {
    let size = ui.available_size();
    let (rect, response) = ui.allocate_exact_size(size, Sense::click_and_drag());

    let SurfaceWidget { surface, state } = self;

    // Camera records are replaced wholesale, resize included.
    let viewport = state.viewport();
    if (viewport.width - rect.width()).abs() > 0.5 || (viewport.height - rect.height()).abs() > 0.5
    {
      state.set_viewport(viewport.with_size(rect.width(), rect.height()));
    }

    surface.handle_mouse_wheel(ui, &response, state);
    surface.handle_pointer(&response, rect, state);

    if ui.is_rect_visible(rect) {
      paint_surface(ui, rect, state);
    }

    show_popup(ui, rect, state);

    response
  }
}

impl MapSurface {
  fn handle_mouse_wheel(&mut self, ui: &Ui, response: &Response, state: &mut EditorState) {
    if !response.hovered() {
      return;
    }
    let delta = ui.input(|i| {
      i.events.iter().find_map(|e| match e {
        egui::Event::MouseWheel { delta, .. } => Some(delta.y),
        _ => None,
      })
    });
    if let Some(delta) = delta {
      let viewport = state.viewport();
      let step = if delta > 0. { 0.25 } else { -0.25 };
      state.set_viewport(viewport.with_zoom(viewport.zoom + step));
    }
  }

  fn handle_pointer(&mut self, response: &Response, rect: Rect, state: &mut EditorState) {
    // Snapshot of this frame's camera for pointer-to-coordinate conversion.
    let frame_viewport = state.viewport();
    let pointer_coord =
      move |pos: Pos2| frame_viewport.unproject(pos.x - rect.left(), pos.y - rect.top());

    if response.drag_started_by(PointerButton::Primary) {
      if let Some(pos) = response.interact_pointer_pos() {
        let coord = pointer_coord(pos);
        if let Some(id) = hit_test_marker(state, rect, pos) {
          debug!("Drag started on marker {id}");
          state.handle_marker_drag_start();
          self.drag = DragTarget::Marker(id);
        } else if state.handle_surface_drag_start(coord) {
          self.drag = DragTarget::Vertex;
        } else {
          self.drag = DragTarget::Pan;
        }
      }
    }

    if response.dragged_by(PointerButton::Primary) {
      match &self.drag {
        DragTarget::Vertex => {
          if let Some(pos) = response.interact_pointer_pos() {
            state.handle_surface_drag(pointer_coord(pos));
          }
        }
        DragTarget::Pan => {
          let viewport = state.viewport();
          let delta = response.drag_delta();
          let (cx, cy) = (viewport.width / 2., viewport.height / 2.);
          let center = viewport.unproject(cx - delta.x, cy - delta.y);
          state.set_viewport(viewport.with_center(center));
        }
        // Marker position is committed on release, matching the
        // drag-end-driven move semantics.
        DragTarget::Marker(_) | DragTarget::None => {}
      }
    }

    if response.drag_stopped_by(PointerButton::Primary) {
      match std::mem::take(&mut self.drag) {
        DragTarget::Marker(id) => {
          if let Some(pos) = response.interact_pointer_pos() {
            state.handle_marker_drag_end(&id, pointer_coord(pos));
          }
        }
        DragTarget::Vertex => state.handle_surface_drag_end(),
        DragTarget::Pan | DragTarget::None => {}
      }
    }

    if response.double_clicked() {
      if let Some(pos) = response.interact_pointer_pos() {
        if let Some(id) = hit_test_marker(state, rect, pos) {
          state.handle_marker_toggle(&id);
        } else {
          state.handle_map_double_click();
        }
      }
    } else if response.clicked() {
      if let Some(pos) = response.interact_pointer_pos() {
        if hit_test_marker(state, rect, pos).is_none() {
          state.handle_map_click(pointer_coord(pos));
        }
      }
    }
  }
}

fn hit_test_marker(state: &EditorState, rect: Rect, pos: Pos2) -> Option<String> {
  if !state.markers_visible() {
    return None;
  }
  let viewport = state.viewport();
  state
    .markers()
    .markers()
    .iter()
    .filter_map(|marker| {
      let (x, y) = viewport.project(marker.position());
      let dx = x + rect.left() - pos.x;
      let dy = y + rect.top() - pos.y;
      let dist_sq = dx * dx + dy * dy;
      (dist_sq <= MARKER_HIT_RADIUS * MARKER_HIT_RADIUS).then(|| (marker.id.clone(), dist_sq))
    })
    .min_by(|a, b| a.1.total_cmp(&b.1))
    .map(|(id, _)| id)
}

fn style_colors(style: MapStyle) -> (Color32, Color32) {
  match style {
    MapStyle::Normal => (
      Color32::from_rgb(232, 236, 228),
      Color32::from_rgb(200, 206, 196),
    ),
    MapStyle::Street => (
      Color32::from_rgb(244, 242, 235),
      Color32::from_rgb(214, 205, 186),
    ),
  }
}

fn paint_surface(ui: &Ui, rect: Rect, state: &EditorState) {
  let painter = ui.painter_at(rect);
  let viewport = state.viewport();
  let (background, grid) = style_colors(state.style());
  painter.rect_filled(rect, 0, background);

  // Simple graticule instead of tiles; tile rendering is not this crate's
  // concern.
  let grid_step = graticule_step(viewport.zoom);
  let top_left = viewport.unproject(0., 0.);
  let bottom_right = viewport.unproject(viewport.width, viewport.height);
  let mut lng = (top_left.lng / grid_step).floor() * grid_step;
  while lng <= bottom_right.lng + grid_step {
    let (x, _) = viewport.project(LngLat::new(lng, viewport.center.lat));
    painter.vline(
      rect.left() + x,
      rect.top()..=rect.bottom(),
      Stroke::new(1., grid),
    );
    lng += grid_step;
  }
  let mut lat = (bottom_right.lat / grid_step).floor() * grid_step;
  while lat <= top_left.lat + grid_step {
    let (_, y) = viewport.project(LngLat::new(viewport.center.lng, lat));
    painter.hline(
      rect.left()..=rect.right(),
      rect.top() + y,
      Stroke::new(1., grid),
    );
    lat += grid_step;
  }

  let to_screen = |c: LngLat| {
    let (x, y) = viewport.project(c);
    Pos2::new(rect.left() + x, rect.top() + y)
  };

  // Persisted/drawn features.
  for feature in state.features().features() {
    let points: Vec<Pos2> = feature.coordinates.iter().copied().map(to_screen).collect();
    let stroke = Stroke::new(2., Color32::from_rgb(30, 100, 200));
    match feature.kind {
      GeometryKind::LineString => {
        for pair in points.windows(2) {
          painter.line_segment([pair[0], pair[1]], stroke);
        }
      }
      GeometryKind::Polygon => {
        for i in 0..points.len() {
          painter.line_segment([points[i], points[(i + 1) % points.len()]], stroke);
        }
      }
    }
  }

  // In-progress preview of the active draw mode.
  let preview: Vec<Pos2> = state.modes().preview().iter().copied().map(to_screen).collect();
  let preview_stroke = Stroke::new(1.5, Color32::from_rgb(200, 80, 30));
  for pair in preview.windows(2) {
    painter.line_segment([pair[0], pair[1]], preview_stroke);
  }
  for point in &preview {
    painter.circle_filled(*point, 3., preview_stroke.color);
  }

  if state.markers_visible() {
    for marker in state.markers().markers() {
      let center = to_screen(marker.position());
      painter.circle_filled(center, MARKER_RADIUS, Color32::from_rgb(30, 120, 220));
      painter.circle_stroke(center, MARKER_RADIUS, Stroke::new(1.5, Color32::WHITE));
    }
  }
}

fn graticule_step(zoom: f32) -> f32 {
  match zoom {
    z if z >= 16. => 0.002,
    z if z >= 13. => 0.01,
    z if z >= 10. => 0.1,
    z if z >= 6. => 1.,
    _ => 10.,
  }
}

fn show_popup(ui: &Ui, rect: Rect, state: &mut EditorState) {
  let Some(id) = state.selection().shown().map(ToString::to_string) else {
    return;
  };
  let Some(marker) = state.markers().get(&id) else {
    return;
  };
  let viewport = state.viewport();
  let (x, y) = viewport.project(marker.position());
  let anchor = Pos2::new(rect.left() + x, rect.top() + y - MARKER_RADIUS * 2.);

  let mut close_requested = false;
  egui::Window::new(marker.display_key.clone())
    .collapsible(false)
    .resizable(false)
    .fixed_pos(anchor)
    .pivot(egui::Align2::CENTER_BOTTOM)
    .show(ui.ctx(), |ui| {
      ui.label(format!("{:.6}, {:.6}", marker.lat, marker.lng));
      if ui.button("Close").clicked() {
        close_requested = true;
      }
    });
  if close_requested {
    state.close_popup();
  }
}

/// The application shell: toolbar on top, map surface below.
pub struct MapApp {
  state: EditorState,
  surface: MapSurface,
  #[allow(dead_code)]
  config: Config,
}

impl MapApp {
  #[must_use]
  pub fn new(mut state: EditorState, config: Config) -> Self {
    state.set_style(config.style);
    state.hydrate();
    Self {
      state,
      surface: MapSurface::new(),
      config,
    }
  }

  fn toolbar(&mut self, ui: &mut Ui) {
    ui.horizontal(|ui| {
      if ui.button(self.state.style().action_label()).clicked() {
        self.state.toggle_style();
        debug!("Switched map style to {}", self.state.style().style_id());
      }

      let marker_label = if self.state.markers_visible() {
        "Hide Markers"
      } else {
        "Show Markers"
      };
      if ui.button(marker_label).clicked() {
        self.state.toggle_marker_visibility();
      }

      ui.separator();

      for mode in DrawMode::all() {
        let selected = self.state.modes().active_mode() == Some(*mode);
        if ui.selectable_label(selected, mode.name()).clicked() {
          self.state.select_mode(*mode);
        }
      }
    });
  }
}

impl eframe::App for MapApp {
  fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
    if self.state.process_pending_events() {
      ctx.request_repaint();
    }

    egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
      self.toolbar(ui);
    });

    egui::CentralPanel::default()
      .frame(egui::Frame::NONE)
      .show(ctx, |ui| {
        ui.add(SurfaceWidget {
          surface: &mut self.surface,
          state: &mut self.state,
        });
      });
  }
}

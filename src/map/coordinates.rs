use serde::{Deserialize, Serialize};

const PI: f32 = std::f32::consts::PI;

/// A WGS84 coordinate in `(lng, lat)` order, matching the order the map
/// surface reports click positions in.
#[derive(Debug, Default, PartialEq, Copy, Clone, Serialize, Deserialize)]
pub struct LngLat {
  #[serde(alias = "longitude")]
  pub lng: f32,
  #[serde(alias = "latitude")]
  pub lat: f32,
}

impl LngLat {
  #[must_use]
  pub fn new(lng: f32, lat: f32) -> Self {
    Self { lng, lat }
  }

  #[must_use]
  pub fn is_valid(&self) -> bool {
    -180.0 < self.lng && self.lng < 180.0 && -90.0 < self.lat && self.lat < 90.0
  }

  /// Exact equality comparison using bit representation.
  #[must_use]
  pub fn exact_eq(&self, other: &Self) -> bool {
    self.lng.to_bits() == other.lng.to_bits() && self.lat.to_bits() == other.lat.to_bits()
  }
}

/// Camera parameters of the map surface. Replaced wholesale on every
/// pan/zoom/resize, never merged field by field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
  pub width: f32,
  pub height: f32,
  pub center: LngLat,
  pub zoom: f32,
}

impl Default for Viewport {
  fn default() -> Self {
    Self {
      width: 1024.,
      height: 768.,
      center: LngLat::new(-121.894_72, 37.691_388),
      zoom: 14.,
    }
  }
}

impl Viewport {
  /// World size in screen pixels at the current zoom level (256px base tile).
  fn world_size(&self) -> f32 {
    256. * 2f32.powf(self.zoom)
  }

  /// Projects a coordinate to screen pixels relative to the viewport's
  /// top-left corner (Web Mercator).
  #[must_use]
  pub fn project(&self, coord: LngLat) -> (f32, f32) {
    let (wx, wy) = mercator(coord);
    let (cx, cy) = mercator(self.center);
    let scale = self.world_size();
    (
      (wx - cx) * scale + self.width / 2.,
      (wy - cy) * scale + self.height / 2.,
    )
  }

  /// Inverse of [`Viewport::project`].
  #[must_use]
  pub fn unproject(&self, x: f32, y: f32) -> LngLat {
    let (cx, cy) = mercator(self.center);
    let scale = self.world_size();
    let wx = cx + (x - self.width / 2.) / scale;
    let wy = cy + (y - self.height / 2.) / scale;
    inverse_mercator(wx, wy)
  }

  #[must_use]
  pub fn with_center(mut self, center: LngLat) -> Self {
    self.center = center;
    self
  }

  #[must_use]
  pub fn with_zoom(mut self, zoom: f32) -> Self {
    self.zoom = zoom.clamp(1., 22.);
    self
  }

  #[must_use]
  pub fn with_size(mut self, width: f32, height: f32) -> Self {
    self.width = width;
    self.height = height;
    self
  }
}

/// Web Mercator projection onto the unit square.
fn mercator(coord: LngLat) -> (f32, f32) {
  let x = (coord.lng + 180.) / 360.;
  let lat_rad = coord.lat * PI / 180.;
  let y = (1. - (lat_rad.tan() + 1. / lat_rad.cos()).ln() / PI) / 2.;
  (x, y)
}

fn inverse_mercator(x: f32, y: f32) -> LngLat {
  let lng = x * 360. - 180.;
  let lat = f32::atan(f32::sinh(PI * (1. - 2. * y))) * 180. / PI;
  LngLat::new(lng, lat)
}

#[cfg(test)]
mod tests {
  use super::*;
  use assert_approx_eq::assert_approx_eq;

  #[test]
  fn mercator_origin() {
    let (x, y) = mercator(LngLat::new(0., 0.));
    assert_approx_eq!(x, 0.5, 1e-6);
    assert_approx_eq!(y, 0.5, 1e-6);
  }

  #[test]
  fn project_round_trip() {
    let viewport = Viewport::default();
    let coord = LngLat::new(-121.89, 37.69);
    let (x, y) = viewport.project(coord);
    let back = viewport.unproject(x, y);
    assert_approx_eq!(back.lng, coord.lng, 1e-3);
    assert_approx_eq!(back.lat, coord.lat, 1e-3);
  }

  #[test]
  fn center_projects_to_screen_center() {
    let viewport = Viewport::default();
    let (x, y) = viewport.project(viewport.center);
    assert_approx_eq!(x, viewport.width / 2., 1e-3);
    assert_approx_eq!(y, viewport.height / 2., 1e-3);
  }

  #[test]
  fn validity() {
    assert!(LngLat::new(-121.89, 37.69).is_valid());
    assert!(!LngLat::new(-181., 0.).is_valid());
    assert!(!LngLat::new(0., 91.).is_valid());
  }
}

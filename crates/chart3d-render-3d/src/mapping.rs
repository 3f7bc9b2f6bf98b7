//! World-to-screen mapping.

use chart3d_core::types::{unit_or_zero, Vector3};
use glam::DMat4;

use crate::primitive::BoundingBox;

/// Projection from world space to the raster.
///
/// The rendering core treats this as a black box supplied by the host.
pub trait Mapping {
    /// Screen x and y in pixels (y down) and camera depth (larger is farther).
    fn project(&self, world: Vector3) -> Vector3;

    /// World units per pixel near the scene.
    fn from_point_to_world(&self) -> f64;

    /// Rendering precision in pixels; drives tessellation density and sampling.
    fn rendering_precision(&self) -> f64;

    /// Unit vector from `at` toward the viewer.
    fn eye_direction(&self, at: Vector3) -> Vector3;

    /// Whether screen position divides by depth, as with a pinhole camera.
    fn is_perspective(&self) -> bool {
        false
    }
}

/// Camera projection kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    /// Parallel projection; `scale` pixels per world unit.
    Orthographic { scale: f64 },
    /// Pinhole projection with a vertical field of view in radians.
    Perspective { fov_y: f64 },
}

/// An orbit camera over a pixel viewport.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraMapping {
    /// Target point the camera is looking at.
    pub target: Vector3,
    /// Distance from target.
    pub distance: f64,
    /// Azimuth angle (horizontal rotation) in radians.
    pub azimuth: f64,
    /// Elevation angle (vertical rotation) in radians.
    pub elevation: f64,
    pub projection: Projection,
    pub width: f64,
    pub height: f64,
    pub precision: f64,
    view: DMat4,
}

const MAX_ELEVATION: f64 = 89.0 * std::f64::consts::PI / 180.0;

impl CameraMapping {
    /// An orthographic camera at one pixel per world unit.
    pub fn new(width: u32, height: u32) -> Self {
        let mut camera = Self {
            target: Vector3::ZERO,
            distance: 10.0,
            azimuth: 45.0_f64.to_radians(),
            elevation: 30.0_f64.to_radians(),
            projection: Projection::Orthographic { scale: 1.0 },
            width: width as f64,
            height: height as f64,
            precision: 1.0,
            view: DMat4::IDENTITY,
        };
        camera.update();
        camera
    }

    /// Frame an axis-aligned box in a viewport, keeping the default orbit.
    pub fn fit(bounds: BoundingBox, viewport: (u32, u32)) -> Self {
        Self::new(viewport.0, viewport.1).framing(bounds)
    }

    /// Re-aim the camera so `bounds` fills the viewport with a small margin.
    pub fn framing(mut self, bounds: BoundingBox) -> Self {
        let radius = (bounds.size().length() * 0.5).max(1e-9);
        self.target = bounds.center();
        let half_extent = self.width.min(self.height).max(1.0) * 0.5;
        match self.projection {
            Projection::Orthographic { .. } => {
                self.distance = radius * 3.0;
                self.projection = Projection::Orthographic {
                    scale: half_extent / (radius * 1.1),
                };
            }
            Projection::Perspective { fov_y } => {
                self.distance = radius * 1.1 / (fov_y * 0.5).sin().max(1e-6);
            }
        }
        self.update();
        self
    }

    pub fn with_orbit(mut self, azimuth: f64, elevation: f64) -> Self {
        self.azimuth = azimuth;
        self.elevation = elevation.clamp(-MAX_ELEVATION, MAX_ELEVATION);
        self.update();
        self
    }

    pub fn with_target(mut self, target: Vector3, distance: f64) -> Self {
        self.target = target;
        self.distance = distance.max(1e-9);
        self.update();
        self
    }

    pub fn with_projection(mut self, projection: Projection) -> Self {
        self.projection = projection;
        self
    }

    pub fn with_precision(mut self, precision: f64) -> Self {
        self.precision = precision;
        self
    }

    /// Get the camera position.
    pub fn position(&self) -> Vector3 {
        let x = self.distance * self.elevation.cos() * self.azimuth.sin();
        let y = self.distance * self.elevation.sin();
        let z = self.distance * self.elevation.cos() * self.azimuth.cos();
        self.target + Vector3::new(x, y, z)
    }

    /// Get the view matrix.
    pub fn view_matrix(&self) -> DMat4 {
        self.view
    }

    /// Pixels per world unit at the target.
    fn focal_scale(&self) -> f64 {
        match self.projection {
            Projection::Orthographic { scale } => scale,
            Projection::Perspective { fov_y } => {
                let f = self.height * 0.5 / (fov_y * 0.5).tan().max(1e-9);
                f / self.distance.max(1e-9)
            }
        }
    }

    fn update(&mut self) {
        self.view = DMat4::look_at_rh(self.position(), self.target, Vector3::Y);
    }
}

impl Mapping for CameraMapping {
    fn project(&self, world: Vector3) -> Vector3 {
        let v = self.view.transform_point3(world);
        let depth = -v.z;
        let (x, y) = match self.projection {
            Projection::Orthographic { scale } => (v.x * scale, v.y * scale),
            Projection::Perspective { fov_y } => {
                let f = self.height * 0.5 / (fov_y * 0.5).tan().max(1e-9);
                let z = depth.max(1e-9);
                (v.x * f / z, v.y * f / z)
            }
        };
        Vector3::new(self.width * 0.5 + x, self.height * 0.5 - y, depth)
    }

    fn from_point_to_world(&self) -> f64 {
        1.0 / self.focal_scale().max(1e-12)
    }

    fn rendering_precision(&self) -> f64 {
        self.precision
    }

    fn eye_direction(&self, at: Vector3) -> Vector3 {
        match self.projection {
            Projection::Orthographic { .. } => unit_or_zero(self.position() - self.target),
            Projection::Perspective { .. } => unit_or_zero(self.position() - at),
        }
    }

    fn is_perspective(&self) -> bool {
        matches!(self.projection, Projection::Perspective { .. })
    }
}

//! Drawing boards: 2D canvases embedded in the 3D scene.

use chart3d_core::config::RenderOptions;
use chart3d_core::types::{unit_or_zero, Color, Vector3};
use chart3d_core::RenderError;
use chart3d_render_2d::{Canvas, PathPrimitive, Stroke, TextPrimitive};
use glam::{DVec2, Vec2};

use crate::mapping::Mapping;
use crate::raster::Rasterizer;
use crate::scene::NodeId;

/// A planar 2D canvas spanned by `origin`, `origin + edge_x` and
/// `origin + edge_y`.
///
/// Canvas pixel `(0, 0)` sits at `origin`; canvas x runs along `edge_x` and
/// canvas y along `edge_y`. Drawing calls take the board and hand it back, and
/// [`DrawingBoard::finalize`] textures it into the frame exactly once.
pub struct DrawingBoard {
    origin: Vector3,
    edge_x: Vector3,
    edge_y: Vector3,
    canvas: Canvas,
    /// Standoff along the board normal, in world units.
    lift: f64,
    tag: Option<NodeId>,
    lights_off: bool,
    reflection: f32,
    log_sharpness: f32,
}

impl DrawingBoard {
    /// Create a board whose bitmap matches the projected size of its edges.
    pub fn new(mapping: &dyn Mapping, options: &RenderOptions, origin: Vector3, edge_x: Vector3, edge_y: Vector3) -> Self {
        let o = mapping.project(origin);
        let side = |edge: Vector3| {
            let p = mapping.project(origin + edge);
            let len = DVec2::new(p.x - o.x, p.y - o.y).length().ceil();
            let max = options.max_board_size.max(1) as f64;
            if len.is_finite() {
                len.clamp(1.0, max) as u32
            } else {
                1
            }
        };
        let (width, height) = (side(edge_x), side(edge_y));

        Self {
            origin,
            edge_x,
            edge_y,
            canvas: Canvas::new(width, height),
            lift: options.board_lift_px.max(0.0) * mapping.from_point_to_world(),
            tag: None,
            lights_off: false,
            reflection: 0.0,
            log_sharpness: 0.0,
        }
    }

    /// Attribute the board's pixels to `tag` when tracking objects.
    pub fn with_tag(mut self, tag: NodeId) -> Self {
        self.tag = Some(tag);
        self
    }

    /// Copy the bitmap unshaded.
    pub fn with_lights_off(mut self, off: bool) -> Self {
        self.lights_off = off;
        self
    }

    /// Specular response used when lit.
    pub fn with_specular(mut self, reflection: f32, exponent: f32) -> Self {
        self.reflection = reflection.clamp(0.0, 1.0);
        self.log_sharpness = exponent.max(1.0).ln();
        self
    }

    /// Bitmap size in pixels.
    pub fn size(&self) -> (u32, u32) {
        (self.canvas.width(), self.canvas.height())
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn fill_rect(mut self, x: f32, y: f32, width: f32, height: f32, color: Color) -> Self {
        self.canvas.fill_rect(x, y, width, height, color);
        self
    }

    pub fn fill_ellipse(mut self, center: Vec2, rx: f32, ry: f32, color: Color) -> Self {
        self.canvas.fill_ellipse(center, rx, ry, color);
        self
    }

    pub fn line(mut self, from: Vec2, to: Vec2, stroke: &Stroke) -> Self {
        self.canvas.stroke_line(from, to, stroke);
        self
    }

    pub fn fill_path(mut self, path: &PathPrimitive, color: Color) -> Result<Self, RenderError> {
        self.canvas.fill_path(path, color)?;
        Ok(self)
    }

    pub fn stroke_path(mut self, path: &PathPrimitive, stroke: &Stroke) -> Result<Self, RenderError> {
        self.canvas.stroke_path(path, stroke)?;
        Ok(self)
    }

    pub fn text(mut self, label: &TextPrimitive) -> Self {
        self.canvas.draw_text(label);
        self
    }

    /// Texture the board into the current frame as two triangles and release
    /// its bitmap.
    pub fn finalize(self, raster: &mut Rasterizer<'_>) {
        let mut normal = unit_or_zero(self.edge_x.cross(self.edge_y));
        let center = self.origin + (self.edge_x + self.edge_y) * 0.5;
        if normal.dot(raster.mapping().eye_direction(center)) < 0.0 {
            normal = -normal;
        }
        let o = self.origin + normal * self.lift;
        let (x, y) = (self.edge_x, self.edge_y);
        let (w, h) = (self.canvas.width() as f64, self.canvas.height() as f64);

        raster.set_active_object(self.tag);
        let bitmap = self.canvas.into_image();
        raster.render_bitmap_triangle(
            [o, o + x, o + x + y],
            &bitmap,
            [DVec2::ZERO, DVec2::new(w, 0.0), DVec2::new(w, h)],
            self.reflection,
            self.log_sharpness,
            self.lights_off,
        );
        raster.render_bitmap_triangle(
            [o + x + y, o + y, o],
            &bitmap,
            [DVec2::new(w, h), DVec2::new(0.0, h), DVec2::ZERO],
            self.reflection,
            self.log_sharpness,
            self.lights_off,
        );
        raster.set_active_object(None);
    }
}

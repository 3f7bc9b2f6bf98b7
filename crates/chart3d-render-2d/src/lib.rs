//! 2D drawing for the chart3d engine.
//!
//! A software [`Canvas`] over an RGBA image. It paints the drawing-board
//! bitmaps that get textured into the 3D scene and the flat overlays drawn on
//! top of a finished frame.

pub mod primitives;
mod shapes;
pub mod text;

pub use primitives::*;
pub use shapes::{build_path_from_commands, Mesh, Tessellator};
pub use text::TextBitmap;

use chart3d_core::{Color, RenderError};
use glam::Vec2;
use image::{Rgba, RgbaImage};

/// Software canvas with source-over alpha blending.
///
/// Blending keeps the destination alpha, so shapes painted on a transparent
/// canvas leave the untouched pixels transparent.
pub struct Canvas {
    image: RgbaImage,
    tessellator: Tessellator,
    mesh: Mesh,
}

impl Canvas {
    /// Create a transparent canvas.
    pub fn new(width: u32, height: u32) -> Self {
        Self::from_image(RgbaImage::new(width, height))
    }

    /// Paint onto an existing image.
    pub fn from_image(image: RgbaImage) -> Self {
        Self {
            image,
            tessellator: Tessellator::new(),
            mesh: Mesh::new(),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// Overwrite every pixel with `color`.
    pub fn clear(&mut self, color: Color) {
        let px = Rgba(color.to_rgba8());
        for p in self.image.pixels_mut() {
            *p = px;
        }
    }

    /// Fill an axis-aligned rectangle.
    pub fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Color) {
        self.mesh.clear();
        self.tessellator
            .tessellate_rect(x, y, width, height, &mut self.mesh);
        self.paint_mesh(color);
    }

    /// Fill an ellipse.
    pub fn fill_ellipse(&mut self, center: Vec2, rx: f32, ry: f32, color: Color) {
        if rx <= 0.0 || ry <= 0.0 {
            return;
        }
        self.mesh.clear();
        self.tessellator
            .tessellate_ellipse(center, rx, ry, &mut self.mesh);
        self.paint_mesh(color);
    }

    /// Stroke a straight line segment.
    pub fn stroke_line(&mut self, from: Vec2, to: Vec2, stroke: &Stroke) {
        let path = PathPrimitive::new().move_to(from.x, from.y).line_to(to.x, to.y);
        if let Err(err) = self.stroke_path(&path, stroke) {
            log::trace!("line skipped: {err}");
        }
    }

    /// Fill the interior of a path.
    pub fn fill_path(&mut self, path: &PathPrimitive, color: Color) -> Result<(), RenderError> {
        let path = build_path_from_commands(&path.commands).ok_or(RenderError::EmptyPath)?;
        self.mesh.clear();
        self.tessellator.tessellate_fill(&path, &mut self.mesh);
        self.paint_mesh(color);
        Ok(())
    }

    /// Stroke the outline of a path.
    pub fn stroke_path(&mut self, path: &PathPrimitive, stroke: &Stroke) -> Result<(), RenderError> {
        let path = build_path_from_commands(&path.commands).ok_or(RenderError::EmptyPath)?;
        if stroke.width <= 0.0 {
            return Ok(());
        }
        self.mesh.clear();
        self.tessellator
            .tessellate_stroke(&path, stroke, &mut self.mesh);
        self.paint_mesh(stroke.color);
        Ok(())
    }

    /// Draw a line of text with the built-in bitmap font.
    pub fn draw_text(&mut self, label: &TextPrimitive) {
        let scale = text::scale_for_size(label.font_size);
        let (width, _) = text::measure(&label.text, scale);
        if width == 0 {
            return;
        }

        let left = match label.anchor {
            TextAnchor::Start => label.x as f64,
            TextAnchor::Middle => label.x as f64 - width as f64 / 2.0,
            TextAnchor::End => label.x as f64 - width as f64,
        };
        let origin = (left.round() as i64, label.y.round() as i64);
        let size = (self.width(), self.height());
        let color = label.color;
        text::for_each_covered(&label.text, scale, origin, size, |x, y| {
            self.blend_pixel(i64::from(x), i64::from(y), color)
        });
    }

    /// Blend `color` over the pixel at `(x, y)`; out-of-bounds pixels are ignored.
    pub fn blend_pixel(&mut self, x: i64, y: i64, color: Color) {
        if x < 0 || y < 0 || x >= self.width() as i64 || y >= self.height() as i64 {
            return;
        }
        let dst = self.image.get_pixel_mut(x as u32, y as u32);
        *dst = Rgba(blend_over(dst.0, color));
    }

    /// Paint the current mesh, touching each covered pixel once.
    fn paint_mesh(&mut self, color: Color) {
        if self.mesh.is_empty() || color.a <= 0.0 {
            return;
        }
        let width = self.width() as i64;
        let height = self.height() as i64;

        let (mut lo, mut hi) = (Vec2::splat(f32::INFINITY), Vec2::splat(f32::NEG_INFINITY));
        for v in &self.mesh.vertices {
            lo = lo.min(*v);
            hi = hi.max(*v);
        }
        let min_x = (lo.x.floor() as i64).max(0);
        let min_y = (lo.y.floor() as i64).max(0);
        let max_x = (hi.x.ceil() as i64).min(width - 1);
        let max_y = (hi.y.ceil() as i64).min(height - 1);
        if min_x > max_x || min_y > max_y {
            return;
        }

        let span = (max_x - min_x + 1) as usize;
        let mut covered = vec![false; span * (max_y - min_y + 1) as usize];

        for [a, b, c] in self.mesh.triangles() {
            let area = edge_function(a, b, c);
            if area.abs() < 1e-6 {
                continue;
            }
            let tx0 = (a.x.min(b.x).min(c.x).floor() as i64).max(min_x);
            let tx1 = (a.x.max(b.x).max(c.x).ceil() as i64).min(max_x);
            let ty0 = (a.y.min(b.y).min(c.y).floor() as i64).max(min_y);
            let ty1 = (a.y.max(b.y).max(c.y).ceil() as i64).min(max_y);

            for y in ty0..=ty1 {
                for x in tx0..=tx1 {
                    let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                    let w0 = edge_function(b, c, p);
                    let w1 = edge_function(c, a, p);
                    let w2 = edge_function(a, b, p);
                    if (w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0) || (w0 <= 0.0 && w1 <= 0.0 && w2 <= 0.0) {
                        covered[(y - min_y) as usize * span + (x - min_x) as usize] = true;
                    }
                }
            }
        }

        for (i, _) in covered.iter().enumerate().filter(|(_, c)| **c) {
            let x = min_x + (i % span) as i64;
            let y = min_y + (i / span) as i64;
            self.blend_pixel(x, y, color);
        }
    }
}

/// Source-over blend of `src` onto an 8-bit RGBA pixel.
pub fn blend_over(dst: [u8; 4], src: Color) -> [u8; 4] {
    let sa = src.a.clamp(0.0, 1.0);
    if sa >= 1.0 {
        return src.to_rgba8();
    }
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        return [0, 0, 0, 0];
    }
    let channel = |s: f32, d: u8| {
        let d = d as f32 / 255.0;
        (s.clamp(0.0, 1.0) * sa + d * da * (1.0 - sa)) / out_a
    };
    Color::rgba(
        channel(src.r, dst[0]),
        channel(src.g, dst[1]),
        channel(src.b, dst[2]),
        out_a,
    )
    .to_rgba8()
}

/// Edge function for triangle rasterization.
/// Returns positive if point p is to the left of edge (a, b).
#[inline]
fn edge_function(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    (p.x - a.x) * (b.y - a.y) - (p.y - a.y) * (b.x - a.x)
}

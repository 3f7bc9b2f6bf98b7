//! Software rasterizer with depth precedence and object tracking.

use chart3d_core::config::{validate_precision, RenderOptions};
use chart3d_core::types::{union_rect, unit_or_zero, Color, PixelRect, SurfaceColor, Vector3};
use chart3d_core::RenderError;
use chart3d_render_2d::blend_over;
use glam::DVec2;
use image::{Rgba, RgbaImage};

use crate::facet::FacetKind;
use crate::lighting::Lighting;
use crate::mapping::Mapping;
use crate::scene::NodeId;
use crate::tessellation::{TessellationContext, Triangle, TriangleSink};

/// Counters collected over one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub submitted: usize,
    pub rasterized: usize,
    pub culled: usize,
    pub degenerate: usize,
    pub facets: usize,
}

/// Per-pixel record of which scene node painted each pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectIndex {
    width: u32,
    height: u32,
    ids: Vec<Option<NodeId>>,
    bounds: Option<PixelRect>,
}

impl ObjectIndex {
    fn new(width: u32, height: u32, ids: Vec<Option<NodeId>>) -> Self {
        let mut bounds = None;
        for (i, id) in ids.iter().enumerate() {
            if id.is_some() {
                let x = (i % width as usize) as i32;
                let y = (i / width as usize) as i32;
                bounds = union_rect(bounds, PixelRect::point(x, y));
            }
        }
        Self {
            width,
            height,
            ids,
            bounds,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// The node that painted pixel `(x, y)`, if any.
    pub fn object_at(&self, x: u32, y: u32) -> Option<NodeId> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.ids[(y * self.width + x) as usize]
    }

    /// Bounds of every attributed pixel.
    pub fn bounds(&self) -> Option<PixelRect> {
        self.bounds
    }

    /// Bounds of the pixels attributed to `id`.
    pub fn bounds_of(&self, id: NodeId) -> Option<PixelRect> {
        let mut bounds = None;
        for (i, painted) in self.ids.iter().enumerate() {
            if *painted == Some(id) {
                let x = (i % self.width as usize) as i32;
                let y = (i / self.width as usize) as i32;
                bounds = union_rect(bounds, PixelRect::point(x, y));
            }
        }
        bounds
    }
}

/// A finished frame.
#[derive(Debug, Clone)]
pub struct Frame {
    pub image: RgbaImage,
    /// Present when object tracking is enabled.
    pub objects: Option<ObjectIndex>,
    pub stats: FrameStats,
}

/// Sample buffers at `factor` times the output resolution.
struct SampleTarget {
    width: usize,
    height: usize,
    color: Vec<[f32; 4]>,
    depth: Vec<f64>,
    ids: Option<Vec<Option<NodeId>>>,
}

impl SampleTarget {
    fn new(width: usize, height: usize, track_objects: bool) -> Self {
        let n = width * height;
        Self {
            width,
            height,
            color: vec![[0.0; 4]; n],
            depth: vec![f64::INFINITY; n],
            ids: track_objects.then(|| vec![None; n]),
        }
    }

    fn reset(&mut self) {
        self.color.fill([0.0; 4]);
        self.depth.fill(f64::INFINITY);
        if let Some(ids) = &mut self.ids {
            ids.fill(None);
        }
    }

    /// Scan-convert a triangle given in sample coordinates (z = depth).
    ///
    /// `shade` receives barycentric weights for each sample that passes the
    /// depth test; returning `None` leaves the sample untouched. Returns
    /// whether any sample was written.
    ///
    /// With `perspective` the weights and depth are interpolated through
    /// reciprocal depth, which is affine in screen space under a pinhole
    /// projection. Triangles reaching behind the eye fall back to linear
    /// interpolation.
    fn fill(
        &mut self,
        s: [Vector3; 3],
        id: Option<NodeId>,
        perspective: bool,
        mut shade: impl FnMut([f64; 3]) -> Option<Color>,
    ) -> bool {
        let area = edge_function(s[0], s[1], s[2]);
        let inv_area = 1.0 / area;
        let reciprocal = (perspective && s.iter().all(|v| v.z > 1e-9)).then(|| s.map(|v| 1.0 / v.z));

        let min_x = s[0].x.min(s[1].x).min(s[2].x).floor().max(0.0) as usize;
        let min_y = s[0].y.min(s[1].y).min(s[2].y).floor().max(0.0) as usize;
        let max_x = s[0].x.max(s[1].x).max(s[2].x).ceil().min(self.width as f64 - 1.0);
        let max_y = s[0].y.max(s[1].y).max(s[2].y).ceil().min(self.height as f64 - 1.0);
        if max_x < 0.0 || max_y < 0.0 {
            return false;
        }
        let (max_x, max_y) = (max_x as usize, max_y as usize);

        let mut written = false;
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let p = Vector3::new(x as f64 + 0.5, y as f64 + 0.5, 0.0);

                let w0 = edge_function(s[1], s[2], p);
                let w1 = edge_function(s[2], s[0], p);
                let w2 = edge_function(s[0], s[1], p);
                let inside = (w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0) || (w0 <= 0.0 && w1 <= 0.0 && w2 <= 0.0);
                if !inside {
                    continue;
                }

                let linear = [w0 * inv_area, w1 * inv_area, w2 * inv_area];
                let (b, depth) = match reciprocal {
                    Some(r) => {
                        let q = [linear[0] * r[0], linear[1] * r[1], linear[2] * r[2]];
                        let sum = q[0] + q[1] + q[2];
                        ([q[0] / sum, q[1] / sum, q[2] / sum], 1.0 / sum)
                    }
                    None => (linear, s[0].z * linear[0] + s[1].z * linear[1] + s[2].z * linear[2]),
                };

                // Strictly nearer wins; ties keep the first writer.
                let idx = y * self.width + x;
                if depth >= self.depth[idx] {
                    continue;
                }
                let Some(color) = shade(b) else {
                    continue;
                };

                self.depth[idx] = depth;
                self.color[idx] = blend_sample(self.color[idx], color);
                if let Some(ids) = &mut self.ids {
                    ids[idx] = id;
                }
                written = true;
            }
        }
        written
    }
}

/// Source-over blend in floating point, straight alpha.
fn blend_sample(dst: [f32; 4], src: Color) -> [f32; 4] {
    let sa = src.a.clamp(0.0, 1.0);
    if sa >= 1.0 {
        return [src.r, src.g, src.b, 1.0];
    }
    let da = dst[3];
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        return [0.0; 4];
    }
    let mix = |s: f32, d: f32| (s * sa + d * da * (1.0 - sa)) / out_a;
    [mix(src.r, dst[0]), mix(src.g, dst[1]), mix(src.b, dst[2]), out_a]
}

/// Geometry of a submitted triangle after culling and projection.
struct Setup {
    screen: [Vector3; 3],
    /// Unit geometric normal, oriented like the vertex normals.
    facing: Vector3,
    eye: Vector3,
}

/// Accumulates shaded triangles into a raster target for one frame at a time.
pub struct Rasterizer<'a> {
    mapping: &'a dyn Mapping,
    context: TessellationContext,
    width: u32,
    height: u32,
    factor: u32,
    perspective: bool,
    clear_color: Color,
    target: SampleTarget,
    lighting: Lighting,
    active: Option<NodeId>,
    position_test: bool,
    position_bounds: Option<PixelRect>,
    stats: FrameStats,
}

impl<'a> Rasterizer<'a> {
    /// Create a rasterizer for `options` viewing the scene through `mapping`.
    pub fn new(mapping: &'a dyn Mapping, options: &RenderOptions) -> Result<Self, RenderError> {
        options.validate()?;
        let precision = validate_precision(mapping.rendering_precision())?;
        let factor = (1.0 / precision).round().clamp(1.0, 4.0) as u32;

        let context = TessellationContext {
            precision,
            world_per_pixel: mapping.from_point_to_world(),
            max_subdivisions: options.max_subdivisions.max(1),
            miter_limit: options.miter_limit.max(1.0),
        };

        let too_large = || RenderError::InvalidTargetSize {
            width: options.width,
            height: options.height,
        };
        let sample_width = options.width.checked_mul(factor).ok_or_else(too_large)? as usize;
        let sample_height = options.height.checked_mul(factor).ok_or_else(too_large)? as usize;
        sample_width.checked_mul(sample_height).ok_or_else(too_large)?;

        Ok(Self {
            mapping,
            context,
            width: options.width,
            height: options.height,
            factor,
            perspective: mapping.is_perspective(),
            clear_color: options.clear_color,
            target: SampleTarget::new(sample_width, sample_height, options.track_objects),
            lighting: Lighting::default(),
            active: None,
            position_test: false,
            position_bounds: None,
            stats: FrameStats::default(),
        })
    }

    pub fn mapping(&self) -> &'a dyn Mapping {
        self.mapping
    }

    /// Samples per pixel along each axis.
    pub fn sample_factor(&self) -> u32 {
        self.factor
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// Reset the target and install the frame's lighting.
    pub fn start_frame(&mut self, lighting: Lighting) {
        self.target.reset();
        self.stats = FrameStats::default();
        self.active = None;
        self.position_bounds = None;
        log::debug!(
            "frame start: {}x{} at {}x sampling, {} directional lights, ambient {:.3}",
            self.width,
            self.height,
            self.factor,
            lighting.lights.len(),
            lighting.ambient
        );
        self.lighting = lighting;
    }

    /// Attribute subsequently painted pixels to `id`.
    pub fn set_active_object(&mut self, id: Option<NodeId>) {
        self.active = id;
    }

    /// Only accumulate screen bounds instead of shading.
    pub fn set_position_test_mode(&mut self, enabled: bool) {
        self.position_test = enabled;
    }

    /// Screen bounds touched while in position test mode.
    pub fn position_bounds(&self) -> Option<PixelRect> {
        self.position_bounds
    }

    /// Rasterize one triangle with per-vertex normals and a flat surface colour.
    pub fn render_element(
        &mut self,
        points: [Vector3; 3],
        normals: [Vector3; 3],
        color: &SurfaceColor,
        cull_backfaces: bool,
    ) {
        self.stats.submitted += 1;
        let Some(setup) = self.setup(points, normals, cull_backfaces) else {
            return;
        };
        if color.alpha() <= 0.0 {
            return;
        }

        let two_sided = !cull_backfaces;
        let Setup { screen, facing, eye } = setup;
        let lighting = &self.lighting;
        let written = self.target.fill(screen, self.active, self.perspective, |b| {
            let mut n = unit_or_zero(normals[0] * b[0] + normals[1] * b[1] + normals[2] * b[2]);
            if n == Vector3::ZERO {
                n = facing;
            }
            if two_sided && n.dot(eye) < 0.0 {
                n = -n;
            }
            Some(lighting.shade(color, n, eye))
        });
        if written {
            self.stats.rasterized += 1;
        }
    }

    /// Rasterize one triangle textured from `bitmap`.
    ///
    /// `tex` holds the bitmap pixel coordinates of the three corners. Samples
    /// that land on fully transparent texels are left untouched. With
    /// `lights_off` the texels are copied unshaded.
    #[allow(clippy::too_many_arguments)]
    pub fn render_bitmap_triangle(
        &mut self,
        points: [Vector3; 3],
        bitmap: &RgbaImage,
        tex: [DVec2; 3],
        reflection: f32,
        log_sharpness: f32,
        lights_off: bool,
    ) {
        self.stats.submitted += 1;
        let geometric = (points[1] - points[0]).cross(points[2] - points[0]);
        let Some(setup) = self.setup(points, [geometric; 3], false) else {
            return;
        };
        if bitmap.width() == 0 || bitmap.height() == 0 {
            return;
        }

        let Setup { screen, facing, eye } = setup;
        let normal = if facing.dot(eye) < 0.0 { -facing } else { facing };
        let (tw, th) = (bitmap.width() as f64, bitmap.height() as f64);
        let lighting = &self.lighting;
        let written = self.target.fill(screen, self.active, self.perspective, |b| {
            let t = tex[0] * b[0] + tex[1] * b[1] + tex[2] * b[2];
            let tx = t.x.floor().clamp(0.0, tw - 1.0) as u32;
            let ty = t.y.floor().clamp(0.0, th - 1.0) as u32;
            let texel = bitmap.get_pixel(tx, ty).0;
            if texel[3] == 0 {
                return None;
            }
            let color = Color::from_rgba8(texel[0], texel[1], texel[2], texel[3]);
            if lights_off {
                return Some(color);
            }
            let surface = SurfaceColor {
                color,
                reflection,
                log_sharpness,
            };
            Some(lighting.shade(&surface, normal, eye))
        });
        if written {
            self.stats.rasterized += 1;
        }
    }

    /// Resolve the samples, composite over `background` and reset for the next frame.
    pub fn end_frame(&mut self, background: Option<&RgbaImage>) -> Frame {
        let f = self.factor as usize;
        let samples = (f * f) as f32;
        let clear = self.clear_color.to_rgba8();
        let mut image = RgbaImage::new(self.width, self.height);

        for (x, y, px) in image.enumerate_pixels_mut() {
            let mut acc = [0.0f32; 4];
            for sy in 0..f {
                let row = (y as usize * f + sy) * self.target.width;
                for sx in 0..f {
                    let c = self.target.color[row + x as usize * f + sx];
                    acc[0] += c[0] * c[3];
                    acc[1] += c[1] * c[3];
                    acc[2] += c[2] * c[3];
                    acc[3] += c[3];
                }
            }

            let base = match background {
                Some(bg) if x < bg.width() && y < bg.height() => bg.get_pixel(x, y).0,
                _ => clear,
            };
            *px = if acc[3] > 0.0 {
                let color = Color::rgba(acc[0] / acc[3], acc[1] / acc[3], acc[2] / acc[3], acc[3] / samples);
                Rgba(blend_over(base, color))
            } else {
                Rgba(base)
            };
        }

        let objects = self.target.ids.as_ref().map(|ids| {
            let center = f / 2;
            let mut resolved = Vec::with_capacity((self.width * self.height) as usize);
            for y in 0..self.height as usize {
                let row = (y * f + center) * self.target.width;
                for x in 0..self.width as usize {
                    resolved.push(ids[row + x * f + center]);
                }
            }
            ObjectIndex::new(self.width, self.height, resolved)
        });

        let stats = self.stats;
        log::debug!(
            "frame end: {} triangles submitted, {} rasterized, {} culled, {} degenerate, {} facets",
            stats.submitted,
            stats.rasterized,
            stats.culled,
            stats.degenerate,
            stats.facets
        );

        self.target.reset();
        self.active = None;
        self.stats = FrameStats::default();

        Frame {
            image,
            objects,
            stats,
        }
    }

    /// Cull, project and reject degenerate triangles.
    ///
    /// In position test mode the surviving triangle only grows the bounds and
    /// `None` is returned.
    fn setup(&mut self, points: [Vector3; 3], normals: [Vector3; 3], cull_backfaces: bool) -> Option<Setup> {
        let geometric = (points[1] - points[0]).cross(points[2] - points[0]);
        let len = geometric.length();
        if !(len > 1e-12) {
            self.stats.degenerate += 1;
            log::trace!("skipping zero-area triangle");
            return None;
        }

        let normal_sum = normals[0] + normals[1] + normals[2];
        let mut facing = geometric / len;
        if facing.dot(normal_sum) < 0.0 {
            facing = -facing;
        }

        let centroid = (points[0] + points[1] + points[2]) / 3.0;
        let eye = self.mapping.eye_direction(centroid);
        if cull_backfaces && normal_sum.length_squared() > 1e-24 && facing.dot(eye) < 0.0 {
            self.stats.culled += 1;
            return None;
        }

        let projected = points.map(|p| self.mapping.project(p));
        if projected.iter().any(|p| !p.is_finite()) {
            self.stats.degenerate += 1;
            log::trace!("skipping triangle with non-finite projection");
            return None;
        }

        if self.position_test {
            self.grow_position_bounds(&projected);
            return None;
        }

        let k = self.factor as f64;
        let screen = projected.map(|p| Vector3::new(p.x * k, p.y * k, p.z));
        if edge_function(screen[0], screen[1], screen[2]).abs() < 1e-4 {
            self.stats.degenerate += 1;
            log::trace!("skipping triangle collapsed on screen");
            return None;
        }

        Some(Setup { screen, facing, eye })
    }

    fn grow_position_bounds(&mut self, projected: &[Vector3; 3]) {
        let min_x = projected.iter().map(|p| p.x).fold(f64::INFINITY, f64::min).floor();
        let max_x = projected.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max).ceil();
        let min_y = projected.iter().map(|p| p.y).fold(f64::INFINITY, f64::min).floor();
        let max_y = projected.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max).ceil();

        let (w, h) = (self.width as f64, self.height as f64);
        if max_x < 0.0 || max_y < 0.0 || min_x > w - 1.0 || min_y > h - 1.0 {
            return;
        }
        let rect = PixelRect::new(
            min_x.max(0.0) as i32,
            min_y.max(0.0) as i32,
            max_x.min(w - 1.0) as i32,
            max_y.min(h - 1.0) as i32,
        );
        self.position_bounds = union_rect(self.position_bounds, rect);
    }
}

impl TriangleSink for Rasterizer<'_> {
    fn context(&self) -> &TessellationContext {
        &self.context
    }

    fn begin_facet(&mut self, _kind: FacetKind) {
        self.stats.facets += 1;
    }

    fn emit(&mut self, triangle: Triangle) {
        self.render_element(
            triangle.points,
            triangle.normals,
            &triangle.color,
            triangle.cull_backfaces,
        );
    }
}

/// Edge function for triangle rasterization.
#[inline]
fn edge_function(a: Vector3, b: Vector3, p: Vector3) -> f64 {
    (p.x - a.x) * (b.y - a.y) - (p.y - a.y) * (b.x - a.x)
}

//! Parametric tessellation into shaded triangles.

use std::f64::consts::PI;

use chart3d_core::types::{SurfaceColor, Vector3};

use crate::facet::{FacetKind, ParametricFacet};

/// A triangle with per-vertex normals, the unit of work for the rasterizer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub points: [Vector3; 3],
    pub normals: [Vector3; 3],
    pub color: SurfaceColor,
    /// Skip the triangle when it faces away from the viewer.
    pub cull_backfaces: bool,
}

impl Triangle {
    pub fn new(points: [Vector3; 3], normals: [Vector3; 3], color: SurfaceColor, cull_backfaces: bool) -> Self {
        Self {
            points,
            normals,
            color,
            cull_backfaces,
        }
    }

    /// A flat triangle sharing one normal.
    pub fn flat(points: [Vector3; 3], normal: Vector3, color: SurfaceColor, cull_backfaces: bool) -> Self {
        Self::new(points, [normal; 3], color, cull_backfaces)
    }
}

/// Density settings shared by the tessellator and decomposers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TessellationContext {
    /// Allowed deviation of the mesh from the true surface, in pixels.
    pub precision: f64,
    /// World units per pixel.
    pub world_per_pixel: f64,
    pub max_subdivisions: u32,
    /// Maximum miter scale at thick-line joins.
    pub miter_limit: f64,
}

impl Default for TessellationContext {
    fn default() -> Self {
        Self {
            precision: 1.0,
            world_per_pixel: 1.0,
            max_subdivisions: 256,
            miter_limit: 4.0,
        }
    }
}

impl TessellationContext {
    /// Segments needed for an arc of world radius `radius` sweeping `sweep` radians.
    ///
    /// The smallest count whose chord sagitta stays within half the precision,
    /// clamped to `[1, max_subdivisions]`.
    pub fn arc_subdivisions(&self, radius: f64, sweep: f64) -> u32 {
        let max = self.max_subdivisions.max(1);
        let sweep = sweep.abs();
        let radius_px = radius.abs() / self.world_per_pixel.max(1e-12);
        if !(radius_px > 0.0 && sweep > 0.0) || !radius_px.is_finite() || !sweep.is_finite() {
            return 1;
        }
        let x = (self.precision * 0.5 / radius_px).min(2.0);
        let max_step = 2.0 * (1.0 - x).acos();
        if max_step <= 0.0 {
            return max;
        }
        let n = (sweep / max_step).ceil();
        if n >= max as f64 {
            max
        } else {
            (n as u32).max(1)
        }
    }
}

/// Receiver of tessellated triangles.
pub trait TriangleSink {
    /// Density settings for the current pass.
    fn context(&self) -> &TessellationContext;

    /// Called before the triangles of one facet or flat group.
    fn begin_facet(&mut self, _kind: FacetKind) {}

    fn emit(&mut self, triangle: Triangle);
}

/// Records triangles instead of drawing them.
#[derive(Debug, Clone, Default)]
pub struct TriangleCollector {
    pub context: TessellationContext,
    pub triangles: Vec<Triangle>,
    /// Facet kinds in emission order.
    pub facets: Vec<FacetKind>,
}

impl TriangleCollector {
    pub fn new(context: TessellationContext) -> Self {
        Self {
            context,
            ..Default::default()
        }
    }

    pub fn count_kind(&self, kind: FacetKind) -> usize {
        self.facets.iter().filter(|k| **k == kind).count()
    }
}

impl TriangleSink for TriangleCollector {
    fn context(&self) -> &TessellationContext {
        &self.context
    }

    fn begin_facet(&mut self, kind: FacetKind) {
        self.facets.push(kind);
    }

    fn emit(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
    }
}

/// Tessellate a facet at its recommended density.
pub fn tessellate<F>(facet: &F, color: SurfaceColor, cull_backfaces: bool, sink: &mut dyn TriangleSink)
where
    F: ParametricFacet + ?Sized,
{
    tessellate_with(facet, 0, 0, color, cull_backfaces, sink);
}

/// Tessellate a facet into an `nu` x `nv` grid of quads.
///
/// A zero count is replaced by the facet's recommendation. If either count is
/// still zero nothing is emitted.
pub fn tessellate_with<F>(
    facet: &F,
    nu: u32,
    nv: u32,
    color: SurfaceColor,
    cull_backfaces: bool,
    sink: &mut dyn TriangleSink,
) where
    F: ParametricFacet + ?Sized,
{
    let (rec_u, rec_v) = if nu == 0 || nv == 0 {
        facet.recommended_subdivisions(sink.context())
    } else {
        (nu, nv)
    };
    let nu = if nu == 0 { rec_u } else { nu };
    let nv = if nv == 0 { rec_v } else { nv };
    if nu < 1 || nv < 1 {
        log::trace!("skipping {:?} facet with {}x{} subdivisions", facet.kind(), nu, nv);
        return;
    }

    let domain = facet.domain();
    let du = (domain.u1 - domain.u0) / nu as f64;
    let dv = (domain.v1 - domain.v0) / nv as f64;

    sink.begin_facet(facet.kind());

    let stride = nv as usize + 1;
    let mut grid = Vec::with_capacity((nu as usize + 1) * stride);
    for i in 0..=nu {
        let u = domain.u0 + i as f64 * du;
        for j in 0..=nv {
            let v = domain.v0 + j as f64 * dv;
            grid.push((facet.point(u, v), facet.normal(u, v)));
        }
    }

    for i in 0..nu as usize {
        for j in 0..nv as usize {
            let ll = grid[i * stride + j];
            let lr = grid[(i + 1) * stride + j];
            let hr = grid[(i + 1) * stride + j + 1];
            let hl = grid[i * stride + j + 1];

            sink.emit(Triangle::new([ll.0, lr.0, hr.0], [ll.1, lr.1, hr.1], color, cull_backfaces));
            sink.emit(Triangle::new([hr.0, hl.0, ll.0], [hr.1, hl.1, ll.1], color, cull_backfaces));
        }
    }
}

/// Segments for a full turn; used by flat discs and fans.
pub fn circle_subdivisions(ctx: &TessellationContext, radius: f64) -> u32 {
    ctx.arc_subdivisions(radius, 2.0 * PI).max(3)
}

//! Parametric surface patches.
//!
//! A facet maps a rectangular `(u, v)` domain to points and unit normals. The
//! tessellator samples it on a grid; decomposers combine facets into solids.

use chart3d_core::types::{unit_or_zero, Vector3};

use crate::tessellation::TessellationContext;

/// Facet family, reported to sinks before each facet's triangles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FacetKind {
    Cylinder,
    Cone,
    Torus,
    Ellipsoid,
    /// Directly emitted flat triangles (caps, faces, fans).
    Flat,
}

/// Rectangular parameter domain `[u0, u1] x [v0, v1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FacetDomain {
    pub u0: f64,
    pub u1: f64,
    pub v0: f64,
    pub v1: f64,
}

impl FacetDomain {
    pub fn new(u: (f64, f64), v: (f64, f64)) -> Self {
        Self {
            u0: u.0,
            u1: u.1,
            v0: v.0,
            v1: v.1,
        }
    }

    pub fn du(&self) -> f64 {
        self.u1 - self.u0
    }

    pub fn dv(&self) -> f64 {
        self.v1 - self.v0
    }
}

/// A `(u, v) -> point` surface with consistent unit normals.
pub trait ParametricFacet {
    fn kind(&self) -> FacetKind;

    fn domain(&self) -> FacetDomain;

    fn point(&self, u: f64, v: f64) -> Vector3;

    fn normal(&self, u: f64, v: f64) -> Vector3;

    /// Grid size for the given precision. A zero count means nothing to draw.
    fn recommended_subdivisions(&self, ctx: &TessellationContext) -> (u32, u32);
}

/// Zero when the parameter range is empty, otherwise `n`.
fn count_for(extent: f64, n: u32) -> u32 {
    if extent == 0.0 || !extent.is_finite() {
        0
    } else {
        n
    }
}

/// Segment of an elliptic cylinder.
///
/// `u` is the angle around `axis`, `v` the distance along it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CylinderSegment {
    pub center: Vector3,
    pub x_axis: Vector3,
    pub y_axis: Vector3,
    pub axis: Vector3,
    pub radius_x: f64,
    pub radius_y: f64,
    pub angles: (f64, f64),
    pub heights: (f64, f64),
}

impl CylinderSegment {
    pub fn circular(
        center: Vector3,
        x_axis: Vector3,
        y_axis: Vector3,
        axis: Vector3,
        radius: f64,
        angles: (f64, f64),
        heights: (f64, f64),
    ) -> Self {
        Self {
            center,
            x_axis,
            y_axis,
            axis,
            radius_x: radius,
            radius_y: radius,
            angles,
            heights,
        }
    }
}

impl ParametricFacet for CylinderSegment {
    fn kind(&self) -> FacetKind {
        FacetKind::Cylinder
    }

    fn domain(&self) -> FacetDomain {
        FacetDomain::new(self.angles, self.heights)
    }

    fn point(&self, u: f64, v: f64) -> Vector3 {
        self.center
            + self.x_axis * (self.radius_x * u.cos())
            + self.y_axis * (self.radius_y * u.sin())
            + self.axis * v
    }

    fn normal(&self, u: f64, _v: f64) -> Vector3 {
        unit_or_zero(self.x_axis * (self.radius_y * u.cos()) + self.y_axis * (self.radius_x * u.sin()))
    }

    fn recommended_subdivisions(&self, ctx: &TessellationContext) -> (u32, u32) {
        let d = self.domain();
        let r = self.radius_x.abs().max(self.radius_y.abs());
        (
            count_for(d.du(), ctx.arc_subdivisions(r, d.du())),
            count_for(d.dv(), 1),
        )
    }
}

/// Ruled band of an elliptic cone.
///
/// `u` is the angle, `v` the fraction of the way from the base ellipse to
/// the apex at `base + apex_offset`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConeBand {
    pub base: Vector3,
    pub x_axis: Vector3,
    pub y_axis: Vector3,
    pub apex_offset: Vector3,
    pub radius_x: f64,
    pub radius_y: f64,
    pub angles: (f64, f64),
    pub fractions: (f64, f64),
}

impl ConeBand {
    fn radial(&self, u: f64) -> Vector3 {
        self.x_axis * (self.radius_x * u.cos()) + self.y_axis * (self.radius_y * u.sin())
    }
}

impl ParametricFacet for ConeBand {
    fn kind(&self) -> FacetKind {
        FacetKind::Cone
    }

    fn domain(&self) -> FacetDomain {
        FacetDomain::new(self.angles, self.fractions)
    }

    fn point(&self, u: f64, v: f64) -> Vector3 {
        self.base + self.apex_offset * v + self.radial(u) * (1.0 - v)
    }

    fn normal(&self, u: f64, _v: f64) -> Vector3 {
        // The normal is constant along a generator, so the tangent is taken
        // without the (1 - v) factor to stay defined at the apex.
        let tangent = self.x_axis * (-self.radius_x * u.sin()) + self.y_axis * (self.radius_y * u.cos());
        let radial = self.radial(u);
        let generator = self.apex_offset - radial;
        let n = unit_or_zero(tangent.cross(generator));
        if n.dot(radial) < 0.0 {
            -n
        } else {
            n
        }
    }

    fn recommended_subdivisions(&self, ctx: &TessellationContext) -> (u32, u32) {
        let d = self.domain();
        let r = self.radius_x.abs().max(self.radius_y.abs()) * (1.0 - d.v0.min(d.v1)).abs();
        (
            count_for(d.du(), ctx.arc_subdivisions(r, d.du())),
            count_for(d.dv(), 1),
        )
    }
}

/// Tube of radius `minor` swept along an elliptic arc; used for rounded edges.
///
/// `u` is the angle along the spine, `v` the angle around the tube measured
/// from the spine plane outward toward `axis`. The tube section grows both
/// spine radii by `minor * cos(v)`, so `v = 0` traces the ellipse
/// `(spine_x + minor, spine_y + minor)` and `v = ±pi/2` the spine ellipse
/// itself, lifted by `minor`. For a circular spine this is an ordinary torus.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TorusSegment {
    pub center: Vector3,
    pub x_axis: Vector3,
    pub y_axis: Vector3,
    pub axis: Vector3,
    pub spine_x: f64,
    pub spine_y: f64,
    pub minor: f64,
    pub angles: (f64, f64),
    pub tube: (f64, f64),
}

impl TorusSegment {
    #[allow(clippy::too_many_arguments)]
    pub fn circular(
        center: Vector3,
        x_axis: Vector3,
        y_axis: Vector3,
        axis: Vector3,
        spine_radius: f64,
        minor: f64,
        angles: (f64, f64),
        tube: (f64, f64),
    ) -> Self {
        Self {
            center,
            x_axis,
            y_axis,
            axis,
            spine_x: spine_radius,
            spine_y: spine_radius,
            minor,
            angles,
            tube,
        }
    }
}

impl ParametricFacet for TorusSegment {
    fn kind(&self) -> FacetKind {
        FacetKind::Torus
    }

    fn domain(&self) -> FacetDomain {
        FacetDomain::new(self.angles, self.tube)
    }

    fn point(&self, u: f64, v: f64) -> Vector3 {
        let grow = self.minor * v.cos();
        self.center
            + self.x_axis * ((self.spine_x + grow) * u.cos())
            + self.y_axis * ((self.spine_y + grow) * u.sin())
            + self.axis * (self.minor * v.sin())
    }

    fn normal(&self, u: f64, v: f64) -> Vector3 {
        let (su, cu) = u.sin_cos();
        let (sv, cv) = v.sin_cos();
        let a = self.spine_x + self.minor * cv;
        let b = self.spine_y + self.minor * cv;
        if a <= 1e-12 && b <= 1e-12 {
            // Collapsed spine: the tube is a sphere around the centre.
            return unit_or_zero(self.x_axis * (cu * cv) + self.y_axis * (su * cv) + self.axis * sv);
        }
        // Cross product of the u and v tangents, outward at v = 0.
        unit_or_zero(
            self.x_axis * (b * cu * cv)
                + self.y_axis * (a * su * cv)
                + self.axis * (sv * (a * su * su + b * cu * cu)),
        )
    }

    fn recommended_subdivisions(&self, ctx: &TessellationContext) -> (u32, u32) {
        let d = self.domain();
        let spine = self.spine_x.abs().max(self.spine_y.abs()) + self.minor.abs();
        (
            count_for(d.du(), ctx.arc_subdivisions(spine, d.du())),
            count_for(d.dv() * self.minor, ctx.arc_subdivisions(self.minor, d.dv())),
        )
    }
}

/// Patch of an ellipsoid over longitude `u` and latitude `v`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EllipsoidPatch {
    pub center: Vector3,
    pub x_axis: Vector3,
    pub y_axis: Vector3,
    pub z_axis: Vector3,
    pub radii: Vector3,
    pub longitude: (f64, f64),
    pub latitude: (f64, f64),
}

impl EllipsoidPatch {
    /// Sphere patch with radius `r` in the given frame.
    pub fn sphere(
        center: Vector3,
        frame: (Vector3, Vector3, Vector3),
        r: f64,
        longitude: (f64, f64),
        latitude: (f64, f64),
    ) -> Self {
        Self {
            center,
            x_axis: frame.0,
            y_axis: frame.1,
            z_axis: frame.2,
            radii: Vector3::splat(r),
            longitude,
            latitude,
        }
    }
}

impl ParametricFacet for EllipsoidPatch {
    fn kind(&self) -> FacetKind {
        FacetKind::Ellipsoid
    }

    fn domain(&self) -> FacetDomain {
        FacetDomain::new(self.longitude, self.latitude)
    }

    fn point(&self, u: f64, v: f64) -> Vector3 {
        self.center
            + self.x_axis * (self.radii.x * v.cos() * u.cos())
            + self.y_axis * (self.radii.y * v.cos() * u.sin())
            + self.z_axis * (self.radii.z * v.sin())
    }

    fn normal(&self, u: f64, v: f64) -> Vector3 {
        let r = self.radii;
        if r.x <= 0.0 || r.y <= 0.0 || r.z <= 0.0 {
            return unit_or_zero(
                self.x_axis * (v.cos() * u.cos()) + self.y_axis * (v.cos() * u.sin()) + self.z_axis * v.sin(),
            );
        }
        unit_or_zero(
            self.x_axis * (v.cos() * u.cos() / r.x)
                + self.y_axis * (v.cos() * u.sin() / r.y)
                + self.z_axis * (v.sin() / r.z),
        )
    }

    fn recommended_subdivisions(&self, ctx: &TessellationContext) -> (u32, u32) {
        let d = self.domain();
        let r = self.radii.abs();
        let equator = r.x.max(r.y);
        (
            count_for(d.du() * equator, ctx.arc_subdivisions(equator, d.du())),
            count_for(d.dv(), ctx.arc_subdivisions(equator.max(r.z), d.dv())),
        )
    }
}

/// A facet with its normals reversed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Flipped<F>(pub F);

impl<F: ParametricFacet> ParametricFacet for Flipped<F> {
    fn kind(&self) -> FacetKind {
        self.0.kind()
    }

    fn domain(&self) -> FacetDomain {
        self.0.domain()
    }

    fn point(&self, u: f64, v: f64) -> Vector3 {
        self.0.point(u, v)
    }

    fn normal(&self, u: f64, v: f64) -> Vector3 {
        -self.0.normal(u, v)
    }

    fn recommended_subdivisions(&self, ctx: &TessellationContext) -> (u32, u32) {
        self.0.recommended_subdivisions(ctx)
    }
}

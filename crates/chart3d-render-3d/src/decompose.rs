//! Primitive decomposers.
//!
//! Each solid is expressed as parametric facets handed to the tessellator plus
//! flat triangles emitted directly. Closed solids cull back faces; open
//! surfaces are drawn two-sided.

use std::f64::consts::{FRAC_PI_2, PI, TAU};

use chart3d_core::types::{unit_or_zero, SurfaceColor, Vector3};
use glam::DVec2;
use smallvec::SmallVec;

use crate::facet::{ConeBand, CylinderSegment, EllipsoidPatch, FacetKind, Flipped, TorusSegment};
use crate::primitive::{Cone, Cylinder, Ellipsoid, PieSegment, Placement, Prism, Primitive, Pyramid};
use crate::ribbon;
use crate::tessellation::{circle_subdivisions, tessellate, TessellationContext, Triangle, TriangleSink};

const EPSILON: f64 = 1e-12;

/// Emit the triangles of `primitive` into `sink`.
pub fn decompose(primitive: &Primitive, color: &SurfaceColor, sink: &mut dyn TriangleSink) {
    let color = *color;
    match primitive {
        Primitive::Box { min, max } => decompose_box(*min, *max, color, sink),
        Primitive::Cylinder(c) => decompose_cylinder(c, color, sink),
        Primitive::Cone(c) => decompose_cone(c, color, sink),
        Primitive::Pyramid(p) => decompose_pyramid(p, color, sink),
        Primitive::Prism(p) => decompose_prism(p, color, sink),
        Primitive::PieSegment(p) => decompose_pie(p, color, sink),
        Primitive::Ellipsoid(e) => decompose_ellipsoid(e, color, sink),
        Primitive::RadialStrip(s) => ribbon::decompose_radial_strip(s, color, sink),
        Primitive::Wall(w) => ribbon::decompose_wall(w, color, sink),
        Primitive::ThickLine(l) => ribbon::decompose_thick_line(l, color, sink),
    }
}

/// Edge radius for a rounded extrusion.
///
/// Never more than a third of the height it rounds nor more than the radial
/// extent available, never negative.
pub fn effective_edge_radius(height: f64, radial_extent: f64, requested: f64) -> f64 {
    let limit = (height.abs() / 3.0).min(radial_extent.abs());
    if !(requested > 0.0) || !(limit > 0.0) {
        return 0.0;
    }
    requested.min(limit)
}

/// Inner and outer pie edge radii sharing the radial span.
///
/// When the requested radii add up to more than `span` both are scaled down
/// by the same factor so that their sum equals `span`.
pub fn pie_edge_radii(span: f64, inner: f64, outer: f64) -> (f64, f64) {
    let span = span.max(0.0);
    let inner = if inner > 0.0 { inner } else { 0.0 };
    let outer = if outer > 0.0 { outer } else { 0.0 };
    let sum = inner + outer;
    if sum > span && sum > 0.0 {
        let k = span / sum;
        (inner * k, outer * k)
    } else {
        (inner, outer)
    }
}

/// Orthonormal frame of an extruded solid with a non-negative height.
struct SolidFrame {
    base: Vector3,
    x: Vector3,
    y: Vector3,
    z: Vector3,
    height: f64,
}

impl SolidFrame {
    /// A negative height extrudes the other way; the frame is mirrored so it
    /// stays right-handed.
    fn new(placement: &Placement, height: f64) -> Self {
        let (x, y, z) = placement.frame();
        let height = if height.is_finite() { height } else { 0.0 };
        if height < 0.0 {
            Self {
                base: placement.base,
                x,
                y: -y,
                z: -z,
                height: -height,
            }
        } else {
            Self {
                base: placement.base,
                x,
                y,
                z,
                height,
            }
        }
    }

    fn radial(&self, theta: f64) -> Vector3 {
        self.x * theta.cos() + self.y * theta.sin()
    }
}

/// Two triangles over a quad, `(p0, p1, p2)` and `(p2, p3, p0)`.
pub(crate) fn emit_quad(
    sink: &mut dyn TriangleSink,
    p: [Vector3; 4],
    n: [Vector3; 4],
    color: SurfaceColor,
    cull_backfaces: bool,
) {
    sink.emit(Triangle::new([p[0], p[1], p[2]], [n[0], n[1], n[2]], color, cull_backfaces));
    sink.emit(Triangle::new([p[2], p[3], p[0]], [n[2], n[3], n[0]], color, cull_backfaces));
}

fn emit_flat_quad(sink: &mut dyn TriangleSink, p: [Vector3; 4], normal: Vector3, color: SurfaceColor, cull: bool) {
    emit_quad(sink, p, [normal; 4], color, cull);
}

/// Fan around `center` over consecutive points of `ring`.
pub(crate) fn emit_fan(
    sink: &mut dyn TriangleSink,
    center: Vector3,
    ring: &[Vector3],
    normal: Vector3,
    color: SurfaceColor,
    cull_backfaces: bool,
) {
    for pair in ring.windows(2) {
        sink.emit(Triangle::flat([center, pair[0], pair[1]], normal, color, cull_backfaces));
    }
}

/// `n + 1` points along an elliptic arc.
fn arc_points(
    center: Vector3,
    x: Vector3,
    y: Vector3,
    (rx, ry): (f64, f64),
    (a0, a1): (f64, f64),
    n: u32,
) -> Vec<Vector3> {
    let n = n.max(1);
    (0..=n)
        .map(|k| {
            let a = a0 + (a1 - a0) * k as f64 / n as f64;
            center + x * (rx * a.cos()) + y * (ry * a.sin())
        })
        .collect()
}

/// Flat elliptic sector around `center`.
#[allow(clippy::too_many_arguments)]
fn emit_disc(
    sink: &mut dyn TriangleSink,
    center: Vector3,
    x: Vector3,
    y: Vector3,
    radii: (f64, f64),
    angles: (f64, f64),
    normal: Vector3,
    color: SurfaceColor,
) {
    let r = radii.0.max(radii.1);
    if r <= EPSILON {
        return;
    }
    let sweep = (angles.1 - angles.0).abs();
    let n = if sweep >= TAU - EPSILON {
        circle_subdivisions(sink.context(), r)
    } else {
        sink.context().arc_subdivisions(r, sweep)
    };
    sink.begin_facet(FacetKind::Flat);
    let ring = arc_points(center, x, y, radii, angles, n);
    emit_fan(sink, center, &ring, normal, color, true);
}

/// Closed loop of points around four rounded corners.
///
/// Each corner is `(center, radius, start_angle)` and sweeps a quarter turn
/// counter-clockwise. Every point carries its outward unit normal; a corner
/// with zero radius contributes its centre once.
pub(crate) fn rounded_corners(
    ctx: &TessellationContext,
    corners: [(DVec2, f64, f64); 4],
) -> SmallVec<[(DVec2, DVec2); 24]> {
    let mut points = SmallVec::new();
    for (center, radius, start) in corners {
        if radius <= EPSILON {
            let mid = start + FRAC_PI_2 * 0.5;
            points.push((center, DVec2::new(mid.cos(), mid.sin())));
            continue;
        }
        let n = ctx.arc_subdivisions(radius, FRAC_PI_2);
        for k in 0..=n {
            let a = start + FRAC_PI_2 * k as f64 / n as f64;
            let dir = DVec2::new(a.cos(), a.sin());
            points.push((center + dir * radius, dir));
        }
    }
    points
}

fn ordered_fractions(from: f64, to: f64) -> (f64, f64) {
    let clamp = |t: f64| if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let (a, b) = (clamp(from), clamp(to));
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

fn decompose_box(min: Vector3, max: Vector3, color: SurfaceColor, sink: &mut dyn TriangleSink) {
    let c = |i: usize| {
        Vector3::new(
            if i & 1 != 0 { max.x } else { min.x },
            if i & 2 != 0 { max.y } else { min.y },
            if i & 4 != 0 { max.z } else { min.z },
        )
    };
    let faces: [([usize; 4], Vector3); 6] = [
        ([0, 4, 6, 2], -Vector3::X),
        ([1, 3, 7, 5], Vector3::X),
        ([0, 1, 5, 4], -Vector3::Y),
        ([2, 6, 7, 3], Vector3::Y),
        ([0, 2, 3, 1], -Vector3::Z),
        ([4, 5, 7, 6], Vector3::Z),
    ];
    for (idx, normal) in faces {
        sink.begin_facet(FacetKind::Flat);
        emit_flat_quad(sink, idx.map(c), normal, color, true);
    }
}

fn decompose_cylinder(c: &Cylinder, color: SurfaceColor, sink: &mut dyn TriangleSink) {
    let f = SolidFrame::new(&c.placement, c.height);
    let (rx, ry) = (c.radius_x.abs(), c.radius_y.abs());
    let h = f.height;
    let e = effective_edge_radius(h, rx.min(ry), c.edge_radius);

    let lateral = CylinderSegment {
        center: f.base,
        x_axis: f.x,
        y_axis: f.y,
        axis: f.z,
        radius_x: rx,
        radius_y: ry,
        angles: (0.0, TAU),
        heights: (e, h - e),
    };
    tessellate(&lateral, color, true, sink);

    if e > 0.0 {
        let rim = |center: Vector3, tube: (f64, f64)| TorusSegment {
            center,
            x_axis: f.x,
            y_axis: f.y,
            axis: f.z,
            spine_x: rx - e,
            spine_y: ry - e,
            minor: e,
            angles: (0.0, TAU),
            tube,
        };
        tessellate(&rim(f.base + f.z * e, (-FRAC_PI_2, 0.0)), color, true, sink);
        tessellate(&rim(f.base + f.z * (h - e), (0.0, FRAC_PI_2)), color, true, sink);
    }

    let cap = (rx - e, ry - e);
    emit_disc(sink, f.base, f.x, f.y, cap, (0.0, TAU), -f.z, color);
    emit_disc(sink, f.base + f.z * h, f.x, f.y, cap, (0.0, TAU), f.z, color);
}

fn decompose_cone(c: &Cone, color: SurfaceColor, sink: &mut dyn TriangleSink) {
    let f = SolidFrame::new(&c.placement, c.height);
    let (rx, ry) = (c.radius_x.abs(), c.radius_y.abs());
    let (f0, f1) = ordered_fractions(c.from, c.to);

    let band = ConeBand {
        base: f.base,
        x_axis: f.x,
        y_axis: f.y,
        apex_offset: f.z * f.height,
        radius_x: rx,
        radius_y: ry,
        angles: (0.0, TAU),
        fractions: (f0, f1),
    };
    tessellate(&band, color, true, sink);

    let (s0, s1) = (1.0 - f0, 1.0 - f1);
    let bottom = f.base + f.z * (f.height * f0);
    let top = f.base + f.z * (f.height * f1);
    emit_disc(sink, bottom, f.x, f.y, (rx * s0, ry * s0), (0.0, TAU), -f.z, color);
    emit_disc(sink, top, f.x, f.y, (rx * s1, ry * s1), (0.0, TAU), f.z, color);
}

/// Side count of a regular polygon, at least a triangle and at most the
/// context's subdivision limit.
fn polygon_sides(requested: u32, ctx: &TessellationContext) -> u32 {
    requested.clamp(3, ctx.max_subdivisions.max(3))
}

fn decompose_pyramid(p: &Pyramid, color: SurfaceColor, sink: &mut dyn TriangleSink) {
    let f = SolidFrame::new(&p.placement, p.height);
    let n = polygon_sides(p.sides, sink.context());
    let step = TAU / n as f64;
    let radius = p.radius.abs();
    let (f0, f1) = ordered_fractions(p.from, p.to);
    let apex = f.base + f.z * f.height;

    let base_ring: Vec<Vector3> = (0..=n)
        .map(|k| f.base + f.radial(p.rotation + k as f64 * step) * radius)
        .collect();
    let at = |b: Vector3, t: f64| b + (apex - b) * t;
    let top_open = (1.0 - f1) * radius > EPSILON;

    sink.begin_facet(FacetKind::Flat);
    for pair in base_ring.windows(2) {
        let (b0, b1) = (pair[0], pair[1]);
        let mut normal = unit_or_zero((b1 - b0).cross(apex - b0));
        if normal.dot((b0 + b1) * 0.5 - f.base) < 0.0 {
            normal = -normal;
        }
        let (lo0, lo1) = (at(b0, f0), at(b1, f0));
        let (hi0, hi1) = (at(b0, f1), at(b1, f1));
        if top_open {
            emit_flat_quad(sink, [lo0, lo1, hi1, hi0], normal, color, true);
        } else {
            sink.emit(Triangle::flat([lo0, lo1, hi0], normal, color, true));
        }
    }

    if (1.0 - f0) * radius > EPSILON {
        sink.begin_facet(FacetKind::Flat);
        let ring: Vec<Vector3> = base_ring.iter().map(|b| at(*b, f0)).collect();
        emit_fan(sink, at(f.base, f0), &ring, -f.z, color, true);
    }
    if top_open {
        sink.begin_facet(FacetKind::Flat);
        let ring: Vec<Vector3> = base_ring.iter().map(|b| at(*b, f1)).collect();
        emit_fan(sink, at(f.base, f1), &ring, f.z, color, true);
    }
}

fn decompose_prism(p: &Prism, color: SurfaceColor, sink: &mut dyn TriangleSink) {
    let f = SolidFrame::new(&p.placement, p.height);
    let n = polygon_sides(p.sides, sink.context());
    let step = TAU / n as f64;
    let half = step * 0.5;
    let radius = p.radius.abs();
    let h = f.height;

    let e = effective_edge_radius(h, radius * half.cos(), p.edge_radius);
    // Corners of the polygon whose edges sit `e` inside the true faces.
    let inset = radius - e / half.cos();
    let corners: Vec<Vector3> = (0..=n)
        .map(|k| f.base + f.radial(p.rotation + k as f64 * step) * inset)
        .collect();
    let edge_len = 2.0 * inset * half.sin();
    let top_center = f.base + f.z * h;

    for k in 0..n as usize {
        let (c0, c1) = (corners[k], corners[k + 1]);
        let normal = f.radial(p.rotation + k as f64 * step + half);
        let along = unit_or_zero(c1 - c0);
        let turn = f.z.cross(normal);

        sink.begin_facet(FacetKind::Flat);
        sink.emit(Triangle::flat([top_center, c0 + f.z * h, c1 + f.z * h], f.z, color, true));

        let rim = |center: Vector3, y_axis: Vector3| CylinderSegment {
            center,
            x_axis: normal,
            y_axis,
            axis: along,
            radius_x: e,
            radius_y: e,
            angles: (0.0, FRAC_PI_2),
            heights: (0.0, edge_len),
        };
        if e > 0.0 {
            tessellate(&rim(c0 + f.z * (h - e), f.z), color, true, sink);
        }

        sink.begin_facet(FacetKind::Flat);
        let out = normal * e;
        emit_flat_quad(
            sink,
            [
                c0 + out + f.z * e,
                c1 + out + f.z * e,
                c1 + out + f.z * (h - e),
                c0 + out + f.z * (h - e),
            ],
            normal,
            color,
            true,
        );

        if e > 0.0 {
            tessellate(&rim(c0 + f.z * e, -f.z), color, true, sink);

            let corner = CylinderSegment::circular(c1, normal, turn, f.z, e, (0.0, step), (e, h - e));
            tessellate(&corner, color, true, sink);

            let frame = (normal, turn, f.z);
            let upper = EllipsoidPatch::sphere(c1 + f.z * (h - e), frame, e, (0.0, step), (0.0, FRAC_PI_2));
            let lower = EllipsoidPatch::sphere(c1 + f.z * e, frame, e, (0.0, step), (-FRAC_PI_2, 0.0));
            tessellate(&upper, color, true, sink);
            tessellate(&lower, color, true, sink);
        }

        sink.begin_facet(FacetKind::Flat);
        sink.emit(Triangle::flat([f.base, c0, c1], -f.z, color, true));
    }
}

fn decompose_pie(p: &PieSegment, color: SurfaceColor, sink: &mut dyn TriangleSink) {
    let f = SolidFrame::new(&p.placement, p.height);
    let h = f.height;
    let (mut ri, mut ro) = (p.inner_radius.abs(), p.outer_radius.abs());
    if ri > ro {
        std::mem::swap(&mut ri, &mut ro);
    }
    let sweep = p.sweep.abs().min(TAU);
    let a0 = if p.sweep < 0.0 { p.start_angle - sweep } else { p.start_angle };
    let angles = (a0, a0 + sweep);

    let inner_request = if ri > 0.0 { p.inner_edge_radius } else { 0.0 };
    let (ei, eo) = pie_edge_radii(ro - ri, inner_request, p.outer_edge_radius);
    let (ei, eo) = (ei.min(h / 3.0), eo.min(h / 3.0));

    // Outer rim.
    let outer_rim = |center: Vector3, tube: (f64, f64)| {
        TorusSegment::circular(center, f.x, f.y, f.z, ro - eo, eo, angles, tube)
    };
    if eo > 0.0 {
        tessellate(&outer_rim(f.base + f.z * (h - eo), (0.0, FRAC_PI_2)), color, true, sink);
    }
    let outer_band = CylinderSegment::circular(f.base, f.x, f.y, f.z, ro, angles, (eo, h - eo));
    tessellate(&outer_band, color, true, sink);
    if eo > 0.0 {
        tessellate(&outer_rim(f.base + f.z * eo, (-FRAC_PI_2, 0.0)), color, true, sink);
    }

    // Inner rim, facing the hole.
    if ri > 0.0 {
        let inner_rim = |center: Vector3, tube: (f64, f64)| {
            TorusSegment::circular(center, f.x, f.y, f.z, ri + ei, ei, angles, tube)
        };
        if ei > 0.0 {
            tessellate(&inner_rim(f.base + f.z * (h - ei), (FRAC_PI_2, PI)), color, true, sink);
        }
        let inner_band = CylinderSegment::circular(f.base, f.x, f.y, f.z, ri, angles, (ei, h - ei));
        tessellate(&Flipped(inner_band), color, true, sink);
        if ei > 0.0 {
            tessellate(&inner_rim(f.base + f.z * ei, (PI, 1.5 * PI)), color, true, sink);
        }
    }

    let ring_in = if ri > 0.0 { ri + ei } else { 0.0 };
    let ring_out = ro - eo;
    emit_ring(sink, &f, h, (ring_in, ring_out), angles, f.z, color);

    if sweep < TAU - 1e-9 {
        let profile = rounded_corners(
            sink.context(),
            [
                (DVec2::new(ro - eo, eo), eo, -FRAC_PI_2),
                (DVec2::new(ro - eo, h - eo), eo, 0.0),
                (DVec2::new(ri + ei, h - ei), ei, FRAC_PI_2),
                (DVec2::new(ri + ei, ei), ei, PI),
            ],
        );
        for (angle, side) in [(angles.0, -1.0), (angles.1, 1.0)] {
            let dir = f.radial(angle);
            let normal = f.z.cross(dir) * side;
            let mut ring: Vec<Vector3> = profile.iter().map(|(q, _)| f.base + dir * q.x + f.z * q.y).collect();
            if let Some(first) = ring.first().copied() {
                ring.push(first);
            }
            let centroid = profile.iter().map(|(q, _)| *q).sum::<DVec2>() / profile.len().max(1) as f64;
            sink.begin_facet(FacetKind::Flat);
            emit_fan(sink, f.base + dir * centroid.x + f.z * centroid.y, &ring, normal, color, true);
        }
    }

    emit_ring(sink, &f, 0.0, (ring_in, ring_out), angles, -f.z, color);
}

/// Flat annular sector (or sector of a disc when the inner radius is zero) at
/// height `at`.
fn emit_ring(
    sink: &mut dyn TriangleSink,
    f: &SolidFrame,
    at: f64,
    (inner, outer): (f64, f64),
    angles: (f64, f64),
    normal: Vector3,
    color: SurfaceColor,
) {
    let center = f.base + f.z * at;
    if inner <= EPSILON {
        emit_disc(sink, center, f.x, f.y, (outer, outer), angles, normal, color);
        return;
    }
    if outer - inner <= EPSILON {
        return;
    }
    let n = sink.context().arc_subdivisions(outer, angles.1 - angles.0);
    let inside = arc_points(center, f.x, f.y, (inner, inner), angles, n);
    let outside = arc_points(center, f.x, f.y, (outer, outer), angles, n);
    sink.begin_facet(FacetKind::Flat);
    for k in 0..n as usize {
        emit_flat_quad(sink, [inside[k], outside[k], outside[k + 1], inside[k + 1]], normal, color, true);
    }
}

fn decompose_ellipsoid(el: &Ellipsoid, color: SurfaceColor, sink: &mut dyn TriangleSink) {
    let (x, y, z) = el.orientation.frame();
    let clamp = |v: f64| v.clamp(-FRAC_PI_2, FRAC_PI_2);
    let latitude = (clamp(el.latitude.0), clamp(el.latitude.1));
    let closed = (el.longitude.1 - el.longitude.0).abs() >= TAU - 1e-9 && (latitude.1 - latitude.0).abs() >= PI - 1e-9;

    let patch = EllipsoidPatch {
        center: el.center,
        x_axis: x,
        y_axis: y,
        z_axis: z,
        radii: el.radii.abs(),
        longitude: el.longitude,
        latitude,
    };
    tessellate(&patch, color, closed, sink);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tessellation::TriangleCollector;
    use chart3d_core::types::Color;

    fn collect(primitive: &Primitive) -> TriangleCollector {
        let mut sink = TriangleCollector::default();
        decompose(primitive, &SurfaceColor::new(Color::WHITE), &mut sink);
        sink
    }

    fn upright_pie(inner: f64, sweep: f64, edges: (f64, f64)) -> Primitive {
        Primitive::PieSegment(PieSegment {
            placement: Placement::upright(Vector3::ZERO),
            height: 1.0,
            inner_radius: inner,
            outer_radius: 4.0,
            start_angle: 0.0,
            sweep,
            inner_edge_radius: edges.0,
            outer_edge_radius: edges.1,
        })
    }

    #[test]
    fn test_effective_edge_radius() {
        assert_eq!(effective_edge_radius(3.0, 10.0, 5.0), 1.0);
        assert_eq!(effective_edge_radius(30.0, 0.5, 5.0), 0.5);
        assert_eq!(effective_edge_radius(3.0, 10.0, 0.2), 0.2);
        assert_eq!(effective_edge_radius(3.0, 10.0, -1.0), 0.0);
        assert_eq!(effective_edge_radius(0.0, 10.0, 1.0), 0.0);
        assert_eq!(effective_edge_radius(3.0, 10.0, f64::NAN), 0.0);
    }

    #[test]
    fn test_pie_edge_radii() {
        assert_eq!(pie_edge_radii(10.0, 1.0, 2.0), (1.0, 2.0));
        let (i, o) = pie_edge_radii(3.0, 2.0, 4.0);
        assert!((i + o - 3.0).abs() < 1e-12);
        assert!((o / i - 2.0).abs() < 1e-12);
        assert_eq!(pie_edge_radii(3.0, -1.0, 1.0), (0.0, 1.0));
    }

    #[test]
    fn test_box_faces() {
        let sink = collect(&Primitive::cuboid(Vector3::ZERO, Vector3::ONE));
        assert_eq!(sink.triangles.len(), 12);
        assert_eq!(sink.count_kind(FacetKind::Flat), 6);
        for tri in &sink.triangles {
            let center = (tri.points[0] + tri.points[1] + tri.points[2]) / 3.0;
            // Outward normals point away from the box centre.
            assert!(tri.normals[0].dot(center - Vector3::splat(0.5)) > 0.0);
            assert!(tri.cull_backfaces);
        }
    }

    #[test]
    fn test_sharp_cylinder_has_no_fillets() {
        let sink = collect(&Primitive::cylinder(Vector3::ZERO, 1.0, 2.0, 0.0));
        assert_eq!(sink.count_kind(FacetKind::Torus), 0);
        assert_eq!(sink.count_kind(FacetKind::Cylinder), 1);
        assert_eq!(sink.count_kind(FacetKind::Flat), 2);
    }

    #[test]
    fn test_rounded_cylinder_has_two_fillets() {
        let sink = collect(&Primitive::cylinder(Vector3::ZERO, 1.0, 2.0, 0.25));
        assert_eq!(sink.count_kind(FacetKind::Torus), 2);
        let top = sink
            .triangles
            .iter()
            .flat_map(|t| t.points)
            .map(|p| p.y)
            .fold(f64::NEG_INFINITY, f64::max);
        assert!((top - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_elliptic_rim_meets_the_side_wall() {
        let sink = collect(&Primitive::Cylinder(Cylinder {
            placement: Placement::upright(Vector3::ZERO),
            height: 3.0,
            radius_x: 2.0,
            radius_y: 1.0,
            edge_radius: 0.3,
        }));
        assert_eq!(sink.count_kind(FacetKind::Torus), 2);

        let mut seam = 0;
        for tri in &sink.triangles {
            for (p, n) in tri.points.iter().zip(tri.normals) {
                if (p.y - 0.3).abs() > 1e-9 && (p.y - 2.7).abs() > 1e-9 {
                    continue;
                }
                seam += 1;
                assert!((p.x * p.x / 4.0 + p.z * p.z - 1.0).abs() < 1e-9, "{p:?} is off the wall");
                // Rim and wall agree on the normal along the seam.
                let gradient = DVec2::new(p.x / 4.0, p.z).normalize();
                assert!(n.y.abs() < 1e-9);
                assert!((DVec2::new(n.x, n.z) - gradient).length() < 1e-9);
            }
        }
        assert!(seam > 0);
    }

    #[test]
    fn test_negative_height_extrudes_downward() {
        let sink = collect(&Primitive::cylinder(Vector3::ZERO, 1.0, -2.0, 0.0));
        let ys: Vec<f64> = sink.triangles.iter().flat_map(|t| t.points).map(|p| p.y).collect();
        assert!(ys.iter().all(|y| *y <= 1e-9 && *y >= -2.0 - 1e-9));
    }

    #[test]
    fn test_full_cone_has_single_cap() {
        let cone = Primitive::Cone(Cone {
            placement: Placement::upright(Vector3::ZERO),
            height: 2.0,
            radius_x: 1.0,
            radius_y: 1.0,
            from: 0.0,
            to: 1.0,
        });
        let sink = collect(&cone);
        assert_eq!(sink.count_kind(FacetKind::Cone), 1);
        assert_eq!(sink.count_kind(FacetKind::Flat), 1);
    }

    #[test]
    fn test_frustum_fractions_are_ordered() {
        let cone = Primitive::Cone(Cone {
            placement: Placement::upright(Vector3::ZERO),
            height: 2.0,
            radius_x: 1.0,
            radius_y: 1.0,
            from: 0.75,
            to: -0.5,
        });
        let sink = collect(&cone);
        assert_eq!(sink.count_kind(FacetKind::Flat), 2);
        let top = sink.triangles.iter().flat_map(|t| t.points).map(|p| p.y).fold(0.0, f64::max);
        assert!((top - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_pyramid_normals_point_outward() {
        let pyramid = Primitive::Pyramid(Pyramid {
            placement: Placement::upright(Vector3::ZERO),
            height: 2.0,
            radius: 1.0,
            sides: 4,
            rotation: 0.0,
            from: 0.0,
            to: 1.0,
        });
        let sink = collect(&pyramid);
        // Four side triangles plus a four-triangle bottom fan.
        assert_eq!(sink.triangles.len(), 8);
        for tri in &sink.triangles[..4] {
            let center = (tri.points[0] + tri.points[1] + tri.points[2]) / 3.0;
            let outward = Vector3::new(center.x, 0.0, center.z);
            assert!(tri.normals[0].dot(outward) > 0.0);
            assert!(tri.normals[0].y > 0.0);
        }
    }

    #[test]
    fn test_polygon_sides_are_bounded() {
        let pyramid = Primitive::Pyramid(Pyramid {
            placement: Placement::upright(Vector3::ZERO),
            height: 2.0,
            radius: 1.0,
            sides: u32::MAX,
            rotation: 0.0,
            from: 0.0,
            to: 1.0,
        });
        assert_eq!(collect(&pyramid).triangles.len(), 2 * 256);

        let prism = Primitive::Prism(Prism {
            placement: Placement::upright(Vector3::ZERO),
            height: 3.0,
            radius: 2.0,
            sides: 1_000_000,
            rotation: 0.0,
            edge_radius: 0.0,
        });
        let mut sink = TriangleCollector::new(TessellationContext {
            max_subdivisions: 16,
            ..TessellationContext::default()
        });
        decompose(&prism, &SurfaceColor::new(Color::WHITE), &mut sink);
        assert_eq!(sink.triangles.len(), 16 * 4);

        let ctx = TessellationContext::default();
        assert_eq!(polygon_sides(0, &ctx), 3);
        assert_eq!(polygon_sides(7, &ctx), 7);
    }

    #[test]
    fn test_prism_pieces() {
        let prism = |edge: f64| {
            Primitive::Prism(Prism {
                placement: Placement::upright(Vector3::ZERO),
                height: 3.0,
                radius: 2.0,
                sides: 5,
                rotation: 0.0,
                edge_radius: edge,
            })
        };
        let sharp = collect(&prism(0.0));
        assert_eq!(sharp.count_kind(FacetKind::Cylinder), 0);
        assert_eq!(sharp.triangles.len(), 5 * 4);

        let round = collect(&prism(0.3));
        assert_eq!(round.count_kind(FacetKind::Cylinder), 15);
        assert_eq!(round.count_kind(FacetKind::Ellipsoid), 10);
        let extent = round
            .triangles
            .iter()
            .flat_map(|t| t.points)
            .map(|p| Vector3::new(p.x, 0.0, p.z).length())
            .fold(0.0, f64::max);
        assert!(extent <= 2.0 + 1e-9);
    }

    #[test]
    fn test_pie_pieces() {
        let wedge = collect(&upright_pie(0.0, FRAC_PI_2, (0.5, 0.2)));
        assert_eq!(wedge.count_kind(FacetKind::Torus), 2);
        // Top, two end walls, bottom.
        assert_eq!(wedge.count_kind(FacetKind::Flat), 4);

        let ring = collect(&upright_pie(1.0, FRAC_PI_2, (0.2, 0.2)));
        assert_eq!(ring.count_kind(FacetKind::Torus), 4);
        assert_eq!(ring.count_kind(FacetKind::Cylinder), 2);

        let full = collect(&upright_pie(1.0, TAU, (0.0, 0.0)));
        assert_eq!(full.count_kind(FacetKind::Flat), 2);
    }

    #[test]
    fn test_pie_inner_band_faces_the_hole() {
        let sink = collect(&upright_pie(1.0, PI, (0.0, 0.0)));
        let inner = sink
            .triangles
            .iter()
            .find(|t| t.points.iter().all(|p| (Vector3::new(p.x, 0.0, p.z).length() - 1.0).abs() < 1e-9))
            .unwrap();
        let p = inner.points[0];
        assert!(inner.normals[0].dot(Vector3::new(p.x, 0.0, p.z)) < 0.0);
    }

    #[test]
    fn test_sphere_culls_but_patch_does_not() {
        let sphere = collect(&Primitive::sphere(Vector3::ZERO, 1.0));
        assert!(sphere.triangles.iter().all(|t| t.cull_backfaces));

        let patch = Primitive::Ellipsoid(Ellipsoid {
            center: Vector3::ZERO,
            orientation: Placement::upright(Vector3::ZERO),
            radii: Vector3::ONE,
            longitude: (0.0, PI),
            latitude: (0.0, FRAC_PI_2),
        });
        let patch = collect(&patch);
        assert!(!patch.triangles.is_empty());
        assert!(patch.triangles.iter().all(|t| !t.cull_backfaces));
    }

    #[test]
    fn test_rounded_corners_loop() {
        let ctx = TessellationContext::default();
        let sharp = rounded_corners(
            &ctx,
            [
                (DVec2::new(1.0, -1.0), 0.0, -FRAC_PI_2),
                (DVec2::new(1.0, 1.0), 0.0, 0.0),
                (DVec2::new(-1.0, 1.0), 0.0, FRAC_PI_2),
                (DVec2::new(-1.0, -1.0), 0.0, PI),
            ],
        );
        assert_eq!(sharp.len(), 4);
        assert!((sharp[1].1 - DVec2::new(1.0, 1.0).normalize()).length() < 1e-12);
    }
}

//! Ribbons swept along paths: walls, radial strips and thick lines.

use std::f64::consts::{FRAC_PI_2, PI};

use chart3d_core::types::{any_perpendicular, unit_or_zero, SurfaceColor, Vector3};
use glam::DVec2;
use smallvec::SmallVec;

use crate::decompose::{emit_fan, emit_quad, rounded_corners};
use crate::facet::FacetKind;
use crate::primitive::{LineProfile, PathPoint, RadialStrip, ThickLine, Wall};
use crate::tessellation::{TessellationContext, TriangleSink};

const EPSILON: f64 = 1e-12;

/// Number of segments of a path with `n` points.
///
/// Segment `i` runs from point `i` to point `(i + 1) % n`. A closed path needs
/// at least three points to wrap.
fn segment_count(n: usize, closed: bool) -> usize {
    if n < 2 {
        0
    } else if closed && n > 2 {
        n
    } else {
        n - 1
    }
}

/// Start and end vertex normals for each segment.
///
/// At a smooth point shared by two segments both use the unit average of the
/// two face normals; everywhere else a segment keeps its own face normal.
fn blended_normals(points: &[PathPoint], faces: &[Vector3]) -> Vec<[Vector3; 2]> {
    let count = faces.len();
    let wraps = count > 0 && count == points.len();
    let blend = |a: Vector3, b: Vector3, own: Vector3| match unit_or_zero(a + b) {
        v if v == Vector3::ZERO => own,
        v => v,
    };

    (0..count)
        .map(|i| {
            let own = faces[i];
            let prev = if i > 0 {
                Some(i - 1)
            } else if wraps {
                Some(count - 1)
            } else {
                None
            };
            let next = if i + 1 < count {
                Some(i + 1)
            } else if wraps {
                Some(0)
            } else {
                None
            };
            let end_point = (i + 1) % points.len();

            let start = match prev {
                Some(p) if points[i].smooth => blend(faces[p], own, own),
                _ => own,
            };
            let end = match next {
                Some(n) if points[end_point].smooth => blend(own, faces[n], own),
                _ => own,
            };
            [start, end]
        })
        .collect()
}

/// Two-sided ribbon between a polyline and its copy offset by the extrusion.
pub fn decompose_wall(wall: &Wall, color: SurfaceColor, sink: &mut dyn TriangleSink) {
    let points = &wall.points;
    let n = points.len();
    let count = segment_count(n, wall.closed);
    if count == 0 || wall.extrusion.length() <= EPSILON {
        log::trace!("skipping wall with {} points", n);
        return;
    }

    let faces: Vec<Vector3> = (0..count)
        .map(|i| {
            let d = points[(i + 1) % n].position - points[i].position;
            unit_or_zero(d.cross(wall.extrusion))
        })
        .collect();
    let normals = blended_normals(points, &faces);

    sink.begin_facet(FacetKind::Flat);
    for (i, [na, nb]) in normals.into_iter().enumerate() {
        let a = points[i].position;
        let b = points[(i + 1) % n].position;
        emit_quad(
            sink,
            [a, b, b + wall.extrusion, a + wall.extrusion],
            [na, nb, nb, na],
            color,
            false,
        );
    }
}

/// Band between an inner and an outer ring, optionally given thickness.
pub fn decompose_radial_strip(strip: &RadialStrip, color: SurfaceColor, sink: &mut dyn TriangleSink) {
    let n = strip.inner.len().min(strip.outer.len());
    let count = segment_count(n, strip.closed);
    if count == 0 {
        log::trace!("skipping radial strip with {} points", n);
        return;
    }
    let (inner, outer) = (&strip.inner[..n], &strip.outer[..n]);
    let up = unit_or_zero(strip.normal);
    let next = |i: usize| (i + 1) % n;

    if strip.thickness.abs() <= EPSILON || up == Vector3::ZERO {
        sink.begin_facet(FacetKind::Flat);
        for i in 0..count {
            let quad = [
                inner[i].position,
                outer[i].position,
                outer[next(i)].position,
                inner[next(i)].position,
            ];
            emit_quad(sink, quad, [up; 4], color, false);
        }
        return;
    }

    let offset = up * strip.thickness;
    let (bottom, top) = if strip.thickness > 0.0 { (-up, up) } else { (up, -up) };
    sink.begin_facet(FacetKind::Flat);
    for i in 0..count {
        let quad = [
            inner[i].position,
            outer[i].position,
            outer[next(i)].position,
            inner[next(i)].position,
        ];
        emit_quad(sink, quad, [bottom; 4], color, true);
        emit_quad(sink, quad.map(|p| p + offset), [top; 4], color, true);
    }

    strip_side(sink, outer, inner, count, offset, color);
    strip_side(sink, inner, outer, count, offset, color);

    if count < n {
        let ends = [(0, 1), (n - 1, n - 2)];
        for (end, toward) in ends {
            let (a, b) = (inner[end].position, outer[end].position);
            let along = (inner[toward].position + outer[toward].position) - (a + b);
            let mut normal = unit_or_zero((b - a).cross(offset));
            if normal.dot(along) > 0.0 {
                normal = -normal;
            }
            sink.begin_facet(FacetKind::Flat);
            emit_quad(sink, [a, b, b + offset, a + offset], [normal; 4], color, true);
        }
    }
}

/// Side wall along `ring`, facing away from `other`.
fn strip_side(
    sink: &mut dyn TriangleSink,
    ring: &[PathPoint],
    other: &[PathPoint],
    count: usize,
    offset: Vector3,
    color: SurfaceColor,
) {
    let n = ring.len();
    let faces: Vec<Vector3> = (0..count)
        .map(|i| {
            let j = (i + 1) % n;
            let m = unit_or_zero((ring[j].position - ring[i].position).cross(offset));
            let away = ring[i].position + ring[j].position - other[i].position - other[j].position;
            if m.dot(away) < 0.0 {
                -m
            } else {
                m
            }
        })
        .collect();
    let normals = blended_normals(ring, &faces);

    sink.begin_facet(FacetKind::Flat);
    for (i, [na, nb]) in normals.into_iter().enumerate() {
        let a = ring[i].position;
        let b = ring[(i + 1) % n].position;
        emit_quad(sink, [a, b, b + offset, a + offset], [na, nb, nb, na], color, true);
    }
}

/// Cross-section of a thick line as a closed loop of `(position, normal)`
/// pairs in `(side, up)` coordinates.
fn profile_loop(ctx: &TessellationContext, width: f64, thickness: f64, profile: LineProfile) -> SmallVec<[(DVec2, DVec2); 24]> {
    let (hw, ht) = (width * 0.5, thickness * 0.5);
    if let LineProfile::Rounded { radius } = profile {
        let r = radius.min(width.min(thickness) / 3.0);
        if r > EPSILON {
            return rounded_corners(
                ctx,
                [
                    (DVec2::new(hw - r, -ht + r), r, -FRAC_PI_2),
                    (DVec2::new(hw - r, ht - r), r, 0.0),
                    (DVec2::new(-hw + r, ht - r), r, FRAC_PI_2),
                    (DVec2::new(-hw + r, -ht + r), r, PI),
                ],
            );
        }
    }

    // Each corner appears twice, once with each adjacent face normal.
    let corners = [
        DVec2::new(hw, -ht),
        DVec2::new(hw, ht),
        DVec2::new(-hw, ht),
        DVec2::new(-hw, -ht),
    ];
    let faces = [DVec2::X, DVec2::Y, -DVec2::X, -DVec2::Y];
    let mut points = SmallVec::new();
    for (k, normal) in faces.into_iter().enumerate() {
        points.push((corners[k], normal));
        points.push((corners[(k + 1) % 4], normal));
    }
    points
}

#[derive(Debug, Clone, Copy)]
struct SegmentFrame {
    dir: Vector3,
    side: Vector3,
    up: Vector3,
}

/// Profile placement at a path point.
#[derive(Debug, Clone, Copy)]
struct Joint {
    side: Vector3,
    up: Vector3,
    side_scale: f64,
    up_scale: f64,
    mitered: bool,
}

impl Joint {
    fn square(frame: &SegmentFrame) -> Self {
        Self {
            side: frame.side,
            up: frame.up,
            side_scale: 1.0,
            up_scale: 1.0,
            mitered: false,
        }
    }

    fn mitered(a: &SegmentFrame, b: &SegmentFrame, limit: f64) -> Self {
        let bisect = |u: Vector3, v: Vector3| match unit_or_zero(u + v) {
            w if w == Vector3::ZERO => v,
            w => w,
        };
        let scale = |axis: Vector3, own: Vector3| {
            let c = axis.dot(own);
            if c <= 1.0 / limit {
                limit
            } else {
                (1.0 / c).clamp(1.0, limit)
            }
        };
        let side = bisect(a.side, b.side);
        let up = bisect(a.up, b.up);
        Self {
            side,
            up,
            side_scale: scale(side, b.side),
            up_scale: scale(up, b.up),
            mitered: true,
        }
    }

    fn offset(&self, q: DVec2) -> Vector3 {
        self.side * (q.x * self.side_scale) + self.up * (q.y * self.up_scale)
    }
}

/// Polyline swept with a rectangular or rounded cross-section.
pub fn decompose_thick_line(line: &ThickLine, color: SurfaceColor, sink: &mut dyn TriangleSink) {
    let mut points: Vec<PathPoint> = Vec::with_capacity(line.points.len());
    for p in &line.points {
        if points.last().map_or(true, |q| (q.position - p.position).length() > EPSILON) {
            points.push(*p);
        }
    }
    if line.closed && points.len() > 2 {
        if let (Some(first), Some(last)) = (points.first(), points.last()) {
            if (first.position - last.position).length() <= EPSILON {
                points.pop();
            }
        }
    }

    let n = points.len();
    let count = segment_count(n, line.closed);
    let (width, thickness) = (line.width.abs(), line.thickness.abs());
    if count == 0 || (width <= EPSILON && thickness <= EPSILON) {
        log::trace!("skipping thick line with {} distinct points", n);
        return;
    }
    let closed = count == n;

    let frames: Vec<SegmentFrame> = (0..count)
        .map(|i| {
            let dir = unit_or_zero(points[(i + 1) % n].position - points[i].position);
            let up = match unit_or_zero(line.up - dir * line.up.dot(dir)) {
                v if v == Vector3::ZERO => any_perpendicular(dir),
                v => v,
            };
            SegmentFrame {
                dir,
                side: dir.cross(up),
                up,
            }
        })
        .collect();

    let limit = sink.context().miter_limit.max(1.0);
    let joints: Vec<Joint> = (0..n)
        .map(|i| {
            let prev = if i > 0 {
                Some(i - 1)
            } else if closed {
                Some(count - 1)
            } else {
                None
            };
            let next = (i < count).then_some(i);
            match (prev, next) {
                (Some(a), Some(b)) => Joint::mitered(&frames[a], &frames[b], limit),
                (a, b) => Joint::square(&frames[b.or(a).unwrap_or(0)]),
            }
        })
        .collect();

    let profile = profile_loop(sink.context(), width, thickness, line.profile);
    let m = profile.len();
    let vertex_normal = |segment: usize, joint: usize, q: DVec2| {
        let j = &joints[joint];
        if points[joint].smooth && j.mitered {
            unit_or_zero(j.side * q.x + j.up * q.y)
        } else {
            let f = &frames[segment];
            unit_or_zero(f.side * q.x + f.up * q.y)
        }
    };

    sink.begin_facet(FacetKind::Flat);
    for k in 0..count {
        let (j0, j1) = (k, (k + 1) % n);
        let (p0, p1) = (points[j0].position, points[j1].position);
        for e in 0..m {
            let (q0, m0) = profile[e];
            let (q1, m1) = profile[(e + 1) % m];
            if (q1 - q0).length() <= EPSILON {
                continue;
            }
            let quad = [
                p0 + joints[j0].offset(q0),
                p1 + joints[j1].offset(q0),
                p1 + joints[j1].offset(q1),
                p0 + joints[j0].offset(q1),
            ];
            let normals = [
                vertex_normal(k, j0, m0),
                vertex_normal(k, j1, m0),
                vertex_normal(k, j1, m1),
                vertex_normal(k, j0, m1),
            ];
            emit_quad(sink, quad, normals, color, true);
        }
    }

    if !closed {
        let caps = [(0, -frames[0].dir), (n - 1, frames[count - 1].dir)];
        for (joint, normal) in caps {
            let center = points[joint].position;
            let mut ring: Vec<Vector3> = profile.iter().map(|(q, _)| center + joints[joint].offset(*q)).collect();
            if let Some(first) = ring.first().copied() {
                ring.push(first);
            }
            sink.begin_facet(FacetKind::Flat);
            emit_fan(sink, center, &ring, normal, color, true);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tessellation::TriangleCollector;
    use chart3d_core::types::Color;

    fn white() -> SurfaceColor {
        SurfaceColor::new(Color::WHITE)
    }

    fn path(points: &[(f64, f64, f64)]) -> Vec<PathPoint> {
        points.iter().map(|&(x, y, z)| PathPoint::new(Vector3::new(x, y, z))).collect()
    }

    fn line(points: &[(f64, f64, f64)], profile: LineProfile) -> ThickLine {
        ThickLine {
            points: path(points),
            closed: false,
            up: Vector3::Y,
            width: 1.0,
            thickness: 0.5,
            profile,
        }
    }

    #[test]
    fn test_segment_count() {
        assert_eq!(segment_count(0, true), 0);
        assert_eq!(segment_count(1, false), 0);
        assert_eq!(segment_count(2, true), 1);
        assert_eq!(segment_count(3, false), 2);
        assert_eq!(segment_count(3, true), 3);
    }

    #[test]
    fn test_wall_is_two_sided() {
        let wall = Wall {
            points: path(&[(0.0, 0.0, 0.0), (1.0, 0.0, 0.0), (1.0, 0.0, 1.0)]),
            closed: false,
            extrusion: Vector3::Y,
        };
        let mut sink = TriangleCollector::default();
        decompose_wall(&wall, white(), &mut sink);
        assert_eq!(sink.triangles.len(), 4);
        assert!(sink.triangles.iter().all(|t| !t.cull_backfaces));
    }

    #[test]
    fn test_smooth_point_blends_normals() {
        let mut points = path(&[(0.0, 0.0, 0.0), (1.0, 0.0, 0.0), (1.0, 0.0, 1.0)]);
        let faces = [Vector3::Z, -Vector3::X];
        let sharp = blended_normals(&points, &faces);
        assert_eq!(sharp[0][1], Vector3::Z);
        assert_eq!(sharp[1][0], -Vector3::X);

        points[1].smooth = true;
        let smooth = blended_normals(&points, &faces);
        let expected = Vector3::new(-1.0, 0.0, 1.0).normalize();
        assert!((smooth[0][1] - expected).length() < 1e-12);
        assert!((smooth[1][0] - expected).length() < 1e-12);
        // Path ends are never blended.
        assert_eq!(smooth[0][0], Vector3::Z);
    }

    #[test]
    fn test_closed_wall_wraps() {
        let wall = Wall {
            points: path(&[(0.0, 0.0, 0.0), (1.0, 0.0, 0.0), (1.0, 0.0, 1.0), (0.0, 0.0, 1.0)]),
            closed: true,
            extrusion: Vector3::Y,
        };
        let mut sink = TriangleCollector::default();
        decompose_wall(&wall, white(), &mut sink);
        assert_eq!(sink.triangles.len(), 8);
    }

    #[test]
    fn test_flat_radial_strip() {
        let strip = RadialStrip {
            inner: path(&[(1.0, 0.0, 0.0), (0.0, 0.0, 1.0)]),
            outer: path(&[(2.0, 0.0, 0.0), (0.0, 0.0, 2.0)]),
            closed: false,
            normal: Vector3::Y,
            thickness: 0.0,
        };
        let mut sink = TriangleCollector::default();
        decompose_radial_strip(&strip, white(), &mut sink);
        assert_eq!(sink.triangles.len(), 2);
        assert!(sink.triangles.iter().all(|t| !t.cull_backfaces));
    }

    #[test]
    fn test_thick_radial_strip_is_closed() {
        let strip = RadialStrip {
            inner: path(&[(1.0, 0.0, 0.0), (0.0, 0.0, 1.0)]),
            outer: path(&[(2.0, 0.0, 0.0), (0.0, 0.0, 2.0)]),
            closed: false,
            normal: Vector3::Y,
            thickness: 0.5,
        };
        let mut sink = TriangleCollector::default();
        decompose_radial_strip(&strip, white(), &mut sink);
        // Bottom, top, two side walls and two end caps.
        assert_eq!(sink.triangles.len(), 12);
        assert!(sink.triangles.iter().all(|t| t.cull_backfaces));

        // Outer side faces away from the inner ring.
        let outer_side = sink
            .triangles
            .iter()
            .find(|t| t.points.iter().all(|p| (Vector3::new(p.x, 0.0, p.z).length() - 2.0).abs() < 1e-9))
            .unwrap();
        assert!(outer_side.normals[0].dot(Vector3::new(1.0, 0.0, 1.0)) > 0.0);
    }

    #[test]
    fn test_rect_thick_line() {
        let mut sink = TriangleCollector::default();
        decompose_thick_line(&line(&[(0.0, 0.0, 0.0), (2.0, 0.0, 0.0)], LineProfile::Rect), white(), &mut sink);

        // Four sides of two triangles, two caps of eight fan triangles.
        assert_eq!(sink.triangles.len(), 8 + 16);
        for p in sink.triangles.iter().flat_map(|t| t.points) {
            assert!(p.y.abs() <= 0.25 + 1e-12);
            assert!(p.z.abs() <= 0.5 + 1e-12);
        }
        // Side faces are flat shaded along the profile axes.
        for tri in &sink.triangles[..8] {
            let n = tri.normals[0];
            assert!(n.x.abs() < 1e-12);
            assert!((n.y.abs() - 1.0).abs() < 1e-12 || (n.z.abs() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_miter_join_meets_offset_edges() {
        let mut sink = TriangleCollector::default();
        let l = line(&[(0.0, 0.0, 0.0), (2.0, 0.0, 0.0), (2.0, 0.0, 2.0)], LineProfile::Rect);
        decompose_thick_line(&l, white(), &mut sink);
        let points: Vec<Vector3> = sink.triangles.iter().flat_map(|t| t.points).collect();
        let near = |target: Vector3| points.iter().any(|p| (*p - target).length() < 1e-9);
        assert!(near(Vector3::new(1.5, 0.25, 0.5)));
        assert!(near(Vector3::new(2.5, -0.25, -0.5)));
    }

    #[test]
    fn test_miter_scale() {
        let along_x = SegmentFrame {
            dir: Vector3::X,
            side: Vector3::Z,
            up: Vector3::Y,
        };
        let along_z = SegmentFrame {
            dir: Vector3::Z,
            side: -Vector3::X,
            up: Vector3::Y,
        };
        let right = Joint::mitered(&along_x, &along_z, 4.0);
        assert!((right.side_scale - 2f64.sqrt()).abs() < 1e-12);
        assert_eq!(right.up_scale, 1.0);

        let dir = Vector3::new(-2.0, 0.0, 0.1).normalize();
        let back = SegmentFrame {
            dir,
            side: dir.cross(Vector3::Y),
            up: Vector3::Y,
        };
        let sharp = Joint::mitered(&along_x, &back, 2.0);
        assert_eq!(sharp.side_scale, 2.0);
    }

    #[test]
    fn test_rounded_profile_radius_is_clamped() {
        let ctx = TessellationContext::default();
        let loop_points = profile_loop(&ctx, 1.0, 0.6, LineProfile::Rounded { radius: 5.0 });
        // Clamped to a third of the thinner side, so flat stretches remain.
        let top = loop_points.iter().filter(|(q, _)| (q.y - 0.3).abs() < 1e-12).count();
        assert!(top >= 2);
        for (q, n) in &loop_points {
            assert!(q.x.abs() <= 0.5 + 1e-12 && q.y.abs() <= 0.3 + 1e-12);
            assert!((n.length() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_closed_radial_strip_wraps_without_end_caps() {
        let strip = RadialStrip {
            inner: path(&[(1.0, 0.0, 0.0), (0.0, 0.0, 1.0), (-1.0, 0.0, 0.0), (0.0, 0.0, -1.0)]),
            outer: path(&[(2.0, 0.0, 0.0), (0.0, 0.0, 2.0), (-2.0, 0.0, 0.0), (0.0, 0.0, -2.0)]),
            closed: true,
            normal: Vector3::Y,
            thickness: 0.5,
        };
        let mut sink = TriangleCollector::default();
        decompose_radial_strip(&strip, white(), &mut sink);
        // Four cells of bottom, top, outer and inner faces; no end caps.
        assert_eq!(sink.triangles.len(), 4 * 8);
        assert_eq!(sink.facets.len(), 3);

        let mut sides = 0;
        for tri in &sink.triangles {
            let n = tri.normals[0];
            if n.y.abs() > 1e-12 {
                continue;
            }
            sides += 1;
            let c = (tri.points[0] + tri.points[1] + tri.points[2]) / 3.0;
            let radial = Vector3::new(c.x, 0.0, c.z);
            if radial.length() > 1.1 {
                assert!(n.dot(radial) > 0.0);
            } else {
                assert!(n.dot(radial) < 0.0);
            }
        }
        assert_eq!(sides, 16);
    }

    #[test]
    fn test_closed_thick_line_has_no_caps() {
        let mut l = line(&[(0.0, 0.0, 0.0), (2.0, 0.0, 0.0), (2.0, 0.0, 2.0), (0.0, 0.0, 2.0)], LineProfile::Rect);
        l.closed = true;
        let mut sink = TriangleCollector::default();
        decompose_thick_line(&l, white(), &mut sink);

        // Four segments of four rectangular faces.
        assert_eq!(sink.triangles.len(), 4 * 8);
        assert_eq!(sink.facets.len(), 1);

        // The first point is mitered against the closing segment.
        let points: Vec<Vector3> = sink.triangles.iter().flat_map(|t| t.points).collect();
        let near = |target: Vector3| points.iter().any(|p| (*p - target).length() < 1e-9);
        assert!(near(Vector3::new(0.5, 0.25, 0.5)));
        assert!(near(Vector3::new(-0.5, -0.25, -0.5)));

        // A repeated closing point is dropped.
        let mut repeated = l.clone();
        repeated.points.push(PathPoint::new(Vector3::ZERO));
        let mut again = TriangleCollector::default();
        decompose_thick_line(&repeated, white(), &mut again);
        assert_eq!(again.triangles.len(), sink.triangles.len());
    }

    #[test]
    fn test_smooth_thick_line_joint_blends_normals() {
        let corner = [(0.0, 0.0, 0.0), (2.0, 0.0, 0.0), (2.0, 0.0, 2.0)];
        let blended = Vector3::new(-1.0, 0.0, 1.0).normalize();
        let has_normal = |sink: &TriangleCollector, target: Vector3| {
            sink.triangles.iter().flat_map(|t| t.normals).any(|n| (n - target).length() < 1e-9)
        };

        let mut sharp = TriangleCollector::default();
        decompose_thick_line(&line(&corner, LineProfile::Rect), white(), &mut sharp);
        assert!(!has_normal(&sharp, blended));

        let mut l = line(&corner, LineProfile::Rect);
        l.points[1].smooth = true;
        let mut smooth = TriangleCollector::default();
        decompose_thick_line(&l, white(), &mut smooth);

        // Two segments of four faces plus two eight-triangle caps either way.
        assert_eq!(smooth.triangles.len(), 16 + 16);
        assert_eq!(sharp.triangles.len(), smooth.triangles.len());
        // Side faces at the joint take the bisecting normal on both segments.
        assert!(has_normal(&smooth, blended));
        assert!(has_normal(&smooth, -blended));
        let at_joint = smooth
            .triangles
            .iter()
            .filter(|t| {
                t.points
                    .iter()
                    .zip(t.normals)
                    .any(|(p, n)| (n - blended).length() < 1e-9 && (p.x - 1.5).abs() < 1e-9 && (p.z - 0.5).abs() < 1e-9)
            })
            .count();
        assert!(at_joint >= 2);
        // Top and bottom faces keep the up axis.
        assert!(has_normal(&smooth, Vector3::Y));
    }

    #[test]
    fn test_rounded_thick_line() {
        let ctx = TessellationContext {
            world_per_pixel: 0.01,
            ..TessellationContext::default()
        };
        let m = profile_loop(&ctx, 1.0, 0.5, LineProfile::Rounded { radius: 0.1 }).len();
        assert!(m >= 12);

        let mut sink = TriangleCollector::new(ctx);
        let l = line(&[(0.0, 0.0, 0.0), (2.0, 0.0, 0.0)], LineProfile::Rounded { radius: 0.1 });
        decompose_thick_line(&l, white(), &mut sink);

        // One quad per profile edge and an m-triangle fan per cap.
        assert_eq!(sink.triangles.len(), 2 * m + 2 * m);
        let sides = &sink.triangles[..2 * m];
        for tri in sides {
            for n in tri.normals {
                assert!((n.length() - 1.0).abs() < 1e-9);
                assert!(n.x.abs() < 1e-9);
            }
        }
        // Corner arcs shade with diagonal normals.
        assert!(sides.iter().flat_map(|t| t.normals).any(|n| n.y.abs() > 0.3 && n.z.abs() > 0.3));
        for p in sink.triangles.iter().flat_map(|t| t.points) {
            assert!(p.y.abs() <= 0.25 + 1e-12);
            assert!(p.z.abs() <= 0.5 + 1e-12);
        }
    }

    #[test]
    fn test_degenerate_lines_emit_nothing() {
        let mut sink = TriangleCollector::default();
        decompose_thick_line(&line(&[(1.0, 1.0, 1.0), (1.0, 1.0, 1.0)], LineProfile::Rect), white(), &mut sink);
        decompose_thick_line(&line(&[], LineProfile::Rect), white(), &mut sink);
        assert!(sink.triangles.is_empty());
    }
}

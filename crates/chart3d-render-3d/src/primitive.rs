//! Geometric chart primitives.
//!
//! Each variant carries only the parameters its decomposer needs. Solids are
//! placed with a [`Placement`]: a base point, an extrusion axis and a reference
//! direction fixing the rotation about that axis.

use chart3d_core::types::{any_perpendicular, unit_or_zero, Vector3};

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Vector3,
    pub max: Vector3,
}

impl BoundingBox {
    pub fn new(min: Vector3, max: Vector3) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    pub fn from_points(points: impl IntoIterator<Item = Vector3>) -> Option<Self> {
        let mut min = Vector3::splat(f64::INFINITY);
        let mut max = Vector3::splat(f64::NEG_INFINITY);
        let mut has_points = false;

        for p in points {
            min = min.min(p);
            max = max.max(p);
            has_points = true;
        }

        has_points.then_some(Self { min, max })
    }

    pub fn size(&self) -> Vector3 {
        self.max - self.min
    }

    pub fn center(&self) -> Vector3 {
        (self.min + self.max) * 0.5
    }

    /// Merge with another bounding box.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn corners(&self) -> [Vector3; 8] {
        let (a, b) = (self.min, self.max);
        [
            Vector3::new(a.x, a.y, a.z),
            Vector3::new(b.x, a.y, a.z),
            Vector3::new(b.x, b.y, a.z),
            Vector3::new(a.x, b.y, a.z),
            Vector3::new(a.x, a.y, b.z),
            Vector3::new(b.x, a.y, b.z),
            Vector3::new(b.x, b.y, b.z),
            Vector3::new(a.x, b.y, b.z),
        ]
    }
}

/// Position and orientation of an extruded solid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Centre of the bottom face.
    pub base: Vector3,
    /// Extrusion direction.
    pub axis: Vector3,
    /// Reference direction for angle zero; projected onto the base plane.
    pub x_dir: Vector3,
}

impl Placement {
    /// Standing on `base`, extruded along +Y, angle zero along +X.
    pub fn upright(base: Vector3) -> Self {
        Self {
            base,
            axis: Vector3::Y,
            x_dir: Vector3::X,
        }
    }

    pub fn new(base: Vector3, axis: Vector3, x_dir: Vector3) -> Self {
        Self { base, axis, x_dir }
    }

    /// Right-handed orthonormal frame `(x, y, z)` with `z` along the axis.
    pub fn frame(&self) -> (Vector3, Vector3, Vector3) {
        let z = match unit_or_zero(self.axis) {
            v if v == Vector3::ZERO => Vector3::Y,
            v => v,
        };
        let x = match unit_or_zero(self.x_dir - z * self.x_dir.dot(z)) {
            v if v == Vector3::ZERO => any_perpendicular(z),
            v => v,
        };
        let y = z.cross(x);
        (x, y, z)
    }

    /// Point at angle `theta`, radii `(rx, ry)` and height `h`.
    pub fn at(&self, theta: f64, rx: f64, ry: f64, h: f64) -> Vector3 {
        let (x, y, z) = self.frame();
        self.base + x * (rx * theta.cos()) + y * (ry * theta.sin()) + z * h
    }
}

/// A path vertex for walls, strips and thick lines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathPoint {
    pub position: Vector3,
    /// Blend the normals of the two segments meeting here.
    pub smooth: bool,
}

impl PathPoint {
    pub fn new(position: Vector3) -> Self {
        Self {
            position,
            smooth: false,
        }
    }

    pub fn smooth(position: Vector3) -> Self {
        Self {
            position,
            smooth: true,
        }
    }
}

/// Elliptic cylinder with optionally rounded rims.
#[derive(Debug, Clone, PartialEq)]
pub struct Cylinder {
    pub placement: Placement,
    pub height: f64,
    pub radius_x: f64,
    pub radius_y: f64,
    pub edge_radius: f64,
}

/// Cone or frustum cut between two fractions of the base-to-apex distance.
#[derive(Debug, Clone, PartialEq)]
pub struct Cone {
    pub placement: Placement,
    /// Base-to-apex distance.
    pub height: f64,
    pub radius_x: f64,
    pub radius_y: f64,
    /// Fraction of the height where the drawn part starts.
    pub from: f64,
    /// Fraction of the height where the drawn part ends.
    pub to: f64,
}

/// Regular n-gon pyramid cut between two fractions of its height.
#[derive(Debug, Clone, PartialEq)]
pub struct Pyramid {
    pub placement: Placement,
    pub height: f64,
    /// Circumradius of the base polygon.
    pub radius: f64,
    pub sides: u32,
    /// Angle of the first corner.
    pub rotation: f64,
    pub from: f64,
    pub to: f64,
}

/// Regular n-gon prism with rounded edges.
#[derive(Debug, Clone, PartialEq)]
pub struct Prism {
    pub placement: Placement,
    pub height: f64,
    /// Circumradius of the cross-section.
    pub radius: f64,
    pub sides: u32,
    pub rotation: f64,
    pub edge_radius: f64,
}

/// Annular wedge with rounded inner and outer rims.
#[derive(Debug, Clone, PartialEq)]
pub struct PieSegment {
    pub placement: Placement,
    pub height: f64,
    /// Zero for a wedge without a hole.
    pub inner_radius: f64,
    pub outer_radius: f64,
    pub start_angle: f64,
    pub sweep: f64,
    pub inner_edge_radius: f64,
    pub outer_edge_radius: f64,
}

/// Ellipsoid, full or a patch of it.
#[derive(Debug, Clone, PartialEq)]
pub struct Ellipsoid {
    pub center: Vector3,
    /// Orientation; `base` is ignored.
    pub orientation: Placement,
    /// Radii along the frame's x, y and axis directions.
    pub radii: Vector3,
    /// Longitude range in radians.
    pub longitude: (f64, f64),
    /// Latitude range in radians, within [-pi/2, pi/2].
    pub latitude: (f64, f64),
}

/// Band between two rings lying in a plane.
#[derive(Debug, Clone, PartialEq)]
pub struct RadialStrip {
    pub inner: Vec<PathPoint>,
    pub outer: Vec<PathPoint>,
    pub closed: bool,
    /// Plane normal; thickness extrudes along it.
    pub normal: Vector3,
    pub thickness: f64,
}

/// Polyline extruded along a vector into a two-sided ribbon.
#[derive(Debug, Clone, PartialEq)]
pub struct Wall {
    pub points: Vec<PathPoint>,
    pub closed: bool,
    /// Offset from the bottom edge to the top edge.
    pub extrusion: Vector3,
}

/// Cross-section swept along a thick line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LineProfile {
    Rect,
    Rounded { radius: f64 },
}

/// Polyline swept with a rectangular or rounded profile.
#[derive(Debug, Clone, PartialEq)]
pub struct ThickLine {
    pub points: Vec<PathPoint>,
    pub closed: bool,
    /// Direction of the profile's thickness axis.
    pub up: Vector3,
    pub width: f64,
    pub thickness: f64,
    pub profile: LineProfile,
}

/// A resolved geometric primitive.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    /// Axis-aligned box between two corners.
    Box { min: Vector3, max: Vector3 },
    Cylinder(Cylinder),
    Cone(Cone),
    Pyramid(Pyramid),
    Prism(Prism),
    PieSegment(PieSegment),
    Ellipsoid(Ellipsoid),
    RadialStrip(RadialStrip),
    Wall(Wall),
    ThickLine(ThickLine),
}

impl Primitive {
    /// Axis-aligned box through two corners.
    pub fn cuboid(a: Vector3, b: Vector3) -> Self {
        Primitive::Box {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Upright circular cylinder.
    pub fn cylinder(base: Vector3, radius: f64, height: f64, edge_radius: f64) -> Self {
        Primitive::Cylinder(Cylinder {
            placement: Placement::upright(base),
            height,
            radius_x: radius,
            radius_y: radius,
            edge_radius,
        })
    }

    /// Sphere marker.
    pub fn sphere(center: Vector3, radius: f64) -> Self {
        Primitive::Ellipsoid(Ellipsoid {
            center,
            orientation: Placement::upright(Vector3::ZERO),
            radii: Vector3::splat(radius),
            longitude: (0.0, std::f64::consts::TAU),
            latitude: (-std::f64::consts::FRAC_PI_2, std::f64::consts::FRAC_PI_2),
        })
    }

    /// Conservative world-space bounds.
    pub fn bounds(&self) -> Option<BoundingBox> {
        match self {
            Primitive::Box { min, max } => Some(BoundingBox::new(*min, *max)),
            Primitive::Cylinder(c) => extrusion_bounds(&c.placement, c.radius_x, c.radius_y, c.height),
            Primitive::Cone(c) => extrusion_bounds(&c.placement, c.radius_x, c.radius_y, c.height),
            Primitive::Pyramid(p) => extrusion_bounds(&p.placement, p.radius, p.radius, p.height),
            Primitive::Prism(p) => extrusion_bounds(&p.placement, p.radius, p.radius, p.height),
            Primitive::PieSegment(p) => {
                extrusion_bounds(&p.placement, p.outer_radius, p.outer_radius, p.height)
            }
            Primitive::Ellipsoid(e) => {
                let (x, y, z) = e.orientation.frame();
                let r = e.radii.abs();
                let half = (x * r.x).abs() + (y * r.y).abs() + (z * r.z).abs();
                Some(BoundingBox::new(e.center - half, e.center + half))
            }
            Primitive::RadialStrip(s) => {
                let offset = unit_or_zero(s.normal) * s.thickness;
                BoundingBox::from_points(
                    s.inner
                        .iter()
                        .chain(s.outer.iter())
                        .flat_map(|p| [p.position, p.position + offset]),
                )
            }
            Primitive::Wall(w) => BoundingBox::from_points(
                w.points
                    .iter()
                    .flat_map(|p| [p.position, p.position + w.extrusion]),
            ),
            Primitive::ThickLine(l) => {
                let pad = Vector3::splat(0.5 * l.width.abs().max(l.thickness.abs()) * 2f64.sqrt());
                BoundingBox::from_points(l.points.iter().map(|p| p.position))
                    .map(|b| BoundingBox::new(b.min - pad, b.max + pad))
            }
        }
    }
}

fn extrusion_bounds(placement: &Placement, rx: f64, ry: f64, height: f64) -> Option<BoundingBox> {
    let (x, y, z) = placement.frame();
    let half = (x * rx).abs() + (y * ry).abs();
    let top = placement.base + z * height;
    BoundingBox::from_points([
        placement.base - half,
        placement.base + half,
        top - half,
        top + half,
    ])
}

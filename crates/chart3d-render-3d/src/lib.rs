//! 3D rendering core for chart primitives.
//!
//! This crate provides:
//! - Chart primitives (boxes, cylinders, cones, pyramids, prisms, pie
//!   segments, ellipsoids, radial strips, walls and thick lines)
//! - Decomposition of primitives into parametric facets and triangles
//! - Lighting normalization and a shading model
//! - A software rasterizer with depth precedence, object tracking and a
//!   bounds-only position test
//! - Drawing boards that texture 2D canvases into the scene
//! - Flat overlays painted after the 3D pass

mod board;
mod decompose;
mod facet;
mod lighting;
mod mapping;
mod overlay;
mod primitive;
mod raster;
mod renderer;
mod ribbon;
mod scene;
mod tessellation;

pub use board::DrawingBoard;
pub use decompose::{decompose, effective_edge_radius, pie_edge_radii};
pub use facet::{
    ConeBand, CylinderSegment, EllipsoidPatch, FacetDomain, FacetKind, Flipped, ParametricFacet,
    TorusSegment,
};
pub use lighting::{normalize_lights, Lighting, NormalizedLight};
pub use mapping::{CameraMapping, Mapping, Projection};
pub use overlay::{OverlayItem, OverlayQueue};
pub use primitive::{
    BoundingBox, Cone, Cylinder, Ellipsoid, LineProfile, PathPoint, PieSegment, Placement, Primitive,
    Prism, Pyramid, RadialStrip, ThickLine, Wall,
};
pub use raster::{Frame, FrameStats, ObjectIndex, Rasterizer};
pub use renderer::{RenderRequest, Renderer};
pub use ribbon::{decompose_radial_strip, decompose_thick_line, decompose_wall};
pub use scene::{NodeId, SceneGraph, SceneNode};
pub use tessellation::{
    circle_subdivisions, tessellate, tessellate_with, TessellationContext, Triangle, TriangleCollector,
    TriangleSink,
};

pub use chart3d_core::{Color, LightSource, PixelRect, RenderError, RenderOptions, SurfaceColor, Vector3};

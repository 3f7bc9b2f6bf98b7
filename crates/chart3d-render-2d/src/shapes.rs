//! Shape tessellation for 2D rendering.

use glam::Vec2;
use lyon::geom::point;
use lyon::path::Path;
use lyon::tessellation::{
    BuffersBuilder, FillOptions, FillTessellator, FillVertex, StrokeOptions, StrokeTessellator,
    StrokeVertex, VertexBuffers,
};

use crate::primitives::{LineCap, LineJoin, PathCommand, Stroke};

/// Tessellated triangles in image space.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub vertices: Vec<Vec2>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Iterate the triangles as vertex triples.
    pub fn triangles(&self) -> impl Iterator<Item = [Vec2; 3]> + '_ {
        self.indices.chunks_exact(3).filter_map(|tri| {
            Some([
                *self.vertices.get(tri[0] as usize)?,
                *self.vertices.get(tri[1] as usize)?,
                *self.vertices.get(tri[2] as usize)?,
            ])
        })
    }

    fn append(&mut self, buffers: VertexBuffers<Vec2, u32>) {
        let base = self.vertices.len() as u32;
        self.vertices.extend(buffers.vertices);
        self.indices.extend(buffers.indices.iter().map(|i| i + base));
    }
}

/// Tessellator for converting shapes to meshes.
pub struct Tessellator {
    fill_tessellator: FillTessellator,
    stroke_tessellator: StrokeTessellator,
}

impl Default for Tessellator {
    fn default() -> Self {
        Self::new()
    }
}

impl Tessellator {
    pub fn new() -> Self {
        Self {
            fill_tessellator: FillTessellator::new(),
            stroke_tessellator: StrokeTessellator::new(),
        }
    }

    /// Tessellate an axis-aligned rectangle.
    pub fn tessellate_rect(&mut self, x: f32, y: f32, width: f32, height: f32, mesh: &mut Mesh) {
        let base = mesh.vertices.len() as u32;

        mesh.vertices.push(Vec2::new(x, y));
        mesh.vertices.push(Vec2::new(x + width, y));
        mesh.vertices.push(Vec2::new(x + width, y + height));
        mesh.vertices.push(Vec2::new(x, y + height));

        mesh.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    /// Tessellate a filled ellipse.
    pub fn tessellate_ellipse(&mut self, center: Vec2, rx: f32, ry: f32, mesh: &mut Mesh) {
        let mut builder = Path::builder();
        builder.add_ellipse(
            point(center.x, center.y),
            lyon::geom::vector(rx, ry),
            lyon::geom::Angle::zero(),
            lyon::path::Winding::Positive,
        );
        self.tessellate_fill(&builder.build(), mesh);
    }

    /// Tessellate the interior of a path.
    pub fn tessellate_fill(&mut self, path: &Path, mesh: &mut Mesh) {
        let mut buffers: VertexBuffers<Vec2, u32> = VertexBuffers::new();

        let result = self.fill_tessellator.tessellate_path(
            path,
            &FillOptions::default(),
            &mut BuffersBuilder::new(&mut buffers, |vertex: FillVertex| {
                Vec2::new(vertex.position().x, vertex.position().y)
            }),
        );

        match result {
            Ok(()) => mesh.append(buffers),
            Err(err) => log::trace!("fill tessellation failed: {err:?}"),
        }
    }

    /// Tessellate the outline of a path.
    pub fn tessellate_stroke(&mut self, path: &Path, stroke: &Stroke, mesh: &mut Mesh) {
        let mut buffers: VertexBuffers<Vec2, u32> = VertexBuffers::new();

        let options = StrokeOptions::default()
            .with_line_width(stroke.width)
            .with_line_cap(convert_line_cap(stroke.line_cap))
            .with_line_join(convert_line_join(stroke.line_join));

        let result = self.stroke_tessellator.tessellate_path(
            path,
            &options,
            &mut BuffersBuilder::new(&mut buffers, |vertex: StrokeVertex| {
                Vec2::new(vertex.position().x, vertex.position().y)
            }),
        );

        match result {
            Ok(()) => mesh.append(buffers),
            Err(err) => log::trace!("stroke tessellation failed: {err:?}"),
        }
    }
}

/// Build a lyon path from commands.
///
/// Returns `None` when the commands contain no drawable segment. A `LineTo`
/// without an open sub-path starts one at that point, and a `MoveTo` inside an
/// open sub-path ends it first.
pub fn build_path_from_commands(commands: &[PathCommand]) -> Option<Path> {
    let mut builder = Path::builder();
    let mut open = false;
    let mut segments = 0usize;

    for cmd in commands {
        match *cmd {
            PathCommand::MoveTo(p) => {
                if open {
                    builder.end(false);
                }
                builder.begin(point(p.x, p.y));
                open = true;
            }
            PathCommand::LineTo(p) => {
                if open {
                    builder.line_to(point(p.x, p.y));
                    segments += 1;
                } else {
                    builder.begin(point(p.x, p.y));
                    open = true;
                }
            }
            PathCommand::QuadTo { control, end } => {
                if open {
                    builder.quadratic_bezier_to(point(control.x, control.y), point(end.x, end.y));
                    segments += 1;
                } else {
                    builder.begin(point(end.x, end.y));
                    open = true;
                }
            }
            PathCommand::CubicTo {
                control1,
                control2,
                end,
            } => {
                if open {
                    builder.cubic_bezier_to(
                        point(control1.x, control1.y),
                        point(control2.x, control2.y),
                        point(end.x, end.y),
                    );
                    segments += 1;
                } else {
                    builder.begin(point(end.x, end.y));
                    open = true;
                }
            }
            PathCommand::Close => {
                if open {
                    builder.close();
                    open = false;
                }
            }
        }
    }

    if open {
        builder.end(false);
    }

    (segments > 0).then(|| builder.build())
}

fn convert_line_cap(cap: LineCap) -> lyon::tessellation::LineCap {
    match cap {
        LineCap::Butt => lyon::tessellation::LineCap::Butt,
        LineCap::Round => lyon::tessellation::LineCap::Round,
        LineCap::Square => lyon::tessellation::LineCap::Square,
    }
}

fn convert_line_join(join: LineJoin) -> lyon::tessellation::LineJoin {
    match join {
        LineJoin::Miter => lyon::tessellation::LineJoin::Miter,
        LineJoin::Round => lyon::tessellation::LineJoin::Round,
        LineJoin::Bevel => lyon::tessellation::LineJoin::Bevel,
    }
}

//! Drawing primitives for the 2D canvas.
//!
//! All coordinates are in image space: pixels, origin at the top-left corner,
//! y growing downwards.

use chart3d_core::types::Color;
use glam::Vec2;

/// Path command for building paths.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    MoveTo(Vec2),
    LineTo(Vec2),
    QuadTo { control: Vec2, end: Vec2 },
    CubicTo { control1: Vec2, control2: Vec2, end: Vec2 },
    Close,
}

/// A path built from commands.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathPrimitive {
    pub commands: Vec<PathCommand>,
}

impl PathPrimitive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn move_to(mut self, x: f32, y: f32) -> Self {
        self.commands.push(PathCommand::MoveTo(Vec2::new(x, y)));
        self
    }

    pub fn line_to(mut self, x: f32, y: f32) -> Self {
        self.commands.push(PathCommand::LineTo(Vec2::new(x, y)));
        self
    }

    pub fn quad_to(mut self, cx: f32, cy: f32, x: f32, y: f32) -> Self {
        self.commands.push(PathCommand::QuadTo {
            control: Vec2::new(cx, cy),
            end: Vec2::new(x, y),
        });
        self
    }

    pub fn close(mut self) -> Self {
        self.commands.push(PathCommand::Close);
        self
    }

    /// A closed polygon through `points`.
    pub fn polygon(points: &[Vec2]) -> Self {
        let mut commands = Vec::with_capacity(points.len() + 1);
        for (i, p) in points.iter().enumerate() {
            commands.push(if i == 0 {
                PathCommand::MoveTo(*p)
            } else {
                PathCommand::LineTo(*p)
            });
        }
        if !points.is_empty() {
            commands.push(PathCommand::Close);
        }
        Self { commands }
    }
}

/// Stroke style.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub color: Color,
    pub width: f32,
    pub line_cap: LineCap,
    pub line_join: LineJoin,
}

impl Stroke {
    pub fn new(color: Color, width: f32) -> Self {
        Self {
            color,
            width,
            line_cap: LineCap::Butt,
            line_join: LineJoin::Miter,
        }
    }

    pub fn with_cap(mut self, cap: LineCap) -> Self {
        self.line_cap = cap;
        self
    }

    pub fn with_join(mut self, join: LineJoin) -> Self {
        self.line_join = join;
        self
    }
}

/// Line cap style.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

/// Line join style.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LineJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

/// Horizontal placement of text relative to its anchor point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextAnchor {
    #[default]
    Start,
    Middle,
    End,
}

/// A text primitive.
///
/// `(x, y)` is the anchor point; `y` is the top of the glyph cell.
#[derive(Debug, Clone, PartialEq)]
pub struct TextPrimitive {
    pub x: f32,
    pub y: f32,
    pub text: String,
    pub font_size: f32,
    pub color: Color,
    pub anchor: TextAnchor,
}

impl TextPrimitive {
    pub fn new(x: f32, y: f32, text: impl Into<String>) -> Self {
        Self {
            x,
            y,
            text: text.into(),
            font_size: 14.0,
            color: Color::BLACK,
            anchor: TextAnchor::Start,
        }
    }

    pub fn with_font_size(mut self, size: f32) -> Self {
        self.font_size = size;
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn with_anchor(mut self, anchor: TextAnchor) -> Self {
        self.anchor = anchor;
        self
    }
}

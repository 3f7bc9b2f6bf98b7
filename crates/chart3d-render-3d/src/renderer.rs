//! Frame renderer: runs one scene through lighting, rasterization, drawing
//! boards and overlays.

use chart3d_core::config::RenderOptions;
use chart3d_core::types::{LightSource, PixelRect, Vector3};
use chart3d_core::RenderError;
use image::RgbaImage;

use crate::board::DrawingBoard;
use crate::decompose::decompose;
use crate::lighting::{normalize_lights, Lighting};
use crate::mapping::Mapping;
use crate::overlay::OverlayQueue;
use crate::raster::{Frame, Rasterizer};
use crate::scene::SceneGraph;

/// Per-frame inputs beside the scene and mapping.
#[derive(Default)]
pub struct RenderRequest<'a> {
    pub lights: Vec<LightSource>,
    pub boards: Vec<DrawingBoard>,
    pub overlays: OverlayQueue,
    pub background: Option<&'a RgbaImage>,
}

impl<'a> RenderRequest<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_light(mut self, light: LightSource) -> Self {
        self.lights.push(light);
        self
    }

    pub fn with_lights(mut self, lights: impl IntoIterator<Item = LightSource>) -> Self {
        self.lights.extend(lights);
        self
    }

    pub fn with_board(mut self, board: DrawingBoard) -> Self {
        self.boards.push(board);
        self
    }

    pub fn with_overlays(mut self, overlays: OverlayQueue) -> Self {
        self.overlays = overlays;
        self
    }

    pub fn with_background(mut self, background: &'a RgbaImage) -> Self {
        self.background = Some(background);
        self
    }
}

/// Renders scenes with a fixed set of options.
#[derive(Debug, Clone)]
pub struct Renderer {
    options: RenderOptions,
}

impl Renderer {
    pub fn new(options: RenderOptions) -> Result<Self, RenderError> {
        options.validate()?;
        Ok(Self { options })
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Create a drawing board for a frame seen through `mapping`.
    pub fn create_board(&self, mapping: &dyn Mapping, origin: Vector3, edge_x: Vector3, edge_y: Vector3) -> DrawingBoard {
        DrawingBoard::new(mapping, &self.options, origin, edge_x, edge_y)
    }

    /// Render one frame.
    pub fn render(&self, scene: &SceneGraph, mapping: &dyn Mapping, request: RenderRequest<'_>) -> Result<Frame, RenderError> {
        let mut raster = Rasterizer::new(mapping, &self.options)?;
        raster.start_frame(normalize_lights(&request.lights));
        draw_scene(&mut raster, scene);

        for board in request.boards {
            board.finalize(&mut raster);
        }

        let Frame { image, objects, stats } = raster.end_frame(request.background);
        let image = if request.overlays.is_empty() {
            image
        } else {
            request.overlays.paint(image)
        };
        Ok(Frame { image, objects, stats })
    }

    /// Screen rectangle the scene would cover, without shading anything.
    pub fn measure(&self, scene: &SceneGraph, mapping: &dyn Mapping) -> Result<Option<PixelRect>, RenderError> {
        let options = self.options.clone().with_object_tracking(false);
        let mut raster = Rasterizer::new(mapping, &options)?;
        raster.start_frame(Lighting::default());
        raster.set_position_test_mode(true);
        draw_scene(&mut raster, scene);
        Ok(raster.position_bounds())
    }
}

/// Decompose every primitive in insertion order, tagging pixels with its node.
fn draw_scene(raster: &mut Rasterizer<'_>, scene: &SceneGraph) {
    for (id, node) in scene.iter() {
        let Some(primitive) = &node.primitive else {
            continue;
        };
        raster.set_active_object(Some(id));
        decompose(primitive, &node.color, raster);
    }
    raster.set_active_object(None);
}

//! Flat overlays painted on top of the finished 3D frame.

use chart3d_render_2d::{Canvas, Stroke, TextPrimitive};
use glam::Vec2;
use image::RgbaImage;

/// A 2D annotation in final image coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayItem {
    Text(TextPrimitive),
    Line { from: Vec2, to: Vec2, stroke: Stroke },
}

/// Overlays queued during the 3D pass; later items paint over earlier ones.
#[derive(Debug, Clone, Default)]
pub struct OverlayQueue {
    items: Vec<OverlayItem>,
}

impl OverlayQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: OverlayItem) {
        self.items.push(item);
    }

    pub fn push_text(&mut self, label: TextPrimitive) {
        self.push(OverlayItem::Text(label));
    }

    pub fn push_line(&mut self, from: Vec2, to: Vec2, stroke: Stroke) {
        self.push(OverlayItem::Line { from, to, stroke });
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &OverlayItem> {
        self.items.iter()
    }

    /// Paint every item onto `image` in queue order, consuming the queue.
    pub fn paint(self, image: RgbaImage) -> RgbaImage {
        let mut canvas = Canvas::from_image(image);
        for item in self.items {
            match item {
                OverlayItem::Text(label) => canvas.draw_text(&label),
                OverlayItem::Line { from, to, stroke } => canvas.stroke_line(from, to, &stroke),
            }
        }
        canvas.into_image()
    }
}

impl Extend<OverlayItem> for OverlayQueue {
    fn extend<I: IntoIterator<Item = OverlayItem>>(&mut self, iter: I) {
        self.items.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chart3d_core::types::Color;

    #[test]
    fn test_later_items_paint_on_top() {
        let mut queue = OverlayQueue::new();
        queue.push_line(Vec2::new(10.0, 20.0), Vec2::new(30.0, 20.0), Stroke::new(Color::rgb(1.0, 0.0, 0.0), 4.0));
        queue.push_line(Vec2::new(20.0, 10.0), Vec2::new(20.0, 30.0), Stroke::new(Color::rgb(0.0, 0.0, 1.0), 4.0));
        assert_eq!(queue.len(), 2);

        let image = queue.paint(RgbaImage::new(40, 40));
        assert_eq!(image.get_pixel(20, 20).0, [0, 0, 255, 255]);
        assert_eq!(image.get_pixel(12, 20).0, [255, 0, 0, 255]);
        assert_eq!(image.get_pixel(2, 2).0, [0, 0, 0, 0]);
    }

    #[test]
    fn test_text_overlay() {
        let mut queue = OverlayQueue::new();
        queue.push_text(TextPrimitive::new(2.0, 2.0, "8").with_color(Color::WHITE));
        let image = queue.paint(RgbaImage::new(20, 20));
        assert!(image.pixels().any(|p| p.0 == [255, 255, 255, 255]));
    }
}

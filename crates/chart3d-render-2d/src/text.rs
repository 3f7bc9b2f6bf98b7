//! Built-in 5x7 bitmap font.
//!
//! Lowercase letters render with the uppercase glyphs; characters without a
//! glyph render as `?`.

/// Glyph cell width in font units.
pub const GLYPH_WIDTH: u32 = 5;
/// Glyph cell height in font units.
pub const GLYPH_HEIGHT: u32 = 7;
/// Horizontal advance per character, including spacing.
pub const GLYPH_ADVANCE: u32 = GLYPH_WIDTH + 1;

/// A rasterized line of text as a coverage mask.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextBitmap {
    pub width: u32,
    pub height: u32,
    /// Row-major, one byte per pixel, 0 or 255.
    pub coverage: Vec<u8>,
}

impl TextBitmap {
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn get(&self, x: u32, y: u32) -> u8 {
        if x >= self.width || y >= self.height {
            return 0;
        }
        self.coverage[(y * self.width + x) as usize]
    }
}

/// Integer glyph scale for a font size in pixels.
pub fn scale_for_size(font_size: f32) -> u32 {
    if !font_size.is_finite() {
        return 1;
    }
    ((font_size / GLYPH_HEIGHT as f32).round() as u32).max(1)
}

/// Largest bitmap [`rasterize`] will allocate, in pixels.
pub const MAX_BITMAP_PIXELS: u64 = 1 << 24;

/// Size in pixels of `text` at `scale`, saturating on overflow.
pub fn measure(text: &str, scale: u32) -> (u64, u64) {
    let n = text.chars().count() as u64;
    if n == 0 {
        return (0, 0);
    }
    let scale = u64::from(scale);
    (
        (n * u64::from(GLYPH_ADVANCE) - 1).saturating_mul(scale),
        u64::from(GLYPH_HEIGHT) * scale,
    )
}

/// Rasterize a single line of text.
///
/// Returns an empty bitmap when the result would exceed
/// [`MAX_BITMAP_PIXELS`]; use [`for_each_covered`] to draw such text clipped.
pub fn rasterize(text: &str, scale: u32) -> TextBitmap {
    let scale = scale.max(1);
    let (width, height) = measure(text, scale);
    if width == 0 || width.saturating_mul(height) > MAX_BITMAP_PIXELS {
        return TextBitmap::default();
    }
    // Both fit in u32 since their product is below the pixel limit.
    let (width, height) = (width as u32, height as u32);

    let mut coverage = vec![0u8; (width * height) as usize];
    for_each_covered(text, scale, (0, 0), (width, height), |x, y| {
        coverage[(y * width + x) as usize] = 255;
    });

    TextBitmap {
        width,
        height,
        coverage,
    }
}

/// Visit every covered pixel of `text` drawn with its top-left corner at
/// `origin`, restricted to the `width x height` area starting at zero.
///
/// Work is bounded by the visible area, not by the size of the text.
pub fn for_each_covered(
    text: &str,
    scale: u32,
    origin: (i64, i64),
    (width, height): (u32, u32),
    mut visit: impl FnMut(u32, u32),
) {
    let scale = i64::from(scale.max(1));
    let (width, height) = (i64::from(width), i64::from(height));
    let advance = i64::from(GLYPH_ADVANCE).saturating_mul(scale);

    let mut glyph_x = origin.0;
    for ch in text.chars() {
        if glyph_x >= width {
            break;
        }
        let glyph_right = glyph_x.saturating_add(i64::from(GLYPH_WIDTH).saturating_mul(scale));
        if glyph_right > 0 {
            for (row, bits) in glyph(ch).iter().enumerate() {
                let top = origin.1.saturating_add(row as i64 * scale);
                let (y0, y1) = (top.max(0), top.saturating_add(scale).min(height));
                if y0 >= y1 {
                    continue;
                }
                for col in 0..GLYPH_WIDTH {
                    if bits & (0x10 >> col) == 0 {
                        continue;
                    }
                    let left = glyph_x.saturating_add(i64::from(col) * scale);
                    let (x0, x1) = (left.max(0), left.saturating_add(scale).min(width));
                    for y in y0..y1 {
                        for x in x0..x1 {
                            visit(x as u32, y as u32);
                        }
                    }
                }
            }
        }
        glyph_x = glyph_x.saturating_add(advance);
    }
}

/// Rows of a glyph, top to bottom, bit 4 is the leftmost column.
fn glyph(ch: char) -> [u8; 7] {
    match ch.to_ascii_uppercase() {
        ' ' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00],
        '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        'A' => [0x0E, 0x11, 0x11, 0x11, 0x1F, 0x11, 0x11],
        'B' => [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E],
        'C' => [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E],
        'D' => [0x1C, 0x12, 0x11, 0x11, 0x11, 0x12, 0x1C],
        'E' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F],
        'F' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10],
        'G' => [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F],
        'H' => [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'I' => [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E],
        'J' => [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C],
        'K' => [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11],
        'L' => [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F],
        'M' => [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11],
        'N' => [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11],
        'O' => [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'P' => [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10],
        'Q' => [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D],
        'R' => [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11],
        'S' => [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E],
        'T' => [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04],
        'U' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'V' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04],
        'W' => [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A],
        'X' => [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11],
        'Y' => [0x11, 0x11, 0x11, 0x0A, 0x04, 0x04, 0x04],
        'Z' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F],
        '.' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C],
        ',' => [0x00, 0x00, 0x00, 0x00, 0x0C, 0x04, 0x08],
        '-' => [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00],
        '+' => [0x00, 0x04, 0x04, 0x1F, 0x04, 0x04, 0x00],
        '%' => [0x18, 0x19, 0x02, 0x04, 0x08, 0x13, 0x03],
        ':' => [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x0C, 0x00],
        '/' => [0x00, 0x01, 0x02, 0x04, 0x08, 0x10, 0x00],
        '(' => [0x02, 0x04, 0x08, 0x08, 0x08, 0x04, 0x02],
        ')' => [0x08, 0x04, 0x02, 0x02, 0x02, 0x04, 0x08],
        '\'' => [0x0C, 0x04, 0x08, 0x00, 0x00, 0x00, 0x00],
        '!' => [0x04, 0x04, 0x04, 0x04, 0x00, 0x00, 0x04],
        '=' => [0x00, 0x00, 0x1F, 0x00, 0x1F, 0x00, 0x00],
        '$' => [0x04, 0x0F, 0x14, 0x0E, 0x05, 0x1E, 0x04],
        '#' => [0x0A, 0x0A, 0x1F, 0x0A, 0x1F, 0x0A, 0x0A],
        '*' => [0x00, 0x04, 0x15, 0x0E, 0x15, 0x04, 0x00],
        '_' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x1F],
        '<' => [0x02, 0x04, 0x08, 0x10, 0x08, 0x04, 0x02],
        '>' => [0x08, 0x04, 0x02, 0x01, 0x02, 0x04, 0x08],
        _ => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x00, 0x04],
    }
}

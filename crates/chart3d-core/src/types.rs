//! Core value types for the chart3d engine.

use glam::DVec3;

/// A 3D vector of doubles. Value type; all arithmetic comes from `glam`.
pub type Vector3 = DVec3;

/// Normalize `v`, mapping a zero-length vector to zero instead of NaN.
#[inline]
pub fn unit_or_zero(v: Vector3) -> Vector3 {
    let len = v.length();
    if len > 1e-12 {
        v / len
    } else {
        Vector3::ZERO
    }
}

/// A unit vector orthogonal to `v`.
///
/// The helper axis is the world axis least aligned with `v`, so the cross
/// product never degenerates. Returns `X` for a zero vector.
pub fn any_perpendicular(v: Vector3) -> Vector3 {
    let a = v.abs();
    let helper = if a.x <= a.y && a.x <= a.z {
        Vector3::X
    } else if a.y <= a.z {
        Vector3::Y
    } else {
        Vector3::Z
    };
    let p = unit_or_zero(v.cross(helper));
    if p == Vector3::ZERO {
        Vector3::X
    } else {
        p
    }
}

/// A color value.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Create from 8-bit RGB values.
    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::from_rgba8(r, g, b, 255)
    }

    /// Create from 8-bit RGBA values.
    pub fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
            a: a as f32 / 255.0,
        }
    }

    /// Create from hex string (e.g., "#FF5733" or "FF5733CC").
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
        match hex.len() {
            6 => Some(Self::from_rgb8(channel(0)?, channel(2)?, channel(4)?)),
            8 => Some(Self::from_rgba8(
                channel(0)?,
                channel(2)?,
                channel(4)?,
                channel(6)?,
            )),
            _ => None,
        }
    }

    /// Convert to 8-bit RGBA, rounding to the nearest step.
    pub fn to_rgba8(&self) -> [u8; 4] {
        [
            channel_to_u8(self.r),
            channel_to_u8(self.g),
            channel_to_u8(self.b),
            channel_to_u8(self.a),
        ]
    }

    /// Same color with a different alpha.
    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    /// Linear interpolation between two colors.
    pub fn lerp(self, other: Color, t: f32) -> Self {
        Self {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
            a: self.a + (other.a - self.a) * t,
        }
    }

    // Common colors
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    pub const TRANSPARENT: Self = Self::rgba(0.0, 0.0, 0.0, 0.0);
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

#[inline]
fn channel_to_u8(c: f32) -> u8 {
    (c.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// The lit appearance of a surface.
///
/// `color` carries alpha and the diffuse RGB. The specular exponent is stored as
/// its natural logarithm so that interpolating between two surfaces behaves.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SurfaceColor {
    /// Alpha and diffuse color.
    pub color: Color,
    /// Specular reflection coefficient in [0, 1].
    pub reflection: f32,
    /// Natural log of the specular exponent.
    pub log_sharpness: f32,
}

impl SurfaceColor {
    /// A matte surface.
    pub fn new(color: Color) -> Self {
        Self {
            color,
            reflection: 0.0,
            log_sharpness: 0.0,
        }
    }

    /// Set the specular reflection coefficient.
    pub fn with_reflection(mut self, reflection: f32) -> Self {
        self.reflection = reflection.clamp(0.0, 1.0);
        self
    }

    /// Set the specular exponent.
    pub fn with_sharpness(mut self, exponent: f32) -> Self {
        self.log_sharpness = exponent.max(1.0).ln();
        self
    }

    /// The specular exponent.
    pub fn sharpness(&self) -> f64 {
        (self.log_sharpness as f64).exp()
    }

    pub fn alpha(&self) -> f32 {
        self.color.a
    }
}

impl Default for SurfaceColor {
    fn default() -> Self {
        Self::new(Color::rgb(0.8, 0.8, 0.8))
    }
}

impl From<Color> for SurfaceColor {
    fn from(color: Color) -> Self {
        Self::new(color)
    }
}

/// A light descriptor supplied by the scene configuration.
///
/// `direction` is the direction the light travels; it is ignored for ambient
/// lights. Negative intensities count as zero.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LightSource {
    pub direction: Vector3,
    pub intensity: f64,
    pub ambient: bool,
}

impl LightSource {
    /// Create a directional light.
    pub fn directional(direction: Vector3, intensity: f64) -> Self {
        Self {
            direction,
            intensity,
            ambient: false,
        }
    }

    /// Create an ambient light.
    pub fn ambient(intensity: f64) -> Self {
        Self {
            direction: Vector3::ZERO,
            intensity,
            ambient: true,
        }
    }

    /// Intensity with negative values treated as zero.
    pub fn effective_intensity(&self) -> f64 {
        if self.intensity.is_finite() {
            self.intensity.max(0.0)
        } else {
            0.0
        }
    }
}

/// An inclusive rectangle of pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PixelRect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl PixelRect {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left: left.min(right),
            top: top.min(bottom),
            right: left.max(right),
            bottom: top.max(bottom),
        }
    }

    /// A rectangle covering a single pixel.
    pub fn point(x: i32, y: i32) -> Self {
        Self::new(x, y, x, y)
    }

    pub fn width(&self) -> i32 {
        self.right - self.left + 1
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top + 1
    }

    /// Smallest rectangle containing both.
    pub fn union(&self, other: &PixelRect) -> PixelRect {
        PixelRect {
            left: self.left.min(other.left),
            top: self.top.min(other.top),
            right: self.right.max(other.right),
            bottom: self.bottom.max(other.bottom),
        }
    }

    /// Grow to include a pixel.
    pub fn include(&mut self, x: i32, y: i32) {
        self.left = self.left.min(x);
        self.top = self.top.min(y);
        self.right = self.right.max(x);
        self.bottom = self.bottom.max(y);
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.left && x <= self.right && y >= self.top && y <= self.bottom
    }
}

/// Grow an optional rectangle to include another.
pub fn union_rect(acc: Option<PixelRect>, rect: PixelRect) -> Option<PixelRect> {
    Some(match acc {
        Some(r) => r.union(&rect),
        None => rect,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_from_hex() {
        let c = Color::from_hex("#FF8000").unwrap();
        assert_eq!(c.to_rgba8(), [255, 128, 0, 255]);

        let c = Color::from_hex("00000080").unwrap();
        assert_eq!(c.to_rgba8()[3], 128);

        assert!(Color::from_hex("#12").is_none());
        assert!(Color::from_hex("zzzzzz").is_none());
    }

    #[test]
    fn test_color_rgb8_roundtrip_is_exact() {
        for v in [0u8, 1, 77, 128, 254, 255] {
            let c = Color::from_rgb8(v, v, v);
            assert_eq!(c.to_rgba8(), [v, v, v, 255]);
        }
    }

    #[test]
    fn test_surface_sharpness_is_logarithmic() {
        let s = SurfaceColor::default().with_sharpness(32.0);
        assert!((s.log_sharpness - 32.0f32.ln()).abs() < 1e-6);
        assert!((s.sharpness() - 32.0).abs() < 1e-3);

        let s = SurfaceColor::default().with_reflection(3.0);
        assert_eq!(s.reflection, 1.0);
    }

    #[test]
    fn test_any_perpendicular() {
        for v in [
            Vector3::X,
            Vector3::new(0.0, 0.0, -3.0),
            Vector3::new(1.0, 1.0, 1.0),
            Vector3::new(1e-3, 5.0, 0.0),
        ] {
            let p = any_perpendicular(v);
            assert!(p.dot(v).abs() < 1e-9);
            assert!((p.length() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_unit_or_zero() {
        assert_eq!(unit_or_zero(Vector3::ZERO), Vector3::ZERO);
        assert!((unit_or_zero(Vector3::new(3.0, 4.0, 0.0)).length() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_light_intensity_clamped() {
        assert_eq!(LightSource::ambient(-2.0).effective_intensity(), 0.0);
        assert_eq!(LightSource::ambient(f64::NAN).effective_intensity(), 0.0);
        assert_eq!(LightSource::directional(Vector3::Z, 0.5).effective_intensity(), 0.5);
    }

    #[test]
    fn test_pixel_rect() {
        let mut r = PixelRect::new(5, 5, 1, 2);
        assert_eq!((r.left, r.top, r.right, r.bottom), (1, 2, 5, 5));
        assert_eq!(r.width(), 5);
        r.include(10, 0);
        assert!(r.contains(10, 0));
        assert_eq!(r.height(), 6);

        let u = union_rect(None, PixelRect::point(3, 3));
        assert_eq!(u, Some(PixelRect::point(3, 3)));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn pixel_rect() -> impl Strategy<Value = PixelRect> {
            (-1000i32..1000, -1000i32..1000, -1000i32..1000, -1000i32..1000)
                .prop_map(|(l, t, r, b)| PixelRect::new(l, t, r, b))
        }

        proptest! {
            #[test]
            fn test_union_contains_both_rects(a in pixel_rect(), b in pixel_rect()) {
                let u = a.union(&b);
                for r in [a, b] {
                    prop_assert!(u.contains(r.left, r.top));
                    prop_assert!(u.contains(r.right, r.bottom));
                }
                prop_assert!(u.width() >= a.width().max(b.width()));
                prop_assert_eq!(union_rect(Some(a), b), Some(u));
                prop_assert_eq!(b.union(&a), u);
            }

            #[test]
            fn test_rgba8_roundtrip(r in any::<u8>(), g in any::<u8>(), b in any::<u8>(), a in any::<u8>()) {
                prop_assert_eq!(Color::from_rgba8(r, g, b, a).to_rgba8(), [r, g, b, a]);
            }

            #[test]
            fn test_to_rgba8_clamps(r in -10.0f32..10.0, g in -10.0f32..10.0, a in -10.0f32..10.0) {
                let clamped = Color::rgba(r.clamp(0.0, 1.0), g.clamp(0.0, 1.0), 0.0, a.clamp(0.0, 1.0));
                prop_assert_eq!(Color::rgba(r, g, 0.0, a).to_rgba8(), clamped.to_rgba8());
                if r >= 1.0 {
                    prop_assert_eq!(clamped.to_rgba8()[0], 255);
                }
            }

            #[test]
            fn test_any_perpendicular_is_unit_and_orthogonal(
                x in -100.0f64..100.0,
                y in -100.0f64..100.0,
                z in -100.0f64..100.0,
            ) {
                let v = Vector3::new(x, y, z);
                prop_assume!(v.length() > 1e-6);
                let p = any_perpendicular(v);
                prop_assert!((p.length() - 1.0).abs() < 1e-9);
                prop_assert!(p.dot(v).abs() < 1e-9 * v.length());
            }
        }
    }
}

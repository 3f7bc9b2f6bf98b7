//! Light normalization and surface shading.

use chart3d_core::types::{any_perpendicular, unit_or_zero, Color, LightSource, SurfaceColor, Vector3};

/// A directional light prepared for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedLight {
    /// Direction the light travels.
    pub direction: Vector3,
    /// Fraction of the total supplied intensity carried by this light.
    pub share: f64,
    /// Intensity used for shading, after the resultant rescale.
    pub intensity: f64,
    /// Orthonormal frame; `frame[2]` points toward the light.
    pub frame: [Vector3; 3],
}

impl NormalizedLight {
    fn new(direction: Vector3, share: f64) -> Self {
        let direction = unit_or_zero(direction);
        let w = -direction;
        let u = any_perpendicular(w);
        let v = w.cross(u);
        Self {
            direction,
            share,
            intensity: share,
            frame: [u, v, w],
        }
    }

    /// Unit vector from a surface toward the light.
    #[inline]
    pub fn to_light(&self) -> Vector3 {
        self.frame[2]
    }

    /// Express `v` in the light's local frame.
    #[inline]
    pub fn local(&self, v: Vector3) -> Vector3 {
        Vector3::new(v.dot(self.frame[0]), v.dot(self.frame[1]), v.dot(self.frame[2]))
    }
}

/// The per-frame light set: an ambient coefficient plus directional lights.
#[derive(Debug, Clone, PartialEq)]
pub struct Lighting {
    /// Ambient coefficient in [0, 1].
    pub ambient: f64,
    pub lights: Vec<NormalizedLight>,
}

impl Default for Lighting {
    /// A single ambient light of intensity 1.
    fn default() -> Self {
        Self {
            ambient: 1.0,
            lights: Vec::new(),
        }
    }
}

/// Normalize a light list for one frame.
///
/// Every light is first divided by the total intensity, so the ambient
/// coefficient and the directional shares add up to one. The directional
/// intensities are then rescaled so that their vector resultant has length
/// `1 - ambient`. An empty or all-dark list is replaced by one ambient light.
pub fn normalize_lights(sources: &[LightSource]) -> Lighting {
    if sources.is_empty() {
        log::warn!("no lights supplied, using a default ambient light");
        return Lighting::default();
    }

    let total: f64 = sources.iter().map(|l| l.effective_intensity()).sum();
    if total <= 0.0 || !total.is_finite() {
        log::warn!("lights carry no intensity, using a default ambient light");
        return Lighting::default();
    }

    let mut ambient = 0.0;
    let mut lights = Vec::new();
    for source in sources {
        let share = source.effective_intensity() / total;
        if source.ambient {
            ambient += share;
        } else {
            lights.push(NormalizedLight::new(source.direction, share));
        }
    }
    let ambient = ambient.clamp(0.0, 1.0);

    let resultant: Vector3 = lights.iter().map(|l| l.direction * l.share).sum();
    let s = resultant.length();
    if s > 1e-12 {
        let k = (1.0 - ambient) / s;
        for light in &mut lights {
            light.intensity = light.share * k;
        }
    }

    Lighting { ambient, lights }
}

impl Lighting {
    /// Sum of the ambient coefficient and the directional shares.
    pub fn total_share(&self) -> f64 {
        self.ambient + self.lights.iter().map(|l| l.share).sum::<f64>()
    }

    /// Shade a surface point.
    ///
    /// `normal` must face the viewer side being drawn and `view` points from the
    /// surface toward the eye; both are unit vectors.
    pub fn shade(&self, surface: &SurfaceColor, normal: Vector3, view: Vector3) -> Color {
        let mut diffuse = self.ambient;
        let mut specular = 0.0;
        let exponent = surface.sharpness();
        let reflection = surface.reflection as f64;

        for light in &self.lights {
            let local = light.local(normal);
            let n_dot_l = local.z;
            if n_dot_l <= 0.0 {
                continue;
            }
            diffuse += light.intensity * n_dot_l;

            if reflection > 0.0 {
                let half = unit_or_zero(light.to_light() + view);
                let n_dot_h = normal.dot(half).max(0.0);
                specular += light.intensity * n_dot_h.powf(exponent);
            }
        }

        let diffuse = diffuse as f32;
        let specular = (reflection * specular) as f32;
        let c = surface.color;
        Color::rgba(
            (c.r * diffuse + specular).clamp(0.0, 1.0),
            (c.g * diffuse + specular).clamp(0.0, 1.0),
            (c.b * diffuse + specular).clamp(0.0, 1.0),
            c.a,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_list_gets_default_ambient() {
        let lighting = normalize_lights(&[]);
        assert_eq!(lighting.ambient, 1.0);
        assert!(lighting.lights.is_empty());
    }

    #[test]
    fn test_ambient_and_directional_shares() {
        let lighting = normalize_lights(&[
            LightSource::ambient(1.0),
            LightSource::directional(Vector3::new(0.0, -1.0, 0.0), 3.0),
        ]);
        assert!((lighting.ambient - 0.25).abs() < 1e-12);
        assert!((lighting.total_share() - 1.0).abs() < 1e-12);
        assert!((lighting.lights[0].intensity - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_resultant_rescale() {
        let lighting = normalize_lights(&[
            LightSource::directional(Vector3::X, 1.0),
            LightSource::directional(Vector3::Y, 1.0),
        ]);
        let resultant: Vector3 = lighting
            .lights
            .iter()
            .map(|l| l.direction * l.intensity)
            .sum();
        assert!((resultant.length() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_negative_intensity_ignored() {
        let lighting = normalize_lights(&[
            LightSource::ambient(-5.0),
            LightSource::ambient(2.0),
        ]);
        assert!((lighting.ambient - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_light_frame_is_orthonormal() {
        let light = NormalizedLight::new(Vector3::new(1.0, -2.0, 0.5), 1.0);
        let [u, v, w] = light.frame;
        assert!(u.dot(v).abs() < 1e-12);
        assert!(u.dot(w).abs() < 1e-12);
        assert!((w.length() - 1.0).abs() < 1e-12);
        assert!((light.local(w).z - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_shade_ambient_only_is_exact() {
        let lighting = Lighting::default();
        let surface = SurfaceColor::new(Color::from_rgb8(200, 100, 50));
        let c = lighting.shade(&surface, Vector3::Z, Vector3::Z);
        assert_eq!(c.to_rgba8(), [200, 100, 50, 255]);
    }

    #[test]
    fn test_shade_facing_away_gets_ambient_only() {
        let lighting = normalize_lights(&[
            LightSource::ambient(1.0),
            LightSource::directional(Vector3::new(0.0, 0.0, -1.0), 1.0),
        ]);
        let surface = SurfaceColor::new(Color::WHITE);
        let lit = lighting.shade(&surface, Vector3::Z, Vector3::Z);
        let dark = lighting.shade(&surface, -Vector3::Z, Vector3::Z);
        assert!((lit.r - 1.0).abs() < 1e-6);
        assert!((dark.r - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_specular_adds_white() {
        let lighting = normalize_lights(&[LightSource::directional(-Vector3::Z, 1.0)]);
        let matte = SurfaceColor::new(Color::rgb(0.2, 0.0, 0.0));
        let shiny = matte.with_reflection(0.5).with_sharpness(10.0);
        let a = lighting.shade(&matte, Vector3::Z, Vector3::Z);
        let b = lighting.shade(&shiny, Vector3::Z, Vector3::Z);
        assert!(b.g > a.g);
        assert!((b.g - 0.5).abs() < 1e-6);
    }
}

//! Render configuration.

use crate::errors::RenderError;
use crate::types::Color;

/// Options shared by every frame a renderer produces.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RenderOptions {
    /// Output raster width in pixels.
    pub width: u32,
    /// Output raster height in pixels.
    pub height: u32,
    /// Keep a per-pixel object id buffer for hit-testing.
    pub track_objects: bool,
    /// Drawing board standoff from its parent surface, in pixels.
    pub board_lift_px: f64,
    /// Largest side of a drawing board bitmap.
    pub max_board_size: u32,
    /// Maximum miter scale at thick-line joins.
    pub miter_limit: f64,
    /// Upper bound on recommended facet subdivisions.
    pub max_subdivisions: u32,
    /// Canvas colour used when no background image is supplied.
    pub clear_color: Color,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            track_objects: false,
            board_lift_px: 0.75,
            max_board_size: 1024,
            miter_limit: 4.0,
            max_subdivisions: 256,
            clear_color: Color::TRANSPARENT,
        }
    }
}

impl RenderOptions {
    /// Options for a raster of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_object_tracking(mut self, track: bool) -> Self {
        self.track_objects = track;
        self
    }

    pub fn with_board_lift(mut self, pixels: f64) -> Self {
        self.board_lift_px = pixels.max(0.0);
        self
    }

    pub fn with_max_board_size(mut self, size: u32) -> Self {
        self.max_board_size = size.max(1);
        self
    }

    pub fn with_miter_limit(mut self, limit: f64) -> Self {
        self.miter_limit = limit.max(1.0);
        self
    }

    pub fn with_max_subdivisions(mut self, n: u32) -> Self {
        self.max_subdivisions = n.max(1);
        self
    }

    pub fn with_clear_color(mut self, color: Color) -> Self {
        self.clear_color = color;
        self
    }

    /// Check the options describe a usable raster.
    pub fn validate(&self) -> Result<(), RenderError> {
        if self.width == 0 || self.height == 0 {
            return Err(RenderError::InvalidTargetSize {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }
}

/// Check a rendering precision reported by a mapping.
pub fn validate_precision(precision: f64) -> Result<f64, RenderError> {
    if precision.is_finite() && precision > 0.0 {
        Ok(precision)
    } else {
        Err(RenderError::InvalidPrecision { precision })
    }
}

//! Error types for the chart3d engine.

use thiserror::Error;

/// Errors surfaced by the rendering entry points.
///
/// Degenerate geometry never shows up here; it is skipped while rendering.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RenderError {
    #[error("Invalid render target size {width}x{height}")]
    InvalidTargetSize { width: u32, height: u32 },

    #[error("Rendering precision must be a positive number of pixels, got {precision}")]
    InvalidPrecision { precision: f64 },

    #[error("Path has no drawable segments")]
    EmptyPath,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = RenderError::InvalidTargetSize { width: 0, height: 10 };
        assert_eq!(err.to_string(), "Invalid render target size 0x10");

        let err = RenderError::InvalidPrecision { precision: -1.0 };
        assert!(err.to_string().contains("-1"));
    }
}

//! Core types for the chart3d rendering engine.
//!
//! This crate provides the foundational types shared by the 2D and 3D renderers:
//! - Vector helpers on top of `glam::DVec3`
//! - Colors and lit surface colors
//! - Light sources and pixel rectangles
//! - Render configuration
//! - Error types

pub mod config;
pub mod errors;
pub mod types;

pub use config::*;
pub use errors::*;
pub use types::*;

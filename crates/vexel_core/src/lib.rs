//! Vexel Core
//!
//! Foundational value types for the Vexel rendering stack:
//!
//! - **Color**: f32 RGBA with HSL construction and interpolation
//! - **Transform**: 2x3 affine matrices with a full operation set
//! - **Geometry**: points, rects, bounds, and the scalar helpers the
//!   tessellation pipeline leans on
//!
//! This crate is a leaf: everything here is plain data shared between the
//! renderer, its backends, and external collaborators.

pub mod color;
pub mod geometry;
pub mod transform;

pub use color::Color;
pub use geometry::{Bounds, Point, Rect};
pub use transform::Transform;

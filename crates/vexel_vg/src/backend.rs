//! The rendering backend boundary
//!
//! The renderer tessellates into [`Vertex`] buffers and hands them to a
//! [`RenderBackend`] together with the paint, scissor, and composite state
//! needed to draw them. Backends own all GPU resources; the renderer only
//! holds [`ImageId`] handles.

use bitflags::bitflags;
use bytemuck::{Pod, Zeroable};
use thiserror::Error;
use vexel_core::Bounds;

use crate::paint::{CompositeState, Paint};
use crate::state::Scissor;

/// Handle to a backend-owned texture
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ImageId(pub u32);

/// Pixel layout of a texture
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextureKind {
    /// Single-channel coverage (glyph atlases)
    Alpha,
    /// Four-channel color
    Rgba,
}

bitflags! {
    /// Texture creation flags
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct ImageFlags: u32 {
        /// Generate mipmaps during creation
        const GENERATE_MIPMAPS = 1 << 0;
        /// Repeat in x
        const REPEAT_X = 1 << 1;
        /// Repeat in y
        const REPEAT_Y = 1 << 2;
        /// Flip texture vertically when rendered
        const FLIP_Y = 1 << 3;
        /// Pixel data has premultiplied alpha
        const PREMULTIPLIED = 1 << 4;
        /// Sample with nearest-neighbor interpolation
        const NEAREST = 1 << 5;
    }
}

/// A tessellated vertex: device-space position plus the (u, v) pair the
/// fragment stage uses for anti-aliasing coverage or texture sampling.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub x: f32,
    pub y: f32,
    pub u: f32,
    pub v: f32,
}

impl Vertex {
    pub const fn new(x: f32, y: f32, u: f32, v: f32) -> Self {
        Self { x, y, u, v }
    }
}

/// A contiguous run of vertices inside the frame vertex buffer
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VertexRange {
    pub offset: usize,
    pub len: usize,
}

impl VertexRange {
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Slice `verts` down to this range
    pub fn slice<'a>(&self, verts: &'a [Vertex]) -> &'a [Vertex] {
        &verts[self.offset..self.offset + self.len]
    }
}

/// One tessellated sub-path, as handed to the backend.
///
/// `fill` is a triangle fan, `stroke` a triangle strip; either may be absent.
#[derive(Clone, Copy, Debug, Default)]
pub struct DrawPath {
    pub fill: Option<VertexRange>,
    pub stroke: Option<VertexRange>,
    /// Single convex fill that can be drawn without stenciling
    pub convex: bool,
}

/// Backend startup failure, surfaced from [`crate::Context::new`]
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Backend initialization failed: {0}")]
    InitFailed(String),

    #[error("Texture allocation failed")]
    TextureAllocation,
}

/// The renderer-to-GPU contract.
///
/// All methods are synchronous. Draw calls receive the shared frame vertex
/// buffer and per-path ranges into it; backends must not retain the slices
/// past the call.
pub trait RenderBackend {
    /// Whether the backend wants anti-aliasing fringes tessellated
    fn edge_anti_alias(&self) -> bool;

    /// One-time initialization (shader/pipeline setup)
    fn create(&mut self) -> Result<(), BackendError>;

    /// Creates a texture, returning `None` on allocation failure.
    /// `data` may be absent to allocate uninitialized storage.
    fn create_texture(
        &mut self,
        kind: TextureKind,
        width: u32,
        height: u32,
        flags: ImageFlags,
        data: Option<&[u8]>,
    ) -> Option<ImageId>;

    fn delete_texture(&mut self, image: ImageId) -> bool;

    /// Uploads a sub-rectangle. `data` covers the full texture; backends
    /// offset into it by row.
    fn update_texture(
        &mut self,
        image: ImageId,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        data: &[u8],
    ) -> bool;

    fn texture_size(&self, image: ImageId) -> Option<(u32, u32)>;

    /// Frame viewport in logical pixels plus the device pixel ratio
    fn viewport(&mut self, width: f32, height: f32, device_pixel_ratio: f32);

    /// Drop everything queued this frame without drawing
    fn cancel(&mut self);

    /// Submit everything queued this frame
    fn flush(&mut self);

    #[allow(clippy::too_many_arguments)]
    fn fill(
        &mut self,
        paint: &Paint,
        composite: CompositeState,
        scissor: &Scissor,
        fringe: f32,
        bounds: Bounds,
        paths: &[DrawPath],
        verts: &[Vertex],
    );

    #[allow(clippy::too_many_arguments)]
    fn stroke(
        &mut self,
        paint: &Paint,
        composite: CompositeState,
        scissor: &Scissor,
        fringe: f32,
        stroke_width: f32,
        paths: &[DrawPath],
        verts: &[Vertex],
    );

    /// Textured triangle list (text quads)
    fn triangles(
        &mut self,
        paint: &Paint,
        composite: CompositeState,
        scissor: &Scissor,
        verts: &[Vertex],
        fringe: f32,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_is_pod() {
        // The backend uploads vertex slices byte-for-byte.
        let verts = [Vertex::new(1.0, 2.0, 0.5, 1.0), Vertex::new(3.0, 4.0, 0.0, 0.0)];
        let bytes: &[u8] = bytemuck::cast_slice(&verts);
        assert_eq!(bytes.len(), 2 * 4 * std::mem::size_of::<f32>());
    }

    #[test]
    fn test_vertex_range_slice() {
        let verts = [
            Vertex::default(),
            Vertex::new(1.0, 0.0, 0.0, 0.0),
            Vertex::new(2.0, 0.0, 0.0, 0.0),
        ];
        let range = VertexRange { offset: 1, len: 2 };
        let s = range.slice(&verts);
        assert_eq!(s.len(), 2);
        assert_eq!(s[0].x, 1.0);
    }
}

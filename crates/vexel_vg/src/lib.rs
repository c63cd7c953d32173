//! Immediate-mode 2D vector graphics
//!
//! The crate renders anti-aliased paths, gradients, images, and text by
//! tessellating everything into triangles and handing them to a
//! [`RenderBackend`] implementation. Nothing here touches the GPU; the
//! backend and the [`GlyphRasterizer`] are supplied by the embedder.
//!
//! The drawing model is a per-frame loop:
//!
//! ```ignore
//! ctx.begin_frame(width, height, dpr);
//! ctx.begin_path();
//! ctx.rounded_rect(10.0, 10.0, 200.0, 100.0, 8.0);
//! ctx.fill_color(Color::rgb(0.2, 0.4, 0.8));
//! ctx.fill();
//! ctx.end_frame();
//! ```
//!
//! All coordinates are in user units with y pointing down; the current
//! transform maps them to device pixels.

mod backend;
mod cache;
mod context;
mod expand;
mod paint;
mod state;
mod text;

pub use backend::{
    BackendError, DrawPath, ImageFlags, ImageId, RenderBackend, TextureKind, Vertex, VertexRange,
};
pub use context::{Context, ContextError, FrameStats, KAPPA90};
pub use paint::{BlendFactor, CompositeOperation, CompositeState, Paint};
pub use state::{LineCap, LineJoin, Scissor, State, Winding};
pub use text::{
    Align, BitmapRequest, FontId, FontState, GlyphPosition, GlyphQuad, GlyphRasterizer, HAlign,
    ShapedGlyph, TextMetrics, TextRow, VAlign,
};

pub use vexel_core::{Bounds, Color, Point, Rect, Transform};

//! Recording test doubles for the backend and the glyph rasterizer

#![allow(dead_code)]

use std::collections::HashMap;

use vexel_vg::{
    BitmapRequest, Bounds, CompositeState, Context, DrawPath, FontId, FontState, GlyphQuad,
    GlyphRasterizer, ImageFlags, ImageId, Paint, RenderBackend, Scissor, ShapedGlyph, TextMetrics,
    TextureKind, Vertex,
};

/// One recorded `fill` call
#[derive(Clone)]
pub struct FillCall {
    pub paint: Paint,
    pub scissor: Scissor,
    pub bounds: Bounds,
    pub paths: Vec<DrawPath>,
    pub verts: Vec<Vertex>,
}

/// One recorded `stroke` call
#[derive(Clone)]
pub struct StrokeCall {
    pub paint: Paint,
    pub stroke_width: f32,
    pub paths: Vec<DrawPath>,
    pub verts: Vec<Vertex>,
}

/// One recorded `triangles` call
#[derive(Clone)]
pub struct TriangleCall {
    pub paint: Paint,
    pub verts: Vec<Vertex>,
}

/// Backend that records every draw call and models textures as sizes
#[derive(Default)]
pub struct MockBackend {
    pub edge_aa: bool,
    next_image: u32,
    pub textures: HashMap<u32, (TextureKind, u32, u32)>,
    pub fills: Vec<FillCall>,
    pub strokes: Vec<StrokeCall>,
    pub triangles: Vec<TriangleCall>,
    pub updates: Vec<(ImageId, u32, u32, u32, u32)>,
    pub flushes: usize,
    pub cancels: usize,
    pub viewport: (f32, f32, f32),
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            edge_aa: true,
            ..Default::default()
        }
    }

    pub fn without_antialias() -> Self {
        Self {
            edge_aa: false,
            ..Default::default()
        }
    }
}

impl RenderBackend for MockBackend {
    fn edge_anti_alias(&self) -> bool {
        self.edge_aa
    }

    fn create(&mut self) -> Result<(), vexel_vg::BackendError> {
        Ok(())
    }

    fn create_texture(
        &mut self,
        kind: TextureKind,
        width: u32,
        height: u32,
        _flags: ImageFlags,
        _data: Option<&[u8]>,
    ) -> Option<ImageId> {
        self.next_image += 1;
        self.textures.insert(self.next_image, (kind, width, height));
        Some(ImageId(self.next_image))
    }

    fn delete_texture(&mut self, image: ImageId) -> bool {
        self.textures.remove(&image.0).is_some()
    }

    fn update_texture(
        &mut self,
        image: ImageId,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        _data: &[u8],
    ) -> bool {
        if !self.textures.contains_key(&image.0) {
            return false;
        }
        self.updates.push((image, x, y, width, height));
        true
    }

    fn texture_size(&self, image: ImageId) -> Option<(u32, u32)> {
        self.textures.get(&image.0).map(|&(_, w, h)| (w, h))
    }

    fn viewport(&mut self, width: f32, height: f32, device_pixel_ratio: f32) {
        self.viewport = (width, height, device_pixel_ratio);
    }

    fn cancel(&mut self) {
        self.cancels += 1;
    }

    fn flush(&mut self) {
        self.flushes += 1;
    }

    fn fill(
        &mut self,
        paint: &Paint,
        _composite: CompositeState,
        scissor: &Scissor,
        _fringe: f32,
        bounds: Bounds,
        paths: &[DrawPath],
        verts: &[Vertex],
    ) {
        self.fills.push(FillCall {
            paint: *paint,
            scissor: *scissor,
            bounds,
            paths: paths.to_vec(),
            verts: verts.to_vec(),
        });
    }

    fn stroke(
        &mut self,
        paint: &Paint,
        _composite: CompositeState,
        _scissor: &Scissor,
        _fringe: f32,
        stroke_width: f32,
        paths: &[DrawPath],
        verts: &[Vertex],
    ) {
        self.strokes.push(StrokeCall {
            paint: *paint,
            stroke_width,
            paths: paths.to_vec(),
            verts: verts.to_vec(),
        });
    }

    fn triangles(
        &mut self,
        paint: &Paint,
        _composite: CompositeState,
        _scissor: &Scissor,
        verts: &[Vertex],
        _fringe: f32,
    ) {
        self.triangles.push(TriangleCall {
            paint: *paint,
            verts: verts.to_vec(),
        });
    }
}

/// Monospace fake rasterizer.
///
/// Every glyph advances `size * 0.5` plus letter spacing; whitespace shapes
/// without a quad. The atlas fits one glyph per 64x64 cell and nothing is
/// cached, so the initial 512x512 atlas overflows after 64 shaped glyphs.
pub struct MockRasterizer {
    fonts: Vec<String>,
    fallbacks: Vec<(FontId, FontId)>,
    state: Option<FontState>,
    atlas: (u32, u32),
    atlas_used: usize,
    atlas_pixels: Vec<u8>,
    dirty: bool,
}

impl Default for MockRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRasterizer {
    pub fn new() -> Self {
        Self {
            fonts: Vec::new(),
            fallbacks: Vec::new(),
            state: None,
            atlas: (0, 0),
            atlas_used: 0,
            atlas_pixels: Vec::new(),
            dirty: false,
        }
    }

    fn size(&self) -> f32 {
        self.state.map_or(16.0, |s| s.size)
    }

    fn advance(&self) -> f32 {
        let spacing = self.state.map_or(0.0, |s| s.letter_spacing);
        self.size() * 0.5 + spacing
    }

    fn atlas_capacity(&self) -> usize {
        ((self.atlas.0 / 64) * (self.atlas.1 / 64)) as usize
    }
}

impl GlyphRasterizer for MockRasterizer {
    fn add_font_mem(&mut self, name: &str, data: Vec<u8>) -> Option<FontId> {
        if data.is_empty() {
            return None;
        }
        self.fonts.push(name.to_string());
        Some(FontId(self.fonts.len() as u32 - 1))
    }

    fn font_by_name(&self, name: &str) -> Option<FontId> {
        self.fonts
            .iter()
            .position(|f| f == name)
            .map(|i| FontId(i as u32))
    }

    fn add_fallback(&mut self, base: FontId, fallback: FontId) -> bool {
        self.fallbacks.push((base, fallback));
        true
    }

    fn reset_fallbacks(&mut self, base: FontId) {
        self.fallbacks.retain(|&(b, _)| b != base);
    }

    fn set_state(&mut self, state: &FontState) {
        self.state = Some(*state);
    }

    fn vert_metrics(&mut self) -> TextMetrics {
        let size = self.size();
        TextMetrics {
            ascender: size * 0.8,
            descender: -size * 0.2,
            line_height: size,
        }
    }

    fn line_bounds(&mut self, y: f32) -> (f32, f32) {
        let size = self.size();
        let min_y = y - size * 0.8;
        (min_y, min_y + size)
    }

    fn glyph(
        &mut self,
        codepoint: char,
        _prev: Option<char>,
        x: f32,
        y: f32,
        bitmap: BitmapRequest,
    ) -> Option<ShapedGlyph> {
        let next_x = x + self.advance();
        if codepoint.is_whitespace() || codepoint == '\u{00a0}' {
            return Some(ShapedGlyph { quad: None, next_x });
        }

        if bitmap == BitmapRequest::Required {
            if self.atlas_used >= self.atlas_capacity() {
                return None;
            }
            self.atlas_used += 1;
            self.dirty = true;
        }

        let size = self.size();
        Some(ShapedGlyph {
            quad: Some(GlyphQuad {
                x0: x,
                y0: y - size * 0.8,
                x1: x + size * 0.5,
                y1: y + size * 0.2,
                s0: 0.0,
                t0: 0.0,
                s1: 1.0,
                t1: 1.0,
            }),
            next_x,
        })
    }

    fn take_dirty_rect(&mut self) -> Option<[u32; 4]> {
        if !self.dirty {
            return None;
        }
        self.dirty = false;
        Some([0, 0, self.atlas.0, self.atlas.1])
    }

    fn atlas_data(&self) -> &[u8] {
        &self.atlas_pixels
    }

    fn atlas_size(&self) -> (u32, u32) {
        self.atlas
    }

    fn reset_atlas(&mut self, width: u32, height: u32) {
        self.atlas = (width, height);
        self.atlas_used = 0;
        self.atlas_pixels = vec![0; (width * height) as usize];
        self.dirty = false;
    }
}

/// A ready-to-draw context over the mocks, with a frame already begun
pub fn test_context() -> Context<MockBackend> {
    let mut ctx = Context::new(MockBackend::new(), Box::new(MockRasterizer::new()))
        .expect("context creation");
    ctx.begin_frame(800.0, 600.0, 1.0);
    ctx
}

/// Context with a font registered and selected
pub fn text_context() -> Context<MockBackend> {
    let mut ctx = test_context();
    let font = ctx
        .create_font_mem("sans", vec![0u8; 4])
        .expect("font registration");
    ctx.font_face(font);
    ctx
}

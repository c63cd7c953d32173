//! Text layout and rendering
//!
//! Glyph shaping and atlas packing live behind the [`GlyphRasterizer`]
//! trait; this module owns everything above it: alignment, line breaking,
//! quad emission, and the font-atlas growth protocol.
//!
//! Font sizes and positions are in user units. Internally they are scaled
//! by the current transform's average scale (quantized, capped at 4x) times
//! the device pixel ratio, so glyphs are rasterized near their on-screen
//! size.

use tracing::warn;
use vexel_core::geometry::quantize;
use vexel_core::Bounds;

use crate::backend::{RenderBackend, Vertex};
use crate::context::Context;
use crate::state::State;

pub(crate) const INIT_FONT_ATLAS_SIZE: u32 = 512;
pub(crate) const MAX_FONT_ATLAS_SIZE: u32 = 2048;
pub(crate) const MAX_FONT_IMAGES: usize = 4;

/// Handle to a font registered with the glyph rasterizer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FontId(pub u32);

/// Horizontal text alignment, relative to the anchor point
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Vertical text alignment, relative to the anchor point
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum VAlign {
    Top,
    Middle,
    Bottom,
    #[default]
    Baseline,
}

/// Combined text alignment
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Align {
    pub h: HAlign,
    pub v: VAlign,
}

impl Align {
    pub const fn new(h: HAlign, v: VAlign) -> Self {
        Self { h, v }
    }
}

/// Shaping parameters, in device pixels
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FontState {
    pub font: FontId,
    pub size: f32,
    pub blur: f32,
    pub letter_spacing: f32,
}

/// Whether a shaped glyph must have atlas coverage.
///
/// Measurement passes use `Optional` so they never touch the atlas.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BitmapRequest {
    Optional,
    Required,
}

/// One glyph's screen rectangle and atlas coordinates, in device pixels
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlyphQuad {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
    pub s0: f32,
    pub t0: f32,
    pub s1: f32,
    pub t1: f32,
}

/// A shaped glyph: quad (if any) plus the advanced pen position.
///
/// Whitespace typically advances without a quad.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShapedGlyph {
    pub quad: Option<GlyphQuad>,
    pub next_x: f32,
}

/// Vertical font metrics. In device pixels from the rasterizer, in user
/// units from [`Context::text_metrics`]. The descender is negative.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextMetrics {
    pub ascender: f32,
    pub descender: f32,
    pub line_height: f32,
}

/// One laid-out row of text, with byte offsets into the measured string
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextRow {
    /// First byte of the row
    pub start: usize,
    /// One past the last byte of the row, trailing white space excluded
    pub end: usize,
    /// First byte of the next row
    pub next: usize,
    /// Logical advance of the row
    pub width: f32,
    /// Geometric left edge; can differ from 0 due to bearings
    pub min_x: f32,
    /// Geometric right edge; can differ from `width` due to bearings
    pub max_x: f32,
}

/// Caret metrics for one glyph of a measured string
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlyphPosition {
    /// Byte offset of the glyph in the measured string
    pub byte_index: usize,
    /// Logical pen position of the glyph
    pub x: f32,
    /// Left edge of the glyph shape
    pub min_x: f32,
    /// Right edge of the glyph shape
    pub max_x: f32,
}

/// Glyph shaping and atlas packing, provided by the embedder.
///
/// The rasterizer owns a single-channel coverage atlas. `glyph` returns
/// `None` when the glyph cannot be shaped, which with
/// [`BitmapRequest::Required`] includes a full atlas; the context then
/// flushes, grows the atlas, and retries once.
pub trait GlyphRasterizer {
    /// Registers a font face from font file data, returning a handle.
    /// Returns `None` when the data cannot be parsed.
    fn add_font_mem(&mut self, name: &str, data: Vec<u8>) -> Option<FontId>;

    /// Looks a registered font up by name
    fn font_by_name(&self, name: &str) -> Option<FontId>;

    /// Chains `fallback` after `base` for codepoints `base` misses
    fn add_fallback(&mut self, base: FontId, fallback: FontId) -> bool;

    /// Removes all fallbacks chained to `base`
    fn reset_fallbacks(&mut self, base: FontId);

    /// Sets the shaping parameters used by the calls below
    fn set_state(&mut self, state: &FontState);

    /// Vertical metrics for the current state, in device pixels
    fn vert_metrics(&mut self) -> TextMetrics;

    /// Vertical extent `(min_y, max_y)` of a line whose baseline is at `y`
    fn line_bounds(&mut self, y: f32) -> (f32, f32);

    /// Shapes one codepoint at pen position `(x, y)`. `prev` is the
    /// previous codepoint of the run, for kerning.
    fn glyph(
        &mut self,
        codepoint: char,
        prev: Option<char>,
        x: f32,
        y: f32,
        bitmap: BitmapRequest,
    ) -> Option<ShapedGlyph>;

    /// Atlas region rasterized since the last call, as `[x0, y0, x1, y1]`
    fn take_dirty_rect(&mut self) -> Option<[u32; 4]>;

    /// The full atlas coverage data, one byte per pixel, row-major
    fn atlas_data(&self) -> &[u8];

    /// Current atlas dimensions
    fn atlas_size(&self) -> (u32, u32);

    /// Discards all packed glyphs and restarts with an empty atlas
    fn reset_atlas(&mut self, width: u32, height: u32);
}

/// Character class driving the line breaker
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CharClass {
    Space,
    Newline,
    Char,
    /// CJK characters break as words on their own
    CjkChar,
}

fn classify(c: char, prev: u32) -> CharClass {
    let cp = c as u32;
    match cp {
        // \t \v \f space nbsp
        0x09 | 0x0b | 0x0c | 0x20 | 0x00a0 => CharClass::Space,
        // \n, unless it terminates a \r\n pair
        0x0a => {
            if prev == 0x0d {
                CharClass::Space
            } else {
                CharClass::Newline
            }
        }
        // \r, unless it follows \n
        0x0d => {
            if prev == 0x0a {
                CharClass::Space
            } else {
                CharClass::Newline
            }
        }
        // NEL
        0x0085 => CharClass::Newline,
        0x4E00..=0x9FFF
        | 0x3000..=0x30FF
        | 0xFF00..=0xFFEF
        | 0x1100..=0x11FF
        | 0x3130..=0x318F
        | 0xAC00..=0xD7AF => CharClass::CjkChar,
        _ => CharClass::Char,
    }
}

/// Rasterization scale for the given state, before the device pixel ratio
fn font_scale(state: &State) -> f32 {
    quantize(state.xform.average_scale(), 0.01).min(4.0)
}

impl<B: RenderBackend> Context<B> {
    /// Pushes the current text style to the rasterizer. Returns the device
    /// scale and its inverse, or `None` when no font face is set.
    fn set_font_state(&mut self) -> Option<(f32, f32)> {
        let state = *self.state();
        let font = state.font?;
        let scale = font_scale(&state) * self.device_px_ratio;
        self.rasterizer.set_state(&FontState {
            font,
            size: state.font_size * scale,
            blur: state.font_blur * scale,
            letter_spacing: state.letter_spacing * scale,
        });
        Some((scale, 1.0 / scale))
    }

    /// Advance of a run in device pixels, without touching the atlas
    fn measure_run(&mut self, text: &str) -> f32 {
        let mut pen = 0.0;
        let mut prev = None;
        for ch in text.chars() {
            if let Some(g) = self
                .rasterizer
                .glyph(ch, prev, pen, 0.0, BitmapRequest::Optional)
            {
                pen = g.next_x;
            }
            prev = Some(ch);
        }
        pen
    }

    /// Horizontal anchor offset in device pixels for the given run
    fn h_align_offset(&mut self, align: HAlign, text: &str) -> f32 {
        match align {
            HAlign::Left => 0.0,
            HAlign::Center => -self.measure_run(text) * 0.5,
            HAlign::Right => -self.measure_run(text),
        }
    }

    /// Vertical anchor offset in device pixels
    fn v_align_offset(&mut self, align: VAlign) -> f32 {
        let m = self.rasterizer.vert_metrics();
        match align {
            VAlign::Top => m.ascender,
            VAlign::Middle => (m.ascender + m.descender) * 0.5,
            VAlign::Bottom => m.descender,
            VAlign::Baseline => 0.0,
        }
    }

    /// Uploads the dirty atlas region to the current font texture
    fn flush_text_texture(&mut self) {
        let Some([x0, y0, x1, y1]) = self.rasterizer.take_dirty_rect() else {
            return;
        };
        let Some(image) = self.font_images[self.font_image_idx] else {
            return;
        };
        let data = self.rasterizer.atlas_data();
        self.backend
            .update_texture(image, x0, y0, x1 - x0, y1 - y0, data);
    }

    /// Switches to the next, larger atlas texture. The chain is capped in
    /// count and size; returns false once exhausted.
    fn alloc_text_atlas(&mut self) -> bool {
        self.flush_text_texture();

        if self.font_image_idx >= MAX_FONT_IMAGES - 1 {
            return false;
        }

        let (iw, ih) = match self.font_images[self.font_image_idx + 1] {
            // A previous frame already grew this far; reuse its texture.
            Some(image) => match self.backend.texture_size(image) {
                Some(size) => size,
                None => return false,
            },
            None => {
                let (mut iw, mut ih) = self.rasterizer.atlas_size();
                if iw > ih {
                    ih *= 2;
                } else {
                    iw *= 2;
                }
                if iw > MAX_FONT_ATLAS_SIZE || ih > MAX_FONT_ATLAS_SIZE {
                    iw = MAX_FONT_ATLAS_SIZE;
                    ih = MAX_FONT_ATLAS_SIZE;
                }
                let Some(image) = self.backend.create_texture(
                    crate::backend::TextureKind::Alpha,
                    iw,
                    ih,
                    crate::backend::ImageFlags::empty(),
                    None,
                ) else {
                    warn!(width = iw, height = ih, "font atlas texture allocation failed");
                    return false;
                };
                self.font_images[self.font_image_idx + 1] = Some(image);
                (iw, ih)
            }
        };

        self.font_image_idx += 1;
        self.rasterizer.reset_atlas(iw, ih);
        true
    }

    /// Draws the pending glyph quads with the fill paint over the atlas
    fn render_text(&mut self) {
        let state = *self.state();
        let mut paint = state.fill;
        paint.image = self.font_images[self.font_image_idx];
        paint.multiply_alpha(state.alpha);

        self.backend.triangles(
            &paint,
            state.composite,
            &state.scissor,
            &self.cache.verts,
            self.fringe_width,
        );

        self.stats.draw_calls += 1;
        self.stats.text_triangles += self.cache.verts.len() / 3;
    }

    /// Draws a single line of text at `(x, y)` honoring the current
    /// alignment, returning the pen position after the run.
    pub fn text(&mut self, x: f32, y: f32, text: &str) -> f32 {
        let state = *self.state();
        let Some((scale, invscale)) = self.set_font_state() else {
            return x;
        };
        let flipped = state.xform.is_flipped();

        let mut pen_x = x * scale + self.h_align_offset(state.text_align.h, text);
        let pen_y = y * scale + self.v_align_offset(state.text_align.v);

        self.cache.verts.clear();

        let mut prev = None;
        for ch in text.chars() {
            let mut shaped =
                self.rasterizer
                    .glyph(ch, prev, pen_x, pen_y, BitmapRequest::Required);
            if shaped.is_none() {
                // Atlas full: draw what we have, grow, and retry once.
                if !self.cache.verts.is_empty() {
                    self.render_text();
                    self.cache.verts.clear();
                }
                if !self.alloc_text_atlas() {
                    break;
                }
                shaped = self
                    .rasterizer
                    .glyph(ch, prev, pen_x, pen_y, BitmapRequest::Required);
                if shaped.is_none() {
                    break;
                }
            }
            let Some(g) = shaped else { break };

            if let Some(mut q) = g.quad {
                if flipped {
                    std::mem::swap(&mut q.y0, &mut q.y1);
                    std::mem::swap(&mut q.t0, &mut q.t1);
                }

                let c0 = state.xform.apply(q.x0 * invscale, q.y0 * invscale);
                let c1 = state.xform.apply(q.x1 * invscale, q.y0 * invscale);
                let c2 = state.xform.apply(q.x1 * invscale, q.y1 * invscale);
                let c3 = state.xform.apply(q.x0 * invscale, q.y1 * invscale);

                self.cache.verts.push(Vertex::new(c0.0, c0.1, q.s0, q.t0));
                self.cache.verts.push(Vertex::new(c2.0, c2.1, q.s1, q.t1));
                self.cache.verts.push(Vertex::new(c1.0, c1.1, q.s1, q.t0));
                self.cache.verts.push(Vertex::new(c0.0, c0.1, q.s0, q.t0));
                self.cache.verts.push(Vertex::new(c2.0, c2.1, q.s1, q.t1));
                self.cache.verts.push(Vertex::new(c3.0, c3.1, q.s0, q.t1));
            }

            pen_x = g.next_x;
            prev = Some(ch);
        }

        self.flush_text_texture();
        if !self.cache.verts.is_empty() {
            self.render_text();
        }

        pen_x * invscale
    }

    /// Draws multi-line text wrapped to `break_row_width`. Horizontal
    /// alignment is relative to the box, not the anchor.
    pub fn text_box(&mut self, x: f32, mut y: f32, break_row_width: f32, text: &str) {
        if self.state().font.is_none() {
            return;
        }
        let Some(metrics) = self.text_metrics() else {
            return;
        };

        let old_align = self.state().text_align;
        self.state_mut().text_align = Align::new(HAlign::Left, old_align.v);
        let line_step = metrics.line_height * self.state().line_height;

        let mut offset = 0;
        while offset < text.len() {
            let rest = &text[offset..];
            let rows = self.text_break_lines(rest, break_row_width, 2);
            if rows.is_empty() {
                break;
            }
            for row in &rows {
                let line = &rest[row.start..row.end];
                let dx = match old_align.h {
                    HAlign::Left => 0.0,
                    HAlign::Center => break_row_width * 0.5 - row.width * 0.5,
                    HAlign::Right => break_row_width - row.width,
                };
                self.text(x + dx, y, line);
                y += line_step;
            }
            offset += rows[rows.len() - 1].next;
        }

        self.state_mut().text_align = old_align;
    }

    /// Measures a single line of text. Returns the advance and the bounding
    /// box; vertical bounds come from the line box, not the glyph shapes.
    pub fn text_bounds(&mut self, x: f32, y: f32, text: &str) -> (f32, Bounds) {
        let state = *self.state();
        let Some((scale, invscale)) = self.set_font_state() else {
            return (0.0, Bounds::EMPTY);
        };

        let voff = self.v_align_offset(state.text_align.v);
        let start_x = x * scale;
        let y_dev = y * scale + voff;

        let mut pen = start_x;
        let mut min_x = start_x;
        let mut max_x = start_x;
        let mut prev = None;
        for ch in text.chars() {
            if let Some(g) = self
                .rasterizer
                .glyph(ch, prev, pen, y_dev, BitmapRequest::Optional)
            {
                if let Some(q) = g.quad {
                    min_x = min_x.min(q.x0);
                    max_x = max_x.max(q.x1);
                }
                pen = g.next_x;
            }
            prev = Some(ch);
        }
        let advance = pen - start_x;

        let shift = match state.text_align.h {
            HAlign::Left => 0.0,
            HAlign::Center => -advance * 0.5,
            HAlign::Right => -advance,
        };
        let (min_y, max_y) = self.rasterizer.line_bounds(y_dev);

        (
            advance * invscale,
            Bounds {
                min_x: (min_x + shift) * invscale,
                min_y: min_y * invscale,
                max_x: (max_x + shift) * invscale,
                max_y: max_y * invscale,
            },
        )
    }

    /// Measures multi-line text wrapped to `break_row_width`
    pub fn text_box_bounds(&mut self, x: f32, mut y: f32, break_row_width: f32, text: &str) -> Bounds {
        let state = *self.state();
        let Some((_, invscale)) = self.set_font_state() else {
            return Bounds::EMPTY;
        };
        let Some(metrics) = self.text_metrics() else {
            return Bounds::EMPTY;
        };

        let old_align = state.text_align;
        self.state_mut().text_align = Align::new(HAlign::Left, old_align.v);
        let line_step = metrics.line_height * state.line_height;

        let voff = self.v_align_offset(old_align.v);
        let (rmin_y, rmax_y) = self.rasterizer.line_bounds(voff);
        let rmin_y = rmin_y * invscale;
        let rmax_y = rmax_y * invscale;

        let mut bounds = Bounds {
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
        };

        let mut offset = 0;
        while offset < text.len() {
            let rest = &text[offset..];
            let rows = self.text_break_lines(rest, break_row_width, 2);
            if rows.is_empty() {
                break;
            }
            for row in &rows {
                let dx = match old_align.h {
                    HAlign::Left => 0.0,
                    HAlign::Center => break_row_width * 0.5 - row.width * 0.5,
                    HAlign::Right => break_row_width - row.width,
                };
                bounds.min_x = bounds.min_x.min(x + row.min_x + dx);
                bounds.max_x = bounds.max_x.max(x + row.max_x + dx);
                bounds.min_y = bounds.min_y.min(y + rmin_y);
                bounds.max_y = bounds.max_y.max(y + rmax_y);
                y += line_step;
            }
            offset += rows[rows.len() - 1].next;
        }

        self.state_mut().text_align = old_align;
        bounds
    }

    /// Caret positions for each glyph of a single line, up to
    /// `max_positions` entries.
    pub fn text_glyph_positions(
        &mut self,
        x: f32,
        y: f32,
        text: &str,
        max_positions: usize,
    ) -> Vec<GlyphPosition> {
        let state = *self.state();
        let Some((scale, invscale)) = self.set_font_state() else {
            return Vec::new();
        };

        let mut pen = x * scale + self.h_align_offset(state.text_align.h, text);
        let y_dev = y * scale + self.v_align_offset(state.text_align.v);

        let mut positions = Vec::with_capacity(max_positions.min(text.len()));
        let mut prev = None;
        for (idx, ch) in text.char_indices() {
            if positions.len() >= max_positions {
                break;
            }
            let (min_x, max_x, next) = match self
                .rasterizer
                .glyph(ch, prev, pen, y_dev, BitmapRequest::Optional)
            {
                Some(g) => match g.quad {
                    Some(q) => (pen.min(q.x0), g.next_x.max(q.x1), g.next_x),
                    None => (pen, g.next_x, g.next_x),
                },
                // Unshapeable codepoint: a zero-width caret slot.
                None => (pen, pen, pen),
            };
            positions.push(GlyphPosition {
                byte_index: idx,
                x: pen * invscale,
                min_x: min_x * invscale,
                max_x: max_x * invscale,
            });
            pen = next;
            prev = Some(ch);
        }
        positions
    }

    /// Breaks text into rows no wider than `break_row_width`, preferring
    /// word boundaries, up to `max_rows` rows. Row offsets are relative to
    /// `text`; resume from the last row's `next` for the remainder.
    pub fn text_break_lines(
        &mut self,
        text: &str,
        break_row_width: f32,
        max_rows: usize,
    ) -> Vec<TextRow> {
        let Some((scale, invscale)) = self.set_font_state() else {
            return Vec::new();
        };
        if max_rows == 0 || text.is_empty() {
            return Vec::new();
        }

        let break_row_width = break_row_width * scale;
        let mut rows = Vec::with_capacity(max_rows.min(8));

        let mut row_start_x = 0.0f32;
        let mut row_width = 0.0f32;
        let mut row_min_x = 0.0f32;
        let mut row_max_x = 0.0f32;
        let mut row_start: Option<usize> = None;
        let mut row_end = 0usize;
        let mut word_start = 0usize;
        let mut word_start_x = 0.0f32;
        let mut word_min_x = 0.0f32;
        let mut break_end = 0usize;
        let mut break_width = 0.0f32;
        let mut break_max_x = 0.0f32;
        let mut ptype = CharClass::Space;
        let mut pcodepoint = 0u32;

        let mut pen = 0.0f32;
        let mut prev = None;
        for (idx, ch) in text.char_indices() {
            let next_idx = idx + ch.len_utf8();
            let (qx0, qx1, next_x) = match self
                .rasterizer
                .glyph(ch, prev, pen, 0.0, BitmapRequest::Optional)
            {
                Some(g) => match g.quad {
                    Some(q) => (q.x0, q.x1, g.next_x),
                    None => (pen, g.next_x, g.next_x),
                },
                None => (pen, pen, pen),
            };

            let class = classify(ch, pcodepoint);
            match class {
                CharClass::Newline => {
                    rows.push(TextRow {
                        start: row_start.unwrap_or(idx),
                        end: if row_start.is_some() { row_end } else { idx },
                        width: row_width * invscale,
                        min_x: row_min_x * invscale,
                        max_x: row_max_x * invscale,
                        next: next_idx,
                    });
                    if rows.len() >= max_rows {
                        return rows;
                    }
                    break_end = 0;
                    break_width = 0.0;
                    break_max_x = 0.0;
                    row_start = None;
                    row_end = 0;
                    row_width = 0.0;
                    row_min_x = 0.0;
                    row_max_x = 0.0;
                }
                _ => {
                    if row_start.is_none() {
                        // Skip white space at the start of the row.
                        if class == CharClass::Char || class == CharClass::CjkChar {
                            row_start_x = pen;
                            row_start = Some(idx);
                            row_end = next_idx;
                            row_width = next_x - row_start_x;
                            row_min_x = qx0 - row_start_x;
                            row_max_x = qx1 - row_start_x;
                            word_start = idx;
                            word_start_x = pen;
                            word_min_x = qx0 - row_start_x;
                            break_end = idx;
                            break_width = 0.0;
                            break_max_x = 0.0;
                        }
                    } else {
                        let next_width = next_x - row_start_x;

                        // Track the last non-white-space character.
                        if class == CharClass::Char || class == CharClass::CjkChar {
                            row_end = next_idx;
                            row_width = next_x - row_start_x;
                            row_max_x = qx1 - row_start_x;
                        }
                        // Track the last end of a word.
                        if ((ptype == CharClass::Char || ptype == CharClass::CjkChar)
                            && class == CharClass::Space)
                            || class == CharClass::CjkChar
                        {
                            break_end = idx;
                            break_width = row_width;
                            break_max_x = row_max_x;
                        }
                        // Track the last beginning of a word.
                        if (ptype == CharClass::Space
                            && (class == CharClass::Char || class == CharClass::CjkChar))
                            || class == CharClass::CjkChar
                        {
                            word_start = idx;
                            word_start_x = pen;
                            word_min_x = qx0;
                        }

                        // Break when a printable character passes the width.
                        if (class == CharClass::Char || class == CharClass::CjkChar)
                            && next_width > break_row_width
                        {
                            let start = row_start.unwrap_or(idx);
                            if break_end == start {
                                // A single word longer than the row; split it here.
                                rows.push(TextRow {
                                    start,
                                    end: idx,
                                    width: row_width * invscale,
                                    min_x: row_min_x * invscale,
                                    max_x: row_max_x * invscale,
                                    next: idx,
                                });
                                if rows.len() >= max_rows {
                                    return rows;
                                }
                                row_start_x = pen;
                                row_start = Some(idx);
                                row_end = next_idx;
                                row_width = next_x - row_start_x;
                                row_min_x = qx0 - row_start_x;
                                row_max_x = qx1 - row_start_x;
                                word_start = idx;
                                word_start_x = pen;
                                word_min_x = qx0 - row_start_x;
                            } else {
                                // Break at the last word boundary.
                                rows.push(TextRow {
                                    start,
                                    end: break_end,
                                    width: break_width * invscale,
                                    min_x: row_min_x * invscale,
                                    max_x: break_max_x * invscale,
                                    next: word_start,
                                });
                                if rows.len() >= max_rows {
                                    return rows;
                                }
                                row_start_x = word_start_x;
                                row_start = Some(word_start);
                                row_end = next_idx;
                                row_width = next_x - row_start_x;
                                row_min_x = word_min_x - row_start_x;
                                row_max_x = qx1 - row_start_x;
                            }
                            break_end = row_start.unwrap_or(idx);
                            break_width = 0.0;
                            break_max_x = 0.0;
                        }
                    }
                }
            }

            pcodepoint = ch as u32;
            ptype = class;
            pen = next_x;
            prev = Some(ch);
        }

        if let Some(start) = row_start {
            rows.push(TextRow {
                start,
                end: row_end,
                width: row_width * invscale,
                min_x: row_min_x * invscale,
                max_x: row_max_x * invscale,
                next: text.len(),
            });
        }

        rows
    }

    /// Vertical metrics for the current font and size, in user units
    pub fn text_metrics(&mut self) -> Option<TextMetrics> {
        let (_, invscale) = self.set_font_state()?;
        let m = self.rasterizer.vert_metrics();
        Some(TextMetrics {
            ascender: m.ascender * invscale,
            descender: m.descender * invscale,
            line_height: m.line_height * invscale,
        })
    }
}

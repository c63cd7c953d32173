//! Text layout and rendering tests over the mock rasterizer
//!
//! The mock shapes a monospace font: every glyph advances half the font
//! size, whitespace has no quad, and the atlas fits one glyph per 64x64
//! cell. That makes advances, line breaks, and atlas growth exactly
//! predictable.

mod common;

use common::{test_context, text_context};
use vexel_vg::{Align, HAlign, TextureKind, VAlign};

/// A run advances by one glyph width per character and draws two
/// triangles per glyph.
#[test]
fn test_text_advance_and_quads() {
    let mut ctx = text_context();
    ctx.font_size(20.0);

    let end = ctx.text(5.0, 10.0, "abc");
    assert_eq!(end, 35.0);

    let backend = ctx.backend();
    assert_eq!(backend.triangles.len(), 1);
    let call = &backend.triangles[0];
    assert_eq!(call.verts.len(), 3 * 6);

    // First quad corner: pen x, baseline minus ascender.
    assert_eq!(call.verts[0].x, 5.0);
    assert_eq!(call.verts[0].y, 10.0 - 16.0);

    let stats = ctx.frame_stats();
    assert_eq!(stats.text_triangles, 6);
    assert_eq!(stats.draw_calls, 1);
}

/// Whitespace advances the pen but emits no geometry
#[test]
fn test_whitespace_has_no_quads() {
    let mut ctx = text_context();
    ctx.font_size(20.0);

    let end = ctx.text(5.0, 0.0, "a b");
    assert_eq!(end, 35.0);
    assert_eq!(ctx.backend().triangles[0].verts.len(), 2 * 6);
}

/// Without a font face, text calls are no-ops
#[test]
fn test_text_without_font() {
    let mut ctx = test_context();
    assert_eq!(ctx.text(7.0, 0.0, "abc"), 7.0);
    assert!(ctx.backend().triangles.is_empty());
    assert!(ctx.text_metrics().is_none());
}

/// Horizontal alignment shifts the run around the anchor
#[test]
fn test_horizontal_alignment() {
    let mut ctx = text_context();
    ctx.font_size(20.0);

    ctx.text_align(Align::new(HAlign::Left, VAlign::Baseline));
    assert_eq!(ctx.text(50.0, 0.0, "ab"), 70.0);

    ctx.text_align(Align::new(HAlign::Center, VAlign::Baseline));
    assert_eq!(ctx.text(50.0, 0.0, "ab"), 60.0);

    ctx.text_align(Align::new(HAlign::Right, VAlign::Baseline));
    assert_eq!(ctx.text(50.0, 0.0, "ab"), 50.0);
}

/// Vertical alignment comes from the font metrics, visible in the bounds
#[test]
fn test_vertical_alignment_bounds() {
    let mut ctx = text_context();
    ctx.font_size(20.0);

    ctx.text_align(Align::new(HAlign::Left, VAlign::Baseline));
    let (_, bounds) = ctx.text_bounds(0.0, 0.0, "a");
    assert_eq!(bounds.min_y, -16.0);
    assert_eq!(bounds.max_y, 4.0);

    ctx.text_align(Align::new(HAlign::Left, VAlign::Top));
    let (_, bounds) = ctx.text_bounds(0.0, 0.0, "a");
    assert_eq!(bounds.min_y, 0.0);
    assert_eq!(bounds.max_y, 20.0);
}

/// Bounds cover the glyph extents and honor the alignment shift
#[test]
fn test_text_bounds() {
    let mut ctx = text_context();
    ctx.font_size(20.0);

    let (advance, bounds) = ctx.text_bounds(10.0, 0.0, "abcd");
    assert_eq!(advance, 40.0);
    assert_eq!(bounds.min_x, 10.0);
    assert_eq!(bounds.max_x, 50.0);

    ctx.text_align(Align::new(HAlign::Right, VAlign::Baseline));
    let (advance, bounds) = ctx.text_bounds(10.0, 0.0, "abcd");
    assert_eq!(advance, 40.0);
    assert_eq!(bounds.min_x, -30.0);
    assert_eq!(bounds.max_x, 10.0);
}

/// Letter spacing widens the advance
#[test]
fn test_letter_spacing() {
    let mut ctx = text_context();
    ctx.font_size(20.0);
    ctx.text_letter_spacing(5.0);
    assert_eq!(ctx.text(0.0, 0.0, "ab"), 30.0);
}

/// Text drawn under a scale returns the pen in user units
#[test]
fn test_text_under_scale() {
    let mut ctx = text_context();
    ctx.font_size(10.0);
    ctx.scale(2.0, 2.0);
    assert_eq!(ctx.text(0.0, 0.0, "a"), 5.0);

    // The quad is emitted in user units and mapped by the transform.
    let call = &ctx.backend().triangles[0];
    assert_eq!(call.verts[0].x, 0.0);
    assert_eq!(call.verts[1].x, 10.0);
}

/// Glyph positions report byte offsets, including multibyte characters
#[test]
fn test_glyph_positions() {
    let mut ctx = text_context();
    ctx.font_size(20.0);

    let positions = ctx.text_glyph_positions(5.0, 0.0, "a\u{00e9}b", 100);
    assert_eq!(positions.len(), 3);
    assert_eq!(positions[0].byte_index, 0);
    assert_eq!(positions[1].byte_index, 1);
    assert_eq!(positions[2].byte_index, 3);
    assert_eq!(positions[0].x, 5.0);
    assert_eq!(positions[1].x, 15.0);
    assert_eq!(positions[2].x, 25.0);
    assert_eq!(positions[0].min_x, 5.0);
    assert_eq!(positions[0].max_x, 15.0);

    let positions = ctx.text_glyph_positions(0.0, 0.0, "abcdef", 2);
    assert_eq!(positions.len(), 2);
}

/// Lines break at word boundaries before the row width is exceeded
#[test]
fn test_break_lines_at_words() {
    let mut ctx = text_context();
    ctx.font_size(20.0);

    let text = "hello world foo";
    let rows = ctx.text_break_lines(text, 80.0, 16);
    assert_eq!(rows.len(), 3);

    assert_eq!(&text[rows[0].start..rows[0].end], "hello");
    assert_eq!(&text[rows[1].start..rows[1].end], "world");
    assert_eq!(&text[rows[2].start..rows[2].end], "foo");

    assert_eq!(rows[0].width, 50.0);
    assert_eq!(rows[1].width, 50.0);
    assert_eq!(rows[2].width, 30.0);

    // Resume offsets skip the separating spaces.
    assert_eq!(rows[0].next, 6);
    assert_eq!(rows[1].next, 12);
    assert_eq!(rows[2].next, text.len());
}

/// A run narrower than the row width lays out as a single row
#[test]
fn test_break_lines_single_row() {
    let mut ctx = text_context();
    ctx.font_size(20.0);

    let text = "hello world";
    let rows = ctx.text_break_lines(text, 1000.0, 16);
    assert_eq!(rows.len(), 1);
    assert_eq!(&text[rows[0].start..rows[0].end], text);
    assert_eq!(rows[0].width, 110.0);
    assert_eq!(rows[0].next, text.len());
}

/// `max_rows` truncates the layout
#[test]
fn test_break_lines_max_rows() {
    let mut ctx = text_context();
    ctx.font_size(20.0);
    let rows = ctx.text_break_lines("hello world foo", 80.0, 2);
    assert_eq!(rows.len(), 2);
}

/// Newlines always break; CRLF collapses to one break
#[test]
fn test_break_lines_newlines() {
    let mut ctx = text_context();
    ctx.font_size(20.0);

    let text = "ab\ncd";
    let rows = ctx.text_break_lines(text, 1000.0, 16);
    assert_eq!(rows.len(), 2);
    assert_eq!(&text[rows[0].start..rows[0].end], "ab");
    assert_eq!(&text[rows[1].start..rows[1].end], "cd");

    let text = "a\r\nb";
    let rows = ctx.text_break_lines(text, 1000.0, 16);
    assert_eq!(rows.len(), 2);
    assert_eq!(&text[rows[0].start..rows[0].end], "a");
    assert_eq!(&text[rows[1].start..rows[1].end], "b");
}

/// A single word longer than the row is split mid-word
#[test]
fn test_break_lines_long_word() {
    let mut ctx = text_context();
    ctx.font_size(20.0);

    let text = "abcdefgh";
    let rows = ctx.text_break_lines(text, 30.0, 16);
    assert_eq!(rows.len(), 3);
    assert_eq!(&text[rows[0].start..rows[0].end], "abc");
    assert_eq!(&text[rows[1].start..rows[1].end], "def");
    assert_eq!(&text[rows[2].start..rows[2].end], "gh");
}

/// CJK characters break as words on their own
#[test]
fn test_break_lines_cjk() {
    let mut ctx = text_context();
    ctx.font_size(20.0);

    // Four ideographs at 10 units each against a 25 unit row.
    let text = "\u{6f22}\u{5b57}\u{6f22}\u{5b57}";
    let rows = ctx.text_break_lines(text, 25.0, 16);
    assert_eq!(rows.len(), 2);
    assert_eq!(&text[rows[0].start..rows[0].end], "\u{6f22}\u{5b57}");
    assert_eq!(&text[rows[1].start..rows[1].end], "\u{6f22}\u{5b57}");
}

/// `text_box` draws one run per row at line-height steps
#[test]
fn test_text_box_layout() {
    let mut ctx = text_context();
    ctx.font_size(20.0);

    ctx.text_box(0.0, 0.0, 80.0, "hello world foo");

    let backend = ctx.backend();
    assert_eq!(backend.triangles.len(), 3);
    // Baselines step by the line height: quad tops at y - ascender.
    assert_eq!(backend.triangles[0].verts[0].y, -16.0);
    assert_eq!(backend.triangles[1].verts[0].y, 4.0);
    assert_eq!(backend.triangles[2].verts[0].y, 24.0);
}

/// Right-aligned boxes anchor each row to the right edge of the box
#[test]
fn test_text_box_right_aligned() {
    let mut ctx = text_context();
    ctx.font_size(20.0);
    ctx.text_align(Align::new(HAlign::Right, VAlign::Baseline));

    ctx.text_box(0.0, 0.0, 80.0, "hello world foo");

    let backend = ctx.backend();
    assert_eq!(backend.triangles.len(), 3);
    // "hello" and "world" are 50 wide, "foo" is 30.
    assert_eq!(backend.triangles[0].verts[0].x, 30.0);
    assert_eq!(backend.triangles[2].verts[0].x, 50.0);
}

/// Box bounds cover every row and the full line boxes
#[test]
fn test_text_box_bounds() {
    let mut ctx = text_context();
    ctx.font_size(20.0);

    let bounds = ctx.text_box_bounds(0.0, 0.0, 80.0, "hello world foo");
    assert_eq!(bounds.min_x, 0.0);
    assert_eq!(bounds.max_x, 50.0);
    assert_eq!(bounds.min_y, -16.0);
    assert_eq!(bounds.max_y, 44.0);
}

/// Metrics scale back into user units
#[test]
fn test_text_metrics() {
    let mut ctx = text_context();
    ctx.font_size(20.0);

    let m = ctx.text_metrics().expect("metrics");
    assert_eq!(m.ascender, 16.0);
    assert_eq!(m.descender, -4.0);
    assert_eq!(m.line_height, 20.0);

    // Metrics stay in user units under a transform scale.
    ctx.scale(2.0, 2.0);
    let m = ctx.text_metrics().expect("metrics");
    assert_eq!(m.line_height, 20.0);
}

/// When the atlas fills mid-run, pending quads are drawn, the atlas grows,
/// and the run continues on the new texture.
#[test]
fn test_atlas_growth_mid_run() {
    let mut ctx = text_context();
    ctx.font_size(20.0);

    // The initial 512x512 atlas fits 64 glyphs; the 65th overflows.
    ctx.text(0.0, 0.0, &"x".repeat(70));

    let backend = ctx.backend();
    assert_eq!(backend.triangles.len(), 2);
    assert_eq!(backend.triangles[0].verts.len(), 64 * 6);
    assert_eq!(backend.triangles[1].verts.len(), 6 * 6);

    // The two batches sample different atlas textures.
    assert_ne!(backend.triangles[0].paint.image, backend.triangles[1].paint.image);

    // A grown alpha texture was allocated alongside the original.
    assert!(backend
        .textures
        .values()
        .any(|&t| t == (TextureKind::Alpha, 1024, 512)));
    assert_eq!(ctx.frame_stats().text_triangles, 140);
}

/// End of frame compacts the atlas chain down to the largest texture
#[test]
fn test_atlas_gc_at_end_frame() {
    let mut ctx = text_context();
    ctx.font_size(20.0);
    ctx.text(0.0, 0.0, &"x".repeat(70));
    ctx.end_frame();

    let atlases: Vec<_> = ctx
        .backend()
        .textures
        .values()
        .filter(|t| t.0 == TextureKind::Alpha)
        .collect();
    assert_eq!(atlases, vec![&(TextureKind::Alpha, 1024, 512)]);
}

/// Fonts load from a file on disk; unreadable paths register nothing
#[test]
fn test_create_font_from_file() {
    let mut ctx = test_context();

    let path = std::env::temp_dir().join("vexel_test_font.bin");
    std::fs::write(&path, [1u8, 2, 3, 4]).expect("write font file");

    let font = ctx.create_font("disk", &path);
    assert!(font.is_some());
    assert_eq!(ctx.find_font("disk"), font);

    let absent = path.with_extension("absent");
    assert_eq!(ctx.create_font("missing", &absent), None);
    assert_eq!(ctx.find_font("missing"), None);

    std::fs::remove_file(&path).ok();
}

/// Fonts are registered and resolved by name
#[test]
fn test_font_registration() {
    let mut ctx = test_context();

    let serif = ctx.create_font_mem("serif", vec![0u8; 4]).expect("font");
    let mono = ctx.create_font_mem("mono", vec![0u8; 4]).expect("font");
    assert_ne!(serif, mono);

    assert_eq!(ctx.find_font("mono"), Some(mono));
    assert_eq!(ctx.find_font("missing"), None);

    // Empty data is rejected by the rasterizer.
    assert_eq!(ctx.create_font_mem("broken", Vec::new()), None);

    assert!(ctx.add_fallback_font(serif, mono));
    ctx.reset_fallback_fonts(serif);

    ctx.font_face_by_name("serif");
    ctx.font_size(20.0);
    assert_eq!(ctx.text(0.0, 0.0, "a"), 10.0);
}

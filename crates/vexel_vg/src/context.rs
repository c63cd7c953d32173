//! The rendering context
//!
//! [`Context`] owns the command buffer, the path cache, the state stack, and
//! the backend and glyph-rasterizer collaborators. All drawing goes through
//! it: record a path, set a paint, call [`Context::fill`] or
//! [`Context::stroke`].
//!
//! Draw calls never fail: geometry or resource problems degrade to skipped
//! output (with a `tracing` event), matching an immediate-mode UI loop that
//! cannot usefully handle per-shape errors.

use smallvec::SmallVec;
use thiserror::Error;
use tracing::{debug, warn};
use vexel_core::geometry::{cross, dist_pt_seg, normalize, pt_equals};
use vexel_core::{Color, Point, Transform};
use vexel_image::{DecoderConfig, DecoderRegistry, ImageDecoder, ImageError};

use crate::backend::{BackendError, ImageFlags, ImageId, RenderBackend, TextureKind};
use crate::cache::{Command, PathCache};
use crate::expand::{expand_fill, expand_stroke};
use crate::paint::{BlendFactor, CompositeOperation, CompositeState, Paint};
use crate::state::{LineCap, LineJoin, State, Winding};
use crate::text::{Align, FontId, GlyphRasterizer, INIT_FONT_ATLAS_SIZE, MAX_FONT_IMAGES};

/// Kappa for approximating a 90-degree arc with a cubic Bezier
pub const KAPPA90: f32 = 0.552_284_8;

/// Depth of the save/restore stack; saves beyond this are ignored
pub(crate) const MAX_STATES: usize = 64;

const INIT_COMMANDS_SIZE: usize = 256;

/// Context creation failure
#[derive(Error, Debug)]
pub enum ContextError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("Failed to create the initial font atlas texture")]
    FontAtlas,
}

/// Per-frame draw statistics
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub draw_calls: usize,
    pub fill_triangles: usize,
    pub stroke_triangles: usize,
    pub text_triangles: usize,
}

/// The vector-graphics rendering context
pub struct Context<B: RenderBackend> {
    pub(crate) backend: B,
    pub(crate) rasterizer: Box<dyn GlyphRasterizer>,
    decoders: DecoderRegistry,
    commands: SmallVec<[Command; 16]>,
    /// Last path position in untransformed (path) space
    command_pos: Point,
    pub(crate) cache: PathCache,
    states: Vec<State>,
    pub(crate) tess_tol: f32,
    dist_tol: f32,
    pub(crate) fringe_width: f32,
    pub(crate) device_px_ratio: f32,
    pub(crate) font_images: [Option<ImageId>; MAX_FONT_IMAGES],
    pub(crate) font_image_idx: usize,
    pub(crate) stats: FrameStats,
}

impl<B: RenderBackend> Context<B> {
    /// Creates a context over a backend and a glyph rasterizer.
    ///
    /// Initializes the backend and allocates the initial font atlas texture.
    pub fn new(
        mut backend: B,
        rasterizer: Box<dyn GlyphRasterizer>,
    ) -> Result<Self, ContextError> {
        backend.create()?;

        let atlas = backend
            .create_texture(
                TextureKind::Alpha,
                INIT_FONT_ATLAS_SIZE,
                INIT_FONT_ATLAS_SIZE,
                ImageFlags::empty(),
                None,
            )
            .ok_or(ContextError::FontAtlas)?;

        let mut font_images = [None; MAX_FONT_IMAGES];
        font_images[0] = Some(atlas);
        let mut ctx = Self {
            backend,
            rasterizer,
            decoders: DecoderRegistry::new(),
            commands: SmallVec::new(),
            command_pos: Point::ZERO,
            cache: PathCache::new(),
            states: Vec::with_capacity(MAX_STATES),
            tess_tol: 0.0,
            dist_tol: 0.0,
            fringe_width: 0.0,
            device_px_ratio: 0.0,
            font_images,
            font_image_idx: 0,
            stats: FrameStats::default(),
        };
        ctx.commands.reserve(INIT_COMMANDS_SIZE);
        ctx.save();
        ctx.reset();
        ctx.set_device_pixel_ratio(1.0);
        ctx.rasterizer
            .reset_atlas(INIT_FONT_ATLAS_SIZE, INIT_FONT_ATLAS_SIZE);
        Ok(ctx)
    }

    /// The backend this context draws through
    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    fn set_device_pixel_ratio(&mut self, ratio: f32) {
        self.tess_tol = 0.25 / ratio;
        self.dist_tol = 0.01 / ratio;
        self.fringe_width = 1.0 / ratio;
        self.device_px_ratio = ratio;
    }

    pub(crate) fn state(&self) -> &State {
        self.states.last().expect("state stack is never empty")
    }

    pub(crate) fn state_mut(&mut self) -> &mut State {
        self.states.last_mut().expect("state stack is never empty")
    }

    // ------------------------------------------------------------------
    // Frame lifecycle
    // ------------------------------------------------------------------

    /// Starts a frame. Resets the state stack and per-frame counters and
    /// derives the tessellation tolerances from the device pixel ratio.
    pub fn begin_frame(&mut self, window_width: f32, window_height: f32, device_pixel_ratio: f32) {
        self.states.clear();
        self.save();
        self.reset();

        self.set_device_pixel_ratio(device_pixel_ratio);

        self.backend
            .viewport(window_width, window_height, device_pixel_ratio);

        self.stats = FrameStats::default();
    }

    /// Drops everything drawn since `begin_frame`
    pub fn cancel_frame(&mut self) {
        self.backend.cancel();
    }

    /// Submits the frame, then compacts the font atlas chain: when the atlas
    /// grew this frame, the largest image is kept as primary and smaller
    /// stale ones are deleted.
    pub fn end_frame(&mut self) {
        self.backend.flush();

        if self.font_image_idx != 0 {
            let Some(font_image) = self.font_images[self.font_image_idx].take() else {
                return;
            };
            let Some((iw, ih)) = self.backend.texture_size(font_image) else {
                return;
            };

            let mut j = 0;
            for i in 0..self.font_image_idx {
                if let Some(image) = self.font_images[i].take() {
                    match self.backend.texture_size(image) {
                        Some((nw, nh)) if nw >= iw && nh >= ih => {
                            self.font_images[j] = Some(image);
                            j += 1;
                        }
                        _ => {
                            self.backend.delete_texture(image);
                        }
                    }
                }
            }

            // Move the grown atlas to the front.
            self.font_images[j] = self.font_images[0];
            self.font_images[0] = Some(font_image);
            self.font_image_idx = 0;
        }
    }

    /// Per-frame draw statistics, reset by `begin_frame`
    pub fn frame_stats(&self) -> FrameStats {
        self.stats
    }

    // ------------------------------------------------------------------
    // State stack
    // ------------------------------------------------------------------

    /// Pushes a copy of the current state. Silently ignored past the stack
    /// cap.
    pub fn save(&mut self) {
        if self.states.len() >= MAX_STATES {
            return;
        }
        let state = self.states.last().copied().unwrap_or_default();
        self.states.push(state);
    }

    /// Pops the current state. The base state is never popped.
    pub fn restore(&mut self) {
        if self.states.len() > 1 {
            self.states.pop();
        }
    }

    /// Resets the current state to defaults without touching the stack
    pub fn reset(&mut self) {
        *self.state_mut() = State::default();
    }

    // ------------------------------------------------------------------
    // Render styles
    // ------------------------------------------------------------------

    pub fn shape_anti_alias(&mut self, enabled: bool) {
        self.state_mut().shape_anti_alias = enabled;
    }

    pub fn stroke_width(&mut self, width: f32) {
        self.state_mut().stroke_width = width;
    }

    pub fn miter_limit(&mut self, limit: f32) {
        self.state_mut().miter_limit = limit;
    }

    pub fn line_cap(&mut self, cap: LineCap) {
        self.state_mut().line_cap = cap;
    }

    pub fn line_join(&mut self, join: LineJoin) {
        self.state_mut().line_join = join;
    }

    pub fn global_alpha(&mut self, alpha: f32) {
        self.state_mut().alpha = alpha;
    }

    pub fn fill_color(&mut self, color: Color) {
        self.state_mut().fill = Paint::color(color);
    }

    /// Sets the fill paint, composing the current transform into it
    pub fn fill_paint(&mut self, paint: Paint) {
        let state = self.state_mut();
        state.fill = paint;
        state.fill.xform.multiply(&state.xform);
    }

    pub fn stroke_color(&mut self, color: Color) {
        self.state_mut().stroke = Paint::color(color);
    }

    /// Sets the stroke paint, composing the current transform into it
    pub fn stroke_paint(&mut self, paint: Paint) {
        let state = self.state_mut();
        state.stroke = paint;
        state.stroke.xform.multiply(&state.xform);
    }

    pub fn global_composite_operation(&mut self, op: CompositeOperation) {
        self.state_mut().composite = op.into();
    }

    pub fn global_composite_blend_func(&mut self, sfactor: BlendFactor, dfactor: BlendFactor) {
        self.state_mut().composite = CompositeState::with_blend_func(sfactor, dfactor);
    }

    pub fn global_composite_blend_func_separate(
        &mut self,
        src_rgb: BlendFactor,
        dst_rgb: BlendFactor,
        src_alpha: BlendFactor,
        dst_alpha: BlendFactor,
    ) {
        self.state_mut().composite = CompositeState {
            src_rgb,
            dst_rgb,
            src_alpha,
            dst_alpha,
        };
    }

    // ------------------------------------------------------------------
    // Transforms
    // ------------------------------------------------------------------

    /// Premultiplies the given matrix onto the current transform
    pub fn transform(&mut self, a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) {
        let t = Transform { a, b, c, d, e, f };
        self.state_mut().xform.premultiply(&t);
    }

    pub fn reset_transform(&mut self) {
        self.state_mut().xform = Transform::identity();
    }

    pub fn translate(&mut self, x: f32, y: f32) {
        let t = Transform::translate(x, y);
        self.state_mut().xform.premultiply(&t);
    }

    pub fn rotate(&mut self, angle: f32) {
        let t = Transform::rotate(angle);
        self.state_mut().xform.premultiply(&t);
    }

    pub fn skew_x(&mut self, angle: f32) {
        let t = Transform::skew_x(angle);
        self.state_mut().xform.premultiply(&t);
    }

    pub fn skew_y(&mut self, angle: f32) {
        let t = Transform::skew_y(angle);
        self.state_mut().xform.premultiply(&t);
    }

    pub fn scale(&mut self, x: f32, y: f32) {
        let t = Transform::scale(x, y);
        self.state_mut().xform.premultiply(&t);
    }

    pub fn current_transform(&self) -> Transform {
        self.state().xform
    }

    // ------------------------------------------------------------------
    // Scissoring
    // ------------------------------------------------------------------

    /// Sets the scissor to a rectangle in the current transform space
    pub fn scissor(&mut self, x: f32, y: f32, w: f32, h: f32) {
        let state = self.state_mut();
        let w = w.max(0.0);
        let h = h.max(0.0);

        let mut xform = Transform::translate(x + w * 0.5, y + h * 0.5);
        xform.multiply(&state.xform);
        state.scissor.xform = xform;
        state.scissor.extent = [w * 0.5, h * 0.5];
    }

    /// Intersects the current scissor with a rectangle in the current
    /// transform space.
    ///
    /// The previous scissor is mapped through the inverse of the current
    /// transform and both are intersected as axis-aligned boxes, so under
    /// differing rotations the result is a conservative approximation.
    pub fn intersect_scissor(&mut self, x: f32, y: f32, w: f32, h: f32) {
        let state = self.state();

        if !state.scissor.is_enabled() {
            self.scissor(x, y, w, h);
            return;
        }

        let mut pxform = state.scissor.xform;
        let ex = state.scissor.extent[0];
        let ey = state.scissor.extent[1];
        let inv = state.xform.inverse().unwrap_or_else(Transform::identity);
        pxform.multiply(&inv);
        let tex = ex * pxform.a.abs() + ey * pxform.c.abs();
        let tey = ex * pxform.b.abs() + ey * pxform.d.abs();

        let rect = vexel_core::Rect::new(pxform.e - tex, pxform.f - tey, tex * 2.0, tey * 2.0)
            .intersect(&vexel_core::Rect::new(x, y, w, h));

        self.scissor(rect.x, rect.y, rect.width, rect.height);
    }

    pub fn reset_scissor(&mut self) {
        self.state_mut().scissor = crate::state::Scissor::disabled();
    }

    // ------------------------------------------------------------------
    // Images
    // ------------------------------------------------------------------

    /// Registers an image decoder for [`Context::create_image_mem`]
    pub fn register_decoder(&mut self, decoder: Box<dyn ImageDecoder>) {
        self.decoders.register(decoder);
    }

    /// Decodes encoded image data through the registered decoders and
    /// uploads it as an RGBA texture.
    pub fn create_image_mem(
        &mut self,
        flags: ImageFlags,
        data: &[u8],
        config: &DecoderConfig,
    ) -> Result<ImageId, ImageError> {
        let decoded = self.decoders.decode(data, config)?;
        self.create_image_rgba(decoded.width, decoded.height, flags, &decoded.pixels)
            .ok_or(ImageError::TooLarge {
                width: decoded.width,
                height: decoded.height,
            })
    }

    /// Creates an RGBA texture from raw pixels
    pub fn create_image_rgba(
        &mut self,
        width: u32,
        height: u32,
        flags: ImageFlags,
        data: &[u8],
    ) -> Option<ImageId> {
        self.backend
            .create_texture(TextureKind::Rgba, width, height, flags, Some(data))
    }

    /// Creates a single-channel texture from raw coverage data
    pub fn create_image_alpha(
        &mut self,
        width: u32,
        height: u32,
        flags: ImageFlags,
        data: &[u8],
    ) -> Option<ImageId> {
        self.backend
            .create_texture(TextureKind::Alpha, width, height, flags, Some(data))
    }

    /// Replaces the full contents of an image
    pub fn update_image(&mut self, image: ImageId, data: &[u8]) {
        if let Some((w, h)) = self.backend.texture_size(image) {
            self.backend.update_texture(image, 0, 0, w, h, data);
        }
    }

    pub fn image_size(&self, image: ImageId) -> Option<(u32, u32)> {
        self.backend.texture_size(image)
    }

    pub fn delete_image(&mut self, image: ImageId) {
        self.backend.delete_texture(image);
    }

    // ------------------------------------------------------------------
    // Path construction
    // ------------------------------------------------------------------

    /// Appends commands, transforming points into device space and tracking
    /// the pen position in path space.
    fn append_commands(&mut self, cmds: &mut [Command]) {
        // The pen stays in path space so relative constructions (quad_to,
        // arc_to) compose before the transform.
        for cmd in cmds.iter() {
            match *cmd {
                Command::MoveTo(p) | Command::LineTo(p) | Command::BezierTo(_, _, p) => {
                    self.command_pos = p;
                }
                _ => {}
            }
        }

        let xform = self.state().xform;
        for cmd in cmds.iter_mut() {
            match cmd {
                Command::MoveTo(p) | Command::LineTo(p) => {
                    *p = xform.apply_point(*p);
                }
                Command::BezierTo(c1, c2, p) => {
                    *c1 = xform.apply_point(*c1);
                    *c2 = xform.apply_point(*c2);
                    *p = xform.apply_point(*p);
                }
                Command::Close | Command::Winding(_) => {}
            }
        }

        self.commands.extend_from_slice(cmds);
    }

    /// Clears the current path and the flattened cache
    pub fn begin_path(&mut self) {
        self.commands.clear();
        self.cache.clear();
    }

    pub fn move_to(&mut self, x: f32, y: f32) {
        self.append_commands(&mut [Command::MoveTo(Point::new(x, y))]);
    }

    pub fn line_to(&mut self, x: f32, y: f32) {
        self.append_commands(&mut [Command::LineTo(Point::new(x, y))]);
    }

    /// Cubic Bezier to `(x, y)` with control points `(c1x, c1y)`, `(c2x, c2y)`
    pub fn bezier_to(&mut self, c1x: f32, c1y: f32, c2x: f32, c2y: f32, x: f32, y: f32) {
        self.append_commands(&mut [Command::BezierTo(
            Point::new(c1x, c1y),
            Point::new(c2x, c2y),
            Point::new(x, y),
        )]);
    }

    /// Quadratic Bezier, expressed as the equivalent cubic
    pub fn quad_to(&mut self, cx: f32, cy: f32, x: f32, y: f32) {
        let x0 = self.command_pos.x;
        let y0 = self.command_pos.y;
        self.append_commands(&mut [Command::BezierTo(
            Point::new(x0 + 2.0 / 3.0 * (cx - x0), y0 + 2.0 / 3.0 * (cy - y0)),
            Point::new(x + 2.0 / 3.0 * (cx - x), y + 2.0 / 3.0 * (cy - y)),
            Point::new(x, y),
        )]);
    }

    /// Arc from the pen towards `(x1, y1)` and on to `(x2, y2)`, rounded
    /// with `radius`. Degenerate inputs fall back to a line.
    pub fn arc_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, radius: f32) {
        if self.commands.is_empty() {
            return;
        }

        let x0 = self.command_pos.x;
        let y0 = self.command_pos.y;

        if pt_equals(x0, y0, x1, y1, self.dist_tol)
            || pt_equals(x1, y1, x2, y2, self.dist_tol)
            || dist_pt_seg(x1, y1, x0, y0, x2, y2) < self.dist_tol * self.dist_tol
            || radius < self.dist_tol
        {
            self.line_to(x1, y1);
            return;
        }

        // Circle tangent to both segments.
        let mut dx0 = x0 - x1;
        let mut dy0 = y0 - y1;
        let mut dx1 = x2 - x1;
        let mut dy1 = y2 - y1;
        normalize(&mut dx0, &mut dy0);
        normalize(&mut dx1, &mut dy1);
        let a = (dx0 * dx1 + dy0 * dy1).acos();
        let d = radius / (a / 2.0).tan();

        if d > 10000.0 {
            self.line_to(x1, y1);
            return;
        }

        let (cx, cy, a0, a1, dir) = if cross(dx0, dy0, dx1, dy1) > 0.0 {
            (
                x1 + dx0 * d + dy0 * radius,
                y1 + dy0 * d - dx0 * radius,
                dx0.atan2(-dy0),
                (-dx1).atan2(dy1),
                Winding::Cw,
            )
        } else {
            (
                x1 + dx0 * d - dy0 * radius,
                y1 + dy0 * d + dx0 * radius,
                (-dx0).atan2(dy0),
                dx1.atan2(-dy1),
                Winding::Ccw,
            )
        };

        self.arc(cx, cy, radius, a0, a1, dir);
    }

    /// Closes the current sub-path
    pub fn close_path(&mut self) {
        self.append_commands(&mut [Command::Close]);
    }

    /// Overrides the winding (solid or hole) of the current sub-path
    pub fn path_winding(&mut self, dir: Winding) {
        self.append_commands(&mut [Command::Winding(dir)]);
    }

    /// Circle arc around `(cx, cy)`, continuing the current sub-path with a
    /// line when one exists.
    pub fn arc(&mut self, cx: f32, cy: f32, r: f32, a0: f32, a1: f32, dir: Winding) {
        self.barc(cx, cy, r, a0, a1, dir, true);
    }

    /// Arc primitive. `join` continues from the pen with a line; otherwise
    /// the arc starts a new sub-path.
    pub fn barc(&mut self, cx: f32, cy: f32, r: f32, a0: f32, a1: f32, dir: Winding, join: bool) {
        use std::f32::consts::PI;

        let line_join = join && !self.commands.is_empty();

        // Clamp the sweep to one full circle in the winding direction.
        let mut da = a1 - a0;
        if dir == Winding::Cw {
            if da.abs() >= PI * 2.0 {
                da = PI * 2.0;
            } else {
                while da < 0.0 {
                    da += PI * 2.0;
                }
            }
        } else if da.abs() >= PI * 2.0 {
            da = -PI * 2.0;
        } else {
            while da > 0.0 {
                da -= PI * 2.0;
            }
        }

        // Split into at most 90 degree segments.
        let ndivs = ((da.abs() / (PI * 0.5) + 0.5) as usize).clamp(1, 5);
        let hda = (da / ndivs as f32) / 2.0;
        let mut kappa = (4.0 / 3.0 * (1.0 - hda.cos()) / hda.sin()).abs();
        if dir == Winding::Ccw {
            kappa = -kappa;
        }

        let mut cmds: SmallVec<[Command; 8]> = SmallVec::new();
        let mut px = 0.0;
        let mut py = 0.0;
        let mut ptanx = 0.0;
        let mut ptany = 0.0;
        for i in 0..=ndivs {
            let a = a0 + da * (i as f32 / ndivs as f32);
            let dx = a.cos();
            let dy = a.sin();
            let x = cx + dx * r;
            let y = cy + dy * r;
            let tanx = -dy * r * kappa;
            let tany = dx * r * kappa;

            if i == 0 {
                let p = Point::new(x, y);
                cmds.push(if line_join {
                    Command::LineTo(p)
                } else {
                    Command::MoveTo(p)
                });
            } else {
                cmds.push(Command::BezierTo(
                    Point::new(px + ptanx, py + ptany),
                    Point::new(x - tanx, y - tany),
                    Point::new(x, y),
                ));
            }

            px = x;
            py = y;
            ptanx = tanx;
            ptany = tany;
        }

        self.append_commands(&mut cmds);
    }

    /// Axis-aligned rectangle sub-path
    pub fn rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        self.append_commands(&mut [
            Command::MoveTo(Point::new(x, y)),
            Command::LineTo(Point::new(x, y + h)),
            Command::LineTo(Point::new(x + w, y + h)),
            Command::LineTo(Point::new(x + w, y)),
            Command::Close,
        ]);
    }

    /// Rounded rectangle with one radius for all corners
    pub fn rounded_rect(&mut self, x: f32, y: f32, w: f32, h: f32, r: f32) {
        self.rounded_rect_varying(x, y, w, h, r, r, r, r);
    }

    /// Rounded rectangle with per-corner radii. Radii below 0.1 degenerate
    /// to a plain rectangle.
    #[allow(clippy::too_many_arguments)]
    pub fn rounded_rect_varying(
        &mut self,
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        rad_top_left: f32,
        rad_top_right: f32,
        rad_bottom_right: f32,
        rad_bottom_left: f32,
    ) {
        if rad_top_left < 0.1 && rad_top_right < 0.1 && rad_bottom_right < 0.1
            && rad_bottom_left < 0.1
        {
            self.rect(x, y, w, h);
            return;
        }

        let halfw = w.abs() * 0.5;
        let halfh = h.abs() * 0.5;
        let sign_w = w.signum();
        let sign_h = h.signum();
        let rx_bl = rad_bottom_left.min(halfw) * sign_w;
        let ry_bl = rad_bottom_left.min(halfh) * sign_h;
        let rx_br = rad_bottom_right.min(halfw) * sign_w;
        let ry_br = rad_bottom_right.min(halfh) * sign_h;
        let rx_tr = rad_top_right.min(halfw) * sign_w;
        let ry_tr = rad_top_right.min(halfh) * sign_h;
        let rx_tl = rad_top_left.min(halfw) * sign_w;
        let ry_tl = rad_top_left.min(halfh) * sign_h;
        let k = 1.0 - KAPPA90;

        self.append_commands(&mut [
            Command::MoveTo(Point::new(x, y + ry_tl)),
            Command::LineTo(Point::new(x, y + h - ry_bl)),
            Command::BezierTo(
                Point::new(x, y + h - ry_bl * k),
                Point::new(x + rx_bl * k, y + h),
                Point::new(x + rx_bl, y + h),
            ),
            Command::LineTo(Point::new(x + w - rx_br, y + h)),
            Command::BezierTo(
                Point::new(x + w - rx_br * k, y + h),
                Point::new(x + w, y + h - ry_br * k),
                Point::new(x + w, y + h - ry_br),
            ),
            Command::LineTo(Point::new(x + w, y + ry_tr)),
            Command::BezierTo(
                Point::new(x + w, y + ry_tr * k),
                Point::new(x + w - rx_tr * k, y),
                Point::new(x + w - rx_tr, y),
            ),
            Command::LineTo(Point::new(x + rx_tl, y)),
            Command::BezierTo(
                Point::new(x + rx_tl * k, y),
                Point::new(x, y + ry_tl * k),
                Point::new(x, y + ry_tl),
            ),
            Command::Close,
        ]);
    }

    /// Ellipse sub-path around `(cx, cy)`
    pub fn ellipse(&mut self, cx: f32, cy: f32, rx: f32, ry: f32) {
        self.append_commands(&mut [
            Command::MoveTo(Point::new(cx - rx, cy)),
            Command::BezierTo(
                Point::new(cx - rx, cy + ry * KAPPA90),
                Point::new(cx - rx * KAPPA90, cy + ry),
                Point::new(cx, cy + ry),
            ),
            Command::BezierTo(
                Point::new(cx + rx * KAPPA90, cy + ry),
                Point::new(cx + rx, cy + ry * KAPPA90),
                Point::new(cx + rx, cy),
            ),
            Command::BezierTo(
                Point::new(cx + rx, cy - ry * KAPPA90),
                Point::new(cx + rx * KAPPA90, cy - ry),
                Point::new(cx, cy - ry),
            ),
            Command::BezierTo(
                Point::new(cx - rx * KAPPA90, cy - ry),
                Point::new(cx - rx, cy - ry * KAPPA90),
                Point::new(cx - rx, cy),
            ),
            Command::Close,
        ]);
    }

    /// Circle sub-path around `(cx, cy)`
    pub fn circle(&mut self, cx: f32, cy: f32, r: f32) {
        self.ellipse(cx, cy, r, r);
    }

    // ------------------------------------------------------------------
    // Rasterization
    // ------------------------------------------------------------------

    /// Fills the current path with the current fill paint
    pub fn fill(&mut self) {
        let state = *self.state();
        let mut fill_paint = state.fill;

        self.cache
            .flatten(&self.commands, self.tess_tol, self.dist_tol);
        if self.backend.edge_anti_alias() && state.shape_anti_alias {
            expand_fill(
                &mut self.cache,
                self.fringe_width,
                LineJoin::Miter,
                2.4,
                self.fringe_width,
            );
        } else {
            expand_fill(&mut self.cache, 0.0, LineJoin::Miter, 2.4, self.fringe_width);
        }

        fill_paint.multiply_alpha(state.alpha);

        let paths: Vec<_> = self.cache.paths.iter().map(|p| p.to_draw_path()).collect();
        self.backend.fill(
            &fill_paint,
            state.composite,
            &state.scissor,
            self.fringe_width,
            self.cache.bounds,
            &paths,
            &self.cache.verts,
        );

        for path in &self.cache.paths {
            let nfill = path.fill.map_or(0, |r| r.len);
            let nstroke = path.stroke.map_or(0, |r| r.len);
            self.stats.fill_triangles += nfill.saturating_sub(2);
            self.stats.fill_triangles += nstroke.saturating_sub(2);
            self.stats.draw_calls += 2;
        }
    }

    /// Strokes the current path with the current stroke paint.
    ///
    /// Strokes thinner than a device pixel keep the fringe width and fade
    /// the paint by the squared coverage ratio instead.
    pub fn stroke(&mut self) {
        let state = *self.state();
        let scale = state.xform.average_scale();
        let mut stroke_width = (state.stroke_width * scale).clamp(0.0, 200.0);
        let mut stroke_paint = state.stroke;

        if stroke_width < self.fringe_width {
            // Coverage is area, so compensate with alpha squared.
            let alpha = (stroke_width / self.fringe_width).clamp(0.0, 1.0);
            stroke_paint.multiply_alpha(alpha * alpha);
            stroke_width = self.fringe_width;
        }

        stroke_paint.multiply_alpha(state.alpha);

        self.cache
            .flatten(&self.commands, self.tess_tol, self.dist_tol);

        if self.backend.edge_anti_alias() && state.shape_anti_alias {
            expand_stroke(
                &mut self.cache,
                stroke_width * 0.5,
                self.fringe_width,
                state.line_cap,
                state.line_join,
                state.miter_limit,
                self.tess_tol,
            );
        } else {
            expand_stroke(
                &mut self.cache,
                stroke_width * 0.5,
                0.0,
                state.line_cap,
                state.line_join,
                state.miter_limit,
                self.tess_tol,
            );
        }

        let paths: Vec<_> = self.cache.paths.iter().map(|p| p.to_draw_path()).collect();
        self.backend.stroke(
            &stroke_paint,
            state.composite,
            &state.scissor,
            self.fringe_width,
            stroke_width,
            &paths,
            &self.cache.verts,
        );

        for path in &self.cache.paths {
            let nstroke = path.stroke.map_or(0, |r| r.len);
            self.stats.stroke_triangles += nstroke.saturating_sub(2);
            self.stats.draw_calls += 1;
        }
    }

    /// Logs the flattened path cache at debug level
    pub fn debug_dump_path_cache(&self) {
        debug!(paths = self.cache.paths.len(), "path cache dump");
        for (i, path) in self.cache.paths.iter().enumerate() {
            let nfill = path.fill.map_or(0, |r| r.len);
            let nstroke = path.stroke.map_or(0, |r| r.len);
            debug!(
                path = i,
                points = path.count,
                fill = nfill,
                stroke = nstroke,
                closed = path.closed,
                convex = path.convex,
                "path"
            );
        }
    }

    // ------------------------------------------------------------------
    // Fonts
    // ------------------------------------------------------------------

    /// Registers a font from in-memory data
    pub fn create_font_mem(&mut self, name: &str, data: Vec<u8>) -> Option<FontId> {
        let id = self.rasterizer.add_font_mem(name, data);
        if id.is_none() {
            warn!(name, "failed to register font");
        }
        id
    }

    /// Registers a font from a file on disk
    pub fn create_font(&mut self, name: &str, path: impl AsRef<std::path::Path>) -> Option<FontId> {
        match std::fs::read(path.as_ref()) {
            Ok(data) => self.create_font_mem(name, data),
            Err(err) => {
                warn!(name, error = %err, "failed to read font file");
                None
            }
        }
    }

    /// Looks a registered font up by name
    pub fn find_font(&self, name: &str) -> Option<FontId> {
        self.rasterizer.font_by_name(name)
    }

    /// Chains a fallback font consulted for codepoints the base misses
    pub fn add_fallback_font(&mut self, base: FontId, fallback: FontId) -> bool {
        self.rasterizer.add_fallback(base, fallback)
    }

    pub fn reset_fallback_fonts(&mut self, base: FontId) {
        self.rasterizer.reset_fallbacks(base);
    }

    pub fn font_size(&mut self, size: f32) {
        self.state_mut().font_size = size;
    }

    pub fn font_blur(&mut self, blur: f32) {
        self.state_mut().font_blur = blur;
    }

    pub fn text_letter_spacing(&mut self, spacing: f32) {
        self.state_mut().letter_spacing = spacing;
    }

    pub fn text_line_height(&mut self, line_height: f32) {
        self.state_mut().line_height = line_height;
    }

    pub fn text_align(&mut self, align: Align) {
        self.state_mut().text_align = align;
    }

    pub fn font_face(&mut self, font: FontId) {
        self.state_mut().font = Some(font);
    }

    /// Selects a font by registered name; unknown names leave the state
    /// unchanged.
    pub fn font_face_by_name(&mut self, name: &str) {
        if let Some(id) = self.rasterizer.font_by_name(name) {
            self.state_mut().font = Some(id);
        } else {
            warn!(name, "unknown font face");
        }
    }
}

impl<B: RenderBackend> Drop for Context<B> {
    fn drop(&mut self) {
        for image in self.font_images.iter_mut() {
            if let Some(img) = image.take() {
                self.backend.delete_texture(img);
            }
        }
    }
}

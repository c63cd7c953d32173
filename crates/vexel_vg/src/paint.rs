//! Paints, gradients, and composite operations
//!
//! A [`Paint`] is a solid color, a gradient, or an image pattern, all encoded
//! uniformly: a paint-space transform, an extent, a radius, and a feather.
//! Gradient constructors bake their geometry into those fields so the
//! fragment stage evaluates every paint the same way.

use vexel_core::{Color, Transform};

use crate::backend::ImageId;

/// A fill or stroke paint
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Paint {
    /// Paint-space transform; draw calls compose the state transform on top
    pub xform: Transform,
    pub extent: [f32; 2],
    pub radius: f32,
    pub feather: f32,
    pub inner_color: Color,
    pub outer_color: Color,
    pub image: Option<ImageId>,
}

impl Default for Paint {
    fn default() -> Self {
        Self::color(Color::WHITE)
    }
}

impl Paint {
    /// Solid color paint
    pub fn color(color: Color) -> Self {
        Self {
            xform: Transform::identity(),
            extent: [0.0, 0.0],
            radius: 0.0,
            feather: 1.0,
            inner_color: color,
            outer_color: color,
            image: None,
        }
    }

    /// Linear gradient from `(sx, sy)` to `(ex, ey)`.
    ///
    /// The gradient line is folded into the paint transform; a large offset
    /// keeps the evaluated coordinate positive along the whole line.
    pub fn linear_gradient(
        sx: f32,
        sy: f32,
        ex: f32,
        ey: f32,
        inner_color: Color,
        outer_color: Color,
    ) -> Self {
        const LARGE: f32 = 1e5;

        let mut dx = ex - sx;
        let mut dy = ey - sy;
        let d = (dx * dx + dy * dy).sqrt();
        if d > 0.0001 {
            dx /= d;
            dy /= d;
        } else {
            dx = 0.0;
            dy = 1.0;
        }

        Self {
            xform: Transform {
                a: dy,
                b: -dx,
                c: dx,
                d: dy,
                e: sx - dx * LARGE,
                f: sy - dy * LARGE,
            },
            extent: [LARGE, LARGE + d * 0.5],
            radius: 0.0,
            feather: d.max(1.0),
            inner_color,
            outer_color,
            image: None,
        }
    }

    /// Radial gradient between an inner and an outer radius around a center
    pub fn radial_gradient(
        cx: f32,
        cy: f32,
        in_radius: f32,
        out_radius: f32,
        inner_color: Color,
        outer_color: Color,
    ) -> Self {
        let r = (in_radius + out_radius) * 0.5;
        let f = out_radius - in_radius;

        Self {
            xform: Transform::translate(cx, cy),
            extent: [r, r],
            radius: r,
            feather: f.max(1.0),
            inner_color,
            outer_color,
            image: None,
        }
    }

    /// Rounded-rectangle gradient, used for drop shadows and glows.
    /// `feather` controls how far the blur extends from the rect edge.
    pub fn box_gradient(
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        radius: f32,
        feather: f32,
        inner_color: Color,
        outer_color: Color,
    ) -> Self {
        Self {
            xform: Transform::translate(x + width * 0.5, y + height * 0.5),
            extent: [width * 0.5, height * 0.5],
            radius,
            feather: feather.max(1.0),
            inner_color,
            outer_color,
            image: None,
        }
    }

    /// Image pattern with origin `(ox, oy)`, size, and rotation in radians.
    /// `alpha` modulates the image.
    pub fn image_pattern(
        ox: f32,
        oy: f32,
        width: f32,
        height: f32,
        angle: f32,
        image: ImageId,
        alpha: f32,
    ) -> Self {
        let mut xform = Transform::rotate(angle);
        xform.e = ox;
        xform.f = oy;

        let color = Color::new(1.0, 1.0, 1.0, alpha);
        Self {
            xform,
            extent: [width, height],
            radius: 0.0,
            feather: 0.0,
            inner_color: color,
            outer_color: color,
            image: Some(image),
        }
    }

    /// Scales both paint colors' alpha, used for global alpha and the
    /// thin-stroke coverage compensation.
    pub(crate) fn multiply_alpha(&mut self, alpha: f32) {
        self.inner_color.a *= alpha;
        self.outer_color.a *= alpha;
    }
}

/// Per-channel blend factor
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlendFactor {
    Zero,
    One,
    SrcColor,
    OneMinusSrcColor,
    DstColor,
    OneMinusDstColor,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstAlpha,
    OneMinusDstAlpha,
    SrcAlphaSaturate,
}

/// HTML-canvas style composite operation
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CompositeOperation {
    #[default]
    SourceOver,
    SourceIn,
    SourceOut,
    Atop,
    DestinationOver,
    DestinationIn,
    DestinationOut,
    DestinationAtop,
    Lighter,
    Copy,
    Xor,
}

/// Fully resolved blend state, as handed to the backend
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompositeState {
    pub src_rgb: BlendFactor,
    pub dst_rgb: BlendFactor,
    pub src_alpha: BlendFactor,
    pub dst_alpha: BlendFactor,
}

impl Default for CompositeState {
    fn default() -> Self {
        CompositeOperation::SourceOver.into()
    }
}

impl CompositeState {
    /// Same factor pair for color and alpha
    pub fn with_blend_func(sfactor: BlendFactor, dfactor: BlendFactor) -> Self {
        Self {
            src_rgb: sfactor,
            dst_rgb: dfactor,
            src_alpha: sfactor,
            dst_alpha: dfactor,
        }
    }
}

impl From<CompositeOperation> for CompositeState {
    fn from(op: CompositeOperation) -> Self {
        use BlendFactor::*;
        let (sfactor, dfactor) = match op {
            CompositeOperation::SourceOver => (One, OneMinusSrcAlpha),
            CompositeOperation::SourceIn => (DstAlpha, Zero),
            CompositeOperation::SourceOut => (OneMinusDstAlpha, Zero),
            CompositeOperation::Atop => (DstAlpha, OneMinusSrcAlpha),
            CompositeOperation::DestinationOver => (OneMinusDstAlpha, One),
            CompositeOperation::DestinationIn => (Zero, SrcAlpha),
            CompositeOperation::DestinationOut => (Zero, OneMinusSrcAlpha),
            CompositeOperation::DestinationAtop => (OneMinusDstAlpha, SrcAlpha),
            CompositeOperation::Lighter => (One, One),
            CompositeOperation::Copy => (One, Zero),
            CompositeOperation::Xor => (OneMinusDstAlpha, OneMinusSrcAlpha),
        };
        Self::with_blend_func(sfactor, dfactor)
    }
}

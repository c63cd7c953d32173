//! The render state stack element
//!
//! Everything `save`/`restore` snapshots lives in [`State`]: paints, stroke
//! options, the current transform, the scissor, and text styling. States are
//! plain copies; the stack itself is managed by the context.

use vexel_core::Transform;

use crate::paint::{CompositeOperation, CompositeState, Paint};
use crate::text::{Align, FontId};

/// Path winding direction.
///
/// Counter-clockwise sub-paths fill solid, clockwise ones cut holes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Winding {
    #[default]
    Ccw,
    Cw,
}

impl Winding {
    /// Solid shapes wind counter-clockwise
    pub const SOLID: Winding = Winding::Ccw;
    /// Holes wind clockwise
    pub const HOLE: Winding = Winding::Cw;
}

/// Stroke end-point style
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

/// Stroke corner style
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LineJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

/// Axis-aligned-in-scissor-space clip region.
///
/// The transform places a `2 * extent` rectangle; `extent[0] < 0` means no
/// scissor is active.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Scissor {
    pub xform: Transform,
    pub extent: [f32; 2],
}

impl Default for Scissor {
    fn default() -> Self {
        Self::disabled()
    }
}

impl Scissor {
    /// The no-clip sentinel
    pub fn disabled() -> Self {
        Self {
            xform: Transform {
                a: 0.0,
                b: 0.0,
                c: 0.0,
                d: 0.0,
                e: 0.0,
                f: 0.0,
            },
            extent: [-1.0, -1.0],
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.extent[0] >= 0.0
    }
}

/// One snapshot of the render state
#[derive(Clone, Copy, Debug)]
pub struct State {
    pub composite: CompositeState,
    pub shape_anti_alias: bool,
    pub fill: Paint,
    pub stroke: Paint,
    pub stroke_width: f32,
    pub miter_limit: f32,
    pub line_join: LineJoin,
    pub line_cap: LineCap,
    pub alpha: f32,
    pub xform: Transform,
    pub scissor: Scissor,
    pub font_size: f32,
    pub letter_spacing: f32,
    pub line_height: f32,
    pub font_blur: f32,
    pub text_align: Align,
    pub font: Option<FontId>,
}

impl Default for State {
    fn default() -> Self {
        Self {
            composite: CompositeOperation::SourceOver.into(),
            shape_anti_alias: true,
            fill: Paint::color(vexel_core::Color::WHITE),
            stroke: Paint::color(vexel_core::Color::BLACK),
            stroke_width: 1.0,
            miter_limit: 10.0,
            line_join: LineJoin::Miter,
            line_cap: LineCap::Butt,
            alpha: 1.0,
            xform: Transform::identity(),
            scissor: Scissor::disabled(),
            font_size: 16.0,
            letter_spacing: 0.0,
            line_height: 1.0,
            font_blur: 0.0,
            text_align: Align::default(),
            font: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vexel_core::Color;

    #[test]
    fn test_default_state() {
        let s = State::default();
        assert!(s.shape_anti_alias);
        assert_eq!(s.fill.inner_color, Color::WHITE);
        assert_eq!(s.stroke.inner_color, Color::BLACK);
        assert_eq!(s.stroke_width, 1.0);
        assert_eq!(s.miter_limit, 10.0);
        assert_eq!(s.line_cap, LineCap::Butt);
        assert_eq!(s.line_join, LineJoin::Miter);
        assert_eq!(s.alpha, 1.0);
        assert!(!s.scissor.is_enabled());
        assert_eq!(s.font_size, 16.0);
        assert_eq!(s.line_height, 1.0);
    }

    #[test]
    fn test_scissor_sentinel() {
        let s = Scissor::disabled();
        assert!(!s.is_enabled());
        let s = Scissor {
            xform: Transform::identity(),
            extent: [5.0, 5.0],
        };
        assert!(s.is_enabled());
    }
}

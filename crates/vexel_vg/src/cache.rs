//! The recorded command buffer and the flattened path cache
//!
//! Path construction records [`Command`]s with coordinates already in device
//! space. The first fill, stroke, or bounds query replays them into the
//! [`PathCache`]: polyline points per sub-path with per-segment direction,
//! length, and join metadata. The cache survives until the next
//! `begin_path`, so repeated fills of one shape flatten only once.

use bitflags::bitflags;
use vexel_core::geometry::{poly_area, pt_equals};
use vexel_core::{Bounds, Point};

use crate::backend::{DrawPath, Vertex, VertexRange};
use crate::state::Winding;

pub(crate) const INIT_POINTS_SIZE: usize = 128;
pub(crate) const INIT_PATHS_SIZE: usize = 16;
pub(crate) const INIT_VERTS_SIZE: usize = 256;

/// A recorded path command, with points in device space
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Command {
    MoveTo(Point),
    LineTo(Point),
    /// Two control points, then the end point
    BezierTo(Point, Point, Point),
    Close,
    Winding(Winding),
}

bitflags! {
    /// Per-point join metadata, filled in by join classification
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct PointFlags: u8 {
        /// Sharp corner from the command stream (not a flattened curve point)
        const CORNER = 1 << 0;
        /// The polyline turns left here
        const LEFT = 1 << 1;
        /// The outer side of this join is beveled
        const BEVEL = 1 << 2;
        /// The inner side of this join is beveled
        const INNER_BEVEL = 1 << 3;
    }
}

/// One flattened polyline point
#[derive(Clone, Copy, Debug, Default)]
pub struct PathPoint {
    pub x: f32,
    pub y: f32,
    /// Unit direction to the next point
    pub dx: f32,
    pub dy: f32,
    /// Distance to the next point
    pub len: f32,
    /// Extrusion vector (join bisector)
    pub dmx: f32,
    pub dmy: f32,
    pub flags: PointFlags,
}

/// One flattened sub-path
#[derive(Clone, Copy, Debug, Default)]
pub struct CachePath {
    pub first: usize,
    pub count: usize,
    pub closed: bool,
    /// Number of joins that need bevel geometry
    pub nbevel: usize,
    pub winding: Winding,
    pub convex: bool,
    pub fill: Option<VertexRange>,
    pub stroke: Option<VertexRange>,
}

impl CachePath {
    pub fn to_draw_path(&self) -> DrawPath {
        DrawPath {
            fill: self.fill,
            stroke: self.stroke,
            convex: self.convex,
        }
    }
}

/// Flattened geometry shared by fill and stroke expansion
pub struct PathCache {
    pub points: Vec<PathPoint>,
    pub paths: Vec<CachePath>,
    /// Frame-local tessellation output; ranges in [`CachePath`] index here
    pub verts: Vec<Vertex>,
    pub bounds: Bounds,
}

impl Default for PathCache {
    fn default() -> Self {
        Self::new()
    }
}

impl PathCache {
    pub fn new() -> Self {
        Self {
            points: Vec::with_capacity(INIT_POINTS_SIZE),
            paths: Vec::with_capacity(INIT_PATHS_SIZE),
            verts: Vec::with_capacity(INIT_VERTS_SIZE),
            bounds: Bounds::EMPTY,
        }
    }

    pub fn clear(&mut self) {
        self.points.clear();
        self.paths.clear();
    }

    fn add_path(&mut self) {
        self.paths.push(CachePath {
            first: self.points.len(),
            winding: Winding::Ccw,
            ..CachePath::default()
        });
    }

    fn add_point(&mut self, x: f32, y: f32, flags: PointFlags, dist_tol: f32) {
        let Some(path) = self.paths.last_mut() else {
            return;
        };

        // Merge points closer than the distance tolerance.
        if path.count > 0 {
            if let Some(pt) = self.points.last_mut() {
                if pt_equals(pt.x, pt.y, x, y, dist_tol) {
                    pt.flags |= flags;
                    return;
                }
            }
        }

        self.points.push(PathPoint {
            x,
            y,
            flags,
            ..PathPoint::default()
        });
        path.count += 1;
    }

    fn close_path(&mut self) {
        if let Some(path) = self.paths.last_mut() {
            path.closed = true;
        }
    }

    fn set_path_winding(&mut self, winding: Winding) {
        if let Some(path) = self.paths.last_mut() {
            path.winding = winding;
        }
    }

    fn last_point(&self) -> Option<Point> {
        self.points.last().map(|p| Point::new(p.x, p.y))
    }

    /// Replays the command buffer into polylines. A no-op when the cache
    /// already holds paths, which is what makes repeated fill/stroke of the
    /// same path cheap.
    pub fn flatten(&mut self, commands: &[Command], tess_tol: f32, dist_tol: f32) {
        if !self.paths.is_empty() {
            return;
        }

        for cmd in commands {
            match *cmd {
                Command::MoveTo(p) => {
                    self.add_path();
                    self.add_point(p.x, p.y, PointFlags::CORNER, dist_tol);
                }
                Command::LineTo(p) => {
                    self.add_point(p.x, p.y, PointFlags::CORNER, dist_tol);
                }
                Command::BezierTo(c1, c2, p) => {
                    if let Some(last) = self.last_point() {
                        self.tesselate_bezier(
                            last.x,
                            last.y,
                            c1.x,
                            c1.y,
                            c2.x,
                            c2.y,
                            p.x,
                            p.y,
                            0,
                            PointFlags::CORNER,
                            tess_tol,
                            dist_tol,
                        );
                    }
                }
                Command::Close => self.close_path(),
                Command::Winding(w) => self.set_path_winding(w),
            }
        }

        self.bounds = Bounds::EMPTY;

        for i in 0..self.paths.len() {
            let path = self.paths[i];
            let pts = &mut self.points[path.first..path.first + path.count];

            // A coincident first and last point means the path is closed;
            // drop the duplicate.
            let mut count = path.count;
            if count >= 2 {
                let p0 = pts[count - 1];
                let p1 = pts[0];
                if pt_equals(p0.x, p0.y, p1.x, p1.y, dist_tol) {
                    count -= 1;
                    self.paths[i].closed = true;
                }
            }
            let pts = &mut self.points[path.first..path.first + count];
            self.paths[i].count = count;

            // Enforce winding.
            if count > 2 {
                let area = poly_area(|k| (pts[k].x, pts[k].y), count);
                if (path.winding == Winding::Ccw && area < 0.0)
                    || (path.winding == Winding::Cw && area > 0.0)
                {
                    pts.reverse();
                }
            }

            // Per-segment direction and length, plus shape bounds.
            for j in 0..count {
                let next = pts[(j + 1) % count];
                let p = &mut pts[j];
                p.dx = next.x - p.x;
                p.dy = next.y - p.y;
                p.len = vexel_core::geometry::normalize(&mut p.dx, &mut p.dy);
                self.bounds.include(p.x, p.y);
            }
        }
    }

    /// Adaptive de Casteljau subdivision. A segment is emitted once the
    /// control-point deviation squared drops below `tess_tol` times the
    /// chord length squared, or at depth 10.
    #[allow(clippy::too_many_arguments)]
    fn tesselate_bezier(
        &mut self,
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        x3: f32,
        y3: f32,
        x4: f32,
        y4: f32,
        level: u32,
        flags: PointFlags,
        tess_tol: f32,
        dist_tol: f32,
    ) {
        if level > 10 {
            return;
        }

        let x12 = (x1 + x2) * 0.5;
        let y12 = (y1 + y2) * 0.5;
        let x23 = (x2 + x3) * 0.5;
        let y23 = (y2 + y3) * 0.5;
        let x34 = (x3 + x4) * 0.5;
        let y34 = (y3 + y4) * 0.5;
        let x123 = (x12 + x23) * 0.5;
        let y123 = (y12 + y23) * 0.5;

        let dx = x4 - x1;
        let dy = y4 - y1;
        let d2 = ((x2 - x4) * dy - (y2 - y4) * dx).abs();
        let d3 = ((x3 - x4) * dy - (y3 - y4) * dx).abs();

        if (d2 + d3) * (d2 + d3) < tess_tol * (dx * dx + dy * dy) {
            self.add_point(x4, y4, flags, dist_tol);
            return;
        }

        let x234 = (x23 + x34) * 0.5;
        let y234 = (y23 + y34) * 0.5;
        let x1234 = (x123 + x234) * 0.5;
        let y1234 = (y123 + y234) * 0.5;

        self.tesselate_bezier(
            x1,
            y1,
            x12,
            y12,
            x123,
            y123,
            x1234,
            y1234,
            level + 1,
            PointFlags::empty(),
            tess_tol,
            dist_tol,
        );
        self.tesselate_bezier(
            x1234,
            y1234,
            x234,
            y234,
            x34,
            y34,
            x4,
            y4,
            level + 1,
            flags,
            tess_tol,
            dist_tol,
        );
    }
}

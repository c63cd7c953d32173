//! Scalar geometry helpers and plain shapes
//!
//! The tessellation pipeline is built on a handful of small float routines;
//! they live here so the renderer, backends, and tests share one definition.

/// A 2D point
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[repr(C)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle (origin + size)
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[repr(C)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Intersection of two rects; degenerate overlaps clamp to zero size.
    pub fn intersect(&self, other: &Rect) -> Rect {
        let min_x = self.x.max(other.x);
        let min_y = self.y.max(other.y);
        let max_x = (self.x + self.width).min(other.x + other.width);
        let max_y = (self.y + self.height).min(other.y + other.height);
        Rect {
            x: min_x,
            y: min_y,
            width: (max_x - min_x).max(0.0),
            height: (max_y - min_y).max(0.0),
        }
    }
}

/// Min/max bounds of a shape: `[min_x, min_y, max_x, max_y]` semantics
#[derive(Clone, Copy, Debug, PartialEq)]
#[repr(C)]
pub struct Bounds {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Default for Bounds {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Bounds {
    /// Inverted sentinel; any `include` produces a valid box.
    pub const EMPTY: Bounds = Bounds {
        min_x: 1e6,
        min_y: 1e6,
        max_x: -1e6,
        max_y: -1e6,
    };

    pub fn include(&mut self, x: f32, y: f32) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }
}

/// Cross product of two direction vectors
pub fn cross(dx0: f32, dy0: f32, dx1: f32, dy1: f32) -> f32 {
    dx1 * dy0 - dx0 * dy1
}

/// Normalizes `(x, y)` in place, returning the original length.
/// Vectors shorter than 1e-6 are left untouched.
pub fn normalize(x: &mut f32, y: &mut f32) -> f32 {
    let d = (*x * *x + *y * *y).sqrt();
    if d > 1e-6 {
        let id = 1.0 / d;
        *x *= id;
        *y *= id;
    }
    d
}

/// Whether two points coincide within `tol`
pub fn pt_equals(x1: f32, y1: f32, x2: f32, y2: f32, tol: f32) -> bool {
    let dx = x2 - x1;
    let dy = y2 - y1;
    dx * dx + dy * dy < tol * tol
}

/// Squared distance from `(x, y)` to the segment `(px, py)-(qx, qy)`
pub fn dist_pt_seg(x: f32, y: f32, px: f32, py: f32, qx: f32, qy: f32) -> f32 {
    let pqx = qx - px;
    let pqy = qy - py;
    let mut dx = x - px;
    let mut dy = y - py;
    let d = pqx * pqx + pqy * pqy;
    let mut t = pqx * dx + pqy * dy;
    if d > 0.0 {
        t /= d;
    }
    t = t.clamp(0.0, 1.0);
    dx = px + t * pqx - x;
    dy = py + t * pqy - y;
    dx * dx + dy * dy
}

/// Twice the signed area of triangle abc
pub fn tri_area2(ax: f32, ay: f32, bx: f32, by: f32, cx: f32, cy: f32) -> f32 {
    let abx = bx - ax;
    let aby = by - ay;
    let acx = cx - ax;
    let acy = cy - ay;
    acx * aby - abx * acy
}

/// Signed area of a polygon given as (x, y) accessor over `n` vertices.
/// Positive for counter-clockwise winding.
pub fn poly_area(pts: impl Fn(usize) -> (f32, f32), n: usize) -> f32 {
    let mut area = 0.0;
    let (ax, ay) = pts(0);
    for i in 2..n {
        let (bx, by) = pts(i - 1);
        let (cx, cy) = pts(i);
        area += tri_area2(ax, ay, bx, by, cx, cy);
    }
    area * 0.5
}

/// Snaps `a` to the nearest multiple of `d`
pub fn quantize(a: f32, d: f32) -> f32 {
    (a / d + 0.5).floor() * d
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        let mut x = 3.0;
        let mut y = 4.0;
        let len = normalize(&mut x, &mut y);
        assert!((len - 5.0).abs() < 1e-6);
        assert!((x - 0.6).abs() < 1e-6);
        assert!((y - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_degenerate() {
        let mut x = 0.0;
        let mut y = 0.0;
        assert_eq!(normalize(&mut x, &mut y), 0.0);
        assert_eq!((x, y), (0.0, 0.0));
    }

    #[test]
    fn test_pt_equals_tolerance() {
        assert!(pt_equals(0.0, 0.0, 0.005, 0.0, 0.01));
        assert!(!pt_equals(0.0, 0.0, 0.02, 0.0, 0.01));
    }

    #[test]
    fn test_dist_pt_seg() {
        // Point above the middle of a horizontal segment.
        let d2 = dist_pt_seg(5.0, 3.0, 0.0, 0.0, 10.0, 0.0);
        assert!((d2 - 9.0).abs() < 1e-6);
        // Point past the end clamps to the endpoint.
        let d2 = dist_pt_seg(12.0, 0.0, 0.0, 0.0, 10.0, 0.0);
        assert!((d2 - 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_poly_area_winding() {
        // CCW unit square has positive area.
        let sq = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)];
        let area = poly_area(|i| sq[i], 4);
        assert!((area - 1.0).abs() < 1e-6);
        // Reversed order flips the sign.
        let area = poly_area(|i| sq[3 - i], 4);
        assert!((area + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_quantize() {
        assert!((quantize(1.234, 0.01) - 1.23).abs() < 1e-6);
        assert!((quantize(1.237, 0.01) - 1.24).abs() < 1e-6);
    }

    #[test]
    fn test_rect_intersect() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 5.0, 10.0, 10.0);
        assert_eq!(a.intersect(&b), Rect::new(5.0, 5.0, 5.0, 5.0));
        // Disjoint rects clamp to zero size.
        let c = Rect::new(20.0, 20.0, 1.0, 1.0);
        let i = a.intersect(&c);
        assert_eq!(i.width, 0.0);
        assert_eq!(i.height, 0.0);
    }

    #[test]
    fn test_bounds_include() {
        let mut b = Bounds::EMPTY;
        b.include(2.0, -1.0);
        b.include(-3.0, 4.0);
        assert_eq!(b.min_x, -3.0);
        assert_eq!(b.min_y, -1.0);
        assert_eq!(b.max_x, 2.0);
        assert_eq!(b.max_y, 4.0);
    }
}

//! 2D affine transforms
//!
//! A transform is the top 2x3 part of a 3x3 homogeneous matrix:
//!
//! ```text
//!   [a c e]
//!   [b d f]
//!   [0 0 1]
//! ```
//!
//! mapping a point as `x' = a*x + c*y + e`, `y' = b*x + d*y + f`.

use crate::geometry::Point;

/// 2D affine transform
#[derive(Clone, Copy, Debug, PartialEq)]
#[repr(C)]
pub struct Transform {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    pub const fn identity() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: 0.0,
            f: 0.0,
        }
    }

    pub const fn translate(tx: f32, ty: f32) -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: tx,
            f: ty,
        }
    }

    pub const fn scale(sx: f32, sy: f32) -> Self {
        Self {
            a: sx,
            b: 0.0,
            c: 0.0,
            d: sy,
            e: 0.0,
            f: 0.0,
        }
    }

    /// Rotation by `angle` radians
    pub fn rotate(angle: f32) -> Self {
        let cs = angle.cos();
        let sn = angle.sin();
        Self {
            a: cs,
            b: sn,
            c: -sn,
            d: cs,
            e: 0.0,
            f: 0.0,
        }
    }

    /// Skew along the x axis by `angle` radians
    pub fn skew_x(angle: f32) -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: angle.tan(),
            d: 1.0,
            e: 0.0,
            f: 0.0,
        }
    }

    /// Skew along the y axis by `angle` radians
    pub fn skew_y(angle: f32) -> Self {
        Self {
            a: 1.0,
            b: angle.tan(),
            c: 0.0,
            d: 1.0,
            e: 0.0,
            f: 0.0,
        }
    }

    /// `self = self * other`
    pub fn multiply(&mut self, other: &Transform) {
        let t0 = self.a * other.a + self.b * other.c;
        let t2 = self.c * other.a + self.d * other.c;
        let t4 = self.e * other.a + self.f * other.c + other.e;
        self.b = self.a * other.b + self.b * other.d;
        self.d = self.c * other.b + self.d * other.d;
        self.f = self.e * other.b + self.f * other.d + other.f;
        self.a = t0;
        self.c = t2;
        self.e = t4;
    }

    /// `self = other * self`
    pub fn premultiply(&mut self, other: &Transform) {
        let mut tmp = *other;
        tmp.multiply(self);
        *self = tmp;
    }

    /// Inverse transform, or `None` when the determinant magnitude is
    /// below 1e-6 (callers substitute identity).
    pub fn inverse(&self) -> Option<Transform> {
        let det = f64::from(self.a) * f64::from(self.d) - f64::from(self.c) * f64::from(self.b);
        if det > -1e-6 && det < 1e-6 {
            return None;
        }
        let invdet = 1.0 / det;
        Some(Transform {
            a: (f64::from(self.d) * invdet) as f32,
            c: (f64::from(-self.c) * invdet) as f32,
            e: ((f64::from(self.c) * f64::from(self.f) - f64::from(self.d) * f64::from(self.e))
                * invdet) as f32,
            b: (f64::from(-self.b) * invdet) as f32,
            d: (f64::from(self.a) * invdet) as f32,
            f: ((f64::from(self.b) * f64::from(self.e) - f64::from(self.a) * f64::from(self.f))
                * invdet) as f32,
        })
    }

    /// Apply the transform to a point
    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (
            x * self.a + y * self.c + self.e,
            x * self.b + y * self.d + self.f,
        )
    }

    /// Apply the transform to a [`Point`]
    pub fn apply_point(&self, p: Point) -> Point {
        let (x, y) = self.apply(p.x, p.y);
        Point::new(x, y)
    }

    /// Average of the scale factors along both axes. Used to carry stroke
    /// widths and font sizes into device space.
    pub fn average_scale(&self) -> f32 {
        let sx = (self.a * self.a + self.c * self.c).sqrt();
        let sy = (self.b * self.b + self.d * self.d).sqrt();
        (sx + sy) * 0.5
    }

    /// A transform flips orientation when its determinant is negative.
    pub fn is_flipped(&self) -> bool {
        self.a * self.d - self.c * self.b < 0.0
    }
}

/// Converts degrees to radians
pub fn deg_to_rad(deg: f32) -> f32 {
    deg / 180.0 * std::f32::consts::PI
}

/// Converts radians to degrees
pub fn rad_to_deg(rad: f32) -> f32 {
    rad / std::f32::consts::PI * 180.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: &Transform, b: &Transform, eps: f32) {
        assert!((a.a - b.a).abs() < eps, "{a:?} vs {b:?}");
        assert!((a.b - b.b).abs() < eps, "{a:?} vs {b:?}");
        assert!((a.c - b.c).abs() < eps, "{a:?} vs {b:?}");
        assert!((a.d - b.d).abs() < eps, "{a:?} vs {b:?}");
        assert!((a.e - b.e).abs() < eps, "{a:?} vs {b:?}");
        assert!((a.f - b.f).abs() < eps, "{a:?} vs {b:?}");
    }

    #[test]
    fn test_identity_apply() {
        let t = Transform::identity();
        assert_eq!(t.apply(3.0, 4.0), (3.0, 4.0));
    }

    #[test]
    fn test_translate_then_scale_order() {
        // multiply is A = A*B: point goes through A first, then B.
        let mut t = Transform::translate(1.0, 2.0);
        t.multiply(&Transform::scale(2.0, 2.0));
        assert_eq!(t.apply(0.0, 0.0), (2.0, 4.0));
    }

    #[test]
    fn test_inverse_round_trip() {
        let cases = [
            Transform::translate(5.0, -3.0),
            Transform::scale(2.0, 0.5),
            Transform::rotate(0.7),
            {
                let mut t = Transform::rotate(1.2);
                t.multiply(&Transform::translate(10.0, 20.0));
                t.multiply(&Transform::scale(3.0, 1.5));
                t
            },
        ];
        for m in cases {
            let inv = m.inverse().expect("invertible");
            let back = inv.inverse().expect("invertible");
            assert_close(&back, &m, 1e-4);

            // Applying M then M^-1 is the identity on points.
            let (x, y) = m.apply(7.0, -2.0);
            let (rx, ry) = inv.apply(x, y);
            assert!((rx - 7.0).abs() < 1e-3);
            assert!((ry - -2.0).abs() < 1e-3);
        }
    }

    #[test]
    fn test_inverse_near_singular() {
        // Zero scale collapses the plane; inverse must signal failure.
        let t = Transform::scale(0.0, 1.0);
        assert!(t.inverse().is_none());
        let t = Transform::scale(1e-7, 1e-7);
        assert!(t.inverse().is_none());
    }

    #[test]
    fn test_average_scale() {
        let t = Transform::scale(2.0, 4.0);
        assert!((t.average_scale() - 3.0).abs() < 1e-6);
        // Rotation does not change scale.
        let t = Transform::rotate(0.9);
        assert!((t.average_scale() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_is_flipped() {
        assert!(!Transform::identity().is_flipped());
        assert!(Transform::scale(1.0, -1.0).is_flipped());
    }

    #[test]
    fn test_deg_rad() {
        assert!((deg_to_rad(180.0) - std::f32::consts::PI).abs() < 1e-6);
        assert!((rad_to_deg(std::f32::consts::PI) - 180.0).abs() < 1e-4);
    }
}

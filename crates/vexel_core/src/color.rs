//! Color types and utilities

/// RGBA color with f32 components (0.0 to 1.0)
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[repr(C)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color {
        r: 1.0,
        g: 1.0,
        b: 1.0,
        a: 1.0,
    };
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };
    pub const RED: Color = Color {
        r: 1.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };
    pub const GREEN: Color = Color {
        r: 0.0,
        g: 1.0,
        b: 0.0,
        a: 1.0,
    };
    pub const BLUE: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 1.0,
        a: 1.0,
    };
    pub const TRANSPARENT: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 0.0,
    };

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Create from u8 components (0-255)
    pub fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
            a: a as f32 / 255.0,
        }
    }

    /// Create from hue, saturation, and lightness, all in [0, 1].
    /// Alpha is set to 1.0.
    pub fn hsl(h: f32, s: f32, l: f32) -> Self {
        Self::hsla(h, s, l, 1.0)
    }

    /// Create from hue, saturation, lightness, and alpha, all in [0, 1].
    pub fn hsla(h: f32, s: f32, l: f32, a: f32) -> Self {
        let mut h = h % 1.0;
        if h < 0.0 {
            h += 1.0;
        }
        let s = s.clamp(0.0, 1.0);
        let l = l.clamp(0.0, 1.0);
        let m2 = if l <= 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let m1 = 2.0 * l - m2;
        Self {
            r: hue(h + 1.0 / 3.0, m1, m2).clamp(0.0, 1.0),
            g: hue(h, m1, m2).clamp(0.0, 1.0),
            b: hue(h - 1.0 / 3.0, m1, m2).clamp(0.0, 1.0),
            a,
        }
    }

    /// Set alpha and return new color
    pub fn with_alpha(self, alpha: f32) -> Self {
        Self { a: alpha, ..self }
    }

    /// Linearly interpolate from `self` to `other` by `u` in [0, 1]
    pub fn lerp(self, other: Color, u: f32) -> Self {
        let u = u.clamp(0.0, 1.0);
        let inv = 1.0 - u;
        Self {
            r: self.r * inv + other.r * u,
            g: self.g * inv + other.g * u,
            b: self.b * inv + other.b * u,
            a: self.a * inv + other.a * u,
        }
    }

    /// Convert to u8 array [r, g, b, a]
    pub fn to_rgba8(&self) -> [u8; 4] {
        [
            (self.r * 255.0) as u8,
            (self.g * 255.0) as u8,
            (self.b * 255.0) as u8,
            (self.a * 255.0) as u8,
        ]
    }
}

fn hue(mut h: f32, m1: f32, m2: f32) -> f32 {
    if h < 0.0 {
        h += 1.0;
    }
    if h > 1.0 {
        h -= 1.0;
    }
    if h < 1.0 / 6.0 {
        m1 + (m2 - m1) * h * 6.0
    } else if h < 3.0 / 6.0 {
        m2
    } else if h < 4.0 / 6.0 {
        m1 + (m2 - m1) * (2.0 / 3.0 - h) * 6.0
    } else {
        m1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lerp_endpoints() {
        let c = Color::BLACK.lerp(Color::WHITE, 0.0);
        assert_eq!(c, Color::BLACK);
        let c = Color::BLACK.lerp(Color::WHITE, 1.0);
        assert_eq!(c, Color::WHITE);
    }

    #[test]
    fn test_lerp_clamps() {
        let c = Color::BLACK.lerp(Color::WHITE, 2.0);
        assert_eq!(c, Color::WHITE);
    }

    #[test]
    fn test_hsl_primaries() {
        // Hue 0 at full saturation and half lightness is pure red.
        let c = Color::hsl(0.0, 1.0, 0.5);
        assert!((c.r - 1.0).abs() < 1e-6);
        assert!(c.g.abs() < 1e-6);
        assert!(c.b.abs() < 1e-6);

        // Hue wraps.
        let c2 = Color::hsl(1.0, 1.0, 0.5);
        assert_eq!(c.to_rgba8(), c2.to_rgba8());
    }

    #[test]
    fn test_rgba8_round_trip() {
        let c = Color::from_rgba8(12, 34, 56, 78);
        assert_eq!(c.to_rgba8(), [12, 34, 56, 78]);
    }
}

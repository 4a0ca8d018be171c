//! Core types for spark-flow.
//!
//! Colors, points and terminal cells. Everything the simulator draws and the
//! renderer outputs is expressed in these.

use std::ops::{Add, AddAssign, Mul, Sub};

// =============================================================================
// Color
// =============================================================================

/// RGBA color with 8-bit channels (0-255).
///
/// Using integers for exact comparison - no floating point epsilon needed.
/// Alpha 255 = fully opaque, 0 = fully transparent.
/// Special value: r=-1 means "terminal default" (let terminal pick).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgba {
    pub r: i16,
    pub g: i16,
    pub b: i16,
    pub a: i16,
}

impl Rgba {
    /// Create a new RGBA color.
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self {
            r: r as i16,
            g: g as i16,
            b: b as i16,
            a: a as i16,
        }
    }

    /// Create an opaque RGB color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Create an opaque color from a `[r, g, b]` triple.
    pub const fn from_triple(rgb: [u8; 3]) -> Self {
        Self::rgb(rgb[0], rgb[1], rgb[2])
    }

    /// Terminal default color (let terminal decide).
    pub const TERMINAL_DEFAULT: Self = Self {
        r: -1,
        g: -1,
        b: -1,
        a: -1,
    };

    /// Transparent color.
    pub const TRANSPARENT: Self = Self {
        r: 0,
        g: 0,
        b: 0,
        a: 0,
    };

    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    /// Check if this is the terminal default color.
    #[inline]
    pub const fn is_terminal_default(&self) -> bool {
        self.r == -1
    }

    /// Check if color is fully opaque.
    #[inline]
    pub const fn is_opaque(&self) -> bool {
        self.a == 255
    }

    /// Check if color is fully transparent.
    #[inline]
    pub const fn is_transparent(&self) -> bool {
        self.a == 0
    }

    /// Same color with alpha scaled by `opacity` (clamped to 0..=1).
    #[inline]
    pub fn with_opacity(self, opacity: f32) -> Self {
        if self.is_terminal_default() {
            return self;
        }
        let opacity = opacity.clamp(0.0, 1.0);
        Self {
            a: (self.a as f32 * opacity).round() as i16,
            ..self
        }
    }

    /// Alpha blend src over dst (Porter-Duff "over" operation).
    ///
    /// Terminal default on either side is treated as opaque black.
    #[inline]
    pub fn blend(src: Self, dst: Self) -> Self {
        if src.is_opaque() {
            return src;
        }
        if src.is_transparent() || src.is_terminal_default() {
            return dst;
        }

        let (dr, dg, db, da) = if dst.is_terminal_default() {
            (0i32, 0i32, 0i32, 255i32)
        } else {
            (dst.r as i32, dst.g as i32, dst.b as i32, dst.a as i32)
        };

        let sa = src.a as i32;
        let inv_sa = 255 - sa;

        // out_a = src_a + dst_a * (1 - src_a)
        let out_a = sa + (da * inv_sa) / 255;
        if out_a == 0 {
            return Self::TRANSPARENT;
        }

        let out_r = ((src.r as i32 * sa) + (dr * da * inv_sa / 255)) / out_a;
        let out_g = ((src.g as i32 * sa) + (dg * da * inv_sa / 255)) / out_a;
        let out_b = ((src.b as i32 * sa) + (db * da * inv_sa / 255)) / out_a;

        Self {
            r: out_r.clamp(0, 255) as i16,
            g: out_g.clamp(0, 255) as i16,
            b: out_b.clamp(0, 255) as i16,
            a: out_a.clamp(0, 255) as i16,
        }
    }
}

// =============================================================================
// Point - surface-local coordinates
// =============================================================================

/// A 2D point or vector in surface-local pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean length when treated as a vector.
    #[inline]
    pub fn length(self) -> f32 {
        self.x.hypot(self.y)
    }

    /// Distance to another point.
    #[inline]
    pub fn distance(self, other: Self) -> f32 {
        (self - other).length()
    }
}

impl Add for Point {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Point {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Point {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Point {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

// =============================================================================
// Cell Attributes (bitflags)
// =============================================================================

bitflags::bitflags! {
    /// Text attributes as a bitfield for efficient storage and comparison.
    ///
    /// Combine with bitwise OR: `Attr::BOLD | Attr::UNDERLINE`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Attr: u8 {
        const NONE = 0;
        const BOLD = 1 << 0;
        const DIM = 1 << 1;
        const ITALIC = 1 << 2;
        const UNDERLINE = 1 << 3;
    }
}

// =============================================================================
// Cell - The atomic unit of terminal rendering
// =============================================================================

/// A single terminal cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    /// Unicode codepoint (32 for space).
    pub char: u32,
    /// Foreground color.
    pub fg: Rgba,
    /// Background color.
    pub bg: Rgba,
    /// Attribute flags (bold, italic, etc.).
    pub attrs: Attr,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            char: b' ' as u32,
            fg: Rgba::TERMINAL_DEFAULT,
            bg: Rgba::TERMINAL_DEFAULT,
            attrs: Attr::NONE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blend_opaque_src_wins() {
        let out = Rgba::blend(Rgba::WHITE, Rgba::BLACK);
        assert_eq!(out, Rgba::WHITE);
    }

    #[test]
    fn test_blend_half_alpha() {
        let src = Rgba::new(255, 255, 255, 128);
        let out = Rgba::blend(src, Rgba::BLACK);
        assert!(out.r > 120 && out.r < 135);
        assert_eq!(out.a, 255);
    }

    #[test]
    fn test_with_opacity_scales_alpha() {
        let c = Rgba::rgb(10, 20, 30).with_opacity(0.5);
        assert_eq!(c.a, 128);
        assert_eq!(Rgba::WHITE.with_opacity(2.0).a, 255);
        assert_eq!(Rgba::WHITE.with_opacity(-1.0).a, 0);
    }

    #[test]
    fn test_point_math() {
        let a = Point::new(3.0, 4.0);
        assert_eq!(a.length(), 5.0);
        assert_eq!(a.distance(Point::ZERO), 5.0);
        assert_eq!(a * 2.0, Point::new(6.0, 8.0));
    }
}

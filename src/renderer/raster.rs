//! Raster - RGBA pixel surface with a device scale factor.
//!
//! Drawing happens in logical coordinates; the raster multiplies by `scale`
//! to address device pixels. The scale is re-derived on every resize, so a
//! surface that changes density keeps particle positions aligned with what
//! is drawn.
//!
//! Text is not rasterized. Labels are collected per frame and overlaid by the
//! terminal frame buffer as characters.

use super::Surface;
use crate::types::{Point, Rgba};

/// A text label queued for the current frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub at: Point,
    pub text: String,
    pub color: Rgba,
}

/// Pixel surface. Row-major storage: `index = y * px_width + x`.
#[derive(Debug, Clone)]
pub struct Raster {
    width: f32,
    height: f32,
    scale: f32,
    px_width: usize,
    px_height: usize,
    pixels: Vec<Rgba>,
    background: Rgba,
    labels: Vec<Label>,
}

impl Raster {
    /// Create a raster of `width x height` logical pixels at `scale` device
    /// pixels per logical pixel.
    pub fn new(width: f32, height: f32, scale: f32) -> Self {
        let mut raster = Self {
            width: 0.0,
            height: 0.0,
            scale: 1.0,
            px_width: 0,
            px_height: 0,
            pixels: Vec::new(),
            background: Rgba::BLACK,
            labels: Vec::new(),
        };
        raster.resize(width, height, scale);
        raster
    }

    /// Set the color `clear` resets to.
    pub fn with_background(mut self, background: Rgba) -> Self {
        self.background = background;
        self.clear();
        self
    }

    /// Resize and re-derive the device pixel grid (clears content).
    ///
    /// Non-finite or non-positive scales fall back to 1.0; negative sizes
    /// become 0.
    pub fn resize(&mut self, width: f32, height: f32, scale: f32) {
        let sanitize = |v: f32| if v.is_finite() { v.max(0.0) } else { 0.0 };
        self.width = sanitize(width);
        self.height = sanitize(height);
        self.scale = if scale.is_finite() && scale > 0.0 { scale } else { 1.0 };
        self.px_width = (self.width * self.scale).ceil() as usize;
        self.px_height = (self.height * self.scale).ceil() as usize;
        self.pixels.clear();
        self.pixels
            .resize(self.px_width * self.px_height, self.background);
        self.labels.clear();
    }

    /// Device pixels per logical pixel.
    #[inline]
    pub fn scale(&self) -> f32 {
        self.scale
    }

    #[inline]
    pub fn px_width(&self) -> usize {
        self.px_width
    }

    #[inline]
    pub fn px_height(&self) -> usize {
        self.px_height
    }

    /// Get a device pixel (None if out of bounds).
    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgba> {
        if x < self.px_width && y < self.px_height {
            Some(self.pixels[y * self.px_width + x])
        } else {
            None
        }
    }

    /// Labels queued since the last `begin_frame`.
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// Reset every pixel to the background and drop labels.
    pub fn clear(&mut self) {
        let bg = self.background;
        for px in &mut self.pixels {
            *px = bg;
        }
        self.labels.clear();
    }

    /// Average color of a device pixel block (clipped to the raster).
    pub fn average(&self, x0: usize, y0: usize, w: usize, h: usize) -> Rgba {
        let x1 = (x0 + w).min(self.px_width);
        let y1 = (y0 + h).min(self.px_height);
        if x0 >= x1 || y0 >= y1 {
            return self.background;
        }

        let (mut r, mut g, mut b) = (0u32, 0u32, 0u32);
        for y in y0..y1 {
            for px in &self.pixels[y * self.px_width + x0..y * self.px_width + x1] {
                r += px.r.max(0) as u32;
                g += px.g.max(0) as u32;
                b += px.b.max(0) as u32;
            }
        }
        let n = ((x1 - x0) * (y1 - y0)) as u32;
        Rgba::rgb((r / n) as u8, (g / n) as u8, (b / n) as u8)
    }

    #[inline]
    fn blend_px(&mut self, x: i64, y: i64, color: Rgba) {
        if x < 0 || y < 0 || x as usize >= self.px_width || y as usize >= self.px_height {
            return;
        }
        let idx = y as usize * self.px_width + x as usize;
        self.pixels[idx] = Rgba::blend(color, self.pixels[idx]);
    }

    #[inline]
    fn to_px(&self, p: Point) -> (f32, f32) {
        (p.x * self.scale, p.y * self.scale)
    }

    fn line(&mut self, a: Point, b: Point, color: Rgba) {
        let (ax, ay) = self.to_px(a);
        let (bx, by) = self.to_px(b);
        let steps = (bx - ax).abs().max((by - ay).abs()).ceil().max(1.0) as usize;
        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            let x = ax + (bx - ax) * t;
            let y = ay + (by - ay) * t;
            self.blend_px(x.round() as i64, y.round() as i64, color);
        }
    }
}

impl Surface for Raster {
    fn width(&self) -> f32 {
        self.width
    }

    fn height(&self) -> f32 {
        self.height
    }

    fn begin_frame(&mut self) {
        self.labels.clear();
    }

    fn fill(&mut self, color: Rgba) {
        for px in &mut self.pixels {
            *px = Rgba::blend(color, *px);
        }
    }

    fn point(&mut self, at: Point, size: f32, color: Rgba) {
        let side = (size * self.scale).round().max(1.0) as i64;
        let (cx, cy) = self.to_px(at);
        let x0 = (cx - side as f32 / 2.0).round() as i64;
        let y0 = (cy - side as f32 / 2.0).round() as i64;
        for y in y0..y0 + side {
            for x in x0..x0 + side {
                self.blend_px(x, y, color);
            }
        }
    }

    fn polyline(&mut self, points: &[Point], closed: bool, color: Rgba) {
        for pair in points.windows(2) {
            self.line(pair[0], pair[1], color);
        }
        if closed && points.len() > 2 {
            self.line(points[points.len() - 1], points[0], color);
        }
    }

    fn ring(&mut self, center: Point, radius: f32, color: Rgba) {
        let circumference = std::f32::consts::TAU * radius * self.scale;
        let steps = circumference.ceil().max(8.0) as usize;
        let (cx, cy) = self.to_px(center);
        let r = radius * self.scale;
        for i in 0..steps {
            let angle = std::f32::consts::TAU * i as f32 / steps as f32;
            let x = cx + r * angle.cos();
            let y = cy + r * angle.sin();
            self.blend_px(x.floor() as i64, y.floor() as i64, color);
        }
    }

    fn text(&mut self, at: Point, text: &str, color: Rgba) {
        self.labels.push(Label {
            at,
            text: text.to_string(),
            color,
        });
    }
}

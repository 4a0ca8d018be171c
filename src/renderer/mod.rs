//! Drawing surfaces and terminal output.
//!
//! The simulator draws through the [`Surface`] trait, the only drawing
//! context it knows about. [`Raster`] is the pixel implementation;
//! [`FrameBuffer`] folds a raster into terminal cells and [`DiffRenderer`]
//! writes changed cells to the terminal.
//!
//! ```text
//! ParticleField::tick → Raster (pixels) → FrameBuffer (cells) → DiffRenderer → terminal
//! ```

pub mod buffer;
pub mod diff;
pub mod raster;

pub use buffer::FrameBuffer;
pub use diff::DiffRenderer;
pub use raster::{Label, Raster};

use crate::types::{Point, Rgba};

/// A 2D drawing context in surface-local (logical) pixel coordinates.
pub trait Surface {
    /// Logical width.
    fn width(&self) -> f32;

    /// Logical height.
    fn height(&self) -> f32;

    /// Called once before any drawing in a frame.
    fn begin_frame(&mut self) {}

    /// Blend `color` over the whole surface.
    fn fill(&mut self, color: Rgba);

    /// Draw a square point of side `size` centered at `at`.
    fn point(&mut self, at: Point, size: f32, color: Rgba);

    /// Stroke a polyline; `closed` joins the last point back to the first.
    fn polyline(&mut self, points: &[Point], closed: bool, color: Rgba);

    /// Stroke a circle.
    fn ring(&mut self, center: Point, radius: f32, color: Rgba);

    /// Draw a text label with its left edge at `at`.
    fn text(&mut self, at: Point, text: &str, color: Rgba);
}

// =============================================================================
// RecordingSurface - test double
// =============================================================================

/// A draw call captured by [`RecordingSurface`].
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    BeginFrame,
    Fill(Rgba),
    Point { at: Point, size: f32, color: Rgba },
    Polyline { points: Vec<Point>, closed: bool, color: Rgba },
    Ring { center: Point, radius: f32, color: Rgba },
    Text { at: Point, text: String, color: Rgba },
}

/// Surface that records draw calls instead of rasterizing them.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    pub width: f32,
    pub height: f32,
    pub calls: Vec<DrawCall>,
}

impl RecordingSurface {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            calls: Vec::new(),
        }
    }

    /// Points drawn since the last `clear`.
    pub fn points(&self) -> impl Iterator<Item = (Point, f32, Rgba)> + '_ {
        self.calls.iter().filter_map(|call| match call {
            DrawCall::Point { at, size, color } => Some((*at, *size, *color)),
            _ => None,
        })
    }

    /// Text labels drawn since the last `clear`.
    pub fn labels(&self) -> impl Iterator<Item = &str> + '_ {
        self.calls.iter().filter_map(|call| match call {
            DrawCall::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

impl Surface for RecordingSurface {
    fn width(&self) -> f32 {
        self.width
    }

    fn height(&self) -> f32 {
        self.height
    }

    fn begin_frame(&mut self) {
        self.calls.push(DrawCall::BeginFrame);
    }

    fn fill(&mut self, color: Rgba) {
        self.calls.push(DrawCall::Fill(color));
    }

    fn point(&mut self, at: Point, size: f32, color: Rgba) {
        self.calls.push(DrawCall::Point { at, size, color });
    }

    fn polyline(&mut self, points: &[Point], closed: bool, color: Rgba) {
        self.calls.push(DrawCall::Polyline {
            points: points.to_vec(),
            closed,
            color,
        });
    }

    fn ring(&mut self, center: Point, radius: f32, color: Rgba) {
        self.calls.push(DrawCall::Ring {
            center,
            radius,
            color,
        });
    }

    fn text(&mut self, at: Point, text: &str, color: Rgba) {
        self.calls.push(DrawCall::Text {
            at,
            text: text.to_string(),
            color,
        });
    }
}

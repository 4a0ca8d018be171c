//! FrameBuffer - terminal cells composed from a raster.
//!
//! Each terminal cell shows two vertically stacked logical pixels using the
//! upper half block glyph: foreground is the top half, background the bottom
//! half. Each half averages the device pixels its logical pixel covers, so
//! fractional scales line up with what the raster drew.
//!
//! # Design Decisions
//!
//! - **Flat storage**: `Vec<Cell>` with row-major indexing.
//! - **Labels last**: text labels are written over the composed pixels and
//!   keep the cell background, so they read as floating over the field.
//! - **Wide characters**: measured with `unicode-width`; the cell after a
//!   wide glyph holds a continuation marker (`char == 0`).

use unicode_width::UnicodeWidthChar;

use super::raster::Raster;
use crate::types::{Attr, Cell, Rgba};

/// Upper half block: fg paints the top half of the cell.
const UPPER_HALF: u32 = '\u{2580}' as u32;

/// A 2D buffer of terminal cells.
///
/// Uses flat storage with row-major indexing: `index = y * width + x`
#[derive(Debug, Clone, PartialEq)]
pub struct FrameBuffer {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    /// Create a new buffer filled with default cells.
    pub fn new(width: u16, height: u16) -> Self {
        let size = width as usize * height as usize;
        Self {
            width,
            height,
            cells: vec![Cell::default(); size],
        }
    }

    /// Get buffer width.
    #[inline]
    pub fn width(&self) -> u16 {
        self.width
    }

    /// Get buffer height.
    #[inline]
    pub fn height(&self) -> u16 {
        self.height
    }

    #[inline]
    fn index(&self, x: u16, y: u16) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Check if coordinates are in bounds.
    #[inline]
    pub fn in_bounds(&self, x: u16, y: u16) -> bool {
        x < self.width && y < self.height
    }

    /// Get a cell reference (returns None if out of bounds).
    #[inline]
    pub fn get(&self, x: u16, y: u16) -> Option<&Cell> {
        if self.in_bounds(x, y) {
            Some(&self.cells[self.index(x, y)])
        } else {
            None
        }
    }

    /// Get raw cells slice.
    #[inline]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Resize the buffer (clears content).
    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.cells.clear();
        self.cells
            .resize(width as usize * height as usize, Cell::default());
    }

    /// Set a single cell. Returns true if the cell was in bounds.
    pub fn set_cell(&mut self, x: u16, y: u16, char: u32, fg: Rgba, bg: Rgba, attrs: Attr) -> bool {
        if !self.in_bounds(x, y) {
            return false;
        }
        let idx = self.index(x, y);
        self.cells[idx] = Cell {
            char,
            fg,
            bg,
            attrs,
        };
        true
    }

    /// Draw text starting at (x, y), keeping each cell's background.
    ///
    /// Clipped at the right edge. Returns the number of columns written.
    pub fn draw_text(&mut self, x: u16, y: u16, text: &str, fg: Rgba, attrs: Attr) -> u16 {
        if y >= self.height {
            return 0;
        }
        let mut col = x;
        for ch in text.chars() {
            let w = ch.width().unwrap_or(0) as u16;
            if w == 0 {
                continue;
            }
            if col as u32 + w as u32 > self.width as u32 {
                break;
            }
            let idx = self.index(col, y);
            let bg = self.cells[idx].bg;
            self.cells[idx] = Cell {
                char: ch as u32,
                fg,
                bg,
                attrs,
            };
            if w == 2 {
                let cont = self.index(col + 1, y);
                self.cells[cont].char = 0;
                self.cells[cont].fg = fg;
            }
            col += w;
        }
        col - x
    }

    /// Compose a raster into cells, two logical pixel rows per cell row.
    ///
    /// The buffer is resized to fit the raster's logical size.
    pub fn compose(&mut self, raster: &Raster) {
        use crate::renderer::Surface;

        let cols = raster.width().ceil().min(u16::MAX as f32) as u16;
        let rows = (raster.height() / 2.0).ceil().min(u16::MAX as f32) as u16;
        if (cols, rows) != (self.width, self.height) {
            self.resize(cols, rows);
        }

        let scale = raster.scale();
        for y in 0..rows {
            let (top_y, top_h) = device_span(y as usize * 2, scale);
            let (bottom_y, bottom_h) = device_span(y as usize * 2 + 1, scale);
            for x in 0..cols {
                let (px, pw) = device_span(x as usize, scale);
                let top = raster.average(px, top_y, pw, top_h);
                let bottom = raster.average(px, bottom_y, pw, bottom_h);
                let idx = self.index(x, y);
                self.cells[idx] = Cell {
                    char: UPPER_HALF,
                    fg: top,
                    bg: bottom,
                    attrs: Attr::NONE,
                };
            }
        }

        for label in raster.labels() {
            if label.at.x < 0.0 || label.at.y < 0.0 {
                continue;
            }
            let x = label.at.x as u16;
            let y = (label.at.y / 2.0) as u16;
            self.draw_text(x, y, &label.text, label.color, Attr::BOLD);
        }
    }

    /// Text content of one row (continuation cells skipped).
    pub fn row_text(&self, y: u16) -> String {
        (0..self.width)
            .filter_map(|x| self.get(x, y))
            .filter(|cell| cell.char != 0)
            .filter_map(|cell| char::from_u32(cell.char))
            .collect()
    }
}

/// Device pixels `(start, len)` covered by logical pixel `i` at `scale`.
///
/// Matches the raster's `floor(logical * scale)` mapping, so fractional
/// scales stay aligned. Always at least one pixel wide.
fn device_span(i: usize, scale: f32) -> (usize, usize) {
    let start = (i as f32 * scale).floor() as usize;
    let end = (((i + 1) as f32 * scale).floor() as usize).max(start + 1);
    (start, end - start)
}

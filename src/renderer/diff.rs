//! Differential renderer.
//!
//! The DiffRenderer compares the current frame to the previous frame and only
//! outputs cells that have changed. Particle fields change a lot of cells per
//! frame, but the faded background between trails mostly does not.
//!
//! # Algorithm
//!
//! 1. Wrap output in a synchronized update block
//! 2. For each cell in the new frame:
//!    - If previous frame exists and cell is unchanged: skip
//!    - Otherwise: move (if not sequential), set attrs/colors (if changed), print
//! 3. Flush once
//! 4. Store current frame as previous for next comparison

use std::io::{self, Write};

use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::style::{
    Attribute, Color, Print, SetAttribute, SetBackgroundColor, SetForegroundColor,
};
use crossterm::cursor::{Hide, Show};
use crossterm::event::{DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture};
use crossterm::terminal::{
    BeginSynchronizedUpdate, Clear, ClearType, EndSynchronizedUpdate, EnterAlternateScreen,
    LeaveAlternateScreen,
};

use super::buffer::FrameBuffer;
use crate::types::{Attr, Cell, Rgba};

/// Differential renderer for fullscreen mode.
pub struct DiffRenderer<W: Write> {
    out: W,
    previous: Option<FrameBuffer>,
    last_fg: Option<Rgba>,
    last_bg: Option<Rgba>,
    last_attrs: Attr,
    last_pos: Option<(u16, u16)>,
}

impl DiffRenderer<io::Stdout> {
    /// Renderer writing to stdout.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> DiffRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            previous: None,
            last_fg: None,
            last_bg: None,
            last_attrs: Attr::NONE,
            last_pos: None,
        }
    }

    /// Render a frame, outputting only changed cells.
    ///
    /// Returns the number of cells written.
    pub fn render(&mut self, buffer: &FrameBuffer) -> io::Result<usize> {
        let mut written = 0;

        queue!(self.out, BeginSynchronizedUpdate)?;
        self.reset_state();

        let same_size = self
            .previous
            .as_ref()
            .is_some_and(|prev| prev.width() == buffer.width() && prev.height() == buffer.height());

        for y in 0..buffer.height() {
            for x in 0..buffer.width() {
                let Some(cell) = buffer.get(x, y) else {
                    continue;
                };
                let changed = match (&self.previous, same_size) {
                    (Some(prev), true) => prev.get(x, y) != Some(cell),
                    _ => true,
                };
                if changed {
                    self.render_cell(x, y, cell)?;
                    written += 1;
                }
            }
        }

        queue!(self.out, SetAttribute(Attribute::Reset), EndSynchronizedUpdate)?;
        self.out.flush()?;

        match &mut self.previous {
            Some(prev) if same_size => prev.clone_from(buffer),
            _ => self.previous = Some(buffer.clone()),
        }

        Ok(written)
    }

    /// Enter fullscreen mode: alternate screen, hidden cursor, mouse and
    /// focus reporting.
    pub fn enter_fullscreen(&mut self) -> io::Result<()> {
        queue!(
            self.out,
            EnterAlternateScreen,
            Hide,
            Clear(ClearType::All),
            EnableMouseCapture,
            EnableFocusChange
        )?;
        self.out.flush()?;
        self.invalidate();
        Ok(())
    }

    /// Exit fullscreen mode.
    pub fn exit_fullscreen(&mut self) -> io::Result<()> {
        queue!(
            self.out,
            DisableFocusChange,
            DisableMouseCapture,
            SetAttribute(Attribute::Reset),
            Show,
            LeaveAlternateScreen
        )?;
        self.out.flush()
    }

    /// Invalidate the previous frame. Next render will be a full redraw.
    pub fn invalidate(&mut self) {
        self.previous = None;
    }

    /// Check if we have a previous frame to diff against.
    pub fn has_previous(&self) -> bool {
        self.previous.is_some()
    }

    /// Consume the renderer, returning the writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn reset_state(&mut self) {
        self.last_fg = None;
        self.last_bg = None;
        self.last_attrs = Attr::NONE;
        self.last_pos = None;
    }

    fn render_cell(&mut self, x: u16, y: u16, cell: &Cell) -> io::Result<()> {
        // Continuation of a wide glyph: the glyph itself covers it
        if cell.char == 0 {
            self.last_pos = Some((x, y));
            return Ok(());
        }

        let sequential = matches!(self.last_pos, Some((lx, ly)) if ly == y && lx + 1 == x);
        if !sequential {
            queue!(self.out, MoveTo(x, y))?;
        }

        if cell.attrs != self.last_attrs {
            queue!(self.out, SetAttribute(Attribute::Reset))?;
            if cell.attrs.contains(Attr::BOLD) {
                queue!(self.out, SetAttribute(Attribute::Bold))?;
            }
            if cell.attrs.contains(Attr::DIM) {
                queue!(self.out, SetAttribute(Attribute::Dim))?;
            }
            if cell.attrs.contains(Attr::ITALIC) {
                queue!(self.out, SetAttribute(Attribute::Italic))?;
            }
            if cell.attrs.contains(Attr::UNDERLINE) {
                queue!(self.out, SetAttribute(Attribute::Underlined))?;
            }
            // Reset clears colors too
            self.last_fg = None;
            self.last_bg = None;
            self.last_attrs = cell.attrs;
        }

        if self.last_fg != Some(cell.fg) {
            queue!(self.out, SetForegroundColor(to_color(cell.fg)))?;
            self.last_fg = Some(cell.fg);
        }
        if self.last_bg != Some(cell.bg) {
            queue!(self.out, SetBackgroundColor(to_color(cell.bg)))?;
            self.last_bg = Some(cell.bg);
        }

        let ch = char::from_u32(cell.char).unwrap_or(' ');
        queue!(self.out, Print(ch))?;
        self.last_pos = Some((x, y));
        Ok(())
    }
}

fn to_color(c: Rgba) -> Color {
    if c.is_terminal_default() {
        Color::Reset
    } else {
        Color::Rgb {
            r: c.r.clamp(0, 255) as u8,
            g: c.g.clamp(0, 255) as u8,
            b: c.b.clamp(0, 255) as u8,
        }
    }
}

/// Terminal back end: double-buffered, diff-based screen.
///
/// How it works:
///   1. Each frame is composed into the `front` buffer
///   2. Every cell is compared with `back` (what the terminal shows now)
///   3. Terminal commands are queued only for cells that changed
///   4. Everything is flushed once, then front/back swap
///
/// `MapSurface` exposes a rectangle of the front buffer as a `Surface` so
/// the grid renderer can draw into it without knowing about terminals.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::ui::palette;
use crate::ui::surface::Surface;

/// Explicit background for every "empty" cell, so gaps between rows match
/// the cells instead of the terminal's own default.
pub const BASE_BG: Color = Color::Rgb { r: 12, g: 12, b: 16 };

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct TermCell {
    pub ch: char,
    pub fg: Color,
    pub bg: Color,
}

impl TermCell {
    pub const BLANK: TermCell = TermCell { ch: ' ', fg: Color::White, bg: BASE_BG };

    /// Differs from any real cell, so every position gets repainted.
    const INVALID: TermCell = TermCell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };
}

/// Rectangle in terminal cells.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Rect {
    pub x: usize,
    pub y: usize,
    pub w: usize,
    pub h: usize,
}

impl Rect {
    pub fn new(x: usize, y: usize, w: usize, h: usize) -> Self {
        Rect { x, y, w, h }
    }
}

// ── FrameBuffer: a 2D grid of TermCells ──

pub struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<TermCell>,
}

impl FrameBuffer {
    pub fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![TermCell::BLANK; w * h] }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![TermCell::BLANK; w * h];
        }
    }

    pub fn clear(&mut self) {
        self.cells.fill(TermCell::BLANK);
    }

    pub fn set(&mut self, x: usize, y: usize, cell: TermCell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    pub fn get(&self, x: usize, y: usize) -> TermCell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            TermCell::BLANK
        }
    }

    /// Write `s` at `(x, y)`, one char per column, stopping at `max_x`.
    /// Returns the column after the last char written.
    pub fn put_str(&mut self, x: usize, y: usize, max_x: usize, s: &str, fg: Color, bg: Color) -> usize {
        let mut cx = x;
        for ch in s.chars() {
            if cx >= max_x.min(self.width) {
                break;
            }
            self.set(cx, y, TermCell { ch, fg, bg });
            cx += 1;
        }
        cx
    }

    pub fn fill(&mut self, area: Rect, bg: Color) {
        for y in area.y..area.y + area.h {
            for x in area.x..area.x + area.w {
                self.set(x, y, TermCell { ch: ' ', fg: Color::White, bg });
            }
        }
    }
}

// ── Screen ──

pub struct Screen {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
}

impl Screen {
    pub fn new() -> Self {
        Screen {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(BASE_BG),
            Clear(ClearType::All)
        )?;
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.resize(tw as usize, th as usize)?;
        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    /// Adopt a new terminal size; the next flush repaints everything.
    pub fn resize(&mut self, w: usize, h: usize) -> io::Result<()> {
        self.front.resize(w, h);
        self.back.resize(w, h);
        self.back.cells.fill(TermCell::INVALID);
        queue!(self.writer, SetBackgroundColor(BASE_BG), Clear(ClearType::All))
    }

    pub fn size(&self) -> (usize, usize) {
        (self.front.width(), self.front.height())
    }

    /// Clear the front buffer and hand it out for composing.
    pub fn begin_frame(&mut self) -> &mut FrameBuffer {
        self.front.clear();
        &mut self.front
    }

    /// Emit the changed cells and swap buffers.
    pub fn present(&mut self) -> io::Result<()> {
        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        queue!(self.writer, SetForegroundColor(last_fg), SetBackgroundColor(last_bg))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    continue;
                }

                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                cursor_at = Some((x + 1, y));
            }
        }

        self.writer.flush()
    }
}

// ── MapSurface: a region of the frame buffer as a drawing surface ──

pub struct MapSurface<'a> {
    buf: &'a mut FrameBuffer,
    region: Rect,
    /// Terminal columns per unit of cell height; 2 keeps cells roughly square.
    glyph_columns: u32,
}

impl<'a> MapSurface<'a> {
    pub fn new(buf: &'a mut FrameBuffer, region: Rect, glyph_columns: u32) -> Self {
        MapSurface { buf, region, glyph_columns: glyph_columns.max(1) }
    }

    /// Buffer position for surface-local `(x, y)`, clipped to the region.
    fn locate(&self, x: u32, y: u32) -> Option<(usize, usize)> {
        let (x, y) = (x as usize, y as usize);
        (x < self.region.w && y < self.region.h).then_some((self.region.x + x, self.region.y + y))
    }
}

impl Surface for MapSurface<'_> {
    fn dimensions(&self) -> (u32, u32) {
        (self.region.w as u32, self.region.h as u32)
    }

    fn clear(&mut self) {
        self.buf.fill(self.region, BASE_BG);
    }

    fn measure_glyph(&self, _glyph: char, size: u32) -> u32 {
        size * self.glyph_columns
    }

    fn fill_rect(&mut self, x: u32, y: u32, w: u32, h: u32, color: &str) {
        let bg = palette::parse(color);
        for dy in 0..h {
            for dx in 0..w {
                if let Some((bx, by)) = self.locate(x + dx, y + dy) {
                    self.buf.set(bx, by, TermCell { ch: ' ', fg: Color::White, bg });
                }
            }
        }
    }

    fn draw_glyph(&mut self, x: u32, y: u32, glyph: char, color: &str) {
        if let Some((bx, by)) = self.locate(x, y) {
            let bg = self.buf.get(bx, by).bg;
            self.buf.set(bx, by, TermCell { ch: glyph, fg: palette::parse(color), bg });
        }
    }
}

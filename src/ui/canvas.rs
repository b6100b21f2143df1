/// Double-buffered, diff-based terminal renderer.
///
/// Each frame is composed into the `front` buffer, compared cell by cell
/// against `back` (the previous frame), and only the differences are
/// emitted. Commands are batched with `queue!` and flushed once. This is
/// what keeps a 200 Hz frame loop flicker-free over ssh.
///
/// Game boards address the screen in game cells: one game cell is two
/// terminal columns, and the board area starts below a reserved HUD row.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

/// One game cell spans two terminal columns, which makes boards roughly
/// square on common monospace fonts.
pub const CELL_W: usize = 2;

pub const HUD_ROW: usize = 0;
/// First terminal row of the game board area.
pub const MAP_ROW: usize = 2;

/// Explicit dark background for every "empty" cell. Using the same RGB
/// for Clear and for cell backgrounds keeps VTE terminals from showing
/// their own default color in inter-row gap pixels.
pub const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

/// Playfield size available to a game, in game cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Viewport {
    pub cols: usize,
    pub rows: usize,
}

// ── Cell ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    const BASE_BG: Color = BASE_BG;

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Sentinel that differs from any composable cell, so filling `back`
    /// with it forces a full repaint on the next diff.
    const INVALID: Cell = Cell { ch: '\u{0}', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        let bg = match bg {
            Color::Reset => Cell::BASE_BG,
            other => other,
        };
        Cell { ch, fg, bg }
    }
}

// ── FrameBuffer ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }
}

// ── Screen ──

pub struct Screen {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
}

impl Screen {
    pub fn new() -> Self {
        Screen {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        self.back.cells.fill(Cell::INVALID);

        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    /// Board area currently available to a game, in game cells.
    pub fn viewport(&self) -> Viewport {
        Viewport {
            cols: self.term_w / CELL_W,
            rows: self.term_h.saturating_sub(MAP_ROW),
        }
    }

    /// Force a full repaint on the next `present()`. Called on scene
    /// transitions so stale pixels never survive a layout change.
    pub fn invalidate(&mut self) -> io::Result<()> {
        self.back.cells.fill(Cell::INVALID);
        queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        Ok(())
    }

    /// Start a frame: pick up terminal resizes and blank the front buffer.
    pub fn begin_frame(&mut self) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.invalidate()?;
        }
        self.front.clear();
        Ok(())
    }

    pub fn canvas(&mut self) -> Canvas<'_> {
        Canvas { buf: &mut self.front }
    }

    /// Diff front against back, emit only changed cells, swap buffers.
    pub fn present(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Explicit base colors at frame start. ResetColor would fall back
        // to the terminal's native default, which may differ from BASE_BG.
        queue!(
            self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    need_move = true;
                    continue;
                }

                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
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

                last_x = x;
                last_y = y;
            }
        }

        self.writer.flush()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }
}

// ── Canvas: the drawing surface handed to scenes and games ──

pub struct Canvas<'a> {
    buf: &'a mut FrameBuffer,
}

impl Canvas<'_> {
    pub fn width(&self) -> usize {
        self.buf.width
    }

    pub fn height(&self) -> usize {
        self.buf.height
    }

    /// Write a string at raw terminal coordinates, one column per char.
    pub fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        let mut cx = x;
        for ch in s.chars() {
            if cx >= self.buf.width {
                break;
            }
            self.buf.set(cx, y, Cell::new(ch, fg, bg));
            cx += 1;
        }
    }

    /// Write a string centered horizontally on a raw terminal row.
    pub fn put_str_centered(&mut self, y: usize, s: &str, fg: Color, bg: Color) {
        let x = self.buf.width.saturating_sub(s.chars().count()) / 2;
        self.put_str(x, y, s, fg, bg);
    }

    /// Flood a raw terminal row with a background color.
    pub fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.buf.width {
            self.buf.set(x, y, Cell::new(' ', Color::White, bg));
        }
    }

    /// Standard HUD bar: dark blue strip across the top row.
    pub fn hud(&mut self, text: &str) {
        let bg = Color::Rgb { r: 20, g: 20, b: 60 };
        self.fill_row(HUD_ROW, bg);
        self.put_str(0, HUD_ROW, text, Color::White, bg);
    }

    /// Paint one game cell: two terminal columns at the board offset.
    pub fn game_cell(&mut self, gx: i32, gy: i32, c0: char, c1: char, fg: Color, bg: Color) {
        if gx < 0 || gy < 0 {
            return;
        }
        let col = gx as usize * CELL_W;
        let row = MAP_ROW + gy as usize;
        self.buf.set(col, row, Cell::new(c0, fg, bg));
        self.buf.set(col + 1, row, Cell::new(c1, fg, bg));
    }

    /// Paint a game cell with the same glyph in both columns.
    pub fn game_block(&mut self, gx: i32, gy: i32, ch: char, fg: Color, bg: Color) {
        self.game_cell(gx, gy, ch, ch, fg, bg);
    }

    /// Text positioned in game-cell coordinates (board-relative labels).
    pub fn game_text(&mut self, gx: i32, gy: i32, s: &str, fg: Color, bg: Color) {
        if gx < 0 || gy < 0 {
            return;
        }
        self.put_str(gx as usize * CELL_W, MAP_ROW + gy as usize, s, fg, bg);
    }
}

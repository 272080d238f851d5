/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// One tile is two terminal columns by one row. Movers live in pixel space
/// and are snapped to the nearest cell; anything above the grid (Harry
/// mid-jump in the headroom) is simply not drawn.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use henhouse::domain::entity::{Direction, EntityKind, EntitySnapshot, HarryState, HenState};
use henhouse::domain::geometry::TileSize;
use henhouse::domain::tile::ContentTag;
use henhouse::sim::event::DeathCause;
use henhouse::sim::level::Level;
use henhouse::sim::status::Status;

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: [u8; 4],
    ch_len: u8,
    fg: Color,
    bg: Color,
    wide: bool,    // this char occupies 2 terminal columns
    cont: bool,    // right half of a wide char (skip render)
}

impl Cell {
    /// Explicit background for every empty cell, so inter-row gaps match.
    const BASE_BG: Color = Color::Rgb { r: 18, g: 24, b: 40 };

    const BLANK: Cell = Cell {
        ch: [b' ', 0, 0, 0],
        ch_len: 1,
        fg: Color::White,
        bg: Cell::BASE_BG,
        wide: false,
        cont: false,
    };

    const WIDE_CONT: Cell = Cell {
        ch: [0; 4],
        ch_len: 0,
        fg: Color::White,
        bg: Cell::BASE_BG,
        wide: false,
        cont: true,
    };

    /// Sentinel that differs from any real cell; forces a full repaint.
    const INVALID: Cell = Cell {
        ch: [b'?', 0, 0, 0],
        ch_len: 1,
        fg: Color::Magenta,
        bg: Color::Magenta,
        wide: false,
        cont: false,
    };

    #[inline]
    fn norm_bg(bg: Color) -> Color {
        match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        }
    }

    fn from_char(c: char, fg: Color, bg: Color) -> Self {
        let mut cell = Self::BLANK;
        cell.ch_len = c.encode_utf8(&mut cell.ch).len() as u8;
        cell.fg = fg;
        cell.bg = Self::norm_bg(bg);
        cell
    }

    fn from_char_wide(c: char, bg: Color) -> Self {
        let mut cell = Self::from_char(c, Color::Reset, bg);
        cell.wide = true;
        cell
    }

    fn as_str(&self) -> &str {
        std::str::from_utf8(&self.ch[..self.ch_len as usize]).unwrap_or(" ")
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

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

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width {
                break;
            }
            self.set(x + i, y, Cell::from_char(ch, fg, bg));
        }
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::from_char(' ', Color::White, bg));
        }
    }
}

// ── Layout ──

/// Terminal columns per tile.
const CELL_W: usize = 2;
const HUD_ROW: usize = 0;
const NAME_ROW: usize = 1;
const MAP_ROW: usize = 2;

const HUD_BG: Color = Color::Rgb { r: 60, g: 30, b: 10 };
const FLOOR_FG: Color = Color::Rgb { r: 230, g: 150, b: 60 };
const FLOOR_BG: Color = Color::Rgb { r: 120, g: 60, b: 20 };
const LADDER_FG: Color = Color::Rgb { r: 120, g: 220, b: 120 };
const LIFT_FG: Color = Color::Rgb { r: 200, g: 200, b: 255 };
const GOLD: Color = Color::Rgb { r: 255, g: 220, b: 50 };
const MSG_BG: Color = Color::Rgb { r: 200, g: 180, b: 50 };

/// Overlay the driver wants on top of the playfield.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Banner {
    None,
    GetReady,
    Paused,
    Died(DeathCause),
    Tally,
    GameOver,
    Victory,
}

/// Top-left terminal cell (relative to the map origin) for a pixel position.
fn cell_of(ts: TileSize, x: i32, y: i32) -> (i32, i32) {
    ts.pixel_to_tile(x + ts.width / 2, y + ts.height / 2)
}

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_banner: Option<Banner>,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_banner: None,
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

    pub fn render(&mut self, level: &Level, status: &Status, banner: Banner, anim_tick: u32) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        if self.last_banner != Some(banner) {
            self.back.cells.fill(Cell::INVALID);
            self.last_banner = Some(banner);
        }

        self.front.clear();
        self.compose_hud(level, status);
        self.compose_map(level);
        self.compose_movers(level, banner, anim_tick);
        self.compose_banner(level, status, banner, anim_tick);

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        queue!(self.writer, SetForegroundColor(Color::White), SetBackgroundColor(Cell::BASE_BG))?;

        for y in 0..self.front.height {
            let mut x = 0;
            while x < self.front.width {
                let cell = self.front.get(x, y);
                let prev = self.back.get(x, y);

                if cell.cont {
                    if cell != prev {
                        need_move = true;
                    }
                    x += 1;
                    continue;
                }

                let cont_changed = cell.wide
                    && x + 1 < self.front.width
                    && self.front.get(x + 1, y) != self.back.get(x + 1, y);

                if cell == prev && !cont_changed {
                    need_move = true;
                    x += 1;
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

                queue!(self.writer, Print(cell.as_str()))?;

                if cell.wide {
                    last_x = x + 1;
                    x += 2;
                } else {
                    last_x = x;
                    x += 1;
                }
                last_y = y;
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose_hud(&mut self, level: &Level, status: &Status) {
        self.front.fill_row(HUD_ROW, HUD_BG);
        let hud = format!(
            " SCORE {:06}  LIVES {}  LEVEL {:<2}  BONUS {:<5}  TIME {:<3}",
            status.score, status.lives, status.level + 1, status.bonus, status.time(),
        );
        self.front.put_str(0, HUD_ROW, &hud, Color::White, HUD_BG);

        let name = format!(" {}   eggs {}/{}", level.name, level.eggs_collected, level.egg_total);
        self.front.put_str(0, NAME_ROW, &name, GOLD, Color::Reset);
    }

    fn compose_map(&mut self, level: &Level) {
        for ty in 0..level.map.rows() {
            for tx in 0..level.map.cols() {
                let col = tx as usize * CELL_W;
                let row = MAP_ROW + ty as usize;
                self.compose_tile(level.map.tile_at(tx, ty), col, row);
            }
        }
    }

    fn compose_tile(&mut self, tag: ContentTag, col: usize, row: usize) {
        let (c0, c1, fg, bg) = match tag {
            ContentTag::None => (' ', ' ', Color::Reset, Color::Reset),
            ContentTag::Floor => ('▀', '▀', FLOOR_FG, FLOOR_BG),
            ContentTag::Ladder => ('╠', '╣', LADDER_FG, Color::Reset),
            ContentTag::Egg => {
                self.front.set(col, row, Cell::from_char_wide('🥚', Color::Reset));
                self.front.set(col + 1, row, Cell::WIDE_CONT);
                return;
            }
            ContentTag::Grain => (':', ':', GOLD, Color::Reset),
        };
        self.front.set(col, row, Cell::from_char(c0, fg, bg));
        self.front.set(col + 1, row, Cell::from_char(c1, fg, bg));
    }

    /// Place one mover cell, clipped to the map area.
    fn put_mover(&mut self, level: &Level, tx: i32, ty: i32, cell: Cell, second: Cell) {
        if tx < 0 || ty < 0 || tx >= level.map.cols() || ty >= level.map.rows() {
            return;
        }
        let col = tx as usize * CELL_W;
        let row = MAP_ROW + ty as usize;
        self.front.set(col, row, cell);
        self.front.set(col + 1, row, second);
    }

    fn compose_movers(&mut self, level: &Level, banner: Banner, anim_tick: u32) {
        let ts = level.tile_size();
        for snap in level.snapshots() {
            let (tx, ty) = cell_of(ts, snap.x, snap.y);
            match snap.kind {
                EntityKind::Lift => {
                    let c = Cell::from_char('▄', LIFT_FG, Color::Reset);
                    self.put_mover(level, tx, ty, c, c);
                }
                EntityKind::Hen(state) => self.compose_hen(level, &snap, state, tx, ty),
                EntityKind::Harry(state) => {
                    // Flash Harry while the death banner is up.
                    if matches!(banner, Banner::Died(_)) && (anim_tick / 2) % 2 == 1 {
                        continue;
                    }
                    self.compose_harry(level, &snap, state, tx, ty);
                }
            }
        }
    }

    fn compose_hen(&mut self, level: &Level, snap: &EntitySnapshot, state: HenState, tx: i32, ty: i32) {
        let head = Cell::from_char_wide('🐔', Color::Reset);
        self.put_mover(level, tx, ty, head, Cell::WIDE_CONT);
        let legs = match (state, snap.direction) {
            (HenState::Eating, _) => "vv",
            (_, Direction::Left) => "<^",
            (_, Direction::Right) => "^>",
            _ => "||",
        };
        let fg = Color::Rgb { r: 90, g: 200, b: 255 };
        let mut it = legs.chars().map(|c| Cell::from_char(c, fg, Color::Reset));
        if let (Some(a), Some(b)) = (it.next(), it.next()) {
            self.put_mover(level, tx, ty + 1, a, b);
        }
    }

    fn compose_harry(&mut self, level: &Level, snap: &EntitySnapshot, state: HarryState, tx: i32, ty: i32) {
        if state == HarryState::Splat {
            let c = Cell::from_char_wide('💥', Color::Reset);
            self.put_mover(level, tx, ty + 1, c, Cell::WIDE_CONT);
            return;
        }
        let head = Cell::from_char_wide('🧑', Color::Reset);
        self.put_mover(level, tx, ty, head, Cell::WIDE_CONT);

        let walking = snap.frame % 2 == 0;
        let legs = match (state, snap.direction) {
            (HarryState::Jumping | HarryState::Falling, _) => "/\\",
            (_, Direction::Up | Direction::Down) => if walking { "|\\" } else { "/|" },
            (_, Direction::Left) => if walking { "/|" } else { "||" },
            (_, Direction::Right) => if walking { "|\\" } else { "||" },
        };
        let fg = Color::Rgb { r: 255, g: 255, b: 255 };
        let mut it = legs.chars().map(|c| Cell::from_char(c, fg, Color::Reset));
        if let (Some(a), Some(b)) = (it.next(), it.next()) {
            self.put_mover(level, tx, ty + 1, a, b);
        }
    }

    fn compose_banner(&mut self, level: &Level, status: &Status, banner: Banner, anim_tick: u32) {
        let map_h = level.map.rows().max(0) as usize;
        let view_cols = level.map.cols().max(0) as usize * CELL_W;
        let msg_row = MAP_ROW + map_h + 1;
        let help_row = msg_row + 1;

        let text = match banner {
            Banner::None => String::new(),
            Banner::GetReady => format!("GET READY  ·  {}", level.name),
            Banner::Paused => {
                if (anim_tick / 8) % 2 == 0 { "▶  PAUSED  ◀".to_string() } else { "   PAUSED   ".to_string() }
            }
            Banner::Died(cause) => match cause {
                DeathCause::Splat => "SPLAT!".to_string(),
                DeathCause::HenCollision => "PECKED BY A HEN".to_string(),
                DeathCause::LiftSquish => "SQUASHED BY THE LIFT".to_string(),
                DeathCause::TimeUp => "OUT OF TIME".to_string(),
            },
            Banner::Tally => format!("WELL DONE!  BONUS {}", status.bonus),
            Banner::GameOver => format!("GAME OVER  ·  FINAL SCORE {}  ·  ENTER: quit", status.score),
            Banner::Victory => format!("ALL COOPS CLEARED  ·  FINAL SCORE {}  ·  ENTER: quit", status.score),
        };

        if !text.is_empty() && msg_row < self.front.height {
            self.front.fill_row(msg_row, MSG_BG);
            let len = text.chars().count();
            let cx = view_cols.saturating_sub(len) / 2;
            self.front.put_str(cx, msg_row, &text, Color::Black, MSG_BG);
        }

        if help_row < self.front.height {
            let help = " ←→ walk  ↑↓ climb  SPACE jump  P pause  Q quit";
            self.front.put_str(0, help_row, help, Color::DarkGrey, Color::Reset);
        }
    }
}

/// Presentation layer: double-buffered, diff-based terminal renderer.
///
///   1. Compose the next frame into `front` (array of Cell)
///   2. Compare each cell with `back` (previous frame)
///   3. Emit terminal commands only for cells that changed, batched with `queue!`
///   4. Swap front/back
///
/// Each grid cell is two terminal columns wide. The map scrolls vertically
/// to keep the player centered; below the surface, cells outside the
/// player's view radius are drawn as unexplored rock.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::entity::AnimationState;
use crate::domain::tile::{Hardness, OreKind, TileType, UpgradeKind};
use crate::sim::world::{Phase, WorldState};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Same RGB for Clear and every blank cell so the row gaps match.
    const BASE_BG: Color = Color::Rgb { r: 18, g: 16, b: 24 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Never equal to a composed cell; forces a full repaint.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        let bg = if bg == Color::Reset { Cell::BASE_BG } else { bg };
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
            *self = FrameBuffer::new(w, h);
        }
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
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::new(' ', Color::White, bg));
        }
    }
}

// ── Layout ──

const CELL_W: usize = 2;
const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;
/// HUD + gap above the map, gap + help below.
const RESERVED_ROWS: usize = MAP_ROW + 2;

const HUD_BG: Color = Color::Rgb { r: 40, g: 30, b: 20 };
const SKY: Color = Color::Rgb { r: 70, g: 110, b: 170 };
const TUNNEL: Color = Color::Rgb { r: 30, g: 24, b: 20 };
const FOG: Color = Color::Rgb { r: 10, g: 9, b: 12 };
const STATION: Color = Color::Rgb { r: 60, g: 140, b: 70 };

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_phase: Option<Phase>,
    view_radius: f32,
    key_release: bool,
}

impl Renderer {
    pub fn new(view_radius: f32) -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_phase: None,
            view_radius,
            key_release: false,
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
        self.invalidate();
        Ok(())
    }

    /// Ask the terminal for Release events. Returns whether it agreed.
    pub fn enable_key_release(&mut self) -> bool {
        if !matches!(terminal::supports_keyboard_enhancement(), Ok(true)) {
            return false;
        }
        let flags = KeyboardEnhancementFlags::REPORT_EVENT_TYPES;
        self.key_release = execute!(self.writer, PushKeyboardEnhancementFlags(flags)).is_ok();
        self.key_release
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        if self.key_release {
            execute!(self.writer, PopKeyboardEnhancementFlags)?;
        }
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    /// Force a full repaint on the next frame (new world, resize).
    pub fn invalidate(&mut self) {
        self.back.cells.fill(Cell::INVALID);
    }

    pub fn render(&mut self, world: &WorldState) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.invalidate();
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        if self.last_phase != Some(world.phase) {
            self.invalidate();
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_phase = Some(world.phase);
        }

        self.front.cells.fill(Cell::BLANK);
        match world.phase {
            Phase::Playing => self.compose_game(world),
            Phase::GameOver => self.compose_game_over(world),
        }

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        queue!(self.writer, SetForegroundColor(last_fg), SetBackgroundColor(last_bg))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) { continue; }

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

    // ── Compose ──

    fn compose_game(&mut self, w: &WorldState) {
        self.compose_hud(w);

        let view_h = self.term_h.saturating_sub(RESERVED_ROWS).max(1).min(w.grid.height());
        let top = camera_top(w.player.y, view_h, w.grid.height());
        let radius = self.view_radius * w.player.view_distance_multiplier;
        let progress = w.drill.progress().zip(w.drill.target);

        for vy in 0..view_h {
            let gy = top + vy;
            let row = MAP_ROW + vy;
            for gx in 0..w.grid.width() {
                let col = gx * CELL_W;
                if col + 1 >= self.front.width { break; }

                let [left, right] = if is_visible(w, gx, gy, radius) {
                    cell_glyph(w, gx, gy)
                } else {
                    [Cell::new(' ', Color::White, FOG); 2]
                };
                let [left, right] = match progress {
                    Some((p, (tx, ty))) if (tx, ty) == (gx, gy) => crack(left, right, p),
                    _ => [left, right],
                };
                self.front.set(col, row, left);
                self.front.set(col + 1, row, right);
            }
        }

        let help_row = MAP_ROW + view_h + 1;
        self.front.put_str(
            1, help_row,
            "Arrows/WASD: move & aim   Space: drill on/off   F: refuel   Q: quit",
            Color::DarkGrey, Color::Reset,
        );
    }

    fn compose_hud(&mut self, w: &WorldState) {
        self.front.fill_row(HUD_ROW, HUD_BG);

        const GAUGE: usize = 12;
        let filled = (w.player.fuel_ratio() * GAUGE as f32).round() as usize;
        let gauge: String = (0..GAUGE).map(|i| if i < filled { '#' } else { '.' }).collect();
        let fuel_color = match w.player.fuel_ratio() {
            r if r < 0.2 => Color::Rgb { r: 255, g: 70, b: 60 },
            r if r < 0.5 => Color::Rgb { r: 240, g: 200, b: 60 },
            _ => Color::Rgb { r: 110, g: 220, b: 110 },
        };
        let drill = match w.player.animation {
            AnimationState::Idle => "OFF",
            AnimationState::DrillOn => "ON",
            AnimationState::Drilling => "CUTTING",
        };

        let head = format!(" Score {:<7} Depth {:>4}m  Fuel ", w.player.score, w.depth_meters());
        let tail = format!(
            " {:>3.0}/{:<3.0} Refills {}  Drill {}",
            w.player.fuel, w.player.fuel_capacity, w.fuel_station.refills_left, drill,
        );
        self.front.put_str(0, HUD_ROW, &head, Color::White, HUD_BG);
        let x = head.chars().count();
        self.front.put_str(x, HUD_ROW, &format!("[{gauge}]"), fuel_color, HUD_BG);
        self.front.put_str(x + GAUGE + 2, HUD_ROW, &tail, Color::White, HUD_BG);
    }

    fn compose_game_over(&mut self, w: &WorldState) {
        let red = Color::Rgb { r: 255, g: 70, b: 60 };
        let art = [
            "+------------------------------+",
            "|         OUT OF FUEL          |",
            "+------------------------------+",
        ];
        for (i, l) in art.iter().enumerate() {
            self.front.put_str(4, 3 + i, l, red, Color::Reset);
        }
        self.front.put_str(6, 8, &format!("Final score: {}", w.player.score), Color::White, Color::Reset);
        self.front.put_str(6, 9, &format!("Depth reached: {}m", w.depth_meters()), Color::White, Color::Reset);
        self.front.put_str(6, 10, &format!("World seed: {}", w.seed), Color::DarkGrey, Color::Reset);
        if w.accepts_restart() {
            self.front.put_str(6, 12, "Any key: dig a new world", Color::Rgb { r: 110, g: 220, b: 110 }, Color::Reset);
        }
        self.front.put_str(6, 13, "Q / Esc: quit", Color::DarkGrey, Color::Reset);
    }
}

// ── Camera & visibility ──

/// First grid row shown, keeping `player_y` centered where the grid allows.
fn camera_top(player_y: usize, view_h: usize, grid_h: usize) -> usize {
    let max_top = grid_h.saturating_sub(view_h);
    player_y.saturating_sub(view_h / 2).min(max_top)
}

/// The surface is always lit; underground only within `radius` of the player.
fn is_visible(w: &WorldState, x: usize, y: usize, radius: f32) -> bool {
    if y < w.top_offset { return true; }
    let dx = x as f32 - w.player.x as f32;
    let dy = y as f32 - w.player.y as f32;
    dx * dx + dy * dy <= radius * radius
}

// ── Tile appearance ──

fn cell_glyph(w: &WorldState, x: usize, y: usize) -> [Cell; 2] {
    let tile = w.grid.get(x, y);
    let ground = if w.grid.background(x, y) == TileType::Background { TUNNEL } else { SKY };
    let on_station = w.fuel_station.is_refill_point(x, y);
    let bg = if on_station { STATION } else { ground };

    match tile {
        TileType::Player => {
            let (a, b) = match w.player.animation {
                AnimationState::Idle => ('[', ']'),
                AnimationState::DrillOn => ('[', '*'),
                AnimationState::Drilling => ('[', '#'),
            };
            pair(a, b, Color::Rgb { r: 255, g: 230, b: 120 }, bg)
        }
        TileType::Empty if on_station => pair('=', '=', Color::White, STATION),
        TileType::Empty | TileType::Background => pair(' ', ' ', Color::White, bg),
        TileType::Dirt(h) => pair('.', ':', shade(dirt_color(h), 30), dirt_color(h)),
        TileType::Stone(h) => pair('#', '#', Color::Rgb { r: 40, g: 40, b: 44 }, stone_color(h)),
        TileType::Ore(kind, h) => pair('<', '>', ore_color(kind), dirt_color(h)),
        TileType::Upgrade(kind) => {
            let c = match kind {
                UpgradeKind::DrillSpeed => 'S',
                UpgradeKind::ViewDistance => 'V',
                UpgradeKind::FuelCapacity => 'F',
            };
            pair(c, '+', Color::Rgb { r: 255, g: 120, b: 255 }, Color::Rgb { r: 70, g: 30, b: 80 })
        }
    }
}

fn pair(a: char, b: char, fg: Color, bg: Color) -> [Cell; 2] {
    [Cell::new(a, fg, bg), Cell::new(b, fg, bg)]
}

/// Overlay drill progress on the target cell.
fn crack(left: Cell, right: Cell, progress: f32) -> [Cell; 2] {
    const STAGES: [char; 4] = ['.', ':', '%', 'X'];
    let i = ((progress * STAGES.len() as f32) as usize).min(STAGES.len() - 1);
    let fg = Color::Rgb { r: 255, g: 255, b: 255 };
    [Cell { ch: STAGES[i], fg, ..left }, Cell { ch: STAGES[i], fg, ..right }]
}

fn dirt_color(h: Hardness) -> Color {
    match h {
        Hardness::Soft => Color::Rgb { r: 140, g: 95, b: 55 },
        Hardness::Medium => Color::Rgb { r: 110, g: 72, b: 42 },
        Hardness::Hard => Color::Rgb { r: 80, g: 52, b: 32 },
    }
}

fn stone_color(h: Hardness) -> Color {
    match h {
        Hardness::Soft => Color::Rgb { r: 120, g: 120, b: 125 },
        Hardness::Medium => Color::Rgb { r: 100, g: 100, b: 108 },
        Hardness::Hard => Color::Rgb { r: 80, g: 80, b: 90 },
    }
}

fn ore_color(kind: OreKind) -> Color {
    match kind {
        OreKind::Coal => Color::Rgb { r: 20, g: 20, b: 20 },
        OreKind::Iron => Color::Rgb { r: 210, g: 150, b: 120 },
        OreKind::Gold => Color::Rgb { r: 255, g: 210, b: 40 },
        OreKind::Diamond => Color::Rgb { r: 120, g: 240, b: 255 },
    }
}

fn shade(c: Color, by: u8) -> Color {
    match c {
        Color::Rgb { r, g, b } => Color::Rgb {
            r: r.saturating_sub(by),
            g: g.saturating_sub(by),
            b: b.saturating_sub(by),
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camera_centers_then_clamps() {
        assert_eq!(camera_top(0, 10, 100), 0);
        assert_eq!(camera_top(50, 10, 100), 45);
        assert_eq!(camera_top(99, 10, 100), 90);
        // Grid shorter than the view
        assert_eq!(camera_top(3, 10, 6), 0);
    }

    #[test]
    fn crack_advances_with_progress() {
        let c = Cell::new(' ', Color::White, TUNNEL);
        assert_eq!(crack(c, c, 0.0)[0].ch, '.');
        assert_eq!(crack(c, c, 0.6)[0].ch, '%');
        assert_eq!(crack(c, c, 1.0)[1].ch, 'X');
        assert_eq!(crack(c, c, 1.0)[1].bg, TUNNEL);
    }
}

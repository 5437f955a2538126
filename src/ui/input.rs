/// Keyboard state and the reduction of keys to a `FrameInput`.
///
/// Movement is edge-triggered: one cell per fresh press of an arrow/WASD key.
/// The drill direction is continuous: whichever direction key is held.
/// Space toggles the drill, F refuels, Q/Esc quits.
///
/// Terminals rarely report key releases, so a key counts as held until
/// `HOLD_TIMEOUT` passes without a Press/Repeat for it. When keyboard
/// enhancement is confirmed, real Release events are honored instead.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::domain::entity::{Direction, FrameInput};

const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

// ── Bindings ──

const LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
const RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
const UP: &[KeyCode] = &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')];
const DOWN: &[KeyCode] = &[KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')];
const TOGGLE: &[KeyCode] = &[KeyCode::Char(' ')];
const REFUEL: &[KeyCode] = &[KeyCode::Char('f'), KeyCode::Char('F')];
const QUIT: &[KeyCode] = &[KeyCode::Char('q'), KeyCode::Char('Q'), KeyCode::Esc];

pub struct InputState {
    last_active: HashMap<KeyCode, Instant>,
    /// Keys that went from released to held during the last drain.
    fresh: Vec<KeyCode>,
    raw: Vec<KeyEvent>,
    pub honor_release: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh: Vec::with_capacity(8),
            raw: Vec::with_capacity(8),
            honor_release: false,
        }
    }

    /// Read every pending terminal event without blocking. Once per frame.
    pub fn drain_events(&mut self) {
        self.fresh.clear();
        self.raw.clear();

        while event::poll(Duration::ZERO).unwrap_or(false) {
            match event::read() {
                Ok(Event::Key(key)) => {
                    self.raw.push(key);
                    self.record(key, Instant::now());
                }
                Ok(_) => {}
                Err(_) => break,
            }
        }

        let now = Instant::now();
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    fn record(&mut self, key: KeyEvent, at: Instant) {
        if key.kind == KeyEventKind::Release {
            if self.honor_release {
                self.last_active.remove(&key.code);
            }
            return;
        }
        if !self.is_held(key.code) {
            self.fresh.push(key.code);
        }
        self.last_active.insert(key.code, at);
    }

    pub fn is_held(&self, code: KeyCode) -> bool {
        self.last_active.get(&code).map_or(false, |t| t.elapsed() < HOLD_TIMEOUT)
    }

    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.fresh.contains(&code)
    }

    fn any_held(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.is_held(*c))
    }

    fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.was_pressed(*c))
    }

    /// This frame's input in grid terms.
    pub fn frame_input(&self) -> FrameInput {
        FrameInput {
            movement: direction_from(|keys| self.any_pressed(keys)),
            drill: direction_from(|keys| self.any_held(keys)),
            drill_toggle: self.any_pressed(TOGGLE),
            refuel: self.any_pressed(REFUEL),
        }
    }

    /// Q, Esc or Ctrl+C this frame.
    pub fn quit_requested(&self) -> bool {
        self.any_pressed(QUIT)
            || self.raw.iter().any(|k| {
                k.modifiers.contains(KeyModifiers::CONTROL)
                    && matches!(k.code, KeyCode::Char('c') | KeyCode::Char('C'))
            })
    }

    /// Any fresh key press at all (game-over screen).
    pub fn any_key_pressed(&self) -> bool {
        !self.fresh.is_empty()
    }
}

/// Reduce four direction key groups to one cardinal direction.
fn direction_from(active: impl Fn(&[KeyCode]) -> bool) -> Direction {
    let axis = |neg: &[KeyCode], pos: &[KeyCode]| {
        (active(pos) as i32 - active(neg) as i32) as f32
    };
    Direction::from_axes(axis(LEFT, RIGHT), axis(UP, DOWN))
}

/// Entities: Player, DrillSession, FuelStation, plus per-frame input.
/// The player's interaction mode is a 3-state machine (Idle / DrillOn / Drilling).

/// A cardinal unit step or zero. Y grows downward.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Direction {
    pub x: i32,
    pub y: i32,
}

impl Direction {
    pub const ZERO: Direction = Direction { x: 0, y: 0 };
    pub const UP: Direction = Direction { x: 0, y: -1 };
    pub const DOWN: Direction = Direction { x: 0, y: 1 };
    pub const LEFT: Direction = Direction { x: -1, y: 0 };
    pub const RIGHT: Direction = Direction { x: 1, y: 0 };

    /// Build from two axis readings (sign only). When both axes are
    /// active the vertical one wins.
    pub fn from_axes(x: f32, y: f32) -> Direction {
        let sx = axis_sign(x);
        let sy = axis_sign(y);
        if sy != 0 {
            Direction { x: 0, y: sy }
        } else {
            Direction { x: sx, y: 0 }
        }
    }

    pub fn is_zero(self) -> bool {
        self == Direction::ZERO
    }

    /// `(x, y) + self` in signed grid space.
    pub fn offset(self, x: usize, y: usize) -> (i32, i32) {
        (x as i32 + self.x, y as i32 + self.y)
    }
}

fn axis_sign(v: f32) -> i32 {
    if v > 0.0 {
        1
    } else if v < 0.0 {
        -1
    } else {
        0
    }
}

/// Frame input, already reduced to grid terms.
///   - `movement`: edge-triggered (direction key freshly pressed this frame)
///   - `drill`: continuous (direction key held)
///   - `drill_toggle` / `refuel`: edge-triggered buttons
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameInput {
    pub movement: Direction,
    pub drill: Direction,
    pub drill_toggle: bool,
    pub refuel: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AnimationState {
    Idle,
    DrillOn,
    Drilling,
}

#[derive(Clone, Debug)]
pub struct PlayerState {
    pub x: usize,
    pub y: usize,
    pub animation: AnimationState,
    /// Drill toggled on (DrillOn or Drilling).
    pub armed: bool,
    pub fuel: f32,
    pub fuel_capacity: f32,
    pub score: u32,
    /// Scales drill time; below 1.0 is faster.
    pub drill_speed_multiplier: f32,
    pub view_distance_multiplier: f32,
}

impl PlayerState {
    pub fn new(x: usize, y: usize, fuel_capacity: f32) -> Self {
        PlayerState {
            x, y,
            animation: AnimationState::Idle,
            armed: false,
            fuel: fuel_capacity,
            fuel_capacity,
            score: 0,
            drill_speed_multiplier: 1.0,
            view_distance_multiplier: 1.0,
        }
    }

    /// Add (or remove, if negative) fuel, kept within `[0, capacity]`.
    pub fn change_fuel(&mut self, amount: f32) {
        self.fuel = (self.fuel + amount).clamp(0.0, self.fuel_capacity);
    }

    pub fn refuel(&mut self) {
        self.fuel = self.fuel_capacity;
    }

    /// Fill ratio for the fuel gauge.
    pub fn fuel_ratio(&self) -> f32 {
        if self.fuel_capacity <= 0.0 { return 0.0; }
        (self.fuel / self.fuel_capacity).clamp(0.0, 1.0)
    }
}

/// Drill-in-progress against one adjacent cell.
/// While active the target tile is untouched; it is removed when
/// `time_left` reaches 0.
#[derive(Clone, Debug, Default)]
pub struct DrillSession {
    pub active: bool,
    /// Player moved since arming / since the last break or stall.
    pub can_start: bool,
    pub last_direction: Direction,
    pub target: Option<(usize, usize)>,
    pub time_left: f32,
    pub time_original: f32,
}

impl DrillSession {
    /// Progress from 0.0 (just started) to 1.0 (about to break).
    /// `None` when not drilling.
    pub fn progress(&self) -> Option<f32> {
        if !self.active { return None; }
        if self.time_original <= 0.0 { return Some(1.0); }
        Some((1.0 - self.time_left / self.time_original).clamp(0.0, 1.0))
    }

    /// Stop cutting and require a fresh movement before the next start.
    pub fn stall(&mut self) {
        self.active = false;
        self.can_start = false;
        self.target = None;
    }
}

/// Fuel station at the surface. The player refuels while standing on
/// one of its `width` refill cells.
#[derive(Clone, Debug)]
pub struct FuelStation {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub refills_left: u32,
}

impl FuelStation {
    pub fn new(x: usize, y: usize, refills: u32) -> Self {
        FuelStation { x, y, width: 2, refills_left: refills }
    }

    pub fn is_refill_point(&self, x: usize, y: usize) -> bool {
        y == self.y && x >= self.x && x < self.x + self.width
    }

    pub fn can_refill(&self) -> bool {
        self.refills_left > 0
    }

    /// Consume one refill. Returns false if none were left.
    pub fn use_refill(&mut self) -> bool {
        if self.refills_left == 0 { return false; }
        self.refills_left -= 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertical_axis_wins() {
        assert_eq!(Direction::from_axes(1.0, -1.0), Direction::UP);
        assert_eq!(Direction::from_axes(-0.4, 0.0), Direction::LEFT);
        assert_eq!(Direction::from_axes(0.0, 0.7), Direction::DOWN);
        assert_eq!(Direction::from_axes(0.0, 0.0), Direction::ZERO);
    }

    #[test]
    fn offset_can_leave_grid() {
        assert_eq!(Direction::LEFT.offset(0, 3), (-1, 3));
        assert_eq!(Direction::DOWN.offset(2, 3), (2, 4));
    }

    #[test]
    fn fuel_is_clamped() {
        let mut p = PlayerState::new(0, 0, 100.0);
        p.change_fuel(50.0);
        assert_eq!(p.fuel, 100.0);
        p.change_fuel(-130.0);
        assert_eq!(p.fuel, 0.0);
        p.refuel();
        assert_eq!(p.fuel_ratio(), 1.0);
    }

    #[test]
    fn drill_progress_lifecycle() {
        let mut d = DrillSession::default();
        assert_eq!(d.progress(), None);

        d.active = true;
        d.time_original = 2.0;
        d.time_left = 2.0;
        assert!((d.progress().unwrap() - 0.0).abs() < 0.01);

        d.time_left = 0.5;
        assert!((d.progress().unwrap() - 0.75).abs() < 0.01);

        // Overshoot past zero stays clamped
        d.time_left = -0.3;
        assert_eq!(d.progress(), Some(1.0));

        d.stall();
        assert_eq!(d.progress(), None);
        assert!(!d.can_start);
    }

    #[test]
    fn fuel_station_refills_run_out() {
        let mut s = FuelStation::new(2, 2, 1);
        assert!(s.is_refill_point(2, 2));
        assert!(s.is_refill_point(3, 2));
        assert!(!s.is_refill_point(4, 2));
        assert!(!s.is_refill_point(2, 1));
        assert!(s.use_refill());
        assert!(!s.can_refill());
        assert!(!s.use_refill());
    }
}

/// The step function: advances the world by one frame.
///
/// Processing order:
///   1. Drill toggle, drilling start / continue / break
///   2. Movement (at most one cell, skipped if a break already moved us)
///   3. Gravity
///   4. Refuel and fuel consumption, fuel-out check
///   5. Timers (movement idle time, gravity countdown, drill countdown)
///
/// Each stage takes the `FrameContext` by value and hands it on. Whenever
/// a stage moves the player it re-derives the context's target cell, so
/// later stages see the new position.

use crate::domain::entity::{AnimationState, FrameInput};
use crate::domain::tile::{TileType, UpgradeKind};
use super::event::GameEvent;
use super::world::{Phase, WorldState, RESTART_DELAY};

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

/// Advance one frame of `dt` seconds.
pub fn step(world: &mut WorldState, input: FrameInput, dt: f32) -> Vec<GameEvent> {
    if world.phase != Phase::Playing {
        world.restart_lock = (world.restart_lock - dt).max(0.0);
        return vec![];
    }

    let ctx = FrameContext::new(world, input, dt);
    let ctx = resolve_drilling(world, ctx);
    let ctx = resolve_movement(world, ctx);
    let ctx = resolve_gravity(world, ctx);
    let ctx = resolve_fuel(world, ctx);
    let ctx = resolve_timers(world, ctx);
    ctx.events
}

/// Everything one frame's stages share besides the world itself.
struct FrameContext {
    input: FrameInput,
    dt: f32,
    /// Player position + movement direction (may be off-grid).
    desired: (i32, i32),
    /// `desired` lies inside the grid.
    range_check: bool,
    /// A drill break already moved the player this frame.
    moved_this_frame: bool,
    events: Vec<GameEvent>,
}

impl FrameContext {
    fn new(world: &WorldState, input: FrameInput, dt: f32) -> Self {
        let mut ctx = FrameContext {
            input,
            dt,
            desired: (0, 0),
            range_check: false,
            moved_this_frame: false,
            events: Vec::new(),
        };
        ctx.retarget(world);
        ctx
    }

    /// Recompute the movement target from the player's current cell.
    fn retarget(&mut self, world: &WorldState) {
        self.desired = self.input.movement.offset(world.player.x, world.player.y);
        self.range_check = world.grid.in_bounds(self.desired.0, self.desired.1);
    }
}

// ══════════════════════════════════════════════════════════════
// Drilling
// ══════════════════════════════════════════════════════════════

fn resolve_drilling(world: &mut WorldState, mut ctx: FrameContext) -> FrameContext {
    if ctx.input.drill_toggle {
        let armed = !world.player.armed;
        world.player.armed = armed;
        world.player.animation = if armed { AnimationState::DrillOn } else { AnimationState::Idle };
        ctx.events.push(GameEvent::DrillToggled { armed });
    }

    if !world.player.armed {
        if world.drill.active {
            ctx.events.push(GameEvent::DrillStopped);
        }
        world.drill.stall();
        return ctx;
    }
    // An off-grid movement press leaves the drill exactly as it was.
    if !ctx.range_check { return ctx; }

    if !world.drill.can_start && !ctx.input.movement.is_zero() {
        world.drill.can_start = true;
    }

    let (px, py) = (world.player.x, world.player.y);
    let dir = ctx.input.drill;
    let (tx, ty) = dir.offset(px, py);
    let target = if !dir.is_zero() && world.grid.in_bounds(tx, ty) {
        Some((tx as usize, ty as usize))
    } else {
        None
    };
    let target_tile = target.map(|(x, y)| world.grid.get(x, y));

    if world.drill.can_start {
        if let (Some((x, y)), Some(tile)) = (target, target_tile) {
            if tile.is_stone() {
                ctx.events.push(GameEvent::StoneHit { x, y });
                world.drill.can_start = false;
            }
        }
    }

    let drilling_up = dir.y == -1;
    let drillable = target_tile.map_or(false, |t| world.catalog.is_drillable(t));
    let ground = world.has_ground_under_player();

    match target {
        Some((x, y)) if world.drill.can_start && !drilling_up && ground && drillable => {
            let retarget = world.drill.last_direction != dir
                || !world.drill.active
                || world.drill.target != Some((x, y));
            if retarget {
                let time = world.catalog.get(world.grid.get(x, y)).map_or(0.0, |d| d.time_to_drill);
                world.drill.time_original = world.player.drill_speed_multiplier * time;
                world.drill.time_left = world.drill.time_original;
                ctx.events.push(GameEvent::DrillStarted { x, y });
            }
            world.player.animation = AnimationState::Drilling;
            world.drill.active = true;
            world.drill.target = Some((x, y));
        }
        _ => {
            if world.drill.active {
                ctx.events.push(GameEvent::DrillStopped);
                world.drill.stall();
            } else if !dir.is_zero() {
                // Aimed but refused: a fresh press is needed. Aiming nowhere keeps the latch.
                world.drill.can_start = false;
            }
            world.player.animation = AnimationState::DrillOn;
        }
    }

    if world.drill.active && world.drill.time_left <= 0.0 {
        if let Some(cell) = world.drill.target {
            ctx = break_tile(world, ctx, cell);
        }
    }

    world.drill.last_direction = dir;
    ctx
}

/// Remove the drilled tile, pay out, and step the player into the hole.
fn break_tile(world: &mut WorldState, mut ctx: FrameContext, (x, y): (usize, usize)) -> FrameContext {
    let mined = world.grid.get(x, y);
    let (score, fuel) = world.catalog.get(mined).map_or((0, 0.0), |d| (d.score, d.fuel));
    world.player.score += score;
    world.player.change_fuel(fuel);

    world.move_player(x, y);
    ctx.moved_this_frame = true;
    ctx.events.push(GameEvent::TileMined { x, y, tile: mined });
    log::debug!("mined {} at ({x}, {y}), score {}", mined.name(), world.player.score);

    world.player.animation = AnimationState::DrillOn;
    world.drill.stall();

    if let Some(kind) = mined.upgrade_kind() {
        apply_upgrade(world, kind);
        ctx.events.push(GameEvent::UpgradeApplied { kind });
    }

    ctx.retarget(world);
    ctx
}

fn apply_upgrade(world: &mut WorldState, kind: UpgradeKind) {
    let factors = &world.rules.upgrades;
    let player = &mut world.player;
    match kind {
        UpgradeKind::DrillSpeed => {
            player.drill_speed_multiplier *= factors.drill_speed_factor;
        }
        UpgradeKind::ViewDistance => {
            player.view_distance_multiplier *= factors.view_distance_factor;
        }
        UpgradeKind::FuelCapacity => {
            // Grow the tank and fill the new space, keeping the same deficit.
            let old = player.fuel_capacity;
            player.fuel_capacity *= factors.fuel_capacity_factor;
            player.change_fuel(player.fuel_capacity - old);
        }
    }
    log::debug!("upgrade {} applied", kind.name());
}

// ══════════════════════════════════════════════════════════════
// Movement
// ══════════════════════════════════════════════════════════════

fn resolve_movement(world: &mut WorldState, mut ctx: FrameContext) -> FrameContext {
    if ctx.input.movement.is_zero() { return ctx; }

    if ctx.range_check && !ctx.moved_this_frame {
        let (x, y) = (ctx.desired.0 as usize, ctx.desired.1 as usize);
        if world.grid.get(x, y) == TileType::Empty {
            world.move_player(x, y);
            ctx.retarget(world);
        }
    }

    // Any movement press counts as activity, even one that went nowhere.
    world.time_since_last_movement = 0.0;
    world.gravity_time_left = world.rules.timing.gravity_period;
    ctx
}

// ══════════════════════════════════════════════════════════════
// Gravity
// ══════════════════════════════════════════════════════════════

fn resolve_gravity(world: &mut WorldState, mut ctx: FrameContext) -> FrameContext {
    let idle = world.time_since_last_movement > world.rules.timing.movement_threshold;
    if !idle || world.gravity_time_left > 0.0 { return ctx; }

    let (x, below) = (world.player.x, world.player.y + 1);
    if below < world.grid.height() && world.grid.get(x, below) == TileType::Empty {
        world.move_player(x, below);
        ctx.events.push(GameEvent::PlayerFell);
        ctx.retarget(world);
    }

    world.gravity_time_left = world.rules.timing.gravity_period;
    ctx
}

// ══════════════════════════════════════════════════════════════
// Fuel
// ══════════════════════════════════════════════════════════════

fn resolve_fuel(world: &mut WorldState, mut ctx: FrameContext) -> FrameContext {
    let (px, py) = (world.player.x, world.player.y);
    let station = &mut world.fuel_station;
    if ctx.input.refuel && station.is_refill_point(px, py) && station.can_refill() {
        station.use_refill();
        world.player.refuel();
        ctx.events.push(GameEvent::Refueled { refills_left: world.fuel_station.refills_left });
        log::debug!("refueled, {} refills left", world.fuel_station.refills_left);
    }

    let rates = &world.rules.fuel;
    let mut burn = rates.idle_rate;
    if world.player.armed { burn += rates.drill_on_rate; }
    if world.drill.active { burn += rates.drilling_rate; }
    world.player.change_fuel(-burn * ctx.dt);

    if world.player.fuel <= 0.0 {
        world.phase = Phase::GameOver;
        world.restart_lock = RESTART_DELAY;
        ctx.events.push(GameEvent::FuelExhausted);
        log::info!("out of fuel, final score {}", world.player.score);
    }
    ctx
}

// ══════════════════════════════════════════════════════════════
// Timers
// ══════════════════════════════════════════════════════════════

fn resolve_timers(world: &mut WorldState, ctx: FrameContext) -> FrameContext {
    world.time_since_last_movement += ctx.dt;
    if world.time_since_last_movement > world.rules.timing.movement_threshold {
        world.gravity_time_left -= ctx.dt;
    }
    if world.drill.active {
        world.drill.time_left -= ctx.dt;
    }
    ctx
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

/// WorldState: the complete snapshot of a running dig.
///
/// ## Ownership
///
/// The generator builds the grid once; after that `step()` is the only
/// writer of the grid, the player, the drill session and the fuel station.
/// Renderer and sound only read.
///
/// ## Player invariant
///
/// Exactly one foreground cell holds `TileType::Player`, and it is
/// `(player.x, player.y)`. Every move goes through `move_player()`.

use rand::Rng;

use crate::config::{FuelConfig, GameConfig, TimingConfig, UpgradeConfig};
use crate::domain::entity::{DrillSession, FuelStation, PlayerState};
use crate::domain::grid::TileGrid;
use crate::domain::tile::{TileCatalog, TileType};
use crate::error::SimResult;
use super::generator;

/// Left column of the fuel station's refill cells.
pub const FUEL_STATION_COLUMN: usize = 2;

/// Seconds the game-over screen ignores keys before a restart.
pub const RESTART_DELAY: f32 = 1.0;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Playing,
    GameOver,
}

/// Per-frame tuning read by `step()`.
#[derive(Clone, Debug)]
pub struct PlayRules {
    pub upgrades: UpgradeConfig,
    pub fuel: FuelConfig,
    pub timing: TimingConfig,
}

impl PlayRules {
    pub fn from_config(config: &GameConfig) -> Self {
        PlayRules {
            upgrades: config.upgrades.clone(),
            fuel: config.fuel.clone(),
            timing: config.timing.clone(),
        }
    }
}

pub struct WorldState {
    pub grid: TileGrid,
    pub catalog: TileCatalog,
    pub rules: PlayRules,

    // ── Entities ──
    pub player: PlayerState,
    pub drill: DrillSession,
    pub fuel_station: FuelStation,

    // ── Gravity timers ──
    pub time_since_last_movement: f32,
    pub gravity_time_left: f32,

    // ── Meta ──
    pub phase: Phase,
    /// Counts down after game over; restart is refused until it hits zero.
    pub restart_lock: f32,
    pub top_offset: usize,
    pub block_size: u32,
    pub seed: u64,
}

// ── Construction ──

impl WorldState {
    /// Build the catalog and generate a world from `seed`.
    pub fn generate(config: &GameConfig, seed: u64) -> SimResult<Self> {
        use rand::SeedableRng;
        let mut rng = rand_isaac::Isaac64Rng::seed_from_u64(seed);
        let mut catalog = TileCatalog::standard();
        catalog.apply_overrides(&config.tile_overrides)?;
        let generated = generator::generate(&config.world, &catalog, &mut rng)?;
        let spawn = (generated.spawn_column, config.world.top_offset - 1);
        let mut world = WorldState::from_grid(generated.grid, catalog, PlayRules::from_config(config), spawn);
        world.top_offset = config.world.top_offset;
        world.block_size = config.world.block_size;
        world.seed = seed;
        Ok(world)
    }

    /// Seed from the config, or a fresh random one.
    pub fn pick_seed<R: Rng + ?Sized>(config: &GameConfig, rng: &mut R) -> u64 {
        config.world.seed.unwrap_or_else(|| rng.gen())
    }

    /// Wrap an already-built grid. `spawn` must be the grid's Player cell.
    pub fn from_grid(grid: TileGrid, catalog: TileCatalog, rules: PlayRules, spawn: (usize, usize)) -> Self {
        debug_assert_eq!(grid.get(spawn.0, spawn.1), TileType::Player);
        let top_offset = spawn.1 + 1;
        WorldState {
            grid,
            catalog,
            player: PlayerState::new(spawn.0, spawn.1, rules.fuel.capacity),
            drill: DrillSession::default(),
            fuel_station: FuelStation::new(FUEL_STATION_COLUMN, spawn.1, rules.fuel.initial_refills),
            time_since_last_movement: 0.0,
            gravity_time_left: rules.timing.gravity_period,
            phase: Phase::Playing,
            restart_lock: 0.0,
            top_offset,
            block_size: 1,
            seed: 0,
            rules,
        }
    }
}

// ── Queries ──

impl WorldState {
    /// Depth below the surface in meters, for the HUD.
    pub fn depth_meters(&self) -> i64 {
        (self.player.y as i64 - self.top_offset as i64 + 1) * self.block_size as i64
    }

    pub fn accepts_restart(&self) -> bool {
        self.phase == Phase::GameOver && self.restart_lock <= 0.0
    }

    /// Cell under the player counts as ground if it is off-grid or occupied.
    pub fn has_ground_under_player(&self) -> bool {
        let below = self.player.y + 1;
        below >= self.grid.height() || self.grid.get(self.player.x, below) != TileType::Empty
    }
}

// ── Mutation ──

impl WorldState {
    /// Move the player tile to `(x, y)`. Caller has bounds-checked.
    pub fn move_player(&mut self, x: usize, y: usize) {
        self.grid.move_tile((self.player.x, self.player.y), (x, y));
        self.player.x = x;
        self.player.y = y;
    }
}

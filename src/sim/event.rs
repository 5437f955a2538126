/// Events emitted during a simulation step.
/// The presentation layer consumes these for sound and effects.

use crate::domain::tile::{TileType, UpgradeKind};

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    DrillToggled { armed: bool },
    /// Drill pointed at stone: no cut, must move again.
    StoneHit { x: usize, y: usize },
    DrillStarted { x: usize, y: usize },
    DrillStopped,
    TileMined { x: usize, y: usize, tile: TileType },
    UpgradeApplied { kind: UpgradeKind },
    PlayerFell,
    Refueled { refills_left: u32 },
    FuelExhausted,
}

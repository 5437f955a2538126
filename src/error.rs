/// Error taxonomy for world setup and simulation.
///
/// Grid access outside bounds is not represented here: it is a
/// programming error and panics (see `TileGrid`).

use crate::domain::tile::TileType;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SimError {
    /// Invalid settings: probability sums, dimensions, names, ranges.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A tile used by generation or drilling has no catalog entry.
    #[error("configuration error: no catalog entry for tile {0:?}")]
    MissingCatalogEntry(TileType),

    /// A weighted randomizer was sampled with zero total weight.
    #[error("weighted randomizer has no weighted entries")]
    EmptyDistribution,

    /// An upgrade name that maps to none of the known upgrade effects.
    #[error("unknown upgrade type: {0}")]
    UnknownUpgradeType(String),
}

pub type SimResult<T> = Result<T, SimError>;

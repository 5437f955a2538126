/// World generator: fills a fresh `TileGrid` once, before the first frame.
///
/// Per column, per depth row:
///   1. background = Background
///   2. hardness tier from depth
///   3. one uniform draw picks stone / ore / dirt; ore kind comes from a
///      weighted draw over the ores whose depth bracket covers this row,
///      and falls back to dirt when none does
///
/// Then upgrades are scattered (with replacement: a later pick may land on
/// an earlier one and overwrite it), the fuel station footing is forced to
/// stone, and the player is placed on the surface row.

use rand::Rng;

use crate::config::WorldConfig;
use crate::domain::grid::TileGrid;
use crate::domain::random::WeightedRandomizer;
use crate::domain::tile::{Hardness, TileCatalog, TileType, UpgradeKind};
use crate::error::{SimError, SimResult};

/// Columns at the left edge that get stone footing for the fuel station.
pub const STATION_FOOTING: usize = 4;
/// Leftmost column the player may spawn in (clear of the station).
pub const MIN_SPAWN_COLUMN: usize = 6;

const CHANCE_EPSILON: f64 = 1e-9;

pub struct GeneratedWorld {
    pub grid: TileGrid,
    pub spawn_column: usize,
}

pub fn generate<R: Rng + ?Sized>(
    cfg: &WorldConfig,
    catalog: &TileCatalog,
    rng: &mut R,
) -> SimResult<GeneratedWorld> {
    validate(cfg, catalog)?;

    let width = cfg.width;
    let height = cfg.depth + cfg.top_offset;
    let mut grid = TileGrid::new(width, height);

    for x in 0..width {
        for y in 0..cfg.depth {
            let grid_y = y + cfg.top_offset;
            grid.set_background(x, grid_y, TileType::Background);
            let hardness = Hardness::from_depth(y, cfg.medium_dirt_depth, cfg.hard_dirt_depth);
            let tile = pick_material(cfg, catalog, rng, y, hardness)?;
            grid.set(x, grid_y, tile);
        }
    }

    let upgrades = place_upgrades(cfg, width, height, rng);
    for &(x, y, kind) in &upgrades {
        grid.set(x, y, TileType::Upgrade(kind));
    }

    for x in 0..STATION_FOOTING {
        grid.set(x, cfg.top_offset, TileType::STONE);
    }

    let spawn_column = rng.gen_range(MIN_SPAWN_COLUMN..width - 1);
    grid.set(spawn_column, cfg.top_offset - 1, TileType::Player);

    log::info!(
        "generated {}x{} world, {} upgrades, spawn column {}",
        width, height, upgrades.len(), spawn_column
    );

    Ok(GeneratedWorld { grid, spawn_column })
}

fn pick_material<R: Rng + ?Sized>(
    cfg: &WorldConfig,
    catalog: &TileCatalog,
    rng: &mut R,
    y: usize,
    hardness: Hardness,
) -> SimResult<TileType> {
    let roll: f64 = rng.gen();
    if roll <= cfg.stone_chance {
        return catalog.hardness_variant(TileType::STONE, hardness);
    }
    if roll <= cfg.stone_chance + cfg.ore_chance {
        let mut ores = WeightedRandomizer::new();
        for (kind, brackets) in &cfg.ore_brackets {
            // First matching bracket only; an ore with none here adds no weight.
            if let Some(b) = brackets.iter().find(|b| b.contains(y)) {
                ores.add_chance(*kind, b.chance);
            }
        }
        return match ores.sample(rng) {
            Ok(kind) => catalog.hardness_variant(TileType::Ore(kind, Hardness::Soft), hardness),
            Err(SimError::EmptyDistribution) => catalog.hardness_variant(TileType::DIRT, hardness),
            Err(e) => Err(e),
        };
    }
    catalog.hardness_variant(TileType::DIRT, hardness)
}

fn place_upgrades<R: Rng + ?Sized>(
    cfg: &WorldConfig,
    width: usize,
    height: usize,
    rng: &mut R,
) -> Vec<(usize, usize, UpgradeKind)> {
    let mut placed = Vec::with_capacity(cfg.upgrade_count);
    for _ in 0..cfg.upgrade_count {
        let x = rng.gen_range(0..width);
        let y = rng.gen_range(cfg.top_offset + 1..height);
        let kind = cfg.upgrade_types[rng.gen_range(0..cfg.upgrade_types.len())];
        placed.push((x, y, kind));
    }
    placed
}

fn validate(cfg: &WorldConfig, catalog: &TileCatalog) -> SimResult<()> {
    let config_err = |msg: String| Err(SimError::Configuration(msg));

    if cfg.width == 0 || cfg.depth == 0 {
        return config_err(format!("world must be at least 1x1 (got {}x{})", cfg.width, cfg.depth));
    }
    if cfg.width <= MIN_SPAWN_COLUMN + 1 {
        return config_err(format!(
            "world.width must be greater than {} to fit the spawn area (got {})",
            MIN_SPAWN_COLUMN + 1, cfg.width
        ));
    }
    if cfg.top_offset == 0 {
        return config_err("world.top_offset must be at least 1 (the player spawns above ground)".into());
    }
    if !(cfg.stone_chance >= 0.0 && cfg.ore_chance >= 0.0)
        || !cfg.stone_chance.is_finite()
        || !cfg.ore_chance.is_finite()
    {
        return config_err("stone_chance and ore_chance must be finite and not negative".into());
    }
    // Any row's ore total is bounded by the sum of every bracket.
    let mut bracket_total = 0.0;
    for (kind, brackets) in &cfg.ore_brackets {
        for b in brackets {
            if !(b.chance.is_finite() && b.chance >= 0.0) {
                return config_err(format!("ore {} has an invalid bracket chance {}", kind.name(), b.chance));
            }
            bracket_total += b.chance;
        }
    }
    if !bracket_total.is_finite() {
        return config_err("ore bracket chances are too large to add up".into());
    }
    if cfg.stone_chance + cfg.ore_chance > 1.0 + CHANCE_EPSILON {
        return config_err(format!(
            "stone_chance + ore_chance must not exceed 1 (got {})",
            cfg.stone_chance + cfg.ore_chance
        ));
    }
    if cfg.upgrade_count > 0 {
        if cfg.top_offset + 1 >= cfg.depth + cfg.top_offset {
            return config_err("no rows left below the surface to place upgrades".into());
        }
        if cfg.upgrade_types.is_empty() {
            return config_err("upgrade_count > 0 but upgrade_types is empty".into());
        }
    }

    catalog.require([TileType::Empty, TileType::Player, TileType::Background])?;
    let mut bases = vec![TileType::DIRT, TileType::STONE];
    bases.extend(cfg.ore_brackets.iter().map(|(kind, _)| TileType::Ore(*kind, Hardness::Soft)));
    for base in bases {
        for h in Hardness::ALL {
            let variant = catalog.hardness_variant(base, h)?;
            catalog.definition(variant)?;
        }
    }
    catalog.require(cfg.upgrade_types.iter().map(|k| TileType::Upgrade(*k)))?;
    Ok(())
}

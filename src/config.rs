/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to defaults if the file is missing, unparsable, or incomplete.
/// Names that do not resolve (ore kinds, upgrade kinds, tile names) are
/// configuration errors: the game refuses to start with them.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::domain::tile::{OreKind, TileOverride, TileType, UpgradeKind};
use crate::error::{SimError, SimResult};

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub world: WorldConfig,
    pub upgrades: UpgradeConfig,
    pub fuel: FuelConfig,
    pub timing: TimingConfig,
    pub display: DisplayConfig,
    pub tile_overrides: Vec<(TileType, TileOverride)>,
}

#[derive(Clone, Debug)]
pub struct WorldConfig {
    pub width: usize,
    pub depth: usize,
    pub top_offset: usize,    // rows of air above ground
    pub hard_dirt_depth: usize,
    pub medium_dirt_depth: usize,
    pub stone_chance: f64,
    pub ore_chance: f64,
    pub ore_brackets: Vec<(OreKind, Vec<OreBracket>)>,
    pub upgrade_count: usize,
    pub upgrade_types: Vec<UpgradeKind>,
    pub seed: Option<u64>,
    pub block_size: u32,      // meters per tile, depth readout only
}

/// Depth range (inclusive, in rows below the surface) with a spawn weight.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct OreBracket {
    pub from_y: usize,
    pub to_y: usize,
    pub chance: f64,
}

impl OreBracket {
    pub fn contains(&self, y: usize) -> bool {
        y >= self.from_y && y <= self.to_y
    }
}

#[derive(Clone, Debug)]
pub struct UpgradeConfig {
    pub drill_speed_factor: f32,
    pub view_distance_factor: f32,
    pub fuel_capacity_factor: f32,
}

/// Consumption rates are fuel units per second.
#[derive(Clone, Debug)]
pub struct FuelConfig {
    pub capacity: f32,
    pub idle_rate: f32,
    pub drill_on_rate: f32,
    pub drilling_rate: f32,
    pub initial_refills: u32,
}

#[derive(Clone, Debug)]
pub struct TimingConfig {
    pub gravity_period: f32,     // seconds between fall steps
    pub movement_threshold: f32, // idle seconds before gravity starts counting
    pub frame_ms: u64,
}

#[derive(Clone, Debug)]
pub struct DisplayConfig {
    pub view_radius: f32,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug)]
struct TomlConfig {
    #[serde(default)]
    world: TomlWorld,
    #[serde(default = "default_ores")]
    ore: BTreeMap<String, TomlOre>,
    #[serde(default)]
    upgrades: TomlUpgrades,
    #[serde(default)]
    fuel: TomlFuel,
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    display: TomlDisplay,
    #[serde(default)]
    tiles: BTreeMap<String, TomlTile>,
}

#[derive(Deserialize, Debug)]
struct TomlWorld {
    #[serde(default = "default_width")]
    width: i64,
    #[serde(default = "default_depth")]
    depth: i64,
    #[serde(default = "default_top_offset")]
    top_offset: i64,
    #[serde(default = "default_hard_dirt_depth")]
    hard_dirt_depth: usize,
    #[serde(default = "default_medium_dirt_depth")]
    medium_dirt_depth: usize,
    #[serde(default = "default_stone_chance")]
    stone_chance: f64,
    #[serde(default = "default_ore_chance")]
    ore_chance: f64,
    #[serde(default = "default_upgrade_count")]
    upgrade_count: usize,
    #[serde(default = "default_upgrade_types")]
    upgrade_types: Vec<String>,
    #[serde(default)]
    seed: Option<u64>,
    #[serde(default = "default_block_size")]
    block_size: u32,
}

#[derive(Deserialize, Debug, Clone)]
struct TomlOre {
    #[serde(default)]
    brackets: Vec<OreBracket>,
}

#[derive(Deserialize, Debug)]
struct TomlUpgrades {
    #[serde(default = "default_drill_speed_factor")]
    drill_speed_factor: f32,
    #[serde(default = "default_view_distance_factor")]
    view_distance_factor: f32,
    #[serde(default = "default_fuel_capacity_factor")]
    fuel_capacity_factor: f32,
}

#[derive(Deserialize, Debug)]
struct TomlFuel {
    #[serde(default = "default_capacity")]
    capacity: f32,
    #[serde(default = "default_idle_rate")]
    idle_rate: f32,
    #[serde(default = "default_drill_on_rate")]
    drill_on_rate: f32,
    #[serde(default = "default_drilling_rate")]
    drilling_rate: f32,
    #[serde(default = "default_initial_refills")]
    initial_refills: u32,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_gravity_period")]
    gravity_period: f32,
    #[serde(default = "default_movement_threshold")]
    movement_threshold: f32,
    #[serde(default = "default_frame_ms")]
    frame_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlDisplay {
    #[serde(default = "default_view_radius")]
    view_radius: f32,
}

#[derive(Deserialize, Debug, Default)]
struct TomlTile {
    drillable: Option<bool>,
    time_to_drill: Option<f32>,
    score: Option<u32>,
    fuel: Option<f32>,
}

// ── Defaults ──

fn default_width() -> i64 { 24 }
fn default_depth() -> i64 { 400 }
fn default_top_offset() -> i64 { 3 }
fn default_hard_dirt_depth() -> usize { 200 }
fn default_medium_dirt_depth() -> usize { 80 }
fn default_stone_chance() -> f64 { 0.08 }
fn default_ore_chance() -> f64 { 0.12 }
fn default_upgrade_count() -> usize { 24 }
fn default_upgrade_types() -> Vec<String> {
    UpgradeKind::ALL.iter().map(|k| k.name().to_string()).collect()
}
fn default_block_size() -> u32 { 5 }

fn default_drill_speed_factor() -> f32 { 0.8 }
fn default_view_distance_factor() -> f32 { 1.25 }
fn default_fuel_capacity_factor() -> f32 { 1.5 }

fn default_capacity() -> f32 { 100.0 }
fn default_idle_rate() -> f32 { 0.5 }
fn default_drill_on_rate() -> f32 { 1.0 }
fn default_drilling_rate() -> f32 { 2.0 }
fn default_initial_refills() -> u32 { 3 }

fn default_gravity_period() -> f32 { 0.25 }
fn default_movement_threshold() -> f32 { 0.35 }
fn default_frame_ms() -> u64 { 16 }

fn default_view_radius() -> f32 { 4.0 }

fn bracket(from_y: usize, to_y: usize, chance: f64) -> OreBracket {
    OreBracket { from_y, to_y, chance }
}

/// Coal is common near the surface, diamonds only deep down.
fn default_ores() -> BTreeMap<String, TomlOre> {
    let mut ores = BTreeMap::new();
    ores.insert("coal".into(), TomlOre { brackets: vec![bracket(0, 150, 10.0), bracket(151, 400, 4.0)] });
    ores.insert("iron".into(), TomlOre { brackets: vec![bracket(20, 250, 5.0), bracket(251, 400, 8.0)] });
    ores.insert("gold".into(), TomlOre { brackets: vec![bracket(100, 300, 3.0), bracket(301, 400, 5.0)] });
    ores.insert("diamond".into(), TomlOre { brackets: vec![bracket(250, 400, 1.5)] });
    ores
}

impl Default for TomlConfig {
    fn default() -> Self {
        TomlConfig {
            world: TomlWorld::default(),
            ore: default_ores(),
            upgrades: TomlUpgrades::default(),
            fuel: TomlFuel::default(),
            timing: TomlTiming::default(),
            display: TomlDisplay::default(),
            tiles: BTreeMap::new(),
        }
    }
}

impl Default for TomlWorld {
    fn default() -> Self {
        TomlWorld {
            width: default_width(),
            depth: default_depth(),
            top_offset: default_top_offset(),
            hard_dirt_depth: default_hard_dirt_depth(),
            medium_dirt_depth: default_medium_dirt_depth(),
            stone_chance: default_stone_chance(),
            ore_chance: default_ore_chance(),
            upgrade_count: default_upgrade_count(),
            upgrade_types: default_upgrade_types(),
            seed: None,
            block_size: default_block_size(),
        }
    }
}

impl Default for TomlUpgrades {
    fn default() -> Self {
        TomlUpgrades {
            drill_speed_factor: default_drill_speed_factor(),
            view_distance_factor: default_view_distance_factor(),
            fuel_capacity_factor: default_fuel_capacity_factor(),
        }
    }
}

impl Default for TomlFuel {
    fn default() -> Self {
        TomlFuel {
            capacity: default_capacity(),
            idle_rate: default_idle_rate(),
            drill_on_rate: default_drill_on_rate(),
            drilling_rate: default_drilling_rate(),
            initial_refills: default_initial_refills(),
        }
    }
}

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming {
            gravity_period: default_gravity_period(),
            movement_threshold: default_movement_threshold(),
            frame_ms: default_frame_ms(),
        }
    }
}

impl Default for TomlDisplay {
    fn default() -> Self {
        TomlDisplay { view_radius: default_view_radius() }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory,
    /// (3) ~/.local/share/deepdrill.
    /// A missing or unparsable file gives the defaults.
    pub fn load() -> SimResult<Self> {
        let toml_cfg = load_toml(&candidate_dirs());
        GameConfig::from_toml(toml_cfg)
    }

    /// Parse TOML text. Syntax errors here are reported, not defaulted.
    pub fn parse(text: &str) -> SimResult<Self> {
        let toml_cfg = toml::from_str::<TomlConfig>(text)
            .map_err(|e| SimError::Configuration(format!("config.toml: {e}")))?;
        GameConfig::from_toml(toml_cfg)
    }

    fn from_toml(cfg: TomlConfig) -> SimResult<Self> {
        let mut ore_brackets = vec![];
        for (name, ore) in cfg.ore {
            let kind = OreKind::from_name(&name)
                .ok_or_else(|| SimError::Configuration(format!("unknown ore type `{name}`")))?;
            ore_brackets.push((kind, ore.brackets));
        }
        // Stable draw order, independent of how the file lists them.
        ore_brackets.sort_by_key(|(kind, _)| OreKind::ALL.iter().position(|k| k == kind));

        let upgrade_types = cfg.world.upgrade_types
            .iter()
            .map(|name| UpgradeKind::from_name(name))
            .collect::<SimResult<Vec<_>>>()?;

        let mut tile_overrides = vec![];
        for (name, t) in cfg.tiles {
            let tile = TileType::from_name(&name)
                .ok_or_else(|| SimError::Configuration(format!("unknown tile `{name}`")))?;
            tile_overrides.push((tile, TileOverride {
                drillable: t.drillable,
                time_to_drill: t.time_to_drill,
                score: t.score,
                fuel: t.fuel,
            }));
        }

        Ok(GameConfig {
            world: WorldConfig {
                width: dimension("world.width", cfg.world.width)?,
                depth: dimension("world.depth", cfg.world.depth)?,
                top_offset: dimension("world.top_offset", cfg.world.top_offset)?,
                hard_dirt_depth: cfg.world.hard_dirt_depth,
                medium_dirt_depth: cfg.world.medium_dirt_depth,
                stone_chance: cfg.world.stone_chance,
                ore_chance: cfg.world.ore_chance,
                ore_brackets,
                upgrade_count: cfg.world.upgrade_count,
                upgrade_types,
                seed: cfg.world.seed,
                block_size: cfg.world.block_size,
            },
            upgrades: UpgradeConfig {
                drill_speed_factor: cfg.upgrades.drill_speed_factor,
                view_distance_factor: cfg.upgrades.view_distance_factor,
                fuel_capacity_factor: cfg.upgrades.fuel_capacity_factor,
            },
            fuel: FuelConfig {
                capacity: cfg.fuel.capacity,
                idle_rate: cfg.fuel.idle_rate,
                drill_on_rate: cfg.fuel.drill_on_rate,
                drilling_rate: cfg.fuel.drilling_rate,
                initial_refills: cfg.fuel.initial_refills,
            },
            timing: TimingConfig {
                gravity_period: cfg.timing.gravity_period,
                movement_threshold: cfg.timing.movement_threshold,
                frame_ms: cfg.timing.frame_ms,
            },
            display: DisplayConfig { view_radius: cfg.display.view_radius },
            tile_overrides,
        })
    }
}

/// Negative sizes are rejected here; zero is left for the generator to refuse.
fn dimension(key: &str, value: i64) -> SimResult<usize> {
    usize::try_from(value)
        .map_err(|_| SimError::Configuration(format!("{key} must not be negative (got {value})")))
}

/// Candidate directories to search: exe dir + CWD + XDG data dir (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/deepdrill");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => {
                        log::info!("loaded {}", path.display());
                        return cfg;
                    }
                    Err(e) => {
                        log::warn!("config.toml parse error: {e}");
                        log::warn!("using default settings");
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    log::warn!("could not read {}: {e}", path.display());
                }
            }
        }
    }
    TomlConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = GameConfig::parse("").unwrap();
        assert_eq!(cfg.world.depth, 400);
        assert_eq!(cfg.world.top_offset, 3);
        assert_eq!(cfg.world.upgrade_types, UpgradeKind::ALL.to_vec());
        assert_eq!(cfg.fuel.initial_refills, 3);
        assert!(cfg.tile_overrides.is_empty());
        let kinds: Vec<OreKind> = cfg.world.ore_brackets.iter().map(|(k, _)| *k).collect();
        assert_eq!(kinds, OreKind::ALL.to_vec());
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let cfg = GameConfig::parse("[world]\nstone_chance = 0.5\n").unwrap();
        assert_eq!(cfg.world.stone_chance, 0.5);
        assert_eq!(cfg.world.ore_chance, default_ore_chance());
        assert_eq!(cfg.timing.gravity_period, default_gravity_period());
    }

    #[test]
    fn ore_table_replaces_default_ores() {
        let text = r#"
            [ore.diamond]
            brackets = [{ from_y = 0, to_y = 10, chance = 2.0 }]
            [ore.coal]
            brackets = [{ from_y = 5, to_y = 6, chance = 1.0 }]
        "#;
        let cfg = GameConfig::parse(text).unwrap();
        assert_eq!(cfg.world.ore_brackets.len(), 2);
        assert_eq!(cfg.world.ore_brackets[0].0, OreKind::Coal);
        assert_eq!(cfg.world.ore_brackets[1].0, OreKind::Diamond);
        assert!(cfg.world.ore_brackets[1].1[0].contains(10));
        assert!(!cfg.world.ore_brackets[1].1[0].contains(11));
    }

    #[test]
    fn unknown_names_are_rejected() {
        assert!(matches!(
            GameConfig::parse("[ore.mithril]\nbrackets = []\n"),
            Err(SimError::Configuration(_))
        ));
        assert!(matches!(
            GameConfig::parse("[world]\nupgrade_types = [\"jetpack\"]\n"),
            Err(SimError::UnknownUpgradeType(name)) if name == "jetpack"
        ));
        assert!(matches!(
            GameConfig::parse("[tiles.lava]\nscore = 3\n"),
            Err(SimError::Configuration(_))
        ));
    }

    #[test]
    fn negative_dimension_is_rejected() {
        assert!(matches!(
            GameConfig::parse("[world]\nwidth = -4\n"),
            Err(SimError::Configuration(_))
        ));
    }

    #[test]
    fn tile_overrides_resolve_names() {
        let cfg = GameConfig::parse("[tiles.dirt_hard]\ntime_to_drill = 0.1\n").unwrap();
        assert_eq!(cfg.tile_overrides.len(), 1);
        assert_eq!(cfg.tile_overrides[0].0, TileType::from_name("dirt_hard").unwrap());
        assert_eq!(cfg.tile_overrides[0].1.time_to_drill, Some(0.1));
    }
}

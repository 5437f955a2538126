/// Tile types and the tile catalog.
///
/// `TileType` is what a grid cell holds. Everything else about a tile
/// (can it be drilled, how long it takes, what it pays out) lives in the
/// `TileCatalog`, which is built once at startup and only read afterwards.

use std::collections::HashMap;

use crate::error::{SimError, SimResult};

/// Depth-based difficulty class. Tier 0 / 1 / 2.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Hardness {
    Soft,
    Medium,
    Hard,
}

impl Hardness {
    pub const ALL: [Hardness; 3] = [Hardness::Soft, Hardness::Medium, Hardness::Hard];

    /// Tier for a depth row `y` (0 = first row below the surface).
    /// Thresholds are exclusive: a row *at* the threshold is still the softer tier.
    pub fn from_depth(y: usize, medium_depth: usize, hard_depth: usize) -> Hardness {
        if y > hard_depth {
            Hardness::Hard
        } else if y > medium_depth {
            Hardness::Medium
        } else {
            Hardness::Soft
        }
    }

    pub fn tier(self) -> usize {
        match self {
            Hardness::Soft => 0,
            Hardness::Medium => 1,
            Hardness::Hard => 2,
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            Hardness::Soft => "",
            Hardness::Medium => "_medium",
            Hardness::Hard => "_hard",
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum OreKind {
    Coal,
    Iron,
    Gold,
    Diamond,
}

impl OreKind {
    pub const ALL: [OreKind; 4] = [OreKind::Coal, OreKind::Iron, OreKind::Gold, OreKind::Diamond];

    pub fn name(self) -> &'static str {
        match self {
            OreKind::Coal => "coal",
            OreKind::Iron => "iron",
            OreKind::Gold => "gold",
            OreKind::Diamond => "diamond",
        }
    }

    pub fn from_name(name: &str) -> Option<OreKind> {
        OreKind::ALL.into_iter().find(|k| k.name() == name)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum UpgradeKind {
    DrillSpeed,
    ViewDistance,
    FuelCapacity,
}

impl UpgradeKind {
    pub const ALL: [UpgradeKind; 3] = [
        UpgradeKind::DrillSpeed,
        UpgradeKind::ViewDistance,
        UpgradeKind::FuelCapacity,
    ];

    pub fn name(self) -> &'static str {
        match self {
            UpgradeKind::DrillSpeed => "drill_speed",
            UpgradeKind::ViewDistance => "view_distance",
            UpgradeKind::FuelCapacity => "fuel_capacity",
        }
    }

    pub fn from_name(name: &str) -> SimResult<UpgradeKind> {
        UpgradeKind::ALL
            .into_iter()
            .find(|k| k.name() == name)
            .ok_or_else(|| SimError::UnknownUpgradeType(name.to_string()))
    }
}

/// Contents of one grid cell.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum TileType {
    Empty,
    Player,
    Background,
    Dirt(Hardness),
    Stone(Hardness),
    Ore(OreKind, Hardness),
    Upgrade(UpgradeKind),
}

impl Default for TileType {
    fn default() -> Self {
        TileType::Empty
    }
}

impl TileType {
    /// Base (tier 0) dirt, the material the generator falls back to.
    pub const DIRT: TileType = TileType::Dirt(Hardness::Soft);
    pub const STONE: TileType = TileType::Stone(Hardness::Soft);

    /// Every tile type, in a stable order.
    pub fn all() -> Vec<TileType> {
        let mut all = vec![TileType::Empty, TileType::Player, TileType::Background];
        for h in Hardness::ALL {
            all.push(TileType::Dirt(h));
        }
        for h in Hardness::ALL {
            all.push(TileType::Stone(h));
        }
        for ore in OreKind::ALL {
            for h in Hardness::ALL {
                all.push(TileType::Ore(ore, h));
            }
        }
        for kind in UpgradeKind::ALL {
            all.push(TileType::Upgrade(kind));
        }
        all
    }

    /// Name used in `config.toml` (`dirt`, `coal_hard`, `upgrade_fuel_capacity`, ...).
    pub fn name(self) -> String {
        match self {
            TileType::Empty => "empty".into(),
            TileType::Player => "player".into(),
            TileType::Background => "background".into(),
            TileType::Dirt(h) => format!("dirt{}", h.suffix()),
            TileType::Stone(h) => format!("stone{}", h.suffix()),
            TileType::Ore(ore, h) => format!("{}{}", ore.name(), h.suffix()),
            TileType::Upgrade(kind) => format!("upgrade_{}", kind.name()),
        }
    }

    pub fn from_name(name: &str) -> Option<TileType> {
        TileType::all().into_iter().find(|t| t.name() == name)
    }

    pub fn is_stone(self) -> bool {
        matches!(self, TileType::Stone(_))
    }

    pub fn upgrade_kind(self) -> Option<UpgradeKind> {
        match self {
            TileType::Upgrade(kind) => Some(kind),
            _ => None,
        }
    }
}

/// Immutable properties of one tile type.
#[derive(Clone, Debug, PartialEq)]
pub struct TileDefinition {
    pub drillable: bool,
    /// Seconds to drill through at drill speed multiplier 1.0.
    pub time_to_drill: f32,
    pub score: u32,
    /// Fuel granted when mined.
    pub fuel: f32,
    /// Tier 0/1/2 forms of this material, used by generation.
    pub hardness_variants: Option<[TileType; 3]>,
}

impl TileDefinition {
    fn solid(drillable: bool, time_to_drill: f32, score: u32, fuel: f32) -> Self {
        TileDefinition { drillable, time_to_drill, score, fuel, hardness_variants: None }
    }

    fn inert() -> Self {
        TileDefinition::solid(false, 0.0, 0, 0.0)
    }
}

/// Partial override of a catalog entry, read from `[tiles.<name>]`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TileOverride {
    pub drillable: Option<bool>,
    pub time_to_drill: Option<f32>,
    pub score: Option<u32>,
    pub fuel: Option<f32>,
}

/// Read-only table of tile properties, passed to whoever needs it.
#[derive(Clone, Debug)]
pub struct TileCatalog {
    entries: HashMap<TileType, TileDefinition>,
}

/// Drill-time scale per hardness tier.
const TIER_TIME: [f32; 3] = [1.0, 1.6, 2.4];

impl TileCatalog {
    /// Catalog with no entries. Lookups fail until tiles are inserted.
    pub fn empty() -> Self {
        TileCatalog { entries: HashMap::new() }
    }

    /// The stock catalog covering every `TileType`.
    pub fn standard() -> Self {
        let mut catalog = TileCatalog::empty();

        catalog.insert(TileType::Empty, TileDefinition::inert());
        catalog.insert(TileType::Player, TileDefinition::inert());
        catalog.insert(TileType::Background, TileDefinition::inert());

        catalog.insert_layered(TileType::Dirt, true, 0.45, [1, 2, 3], 0.0);
        // Stone never yields: it only exists to make the player walk around it.
        catalog.insert_layered(TileType::Stone, false, 3.0, [0, 0, 0], 0.0);

        catalog.insert_layered(|h| TileType::Ore(OreKind::Coal, h), true, 0.7, [5, 8, 12], 12.0);
        catalog.insert_layered(|h| TileType::Ore(OreKind::Iron, h), true, 1.0, [15, 22, 30], 0.0);
        catalog.insert_layered(|h| TileType::Ore(OreKind::Gold, h), true, 1.3, [40, 55, 75], 0.0);
        catalog.insert_layered(|h| TileType::Ore(OreKind::Diamond, h), true, 1.8, [100, 140, 200], 0.0);

        for kind in UpgradeKind::ALL {
            catalog.insert(TileType::Upgrade(kind), TileDefinition::solid(true, 0.8, 25, 0.0));
        }

        catalog
    }

    fn insert_layered(
        &mut self,
        make: impl Fn(Hardness) -> TileType,
        drillable: bool,
        base_time: f32,
        scores: [u32; 3],
        fuel: f32,
    ) {
        let variants = Hardness::ALL.map(&make);
        for h in Hardness::ALL {
            let mut def = TileDefinition::solid(drillable, base_time * TIER_TIME[h.tier()], scores[h.tier()], fuel);
            def.hardness_variants = Some(variants);
            self.insert(make(h), def);
        }
    }

    pub fn insert(&mut self, tile: TileType, def: TileDefinition) {
        self.entries.insert(tile, def);
    }

    /// Apply per-tile overrides on top of the existing entries.
    pub fn apply_overrides(&mut self, overrides: &[(TileType, TileOverride)]) -> SimResult<()> {
        for (tile, ov) in overrides {
            let def = self
                .entries
                .get_mut(tile)
                .ok_or(SimError::MissingCatalogEntry(*tile))?;
            if let Some(v) = ov.drillable { def.drillable = v; }
            if let Some(v) = ov.time_to_drill { def.time_to_drill = v; }
            if let Some(v) = ov.score { def.score = v; }
            if let Some(v) = ov.fuel { def.fuel = v; }
        }
        Ok(())
    }

    #[inline]
    pub fn get(&self, tile: TileType) -> Option<&TileDefinition> {
        self.entries.get(&tile)
    }

    pub fn definition(&self, tile: TileType) -> SimResult<&TileDefinition> {
        self.get(tile).ok_or(SimError::MissingCatalogEntry(tile))
    }

    /// Is `tile` known and marked drillable?
    #[inline]
    pub fn is_drillable(&self, tile: TileType) -> bool {
        self.get(tile).map_or(false, |d| d.drillable)
    }

    /// Concrete tile for a base material at a hardness tier.
    pub fn hardness_variant(&self, base: TileType, tier: Hardness) -> SimResult<TileType> {
        let variants = self.definition(base)?.hardness_variants.ok_or_else(|| {
            SimError::Configuration(format!("tile {} has no hardness variants", base.name()))
        })?;
        Ok(variants[tier.tier()])
    }

    /// Fail unless every listed tile has an entry.
    pub fn require(&self, tiles: impl IntoIterator<Item = TileType>) -> SimResult<()> {
        for tile in tiles {
            self.definition(tile)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_catalog_is_total() {
        let catalog = TileCatalog::standard();
        assert!(catalog.require(TileType::all()).is_ok());
    }

    #[test]
    fn hardness_from_depth_thresholds_are_exclusive() {
        assert_eq!(Hardness::from_depth(0, 10, 20), Hardness::Soft);
        assert_eq!(Hardness::from_depth(10, 10, 20), Hardness::Soft);
        assert_eq!(Hardness::from_depth(11, 10, 20), Hardness::Medium);
        assert_eq!(Hardness::from_depth(20, 10, 20), Hardness::Medium);
        assert_eq!(Hardness::from_depth(21, 10, 20), Hardness::Hard);
    }

    #[test]
    fn hardness_variant_maps_base_to_tier() {
        let catalog = TileCatalog::standard();
        assert_eq!(
            catalog.hardness_variant(TileType::DIRT, Hardness::Hard).unwrap(),
            TileType::Dirt(Hardness::Hard)
        );
        let coal = TileType::Ore(OreKind::Coal, Hardness::Soft);
        assert_eq!(
            catalog.hardness_variant(coal, Hardness::Medium).unwrap(),
            TileType::Ore(OreKind::Coal, Hardness::Medium)
        );
    }

    #[test]
    fn hardness_variant_of_flat_tile_is_config_error() {
        let catalog = TileCatalog::standard();
        let err = catalog
            .hardness_variant(TileType::Upgrade(UpgradeKind::DrillSpeed), Hardness::Soft)
            .unwrap_err();
        assert!(matches!(err, SimError::Configuration(_)));
    }

    #[test]
    fn missing_entry_is_reported() {
        let catalog = TileCatalog::empty();
        assert_eq!(
            catalog.definition(TileType::DIRT).unwrap_err(),
            SimError::MissingCatalogEntry(TileType::DIRT)
        );
        assert!(!catalog.is_drillable(TileType::DIRT));
    }

    #[test]
    fn harder_tiers_take_longer() {
        let catalog = TileCatalog::standard();
        let soft = catalog.definition(TileType::Dirt(Hardness::Soft)).unwrap().time_to_drill;
        let hard = catalog.definition(TileType::Dirt(Hardness::Hard)).unwrap().time_to_drill;
        assert!(hard > soft);
    }

    #[test]
    fn diggable_materials_are_drillable() {
        let catalog = TileCatalog::standard();
        for tile in TileType::all() {
            match tile {
                TileType::Dirt(_) | TileType::Ore(..) | TileType::Upgrade(_) => {
                    assert!(catalog.is_drillable(tile), "{tile:?} should be drillable")
                }
                _ => assert!(!catalog.is_drillable(tile), "{tile:?} should not be drillable"),
            }
        }
    }

    #[test]
    fn names_round_trip_through_lookup() {
        assert_eq!(TileType::from_name("coal_hard"), Some(TileType::Ore(OreKind::Coal, Hardness::Hard)));
        assert_eq!(TileType::from_name("stone"), Some(TileType::STONE));
        assert_eq!(TileType::from_name("lava"), None);
        assert!(matches!(UpgradeKind::from_name("jetpack"), Err(SimError::UnknownUpgradeType(_))));
    }

    #[test]
    fn overrides_patch_existing_entries() {
        let mut catalog = TileCatalog::standard();
        catalog
            .apply_overrides(&[(TileType::DIRT, TileOverride { time_to_drill: Some(0.0), ..Default::default() })])
            .unwrap();
        assert_eq!(catalog.definition(TileType::DIRT).unwrap().time_to_drill, 0.0);
        assert!(catalog.is_drillable(TileType::DIRT));
    }
}

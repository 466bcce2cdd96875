#![deny(warnings)]

//! Reference-data ingestion: reads the JSON data files shipped under
//! `assets/data/` and builds a validated [`Catalog`].
//!
//! The on-disk records keep the field names of the community price sheets
//! (`sheckle_price`, `minimum_value`, `tier`), and mutation effects appear
//! under several historical key spellings. This crate normalizes all of that
//! into the engine-facing types so nothing downstream has to know the wire
//! names.

use garden_core::{
    Catalog, Item, ItemId, ItemKind, ModifierCategory, ModifierDefinition, ModifierId, RarityTier,
    ValidationError,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Data files the loader knows about. Crops and mutations are mandatory;
/// the rest are optional packs that later data drops added.
const CROPS_FILE: &str = "crops.json";
const MUTATIONS_FILE: &str = "mutations.json";
const PETS_FILE: &str = "pets.json";
const EGGS_FILE: &str = "eggs.json";
const GEAR_FILE: &str = "gear.json";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("modifier {id} has no effect value")]
    MissingEffect { id: String },
    #[error("unknown rarity tier {tier:?} on {id}")]
    UnknownTier { id: String, tier: String },
    #[error("unknown modifier category {category:?} on {id}")]
    UnknownCategory { id: String, category: String },
    #[error("invalid record: {0}")]
    Invalid(#[from] ValidationError),
}

/// Top-level shape of each item file: the wrapper key names the record
/// family, e.g. `{ "crops": [...] }`.
#[derive(Debug, Deserialize)]
struct CropsFile {
    crops: Vec<RawItemRecord>,
}

#[derive(Debug, Deserialize)]
struct PetsFile {
    pets: Vec<RawItemRecord>,
}

#[derive(Debug, Deserialize)]
struct EggsFile {
    eggs: Vec<RawItemRecord>,
}

#[derive(Debug, Deserialize)]
struct GearFile {
    gear: Vec<RawItemRecord>,
}

#[derive(Debug, Deserialize)]
struct MutationsFile {
    mutations: Vec<RawMutation>,
}

/// One item row as it appears on disk. All four item files share this shape.
#[derive(Debug, Deserialize)]
struct RawItemRecord {
    id: String,
    name: String,
    /// Purchase cost in sheckles; becomes `base_buy_cost`.
    sheckle_price: Decimal,
    /// Guaranteed sell floor in sheckles; becomes `base_sell_value`.
    minimum_value: Decimal,
    /// Rarity tier name, matched case-insensitively.
    tier: String,
    #[serde(default)]
    multi_harvest: bool,
}

impl RawItemRecord {
    fn into_item(self, kind: ItemKind) -> Result<Item, LoadError> {
        let rarity = parse_tier(&self.id, &self.tier)?;
        Ok(Item {
            id: ItemId(self.id),
            name: self.name,
            kind,
            base_sell_value: self.minimum_value,
            base_buy_cost: self.sheckle_price,
            rarity,
            multi_harvest: self.multi_harvest,
        })
    }
}

/// One mutation row as it appears on disk. The effect value has gone through
/// several key spellings across data drops; the first populated alias wins,
/// checked in the order below.
#[derive(Debug, Deserialize)]
struct RawMutation {
    id: String,
    name: String,
    category: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    sheckles_multiplier: Option<Decimal>,
    #[serde(default)]
    multiplier: Option<Decimal>,
    #[serde(default)]
    additive: Option<Decimal>,
    #[serde(default)]
    bonus: Option<Decimal>,
}

impl RawMutation {
    fn into_definition(self) -> Result<ModifierDefinition, LoadError> {
        let category = parse_category(&self.id, &self.category)?;
        let effect_value = self
            .sheckles_multiplier
            .or(self.multiplier)
            .or(self.additive)
            .or(self.bonus)
            .ok_or_else(|| LoadError::MissingEffect {
                id: self.id.clone(),
            })?;
        Ok(ModifierDefinition {
            id: ModifierId(self.id),
            name: self.name,
            category,
            effect_value,
            description: self.description,
        })
    }
}

fn parse_tier(id: &str, tier: &str) -> Result<RarityTier, LoadError> {
    RarityTier::ALL
        .iter()
        .copied()
        .find(|t| t.label().eq_ignore_ascii_case(tier))
        .ok_or_else(|| LoadError::UnknownTier {
            id: id.to_string(),
            tier: tier.to_string(),
        })
}

fn parse_category(id: &str, category: &str) -> Result<ModifierCategory, LoadError> {
    ModifierCategory::ALL
        .iter()
        .copied()
        .find(|c| c.label().eq_ignore_ascii_case(category))
        .ok_or_else(|| LoadError::UnknownCategory {
            id: id.to_string(),
            category: category.to_string(),
        })
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, LoadError> {
    let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn collect_items(
    items: &mut Vec<Item>,
    path: &Path,
    kind: ItemKind,
    required: bool,
) -> Result<(), LoadError> {
    if !required && !path.exists() {
        debug!(path = %path.display(), kind = kind.label(), "optional data file missing, skipping");
        return Ok(());
    }
    let records = match kind {
        ItemKind::Crop => read_json::<CropsFile>(path)?.crops,
        ItemKind::Pet => read_json::<PetsFile>(path)?.pets,
        ItemKind::Egg => read_json::<EggsFile>(path)?.eggs,
        ItemKind::Gear => read_json::<GearFile>(path)?.gear,
    };
    for record in records {
        items.push(record.into_item(kind)?);
    }
    Ok(())
}

/// Load every data file under `dir` and build the catalog.
///
/// `crops.json` and `mutations.json` must exist; `pets.json`, `eggs.json`
/// and `gear.json` are loaded when present and skipped otherwise. Ids must
/// be unique across all item files together.
pub fn load_catalog(dir: impl AsRef<Path>) -> Result<Catalog, LoadError> {
    let dir = dir.as_ref();

    let mut items = Vec::new();
    collect_items(&mut items, &dir.join(CROPS_FILE), ItemKind::Crop, true)?;
    collect_items(&mut items, &dir.join(PETS_FILE), ItemKind::Pet, false)?;
    collect_items(&mut items, &dir.join(EGGS_FILE), ItemKind::Egg, false)?;
    collect_items(&mut items, &dir.join(GEAR_FILE), ItemKind::Gear, false)?;

    let raw = read_json::<MutationsFile>(&dir.join(MUTATIONS_FILE))?.mutations;
    let mut modifiers = Vec::with_capacity(raw.len());
    for record in raw {
        modifiers.push(record.into_definition()?);
    }

    let catalog = Catalog::new(items, modifiers)?;
    info!(
        items = catalog.item_count(),
        modifiers = catalog.modifier_count(),
        "catalog loaded"
    );
    Ok(catalog)
}

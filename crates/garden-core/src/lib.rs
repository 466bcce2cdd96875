#![deny(warnings)]

//! Core domain models and invariants for garden-calc.
//!
//! This crate defines the serializable reference and valuation records used
//! across the workspace, validation helpers to guarantee basic invariants,
//! and the [`Catalog`] through which everything else resolves items and
//! modifiers.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for a catalog item, e.g. "carrot", "dragon_fruit".
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemId(pub String);

/// Unique identifier for a modifier definition, e.g. "golden", "wet".
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ModifierId(pub String);

/// Unique identifier stamped on every valuation result.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValuationId(pub Uuid);

impl ValuationId {
    /// Returns a fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ValuationId {
    fn default() -> Self {
        Self::new()
    }
}

/// Rarity classification, declared from most to least common so the derived
/// ordering matches the game's tier ladder.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum RarityTier {
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
    Mythical,
    Divine,
}

impl RarityTier {
    /// Every tier, in ladder order.
    pub const ALL: [RarityTier; 7] = [
        RarityTier::Common,
        RarityTier::Uncommon,
        RarityTier::Rare,
        RarityTier::Epic,
        RarityTier::Legendary,
        RarityTier::Mythical,
        RarityTier::Divine,
    ];

    /// Ordinal used as the risk-score base: Common = 1 up to Divine = 7.
    pub fn ordinal(self) -> i32 {
        match self {
            RarityTier::Common => 1,
            RarityTier::Uncommon => 2,
            RarityTier::Rare => 3,
            RarityTier::Epic => 4,
            RarityTier::Legendary => 5,
            RarityTier::Mythical => 6,
            RarityTier::Divine => 7,
        }
    }

    /// Display label.
    pub fn label(self) -> &'static str {
        match self {
            RarityTier::Common => "Common",
            RarityTier::Uncommon => "Uncommon",
            RarityTier::Rare => "Rare",
            RarityTier::Epic => "Epic",
            RarityTier::Legendary => "Legendary",
            RarityTier::Mythical => "Mythical",
            RarityTier::Divine => "Divine",
        }
    }
}

/// Record families held by the catalog. All four share the crop-shaped value
/// fields after ingestion, so one engine covers them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemKind {
    Crop,
    Pet,
    Egg,
    Gear,
}

impl ItemKind {
    /// Display label.
    pub fn label(self) -> &'static str {
        match self {
            ItemKind::Crop => "crop",
            ItemKind::Pet => "pet",
            ItemKind::Egg => "egg",
            ItemKind::Gear => "gear",
        }
    }
}

/// An immutable reference record: one crop, pet, egg, or gear entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Unique key within the catalog.
    pub id: ItemId,
    /// Display name, e.g. "Dragon Fruit".
    pub name: String,
    /// Record family this entry belongs to.
    pub kind: ItemKind,
    /// Base sell value in sheckles (>= 0).
    pub base_sell_value: Decimal,
    /// Base purchase cost in sheckles (>= 0).
    pub base_buy_cost: Decimal,
    /// Rarity classification, also a risk-scoring input.
    pub rarity: RarityTier,
    /// Whether one purchase keeps yielding repeat harvests.
    pub multi_harvest: bool,
}

/// How a modifier's effect value is interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModifierCategory {
    /// Mutually exclusive multiplicative modifier; at most one active.
    Growth,
    /// Stackable additive modifier.
    Environmental,
    /// Stackable additive modifier from weather temperature.
    Temperature,
}

impl ModifierCategory {
    /// Every category.
    pub const ALL: [ModifierCategory; 3] = [
        ModifierCategory::Growth,
        ModifierCategory::Environmental,
        ModifierCategory::Temperature,
    ];

    /// Display label, matching the reference-data spelling.
    pub fn label(self) -> &'static str {
        match self {
            ModifierCategory::Growth => "growth",
            ModifierCategory::Environmental => "environmental",
            ModifierCategory::Temperature => "temperature",
        }
    }
}

/// An immutable modifier definition loaded from reference data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModifierDefinition {
    /// Unique key within the catalog.
    pub id: ModifierId,
    /// Display name, e.g. "Golden".
    pub name: String,
    /// Determines how `effect_value` applies.
    pub category: ModifierCategory,
    /// Multiplier when the category is `Growth`, additive bonus otherwise
    /// (>= 0).
    pub effect_value: Decimal,
    /// Flavor/help text surfaced by presentation layers.
    pub description: String,
}

/// Caller-supplied modifier choice for one calculation.
///
/// `growth: None` selects the normal (unmodified) growth roll, so at most one
/// growth modifier can ever be active. Environmental ids apply in insertion
/// order; duplicates beyond the first occurrence and ids that do not resolve
/// in the catalog are ignored without error.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ModifierSelection {
    /// At most one growth modifier; `None` is the normal roll.
    pub growth: Option<ModifierId>,
    /// Stackable environmental/temperature modifier ids.
    pub environmental: Vec<ModifierId>,
}

impl ModifierSelection {
    /// Normal growth roll, no environmental modifiers.
    pub fn normal() -> Self {
        Self::default()
    }
}

/// One applied-modifier line item in a valuation breakdown.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BreakdownLine {
    /// Category of the applied modifier.
    pub category: ModifierCategory,
    /// Display name of the applied modifier.
    pub name: String,
    /// Human-readable effect: "x20" for growth, "+1x" for additive bonuses.
    pub effect: String,
}

/// Derived output of one valuation; a copy is retained by the history ledger.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValuationResult {
    /// Fresh unique id, used for ledger lookups.
    pub id: ValuationId,
    /// Item the calculation ran against.
    pub item_id: ItemId,
    /// Unit count (>= 1).
    pub quantity: u32,
    /// Modifier choice as the caller supplied it.
    pub selection: ModifierSelection,
    /// Item base sell value at calculation time.
    pub base_value: Decimal,
    /// Item base buy cost at calculation time.
    pub base_cost: Decimal,
    /// Multiplicative growth term; 1 when normal or unresolved.
    pub total_multiplier: Decimal,
    /// Sum of resolved additive bonuses.
    pub total_bonus: Decimal,
    /// `base_value * (total_multiplier + total_bonus) * quantity`.
    pub final_value: Decimal,
    /// `base_cost * quantity`.
    pub total_cost: Decimal,
    /// `final_value - total_cost`.
    pub total_profit: Decimal,
    /// Percent return on investment; 0 whenever `total_cost` is 0.
    pub roi: Decimal,
    /// Applied-modifier line items, growth first.
    pub breakdown: Vec<BreakdownLine>,
    /// Wall-clock stamp in epoch milliseconds. Persists as a JSON number.
    pub timestamp_ms: i64,
}

/// Qualitative risk bucket derived from the numeric score.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl RiskLevel {
    /// Display label.
    pub fn label(self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::VeryHigh => "very high",
        }
    }
}

/// Deterministic risk estimate for an item and modifier selection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Additive score; higher is riskier.
    pub score: i32,
    /// Bucketed level presentation layers key off.
    pub level: RiskLevel,
    /// Human-readable score contributions.
    pub factors: Vec<String>,
}

/// Qualitative verdict over a valuation, declared worst to best.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rating {
    Avoid,
    Caution,
    Fair,
    Good,
    Excellent,
}

impl Rating {
    /// Display label.
    pub fn label(self) -> &'static str {
        match self {
            Rating::Avoid => "Avoid",
            Rating::Caution => "Caution",
            Rating::Fair => "Fair",
            Rating::Good => "Good",
            Rating::Excellent => "Excellent",
        }
    }
}

/// Rating plus the wording presentation layers surface with it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Qualitative verdict.
    pub rating: Rating,
    /// Short action phrase, fixed per rating.
    pub suggestion: String,
    /// One-sentence justification naming ROI and risk.
    pub reasoning: String,
}

/// One entry in a batch comparison.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompareConfig {
    /// Item to value; must resolve in the catalog.
    pub item_id: ItemId,
    /// Modifier choice for this entry.
    pub selection: ModifierSelection,
    /// Unit count; 0 is treated as 1, like everywhere else.
    pub quantity: u32,
}

/// Aggregate totals over a comparison batch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ComparisonTotals {
    /// Sum of final values.
    pub final_value: Decimal,
    /// Sum of total costs.
    pub total_cost: Decimal,
    /// `final_value - total_cost`.
    pub total_profit: Decimal,
    /// Arithmetic mean of per-config ROI.
    pub mean_roi: Decimal,
}

/// Batch valuation outcome: per-config results plus rankings and totals.
///
/// Rankings are index vectors into `results`, sorted descending. Ties keep
/// config order (stable sort).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    /// One result per config, in config order.
    pub results: Vec<ValuationResult>,
    /// Indices into `results` by final value, best first.
    pub by_final_value: Vec<usize>,
    /// Indices into `results` by total profit, best first.
    pub by_total_profit: Vec<usize>,
    /// Indices into `results` by ROI, best first.
    pub by_roi: Vec<usize>,
    /// Aggregates over the whole batch.
    pub totals: ComparisonTotals,
}

impl ComparisonResult {
    /// Top result by final value, if any.
    pub fn best_by_value(&self) -> Option<&ValuationResult> {
        self.by_final_value.first().map(|&i| &self.results[i])
    }

    /// Top result by total profit, if any.
    pub fn best_by_profit(&self) -> Option<&ValuationResult> {
        self.by_total_profit.first().map(|&i| &self.results[i])
    }

    /// Top result by ROI, if any.
    pub fn best_by_roi(&self) -> Option<&ValuationResult> {
        self.by_roi.first().map(|&i| &self.results[i])
    }
}

/// Validation errors for reference-data invariants.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Ids must be non-empty.
    #[error("empty id")]
    EmptyId,
    /// Sell values and buy costs must be non-negative.
    #[error("negative sheckle value on {0}")]
    NegativeMoney(String),
    /// Modifier effects must be non-negative.
    #[error("negative effect value on {0}")]
    NegativeEffect(String),
    /// Catalog keys must be unique.
    #[error("duplicate id: {0}")]
    DuplicateId(String),
}

/// Validate a single item record.
pub fn validate_item(item: &Item) -> Result<(), ValidationError> {
    if item.id.0.trim().is_empty() {
        return Err(ValidationError::EmptyId);
    }
    if item.base_sell_value < Decimal::ZERO || item.base_buy_cost < Decimal::ZERO {
        return Err(ValidationError::NegativeMoney(item.id.0.clone()));
    }
    Ok(())
}

/// Validate a single modifier definition.
pub fn validate_modifier(def: &ModifierDefinition) -> Result<(), ValidationError> {
    if def.id.0.trim().is_empty() {
        return Err(ValidationError::EmptyId);
    }
    if def.effect_value < Decimal::ZERO {
        return Err(ValidationError::NegativeEffect(def.id.0.clone()));
    }
    Ok(())
}

/// Reference data store: validated items and modifiers, looked up by id.
///
/// Built once at data-load time and passed by reference into the valuation
/// and comparison entry points. Never mutated after construction.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    items: BTreeMap<ItemId, Item>,
    modifiers: BTreeMap<ModifierId, ModifierDefinition>,
}

impl Catalog {
    /// Build a catalog, validating every record and rejecting duplicate ids.
    pub fn new(
        items: Vec<Item>,
        modifiers: Vec<ModifierDefinition>,
    ) -> Result<Self, ValidationError> {
        let mut item_map = BTreeMap::new();
        for item in items {
            validate_item(&item)?;
            let id = item.id.clone();
            if item_map.insert(id.clone(), item).is_some() {
                return Err(ValidationError::DuplicateId(id.0));
            }
        }
        let mut modifier_map = BTreeMap::new();
        for def in modifiers {
            validate_modifier(&def)?;
            let id = def.id.clone();
            if modifier_map.insert(id.clone(), def).is_some() {
                return Err(ValidationError::DuplicateId(id.0));
            }
        }
        Ok(Self {
            items: item_map,
            modifiers: modifier_map,
        })
    }

    /// Look up an item by id.
    pub fn item(&self, id: &ItemId) -> Option<&Item> {
        self.items.get(id)
    }

    /// Look up a modifier definition by id.
    pub fn modifier(&self, id: &ModifierId) -> Option<&ModifierDefinition> {
        self.modifiers.get(id)
    }

    /// All items, in id order.
    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }

    /// All modifier definitions, in id order.
    pub fn modifiers(&self) -> impl Iterator<Item = &ModifierDefinition> {
        self.modifiers.values()
    }

    /// Items of one rarity tier, in id order.
    pub fn items_by_rarity(&self, tier: RarityTier) -> Vec<&Item> {
        self.items.values().filter(|i| i.rarity == tier).collect()
    }

    /// Items of one record family, in id order.
    pub fn items_by_kind(&self, kind: ItemKind) -> Vec<&Item> {
        self.items.values().filter(|i| i.kind == kind).collect()
    }

    /// Modifier definitions of one category, in id order.
    pub fn modifiers_by_category(&self, category: ModifierCategory) -> Vec<&ModifierDefinition> {
        self.modifiers
            .values()
            .filter(|m| m.category == category)
            .collect()
    }

    /// Case-insensitive substring search over item ids and names.
    pub fn search_items(&self, query: &str) -> Vec<&Item> {
        let needle = query.to_lowercase();
        self.items
            .values()
            .filter(|i| {
                i.id.0.to_lowercase().contains(&needle) || i.name.to_lowercase().contains(&needle)
            })
            .collect()
    }

    /// Number of items.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Number of modifier definitions.
    pub fn modifier_count(&self) -> usize {
        self.modifiers.len()
    }

    /// True when the catalog holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn item(id: &str, sell: i64, buy: i64) -> Item {
        Item {
            id: ItemId(id.to_string()),
            name: id.to_string(),
            kind: ItemKind::Crop,
            base_sell_value: Decimal::new(sell, 0),
            base_buy_cost: Decimal::new(buy, 0),
            rarity: RarityTier::Common,
            multi_harvest: false,
        }
    }

    fn modifier(id: &str, category: ModifierCategory, effect: i64) -> ModifierDefinition {
        ModifierDefinition {
            id: ModifierId(id.to_string()),
            name: id.to_string(),
            category,
            effect_value: Decimal::new(effect, 0),
            description: String::new(),
        }
    }

    #[test]
    fn serde_roundtrip_item() {
        let it = item("carrot", 18, 10);
        let s = serde_json::to_string(&it).unwrap();
        let back: Item = serde_json::from_str(&s).unwrap();
        assert_eq!(back, it);
    }

    #[test]
    fn valuation_result_timestamp_is_a_json_number() {
        let result = ValuationResult {
            id: ValuationId::new(),
            item_id: ItemId("carrot".to_string()),
            quantity: 1,
            selection: ModifierSelection::normal(),
            base_value: Decimal::new(100, 0),
            base_cost: Decimal::new(10, 0),
            total_multiplier: Decimal::ONE,
            total_bonus: Decimal::ZERO,
            final_value: Decimal::new(100, 0),
            total_cost: Decimal::new(10, 0),
            total_profit: Decimal::new(90, 0),
            roi: Decimal::new(900, 0),
            breakdown: vec![],
            timestamp_ms: 1_700_000_000_123,
        };
        let value = serde_json::to_value(&result).unwrap();
        assert!(value["timestamp_ms"].is_i64());
        let back: ValuationResult = serde_json::from_value(value).unwrap();
        assert_eq!(back, result);
    }

    #[test]
    fn tier_ordinals_follow_the_ladder() {
        let ordinals: Vec<i32> = RarityTier::ALL.iter().map(|t| t.ordinal()).collect();
        assert_eq!(ordinals, vec![1, 2, 3, 4, 5, 6, 7]);
        assert!(RarityTier::Common < RarityTier::Divine);
    }

    #[test]
    fn negative_money_is_rejected() {
        let mut it = item("carrot", 18, 10);
        it.base_buy_cost = Decimal::new(-1, 0);
        assert_eq!(
            validate_item(&it),
            Err(ValidationError::NegativeMoney("carrot".to_string()))
        );
    }

    #[test]
    fn empty_ids_are_rejected() {
        let it = item("  ", 18, 10);
        assert_eq!(validate_item(&it), Err(ValidationError::EmptyId));
        let m = modifier("", ModifierCategory::Growth, 20);
        assert_eq!(validate_modifier(&m), Err(ValidationError::EmptyId));
    }

    #[test]
    fn catalog_rejects_duplicate_ids() {
        let err = Catalog::new(vec![item("carrot", 18, 10), item("carrot", 20, 12)], vec![])
            .unwrap_err();
        assert_eq!(err, ValidationError::DuplicateId("carrot".to_string()));
    }

    #[test]
    fn catalog_lookup_and_filters() {
        let mut pet = item("raccoon", 0, 500_000);
        pet.kind = ItemKind::Pet;
        pet.rarity = RarityTier::Legendary;
        let catalog = Catalog::new(
            vec![item("carrot", 18, 10), item("strawberry", 14, 50), pet],
            vec![
                modifier("golden", ModifierCategory::Growth, 20),
                modifier("wet", ModifierCategory::Environmental, 1),
                modifier("chilled", ModifierCategory::Temperature, 1),
            ],
        )
        .unwrap();

        assert!(catalog.item(&ItemId("carrot".to_string())).is_some());
        assert!(catalog.item(&ItemId("potato".to_string())).is_none());
        assert_eq!(catalog.item_count(), 3);
        assert_eq!(catalog.modifier_count(), 3);
        assert_eq!(catalog.items_by_kind(ItemKind::Pet).len(), 1);
        assert_eq!(catalog.items_by_rarity(RarityTier::Common).len(), 2);
        assert_eq!(
            catalog
                .modifiers_by_category(ModifierCategory::Growth)
                .len(),
            1
        );
    }

    #[test]
    fn search_is_case_insensitive_over_id_and_name() {
        let mut fancy = item("dragon_fruit", 4750, 100_000);
        fancy.name = "Dragon Fruit".to_string();
        let catalog = Catalog::new(vec![item("carrot", 18, 10), fancy], vec![]).unwrap();
        assert_eq!(catalog.search_items("DRAGON").len(), 1);
        assert_eq!(catalog.search_items("fruit").len(), 1);
        assert_eq!(catalog.search_items("nothing").len(), 0);
    }

    #[test]
    fn default_selection_is_normal() {
        let sel = ModifierSelection::normal();
        assert!(sel.growth.is_none());
        assert!(sel.environmental.is_empty());
    }

    proptest! {
        #[test]
        fn non_negative_records_validate(sell in 0u64..10_000_000, buy in 0u64..10_000_000) {
            let it = Item {
                id: ItemId("x".to_string()),
                name: "X".to_string(),
                kind: ItemKind::Crop,
                base_sell_value: Decimal::from(sell),
                base_buy_cost: Decimal::from(buy),
                rarity: RarityTier::Rare,
                multi_harvest: true,
            };
            prop_assert!(validate_item(&it).is_ok());
        }

        #[test]
        fn non_negative_effects_validate(effect in 0u64..1_000) {
            let m = ModifierDefinition {
                id: ModifierId("m".to_string()),
                name: "M".to_string(),
                category: ModifierCategory::Environmental,
                effect_value: Decimal::from(effect),
                description: String::new(),
            };
            prop_assert!(validate_modifier(&m).is_ok());
        }
    }
}

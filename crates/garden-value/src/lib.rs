#![deny(warnings)]

//! Valuation engine: modifier math, risk scoring, recommendations, and batch
//! comparison over catalog items.
//!
//! All money arithmetic runs over `Decimal`, so the identities the rest of
//! the workspace relies on (linearity of the combination rule, exact ROI
//! percentages) hold without float drift.

use chrono::Utc;
use garden_core::{
    BreakdownLine, Catalog, CompareConfig, ComparisonResult, ComparisonTotals, Item, ModifierId,
    ModifierSelection, Rating, Recommendation, RiskAssessment, RiskLevel, ValuationId,
    ValuationResult,
};
use persistence::{HistoryLedger, KeyValueStore};
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::debug;

/// Growth modifier the risk scoring treats as the rare roll.
pub const RARE_GROWTH_ID: &str = "rainbow";

/// Buy cost above which an item counts as a heavy investment (+2 risk).
const HIGH_COST_SHECKLES: i64 = 1_000_000;
/// Buy cost above which an item counts as a notable investment (+1 risk).
const MID_COST_SHECKLES: i64 = 100_000;

/// Errors produced by the comparison entry point.
///
/// Unresolved *modifier* ids are not errors anywhere: they degrade silently
/// to "no effect" because callers pass UI-collected ids that may reference
/// removed definitions. An unresolvable *item* makes a comparison
/// meaningless, so that one is hard.
#[derive(Debug, Error, PartialEq)]
pub enum ValuationError {
    /// A comparison needs at least one config.
    #[error("comparison requires at least one config")]
    EmptyComparison,
    /// An item id did not resolve in the catalog.
    #[error("item not found: {0}")]
    ItemNotFound(String),
}

/// Value one item under a modifier selection.
///
/// The growth multiplier and the additive bonuses scale the base value
/// independently and are combined by addition, not compounding:
/// `per_unit = base * multiplier + base * bonus`. Bonuses thereby stay worth
/// a fixed fraction of the base value regardless of the growth roll, which is
/// intentional game-balance behavior and must not be "fixed".
///
/// A `quantity` of 0 is treated as 1 (the source's entry forms default the
/// same way). The result is recorded into `ledger` before it is returned.
///
/// Example:
/// let result = calculate_value(&catalog, &mut ledger, &item, &selection, 2);
/// assert_eq!(result.total_profit, result.final_value - result.total_cost);
pub fn calculate_value<S: KeyValueStore>(
    catalog: &Catalog,
    ledger: &mut HistoryLedger<S>,
    item: &Item,
    selection: &ModifierSelection,
    quantity: u32,
) -> ValuationResult {
    let quantity = quantity.max(1);
    let base_value = item.base_sell_value;
    let base_cost = item.base_buy_cost;

    let mut breakdown = Vec::new();
    let mut total_multiplier = Decimal::ONE;
    if let Some(growth_id) = &selection.growth {
        if let Some(def) = catalog.modifier(growth_id) {
            total_multiplier = def.effect_value;
            breakdown.push(BreakdownLine {
                category: def.category,
                name: def.name.clone(),
                effect: format!("x{}", def.effect_value),
            });
        }
    }

    let mut total_bonus = Decimal::ZERO;
    let mut seen: BTreeSet<&ModifierId> = BTreeSet::new();
    for id in &selection.environmental {
        if !seen.insert(id) {
            continue;
        }
        let Some(def) = catalog.modifier(id) else {
            continue;
        };
        total_bonus += def.effect_value;
        breakdown.push(BreakdownLine {
            category: def.category,
            name: def.name.clone(),
            effect: format!("+{}x", def.effect_value),
        });
    }

    let qty = Decimal::from(quantity);
    let per_unit = base_value * total_multiplier + base_value * total_bonus;
    let final_value = per_unit * qty;
    let total_cost = base_cost * qty;
    let total_profit = final_value - total_cost;
    let roi = if total_cost > Decimal::ZERO {
        total_profit / total_cost * Decimal::ONE_HUNDRED
    } else {
        Decimal::ZERO
    };

    let result = ValuationResult {
        id: ValuationId::new(),
        item_id: item.id.clone(),
        quantity,
        selection: selection.clone(),
        base_value,
        base_cost,
        total_multiplier,
        total_bonus,
        final_value,
        total_cost,
        total_profit,
        roi,
        breakdown,
        timestamp_ms: Utc::now().timestamp_millis(),
    };
    debug!(item = %item.id.0, %final_value, %roi, "valued item");
    ledger.record(result.clone());
    result
}

/// Deterministic risk estimate for an item and selection. Pure scoring, no
/// side effects; the catalog is read only to resolve the growth modifier, so
/// an unresolved growth id counts as inactive, consistent with the engine's
/// silent-skip policy.
pub fn assess_risk(
    catalog: &Catalog,
    item: &Item,
    selection: &ModifierSelection,
) -> RiskAssessment {
    let mut score = item.rarity.ordinal();
    let mut factors = vec![format!(
        "{} rarity (+{})",
        item.rarity.label(),
        item.rarity.ordinal()
    )];

    if let Some(growth_id) = &selection.growth {
        if catalog.modifier(growth_id).is_some() {
            if growth_id.0 == RARE_GROWTH_ID {
                score += 3;
                factors.push("rare growth roll (+3)".to_string());
            } else {
                score += 2;
                factors.push("growth modifier active (+2)".to_string());
            }
        }
    }

    if item.multi_harvest {
        score -= 1;
        factors.push("multi-harvest (-1)".to_string());
    }

    if item.base_buy_cost > Decimal::new(HIGH_COST_SHECKLES, 0) {
        score += 2;
        factors.push("buy cost above 1M sheckles (+2)".to_string());
    } else if item.base_buy_cost > Decimal::new(MID_COST_SHECKLES, 0) {
        score += 1;
        factors.push("buy cost above 100k sheckles (+1)".to_string());
    }

    RiskAssessment {
        score,
        level: risk_level(score),
        factors,
    }
}

/// Bucket a numeric risk score.
fn risk_level(score: i32) -> RiskLevel {
    match score {
        i32::MIN..=2 => RiskLevel::Low,
        3..=4 => RiskLevel::Medium,
        5..=6 => RiskLevel::High,
        _ => RiskLevel::VeryHigh,
    }
}

/// ROI band boundaries for the recommendation table, in percent.
const ROI_THIN: i64 = 0;
const ROI_MODERATE: i64 = 25;
const ROI_STRONG: i64 = 100;
const ROI_EXCEPTIONAL: i64 = 300;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RoiBand {
    Loss,
    Thin,
    Moderate,
    Strong,
    Exceptional,
}

fn roi_band(roi: Decimal) -> RoiBand {
    if roi < Decimal::new(ROI_THIN, 0) {
        RoiBand::Loss
    } else if roi < Decimal::new(ROI_MODERATE, 0) {
        RoiBand::Thin
    } else if roi < Decimal::new(ROI_STRONG, 0) {
        RoiBand::Moderate
    } else if roi < Decimal::new(ROI_EXCEPTIONAL, 0) {
        RoiBand::Strong
    } else {
        RoiBand::Exceptional
    }
}

/// Qualitative recommendation from a valuation and its risk assessment.
///
/// Pure lookup over (ROI band, risk level); wording is deterministic so
/// presentation layers can snapshot it.
pub fn recommend(result: &ValuationResult, risk: &RiskAssessment) -> Recommendation {
    use Rating::*;
    use RiskLevel::*;

    let rating = match (roi_band(result.roi), risk.level) {
        (RoiBand::Loss, _) => Avoid,
        (RoiBand::Thin, Low | Medium) => Fair,
        (RoiBand::Thin, High) => Caution,
        (RoiBand::Thin, VeryHigh) => Avoid,
        (RoiBand::Moderate, Low | Medium) => Good,
        (RoiBand::Moderate, High) => Fair,
        (RoiBand::Moderate, VeryHigh) => Caution,
        (RoiBand::Strong, Low) => Excellent,
        (RoiBand::Strong, Medium) => Good,
        (RoiBand::Strong, High) => Fair,
        (RoiBand::Strong, VeryHigh) => Caution,
        (RoiBand::Exceptional, Low | Medium) => Excellent,
        (RoiBand::Exceptional, High) => Good,
        (RoiBand::Exceptional, VeryHigh) => Fair,
    };
    let suggestion = match rating {
        Excellent => "Strong buy",
        Good => "Solid pick",
        Fair => "Situational",
        Caution => "Only with spare sheckles",
        Avoid => "Skip this one",
    }
    .to_string();
    let reasoning = format!(
        "ROI of {}% at {} risk (score {})",
        result.roi.round(),
        risk.level.label(),
        risk.score
    );

    Recommendation {
        rating,
        suggestion,
        reasoning,
    }
}

/// Batch-run the engine over multiple configs and rank the outcomes.
///
/// Every item id is resolved before the first valuation runs, so an unknown
/// id fails the whole batch with zero ledger side effects; afterwards each
/// config records history exactly like a direct `calculate_value` call.
/// Rankings sort descending and are stable: equal keys keep config order.
///
/// Example:
/// let ranked = compare_many(&catalog, &mut ledger, &configs)?;
/// let best = ranked.best_by_profit().unwrap();
pub fn compare_many<S: KeyValueStore>(
    catalog: &Catalog,
    ledger: &mut HistoryLedger<S>,
    configs: &[CompareConfig],
) -> Result<ComparisonResult, ValuationError> {
    if configs.is_empty() {
        return Err(ValuationError::EmptyComparison);
    }

    // Resolve everything up front: a missing item aborts the batch before
    // any history is written.
    let mut items = Vec::with_capacity(configs.len());
    for config in configs {
        let item = catalog
            .item(&config.item_id)
            .ok_or_else(|| ValuationError::ItemNotFound(config.item_id.0.clone()))?;
        items.push(item);
    }

    let mut results = Vec::with_capacity(configs.len());
    for (config, item) in configs.iter().zip(&items) {
        results.push(calculate_value(
            catalog,
            ledger,
            item,
            &config.selection,
            config.quantity,
        ));
    }

    let by_final_value = ranked_indices(&results, |r| r.final_value);
    let by_total_profit = ranked_indices(&results, |r| r.total_profit);
    let by_roi = ranked_indices(&results, |r| r.roi);

    let final_value: Decimal = results.iter().map(|r| r.final_value).sum();
    let total_cost: Decimal = results.iter().map(|r| r.total_cost).sum();
    let mean_roi = results.iter().map(|r| r.roi).sum::<Decimal>() / Decimal::from(results.len());
    let totals = ComparisonTotals {
        final_value,
        total_cost,
        total_profit: final_value - total_cost,
        mean_roi,
    };

    Ok(ComparisonResult {
        results,
        by_final_value,
        by_total_profit,
        by_roi,
        totals,
    })
}

/// Indices sorted by `key` descending; stable, so ties keep config order.
fn ranked_indices(
    results: &[ValuationResult],
    key: impl Fn(&ValuationResult) -> Decimal,
) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..results.len()).collect();
    indices.sort_by(|&a, &b| key(&results[b]).cmp(&key(&results[a])));
    indices
}

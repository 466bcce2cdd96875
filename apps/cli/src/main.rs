#![deny(warnings)]

//! Headless CLI for loading reference data and running valuations.

use anyhow::Result;
use garden_core::{CompareConfig, ItemId, ModifierId, ModifierSelection};
use persistence::{HistoryLedger, JsonFileStore};
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

struct Args {
    data_dir: String,
    item: Option<String>,
    quantity: u32,
    growth: Option<String>,
    env: Vec<String>,
    compare: Vec<String>,
}

fn split_csv(raw: Option<String>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect()
    })
    .unwrap_or_default()
}

fn parse_args() -> Args {
    let mut args = Args {
        data_dir: "assets/data".to_string(),
        item: None,
        quantity: 1,
        growth: None,
        env: vec![],
        compare: vec![],
    };
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--data" => {
                if let Some(dir) = it.next() {
                    args.data_dir = dir;
                }
            }
            "--item" => args.item = it.next(),
            "--quantity" => {
                args.quantity = it.next().and_then(|s| s.parse().ok()).unwrap_or(1);
            }
            "--growth" => args.growth = it.next(),
            "--env" => args.env = split_csv(it.next()),
            "--compare" => args.compare = split_csv(it.next()),
            _ => {}
        }
    }
    args
}

fn main() -> Result<()> {
    // Logging setup
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::INFO)
        .init();

    let args = parse_args();
    info!(data_dir = %args.data_dir, item = ?args.item, compare = ?args.compare, "starting CLI");

    let catalog = garden_data::load_catalog(&args.data_dir)?;
    let store = JsonFileStore::open()?;
    let mut ledger = HistoryLedger::open(store);

    let selection = ModifierSelection {
        growth: args.growth.map(ModifierId),
        environmental: args.env.into_iter().map(ModifierId).collect(),
    };

    if !args.compare.is_empty() {
        let configs: Vec<CompareConfig> = args
            .compare
            .into_iter()
            .map(|id| CompareConfig {
                item_id: ItemId(id),
                selection: selection.clone(),
                quantity: args.quantity,
            })
            .collect();
        let outcome = garden_value::compare_many(&catalog, &mut ledger, &configs)?;
        for (rank, &i) in outcome.by_total_profit.iter().enumerate() {
            let r = &outcome.results[i];
            println!(
                "#{} | {} | final: {} | cost: {} | profit: {} | roi: {}%",
                rank + 1,
                r.item_id.0,
                r.final_value,
                r.total_cost,
                r.total_profit,
                r.roi.round_dp(2)
            );
        }
        println!(
            "Totals | value: {} | cost: {} | profit: {} | mean roi: {}%",
            outcome.totals.final_value,
            outcome.totals.total_cost,
            outcome.totals.total_profit,
            outcome.totals.mean_roi.round_dp(2)
        );
        return Ok(());
    }

    if let Some(raw_id) = args.item {
        let item_id = ItemId(raw_id);
        let Some(item) = catalog.item(&item_id) else {
            anyhow::bail!("unknown item: {}", item_id.0);
        };
        let result =
            garden_value::calculate_value(&catalog, &mut ledger, item, &selection, args.quantity);
        let risk = garden_value::assess_risk(&catalog, item, &selection);
        let rec = garden_value::recommend(&result, &risk);

        println!(
            "Valuation | {} | qty: {} | final: {} | cost: {} | profit: {} | roi: {}%",
            item.name,
            result.quantity,
            result.final_value,
            result.total_cost,
            result.total_profit,
            result.roi.round_dp(2)
        );
        for line in &result.breakdown {
            println!(
                "  modifier | {} | {} | {}",
                line.category.label(),
                line.name,
                line.effect
            );
        }
        println!(
            "Risk | score: {} | level: {} | factors: {}",
            risk.score,
            risk.level.label(),
            risk.factors.join("; ")
        );
        println!(
            "Recommendation | {} | {} | {}",
            rec.rating.label(),
            rec.suggestion,
            rec.reasoning
        );
        return Ok(());
    }

    println!(
        "Catalog OK | items: {} | modifiers: {} | history: {}",
        catalog.item_count(),
        catalog.modifier_count(),
        ledger.len()
    );
    Ok(())
}

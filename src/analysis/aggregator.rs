use crate::analysis::unique;
use crate::types::{AggregatedStrategyKpi, CultivationKpiStore, StrategyKpi};
use serde::Serialize;
use tracing::debug;

/// Precision of radar KPI averages.
pub const DEFAULT_DECIMALS: u32 = 1;

/// Precision of the dashboard stat boxes.
pub const SUMMARY_DECIMALS: u32 = 3;

/// Average every strategy's KPIs across the selected cultivations.
pub fn aggregate(store: &CultivationKpiStore, selected: &[String]) -> Vec<AggregatedStrategyKpi> {
    aggregate_with_precision(store, selected, DEFAULT_DECIMALS)
}

/// Same as [`aggregate`] with an explicit rounding precision.
///
/// The denominator for each strategy is the number of selected cultivations
/// it actually appears in, so a strategy missing from some cultivations is
/// not diluted. Strategies found in no selected cultivation are omitted.
pub fn aggregate_with_precision(
    store: &CultivationKpiStore,
    selected: &[String],
    decimals: u32,
) -> Vec<AggregatedStrategyKpi> {
    let selected = unique(selected);

    let mut names: Vec<&str> = Vec::new();
    for cultivation in &selected {
        let Some(c) = store.get(cultivation) else {
            debug!(cultivation = %cultivation, "selected cultivation not in store");
            continue;
        };
        for s in &c.strategies {
            if !names.contains(&s.name.as_str()) {
                names.push(&s.name);
            }
        }
    }

    names
        .into_iter()
        .filter_map(|name| {
            let mut sums = KpiSums::default();
            for cultivation in &selected {
                if let Some(s) = store.strategy(cultivation, name) {
                    sums.add(s);
                }
            }
            sums.mean(name, decimals)
        })
        .collect()
}

#[derive(Default)]
struct KpiSums {
    count: usize,
    bonus_penalty: f64,
    profit: f64,
    energy_cost: f64,
    weight_achieved: f64,
    base_revenue_a: f64,
    base_revenue_b: f64,
    base_revenue: f64,
}

impl KpiSums {
    fn add(&mut self, s: &StrategyKpi) {
        self.count += 1;
        self.bonus_penalty += s.bonus_penalty;
        self.profit += s.profit;
        self.energy_cost += s.energy_cost;
        self.weight_achieved += s.weight_achieved;
        self.base_revenue_a += s.base_revenue_a;
        self.base_revenue_b += s.base_revenue_b;
        // Derived per record, before summing across cultivations.
        self.base_revenue += s.resolved_base_revenue();
    }

    fn mean(&self, name: &str, decimals: u32) -> Option<AggregatedStrategyKpi> {
        if self.count == 0 {
            return None;
        }
        let n = self.count as f64;
        let avg = |sum: f64| round_half_up(sum / n, decimals);
        Some(AggregatedStrategyKpi {
            name: name.to_string(),
            bonus_penalty: avg(self.bonus_penalty),
            profit: avg(self.profit),
            energy_cost: avg(self.energy_cost),
            weight_achieved: avg(self.weight_achieved),
            base_revenue_a: avg(self.base_revenue_a),
            base_revenue_b: avg(self.base_revenue_b),
            base_revenue: avg(self.base_revenue),
        })
    }
}

/// Round half up at `decimals` places. Non-finite input becomes 0.
pub fn round_half_up(value: f64, decimals: u32) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let factor = 10f64.powi(decimals as i32);
    let rounded = (value * factor + 0.5).floor() / factor;
    if rounded.is_finite() { rounded } else { 0.0 }
}

/// Stat-box averages for one strategy. `None` means no selected cultivation
/// carries the strategy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EfficiencySummary {
    pub strategy: String,
    pub profit: Option<f64>,
    pub euro_per_kwh: Option<f64>,
    pub kwh_per_gram: Option<f64>,
    pub euro_per_gram: Option<f64>,
}

/// Averages the efficiency KPIs of each visible strategy across the selected
/// cultivations. Missing values are skipped but still count toward the
/// denominator of a present record.
pub fn summarize_efficiency(
    store: &CultivationKpiStore,
    selected: &[String],
    visible: &[String],
) -> Vec<EfficiencySummary> {
    let selected = unique(selected);
    visible
        .iter()
        .map(|strategy| {
            let records: Vec<&StrategyKpi> = selected
                .iter()
                .filter_map(|c| store.strategy(c, strategy))
                .collect();
            let average = |field: fn(&StrategyKpi) -> Option<f64>| {
                if records.is_empty() {
                    return None;
                }
                let sum: f64 = records.iter().filter_map(|s| field(*s)).sum();
                Some(round_half_up(sum / records.len() as f64, SUMMARY_DECIMALS))
            };
            EfficiencySummary {
                strategy: strategy.clone(),
                profit: average(|s| Some(s.profit)),
                euro_per_kwh: average(|s| s.euro_per_kwh),
                kwh_per_gram: average(|s| s.kwh_per_gram),
                euro_per_gram: average(|s| s.euro_per_gram),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::normalizer::normalize;
    use serde_json::json;

    fn sel(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn denominator_counts_only_cultivations_with_the_strategy() {
        let store = normalize(Some(&json!({
            "A": [{"name": "Optimized", "profit": 20}, {"name": "Default", "profit": 9}],
            "B": [{"name": "Optimized", "profit": 30}, {"name": "Default", "profit": 11}],
            "C": [{"name": "Default", "profit": 13}],
        })));
        let result = aggregate(&store, &sel(&["A", "B", "C"]));
        let optimized = result.iter().find(|r| r.name == "Optimized").unwrap();
        assert_eq!(optimized.profit, 25.0);
        let default = result.iter().find(|r| r.name == "Default").unwrap();
        assert_eq!(default.profit, 11.0);
    }

    #[test]
    fn base_revenue_derived_per_record() {
        let store = normalize(Some(&json!({
            "A": [{"name": "S", "base_revenue_a": 10, "base_revenue_b": 5}],
            "B": [{"name": "S", "base_revenue": 25, "base_revenue_a": 1, "base_revenue_b": 1}],
        })));
        let only_a = aggregate(&store, &sel(&["A"]));
        assert_eq!(only_a[0].base_revenue, 15.0);

        let both = aggregate(&store, &sel(&["A", "B"]));
        assert_eq!(both[0].base_revenue, 20.0);
        assert_eq!(both[0].base_revenue_a, 5.5);
    }

    #[test]
    fn strategies_outside_selection_are_omitted() {
        let store = normalize(Some(&json!({
            "A": [{"name": "Default"}],
            "B": [{"name": "Night"}],
        })));
        let result = aggregate(&store, &sel(&["A", "missing"]));
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].name, "Default");
        assert!(aggregate(&store, &[]).is_empty());
    }

    #[test]
    fn duplicate_selection_entries_count_once() {
        let store = normalize(Some(&json!({"A": [{"name": "S", "profit": 4}]})));
        let result = aggregate(&store, &sel(&["A", "A"]));
        assert_eq!(result[0].profit, 4.0);
    }

    #[test]
    fn averages_are_rounded() {
        let store = normalize(Some(&json!({
            "A": [{"name": "S", "energy_cost": 1}],
            "B": [{"name": "S", "energy_cost": 2}],
            "C": [{"name": "S", "energy_cost": 2}],
        })));
        let one = aggregate(&store, &sel(&["A", "B", "C"]));
        assert_eq!(one[0].energy_cost, 1.7);
        let three = aggregate_with_precision(&store, &sel(&["A", "B", "C"]), 3);
        assert_eq!(three[0].energy_cost, 1.667);
    }

    #[test]
    fn round_half_up_matches_expected_ties() {
        assert_eq!(round_half_up(2.25, 1), 2.3);
        assert_eq!(round_half_up(-2.5, 0), -2.0);
        assert_eq!(round_half_up(f64::NAN, 1), 0.0);
        assert_eq!(round_half_up(f64::INFINITY, 3), 0.0);
    }

    #[test]
    fn efficiency_summary_tracks_presence() {
        let store = normalize(Some(&json!({
            "A": [{"name": "Default", "profit": 10, "euro_per_kwh": 0.2}],
            "B": [{"name": "Default", "profit": 11, "euro_per_kwh": "x"}],
        })));
        let summary = summarize_efficiency(&store, &sel(&["A", "B"]), &sel(&["Default", "Ghost"]));
        assert_eq!(summary[0].profit, Some(10.5));
        assert_eq!(summary[0].euro_per_kwh, Some(0.1));
        assert_eq!(summary[0].kwh_per_gram, Some(0.0));
        assert_eq!(summary[1].profit, None);
        assert_eq!(summary[1].euro_per_gram, None);
    }
}

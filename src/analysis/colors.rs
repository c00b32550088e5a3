use crate::types::AggregatedStrategyKpi;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Display colors in rank order. Slot 0 (gold) belongs to the optimized
/// strategy, or to the top-ranked one when there is none.
pub const COLOR_PALETTE: [&str; 10] = [
    "#FFD700", "#2ca02c", "#d62728", "#1f77b4", "#ff7f0e", "#9467bd", "#8c564b", "#e377c2",
    "#7f7f7f", "#17becf",
];

pub type ColorMap = BTreeMap<String, &'static str>;

pub fn is_optimized(name: &str) -> bool {
    name.to_lowercase().contains("optimized")
}

/// Colors from names alone: non-optimized strategies ranked alphabetically.
pub fn assign_colors<S: AsRef<str>>(names: &[S]) -> ColorMap {
    let mut ranked: Vec<&str> = names
        .iter()
        .map(|n| n.as_ref())
        .filter(|n| !n.is_empty())
        .collect();
    ranked.sort_by(|a, b| alphabetical(a, b));
    ranked.dedup();
    build(ranked)
}

/// Colors ranked by averaged profit, highest first. Ties fall back to name
/// order so the result never depends on input order.
pub fn assign_colors_by_profit(aggregated: &[AggregatedStrategyKpi]) -> ColorMap {
    let mut ranked: Vec<&AggregatedStrategyKpi> =
        aggregated.iter().filter(|s| !s.name.is_empty()).collect();
    ranked.sort_by(|a, b| {
        b.profit
            .total_cmp(&a.profit)
            .then_with(|| alphabetical(&a.name, &b.name))
    });
    let mut names: Vec<&str> = ranked.into_iter().map(|s| s.name.as_str()).collect();
    names.dedup();
    build(names)
}

fn build(ranked: Vec<&str>) -> ColorMap {
    let (optimized, rest): (Vec<&str>, Vec<&str>) =
        ranked.into_iter().partition(|n| is_optimized(n));

    let offset = usize::from(!optimized.is_empty());
    let slots = COLOR_PALETTE.len() - offset;

    let mut map: ColorMap = optimized
        .into_iter()
        .map(|n| (n.to_string(), COLOR_PALETTE[0]))
        .collect();
    for (idx, name) in rest.into_iter().enumerate() {
        map.insert(name.to_string(), COLOR_PALETTE[offset + idx % slots]);
    }
    map
}

fn alphabetical(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

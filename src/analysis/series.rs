use crate::analysis::aggregator::{DEFAULT_DECIMALS, round_half_up};
use crate::types::{AggregatedStrategyKpi, ChartSeriesRow, Kpi, SeriesPoint};

/// Fixed `[min, max]` used to scale each KPI onto the radar. Values outside
/// the range scale outside `[0, 1]`.
pub fn domain(kpi: Kpi) -> (f64, f64) {
    match kpi {
        Kpi::BonusPenalty => (-3.0, 5.0),
        Kpi::Profit => (0.0, 50.0),
        Kpi::EnergyCost => (0.0, 8.0),
        Kpi::WeightAchieved => (20.0, 100.0),
        Kpi::BaseRevenue => (0.0, 35.0),
    }
}

pub fn scale(kpi: Kpi, raw: f64) -> f64 {
    let (min, max) = domain(kpi);
    (raw - min) / (max - min)
}

/// One row per KPI, each carrying every strategy's scaled and raw value.
pub fn build_series(aggregated: &[AggregatedStrategyKpi]) -> Vec<ChartSeriesRow> {
    Kpi::ALL
        .into_iter()
        .map(|metric| ChartSeriesRow {
            metric,
            points: aggregated
                .iter()
                .map(|s| {
                    let raw = s.value(metric);
                    SeriesPoint {
                        strategy: s.name.clone(),
                        scaled: scale(metric, raw),
                        raw: round_half_up(raw, DEFAULT_DECIMALS),
                    }
                })
                .collect(),
        })
        .collect()
}

use crate::types::{CultivationKpiStore, WeightBin};
use serde::Serialize;

/// Bar color for a weight category.
pub fn category_color(category: Option<&str>) -> &'static str {
    match category {
        Some("A") => "#f44336",
        Some("B") => "#ff9800",
        Some("C") => "#4caf50",
        Some("D") => "#2196f3",
        _ => "#8884d8",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightDistribution {
    pub cultivation: String,
    pub strategy: String,
    pub target_weight: Option<f64>,
    pub lower_cap: Option<f64>,
    pub upper_cap: Option<f64>,
    pub bins: Vec<WeightBin>,
}

impl WeightDistribution {
    pub fn total_count(&self) -> u64 {
        self.bins.iter().map(|b| b.count).sum()
    }

    pub fn total_revenue(&self) -> f64 {
        self.bins.iter().filter_map(|b| b.revenue).sum()
    }
}

/// What the distribution panel can show. Absence is a displayable state,
/// never an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DistributionView {
    NoSelection,
    NoData,
    Available(WeightDistribution),
}

/// Looks up the weight histogram for exactly one cultivation and strategy.
pub fn distribution_view(
    store: &CultivationKpiStore,
    cultivation: Option<&str>,
    strategy: Option<&str>,
) -> DistributionView {
    let (Some(cultivation), Some(strategy)) = (cultivation, strategy) else {
        return DistributionView::NoSelection;
    };
    let Some(record) = store.strategy(cultivation, strategy) else {
        return DistributionView::NoData;
    };
    match &record.weight_bin_distribution {
        Some(bins) if !bins.is_empty() => DistributionView::Available(WeightDistribution {
            cultivation: cultivation.to_string(),
            strategy: strategy.to_string(),
            target_weight: record.target_weight,
            lower_cap: record.lower_cap,
            upper_cap: record.upper_cap,
            bins: bins.clone(),
        }),
        _ => DistributionView::NoData,
    }
}

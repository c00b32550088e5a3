//! Built-in sample data, used whenever no input source yields a usable payload.

use crate::types::{Cultivation, CultivationKpiStore, StrategyKpi};
use std::sync::LazyLock;

static DEFAULT_STORE: LazyLock<CultivationKpiStore> = LazyLock::new(|| {
    CultivationKpiStore::new(vec![
        Cultivation {
            name: "2024-5, Vak 11, Serenity".into(),
            strategies: vec![
                sample("Default", -1.0, 12.0, 3.0, 60.0, 8.0, 8.0),
                sample("Optimized", 2.0, 19.0, 3.5, 72.0, 10.0, 10.5),
            ],
        },
        Cultivation {
            name: "2024-5, Vak 12, Baltica".into(),
            strategies: vec![
                sample("Default", 0.0, 14.0, 4.0, 66.0, 9.0, 9.0),
                sample("Optimized", 4.0, 22.0, 5.0, 80.0, 12.0, 11.0),
            ],
        },
    ])
});

pub fn default_store() -> &'static CultivationKpiStore {
    &DEFAULT_STORE
}

fn sample(
    name: &str,
    bonus_penalty: f64,
    profit: f64,
    energy_cost: f64,
    weight_achieved: f64,
    base_revenue_a: f64,
    base_revenue_b: f64,
) -> StrategyKpi {
    StrategyKpi {
        bonus_penalty,
        profit,
        energy_cost,
        weight_achieved,
        base_revenue_a,
        base_revenue_b,
        ..StrategyKpi::named(name)
    }
}

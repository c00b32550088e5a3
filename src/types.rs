use chrono::NaiveDate;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

/// One strategy's KPIs for one cultivation, after alias resolution and
/// numeric coercion. Every `f64` here is finite.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyKpi {
    pub name: String,
    pub bonus_penalty: f64,
    pub profit: f64,
    pub energy_cost: f64,
    pub weight_achieved: f64,
    pub base_revenue_a: f64,
    pub base_revenue_b: f64,
    /// Explicit total. When absent, consumers derive `base_revenue_a + base_revenue_b`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_revenue: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub euro_per_kwh: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kwh_per_gram: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub euro_per_gram: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lower_cap: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upper_cap: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight_bin_distribution: Option<Vec<WeightBin>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub daily: Vec<DailyRecord>,
}

impl StrategyKpi {
    /// A record with every numeric KPI at zero and no extended data.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bonus_penalty: 0.0,
            profit: 0.0,
            energy_cost: 0.0,
            weight_achieved: 0.0,
            base_revenue_a: 0.0,
            base_revenue_b: 0.0,
            base_revenue: None,
            euro_per_kwh: None,
            kwh_per_gram: None,
            euro_per_gram: None,
            target_weight: None,
            lower_cap: None,
            upper_cap: None,
            weight_bin_distribution: None,
            daily: Vec::new(),
        }
    }

    pub fn resolved_base_revenue(&self) -> f64 {
        self.base_revenue
            .unwrap_or(self.base_revenue_a + self.base_revenue_b)
    }
}

/// One day of a strategy's time series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyRecord {
    pub date: NaiveDate,
    pub total_energy_cost: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consumption: Option<f64>,
    #[serde(rename = "avg_energy_price", skip_serializing_if = "Option::is_none")]
    pub energy_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radiation: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightBin {
    pub bin: String,
    pub count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revenue: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cultivation {
    pub name: String,
    pub strategies: Vec<StrategyKpi>,
}

impl Cultivation {
    pub fn strategy(&self, name: &str) -> Option<&StrategyKpi> {
        self.strategies.iter().find(|s| s.name == name)
    }
}

/// Cultivation name to strategy records, in load order. Built once per load
/// and replaced wholesale on the next one.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CultivationKpiStore {
    cultivations: Vec<Cultivation>,
}

impl CultivationKpiStore {
    pub fn new(cultivations: Vec<Cultivation>) -> Self {
        Self { cultivations }
    }

    pub fn cultivations(&self) -> &[Cultivation] {
        &self.cultivations
    }

    pub fn names(&self) -> Vec<String> {
        self.cultivations.iter().map(|c| c.name.clone()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&Cultivation> {
        self.cultivations.iter().find(|c| c.name == name)
    }

    pub fn strategy(&self, cultivation: &str, strategy: &str) -> Option<&StrategyKpi> {
        self.get(cultivation).and_then(|c| c.strategy(strategy))
    }

    /// Distinct strategy names across every cultivation, by first encounter.
    pub fn strategy_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for s in self.cultivations.iter().flat_map(|c| &c.strategies) {
            if !names.contains(&s.name) {
                names.push(s.name.clone());
            }
        }
        names
    }

    pub fn len(&self) -> usize {
        self.cultivations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cultivations.is_empty()
    }
}

impl Serialize for CultivationKpiStore {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cultivations.len()))?;
        for c in &self.cultivations {
            map.serialize_entry(&c.name, &c.strategies)?;
        }
        map.end()
    }
}

/// The five KPIs plotted on the radar, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kpi {
    BonusPenalty,
    Profit,
    EnergyCost,
    WeightAchieved,
    BaseRevenue,
}

impl Kpi {
    pub const ALL: [Kpi; 5] = [
        Kpi::BonusPenalty,
        Kpi::Profit,
        Kpi::EnergyCost,
        Kpi::WeightAchieved,
        Kpi::BaseRevenue,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::BonusPenalty => "Bonus/Penalty",
            Self::Profit => "Profit",
            Self::EnergyCost => "Energy Cost",
            Self::WeightAchieved => "Weight",
            Self::BaseRevenue => "Base Revenue",
        }
    }
}

impl std::fmt::Display for Kpi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Per-strategy mean over the selected cultivations it appears in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedStrategyKpi {
    pub name: String,
    pub bonus_penalty: f64,
    pub profit: f64,
    pub energy_cost: f64,
    pub weight_achieved: f64,
    pub base_revenue_a: f64,
    pub base_revenue_b: f64,
    pub base_revenue: f64,
}

impl AggregatedStrategyKpi {
    pub fn value(&self, kpi: Kpi) -> f64 {
        match kpi {
            Kpi::BonusPenalty => self.bonus_penalty,
            Kpi::Profit => self.profit,
            Kpi::EnergyCost => self.energy_cost,
            Kpi::WeightAchieved => self.weight_achieved,
            Kpi::BaseRevenue => self.base_revenue,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeriesPoint {
    pub strategy: String,
    pub scaled: f64,
    pub raw: f64,
}

/// One radar axis: every strategy's normalized value plus its raw value.
/// Serializes flat as `{metric, <name>: scaled, "<name>-raw": raw}`.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeriesRow {
    pub metric: Kpi,
    pub points: Vec<SeriesPoint>,
}

impl ChartSeriesRow {
    pub fn point(&self, strategy: &str) -> Option<&SeriesPoint> {
        self.points.iter().find(|p| p.strategy == strategy)
    }
}

impl Serialize for ChartSeriesRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1 + self.points.len() * 2))?;
        map.serialize_entry("metric", self.metric.label())?;
        for p in &self.points {
            map.serialize_entry(&p.strategy, &p.scaled)?;
            map.serialize_entry(&format!("{}-raw", p.strategy), &p.raw)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_revenue_prefers_explicit_total() {
        let mut s = StrategyKpi::named("Default");
        s.base_revenue_a = 10.0;
        s.base_revenue_b = 5.0;
        assert_eq!(s.resolved_base_revenue(), 15.0);

        s.base_revenue = Some(12.0);
        assert_eq!(s.resolved_base_revenue(), 12.0);
    }

    #[test]
    fn store_serializes_as_ordered_map() {
        let store = CultivationKpiStore::new(vec![
            Cultivation {
                name: "Zeta".into(),
                strategies: vec![StrategyKpi::named("Default")],
            },
            Cultivation {
                name: "Alpha".into(),
                strategies: vec![],
            },
        ]);
        let json = serde_json::to_value(&store).unwrap();
        let keys: Vec<&String> = json.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["Zeta", "Alpha"]);
        assert_eq!(json["Zeta"][0]["name"], "Default");
    }

    #[test]
    fn strategy_names_are_distinct_in_first_encounter_order() {
        let store = CultivationKpiStore::new(vec![
            Cultivation {
                name: "A".into(),
                strategies: vec![StrategyKpi::named("Optimized"), StrategyKpi::named("Default")],
            },
            Cultivation {
                name: "B".into(),
                strategies: vec![StrategyKpi::named("Default"), StrategyKpi::named("Night")],
            },
        ]);
        assert_eq!(store.strategy_names(), vec!["Optimized", "Default", "Night"]);
    }

    #[test]
    fn chart_row_serializes_flat() {
        let row = ChartSeriesRow {
            metric: Kpi::Profit,
            points: vec![SeriesPoint {
                strategy: "Default".into(),
                scaled: 0.5,
                raw: 25.0,
            }],
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["metric"], "Profit");
        assert_eq!(json["Default"], 0.5);
        assert_eq!(json["Default-raw"], 25.0);
    }
}

use crate::analysis::normalizer::{aliases, coerce_number, parse_date_str, resolve_number};
use crate::analysis::unique;
use crate::types::CultivationKpiStore;
use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

const DAYS_PER_WEEK: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct EnergyCell {
    pub cost: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consumption: Option<f64>,
}

/// Daily energy figures per cultivation, date and strategy. The week a cell
/// belongs to is always derived from its date.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EnergyLedger {
    cells: BTreeMap<String, BTreeMap<NaiveDate, BTreeMap<String, EnergyCell>>>,
}

impl EnergyLedger {
    /// Builds the ledger from each record's `daily` series.
    pub fn from_store(store: &CultivationKpiStore) -> Self {
        let mut ledger = Self::default();
        for c in store.cultivations() {
            for s in &c.strategies {
                for day in &s.daily {
                    ledger.insert(
                        &c.name,
                        day.date,
                        &s.name,
                        EnergyCell {
                            cost: day.total_energy_cost,
                            consumption: day.consumption,
                        },
                    );
                }
            }
        }
        ledger
    }

    /// Parses an explicit `cultivation -> week -> date -> strategy -> cell`
    /// document. A cell is a bare cost or an object with cost and consumption.
    pub fn from_value(value: &Value) -> Option<Self> {
        let cultivations = value.as_object()?;
        let mut ledger = Self::default();
        for (cultivation, weeks) in cultivations {
            let Some(weeks) = weeks.as_object() else {
                debug!(cultivation = %cultivation, "energy entry is not an object");
                continue;
            };
            for days in weeks.values().filter_map(Value::as_object) {
                for (date, strategies) in days {
                    let Some(date) = parse_date_str(date) else {
                        debug!(cultivation = %cultivation, date = %date, "unparseable energy date");
                        continue;
                    };
                    for (strategy, cell) in strategies.as_object().into_iter().flatten() {
                        ledger.insert(cultivation, date, strategy, parse_cell(cell));
                    }
                }
            }
        }
        Some(ledger)
    }

    pub fn insert(&mut self, cultivation: &str, date: NaiveDate, strategy: &str, cell: EnergyCell) {
        self.cells
            .entry(cultivation.to_string())
            .or_default()
            .entry(date)
            .or_default()
            .insert(strategy.to_string(), cell);
    }

    pub fn cell(&self, cultivation: &str, date: NaiveDate, strategy: &str) -> Option<&EnergyCell> {
        self.cells.get(cultivation)?.get(&date)?.get(strategy)
    }

    /// Distinct dates across the given cultivations, ascending.
    pub fn dates(&self, selected: &[String]) -> BTreeSet<NaiveDate> {
        unique(selected)
            .into_iter()
            .filter_map(|c| self.cells.get(c))
            .flat_map(|days| days.keys().copied())
            .collect()
    }
}

fn parse_cell(value: &Value) -> EnergyCell {
    match value {
        Value::Object(obj) => EnergyCell {
            cost: resolve_number(obj, &["cost", "total_energy_cost"]).unwrap_or(0.0),
            consumption: resolve_number(obj, aliases::CONSUMPTION),
        },
        other => EnergyCell {
            cost: coerce_number(other).unwrap_or(0.0),
            consumption: None,
        },
    }
}

/// Monday of the week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// ISO-8601 week number: the Thursday of the date's week decides the year.
pub fn iso_week_number(date: NaiveDate) -> u32 {
    let thursday = week_start(date) + Duration::days(3);
    (thursday.ordinal0() + 1).div_ceil(7)
}

/// Week starts with data in any of the selected cultivations, ascending.
pub fn available_weeks(ledger: &EnergyLedger, selected: &[String]) -> Vec<NaiveDate> {
    let weeks: BTreeSet<NaiveDate> = ledger.dates(selected).into_iter().map(week_start).collect();
    weeks.into_iter().collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyCost {
    pub strategy: String,
    pub cost: f64,
}

/// One day of the weekly bar chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyEnergyTotals {
    pub date: NaiveDate,
    pub costs: Vec<StrategyCost>,
    /// Total cost over total consumption; `None` when nothing was consumed.
    pub avg_price: Option<f64>,
}

impl DailyEnergyTotals {
    pub fn cost(&self, strategy: &str) -> f64 {
        self.costs
            .iter()
            .find(|c| c.strategy == strategy)
            .map_or(0.0, |c| c.cost)
    }

    pub fn total(&self) -> f64 {
        self.costs.iter().map(|c| c.cost).sum()
    }
}

/// Seven consecutive days from `week`, each with every visible strategy's
/// cost summed over the selected cultivations.
pub fn build_weekly_series(
    ledger: &EnergyLedger,
    selected: &[String],
    week: NaiveDate,
    visible: &[String],
) -> Vec<DailyEnergyTotals> {
    let selected = unique(selected);
    week.iter_days()
        .take(DAYS_PER_WEEK)
        .map(|date| {
            let mut total_cost = 0.0;
            let mut total_consumption = 0.0;
            let costs = visible
                .iter()
                .map(|strategy| {
                    let mut cost = 0.0;
                    for cultivation in &selected {
                        if let Some(cell) = ledger.cell(cultivation, date, strategy) {
                            cost += cell.cost;
                            total_consumption += cell.consumption.unwrap_or(0.0);
                        }
                    }
                    total_cost += cost;
                    StrategyCost {
                        strategy: strategy.clone(),
                        cost,
                    }
                })
                .collect();
            DailyEnergyTotals {
                date,
                costs,
                avg_price: (total_consumption > 0.0).then(|| total_cost / total_consumption),
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CumulativePoint {
    pub day: i64,
    pub cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CumulativeSeries {
    pub strategy: String,
    pub points: Vec<CumulativePoint>,
}

impl CumulativeSeries {
    pub fn last(&self) -> f64 {
        self.points.last().map_or(0.0, |p| p.cost)
    }
}

/// Running cost per visible strategy over every date with data, keyed by
/// days since the first date.
pub fn build_cumulative_series(
    ledger: &EnergyLedger,
    selected: &[String],
    visible: &[String],
) -> Vec<CumulativeSeries> {
    let dates = ledger.dates(selected);
    let selected = unique(selected);
    let first = dates.first().copied();

    visible
        .iter()
        .map(|strategy| {
            let mut running = 0.0;
            let points = dates
                .iter()
                .map(|&date| {
                    running += selected
                        .iter()
                        .filter_map(|c| ledger.cell(c, date, strategy))
                        .map(|cell| cell.cost)
                        .sum::<f64>();
                    CumulativePoint {
                        day: first.map_or(0, |f| (date - f).num_days()),
                        cost: running,
                    }
                })
                .collect();
            CumulativeSeries {
                strategy: strategy.clone(),
                points,
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DailyMetric {
    EnergyPrice,
    Radiation,
}

impl DailyMetric {
    pub fn label(&self) -> &'static str {
        match self {
            Self::EnergyPrice => "Energy Price",
            Self::Radiation => "Radiation",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyMetricPoint {
    pub date: NaiveDate,
    pub weekday: String,
    pub value: f64,
}

/// Seven daily averages of an environment metric over every selected
/// cultivation and visible strategy. Days without readings are 0.
pub fn build_daily_metric_series(
    store: &CultivationKpiStore,
    selected: &[String],
    visible: &[String],
    week: NaiveDate,
    metric: DailyMetric,
) -> Vec<DailyMetricPoint> {
    let mut sums: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
    for cultivation in unique(selected) {
        for strategy in visible {
            let Some(record) = store.strategy(cultivation, strategy) else {
                continue;
            };
            for day in &record.daily {
                let reading = match metric {
                    DailyMetric::EnergyPrice => day.energy_price,
                    DailyMetric::Radiation => day.radiation,
                };
                if let Some(v) = reading {
                    let entry = sums.entry(day.date).or_default();
                    entry.0 += v;
                    entry.1 += 1;
                }
            }
        }
    }

    week.iter_days()
        .take(DAYS_PER_WEEK)
        .map(|date| DailyMetricPoint {
            date,
            weekday: date.format("%a").to_string(),
            value: sums
                .get(&date)
                .map_or(0.0, |(sum, count)| sum / *count as f64),
        })
        .collect()
}

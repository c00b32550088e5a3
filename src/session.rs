use crate::analysis::aggregator::{
    EfficiencySummary, aggregate_with_precision, summarize_efficiency,
};
use crate::analysis::colors::{ColorMap, assign_colors_by_profit};
use crate::analysis::distribution::{DistributionView, distribution_view};
use crate::analysis::energy::{
    CumulativeSeries, DailyEnergyTotals, DailyMetric, DailyMetricPoint, EnergyLedger,
    available_weeks, build_cumulative_series, build_daily_metric_series, build_weekly_series,
    iso_week_number, week_start,
};
use crate::analysis::series::build_series;
use crate::selection::{DefaultSelection, SelectionState};
use crate::sources::{Payload, SourceKind};
use crate::types::{AggregatedStrategyKpi, ChartSeriesRow, CultivationKpiStore};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info, warn};

/// Issued by [`DashboardSession::begin_load`]; a payload is applied only if
/// its ticket is newer than the last one applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LoadTicket(u64);

/// Dashboard state: the current store, its energy ledger and the user's
/// selection. Every load replaces store and ledger wholesale and resets the
/// selection.
#[derive(Debug, Clone)]
pub struct DashboardSession {
    store: CultivationKpiStore,
    energy: EnergyLedger,
    source: SourceKind,
    selection: SelectionState,
    policy: DefaultSelection,
    decimals: u32,
    issued: u64,
    applied: u64,
}

impl DashboardSession {
    /// Starts on the built-in default data set.
    pub fn new(policy: DefaultSelection, decimals: u32) -> Self {
        let Payload {
            store,
            energy,
            source,
        } = Payload::fallback();
        let selection = SelectionState::for_store(&store, policy);
        Self {
            store,
            energy,
            source,
            selection,
            policy,
            decimals,
            issued: 0,
            applied: 0,
        }
    }

    pub fn begin_load(&mut self) -> LoadTicket {
        self.issued += 1;
        LoadTicket(self.issued)
    }

    /// Installs `payload` unless a newer load has already been applied.
    /// Returns whether the payload was taken.
    pub fn apply(&mut self, ticket: LoadTicket, payload: Payload) -> bool {
        if ticket.0 <= self.applied {
            warn!(
                ticket = ticket.0,
                applied = self.applied,
                source = %payload.source,
                "dropping stale load"
            );
            return false;
        }
        self.applied = ticket.0;
        self.selection = SelectionState::for_store(&payload.store, self.policy);
        self.store = payload.store;
        self.energy = payload.energy;
        self.source = payload.source;
        info!(
            source = %self.source,
            cultivations = self.store.len(),
            selected = self.selection.selected().len(),
            "dashboard data replaced"
        );
        true
    }

    pub fn store(&self) -> &CultivationKpiStore {
        &self.store
    }

    pub fn energy(&self) -> &EnergyLedger {
        &self.energy
    }

    pub fn source(&self) -> SourceKind {
        self.source
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    /// Toggles a cultivation known to the store. Unknown names are ignored.
    pub fn toggle_cultivation(&mut self, cultivation: &str) -> Option<bool> {
        if self.store.get(cultivation).is_none() {
            warn!(cultivation, "cannot toggle unknown cultivation");
            return None;
        }
        Some(self.selection.toggle_cultivation(cultivation))
    }

    /// Replaces the selection with `cultivations`, skipping unknown names.
    pub fn select_only<S: AsRef<str>>(&mut self, cultivations: &[S]) {
        for name in self.selection.selected().to_vec() {
            self.selection.toggle_cultivation(&name);
        }
        for name in cultivations {
            let name = name.as_ref();
            if !self.selection.is_selected(name) {
                self.toggle_cultivation(name);
            }
        }
    }

    pub fn toggle_strategy(&mut self, strategy: &str) -> bool {
        self.selection.toggle_strategy(strategy)
    }

    pub fn set_strategy_visible(&mut self, strategy: &str, visible: bool) {
        self.selection.set_visible(strategy, visible);
    }

    pub fn aggregated(&self) -> Vec<AggregatedStrategyKpi> {
        aggregate_with_precision(&self.store, self.selection.selected(), self.decimals)
    }

    /// Computes every dashboard panel for the current selection. `week` is
    /// snapped to its Monday; without one the first week with data is shown.
    pub fn view(&mut self, week: Option<NaiveDate>) -> DashboardView {
        let aggregated = self.aggregated();
        self.selection.sync_visibility(&aggregated);

        let selected = self.selection.selected().to_vec();
        let visible = self.selection.visible_strategies(&aggregated);
        let colors = assign_colors_by_profit(&aggregated);

        let weeks: Vec<WeekOption> = available_weeks(&self.energy, &selected)
            .into_iter()
            .map(WeekOption::new)
            .collect();
        let week = week
            .map(week_start)
            .or_else(|| weeks.first().map(|w| w.start));
        debug!(?week, weeks = weeks.len(), "week resolved");

        let (weekly_energy, energy_price, radiation) = match week {
            Some(week) => {
                let metric = |m| {
                    build_daily_metric_series(&self.store, &selected, &visible, week, m)
                };
                (
                    build_weekly_series(&self.energy, &selected, week, &visible),
                    metric(DailyMetric::EnergyPrice),
                    metric(DailyMetric::Radiation),
                )
            }
            None => (Vec::new(), Vec::new(), Vec::new()),
        };

        let distribution = distribution_view(&self.store, single(&selected), single(&visible));

        DashboardView {
            source: self.source,
            decimals: self.decimals,
            cultivations: self
                .store
                .names()
                .into_iter()
                .map(|name| CultivationToggle {
                    selected: self.selection.is_selected(&name),
                    name,
                })
                .collect(),
            strategies: aggregated
                .iter()
                .map(|s| StrategyToggle {
                    name: s.name.clone(),
                    color: colors.get(&s.name).copied().unwrap_or_default(),
                    visible: self.selection.is_visible(&s.name),
                })
                .collect(),
            radar: build_series(&aggregated),
            efficiency: summarize_efficiency(&self.store, &selected, &visible),
            cumulative_energy: build_cumulative_series(&self.energy, &selected, &visible),
            selected,
            aggregated,
            colors,
            weeks,
            week,
            weekly_energy,
            energy_price,
            radiation,
            distribution,
        }
    }
}

fn single(names: &[String]) -> Option<&str> {
    match names {
        [only] => Some(only.as_str()),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CultivationToggle {
    pub name: String,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyToggle {
    pub name: String,
    pub color: &'static str,
    pub visible: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WeekOption {
    pub start: NaiveDate,
    pub number: u32,
}

impl WeekOption {
    pub fn new(start: NaiveDate) -> Self {
        Self {
            start,
            number: iso_week_number(start),
        }
    }

    pub fn label(&self) -> String {
        format!("Week {}", self.number)
    }
}

/// Snapshot of every dashboard panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub source: SourceKind,
    /// Precision the averages were rounded to.
    pub decimals: u32,
    pub cultivations: Vec<CultivationToggle>,
    pub selected: Vec<String>,
    pub strategies: Vec<StrategyToggle>,
    pub aggregated: Vec<AggregatedStrategyKpi>,
    pub colors: ColorMap,
    pub radar: Vec<ChartSeriesRow>,
    pub efficiency: Vec<EfficiencySummary>,
    pub weeks: Vec<WeekOption>,
    pub week: Option<NaiveDate>,
    pub weekly_energy: Vec<DailyEnergyTotals>,
    pub cumulative_energy: Vec<CumulativeSeries>,
    pub energy_price: Vec<DailyMetricPoint>,
    pub radiation: Vec<DailyMetricPoint>,
    pub distribution: DistributionView,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: serde_json::Value) -> Payload {
        Payload::from_value(value, SourceKind::InlineData)
    }

    fn two_cultivations() -> Payload {
        payload(json!({
            "A": [
                {"name": "Default", "profit": 10,
                 "daily": [{"date": "2024-01-03", "total_energy_cost": 5, "consumption": 20}]},
                {"name": "Optimized", "profit": 14,
                 "daily": [{"date": "2024-01-03", "total_energy_cost": 3, "consumption": 20}]},
            ],
            "B": [{"name": "Default", "profit": 12}],
            "C": [{"name": "Night", "profit": 1}],
        }))
    }

    #[test]
    fn starts_on_default_data() {
        let session = DashboardSession::new(DefaultSelection::FirstTwo, 1);
        assert_eq!(session.source(), SourceKind::Default);
        assert_eq!(session.selection().selected().len(), 2);
    }

    #[test]
    fn stale_ticket_is_dropped() {
        let mut session = DashboardSession::new(DefaultSelection::FirstTwo, 1);
        let first = session.begin_load();
        let second = session.begin_load();

        assert!(session.apply(second, two_cultivations()));
        assert!(!session.apply(first, payload(json!({"Z": [{"name": "S"}]}))));
        assert_eq!(session.store().names(), vec!["A", "B", "C"]);
    }

    #[test]
    fn in_order_responses_both_apply() {
        let mut session = DashboardSession::new(DefaultSelection::All, 1);
        let first = session.begin_load();
        let second = session.begin_load();
        assert!(session.apply(first, payload(json!({"Z": [{"name": "S"}]}))));
        assert!(session.apply(second, two_cultivations()));
        assert_eq!(session.selection().selected(), ["A", "B", "C"]);
    }

    #[test]
    fn load_resets_selection() {
        let mut session = DashboardSession::new(DefaultSelection::FirstTwo, 1);
        let ticket = session.begin_load();
        session.apply(ticket, two_cultivations());
        assert_eq!(session.toggle_cultivation("C"), Some(true));
        assert_eq!(session.toggle_cultivation("nope"), None);

        let ticket = session.begin_load();
        session.apply(ticket, two_cultivations());
        assert_eq!(session.selection().selected(), ["A", "B"]);
    }

    #[test]
    fn view_combines_panels() {
        let mut session = DashboardSession::new(DefaultSelection::FirstTwo, 1);
        let ticket = session.begin_load();
        session.apply(ticket, two_cultivations());
        session.toggle_strategy("Default");

        let view = session.view(None);
        assert_eq!(view.aggregated.len(), 2);
        assert_eq!(view.colors["Optimized"], "#FFD700");
        assert_eq!(view.colors["Default"], "#2ca02c");
        assert_eq!(view.weeks, vec![WeekOption::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())]);
        assert_eq!(view.weeks[0].label(), "Week 1");
        assert_eq!(view.week, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(view.weekly_energy.len(), 7);
        assert_eq!(view.weekly_energy[2].costs.len(), 1);
        assert_eq!(view.weekly_energy[2].cost("Optimized"), 3.0);
        assert_eq!(view.cumulative_energy.len(), 1);
        assert_eq!(view.efficiency[0].strategy, "Optimized");
        assert!(!view.strategies.iter().find(|s| s.name == "Default").unwrap().visible);
        assert_eq!(view.distribution, DistributionView::NoSelection);
    }

    #[test]
    fn select_only_skips_unknown_names() {
        let mut session = DashboardSession::new(DefaultSelection::FirstTwo, 1);
        let ticket = session.begin_load();
        session.apply(ticket, two_cultivations());
        session.select_only(&["C", "ghost"]);
        assert_eq!(session.selection().selected(), ["C"]);

        let view = session.view(None);
        assert!(view.weeks.is_empty());
        assert!(view.weekly_energy.is_empty());
        assert_eq!(view.distribution, DistributionView::NoData);
    }
}

use crate::types::{AggregatedStrategyKpi, CultivationKpiStore};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which cultivations start selected after a load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultSelection {
    #[default]
    FirstTwo,
    All,
}

/// Selected cultivations (in toggle order) and per-strategy visibility.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SelectionState {
    selected: Vec<String>,
    visible: BTreeMap<String, bool>,
}

impl SelectionState {
    /// Initial selection for a freshly loaded store, every strategy visible.
    pub fn for_store(store: &CultivationKpiStore, policy: DefaultSelection) -> Self {
        let names = store.names();
        let selected = match policy {
            DefaultSelection::FirstTwo => names.into_iter().take(2).collect(),
            DefaultSelection::All => names,
        };
        let visible = store
            .strategy_names()
            .into_iter()
            .map(|name| (name, true))
            .collect();
        Self { selected, visible }
    }

    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    pub fn is_selected(&self, cultivation: &str) -> bool {
        self.selected.iter().any(|c| c == cultivation)
    }

    /// Adds or removes a cultivation. Returns whether it is now selected.
    pub fn toggle_cultivation(&mut self, cultivation: &str) -> bool {
        if let Some(pos) = self.selected.iter().position(|c| c == cultivation) {
            self.selected.remove(pos);
            false
        } else {
            self.selected.push(cultivation.to_string());
            true
        }
    }

    /// Flips a strategy's visibility. Returns whether it is now visible.
    pub fn toggle_strategy(&mut self, strategy: &str) -> bool {
        let flag = self.visible.entry(strategy.to_string()).or_insert(false);
        *flag = !*flag;
        *flag
    }

    pub fn set_visible(&mut self, strategy: &str, visible: bool) {
        self.visible.insert(strategy.to_string(), visible);
    }

    pub fn is_visible(&self, strategy: &str) -> bool {
        self.visible.get(strategy).copied().unwrap_or(false)
    }

    /// Strategies appearing in a new aggregation become visible; flags of
    /// known strategies are kept.
    pub fn sync_visibility(&mut self, aggregated: &[AggregatedStrategyKpi]) {
        for s in aggregated {
            self.visible.entry(s.name.clone()).or_insert(true);
        }
    }

    /// Visible strategies among `aggregated`, in its order.
    pub fn visible_strategies(&self, aggregated: &[AggregatedStrategyKpi]) -> Vec<String> {
        aggregated
            .iter()
            .filter(|s| self.is_visible(&s.name))
            .map(|s| s.name.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::aggregator::aggregate;
    use crate::analysis::normalizer::normalize;
    use serde_json::json;

    fn store() -> CultivationKpiStore {
        normalize(Some(&json!({
            "A": [{"name": "Default"}],
            "B": [{"name": "Default"}, {"name": "Optimized"}],
            "C": [{"name": "Night"}],
        })))
    }

    #[test]
    fn default_policies() {
        let two = SelectionState::for_store(&store(), DefaultSelection::FirstTwo);
        assert_eq!(two.selected(), ["A", "B"]);
        assert!(two.is_visible("Night"));

        let all = SelectionState::for_store(&store(), DefaultSelection::All);
        assert_eq!(all.selected(), ["A", "B", "C"]);
    }

    #[test]
    fn toggling_cultivations_appends_and_removes() {
        let mut state = SelectionState::for_store(&store(), DefaultSelection::FirstTwo);
        assert!(!state.toggle_cultivation("A"));
        assert!(state.toggle_cultivation("C"));
        assert!(state.toggle_cultivation("A"));
        assert_eq!(state.selected(), ["B", "C", "A"]);
    }

    #[test]
    fn visibility_survives_resync() {
        let s = store();
        let mut state = SelectionState::for_store(&s, DefaultSelection::FirstTwo);
        assert!(!state.toggle_strategy("Optimized"));

        let aggregated = aggregate(&s, state.selected());
        state.sync_visibility(&aggregated);
        assert!(!state.is_visible("Optimized"));
        assert_eq!(state.visible_strategies(&aggregated), vec!["Default"]);

        assert!(state.toggle_strategy("Optimized"));
        assert_eq!(state.visible_strategies(&aggregated), vec!["Default", "Optimized"]);

        state.set_visible("Default", false);
        assert_eq!(state.visible_strategies(&aggregated), vec!["Optimized"]);
    }

    #[test]
    fn unknown_strategy_becomes_visible_on_first_sight() {
        let mut state = SelectionState::default();
        assert!(!state.is_visible("New"));
        let aggregated = aggregate(&store(), &["C".to_string()]);
        state.sync_visibility(&aggregated);
        assert!(state.is_visible("Night"));
    }
}

use growlitics::analysis::aggregator::aggregate;
use growlitics::analysis::colors::{COLOR_PALETTE, assign_colors, assign_colors_by_profit};
use growlitics::analysis::energy::{EnergyLedger, build_cumulative_series, week_start};
use growlitics::analysis::normalizer::normalize;
use growlitics::analysis::series::build_series;
use growlitics::config::SourcesConfig;
use growlitics::http::HttpClient;
use growlitics::selection::DefaultSelection;
use growlitics::session::DashboardSession;
use growlitics::sources::{self, LoadRequest, SourceKind};
use growlitics::types::{AggregatedStrategyKpi, Kpi};
use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::time::Duration;

fn selection(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[test]
fn single_record_end_to_end() {
    let raw = json!([{
        "cultivation": "X", "name": "Default", "profit": 10, "energy_cost": 2,
        "weight_achieved": 50, "bonus_penalty": 0, "base_revenue_a": 5, "base_revenue_b": 5,
    }]);
    let store = normalize(Some(&raw));
    let aggregated = aggregate(&store, &selection(&["X"]));

    assert_eq!(
        aggregated,
        vec![AggregatedStrategyKpi {
            name: "Default".into(),
            bonus_penalty: 0.0,
            profit: 10.0,
            energy_cost: 2.0,
            weight_achieved: 50.0,
            base_revenue_a: 5.0,
            base_revenue_b: 5.0,
            base_revenue: 10.0,
        }]
    );

    let colors = assign_colors_by_profit(&aggregated);
    assert_eq!(colors.len(), 1);
    assert_eq!(colors["Default"], COLOR_PALETTE[0]);

    let series = build_series(&aggregated);
    let profit = series.iter().find(|r| r.metric == Kpi::Profit).unwrap();
    assert_eq!(profit.point("Default").unwrap().scaled, 0.2);
    assert_eq!(profit.point("Default").unwrap().raw, 10.0);
}

#[test]
fn normalization_is_idempotent() {
    let store = normalize(Some(&json!([
        {"batch": "B1", "strategy": "Default", "profit": "12.5"},
        {"batch": "B2", "name": "Optimized", "profit_per_m2": 20},
        {"name": "Loose"},
    ])));
    let again = normalize(Some(&serde_json::to_value(&store).unwrap()));
    assert_eq!(again, store);
    assert_eq!(store.names(), vec!["B1", "B2", "All Cultivations"]);
}

#[test]
fn color_assignment_ignores_input_order() {
    let expected = assign_colors(&["B", "Optimized", "A"]);
    for names in [["A", "B", "Optimized"], ["Optimized", "B", "A"], ["B", "A", "Optimized"]] {
        assert_eq!(assign_colors(&names), expected);
    }
    assert_eq!(expected["Optimized"], COLOR_PALETTE[0]);
    assert_eq!(expected["A"], COLOR_PALETTE[1]);
    assert_eq!(expected["B"], COLOR_PALETTE[2]);
}

#[test]
fn optimized_average_ignores_cultivations_without_it() {
    let store = normalize(Some(&json!({
        "A": [{"name": "Optimized", "profit": 18}, {"name": "Default", "profit": 10}],
        "B": [{"name": "Optimized", "profit": 24}, {"name": "Default", "profit": 12}],
        "C": [{"name": "Default", "profit": 14}],
    })));
    let aggregated = aggregate(&store, &selection(&["A", "B", "C"]));
    let optimized = aggregated.iter().find(|s| s.name == "Optimized").unwrap();
    assert_eq!(optimized.profit, 21.0);
}

#[test]
fn cumulative_cost_never_decreases() {
    let store = normalize(Some(&json!({"X": [
        {"name": "Default", "daily": [
            {"date": "2024-02-04", "total_energy_cost": 1.5},
            {"date": "2024-02-05", "total_energy_cost": 0},
            {"date": "2024-02-07", "total_energy_cost": 2.25},
        ]},
    ]})));
    let ledger = EnergyLedger::from_store(&store);
    let series = build_cumulative_series(&ledger, &selection(&["X"]), &selection(&["Default"]));

    let costs: Vec<f64> = series[0].points.iter().map(|p| p.cost).collect();
    assert!(costs.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(series[0].points.last().unwrap().day, 3);
    assert_eq!(series[0].last(), 3.75);

    // 2024-02-04 is a Sunday.
    let sunday = NaiveDate::from_ymd_opt(2024, 2, 4).unwrap();
    assert_eq!(week_start(sunday), NaiveDate::from_ymd_opt(2024, 1, 29).unwrap());
}

#[tokio::test]
async fn data_url_feeds_the_dashboard() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/kpi.json")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "Vak 1": [
                    {"name": "Default", "profit": 10, "energy_cost": 4},
                    {"name": "Optimized", "profit": 16, "energy_cost": 3},
                ],
                "Vak 2": [{"name": "Default", "profit": 12, "energy_cost": 5}],
                "energy_cost_daily": {
                    "Vak 1": {"2024-10-07": {
                        "2024-10-08": {"Default": {"cost": 2, "consumption": 8}, "Optimized": 1},
                    }},
                },
            })
            .to_string(),
        )
        .create_async()
        .await;

    let cfg = SourcesConfig {
        gist_id: String::new(),
        ..SourcesConfig::default()
    };
    let http = HttpClient::new("growlitics-test", Duration::from_secs(5)).unwrap();
    let request = LoadRequest::from_query(&format!("?data_url={}/kpi.json", server.url()));

    let mut session = DashboardSession::new(DefaultSelection::FirstTwo, 1);
    let ticket = session.begin_load();
    let payload = sources::fetch(&request, &cfg, &http, None).await.unwrap();
    assert!(session.apply(ticket, payload));
    mock.assert_async().await;

    let view = session.view(None);
    assert_eq!(view.source, SourceKind::DataUrl);
    assert_eq!(view.selected, vec!["Vak 1", "Vak 2"]);

    let default = view.aggregated.iter().find(|s| s.name == "Default").unwrap();
    assert_eq!(default.profit, 11.0);
    assert_eq!(default.energy_cost, 4.5);
    assert_eq!(view.colors["Optimized"], COLOR_PALETTE[0]);
    assert_eq!(view.colors["Default"], COLOR_PALETTE[1]);

    assert_eq!(view.week, NaiveDate::from_ymd_opt(2024, 10, 7));
    assert_eq!(view.weeks[0].number, 41);
    let tuesday = &view.weekly_energy[1];
    assert_eq!(tuesday.cost("Default"), 2.0);
    assert_eq!(tuesday.cost("Optimized"), 1.0);
    assert_eq!(tuesday.avg_price, Some(3.0 / 8.0));
    assert_eq!(view.weekly_energy[0].avg_price, None);
}

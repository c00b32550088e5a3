use crate::analysis::distribution::{DistributionView, category_color};
use crate::analysis::energy::DailyMetric;
use crate::error::{Error, Result};
use crate::session::DashboardView;
use crate::types::Kpi;
use askama::Template;
use chrono::Utc;
use serde::Serialize;
use std::path::Path;

#[derive(Template)]
#[template(path = "report.html")]
pub struct ReportTemplate {
    pub generated_at: String,
    pub source: String,
    pub selected: String,
    pub cultivations: Vec<CultivationView>,
    pub strategies: Vec<StrategyView>,
    pub kpi_headers: Vec<&'static str>,
    pub kpi_rows: Vec<KpiRowView>,
    pub radar_headers: Vec<String>,
    pub radar_rows: Vec<RadarRowView>,
    pub stat_boxes: Vec<StatBoxView>,
    pub week_label: String,
    pub week_options: Vec<String>,
    pub weekly_headers: Vec<String>,
    pub energy_price_heading: &'static str,
    pub radiation_heading: &'static str,
    pub weekly_rows: Vec<WeeklyRowView>,
    pub cumulative: Vec<CumulativeView>,
    pub distribution: DistributionSection,
}

pub struct CultivationView {
    pub name: String,
    pub selected: bool,
}

pub struct StrategyView {
    pub name: String,
    pub color: String,
    pub visible: bool,
}

pub struct KpiRowView {
    pub name: String,
    pub color: String,
    pub values: Vec<String>,
}

pub struct RadarRowView {
    pub metric: String,
    pub cells: Vec<String>,
}

pub struct StatBoxView {
    pub strategy: String,
    pub color: String,
    pub profit: String,
    pub euro_per_kwh: String,
    pub kwh_per_gram: String,
    pub euro_per_gram: String,
}

pub struct WeeklyRowView {
    pub date: String,
    pub costs: Vec<String>,
    pub total: String,
    pub avg_price: String,
    pub energy_price: String,
    pub radiation: String,
}

pub struct CumulativeView {
    pub strategy: String,
    pub color: String,
    pub days: usize,
    pub total: String,
}

pub struct DistributionSection {
    pub message: String,
    pub title: String,
    pub caps: String,
    pub bins: Vec<BinView>,
}

pub struct BinView {
    pub bin: String,
    pub count: u64,
    pub category: String,
    pub color: String,
    pub revenue: String,
}

const NO_DATA: &str = "no data";

fn fixed(value: f64, decimals: usize) -> String {
    format!("{value:.decimals$}")
}

fn fixed_opt(value: Option<f64>, decimals: usize) -> String {
    value.map_or_else(|| NO_DATA.to_string(), |v| fixed(v, decimals))
}

pub fn render(view: &DashboardView) -> Result<String> {
    let color_of = |name: &str| {
        view.colors
            .get(name)
            .copied()
            .unwrap_or("#888888")
            .to_string()
    };
    let decimals = view.decimals as usize;

    let cultivations = view
        .cultivations
        .iter()
        .map(|c| CultivationView {
            name: c.name.clone(),
            selected: c.selected,
        })
        .collect();

    let strategies = view
        .strategies
        .iter()
        .map(|s| StrategyView {
            name: s.name.clone(),
            color: s.color.to_string(),
            visible: s.visible,
        })
        .collect();

    let kpi_rows = view
        .aggregated
        .iter()
        .map(|s| KpiRowView {
            name: s.name.clone(),
            color: color_of(&s.name),
            values: Kpi::ALL
                .iter()
                .map(|k| fixed(s.value(*k), decimals))
                .collect(),
        })
        .collect();

    let radar_headers: Vec<String> = view.aggregated.iter().map(|s| s.name.clone()).collect();
    let radar_rows = view
        .radar
        .iter()
        .map(|row| RadarRowView {
            metric: row.metric.label().to_string(),
            cells: row
                .points
                .iter()
                .map(|p| format!("{} ({})", fixed(p.scaled, 2), fixed(p.raw, 1)))
                .collect(),
        })
        .collect();

    let stat_boxes = view
        .efficiency
        .iter()
        .map(|e| StatBoxView {
            strategy: e.strategy.clone(),
            color: color_of(&e.strategy),
            profit: fixed_opt(e.profit, 3),
            euro_per_kwh: fixed_opt(e.euro_per_kwh, 3),
            kwh_per_gram: fixed_opt(e.kwh_per_gram, 3),
            euro_per_gram: fixed_opt(e.euro_per_gram, 3),
        })
        .collect();

    let week_label = match view.week {
        Some(week) => {
            let number = view
                .weeks
                .iter()
                .find(|w| w.start == week)
                .map_or_else(|| crate::session::WeekOption::new(week).label(), |w| w.label());
            format!("{number} (from {week})")
        }
        None => NO_DATA.to_string(),
    };

    let weekly_headers: Vec<String> = view
        .weekly_energy
        .first()
        .map(|day| day.costs.iter().map(|c| c.strategy.clone()).collect())
        .unwrap_or_default();

    let weekly_rows = view
        .weekly_energy
        .iter()
        .enumerate()
        .map(|(idx, day)| WeeklyRowView {
            date: day.date.format("%a %Y-%m-%d").to_string(),
            costs: day.costs.iter().map(|c| fixed(c.cost, 2)).collect(),
            total: fixed(day.total(), 2),
            avg_price: fixed_opt(day.avg_price, 3),
            energy_price: view
                .energy_price
                .get(idx)
                .map_or_else(|| NO_DATA.to_string(), |p| fixed(p.value, 3)),
            radiation: view
                .radiation
                .get(idx)
                .map_or_else(|| NO_DATA.to_string(), |p| fixed(p.value, 1)),
        })
        .collect();

    let cumulative = view
        .cumulative_energy
        .iter()
        .map(|series| CumulativeView {
            strategy: series.strategy.clone(),
            color: color_of(&series.strategy),
            days: series.points.len(),
            total: fixed(series.last(), 2),
        })
        .collect();

    let template = ReportTemplate {
        generated_at: Utc::now().format("%Y-%m-%d %H:%M UTC").to_string(),
        source: view.source.to_string(),
        selected: view.selected.join(", "),
        cultivations,
        strategies,
        kpi_headers: Kpi::ALL.iter().map(|k| k.label()).collect(),
        kpi_rows,
        radar_headers,
        radar_rows,
        stat_boxes,
        week_label,
        week_options: view
            .weeks
            .iter()
            .map(|w| format!("{} ({})", w.label(), w.start))
            .collect(),
        weekly_headers,
        energy_price_heading: DailyMetric::EnergyPrice.label(),
        radiation_heading: DailyMetric::Radiation.label(),
        weekly_rows,
        cumulative,
        distribution: distribution_section(&view.distribution),
    };

    template
        .render()
        .map_err(|e| Error::Template(e.to_string()))
}

fn distribution_section(view: &DistributionView) -> DistributionSection {
    let empty = |message: &str| DistributionSection {
        message: message.to_string(),
        title: String::new(),
        caps: String::new(),
        bins: Vec::new(),
    };
    match view {
        DistributionView::NoSelection => {
            empty("Select a single cultivation and strategy to see the weight distribution.")
        }
        DistributionView::NoData => empty("No weight distribution data for this selection."),
        DistributionView::Available(dist) => DistributionSection {
            message: String::new(),
            title: format!("{} / {}", dist.cultivation, dist.strategy),
            caps: format!(
                "target {}, lower cap {}, upper cap {}, {} plants, revenue {}",
                fixed_opt(dist.target_weight, 1),
                fixed_opt(dist.lower_cap, 1),
                fixed_opt(dist.upper_cap, 1),
                dist.total_count(),
                fixed(dist.total_revenue(), 2),
            ),
            bins: dist
                .bins
                .iter()
                .map(|b| BinView {
                    bin: b.bin.clone(),
                    count: b.count,
                    category: b.category.clone().unwrap_or_else(|| "-".into()),
                    color: category_color(b.category.as_deref()).to_string(),
                    revenue: fixed_opt(b.revenue, 2),
                })
                .collect(),
        },
    }
}

pub fn write_report(path: &Path, html: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)?;
    Ok(())
}

pub fn to_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use growlitics::config::Config;
use growlitics::http::HttpClient;
use growlitics::output::report;
use growlitics::selection::DefaultSelection;
use growlitics::session::{DashboardSession, DashboardView};
use growlitics::sources::{self, LoadRequest};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser)]
#[command(
    name = "growlitics",
    about = "Cultivation strategy KPI aggregation and dashboard reports"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Load KPI data, aggregate it and write the HTML dashboard report
    Run {
        #[command(flatten)]
        dashboard: DashboardArgs,

        /// Output path for the HTML report
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Load KPI data and print the dashboard snapshot as JSON
    Snapshot {
        #[command(flatten)]
        dashboard: DashboardArgs,
    },
}

#[derive(clap::Args)]
struct DashboardArgs {
    /// Path to config file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Dashboard URL or query string (strategies, data, data_url/dataUrl, gist)
    #[arg(short, long)]
    query: Option<String>,

    /// Cultivation to select, repeatable. Replaces the default selection
    #[arg(short, long = "select")]
    select: Vec<String>,

    /// Strategy to hide, repeatable
    #[arg(long = "hide")]
    hide: Vec<String>,

    /// Any date in the week to show in the energy panels (YYYY-MM-DD)
    #[arg(short, long)]
    week: Option<NaiveDate>,

    /// Select every cultivation after loading
    #[arg(long)]
    all: bool,

    /// Rounding precision of the averaged KPIs
    #[arg(long)]
    decimals: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "growlitics=info".into()),
        )
        .init();

    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Command::Run { dashboard, output } => run_report(dashboard, output).await,
        Command::Snapshot { dashboard } => snapshot(dashboard).await,
    }
}

async fn run_report(args: DashboardArgs, output: Option<PathBuf>) -> Result<()> {
    let (cfg, view) = build_view(&args).await?;
    let output_path = output.unwrap_or_else(|| PathBuf::from(&cfg.output.path));

    let html = report::render(&view)?;
    report::write_report(&output_path, &html)
        .with_context(|| format!("writing report to {}", output_path.display()))?;

    info!(path = %output_path.display(), "report written");
    println!("Report generated: {}", output_path.display());
    println!("  source: {}", view.source);
    println!(
        "  {} of {} cultivations selected",
        view.selected.len(),
        view.cultivations.len()
    );
    println!("  {} strategies aggregated", view.aggregated.len());
    println!("  {} weeks with energy data", view.weeks.len());

    Ok(())
}

async fn snapshot(args: DashboardArgs) -> Result<()> {
    let (_, view) = build_view(&args).await?;
    println!("{}", report::to_json(&view)?);
    Ok(())
}

async fn build_view(args: &DashboardArgs) -> Result<(Config, DashboardView)> {
    let mut cfg = Config::load_or_default(&args.config)
        .with_context(|| format!("loading config from {}", args.config.display()))?;
    if args.all {
        cfg.dashboard.default_selection = DefaultSelection::All;
    }
    if let Some(decimals) = args.decimals {
        cfg.dashboard.decimals = decimals;
    }
    cfg.validate().context("invalid configuration")?;

    let http = HttpClient::new(
        concat!("growlitics/", env!("CARGO_PKG_VERSION")),
        Duration::from_secs(cfg.sources.fetch_timeout_secs),
    )?;
    let request = args
        .query
        .as_deref()
        .map(LoadRequest::from_query)
        .unwrap_or_default();
    let token = cfg.github_token();

    let mut session =
        DashboardSession::new(cfg.dashboard.default_selection, cfg.dashboard.decimals);
    let ticket = session.begin_load();
    match sources::fetch(&request, &cfg.sources, &http, token.as_deref()).await {
        Some(payload) => {
            session.apply(ticket, payload);
        }
        None => warn!("no source could be loaded, showing default data set"),
    }

    if !args.select.is_empty() {
        session.select_only(&args.select);
    }
    for strategy in &args.hide {
        session.set_strategy_visible(strategy, false);
    }

    let view = session.view(args.week);
    info!(
        selected = view.selected.len(),
        strategies = view.aggregated.len(),
        "dashboard computed"
    );
    Ok((cfg, view))
}

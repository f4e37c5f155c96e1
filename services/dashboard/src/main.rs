//! Dashboard - Terminal rendition of the operational indicators dashboard
//!
//! Responsibilities:
//! - Load totals and the five rankings from the data root (directory or URL)
//! - Print KPI cards, insights, the year comparator and the rankings
//! - List every partial failure in the transparency section
//! - Optionally emit the whole report as JSON
//!
//! Usage:
//!   # Local data folder:
//!   cargo run --bin dashboard -- --data-root ./public/data
//!
//!   # Published site, weapons comparator, JSON output:
//!   cargo run --bin dashboard -- --data-root https://example.org/data \
//!       --indicator "Armas Apreendidas" --json

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use loader::format::{format_number, format_optional, format_percent};
use loader::{
    canonical_indicator, indicator_tooltip, insights, kpi_summary, load_dashboard, ranking_top,
    unit_comparison, Comparison, DashboardData, DataRoot, Insights, Kpi, Metric, RankedEntry,
    RankingCategory, Trend, BASE_YEAR, COMPARE_YEAR, DEFAULT_TOP_LIMIT, INDICATOR_LABELS,
};
use loader::ranking::UnitComparison;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

const LOAD_FAILED: &str = "Falha ao carregar dados. Verifique a pasta /public/data.";

#[derive(Parser, Debug)]
#[command(name = "dashboard", about = "Prints the 2024 x 2025 operational indicators dashboard")]
struct Args {
    /// Data root: base URL or directory holding the CSV files
    #[arg(long)]
    data_root: Option<String>,

    /// Base year of the comparator
    #[arg(long, default_value_t = BASE_YEAR)]
    year_base: i32,

    /// Compared year of the comparator
    #[arg(long, default_value_t = COMPARE_YEAR)]
    year_compare: i32,

    /// Indicator shown in the comparator (any known spelling)
    #[arg(long)]
    indicator: Option<String>,

    /// Number of units per ranking
    #[arg(long, default_value_t = DEFAULT_TOP_LIMIT)]
    limit: usize,

    /// Metric used by the general ranking
    #[arg(long, default_value_t = Metric::Ocorrencias)]
    metric: Metric,

    /// Emit the report as JSON
    #[arg(long, default_value = "false")]
    json: bool,
}

#[derive(Debug, Clone)]
struct Config {
    data_root: String,
    fetch_timeout: Duration,
}

impl Config {
    fn from_env() -> Result<Self> {
        let timeout_secs: u64 = std::env::var("FETCH_TIMEOUT_SECS")
            .unwrap_or_else(|_| "120".to_string())
            .parse()
            .context("FETCH_TIMEOUT_SECS must be a number of seconds")?;

        Ok(Self {
            data_root: std::env::var("DATA_ROOT").unwrap_or_else(|_| "./public/data".to_string()),
            fetch_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

// =============================================================================
// Report
// =============================================================================

#[derive(Debug, Serialize)]
struct KpiCard<'a> {
    #[serde(flatten)]
    kpi: &'a Kpi,
    tooltip: Option<&'static str>,
}

#[derive(Debug, Serialize)]
struct ComparatorView {
    indicator: String,
    base_year: i32,
    compare_year: i32,
    comparison: Comparison,
    trend: Trend,
}

#[derive(Debug, Serialize)]
struct RankingView<'a> {
    category: RankingCategory,
    label: &'static str,
    metric: Metric,
    metric_label: &'static str,
    top_base: Vec<RankedEntry<'a>>,
    top_compare: Vec<RankedEntry<'a>>,
    by_unit: Vec<UnitComparison>,
}

#[derive(Debug, Serialize)]
struct Report<'a> {
    generated_at: DateTime<Utc>,
    data_root: &'a str,
    kpis: Vec<KpiCard<'a>>,
    insights: Option<Insights<'a>>,
    comparator: ComparatorView,
    rankings: Vec<RankingView<'a>>,
    warnings: Vec<String>,
}

/// Comparator for one indicator between the two selected years.
fn build_comparator(data: &DashboardData, args: &Args) -> Result<ComparatorView> {
    for year in [args.year_base, args.year_compare] {
        if year != BASE_YEAR && year != COMPARE_YEAR {
            anyhow::bail!(
                "Year {} is not loaded. Expected {} or {}",
                year,
                BASE_YEAR,
                COMPARE_YEAR
            );
        }
    }

    let indicator = match &args.indicator {
        Some(raw) => canonical_indicator(raw),
        None => INDICATOR_LABELS[0].to_string(),
    };

    let comparison = data
        .totals
        .compare(&indicator, args.year_base, args.year_compare)
        .with_context(|| format!("Unknown indicator '{}'", indicator))?;

    Ok(ComparatorView {
        indicator,
        base_year: args.year_base,
        compare_year: args.year_compare,
        comparison,
        trend: comparison.trend(),
    })
}

fn build_rankings<'a>(data: &'a DashboardData, args: &Args) -> Vec<RankingView<'a>> {
    RankingCategory::ALL
        .into_iter()
        .map(|category| {
            let metric = match category {
                RankingCategory::General => args.metric,
                other => other.primary_metric(),
            };
            let rows = data.rankings.get(category);

            RankingView {
                category,
                label: category.label(),
                metric,
                metric_label: metric.label(),
                top_base: ranking_top(rows, metric, BASE_YEAR, args.limit),
                top_compare: ranking_top(rows, metric, COMPARE_YEAR, args.limit),
                by_unit: unit_comparison(rows, metric, args.limit),
            }
        })
        .collect()
}

/// Transparency lines: totals warnings, then rankings that came back empty.
fn collect_warnings(data: &DashboardData) -> Vec<String> {
    let mut warnings = data.warnings.messages();
    for category in data.rankings.empty_categories() {
        warnings.push(format!(
            "{} ausente ou vazio; ranking {} sem dados.",
            category.file_name(),
            category.label()
        ));
    }
    warnings
}

fn build_report<'a>(
    data: &'a DashboardData,
    kpis: &'a [Kpi],
    args: &Args,
    data_root: &'a str,
) -> Result<Report<'a>> {
    let cards = kpis
        .iter()
        .map(|kpi| KpiCard {
            kpi,
            tooltip: indicator_tooltip(&kpi.indicator),
        })
        .collect();

    Ok(Report {
        generated_at: Utc::now(),
        data_root,
        kpis: cards,
        insights: insights(kpis),
        comparator: build_comparator(data, args)?,
        rankings: build_rankings(data, args),
        warnings: collect_warnings(data),
    })
}

// =============================================================================
// Text output
// =============================================================================

fn print_kpis(report: &Report) {
    println!("\nIndicadores {} x {}:", BASE_YEAR, COMPARE_YEAR);
    println!("{:-<78}", "");
    for card in &report.kpis {
        let c = &card.kpi.comparison;
        println!(
            "  {} {:<22} {:>9} -> {:>9}  Δ {:>7} ({})  [{}]",
            card.kpi.trend.arrow(),
            card.kpi.indicator,
            format_number(c.base_value),
            format_number(c.compare_value),
            format_number(c.diff),
            format_percent(c.percent),
            card.kpi.trend.badge()
        );
        if let Some(tooltip) = card.tooltip {
            println!("      {}", tooltip);
        }
    }
    println!("{:-<78}", "");
}

fn print_insights(report: &Report) {
    let Some(insights) = &report.insights else {
        return;
    };

    println!("\nDestaques:");
    for (i, kpi) in insights.top_growth.iter().enumerate() {
        println!(
            "  [{}] {}: {}",
            i + 1,
            kpi.indicator,
            format_percent(kpi.comparison.percent)
        );
    }
    println!(
        "  Menor variação: {} ({})",
        insights.least_changed.indicator,
        format_percent(insights.least_changed.comparison.percent)
    );
}

fn print_comparator(report: &Report) {
    let view = &report.comparator;
    println!("\nComparador: {}", view.indicator);
    println!(
        "  {}: {}  |  {}: {}",
        view.base_year,
        format_number(view.comparison.base_value),
        view.compare_year,
        format_number(view.comparison.compare_value)
    );
    println!(
        "  Δ {} ({}) {} {}",
        format_number(view.comparison.diff),
        format_percent(view.comparison.percent),
        view.trend.arrow(),
        view.trend.badge()
    );
}

fn print_rankings(report: &Report) {
    println!("\nRankings:");
    for view in &report.rankings {
        println!("\n[{}] por {}", view.label, view.metric_label);
        for (year, entries) in [(BASE_YEAR, &view.top_base), (COMPARE_YEAR, &view.top_compare)] {
            if entries.is_empty() {
                println!("  {}: sem dados", year);
                continue;
            }
            println!("  {}:", year);
            for entry in entries.iter() {
                println!(
                    "    {}º {} - {}",
                    entry.position,
                    entry.record.unit,
                    format_number(entry.value)
                );
            }
        }
        if !view.by_unit.is_empty() {
            println!("  Por unidade ({} / {}):", BASE_YEAR, COMPARE_YEAR);
            for unit in &view.by_unit {
                println!(
                    "    {}: {} / {}",
                    unit.unit,
                    format_optional(unit.value_2024),
                    format_optional(unit.value_2025)
                );
            }
        }
    }
}

fn print_warnings(report: &Report) {
    println!("\nTransparência dos dados:");
    if report.warnings.is_empty() {
        println!("  Nenhuma inconsistência encontrada.");
        return;
    }
    for warning in &report.warnings {
        println!("  ⚠ {}", warning);
    }
}

fn print_report(report: &Report) {
    println!("=== Painel Operacional {} x {} ===", BASE_YEAR, COMPARE_YEAR);
    println!("Fonte: {}", report.data_root);
    println!("Gerado em: {}", report.generated_at.format("%Y-%m-%d %H:%M UTC"));

    print_kpis(report);
    print_insights(report);
    print_comparator(report);
    print_rankings(report);
    print_warnings(report);
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();

    let args = Args::parse();
    let config = Config::from_env()?;
    let location = args.data_root.clone().unwrap_or(config.data_root);

    let root = DataRoot::from_location(&location, config.fetch_timeout).context(LOAD_FAILED)?;
    tracing::info!(root = %root.describe(), "loading dashboard data");

    let data = load_dashboard(&root).await;
    let kpis = kpi_summary(&data.totals);
    let report = build_report(&data, &kpis, &args, &location)?;

    if args.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        println!("{}", json);
    } else {
        print_report(&report);
    }

    Ok(())
}

//! Loader - data core of the operational indicators dashboard
//!
//! Responsibilities:
//! - Fetch the pre-aggregated CSV files from the data root (HTTP or directory)
//! - Parse rows tolerantly and normalize indicator names and pt-BR numbers
//! - Aggregate per-indicator totals for 2024 and 2025, with an embedded
//!   fallback when `totals.csv` is unusable
//! - Load the five ranking categories independently and answer top-N queries
//! - Derive year-over-year deltas and trends
//!
//! Expected failures (missing file, missing column, bad cell) never escape the
//! load functions: they become warnings, empty ranking sets or fallback data.

pub mod derived;
pub mod error;
pub mod fetch;
pub mod format;
pub mod normalize;
pub mod ranking;
pub mod rows;
pub mod totals;

use serde::Serialize;

pub use derived::{delta, insights, kpi_summary, Comparison, Insights, Kpi, Trend};
pub use error::LoadError;
pub use fetch::{CsvFetcher, DataRoot, DirFetcher, HttpFetcher};
pub use normalize::{
    canonical_indicator, indicator_tooltip, parse_number, INDICATOR_LABELS,
};
pub use ranking::{
    load_all_rankings, load_category, metric_label, ranking_top, unit_comparison, Metric,
    RankedEntry, RankingCategory, RankingRecord, Rankings, DEFAULT_TOP_LIMIT,
};
pub use totals::{
    build_totals_map, load_totals, DataWarnings, TotalRecord, TotalsLoad, TotalsMap,
    BASE_YEAR, COMPARE_YEAR,
};

/// Everything the dashboard needs, loaded once per session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardData {
    pub totals_rows: Vec<TotalRecord>,
    pub totals: TotalsMap,
    pub rankings: Rankings,
    pub warnings: DataWarnings,
}

/// Load totals and all rankings concurrently.
pub async fn load_dashboard<F: CsvFetcher>(fetcher: &F) -> DashboardData {
    let (totals_load, rankings) = tokio::join!(load_totals(fetcher), load_all_rankings(fetcher));

    let totals = build_totals_map(&totals_load.rows);
    tracing::info!(
        indicators = totals.len(),
        used_fallback = totals_load.warnings.used_fallback,
        empty_rankings = rankings.empty_categories().len(),
        "dashboard data loaded"
    );

    DashboardData {
        totals_rows: totals_load.rows,
        totals,
        rankings,
        warnings: totals_load.warnings,
    }
}

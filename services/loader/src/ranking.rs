//! Ranking aggregator - per-unit leaderboards for five categories
//!
//! Each category is read from its own file and kept apart. A category whose
//! file cannot be loaded is simply empty; the others are unaffected.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::LoadError;
use crate::fetch::CsvFetcher;
use crate::normalize::{parse_number, parse_year};
use crate::rows::{self, CsvRecord};
use crate::totals::{BASE_YEAR, COMPARE_YEAR};

pub const DEFAULT_TOP_LIMIT: usize = 3;

pub const YEAR_COLUMN: &str = "Ano";
pub const UNIT_COLUMN: &str = "Unidade";

/// Numeric columns a ranking file may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Metric {
    Ocorrencias,
    Armas,
    Trafico,
    Mandados,
    Veiculos,
    Percentual,
}

impl Metric {
    pub const ALL: [Metric; 6] = [
        Metric::Ocorrencias,
        Metric::Armas,
        Metric::Trafico,
        Metric::Mandados,
        Metric::Veiculos,
        Metric::Percentual,
    ];

    /// Header name in the CSV files.
    pub fn column(self) -> &'static str {
        match self {
            Metric::Ocorrencias => "Ocorrencias",
            Metric::Armas => "Armas",
            Metric::Trafico => "Trafico",
            Metric::Mandados => "Mandados",
            Metric::Veiculos => "Veiculos",
            Metric::Percentual => "Percentual",
        }
    }

    /// Display label, with accents.
    pub fn label(self) -> &'static str {
        match self {
            Metric::Ocorrencias => "Ocorrências",
            Metric::Armas => "Armas",
            Metric::Trafico => "Tráfico",
            Metric::Mandados => "Mandados",
            Metric::Veiculos => "Veículos",
            Metric::Percentual => "Percentual",
        }
    }

    pub fn from_column(raw: &str) -> Option<Self> {
        let key = raw.trim();
        Metric::ALL
            .into_iter()
            .find(|metric| metric.column().eq_ignore_ascii_case(key))
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Metric::from_column(s).ok_or_else(|| {
            let known: Vec<&str> = Metric::ALL.iter().map(|m| m.column()).collect();
            format!("unknown metric '{}', expected one of: {}", s, known.join(", "))
        })
    }
}

/// Display label for a metric column name; unknown names are returned as-is.
pub fn metric_label(metric: &str) -> &str {
    Metric::from_column(metric).map(Metric::label).unwrap_or(metric)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingCategory {
    General,
    Weapons,
    Warrants,
    Trafficking,
    Vehicles,
}

impl RankingCategory {
    pub const ALL: [RankingCategory; 5] = [
        RankingCategory::General,
        RankingCategory::Weapons,
        RankingCategory::Warrants,
        RankingCategory::Trafficking,
        RankingCategory::Vehicles,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            RankingCategory::General => "ranking_geral.csv",
            RankingCategory::Weapons => "ranking_arms.csv",
            RankingCategory::Warrants => "ranking_mandados.csv",
            RankingCategory::Trafficking => "ranking_trafico.csv",
            RankingCategory::Vehicles => "ranking_veiculos.csv",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RankingCategory::General => "Geral",
            RankingCategory::Weapons => "Armas",
            RankingCategory::Warrants => "Mandados",
            RankingCategory::Trafficking => "Tráfico",
            RankingCategory::Vehicles => "Veículos",
        }
    }

    /// Metric the category is ranked by. The general ranking lets the
    /// caller pick; occurrences is its default.
    pub fn primary_metric(self) -> Metric {
        match self {
            RankingCategory::General => Metric::Ocorrencias,
            RankingCategory::Weapons => Metric::Armas,
            RankingCategory::Warrants => Metric::Mandados,
            RankingCategory::Trafficking => Metric::Trafico,
            RankingCategory::Vehicles => Metric::Veiculos,
        }
    }

    /// Columns a well-formed file for this category must carry.
    pub fn required_columns(self) -> &'static [&'static str] {
        match self {
            RankingCategory::General => {
                &["Ano", "Unidade", "Ocorrencias", "Armas", "Trafico", "Mandados"]
            }
            RankingCategory::Weapons => &["Ano", "Unidade", "Armas", "Ocorrencias", "Percentual"],
            RankingCategory::Warrants => {
                &["Ano", "Unidade", "Mandados", "Ocorrencias", "Percentual"]
            }
            RankingCategory::Trafficking => {
                &["Ano", "Unidade", "Trafico", "Ocorrencias", "Percentual"]
            }
            RankingCategory::Vehicles => {
                &["Ano", "Unidade", "Veiculos", "Ocorrencias", "Percentual"]
            }
        }
    }
}

/// One unit's figures for one year. A metric missing from `metrics` was
/// absent or unparseable in the file; a recorded zero is stored as `0.0`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingRecord {
    pub year: i32,
    pub unit: String,
    pub metrics: BTreeMap<Metric, f64>,
}

impl RankingRecord {
    pub fn metric(&self, metric: Metric) -> Option<f64> {
        self.metrics.get(&metric).copied()
    }
}

/// Row sets of all five categories.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Rankings {
    pub general: Vec<RankingRecord>,
    pub weapons: Vec<RankingRecord>,
    pub warrants: Vec<RankingRecord>,
    pub trafficking: Vec<RankingRecord>,
    pub vehicles: Vec<RankingRecord>,
}

impl Rankings {
    pub fn get(&self, category: RankingCategory) -> &[RankingRecord] {
        match category {
            RankingCategory::General => &self.general,
            RankingCategory::Weapons => &self.weapons,
            RankingCategory::Warrants => &self.warrants,
            RankingCategory::Trafficking => &self.trafficking,
            RankingCategory::Vehicles => &self.vehicles,
        }
    }

    /// Categories that loaded no rows.
    pub fn empty_categories(&self) -> Vec<RankingCategory> {
        RankingCategory::ALL
            .into_iter()
            .filter(|category| self.get(*category).is_empty())
            .collect()
    }
}

// =============================================================================
// Loading
// =============================================================================

/// Load one category. Any failure leaves that category empty.
pub async fn load_category<F: CsvFetcher>(fetcher: &F, category: RankingCategory) -> Vec<RankingRecord> {
    match read_category(fetcher, category).await {
        Ok(rows) => {
            debug!(?category, rows = rows.len(), "ranking loaded");
            rows
        }
        Err(err) => {
            warn!(?category, error = %err, "ranking unavailable, category left empty");
            Vec::new()
        }
    }
}

/// Load the five categories concurrently.
pub async fn load_all_rankings<F: CsvFetcher>(fetcher: &F) -> Rankings {
    let (general, weapons, warrants, trafficking, vehicles) = tokio::join!(
        load_category(fetcher, RankingCategory::General),
        load_category(fetcher, RankingCategory::Weapons),
        load_category(fetcher, RankingCategory::Warrants),
        load_category(fetcher, RankingCategory::Trafficking),
        load_category(fetcher, RankingCategory::Vehicles),
    );

    Rankings {
        general,
        weapons,
        warrants,
        trafficking,
        vehicles,
    }
}

async fn read_category<F: CsvFetcher>(
    fetcher: &F,
    category: RankingCategory,
) -> Result<Vec<RankingRecord>, LoadError> {
    let path = category.file_name();
    let raw = fetcher.fetch(path).await?;
    let parsed = rows::parse(&raw).map_err(|source| LoadError::Csv {
        path: path.to_string(),
        source,
    })?;

    Ok(parsed
        .records
        .iter()
        .filter_map(|record| {
            let ranking = ranking_from_record(record);
            if ranking.is_none() {
                debug!(path, line = record.line(), "skipping ranking row without a valid year");
            }
            ranking
        })
        .collect())
}

fn ranking_from_record(record: &CsvRecord) -> Option<RankingRecord> {
    let year = record.get(YEAR_COLUMN).and_then(parse_year)?;
    let unit = record.get(UNIT_COLUMN).unwrap_or("").to_string();

    let metrics = Metric::ALL
        .into_iter()
        .filter_map(|metric| {
            record
                .get(metric.column())
                .and_then(parse_number)
                .map(|value| (metric, value))
        })
        .collect();

    Some(RankingRecord {
        year,
        unit,
        metrics,
    })
}

// =============================================================================
// Queries
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedEntry<'a> {
    /// 1-based rank.
    pub position: usize,
    pub value: f64,
    pub record: &'a RankingRecord,
}

/// Top `limit` rows of `year` by `metric`, highest first.
///
/// Rows without a value for the metric are left out. Equal values keep
/// their source order.
pub fn ranking_top(
    rows: &[RankingRecord],
    metric: Metric,
    year: i32,
    limit: usize,
) -> Vec<RankedEntry<'_>> {
    let mut candidates: Vec<(f64, &RankingRecord)> = rows
        .iter()
        .filter(|row| row.year == year)
        .filter_map(|row| row.metric(metric).map(|value| (value, row)))
        .collect();

    // Stable sort: ties (including -0 and 0) stay in source order
    candidates.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));

    candidates
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(idx, (value, record))| RankedEntry {
            position: idx + 1,
            value,
            record,
        })
        .collect()
}

/// One unit's value in each compared year's top list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitComparison {
    pub unit: String,
    #[serde(rename = "2024")]
    pub value_2024: Option<f64>,
    #[serde(rename = "2025")]
    pub value_2025: Option<f64>,
}

/// Merge the 2024 and 2025 top lists by unit, in order of first appearance.
/// A unit that made only one year's list has `None` for the other.
pub fn unit_comparison(rows: &[RankingRecord], metric: Metric, limit: usize) -> Vec<UnitComparison> {
    let mut merged: Vec<UnitComparison> = Vec::new();

    let entries = ranking_top(rows, metric, BASE_YEAR, limit)
        .into_iter()
        .chain(ranking_top(rows, metric, COMPARE_YEAR, limit));

    for entry in entries {
        let idx = match merged.iter().position(|u| u.unit == entry.record.unit) {
            Some(idx) => idx,
            None => {
                merged.push(UnitComparison {
                    unit: entry.record.unit.clone(),
                    value_2024: None,
                    value_2025: None,
                });
                merged.len() - 1
            }
        };

        match entry.record.year {
            BASE_YEAR => merged[idx].value_2024 = Some(entry.value),
            COMPARE_YEAR => merged[idx].value_2025 = Some(entry.value),
            _ => {}
        }
    }

    merged
}

//! Totals aggregator - per-indicator, per-year totals from `totals.csv`
//!
//! Loading never fails: an unavailable or malformed source is replaced by the
//! embedded baseline and the reason is recorded in `DataWarnings`.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, warn};

use crate::derived::{delta, Comparison};
use crate::error::LoadError;
use crate::fetch::CsvFetcher;
use crate::normalize::{canonical_indicator, parse_number, parse_year, INDICATOR_LABELS};
use crate::rows::{self, CsvRecord};

pub const TOTALS_FILE: &str = "totals.csv";

pub const BASE_YEAR: i32 = 2024;
pub const COMPARE_YEAR: i32 = 2025;

/// Accepted header names per field, most preferred first.
pub const INDICATOR_COLUMNS: &[&str] = &["Indicador"];
pub const YEAR_COLUMNS: &[&str] = &["Ano"];
pub const VALUE_COLUMNS: &[&str] = &["Valor", "Quantidade"];

/// Embedded baseline: (indicator, 2024, 2025).
pub const FALLBACK_TOTALS: [(&str, f64, f64); 6] = [
    ("Total de Ocorrências", 8025.0, 9122.0),
    ("Armas Apreendidas", 2454.0, 2914.0),
    ("Mandados Cumpridos", 851.0, 1042.0),
    ("Drogas Apreendidas", 1480.0, 1859.0),
    ("Veículos Apreendidos", 2645.0, 2699.0),
    ("Prisões Realizadas", 6824.0, 7578.0),
];

const FETCH_FAILED_NOTE: &str = "Falha ao carregar totals.csv, usando fallback.";
const FALLBACK_MESSAGE: &str =
    "Totals.csv não disponível; valores exibidos com base no baseline interno.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TotalRecord {
    pub indicator: String,
    pub year: i32,
    pub value: f64,
}

impl TotalRecord {
    pub fn new(indicator: impl Into<String>, year: i32, value: f64) -> Self {
        Self {
            indicator: indicator.into(),
            year,
            value,
        }
    }
}

/// Partial-failure detail collected while loading totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DataWarnings {
    pub used_fallback: bool,
    pub missing_columns: Vec<String>,
    pub notes: Vec<String>,
}

impl DataWarnings {
    pub fn is_empty(&self) -> bool {
        !self.used_fallback && self.missing_columns.is_empty() && self.notes.is_empty()
    }

    /// Lines for the transparency section of the dashboard.
    pub fn messages(&self) -> Vec<String> {
        let mut messages = Vec::new();
        if self.used_fallback {
            messages.push(FALLBACK_MESSAGE.to_string());
        }
        for column in &self.missing_columns {
            messages.push(format!("Coluna ausente em {}", column));
        }
        messages.extend(self.notes.iter().cloned());
        messages
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TotalsLoad {
    pub rows: Vec<TotalRecord>,
    pub warnings: DataWarnings,
}

// =============================================================================
// Schema detection
// =============================================================================

/// Header names resolved for each totals field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TotalsSchema {
    pub indicator: String,
    pub year: String,
    pub value: String,
}

impl TotalsSchema {
    /// Resolve every field against the header row. On failure, returns one
    /// entry per missing field (`Valor/Quantidade` when no alias matched).
    pub fn resolve(headers: &[String]) -> Result<Self, Vec<String>> {
        let indicator = find_column(headers, INDICATOR_COLUMNS);
        let year = find_column(headers, YEAR_COLUMNS);
        let value = find_column(headers, VALUE_COLUMNS);

        match (indicator, year, value) {
            (Some(indicator), Some(year), Some(value)) => Ok(Self {
                indicator,
                year,
                value,
            }),
            (indicator, year, value) => {
                let mut missing = Vec::new();
                if indicator.is_none() {
                    missing.push(INDICATOR_COLUMNS.join("/"));
                }
                if year.is_none() {
                    missing.push(YEAR_COLUMNS.join("/"));
                }
                if value.is_none() {
                    missing.push(VALUE_COLUMNS.join("/"));
                }
                Err(missing)
            }
        }
    }
}

/// First candidate (in preference order) present in the headers, compared
/// case-insensitively. Returns the header as it appears in the file.
pub fn find_column(headers: &[String], candidates: &[&str]) -> Option<String> {
    candidates.iter().find_map(|candidate| {
        headers
            .iter()
            .find(|header| header.trim().to_lowercase() == candidate.to_lowercase())
            .cloned()
    })
}

// =============================================================================
// Loading
// =============================================================================

/// Load totals rows, substituting the embedded baseline when the source
/// yields nothing usable.
pub async fn load_totals<F: CsvFetcher>(fetcher: &F) -> TotalsLoad {
    let mut warnings = DataWarnings::default();

    let mut rows = match read_totals(fetcher, &mut warnings.notes).await {
        Ok(rows) => rows,
        Err(LoadError::MalformedSchema { path, missing }) => {
            warn!(%path, ?missing, "totals source is missing columns");
            warnings
                .missing_columns
                .extend(missing.into_iter().map(|m| format!("{}: {}", path, m)));
            Vec::new()
        }
        Err(err) => {
            warn!(error = %err, "totals source unavailable");
            warnings.notes.push(FETCH_FAILED_NOTE.to_string());
            Vec::new()
        }
    };

    if rows.is_empty() {
        warn!("using embedded baseline totals");
        warnings.used_fallback = true;
        rows = fallback_rows();
    }

    TotalsLoad { rows, warnings }
}

async fn read_totals<F: CsvFetcher>(
    fetcher: &F,
    notes: &mut Vec<String>,
) -> Result<Vec<TotalRecord>, LoadError> {
    let raw = fetcher.fetch(TOTALS_FILE).await?;
    let parsed = rows::parse(&raw).map_err(|source| LoadError::Csv {
        path: TOTALS_FILE.to_string(),
        source,
    })?;

    if parsed.records.is_empty() {
        notes.push(format!("{} não contém linhas de dados.", TOTALS_FILE));
        return Ok(Vec::new());
    }

    let schema =
        TotalsSchema::resolve(&parsed.headers).map_err(|missing| LoadError::MalformedSchema {
            path: TOTALS_FILE.to_string(),
            missing,
        })?;
    debug!(?schema, rows = parsed.records.len(), "totals schema resolved");

    let mut records = Vec::with_capacity(parsed.records.len());
    for record in &parsed.records {
        match total_from_record(record, &schema) {
            Ok(total) => records.push(total),
            Err(err) => {
                warn!(error = %err, "skipping totals row");
                notes.push(format!(
                    "{} linha {}: valor inválido, linha ignorada.",
                    TOTALS_FILE,
                    record.line()
                ));
            }
        }
    }

    Ok(records)
}

fn total_from_record(record: &CsvRecord, schema: &TotalsSchema) -> Result<TotalRecord, LoadError> {
    let unparseable = |column: &str| LoadError::UnparseableValue {
        path: TOTALS_FILE.to_string(),
        line: record.line(),
        column: column.to_string(),
        raw: record.get(column).unwrap_or("").to_string(),
    };

    let indicator = canonical_indicator(record.get(&schema.indicator).unwrap_or(""));
    if indicator.is_empty() {
        return Err(unparseable(&schema.indicator));
    }

    let year = record
        .get(&schema.year)
        .and_then(parse_year)
        .ok_or_else(|| unparseable(&schema.year))?;

    let value = record
        .get(&schema.value)
        .and_then(parse_number)
        .ok_or_else(|| unparseable(&schema.value))?;

    Ok(TotalRecord {
        indicator,
        year,
        value,
    })
}

/// Baseline rows: every canonical indicator for both years.
pub fn fallback_rows() -> Vec<TotalRecord> {
    FALLBACK_TOTALS
        .iter()
        .flat_map(|(indicator, base, compare)| {
            [
                TotalRecord::new(*indicator, BASE_YEAR, *base),
                TotalRecord::new(*indicator, COMPARE_YEAR, *compare),
            ]
        })
        .collect()
}

// =============================================================================
// Aggregation
// =============================================================================

/// Values of one indicator for the two compared years.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct YearPair {
    #[serde(rename = "2024")]
    pub year_2024: f64,
    #[serde(rename = "2025")]
    pub year_2025: f64,
}

impl YearPair {
    pub fn get(&self, year: i32) -> Option<f64> {
        match year {
            BASE_YEAR => Some(self.year_2024),
            COMPARE_YEAR => Some(self.year_2025),
            _ => None,
        }
    }

    fn slot_mut(&mut self, year: i32) -> Option<&mut f64> {
        match year {
            BASE_YEAR => Some(&mut self.year_2024),
            COMPARE_YEAR => Some(&mut self.year_2025),
            _ => None,
        }
    }
}

/// Indicator name to its yearly totals. Every canonical indicator is present.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TotalsMap(BTreeMap<String, YearPair>);

impl TotalsMap {
    pub fn get(&self, indicator: &str) -> Option<&YearPair> {
        self.0.get(indicator)
    }

    pub fn value(&self, indicator: &str, year: i32) -> Option<f64> {
        self.get(indicator).and_then(|pair| pair.get(year))
    }

    /// Compare an indicator between two of the loaded years, either direction.
    pub fn compare(&self, indicator: &str, base_year: i32, compare_year: i32) -> Option<Comparison> {
        let base = self.value(indicator, base_year)?;
        let compare = self.value(indicator, compare_year)?;
        Some(delta(base, compare))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &YearPair)> {
        self.0.iter().map(|(name, pair)| (name.as_str(), pair))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Fold totals rows into a map. Later rows overwrite earlier ones for the
/// same (indicator, year); years other than 2024/2025 are ignored.
pub fn build_totals_map(rows: &[TotalRecord]) -> TotalsMap {
    let mut map: BTreeMap<String, YearPair> = INDICATOR_LABELS
        .iter()
        .map(|label| (label.to_string(), YearPair::default()))
        .collect();

    for row in rows {
        let pair = map.entry(row.indicator.clone()).or_default();
        if let Some(slot) = pair.slot_mut(row.year) {
            *slot = row.value;
        }
    }

    TotalsMap(map)
}

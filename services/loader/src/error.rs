use thiserror::Error;

/// Failures the ingestion layer can run into while reading a dataset.
///
/// None of these escape `load_totals`, `load_category` or `load_dashboard`:
/// they are turned into warnings, empty ranking sets or fallback data there.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("data source '{path}' is unavailable: {reason}")]
    SourceUnavailable { path: String, reason: String },
    #[error("data source '{path}' is missing columns: {}", .missing.join(", "))]
    MalformedSchema { path: String, missing: Vec<String> },
    #[error("{path} line {line}: cannot read '{raw}' in column {column}")]
    UnparseableValue {
        path: String,
        line: usize,
        column: String,
        raw: String,
    },
    #[error("failed to read CSV from '{path}': {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

impl LoadError {
    pub(crate) fn unavailable(path: &str, reason: impl ToString) -> Self {
        LoadError::SourceUnavailable {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }
}

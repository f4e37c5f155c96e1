//! Validator Service - Checks the dashboard CSV files before publishing
//!
//! Responsibilities:
//! - Verify every expected file exists in the data directory
//! - Verify each file is UTF-8 and carries its required columns
//! - For totals.csv, verify at least one value column alias is present
//! - Exit non-zero listing every issue, zero when the data is consistent
//!
//! Usage:
//!   cargo run --bin validator -- --data-dir ./public/data

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use loader::ranking::RankingCategory;
use loader::rows;
use loader::totals::{find_column, INDICATOR_COLUMNS, TOTALS_FILE, VALUE_COLUMNS, YEAR_COLUMNS};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "validator", about = "Validates the dashboard CSV files")]
struct Args {
    /// Directory holding the CSV files (defaults to DATA_DIR or ./public/data)
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

/// How a header is matched against the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HeaderMatch {
    /// Case-insensitive, as the totals loader resolves its schema
    Alias,
    /// Exact name, as the ranking loader reads its columns
    Exact,
}

/// One file the dashboard expects, with its required columns.
/// `one_of` lists alternatives of which at least one must be present.
#[derive(Debug)]
struct ExpectedFile {
    name: &'static str,
    columns: Vec<&'static str>,
    one_of: &'static [&'static str],
    matching: HeaderMatch,
}

fn expected_files() -> Vec<ExpectedFile> {
    let mut files = vec![ExpectedFile {
        name: TOTALS_FILE,
        columns: INDICATOR_COLUMNS.iter().chain(YEAR_COLUMNS).copied().collect(),
        one_of: VALUE_COLUMNS,
        matching: HeaderMatch::Alias,
    }];

    files.extend(RankingCategory::ALL.into_iter().map(|category| ExpectedFile {
        name: category.file_name(),
        columns: category.required_columns().to_vec(),
        one_of: &[],
        matching: HeaderMatch::Exact,
    }));

    files
}

fn has_column(headers: &[String], column: &str, matching: HeaderMatch) -> bool {
    match matching {
        HeaderMatch::Alias => find_column(headers, &[column]).is_some(),
        HeaderMatch::Exact => headers.iter().any(|h| h == column),
    }
}

/// Check one file and return its issues.
fn check_file(dir: &Path, file: &ExpectedFile) -> Vec<String> {
    let path = dir.join(file.name);
    let bytes = match fs::read(&path) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "file not readable");
            return vec![format!("Arquivo ausente: {}", file.name)];
        }
    };

    let (content, _, had_errors) = encoding_rs::UTF_8.decode(&bytes);
    let mut issues = Vec::new();
    if had_errors {
        issues.push(format!("Arquivo não está em UTF-8: {}", file.name));
    }

    let parsed = match rows::parse(&content) {
        Ok(parsed) => parsed,
        Err(e) => {
            issues.push(format!("CSV inválido em {}: {}", file.name, e));
            return issues;
        }
    };

    for column in &file.columns {
        if !has_column(&parsed.headers, column, file.matching) {
            issues.push(format!("Coluna ausente em {}: {}", file.name, column));
        }
    }

    if !file.one_of.is_empty()
        && !file
            .one_of
            .iter()
            .any(|column| has_column(&parsed.headers, column, file.matching))
    {
        issues.push(format!(
            "Coluna de valor ausente em {}: {}",
            file.name,
            file.one_of.join("/")
        ));
    }

    if parsed.records.is_empty() {
        issues.push(format!("Arquivo sem linhas de dados: {}", file.name));
    }

    issues
}

fn validate_dir(dir: &Path) -> Vec<String> {
    expected_files()
        .iter()
        .flat_map(|file| check_file(dir, file))
        .collect()
}

fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();

    let args = Args::parse();
    let data_dir = args.data_dir.unwrap_or_else(|| {
        PathBuf::from(std::env::var("DATA_DIR").unwrap_or_else(|_| "./public/data".to_string()))
    });

    println!("=== Painel Operacional Validator ===");
    println!("Data dir: {}", data_dir.display());

    let issues = validate_dir(&data_dir);

    if issues.is_empty() {
        println!("Dados validados com sucesso. Nenhuma inconsistência encontrada.");
        return Ok(ExitCode::SUCCESS);
    }

    println!("Foram encontradas inconsistências nos CSVs:");
    for issue in &issues {
        println!("- {}", issue);
    }
    Ok(ExitCode::FAILURE)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const VALID_FILES: [(&str, &str); 6] = [
        ("totals.csv", "Indicador,Ano,Valor\nArmas Apreendidas,2024,\"2.454\"\n"),
        (
            "ranking_geral.csv",
            "Ano,Unidade,Ocorrencias,Armas,Trafico,Mandados\n2025,1º BPM,900,80,40,12\n",
        ),
        (
            "ranking_arms.csv",
            "Ano,Unidade,Armas,Ocorrencias,Percentual\n2025,1º BPM,80,900,\"8,9%\"\n",
        ),
        (
            "ranking_mandados.csv",
            "Ano,Unidade,Mandados,Ocorrencias,Percentual\n2025,1º BPM,12,900,\"1,3%\"\n",
        ),
        (
            "ranking_trafico.csv",
            "Ano,Unidade,Trafico,Ocorrencias,Percentual\n2025,1º BPM,40,900,\"4,4%\"\n",
        ),
        (
            "ranking_veiculos.csv",
            "Ano,Unidade,Veiculos,Ocorrencias,Percentual\n2025,1º BPM,7,900,\"0,8%\"\n",
        ),
    ];

    fn write_valid(dir: &Path) {
        for (name, content) in VALID_FILES {
            fs::write(dir.join(name), content).unwrap();
        }
    }

    #[test]
    fn test_expected_files_cover_all_sources() {
        let names: Vec<&str> = expected_files().iter().map(|f| f.name).collect();
        assert_eq!(
            names,
            vec![
                "totals.csv",
                "ranking_geral.csv",
                "ranking_arms.csv",
                "ranking_mandados.csv",
                "ranking_trafico.csv",
                "ranking_veiculos.csv",
            ]
        );
    }

    #[test]
    fn test_valid_dir_has_no_issues() {
        let dir = tempdir().unwrap();
        write_valid(dir.path());
        assert!(validate_dir(dir.path()).is_empty());
    }

    #[test]
    fn test_missing_file_reported() {
        let dir = tempdir().unwrap();
        write_valid(dir.path());
        fs::remove_file(dir.path().join("ranking_arms.csv")).unwrap();

        assert_eq!(validate_dir(dir.path()), vec!["Arquivo ausente: ranking_arms.csv"]);
    }

    #[test]
    fn test_missing_columns_reported() {
        let dir = tempdir().unwrap();
        write_valid(dir.path());
        fs::write(
            dir.path().join("ranking_trafico.csv"),
            "Ano,Unidade,Ocorrencias\n2025,1º BPM,900\n",
        )
        .unwrap();

        assert_eq!(
            validate_dir(dir.path()),
            vec![
                "Coluna ausente em ranking_trafico.csv: Trafico",
                "Coluna ausente em ranking_trafico.csv: Percentual",
            ]
        );
    }

    #[test]
    fn test_totals_value_alias() {
        let dir = tempdir().unwrap();
        write_valid(dir.path());

        fs::write(dir.path().join("totals.csv"), "Indicador,Ano,Quantidade\nX,2024,1\n").unwrap();
        assert!(validate_dir(dir.path()).is_empty());

        fs::write(dir.path().join("totals.csv"), "Indicador,Ano,Total\nX,2024,1\n").unwrap();
        assert_eq!(
            validate_dir(dir.path()),
            vec!["Coluna de valor ausente em totals.csv: Valor/Quantidade"]
        );
    }

    #[test]
    fn test_header_only_and_non_utf8() {
        let dir = tempdir().unwrap();
        write_valid(dir.path());
        fs::write(dir.path().join("totals.csv"), "Indicador,Ano,Valor\n").unwrap();

        let mut latin1 = b"Ano,Unidade,Veiculos,Ocorrencias,Percentual\n2025,".to_vec();
        latin1.extend_from_slice(&[0x31, 0xBA]); // "1º" in Latin-1
        latin1.extend_from_slice(b" BPM,7,900,1\n");
        fs::write(dir.path().join("ranking_veiculos.csv"), latin1).unwrap();

        assert_eq!(
            validate_dir(dir.path()),
            vec![
                "Arquivo sem linhas de dados: totals.csv",
                "Arquivo não está em UTF-8: ranking_veiculos.csv",
            ]
        );
    }
}

//! Row parser - CSV text into header-keyed records
//!
//! The first line names the fields. Short rows simply lack the trailing keys,
//! empty lines are skipped, and every value stays a string: numeric
//! interpretation belongs to `normalize`.

use std::collections::HashMap;

/// One data line of a CSV file, keyed by header name.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvRecord {
    line: usize,
    fields: HashMap<String, String>,
}

impl CsvRecord {
    /// Cell under `header`, if the row reached that column.
    pub fn get(&self, header: &str) -> Option<&str> {
        self.fields.get(header).map(String::as_str)
    }

    /// 1-indexed line in the source file (header is line 1).
    pub fn line(&self) -> usize {
        self.line
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedCsv {
    pub headers: Vec<String>,
    pub records: Vec<CsvRecord>,
}

/// Parse CSV text into records keyed by the header line.
pub fn parse(raw: &str) -> Result<ParsedCsv, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(raw.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();

    let mut records = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let record = result?;

        // Whitespace-only lines come through as a single empty field
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }

        let line = record
            .position()
            .map(|pos| pos.line() as usize)
            .unwrap_or(idx + 2);

        let fields = headers
            .iter()
            .zip(record.iter())
            .map(|(header, value)| (header.clone(), value.to_string()))
            .collect();

        records.push(CsvRecord { line, fields });
    }

    Ok(ParsedCsv { headers, records })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keys_by_header() {
        let parsed = parse("Ano,Unidade,Armas\n2025,1º BPM,120\n").unwrap();

        assert_eq!(parsed.headers, vec!["Ano", "Unidade", "Armas"]);
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.records[0].get("Unidade"), Some("1º BPM"));
        assert_eq!(parsed.records[0].get("Armas"), Some("120"));
        assert_eq!(parsed.records[0].line(), 2);
    }

    #[test]
    fn test_short_row_yields_missing_keys() {
        let parsed = parse("Ano,Unidade,Armas,Percentual\n2024,2º BPM\n").unwrap();

        let record = &parsed.records[0];
        assert_eq!(record.len(), 2);
        assert_eq!(record.get("Unidade"), Some("2º BPM"));
        assert_eq!(record.get("Armas"), None);
        assert_eq!(record.get("Percentual"), None);
    }

    #[test]
    fn test_empty_lines_skipped() {
        let parsed = parse("Ano,Unidade\n2024,A\n\n   \n2025,B\n").unwrap();

        assert_eq!(parsed.records.len(), 2);
        assert_eq!(parsed.records[1].get("Unidade"), Some("B"));
        assert_eq!(parsed.records[1].line(), 5);
    }

    #[test]
    fn test_values_stay_strings() {
        let parsed = parse("Indicador,Ano,Valor\nArmas Apreendidas,2024,\"2.454\"\n").unwrap();
        assert_eq!(parsed.records[0].get("Valor"), Some("2.454"));
    }

    #[test]
    fn test_quoted_comma_decimal() {
        let parsed = parse("Ano,Unidade,Percentual\n2025,3º BPM,\"12,5%\"\n").unwrap();
        assert_eq!(parsed.records[0].get("Percentual"), Some("12,5%"));
    }

    #[test]
    fn test_cells_trimmed() {
        let parsed = parse(" Ano , Unidade \n  2024 ,  4º BPM  \n").unwrap();
        assert_eq!(parsed.headers, vec!["Ano", "Unidade"]);
        assert_eq!(parsed.records[0].get("Ano"), Some("2024"));
        assert_eq!(parsed.records[0].get("Unidade"), Some("4º BPM"));
    }

    #[test]
    fn test_header_only() {
        let parsed = parse("Indicador,Ano,Valor\n").unwrap();
        assert_eq!(parsed.headers.len(), 3);
        assert!(parsed.records.is_empty());
    }

    #[test]
    fn test_empty_input() {
        let parsed = parse("").unwrap();
        assert!(parsed.headers.is_empty());
        assert!(parsed.records.is_empty());
    }
}

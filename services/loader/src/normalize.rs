//! Normalizer - indicator canonicalization and pt-BR numeric parsing
//!
//! A cell that cannot be read as a number is `None`, never `0`: zero is a
//! legitimate recorded count and must stay distinguishable from missing data.

/// Canonical indicator labels, in dashboard display order.
pub const INDICATOR_LABELS: [&str; 6] = [
    "Total de Ocorrências",
    "Armas Apreendidas",
    "Mandados Cumpridos",
    "Drogas Apreendidas",
    "Veículos Apreendidos",
    "Prisões Realizadas",
];

const INDICATOR_TOOLTIPS: [(&str, &str); 6] = [
    (
        "Total de Ocorrências",
        "Quantidade total de registros operacionais consolidados.",
    ),
    (
        "Armas Apreendidas",
        "Armas retiradas de circulação no período.",
    ),
    (
        "Mandados Cumpridos",
        "Mandados judiciais executados pelas equipes.",
    ),
    (
        "Drogas Apreendidas",
        "Ocorrências com apreensão de entorpecentes.",
    ),
    (
        "Veículos Apreendidos",
        "Veículos recolhidos em ações operacionais.",
    ),
    (
        "Prisões Realizadas",
        "Conduções ou prisões efetivadas no período.",
    ),
];

/// Known spellings (lowercased) and the canonical label they resolve to.
/// Every canonical label appears here lowercased, which keeps
/// canonicalization idempotent.
const INDICATOR_ALIASES: &[(&str, &str)] = &[
    ("total de ocorrências", "Total de Ocorrências"),
    ("total de ocorrencias", "Total de Ocorrências"),
    ("armas apreendidas", "Armas Apreendidas"),
    ("mandados cumpridos", "Mandados Cumpridos"),
    ("drogas apreendidas", "Drogas Apreendidas"),
    ("veículos apreendidos", "Veículos Apreendidos"),
    ("veiculos apreendidos", "Veículos Apreendidos"),
    ("prisões realizadas", "Prisões Realizadas"),
    ("prisoes realizadas", "Prisões Realizadas"),
    ("prisões realizadas (conduções a delegacia)", "Prisões Realizadas"),
    ("prisoes realizadas (conducoes a delegacia)", "Prisões Realizadas"),
];

/// Resolve a raw indicator name to its canonical label.
///
/// Lookup is case-insensitive on the trimmed text; unknown names come back
/// trimmed but otherwise untouched.
pub fn canonical_indicator(raw: &str) -> String {
    let trimmed = raw.trim();
    let key = trimmed.to_lowercase();

    INDICATOR_ALIASES
        .iter()
        .find(|(alias, _)| *alias == key)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or_else(|| trimmed.to_string())
}

pub fn is_canonical(indicator: &str) -> bool {
    INDICATOR_LABELS.iter().any(|label| *label == indicator)
}

/// Tooltip text shown next to an indicator card.
pub fn indicator_tooltip(indicator: &str) -> Option<&'static str> {
    INDICATOR_TOOLTIPS
        .iter()
        .find(|(label, _)| *label == indicator)
        .map(|(_, tooltip)| *tooltip)
}

/// Parse a pt-BR formatted number.
///
/// `%` signs and whitespace are dropped. When a comma is present it is the
/// decimal separator and dots may only group thousands before it (`1.234,5`;
/// `1,234.5` and `1.2,5` are rejected). Without a comma, a dotted integer like
/// `2.454` is read as thousands grouping; any other dot is a decimal point
/// (`12.5`).
pub fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| *c != '%' && !c.is_whitespace())
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    let numeral = if let Some((int_part, frac_part)) = cleaned.split_once(',') {
        // One comma, digits after it, and only thousands grouping before it
        if !frac_part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let int_part = if is_grouped_integer(int_part) {
            int_part.replace('.', "")
        } else if int_part.contains('.') {
            return None;
        } else {
            int_part.to_string()
        };
        format!("{}.{}", int_part, frac_part)
    } else if is_grouped_integer(&cleaned) {
        cleaned.replace('.', "")
    } else {
        cleaned
    };

    numeral.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a year cell; only integral values qualify.
pub fn parse_year(raw: &str) -> Option<i32> {
    let value = parse_number(raw)?;
    if value.fract() != 0.0 || value < i32::MIN as f64 || value > i32::MAX as f64 {
        return None;
    }
    Some(value as i32)
}

/// `2.454`, `1.234.567`, `-12.000`: a 1-3 digit leading group without a
/// leading zero followed by one or more dot-separated 3 digit groups.
fn is_grouped_integer(text: &str) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text);
    let mut groups = digits.split('.');

    let Some(first) = groups.next() else {
        return false;
    };
    if first.is_empty()
        || first.len() > 3
        || first.starts_with('0')
        || !first.bytes().all(|b| b.is_ascii_digit())
    {
        return false;
    }

    let mut rest = 0;
    for group in groups {
        if group.len() != 3 || !group.bytes().all(|b| b.is_ascii_digit()) {
            return false;
        }
        rest += 1;
    }
    rest > 0
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // INDICATOR CANONICALIZATION
    // -------------------------------------------------------------------------

    #[test]
    fn test_canonical_indicator_aliases() {
        assert_eq!(canonical_indicator("total de ocorrencias"), "Total de Ocorrências");
        assert_eq!(canonical_indicator("  VEICULOS APREENDIDOS "), "Veículos Apreendidos");
        assert_eq!(
            canonical_indicator("Prisões realizadas (conduções a delegacia)"),
            "Prisões Realizadas"
        );
    }

    #[test]
    fn test_canonical_indicator_unknown_is_trimmed() {
        assert_eq!(canonical_indicator("  Apreensão de Celulares "), "Apreensão de Celulares");
    }

    #[test]
    fn test_canonical_indicator_idempotent() {
        let mut inputs: Vec<&str> = INDICATOR_ALIASES.iter().map(|(alias, _)| *alias).collect();
        inputs.extend(INDICATOR_LABELS);
        inputs.push("  indicador desconhecido ");

        for raw in inputs {
            let once = canonical_indicator(raw);
            assert_eq!(canonical_indicator(&once), once, "not idempotent for {raw:?}");
        }
    }

    #[test]
    fn test_every_label_is_canonical_and_has_tooltip() {
        for label in INDICATOR_LABELS {
            assert_eq!(canonical_indicator(label), label);
            assert!(is_canonical(label));
            assert!(indicator_tooltip(label).is_some());
        }
        assert!(indicator_tooltip("Outro").is_none());
    }

    // -------------------------------------------------------------------------
    // NUMERIC PARSING
    // -------------------------------------------------------------------------

    #[test]
    fn test_parse_number_comma_decimal_matches_dot_decimal() {
        let pairs = [
            ("12,5%", "12.5"),
            ("12,5", "12.5"),
            ("0,125", "0.125"),
            ("-3,75 %", "-3.75"),
            ("1.234,5", "1234.5"),
            ("99%", "99"),
        ];
        for (pt_br, plain) in pairs {
            assert_eq!(parse_number(pt_br), plain.parse::<f64>().ok(), "{pt_br}");
        }
    }

    #[test]
    fn test_parse_number_thousands_grouping() {
        assert_eq!(parse_number("2.454"), Some(2454.0));
        assert_eq!(parse_number("2.914"), Some(2914.0));
        assert_eq!(parse_number("1.234.567"), Some(1_234_567.0));
        assert_eq!(parse_number(" 8 025 "), Some(8025.0));
    }

    #[test]
    fn test_parse_number_dot_decimal() {
        assert_eq!(parse_number("12.5"), Some(12.5));
        assert_eq!(parse_number("0.125"), Some(0.125));
        assert_eq!(parse_number("1234.56"), Some(1234.56));
    }

    #[test]
    fn test_parse_number_zero_is_a_value() {
        assert_eq!(parse_number("0"), Some(0.0));
        assert_eq!(parse_number("0,0%"), Some(0.0));
    }

    #[test]
    fn test_parse_number_invalid_is_none() {
        for raw in ["", "   ", "%", "abc", "n/d", "-", "1,2,3", "NaN", "inf", "12a"] {
            assert_eq!(parse_number(raw), None, "{raw:?}");
        }
    }

    #[test]
    fn test_parse_number_mixed_separators_rejected() {
        for raw in ["1,234.5", "12,5.3", "1.2,5", "1.2.3,4", "0.125,5"] {
            assert_eq!(parse_number(raw), None, "{raw:?}");
        }
    }

    #[test]
    fn test_parse_year() {
        assert_eq!(parse_year("2024"), Some(2024));
        assert_eq!(parse_year(" 2025 "), Some(2025));
        assert_eq!(parse_year("2024,5"), None);
        assert_eq!(parse_year(""), None);
        assert_eq!(parse_year("ano"), None);
    }

    #[test]
    fn test_is_grouped_integer() {
        assert!(is_grouped_integer("2.454"));
        assert!(is_grouped_integer("-12.000"));
        assert!(!is_grouped_integer("12.5"));
        assert!(!is_grouped_integer("0.125"));
        assert!(!is_grouped_integer("1234.567"));
        assert!(!is_grouped_integer("2454"));
    }
}

//! pt-BR display formatting for dashboard figures

/// Placeholder for a value that was absent or unparseable in the source.
pub const MISSING: &str = "—";

/// `2454` → `2.454`, `1234.5` → `1.234,5`. At most three fraction digits.
pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return MISSING.to_string();
    }

    let fixed = format!("{:.3}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let frac_part = frac_part.trim_end_matches('0');

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (idx, ch) in int_part.chars().enumerate() {
        if idx > 0 && (int_part.len() - idx) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let is_zero = int_part.bytes().all(|b| b == b'0') && frac_part.is_empty();
    let sign = if value < 0.0 && !is_zero { "-" } else { "" };

    if frac_part.is_empty() {
        format!("{}{}", sign, grouped)
    } else {
        format!("{}{},{}", sign, grouped, frac_part)
    }
}

/// `18.745` → `18,75%`. Non-finite input renders as `0%`.
pub fn format_percent(value: f64) -> String {
    if !value.is_finite() {
        return "0%".to_string();
    }
    format!("{:.2}%", value).replace('.', ",")
}

/// Format a value that may be missing, keeping "no data" apart from zero.
pub fn format_optional(value: Option<f64>) -> String {
    value.map(format_number).unwrap_or_else(|| MISSING.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number_groups_thousands() {
        assert_eq!(format_number(2454.0), "2.454");
        assert_eq!(format_number(1_234_567.0), "1.234.567");
        assert_eq!(format_number(851.0), "851");
        assert_eq!(format_number(0.0), "0");
    }

    #[test]
    fn test_format_number_decimals() {
        assert_eq!(format_number(1234.5), "1.234,5");
        assert_eq!(format_number(0.125), "0,125");
        assert_eq!(format_number(2.0004), "2");
    }

    #[test]
    fn test_format_number_negative() {
        assert_eq!(format_number(-460.0), "-460");
        assert_eq!(format_number(-1500.25), "-1.500,25");
        assert_eq!(format_number(-0.0001), "0");
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(18.7449), "18,74%");
        assert_eq!(format_percent(-2.5), "-2,50%");
        assert_eq!(format_percent(0.0), "0,00%");
        assert_eq!(format_percent(f64::NAN), "0%");
    }

    #[test]
    fn test_format_optional_distinguishes_missing() {
        assert_eq!(format_optional(Some(0.0)), "0");
        assert_eq!(format_optional(None), MISSING);
    }
}

//! Derived metrics - year-over-year deltas, trends and insights
//!
//! Everything here is recomputed on demand from the loaded totals and never
//! stored.

use serde::Serialize;

use crate::normalize::INDICATOR_LABELS;
use crate::totals::{TotalsMap, BASE_YEAR, COMPARE_YEAR};

/// Percent changes smaller than this (in absolute value) count as stable.
pub const STABLE_THRESHOLD: f64 = 0.01;

/// Difference between a base value and a compared value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Comparison {
    pub base_value: f64,
    pub compare_value: f64,
    pub diff: f64,
    /// Percent change relative to the base; 0 when the base is 0.
    pub percent: f64,
}

impl Comparison {
    pub fn trend(&self) -> Trend {
        Trend::classify(self.percent)
    }
}

/// Compare `compare` against `base`.
pub fn delta(base: f64, compare: f64) -> Comparison {
    let diff = compare - base;
    let percent = if base == 0.0 { 0.0 } else { diff / base * 100.0 };

    Comparison {
        base_value: base,
        compare_value: compare,
        diff,
        percent,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Growth,
    Decline,
    Stable,
}

impl Trend {
    pub fn classify(percent: f64) -> Self {
        if percent.abs() < STABLE_THRESHOLD {
            Trend::Stable
        } else if percent > 0.0 {
            Trend::Growth
        } else {
            Trend::Decline
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            Trend::Growth => "↑",
            Trend::Decline => "↓",
            Trend::Stable => "→",
        }
    }

    /// Badge text shown on the KPI card.
    pub fn badge(self) -> &'static str {
        match self {
            Trend::Growth => "Melhora",
            Trend::Decline => "Queda",
            Trend::Stable => "Estável",
        }
    }
}

/// One indicator card: both years plus the derived comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpi {
    pub indicator: String,
    pub base_year: i32,
    pub compare_year: i32,
    pub comparison: Comparison,
    pub trend: Trend,
}

/// KPI cards for every canonical indicator, in display order.
pub fn kpi_summary(totals: &TotalsMap) -> Vec<Kpi> {
    INDICATOR_LABELS
        .iter()
        .map(|indicator| {
            let comparison = totals
                .compare(indicator, BASE_YEAR, COMPARE_YEAR)
                .unwrap_or_else(|| delta(0.0, 0.0));
            Kpi {
                indicator: indicator.to_string(),
                base_year: BASE_YEAR,
                compare_year: COMPARE_YEAR,
                comparison,
                trend: comparison.trend(),
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insights<'a> {
    /// Up to three indicators with the highest percent change.
    pub top_growth: Vec<&'a Kpi>,
    /// Indicator whose percent change is closest to zero.
    pub least_changed: &'a Kpi,
}

pub fn insights(kpis: &[Kpi]) -> Option<Insights<'_>> {
    let mut sorted: Vec<&Kpi> = kpis.iter().collect();
    sorted.sort_by(|a, b| b.comparison.percent.total_cmp(&a.comparison.percent));

    // Scanned in descending percent order: on equal distance to zero the
    // higher change wins
    let first = *sorted.first()?;
    let least_changed = sorted.iter().skip(1).fold(first, |acc, kpi| {
        if kpi.comparison.percent.abs() < acc.comparison.percent.abs() {
            kpi
        } else {
            acc
        }
    });

    sorted.truncate(3);

    Some(Insights {
        top_growth: sorted,
        least_changed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::totals::{build_totals_map, TotalRecord};

    fn kpi(indicator: &str, base: f64, compare: f64) -> Kpi {
        let comparison = delta(base, compare);
        Kpi {
            indicator: indicator.to_string(),
            base_year: BASE_YEAR,
            compare_year: COMPARE_YEAR,
            comparison,
            trend: comparison.trend(),
        }
    }

    // -------------------------------------------------------------------------
    // DELTA
    // -------------------------------------------------------------------------

    #[test]
    fn test_delta_growth() {
        let result = delta(2454.0, 2914.0);
        assert_eq!(result.diff, 460.0);
        assert!((result.percent - 18.745).abs() < 0.01);
        assert_eq!(result.trend(), Trend::Growth);
    }

    #[test]
    fn test_delta_to_zero() {
        let result = delta(80.0, 0.0);
        assert_eq!(result.diff, -80.0);
        assert_eq!(result.percent, (0.0 - 80.0) / 80.0 * 100.0);
        assert_eq!(result.trend(), Trend::Decline);
    }

    #[test]
    fn test_delta_zero_base_guard() {
        for compare in [0.0, 1.0, 5000.0, -3.0] {
            let result = delta(0.0, compare);
            assert_eq!(result.percent, 0.0);
            assert_eq!(result.diff, compare);
        }
    }

    // -------------------------------------------------------------------------
    // TREND CLASSIFICATION
    // -------------------------------------------------------------------------

    #[test]
    fn test_trend_threshold() {
        assert_eq!(Trend::classify(0.0), Trend::Stable);
        assert_eq!(Trend::classify(0.009), Trend::Stable);
        assert_eq!(Trend::classify(-0.009), Trend::Stable);
        assert_eq!(Trend::classify(0.01), Trend::Growth);
        assert_eq!(Trend::classify(-0.01), Trend::Decline);
    }

    #[test]
    fn test_trend_labels() {
        assert_eq!(Trend::Growth.arrow(), "↑");
        assert_eq!(Trend::Decline.badge(), "Queda");
        assert_eq!(Trend::Stable.badge(), "Estável");
    }

    // -------------------------------------------------------------------------
    // KPI SUMMARY AND INSIGHTS
    // -------------------------------------------------------------------------

    #[test]
    fn test_kpi_summary_covers_all_labels_in_order() {
        let rows = vec![
            TotalRecord::new("Armas Apreendidas", 2024, 2454.0),
            TotalRecord::new("Armas Apreendidas", 2025, 2914.0),
        ];
        let kpis = kpi_summary(&build_totals_map(&rows));

        let names: Vec<&str> = kpis.iter().map(|k| k.indicator.as_str()).collect();
        assert_eq!(names, INDICATOR_LABELS);
        assert_eq!(kpis[1].comparison.diff, 460.0);
        assert_eq!(kpis[0].trend, Trend::Stable);
    }

    #[test]
    fn test_insights_top_and_least() {
        let kpis = vec![
            kpi("A", 100.0, 110.0),
            kpi("B", 100.0, 150.0),
            kpi("C", 100.0, 99.0),
            kpi("D", 100.0, 130.0),
            kpi("E", 100.0, 101.0),
        ];
        let result = insights(&kpis).unwrap();

        let top: Vec<&str> = result.top_growth.iter().map(|k| k.indicator.as_str()).collect();
        assert_eq!(top, vec!["B", "D", "A"]);
        // C (-1%) and E (+1%) are equally close to zero; the higher change wins
        assert_eq!(result.least_changed.indicator, "E");
    }

    #[test]
    fn test_insights_empty() {
        assert!(insights(&[]).is_none());
    }
}

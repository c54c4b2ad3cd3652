//! Period-over-period comparison and short natural-language trend summaries.

use crate::types::{round_non_negative, Arrow, ForecastResult, PeriodOverview, TimeSeriesPoint};
use crate::utils::round_to_2_places;

/// Compares the last two points of the series.
pub fn overview(series: &[TimeSeriesPoint]) -> PeriodOverview {
    let total = series.last().map(|point| round_non_negative(point.value)).unwrap_or(0);
    let previous = if series.len() >= 2 {
        round_non_negative(series[series.len() - 2].value)
    } else {
        0
    };

    let pct_change = if previous == 0 {
        if total > 0 {
            100.0
        } else {
            0.0
        }
    } else {
        round_to_2_places((total as f64 - previous as f64) / previous as f64 * 100.0)
    };

    let arrow = if pct_change > 0.0 {
        Arrow::Up
    } else if pct_change < 0.0 {
        Arrow::Down
    } else {
        Arrow::Same
    };

    PeriodOverview {
        total,
        previous,
        pct_change,
        arrow,
    }
}

/// Best-effort one-line summary of the recent trend. Empty when nothing sensible can be said.
pub fn insight(period_name: &str, series: &[TimeSeriesPoint], forecast: &ForecastResult) -> String {
    compose_insight(period_name, series, forecast).unwrap_or_default()
}

fn compose_insight(
    period_name: &str,
    series: &[TimeSeriesPoint],
    forecast: &ForecastResult,
) -> Option<String> {
    if series.is_empty() || period_name.trim().is_empty() {
        return None;
    }

    let period = capitalize(period_name.trim());
    let confidence = forecast.confidence;
    if !confidence.is_finite() {
        return None;
    }

    let last_three: Vec<f64> = series
        .iter()
        .rev()
        .take(3)
        .map(|point| point.value)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();

    let has_three = last_three.len() == 3;
    let increasing = has_three && last_three.windows(2).all(|w| w[1] > w[0]);
    let decreasing = has_three && last_three.windows(2).all(|w| w[1] < w[0]);
    let flat = has_three && last_three.windows(2).all(|w| w[1] == w[0]);

    let text = if increasing && confidence >= 60.0 {
        format!(
            "{} sales are increasing and are expected to continue ({:.0}% confidence).",
            period, confidence
        )
    } else if decreasing && confidence >= 60.0 {
        format!(
            "{} sales are decreasing ({:.0}% confidence); consider promotions to recover demand.",
            period, confidence
        )
    } else if flat && confidence >= 70.0 {
        format!(
            "{} sales are steady with no major change expected ({:.0}% confidence).",
            period, confidence
        )
    } else if confidence < 40.0 {
        format!(
            "{} forecast has low confidence ({:.0}%); review recent sales for anomalies.",
            period, confidence
        )
    } else {
        let direction = match overview(series).arrow {
            Arrow::Up => "up",
            Arrow::Down => "down",
            Arrow::Same => "flat",
        };
        format!(
            "{} sales are trending {} with {:.0}% forecast confidence.",
            period, direction, confidence
        )
    };

    Some(text)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MethodKind;

    fn series(values: &[f64]) -> Vec<TimeSeriesPoint> {
        values
            .iter()
            .enumerate()
            .map(|(i, value)| TimeSeriesPoint::new(format!("2025-W{}", i + 1), *value))
            .collect()
    }

    fn forecast_with(confidence: f64) -> ForecastResult {
        ForecastResult::new(MethodKind::LinearTrend, vec![1], vec![1], vec![1], confidence)
    }

    #[test]
    fn test_overview_decrease() {
        let result = overview(&series(&[100.0, 80.0]));

        assert_eq!(
            result,
            PeriodOverview {
                total: 80,
                previous: 100,
                pct_change: -20.0,
                arrow: Arrow::Down,
            }
        );
    }

    #[test]
    fn test_overview_from_zero() {
        let result = overview(&series(&[0.0, 12.0]));
        assert_eq!(result.pct_change, 100.0);
        assert_eq!(result.arrow, Arrow::Up);

        let result = overview(&series(&[0.0, 0.0]));
        assert_eq!(result.pct_change, 0.0);
        assert_eq!(result.arrow, Arrow::Same);
    }

    #[test]
    fn test_overview_short_series() {
        let result = overview(&[]);
        assert_eq!(result.total, 0);
        assert_eq!(result.arrow, Arrow::Same);

        let result = overview(&series(&[7.0]));
        assert_eq!(result.total, 7);
        assert_eq!(result.previous, 0);
        assert_eq!(result.pct_change, 100.0);
    }

    #[test]
    fn test_overview_rounds_pct() {
        let result = overview(&series(&[3.0, 4.0]));
        assert_eq!(result.pct_change, 33.33);
    }

    #[test]
    fn test_insight_increasing() {
        let text = insight("weekly", &series(&[5.0, 8.0, 12.0]), &forecast_with(75.0));
        assert!(text.starts_with("Weekly sales are increasing"));
        assert!(text.contains("expected to continue"));
    }

    #[test]
    fn test_insight_decreasing() {
        let text = insight("daily", &series(&[12.0, 8.0, 5.0]), &forecast_with(61.0));
        assert!(text.contains("decreasing"));
        assert!(text.contains("promotions"));
    }

    #[test]
    fn test_insight_steady() {
        let text = insight("monthly", &series(&[9.0, 9.0, 9.0]), &forecast_with(90.0));
        assert!(text.contains("steady"));
    }

    #[test]
    fn test_insight_low_confidence() {
        let text = insight("daily", &series(&[1.0, 9.0, 2.0]), &forecast_with(12.0));
        assert!(text.contains("low confidence"));
        assert!(text.contains("anomalies"));
    }

    #[test]
    fn test_insight_increasing_needs_confidence() {
        // Rule 1 is skipped at 50%, falls through to the generic statement
        let text = insight("weekly", &series(&[5.0, 8.0, 12.0]), &forecast_with(50.0));
        assert_eq!(text, "Weekly sales are trending up with 50% forecast confidence.");
    }

    #[test]
    fn test_insight_empty_series() {
        assert_eq!(insight("daily", &[], &forecast_with(90.0)), "");
    }
}

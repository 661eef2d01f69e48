// grc-core/src/domain/compliance/trend.rs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::rating::{ComplianceRating, EXCELLENT_THRESHOLD};
use super::scoring::{clamp_score, round2};

/// Prior snapshots taken into account.
pub const TREND_WINDOW: usize = 12;
/// Minimum slope, in score points per period, to call a trend.
pub const TREND_STABILITY_THRESHOLD: f64 = 1.0;
/// Slopes below this, in score points per period, are treated as flat when
/// projecting the time to EXCELLENT.
pub const FORECAST_MIN_SLOPE: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrendDirection {
    Improving,
    #[default]
    Stable,
    Declining,
}

str_enum!(TrendDirection {
    Improving => "IMPROVING",
    Stable => "STABLE",
    Declining => "DECLINING",
});

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub overall: f64,
    pub policies: f64,
    pub controls: f64,
    pub assets: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub slope: f64,
    pub direction: TrendDirection,
    pub projected_score_next_period: f64,
    pub projected_days_to_excellent: Option<i64>,
}

pub struct TrendAnalysis;

impl TrendAnalysis {
    /// Ordinary least squares over (index, value). Returns (slope, intercept).
    /// Fewer than two points gives a flat line through the only value.
    pub fn linear_fit(values: &[f64]) -> (f64, f64) {
        match values {
            [] => (0.0, 0.0),
            [only] => (0.0, *only),
            _ => {
                let n = values.len() as f64;
                let mean_x = (n - 1.0) / 2.0;
                let mean_y = values.iter().sum::<f64>() / n;
                let (num, den) = values.iter().enumerate().fold((0.0, 0.0), |(num, den), (i, y)| {
                    let dx = i as f64 - mean_x;
                    (num + dx * (y - mean_y), den + dx * dx)
                });
                let slope = if den > 0.0 { num / den } else { 0.0 };
                (slope, mean_y - slope * mean_x)
            }
        }
    }

    pub fn direction(slope: f64, points: usize) -> TrendDirection {
        if points < 2 {
            TrendDirection::Stable
        } else if slope > TREND_STABILITY_THRESHOLD {
            TrendDirection::Improving
        } else if slope < -TREND_STABILITY_THRESHOLD {
            TrendDirection::Declining
        } else {
            TrendDirection::Stable
        }
    }

    /// `points` is chronological and ends with the report being generated.
    pub fn forecast(points: &[TrendPoint], period_days: i64) -> Forecast {
        let values: Vec<f64> = points.iter().map(|p| p.overall).collect();
        let (slope, intercept) = Self::linear_fit(&values);
        let current = values.last().copied().unwrap_or(0.0);
        let projected = round2(clamp_score(intercept + slope * values.len() as f64));

        let days_to_excellent = if ComplianceRating::from_score(current) == ComplianceRating::Excellent {
            Some(0)
        } else if slope < FORECAST_MIN_SLOPE {
            None
        } else {
            let periods = ((EXCELLENT_THRESHOLD - current) / slope).ceil() as i64;
            periods.max(1).checked_mul(period_days.max(1))
        };

        Forecast {
            slope: round2(slope),
            direction: Self::direction(slope, values.len()),
            projected_score_next_period: projected,
            projected_days_to_excellent: days_to_excellent,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn points(values: &[f64]) -> Vec<TrendPoint> {
        let start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, v)| TrendPoint {
                date: start + chrono::Duration::days(30 * i as i64),
                overall: *v,
                policies: 0.0,
                controls: 0.0,
                assets: 0.0,
            })
            .collect()
    }

    #[test]
    fn test_linear_fit_exact_line() {
        let (slope, intercept) = TrendAnalysis::linear_fit(&[50.0, 55.0, 60.0, 65.0]);
        assert!((slope - 5.0).abs() < 1e-9);
        assert!((intercept - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_improving_forecast() {
        let f = TrendAnalysis::forecast(&points(&[50.0, 55.0, 60.0, 65.0]), 30);
        assert_eq!(f.direction, TrendDirection::Improving);
        assert_eq!(f.projected_score_next_period, 70.0);
        // (90 - 65) / 5 = 5 periods of 30 days
        assert_eq!(f.projected_days_to_excellent, Some(150));
    }

    #[test]
    fn test_declining_has_no_eta() {
        let f = TrendAnalysis::forecast(&points(&[80.0, 70.0, 60.0]), 30);
        assert_eq!(f.direction, TrendDirection::Declining);
        assert_eq!(f.projected_days_to_excellent, None);
        assert_eq!(f.projected_score_next_period, 50.0);
    }

    #[test]
    fn test_small_moves_are_stable() {
        let f = TrendAnalysis::forecast(&points(&[60.0, 60.5, 61.0]), 7);
        assert_eq!(f.direction, TrendDirection::Stable);
    }

    #[test]
    fn test_single_point() {
        let f = TrendAnalysis::forecast(&points(&[42.0]), 30);
        assert_eq!(f.direction, TrendDirection::Stable);
        assert_eq!(f.projected_score_next_period, 42.0);
        assert_eq!(f.projected_days_to_excellent, None);

        let f = TrendAnalysis::forecast(&points(&[95.0]), 30);
        assert_eq!(f.projected_days_to_excellent, Some(0));
    }

    #[test]
    fn test_projection_is_clamped() {
        let f = TrendAnalysis::forecast(&points(&[80.0, 90.0, 100.0]), 1);
        assert_eq!(f.projected_score_next_period, 100.0);
        let f = TrendAnalysis::forecast(&points(&[20.0, 10.0, 0.0]), 1);
        assert_eq!(f.projected_score_next_period, 0.0);
    }

    #[test]
    fn test_rounding_noise_slope_has_no_eta() {
        // Symmetric history fits a slope of a few 1e-16, not zero
        let history = points(&[0.01, 40.0, 40.0, 0.01]);
        let (slope, _) = TrendAnalysis::linear_fit(&history.iter().map(|p| p.overall).collect::<Vec<_>>());
        assert!(slope.abs() < 1e-9);

        for period_days in [30, 365] {
            let f = TrendAnalysis::forecast(&history, period_days);
            assert_eq!(f.direction, TrendDirection::Stable);
            assert_eq!(f.projected_days_to_excellent, None);
        }
    }

    #[test]
    fn test_slow_improvement_still_projects() {
        // Stable band, but climbing half a point per period
        let f = TrendAnalysis::forecast(&points(&[79.0, 79.5, 80.0]), 365);
        assert_eq!(f.direction, TrendDirection::Stable);
        assert_eq!(f.projected_days_to_excellent, Some(20 * 365));
    }
}

// grc-core/src/domain/compliance/report.rs

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::analysis::ReportAnalysis;
use super::department::DepartmentScore;
use super::gaps::GapDetail;
use super::rating::ComplianceRating;
use super::trend::{TrendDirection, TrendPoint};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReportPeriod {
    Daily,
    Weekly,
    #[default]
    Monthly,
    Quarterly,
    Annual,
}

str_enum!(ReportPeriod {
    Daily => "daily",
    Weekly => "weekly",
    Monthly => "monthly",
    Quarterly => "quarterly",
    Annual => "annual",
});

impl ReportPeriod {
    /// The most recent period that ended strictly before `today`.
    pub fn last_complete(self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        match self {
            Self::Daily => {
                let day = today - Duration::days(1);
                (day, day)
            }
            Self::Weekly => {
                let this_monday = today - Duration::days(today.weekday().num_days_from_monday() as i64);
                let start = this_monday - Duration::days(7);
                (start, this_monday - Duration::days(1))
            }
            Self::Monthly => {
                let this_month = first_of_month(today);
                let start = this_month
                    .checked_sub_months(Months::new(1))
                    .unwrap_or(this_month);
                (start, this_month - Duration::days(1))
            }
            Self::Quarterly => {
                let quarter_month = (today.month0() / 3) * 3 + 1;
                let this_quarter =
                    NaiveDate::from_ymd_opt(today.year(), quarter_month, 1).unwrap_or(today);
                let start = this_quarter
                    .checked_sub_months(Months::new(3))
                    .unwrap_or(this_quarter);
                (start, this_quarter - Duration::days(1))
            }
            Self::Annual => {
                let year = today.year() - 1;
                (
                    NaiveDate::from_ymd_opt(year, 1, 1).unwrap_or(today),
                    NaiveDate::from_ymd_opt(year, 12, 31).unwrap_or(today),
                )
            }
        }
    }
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Inclusive number of days covered by a period.
pub fn period_days(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days() + 1
}

/// Last instant of `date`; rows stamped after it are outside the period.
pub fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_micro_opt(23, 59, 59, 999_999)
        .unwrap_or_default()
        .and_utc()
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_period_bounds"))]
pub struct GenerateReportRequest {
    #[serde(default)]
    pub report_period: ReportPeriod,
    pub period_start_date: NaiveDate,
    pub period_end_date: NaiveDate,
    #[serde(default)]
    #[validate(length(min = 1, max = 255))]
    pub report_name: Option<String>,
}

fn validate_period_bounds(request: &GenerateReportRequest) -> Result<(), ValidationError> {
    if request.period_start_date > request.period_end_date {
        let mut err = ValidationError::new("period_bounds");
        err.message = Some("period_start_date must not be after period_end_date".into());
        return Err(err);
    }
    Ok(())
}

impl GenerateReportRequest {
    pub fn new(report_period: ReportPeriod, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            report_period,
            period_start_date: start,
            period_end_date: end,
            report_name: None,
        }
    }

    pub fn resolved_name(&self) -> String {
        self.report_name
            .clone()
            .unwrap_or_else(|| format!("Compliance Report - {}", self.period_start_date))
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReportNarrative {
    pub executive_summary: String,
    pub key_findings: String,
    pub recommendations: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateNarrativeRequest {
    #[validate(length(max = 10000))]
    pub executive_summary: Option<String>,
    #[validate(length(max = 10000))]
    pub key_findings: Option<String>,
    #[validate(length(max = 10000))]
    pub recommendations: Option<String>,
}

/// Point-in-time snapshot. Never rewritten except for the narrative (until final)
/// and the archive flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceReport {
    pub id: Uuid,
    pub report_name: String,
    pub report_period: ReportPeriod,
    pub period_start_date: NaiveDate,
    pub period_end_date: NaiveDate,

    pub overall_compliance_score: f64,
    pub overall_compliance_rating: ComplianceRating,
    pub policies_compliance_score: f64,
    pub controls_compliance_score: f64,
    pub assets_compliance_score: f64,

    pub total_policies: u64,
    pub policies_published: u64,
    pub policies_acknowledged: u64,
    pub policy_acknowledgment_rate: f64,

    pub total_controls: u64,
    pub controls_implemented: u64,
    pub controls_partial: u64,
    pub controls_not_implemented: u64,
    pub average_control_effectiveness: f64,

    pub total_assets: u64,
    pub assets_compliant: u64,
    pub asset_compliance_percentage: f64,

    pub critical_gaps: u64,
    pub medium_gaps: u64,
    pub low_gaps: u64,
    pub gap_details: Vec<GapDetail>,
    pub department_breakdown: Vec<DepartmentScore>,
    pub compliance_trend: Vec<TrendPoint>,

    pub projected_score_next_period: Option<f64>,
    pub projected_days_to_excellent: Option<i64>,
    pub trend_direction: TrendDirection,

    pub executive_summary: String,
    pub key_findings: String,
    pub recommendations: String,

    pub is_final: bool,
    pub is_archived: bool,
    pub created_by_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub generated_at: DateTime<Utc>,
}

impl ComplianceReport {
    pub fn assemble(
        request: &GenerateReportRequest,
        analysis: ReportAnalysis,
        narrative: ReportNarrative,
        created_by_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Self {
        let ReportAnalysis {
            scores,
            gaps,
            departments,
            trend,
            forecast,
        } = analysis;

        Self {
            id: Uuid::new_v4(),
            report_name: request.resolved_name(),
            report_period: request.report_period,
            period_start_date: request.period_start_date,
            period_end_date: request.period_end_date,
            overall_compliance_score: scores.overall_score,
            overall_compliance_rating: scores.rating,
            policies_compliance_score: scores.policies.score,
            controls_compliance_score: scores.controls.score,
            assets_compliance_score: scores.assets.score,
            total_policies: scores.policies.total,
            policies_published: scores.policies.published,
            policies_acknowledged: scores.policies.acknowledged,
            policy_acknowledgment_rate: scores.policies.acknowledgment_rate,
            total_controls: scores.controls.total,
            controls_implemented: scores.controls.implemented,
            controls_partial: scores.controls.partial,
            controls_not_implemented: scores.controls.not_implemented,
            average_control_effectiveness: scores.controls.average_effectiveness,
            total_assets: scores.assets.total,
            assets_compliant: scores.assets.compliant,
            asset_compliance_percentage: scores.assets.compliance_percentage,
            critical_gaps: gaps.critical,
            medium_gaps: gaps.medium,
            low_gaps: gaps.low,
            gap_details: gaps.details,
            department_breakdown: departments,
            compliance_trend: trend,
            projected_score_next_period: Some(forecast.projected_score_next_period),
            projected_days_to_excellent: forecast.projected_days_to_excellent,
            trend_direction: forecast.direction,
            executive_summary: narrative.executive_summary,
            key_findings: narrative.key_findings,
            recommendations: narrative.recommendations,
            is_final: false,
            is_archived: false,
            created_by_id,
            created_at: now,
            generated_at: now,
        }
    }

    pub fn trend_point(&self) -> TrendPoint {
        TrendPoint {
            date: self.period_end_date,
            overall: self.overall_compliance_score,
            policies: self.policies_compliance_score,
            controls: self.controls_compliance_score,
            assets: self.assets_compliance_score,
        }
    }

    pub fn apply_narrative(&mut self, update: UpdateNarrativeRequest) {
        if let Some(summary) = update.executive_summary {
            self.executive_summary = summary;
        }
        if let Some(findings) = update.key_findings {
            self.key_findings = findings;
        }
        if let Some(recommendations) = update.recommendations {
            self.recommendations = recommendations;
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportFilter {
    pub report_period: Option<ReportPeriod>,
    /// Reports whose period starts on or after this date.
    pub start_date: Option<NaiveDate>,
    /// Reports whose period ends on or before this date.
    pub end_date: Option<NaiveDate>,
    pub rating: Option<ComplianceRating>,
    pub include_archived: Option<bool>,
    pub skip: Option<u64>,
    pub take: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicySummary {
    pub total: u64,
    pub published: u64,
    pub acknowledged: u64,
    pub acknowledgment_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlSummary {
    pub total: u64,
    pub implemented: u64,
    pub partial: u64,
    pub not_implemented: u64,
    pub effectiveness: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetSummary {
    pub total: u64,
    pub compliant: u64,
    pub compliance_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapSummary {
    pub critical: u64,
    pub medium: u64,
    pub low: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSummary {
    pub direction: TrendDirection,
    pub projected_score: f64,
    pub days_to_excellent: Option<i64>,
}

/// Projection of the latest non-archived report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceDashboard {
    pub report_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub overall_score: f64,
    pub overall_rating: ComplianceRating,
    pub policies: PolicySummary,
    pub controls: ControlSummary,
    pub assets: AssetSummary,
    pub gaps: GapSummary,
    pub trend: TrendSummary,
}

impl From<&ComplianceReport> for ComplianceDashboard {
    fn from(r: &ComplianceReport) -> Self {
        Self {
            report_id: r.id,
            generated_at: r.generated_at,
            overall_score: r.overall_compliance_score,
            overall_rating: r.overall_compliance_rating,
            policies: PolicySummary {
                total: r.total_policies,
                published: r.policies_published,
                acknowledged: r.policies_acknowledged,
                acknowledgment_rate: r.policy_acknowledgment_rate,
            },
            controls: ControlSummary {
                total: r.total_controls,
                implemented: r.controls_implemented,
                partial: r.controls_partial,
                not_implemented: r.controls_not_implemented,
                effectiveness: r.average_control_effectiveness,
            },
            assets: AssetSummary {
                total: r.total_assets,
                compliant: r.assets_compliant,
                compliance_percentage: r.asset_compliance_percentage,
            },
            gaps: GapSummary {
                critical: r.critical_gaps,
                medium: r.medium_gaps,
                low: r.low_gaps,
            },
            trend: TrendSummary {
                direction: r.trend_direction,
                projected_score: r.projected_score_next_period.unwrap_or(0.0),
                days_to_excellent: r.projected_days_to_excellent,
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_last_complete_periods() {
        let today = d(2026, 5, 14); // a Thursday
        assert_eq!(
            ReportPeriod::Daily.last_complete(today),
            (d(2026, 5, 13), d(2026, 5, 13))
        );
        assert_eq!(
            ReportPeriod::Weekly.last_complete(today),
            (d(2026, 5, 4), d(2026, 5, 10))
        );
        assert_eq!(
            ReportPeriod::Monthly.last_complete(today),
            (d(2026, 4, 1), d(2026, 4, 30))
        );
        assert_eq!(
            ReportPeriod::Quarterly.last_complete(today),
            (d(2026, 1, 1), d(2026, 3, 31))
        );
        assert_eq!(
            ReportPeriod::Annual.last_complete(today),
            (d(2025, 1, 1), d(2025, 12, 31))
        );
    }

    #[test]
    fn test_quarter_wraps_year() {
        assert_eq!(
            ReportPeriod::Quarterly.last_complete(d(2026, 2, 1)),
            (d(2025, 10, 1), d(2025, 12, 31))
        );
    }

    #[test]
    fn test_period_bounds_validated() {
        let bad = GenerateReportRequest::new(ReportPeriod::Monthly, d(2026, 2, 1), d(2026, 1, 1));
        assert!(bad.validate().is_err());
        let ok = GenerateReportRequest::new(ReportPeriod::Daily, d(2026, 1, 1), d(2026, 1, 1));
        assert!(ok.validate().is_ok());
        assert_eq!(ok.resolved_name(), "Compliance Report - 2026-01-01");
    }

    #[test]
    fn test_period_days_inclusive() {
        assert_eq!(period_days(d(2026, 1, 1), d(2026, 1, 1)), 1);
        assert_eq!(period_days(d(2026, 4, 1), d(2026, 4, 30)), 30);
    }
}

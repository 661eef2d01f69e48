// grc-core/src/domain/compliance/analysis.rs

use chrono::NaiveDate;

use super::dataset::ComplianceDataset;
use super::department::{DepartmentScore, department_breakdown};
use super::gaps::GapAnalysis;
use super::report::{ComplianceReport, GenerateReportRequest, ReportPeriod, period_days};
use super::scoring::ComplianceScores;
use super::trend::{Forecast, TREND_WINDOW, TrendAnalysis, TrendPoint};

/// Everything computed for one report before narratives are rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportAnalysis {
    pub scores: ComplianceScores,
    pub gaps: GapAnalysis,
    pub departments: Vec<DepartmentScore>,
    pub trend: Vec<TrendPoint>,
    pub forecast: Forecast,
}

impl ReportAnalysis {
    /// `dataset` must already be cut at the period end.
    /// `history` may be in any order. Only non-archived reports of the same period
    /// kind that start before this one feed the trend.
    pub fn compute(
        dataset: &ComplianceDataset,
        request: &GenerateReportRequest,
        history: &[ComplianceReport],
    ) -> Self {
        let period_start = request.period_start_date;
        let period_end = request.period_end_date;
        let scores = ComplianceScores::compute(dataset);
        let gaps = GapAnalysis::identify(dataset, &scores, period_end);
        let departments = department_breakdown(dataset);

        let trend = trend_points(history, request.report_period, period_start, &scores, period_end);
        let forecast = TrendAnalysis::forecast(&trend, period_days(period_start, period_end));

        Self {
            scores,
            gaps,
            departments,
            trend,
            forecast,
        }
    }
}

fn trend_points(
    history: &[ComplianceReport],
    period: ReportPeriod,
    period_start: NaiveDate,
    current: &ComplianceScores,
    period_end: NaiveDate,
) -> Vec<TrendPoint> {
    let mut prior: Vec<&ComplianceReport> = history
        .iter()
        .filter(|r| {
            !r.is_archived && r.report_period == period && r.period_start_date < period_start
        })
        .collect();
    prior.sort_by_key(|r| (r.period_start_date, r.generated_at));
    let skip = prior.len().saturating_sub(TREND_WINDOW);

    let mut points: Vec<TrendPoint> = prior[skip..].iter().map(|r| r.trend_point()).collect();
    points.push(TrendPoint {
        date: period_end,
        overall: current.overall_score,
        policies: current.policies.score,
        controls: current.controls.score,
        assets: current.assets.score,
    });
    points
}

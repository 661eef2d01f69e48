// grc-core/src/application/narrative.rs

use std::sync::Arc;

use serde_json::json;

use crate::application::ports::TemplateEngine;
use crate::domain::compliance::{
    ComplianceRating, GenerateReportRequest, ReportAnalysis, ReportNarrative,
};
use crate::error::GrcError;

const EXECUTIVE_SUMMARY: &str = concat!(
    "Overall compliance for {{ report_name }} ({{ period_start }} to {{ period_end }}) ",
    "is {{ overall_score | pct }}%, rated {{ rating }}. ",
    "Policies score {{ policies_score | pct }}%, controls {{ controls_score | pct }}% ",
    "and assets {{ assets_score | pct }}%. ",
    "The trend is {{ trend | lower }}",
    "{% if days_to_excellent is none %}.",
    "{% elif days_to_excellent == 0 %} and the organisation is already at EXCELLENT.",
    "{% else %} with roughly {{ days_to_excellent }} days to reach EXCELLENT.{% endif %}",
);

const KEY_FINDINGS: &str = concat!(
    "{% if gaps %}{% for gap in gaps %}- [{{ gap.severity }}] {{ gap.description }}\n{% endfor %}",
    "{% else %}No compliance gaps identified.\n{% endif %}",
    "{% if weak_departments %}Departments below GOOD: ",
    "{% for d in weak_departments %}{{ d.department }} ({{ d.overall_score | pct }}%)",
    "{% if not loop.last %}, {% endif %}{% endfor %}.{% endif %}",
);

const RECOMMENDATIONS: &str = concat!(
    "{% if not gaps %}Maintain current controls and keep the review calendar on schedule.",
    "{% else %}{% for gap in gaps %}",
    "{% if gap.category == \"policy\" %}",
    "- Move {{ gap.affected_count }} unpublished ",
    "{% if gap.severity == \"LOW\" %}optional{% else %}mandatory{% endif %} ",
    "policies through approval and publication.\n",
    "{% elif gap.category == \"acknowledgment\" %}",
    "- Chase the {{ gap.affected_count }} outstanding policy acknowledgments.\n",
    "{% elif gap.category == \"control\" %}",
    "{% if gap.severity == \"LOW\" %}- Finish the {{ gap.affected_count }} controls still in progress.\n",
    "{% else %}- Start implementation of the {{ gap.affected_count }} controls not implemented.\n{% endif %}",
    "{% else %}- Raise control coverage on the {{ gap.affected_count }} non-compliant assets.\n",
    "{% endif %}{% endfor %}{% endif %}",
);

/// Renders the three report narratives from a finished analysis.
pub struct NarrativeWriter {
    engine: Arc<dyn TemplateEngine>,
}

impl NarrativeWriter {
    pub fn new(engine: Arc<dyn TemplateEngine>) -> Self {
        Self { engine }
    }

    pub fn write(
        &self,
        request: &GenerateReportRequest,
        analysis: &ReportAnalysis,
    ) -> Result<ReportNarrative, GrcError> {
        let scores = &analysis.scores;
        let weak_departments: Vec<_> = analysis
            .departments
            .iter()
            .filter(|d| matches!(d.rating, ComplianceRating::Fair | ComplianceRating::Poor))
            .collect();

        let context = json!({
            "report_name": request.resolved_name(),
            "period_start": request.period_start_date.to_string(),
            "period_end": request.period_end_date.to_string(),
            "overall_score": scores.overall_score,
            "rating": scores.rating.as_str(),
            "policies_score": scores.policies.score,
            "controls_score": scores.controls.score,
            "assets_score": scores.assets.score,
            "trend": analysis.forecast.direction.as_str(),
            "days_to_excellent": analysis.forecast.projected_days_to_excellent,
            "gaps": analysis.gaps.details,
            "weak_departments": weak_departments,
        });

        Ok(ReportNarrative {
            executive_summary: self.engine.render(EXECUTIVE_SUMMARY, &context)?,
            key_findings: self.engine.render(KEY_FINDINGS, &context)?,
            recommendations: self.engine.render(RECOMMENDATIONS, &context)?,
        })
    }
}

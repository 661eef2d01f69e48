// grc-core/src/domain/compliance/gaps.rs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::dataset::ComplianceDataset;
use super::scoring::ComplianceScores;
use crate::domain::policy::PolicyStatus;

pub const LOW_ACKNOWLEDGMENT_RATE: f64 = 50.0;
pub const CONTROL_GAP_CRITICAL_RATIO: f64 = 0.20;
pub const ASSET_COMPLIANCE_TARGET: f64 = 70.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GapSeverity {
    Critical,
    Medium,
    Low,
}

str_enum!(GapSeverity {
    Critical => "CRITICAL",
    Medium => "MEDIUM",
    Low => "LOW",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapCategory {
    Policy,
    Acknowledgment,
    Control,
    Asset,
}

str_enum!(GapCategory {
    Policy => "policy",
    Acknowledgment => "acknowledgment",
    Control => "control",
    Asset => "asset",
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapDetail {
    pub category: GapCategory,
    pub description: String,
    pub severity: GapSeverity,
    pub affected_count: u64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GapAnalysis {
    pub critical: u64,
    pub medium: u64,
    pub low: u64,
    pub details: Vec<GapDetail>,
}

impl GapAnalysis {
    fn push(&mut self, category: GapCategory, severity: GapSeverity, affected_count: u64, description: String) {
        if affected_count == 0 {
            return;
        }
        match severity {
            GapSeverity::Critical => self.critical += 1,
            GapSeverity::Medium => self.medium += 1,
            GapSeverity::Low => self.low += 1,
        }
        self.details.push(GapDetail {
            category,
            description,
            severity,
            affected_count,
        });
    }

    /// `as_of` decides which review dates count as overdue.
    pub fn identify(dataset: &ComplianceDataset, scores: &ComplianceScores, as_of: NaiveDate) -> Self {
        let mut gaps = Self::default();

        let unpublished = dataset
            .policies
            .iter()
            .filter(|p| p.status != PolicyStatus::Archived && p.is_unpublished());
        let (mut mandatory_overdue, mut mandatory, mut optional) = (0u64, 0u64, 0u64);
        for policy in unpublished {
            match (policy.is_mandatory, policy.is_review_overdue(as_of)) {
                (true, true) => mandatory_overdue += 1,
                (true, false) => mandatory += 1,
                (false, _) => optional += 1,
            }
        }
        gaps.push(
            GapCategory::Policy,
            GapSeverity::Critical,
            mandatory_overdue,
            format!("{mandatory_overdue} mandatory policies unpublished and past their review date"),
        );
        gaps.push(
            GapCategory::Policy,
            GapSeverity::Medium,
            mandatory,
            format!("{mandatory} mandatory policies not yet published"),
        );
        gaps.push(
            GapCategory::Policy,
            GapSeverity::Low,
            optional,
            format!("{optional} optional policies not yet published"),
        );

        let p = &scores.policies;
        if p.expected_acknowledgments > 0 && p.acknowledgment_rate < LOW_ACKNOWLEDGMENT_RATE {
            let missing = p.expected_acknowledgments - p.acknowledged;
            gaps.push(
                GapCategory::Acknowledgment,
                GapSeverity::Critical,
                missing,
                format!(
                    "Policy acknowledgment rate at {:.1}% ({missing} acknowledgments outstanding)",
                    p.acknowledgment_rate
                ),
            );
        }

        let c = &scores.controls;
        if c.total > 0 {
            let ratio = c.not_implemented as f64 / c.total as f64;
            let severity = if ratio > CONTROL_GAP_CRITICAL_RATIO {
                GapSeverity::Critical
            } else {
                GapSeverity::Medium
            };
            gaps.push(
                GapCategory::Control,
                severity,
                c.not_implemented,
                format!("{} controls not implemented", c.not_implemented),
            );
            gaps.push(
                GapCategory::Control,
                GapSeverity::Low,
                c.partial,
                format!("{} controls partially implemented", c.partial),
            );
        }

        let a = &scores.assets;
        if a.total > 0 && a.compliance_percentage < ASSET_COMPLIANCE_TARGET {
            gaps.push(
                GapCategory::Asset,
                GapSeverity::Medium,
                a.total - a.compliant,
                format!(
                    "Asset compliance at {:.1}%, below the {:.0}% target",
                    a.compliance_percentage, ASSET_COMPLIANCE_TARGET
                ),
            );
        }

        gaps
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::compliance::scoring::tests::{control, policy};
    use crate::domain::control::ImplementationStatus;
    use crate::domain::policy::PolicyAssignment;
    use chrono::Utc;
    use uuid::Uuid;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 6, 30).unwrap()
    }

    #[test]
    fn test_no_gaps_on_empty_dataset() {
        let dataset = ComplianceDataset::default();
        let scores = ComplianceScores::compute(&dataset);
        let gaps = GapAnalysis::identify(&dataset, &scores, today());
        assert_eq!(gaps, GapAnalysis::default());
    }

    #[test]
    fn test_mandatory_overdue_is_critical() {
        let mut overdue = policy(PolicyStatus::Draft);
        overdue.is_mandatory = true;
        overdue.next_review_date = NaiveDate::from_ymd_opt(2026, 1, 1);
        let mut mandatory = policy(PolicyStatus::InReview);
        mandatory.is_mandatory = true;
        let optional = policy(PolicyStatus::Approved);

        let dataset = ComplianceDataset {
            policies: vec![overdue, mandatory, optional, policy(PolicyStatus::Archived)],
            ..Default::default()
        };
        let scores = ComplianceScores::compute(&dataset);
        let gaps = GapAnalysis::identify(&dataset, &scores, today());

        assert_eq!((gaps.critical, gaps.medium, gaps.low), (1, 1, 1));
        assert!(gaps.details.iter().all(|g| g.affected_count == 1));
        assert_eq!(gaps.details[0].severity, GapSeverity::Critical);
    }

    #[test]
    fn test_low_acknowledgment_is_critical() {
        let published = policy(PolicyStatus::Published);
        let now = Utc::now();
        let mut acked = PolicyAssignment::new(published.id, Uuid::new_v4(), None, now);
        acked.acknowledge(now);
        let assignments = vec![
            acked,
            PolicyAssignment::new(published.id, Uuid::new_v4(), None, now),
            PolicyAssignment::new(published.id, Uuid::new_v4(), None, now),
        ];
        let dataset = ComplianceDataset {
            policies: vec![published],
            assignments,
            ..Default::default()
        };
        let scores = ComplianceScores::compute(&dataset);
        let gaps = GapAnalysis::identify(&dataset, &scores, today());

        let ack = gaps
            .details
            .iter()
            .find(|g| g.category == GapCategory::Acknowledgment)
            .unwrap();
        assert_eq!(ack.severity, GapSeverity::Critical);
        assert_eq!(ack.affected_count, 2);
    }

    #[test]
    fn test_control_ratio_decides_severity() {
        // 1 of 10 not implemented: 10% stays medium
        let mut controls: Vec<_> = (0..9)
            .map(|_| control(ImplementationStatus::Implemented))
            .collect();
        controls.push(control(ImplementationStatus::Planned));
        let dataset = ComplianceDataset {
            controls,
            ..Default::default()
        };
        let scores = ComplianceScores::compute(&dataset);
        let gaps = GapAnalysis::identify(&dataset, &scores, today());
        assert_eq!((gaps.critical, gaps.medium, gaps.low), (0, 1, 0));

        // 3 of 10 not implemented plus 2 in progress
        let mut controls: Vec<_> = (0..5)
            .map(|_| control(ImplementationStatus::Implemented))
            .collect();
        controls.extend((0..2).map(|_| control(ImplementationStatus::InProgress)));
        controls.extend((0..3).map(|_| control(ImplementationStatus::NotImplemented)));
        let dataset = ComplianceDataset {
            controls,
            ..Default::default()
        };
        let scores = ComplianceScores::compute(&dataset);
        let gaps = GapAnalysis::identify(&dataset, &scores, today());
        assert_eq!((gaps.critical, gaps.medium, gaps.low), (1, 0, 1));
    }
}

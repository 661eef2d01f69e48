// grc-core/src/domain/compliance/dataset.rs

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::control::{ControlAssetMapping, UnifiedControl};
use crate::domain::policy::{Policy, PolicyAssignment};

/// Rows the scoring functions work on. Loaded once per report.
#[derive(Debug, Clone, Default)]
pub struct ComplianceDataset {
    pub policies: Vec<Policy>,
    pub assignments: Vec<PolicyAssignment>,
    pub controls: Vec<UnifiedControl>,
    pub mappings: Vec<ControlAssetMapping>,
}

impl ComplianceDataset {
    /// Drops rows created after `cutoff` and rows already deleted by then.
    /// Assignments and mappings follow their parent, so orphans disappear too.
    pub fn as_of(self, cutoff: DateTime<Utc>) -> Self {
        let live = |deleted_at: Option<DateTime<Utc>>| deleted_at.is_none_or(|at| at > cutoff);
        let policies: Vec<Policy> = self
            .policies
            .into_iter()
            .filter(|p| live(p.deleted_at) && p.created_at <= cutoff)
            .collect();
        let policy_ids: HashSet<Uuid> = policies.iter().map(|p| p.id).collect();

        let assignments = self
            .assignments
            .into_iter()
            .filter(|a| a.assigned_at <= cutoff && policy_ids.contains(&a.policy_id))
            .map(|mut a| {
                if !a.acknowledged_as_of(cutoff) {
                    a.acknowledged = false;
                    a.acknowledged_at = None;
                }
                a
            })
            .collect();

        let controls: Vec<UnifiedControl> = self
            .controls
            .into_iter()
            .filter(|c| live(c.deleted_at) && c.created_at <= cutoff)
            .collect();
        let control_ids: HashSet<Uuid> = controls.iter().map(|c| c.id).collect();

        let mappings = self
            .mappings
            .into_iter()
            .filter(|m| {
                live(m.deleted_at) && m.mapped_at <= cutoff && control_ids.contains(&m.control_id)
            })
            .collect();

        Self {
            policies,
            assignments,
            controls,
            mappings,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty() && self.controls.is_empty() && self.mappings.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::compliance::scoring::tests::{control, mapping, policy};
    use crate::domain::control::ImplementationStatus;
    use crate::domain::policy::PolicyStatus;
    use chrono::Duration;

    #[test]
    fn test_rows_deleted_after_cutoff_still_count() {
        let cutoff = Utc::now();
        let mut deleted_later = control(ImplementationStatus::Implemented);
        deleted_later.created_at = cutoff - Duration::days(10);
        deleted_later.deleted_at = Some(cutoff + Duration::days(1));
        let mut deleted_before = control(ImplementationStatus::Implemented);
        deleted_before.created_at = cutoff - Duration::days(10);
        deleted_before.deleted_at = Some(cutoff - Duration::days(1));

        let mut kept_mapping = mapping(
            deleted_later.id,
            Uuid::new_v4(),
            ImplementationStatus::Implemented,
            None,
        );
        kept_mapping.mapped_at = cutoff - Duration::days(5);
        kept_mapping.deleted_at = deleted_later.deleted_at;

        let mut retired_policy = policy(PolicyStatus::Published);
        retired_policy.created_at = cutoff - Duration::days(10);
        retired_policy.deleted_at = Some(cutoff);

        let dataset = ComplianceDataset {
            policies: vec![retired_policy],
            controls: vec![deleted_later.clone(), deleted_before],
            mappings: vec![kept_mapping],
            ..Default::default()
        }
        .as_of(cutoff);

        assert_eq!(dataset.controls.len(), 1);
        assert_eq!(dataset.controls[0].id, deleted_later.id);
        assert_eq!(dataset.mappings.len(), 1);
        // Deleted at the cutoff itself: gone
        assert!(dataset.policies.is_empty());
    }
}

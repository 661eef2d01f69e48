// grc-core/src/domain/control/objective.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::status::ImplementationStatus;

/// Policy-derived requirement, optionally linked to unified controls.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ControlObjective {
    pub id: Uuid,
    pub policy_id: Uuid,
    pub objective_identifier: String,
    pub title: String,
    pub responsible_party_id: Option<Uuid>,
    pub implementation_status: ImplementationStatus,
    pub linked_control_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl ControlObjective {
    pub fn from_request(request: CreateObjectiveRequest, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            policy_id: request.policy_id,
            objective_identifier: request.objective_identifier,
            title: request.title,
            responsible_party_id: request.responsible_party_id,
            implementation_status: request.implementation_status.unwrap_or_default(),
            linked_control_ids: Vec::new(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    /// Adds ids not already linked. Returns how many were added.
    pub fn link(&mut self, control_ids: &[Uuid]) -> usize {
        let before = self.linked_control_ids.len();
        for id in control_ids {
            if !self.linked_control_ids.contains(id) {
                self.linked_control_ids.push(*id);
            }
        }
        self.linked_control_ids.len() - before
    }

    pub fn unlink(&mut self, control_ids: &[Uuid]) -> usize {
        let before = self.linked_control_ids.len();
        self.linked_control_ids.retain(|id| !control_ids.contains(id));
        before - self.linked_control_ids.len()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateObjectiveRequest {
    pub policy_id: Uuid,
    #[validate(length(min = 1, max = 50))]
    pub objective_identifier: String,
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[serde(default)]
    pub responsible_party_id: Option<Uuid>,
    #[serde(default)]
    pub implementation_status: Option<ImplementationStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default)]
pub struct UpdateObjectiveRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    pub responsible_party_id: Option<Uuid>,
    pub implementation_status: Option<ImplementationStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_and_unlink() {
        let mut objective = ControlObjective::from_request(
            CreateObjectiveRequest {
                policy_id: Uuid::new_v4(),
                objective_identifier: "CO-1".into(),
                title: "Access reviews".into(),
                responsible_party_id: None,
                implementation_status: None,
            },
            Utc::now(),
        );
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(objective.link(&[a, b, a]), 2);
        assert_eq!(objective.link(&[a]), 0);
        assert_eq!(objective.unlink(&[a, Uuid::new_v4()]), 1);
        assert_eq!(objective.linked_control_ids, vec![b]);
    }
}

// grc-core/src/domain/policy/assignment.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A published policy handed to a user who has to acknowledge it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PolicyAssignment {
    pub id: Uuid,
    pub policy_id: Uuid,
    pub user_id: Uuid,
    pub assigned_by: Option<Uuid>,
    pub assigned_at: DateTime<Utc>,
    pub acknowledged: bool,
    pub acknowledged_at: Option<DateTime<Utc>>,
    pub notification_sent: bool,
}

impl PolicyAssignment {
    pub fn new(policy_id: Uuid, user_id: Uuid, assigned_by: Option<Uuid>, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            policy_id,
            user_id,
            assigned_by,
            assigned_at: now,
            acknowledged: false,
            acknowledged_at: None,
            notification_sent: false,
        }
    }

    /// Returns false when the assignment was already acknowledged.
    pub fn acknowledge(&mut self, now: DateTime<Utc>) -> bool {
        if self.acknowledged {
            return false;
        }
        self.acknowledged = true;
        self.acknowledged_at = Some(now);
        true
    }

    /// Acknowledgments recorded after `as_of` don't count for that point in time.
    pub fn acknowledged_as_of(&self, as_of: DateTime<Utc>) -> bool {
        self.acknowledged && self.acknowledged_at.is_none_or(|at| at <= as_of)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_acknowledge_is_idempotent() {
        let now = Utc::now();
        let mut a = PolicyAssignment::new(Uuid::new_v4(), Uuid::new_v4(), None, now);
        assert!(a.acknowledge(now));
        assert!(!a.acknowledge(now + Duration::hours(1)));
        assert_eq!(a.acknowledged_at, Some(now));
    }

    #[test]
    fn test_acknowledged_as_of() {
        let now = Utc::now();
        let mut a = PolicyAssignment::new(Uuid::new_v4(), Uuid::new_v4(), None, now);
        a.acknowledge(now);
        assert!(a.acknowledged_as_of(now));
        assert!(!a.acknowledged_as_of(now - Duration::days(1)));
    }
}

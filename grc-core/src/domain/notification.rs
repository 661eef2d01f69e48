// grc-core/src/domain/notification.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NotificationPriority {
    Low,
    #[default]
    Medium,
    High,
}

str_enum!(NotificationPriority {
    Low => "low",
    Medium => "medium",
    High => "high",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Policy,
    PolicyApproval,
    ControlObjective,
    ComplianceReport,
}

str_enum!(EntityType {
    Policy => "policy",
    PolicyApproval => "policy_approval",
    ControlObjective => "control_objective",
    ComplianceReport => "compliance_report",
});

/// Message addressed to one user. The notifier decides how it is delivered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub message: String,
    pub priority: NotificationPriority,
    pub entity_type: Option<EntityType>,
    pub entity_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub read: bool,
}

impl Notification {
    pub fn new(user_id: Uuid, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            title: title.into(),
            message: message.into(),
            priority: NotificationPriority::default(),
            entity_type: None,
            entity_id: None,
            created_at: Utc::now(),
            read: false,
        }
    }

    pub fn with_priority(mut self, priority: NotificationPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn about(mut self, entity_type: EntityType, entity_id: Uuid) -> Self {
        self.entity_type = Some(entity_type);
        self.entity_id = Some(entity_id);
        self
    }
}

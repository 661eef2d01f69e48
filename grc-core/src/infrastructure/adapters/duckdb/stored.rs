// grc-core/src/infrastructure/adapters/duckdb/stored.rs

use chrono::{DateTime, Datelike, SecondsFormat, Utc};
use duckdb::types::Value;
use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::domain::User;
use crate::domain::compliance::ComplianceReport;
use crate::domain::control::{ControlAssetMapping, ControlObjective, UnifiedControl};
use crate::domain::notification::Notification;
use crate::domain::policy::{Policy, PolicyApproval, PolicyAssignment, PolicyVersion};
use crate::domain::schedule::ReportSchedule;

pub fn ts(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn text(s: impl Into<String>) -> Value {
    Value::Text(s.into())
}

fn opt_text(s: Option<String>) -> Value {
    s.map(Value::Text).unwrap_or(Value::Null)
}

/// How an entity maps onto its table.
pub trait Stored: Serialize + DeserializeOwned {
    const TABLE: &'static str;
    const ENTITY: &'static str;
    /// Tables with a `deleted_at` tombstone.
    const SOFT_DELETE: bool = false;

    fn id(&self) -> Uuid;
    /// Indexed columns, excluding `id` and `body`.
    fn columns(&self) -> Vec<(&'static str, Value)>;
}

impl Stored for User {
    const TABLE: &'static str = "users";
    const ENTITY: &'static str = "User";

    fn id(&self) -> Uuid {
        self.id
    }

    fn columns(&self) -> Vec<(&'static str, Value)> {
        vec![("email", text(&self.email))]
    }
}

impl Stored for Policy {
    const TABLE: &'static str = "policies";
    const ENTITY: &'static str = "Policy";
    const SOFT_DELETE: bool = true;

    fn id(&self) -> Uuid {
        self.id
    }

    fn columns(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("identifier", text(&self.identifier)),
            ("title", text(&self.title)),
            ("status", text(self.status.as_str())),
            ("owner_id", opt_text(self.owner_id.map(|id| id.to_string()))),
            ("created_year", Value::Int(self.created_at.year())),
            ("created_at", text(ts(self.created_at))),
            ("deleted_at", opt_text(self.deleted_at.map(ts))),
        ]
    }
}

impl Stored for PolicyAssignment {
    const TABLE: &'static str = "policy_assignments";
    const ENTITY: &'static str = "PolicyAssignment";

    fn id(&self) -> Uuid {
        self.id
    }

    fn columns(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("policy_id", text(self.policy_id.to_string())),
            ("user_id", text(self.user_id.to_string())),
        ]
    }
}

impl Stored for PolicyApproval {
    const TABLE: &'static str = "policy_approvals";
    const ENTITY: &'static str = "PolicyApproval";

    fn id(&self) -> Uuid {
        self.id
    }

    fn columns(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("policy_id", text(self.policy_id.to_string())),
            ("approver_id", text(self.approver_id.to_string())),
            ("status", text(self.status.as_str())),
            ("sequence_order", Value::Int(self.sequence_order as i32)),
            ("created_at", text(ts(self.created_at))),
        ]
    }
}

impl Stored for PolicyVersion {
    const TABLE: &'static str = "policy_versions";
    const ENTITY: &'static str = "PolicyVersion";

    fn id(&self) -> Uuid {
        self.id
    }

    fn columns(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("policy_id", text(self.policy_id.to_string())),
            ("version_number", Value::Int(self.version_number as i32)),
            ("created_at", text(ts(self.created_at))),
        ]
    }
}

impl Stored for UnifiedControl {
    const TABLE: &'static str = "unified_controls";
    const ENTITY: &'static str = "UnifiedControl";
    const SOFT_DELETE: bool = true;

    fn id(&self) -> Uuid {
        self.id
    }

    fn columns(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("identifier", text(&self.identifier)),
            ("created_at", text(ts(self.created_at))),
            ("deleted_at", opt_text(self.deleted_at.map(ts))),
        ]
    }
}

impl Stored for ControlAssetMapping {
    const TABLE: &'static str = "control_asset_mappings";
    const ENTITY: &'static str = "ControlAssetMapping";
    const SOFT_DELETE: bool = true;

    fn id(&self) -> Uuid {
        self.id
    }

    fn columns(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("control_id", text(self.control_id.to_string())),
            ("mapped_at", text(ts(self.mapped_at))),
            ("deleted_at", opt_text(self.deleted_at.map(ts))),
        ]
    }
}

impl Stored for ControlObjective {
    const TABLE: &'static str = "control_objectives";
    const ENTITY: &'static str = "ControlObjective";
    const SOFT_DELETE: bool = true;

    fn id(&self) -> Uuid {
        self.id
    }

    fn columns(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("policy_id", text(self.policy_id.to_string())),
            ("created_at", text(ts(self.created_at))),
            ("deleted_at", opt_text(self.deleted_at.map(ts))),
        ]
    }
}

impl Stored for ComplianceReport {
    const TABLE: &'static str = "compliance_reports";
    const ENTITY: &'static str = "ComplianceReport";

    fn id(&self) -> Uuid {
        self.id
    }

    fn columns(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("report_period", text(self.report_period.as_str())),
            ("period_start_date", text(self.period_start_date.to_string())),
            ("period_end_date", text(self.period_end_date.to_string())),
            (
                "overall_compliance_rating",
                text(self.overall_compliance_rating.as_str()),
            ),
            ("is_archived", Value::Boolean(self.is_archived)),
            ("generated_at", text(ts(self.generated_at))),
        ]
    }
}

impl Stored for ReportSchedule {
    const TABLE: &'static str = "report_schedules";
    const ENTITY: &'static str = "ReportSchedule";

    fn id(&self) -> Uuid {
        self.id
    }

    fn columns(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("is_active", Value::Boolean(self.is_active)),
            ("created_at", text(ts(self.created_at))),
        ]
    }
}

impl Stored for Notification {
    const TABLE: &'static str = "notifications";
    const ENTITY: &'static str = "Notification";

    fn id(&self) -> Uuid {
        self.id
    }

    fn columns(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("user_id", text(self.user_id.to_string())),
            ("is_read", Value::Boolean(self.read)),
            ("created_at", text(ts(self.created_at))),
        ]
    }
}

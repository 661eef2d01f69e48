// grc-core/src/ports/repository.rs

// Storage contracts. Every read filters tombstoned rows unless the method says otherwise.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::domain::compliance::{ComplianceReport, ReportFilter, ReportPeriod};
use crate::domain::control::{ControlAssetMapping, ControlObjective, UnifiedControl};
use crate::domain::policy::{
    PolicyApproval, PolicyAssignment, Policy, PolicyFilter, PolicyVersion, ReminderThreshold,
};
use crate::domain::schedule::ReportSchedule;
use crate::domain::{Page, User, Window};
use crate::error::GrcError;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn save_user(&self, user: &User) -> Result<(), GrcError>;
    async fn get_user(&self, id: Uuid) -> Result<Option<User>, GrcError>;
    async fn list_users(&self) -> Result<Vec<User>, GrcError>;
}

#[async_trait]
pub trait PolicyRepository: Send + Sync {
    async fn insert_policy(&self, policy: &Policy) -> Result<(), GrcError>;
    async fn update_policy(&self, policy: &Policy) -> Result<(), GrcError>;
    async fn get_policy(&self, id: Uuid) -> Result<Option<Policy>, GrcError>;
    async fn list_policies(&self, filter: &PolicyFilter, window: Window) -> Result<Page<Policy>, GrcError>;
    /// Every non-deleted policy, archived ones included.
    async fn all_policies(&self) -> Result<Vec<Policy>, GrcError>;
    /// Policies created by `cutoff` and not yet deleted at that instant.
    async fn policies_as_of(&self, cutoff: DateTime<Utc>) -> Result<Vec<Policy>, GrcError>;
    /// Counts deleted rows too, so identifiers are never reused.
    async fn count_policies_created_in(&self, year: i32) -> Result<u64, GrcError>;
    /// Tombstones the policy and its control objectives in one transaction.
    async fn soft_delete_policy(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), GrcError>;
}

#[async_trait]
pub trait AssignmentRepository: Send + Sync {
    async fn insert_assignment(&self, assignment: &PolicyAssignment) -> Result<(), GrcError>;
    async fn update_assignment(&self, assignment: &PolicyAssignment) -> Result<(), GrcError>;
    async fn find_assignment(
        &self,
        policy_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<PolicyAssignment>, GrcError>;
    async fn assignments_for_policy(&self, policy_id: Uuid) -> Result<Vec<PolicyAssignment>, GrcError>;
    async fn all_assignments(&self) -> Result<Vec<PolicyAssignment>, GrcError>;
}

#[async_trait]
pub trait ApprovalRepository: Send + Sync {
    async fn insert_approval(&self, approval: &PolicyApproval) -> Result<(), GrcError>;
    async fn update_approval(&self, approval: &PolicyApproval) -> Result<(), GrcError>;
    async fn get_approval(&self, id: Uuid) -> Result<Option<PolicyApproval>, GrcError>;
    /// Ordered by sequence, then creation time.
    async fn approvals_for_policy(&self, policy_id: Uuid) -> Result<Vec<PolicyApproval>, GrcError>;
    /// The approver's step that has not been revoked, if any.
    async fn find_approval(
        &self,
        policy_id: Uuid,
        approver_id: Uuid,
    ) -> Result<Option<PolicyApproval>, GrcError>;
    async fn pending_approvals(&self, approver_id: Option<Uuid>) -> Result<Vec<PolicyApproval>, GrcError>;
}

#[async_trait]
pub trait VersionRepository: Send + Sync {
    async fn insert_version(&self, version: &PolicyVersion) -> Result<(), GrcError>;
    async fn get_version(&self, id: Uuid) -> Result<Option<PolicyVersion>, GrcError>;
    /// Newest first.
    async fn versions_for_policy(&self, policy_id: Uuid) -> Result<Vec<PolicyVersion>, GrcError>;
    async fn delete_version(&self, id: Uuid) -> Result<(), GrcError>;
}

#[async_trait]
pub trait ControlRepository: Send + Sync {
    async fn insert_control(&self, control: &UnifiedControl) -> Result<(), GrcError>;
    async fn update_control(&self, control: &UnifiedControl) -> Result<(), GrcError>;
    async fn get_control(&self, id: Uuid) -> Result<Option<UnifiedControl>, GrcError>;
    async fn all_controls(&self) -> Result<Vec<UnifiedControl>, GrcError>;
    /// Controls created by `cutoff` and not yet deleted at that instant.
    async fn controls_as_of(&self, cutoff: DateTime<Utc>) -> Result<Vec<UnifiedControl>, GrcError>;
    /// Counts deleted rows too.
    async fn count_controls(&self) -> Result<u64, GrcError>;
    /// Tombstones the control and its asset mappings in one transaction.
    async fn soft_delete_control(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), GrcError>;

    async fn insert_mapping(&self, mapping: &ControlAssetMapping) -> Result<(), GrcError>;
    async fn update_mapping(&self, mapping: &ControlAssetMapping) -> Result<(), GrcError>;
    async fn get_mapping(&self, id: Uuid) -> Result<Option<ControlAssetMapping>, GrcError>;
    async fn all_mappings(&self) -> Result<Vec<ControlAssetMapping>, GrcError>;
    async fn mappings_as_of(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<ControlAssetMapping>, GrcError>;
}

#[async_trait]
pub trait ObjectiveRepository: Send + Sync {
    async fn insert_objective(&self, objective: &ControlObjective) -> Result<(), GrcError>;
    async fn update_objective(&self, objective: &ControlObjective) -> Result<(), GrcError>;
    async fn get_objective(&self, id: Uuid) -> Result<Option<ControlObjective>, GrcError>;
    async fn objectives_for_policy(&self, policy_id: Uuid) -> Result<Vec<ControlObjective>, GrcError>;
}

#[async_trait]
pub trait ReportRepository: Send + Sync {
    async fn insert_report(&self, report: &ComplianceReport) -> Result<(), GrcError>;
    async fn update_report(&self, report: &ComplianceReport) -> Result<(), GrcError>;
    async fn get_report(&self, id: Uuid) -> Result<Option<ComplianceReport>, GrcError>;
    /// Newest `generated_at` first.
    async fn list_reports(
        &self,
        filter: &ReportFilter,
        window: Window,
    ) -> Result<Page<ComplianceReport>, GrcError>;
    async fn latest_report(&self) -> Result<Option<ComplianceReport>, GrcError>;
    /// Up to `limit` non-archived `period` reports starting before `before`, latest first.
    async fn report_history(
        &self,
        period: ReportPeriod,
        before: NaiveDate,
        limit: usize,
    ) -> Result<Vec<ComplianceReport>, GrcError>;
    async fn report_exists(
        &self,
        period: ReportPeriod,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<bool, GrcError>;
}

#[async_trait]
pub trait ScheduleRepository: Send + Sync {
    async fn insert_schedule(&self, schedule: &ReportSchedule) -> Result<(), GrcError>;
    async fn update_schedule(&self, schedule: &ReportSchedule) -> Result<(), GrcError>;
    async fn all_schedules(&self) -> Result<Vec<ReportSchedule>, GrcError>;
}

#[async_trait]
pub trait ReminderLog: Send + Sync {
    /// Returns false when this reminder was already recorded for that day.
    async fn record_reminder(
        &self,
        policy_id: Uuid,
        on: NaiveDate,
        threshold: ReminderThreshold,
    ) -> Result<bool, GrcError>;
}

/// One handle for every repository, which is what the services hold.
pub trait GrcStore:
    UserRepository
    + PolicyRepository
    + AssignmentRepository
    + ApprovalRepository
    + VersionRepository
    + ControlRepository
    + ObjectiveRepository
    + ReportRepository
    + ScheduleRepository
    + ReminderLog
{
}

impl<T> GrcStore for T where
    T: UserRepository
        + PolicyRepository
        + AssignmentRepository
        + ApprovalRepository
        + VersionRepository
        + ControlRepository
        + ObjectiveRepository
        + ReportRepository
        + ScheduleRepository
        + ReminderLog
{
}

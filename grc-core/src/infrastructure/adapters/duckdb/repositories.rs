// grc-core/src/infrastructure/adapters/duckdb/repositories.rs

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use duckdb::types::Value;
use tracing::{debug, instrument};
use uuid::Uuid;

use super::stored::ts;
use super::{DuckDbStore, count_rows, select_bodies, text, update_row};
use crate::domain::compliance::{ComplianceReport, ReportFilter, ReportPeriod};
use crate::domain::control::{ControlAssetMapping, ControlObjective, UnifiedControl};
use crate::domain::policy::{
    Policy, PolicyApproval, PolicyAssignment, PolicyFilter, PolicyVersion, ReminderThreshold,
};
use crate::domain::schedule::ReportSchedule;
use crate::domain::{DomainError, Page, User, Window};
use crate::error::GrcError;
use crate::infrastructure::error::DatabaseError;
use crate::ports::repository::*;

fn page_clause(window: Window) -> String {
    format!(" LIMIT {} OFFSET {}", window.take, window.skip)
}

fn where_clause(conditions: &[String]) -> String {
    if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    }
}

#[async_trait]
impl UserRepository for DuckDbStore {
    async fn save_user(&self, user: &User) -> Result<(), GrcError> {
        if self.get::<User>(user.id)?.is_some() {
            self.update(user)
        } else {
            self.insert(user)
        }
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, GrcError> {
        self.get(id)
    }

    async fn list_users(&self) -> Result<Vec<User>, GrcError> {
        self.select("SELECT body FROM users ORDER BY email", &[])
    }
}

#[async_trait]
impl PolicyRepository for DuckDbStore {
    async fn insert_policy(&self, policy: &Policy) -> Result<(), GrcError> {
        self.insert(policy)
    }

    async fn update_policy(&self, policy: &Policy) -> Result<(), GrcError> {
        self.update(policy)
    }

    async fn get_policy(&self, id: Uuid) -> Result<Option<Policy>, GrcError> {
        self.get(id)
    }

    #[instrument(skip(self))]
    async fn list_policies(&self, filter: &PolicyFilter, window: Window) -> Result<Page<Policy>, GrcError> {
        let mut conditions = vec!["deleted_at IS NULL".to_string()];
        let mut params = Vec::new();
        if let Some(status) = filter.status {
            conditions.push("status = ?".into());
            params.push(text(status.as_str()));
        }
        if let Some(owner) = filter.owner_id {
            conditions.push("owner_id = ?".into());
            params.push(text(owner));
        }
        if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
            conditions.push("(lower(title) LIKE ? OR lower(identifier) LIKE ?)".into());
            let pattern = format!("%{}%", search.trim().to_lowercase());
            params.push(text(&pattern));
            params.push(text(&pattern));
        }
        let filter_sql = where_clause(&conditions);

        let total = self.count(&format!("SELECT COUNT(*) FROM policies{}", filter_sql), &params)?;
        let data = self.select(
            &format!(
                "SELECT body FROM policies{} ORDER BY created_at DESC{}",
                filter_sql,
                page_clause(window)
            ),
            &params,
        )?;
        Ok(Page { data, total })
    }

    async fn all_policies(&self) -> Result<Vec<Policy>, GrcError> {
        self.select(
            "SELECT body FROM policies WHERE deleted_at IS NULL ORDER BY created_at",
            &[],
        )
    }

    async fn policies_as_of(&self, cutoff: DateTime<Utc>) -> Result<Vec<Policy>, GrcError> {
        self.select(
            "SELECT body FROM policies \
             WHERE created_at <= ? AND (deleted_at IS NULL OR deleted_at > ?) ORDER BY created_at",
            &[text(ts(cutoff)), text(ts(cutoff))],
        )
    }

    async fn count_policies_created_in(&self, year: i32) -> Result<u64, GrcError> {
        self.count(
            "SELECT COUNT(*) FROM policies WHERE created_year = ?",
            &[Value::Int(year)],
        )
    }

    #[instrument(skip(self))]
    async fn soft_delete_policy(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), GrcError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(DatabaseError::DuckDB)?;

        let mut policy: Policy = select_bodies(
            &tx,
            "SELECT body FROM policies WHERE id = ? AND deleted_at IS NULL",
            &[text(id)],
        )?
        .into_iter()
        .next()
        .ok_or_else(|| DomainError::not_found("Policy", id))?;
        policy.deleted_at = Some(at);
        policy.updated_at = at;
        update_row(&tx, &policy)?;

        let objectives: Vec<ControlObjective> = select_bodies(
            &tx,
            "SELECT body FROM control_objectives WHERE policy_id = ? AND deleted_at IS NULL",
            &[text(id)],
        )?;
        let cascaded = objectives.len();
        for mut objective in objectives {
            objective.deleted_at = Some(at);
            objective.updated_at = at;
            update_row(&tx, &objective)?;
        }

        tx.commit().map_err(DatabaseError::DuckDB)?;
        debug!(policy = %id, objectives = cascaded, "Policy soft-deleted");
        Ok(())
    }
}

#[async_trait]
impl AssignmentRepository for DuckDbStore {
    async fn insert_assignment(&self, assignment: &PolicyAssignment) -> Result<(), GrcError> {
        self.insert(assignment)
    }

    async fn update_assignment(&self, assignment: &PolicyAssignment) -> Result<(), GrcError> {
        self.update(assignment)
    }

    async fn find_assignment(
        &self,
        policy_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<PolicyAssignment>, GrcError> {
        Ok(self
            .select(
                "SELECT body FROM policy_assignments WHERE policy_id = ? AND user_id = ?",
                &[text(policy_id), text(user_id)],
            )?
            .into_iter()
            .next())
    }

    async fn assignments_for_policy(&self, policy_id: Uuid) -> Result<Vec<PolicyAssignment>, GrcError> {
        self.select(
            "SELECT body FROM policy_assignments WHERE policy_id = ?",
            &[text(policy_id)],
        )
    }

    async fn all_assignments(&self) -> Result<Vec<PolicyAssignment>, GrcError> {
        self.select("SELECT body FROM policy_assignments", &[])
    }
}

#[async_trait]
impl ApprovalRepository for DuckDbStore {
    async fn insert_approval(&self, approval: &PolicyApproval) -> Result<(), GrcError> {
        self.insert(approval)
    }

    async fn update_approval(&self, approval: &PolicyApproval) -> Result<(), GrcError> {
        self.update(approval)
    }

    async fn get_approval(&self, id: Uuid) -> Result<Option<PolicyApproval>, GrcError> {
        self.get(id)
    }

    async fn approvals_for_policy(&self, policy_id: Uuid) -> Result<Vec<PolicyApproval>, GrcError> {
        self.select(
            "SELECT body FROM policy_approvals WHERE policy_id = ? ORDER BY sequence_order, created_at",
            &[text(policy_id)],
        )
    }

    async fn find_approval(
        &self,
        policy_id: Uuid,
        approver_id: Uuid,
    ) -> Result<Option<PolicyApproval>, GrcError> {
        Ok(self
            .select(
                "SELECT body FROM policy_approvals \
                 WHERE policy_id = ? AND approver_id = ? AND status <> 'revoked'",
                &[text(policy_id), text(approver_id)],
            )?
            .into_iter()
            .next())
    }

    async fn pending_approvals(&self, approver_id: Option<Uuid>) -> Result<Vec<PolicyApproval>, GrcError> {
        match approver_id {
            Some(approver) => self.select(
                "SELECT body FROM policy_approvals WHERE status = 'pending' AND approver_id = ? \
                 ORDER BY created_at",
                &[text(approver)],
            ),
            None => self.select(
                "SELECT body FROM policy_approvals WHERE status = 'pending' ORDER BY created_at",
                &[],
            ),
        }
    }
}

#[async_trait]
impl VersionRepository for DuckDbStore {
    async fn insert_version(&self, version: &PolicyVersion) -> Result<(), GrcError> {
        self.insert(version)
    }

    async fn get_version(&self, id: Uuid) -> Result<Option<PolicyVersion>, GrcError> {
        self.get(id)
    }

    async fn versions_for_policy(&self, policy_id: Uuid) -> Result<Vec<PolicyVersion>, GrcError> {
        self.select(
            "SELECT body FROM policy_versions WHERE policy_id = ? ORDER BY version_number DESC",
            &[text(policy_id)],
        )
    }

    async fn delete_version(&self, id: Uuid) -> Result<(), GrcError> {
        let conn = self.lock()?;
        let removed = conn
            .execute("DELETE FROM policy_versions WHERE id = ?", [id.to_string()])
            .map_err(DatabaseError::DuckDB)?;
        if removed == 0 {
            return Err(DomainError::not_found("PolicyVersion", id).into());
        }
        Ok(())
    }
}

#[async_trait]
impl ControlRepository for DuckDbStore {
    async fn insert_control(&self, control: &UnifiedControl) -> Result<(), GrcError> {
        self.insert(control)
    }

    async fn update_control(&self, control: &UnifiedControl) -> Result<(), GrcError> {
        self.update(control)
    }

    async fn get_control(&self, id: Uuid) -> Result<Option<UnifiedControl>, GrcError> {
        self.get(id)
    }

    async fn all_controls(&self) -> Result<Vec<UnifiedControl>, GrcError> {
        self.select(
            "SELECT body FROM unified_controls WHERE deleted_at IS NULL ORDER BY identifier",
            &[],
        )
    }

    async fn controls_as_of(&self, cutoff: DateTime<Utc>) -> Result<Vec<UnifiedControl>, GrcError> {
        self.select(
            "SELECT body FROM unified_controls \
             WHERE created_at <= ? AND (deleted_at IS NULL OR deleted_at > ?) ORDER BY identifier",
            &[text(ts(cutoff)), text(ts(cutoff))],
        )
    }

    async fn count_controls(&self) -> Result<u64, GrcError> {
        self.count("SELECT COUNT(*) FROM unified_controls", &[])
    }

    #[instrument(skip(self))]
    async fn soft_delete_control(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), GrcError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(DatabaseError::DuckDB)?;

        let mut control: UnifiedControl = select_bodies(
            &tx,
            "SELECT body FROM unified_controls WHERE id = ? AND deleted_at IS NULL",
            &[text(id)],
        )?
        .into_iter()
        .next()
        .ok_or_else(|| DomainError::not_found("UnifiedControl", id))?;
        control.deleted_at = Some(at);
        control.updated_at = at;
        update_row(&tx, &control)?;

        let mappings: Vec<ControlAssetMapping> = select_bodies(
            &tx,
            "SELECT body FROM control_asset_mappings WHERE control_id = ? AND deleted_at IS NULL",
            &[text(id)],
        )?;
        for mut mapping in mappings {
            mapping.deleted_at = Some(at);
            update_row(&tx, &mapping)?;
        }

        tx.commit().map_err(DatabaseError::DuckDB)?;
        Ok(())
    }

    async fn insert_mapping(&self, mapping: &ControlAssetMapping) -> Result<(), GrcError> {
        self.insert(mapping)
    }

    async fn update_mapping(&self, mapping: &ControlAssetMapping) -> Result<(), GrcError> {
        self.update(mapping)
    }

    async fn get_mapping(&self, id: Uuid) -> Result<Option<ControlAssetMapping>, GrcError> {
        self.get(id)
    }

    async fn all_mappings(&self) -> Result<Vec<ControlAssetMapping>, GrcError> {
        self.select(
            "SELECT body FROM control_asset_mappings WHERE deleted_at IS NULL ORDER BY mapped_at",
            &[],
        )
    }

    async fn mappings_as_of(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<ControlAssetMapping>, GrcError> {
        self.select(
            "SELECT body FROM control_asset_mappings \
             WHERE mapped_at <= ? AND (deleted_at IS NULL OR deleted_at > ?) ORDER BY mapped_at",
            &[text(ts(cutoff)), text(ts(cutoff))],
        )
    }
}

#[async_trait]
impl ObjectiveRepository for DuckDbStore {
    async fn insert_objective(&self, objective: &ControlObjective) -> Result<(), GrcError> {
        self.insert(objective)
    }

    async fn update_objective(&self, objective: &ControlObjective) -> Result<(), GrcError> {
        self.update(objective)
    }

    async fn get_objective(&self, id: Uuid) -> Result<Option<ControlObjective>, GrcError> {
        self.get(id)
    }

    async fn objectives_for_policy(&self, policy_id: Uuid) -> Result<Vec<ControlObjective>, GrcError> {
        self.select(
            "SELECT body FROM control_objectives WHERE policy_id = ? AND deleted_at IS NULL \
             ORDER BY created_at",
            &[text(policy_id)],
        )
    }
}

#[async_trait]
impl ReportRepository for DuckDbStore {
    async fn insert_report(&self, report: &ComplianceReport) -> Result<(), GrcError> {
        self.insert(report)
    }

    async fn update_report(&self, report: &ComplianceReport) -> Result<(), GrcError> {
        self.update(report)
    }

    async fn get_report(&self, id: Uuid) -> Result<Option<ComplianceReport>, GrcError> {
        self.get(id)
    }

    #[instrument(skip(self))]
    async fn list_reports(
        &self,
        filter: &ReportFilter,
        window: Window,
    ) -> Result<Page<ComplianceReport>, GrcError> {
        let mut conditions = Vec::new();
        let mut params = Vec::new();
        if let Some(period) = filter.report_period {
            conditions.push("report_period = ?".to_string());
            params.push(text(period.as_str()));
        }
        if let Some(start) = filter.start_date {
            conditions.push("period_start_date >= ?".to_string());
            params.push(text(start));
        }
        if let Some(end) = filter.end_date {
            conditions.push("period_end_date <= ?".to_string());
            params.push(text(end));
        }
        if let Some(rating) = filter.rating {
            conditions.push("overall_compliance_rating = ?".to_string());
            params.push(text(rating.as_str()));
        }
        if !filter.include_archived.unwrap_or(true) {
            conditions.push("is_archived = false".to_string());
        }
        let filter_sql = where_clause(&conditions);

        let total = self.count(
            &format!("SELECT COUNT(*) FROM compliance_reports{}", filter_sql),
            &params,
        )?;
        let data = self.select(
            &format!(
                "SELECT body FROM compliance_reports{} ORDER BY generated_at DESC{}",
                filter_sql,
                page_clause(window)
            ),
            &params,
        )?;
        Ok(Page { data, total })
    }

    async fn latest_report(&self) -> Result<Option<ComplianceReport>, GrcError> {
        Ok(self
            .select(
                "SELECT body FROM compliance_reports WHERE is_archived = false \
                 ORDER BY generated_at DESC LIMIT 1",
                &[],
            )?
            .into_iter()
            .next())
    }

    async fn report_history(
        &self,
        period: ReportPeriod,
        before: NaiveDate,
        limit: usize,
    ) -> Result<Vec<ComplianceReport>, GrcError> {
        self.select(
            &format!(
                "SELECT body FROM compliance_reports \
                 WHERE is_archived = false AND report_period = ? AND period_start_date < ? \
                 ORDER BY period_start_date DESC, generated_at DESC LIMIT {}",
                limit
            ),
            &[text(period.as_str()), text(before)],
        )
    }

    async fn report_exists(
        &self,
        period: ReportPeriod,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<bool, GrcError> {
        let n = self.count(
            "SELECT COUNT(*) FROM compliance_reports \
             WHERE report_period = ? AND period_start_date = ? AND period_end_date = ?",
            &[text(period.as_str()), text(start), text(end)],
        )?;
        Ok(n > 0)
    }
}

#[async_trait]
impl ScheduleRepository for DuckDbStore {
    async fn insert_schedule(&self, schedule: &ReportSchedule) -> Result<(), GrcError> {
        self.insert(schedule)
    }

    async fn update_schedule(&self, schedule: &ReportSchedule) -> Result<(), GrcError> {
        self.update(schedule)
    }

    async fn all_schedules(&self) -> Result<Vec<ReportSchedule>, GrcError> {
        self.select("SELECT body FROM report_schedules ORDER BY created_at", &[])
    }
}

#[async_trait]
impl ReminderLog for DuckDbStore {
    async fn record_reminder(
        &self,
        policy_id: Uuid,
        on: NaiveDate,
        threshold: ReminderThreshold,
    ) -> Result<bool, GrcError> {
        let conn = self.lock()?;
        let params = [text(policy_id), text(on), text(threshold.as_str())];
        let seen = count_rows(
            &conn,
            "SELECT COUNT(*) FROM reminder_log \
             WHERE policy_id = ? AND reminder_date = ? AND threshold = ?",
            &params,
        )?;
        if seen > 0 {
            return Ok(false);
        }
        conn.execute(
            "INSERT INTO reminder_log (policy_id, reminder_date, threshold) VALUES (?, ?, ?)",
            duckdb::params_from_iter(params.iter()),
        )
        .map_err(DatabaseError::DuckDB)?;
        Ok(true)
    }
}

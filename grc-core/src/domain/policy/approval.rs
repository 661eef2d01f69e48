// grc-core/src/domain/policy/approval.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::error::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    Revoked,
}

str_enum!(ApprovalStatus {
    Pending => "pending",
    Approved => "approved",
    Rejected => "rejected",
    Revoked => "revoked",
});

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PolicyApproval {
    pub id: Uuid,
    pub policy_id: Uuid,
    pub approver_id: Uuid,
    pub status: ApprovalStatus,
    pub sequence_order: u32,
    pub comments: Option<String>,
    pub decided_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl PolicyApproval {
    pub fn new(policy_id: Uuid, approver_id: Uuid, sequence_order: u32, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            policy_id,
            approver_id,
            status: ApprovalStatus::Pending,
            sequence_order,
            comments: None,
            decided_at: None,
            created_at: now,
        }
    }

    fn ensure_pending(&self, action: &str) -> Result<(), DomainError> {
        if self.status != ApprovalStatus::Pending {
            return Err(DomainError::Validation(format!(
                "Cannot {} approval {}: status is {}, expected pending",
                action, self.id, self.status
            )));
        }
        Ok(())
    }

    pub fn approve(&mut self, comments: Option<String>, now: DateTime<Utc>) -> Result<(), DomainError> {
        self.ensure_pending("approve")?;
        self.status = ApprovalStatus::Approved;
        self.comments = comments;
        self.decided_at = Some(now);
        Ok(())
    }

    pub fn reject(&mut self, comments: Option<String>, now: DateTime<Utc>) -> Result<(), DomainError> {
        self.ensure_pending("reject")?;
        self.status = ApprovalStatus::Rejected;
        self.comments = comments;
        self.decided_at = Some(now);
        Ok(())
    }

    pub fn revoke(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        self.ensure_pending("revoke")?;
        self.status = ApprovalStatus::Revoked;
        self.decided_at = Some(now);
        Ok(())
    }

    /// Retires a step of a finished round, whatever its outcome. Comments and
    /// the original decision time are kept; returns false when already revoked.
    pub fn supersede(&mut self, now: DateTime<Utc>) -> bool {
        if self.status == ApprovalStatus::Revoked {
            return false;
        }
        self.status = ApprovalStatus::Revoked;
        self.decided_at.get_or_insert(now);
        true
    }

    pub fn is_active(&self) -> bool {
        self.status != ApprovalStatus::Revoked
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ApprovalProgress {
    pub total: u64,
    pub approved: u64,
    pub rejected: u64,
    pub pending: u64,
    pub revoked: u64,
}

/// Every approval is approved or revoked. No approvals at all counts as completed.
pub fn all_approvals_completed(approvals: &[PolicyApproval]) -> bool {
    approvals
        .iter()
        .all(|a| matches!(a.status, ApprovalStatus::Approved | ApprovalStatus::Revoked))
}

pub fn has_any_rejection(approvals: &[PolicyApproval]) -> bool {
    approvals.iter().any(|a| a.status == ApprovalStatus::Rejected)
}

pub fn approval_progress(approvals: &[PolicyApproval]) -> ApprovalProgress {
    approvals
        .iter()
        .fold(ApprovalProgress::default(), |mut acc, a| {
            acc.total += 1;
            match a.status {
                ApprovalStatus::Approved => acc.approved += 1,
                ApprovalStatus::Rejected => acc.rejected += 1,
                ApprovalStatus::Pending => acc.pending += 1,
                ApprovalStatus::Revoked => acc.revoked += 1,
            }
            acc
        })
}

/// First pending approval with a lower sequence order than `target`, if any.
/// Approvers sign in sequence; revoked steps are skipped.
pub fn blocking_predecessor<'a>(
    approvals: &'a [PolicyApproval],
    target: &PolicyApproval,
) -> Option<&'a PolicyApproval> {
    approvals
        .iter()
        .filter(|a| a.id != target.id)
        .filter(|a| a.sequence_order < target.sequence_order)
        .find(|a| a.status == ApprovalStatus::Pending)
}

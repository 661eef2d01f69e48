// grc-core/src/application/approvals.rs

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::application::notify::notify_best_effort;
use crate::domain::notification::{EntityType, Notification, NotificationPriority};
use crate::domain::policy::{
    ApprovalProgress, ApprovalStatus, Policy, PolicyApproval, PolicyStatus, approval_progress,
    blocking_predecessor,
};
use crate::domain::policy::approval;
use crate::domain::DomainError;
use crate::error::GrcError;
use crate::ports::{GrcStore, Notifier};

/// Ordered multi-step sign-off of a policy.
pub struct PolicyApprovalService {
    store: Arc<dyn GrcStore>,
    notifier: Arc<dyn Notifier>,
}

impl PolicyApprovalService {
    pub fn new(store: Arc<dyn GrcStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, notifier }
    }

    async fn policy(&self, id: Uuid) -> Result<Policy, GrcError> {
        self.store
            .get_policy(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Policy", id).into())
    }

    async fn approval(&self, id: Uuid) -> Result<PolicyApproval, GrcError> {
        self.store
            .get_approval(id)
            .await?
            .ok_or_else(|| DomainError::not_found("PolicyApproval", id).into())
    }

    async fn ensure_user(&self, id: Uuid) -> Result<(), GrcError> {
        match self.store.get_user(id).await? {
            Some(_) => Ok(()),
            None => Err(DomainError::not_found("User", id).into()),
        }
    }

    /// `sequence_order` defaults to the next free step.
    #[instrument(skip(self))]
    pub async fn create_approval(
        &self,
        policy_id: Uuid,
        approver_id: Uuid,
        sequence_order: Option<u32>,
    ) -> Result<PolicyApproval, GrcError> {
        let policy = self.policy(policy_id).await?;
        self.ensure_user(approver_id).await?;
        if self.store.find_approval(policy_id, approver_id).await?.is_some() {
            return Err(DomainError::validation(format!(
                "User {} is already an approver of policy {}",
                approver_id, policy.identifier
            ))
            .into());
        }

        let existing = self.store.approvals_for_policy(policy_id).await?;
        let sequence = sequence_order.unwrap_or_else(|| next_sequence(&existing));
        let approval = PolicyApproval::new(policy_id, approver_id, sequence, Utc::now());
        self.store.insert_approval(&approval).await?;
        self.notify_approver(&policy, &approval).await;
        Ok(approval)
    }

    /// Creates one step per approver, in the given order, and moves a draft into review.
    /// When the current round holds a rejection, all of its steps are superseded
    /// first, so previous approvers may be asked again.
    #[instrument(skip(self, approvers))]
    pub async fn request_approvals(
        &self,
        policy_id: Uuid,
        approvers: &[Uuid],
    ) -> Result<Vec<PolicyApproval>, GrcError> {
        let mut policy = self.policy(policy_id).await?;
        if approvers.is_empty() {
            return Err(DomainError::validation("At least one approver is required").into());
        }
        let mut seen = HashSet::new();
        if let Some(dup) = approvers.iter().find(|a| !seen.insert(**a)) {
            return Err(DomainError::validation(format!("Approver {} listed twice", dup)).into());
        }
        let mut existing = self.store.approvals_for_policy(policy_id).await?;
        // After a rejection the request opens a fresh round
        let new_round = approval::has_any_rejection(&existing);
        for approver in approvers {
            self.ensure_user(*approver).await?;
            if !new_round
                && existing
                    .iter()
                    .any(|a| a.is_active() && a.approver_id == *approver)
            {
                return Err(DomainError::validation(format!(
                    "User {} is already an approver of policy {}",
                    approver, policy.identifier
                ))
                .into());
            }
        }
        if policy.status == PolicyStatus::Draft {
            policy.status.ensure_transition(PolicyStatus::InReview)?;
        } else if policy.status != PolicyStatus::InReview {
            return Err(DomainError::validation(format!(
                "Policy {} is {}; approvals can only be requested for draft or in-review policies",
                policy.identifier, policy.status
            ))
            .into());
        }

        let now = Utc::now();
        if new_round {
            let mut retired = 0;
            for previous in existing.iter_mut() {
                if previous.supersede(now) {
                    self.store.update_approval(previous).await?;
                    retired += 1;
                }
            }
            info!(policy = %policy.identifier, retired, "Previous approval round superseded");
        }

        let first = next_sequence(&existing);
        let mut created = Vec::with_capacity(approvers.len());
        for (offset, approver) in approvers.iter().enumerate() {
            let approval = PolicyApproval::new(policy_id, *approver, first + offset as u32, now);
            self.store.insert_approval(&approval).await?;
            created.push(approval);
        }

        if policy.status == PolicyStatus::Draft {
            policy.status = PolicyStatus::InReview;
            policy.updated_at = now;
            self.store.update_policy(&policy).await?;
        }
        info!(policy = %policy.identifier, steps = created.len(), "Approvals requested");

        for approval in &created {
            self.notify_approver(&policy, approval).await;
        }
        Ok(created)
    }

    pub async fn find_by_policy(&self, policy_id: Uuid) -> Result<Vec<PolicyApproval>, GrcError> {
        self.store.approvals_for_policy(policy_id).await
    }

    pub async fn find_pending(&self, approver_id: Option<Uuid>) -> Result<Vec<PolicyApproval>, GrcError> {
        self.store.pending_approvals(approver_id).await
    }

    /// When the last outstanding step is approved the policy becomes `approved`.
    #[instrument(skip(self, comments))]
    pub async fn approve(&self, id: Uuid, comments: Option<String>) -> Result<PolicyApproval, GrcError> {
        let mut approval = self.approval(id).await?;
        let approvals = self.store.approvals_for_policy(approval.policy_id).await?;
        if approval.status == ApprovalStatus::Pending
            && let Some(blocker) = blocking_predecessor(&approvals, &approval)
        {
            return Err(DomainError::validation(format!(
                "Approval step {} must be decided before step {}",
                blocker.sequence_order, approval.sequence_order
            ))
            .into());
        }
        approval.approve(comments, Utc::now())?;
        self.store.update_approval(&approval).await?;
        info!(approval = %id, policy = %approval.policy_id, "Approval granted");

        self.promote_if_complete(approval.policy_id).await?;
        Ok(approval)
    }

    /// Sends the policy back to `in_review`. A non-pending approval is left untouched.
    #[instrument(skip(self, comments))]
    pub async fn reject(&self, id: Uuid, comments: Option<String>) -> Result<PolicyApproval, GrcError> {
        let mut approval = self.approval(id).await?;
        approval.reject(comments, Utc::now())?;
        self.store.update_approval(&approval).await?;

        let mut policy = self.policy(approval.policy_id).await?;
        if policy.status != PolicyStatus::InReview && policy.status.can_transition_to(PolicyStatus::InReview) {
            policy.status = PolicyStatus::InReview;
            policy.updated_at = Utc::now();
            self.store.update_policy(&policy).await?;
        }
        info!(approval = %id, policy = %policy.identifier, "Approval rejected");

        if let Some(owner) = policy.owner_id {
            let notification = Notification::new(
                owner,
                "Policy approval rejected",
                format!(
                    "Approval step {} of policy {} was rejected{}",
                    approval.sequence_order,
                    policy.identifier,
                    approval
                        .comments
                        .as_deref()
                        .map(|c| format!(": {c}"))
                        .unwrap_or_else(|| ".".to_string())
                ),
            )
            .with_priority(NotificationPriority::High)
            .about(EntityType::Policy, policy.id);
            notify_best_effort(self.notifier.as_ref(), notification).await;
        }
        Ok(approval)
    }

    /// Withdraws a pending step; it no longer blocks completion.
    #[instrument(skip(self))]
    pub async fn revoke(&self, id: Uuid) -> Result<PolicyApproval, GrcError> {
        let mut approval = self.approval(id).await?;
        approval.revoke(Utc::now())?;
        self.store.update_approval(&approval).await?;
        self.promote_if_complete(approval.policy_id).await?;
        Ok(approval)
    }

    pub async fn all_approvals_completed(&self, policy_id: Uuid) -> Result<bool, GrcError> {
        Ok(approval::all_approvals_completed(
            &self.find_by_policy(policy_id).await?,
        ))
    }

    pub async fn has_any_rejection(&self, policy_id: Uuid) -> Result<bool, GrcError> {
        Ok(approval::has_any_rejection(&self.find_by_policy(policy_id).await?))
    }

    pub async fn progress(&self, policy_id: Uuid) -> Result<ApprovalProgress, GrcError> {
        Ok(approval_progress(&self.find_by_policy(policy_id).await?))
    }

    async fn promote_if_complete(&self, policy_id: Uuid) -> Result<(), GrcError> {
        let approvals = self.store.approvals_for_policy(policy_id).await?;
        let any_approved = approvals.iter().any(|a| a.status == ApprovalStatus::Approved);
        if !any_approved
            || approval::has_any_rejection(&approvals)
            || !approval::all_approvals_completed(&approvals)
        {
            return Ok(());
        }

        let mut policy = self.policy(policy_id).await?;
        if policy.status != PolicyStatus::InReview {
            return Ok(());
        }
        policy.status = PolicyStatus::Approved;
        policy.updated_at = Utc::now();
        self.store.update_policy(&policy).await?;
        info!(policy = %policy.identifier, "All approvals granted");

        if let Some(owner) = policy.owner_id {
            let notification = Notification::new(
                owner,
                "Policy approved",
                format!("Policy {} is approved and ready to publish.", policy.identifier),
            )
            .about(EntityType::Policy, policy.id);
            notify_best_effort(self.notifier.as_ref(), notification).await;
        }
        Ok(())
    }

    async fn notify_approver(&self, policy: &Policy, approval: &PolicyApproval) {
        let notification = Notification::new(
            approval.approver_id,
            "Policy approval requested",
            format!(
                "Please review policy {} \"{}\" (step {}).",
                policy.identifier, policy.title, approval.sequence_order
            ),
        )
        .about(EntityType::PolicyApproval, approval.id);
        notify_best_effort(self.notifier.as_ref(), notification).await;
    }
}

fn next_sequence(existing: &[PolicyApproval]) -> u32 {
    existing.iter().map(|a| a.sequence_order).max().unwrap_or(0) + 1
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::application::notify::testing::RecordingNotifier;
    use crate::application::reporting::tests::store;
    use crate::domain::User;
    use crate::domain::policy::{CreatePolicyRequest, policy_identifier};
    use crate::infrastructure::adapters::DuckDbStore;
    use crate::ports::{PolicyRepository, UserRepository};
    use anyhow::Result;

    struct Fixture {
        store: Arc<DuckDbStore>,
        notifier: Arc<RecordingNotifier>,
        service: PolicyApprovalService,
        policy: Policy,
        approvers: Vec<Uuid>,
    }

    async fn fixture(approvers: usize) -> Result<Fixture> {
        let store = store();
        let notifier = Arc::new(RecordingNotifier::default());
        let now = Utc::now();
        let policy = Policy::from_request(
            CreatePolicyRequest {
                title: "Data Retention".into(),
                policy_type: "privacy".into(),
                owner_id: Some(Uuid::new_v4()),
                ..Default::default()
            },
            policy_identifier(now, 0),
            None,
            now,
        );
        store.insert_policy(&policy).await?;

        let mut ids = Vec::new();
        for i in 0..approvers {
            let user = User::new(format!("approver{i}@example.com"), format!("Approver {i}"));
            store.save_user(&user).await?;
            ids.push(user.id);
        }
        let service = PolicyApprovalService::new(store.clone(), notifier.clone());
        Ok(Fixture {
            store,
            notifier,
            service,
            policy,
            approvers: ids,
        })
    }

    #[tokio::test]
    async fn test_request_moves_draft_to_review() -> Result<()> {
        let f = fixture(3).await?;
        let created = f.service.request_approvals(f.policy.id, &f.approvers).await?;
        assert_eq!(
            created.iter().map(|a| a.sequence_order).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        let policy = f.store.get_policy(f.policy.id).await?.unwrap();
        assert_eq!(policy.status, PolicyStatus::InReview);
        assert_eq!(f.notifier.count(), 3);
        assert_eq!(f.service.find_pending(Some(f.approvers[1])).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_approval_checks() -> Result<()> {
        let f = fixture(1).await?;
        let err = f
            .service
            .create_approval(Uuid::new_v4(), f.approvers[0], None)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        let err = f
            .service
            .create_approval(f.policy.id, Uuid::new_v4(), None)
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let approval = f.service.create_approval(f.policy.id, f.approvers[0], None).await?;
        assert_eq!(approval.sequence_order, 1);
        let err = f
            .service
            .create_approval(f.policy.id, f.approvers[0], None)
            .await
            .unwrap_err();
        assert!(err.is_validation());
        Ok(())
    }

    #[tokio::test]
    async fn test_sequence_order_enforced() -> Result<()> {
        let f = fixture(2).await?;
        let steps = f.service.request_approvals(f.policy.id, &f.approvers).await?;
        let err = f.service.approve(steps[1].id, None).await.unwrap_err();
        assert!(err.is_validation());

        f.service.approve(steps[0].id, Some("ok".into())).await?;
        f.service.approve(steps[1].id, None).await?;
        assert!(f.service.all_approvals_completed(f.policy.id).await?);

        let policy = f.store.get_policy(f.policy.id).await?.unwrap();
        assert_eq!(policy.status, PolicyStatus::Approved);
        assert!(f.notifier.titles().contains(&"Policy approved".to_string()));
        Ok(())
    }

    #[tokio::test]
    async fn test_rejecting_decided_approval_is_validation() -> Result<()> {
        let f = fixture(1).await?;
        let steps = f.service.request_approvals(f.policy.id, &f.approvers).await?;
        let approved = f.service.approve(steps[0].id, None).await?;

        let err = f.service.reject(approved.id, Some("late".into())).await.unwrap_err();
        assert!(err.is_validation());
        let stored = f.service.find_by_policy(f.policy.id).await?;
        assert_eq!(stored[0].status, ApprovalStatus::Approved);
        assert_eq!(stored[0].comments, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_reject_returns_policy_to_review() -> Result<()> {
        let f = fixture(2).await?;
        let steps = f.service.request_approvals(f.policy.id, &f.approvers).await?;
        f.service.reject(steps[0].id, Some("Scope unclear".into())).await?;

        assert!(f.service.has_any_rejection(f.policy.id).await?);
        assert!(!f.service.all_approvals_completed(f.policy.id).await?);
        let progress = f.service.progress(f.policy.id).await?;
        assert_eq!((progress.total, progress.rejected, progress.pending), (2, 1, 1));

        let policy = f.store.get_policy(f.policy.id).await?.unwrap();
        assert_eq!(policy.status, PolicyStatus::InReview);
        assert!(f.service.reject(steps[0].id, None).await.unwrap_err().is_validation());
        Ok(())
    }

    #[tokio::test]
    async fn test_new_round_after_rejection() -> Result<()> {
        let f = fixture(2).await?;
        let first = f.service.request_approvals(f.policy.id, &f.approvers).await?;
        f.service.reject(first[0].id, Some("Scope unclear".into())).await?;

        // Previous approvers can be asked again once the round has a rejection
        let second = f.service.request_approvals(f.policy.id, &f.approvers).await?;
        assert_eq!(
            second.iter().map(|a| a.sequence_order).collect::<Vec<_>>(),
            vec![3, 4]
        );
        assert!(!f.service.has_any_rejection(f.policy.id).await?);
        let err = f
            .service
            .request_approvals(f.policy.id, &f.approvers[..1])
            .await
            .unwrap_err();
        assert!(err.is_validation());

        f.service.approve(second[0].id, None).await?;
        f.service.approve(second[1].id, None).await?;

        let progress = f.service.progress(f.policy.id).await?;
        assert_eq!((progress.total, progress.approved, progress.revoked), (4, 2, 2));
        let history = f.service.find_by_policy(f.policy.id).await?;
        assert_eq!(history[0].comments.as_deref(), Some("Scope unclear"));
        let policy = f.store.get_policy(f.policy.id).await?.unwrap();
        assert_eq!(policy.status, PolicyStatus::Approved);
        Ok(())
    }

    #[tokio::test]
    async fn test_revoked_step_does_not_block() -> Result<()> {
        let f = fixture(2).await?;
        let steps = f.service.request_approvals(f.policy.id, &f.approvers).await?;
        f.service.revoke(steps[0].id).await?;
        f.service.approve(steps[1].id, None).await?;

        let progress = f.service.progress(f.policy.id).await?;
        assert_eq!((progress.approved, progress.revoked), (1, 1));
        let policy = f.store.get_policy(f.policy.id).await?.unwrap();
        assert_eq!(policy.status, PolicyStatus::Approved);
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_approval_not_found() -> Result<()> {
        let f = fixture(0).await?;
        assert!(f.service.approve(Uuid::new_v4(), None).await.unwrap_err().is_not_found());
        assert!(f.service.all_approvals_completed(f.policy.id).await?);
        Ok(())
    }
}

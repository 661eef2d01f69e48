// grc-core/src/application/policies.rs

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Datelike, Duration, NaiveDate, Utc};
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::application::notify::notify_best_effort;
use crate::application::versions::snapshot_version;
use crate::domain::notification::{EntityType, Notification, NotificationPriority};
use crate::domain::page::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::domain::policy::{
    CreatePolicyRequest, Policy, PolicyAssignment, PolicyFilter, PolicyStatus,
    UpdatePolicyRequest, all_approvals_completed, has_any_rejection, policy_identifier,
};
use crate::domain::{DomainError, Page, Window};
use crate::error::GrcError;
use crate::ports::{GrcStore, Notifier};

/// Policy lifecycle: drafting, status changes, publication, acknowledgment and reviews.
pub struct PolicyService {
    store: Arc<dyn GrcStore>,
    notifier: Arc<dyn Notifier>,
    default_page_size: u32,
    max_page_size: u32,
}

impl PolicyService {
    pub fn new(store: Arc<dyn GrcStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            store,
            notifier,
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
        }
    }

    pub fn with_page_limits(mut self, default_page_size: u32, max_page_size: u32) -> Self {
        self.default_page_size = default_page_size;
        self.max_page_size = max_page_size;
        self
    }

    #[instrument(skip(self, request), fields(title = %request.title))]
    pub async fn create(
        &self,
        request: CreatePolicyRequest,
        created_by: Option<Uuid>,
    ) -> Result<Policy, GrcError> {
        request.validate()?;
        let now = Utc::now();
        let created_this_year = self.store.count_policies_created_in(now.year()).await?;
        let policy = Policy::from_request(
            request,
            policy_identifier(now, created_this_year),
            created_by,
            now,
        );
        self.store.insert_policy(&policy).await?;
        info!(policy = %policy.identifier, "Policy created");

        if let Some(owner) = policy.owner_id {
            let notification = Notification::new(
                owner,
                "New policy assigned to you",
                format!(
                    "You are the owner of policy {} \"{}\".",
                    policy.identifier, policy.title
                ),
            )
            .about(EntityType::Policy, policy.id);
            notify_best_effort(self.notifier.as_ref(), notification).await;
        }
        Ok(policy)
    }

    pub async fn get(&self, id: Uuid) -> Result<Policy, GrcError> {
        self.store
            .get_policy(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Policy", id).into())
    }

    pub async fn list(&self, filter: &PolicyFilter) -> Result<Page<Policy>, GrcError> {
        let window = Window::bounded(
            filter.skip,
            filter.take,
            self.default_page_size,
            self.max_page_size,
        );
        self.store.list_policies(filter, window).await
    }

    /// A content change is snapshotted as a new version authored by `updated_by`.
    /// `approved` and `published` are not reachable from here.
    #[instrument(skip(self, request))]
    pub async fn update(
        &self,
        id: Uuid,
        request: UpdatePolicyRequest,
        updated_by: Uuid,
    ) -> Result<Policy, GrcError> {
        request.validate()?;
        let mut policy = self.get(id).await?;
        let previous_status = policy.status;

        if let Some(next) = request.status
            && next != policy.status
        {
            // approved comes from the approval steps, published from `publish`
            if matches!(next, PolicyStatus::Approved | PolicyStatus::Published) {
                return Err(DomainError::validation(format!(
                    "Policy {} cannot be set to {} by an update",
                    policy.identifier, next
                ))
                .into());
            }
            policy.status.ensure_transition(next)?;
            policy.status = next;
        }

        if let Some(content) = request.content
            && policy.content.as_deref() != Some(content.as_str())
        {
            snapshot_version(
                self.store.as_ref(),
                &mut policy,
                content,
                request.change_summary,
                updated_by,
            )
            .await?;
        }

        if let Some(title) = request.title {
            policy.title = title;
        }
        if let Some(owner) = request.owner_id {
            policy.owner_id = Some(owner);
        }
        if let Some(unit) = request.business_unit {
            policy.business_unit = Some(unit);
        }
        if let Some(frequency) = request.review_frequency {
            policy.review_frequency = frequency;
        }
        if let Some(date) = request.next_review_date {
            policy.next_review_date = Some(date);
        }
        if let Some(mandatory) = request.is_mandatory {
            policy.is_mandatory = mandatory;
        }
        policy.updated_at = Utc::now();
        self.store.update_policy(&policy).await?;

        if previous_status != policy.status {
            info!(policy = %policy.identifier, from = %previous_status, to = %policy.status, "Policy status changed");
            self.notify_owner(
                &policy,
                "Policy status changed",
                format!(
                    "Policy {} moved from {} to {}.",
                    policy.identifier, previous_status, policy.status
                ),
            )
            .await;
        }
        Ok(policy)
    }

    /// Tombstones the policy together with its control objectives.
    #[instrument(skip(self))]
    pub async fn soft_delete(&self, id: Uuid) -> Result<(), GrcError> {
        let policy = self.get(id).await?;
        self.store.soft_delete_policy(policy.id, Utc::now()).await?;
        info!(policy = %policy.identifier, "Policy deleted");
        Ok(())
    }

    /// Publishes from `approved`, or from `in_review` once every approval is done
    /// without a rejection. Assignees get one assignment each.
    #[instrument(skip(self, assignees))]
    pub async fn publish(&self, id: Uuid, assignees: &[Uuid]) -> Result<Policy, GrcError> {
        let mut policy = self.get(id).await?;
        match policy.status {
            PolicyStatus::Approved => {}
            PolicyStatus::InReview => {
                let approvals = self.store.approvals_for_policy(id).await?;
                if has_any_rejection(&approvals) || !all_approvals_completed(&approvals) {
                    return Err(DomainError::validation(format!(
                        "Policy {} still has pending or rejected approvals",
                        policy.identifier
                    ))
                    .into());
                }
            }
            other => other.ensure_transition(PolicyStatus::Published)?,
        }

        let today = Utc::now().date_naive();
        policy.status = PolicyStatus::Published;
        policy.published_date = Some(today);
        if policy.next_review_date.is_none() {
            policy.next_review_date = Some(policy.review_frequency.next_review_after(today));
        }
        policy.updated_at = Utc::now();
        self.store.update_policy(&policy).await?;
        info!(policy = %policy.identifier, "Policy published");

        self.assign(&policy, assignees).await?;
        Ok(policy)
    }

    async fn assign(&self, policy: &Policy, assignees: &[Uuid]) -> Result<(), GrcError> {
        let mut seen = HashSet::new();
        for user_id in assignees.iter().copied().filter(|u| seen.insert(*u)) {
            if self.store.find_assignment(policy.id, user_id).await?.is_some() {
                continue;
            }
            let mut assignment = PolicyAssignment::new(policy.id, user_id, policy.owner_id, Utc::now());
            self.store.insert_assignment(&assignment).await?;

            let notification = Notification::new(
                user_id,
                "Policy requires your acknowledgment",
                format!(
                    "Policy {} \"{}\" has been published. Please read and acknowledge it.",
                    policy.identifier, policy.title
                ),
            )
            .with_priority(if policy.is_mandatory {
                NotificationPriority::High
            } else {
                NotificationPriority::Medium
            })
            .about(EntityType::Policy, policy.id);

            if notify_best_effort(self.notifier.as_ref(), notification).await {
                assignment.notification_sent = true;
                self.store.update_assignment(&assignment).await?;
            }
        }
        Ok(())
    }

    /// Idempotent. NotFound when the user was never assigned the policy.
    pub async fn acknowledge(&self, policy_id: Uuid, user_id: Uuid) -> Result<PolicyAssignment, GrcError> {
        let mut assignment = self
            .store
            .find_assignment(policy_id, user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("PolicyAssignment", format!("{policy_id}/{user_id}")))?;
        if assignment.acknowledge(Utc::now()) {
            self.store.update_assignment(&assignment).await?;
            info!(policy = %policy_id, user = %user_id, "Policy acknowledged");
        }
        Ok(assignment)
    }

    pub async fn assignments(&self, policy_id: Uuid) -> Result<Vec<PolicyAssignment>, GrcError> {
        self.get(policy_id).await?;
        self.store.assignments_for_policy(policy_id).await
    }

    /// Moves the next review date forward from the day the review happened.
    pub async fn record_review(&self, id: Uuid, reviewed_on: NaiveDate) -> Result<Policy, GrcError> {
        let mut policy = self.get(id).await?;
        policy.next_review_date = Some(policy.review_frequency.next_review_after(reviewed_on));
        policy.updated_at = Utc::now();
        self.store.update_policy(&policy).await?;
        Ok(policy)
    }

    /// Reviews falling within `[today, today + days_ahead]`, soonest first.
    pub async fn pending_reviews(&self, today: NaiveDate, days_ahead: i64) -> Result<Vec<Policy>, GrcError> {
        let horizon = today + Duration::days(days_ahead);
        self.reviewable(|date| date >= today && date <= horizon).await
    }

    /// Reviews due today or already overdue.
    pub async fn due_for_review(&self, today: NaiveDate) -> Result<Vec<Policy>, GrcError> {
        self.reviewable(|date| date <= today).await
    }

    async fn reviewable(&self, keep: impl Fn(NaiveDate) -> bool) -> Result<Vec<Policy>, GrcError> {
        let mut policies: Vec<Policy> = self
            .store
            .all_policies()
            .await?
            .into_iter()
            .filter(|p| p.status != PolicyStatus::Archived)
            .filter(|p| p.next_review_date.is_some_and(&keep))
            .collect();
        policies.sort_by_key(|p| p.next_review_date);
        Ok(policies)
    }

    async fn notify_owner(&self, policy: &Policy, title: &str, message: String) {
        if let Some(owner) = policy.owner_id {
            let notification = Notification::new(owner, title, message).about(EntityType::Policy, policy.id);
            notify_best_effort(self.notifier.as_ref(), notification).await;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::application::notify::testing::RecordingNotifier;
    use crate::application::reporting::tests::store;
    use crate::domain::control::CreateObjectiveRequest;
    use crate::domain::control::ControlObjective;
    use crate::domain::policy::{PolicyApproval, ReviewFrequency};
    use crate::infrastructure::adapters::DuckDbStore;
    use crate::ports::{
        ApprovalRepository, ObjectiveRepository, PolicyRepository, VersionRepository,
    };
    use anyhow::Result;

    fn service(store: &Arc<DuckDbStore>, notifier: &Arc<RecordingNotifier>) -> PolicyService {
        PolicyService::new(store.clone(), notifier.clone())
    }

    fn request(title: &str) -> CreatePolicyRequest {
        CreatePolicyRequest {
            title: title.into(),
            policy_type: "security".into(),
            owner_id: Some(Uuid::new_v4()),
            content: Some("Initial text".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_generates_sequential_identifiers() -> Result<()> {
        let store = store();
        let notifier = Arc::new(RecordingNotifier::default());
        let service = service(&store, &notifier);
        let year = Utc::now().year();

        let first = service.create(request("Access"), None).await?;
        let second = service.create(request("Backup"), None).await?;
        assert_eq!(first.identifier, format!("POL-{year}-0001"));
        assert_eq!(second.identifier, format!("POL-{year}-0002"));
        assert_eq!(first.status, PolicyStatus::Draft);
        assert_eq!(first.version, "1.0");

        // Deleted policies still consume their number
        service.soft_delete(second.id).await?;
        let third = service.create(request("Crypto"), None).await?;
        assert_eq!(third.identifier, format!("POL-{year}-0003"));
        assert_eq!(notifier.count(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_notification_failure_does_not_fail_create() -> Result<()> {
        let store = store();
        let notifier = Arc::new(RecordingNotifier::failing());
        let policy = service(&store, &notifier).create(request("Access"), None).await?;
        assert!(store.get_policy(policy.id).await?.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_transition_rejected() -> Result<()> {
        let store = store();
        let notifier = Arc::new(RecordingNotifier::default());
        let service = service(&store, &notifier);
        let policy = service.create(request("Access"), None).await?;

        let err = service
            .update(
                policy.id,
                UpdatePolicyRequest {
                    status: Some(PolicyStatus::Published),
                    ..Default::default()
                },
                Uuid::new_v4(),
            )
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.http_status(), 400);
        assert_eq!(service.get(policy.id).await?.status, PolicyStatus::Draft);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_cannot_skip_approvals_or_publish() -> Result<()> {
        let store = store();
        let notifier = Arc::new(RecordingNotifier::default());
        let service = service(&store, &notifier);
        let mut policy = service.create(request("Access"), None).await?;
        policy.status = PolicyStatus::InReview;
        store.update_policy(&policy).await?;

        let mut rejected = PolicyApproval::new(policy.id, Uuid::new_v4(), 1, Utc::now());
        rejected.reject(Some("Too vague".into()), Utc::now())?;
        store.insert_approval(&rejected).await?;
        store
            .insert_approval(&PolicyApproval::new(policy.id, Uuid::new_v4(), 2, Utc::now()))
            .await?;

        for status in [PolicyStatus::Approved, PolicyStatus::Published] {
            let err = service
                .update(
                    policy.id,
                    UpdatePolicyRequest {
                        status: Some(status),
                        ..Default::default()
                    },
                    Uuid::new_v4(),
                )
                .await
                .unwrap_err();
            assert!(err.is_validation());
        }

        let unchanged = service.get(policy.id).await?;
        assert_eq!(unchanged.status, PolicyStatus::InReview);
        assert_eq!(unchanged.published_date, None);
        assert!(service.assignments(policy.id).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_update_status_and_content() -> Result<()> {
        let store = store();
        let notifier = Arc::new(RecordingNotifier::default());
        let service = service(&store, &notifier);
        let policy = service.create(request("Access"), None).await?;
        let editor = Uuid::new_v4();

        let updated = service
            .update(
                policy.id,
                UpdatePolicyRequest {
                    status: Some(PolicyStatus::InReview),
                    content: Some("Revised text".into()),
                    change_summary: Some("Add MFA".into()),
                    ..Default::default()
                },
                editor,
            )
            .await?;
        assert_eq!(updated.status, PolicyStatus::InReview);
        assert_eq!(updated.version_number, 2);

        let versions = store.versions_for_policy(policy.id).await?;
        assert_eq!(versions.len(), 1);
        assert_eq!(versions[0].created_by, editor);
        assert!(notifier.titles().contains(&"Policy status changed".to_string()));

        // Same content again: no new version
        service
            .update(
                policy.id,
                UpdatePolicyRequest {
                    content: Some("Revised text".into()),
                    ..Default::default()
                },
                editor,
            )
            .await?;
        assert_eq!(store.versions_for_policy(policy.id).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_publish_requires_completed_approvals() -> Result<()> {
        let store = store();
        let notifier = Arc::new(RecordingNotifier::default());
        let service = service(&store, &notifier);
        let mut policy = service.create(request("Access"), None).await?;
        policy.status = PolicyStatus::InReview;
        store.update_policy(&policy).await?;

        let approval = PolicyApproval::new(policy.id, Uuid::new_v4(), 1, Utc::now());
        store.insert_approval(&approval).await?;
        assert!(service.publish(policy.id, &[]).await.unwrap_err().is_validation());

        let mut approved = approval.clone();
        approved.approve(None, Utc::now())?;
        store.update_approval(&approved).await?;

        let user = Uuid::new_v4();
        let published = service.publish(policy.id, &[user, user]).await?;
        assert_eq!(published.status, PolicyStatus::Published);
        assert_eq!(published.published_date, Some(Utc::now().date_naive()));
        assert_eq!(
            published.next_review_date,
            Some(ReviewFrequency::Annual.next_review_after(Utc::now().date_naive()))
        );

        let assignments = service.assignments(policy.id).await?;
        assert_eq!(assignments.len(), 1);
        assert!(assignments[0].notification_sent);
        Ok(())
    }

    #[tokio::test]
    async fn test_publish_from_draft_is_invalid() -> Result<()> {
        let store = store();
        let notifier = Arc::new(RecordingNotifier::default());
        let service = service(&store, &notifier);
        let policy = service.create(request("Access"), None).await?;
        assert!(service.publish(policy.id, &[]).await.unwrap_err().is_validation());
        Ok(())
    }

    #[tokio::test]
    async fn test_acknowledge() -> Result<()> {
        let store = store();
        let notifier = Arc::new(RecordingNotifier::default());
        let service = service(&store, &notifier);
        let mut policy = service.create(request("Access"), None).await?;
        policy.status = PolicyStatus::Approved;
        store.update_policy(&policy).await?;

        let user = Uuid::new_v4();
        service.publish(policy.id, &[user]).await?;

        let first = service.acknowledge(policy.id, user).await?;
        let again = service.acknowledge(policy.id, user).await?;
        assert!(first.acknowledged);
        assert_eq!(first.acknowledged_at, again.acknowledged_at);

        let err = service.acknowledge(policy.id, Uuid::new_v4()).await.unwrap_err();
        assert!(err.is_not_found());
        Ok(())
    }

    #[tokio::test]
    async fn test_soft_delete_cascades_to_objectives() -> Result<()> {
        let store = store();
        let notifier = Arc::new(RecordingNotifier::default());
        let service = service(&store, &notifier);
        let policy = service.create(request("Access"), None).await?;
        let objective = ControlObjective::from_request(
            CreateObjectiveRequest {
                policy_id: policy.id,
                objective_identifier: "CO-1".into(),
                title: "Quarterly access review".into(),
                responsible_party_id: None,
                implementation_status: None,
            },
            Utc::now(),
        );
        store.insert_objective(&objective).await?;

        service.soft_delete(policy.id).await?;
        assert!(service.get(policy.id).await.unwrap_err().is_not_found());
        assert!(store.get_objective(objective.id).await?.is_none());
        assert!(service.soft_delete(policy.id).await.unwrap_err().is_not_found());
        Ok(())
    }

    #[tokio::test]
    async fn test_review_queries() -> Result<()> {
        let store = store();
        let notifier = Arc::new(RecordingNotifier::default());
        let service = service(&store, &notifier);
        let today = Utc::now().date_naive();

        let mut soon = request("Soon");
        soon.next_review_date = Some(today + Duration::days(10));
        let mut late = request("Late");
        late.next_review_date = Some(today - Duration::days(3));
        let mut far = request("Far");
        far.next_review_date = Some(today + Duration::days(200));
        let soon = service.create(soon, None).await?;
        let late = service.create(late, None).await?;
        service.create(far, None).await?;

        let pending = service.pending_reviews(today, 30).await?;
        assert_eq!(pending.iter().map(|p| p.id).collect::<Vec<_>>(), vec![soon.id]);
        let due = service.due_for_review(today).await?;
        assert_eq!(due.iter().map(|p| p.id).collect::<Vec<_>>(), vec![late.id]);

        let reviewed = service.record_review(late.id, today).await?;
        assert_eq!(
            reviewed.next_review_date,
            Some(ReviewFrequency::Annual.next_review_after(today))
        );
        assert!(service.due_for_review(today).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_list_filters_by_status_and_search() -> Result<()> {
        let store = store();
        let notifier = Arc::new(RecordingNotifier::default());
        let service = service(&store, &notifier);
        service.create(request("Access Control"), None).await?;
        let backup = service.create(request("Backup"), None).await?;
        service
            .update(
                backup.id,
                UpdatePolicyRequest {
                    status: Some(PolicyStatus::InReview),
                    ..Default::default()
                },
                Uuid::new_v4(),
            )
            .await?;

        let in_review = service
            .list(&PolicyFilter {
                status: Some(PolicyStatus::InReview),
                ..Default::default()
            })
            .await?;
        assert_eq!(in_review.total, 1);

        let search = service
            .list(&PolicyFilter {
                search: Some("access".into()),
                ..Default::default()
            })
            .await?;
        assert_eq!(search.data[0].title, "Access Control");
        Ok(())
    }
}

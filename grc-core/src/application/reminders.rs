// grc-core/src/application/reminders.rs

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{error, info, instrument, warn};

use crate::application::notify::notify_best_effort;
use crate::domain::notification::{EntityType, Notification, NotificationPriority};
use crate::domain::policy::{Policy, PolicyStatus, ReminderThreshold};
use crate::error::GrcError;
use crate::ports::{GrcStore, Notifier};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReminderSummary {
    pub checked: usize,
    pub sent: usize,
    pub already_sent: usize,
    pub failed: usize,
}

/// Daily review reminders at 90, 60 and 30 days out, then every day once overdue.
pub struct ReviewReminderJob {
    store: Arc<dyn GrcStore>,
    notifier: Arc<dyn Notifier>,
}

impl ReviewReminderJob {
    pub fn new(store: Arc<dyn GrcStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, notifier }
    }

    /// One policy failing doesn't stop the others.
    #[instrument(skip(self))]
    pub async fn run(&self, today: NaiveDate) -> Result<ReminderSummary, GrcError> {
        let mut summary = ReminderSummary::default();
        let policies = self.store.all_policies().await?;

        for policy in policies.iter().filter(|p| p.status != PolicyStatus::Archived) {
            let Some(next_review) = policy.next_review_date else {
                continue;
            };
            summary.checked += 1;
            let Some(threshold) = ReminderThreshold::classify(next_review, today) else {
                continue;
            };
            match self.remind(policy, next_review, threshold, today).await {
                Ok(true) => summary.sent += 1,
                Ok(false) => summary.already_sent += 1,
                Err(e) => {
                    error!(policy = %policy.id, error = %e, "Review reminder failed");
                    summary.failed += 1;
                }
            }
        }

        info!(
            checked = summary.checked,
            sent = summary.sent,
            failed = summary.failed,
            "Review reminders processed"
        );
        Ok(summary)
    }

    async fn remind(
        &self,
        policy: &Policy,
        next_review: NaiveDate,
        threshold: ReminderThreshold,
        today: NaiveDate,
    ) -> Result<bool, GrcError> {
        let Some(owner) = policy.owner_id else {
            warn!(policy = %policy.identifier, "Review due but policy has no owner");
            return Ok(false);
        };
        if !self.store.record_reminder(policy.id, today, threshold).await? {
            return Ok(false);
        }

        let priority = match threshold {
            ReminderThreshold::Overdue | ReminderThreshold::Days30 => NotificationPriority::High,
            ReminderThreshold::Days60 => NotificationPriority::Medium,
            ReminderThreshold::Days90 => NotificationPriority::Low,
        };
        let notification = Notification::new(
            owner,
            threshold.title(),
            threshold.message(&policy.identifier, &policy.title, next_review),
        )
        .with_priority(priority)
        .about(EntityType::Policy, policy.id);
        notify_best_effort(self.notifier.as_ref(), notification).await;
        Ok(true)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::application::notify::testing::RecordingNotifier;
    use crate::application::reporting::tests::store;
    use crate::domain::policy::{CreatePolicyRequest, policy_identifier};
    use crate::ports::PolicyRepository;
    use anyhow::Result;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn policy(n: u64, next_review: NaiveDate, status: PolicyStatus) -> Policy {
        let now = Utc::now();
        let mut p = Policy::from_request(
            CreatePolicyRequest {
                title: format!("Policy {n}"),
                policy_type: "security".into(),
                owner_id: Some(Uuid::new_v4()),
                next_review_date: Some(next_review),
                ..Default::default()
            },
            policy_identifier(now, n),
            None,
            now,
        );
        p.status = status;
        p
    }

    #[tokio::test]
    async fn test_thresholds_and_dedupe() -> Result<()> {
        let store = store();
        let notifier = Arc::new(RecordingNotifier::default());
        let job = ReviewReminderJob::new(store.clone(), notifier.clone());
        let today = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();

        for (n, offset, status) in [
            (0, 90, PolicyStatus::Published),
            (1, 60, PolicyStatus::Published),
            (2, 30, PolicyStatus::Draft),
            (3, -5, PolicyStatus::Published),
            (4, 45, PolicyStatus::Published),
            (5, -5, PolicyStatus::Archived),
        ] {
            store
                .insert_policy(&policy(n, today + Duration::days(offset), status))
                .await?;
        }

        let first = job.run(today).await?;
        assert_eq!(first.checked, 5);
        assert_eq!(first.sent, 4);
        assert_eq!(notifier.count(), 4);

        let again = job.run(today).await?;
        assert_eq!((again.sent, again.already_sent), (0, 4));
        assert_eq!(notifier.count(), 4);

        // Overdue keeps reminding on later days
        let tomorrow = job.run(today + Duration::days(1)).await?;
        assert_eq!(tomorrow.sent, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_delivery_failure_still_counts_as_sent() -> Result<()> {
        let store = store();
        let notifier = Arc::new(RecordingNotifier::failing());
        let job = ReviewReminderJob::new(store.clone(), notifier);
        let today = Utc::now().date_naive();
        store
            .insert_policy(&policy(0, today - Duration::days(1), PolicyStatus::Published))
            .await?;
        let summary = job.run(today).await?;
        assert_eq!((summary.sent, summary.failed), (1, 0));
        Ok(())
    }
}

// grc-core/src/application/dispatch.rs

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::application::notify::notify_best_effort;
use crate::application::reporting::ComplianceReportingService;
use crate::domain::compliance::GenerateReportRequest;
use crate::domain::notification::{EntityType, Notification};
use crate::domain::schedule::{CreateScheduleRequest, ReportSchedule};
use crate::error::GrcError;
use crate::ports::{GrcStore, Notifier};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchSummary {
    pub due: usize,
    pub dispatched: usize,
    pub failed: usize,
}

/// Runs report schedules whose next fire time has passed.
pub struct ScheduledReportDispatcher {
    store: Arc<dyn GrcStore>,
    reporting: Arc<ComplianceReportingService>,
    notifier: Arc<dyn Notifier>,
}

impl ScheduledReportDispatcher {
    pub fn new(
        store: Arc<dyn GrcStore>,
        reporting: Arc<ComplianceReportingService>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store,
            reporting,
            notifier,
        }
    }

    pub async fn create_schedule(
        &self,
        request: CreateScheduleRequest,
        created_by: Option<Uuid>,
    ) -> Result<ReportSchedule, GrcError> {
        request.validate()?;
        let schedule = ReportSchedule::from_request(request, created_by, Utc::now())?;
        self.store.insert_schedule(&schedule).await?;
        info!(schedule = %schedule.name, next_run = ?schedule.next_run_at, "Report schedule created");
        Ok(schedule)
    }

    pub async fn list_schedules(&self) -> Result<Vec<ReportSchedule>, GrcError> {
        self.store.all_schedules().await
    }

    /// A failing schedule is logged and keeps its `next_run_at`, so the next tick retries it.
    #[instrument(skip(self))]
    pub async fn run_due(&self, now: DateTime<Utc>) -> Result<DispatchSummary, GrcError> {
        let due: Vec<ReportSchedule> = self
            .store
            .all_schedules()
            .await?
            .into_iter()
            .filter(|s| s.is_due(now))
            .collect();

        let mut summary = DispatchSummary {
            due: due.len(),
            ..Default::default()
        };
        for schedule in due {
            let id = schedule.id;
            match self.dispatch(schedule, now).await {
                Ok(()) => summary.dispatched += 1,
                Err(e) => {
                    error!(schedule = %id, error = %e, "Scheduled report failed");
                    summary.failed += 1;
                }
            }
        }
        if summary.due > 0 {
            info!(dispatched = summary.dispatched, failed = summary.failed, "Scheduled reports dispatched");
        }
        Ok(summary)
    }

    async fn dispatch(&self, mut schedule: ReportSchedule, now: DateTime<Utc>) -> Result<(), GrcError> {
        let (start, end) = schedule.report_period.last_complete(now.date_naive());
        let mut request = GenerateReportRequest::new(schedule.report_period, start, end);
        request.report_name = Some(format!("{} - {}", schedule.name, start));

        let report = self.reporting.generate_report(request, schedule.created_by).await?;

        for recipient in &schedule.recipients {
            let notification = Notification::new(
                *recipient,
                "Scheduled compliance report ready",
                format!(
                    "{} is available: {:.1}% ({}).",
                    report.report_name, report.overall_compliance_score, report.overall_compliance_rating
                ),
            )
            .about(EntityType::ComplianceReport, report.id);
            notify_best_effort(self.notifier.as_ref(), notification).await;
        }

        schedule.mark_ran(now)?;
        self.store.update_schedule(&schedule).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::application::notify::testing::RecordingNotifier;
    use crate::application::reporting::tests::store;
    use crate::domain::compliance::{ReportFilter, ReportPeriod};
    use crate::infrastructure::templates::JinjaRenderer;
    use anyhow::Result;
    use chrono::Duration;

    #[tokio::test]
    async fn test_due_schedule_generates_and_advances() -> Result<()> {
        let store = store();
        let notifier = Arc::new(RecordingNotifier::default());
        let reporting = Arc::new(ComplianceReportingService::new(
            store.clone(),
            Arc::new(JinjaRenderer::new()),
        ));
        let dispatcher = ScheduledReportDispatcher::new(store.clone(), reporting.clone(), notifier.clone());

        let recipient = Uuid::new_v4();
        let schedule = dispatcher
            .create_schedule(
                CreateScheduleRequest {
                    name: "Monthly board pack".into(),
                    report_period: ReportPeriod::Monthly,
                    cron_expression: "0 0 * * * *".into(),
                    recipients: vec![recipient],
                },
                None,
            )
            .await?;

        // Not due yet
        let summary = dispatcher.run_due(Utc::now() - Duration::hours(2)).await?;
        assert_eq!(summary.due, 0);

        let later = Utc::now() + Duration::hours(2);
        let summary = dispatcher.run_due(later).await?;
        assert_eq!((summary.due, summary.dispatched), (1, 1));

        let reports = reporting.get_reports(&ReportFilter::default()).await?;
        assert_eq!(reports.total, 1);
        assert!(reports.data[0].report_name.starts_with("Monthly board pack - "));
        assert_eq!(reports.data[0].report_period, ReportPeriod::Monthly);
        assert_eq!(notifier.count(), 1);

        let stored = dispatcher.list_schedules().await?;
        assert_eq!(stored[0].id, schedule.id);
        assert_eq!(stored[0].last_run_at.map(|t| t.timestamp()), Some(later.timestamp()));
        assert!(stored[0].next_run_at.unwrap() > later);

        // Same instant again: nothing left to do
        assert_eq!(dispatcher.run_due(later).await?.due, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_cron_rejected() {
        let store = store();
        let reporting = Arc::new(ComplianceReportingService::new(
            store.clone(),
            Arc::new(JinjaRenderer::new()),
        ));
        let dispatcher =
            ScheduledReportDispatcher::new(store.clone(), reporting, Arc::new(RecordingNotifier::default()));
        let err = dispatcher
            .create_schedule(
                CreateScheduleRequest {
                    name: "Broken".into(),
                    report_period: ReportPeriod::Weekly,
                    cron_expression: "every hour".into(),
                    recipients: vec![],
                },
                None,
            )
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }
}

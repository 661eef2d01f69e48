// grc-core/src/application/scheduler.rs

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cron::Schedule;
use tracing::{debug, error, info};

use crate::application::dispatch::ScheduledReportDispatcher;
use crate::application::reminders::ReviewReminderJob;
use crate::application::reporting::ComplianceReportingService;
use crate::domain::compliance::ReportPeriod;
use crate::domain::schedule::{next_fire, parse_cron};
use crate::domain::DomainError;
use crate::error::GrcError;

/// Work the scheduler can fire. Errors are logged by the scheduler, never propagated.
#[async_trait]
pub trait ScheduledTask: Send + Sync {
    fn name(&self) -> &'static str;
    async fn execute(&self, now: DateTime<Utc>) -> Result<(), GrcError>;
}

#[async_trait]
impl ScheduledTask for ScheduledReportDispatcher {
    fn name(&self) -> &'static str {
        "report-dispatch"
    }

    async fn execute(&self, now: DateTime<Utc>) -> Result<(), GrcError> {
        self.run_due(now).await.map(|_| ())
    }
}

#[async_trait]
impl ScheduledTask for ReviewReminderJob {
    fn name(&self) -> &'static str {
        "review-reminders"
    }

    async fn execute(&self, now: DateTime<Utc>) -> Result<(), GrcError> {
        self.run(now.date_naive()).await.map(|_| ())
    }
}

/// Daily snapshot of the day that just ended.
pub struct SnapshotJob {
    reporting: Arc<ComplianceReportingService>,
}

impl SnapshotJob {
    pub fn new(reporting: Arc<ComplianceReportingService>) -> Self {
        Self { reporting }
    }
}

#[async_trait]
impl ScheduledTask for SnapshotJob {
    fn name(&self) -> &'static str {
        "daily-snapshot"
    }

    async fn execute(&self, now: DateTime<Utc>) -> Result<(), GrcError> {
        let (day, _) = ReportPeriod::Daily.last_complete(now.date_naive());
        self.reporting.ensure_snapshot_for_date(day).await.map(|_| ())
    }
}

struct Entry {
    schedule: Schedule,
    task: Arc<dyn ScheduledTask>,
    next: Option<DateTime<Utc>>,
}

#[derive(Default)]
pub struct Scheduler {
    entries: Vec<Entry>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// First fire is the first cron match after `from`.
    pub fn add(
        &mut self,
        expression: &str,
        task: Arc<dyn ScheduledTask>,
        from: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        let schedule = parse_cron(expression)?;
        let next = next_fire(&schedule, from);
        info!(job = task.name(), cron = expression, next = ?next, "Job scheduled");
        self.entries.push(Entry {
            schedule,
            task,
            next,
        });
        Ok(())
    }

    pub fn next_wake(&self) -> Option<DateTime<Utc>> {
        self.entries.iter().filter_map(|e| e.next).min()
    }

    /// Runs every job whose fire time is at or before `now`, once, then moves it to its
    /// next fire after `now`. Returns how many jobs ran.
    pub async fn run_due(&mut self, now: DateTime<Utc>) -> usize {
        let mut ran = 0;
        for entry in &mut self.entries {
            if !entry.next.is_some_and(|next| next <= now) {
                continue;
            }
            debug!(job = entry.task.name(), "Running scheduled job");
            if let Err(e) = entry.task.execute(now).await {
                error!(job = entry.task.name(), error = %e, "Scheduled job failed");
            }
            entry.next = next_fire(&entry.schedule, now);
            ran += 1;
        }
        ran
    }

    /// Sleeps until the earliest fire time, runs what is due, repeats until `shutdown` resolves.
    pub async fn run_until<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        loop {
            let Some(next) = self.next_wake() else {
                info!("No scheduled jobs, waiting for shutdown");
                shutdown.await;
                return;
            };
            let wait = (next - Utc::now()).to_std().unwrap_or_default();
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Scheduler stopped");
                    return;
                }
                _ = tokio::time::sleep(wait) => {
                    self.run_due(Utc::now()).await;
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::application::notify::testing::RecordingNotifier;
    use crate::application::reporting::tests::store;
    use crate::domain::compliance::ReportFilter;
    use crate::infrastructure::templates::JinjaRenderer;
    use anyhow::Result;
    use chrono::Duration;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counting {
        runs: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl ScheduledTask for Counting {
        fn name(&self) -> &'static str {
            "counting"
        }

        async fn execute(&self, _now: DateTime<Utc>) -> Result<(), GrcError> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(GrcError::InternalError("job exploded".into()));
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_run_due_runs_each_job_once() {
        let start = Utc::now();
        let hourly = Arc::new(Counting::default());
        let failing = Arc::new(Counting {
            fail: true,
            ..Default::default()
        });
        let mut scheduler = Scheduler::new();
        scheduler.add("0 0 * * * *", hourly.clone(), start).unwrap();
        scheduler.add("0 0 0 * * *", failing.clone(), start).unwrap();

        assert_eq!(scheduler.run_due(start).await, 0);

        let later = start + Duration::days(2);
        assert_eq!(scheduler.run_due(later).await, 2);
        assert_eq!(hourly.runs.load(Ordering::SeqCst), 1);
        assert_eq!(failing.runs.load(Ordering::SeqCst), 1);
        assert!(scheduler.next_wake().unwrap() > later);
    }

    #[tokio::test]
    async fn test_invalid_expression() {
        let mut scheduler = Scheduler::new();
        let err = scheduler
            .add("not a cron", Arc::new(Counting::default()), Utc::now())
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidSchedule { .. }));
    }

    #[tokio::test]
    async fn test_run_until_stops_on_shutdown() {
        let every_second = Arc::new(Counting::default());
        let mut scheduler = Scheduler::new();
        scheduler.add("* * * * * *", every_second.clone(), Utc::now()).unwrap();

        scheduler
            .run_until(tokio::time::sleep(std::time::Duration::from_millis(2500)))
            .await;
        assert!(every_second.runs.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn test_snapshot_job_twice_creates_one_report() -> Result<()> {
        let store = store();
        let reporting = Arc::new(ComplianceReportingService::new(
            store.clone(),
            Arc::new(JinjaRenderer::new()),
        ));
        let job = SnapshotJob::new(reporting.clone());
        let now = Utc::now();
        job.execute(now).await?;
        job.execute(now).await?;

        let reports = reporting.get_reports(&ReportFilter::default()).await?;
        assert_eq!(reports.total, 1);
        assert_eq!(
            reports.data[0].period_start_date,
            now.date_naive() - Duration::days(1)
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_reminder_task_uses_calendar_day() -> Result<()> {
        let store = store();
        let job: Arc<dyn ScheduledTask> =
            Arc::new(ReviewReminderJob::new(store, Arc::new(RecordingNotifier::default())));
        assert_eq!(job.name(), "review-reminders");
        job.execute(Utc::now()).await?;
        Ok(())
    }
}

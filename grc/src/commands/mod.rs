// grc/src/commands/mod.rs

pub mod daemon;
pub mod dashboard;
pub mod import;
pub mod init;
pub mod jobs;
pub mod notifications;
pub mod report;
pub mod schedule;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, bail};
use uuid::Uuid;

use grc_core::application::{
    ComplianceReportingService, ReviewReminderJob, ScheduledReportDispatcher,
};
use grc_core::infrastructure::config::{Settings, load_settings};
use grc_core::infrastructure::{DuckDbStore, FanOutNotifier, JinjaRenderer, LogNotifier};
use grc_core::ports::{NoopNotifier, Notifier, UserRepository};

/// Loaded settings plus the adapters every command wires its services from.
pub struct Workspace {
    pub settings: Settings,
    pub store: Arc<DuckDbStore>,
    pub notifier: Arc<dyn Notifier>,
    // Shared so every job serialises on the same generation lock
    reporting: Arc<ComplianceReportingService>,
}

impl Workspace {
    pub fn open(project_dir: &Path) -> anyhow::Result<Self> {
        let settings = load_settings(project_dir).with_context(|| {
            format!("Failed to load grc settings from {:?}", project_dir)
        })?;
        let db_path = settings.database_path(project_dir);
        let store = Arc::new(
            DuckDbStore::new(&db_path)
                .with_context(|| format!("Failed to open DuckDB at {}", db_path))?,
        );
        let notifier = build_notifier(&settings, &store);
        let limits = &settings.reporting;
        let reporting = Arc::new(
            ComplianceReportingService::new(store.clone(), Arc::new(JinjaRenderer::new()))
                .with_page_limits(limits.default_page_size, limits.max_page_size),
        );
        Ok(Self {
            settings,
            store,
            notifier,
            reporting,
        })
    }

    pub fn reporting(&self) -> Arc<ComplianceReportingService> {
        self.reporting.clone()
    }

    pub fn dispatcher(&self) -> ScheduledReportDispatcher {
        ScheduledReportDispatcher::new(self.store.clone(), self.reporting(), self.notifier.clone())
    }

    pub fn reminders(&self) -> ReviewReminderJob {
        ReviewReminderJob::new(self.store.clone(), self.notifier.clone())
    }

    /// Accepts a user id or an email address.
    pub async fn resolve_user(&self, who: &str) -> anyhow::Result<Uuid> {
        if let Ok(id) = who.parse::<Uuid>() {
            return Ok(id);
        }
        let users = self.store.list_users().await?;
        match users.iter().find(|u| u.email.eq_ignore_ascii_case(who)) {
            Some(user) => Ok(user.id),
            None => bail!("No user with email '{}'", who),
        }
    }
}

fn build_notifier(settings: &Settings, store: &Arc<DuckDbStore>) -> Arc<dyn Notifier> {
    let mut channels: Vec<Arc<dyn Notifier>> = Vec::new();
    if settings.notifications.enabled {
        channels.push(store.clone());
    }
    if settings.notifications.email_log {
        channels.push(Arc::new(LogNotifier));
    }
    match channels.len() {
        0 => Arc::new(NoopNotifier),
        1 => channels.remove(0),
        _ => Arc::new(FanOutNotifier::new(channels)),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use grc_core::infrastructure::config::settings::CONFIG_CANDIDATES;

    #[test]
    fn test_jobs_share_one_reporting_service() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        std::fs::write(
            dir.path().join(CONFIG_CANDIDATES[0]),
            Settings::new("acme").to_yaml()?,
        )?;
        let ws = Workspace::open(dir.path())?;
        assert!(Arc::ptr_eq(&ws.reporting(), &ws.reporting()));
        Ok(())
    }
}

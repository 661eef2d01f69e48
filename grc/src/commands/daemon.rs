// grc/src/commands/daemon.rs
//
// USE CASE: Long-running scheduler (report dispatch, daily snapshot, review reminders).

use std::sync::Arc;

use chrono::Utc;
use grc_core::application::{Scheduler, SnapshotJob};
use tracing::info;

use super::Workspace;

pub async fn execute(ws: &Workspace) -> anyhow::Result<()> {
    let config = &ws.settings.scheduler;
    if !config.enabled {
        println!("⏸️  Scheduler disabled in settings (scheduler.enabled: false)");
        return Ok(());
    }

    let now = Utc::now();
    let mut scheduler = Scheduler::new();
    scheduler.add(&config.dispatch_cron, Arc::new(ws.dispatcher()), now)?;
    scheduler.add(&config.snapshot_cron, Arc::new(SnapshotJob::new(ws.reporting())), now)?;
    scheduler.add(&config.reminder_cron, Arc::new(ws.reminders()), now)?;

    println!("🔁 Scheduler running for '{}'. Press Ctrl-C to stop.", ws.settings.name);
    scheduler
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            }
        })
        .await;
    info!("Scheduler shut down");
    Ok(())
}

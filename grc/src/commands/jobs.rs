// grc/src/commands/jobs.rs
//
// USE CASE: Run one scheduler job by hand (cron-less environments, backfills).

use chrono::{NaiveDate, Utc};
use grc_core::domain::compliance::ReportPeriod;

use super::Workspace;

pub async fn snapshot(ws: &Workspace, date: Option<NaiveDate>) -> anyhow::Result<()> {
    let date = date.unwrap_or_else(|| ReportPeriod::Daily.last_complete(Utc::now().date_naive()).0);
    match ws.reporting().ensure_snapshot_for_date(date).await? {
        Some(report) => println!(
            "📸 Snapshot for {} captured: {:.1}% ({})",
            date, report.overall_compliance_score, report.overall_compliance_rating
        ),
        None => println!("ℹ️  Snapshot for {} already exists", date),
    }
    Ok(())
}

pub async fn remind(ws: &Workspace, date: Option<NaiveDate>) -> anyhow::Result<()> {
    let today = date.unwrap_or_else(|| Utc::now().date_naive());
    let summary = ws.reminders().run(today).await?;
    println!(
        "⏰ Reminders for {}: {} checked, {} sent, {} already sent, {} failed",
        today, summary.checked, summary.sent, summary.already_sent, summary.failed
    );
    Ok(())
}

pub async fn dispatch(ws: &Workspace) -> anyhow::Result<()> {
    let summary = ws.dispatcher().run_due(Utc::now()).await?;
    println!(
        "📨 {} schedule(s) due, {} dispatched, {} failed",
        summary.due, summary.dispatched, summary.failed
    );
    if summary.failed > 0 {
        anyhow::bail!("❌ {} scheduled report(s) failed", summary.failed);
    }
    Ok(())
}

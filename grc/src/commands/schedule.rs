// grc/src/commands/schedule.rs
//
// USE CASE: Manage report schedules.

use comfy_table::Table;
use grc_core::domain::schedule::CreateScheduleRequest;

use super::Workspace;
use crate::cli::ScheduleCommand;

pub async fn execute(ws: &Workspace, action: ScheduleCommand) -> anyhow::Result<()> {
    let dispatcher = ws.dispatcher();

    match action {
        ScheduleCommand::Add {
            name,
            period,
            cron,
            recipients,
        } => {
            let mut resolved = Vec::with_capacity(recipients.len());
            for who in &recipients {
                resolved.push(ws.resolve_user(who).await?);
            }
            let schedule = dispatcher
                .create_schedule(
                    CreateScheduleRequest {
                        name,
                        report_period: period,
                        cron_expression: cron,
                        recipients: resolved,
                    },
                    None,
                )
                .await?;
            println!(
                "🗓️  Schedule '{}' created, next run {}",
                schedule.name,
                schedule
                    .next_run_at
                    .map_or_else(|| "never".to_string(), |t| t.to_rfc3339())
            );
        }

        ScheduleCommand::List => {
            let schedules = dispatcher.list_schedules().await?;
            let mut table = Table::new();
            table.set_header(vec!["Name", "Period", "Cron", "Recipients", "Last run", "Next run"]);
            for s in &schedules {
                table.add_row(vec![
                    s.name.clone(),
                    s.report_period.to_string(),
                    s.cron_expression.clone(),
                    s.recipients.len().to_string(),
                    s.last_run_at.map_or_else(|| "-".to_string(), |t| t.to_rfc3339()),
                    s.next_run_at.map_or_else(|| "-".to_string(), |t| t.to_rfc3339()),
                ]);
            }
            println!("{table}");
        }
    }
    Ok(())
}

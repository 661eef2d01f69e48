// grc/src/cli.rs
//
// Single source of truth for all CLI definitions (Clap structs).

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use grc_core::domain::compliance::ReportPeriod;
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "grc")]
#[command(about = "Compliance scoring, policy lifecycle and governance reporting", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Project directory (holds grc.yaml)
    #[arg(long, global = true, default_value = ".")]
    pub project_dir: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 🏗️  Writes a default grc.yaml and creates the database
    Init {
        /// Project name (defaults to the directory name)
        #[arg(long)]
        name: Option<String>,
    },

    /// 📥 Loads users, policies, controls and schedules from a YAML dataset
    Import { file: PathBuf },

    /// 📊 Compliance reports
    Report {
        #[command(subcommand)]
        action: ReportCommand,
    },

    /// 🧭 Headline figures of the latest report
    Dashboard {
        #[arg(long)]
        json: bool,
    },

    /// 📸 Daily snapshot (defaults to yesterday). Does nothing if it already exists.
    Snapshot {
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// ⏰ Sends review reminders due today (or on --date)
    Remind {
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// 📨 Runs report schedules that are due now
    Dispatch,

    /// 🗓️  Report schedules
    Schedule {
        #[command(subcommand)]
        action: ScheduleCommand,
    },

    /// 🔁 Runs dispatch, snapshot and reminder jobs on their cron until Ctrl-C
    Daemon,

    /// 🔔 In-app notifications of a user (email or id)
    Notifications {
        #[arg(long)]
        user: String,

        #[arg(long)]
        unread: bool,

        /// Mark the listed notifications as read
        #[arg(long)]
        mark_read: bool,
    },
}

#[derive(Subcommand)]
pub enum ReportCommand {
    /// Generates a report. Without dates, covers the last complete period.
    Generate {
        #[arg(long, default_value = "monthly")]
        period: ReportPeriod,

        #[arg(long, requires = "end")]
        start: Option<NaiveDate>,

        #[arg(long, requires = "start")]
        end: Option<NaiveDate>,

        #[arg(long)]
        name: Option<String>,
    },

    /// Lists reports, newest first
    List {
        #[arg(long)]
        period: Option<ReportPeriod>,

        #[arg(long)]
        include_archived: bool,

        #[arg(long, default_value = "0")]
        skip: u64,

        #[arg(long)]
        take: Option<u32>,
    },

    Show {
        id: Uuid,

        #[arg(long)]
        json: bool,
    },

    /// Latest non-archived report
    Latest,

    Archive { id: Uuid },

    /// Locks the narrative of a report
    Finalize { id: Uuid },

    /// Writes the full report as JSON
    Export {
        id: Uuid,

        #[arg(long, short)]
        output: PathBuf,
    },
}

#[derive(Subcommand)]
pub enum ScheduleCommand {
    Add {
        #[arg(long)]
        name: String,

        #[arg(long, default_value = "monthly")]
        period: ReportPeriod,

        /// Six-field cron expression (sec min hour day month weekday)
        #[arg(long)]
        cron: String,

        /// Recipient email or id; repeatable
        #[arg(long = "recipient")]
        recipients: Vec<String>,
    },

    List,
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Result, bail};
    use clap::Parser;

    #[test]
    fn test_cli_parse_report_generate_defaults() -> Result<()> {
        let args = Cli::parse_from(["grc", "report", "generate"]);
        assert_eq!(args.project_dir.to_string_lossy(), ".");
        match args.command {
            Commands::Report {
                action:
                    ReportCommand::Generate {
                        period,
                        start,
                        end,
                        name,
                    },
            } => {
                assert_eq!(period, ReportPeriod::Monthly);
                assert_eq!((start, end, name), (None, None, None));
                Ok(())
            }
            _ => bail!("Expected report generate"),
        }
    }

    #[test]
    fn test_cli_parse_explicit_period() -> Result<()> {
        let args = Cli::parse_from([
            "grc",
            "report",
            "generate",
            "--period",
            "quarterly",
            "--start",
            "2026-01-01",
            "--end",
            "2026-03-31",
            "--project-dir",
            "/tmp",
        ]);
        assert_eq!(args.project_dir.to_string_lossy(), "/tmp");
        match args.command {
            Commands::Report {
                action: ReportCommand::Generate { period, start, .. },
            } => {
                assert_eq!(period, ReportPeriod::Quarterly);
                assert_eq!(start, NaiveDate::from_ymd_opt(2026, 1, 1));
                Ok(())
            }
            _ => bail!("Expected report generate"),
        }
    }

    #[test]
    fn test_cli_start_requires_end() {
        let parsed = Cli::try_parse_from(["grc", "report", "generate", "--start", "2026-01-01"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_cli_parse_schedule_recipients() -> Result<()> {
        let args = Cli::parse_from([
            "grc",
            "schedule",
            "add",
            "--name",
            "Board pack",
            "--cron",
            "0 0 6 1 * *",
            "--recipient",
            "ciso@acme.test",
            "--recipient",
            "cfo@acme.test",
        ]);
        match args.command {
            Commands::Schedule {
                action: ScheduleCommand::Add { recipients, period, .. },
            } => {
                assert_eq!(recipients.len(), 2);
                assert_eq!(period, ReportPeriod::Monthly);
                Ok(())
            }
            _ => bail!("Expected schedule add"),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_period() {
        assert!(Cli::try_parse_from(["grc", "report", "list", "--period", "hourly"]).is_err());
    }
}

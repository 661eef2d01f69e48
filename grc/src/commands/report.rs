// grc/src/commands/report.rs
//
// USE CASE: Generate, browse and export compliance reports.

use chrono::Utc;
use comfy_table::{ContentArrangement, Table};
use grc_core::domain::compliance::{ComplianceReport, GenerateReportRequest, ReportFilter};

use super::Workspace;
use crate::cli::ReportCommand;

pub async fn execute(ws: &Workspace, action: ReportCommand) -> anyhow::Result<()> {
    let reporting = ws.reporting();

    match action {
        ReportCommand::Generate {
            period,
            start,
            end,
            name,
        } => {
            let (start, end) = match (start, end) {
                (Some(start), Some(end)) => (start, end),
                _ => period.last_complete(Utc::now().date_naive()),
            };
            println!("📊 Generating {} report for {} .. {}", period, start, end);
            let mut request = GenerateReportRequest::new(period, start, end);
            request.report_name = name;
            let report = reporting.generate_report(request, None).await?;
            print_summary(&report);
        }

        ReportCommand::List {
            period,
            include_archived,
            skip,
            take,
        } => {
            let filter = ReportFilter {
                report_period: period,
                include_archived: Some(include_archived),
                skip: Some(skip),
                take,
                ..Default::default()
            };
            let page = reporting.get_reports(&filter).await?;
            let mut table = Table::new();
            table
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["Id", "Name", "Period", "Start", "End", "Score", "Rating", "Flags"]);
            for r in &page.data {
                table.add_row(vec![
                    r.id.to_string(),
                    r.report_name.clone(),
                    r.report_period.to_string(),
                    r.period_start_date.to_string(),
                    r.period_end_date.to_string(),
                    format!("{:.1}", r.overall_compliance_score),
                    r.overall_compliance_rating.to_string(),
                    flags(r),
                ]);
            }
            println!("{table}");
            println!("{} of {} report(s)", page.data.len(), page.total);
        }

        ReportCommand::Show { id, json } => {
            let report = reporting.get_report(id).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_details(&report);
            }
        }

        ReportCommand::Latest => match reporting.get_latest_report().await? {
            Some(report) => print_details(&report),
            None => println!("ℹ️  No reports yet. Run `grc report generate`."),
        },

        ReportCommand::Archive { id } => {
            let report = reporting.archive_report(id).await?;
            println!("🗄️  Archived '{}'", report.report_name);
        }

        ReportCommand::Finalize { id } => {
            let report = reporting.finalize_report(id).await?;
            println!("🔒 Finalized '{}'", report.report_name);
        }

        ReportCommand::Export { id, output } => {
            let report = reporting.export_report(id, &output).await?;
            println!("📄 '{}' exported to {}", report.report_name, output.display());
        }
    }
    Ok(())
}

fn flags(report: &ComplianceReport) -> String {
    let mut flags = Vec::new();
    if report.is_final {
        flags.push("final");
    }
    if report.is_archived {
        flags.push("archived");
    }
    flags.join(",")
}

fn print_summary(report: &ComplianceReport) {
    println!("✨ Report {} generated", report.id);
    println!(
        "   Overall: {:.1}% ({})",
        report.overall_compliance_score, report.overall_compliance_rating
    );
}

fn print_details(report: &ComplianceReport) {
    println!("📊 {} [{}]", report.report_name, report.id);
    println!(
        "   {} .. {} ({})",
        report.period_start_date, report.period_end_date, report.report_period
    );

    let mut scores = Table::new();
    scores.set_header(vec!["Area", "Score", "Detail"]);
    scores.add_row(vec![
        "Overall".to_string(),
        format!("{:.1}", report.overall_compliance_score),
        report.overall_compliance_rating.to_string(),
    ]);
    scores.add_row(vec![
        "Policies".to_string(),
        format!("{:.1}", report.policies_compliance_score),
        format!(
            "{} total, {} published, {} acknowledged ({:.1}%)",
            report.total_policies,
            report.policies_published,
            report.policies_acknowledged,
            report.policy_acknowledgment_rate
        ),
    ]);
    scores.add_row(vec![
        "Controls".to_string(),
        format!("{:.1}", report.controls_compliance_score),
        format!(
            "{} total, {} implemented, {} partial, {} not implemented",
            report.total_controls,
            report.controls_implemented,
            report.controls_partial,
            report.controls_not_implemented
        ),
    ]);
    scores.add_row(vec![
        "Assets".to_string(),
        format!("{:.1}", report.assets_compliance_score),
        format!("{} of {} compliant", report.assets_compliant, report.total_assets),
    ]);
    println!("{scores}");

    if !report.department_breakdown.is_empty() {
        let mut departments = Table::new();
        departments.set_header(vec!["Department", "Score", "Rating", "Policies", "Controls", "Assets"]);
        for d in &report.department_breakdown {
            departments.add_row(vec![
                d.department.clone(),
                format!("{:.1}", d.overall_score),
                d.rating.to_string(),
                d.total_policies.to_string(),
                d.total_controls.to_string(),
                d.total_assets.to_string(),
            ]);
        }
        println!("{departments}");
    }

    println!(
        "   Gaps: {} critical, {} medium, {} low",
        report.critical_gaps, report.medium_gaps, report.low_gaps
    );
    println!("   Trend: {}", report.trend_direction);
    println!("\n{}\n\n{}\n\n{}", report.executive_summary, report.key_findings, report.recommendations);
}

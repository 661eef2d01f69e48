// grc/src/commands/dashboard.rs
//
// USE CASE: Headline figures of the latest report.

use comfy_table::Table;

use super::Workspace;

pub async fn execute(ws: &Workspace, json: bool) -> anyhow::Result<()> {
    let dashboard = match ws.reporting().get_dashboard().await {
        Ok(dashboard) => dashboard,
        Err(e) if e.is_not_found() => {
            println!("ℹ️  No reports yet. Run `grc report generate` or `grc snapshot`.");
            return Ok(());
        }
        Err(e) => return Err(anyhow::Error::from(e)),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&dashboard)?);
        return Ok(());
    }

    println!(
        "🧭 Compliance {:.1}% ({}), report {} generated {}",
        dashboard.overall_score,
        dashboard.overall_rating,
        dashboard.report_id,
        dashboard.generated_at.format("%Y-%m-%d %H:%M UTC")
    );
    let mut table = Table::new();
    table.set_header(vec!["Metric", "Value"]);
    let rows = [
        ("Policies", dashboard.policies.total.to_string()),
        ("Published", dashboard.policies.published.to_string()),
        ("Acknowledgment rate", format!("{:.1}%", dashboard.policies.acknowledgment_rate)),
        ("Controls", dashboard.controls.total.to_string()),
        ("Implemented", dashboard.controls.implemented.to_string()),
        ("Control effectiveness", format!("{:.1}", dashboard.controls.effectiveness)),
        ("Assets compliant", format!("{} / {}", dashboard.assets.compliant, dashboard.assets.total)),
        (
            "Gaps (critical/medium/low)",
            format!("{}/{}/{}", dashboard.gaps.critical, dashboard.gaps.medium, dashboard.gaps.low),
        ),
        ("Trend", dashboard.trend.direction.to_string()),
        ("Projected next period", format!("{:.1}", dashboard.trend.projected_score)),
        (
            "Days to EXCELLENT",
            dashboard
                .trend
                .days_to_excellent
                .map_or_else(|| "-".to_string(), |d| d.to_string()),
        ),
    ];
    for (metric, value) in rows {
        table.add_row(vec![metric.to_string(), value]);
    }
    println!("{table}");
    Ok(())
}

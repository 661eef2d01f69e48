// grc/src/commands/import.rs
//
// USE CASE: Seed the store from a YAML dataset.

use std::path::Path;

use anyhow::Context;
use comfy_table::Table;
use grc_core::application::DatasetImporter;

use super::Workspace;

pub async fn execute(ws: &Workspace, file: &Path) -> anyhow::Result<()> {
    println!("📥 Importing {}...", file.display());
    let summary = DatasetImporter::new(ws.store.clone())
        .import_file(file)
        .await
        .with_context(|| format!("Import of {:?} failed", file))?;

    let mut table = Table::new();
    table.set_header(vec!["Entity", "Imported"]);
    for (entity, count) in [
        ("users", summary.users),
        ("policies", summary.policies),
        ("assignments", summary.assignments),
        ("controls", summary.controls),
        ("asset mappings", summary.mappings),
        ("schedules", summary.schedules),
    ] {
        table.add_row(vec![entity.to_string(), count.to_string()]);
    }
    println!("{table}");
    println!("✨ Import complete");
    Ok(())
}

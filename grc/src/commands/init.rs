// grc/src/commands/init.rs
//
// USE CASE: Scaffold a project (grc.yaml + database).

use std::path::Path;

use anyhow::Context;
use grc_core::infrastructure::DuckDbStore;
use grc_core::infrastructure::config::Settings;
use grc_core::infrastructure::config::settings::CONFIG_CANDIDATES;
use grc_core::infrastructure::fs::write_if_absent;

pub fn execute(project_dir: &Path, name: Option<String>) -> anyhow::Result<()> {
    std::fs::create_dir_all(project_dir)
        .with_context(|| format!("Failed to create {:?}", project_dir))?;

    let name = name.unwrap_or_else(|| {
        project_dir
            .canonicalize()
            .ok()
            .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .unwrap_or_else(|| "grc".to_string())
    });
    let settings = Settings::new(name);
    let config_path = project_dir.join(CONFIG_CANDIDATES[0]);

    if write_if_absent(&config_path, settings.to_yaml()?)? {
        println!("📝 Wrote {}", config_path.display());
    } else {
        println!("ℹ️  {} already exists, left untouched", config_path.display());
    }

    let settings = grc_core::infrastructure::config::load_settings(project_dir)?;
    let db_path = settings.database_path(project_dir);
    DuckDbStore::new(&db_path).with_context(|| format!("Failed to create DuckDB at {}", db_path))?;
    println!("✨ Project '{}' ready (database: {})", settings.name, db_path);
    Ok(())
}

// grc-core/src/infrastructure/config/settings.rs

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use validator::{Validate, ValidationError};

use crate::domain::page::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::domain::schedule::parse_cron;
use crate::infrastructure::error::InfrastructureError;

pub const CONFIG_CANDIDATES: [&str; 2] = ["grc.yaml", "grc.yml"];

#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct Settings {
    #[validate(length(min = 1))]
    pub name: String,

    /// DuckDB file, relative to the project directory, or `:memory:`.
    #[serde(default = "default_database")]
    #[validate(length(min = 1))]
    pub database: String,

    #[serde(default)]
    #[validate(nested)]
    pub reporting: ReportingSettings,

    #[serde(default)]
    #[validate(nested)]
    pub scheduler: SchedulerSettings,

    #[serde(default)]
    pub notifications: NotificationSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
#[validate(schema(function = "validate_page_sizes"))]
pub struct ReportingSettings {
    #[validate(range(min = 1))]
    pub default_page_size: u32,
    #[validate(range(min = 1, max = 1000))]
    pub max_page_size: u32,
}

impl Default for ReportingSettings {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
        }
    }
}

fn validate_page_sizes(reporting: &ReportingSettings) -> Result<(), ValidationError> {
    if reporting.default_page_size > reporting.max_page_size {
        return Err(ValidationError::new("default_page_size_above_max"));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct SchedulerSettings {
    pub enabled: bool,
    #[validate(custom(function = "validate_cron"))]
    pub dispatch_cron: String,
    #[validate(custom(function = "validate_cron"))]
    pub snapshot_cron: String,
    #[validate(custom(function = "validate_cron"))]
    pub reminder_cron: String,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            dispatch_cron: "0 0 * * * *".to_string(),
            snapshot_cron: "0 0 0 * * *".to_string(),
            reminder_cron: "0 0 8 * * *".to_string(),
        }
    }
}

fn validate_cron(expression: &str) -> Result<(), ValidationError> {
    parse_cron(expression)
        .map(|_| ())
        .map_err(|_| ValidationError::new("invalid_cron"))
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotificationSettings {
    /// In-app inbox (stored notifications).
    pub enabled: bool,
    /// Log an email line for each notification.
    #[serde(default = "default_true")]
    pub email_log: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            email_log: true,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_database() -> String {
    "grc.duckdb".to_string()
}

impl Settings {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            database: default_database(),
            reporting: ReportingSettings::default(),
            scheduler: SchedulerSettings::default(),
            notifications: NotificationSettings::default(),
        }
    }

    pub fn to_yaml(&self) -> Result<String, InfrastructureError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Database location resolved against the project directory.
    pub fn database_path(&self, project_dir: &Path) -> String {
        if self.database == ":memory:" || Path::new(&self.database).is_absolute() {
            self.database.clone()
        } else {
            project_dir.join(&self.database).to_string_lossy().into_owned()
        }
    }
}

#[instrument(skip(project_dir))]
pub fn load_settings(project_dir: &Path) -> Result<Settings, InfrastructureError> {
    let config_path = find_main_config(project_dir)?;
    info!(path = ?config_path, "Loading grc settings");

    let content = fs::read_to_string(&config_path)?;
    let mut settings: Settings = serde_yaml::from_str(&content)?;

    apply_env_overrides(&mut settings);

    settings
        .validate()
        .map_err(|e| InfrastructureError::ConfigError(e.to_string()))?;
    Ok(settings)
}

pub fn find_main_config(root: &Path) -> Result<PathBuf, InfrastructureError> {
    for filename in CONFIG_CANDIDATES {
        let p = root.join(filename);
        if p.exists() {
            return Ok(p);
        }
    }
    Err(InfrastructureError::ConfigNotFound(format!(
        "{:?} (checked {:?})",
        root, CONFIG_CANDIDATES
    )))
}

fn apply_env_overrides(settings: &mut Settings) {
    if let Ok(val) = std::env::var("GRC_DATABASE") {
        info!(old = %settings.database, new = %val, "Overriding database via ENV");
        settings.database = val;
    }
    if let Ok(val) = std::env::var("GRC_SCHEDULER_ENABLED") {
        let enabled = matches!(val.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on");
        info!(enabled, "Overriding scheduler.enabled via ENV");
        settings.scheduler.enabled = enabled;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_fill_missing_sections() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("grc.yaml"), "name: acme\n")?;
        let settings = load_settings(dir.path())?;
        assert_eq!(settings.database, "grc.duckdb");
        assert_eq!(settings.reporting.default_page_size, 10);
        assert_eq!(settings.scheduler.reminder_cron, "0 0 8 * * *");
        Ok(())
    }

    #[test]
    fn test_yml_candidate_and_round_trip() -> Result<()> {
        let dir = tempdir()?;
        let settings = Settings::new("acme");
        fs::write(dir.path().join("grc.yml"), settings.to_yaml()?)?;
        // GRC_* variables are not set in the test environment
        let loaded = load_settings(dir.path())?;
        assert_eq!(loaded.name, "acme");
        Ok(())
    }

    #[test]
    fn test_invalid_cron_rejected() -> Result<()> {
        let dir = tempdir()?;
        fs::write(
            dir.path().join("grc.yaml"),
            "name: acme\nscheduler:\n  enabled: true\n  dispatch_cron: \"hourly\"\n  snapshot_cron: \"0 0 0 * * *\"\n  reminder_cron: \"0 0 8 * * *\"\n",
        )?;
        let err = load_settings(dir.path()).unwrap_err();
        assert!(matches!(err, InfrastructureError::ConfigError(_)));
        Ok(())
    }

    #[test]
    fn test_missing_config() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            load_settings(dir.path()),
            Err(InfrastructureError::ConfigNotFound(_))
        ));
    }

    #[test]
    fn test_database_path_resolution() {
        let mut settings = Settings::new("acme");
        assert_eq!(
            settings.database_path(Path::new("/srv/grc")),
            "/srv/grc/grc.duckdb"
        );
        settings.database = ":memory:".into();
        assert_eq!(settings.database_path(Path::new("/srv/grc")), ":memory:");
    }
}

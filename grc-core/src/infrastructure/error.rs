// grc-core/src/infrastructure/error.rs

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum DatabaseError {
    #[error("DuckDB Engine Error: {0}")]
    #[diagnostic(
        code(grc::infra::database::duckdb),
        help("An error occurred inside the storage engine.")
    )]
    DuckDB(#[from] duckdb::Error),

    #[error("Corrupt row in '{table}': {reason}")]
    #[diagnostic(
        code(grc::infra::database::corrupt_row),
        help("A stored value could not be decoded into its domain type.")
    )]
    CorruptRow { table: &'static str, reason: String },

    #[error("Database connection lock poisoned")]
    #[diagnostic(code(grc::infra::database::poisoned))]
    Poisoned,
}

#[derive(Error, Debug, Diagnostic)]
pub enum InfrastructureError {
    // --- DATABASE (Abstracted) ---
    #[error(transparent)]
    #[diagnostic(transparent)]
    Database(#[from] DatabaseError),

    // --- FILESYSTEM (IO) ---
    #[error("File System Error: {0}")]
    #[diagnostic(
        code(grc::infra::io),
        help("Check file permissions or path validity.")
    )]
    Io(#[from] std::io::Error),

    // --- CONFIG / YAML ---
    #[error("YAML Parsing Error: {0}")]
    #[diagnostic(
        code(grc::infra::yaml),
        help("Check your YAML syntax (indentation, types).")
    )]
    YamlError(#[from] serde_yaml::Error),

    #[error("JSON Error: {0}")]
    #[diagnostic(code(grc::infra::json))]
    JsonError(#[from] serde_json::Error),

    #[error("Configuration Error: {0}")]
    #[diagnostic(code(grc::infra::config))]
    ConfigError(String),

    #[error("Configuration not found at '{0}'")]
    #[diagnostic(
        code(grc::infra::config_missing),
        help("Run `grc init` to create a default grc.yaml.")
    )]
    ConfigNotFound(String),

    // --- TEMPLATING ---
    #[error("Template Rendering Error: {0}")]
    #[diagnostic(
        code(grc::infra::template),
        help("Check the narrative template syntax ({{ ... }}).")
    )]
    TemplateError(#[from] minijinja::Error),
}

// Shortcut for `?` on duckdb calls
impl From<duckdb::Error> for InfrastructureError {
    fn from(err: duckdb::Error) -> Self {
        InfrastructureError::Database(DatabaseError::DuckDB(err))
    }
}

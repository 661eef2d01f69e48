// grc-core/src/error.rs

use crate::domain::error::DomainError;
use crate::infrastructure::error::{DatabaseError, InfrastructureError};
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum GrcError {
    // --- DOMAIN ERRORS (Business rules, lifecycle, not found) ---
    #[error(transparent)]
    #[diagnostic(transparent)]
    Domain(#[from] DomainError),

    // --- INFRASTRUCTURE ERRORS (Storage, IO, Parsing) ---
    #[error(transparent)]
    #[diagnostic(transparent)]
    Infrastructure(#[from] InfrastructureError),

    // --- GENERIC / APPLICATION ERRORS ---
    #[error("Internal Error: {0}")]
    InternalError(String),
}

impl GrcError {
    /// HTTP-equivalent status for the outer (external) API layer.
    pub fn http_status(&self) -> u16 {
        match self {
            GrcError::Domain(DomainError::NotFound { .. }) => 404,
            GrcError::Domain(_) => 400,
            GrcError::Infrastructure(_) | GrcError::InternalError(_) => 500,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, GrcError::Domain(DomainError::NotFound { .. }))
    }

    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            GrcError::Domain(DomainError::Validation(_))
                | GrcError::Domain(DomainError::InvalidTransition { .. })
                | GrcError::Domain(DomainError::InvalidSchedule { .. })
        )
    }
}

impl From<std::io::Error> for GrcError {
    fn from(err: std::io::Error) -> Self {
        GrcError::Infrastructure(InfrastructureError::Io(err))
    }
}

impl From<duckdb::Error> for GrcError {
    fn from(err: duckdb::Error) -> Self {
        GrcError::Infrastructure(InfrastructureError::Database(DatabaseError::DuckDB(err)))
    }
}

impl From<DatabaseError> for GrcError {
    fn from(err: DatabaseError) -> Self {
        GrcError::Infrastructure(InfrastructureError::Database(err))
    }
}

impl From<serde_json::Error> for GrcError {
    fn from(err: serde_json::Error) -> Self {
        GrcError::Infrastructure(InfrastructureError::JsonError(err))
    }
}

impl From<validator::ValidationErrors> for GrcError {
    fn from(errors: validator::ValidationErrors) -> Self {
        GrcError::Domain(DomainError::from(errors))
    }
}

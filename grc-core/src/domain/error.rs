// grc-core/src/domain/error.rs

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic, PartialEq)]
pub enum DomainError {
    #[error("{entity} '{id}' not found")]
    #[diagnostic(code(grc::domain::not_found))]
    NotFound { entity: &'static str, id: String },

    #[error("Validation failed: {0}")]
    #[diagnostic(
        code(grc::domain::validation),
        help("The request was rejected before any state was changed.")
    )]
    Validation(String),

    #[error("Invalid {entity} transition: {from} -> {to}")]
    #[diagnostic(
        code(grc::domain::transition),
        help("Check the lifecycle table for the allowed transitions.")
    )]
    InvalidTransition {
        entity: &'static str,
        from: String,
        to: String,
    },

    #[error("Invalid schedule expression '{expression}': {reason}")]
    #[diagnostic(code(grc::domain::schedule))]
    InvalidSchedule { expression: String, reason: String },
}

impl DomainError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

impl From<validator::ValidationErrors> for DomainError {
    fn from(errors: validator::ValidationErrors) -> Self {
        DomainError::Validation(errors.to_string())
    }
}

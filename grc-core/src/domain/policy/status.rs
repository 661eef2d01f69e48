// grc-core/src/domain/policy/status.rs

use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PolicyStatus {
    #[default]
    Draft,
    InReview,
    Approved,
    Published,
    Archived,
}

str_enum!(PolicyStatus {
    Draft => "draft",
    InReview => "in_review",
    Approved => "approved",
    Published => "published",
    Archived => "archived",
});

impl PolicyStatus {
    /// Lifecycle table. Staying in the same status is not a transition.
    pub fn can_transition_to(self, next: PolicyStatus) -> bool {
        use PolicyStatus::*;
        matches!(
            (self, next),
            (Draft, InReview)
                | (Draft, Archived)
                | (InReview, Draft)
                | (InReview, Approved)
                | (InReview, Published)
                | (InReview, Archived)
                | (Approved, InReview)
                | (Approved, Published)
                | (Approved, Archived)
                | (Published, InReview)
                | (Published, Archived)
        )
    }

    pub fn ensure_transition(self, next: PolicyStatus) -> Result<(), DomainError> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(DomainError::InvalidTransition {
                entity: "policy",
                from: self.to_string(),
                to: next.to_string(),
            })
        }
    }

    pub fn is_terminal(self) -> bool {
        self == PolicyStatus::Archived
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_happy_path_lifecycle() {
        let path = [
            PolicyStatus::Draft,
            PolicyStatus::InReview,
            PolicyStatus::Approved,
            PolicyStatus::Published,
            PolicyStatus::Archived,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_archived_is_terminal() {
        for next in [
            PolicyStatus::Draft,
            PolicyStatus::InReview,
            PolicyStatus::Approved,
            PolicyStatus::Published,
        ] {
            assert!(PolicyStatus::Archived.ensure_transition(next).is_err());
        }
        assert!(PolicyStatus::Archived.is_terminal());
    }

    #[test]
    fn test_draft_cannot_skip_review() {
        let err = PolicyStatus::Draft
            .ensure_transition(PolicyStatus::Published)
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition { .. }));
    }

    #[test]
    fn test_parse_round_trip() {
        assert_eq!(
            PolicyStatus::from_str("IN_REVIEW").unwrap(),
            PolicyStatus::InReview
        );
        assert_eq!(PolicyStatus::Published.to_string(), "published");
        assert!(PolicyStatus::from_str("retired").is_err());
    }
}

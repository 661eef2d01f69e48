// grc-core/src/domain/policy/entity.rs

use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::status::PolicyStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReviewFrequency {
    Monthly,
    Quarterly,
    #[default]
    Annual,
    Biennial,
    Triennial,
}

str_enum!(ReviewFrequency {
    Monthly => "monthly",
    Quarterly => "quarterly",
    Annual => "annual",
    Biennial => "biennial",
    Triennial => "triennial",
});

impl ReviewFrequency {
    pub fn months(self) -> u32 {
        match self {
            Self::Monthly => 1,
            Self::Quarterly => 3,
            Self::Annual => 12,
            Self::Biennial => 24,
            Self::Triennial => 36,
        }
    }

    /// End-of-month dates are clamped by chrono (Jan 31 + 1 month = Feb 28/29).
    pub fn next_review_after(self, from: NaiveDate) -> NaiveDate {
        from.checked_add_months(Months::new(self.months()))
            .unwrap_or(from)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Policy {
    pub id: Uuid,
    pub identifier: String,
    pub title: String,
    pub policy_type: String,
    pub status: PolicyStatus,
    pub owner_id: Option<Uuid>,
    pub business_unit: Option<String>,
    pub content: Option<String>,
    pub version: String,
    pub version_number: u32,
    pub review_frequency: ReviewFrequency,
    pub next_review_date: Option<NaiveDate>,
    pub published_date: Option<NaiveDate>,
    pub is_mandatory: bool,
    pub requires_acknowledgment: bool,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Policy {
    pub fn from_request(
        request: CreatePolicyRequest,
        identifier: String,
        created_by: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            identifier,
            title: request.title,
            policy_type: request.policy_type,
            status: PolicyStatus::Draft,
            owner_id: request.owner_id,
            business_unit: request.business_unit,
            content: request.content,
            version: "1.0".to_string(),
            version_number: 1,
            review_frequency: request.review_frequency.unwrap_or_default(),
            next_review_date: request.next_review_date,
            published_date: None,
            is_mandatory: request.is_mandatory,
            requires_acknowledgment: request.requires_acknowledgment.unwrap_or(true),
            created_by,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Draft, in review or approved: everything that still has to reach `published`.
    pub fn is_unpublished(&self) -> bool {
        matches!(
            self.status,
            PolicyStatus::Draft | PolicyStatus::InReview | PolicyStatus::Approved
        )
    }

    pub fn is_review_overdue(&self, today: NaiveDate) -> bool {
        self.next_review_date.is_some_and(|d| d < today)
    }

    pub fn department(&self) -> &str {
        self.business_unit.as_deref().unwrap_or(UNASSIGNED_DEPARTMENT)
    }
}

pub const UNASSIGNED_DEPARTMENT: &str = "Unassigned";

/// `POL-<year>-<seq>` where seq counts every policy created that year, deleted ones included.
pub fn policy_identifier(created_at: DateTime<Utc>, created_this_year: u64) -> String {
    format!("POL-{}-{:04}", created_at.year(), created_this_year + 1)
}

/// Version label derived from the running version number (11 -> "1.1", 4 -> "0.4").
pub fn version_label(version_number: u32) -> String {
    format!("{}.{}", version_number / 10, version_number % 10)
}

// --- REQUESTS ---

#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default)]
pub struct CreatePolicyRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    #[validate(length(min = 1, max = 100))]
    pub policy_type: String,

    #[serde(default)]
    pub owner_id: Option<Uuid>,

    #[serde(default)]
    pub business_unit: Option<String>,

    #[serde(default)]
    pub content: Option<String>,

    #[serde(default)]
    pub review_frequency: Option<ReviewFrequency>,

    #[serde(default)]
    pub next_review_date: Option<NaiveDate>,

    #[serde(default)]
    pub is_mandatory: bool,

    #[serde(default)]
    pub requires_acknowledgment: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default)]
pub struct UpdatePolicyRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: Option<String>,
    pub status: Option<PolicyStatus>,
    pub owner_id: Option<Uuid>,
    pub business_unit: Option<String>,
    pub content: Option<String>,
    #[validate(length(max = 500))]
    pub change_summary: Option<String>,
    pub review_frequency: Option<ReviewFrequency>,
    pub next_review_date: Option<NaiveDate>,
    pub is_mandatory: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct PolicyFilter {
    pub status: Option<PolicyStatus>,
    pub owner_id: Option<Uuid>,
    pub search: Option<String>,
    pub skip: Option<u64>,
    pub take: Option<u32>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_identifier_format() {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        assert_eq!(policy_identifier(at, 0), "POL-2026-0001");
        assert_eq!(policy_identifier(at, 41), "POL-2026-0042");
    }

    #[test]
    fn test_version_label() {
        assert_eq!(version_label(1), "0.1");
        assert_eq!(version_label(4), "0.4");
        assert_eq!(version_label(11), "1.1");
    }

    #[test]
    fn test_next_review_date_clamps_month_end() {
        let jan31 = NaiveDate::from_ymd_opt(2026, 1, 31).unwrap();
        assert_eq!(
            ReviewFrequency::Monthly.next_review_after(jan31),
            NaiveDate::from_ymd_opt(2026, 2, 28).unwrap()
        );
        assert_eq!(
            ReviewFrequency::Biennial.next_review_after(jan31),
            NaiveDate::from_ymd_opt(2028, 1, 31).unwrap()
        );
    }

    #[test]
    fn test_create_request_validation() {
        let request = CreatePolicyRequest {
            title: String::new(),
            policy_type: "security".into(),
            ..Default::default()
        };
        assert!(request.validate().is_err());
    }
}

// grc-core/src/domain/control/unified.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::status::ImplementationStatus;

/// Reusable control definition, mappable to many assets.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UnifiedControl {
    pub id: Uuid,
    pub identifier: String,
    pub title: String,
    pub domain: Option<String>,
    pub business_unit: Option<String>,
    pub implementation_status: ImplementationStatus,
    pub control_owner_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl UnifiedControl {
    pub fn from_request(request: CreateControlRequest, identifier: String, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            identifier,
            title: request.title,
            domain: request.domain,
            business_unit: request.business_unit,
            implementation_status: request.implementation_status.unwrap_or_default(),
            control_owner_id: request.control_owner_id,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}

/// `UCL-<seq>`, seq counting every control ever created.
pub fn control_identifier(existing: u64) -> String {
    format!("UCL-{:04}", existing + 1)
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default)]
pub struct CreateControlRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub business_unit: Option<String>,
    #[serde(default)]
    pub implementation_status: Option<ImplementationStatus>,
    #[serde(default)]
    pub control_owner_id: Option<Uuid>,
}

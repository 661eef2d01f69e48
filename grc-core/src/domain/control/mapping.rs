// grc-core/src/domain/control/mapping.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::status::{AssetType, ImplementationStatus};

/// A control applied to one concrete asset, with its own status and score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ControlAssetMapping {
    pub id: Uuid,
    pub control_id: Uuid,
    pub asset_id: Uuid,
    pub asset_type: AssetType,
    pub asset_name: Option<String>,
    pub business_unit: Option<String>,
    pub implementation_status: ImplementationStatus,
    pub effectiveness_score: Option<f64>,
    pub mapped_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl ControlAssetMapping {
    pub fn from_request(control_id: Uuid, request: MapAssetRequest, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            control_id,
            asset_id: request.asset_id,
            asset_type: request.asset_type,
            asset_name: request.asset_name,
            business_unit: request.business_unit,
            implementation_status: request.implementation_status.unwrap_or_default(),
            effectiveness_score: request.effectiveness_score,
            mapped_at: now,
            deleted_at: None,
        }
    }

    /// Assets are identified by type and id together.
    pub fn asset_key(&self) -> (AssetType, Uuid) {
        (self.asset_type, self.asset_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MapAssetRequest {
    pub asset_id: Uuid,
    pub asset_type: AssetType,
    #[serde(default)]
    pub asset_name: Option<String>,
    #[serde(default)]
    pub business_unit: Option<String>,
    #[serde(default)]
    pub implementation_status: Option<ImplementationStatus>,
    #[serde(default)]
    #[validate(range(min = 0.0, max = 100.0))]
    pub effectiveness_score: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default)]
pub struct UpdateMappingRequest {
    pub implementation_status: Option<ImplementationStatus>,
    #[validate(range(min = 0.0, max = 100.0))]
    pub effectiveness_score: Option<f64>,
}

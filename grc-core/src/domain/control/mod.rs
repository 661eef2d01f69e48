// grc-core/src/domain/control/mod.rs

pub mod mapping;
pub mod objective;
pub mod status;
pub mod unified;

pub use mapping::{ControlAssetMapping, MapAssetRequest, UpdateMappingRequest};
pub use objective::{ControlObjective, CreateObjectiveRequest, UpdateObjectiveRequest};
pub use status::{AssetType, ControlBucket, ImplementationStatus};
pub use unified::{CreateControlRequest, UnifiedControl, control_identifier};

// grc-core/src/application/controls.rs

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::application::notify::notify_best_effort;
use crate::domain::control::{
    ControlAssetMapping, ControlObjective, CreateControlRequest, CreateObjectiveRequest,
    ImplementationStatus, MapAssetRequest, UnifiedControl, UpdateMappingRequest,
    UpdateObjectiveRequest, control_identifier,
};
use crate::domain::notification::{EntityType, Notification};
use crate::domain::DomainError;
use crate::error::GrcError;
use crate::ports::{GrcStore, Notifier};

/// Unified controls, their asset mappings and the control objectives derived from policies.
pub struct ControlService {
    store: Arc<dyn GrcStore>,
    notifier: Arc<dyn Notifier>,
}

impl ControlService {
    pub fn new(store: Arc<dyn GrcStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, notifier }
    }

    // --- UNIFIED CONTROLS ---

    #[instrument(skip(self, request), fields(title = %request.title))]
    pub async fn create_control(&self, request: CreateControlRequest) -> Result<UnifiedControl, GrcError> {
        request.validate()?;
        let existing = self.store.count_controls().await?;
        let control = UnifiedControl::from_request(request, control_identifier(existing), Utc::now());
        self.store.insert_control(&control).await?;
        info!(control = %control.identifier, "Unified control created");
        Ok(control)
    }

    pub async fn get_control(&self, id: Uuid) -> Result<UnifiedControl, GrcError> {
        self.store
            .get_control(id)
            .await?
            .ok_or_else(|| DomainError::not_found("UnifiedControl", id).into())
    }

    pub async fn list_controls(&self) -> Result<Vec<UnifiedControl>, GrcError> {
        self.store.all_controls().await
    }

    pub async fn update_control_status(
        &self,
        id: Uuid,
        status: ImplementationStatus,
    ) -> Result<UnifiedControl, GrcError> {
        let mut control = self.get_control(id).await?;
        control.implementation_status = status;
        control.updated_at = Utc::now();
        self.store.update_control(&control).await?;
        Ok(control)
    }

    /// Tombstones the control and every asset mapping of it.
    #[instrument(skip(self))]
    pub async fn delete_control(&self, id: Uuid) -> Result<(), GrcError> {
        let control = self.get_control(id).await?;
        self.store.soft_delete_control(control.id, Utc::now()).await?;
        info!(control = %control.identifier, "Unified control deleted");
        Ok(())
    }

    // --- ASSET MAPPINGS ---

    pub async fn map_asset(
        &self,
        control_id: Uuid,
        request: MapAssetRequest,
    ) -> Result<ControlAssetMapping, GrcError> {
        request.validate()?;
        let control = self.get_control(control_id).await?;
        let duplicate = self.store.all_mappings().await?.into_iter().any(|m| {
            m.control_id == control_id && m.asset_key() == (request.asset_type, request.asset_id)
        });
        if duplicate {
            return Err(DomainError::validation(format!(
                "Asset {} is already mapped to control {}",
                request.asset_id, control.identifier
            ))
            .into());
        }
        let mapping = ControlAssetMapping::from_request(control_id, request, Utc::now());
        self.store.insert_mapping(&mapping).await?;
        Ok(mapping)
    }

    pub async fn update_mapping(
        &self,
        id: Uuid,
        request: UpdateMappingRequest,
    ) -> Result<ControlAssetMapping, GrcError> {
        request.validate()?;
        let mut mapping = self
            .store
            .get_mapping(id)
            .await?
            .ok_or_else(|| DomainError::not_found("ControlAssetMapping", id))?;
        if let Some(status) = request.implementation_status {
            mapping.implementation_status = status;
        }
        if let Some(score) = request.effectiveness_score {
            mapping.effectiveness_score = Some(score);
        }
        self.store.update_mapping(&mapping).await?;
        Ok(mapping)
    }

    pub async fn mappings_for_control(&self, control_id: Uuid) -> Result<Vec<ControlAssetMapping>, GrcError> {
        self.get_control(control_id).await?;
        Ok(self
            .store
            .all_mappings()
            .await?
            .into_iter()
            .filter(|m| m.control_id == control_id)
            .collect())
    }

    // --- CONTROL OBJECTIVES ---

    #[instrument(skip(self, request), fields(objective = %request.objective_identifier))]
    pub async fn create_objective(&self, request: CreateObjectiveRequest) -> Result<ControlObjective, GrcError> {
        request.validate()?;
        if self.store.get_policy(request.policy_id).await?.is_none() {
            return Err(DomainError::not_found("Policy", request.policy_id).into());
        }
        let objective = ControlObjective::from_request(request, Utc::now());
        self.store.insert_objective(&objective).await?;

        if let Some(party) = objective.responsible_party_id {
            self.notify(
                party,
                &objective,
                "Control objective assigned",
                format!("You are responsible for control objective {}.", objective.objective_identifier),
            )
            .await;
        }
        Ok(objective)
    }

    pub async fn get_objective(&self, id: Uuid) -> Result<ControlObjective, GrcError> {
        self.store
            .get_objective(id)
            .await?
            .ok_or_else(|| DomainError::not_found("ControlObjective", id).into())
    }

    pub async fn objectives_for_policy(&self, policy_id: Uuid) -> Result<Vec<ControlObjective>, GrcError> {
        self.store.objectives_for_policy(policy_id).await
    }

    /// Status changes notify the responsible party; a reassignment notifies both parties.
    pub async fn update_objective(
        &self,
        id: Uuid,
        request: UpdateObjectiveRequest,
    ) -> Result<ControlObjective, GrcError> {
        request.validate()?;
        let mut objective = self.get_objective(id).await?;
        let previous_status = objective.implementation_status;
        let previous_party = objective.responsible_party_id;

        if let Some(title) = request.title {
            objective.title = title;
        }
        if let Some(status) = request.implementation_status {
            objective.implementation_status = status;
        }
        if let Some(party) = request.responsible_party_id {
            objective.responsible_party_id = Some(party);
        }
        objective.updated_at = Utc::now();
        self.store.update_objective(&objective).await?;

        let reassigned = previous_party != objective.responsible_party_id;
        if reassigned {
            if let Some(old) = previous_party {
                self.notify(
                    old,
                    &objective,
                    "Control objective reassigned",
                    format!(
                        "Control objective {} has been reassigned to someone else.",
                        objective.objective_identifier
                    ),
                )
                .await;
            }
            if let Some(new) = objective.responsible_party_id {
                self.notify(
                    new,
                    &objective,
                    "Control objective assigned",
                    format!(
                        "You are responsible for control objective {}.",
                        objective.objective_identifier
                    ),
                )
                .await;
            }
        } else if previous_status != objective.implementation_status
            && let Some(party) = objective.responsible_party_id
        {
            self.notify(
                party,
                &objective,
                "Control objective status changed",
                format!(
                    "Control objective {} moved from {} to {}.",
                    objective.objective_identifier, previous_status, objective.implementation_status
                ),
            )
            .await;
        }
        Ok(objective)
    }

    pub async fn delete_objective(&self, id: Uuid) -> Result<(), GrcError> {
        let mut objective = self.get_objective(id).await?;
        objective.deleted_at = Some(Utc::now());
        self.store.update_objective(&objective).await?;

        if let Some(party) = objective.responsible_party_id {
            self.notify(
                party,
                &objective,
                "Control objective removed",
                format!("Control objective {} was deleted.", objective.objective_identifier),
            )
            .await;
        }
        Ok(())
    }

    /// Unknown control ids are skipped; NotFound when none of them exist.
    pub async fn link_controls(
        &self,
        objective_id: Uuid,
        control_ids: &[Uuid],
    ) -> Result<ControlObjective, GrcError> {
        let mut objective = self.get_objective(objective_id).await?;
        let mut known = Vec::with_capacity(control_ids.len());
        for id in control_ids {
            if self.store.get_control(*id).await?.is_some() {
                known.push(*id);
            }
        }
        if known.is_empty() {
            let ids: Vec<String> = control_ids.iter().map(Uuid::to_string).collect();
            return Err(DomainError::not_found("UnifiedControl", ids.join(", ")).into());
        }
        if objective.link(&known) > 0 {
            objective.updated_at = Utc::now();
            self.store.update_objective(&objective).await?;
        }
        Ok(objective)
    }

    pub async fn unlink_controls(
        &self,
        objective_id: Uuid,
        control_ids: &[Uuid],
    ) -> Result<ControlObjective, GrcError> {
        let mut objective = self.get_objective(objective_id).await?;
        if objective.unlink(control_ids) > 0 {
            objective.updated_at = Utc::now();
            self.store.update_objective(&objective).await?;
        }
        Ok(objective)
    }

    async fn notify(&self, user: Uuid, objective: &ControlObjective, title: &str, message: String) {
        let notification =
            Notification::new(user, title, message).about(EntityType::ControlObjective, objective.id);
        notify_best_effort(self.notifier.as_ref(), notification).await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::application::notify::testing::RecordingNotifier;
    use crate::application::reporting::tests::store;
    use crate::domain::control::AssetType;
    use crate::domain::policy::{CreatePolicyRequest, Policy, policy_identifier};
    use crate::infrastructure::adapters::DuckDbStore;
    use crate::ports::{ControlRepository, PolicyRepository};
    use anyhow::Result;

    fn setup(notifier: RecordingNotifier) -> (Arc<DuckDbStore>, Arc<RecordingNotifier>, ControlService) {
        let store = store();
        let notifier = Arc::new(notifier);
        let service = ControlService::new(store.clone(), notifier.clone());
        (store, notifier, service)
    }

    fn control_request(title: &str) -> CreateControlRequest {
        CreateControlRequest {
            title: title.into(),
            ..Default::default()
        }
    }

    async fn policy(store: &DuckDbStore) -> Result<Policy> {
        let now = Utc::now();
        let policy = Policy::from_request(
            CreatePolicyRequest {
                title: "Access".into(),
                policy_type: "security".into(),
                ..Default::default()
            },
            policy_identifier(now, 0),
            None,
            now,
        );
        store.insert_policy(&policy).await?;
        Ok(policy)
    }

    fn objective_request(policy_id: Uuid, party: Option<Uuid>) -> CreateObjectiveRequest {
        CreateObjectiveRequest {
            policy_id,
            objective_identifier: "CO-7".into(),
            title: "Review privileged accounts".into(),
            responsible_party_id: party,
            implementation_status: None,
        }
    }

    fn asset(asset_id: Uuid) -> MapAssetRequest {
        MapAssetRequest {
            asset_id,
            asset_type: AssetType::Application,
            asset_name: Some("CRM".into()),
            business_unit: Some("Sales".into()),
            implementation_status: None,
            effectiveness_score: None,
        }
    }

    #[tokio::test]
    async fn test_identifiers_and_delete_cascade() -> Result<()> {
        let (store, _, service) = setup(RecordingNotifier::default());
        let first = service.create_control(control_request("MFA")).await?;
        let second = service.create_control(control_request("Backups")).await?;
        assert_eq!(first.identifier, "UCL-0001");
        assert_eq!(second.identifier, "UCL-0002");

        let mapping = service.map_asset(first.id, asset(Uuid::new_v4())).await?;
        service.delete_control(first.id).await?;
        assert!(service.get_control(first.id).await.unwrap_err().is_not_found());
        assert!(store.get_mapping(mapping.id).await?.is_none());

        let third = service.create_control(control_request("Logging")).await?;
        assert_eq!(third.identifier, "UCL-0003");
        Ok(())
    }

    #[tokio::test]
    async fn test_mapping_rules() -> Result<()> {
        let (_, _, service) = setup(RecordingNotifier::default());
        let control = service.create_control(control_request("MFA")).await?;
        let asset_id = Uuid::new_v4();
        let mapping = service.map_asset(control.id, asset(asset_id)).await?;
        assert!(service.map_asset(control.id, asset(asset_id)).await.unwrap_err().is_validation());

        let err = service
            .update_mapping(
                mapping.id,
                UpdateMappingRequest {
                    implementation_status: None,
                    effectiveness_score: Some(101.0),
                },
            )
            .await
            .unwrap_err();
        assert!(err.is_validation());

        let updated = service
            .update_mapping(
                mapping.id,
                UpdateMappingRequest {
                    implementation_status: Some(ImplementationStatus::Implemented),
                    effectiveness_score: Some(85.0),
                },
            )
            .await?;
        assert_eq!(updated.effectiveness_score, Some(85.0));
        assert_eq!(service.mappings_for_control(control.id).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_objective_requires_policy() -> Result<()> {
        let (_, _, service) = setup(RecordingNotifier::default());
        let err = service
            .create_objective(objective_request(Uuid::new_v4(), None))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        Ok(())
    }

    #[tokio::test]
    async fn test_objective_notifications() -> Result<()> {
        let (store, notifier, service) = setup(RecordingNotifier::default());
        let policy = policy(&store).await?;
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        let objective = service.create_objective(objective_request(policy.id, Some(alice))).await?;
        service
            .update_objective(
                objective.id,
                UpdateObjectiveRequest {
                    implementation_status: Some(ImplementationStatus::InProgress),
                    ..Default::default()
                },
            )
            .await?;
        service
            .update_objective(
                objective.id,
                UpdateObjectiveRequest {
                    responsible_party_id: Some(bob),
                    ..Default::default()
                },
            )
            .await?;
        service.delete_objective(objective.id).await?;

        assert_eq!(
            notifier.titles(),
            vec![
                "Control objective assigned",
                "Control objective status changed",
                "Control objective reassigned",
                "Control objective assigned",
                "Control objective removed",
            ]
        );
        assert!(service.objectives_for_policy(policy.id).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_notification_failure_keeps_update() -> Result<()> {
        let (store, _, service) = setup(RecordingNotifier::failing());
        let policy = policy(&store).await?;
        let objective = service
            .create_objective(objective_request(policy.id, Some(Uuid::new_v4())))
            .await?;
        let updated = service
            .update_objective(
                objective.id,
                UpdateObjectiveRequest {
                    implementation_status: Some(ImplementationStatus::Implemented),
                    ..Default::default()
                },
            )
            .await?;
        assert_eq!(
            service.get_objective(updated.id).await?.implementation_status,
            ImplementationStatus::Implemented
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_link_and_unlink_controls() -> Result<()> {
        let (store, _, service) = setup(RecordingNotifier::default());
        let policy = policy(&store).await?;
        let objective = service.create_objective(objective_request(policy.id, None)).await?;
        let control = service.create_control(control_request("MFA")).await?;

        let err = service
            .link_controls(objective.id, &[Uuid::new_v4()])
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let linked = service
            .link_controls(objective.id, &[control.id, Uuid::new_v4()])
            .await?;
        assert_eq!(linked.linked_control_ids, vec![control.id]);

        let unlinked = service.unlink_controls(objective.id, &[control.id]).await?;
        assert!(unlinked.linked_control_ids.is_empty());
        assert!(store.get_control(control.id).await?.is_some());
        Ok(())
    }
}

// grc-core/src/application/versions.rs

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::domain::policy::version::next_version_number;
use crate::domain::policy::{
    Policy, PolicyVersion, VersionComparison, VersionHistoryEntry, compare_versions,
};
use crate::domain::DomainError;
use crate::error::GrcError;
use crate::ports::GrcStore;

/// Appends a version for `content` and moves the policy's version label forward.
/// The caller persists the policy.
pub(crate) async fn snapshot_version(
    store: &dyn GrcStore,
    policy: &mut Policy,
    content: String,
    change_summary: Option<String>,
    created_by: Uuid,
) -> Result<PolicyVersion, GrcError> {
    let existing = store.versions_for_policy(policy.id).await?;
    let number = next_version_number(policy.version_number, &existing);
    let now = Utc::now();

    let version = PolicyVersion::new(policy.id, number, content, change_summary, created_by, now);
    store.insert_version(&version).await?;

    policy.content = Some(version.content.clone());
    policy.version = version.version.clone();
    policy.version_number = number;
    policy.updated_at = now;
    Ok(version)
}

pub struct PolicyVersionService {
    store: Arc<dyn GrcStore>,
}

impl PolicyVersionService {
    pub fn new(store: Arc<dyn GrcStore>) -> Self {
        Self { store }
    }

    async fn policy(&self, id: Uuid) -> Result<Policy, GrcError> {
        self.store
            .get_policy(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Policy", id).into())
    }

    #[instrument(skip(self, content))]
    pub async fn create_version(
        &self,
        policy_id: Uuid,
        content: String,
        change_summary: Option<String>,
        created_by: Uuid,
    ) -> Result<PolicyVersion, GrcError> {
        let mut policy = self.policy(policy_id).await?;
        if self.store.get_user(created_by).await?.is_none() {
            return Err(DomainError::not_found("User", created_by).into());
        }

        let version =
            snapshot_version(self.store.as_ref(), &mut policy, content, change_summary, created_by)
                .await?;
        self.store.update_policy(&policy).await?;
        info!(policy = %policy.identifier, version = %version.version, "Policy version created");
        Ok(version)
    }

    /// Newest first.
    pub async fn versions_by_policy(&self, policy_id: Uuid) -> Result<Vec<PolicyVersion>, GrcError> {
        self.store.versions_for_policy(policy_id).await
    }

    pub async fn get_version(&self, id: Uuid) -> Result<PolicyVersion, GrcError> {
        self.store
            .get_version(id)
            .await?
            .ok_or_else(|| DomainError::not_found("PolicyVersion", id).into())
    }

    pub async fn latest_version(&self, policy_id: Uuid) -> Result<PolicyVersion, GrcError> {
        self.versions_by_policy(policy_id)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::not_found("PolicyVersion", format!("latest of {policy_id}")).into())
    }

    pub async fn version_by_number(
        &self,
        policy_id: Uuid,
        version_number: u32,
    ) -> Result<PolicyVersion, GrcError> {
        self.versions_by_policy(policy_id)
            .await?
            .into_iter()
            .find(|v| v.version_number == version_number)
            .ok_or_else(|| {
                DomainError::not_found("PolicyVersion", format!("{policy_id} #{version_number}")).into()
            })
    }

    pub async fn delete_version(&self, id: Uuid) -> Result<(), GrcError> {
        let version = self.get_version(id).await?;
        let siblings = self.versions_by_policy(version.policy_id).await?;
        if siblings.len() <= 1 {
            return Err(DomainError::validation(
                "Cannot delete the only version of a policy",
            )
            .into());
        }
        self.store.delete_version(id).await
    }

    pub async fn compare_versions(&self, id1: Uuid, id2: Uuid) -> Result<VersionComparison, GrcError> {
        let v1 = self.get_version(id1).await?;
        let v2 = self.get_version(id2).await?;
        if v1.policy_id != v2.policy_id {
            return Err(DomainError::validation("Versions belong to different policies").into());
        }
        Ok(compare_versions(v1, v2))
    }

    pub async fn history(&self, policy_id: Uuid) -> Result<Vec<VersionHistoryEntry>, GrcError> {
        Ok(self
            .versions_by_policy(policy_id)
            .await?
            .iter()
            .map(VersionHistoryEntry::from)
            .collect())
    }

    /// Never rewrites history: the old content comes back as a new version.
    #[instrument(skip(self))]
    pub async fn rollback_to_version(
        &self,
        policy_id: Uuid,
        version_number: u32,
        created_by: Uuid,
    ) -> Result<PolicyVersion, GrcError> {
        let target = self.version_by_number(policy_id, version_number).await?;
        self.create_version(
            policy_id,
            target.content,
            Some(format!("Rolled back to version {}", target.version)),
            created_by,
        )
        .await
    }
}

// grc-core/src/application/import.rs

// Seeds a store from a YAML dataset: users, policies with their assignments,
// controls with their asset mappings, and report schedules.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, OnceLock};

use chrono::{Datelike, NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::domain::compliance::ReportPeriod;
use crate::domain::control::{
    AssetType, ControlAssetMapping, CreateControlRequest, ImplementationStatus, MapAssetRequest,
    UnifiedControl, control_identifier,
};
use crate::domain::policy::{
    CreatePolicyRequest, Policy, PolicyAssignment, PolicyStatus, ReviewFrequency, policy_identifier,
};
use crate::domain::schedule::{CreateScheduleRequest, ReportSchedule};
use crate::domain::{DomainError, User};
use crate::error::GrcError;
use crate::infrastructure::error::InfrastructureError;
use crate::ports::GrcStore;

fn policy_id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^POL-\d{4}-\d{4,}$").unwrap_or_else(|_| unreachable!()))
}

fn control_id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^UCL-\d{4,}$").unwrap_or_else(|_| unreachable!()))
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Dataset {
    #[serde(default)]
    pub users: Vec<UserSeed>,
    #[serde(default)]
    pub policies: Vec<PolicySeed>,
    #[serde(default)]
    pub controls: Vec<ControlSeed>,
    #[serde(default)]
    pub schedules: Vec<ScheduleSeed>,
}

#[derive(Debug, Deserialize)]
pub struct UserSeed {
    pub email: String,
    pub display_name: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub business_unit: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PolicySeed {
    #[serde(default)]
    pub identifier: Option<String>,
    pub title: String,
    pub policy_type: String,
    #[serde(default)]
    pub status: PolicyStatus,
    /// Owner email.
    #[serde(default)]
    pub owner: Option<String>,
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
    pub assigned_to: Vec<String>,
    #[serde(default)]
    pub acknowledged_by: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ControlSeed {
    #[serde(default)]
    pub identifier: Option<String>,
    pub title: String,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub business_unit: Option<String>,
    #[serde(default)]
    pub implementation_status: ImplementationStatus,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub assets: Vec<AssetSeed>,
}

#[derive(Debug, Deserialize)]
pub struct AssetSeed {
    /// Same type and name across controls means the same asset.
    pub name: String,
    pub asset_type: AssetType,
    #[serde(default)]
    pub business_unit: Option<String>,
    #[serde(default)]
    pub implementation_status: ImplementationStatus,
    #[serde(default)]
    pub effectiveness_score: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct ScheduleSeed {
    pub name: String,
    #[serde(default)]
    pub report_period: ReportPeriod,
    pub cron_expression: String,
    /// Recipient emails.
    #[serde(default)]
    pub recipients: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub users: usize,
    pub policies: usize,
    pub assignments: usize,
    pub controls: usize,
    pub mappings: usize,
    pub schedules: usize,
}

pub struct DatasetImporter {
    store: Arc<dyn GrcStore>,
}

impl DatasetImporter {
    pub fn new(store: Arc<dyn GrcStore>) -> Self {
        Self { store }
    }

    #[instrument(skip(self))]
    pub async fn import_file(&self, path: &Path) -> Result<ImportSummary, GrcError> {
        let content = std::fs::read_to_string(path)?;
        self.import_str(&content).await
    }

    pub async fn import_str(&self, yaml: &str) -> Result<ImportSummary, GrcError> {
        let dataset: Dataset = serde_yaml::from_str(yaml).map_err(InfrastructureError::YamlError)?;
        self.import(dataset).await
    }

    /// Everything is checked before the first write, so a bad file leaves the store untouched.
    pub async fn import(&self, dataset: Dataset) -> Result<ImportSummary, GrcError> {
        validate_identifiers(&dataset)?;
        let mut taken: HashSet<String> = self
            .store
            .all_policies()
            .await?
            .into_iter()
            .map(|p| p.identifier)
            .chain(self.store.all_controls().await?.into_iter().map(|c| c.identifier))
            .collect();
        let explicit = dataset
            .policies
            .iter()
            .filter_map(|p| p.identifier.as_deref())
            .chain(dataset.controls.iter().filter_map(|c| c.identifier.as_deref()));
        for id in explicit {
            if !taken.insert(id.to_string()) {
                return Err(DomainError::validation(format!("Identifier '{}' already exists", id)).into());
            }
        }

        let mut directory: HashMap<String, Uuid> = self
            .store
            .list_users()
            .await?
            .into_iter()
            .map(|u| (u.email.to_lowercase(), u.id))
            .collect();
        let mut users = Vec::new();
        for seed in dataset.users {
            let key = seed.email.to_lowercase();
            if directory.contains_key(&key) {
                continue;
            }
            let mut user = User::new(seed.email, seed.display_name);
            user.role = seed.role;
            user.business_unit = seed.business_unit;
            directory.insert(key, user.id);
            users.push(user);
        }
        let lookup = |email: &str| -> Result<Uuid, GrcError> {
            directory
                .get(&email.to_lowercase())
                .copied()
                .ok_or_else(|| DomainError::not_found("User", email).into())
        };

        let now = Utc::now();
        let today = now.date_naive();
        let mut policies = Vec::with_capacity(dataset.policies.len());
        let mut assignments = Vec::new();
        let mut sequence = self.store.count_policies_created_in(now.year()).await?;
        for seed in dataset.policies {
            let owner = seed.owner.as_deref().map(&lookup).transpose()?;
            let request = CreatePolicyRequest {
                title: seed.title,
                policy_type: seed.policy_type,
                owner_id: owner,
                business_unit: seed.business_unit,
                content: seed.content,
                review_frequency: seed.review_frequency,
                next_review_date: seed.next_review_date,
                is_mandatory: seed.is_mandatory,
                requires_acknowledgment: None,
            };
            request.validate()?;
            let identifier = match seed.identifier {
                Some(id) => id,
                None => loop {
                    let id = policy_identifier(now, sequence);
                    sequence += 1;
                    if taken.insert(id.clone()) {
                        break id;
                    }
                },
            };
            let mut policy = Policy::from_request(request, identifier, None, now);
            policy.status = seed.status;
            if policy.status == PolicyStatus::Published {
                policy.published_date = Some(today);
                if policy.next_review_date.is_none() {
                    policy.next_review_date = Some(policy.review_frequency.next_review_after(today));
                }
            }

            for email in &seed.assigned_to {
                let mut assignment = PolicyAssignment::new(policy.id, lookup(email)?, owner, now);
                if seed.acknowledged_by.iter().any(|a| a.eq_ignore_ascii_case(email)) {
                    assignment.acknowledge(now);
                }
                assignments.push(assignment);
            }
            policies.push(policy);
        }

        let mut controls = Vec::with_capacity(dataset.controls.len());
        let mut mappings = Vec::new();
        let mut assets: HashMap<(AssetType, String), Uuid> = HashMap::new();
        let mut control_count = self.store.count_controls().await?;
        for seed in dataset.controls {
            let request = CreateControlRequest {
                title: seed.title,
                domain: seed.domain,
                business_unit: seed.business_unit,
                implementation_status: Some(seed.implementation_status),
                control_owner_id: seed.owner.as_deref().map(&lookup).transpose()?,
            };
            request.validate()?;
            let identifier = match seed.identifier {
                Some(id) => id,
                None => loop {
                    let id = control_identifier(control_count);
                    control_count += 1;
                    if taken.insert(id.clone()) {
                        break id;
                    }
                },
            };
            let control = UnifiedControl::from_request(request, identifier, now);

            for asset in seed.assets {
                let asset_id = *assets
                    .entry((asset.asset_type, asset.name.to_lowercase()))
                    .or_insert_with(Uuid::new_v4);
                let request = MapAssetRequest {
                    asset_id,
                    asset_type: asset.asset_type,
                    asset_name: Some(asset.name),
                    business_unit: asset.business_unit,
                    implementation_status: Some(asset.implementation_status),
                    effectiveness_score: asset.effectiveness_score,
                };
                request.validate()?;
                mappings.push(ControlAssetMapping::from_request(control.id, request, now));
            }
            controls.push(control);
        }

        let mut schedules = Vec::with_capacity(dataset.schedules.len());
        for seed in dataset.schedules {
            let recipients = seed
                .recipients
                .iter()
                .map(|e| lookup(e))
                .collect::<Result<Vec<_>, _>>()?;
            let request = CreateScheduleRequest {
                name: seed.name,
                report_period: seed.report_period,
                cron_expression: seed.cron_expression,
                recipients,
            };
            request.validate()?;
            schedules.push(ReportSchedule::from_request(request, None, now)?);
        }

        // --- WRITES ---
        for user in &users {
            self.store.save_user(user).await?;
        }
        for policy in &policies {
            self.store.insert_policy(policy).await?;
        }
        for assignment in &assignments {
            self.store.insert_assignment(assignment).await?;
        }
        for control in &controls {
            self.store.insert_control(control).await?;
        }
        for mapping in &mappings {
            self.store.insert_mapping(mapping).await?;
        }
        for schedule in &schedules {
            self.store.insert_schedule(schedule).await?;
        }

        let summary = ImportSummary {
            users: users.len(),
            policies: policies.len(),
            assignments: assignments.len(),
            controls: controls.len(),
            mappings: mappings.len(),
            schedules: schedules.len(),
        };
        info!(?summary, "Dataset imported");
        Ok(summary)
    }
}

fn validate_identifiers(dataset: &Dataset) -> Result<(), DomainError> {
    for id in dataset.policies.iter().filter_map(|p| p.identifier.as_deref()) {
        if !policy_id_re().is_match(id) {
            return Err(DomainError::validation(format!(
                "Policy identifier '{}' does not match POL-<year>-<number>",
                id
            )));
        }
    }
    for id in dataset.controls.iter().filter_map(|c| c.identifier.as_deref()) {
        if !control_id_re().is_match(id) {
            return Err(DomainError::validation(format!(
                "Control identifier '{}' does not match UCL-<number>",
                id
            )));
        }
    }
    Ok(())
}

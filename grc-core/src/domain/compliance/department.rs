// grc-core/src/domain/compliance/department.rs

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::dataset::ComplianceDataset;
use super::rating::ComplianceRating;
use super::scoring::ComplianceScores;
use crate::domain::policy::UNASSIGNED_DEPARTMENT;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepartmentScore {
    pub department: String,
    pub overall_score: f64,
    pub rating: ComplianceRating,
    pub policies_score: f64,
    pub controls_score: f64,
    pub assets_score: f64,
    pub total_policies: u64,
    pub total_controls: u64,
    pub total_assets: u64,
}

fn department_of(business_unit: Option<&str>) -> String {
    match business_unit.map(str::trim) {
        Some(bu) if !bu.is_empty() => bu.to_string(),
        _ => UNASSIGNED_DEPARTMENT.to_string(),
    }
}

/// Same formulas and weights as the organisation-wide score, one row per business unit,
/// ordered by name.
pub fn department_breakdown(dataset: &ComplianceDataset) -> Vec<DepartmentScore> {
    let mut groups: BTreeMap<String, ComplianceDataset> = BTreeMap::new();

    let mut policy_department: HashMap<Uuid, String> = HashMap::new();
    for policy in &dataset.policies {
        let dept = department_of(policy.business_unit.as_deref());
        policy_department.insert(policy.id, dept.clone());
        groups.entry(dept).or_default().policies.push(policy.clone());
    }
    for assignment in &dataset.assignments {
        if let Some(dept) = policy_department.get(&assignment.policy_id) {
            groups
                .entry(dept.clone())
                .or_default()
                .assignments
                .push(assignment.clone());
        }
    }
    for control in &dataset.controls {
        groups
            .entry(department_of(control.business_unit.as_deref()))
            .or_default()
            .controls
            .push(control.clone());
    }
    for mapping in &dataset.mappings {
        groups
            .entry(department_of(mapping.business_unit.as_deref()))
            .or_default()
            .mappings
            .push(mapping.clone());
    }

    groups
        .into_iter()
        .map(|(department, subset)| {
            let scores = ComplianceScores::compute(&subset);
            DepartmentScore {
                department,
                overall_score: scores.overall_score,
                rating: scores.rating,
                policies_score: scores.policies.score,
                controls_score: scores.controls.score,
                assets_score: scores.assets.score,
                total_policies: scores.policies.total,
                total_controls: scores.controls.total,
                total_assets: scores.assets.total,
            }
        })
        .collect()
}

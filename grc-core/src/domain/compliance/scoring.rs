// grc-core/src/domain/compliance/scoring.rs

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::dataset::ComplianceDataset;
use super::rating::ComplianceRating;
use crate::domain::control::{AssetType, ControlBucket, ImplementationStatus};
use crate::domain::policy::PolicyStatus;

// Weights are frozen so historical reports stay comparable.
pub const POLICY_WEIGHT: f64 = 0.30;
pub const CONTROL_WEIGHT: f64 = 0.50;
pub const ASSET_WEIGHT: f64 = 0.20;

/// Share of an asset's applicable mappings that must be implemented.
pub const ASSET_COMPLIANT_COVERAGE: f64 = 80.0;

/// `part / whole * 100`, 0 when `whole` is 0.
pub fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

pub fn round2(value: f64) -> f64 {
    if value.is_finite() {
        (value * 100.0).round() / 100.0
    } else {
        0.0
    }
}

pub fn clamp_score(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 100.0)
}

/// Weighted combination of the three (already rounded) sub-scores.
pub fn overall_score(policies: f64, controls: f64, assets: f64) -> f64 {
    round2(clamp_score(
        POLICY_WEIGHT * policies + CONTROL_WEIGHT * controls + ASSET_WEIGHT * assets,
    ))
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PolicyMetrics {
    pub total: u64,
    pub published: u64,
    pub expected_acknowledgments: u64,
    pub acknowledged: u64,
    pub acknowledgment_rate: f64,
    pub score: f64,
}

impl PolicyMetrics {
    /// Archived policies are out of scope. The score blends the published share
    /// and the acknowledgment rate half and half.
    pub fn compute(dataset: &ComplianceDataset) -> Self {
        let active: Vec<_> = dataset
            .policies
            .iter()
            .filter(|p| p.status != PolicyStatus::Archived)
            .collect();
        let published_ids: HashSet<Uuid> = active
            .iter()
            .filter(|p| p.status == PolicyStatus::Published)
            .map(|p| p.id)
            .collect();

        let total = active.len() as u64;
        let published = published_ids.len() as u64;

        let expected: Vec<_> = dataset
            .assignments
            .iter()
            .filter(|a| published_ids.contains(&a.policy_id))
            .collect();
        let expected_acknowledgments = expected.len() as u64;
        let acknowledged = expected.iter().filter(|a| a.acknowledged).count() as u64;

        let published_rate = percentage(published, total);
        let acknowledgment_rate = percentage(acknowledged, expected_acknowledgments);

        Self {
            total,
            published,
            expected_acknowledgments,
            acknowledged,
            acknowledgment_rate: round2(acknowledgment_rate),
            score: round2(clamp_score(0.5 * published_rate + 0.5 * acknowledgment_rate)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ControlMetrics {
    pub total: u64,
    pub implemented: u64,
    pub partial: u64,
    pub not_implemented: u64,
    pub not_applicable: u64,
    pub average_effectiveness: f64,
    pub score: f64,
}

impl ControlMetrics {
    pub fn compute(dataset: &ComplianceDataset) -> Self {
        let mut metrics = dataset
            .controls
            .iter()
            .fold(Self::default(), |mut acc, control| {
                match control.implementation_status.bucket() {
                    Some(ControlBucket::Implemented) => acc.implemented += 1,
                    Some(ControlBucket::Partial) => acc.partial += 1,
                    Some(ControlBucket::NotImplemented) => acc.not_implemented += 1,
                    None => acc.not_applicable += 1,
                }
                acc
            });
        metrics.total = metrics.implemented + metrics.partial + metrics.not_implemented;
        metrics.score = round2(percentage(metrics.implemented, metrics.total));

        let scores: Vec<f64> = dataset
            .mappings
            .iter()
            .filter_map(|m| m.effectiveness_score)
            .filter(|s| s.is_finite())
            .collect();
        if !scores.is_empty() {
            metrics.average_effectiveness =
                round2(scores.iter().sum::<f64>() / scores.len() as f64);
        }
        metrics
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AssetMetrics {
    pub total: u64,
    pub compliant: u64,
    pub compliance_percentage: f64,
    pub score: f64,
}

impl AssetMetrics {
    /// An asset is any distinct (type, id) with at least one applicable mapping.
    pub fn compute(dataset: &ComplianceDataset) -> Self {
        let mut coverage: HashMap<(AssetType, Uuid), (u64, u64)> = HashMap::new();
        for mapping in dataset
            .mappings
            .iter()
            .filter(|m| m.implementation_status.is_applicable())
        {
            let entry = coverage.entry(mapping.asset_key()).or_default();
            entry.1 += 1;
            if mapping.implementation_status == ImplementationStatus::Implemented {
                entry.0 += 1;
            }
        }

        let total = coverage.len() as u64;
        let compliant = coverage
            .values()
            .filter(|(implemented, applicable)| {
                percentage(*implemented, *applicable) >= ASSET_COMPLIANT_COVERAGE
            })
            .count() as u64;
        let pct = round2(percentage(compliant, total));

        Self {
            total,
            compliant,
            compliance_percentage: pct,
            score: pct,
        }
    }
}

/// Every number a report stores about the current state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComplianceScores {
    pub policies: PolicyMetrics,
    pub controls: ControlMetrics,
    pub assets: AssetMetrics,
    pub overall_score: f64,
    pub rating: ComplianceRating,
}

impl ComplianceScores {
    pub fn compute(dataset: &ComplianceDataset) -> Self {
        let policies = PolicyMetrics::compute(dataset);
        let controls = ControlMetrics::compute(dataset);
        let assets = AssetMetrics::compute(dataset);
        let overall = overall_score(policies.score, controls.score, assets.score);
        Self {
            policies,
            controls,
            assets,
            overall_score: overall,
            rating: ComplianceRating::from_score(overall),
        }
    }
}

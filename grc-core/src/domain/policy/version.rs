// grc-core/src/domain/policy/version.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::entity::version_label;

/// Immutable content snapshot. Rollback appends a new one, never edits an old one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PolicyVersion {
    pub id: Uuid,
    pub policy_id: Uuid,
    pub version: String,
    pub version_number: u32,
    pub content: String,
    pub change_summary: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl PolicyVersion {
    pub fn new(
        policy_id: Uuid,
        version_number: u32,
        content: String,
        change_summary: Option<String>,
        created_by: Uuid,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            policy_id,
            version: version_label(version_number),
            version_number,
            content,
            change_summary,
            created_by,
            created_at: now,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VersionComparison {
    pub version1: PolicyVersion,
    pub version2: PolicyVersion,
    pub differences: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VersionHistoryEntry {
    pub version_number: u32,
    pub version: String,
    pub created_at: DateTime<Utc>,
    pub created_by: Uuid,
    pub change_summary: Option<String>,
}

impl From<&PolicyVersion> for VersionHistoryEntry {
    fn from(v: &PolicyVersion) -> Self {
        Self {
            version_number: v.version_number,
            version: v.version.clone(),
            created_at: v.created_at,
            created_by: v.created_by,
            change_summary: v.change_summary.clone(),
        }
    }
}

pub fn compare_versions(version1: PolicyVersion, version2: PolicyVersion) -> VersionComparison {
    let mut differences = Vec::new();
    if version1.content != version2.content {
        differences.push("Content has changed".to_string());
    }
    if version1.change_summary != version2.change_summary {
        differences.push("Change summary differs".to_string());
    }
    VersionComparison {
        version1,
        version2,
        differences,
    }
}

pub fn next_version_number(policy_version_number: u32, versions: &[PolicyVersion]) -> u32 {
    versions
        .iter()
        .map(|v| v.version_number)
        .max()
        .unwrap_or(0)
        .max(policy_version_number)
        + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn version(n: u32, content: &str, summary: &str) -> PolicyVersion {
        PolicyVersion::new(
            Uuid::nil(),
            n,
            content.into(),
            Some(summary.into()),
            Uuid::nil(),
            Utc::now(),
        )
    }

    #[test]
    fn test_compare_detects_differences() {
        let cmp = compare_versions(version(1, "Old content", "v1"), version(2, "New content", "v2"));
        assert!(cmp.differences.contains(&"Content has changed".to_string()));
        assert!(cmp.differences.contains(&"Change summary differs".to_string()));
    }

    #[test]
    fn test_compare_identical() {
        let v = version(1, "Same content", "Same summary");
        let cmp = compare_versions(v.clone(), v);
        assert!(cmp.differences.is_empty());
    }

    #[test]
    fn test_next_version_number_uses_highest() {
        let versions = vec![version(2, "a", "a"), version(5, "b", "b")];
        assert_eq!(next_version_number(3, &versions), 6);
        assert_eq!(next_version_number(3, &[]), 4);
    }
}

// grc-core/src/domain/policy/mod.rs

pub mod approval;
pub mod assignment;
pub mod entity;
pub mod review;
pub mod status;
pub mod version;

pub use approval::{
    ApprovalProgress, ApprovalStatus, PolicyApproval, all_approvals_completed, approval_progress,
    blocking_predecessor, has_any_rejection,
};
pub use assignment::PolicyAssignment;
pub use entity::{
    CreatePolicyRequest, Policy, PolicyFilter, ReviewFrequency, UNASSIGNED_DEPARTMENT,
    UpdatePolicyRequest, policy_identifier, version_label,
};
pub use review::ReminderThreshold;
pub use status::PolicyStatus;
pub use version::{PolicyVersion, VersionComparison, VersionHistoryEntry, compare_versions};

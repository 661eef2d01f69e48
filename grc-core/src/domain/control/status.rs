// grc-core/src/domain/control/status.rs

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ImplementationStatus {
    #[default]
    NotImplemented,
    Planned,
    InProgress,
    Implemented,
    NotApplicable,
}

str_enum!(ImplementationStatus {
    NotImplemented => "not_implemented",
    Planned => "planned",
    InProgress => "in_progress",
    Implemented => "implemented",
    NotApplicable => "not_applicable",
});

impl ImplementationStatus {
    pub fn is_applicable(self) -> bool {
        self != Self::NotApplicable
    }

    /// Reporting buckets: planned counts as not implemented, in progress as partial.
    pub fn bucket(self) -> Option<ControlBucket> {
        match self {
            Self::Implemented => Some(ControlBucket::Implemented),
            Self::InProgress => Some(ControlBucket::Partial),
            Self::NotImplemented | Self::Planned => Some(ControlBucket::NotImplemented),
            Self::NotApplicable => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlBucket {
    Implemented,
    Partial,
    NotImplemented,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetType {
    Physical,
    Information,
    Application,
    Software,
    Supplier,
}

str_enum!(AssetType {
    Physical => "physical",
    Information => "information",
    Application => "application",
    Software => "software",
    Supplier => "supplier",
});

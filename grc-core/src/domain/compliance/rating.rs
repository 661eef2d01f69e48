// grc-core/src/domain/compliance/rating.rs

use serde::{Deserialize, Serialize};

pub const EXCELLENT_THRESHOLD: f64 = 90.0;
pub const GOOD_THRESHOLD: f64 = 70.0;
pub const FAIR_THRESHOLD: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComplianceRating {
    Excellent,
    Good,
    Fair,
    Poor,
}

str_enum!(ComplianceRating {
    Excellent => "EXCELLENT",
    Good => "GOOD",
    Fair => "FAIR",
    Poor => "POOR",
});

impl ComplianceRating {
    /// Bands are closed at the lower bound: exactly 90 is EXCELLENT, 89.99 is GOOD.
    pub fn from_score(score: f64) -> Self {
        if score >= EXCELLENT_THRESHOLD {
            Self::Excellent
        } else if score >= GOOD_THRESHOLD {
            Self::Good
        } else if score >= FAIR_THRESHOLD {
            Self::Fair
        } else {
            // NaN lands here too
            Self::Poor
        }
    }
}

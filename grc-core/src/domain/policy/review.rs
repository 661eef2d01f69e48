// grc-core/src/domain/policy/review.rs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Review reminder buckets, checked once a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderThreshold {
    Days90,
    Days60,
    Days30,
    Overdue,
}

str_enum!(ReminderThreshold {
    Days90 => "90_days",
    Days60 => "60_days",
    Days30 => "30_days",
    Overdue => "overdue",
});

impl ReminderThreshold {
    /// Exact day hits only; a policy 45 days out gets nothing today.
    pub fn classify(next_review_date: NaiveDate, today: NaiveDate) -> Option<Self> {
        match (next_review_date - today).num_days() {
            90 => Some(Self::Days90),
            60 => Some(Self::Days60),
            30 => Some(Self::Days30),
            d if d < 0 => Some(Self::Overdue),
            _ => None,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Overdue => "Policy review overdue",
            _ => "Policy review due soon",
        }
    }

    pub fn message(self, policy_identifier: &str, policy_title: &str, next_review: NaiveDate) -> String {
        match self {
            Self::Overdue => format!(
                "Policy {} \"{}\" was due for review on {}.",
                policy_identifier, policy_title, next_review
            ),
            Self::Days90 | Self::Days60 | Self::Days30 => format!(
                "Policy {} \"{}\" is due for review in {} days ({}).",
                policy_identifier,
                policy_title,
                self.days(),
                next_review
            ),
        }
    }

    fn days(self) -> i64 {
        match self {
            Self::Days90 => 90,
            Self::Days60 => 60,
            Self::Days30 => 30,
            Self::Overdue => 0,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_classify_thresholds() {
        let today = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
        let at = |d: i64| ReminderThreshold::classify(today + Duration::days(d), today);
        assert_eq!(at(90), Some(ReminderThreshold::Days90));
        assert_eq!(at(60), Some(ReminderThreshold::Days60));
        assert_eq!(at(30), Some(ReminderThreshold::Days30));
        assert_eq!(at(-1), Some(ReminderThreshold::Overdue));
        assert_eq!(at(0), None);
        assert_eq!(at(45), None);
    }

    #[test]
    fn test_message_mentions_policy() {
        let date = NaiveDate::from_ymd_opt(2026, 9, 1).unwrap();
        let msg = ReminderThreshold::Days30.message("POL-2026-0001", "Access", date);
        assert!(msg.contains("POL-2026-0001"));
        assert!(msg.contains("30 days"));
    }
}

// grc-core/src/domain/schedule.rs

use std::str::FromStr;

use chrono::{DateTime, Utc};
use cron::Schedule;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::compliance::ReportPeriod;
use super::error::DomainError;

/// Parses a six-field (seconds first) or seven-field cron expression.
pub fn parse_cron(expression: &str) -> Result<Schedule, DomainError> {
    Schedule::from_str(expression).map_err(|e| DomainError::InvalidSchedule {
        expression: expression.to_string(),
        reason: e.to_string(),
    })
}

/// First fire strictly after `after`.
pub fn next_fire(schedule: &Schedule, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
    schedule.after(&after).next()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportSchedule {
    pub id: Uuid,
    pub name: String,
    pub report_period: ReportPeriod,
    pub cron_expression: String,
    pub recipients: Vec<Uuid>,
    pub is_active: bool,
    pub created_by: Option<Uuid>,
    pub last_run_at: Option<DateTime<Utc>>,
    pub next_run_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl ReportSchedule {
    pub fn from_request(
        request: CreateScheduleRequest,
        created_by: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let schedule = parse_cron(&request.cron_expression)?;
        Ok(Self {
            id: Uuid::new_v4(),
            name: request.name,
            report_period: request.report_period,
            cron_expression: request.cron_expression,
            recipients: request.recipients,
            is_active: true,
            created_by,
            last_run_at: None,
            next_run_at: next_fire(&schedule, now),
            created_at: now,
        })
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.next_run_at.is_some_and(|next| next <= now)
    }

    /// Records a run and moves `next_run_at` to the next fire after `now`.
    pub fn mark_ran(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        let schedule = parse_cron(&self.cron_expression)?;
        self.last_run_at = Some(now);
        self.next_run_at = next_fire(&schedule, now);
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateScheduleRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[serde(default)]
    pub report_period: ReportPeriod,
    #[validate(length(min = 1))]
    pub cron_expression: String,
    #[serde(default)]
    pub recipients: Vec<Uuid>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn request(cron: &str) -> CreateScheduleRequest {
        CreateScheduleRequest {
            name: "Monthly board pack".into(),
            report_period: ReportPeriod::Monthly,
            cron_expression: cron.into(),
            recipients: vec![],
        }
    }

    #[test]
    fn test_next_run_from_cron() {
        let now = Utc.with_ymd_and_hms(2026, 5, 14, 10, 30, 0).unwrap();
        let schedule = ReportSchedule::from_request(request("0 0 * * * *"), None, now).unwrap();
        assert_eq!(
            schedule.next_run_at,
            Some(Utc.with_ymd_and_hms(2026, 5, 14, 11, 0, 0).unwrap())
        );
        assert!(!schedule.is_due(now));
        assert!(schedule.is_due(now + chrono::Duration::hours(1)));
    }

    #[test]
    fn test_mark_ran_advances() {
        let now = Utc.with_ymd_and_hms(2026, 5, 14, 10, 30, 0).unwrap();
        let mut schedule = ReportSchedule::from_request(request("0 0 8 * * *"), None, now).unwrap();
        let ran_at = Utc.with_ymd_and_hms(2026, 5, 15, 8, 0, 5).unwrap();
        schedule.mark_ran(ran_at).unwrap();
        assert_eq!(schedule.last_run_at, Some(ran_at));
        assert_eq!(
            schedule.next_run_at,
            Some(Utc.with_ymd_and_hms(2026, 5, 16, 8, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_invalid_cron() {
        let err = ReportSchedule::from_request(request("every hour"), None, Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::InvalidSchedule { .. }));
    }

    #[test]
    fn test_inactive_never_due() {
        let now = Utc::now();
        let mut schedule = ReportSchedule::from_request(request("0 0 * * * *"), None, now).unwrap();
        schedule.is_active = false;
        assert!(!schedule.is_due(now + chrono::Duration::days(1)));
    }
}

// grc-core/src/application/mod.rs

pub mod approvals;
pub mod controls;
pub mod dispatch;
pub mod import;
pub mod narrative;
pub mod notify;
pub mod policies;
pub mod ports;
pub mod reminders;
pub mod reporting;
pub mod scheduler;
pub mod versions;

// --- RE-EXPORTS (FACADE) ---
// Lets the CLI write `use grc_core::application::{ComplianceReportingService, Scheduler};`

pub use approvals::PolicyApprovalService;
pub use controls::ControlService;
pub use dispatch::{DispatchSummary, ScheduledReportDispatcher};
pub use import::{DatasetImporter, ImportSummary};
pub use narrative::NarrativeWriter;
pub use policies::PolicyService;
pub use reminders::{ReminderSummary, ReviewReminderJob};
pub use reporting::ComplianceReportingService;
pub use scheduler::{ScheduledTask, Scheduler, SnapshotJob};
pub use versions::PolicyVersionService;

// grc-core/src/ports/mod.rs

// What the application needs from the outside world, without knowing how it is done.

pub mod notifier;
pub mod repository;

pub use notifier::{NoopNotifier, Notifier};
pub use repository::{
    ApprovalRepository, AssignmentRepository, ControlRepository, GrcStore, ObjectiveRepository,
    PolicyRepository, ReminderLog, ReportRepository, ScheduleRepository, UserRepository,
    VersionRepository,
};

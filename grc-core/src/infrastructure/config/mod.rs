// grc-core/src/infrastructure/config/mod.rs

pub mod settings;

pub use settings::{
    NotificationSettings, ReportingSettings, SchedulerSettings, Settings, find_main_config,
    load_settings,
};

// grc-core/src/infrastructure/adapters/mod.rs

pub mod duckdb;
pub mod notifier;

pub use self::duckdb::DuckDbStore;
pub use notifier::{FanOutNotifier, LogNotifier};

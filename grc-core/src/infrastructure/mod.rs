// grc-core/src/infrastructure/mod.rs

pub mod adapters;
pub mod config;
pub mod error;
pub mod fs;
pub mod templates;

pub use adapters::{DuckDbStore, FanOutNotifier, LogNotifier};
pub use templates::JinjaRenderer;

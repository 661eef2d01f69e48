// grc-core/src/infrastructure/templates/mod.rs

pub mod jinja;

pub use jinja::JinjaRenderer;

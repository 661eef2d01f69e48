// grc-core/src/lib.rs

// 1. Documentation
#![allow(missing_docs)]

// 2. Memory safety
#![deny(unsafe_code)]
// 3. Robustness
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
// 4. Performance
#![warn(clippy::perf)]

// --- HEXAGONAL MODULES ---

// 1. Ports
// Storage and notification contracts (GrcStore, Notifier)
pub mod ports;

// 2. Domain
// Policies, controls, scoring, trends, schedules. Depends on nothing else in the crate.
pub mod domain;

// 3. Infrastructure (Adapters)
// DuckDB store, YAML settings, Jinja narratives, notifier sinks
pub mod infrastructure;

// 4. Application (Use Cases)
// Reporting, policy lifecycle, approvals, versions, reminders, scheduler
pub mod application;

// --- ERRORS ---
pub mod error;

// --- RE-EXPORTS (FACADE) ---
pub use error::GrcError;

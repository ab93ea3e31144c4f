//! Core engine for the project tracker
//!
//! This crate owns the whole domain: accounts and credentials, projects
//! and rosters, requirements, sprints, tasks, progress reporting, the
//! issue and forum workflows, and the dashboard aggregations. Frontends
//! (the CLI, the assistant crate) drive it exclusively through
//! [`Tracker`] with an explicit [`SessionContext`] per call; nothing in
//! here reads ambient user state.
//!
//! Storage is a single SQLite file. All writes that must hold together
//! run inside one transaction; every error is a typed [`TrackerError`].

#![deny(clippy::print_stdout, clippy::print_stderr)]

pub mod cache;
pub mod config;
pub mod credentials;
pub mod db;
pub mod errors;
pub mod model;
pub mod services;
pub mod session;

pub use config::{DeploymentProfile, TrackerConfig};
pub use credentials::{LoginKind, Principal, authenticate, hash_password, verify_password};
pub use db::Db;
pub use errors::{ErrorCategory, Result, TrackerError};
pub use services::Tracker;
pub use session::SessionContext;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

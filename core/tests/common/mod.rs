//! Shared fixtures for the tracker integration suites

#![allow(dead_code)]
#![allow(clippy::expect_used, clippy::unwrap_used)]

use chrono::NaiveDate;
use projtrack_core::services::NewTask;
use projtrack_core::{DeploymentProfile, LoginKind, SessionContext, Tracker};

pub const ADMIN_PASS: &str = "root-pass";
pub const MANAGER_PASS: &str = "mgr-pass";
pub const MEMBER_PASS: &str = "member-pass";

/// An in-memory tracker with one super-admin, one project manager, and
/// two team members, each holding a logged-in session.
pub struct Fixture {
    pub tracker: Tracker,
    pub admin: SessionContext,
    pub manager: SessionContext,
    pub alice: SessionContext,
    pub bob: SessionContext,
    pub manager_id: i64,
    pub alice_id: i64,
    pub bob_id: i64,
}

impl Fixture {
    pub fn new() -> Self {
        let mut tracker =
            Tracker::open_in_memory(DeploymentProfile::ThreeRole).expect("open tracker");
        tracker.seed_bootstrap("root", ADMIN_PASS).expect("seed admin");

        let mut admin = SessionContext::default();
        tracker
            .login(&mut admin, "root", ADMIN_PASS, LoginKind::ManagerOrAdmin)
            .expect("admin login");

        let manager_id = tracker
            .create_project_manager(&admin, "mgr", MANAGER_PASS)
            .expect("create manager");
        let mut manager = SessionContext::default();
        tracker
            .login(&mut manager, "mgr", MANAGER_PASS, LoginKind::ManagerOrAdmin)
            .expect("manager login");

        let alice_id = tracker
            .create_team_member(&admin, "Alice", "alice@example.com", MEMBER_PASS)
            .expect("create alice");
        let bob_id = tracker
            .create_team_member(&admin, "Bob", "bob@example.com", MEMBER_PASS)
            .expect("create bob");

        let mut alice = SessionContext::default();
        tracker
            .login(&mut alice, "alice@example.com", MEMBER_PASS, LoginKind::TeamMember)
            .expect("alice login");
        let mut bob = SessionContext::default();
        tracker
            .login(&mut bob, "bob@example.com", MEMBER_PASS, LoginKind::TeamMember)
            .expect("bob login");

        Self {
            tracker,
            admin,
            manager,
            alice,
            bob,
            manager_id,
            alice_id,
            bob_id,
        }
    }

    /// A project owned by the fixture manager, with Alice and Bob on
    /// the roster.
    pub fn seeded_project(&mut self, name: &str) -> i64 {
        let project_id = self
            .tracker
            .create_project(&self.manager, name, "integration project", None)
            .expect("create project");
        self.tracker
            .add_member_to_project(&self.manager, project_id, self.alice_id)
            .expect("assign alice");
        self.tracker
            .add_member_to_project(&self.manager, project_id, self.bob_id)
            .expect("assign bob");
        project_id
    }

    /// A bare task assigned to `assignee_id`, due far in the future.
    pub fn quick_task(&mut self, project_id: i64, assignee_id: i64, title: &str) -> i64 {
        self.tracker
            .create_task(
                &self.manager,
                project_id,
                NewTask {
                    sprint_id: None,
                    requirement_id: None,
                    title: title.to_string(),
                    description: format!("work on {title}"),
                    assigned_to_id: assignee_id,
                    due_date: date(2030, 1, 1),
                },
            )
            .expect("create task")
    }
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date literal")
}

#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Role and scope enforcement across the service surface:
//! - a manager sees and manages only their own projects
//! - a team member's scope follows roster membership
//! - a super-admin views everything but manages only unclaimed projects
//! - the two-role profile folds management into the super-admin
//! - a logged-out session is rejected everywhere

mod common;

use common::Fixture;
use pretty_assertions::assert_eq;
use projtrack_core::{DeploymentProfile, ErrorCategory, LoginKind, SessionContext, Tracker};

#[test]
fn manager_sees_only_their_own_projects() {
    let mut fx = Fixture::new();
    let apollo = fx
        .tracker
        .create_project(&fx.manager, "Apollo", "flight software", None)
        .expect("create apollo");
    fx.tracker
        .create_project(&fx.admin, "Zephyr", "unclaimed sandbox", None)
        .expect("create zephyr");

    let all = fx.tracker.list_projects(&fx.admin).expect("admin list");
    assert_eq!(all.len(), 2);

    let mine = fx.tracker.list_projects(&fx.manager).expect("manager list");
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].id, apollo);
    assert_eq!(mine[0].manager_id, Some(fx.manager_id));
}

#[test]
fn manager_cannot_read_foreign_projects() {
    let mut fx = Fixture::new();
    let zephyr = fx
        .tracker
        .create_project(&fx.admin, "Zephyr", "unclaimed sandbox", None)
        .expect("create zephyr");

    let err = fx
        .tracker
        .get_project(&fx.manager, zephyr)
        .expect_err("out of scope");
    assert_eq!(err.category(), ErrorCategory::Authorization);
}

#[test]
fn team_member_scope_follows_membership() {
    let mut fx = Fixture::new();
    let apollo = fx
        .tracker
        .create_project(&fx.manager, "Apollo", "flight software", None)
        .expect("create apollo");
    let borealis = fx
        .tracker
        .create_project(&fx.manager, "Borealis", "ground station", None)
        .expect("create borealis");
    fx.tracker
        .add_member_to_project(&fx.manager, apollo, fx.alice_id)
        .expect("assign alice");

    let visible = fx.tracker.list_projects(&fx.alice).expect("alice list");
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].id, apollo);

    let err = fx
        .tracker
        .get_project(&fx.alice, borealis)
        .expect_err("not a member");
    assert_eq!(err.category(), ErrorCategory::Authorization);

    fx.tracker
        .add_member_to_project(&fx.manager, borealis, fx.alice_id)
        .expect("assign alice to borealis");
    assert_eq!(fx.tracker.list_projects(&fx.alice).expect("list").len(), 2);
}

#[test]
fn super_admin_manages_only_unclaimed_projects() {
    let mut fx = Fixture::new();
    let apollo = fx.seeded_project("Apollo");
    let zephyr = fx
        .tracker
        .create_project(&fx.admin, "Zephyr", "unclaimed sandbox", None)
        .expect("create zephyr");

    // Content management on a claimed project is the owner's alone.
    let err = fx
        .tracker
        .add_requirement(&fx.admin, apollo, "Telemetry", "downlink housekeeping data")
        .expect_err("claimed project");
    assert_eq!(err.category(), ErrorCategory::Authorization);

    fx.tracker
        .add_requirement(&fx.admin, zephyr, "Telemetry", "downlink housekeeping data")
        .expect("unclaimed project");

    // Roster and deletion stay global super-admin rights.
    fx.tracker
        .add_member_to_project(&fx.admin, zephyr, fx.alice_id)
        .expect("admin roster right");
    fx.tracker
        .delete_project(&fx.admin, apollo)
        .expect("admin deletes a claimed project");
    assert_eq!(
        fx.tracker
            .get_project(&fx.admin, apollo)
            .expect_err("gone")
            .category(),
        ErrorCategory::NotFound
    );
}

#[test]
fn two_role_profile_folds_management_into_admin() {
    let mut tracker =
        Tracker::open_in_memory(DeploymentProfile::TwoRole).expect("open tracker");
    tracker
        .seed_bootstrap("root", common::ADMIN_PASS)
        .expect("seed");
    let mut admin = SessionContext::default();
    tracker
        .login(&mut admin, "root", common::ADMIN_PASS, LoginKind::ManagerOrAdmin)
        .expect("login");

    let err = tracker
        .create_project_manager(&admin, "mgr", "mgr-pass")
        .expect_err("no manager tier");
    assert_eq!(err.category(), ErrorCategory::Validation);

    let project = tracker
        .create_project(&admin, "Solo", "single-admin deployment", None)
        .expect("create project");
    tracker
        .add_requirement(&admin, project, "Ingest", "parse the nightly drop")
        .expect("admin manages content directly");
}

#[test]
fn logged_out_session_is_rejected() {
    let mut fx = Fixture::new();
    let apollo = fx.seeded_project("Apollo");

    let anonymous = SessionContext::default();
    let err = fx
        .tracker
        .list_projects(&anonymous)
        .expect_err("no principal");
    assert_eq!(err.category(), ErrorCategory::Authorization);

    fx.alice.logout();
    let err = fx
        .tracker
        .get_project(&fx.alice, apollo)
        .expect_err("logged out");
    assert_eq!(err.category(), ErrorCategory::Authorization);
}

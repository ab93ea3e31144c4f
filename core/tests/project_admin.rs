#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Store-level administration:
//! - unique names, emails, and roster pairs come back as DuplicateKey
//! - deleting a project takes its children with it
//! - name-to-id resolution tracks roster changes through the cache
//! - dashboard tallies: status counts, timeliness, per-member progress
//! - refined requirement text lands only through the explicit save
//! - resources are owner-managed, project-visible
//! - startup against a db file is idempotent; the seed never resets

mod common;

use common::{Fixture, date};
use pretty_assertions::assert_eq;
use projtrack_core::model::TaskStatus;
use projtrack_core::services::NewTask;
use projtrack_core::{
    DeploymentProfile, ErrorCategory, LoginKind, SessionContext, Tracker, TrackerConfig,
};

#[test]
fn duplicate_names_and_pairs_are_duplicate_keys() {
    let mut fx = Fixture::new();
    let apollo = fx.seeded_project("Apollo");

    let err = fx
        .tracker
        .create_project(&fx.manager, "Apollo", "same name again", None)
        .expect_err("project names are unique");
    assert_eq!(err.category(), ErrorCategory::DuplicateKey);
    assert!(err.category().recoverable());

    let err = fx
        .tracker
        .create_team_member(&fx.admin, "Alice Clone", "alice@example.com", "pw")
        .expect_err("emails are unique");
    assert_eq!(err.category(), ErrorCategory::DuplicateKey);

    let err = fx
        .tracker
        .create_team_member(&fx.admin, "Mallory", "not-an-email", "pw")
        .expect_err("email shape");
    assert_eq!(err.category(), ErrorCategory::Validation);

    let err = fx
        .tracker
        .add_member_to_project(&fx.manager, apollo, fx.alice_id)
        .expect_err("already on the roster");
    assert_eq!(err.category(), ErrorCategory::DuplicateKey);

    let err = fx
        .tracker
        .create_project_manager(&fx.admin, "mgr", "another-pass")
        .expect_err("manager usernames are unique");
    assert_eq!(err.category(), ErrorCategory::DuplicateKey);
}

#[test]
fn project_delete_cascades_children() {
    let mut fx = Fixture::new();
    let apollo = fx.seeded_project("Apollo");
    let requirement = fx
        .tracker
        .add_requirement(&fx.manager, apollo, "Telemetry", "downlink housekeeping")
        .expect("requirement");
    let sprint = fx
        .tracker
        .create_sprint(
            &fx.manager,
            apollo,
            "Sprint 1",
            None,
            date(2030, 1, 1),
            date(2030, 1, 14),
        )
        .expect("sprint");
    let task = fx.quick_task(apollo, fx.alice_id, "Wire telemetry");
    fx.tracker
        .add_resource(&fx.manager, apollo, "ICD", "https://docs.example.com/icd", None)
        .expect("resource");

    fx.tracker
        .delete_project(&fx.admin, apollo)
        .expect("admin may delete any project");

    for err in [
        fx.tracker.get_task(&fx.admin, task).expect_err("task gone"),
        fx.tracker
            .get_requirement(&fx.admin, requirement)
            .expect_err("requirement gone"),
        fx.tracker
            .sprint_progress(&fx.admin, sprint)
            .expect_err("sprint gone"),
    ] {
        assert_eq!(err.category(), ErrorCategory::NotFound);
    }
}

#[test]
fn name_resolution_tracks_roster_changes() {
    let mut fx = Fixture::new();
    let apollo = fx.seeded_project("Apollo");

    let resolved = fx
        .tracker
        .resolve_member_id(&fx.manager, apollo, "Alice")
        .expect("resolve alice");
    assert_eq!(resolved, fx.alice_id);

    fx.tracker
        .remove_member_from_project(&fx.manager, apollo, fx.alice_id)
        .expect("remove alice");
    let err = fx
        .tracker
        .resolve_member_id(&fx.manager, apollo, "Alice")
        .expect_err("the cached map was invalidated");
    assert_eq!(err.category(), ErrorCategory::NotFound);

    let requirement = fx
        .tracker
        .add_requirement(&fx.manager, apollo, "Telemetry", "downlink housekeeping")
        .expect("requirement");
    assert_eq!(
        fx.tracker
            .resolve_requirement_id(&fx.manager, apollo, "Telemetry")
            .expect("resolve requirement"),
        requirement
    );

    let sprint = fx
        .tracker
        .create_sprint(
            &fx.manager,
            apollo,
            "Sprint 1",
            None,
            date(2030, 1, 1),
            date(2030, 1, 14),
        )
        .expect("sprint");
    assert_eq!(
        fx.tracker
            .resolve_sprint_id(&fx.manager, apollo, "Sprint 1")
            .expect("resolve sprint"),
        sprint
    );
}

#[test]
fn status_counts_and_timeliness_tally_correctly() {
    let mut fx = Fixture::new();
    let apollo = fx.seeded_project("Apollo");

    let in_progress = fx.quick_task(apollo, fx.alice_id, "In flight");
    fx.tracker
        .update_task_status(&fx.alice, in_progress, TaskStatus::InProgress)
        .expect("move");
    let blocked = fx.quick_task(apollo, fx.bob_id, "Stuck");
    fx.tracker
        .update_task_status(&fx.bob, blocked, TaskStatus::Blocked)
        .expect("move");
    fx.quick_task(apollo, fx.alice_id, "Untouched");

    // Done before the deadline: the fixture due date is far out.
    let punctual = fx.quick_task(apollo, fx.alice_id, "Punctual");
    fx.tracker
        .update_task_status(&fx.alice, punctual, TaskStatus::Done)
        .expect("finish");
    // Done long after its deadline.
    let overdue = fx
        .tracker
        .create_task(
            &fx.manager,
            apollo,
            NewTask {
                sprint_id: None,
                requirement_id: None,
                title: "Overdue".to_string(),
                description: "finished late".to_string(),
                assigned_to_id: fx.bob_id,
                due_date: date(2020, 1, 1),
            },
        )
        .expect("create overdue");
    fx.tracker
        .update_task_status(&fx.bob, overdue, TaskStatus::Done)
        .expect("finish late");

    let counts = fx
        .tracker
        .project_status_counts(&fx.manager, apollo)
        .expect("counts");
    assert_eq!(counts.to_do, 1);
    assert_eq!(counts.in_progress, 1);
    assert_eq!(counts.done, 2);
    assert_eq!(counts.blocked, 1);
    assert_eq!(counts.total(), 5);

    let timeliness = fx
        .tracker
        .completion_timeliness(&fx.manager, apollo)
        .expect("timeliness");
    assert_eq!(timeliness.on_time, 1);
    assert_eq!(timeliness.late, 1);
}

#[test]
fn team_progress_tallies_by_member() {
    let mut fx = Fixture::new();
    let apollo = fx.seeded_project("Apollo");

    let first = fx.quick_task(apollo, fx.alice_id, "First");
    fx.quick_task(apollo, fx.alice_id, "Second");
    fx.quick_task(apollo, fx.bob_id, "Third");
    fx.tracker
        .update_task_status(&fx.alice, first, TaskStatus::Done)
        .expect("finish");

    let second = fx
        .tracker
        .resolve_task_id(&fx.alice, apollo, "Second")
        .expect("resolve");
    fx.tracker
        .raise_issue(
            &fx.alice,
            second,
            projtrack_core::model::IssueType::Doubt,
            "unclear acceptance criteria",
            false,
        )
        .expect("raise");

    let rows = fx.tracker.team_progress(&fx.manager, apollo).expect("rows");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].member_name, "Alice");
    assert_eq!(rows[0].total_tasks, 2);
    assert_eq!(rows[0].done_tasks, 1);
    assert_eq!(rows[0].open_issues, 1);
    assert_eq!(rows[1].member_name, "Bob");
    assert_eq!(rows[1].total_tasks, 1);
    assert_eq!(rows[1].done_tasks, 0);
    assert_eq!(rows[1].open_issues, 0);
}

#[test]
fn refined_text_lands_only_through_explicit_save() {
    let mut fx = Fixture::new();
    let apollo = fx.seeded_project("Apollo");
    let requirement = fx
        .tracker
        .add_requirement(&fx.manager, apollo, "Telemetry", "downlink housekeeping")
        .expect("requirement");

    assert_eq!(
        fx.tracker
            .get_requirement(&fx.manager, requirement)
            .expect("load")
            .refined_description,
        None
    );

    let err = fx
        .tracker
        .save_refined_description(&fx.admin, requirement, "admin draft")
        .expect_err("claimed project");
    assert_eq!(err.category(), ErrorCategory::Authorization);

    let err = fx
        .tracker
        .save_refined_description(&fx.manager, requirement, "   ")
        .expect_err("blank refinement");
    assert_eq!(err.category(), ErrorCategory::Validation);

    fx.tracker
        .save_refined_description(&fx.manager, requirement, "As a flight controller, I need…")
        .expect("save");
    assert_eq!(
        fx.tracker
            .get_requirement(&fx.manager, requirement)
            .expect("reload")
            .refined_description
            .as_deref(),
        Some("As a flight controller, I need…")
    );
}

#[test]
fn resources_are_owner_managed_and_project_visible() {
    let mut fx = Fixture::new();
    let apollo = fx.seeded_project("Apollo");

    let icd = fx
        .tracker
        .add_resource(
            &fx.manager,
            apollo,
            "ICD",
            "https://docs.example.com/icd",
            Some("interface control document"),
        )
        .expect("add");
    fx.tracker
        .add_resource(&fx.manager, apollo, "Wiki", "https://wiki.example.com", None)
        .expect("add");

    let err = fx
        .tracker
        .add_resource(&fx.alice, apollo, "Mine", "https://a.example.com", None)
        .expect_err("members cannot add");
    assert_eq!(err.category(), ErrorCategory::Authorization);

    let shelf = fx.tracker.list_resources(&fx.alice, apollo).expect("list");
    assert_eq!(shelf.len(), 2);
    assert_eq!(shelf[0].title, "ICD");

    let err = fx
        .tracker
        .delete_resource(&fx.admin, icd.id)
        .expect_err("claimed project");
    assert_eq!(err.category(), ErrorCategory::Authorization);

    fx.tracker
        .delete_resource(&fx.manager, icd.id)
        .expect("owner deletes");
    assert_eq!(
        fx.tracker
            .list_resources(&fx.alice, apollo)
            .expect("list")
            .len(),
        1
    );

    let err = fx
        .tracker
        .delete_resource(&fx.manager, icd.id)
        .expect_err("already gone");
    assert_eq!(err.category(), ErrorCategory::NotFound);
}

#[test]
fn startup_against_a_file_is_idempotent() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("tracker.db");
    let mut cfg = TrackerConfig {
        db_path: db_path.to_string_lossy().into_owned(),
        bootstrap: projtrack_core::config::BootstrapConfig {
            admin_username: "root".to_string(),
            admin_password: "first-pass".to_string(),
        },
        ..TrackerConfig::default()
    };

    {
        let tracker = Tracker::init(&cfg).expect("first init");
        let mut session = SessionContext::default();
        tracker
            .login(&mut session, "root", "first-pass", LoginKind::ManagerOrAdmin)
            .expect("bootstrap login");
    }

    // A changed bootstrap password must not overwrite the stored hash.
    cfg.bootstrap.admin_password = "second-pass".to_string();
    let tracker = Tracker::init(&cfg).expect("second init");
    assert_eq!(tracker.deployment_profile(), DeploymentProfile::ThreeRole);

    let mut session = SessionContext::default();
    let err = tracker
        .login(&mut session, "root", "second-pass", LoginKind::ManagerOrAdmin)
        .expect_err("new password never took effect");
    assert_eq!(err.category(), ErrorCategory::Authentication);
    tracker
        .login(&mut session, "root", "first-pass", LoginKind::ManagerOrAdmin)
        .expect("original credential survives");
}

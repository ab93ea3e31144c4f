#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Assistant flows against an in-memory tracker:
//!
//! - a streamed refinement draft persists only through an explicit save
//! - a missing API key degrades the assistant and leaves the tracker untouched
//! - an upstream failure mid-stream leaves no partial draft behind
//! - generated task lines stay suggestions until someone creates the task

use async_trait::async_trait;
use chrono::NaiveDate;
use projtrack_assistant::AssistantError;
use projtrack_assistant::ChatMessage;
use projtrack_assistant::CompletionClient;
use projtrack_assistant::CompletionEvent;
use projtrack_assistant::CompletionStream;
use projtrack_assistant::parse_task_lines;
use projtrack_assistant::prompts;
use projtrack_assistant::stream_prompt;
use projtrack_core::DeploymentProfile;
use projtrack_core::LoginKind;
use projtrack_core::SessionContext;
use projtrack_core::Tracker;
use projtrack_core::services::NewTask;
use tokio::sync::mpsc;

enum Step {
    Delta(&'static str),
    Done,
    Fail(u16, &'static str),
}

/// Completion client that replays a fixed script instead of calling out.
struct ScriptedClient {
    script: Vec<Step>,
}

impl ScriptedClient {
    fn completing(chunks: &[&'static str]) -> Self {
        let mut script: Vec<Step> = chunks.iter().copied().map(Step::Delta).collect();
        script.push(Step::Done);
        Self { script }
    }

    fn failing_after(chunk: &'static str, status: u16, message: &'static str) -> Self {
        Self {
            script: vec![Step::Delta(chunk), Step::Fail(status, message)],
        }
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    async fn complete(
        &self,
        _api_key: &str,
        _messages: Vec<ChatMessage>,
    ) -> projtrack_assistant::Result<CompletionStream> {
        let (tx, rx) = mpsc::channel(32);
        for step in &self.script {
            let event = match step {
                Step::Delta(text) => Ok(CompletionEvent::Delta((*text).to_string())),
                Step::Done => Ok(CompletionEvent::Done),
                Step::Fail(status, message) => Err(AssistantError::Upstream {
                    status: *status,
                    message: (*message).to_string(),
                }),
            };
            tx.try_send(event).expect("script fits in the channel");
        }
        Ok(CompletionStream::new(rx))
    }
}

/// A tracker with one managed project and one raw requirement.
struct Backlog {
    tracker: Tracker,
    manager: SessionContext,
    project_id: i64,
    requirement_id: i64,
}

impl Backlog {
    fn new() -> Self {
        let mut tracker =
            Tracker::open_in_memory(DeploymentProfile::ThreeRole).expect("open tracker");
        tracker.seed_bootstrap("root", "root-pass").expect("seed admin");

        let mut admin = SessionContext::default();
        tracker
            .login(&mut admin, "root", "root-pass", LoginKind::ManagerOrAdmin)
            .expect("admin login");
        tracker
            .create_project_manager(&admin, "mgr", "mgr-pass")
            .expect("create manager");

        let mut manager = SessionContext::default();
        tracker
            .login(&mut manager, "mgr", "mgr-pass", LoginKind::ManagerOrAdmin)
            .expect("manager login");

        let project_id = tracker
            .create_project(&manager, "Apollo", "Mission tracker", None)
            .expect("create project");
        tracker
            .set_problem_statement(&manager, project_id, "Track mission readiness end to end")
            .expect("set problem statement");
        let requirement_id = tracker
            .add_requirement(&manager, project_id, "Login", "Users sign in")
            .expect("add requirement");

        Self {
            tracker,
            manager,
            project_id,
            requirement_id,
        }
    }

    fn refined_description(&self) -> Option<String> {
        self.tracker
            .get_requirement(&self.manager, self.requirement_id)
            .expect("load requirement")
            .refined_description
    }

    fn refine_vars(&self) -> [(&'static str, &'static str); 3] {
        [
            ("problem_statement", "Track mission readiness end to end"),
            ("req_title", "Login"),
            ("req_desc", "Users sign in"),
        ]
    }
}

#[tokio::test]
async fn refinement_draft_persists_only_through_an_explicit_save() {
    let mut backlog = Backlog::new();
    let client = ScriptedClient::completing(&[
        "## Login\n",
        "Students sign in with their campus email ",
        "and land on their task board.",
    ]);

    let vars = backlog.refine_vars();
    let stream = stream_prompt(
        &client,
        Some("sk-test"),
        prompts::REFINE_SYSTEM_PROMPT,
        prompts::REFINE_HUMAN_TEMPLATE,
        &vars,
    )
    .await
    .expect("stream starts");
    let draft = stream.collect_text().await.expect("stream completes");

    // Streaming alone must not write anything.
    assert_eq!(backlog.refined_description(), None);

    backlog
        .tracker
        .save_refined_description(&backlog.manager, backlog.requirement_id, &draft)
        .expect("save reviewed draft");
    assert_eq!(backlog.refined_description(), Some(draft));
}

#[tokio::test]
async fn missing_key_degrades_without_touching_the_tracker() {
    let backlog = Backlog::new();
    let client = ScriptedClient::completing(&["never reached"]);

    let vars = backlog.refine_vars();
    let err = stream_prompt(
        &client,
        None,
        prompts::REFINE_SYSTEM_PROMPT,
        prompts::REFINE_HUMAN_TEMPLATE,
        &vars,
    )
    .await
    .unwrap_err();

    assert!(err.is_unavailable(), "got {err:?}");
    assert_eq!(backlog.refined_description(), None);

    // The rest of the application keeps working without the assistant.
    let requirements = backlog
        .tracker
        .list_requirements(&backlog.manager, backlog.project_id)
        .expect("list requirements");
    assert_eq!(requirements.len(), 1);
}

#[tokio::test]
async fn a_failed_stream_leaves_no_partial_draft() {
    let backlog = Backlog::new();
    let client = ScriptedClient::failing_after("## Log", 500, "backend exploded");

    let vars = backlog.refine_vars();
    let stream = stream_prompt(
        &client,
        Some("sk-test"),
        prompts::REFINE_SYSTEM_PROMPT,
        prompts::REFINE_HUMAN_TEMPLATE,
        &vars,
    )
    .await
    .expect("stream starts");

    let err = stream.collect_text().await.unwrap_err();
    assert!(!err.is_unavailable(), "upstream failures are recoverable");
    match err {
        AssistantError::Upstream { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "backend exploded");
        }
        other => panic!("expected upstream error, got {other:?}"),
    }
    assert_eq!(backlog.refined_description(), None);
}

#[tokio::test]
async fn generated_tasks_stay_suggestions_until_someone_accepts_one() {
    let mut backlog = Backlog::new();
    backlog
        .tracker
        .save_refined_description(
            &backlog.manager,
            backlog.requirement_id,
            "Students sign in with their campus email.",
        )
        .expect("save refined text");

    let client = ScriptedClient::completing(&[
        "Build login form :: Create the sign-in page.\n",
        "Add session check :: ",
        "Redirect logged-out users.\n",
    ]);
    let vars = [("refined_desc", "Students sign in with their campus email.")];
    let stream = stream_prompt(
        &client,
        Some("sk-test"),
        prompts::TASKGEN_SYSTEM_PROMPT,
        prompts::TASKGEN_HUMAN_TEMPLATE,
        &vars,
    )
    .await
    .expect("stream starts");
    let output = stream.collect_text().await.expect("stream completes");

    let drafts = parse_task_lines(&output);
    assert_eq!(drafts.len(), 2);
    assert_eq!(drafts[0].title, "Build login form");

    // Nothing was created behind the manager's back.
    let tasks = backlog
        .tracker
        .list_project_tasks(&backlog.manager, backlog.project_id)
        .expect("list tasks");
    assert!(tasks.is_empty());

    // Accepting a draft is an ordinary explicit task creation.
    let member_id = backlog
        .tracker
        .create_team_member(&backlog.manager, "Alice", "alice@example.com", "member-pass")
        .expect("create member");
    backlog
        .tracker
        .add_member_to_project(&backlog.manager, backlog.project_id, member_id)
        .expect("assign member");
    backlog
        .tracker
        .create_task(
            &backlog.manager,
            backlog.project_id,
            NewTask {
                sprint_id: None,
                requirement_id: Some(backlog.requirement_id),
                title: drafts[0].title.clone(),
                description: drafts[0].description.clone(),
                assigned_to_id: member_id,
                due_date: NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
            },
        )
        .expect("create task from draft");

    let tasks = backlog
        .tracker
        .list_project_tasks(&backlog.manager, backlog.project_id)
        .expect("list tasks");
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].task.title, "Build login form");
}

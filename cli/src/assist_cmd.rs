//! Assistant subcommands: requirement refinement, task suggestion, and the
//! task mentor.
//!
//! Each command streams the completion to stdout as it arrives. Nothing is
//! written back to the tracker unless the stream finishes cleanly and the
//! caller asked for a save.

use crate::auth::AuthArgs;
use anyhow::bail;
use clap::Parser;
use futures::StreamExt;
use projtrack_assistant::ChatCompletionsClient;
use projtrack_assistant::CompletionEvent;
use projtrack_assistant::CompletionStream;
use projtrack_assistant::MentorPreset;
use projtrack_assistant::context;
use projtrack_assistant::parse_task_lines;
use projtrack_assistant::prompts;
use projtrack_assistant::stream_prompt;
use projtrack_core::TrackerConfig;
use projtrack_core::model::Role;
use projtrack_core::model::TaskStatus;
use std::io::Write;

/// Canned mentor questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum PresetArg {
    #[value(name = "approach")]
    Approach,
    #[value(name = "steps")]
    Steps,
    #[value(name = "code-prompts")]
    CodePrompts,
}

impl From<PresetArg> for MentorPreset {
    fn from(arg: PresetArg) -> Self {
        match arg {
            PresetArg::Approach => MentorPreset::SuggestApproach,
            PresetArg::Steps => MentorPreset::StepBreakdown,
            PresetArg::CodePrompts => MentorPreset::CodePrompts,
        }
    }
}

#[derive(Debug, Parser)]
pub struct RefineArgs {
    /// Requirement id.
    #[arg(long = "requirement")]
    requirement_id: i64,
    /// Persist the refined description once the stream completes.
    #[arg(long = "save")]
    save: bool,
}

#[derive(Debug, Parser)]
pub struct GenerateTasksArgs {
    /// Requirement id.
    #[arg(long = "requirement")]
    requirement_id: i64,
}

#[derive(Debug, Parser)]
pub struct MentorArgs {
    /// Task id.
    #[arg(long = "task")]
    task_id: i64,
    /// Your question for the mentor.
    #[arg(long = "question")]
    question: Option<String>,
    /// A canned question instead of your own.
    #[arg(long = "preset", value_name = "PRESET")]
    preset: Option<PresetArg>,
}

pub async fn refine(args: &RefineArgs, auth: &AuthArgs, cfg: &TrackerConfig) -> anyhow::Result<()> {
    let mut cli = auth.login(cfg)?;
    let requirement = cli
        .tracker
        .get_requirement(&cli.session, args.requirement_id)?;
    let project = cli.tracker.get_project(&cli.session, requirement.project_id)?;
    let problem_statement = project.problem_statement.as_deref().unwrap_or("");

    let client = ChatCompletionsClient::with_config(cfg.assistant.clone());
    let vars = [
        ("problem_statement", problem_statement),
        ("req_title", requirement.title.as_str()),
        ("req_desc", requirement.description.as_str()),
    ];
    let stream = stream_prompt(
        &client,
        cli.session.assistant_api_key(),
        prompts::REFINE_SYSTEM_PROMPT,
        prompts::REFINE_HUMAN_TEMPLATE,
        &vars,
    )
    .await?;
    let draft = stream_to_stdout(stream).await?;

    if args.save {
        cli.tracker
            .save_refined_description(&cli.session, args.requirement_id, &draft)?;
        println!("refined description saved");
    } else {
        println!("draft not saved; rerun with --save to keep it");
    }
    Ok(())
}

pub async fn generate_tasks(
    args: &GenerateTasksArgs,
    auth: &AuthArgs,
    cfg: &TrackerConfig,
) -> anyhow::Result<()> {
    let cli = auth.login(cfg)?;
    let requirement = cli
        .tracker
        .get_requirement(&cli.session, args.requirement_id)?;
    let Some(refined) = requirement.refined_description.as_deref() else {
        bail!(
            "requirement {} has no refined description; refine it first",
            args.requirement_id
        );
    };

    let client = ChatCompletionsClient::with_config(cfg.assistant.clone());
    let stream = stream_prompt(
        &client,
        cli.session.assistant_api_key(),
        prompts::TASKGEN_SYSTEM_PROMPT,
        prompts::TASKGEN_HUMAN_TEMPLATE,
        &[("refined_desc", refined)],
    )
    .await?;
    let text = stream_to_stdout(stream).await?;

    let drafts = parse_task_lines(&text);
    if drafts.is_empty() {
        println!("no task lines found in the response");
        return Ok(());
    }
    println!();
    println!("suggested tasks (accept one with `projtrack task create`):");
    for draft in &drafts {
        println!("  - {}", draft.title);
        if !draft.description.is_empty() {
            println!("    {}", draft.description);
        }
    }
    Ok(())
}

pub async fn mentor(args: &MentorArgs, auth: &AuthArgs, cfg: &TrackerConfig) -> anyhow::Result<()> {
    let cli = auth.login(cfg)?;
    let task = cli.tracker.get_task(&cli.session, args.task_id)?;
    if task.status == TaskStatus::Done {
        bail!("task {} is already done", args.task_id);
    }
    let principal = cli.session.require_principal()?;
    if principal.role == Role::TeamMember && task.assigned_to_id != principal.id {
        bail!("task {} is not assigned to you", args.task_id);
    }

    let question = match (&args.question, args.preset) {
        (Some(q), None) => q.clone(),
        (None, Some(preset)) => MentorPreset::from(preset).question().to_string(),
        (Some(_), Some(_)) => bail!("pass either --question or --preset, not both"),
        (None, None) => bail!("a question is required (--question or --preset)"),
    };

    let project = cli.tracker.get_project(&cli.session, task.project_id)?;
    let requirements = cli.tracker.list_requirements(&cli.session, task.project_id)?;
    let project_ctx = context::project_context(&project, &requirements);
    let task_ctx = context::task_context(&task);

    let client = ChatCompletionsClient::with_config(cfg.assistant.clone());
    let stream = stream_prompt(
        &client,
        cli.session.assistant_api_key(),
        prompts::MENTOR_SYSTEM_PROMPT,
        prompts::MENTOR_HUMAN_TEMPLATE,
        &[
            ("project_context", project_ctx.as_str()),
            ("task_context", task_ctx.as_str()),
            ("user_question", question.as_str()),
        ],
    )
    .await?;
    stream_to_stdout(stream).await?;
    Ok(())
}

/// Print deltas as they arrive and hand back the full text once the stream
/// finishes with its completion marker.
async fn stream_to_stdout(mut stream: CompletionStream) -> anyhow::Result<String> {
    let mut text = String::new();
    let mut done = false;
    while let Some(event) = stream.next().await {
        match event? {
            CompletionEvent::Delta(chunk) => {
                print!("{chunk}");
                std::io::stdout().flush()?;
                text.push_str(&chunk);
            }
            CompletionEvent::Done => {
                done = true;
                break;
            }
        }
    }
    if !done {
        bail!("response ended without a completion marker");
    }
    println!();
    Ok(text)
}

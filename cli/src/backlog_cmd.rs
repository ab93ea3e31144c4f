//! Requirement and sprint subcommands.

use crate::auth::AuthArgs;
use crate::auth::CliSession;
use chrono::NaiveDate;
use clap::Parser;
use clap::Subcommand;
use projtrack_core::TrackerConfig;
use projtrack_core::model::Requirement;

#[derive(Debug, Parser)]
pub struct RequirementCli {
    #[command(subcommand)]
    command: RequirementSubcommand,
}

#[derive(Debug, Subcommand)]
enum RequirementSubcommand {
    /// Add a requirement to a project backlog.
    Add(RequirementAddArgs),
    /// List a project's requirements.
    List(RequirementListArgs),
}

#[derive(Debug, Parser)]
struct RequirementAddArgs {
    /// Project id.
    #[arg(long = "project")]
    project_id: i64,
    /// Requirement title.
    title: String,
    /// Initial high-level description.
    description: String,
}

#[derive(Debug, Parser)]
struct RequirementListArgs {
    /// Project id.
    #[arg(long = "project")]
    project_id: i64,
}

impl RequirementCli {
    pub fn run(&self, auth: &AuthArgs, cfg: &TrackerConfig) -> anyhow::Result<()> {
        let mut cli = auth.login(cfg)?;
        match &self.command {
            RequirementSubcommand::Add(args) => {
                let id = cli.tracker.add_requirement(
                    &cli.session,
                    args.project_id,
                    &args.title,
                    &args.description,
                )?;
                println!("added requirement {id}: {}", args.title);
                Ok(())
            }
            RequirementSubcommand::List(args) => {
                let requirements = cli
                    .tracker
                    .list_requirements(&cli.session, args.project_id)?;
                print_requirements(&requirements);
                Ok(())
            }
        }
    }
}

fn print_requirements(requirements: &[Requirement]) {
    if requirements.is_empty() {
        println!("no requirements");
        return;
    }
    for req in requirements {
        let refined = if req.refined_description.is_some() {
            "  [refined]"
        } else {
            ""
        };
        println!("{:>4}  {}{refined}", req.id, req.title);
        println!("      {}", req.description);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Sprints
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Parser)]
pub struct SprintCli {
    #[command(subcommand)]
    command: SprintSubcommand,
}

#[derive(Debug, Subcommand)]
enum SprintSubcommand {
    /// Create a sprint inside a project.
    Create(SprintCreateArgs),
    /// Schedule a requirement into a sprint.
    Assign(SprintAssignArgs),
    /// Show sprint completion and its scheduled requirements.
    Status(SprintStatusArgs),
}

#[derive(Debug, Parser)]
struct SprintCreateArgs {
    /// Project id.
    #[arg(long = "project")]
    project_id: i64,
    /// Sprint name.
    name: String,
    /// Optional sprint goal.
    #[arg(long = "goal")]
    goal: Option<String>,
    /// Start date (YYYY-MM-DD).
    #[arg(long = "start")]
    start: NaiveDate,
    /// End date (YYYY-MM-DD).
    #[arg(long = "end")]
    end: NaiveDate,
}

#[derive(Debug, Parser)]
struct SprintAssignArgs {
    /// Sprint id.
    #[arg(long = "sprint")]
    sprint_id: i64,
    /// Requirement id.
    #[arg(long = "requirement")]
    requirement_id: i64,
}

#[derive(Debug, Parser)]
struct SprintStatusArgs {
    /// Sprint id.
    #[arg(long = "id")]
    sprint_id: i64,
}

impl SprintCli {
    pub fn run(&self, auth: &AuthArgs, cfg: &TrackerConfig) -> anyhow::Result<()> {
        let mut cli = auth.login(cfg)?;
        match &self.command {
            SprintSubcommand::Create(args) => cmd_sprint_create(&mut cli, args),
            SprintSubcommand::Assign(args) => cmd_sprint_assign(&mut cli, args),
            SprintSubcommand::Status(args) => cmd_sprint_status(&cli, args),
        }
    }
}

fn cmd_sprint_create(cli: &mut CliSession, args: &SprintCreateArgs) -> anyhow::Result<()> {
    let id = cli.tracker.create_sprint(
        &cli.session,
        args.project_id,
        &args.name,
        args.goal.as_deref(),
        args.start,
        args.end,
    )?;
    println!("created sprint {id}: {} ({} to {})", args.name, args.start, args.end);
    Ok(())
}

fn cmd_sprint_assign(cli: &mut CliSession, args: &SprintAssignArgs) -> anyhow::Result<()> {
    cli.tracker
        .assign_requirement_to_sprint(&cli.session, args.sprint_id, args.requirement_id)?;
    println!(
        "requirement {} scheduled into sprint {}",
        args.requirement_id, args.sprint_id
    );
    Ok(())
}

fn cmd_sprint_status(cli: &CliSession, args: &SprintStatusArgs) -> anyhow::Result<()> {
    let progress = cli.tracker.sprint_progress(&cli.session, args.sprint_id)?;
    match progress.completion_ratio() {
        Some(ratio) => println!(
            "{} of {} tasks done ({:.0}%)",
            progress.done_tasks,
            progress.total_tasks,
            ratio * 100.0
        ),
        None => println!("no tasks scheduled yet"),
    }

    let requirements = cli
        .tracker
        .sprint_requirements(&cli.session, args.sprint_id)?;
    if !requirements.is_empty() {
        println!("requirements in this sprint:");
        print_requirements(&requirements);
    }

    let candidates = cli
        .tracker
        .unassigned_requirements(&cli.session, args.sprint_id)?;
    if !candidates.is_empty() {
        println!("not yet scheduled:");
        print_requirements(&candidates);
    }
    Ok(())
}

//! `projtrack` entry point.
//!
//! One tracker operation per invocation: resolve configuration, open the
//! database, authenticate from the global identity flags, run the
//! subcommand, exit. Errors print a single sanitized line and exit 1.

use clap::Parser;
use clap::Subcommand;
use projtrack_core::DeploymentProfile;
use projtrack_core::Tracker;
use projtrack_core::TrackerConfig;

mod assist_cmd;
mod auth;
mod backlog_cmd;
mod collab_cmd;
mod people_cmd;
mod project_cmd;
mod task_cmd;

use crate::auth::AuthArgs;

#[derive(Debug, Parser)]
#[command(
    name = "projtrack",
    version,
    about = "Role-scoped project tracking for student teams"
)]
struct Cli {
    #[command(flatten)]
    auth: AuthArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Apply the schema and seed the bootstrap super-admin.
    Init,
    /// Verify credentials and print the resulting role.
    Login,
    /// Project administration and status.
    Project(project_cmd::ProjectCli),
    /// Project-manager accounts.
    Manager(people_cmd::ManagerCli),
    /// Team-member accounts and project rosters.
    Member(people_cmd::MemberCli),
    /// Requirement backlog.
    Requirement(backlog_cmd::RequirementCli),
    /// Sprint planning and progress.
    Sprint(backlog_cmd::SprintCli),
    /// Task creation and status.
    Task(task_cmd::TaskCli),
    /// Issues raised on tasks, and responses.
    Issue(collab_cmd::IssueCli),
    /// Progress updates and the project activity feed.
    Progress(collab_cmd::ProgressCli),
    /// Project-wide doubts forum.
    Forum(collab_cmd::ForumCli),
    /// Shared reference material.
    Resource(collab_cmd::ResourceCli),
    /// Stream an assistant rewrite of a requirement description.
    Refine(assist_cmd::RefineArgs),
    /// Stream task suggestions for a refined requirement.
    GenerateTasks(assist_cmd::GenerateTasksArgs),
    /// Ask the task mentor for guidance.
    Mentor(assist_cmd::MentorArgs),
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(cli) {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

#[tokio::main]
async fn run(cli: Cli) -> anyhow::Result<()> {
    let cfg = TrackerConfig::load()?;
    let Cli { auth, command } = cli;

    match command {
        Command::Init => cmd_init(&cfg),
        Command::Login => cmd_login(&auth, &cfg),
        Command::Project(cmd) => cmd.run(&auth, &cfg),
        Command::Manager(cmd) => cmd.run(&auth, &cfg),
        Command::Member(cmd) => cmd.run(&auth, &cfg),
        Command::Requirement(cmd) => cmd.run(&auth, &cfg),
        Command::Sprint(cmd) => cmd.run(&auth, &cfg),
        Command::Task(cmd) => cmd.run(&auth, &cfg),
        Command::Issue(cmd) => cmd.run(&auth, &cfg),
        Command::Progress(cmd) => cmd.run(&auth, &cfg),
        Command::Forum(cmd) => cmd.run(&auth, &cfg),
        Command::Resource(cmd) => cmd.run(&auth, &cfg),
        Command::Refine(args) => assist_cmd::refine(&args, &auth, &cfg).await,
        Command::GenerateTasks(args) => assist_cmd::generate_tasks(&args, &auth, &cfg).await,
        Command::Mentor(args) => assist_cmd::mentor(&args, &auth, &cfg).await,
    }
}

fn cmd_init(cfg: &TrackerConfig) -> anyhow::Result<()> {
    let tracker = Tracker::init(cfg)?;
    let profile = match tracker.deployment_profile() {
        DeploymentProfile::ThreeRole => "three-role",
        DeploymentProfile::TwoRole => "two-role",
    };
    println!(
        "tracker ready at {} ({profile} profile)",
        cfg.resolved_db_path().display()
    );
    Ok(())
}

fn cmd_login(auth: &AuthArgs, cfg: &TrackerConfig) -> anyhow::Result<()> {
    let cli_session = auth.login(cfg)?;
    let principal = cli_session.session.require_principal()?;
    println!(
        "logged in as {} ({})",
        principal.display_name,
        principal.role.as_str()
    );
    if cli_session.session.assistant_api_key().is_some() {
        println!("assistant key present for this session");
    } else {
        println!("no assistant key; AI commands will be unavailable");
    }
    Ok(())
}

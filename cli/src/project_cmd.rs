//! Project administration subcommands.

use crate::auth::AuthArgs;
use crate::auth::CliSession;
use clap::Parser;
use clap::Subcommand;
use projtrack_core::TrackerConfig;

#[derive(Debug, Parser)]
pub struct ProjectCli {
    #[command(subcommand)]
    command: ProjectSubcommand,
}

#[derive(Debug, Subcommand)]
enum ProjectSubcommand {
    /// Create a project (a manager owns it; an admin's stays unclaimed).
    Create(CreateArgs),
    /// List every project in your scope.
    List,
    /// Delete a project and everything under it.
    Delete(ProjectIdArgs),
    /// Set the problem statement that grounds assistant refinements.
    SetProblem(SetProblemArgs),
    /// Status counts, timeliness, and per-member progress.
    Status(ProjectIdArgs),
}

#[derive(Debug, Parser)]
struct CreateArgs {
    /// Project name (unique).
    name: String,
    /// Short description.
    description: String,
    /// Assign to this manager id (super-admin only).
    #[arg(long = "manager")]
    manager_id: Option<i64>,
}

#[derive(Debug, Parser)]
struct ProjectIdArgs {
    /// Project id.
    #[arg(long = "id")]
    project_id: i64,
}

#[derive(Debug, Parser)]
struct SetProblemArgs {
    /// Project id.
    #[arg(long = "id")]
    project_id: i64,
    /// The problem statement text.
    statement: String,
}

impl ProjectCli {
    pub fn run(&self, auth: &AuthArgs, cfg: &TrackerConfig) -> anyhow::Result<()> {
        let mut cli = auth.login(cfg)?;
        match &self.command {
            ProjectSubcommand::Create(args) => cmd_create(&mut cli, args),
            ProjectSubcommand::List => cmd_list(&cli),
            ProjectSubcommand::Delete(args) => cmd_delete(&mut cli, args),
            ProjectSubcommand::SetProblem(args) => cmd_set_problem(&mut cli, args),
            ProjectSubcommand::Status(args) => cmd_status(&cli, args),
        }
    }
}

fn cmd_create(cli: &mut CliSession, args: &CreateArgs) -> anyhow::Result<()> {
    let id = cli.tracker.create_project(
        &cli.session,
        &args.name,
        &args.description,
        args.manager_id,
    )?;
    println!("created project {id}: {}", args.name);
    Ok(())
}

fn cmd_list(cli: &CliSession) -> anyhow::Result<()> {
    let projects = cli.tracker.list_projects(&cli.session)?;
    if projects.is_empty() {
        println!("no projects in your scope");
        return Ok(());
    }
    for project in &projects {
        let claim = if project.manager_id.is_some() {
            ""
        } else {
            "  [unclaimed]"
        };
        println!("{:>4}  {}{claim}", project.id, project.name);
        println!("      {}", project.description);
    }
    Ok(())
}

fn cmd_delete(cli: &mut CliSession, args: &ProjectIdArgs) -> anyhow::Result<()> {
    cli.tracker.delete_project(&cli.session, args.project_id)?;
    println!("deleted project {}", args.project_id);
    Ok(())
}

fn cmd_set_problem(cli: &mut CliSession, args: &SetProblemArgs) -> anyhow::Result<()> {
    cli.tracker
        .set_problem_statement(&cli.session, args.project_id, &args.statement)?;
    println!("problem statement saved");
    Ok(())
}

fn cmd_status(cli: &CliSession, args: &ProjectIdArgs) -> anyhow::Result<()> {
    let project = cli.tracker.get_project(&cli.session, args.project_id)?;
    let counts = cli
        .tracker
        .project_status_counts(&cli.session, args.project_id)?;
    let timeliness = cli
        .tracker
        .completion_timeliness(&cli.session, args.project_id)?;
    let team = cli.tracker.team_progress(&cli.session, args.project_id)?;

    println!("{}: {} tasks", project.name, counts.total());
    println!(
        "  to do {}, in progress {}, done {}, blocked {}",
        counts.to_do, counts.in_progress, counts.done, counts.blocked
    );
    println!(
        "  completed on time {}, late {}",
        timeliness.on_time, timeliness.late
    );
    if !team.is_empty() {
        println!("team:");
        for member in &team {
            println!(
                "  {}  {} tasks, {} done, {} open issues",
                member.member_name, member.total_tasks, member.done_tasks, member.open_issues
            );
        }
    }
    Ok(())
}

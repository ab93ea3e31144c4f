//! Task subcommands.

use crate::auth::AuthArgs;
use crate::auth::CliSession;
use anyhow::bail;
use chrono::NaiveDate;
use clap::Parser;
use clap::Subcommand;
use projtrack_core::TrackerConfig;
use projtrack_core::model::TaskStatus;
use projtrack_core::services::NewTask;
use projtrack_core::services::TaskOverview;

/// Board status as a command-line value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum StatusArg {
    #[value(name = "todo")]
    Todo,
    #[value(name = "in-progress")]
    InProgress,
    #[value(name = "done")]
    Done,
    #[value(name = "blocked")]
    Blocked,
}

impl From<StatusArg> for TaskStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Todo => TaskStatus::ToDo,
            StatusArg::InProgress => TaskStatus::InProgress,
            StatusArg::Done => TaskStatus::Done,
            StatusArg::Blocked => TaskStatus::Blocked,
        }
    }
}

#[derive(Debug, Parser)]
pub struct TaskCli {
    #[command(subcommand)]
    command: TaskSubcommand,
}

#[derive(Debug, Subcommand)]
enum TaskSubcommand {
    /// Create a task and assign it to a project member.
    Create(TaskCreateArgs),
    /// Move a task to a new status.
    Status(TaskStatusArgs),
    /// List tasks on a project board, or your own assignments.
    List(TaskListArgs),
}

#[derive(Debug, Parser)]
struct TaskCreateArgs {
    /// Project id.
    #[arg(long = "project")]
    project_id: i64,
    /// Task title.
    title: String,
    /// What needs doing.
    description: String,
    /// Assignee member id.
    #[arg(long = "assignee", value_name = "MEMBER_ID")]
    assignee_id: Option<i64>,
    /// Assignee member name, resolved within the project roster.
    #[arg(long = "assignee-name", value_name = "NAME")]
    assignee_name: Option<String>,
    /// Sprint to schedule the task into.
    #[arg(long = "sprint")]
    sprint_id: Option<i64>,
    /// Requirement the task traces back to.
    #[arg(long = "requirement")]
    requirement_id: Option<i64>,
    /// Due date (YYYY-MM-DD).
    #[arg(long = "due")]
    due_date: NaiveDate,
}

#[derive(Debug, Parser)]
struct TaskStatusArgs {
    /// Task id.
    #[arg(long = "id")]
    task_id: i64,
    /// New status.
    status: StatusArg,
}

#[derive(Debug, Parser)]
struct TaskListArgs {
    /// Project id; omit to list your own assignments.
    #[arg(long = "project")]
    project_id: Option<i64>,
}

impl TaskCli {
    pub fn run(&self, auth: &AuthArgs, cfg: &TrackerConfig) -> anyhow::Result<()> {
        let mut cli = auth.login(cfg)?;
        match &self.command {
            TaskSubcommand::Create(args) => cmd_task_create(&mut cli, args),
            TaskSubcommand::Status(args) => cmd_task_status(&mut cli, args),
            TaskSubcommand::List(args) => cmd_task_list(&cli, args),
        }
    }
}

fn cmd_task_create(cli: &mut CliSession, args: &TaskCreateArgs) -> anyhow::Result<()> {
    let assigned_to_id = match (args.assignee_id, &args.assignee_name) {
        (Some(_), Some(_)) => bail!("pass either --assignee or --assignee-name, not both"),
        (Some(id), None) => id,
        (None, Some(name)) => {
            cli.tracker
                .resolve_member_id(&cli.session, args.project_id, name)?
        }
        (None, None) => bail!("an assignee is required (--assignee or --assignee-name)"),
    };

    let id = cli.tracker.create_task(
        &cli.session,
        args.project_id,
        NewTask {
            sprint_id: args.sprint_id,
            requirement_id: args.requirement_id,
            title: args.title.clone(),
            description: args.description.clone(),
            assigned_to_id,
            due_date: args.due_date,
        },
    )?;
    println!("created task {id}: {} (due {})", args.title, args.due_date);
    Ok(())
}

fn cmd_task_status(cli: &mut CliSession, args: &TaskStatusArgs) -> anyhow::Result<()> {
    let task = cli
        .tracker
        .update_task_status(&cli.session, args.task_id, args.status.into())?;
    match task.completion_date {
        Some(date) => {
            println!("task {} is now {} (completed {date})", task.id, task.status.as_str());
        }
        None => println!("task {} is now {}", task.id, task.status.as_str()),
    }
    Ok(())
}

fn cmd_task_list(cli: &CliSession, args: &TaskListArgs) -> anyhow::Result<()> {
    let tasks = match args.project_id {
        Some(project_id) => cli.tracker.list_project_tasks(&cli.session, project_id)?,
        None => cli.tracker.my_tasks(&cli.session)?,
    };
    print_tasks(&tasks);
    Ok(())
}

fn print_tasks(tasks: &[TaskOverview]) {
    if tasks.is_empty() {
        println!("no tasks");
        return;
    }
    for item in tasks {
        let task = &item.task;
        println!(
            "{:>4}  [{}] {}  (due {})",
            task.id,
            task.status.as_str(),
            task.title,
            task.due_date
        );
        let sprint = item.sprint_name.as_deref().unwrap_or("none");
        let requirement = item.requirement_title.as_deref().unwrap_or("none");
        println!(
            "      project {}, assignee {}, sprint {sprint}, requirement {requirement}",
            item.project_name, item.assignee_name
        );
    }
}

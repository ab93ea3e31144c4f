//! Issue, progress, forum, and resource subcommands.

use crate::auth::AuthArgs;
use crate::auth::CliSession;
use anyhow::bail;
use chrono::NaiveDate;
use clap::Parser;
use clap::Subcommand;
use projtrack_core::TrackerConfig;
use projtrack_core::model::HintType;
use projtrack_core::model::IssueType;
use projtrack_core::services::ProgressInput;
use projtrack_core::services::ResponseInput;

/// Issue kind as a command-line value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum IssueTypeArg {
    #[value(name = "doubt")]
    Doubt,
    #[value(name = "dependency")]
    Dependency,
    #[value(name = "question")]
    Question,
}

impl From<IssueTypeArg> for IssueType {
    fn from(arg: IssueTypeArg) -> Self {
        match arg {
            IssueTypeArg::Doubt => IssueType::Doubt,
            IssueTypeArg::Dependency => IssueType::Dependency,
            IssueTypeArg::Question => IssueType::Question,
        }
    }
}

/// Response hint kind as a command-line value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum HintTypeArg {
    #[value(name = "clarification")]
    Clarification,
    #[value(name = "manager-hint")]
    ManagerHint,
    #[value(name = "ai-suggestion")]
    AiSuggestion,
}

impl std::fmt::Display for HintTypeArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HintTypeArg::Clarification => write!(f, "clarification"),
            HintTypeArg::ManagerHint => write!(f, "manager-hint"),
            HintTypeArg::AiSuggestion => write!(f, "ai-suggestion"),
        }
    }
}

impl From<HintTypeArg> for HintType {
    fn from(arg: HintTypeArg) -> Self {
        match arg {
            HintTypeArg::Clarification => HintType::Clarification,
            HintTypeArg::ManagerHint => HintType::ManagerHint,
            HintTypeArg::AiSuggestion => HintType::AiSuggestion,
        }
    }
}

#[derive(Debug, Parser)]
pub struct IssueCli {
    #[command(subcommand)]
    command: IssueSubcommand,
}

#[derive(Debug, Subcommand)]
enum IssueSubcommand {
    /// Raise a blocker on one of your tasks.
    Raise(IssueRaiseArgs),
    /// List open issues in a project, or your own issue history.
    List(IssueListArgs),
    /// Respond to an open issue.
    Respond(IssueRespondArgs),
    /// Show the response thread for an issue.
    Responses(IssueResponsesArgs),
    /// Show every reference link shared on a task's issues.
    Links(IssueLinksArgs),
}

#[derive(Debug, Parser)]
struct IssueRaiseArgs {
    /// Task id.
    #[arg(long = "task")]
    task_id: i64,
    /// Kind of blocker.
    #[arg(long = "type", value_name = "TYPE")]
    issue_type: IssueTypeArg,
    /// What is blocking you.
    description: String,
    /// Also ask for a 1:1 meeting slot.
    #[arg(long = "meeting")]
    meeting: bool,
}

#[derive(Debug, Parser)]
struct IssueListArgs {
    /// Project id; omit to list your own issues.
    #[arg(long = "project")]
    project_id: Option<i64>,
    /// Only issues asking for a 1:1 slot.
    #[arg(long = "meetings-only")]
    meetings_only: bool,
}

#[derive(Debug, Parser)]
struct IssueRespondArgs {
    /// Issue id.
    #[arg(long = "issue")]
    issue_id: i64,
    /// Response text.
    text: String,
    /// Newline-delimited reference links.
    #[arg(long = "links", value_name = "URLS")]
    links: Option<String>,
    /// Kind of hint this response gives.
    #[arg(long = "type", value_name = "TYPE", default_value_t = HintTypeArg::Clarification)]
    hint_type: HintTypeArg,
    /// Also mark the issue resolved.
    #[arg(long = "resolve")]
    resolve: bool,
}

#[derive(Debug, Parser)]
struct IssueResponsesArgs {
    /// Issue id.
    #[arg(long = "issue")]
    issue_id: i64,
}

#[derive(Debug, Parser)]
struct IssueLinksArgs {
    /// Task id.
    #[arg(long = "task")]
    task_id: i64,
}

impl IssueCli {
    pub fn run(&self, auth: &AuthArgs, cfg: &TrackerConfig) -> anyhow::Result<()> {
        let mut cli = auth.login(cfg)?;
        match &self.command {
            IssueSubcommand::Raise(args) => cmd_issue_raise(&mut cli, args),
            IssueSubcommand::List(args) => cmd_issue_list(&cli, args),
            IssueSubcommand::Respond(args) => cmd_issue_respond(&mut cli, args),
            IssueSubcommand::Responses(args) => cmd_issue_responses(&cli, args),
            IssueSubcommand::Links(args) => cmd_issue_links(&cli, args),
        }
    }
}

fn cmd_issue_raise(cli: &mut CliSession, args: &IssueRaiseArgs) -> anyhow::Result<()> {
    let id = cli.tracker.raise_issue(
        &cli.session,
        args.task_id,
        args.issue_type.into(),
        &args.description,
        args.meeting,
    )?;
    println!("raised issue {id} on task {}", args.task_id);
    Ok(())
}

fn cmd_issue_list(cli: &CliSession, args: &IssueListArgs) -> anyhow::Result<()> {
    let Some(project_id) = args.project_id else {
        if args.meetings_only {
            bail!("--meetings-only needs --project");
        }
        let issues = cli.tracker.my_issues(&cli.session)?;
        if issues.is_empty() {
            println!("no issues");
            return Ok(());
        }
        for item in &issues {
            let issue = &item.issue;
            let meeting = if issue.request_1_on_1 {
                "  [1:1 requested]"
            } else {
                ""
            };
            println!(
                "{:>4}  [{}] {} ({}){meeting}",
                issue.id,
                issue.issue_type.as_str(),
                item.task_title,
                issue.status.as_str()
            );
            println!("      {}", issue.description);
        }
        return Ok(());
    };

    let issues = cli
        .tracker
        .open_issues(&cli.session, project_id, args.meetings_only)?;
    if issues.is_empty() {
        println!("no open issues");
        return Ok(());
    }
    for item in &issues {
        let issue = &item.issue;
        let meeting = if issue.request_1_on_1 {
            "  [1:1 requested]"
        } else {
            ""
        };
        println!(
            "{:>4}  [{}] {} on {}{meeting}",
            issue.id,
            issue.issue_type.as_str(),
            item.member_name,
            item.task_title
        );
        println!("      {}", issue.description);
    }
    Ok(())
}

fn cmd_issue_respond(cli: &mut CliSession, args: &IssueRespondArgs) -> anyhow::Result<()> {
    let id = cli.tracker.respond_to_issue(
        &cli.session,
        args.issue_id,
        ResponseInput {
            response_text: args.text.clone(),
            reference_links: args.links.clone(),
            hint_type: args.hint_type.into(),
            resolve: args.resolve,
        },
    )?;
    if args.resolve {
        println!("response {id} recorded, issue {} resolved", args.issue_id);
    } else {
        println!("response {id} recorded");
    }
    Ok(())
}

fn cmd_issue_responses(cli: &CliSession, args: &IssueResponsesArgs) -> anyhow::Result<()> {
    let responses = cli
        .tracker
        .responses_for_issue(&cli.session, args.issue_id)?;
    if responses.is_empty() {
        println!("no responses yet");
        return Ok(());
    }
    for resp in &responses {
        println!(
            "{:>4}  [{}] {}",
            resp.id,
            resp.hint_type.as_str(),
            resp.created_at.format("%Y-%m-%d %H:%M")
        );
        println!("      {}", resp.response_text);
        if let Some(links) = &resp.reference_links {
            for link in links.lines() {
                println!("      -> {link}");
            }
        }
    }
    Ok(())
}

fn cmd_issue_links(cli: &CliSession, args: &IssueLinksArgs) -> anyhow::Result<()> {
    let responses = cli
        .tracker
        .task_reference_links(&cli.session, args.task_id)?;
    let mut any = false;
    for resp in &responses {
        if let Some(links) = &resp.reference_links {
            for link in links.lines() {
                println!("{link}");
                any = true;
            }
        }
    }
    if !any {
        println!("no reference links yet");
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Progress
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Parser)]
pub struct ProgressCli {
    #[command(subcommand)]
    command: ProgressSubcommand,
}

#[derive(Debug, Subcommand)]
enum ProgressSubcommand {
    /// Record a progress update on one of your tasks.
    Submit(ProgressSubmitArgs),
    /// Log a dated activity line for one of your tasks.
    Log(ActivityLogArgs),
    /// Show your most recent progress updates.
    Mine(ProgressMineArgs),
    /// Show the activity log for a task.
    Activities(ActivityListArgs),
    /// Show a project's recent progress feed.
    Feed(FeedArgs),
}

#[derive(Debug, Parser)]
struct ProgressSubmitArgs {
    /// Task id.
    #[arg(long = "task")]
    task_id: i64,
    /// What you got done.
    description: String,
    /// Link to the code under review.
    #[arg(long = "code-link", value_name = "URL")]
    code_link: Option<String>,
    /// Where you are stuck, if anywhere.
    #[arg(long = "help-needed", value_name = "SUMMARY")]
    help_needed: Option<String>,
    /// Estimated completion date (YYYY-MM-DD).
    #[arg(long = "eta")]
    eta: Option<NaiveDate>,
}

#[derive(Debug, Parser)]
struct ActivityLogArgs {
    /// Task id.
    #[arg(long = "task")]
    task_id: i64,
    /// Day the work happened (YYYY-MM-DD).
    #[arg(long = "date")]
    date: NaiveDate,
    /// What happened that day.
    description: String,
}

#[derive(Debug, Parser)]
struct ProgressMineArgs {
    /// How many updates to show.
    #[arg(long = "limit", default_value_t = 10)]
    limit: u32,
}

#[derive(Debug, Parser)]
struct ActivityListArgs {
    /// Task id.
    #[arg(long = "task")]
    task_id: i64,
}

#[derive(Debug, Parser)]
struct FeedArgs {
    /// Project id.
    #[arg(long = "project")]
    project_id: i64,
    /// How many feed entries to show.
    #[arg(long = "limit", default_value_t = 20)]
    limit: u32,
}

impl ProgressCli {
    pub fn run(&self, auth: &AuthArgs, cfg: &TrackerConfig) -> anyhow::Result<()> {
        let mut cli = auth.login(cfg)?;
        match &self.command {
            ProgressSubcommand::Submit(args) => cmd_progress_submit(&mut cli, args),
            ProgressSubcommand::Log(args) => cmd_activity_log(&mut cli, args),
            ProgressSubcommand::Mine(args) => cmd_progress_mine(&cli, args),
            ProgressSubcommand::Activities(args) => cmd_activity_list(&cli, args),
            ProgressSubcommand::Feed(args) => cmd_feed(&cli, args),
        }
    }
}

fn cmd_progress_submit(cli: &mut CliSession, args: &ProgressSubmitArgs) -> anyhow::Result<()> {
    let id = cli.tracker.submit_progress_update(
        &cli.session,
        args.task_id,
        ProgressInput {
            description: args.description.clone(),
            code_link: args.code_link.clone(),
            help_needed_summary: args.help_needed.clone(),
            eta_to_complete: args.eta,
        },
    )?;
    println!("progress update {id} recorded");
    Ok(())
}

fn cmd_activity_log(cli: &mut CliSession, args: &ActivityLogArgs) -> anyhow::Result<()> {
    let id = cli
        .tracker
        .submit_weekly_activity(&cli.session, args.task_id, args.date, &args.description)?;
    println!("activity {id} logged for {}", args.date);
    Ok(())
}

fn cmd_progress_mine(cli: &CliSession, args: &ProgressMineArgs) -> anyhow::Result<()> {
    let updates = cli.tracker.my_recent_updates(&cli.session, args.limit)?;
    if updates.is_empty() {
        println!("no progress updates");
        return Ok(());
    }
    for update in &updates {
        println!(
            "{:>4}  task {}  {}",
            update.id,
            update.task_id,
            update.created_at.format("%Y-%m-%d %H:%M")
        );
        println!("      {}", update.description);
        if let Some(link) = &update.code_link {
            println!("      code: {link}");
        }
        if let Some(help) = &update.help_needed_summary {
            println!("      help needed: {help}");
        }
        if let Some(eta) = update.eta_to_complete {
            println!("      eta: {eta}");
        }
    }
    Ok(())
}

fn cmd_activity_list(cli: &CliSession, args: &ActivityListArgs) -> anyhow::Result<()> {
    let activities = cli.tracker.task_activities(&cli.session, args.task_id)?;
    if activities.is_empty() {
        println!("no activity logged");
        return Ok(());
    }
    for activity in &activities {
        println!("{}  {}", activity.activity_date, activity.description);
    }
    Ok(())
}

fn cmd_feed(cli: &CliSession, args: &FeedArgs) -> anyhow::Result<()> {
    let feed = cli
        .tracker
        .activity_feed(&cli.session, args.project_id, args.limit)?;
    if feed.is_empty() {
        println!("no progress yet");
        return Ok(());
    }
    for item in &feed {
        println!(
            "{}  {} on {}",
            item.created_at.format("%Y-%m-%d %H:%M"),
            item.member_name,
            item.task_title
        );
        println!("      {}", item.description);
        if let Some(link) = &item.code_link {
            println!("      code: {link}");
        }
        if let Some(help) = &item.help_needed_summary {
            println!("      help needed: {help}");
        }
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Doubts forum
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Parser)]
pub struct ForumCli {
    #[command(subcommand)]
    command: ForumSubcommand,
}

#[derive(Debug, Subcommand)]
enum ForumSubcommand {
    /// Post a question to the project forum.
    Post(ForumPostArgs),
    /// List a project's forum posts.
    List(ForumListArgs),
    /// Mark a forum post answered.
    Answer(ForumAnswerArgs),
}

#[derive(Debug, Parser)]
struct ForumPostArgs {
    /// Project id.
    #[arg(long = "project")]
    project_id: i64,
    /// Your question.
    question: String,
}

#[derive(Debug, Parser)]
struct ForumListArgs {
    /// Project id.
    #[arg(long = "project")]
    project_id: i64,
}

#[derive(Debug, Parser)]
struct ForumAnswerArgs {
    /// Forum post id.
    #[arg(long = "post")]
    post_id: i64,
}

impl ForumCli {
    pub fn run(&self, auth: &AuthArgs, cfg: &TrackerConfig) -> anyhow::Result<()> {
        let mut cli = auth.login(cfg)?;
        match &self.command {
            ForumSubcommand::Post(args) => {
                let post = cli
                    .tracker
                    .post_forum_question(&cli.session, args.project_id, &args.question)?;
                println!("posted question {}", post.id);
                Ok(())
            }
            ForumSubcommand::List(args) => cmd_forum_list(&cli, args),
            ForumSubcommand::Answer(args) => {
                let post = cli.tracker.mark_forum_post_answered(&cli.session, args.post_id)?;
                println!("question {} marked answered", post.id);
                Ok(())
            }
        }
    }
}

fn cmd_forum_list(cli: &CliSession, args: &ForumListArgs) -> anyhow::Result<()> {
    let posts = cli.tracker.list_forum_posts(&cli.session, args.project_id)?;
    if posts.is_empty() {
        println!("no forum posts");
        return Ok(());
    }
    for view in &posts {
        let post = &view.post;
        println!(
            "{:>4}  [{}] {}  {}",
            post.id,
            post.status.as_str(),
            view.member_name,
            post.created_at.format("%Y-%m-%d")
        );
        println!("      {}", post.question);
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Resources
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Parser)]
pub struct ResourceCli {
    #[command(subcommand)]
    command: ResourceSubcommand,
}

#[derive(Debug, Subcommand)]
enum ResourceSubcommand {
    /// Share a reference link with the project.
    Add(ResourceAddArgs),
    /// List a project's shared resources.
    List(ResourceListArgs),
    /// Remove a shared resource.
    Delete(ResourceDeleteArgs),
}

#[derive(Debug, Parser)]
struct ResourceAddArgs {
    /// Project id.
    #[arg(long = "project")]
    project_id: i64,
    /// Resource title.
    title: String,
    /// Resource URL.
    link: String,
    /// What the resource covers.
    #[arg(long = "description")]
    description: Option<String>,
}

#[derive(Debug, Parser)]
struct ResourceListArgs {
    /// Project id.
    #[arg(long = "project")]
    project_id: i64,
}

#[derive(Debug, Parser)]
struct ResourceDeleteArgs {
    /// Resource id.
    #[arg(long = "id")]
    resource_id: i64,
}

impl ResourceCli {
    pub fn run(&self, auth: &AuthArgs, cfg: &TrackerConfig) -> anyhow::Result<()> {
        let mut cli = auth.login(cfg)?;
        match &self.command {
            ResourceSubcommand::Add(args) => {
                let resource = cli.tracker.add_resource(
                    &cli.session,
                    args.project_id,
                    &args.title,
                    &args.link,
                    args.description.as_deref(),
                )?;
                println!("added resource {}: {}", resource.id, resource.title);
                Ok(())
            }
            ResourceSubcommand::List(args) => cmd_resource_list(&cli, args),
            ResourceSubcommand::Delete(args) => {
                cli.tracker.delete_resource(&cli.session, args.resource_id)?;
                println!("resource {} deleted", args.resource_id);
                Ok(())
            }
        }
    }
}

fn cmd_resource_list(cli: &CliSession, args: &ResourceListArgs) -> anyhow::Result<()> {
    let resources = cli.tracker.list_resources(&cli.session, args.project_id)?;
    if resources.is_empty() {
        println!("no resources");
        return Ok(());
    }
    for resource in &resources {
        println!("{:>4}  {}  {}", resource.id, resource.title, resource.link);
        if let Some(desc) = &resource.description {
            println!("      {desc}");
        }
    }
    Ok(())
}

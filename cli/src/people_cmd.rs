//! Account and roster subcommands.

use crate::auth::AuthArgs;
use crate::auth::CliSession;
use clap::Parser;
use clap::Subcommand;
use projtrack_core::TrackerConfig;

#[derive(Debug, Parser)]
pub struct ManagerCli {
    #[command(subcommand)]
    command: ManagerSubcommand,
}

#[derive(Debug, Subcommand)]
enum ManagerSubcommand {
    /// Create a project-manager account (super-admin only).
    Create(ManagerCreateArgs),
}

#[derive(Debug, Parser)]
struct ManagerCreateArgs {
    /// Login username (unique).
    username: String,
    /// Initial password for the new account.
    #[arg(long = "password")]
    password: String,
}

impl ManagerCli {
    pub fn run(&self, auth: &AuthArgs, cfg: &TrackerConfig) -> anyhow::Result<()> {
        let mut cli = auth.login(cfg)?;
        match &self.command {
            ManagerSubcommand::Create(args) => {
                let id = cli
                    .tracker
                    .create_project_manager(&cli.session, &args.username, &args.password)?;
                println!("created manager {id}: {}", args.username);
                Ok(())
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Team members
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Parser)]
pub struct MemberCli {
    #[command(subcommand)]
    command: MemberSubcommand,
}

#[derive(Debug, Subcommand)]
enum MemberSubcommand {
    /// Create a team-member account.
    Create(MemberCreateArgs),
    /// Put a member on a project roster.
    Assign(RosterArgs),
    /// Take a member off a project roster.
    Unassign(RosterArgs),
    /// List members (all of them, or one project's roster).
    List(MemberListArgs),
}

#[derive(Debug, Parser)]
struct MemberCreateArgs {
    /// Display name.
    name: String,
    /// Login email (unique).
    email: String,
    /// Initial password for the new account.
    #[arg(long = "password")]
    password: String,
}

#[derive(Debug, Parser)]
struct RosterArgs {
    /// Project id.
    #[arg(long = "project")]
    project_id: i64,
    /// Member id.
    #[arg(long = "member")]
    member_id: i64,
}

#[derive(Debug, Parser)]
struct MemberListArgs {
    /// Restrict to this project's roster.
    #[arg(long = "project")]
    project_id: Option<i64>,
}

impl MemberCli {
    pub fn run(&self, auth: &AuthArgs, cfg: &TrackerConfig) -> anyhow::Result<()> {
        let mut cli = auth.login(cfg)?;
        match &self.command {
            MemberSubcommand::Create(args) => cmd_member_create(&mut cli, args),
            MemberSubcommand::Assign(args) => cmd_assign(&mut cli, args),
            MemberSubcommand::Unassign(args) => cmd_unassign(&mut cli, args),
            MemberSubcommand::List(args) => cmd_member_list(&cli, args),
        }
    }
}

fn cmd_member_create(cli: &mut CliSession, args: &MemberCreateArgs) -> anyhow::Result<()> {
    let id = cli
        .tracker
        .create_team_member(&cli.session, &args.name, &args.email, &args.password)?;
    println!("created member {id}: {} <{}>", args.name, args.email);
    Ok(())
}

fn cmd_assign(cli: &mut CliSession, args: &RosterArgs) -> anyhow::Result<()> {
    cli.tracker
        .add_member_to_project(&cli.session, args.project_id, args.member_id)?;
    println!(
        "member {} assigned to project {}",
        args.member_id, args.project_id
    );
    Ok(())
}

fn cmd_unassign(cli: &mut CliSession, args: &RosterArgs) -> anyhow::Result<()> {
    cli.tracker
        .remove_member_from_project(&cli.session, args.project_id, args.member_id)?;
    println!(
        "member {} removed from project {}",
        args.member_id, args.project_id
    );
    Ok(())
}

fn cmd_member_list(cli: &CliSession, args: &MemberListArgs) -> anyhow::Result<()> {
    let members = match args.project_id {
        Some(project_id) => cli.tracker.list_project_members(&cli.session, project_id)?,
        None => cli.tracker.list_team_members(&cli.session)?,
    };
    if members.is_empty() {
        println!("no members");
        return Ok(());
    }
    for member in &members {
        println!("{:>4}  {}  <{}>", member.id, member.name, member.email);
    }
    Ok(())
}

//! Identity flags shared by every subcommand
//!
//! Each invocation authenticates from scratch: `--as-user` for the
//! manager/admin table, `--as-email` for team members. The password and
//! assistant API key fall back to `PROJTRACK_PASSWORD` and
//! `PROJTRACK_API_KEY` so neither has to appear on the command line. The
//! key lives only in this process; nothing writes it to disk.

use anyhow::bail;
use clap::Parser;
use projtrack_core::LoginKind;
use projtrack_core::SessionContext;
use projtrack_core::Tracker;
use projtrack_core::TrackerConfig;

pub const ENV_PASSWORD: &str = "PROJTRACK_PASSWORD";
pub const ENV_API_KEY: &str = "PROJTRACK_API_KEY";

#[derive(Debug, Parser)]
pub struct AuthArgs {
    /// Act as a manager or super-admin with this username.
    #[arg(long = "as-user", global = true, value_name = "USERNAME")]
    pub user: Option<String>,

    /// Act as a team member with this email.
    #[arg(long = "as-email", global = true, value_name = "EMAIL")]
    pub email: Option<String>,

    /// Password for the identity; falls back to PROJTRACK_PASSWORD.
    #[arg(long = "auth-password", global = true, value_name = "PASSWORD")]
    pub password: Option<String>,

    /// Assistant API key; falls back to PROJTRACK_API_KEY.
    #[arg(long = "api-key", global = true, value_name = "KEY")]
    pub api_key: Option<String>,
}

/// An authenticated tracker handle for one invocation.
pub struct CliSession {
    pub tracker: Tracker,
    pub session: SessionContext,
}

impl AuthArgs {
    /// Open the tracker and log in from the flags.
    pub fn login(&self, cfg: &TrackerConfig) -> anyhow::Result<CliSession> {
        let (identifier, kind) = match (&self.user, &self.email) {
            (Some(_), Some(_)) => bail!("--as-user and --as-email are mutually exclusive"),
            (Some(user), None) => (user.as_str(), LoginKind::ManagerOrAdmin),
            (None, Some(email)) => (email.as_str(), LoginKind::TeamMember),
            (None, None) => bail!("no identity: pass --as-user <username> or --as-email <email>"),
        };

        let password = match &self.password {
            Some(password) => password.clone(),
            None => match std::env::var(ENV_PASSWORD) {
                Ok(password) => password,
                Err(_) => bail!("no password: pass --auth-password or set {ENV_PASSWORD}"),
            },
        };

        let tracker = Tracker::init(cfg)?;
        let mut session = SessionContext::new();
        let principal = tracker.login(&mut session, identifier, &password, kind)?;
        tracing::debug!(
            role = principal.role.as_str(),
            id = principal.id,
            "authenticated"
        );

        let api_key = self
            .api_key
            .clone()
            .or_else(|| std::env::var(ENV_API_KEY).ok());
        session.set_assistant_api_key(api_key);

        Ok(CliSession { tracker, session })
    }
}

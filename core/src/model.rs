//! Typed rows and enums for the tracker data model
//!
//! Every entity the store holds has an explicit struct here; dynamic
//! row access never leaks past the data-access boundary. Enum columns
//! are stored as their display strings and parsed back on read.

use chrono::{DateTime, NaiveDate, Utc};

/// Resolved role of an authenticated principal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    SuperAdmin,
    ProjectManager,
    TeamMember,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SuperAdmin => "super_admin",
            Self::ProjectManager => "project_manager",
            Self::TeamMember => "team_member",
        }
    }

    /// Parse from string representation
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "super_admin" => Some(Self::SuperAdmin),
            "project_manager" => Some(Self::ProjectManager),
            "team_member" => Some(Self::TeamMember),
            _ => None,
        }
    }
}

/// Task lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    ToDo,
    InProgress,
    Done,
    Blocked,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ToDo => "To Do",
            Self::InProgress => "In Progress",
            Self::Done => "Done",
            Self::Blocked => "Blocked",
        }
    }

    /// Parse from string representation
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "To Do" => Some(Self::ToDo),
            "In Progress" => Some(Self::InProgress),
            "Done" => Some(Self::Done),
            "Blocked" => Some(Self::Blocked),
            _ => None,
        }
    }

    /// All statuses, in board order
    pub fn all() -> [Self; 4] {
        [Self::ToDo, Self::InProgress, Self::Done, Self::Blocked]
    }
}

/// Kind of help a raised issue is asking for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueType {
    Doubt,
    Dependency,
    Question,
}

impl IssueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Doubt => "Doubt",
            Self::Dependency => "Dependency",
            Self::Question => "Question",
        }
    }

    /// Parse from string representation
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Doubt" => Some(Self::Doubt),
            "Dependency" => Some(Self::Dependency),
            "Question" => Some(Self::Question),
            _ => None,
        }
    }
}

/// Issue lifecycle. The only transition is Open to Resolved; there is
/// no reopen, a new issue is raised instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueStatus {
    Open,
    Resolved,
}

impl IssueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::Resolved => "Resolved",
        }
    }

    /// Parse from string representation
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Open" => Some(Self::Open),
            "Resolved" => Some(Self::Resolved),
            _ => None,
        }
    }
}

/// How a response is meant to help
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HintType {
    Clarification,
    ManagerHint,
    AiSuggestion,
}

impl HintType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Clarification => "Clarification",
            Self::ManagerHint => "Manager Hint",
            Self::AiSuggestion => "AI Suggestion",
        }
    }

    /// Parse from string representation
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Clarification" => Some(Self::Clarification),
            "Manager Hint" => Some(Self::ManagerHint),
            "AI Suggestion" => Some(Self::AiSuggestion),
            _ => None,
        }
    }
}

/// Forum post lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForumStatus {
    Open,
    Answered,
}

impl ForumStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::Answered => "Answered",
        }
    }

    /// Parse from string representation
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Open" => Some(Self::Open),
            "Answered" => Some(Self::Answered),
            _ => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Entity rows
// ─────────────────────────────────────────────────────────────────────────────

/// A row from super_admins
#[derive(Debug, Clone)]
pub struct SuperAdmin {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
}

/// A row from project_managers
#[derive(Debug, Clone)]
pub struct ProjectManager {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
}

/// A row from team_members
#[derive(Debug, Clone)]
pub struct TeamMember {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// A row from projects
#[derive(Debug, Clone)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub problem_statement: Option<String>,
    /// Owning manager. None means the project is unclaimed and stays
    /// under super-admin management.
    pub manager_id: Option<i64>,
}

/// A row from project_members (membership join table)
#[derive(Debug, Clone)]
pub struct ProjectMember {
    pub id: i64,
    pub project_id: i64,
    pub member_id: i64,
}

/// A row from requirements
#[derive(Debug, Clone)]
pub struct Requirement {
    pub id: i64,
    pub project_id: i64,
    pub title: String,
    pub description: String,
    /// Assistant-refined text. Populated only by an explicit save of a
    /// reviewed draft, never directly from a stream.
    pub refined_description: Option<String>,
}

/// A row from sprints
#[derive(Debug, Clone)]
pub struct Sprint {
    pub id: i64,
    pub project_id: i64,
    pub name: String,
    pub goal: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// A row from sprint_requirements (sprint/requirement join table)
#[derive(Debug, Clone)]
pub struct SprintRequirement {
    pub id: i64,
    pub sprint_id: i64,
    pub requirement_id: i64,
}

/// A row from tasks
#[derive(Debug, Clone)]
pub struct Task {
    pub id: i64,
    pub project_id: i64,
    pub sprint_id: Option<i64>,
    pub requirement_id: Option<i64>,
    pub title: String,
    pub description: String,
    pub assigned_to_id: i64,
    pub status: TaskStatus,
    pub due_date: NaiveDate,
    /// Set if and only if status is Done.
    pub completion_date: Option<NaiveDate>,
}

/// A row from weekly_activities (append-only log)
#[derive(Debug, Clone)]
pub struct WeeklyActivity {
    pub id: i64,
    pub task_id: i64,
    pub member_id: i64,
    pub activity_date: NaiveDate,
    pub description: String,
}

/// A row from progress_updates (append-only log)
#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    pub id: i64,
    pub task_id: i64,
    pub member_id: i64,
    pub description: String,
    pub code_link: Option<String>,
    pub help_needed_summary: Option<String>,
    pub eta_to_complete: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

/// A row from task_issues
#[derive(Debug, Clone)]
pub struct TaskIssue {
    pub id: i64,
    pub task_id: i64,
    pub member_id: i64,
    pub issue_type: IssueType,
    pub description: String,
    /// 1:1 meeting request flag, orthogonal to status
    pub request_1_on_1: bool,
    pub status: IssueStatus,
    pub created_at: DateTime<Utc>,
}

/// A row from issue_responses
#[derive(Debug, Clone)]
pub struct IssueResponse {
    pub id: i64,
    pub issue_id: i64,
    /// Id of the responding manager or super-admin
    pub responder_id: i64,
    pub response_text: String,
    /// Newline-delimited URL list
    pub reference_links: Option<String>,
    pub hint_type: HintType,
    pub created_at: DateTime<Utc>,
}

/// A row from doubts_forum_posts (project-wide Q&A, not task-scoped)
#[derive(Debug, Clone)]
pub struct DoubtsForumPost {
    pub id: i64,
    pub project_id: i64,
    pub member_id: i64,
    pub question: String,
    pub status: ForumStatus,
    pub created_at: DateTime<Utc>,
}

/// A row from resources (shared reference material)
#[derive(Debug, Clone)]
pub struct Resource {
    pub id: i64,
    pub project_id: i64,
    pub title: String,
    pub link: String,
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_strings_round_trip() {
        for status in TaskStatus::all() {
            assert_eq!(TaskStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(TaskStatus::parse("done"), None);
    }

    #[test]
    fn hint_type_uses_display_strings() {
        assert_eq!(HintType::ManagerHint.as_str(), "Manager Hint");
        assert_eq!(HintType::parse("AI Suggestion"), Some(HintType::AiSuggestion));
        assert_eq!(HintType::parse("ai_suggestion"), None);
    }

    #[test]
    fn role_parse_rejects_unknown() {
        assert_eq!(Role::parse("project_manager"), Some(Role::ProjectManager));
        assert_eq!(Role::parse("manager"), None);
    }
}

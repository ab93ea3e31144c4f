//! Prompt catalog for the assistant features
//!
//! System prompts and human templates live here so every frontend sends
//! the same instructions. Placeholders use the `{name}` form consumed by
//! [`crate::prompt::render`].

/// System prompt for the task mentor.
pub const MENTOR_SYSTEM_PROMPT: &str = "You are an expert project mentor AI. Your goal is to \
help a student developer succeed with their assigned task. You must be encouraging and helpful. \
Do not just give the final answer or write large blocks of code. Instead, guide them by breaking \
down the problem, suggesting technologies, and explaining concepts. Ground your answers in the \
provided project and task context.";

/// Human template for the task mentor.
///
/// Placeholders: `project_context`, `task_context`, `user_question`.
pub const MENTOR_HUMAN_TEMPLATE: &str = "Here is the overall project context:\n\
{project_context}\n\n\
Here is my specific task context:\n\
{task_context}\n\n\
My question is: {user_question}";

/// System prompt for requirement refinement.
pub const REFINE_SYSTEM_PROMPT: &str = "You are an expert product manager. Your task is to \
rewrite a high-level requirement into a clear, specific, and actionable description for a \
student development team. Use markdown for formatting.";

/// Human template for requirement refinement.
///
/// Placeholders: `problem_statement`, `req_title`, `req_desc`.
pub const REFINE_HUMAN_TEMPLATE: &str = "Project Problem Statement: {problem_statement}\n\
Initial Requirement Title: {req_title}\n\
Initial Requirement Description: {req_desc}\n\n\
Please refine the description.";

/// System prompt for breaking a refined requirement into tasks.
pub const TASKGEN_SYSTEM_PROMPT: &str = "You are an expert senior software engineer. Based on \
the refined requirement, break it down into a list of specific, actionable development tasks. \
For each task, provide a title and a one-sentence description. Format the output as \
'Task Title :: Task Description', with each task on a new line.";

/// Human template for task generation.
///
/// Placeholder: `refined_desc`.
pub const TASKGEN_HUMAN_TEMPLATE: &str = "Refined Requirement:\n\
{refined_desc}\n\n\
Please generate the task list.";

/// Canned mentor questions offered next to the free-form ask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MentorPreset {
    SuggestApproach,
    StepBreakdown,
    CodePrompts,
}

impl MentorPreset {
    pub const ALL: [MentorPreset; 3] = [
        MentorPreset::SuggestApproach,
        MentorPreset::StepBreakdown,
        MentorPreset::CodePrompts,
    ];

    /// Short label for menus.
    pub fn label(self) -> &'static str {
        match self {
            Self::SuggestApproach => "Suggest an approach",
            Self::StepBreakdown => "Break the task down",
            Self::CodePrompts => "Draft code-generation prompts",
        }
    }

    /// The question sent to the mentor on the student's behalf.
    pub fn question(self) -> &'static str {
        match self {
            Self::SuggestApproach => {
                "Based on the task description, suggest a high-level approach or a couple of \
                 strategies to get started."
            }
            Self::StepBreakdown => {
                "Break this task down into a detailed, step-by-step plan that I can follow."
            }
            Self::CodePrompts => {
                "Give me 2-3 specific, advanced prompts that I could use with a code generation \
                 AI (like ChatGPT or Claude) to get useful code snippets for this task. Do not \
                 write the code yourself, just the prompts."
            }
        }
    }
}

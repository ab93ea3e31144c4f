//! Parses generated task lists out of completion text
//!
//! The task-generation prompt asks for one task per line in the form
//! `Task Title :: Task Description`. Models decorate anyway, so the
//! parser strips bullet and numbering markers and ignores lines that do
//! not carry the separator. Parsed drafts are suggestions only; nothing
//! here touches the tracker.

/// One suggested task parsed from assistant output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
}

/// Parse every well-formed `Title :: Description` line from `output`.
///
/// Malformed lines are dropped rather than failing the whole batch, so
/// a chatty preamble or trailing remark costs nothing.
pub fn parse_task_lines(output: &str) -> Vec<TaskDraft> {
    output.lines().filter_map(parse_line).collect()
}

fn parse_line(line: &str) -> Option<TaskDraft> {
    let line = strip_list_marker(line.trim());
    let (title, description) = line.split_once(" :: ")?;
    let title = title.trim();
    if title.is_empty() {
        return None;
    }
    Some(TaskDraft {
        title: title.to_string(),
        description: description.trim().to_string(),
    })
}

/// Remove a leading `-`, `*`, or `1.` / `1)` style marker.
fn strip_list_marker(line: &str) -> &str {
    let line = line.trim_start_matches(['-', '*']).trim_start();
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        let rest = &line[digits..];
        if let Some(rest) = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) {
            return rest.trim_start();
        }
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn draft(title: &str, description: &str) -> TaskDraft {
        TaskDraft {
            title: title.to_string(),
            description: description.to_string(),
        }
    }

    #[test]
    fn parses_plain_lines() {
        let drafts = parse_task_lines(
            "Build login form :: Create the sign-in page.\n\
             Add session check :: Redirect logged-out users.",
        );
        assert_eq!(
            drafts,
            vec![
                draft("Build login form", "Create the sign-in page."),
                draft("Add session check", "Redirect logged-out users."),
            ]
        );
    }

    #[test]
    fn strips_bullets_and_numbering() {
        let drafts = parse_task_lines(
            "- Set up schema :: Define the tables.\n\
             * Seed data :: Insert fixtures.\n\
             1. Write queries :: Fetch rows.\n\
             2) Add indexes :: Speed up lookups.",
        );
        let titles: Vec<&str> = drafts.iter().map(|d| d.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["Set up schema", "Seed data", "Write queries", "Add indexes"]
        );
    }

    #[test]
    fn ignores_lines_without_the_separator() {
        let drafts = parse_task_lines(
            "Here are the tasks:\n\
             \n\
             Design the API :: Sketch the endpoints.\n\
             Let me know if you need more detail!",
        );
        assert_eq!(drafts, vec![draft("Design the API", "Sketch the endpoints.")]);
    }

    #[test]
    fn ignores_a_separator_with_no_title() {
        assert!(parse_task_lines(" :: orphan description").is_empty());
    }

    #[test]
    fn double_colons_inside_words_do_not_split() {
        let drafts = parse_task_lines("Use Vec::new for the pool");
        assert!(drafts.is_empty());
    }
}

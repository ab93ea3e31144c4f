//! Builds the context strings interpolated into mentor prompts

use projtrack_core::model::Project;
use projtrack_core::model::Requirement;
use projtrack_core::model::Task;

/// Project summary handed to the mentor: name, description, and the
/// requirement list so answers stay grounded in what the team is building.
pub fn project_context(project: &Project, requirements: &[Requirement]) -> String {
    let mut out = format!(
        "Project Name: {}\nProject Description: {}\n\nProject Requirements:\n",
        project.name, project.description
    );
    for req in requirements {
        out.push_str(&format!("- {}: {}\n", req.title, req.description));
    }
    out
}

/// The student's current task, title and description.
pub fn task_context(task: &Task) -> String {
    format!(
        "Current Task Title: {}\nCurrent Task Description: {}",
        task.title, task.description
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use projtrack_core::model::TaskStatus;

    #[test]
    fn project_context_lists_each_requirement() {
        let project = Project {
            id: 1,
            name: "Apollo".to_string(),
            description: "Mission tracker".to_string(),
            problem_statement: None,
            manager_id: Some(7),
        };
        let requirements = vec![
            Requirement {
                id: 10,
                project_id: 1,
                title: "Login".to_string(),
                description: "Users sign in".to_string(),
                refined_description: None,
            },
            Requirement {
                id: 11,
                project_id: 1,
                title: "Telemetry".to_string(),
                description: "Stream vehicle data".to_string(),
                refined_description: None,
            },
        ];

        let out = project_context(&project, &requirements);
        assert_eq!(
            out,
            "Project Name: Apollo\nProject Description: Mission tracker\n\n\
             Project Requirements:\n- Login: Users sign in\n- Telemetry: Stream vehicle data\n"
        );
    }

    #[test]
    fn task_context_carries_title_and_description() {
        let task = Task {
            id: 3,
            project_id: 1,
            sprint_id: None,
            requirement_id: None,
            title: "Wire the gauge".to_string(),
            description: "Show live fuel level".to_string(),
            assigned_to_id: 5,
            status: TaskStatus::ToDo,
            due_date: NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
            completion_date: None,
        };

        assert_eq!(
            task_context(&task),
            "Current Task Title: Wire the gauge\nCurrent Task Description: Show live fuel level"
        );
    }
}

//! Prompt text for backends that talk to a bare language model.
//!
//! The `service` backend never sees these; the remote service owns its prompts.

use std::fmt::Write as _;

use stash_core::classification::{
    ChatRequest, GroupingRequest, KNOWN_CONTEXTS, KnownProject, SubtaskRequest,
};
use stash_core::enums::TimeEstimate;

fn quoted_list(items: impl IntoIterator<Item = impl AsRef<str>>) -> String {
    items
        .into_iter()
        .map(|item| format!("\"{}\"", item.as_ref()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `- id: name` lines for the known projects, or a line saying there are none.
pub fn project_context(projects: &[KnownProject]) -> String {
    if projects.is_empty() {
        return "NO EXISTING PROJECTS.".to_string();
    }
    let mut out = String::from("EXISTING PROJECTS (ID: Name):\n");
    for project in projects {
        let _ = writeln!(out, "- {}: {}", project.id, project.name);
    }
    out
}

/// Prompt that turns one raw thought into a classification.
pub fn classification_prompt(text: &str, projects: &[KnownProject]) -> String {
    let times = quoted_list(TimeEstimate::ALL.iter().map(|t| t.as_str()));
    let contexts = quoted_list(KNOWN_CONTEXTS);
    format!(
        r#"You process raw thoughts for a GTD inbox. Turn the thought into one actionable task and file it under a project.

{context}

RULES:
1. REWRITE the thought as a task title close to the user's own words. Add a leading verb if one is missing. Keep every specific detail. Only clarify when the input is too vague to act on ("Buy milk" stays "Buy milk").
2. LIST: "next" for as soon as possible, "waiting" when someone else has to act first, "someday" for maybe later.
3. TAGS: exactly one time tag and any fitting context tags.
4. PROJECT: match an existing project from the list above when it fits (isNew false, give its id). Otherwise propose a new project name and a concrete outcome (isNew true, id null). Set confidence 0-100 for the project choice only, not for the rewrite.

ALLOWED TAGS:
- Time: {times}
- Contexts: {contexts}

Respond with JSON only:
{{
  "rewrittenTitle": "string",
  "list": "next" | "waiting" | "someday",
  "tags": {{ "time": {times_alt}, "contexts": ["string"] }},
  "projectMatch": {{
    "id": "existing id" | null,
    "name": "existing or new name",
    "isNew": boolean,
    "outcome": "string when isNew, else null",
    "confidence": number
  }}
}}

Input: {text}"#,
        context = project_context(projects),
        times_alt = times.replace(", ", " | "),
    )
}

/// Prompt that breaks a task into a few concrete steps.
pub fn subtask_prompt(request: &SubtaskRequest) -> String {
    format!(
        r#"You break GTD tasks into smaller steps.

Task title: "{title}"
Context: "{context}"

RULES:
1. Return 3 to 6 subtasks in the order they would be done.
2. Each subtask starts with a verb and stands on its own.
3. Keep them short and direct.

Respond with JSON only:
{{ "subtasks": ["string", "string", "string"] }}"#,
        title = request.title,
        context = request.context.as_deref().unwrap_or("None"),
    )
}

/// Prompt that sorts a project's uncategorized tasks into categories.
pub fn grouping_prompt(request: &GroupingRequest) -> String {
    let existing = if request.existing_groups.is_empty() {
        "EXISTING CATEGORIES: none, create new ones".to_string()
    } else {
        format!("EXISTING CATEGORIES: {}", request.existing_groups.join(", "))
    };
    let mut tasks = String::new();
    for task in &request.tasks {
        let _ = writeln!(tasks, "- ID: {}, Title: \"{}\"", task.id, task.title);
    }
    let project_name = if request.project_name.trim().is_empty() {
        "Unnamed Project"
    } else {
        request.project_name.as_str()
    };

    format!(
        r#"You organize a project's uncategorized tasks into categories.

Project: "{project_name}"
Tasks to organize: {count}

{existing}

TASKS:
{tasks}
RULES:
1. Prefer an existing category, spelled exactly as listed, when a task fits it.
2. Otherwise create a short descriptive category name.
3. Place every listed task in exactly one group. Use only the ids listed above.

Respond with JSON only:
{{ "groups": [ {{ "categoryName": "string", "taskIds": ["id"] }} ] }}"#,
        count = request.tasks.len(),
    )
}

/// Prompt that answers a question from the user's tasks and projects.
pub fn chat_prompt(request: &ChatRequest) -> String {
    format!(
        r#"You are the assistant of a GTD task manager. The user's tasks and projects are below.

CONTEXT:
{context}

USER REQUEST: "{message}"

RULES:
1. Answer only from the context above.
2. When asked to show or find tasks, list them clearly.
3. When asked to tidy up, point out tasks that look stale or low priority.
4. You cannot change or delete anything. Say so, and help identify the tasks instead.
5. Be brief and friendly."#,
        context = request.context,
        message = request.message,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use stash_core::classification::GroupingTask;

    #[test]
    fn project_context_lists_ids_and_names() {
        let projects = vec![
            KnownProject {
                id: "prj-1".into(),
                name: "Errands".into(),
            },
            KnownProject {
                id: "prj-2".into(),
                name: "Garden".into(),
            },
        ];
        let context = project_context(&projects);
        assert!(context.contains("- prj-1: Errands\n"));
        assert!(context.contains("- prj-2: Garden\n"));
        assert_eq!(project_context(&[]), "NO EXISTING PROJECTS.");
    }

    #[test]
    fn classification_prompt_lists_allowed_tags() {
        let prompt = classification_prompt("buy milk", &[]);
        assert!(prompt.contains(r#""5 min", "15 min", "30 min", "60 min+""#));
        assert!(prompt.contains("\"@errands\""));
        assert!(prompt.ends_with("Input: buy milk"));
        assert!(prompt.contains("NO EXISTING PROJECTS."));
    }

    #[test]
    fn chat_prompt_embeds_context_and_question() {
        let prompt = chat_prompt(&ChatRequest {
            message: "What can I do at home?".into(),
            context: r#"{"tasks":[],"projects":[]}"#.into(),
        });
        assert!(prompt.contains("USER REQUEST: \"What can I do at home?\""));
        assert!(prompt.contains(r#"{"tasks":[],"projects":[]}"#));
    }

    #[test]
    fn subtask_prompt_defaults_context() {
        let prompt = subtask_prompt(&SubtaskRequest {
            title: "Plan trip".into(),
            context: None,
        });
        assert!(prompt.contains("Task title: \"Plan trip\""));
        assert!(prompt.contains("Context: \"None\""));
    }

    #[test]
    fn grouping_prompt_lists_tasks_and_groups() {
        let prompt = grouping_prompt(&GroupingRequest {
            project_name: "House".into(),
            tasks: vec![GroupingTask {
                id: "tsk-1".into(),
                title: "Paint fence".into(),
            }],
            existing_groups: vec!["Outside".into()],
        });
        assert!(prompt.contains("- ID: tsk-1, Title: \"Paint fence\""));
        assert!(prompt.contains("EXISTING CATEGORIES: Outside"));
        assert!(prompt.contains("Tasks to organize: 1"));
    }
}

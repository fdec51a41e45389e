//! Assist flows next to filing: subtask decomposition, task grouping and the
//! assistant chat.
//!
//! None is confidence-gated. A successful answer is applied as given; any
//! failure leaves every task untouched. Chat only reads.

use stash_classify::Classifier;
use stash_core::classification::{
    AssistantContext, ChatRequest, ContextProject, ContextTask, GroupingRequest, GroupingTask,
    SubtaskRequest,
};
use stash_core::enums::TaskStatus;
use stash_core::errors::CoreError;
use stash_core::responses::{AskResponse, DecomposeResponse, GroupResponse};
use stash_db::repos::task::TaskFilter;
use stash_db::service::StashService;

use crate::error::PipelineError;

/// Ask for subtasks and append them after the task's existing ones.
///
/// # Errors
///
/// Returns `PipelineError::Database` if the task does not exist, or
/// `PipelineError::Classify` if the classifier fails.
pub async fn decompose(
    store: &StashService,
    classifier: &dyn Classifier,
    task_id: &str,
) -> Result<DecomposeResponse, PipelineError> {
    let task = store.get_task(task_id).await?;
    let request = SubtaskRequest {
        title: task.title.clone(),
        context: task.original_thought.clone(),
    };

    let response = classifier.decompose(&request).await?;
    let (task, added) = store.append_subtasks(task_id, &response.subtasks).await?;
    tracing::info!(task_id, added = added.len(), "task decomposed");
    Ok(DecomposeResponse { task, added })
}

/// Sort a project's uncategorized open tasks into categories.
///
/// Existing categories in the project are offered first so the classifier
/// reuses them. With nothing to group, nothing is sent.
///
/// # Errors
///
/// Returns `PipelineError::Database` if the project does not exist, or
/// `PipelineError::Classify` if the classifier fails or returns an incomplete grouping.
pub async fn group(
    store: &StashService,
    classifier: &dyn Classifier,
    project_id: &str,
) -> Result<GroupResponse, PipelineError> {
    let project = store.get_project(project_id).await?;
    let tasks = store
        .list_all_tasks(&TaskFilter {
            project_id: Some(project_id.to_string()),
            status: Some(TaskStatus::Todo),
            uncategorized: true,
            ..Default::default()
        })
        .await?;

    if tasks.is_empty() {
        return Ok(GroupResponse {
            project_id: project_id.to_string(),
            groups: Vec::new(),
            tasks_updated: 0,
        });
    }

    let request = GroupingRequest {
        project_name: project.name,
        tasks: tasks
            .into_iter()
            .map(|task| GroupingTask {
                id: task.id,
                title: task.title,
            })
            .collect(),
        existing_groups: store.project_categories(project_id).await?,
    };

    let response = classifier.group(&request).await?;
    response.validate_against(&request)?;
    let assignments: Vec<(String, String)> = response
        .groups
        .iter()
        .flat_map(|group| {
            group
                .task_ids
                .iter()
                .map(|task_id| (task_id.clone(), group.category_name.trim().to_string()))
        })
        .collect();
    let tasks_updated = store.assign_categories(&assignments).await?;

    tracing::info!(project_id, groups = response.groups.len(), tasks_updated, "tasks grouped");
    Ok(GroupResponse {
        project_id: project_id.to_string(),
        groups: response.groups,
        tasks_updated,
    })
}

/// Answer a question about the user's tasks and projects.
///
/// Every task and project is serialized into the context, the way the
/// assistant would see them on screen.
///
/// # Errors
///
/// Returns `PipelineError::Core` for a blank question, `PipelineError::Database`
/// if the context cannot be read, or `PipelineError::Classify` if the
/// classifier fails.
pub async fn ask(
    store: &StashService,
    classifier: &dyn Classifier,
    question: &str,
) -> Result<AskResponse, PipelineError> {
    let question = question.trim();
    if question.is_empty() {
        return Err(CoreError::Validation("question must not be empty".into()).into());
    }

    let tasks = store.list_all_tasks(&TaskFilter::default()).await?;
    let projects = store.list_projects(None, u32::MAX).await?;
    let context = AssistantContext {
        tasks: tasks.iter().map(ContextTask::from).collect(),
        projects: projects.iter().map(ContextProject::from).collect(),
    };
    let request = ChatRequest {
        message: question.to_string(),
        context: serde_json::to_string(&context).map_err(|e| CoreError::Other(e.into()))?,
    };

    let response = classifier.chat(&request).await?;
    tracing::info!(
        tasks = context.tasks.len(),
        projects = context.projects.len(),
        "assistant answered"
    );
    Ok(AskResponse {
        question: request.message,
        reply: response.reply,
        tasks_in_context: u32::try_from(context.tasks.len()).unwrap_or(u32::MAX),
        projects_in_context: u32::try_from(context.projects.len()).unwrap_or(u32::MAX),
    })
}

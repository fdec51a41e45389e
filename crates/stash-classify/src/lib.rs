//! # stash-classify
//!
//! Clients for the external classification service.
//!
//! One [`Classifier`] trait covers the four calls Stash makes:
//! - `classify`: raw capture text plus known projects → [`ClassificationResult`]
//! - `decompose`: a task title → 3-6 subtasks
//! - `group`: a project's uncategorized tasks → named categories
//! - `chat`: a question about the user's tasks and projects → a free-text reply
//!
//! Two backends implement it:
//! - [`ServiceClassifier`]: a service exposing the JSON routes directly
//! - [`GeminiClassifier`]: Google Gemini, prompted locally
//!
//! No call retries. A failure of any kind is one [`ClassifyError`]; deciding
//! what happens next belongs to the caller.

mod error;
mod gemini;
mod http;
pub mod prompts;
mod service;

pub use error::ClassifyError;
pub use gemini::GeminiClassifier;
pub use service::ServiceClassifier;

use std::sync::Arc;

use async_trait::async_trait;
use stash_config::{ClassifierBackend, ClassifierConfig};
use stash_core::classification::{
    ChatRequest, ChatResponse, ClassificationResult, GroupingRequest, GroupingResponse,
    KnownProject, SubtaskRequest, SubtaskResponse,
};

/// The classification service, whatever speaks for it.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Classify one raw thought against the projects that already exist.
    async fn classify(
        &self,
        text: &str,
        known_projects: &[KnownProject],
    ) -> Result<ClassificationResult, ClassifyError>;

    /// Break a task into subtasks.
    async fn decompose(&self, request: &SubtaskRequest) -> Result<SubtaskResponse, ClassifyError>;

    /// Sort tasks into categories. Every requested task comes back in exactly one group.
    async fn group(&self, request: &GroupingRequest) -> Result<GroupingResponse, ClassifyError>;

    /// Answer a question using the serialized task and project context.
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, ClassifyError>;
}

/// Decode and validate a classification body.
///
/// Every backend funnels its answer through here, so a result that parses but
/// breaks the contract (fractional confidence, `inbox` list, blank title) is
/// a failed classification like any other.
///
/// # Errors
///
/// Returns [`ClassifyError::EmptyResponse`], [`ClassifyError::Malformed`] or
/// [`ClassifyError::Invalid`].
pub fn parse_classification(body: &str) -> Result<ClassificationResult, ClassifyError> {
    let result: ClassificationResult = http::decode_body(body)?;
    Ok(result.validated()?)
}

/// Build the classifier selected by `config.backend`.
///
/// # Errors
///
/// Returns [`ClassifyError::NotConfigured`] if the backend lacks its endpoint or key.
pub fn from_config(config: &ClassifierConfig) -> Result<Arc<dyn Classifier>, ClassifyError> {
    match config.backend {
        ClassifierBackend::Service => Ok(Arc::new(ServiceClassifier::from_config(config)?)),
        ClassifierBackend::Gemini => Ok(Arc::new(GeminiClassifier::from_config(config)?)),
    }
}

/// How many subtasks the prompts ask for. Other counts are applied as given.
const EXPECTED_SUBTASKS: std::ops::RangeInclusive<usize> = 3..=6;

/// Trim subtask titles and refuse an empty or blank answer.
pub(crate) fn check_subtasks(mut response: SubtaskResponse) -> Result<SubtaskResponse, ClassifyError> {
    for subtask in &mut response.subtasks {
        *subtask = subtask.trim().to_string();
    }
    if response.subtasks.is_empty() {
        return Err(ClassifyError::Invalid("no subtasks returned".into()));
    }
    if response.subtasks.iter().any(String::is_empty) {
        return Err(ClassifyError::Invalid("blank subtask returned".into()));
    }
    if !EXPECTED_SUBTASKS.contains(&response.subtasks.len()) {
        tracing::debug!(
            count = response.subtasks.len(),
            "subtask count outside the requested 3-6"
        );
    }
    Ok(response)
}

/// Trim the reply and refuse a blank one.
pub(crate) fn check_chat(mut response: ChatResponse) -> Result<ChatResponse, ClassifyError> {
    response.reply = response.reply.trim().to_string();
    if response.reply.is_empty() {
        return Err(ClassifyError::EmptyResponse);
    }
    Ok(response)
}

/// Refuse groupings that lose, duplicate or invent task ids.
pub(crate) fn check_grouping(
    response: GroupingResponse,
    request: &GroupingRequest,
) -> Result<GroupingResponse, ClassifyError> {
    response.validate_against(request)?;
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stash_core::classification::{GroupingTask, TaskGroup};

    fn grouping_request() -> GroupingRequest {
        GroupingRequest {
            project_name: "House".into(),
            tasks: vec![
                GroupingTask {
                    id: "tsk-1".into(),
                    title: "Paint fence".into(),
                },
                GroupingTask {
                    id: "tsk-2".into(),
                    title: "Fix sink".into(),
                },
            ],
            existing_groups: vec![],
        }
    }

    #[test]
    fn subtasks_are_trimmed() {
        let checked = check_subtasks(SubtaskResponse {
            subtasks: vec!["  Book flights ".into(), "Pack".into()],
        })
        .unwrap();
        assert_eq!(checked.subtasks, vec!["Book flights", "Pack"]);
    }

    #[test]
    fn empty_or_blank_subtasks_are_invalid() {
        assert!(matches!(
            check_subtasks(SubtaskResponse { subtasks: vec![] }),
            Err(ClassifyError::Invalid(_))
        ));
        assert!(matches!(
            check_subtasks(SubtaskResponse {
                subtasks: vec!["Pack".into(), " ".into()]
            }),
            Err(ClassifyError::Invalid(_))
        ));
    }

    #[test]
    fn subtask_counts_outside_range_are_kept() {
        let checked = check_subtasks(SubtaskResponse {
            subtasks: (1..=8).map(|n| format!("Step {n}")).collect(),
        })
        .unwrap();
        assert_eq!(checked.subtasks.len(), 8);
    }

    #[test]
    fn blank_chat_reply_is_empty_response() {
        assert!(matches!(
            check_chat(ChatResponse { reply: "  \n".into() }),
            Err(ClassifyError::EmptyResponse)
        ));
        let reply = check_chat(ChatResponse {
            reply: " You have 2 errands. ".into(),
        })
        .unwrap();
        assert_eq!(reply.reply, "You have 2 errands.");
    }

    #[test]
    fn parse_classification_rejects_contract_breaks() {
        let fractional = r#"{"rewrittenTitle":"Buy milk","projectMatch":{"name":"Errands","confidence":89.6}}"#;
        assert!(matches!(
            parse_classification(fractional),
            Err(ClassifyError::Malformed(_))
        ));

        let inbox = r#"{"rewrittenTitle":"Buy milk","list":"inbox","projectMatch":{"name":"Errands","confidence":95}}"#;
        assert!(matches!(
            parse_classification(inbox),
            Err(ClassifyError::Invalid(_))
        ));

        let valid = r#"{"rewrittenTitle":" Buy milk ","list":"next","projectMatch":{"name":"Errands","confidence":95}}"#;
        assert_eq!(parse_classification(valid).unwrap().rewritten_title, "Buy milk");
    }

    #[test]
    fn grouping_missing_a_task_is_invalid() {
        let response = GroupingResponse {
            groups: vec![TaskGroup {
                category_name: "Outside".into(),
                task_ids: vec!["tsk-1".into()],
            }],
        };
        assert!(matches!(
            check_grouping(response, &grouping_request()),
            Err(ClassifyError::Invalid(_))
        ));
    }

    #[test]
    fn complete_grouping_passes() {
        let response = GroupingResponse {
            groups: vec![
                TaskGroup {
                    category_name: "Outside".into(),
                    task_ids: vec!["tsk-1".into()],
                },
                TaskGroup {
                    category_name: "Plumbing".into(),
                    task_ids: vec!["tsk-2".into()],
                },
            ],
        };
        assert!(check_grouping(response, &grouping_request()).is_ok());
    }

    #[test]
    fn backend_selection_follows_config() {
        let gemini = ClassifierConfig {
            backend: ClassifierBackend::Gemini,
            api_key: "k".into(),
            ..Default::default()
        };
        assert!(from_config(&gemini).is_ok());

        let unconfigured = ClassifierConfig::default();
        assert!(matches!(
            from_config(&unconfigured),
            Err(ClassifyError::NotConfigured(_))
        ));
    }
}

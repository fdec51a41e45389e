//! Client for a classification service speaking the JSON contract directly.
//!
//! `POST {endpoint}/process`, `/subtasks`, `/group-tasks` and `/chat`, each
//! taking and returning the wire types in `stash_core::classification`.

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use stash_config::ClassifierConfig;
use stash_core::classification::{
    ChatRequest, ChatResponse, ClassificationRequest, ClassificationResult, GroupingRequest,
    GroupingResponse, KnownProject, SubtaskRequest, SubtaskResponse,
};

use crate::error::ClassifyError;
use crate::http::{build_client, check_response, read_json};
use crate::{Classifier, check_chat, check_grouping, check_subtasks, parse_classification};

pub struct ServiceClassifier {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl ServiceClassifier {
    /// # Errors
    ///
    /// Returns [`ClassifyError::NotConfigured`] if no endpoint is set.
    pub fn from_config(config: &ClassifierConfig) -> Result<Self, ClassifyError> {
        if config.endpoint.trim().is_empty() {
            return Err(ClassifyError::NotConfigured(
                "classifier.endpoint is required for the service backend".into(),
            ));
        }
        Ok(Self::new(
            config.base_url(),
            Some(config.api_key.as_str()).filter(|key| !key.is_empty()),
            config.timeout_secs,
        ))
    }

    #[must_use]
    pub fn new(base_url: &str, api_key: Option<&str>, timeout_secs: u64) -> Self {
        Self {
            http: build_client(timeout_secs),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.map(String::from),
        }
    }

    fn url(&self, route: &str) -> String {
        format!("{}/{route}", self.base_url)
    }

    fn request<B: Serialize + Sync>(&self, route: &str, body: &B) -> reqwest::RequestBuilder {
        let mut request = self.http.post(self.url(route)).json(body);
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }
        tracing::debug!(route, "classifier request");
        request
    }

    async fn post<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        route: &str,
        body: &B,
    ) -> Result<T, ClassifyError> {
        read_json(self.request(route, body).send().await?).await
    }
}

#[async_trait]
impl Classifier for ServiceClassifier {
    async fn classify(
        &self,
        text: &str,
        known_projects: &[KnownProject],
    ) -> Result<ClassificationResult, ClassifyError> {
        let request = ClassificationRequest {
            text: text.to_string(),
            existing_projects: known_projects.to_vec(),
        };
        let resp = check_response(self.request("process", &request).send().await?).await?;
        parse_classification(&resp.text().await?)
    }

    async fn decompose(&self, request: &SubtaskRequest) -> Result<SubtaskResponse, ClassifyError> {
        let response = self.post("subtasks", request).await?;
        check_subtasks(response)
    }

    async fn group(&self, request: &GroupingRequest) -> Result<GroupingResponse, ClassifyError> {
        let response = self.post("group-tasks", request).await?;
        check_grouping(response, request)
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, ClassifyError> {
        let response = self.post("chat", request).await?;
        check_chat(response)
    }
}

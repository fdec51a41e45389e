//! Google Gemini backend.
//!
//! Builds the prompts locally (see [`crate::prompts`]) and asks
//! `models/{model}:generateContent` for a JSON-only answer, then parses the
//! text of the first candidate as the wire type. Chat replies are plain text.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use stash_config::ClassifierConfig;
use stash_core::classification::{
    ChatRequest, ChatResponse, ClassificationResult, GroupingRequest, GroupingResponse,
    KnownProject, SubtaskRequest, SubtaskResponse,
};

use crate::error::ClassifyError;
use crate::http::{build_client, check_response, decode_body};
use crate::{Classifier, check_chat, check_grouping, check_subtasks, parse_classification, prompts};

// ── Wire types ─────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateResponse {
    /// Text of the first part of the first candidate.
    fn into_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .next()?
            .text
    }
}

// ── Client ─────────────────────────────────────────────────────────

pub struct GeminiClassifier {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GeminiClassifier {
    /// # Errors
    ///
    /// Returns [`ClassifyError::NotConfigured`] if no API key is set.
    pub fn from_config(config: &ClassifierConfig) -> Result<Self, ClassifyError> {
        if config.api_key.trim().is_empty() {
            return Err(ClassifyError::NotConfigured(
                "classifier.api_key is required for the gemini backend".into(),
            ));
        }
        Ok(Self {
            http: build_client(config.timeout_secs),
            base_url: config.base_url().to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }

    fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url,
            urlencoding::encode(&self.model)
        )
    }

    /// Text of the model's first candidate; `json` asks for a JSON-only answer.
    async fn generate_text(&self, prompt: &str, json: bool) -> Result<String, ClassifyError> {
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: json.then_some(GenerationConfig {
                response_mime_type: "application/json",
            }),
        };

        tracing::debug!(model = %self.model, json, "gemini generateContent");
        let resp = self
            .http
            .post(self.url())
            .header("x-goog-api-key", self.api_key.as_str())
            .json(&body)
            .send()
            .await?;
        let raw = check_response(resp).await?.text().await?;
        envelope_text(&raw)
    }

    async fn generate<T: DeserializeOwned>(&self, prompt: &str) -> Result<T, ClassifyError> {
        decode_body(&self.generate_text(prompt, true).await?)
    }
}

/// Unwrap the `generateContent` envelope to the model's text.
fn envelope_text(raw: &str) -> Result<String, ClassifyError> {
    let envelope: GenerateResponse = decode_body(raw)?;
    envelope.into_text().ok_or(ClassifyError::EmptyResponse)
}

/// Unwrap the envelope and decode the model's JSON text.
#[cfg(test)]
fn parse_generated<T: DeserializeOwned>(raw: &str) -> Result<T, ClassifyError> {
    decode_body(&envelope_text(raw)?)
}

#[async_trait]
impl Classifier for GeminiClassifier {
    async fn classify(
        &self,
        text: &str,
        known_projects: &[KnownProject],
    ) -> Result<ClassificationResult, ClassifyError> {
        let prompt = prompts::classification_prompt(text, known_projects);
        parse_classification(&self.generate_text(&prompt, true).await?)
    }

    async fn decompose(&self, request: &SubtaskRequest) -> Result<SubtaskResponse, ClassifyError> {
        let response = self.generate(&prompts::subtask_prompt(request)).await?;
        check_subtasks(response)
    }

    async fn group(&self, request: &GroupingRequest) -> Result<GroupingResponse, ClassifyError> {
        let response = self.generate(&prompts::grouping_prompt(request)).await?;
        check_grouping(response, request)
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, ClassifyError> {
        let reply = self
            .generate_text(&prompts::chat_prompt(request), false)
            .await?;
        check_chat(ChatResponse { reply })
    }
}

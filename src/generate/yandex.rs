//! generate::yandex
//!
//! Content generation through the Yandex Foundation Models completion API.
//!
//! One non-streaming request per field, a single user message, low
//! temperature. The first alternative's text is the answer.

use async_trait::async_trait;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ContentGenerator, GenerateError};
use crate::core::config::YandexCredentials;

/// Completion endpoint.
pub const COMPLETION_ENDPOINT: &str =
    "https://llm.api.cloud.yandex.net/foundationModels/v1/completion";

const TEMPERATURE: f64 = 0.3;
const MAX_TOKENS: u32 = 500;

/// Generator backed by Yandex GPT.
pub struct YandexGpt {
    client: Client,
    credentials: YandexCredentials,
    model: String,
    endpoint: String,
}

impl std::fmt::Debug for YandexGpt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YandexGpt")
            .field("credentials", &self.credentials)
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl YandexGpt {
    pub fn new(credentials: YandexCredentials, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            credentials,
            model: model.into(),
            endpoint: COMPLETION_ENDPOINT.to_string(),
        }
    }

    /// Send requests somewhere other than the public endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// `gpt://<folder>/<model>`
    pub fn model_uri(&self) -> String {
        format!("gpt://{}/{}", self.credentials.folder_id, self.model)
    }

    async fn complete(&self, prompt: String) -> Result<String, GenerateError> {
        let body = CompletionRequest {
            model_uri: self.model_uri(),
            completion_options: CompletionOptions {
                stream: false,
                temperature: TEMPERATURE,
                max_tokens: MAX_TOKENS,
            },
            messages: vec![Message {
                role: "user".to_string(),
                text: prompt,
            }],
        };

        let auth = HeaderValue::from_str(&format!("Api-Key {}", self.credentials.api_key))
            .map_err(|e| GenerateError::Network(format!("invalid API key: {}", e)))?;

        debug!(endpoint = %self.endpoint, model = %self.model, "requesting completion");
        let response = self
            .client
            .post(&self.endpoint)
            .header(AUTHORIZATION, auth)
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerateError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerateError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| GenerateError::InvalidResponse(e.to_string()))?;

        completion
            .result
            .alternatives
            .into_iter()
            .next()
            .map(|alt| alt.message.text)
            .ok_or(GenerateError::EmptyResponse)
    }
}

/// Prompt asking for a PR title.
pub fn title_prompt(diff: &str) -> String {
    format!(
        "Generate a concise and descriptive pull request title based on the following git diff. \
         The title should be in imperative mood, start with a verb, and be under 70 characters:\n\n\
         {}\n\nReturn only the title, no additional text.",
        diff
    )
}

/// Prompt asking for a PR description.
pub fn description_prompt(diff: &str) -> String {
    format!(
        "Generate a pull request description based on the following git diff.\n\n\
         Format the response in markdown:\n\n{}",
        diff
    )
}

/// Prompt asking for a branch name.
pub fn branch_name_prompt(diff: &str) -> String {
    format!(
        "Generate a short branch name based on the following git diff. The name should:\n\
         - Be descriptive but concise\n\
         - Use kebab-case (lowercase with hyphens)\n\
         - Be under 40 characters\n\
         - Not include any prefixes\n\n\
         {}\n\nReturn only the branch name, no additional text.",
        diff
    )
}

#[async_trait]
impl ContentGenerator for YandexGpt {
    fn name(&self) -> &'static str {
        "yandex"
    }

    async fn branch_name(&self, diff: &str) -> Result<String, GenerateError> {
        self.complete(branch_name_prompt(diff)).await
    }

    async fn pr_title(&self, diff: &str) -> Result<String, GenerateError> {
        self.complete(title_prompt(diff)).await
    }

    async fn pr_description(&self, diff: &str) -> Result<String, GenerateError> {
        self.complete(description_prompt(diff)).await
    }
}

// --------------------------------------------------------------------------
// API Types
// --------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CompletionRequest {
    model_uri: String,
    completion_options: CompletionOptions,
    messages: Vec<Message>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CompletionOptions {
    stream: bool,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Serialize, Deserialize)]
struct Message {
    role: String,
    text: String,
}

#[derive(Deserialize)]
struct CompletionResponse {
    result: CompletionResult,
}

#[derive(Deserialize)]
struct CompletionResult {
    #[serde(default)]
    alternatives: Vec<Alternative>,
}

#[derive(Deserialize)]
struct Alternative {
    message: Message,
}

//! generate
//!
//! Content generation: branch names, PR titles and PR descriptions from a
//! unified diff.
//!
//! # Variants
//!
//! - [`local::LocalGenerator`]: produces nothing, so every field is asked
//!   for at the prompt
//! - [`yandex::YandexGpt`]: asks the Yandex completion API
//!
//! The variant is chosen once from configuration by [`create_generator`].
//! An empty successful result is distinct from a failure; the workflow
//! decides what to do with each.

pub mod local;
pub mod yandex;

use async_trait::async_trait;
use thiserror::Error;

use crate::core::config::{Config, ContentGeneration};

/// Errors from content generation.
#[derive(Debug, Clone, Error)]
pub enum GenerateError {
    /// The backend answered with a non-success status.
    #[error("API request failed with status {status}: {body}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Raw response body
        body: String,
    },

    /// The backend answered without any alternatives.
    #[error("no alternatives in response")]
    EmptyResponse,

    /// The response body could not be decoded.
    #[error("failed to decode response: {0}")]
    InvalidResponse(String),

    /// The request never completed.
    #[error("failed to make request: {0}")]
    Network(String),
}

/// Produces text from a diff.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Suggest a branch name (without prefix).
    async fn branch_name(&self, diff: &str) -> Result<String, GenerateError>;

    /// Suggest a pull request title.
    async fn pr_title(&self, diff: &str) -> Result<String, GenerateError>;

    /// Suggest a pull request description.
    async fn pr_description(&self, diff: &str) -> Result<String, GenerateError>;
}

/// Build the generator selected by configuration.
pub fn create_generator(config: &Config) -> Box<dyn ContentGenerator> {
    match (config.content_generation, &config.yandex) {
        (ContentGeneration::Yandex, Some(credentials)) => Box::new(yandex::YandexGpt::new(
            credentials.clone(),
            config.yandex_model.clone(),
        )),
        _ => Box::new(local::LocalGenerator),
    }
}

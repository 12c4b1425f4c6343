//! generate::local
//!
//! The manual generator: it never proposes anything, so the workflow asks
//! the user for every field.

use async_trait::async_trait;

use super::{ContentGenerator, GenerateError};

/// Generator for `content_generation = "local"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalGenerator;

#[async_trait]
impl ContentGenerator for LocalGenerator {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn branch_name(&self, _diff: &str) -> Result<String, GenerateError> {
        Ok(String::new())
    }

    async fn pr_title(&self, _diff: &str) -> Result<String, GenerateError> {
        Ok(String::new())
    }

    async fn pr_description(&self, _diff: &str) -> Result<String, GenerateError> {
        Ok(String::new())
    }
}

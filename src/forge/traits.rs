//! forge::traits
//!
//! Forge trait definition for the pull-request provider.
//!
//! # Design
//!
//! The `Forge` trait is async because forge operations involve network I/O.
//! Requests carry the repository coordinates (`owner`/`repo`) themselves:
//! the executor resolves them from the remote URL at execution time, so one
//! forge value can serve any repository.
//!
//! A merge that the host refuses for policy reasons (branch protection,
//! pending checks, conflicts) is a [`MergeOutcome`] with `merged: false`,
//! not a [`ForgeError`].
//!
//! # Example
//!
//! ```ignore
//! use branchtale::forge::{CreatePrRequest, Forge};
//!
//! async fn open_pr(forge: &dyn Forge) -> Result<(), ForgeError> {
//!     let pr = forge
//!         .create_pr(CreatePrRequest {
//!             owner: "acme".to_string(),
//!             repo: "widgets".to_string(),
//!             title: "Add retry logic".to_string(),
//!             body: "Retries failed uploads.".to_string(),
//!             head: "fix/timeout".to_string(),
//!             base: "main".to_string(),
//!         })
//!         .await?;
//!     println!("Created PR #{}: {}", pr.number, pr.url);
//!     Ok(())
//! }
//! ```

use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from forge operations.
#[derive(Debug, Clone, Error)]
pub enum ForgeError {
    /// Authentication failed (invalid token, expired, insufficient permissions).
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Rate limit exceeded.
    #[error("rate limited")]
    RateLimited,

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// Network or connection error.
    #[error("network error: {0}")]
    NetworkError(String),
}

/// Repository coordinates on the forge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoSlug {
    /// User or organization
    pub owner: String,
    /// Repository name
    pub repo: String,
}

impl std::fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// Request to create a pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePrRequest {
    /// Repository owner
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// PR title
    pub title: String,
    /// PR body/description
    pub body: String,
    /// Head branch name (the branch with changes)
    pub head: String,
    /// Base branch name (the branch to merge into)
    pub base: String,
}

/// A created pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    /// PR number
    pub number: u64,
    /// PR URL (web URL for viewing)
    pub url: String,
}

/// Request to merge a pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergePrRequest {
    /// Repository owner
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// PR number
    pub number: u64,
    /// How to merge
    pub method: MergeMethod,
}

/// Result of a merge attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeOutcome {
    /// SHA of the merge commit, when merged
    pub sha: Option<String>,
    /// Whether the PR was merged
    pub merged: bool,
    /// Host's explanation
    pub message: String,
}

/// Merge method for merging a PR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeMethod {
    /// Create a merge commit
    #[default]
    Merge,
    /// Squash all commits and merge
    Squash,
    /// Rebase commits onto base branch
    Rebase,
}

impl MergeMethod {
    /// The name the GitHub API expects.
    pub fn as_str(&self) -> &'static str {
        match self {
            MergeMethod::Merge => "merge",
            MergeMethod::Squash => "squash",
            MergeMethod::Rebase => "rebase",
        }
    }
}

impl std::fmt::Display for MergeMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MergeMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "merge" => Ok(MergeMethod::Merge),
            "squash" => Ok(MergeMethod::Squash),
            "rebase" => Ok(MergeMethod::Rebase),
            other => Err(format!(
                "unknown merge method '{}', must be one of: merge, squash, rebase",
                other
            )),
        }
    }
}

/// The pull-request provider.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` to allow use across async tasks.
///
/// # Error Handling
///
/// - `AuthFailed`: token rejected or lacking scope
/// - `NotFound`: repository or PR doesn't exist
/// - `RateLimited`: back off and re-run
/// - `ApiError`: shown to the user as-is
/// - `NetworkError`: check connectivity
#[async_trait]
pub trait Forge: Send + Sync {
    /// Get the forge name (e.g., "github").
    fn name(&self) -> &'static str;

    /// Create a new pull request.
    ///
    /// # Errors
    ///
    /// - `AuthFailed` if the token is invalid or lacks permissions
    /// - `ApiError` with status 422 if validation fails (e.g., head doesn't exist
    ///   on the remote, or a PR for it is already open)
    async fn create_pr(&self, request: CreatePrRequest) -> Result<PullRequest, ForgeError>;

    /// Merge a pull request.
    ///
    /// A refusal by the host is `Ok` with `merged: false`.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the PR doesn't exist
    /// - `AuthFailed` if lacking permission to merge
    async fn merge_pr(&self, request: MergePrRequest) -> Result<MergeOutcome, ForgeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_method_display() {
        assert_eq!(format!("{}", MergeMethod::Merge), "merge");
        assert_eq!(format!("{}", MergeMethod::Squash), "squash");
        assert_eq!(format!("{}", MergeMethod::Rebase), "rebase");
    }

    #[test]
    fn merge_method_default_is_merge() {
        assert_eq!(MergeMethod::default(), MergeMethod::Merge);
    }

    #[test]
    fn merge_method_parses_case_insensitively() {
        assert_eq!("Squash".parse::<MergeMethod>(), Ok(MergeMethod::Squash));
        assert_eq!(" rebase ".parse::<MergeMethod>(), Ok(MergeMethod::Rebase));
        assert!("fast-forward".parse::<MergeMethod>().is_err());
    }

    #[test]
    fn repo_slug_display() {
        let slug = RepoSlug {
            owner: "acme".to_string(),
            repo: "widgets".to_string(),
        };
        assert_eq!(slug.to_string(), "acme/widgets");
    }

    #[test]
    fn forge_error_display() {
        assert_eq!(
            format!("{}", ForgeError::AuthFailed("expired token".into())),
            "authentication failed: expired token"
        );
        assert_eq!(format!("{}", ForgeError::RateLimited), "rate limited");
        assert_eq!(
            format!(
                "{}",
                ForgeError::ApiError {
                    status: 422,
                    message: "Validation Failed".into()
                }
            ),
            "API error: 422 - Validation Failed"
        );
    }
}

//! engine::plan
//!
//! Turning what was observed into what must be done.
//!
//! # Architecture
//!
//! [`Requirements`] is the only hand-off between planning and execution.
//! It is a flat, serializable description of which side effects a run
//! performs. It carries names and text only; repository coordinates on the
//! forge are resolved by the executor, so a plan can be logged or
//! previewed without touching the repository.
//!
//! # Invariants
//!
//! - The planner performs no I/O
//! - The same inputs always produce the same plan (and the same digest)
//! - An empty generated branch name is an error, never "nothing to do"
//!
//! # Example
//!
//! ```
//! use branchtale::core::types::BranchName;
//! use branchtale::engine::plan::{Findings, GeneratedContent, Planner};
//! use branchtale::git::RepoInfo;
//!
//! let repo = RepoInfo {
//!     current_branch: BranchName::new("main").unwrap(),
//!     main_branch: BranchName::new("main").unwrap(),
//!     is_on_main: true,
//! };
//! let findings = Findings {
//!     commits_ahead: 2,
//!     branch_on_remote: None,
//!     content: GeneratedContent {
//!         branch_name: "add-retry-logic".into(),
//!         ..Default::default()
//!     },
//! };
//!
//! let planner = Planner::new("feat/");
//! let plan = planner.plan(&repo, &findings).unwrap();
//! assert!(plan.create_branch);
//! assert_eq!(plan.branch_name, "feat/add-retry-logic");
//! ```

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::core::naming::clean_branch_name;
use crate::core::types::BranchName;
use crate::git::RepoInfo;

/// Errors from planning, and from validating a plan before execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    /// No usable branch name was generated or entered.
    #[error("no branch name was generated; cannot create a branch")]
    EmptyBranchName,

    /// The branch name is not a valid ref name.
    #[error("invalid branch name '{name}': {reason}")]
    InvalidBranchName {
        /// The rejected name
        name: String,
        /// Why it was rejected
        reason: String,
    },

    /// A pull request needs a title.
    #[error("pull request title is empty")]
    EmptyTitle,

    /// The push decision needs to know whether the branch is on the remote.
    #[error("remote branch check missing for '{branch}'")]
    MissingRemoteCheck {
        /// The feature branch
        branch: String,
    },

    /// A pull request needs a base branch.
    #[error("base branch is empty")]
    EmptyBaseBranch,

    /// Merging only follows creating.
    #[error("merge requested without creating a pull request")]
    MergeWithoutPullRequest,
}

/// The declarative action plan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirements {
    /// Create `branch_name` at HEAD and check it out.
    pub create_branch: bool,
    /// Branch the plan acts on: the new branch, or the current feature branch.
    pub branch_name: String,
    /// Push `branch_name` to the remote.
    pub push_branch: bool,
    /// Trunk branch, used as the pull request base.
    pub base_branch: String,
    /// Open a pull request from `branch_name` into `base_branch`.
    pub create_pull_request: bool,
    pub pull_request_title: String,
    pub pull_request_description: String,
    /// Recorded for the provider; not acted on yet.
    pub pull_request_tags: Vec<String>,
    /// Merge the pull request once created.
    pub merge_pull_request: bool,
}

impl Requirements {
    /// True when the plan performs nothing.
    pub fn is_empty(&self) -> bool {
        !(self.create_branch
            || self.push_branch
            || self.create_pull_request
            || self.merge_pull_request)
    }

    /// Whether any step talks to the pull-request provider.
    pub fn needs_forge(&self) -> bool {
        self.create_pull_request || self.merge_pull_request
    }

    /// Check internal consistency.
    ///
    /// The executor calls this before its first step so an inconsistent
    /// plan never mutates anything.
    pub fn validate(&self) -> Result<(), PlanError> {
        if self.is_empty() {
            return Ok(());
        }

        if self.branch_name.trim().is_empty() {
            return Err(PlanError::EmptyBranchName);
        }
        BranchName::new(self.branch_name.as_str()).map_err(|e| PlanError::InvalidBranchName {
            name: self.branch_name.clone(),
            reason: e.to_string(),
        })?;

        if self.merge_pull_request && !self.create_pull_request {
            return Err(PlanError::MergeWithoutPullRequest);
        }

        if self.create_pull_request {
            if self.base_branch.trim().is_empty() {
                return Err(PlanError::EmptyBaseBranch);
            }
            if self.pull_request_title.trim().is_empty() {
                return Err(PlanError::EmptyTitle);
            }
        }

        Ok(())
    }

    /// SHA-256 of the canonical JSON form, as `sha256:<hex>`.
    pub fn digest(&self) -> String {
        let json = serde_json::to_string(self).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(json.as_bytes());
        format!("sha256:{}", hex::encode(hasher.finalize()))
    }
}

/// Text produced by the content generator (or typed at the prompt).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratedContent {
    /// Suggested branch name, before prefixing
    pub branch_name: String,
    pub title: String,
    pub description: String,
}

/// Everything the planner needs besides [`RepoInfo`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Findings {
    /// Commits on the current branch not on the remote trunk
    pub commits_ahead: usize,
    /// Whether the current branch exists on the remote.
    ///
    /// Only looked up on feature branches; `None` on trunk.
    pub branch_on_remote: Option<bool>,
    pub content: GeneratedContent,
}

/// Builds [`Requirements`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Planner {
    /// Prepended verbatim to generated branch names
    pub branch_prefix: String,
    /// Merge the pull request after creating it
    pub merge: bool,
    /// Tags recorded on pull request plans
    pub tags: Vec<String>,
}

impl Planner {
    pub fn new(branch_prefix: impl Into<String>) -> Self {
        Self {
            branch_prefix: branch_prefix.into(),
            ..Default::default()
        }
    }

    pub fn with_merge(mut self, merge: bool) -> Self {
        self.merge = merge;
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Compute the plan.
    ///
    /// | State | Condition | Plan |
    /// |---|---|---|
    /// | any branch | no commits ahead | empty |
    /// | trunk | commits ahead | create `<prefix><name>` |
    /// | feature | not on remote | push, open PR |
    /// | feature | on remote | open PR |
    pub fn plan(&self, repo: &RepoInfo, findings: &Findings) -> Result<Requirements, PlanError> {
        if findings.commits_ahead == 0 {
            return Ok(Requirements::default());
        }

        if repo.is_on_main {
            self.plan_on_trunk(repo, findings)
        } else {
            self.plan_on_feature(repo, findings)
        }
    }

    fn plan_on_trunk(
        &self,
        repo: &RepoInfo,
        findings: &Findings,
    ) -> Result<Requirements, PlanError> {
        let cleaned = clean_branch_name(&findings.content.branch_name);
        if cleaned.is_empty() {
            return Err(PlanError::EmptyBranchName);
        }

        let name = format!("{}{}", self.branch_prefix, cleaned);
        BranchName::new(name.as_str()).map_err(|e| PlanError::InvalidBranchName {
            name: name.clone(),
            reason: e.to_string(),
        })?;

        // Title and description are generated on the next run, once the
        // feature branch exists.
        Ok(Requirements {
            create_branch: true,
            branch_name: name,
            base_branch: repo.main_branch.to_string(),
            ..Default::default()
        })
    }

    fn plan_on_feature(
        &self,
        repo: &RepoInfo,
        findings: &Findings,
    ) -> Result<Requirements, PlanError> {
        let branch = repo.current_branch.to_string();
        let on_remote = findings
            .branch_on_remote
            .ok_or_else(|| PlanError::MissingRemoteCheck {
                branch: branch.clone(),
            })?;

        let base = repo.main_branch.to_string();
        if base.trim().is_empty() {
            return Err(PlanError::EmptyBaseBranch);
        }

        let title = findings.content.title.trim();
        if title.is_empty() {
            return Err(PlanError::EmptyTitle);
        }

        Ok(Requirements {
            create_branch: false,
            branch_name: branch,
            push_branch: !on_remote,
            base_branch: base,
            create_pull_request: true,
            pull_request_title: title.to_string(),
            pull_request_description: findings.content.description.trim().to_string(),
            pull_request_tags: self.tags.clone(),
            merge_pull_request: self.merge,
        })
    }
}

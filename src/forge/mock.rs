//! forge::mock
//!
//! Mock forge implementation for deterministic testing.
//!
//! # Design
//!
//! The mock forge provides a deterministic implementation of the `Forge` trait
//! for use in tests. It stores PRs in memory, records every call, and allows
//! configuring failure and merge-refusal scenarios.
//!
//! # Example
//!
//! ```
//! use branchtale::forge::mock::MockForge;
//! use branchtale::forge::{CreatePrRequest, Forge};
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let forge = MockForge::new();
//!
//! let pr = forge.create_pr(CreatePrRequest {
//!     owner: "acme".to_string(),
//!     repo: "widgets".to_string(),
//!     title: "Add feature".to_string(),
//!     body: "Description".to_string(),
//!     head: "feature".to_string(),
//!     base: "main".to_string(),
//! }).await.unwrap();
//!
//! assert_eq!(pr.number, 1);
//! assert_eq!(pr.url, "https://github.com/acme/widgets/pull/1");
//! # });
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use super::traits::{
    CreatePrRequest, Forge, ForgeError, MergeMethod, MergeOutcome, MergePrRequest, PullRequest,
};

/// Mock forge for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones share state,
/// so a test can hand one clone to the executor and inspect another.
#[derive(Debug, Clone)]
pub struct MockForge {
    /// Internal state shared across clones.
    inner: Arc<Mutex<MockForgeInner>>,
}

/// Internal mutable state.
#[derive(Debug)]
struct MockForgeInner {
    /// Stored PRs by number.
    prs: HashMap<u64, MockPr>,
    /// Next PR number to assign.
    next_pr_number: u64,
    /// Method to fail on (for testing error paths).
    fail_on: Option<FailOn>,
    /// When set, merges are refused with this message.
    merge_refusal: Option<String>,
    /// Recorded operations for verification.
    operations: Vec<MockOperation>,
}

#[derive(Debug)]
struct MockPr {
    request: CreatePrRequest,
    merged: bool,
}

/// Configuration for which operation should fail.
#[derive(Debug, Clone)]
pub enum FailOn {
    /// Fail create_pr with the given error.
    CreatePr(ForgeError),
    /// Fail merge_pr with the given error.
    MergePr(ForgeError),
}

/// Recorded operation for test verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOperation {
    CreatePr {
        owner: String,
        repo: String,
        head: String,
        base: String,
        title: String,
        body: String,
    },
    MergePr {
        owner: String,
        repo: String,
        number: u64,
        method: MergeMethod,
    },
}

impl MockForge {
    /// Create a new empty mock forge.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockForgeInner {
                prs: HashMap::new(),
                next_pr_number: 1,
                fail_on: None,
                merge_refusal: None,
                operations: Vec::new(),
            })),
        }
    }

    /// Configure the mock to fail on a specific operation.
    ///
    /// # Example
    ///
    /// ```
    /// use branchtale::forge::mock::{MockForge, FailOn};
    /// use branchtale::forge::ForgeError;
    ///
    /// let forge = MockForge::new()
    ///     .fail_on(FailOn::CreatePr(ForgeError::RateLimited));
    /// ```
    pub fn fail_on(self, fail_on: FailOn) -> Self {
        self.state().fail_on = Some(fail_on);
        self
    }

    /// Refuse every merge with `message`, the way branch protection does.
    pub fn refuse_merges(self, message: impl Into<String>) -> Self {
        self.state().merge_refusal = Some(message.into());
        self
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<MockOperation> {
        self.state().operations.clone()
    }

    /// Get the count of PRs.
    pub fn pr_count(&self) -> usize {
        self.state().prs.len()
    }

    /// Whether PR `number` has been merged.
    pub fn is_merged(&self, number: u64) -> bool {
        self.state().prs.get(&number).is_some_and(|pr| pr.merged)
    }

    fn state(&self) -> MutexGuard<'_, MockForgeInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MockForge {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Forge for MockForge {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn create_pr(&self, request: CreatePrRequest) -> Result<PullRequest, ForgeError> {
        let mut inner = self.state();
        inner.operations.push(MockOperation::CreatePr {
            owner: request.owner.clone(),
            repo: request.repo.clone(),
            head: request.head.clone(),
            base: request.base.clone(),
            title: request.title.clone(),
            body: request.body.clone(),
        });

        if let Some(FailOn::CreatePr(e)) = &inner.fail_on {
            return Err(e.clone());
        }

        let duplicate = inner
            .prs
            .values()
            .any(|pr| !pr.merged && pr.request.head == request.head);
        if duplicate {
            return Err(ForgeError::ApiError {
                status: 422,
                message: format!("A pull request already exists for {}", request.head),
            });
        }

        let number = inner.next_pr_number;
        inner.next_pr_number += 1;

        let url = format!(
            "https://github.com/{}/{}/pull/{}",
            request.owner, request.repo, number
        );
        inner.prs.insert(
            number,
            MockPr {
                request,
                merged: false,
            },
        );

        Ok(PullRequest { number, url })
    }

    async fn merge_pr(&self, request: MergePrRequest) -> Result<MergeOutcome, ForgeError> {
        let mut inner = self.state();
        inner.operations.push(MockOperation::MergePr {
            owner: request.owner.clone(),
            repo: request.repo.clone(),
            number: request.number,
            method: request.method,
        });

        if let Some(FailOn::MergePr(e)) = &inner.fail_on {
            return Err(e.clone());
        }

        if let Some(message) = inner.merge_refusal.clone() {
            return Ok(MergeOutcome {
                sha: None,
                merged: false,
                message,
            });
        }

        let pr = inner
            .prs
            .get_mut(&request.number)
            .ok_or_else(|| ForgeError::NotFound(format!("PR #{}", request.number)))?;

        if pr.merged {
            return Ok(MergeOutcome {
                sha: None,
                merged: false,
                message: "Pull Request is not mergeable".to_string(),
            });
        }

        pr.merged = true;
        Ok(MergeOutcome {
            sha: Some(format!("{:040x}", request.number)),
            merged: true,
            message: "Pull Request successfully merged".to_string(),
        })
    }
}

//! engine::exec
//!
//! Realizes a [`Requirements`] plan, or simulates it.
//!
//! # Ordering
//!
//! Steps run in a fixed order, each depending on the previous ones:
//!
//! 1. create the branch at HEAD, then check it out
//! 2. push the branch
//! 3. resolve the remote URL into owner/repo
//! 4. open the pull request
//! 5. merge it
//!
//! The first failure aborts the run. Nothing is rolled back: a branch
//! created before a failed checkout stays created.
//!
//! # Dry run
//!
//! [`planned_actions`] decides which steps run; both live and dry-run
//! execution walk that same list, so a dry run reports exactly the steps a
//! live run would take. Only the mutation is skipped. Step 3 is read-only
//! and runs in both modes so the preview can name the target repository.

use thiserror::Error;
use tracing::{debug, info};

use super::plan::{PlanError, Requirements};
use crate::core::types::BranchName;
use crate::forge::{
    parse_github_url, CreatePrRequest, Forge, ForgeError, MergeMethod, MergeOutcome,
    MergePrRequest, PullRequest, RemoteUrlError, RepoSlug,
};
use crate::git::{Git, GitError};
use crate::ui::output::Reporter;

/// Errors from execution.
#[derive(Debug, Error)]
pub enum ExecuteError {
    /// The plan is inconsistent; nothing was attempted.
    #[error("invalid plan: {0}")]
    InvalidPlan(#[from] PlanError),

    /// A repository or remote operation failed.
    #[error(transparent)]
    Git(#[from] GitError),

    /// The pull-request provider failed.
    #[error("pull request provider error: {0}")]
    Forge(#[from] ForgeError),

    /// The remote URL does not point at a supported host.
    #[error("cannot use remote '{remote}': {source}")]
    RemoteUrl {
        /// Remote name
        remote: String,
        #[source]
        source: RemoteUrlError,
    },
}

/// One step of execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    CreateBranch { branch: String },
    CheckoutBranch { branch: String },
    PushBranch { branch: String, remote: String },
    ResolveRemote { remote: String },
    CreatePullRequest { head: String, base: String },
    MergePullRequest { method: MergeMethod },
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::CreateBranch { branch } => write!(f, "create branch '{}'", branch),
            Action::CheckoutBranch { branch } => write!(f, "check out '{}'", branch),
            Action::PushBranch { branch, remote } => {
                write!(f, "push '{}' to {}", branch, remote)
            }
            Action::ResolveRemote { remote } => write!(f, "resolve repository from {}", remote),
            Action::CreatePullRequest { head, base } => {
                write!(f, "open pull request {} -> {}", head, base)
            }
            Action::MergePullRequest { method } => write!(f, "merge pull request ({})", method),
        }
    }
}

/// Execution settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecOptions {
    /// Report instead of mutate
    pub dry_run: bool,
    /// Remote to push to and read the URL from
    pub remote: String,
    pub merge_method: MergeMethod,
}

impl Default for ExecOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            remote: "origin".to_string(),
            merge_method: MergeMethod::default(),
        }
    }
}

fn branch_name(name: &str) -> Result<BranchName, ExecuteError> {
    BranchName::new(name).map_err(|e| ExecuteError::Git(e.into()))
}

/// The steps `requirements` calls for, in execution order.
pub fn planned_actions(requirements: &Requirements, options: &ExecOptions) -> Vec<Action> {
    let branch = &requirements.branch_name;
    let mut actions = Vec::new();

    if requirements.create_branch {
        actions.push(Action::CreateBranch {
            branch: branch.clone(),
        });
        actions.push(Action::CheckoutBranch {
            branch: branch.clone(),
        });
    }
    if requirements.push_branch {
        actions.push(Action::PushBranch {
            branch: branch.clone(),
            remote: options.remote.clone(),
        });
    }
    if requirements.needs_forge() {
        actions.push(Action::ResolveRemote {
            remote: options.remote.clone(),
        });
    }
    if requirements.create_pull_request {
        actions.push(Action::CreatePullRequest {
            head: branch.clone(),
            base: requirements.base_branch.clone(),
        });
        if requirements.merge_pull_request {
            actions.push(Action::MergePullRequest {
                method: options.merge_method,
            });
        }
    }

    actions
}

/// What a run did (or, in a dry run, would have done).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionReport {
    /// Steps taken, in order
    pub actions: Vec<Action>,
    /// Repository resolved from the remote URL
    pub slug: Option<RepoSlug>,
    /// The pull request opened (live runs only)
    pub pull_request: Option<PullRequest>,
    /// Merge result (live runs only)
    pub merge: Option<MergeOutcome>,
    pub dry_run: bool,
}

/// Runs plans against a repository and a pull-request provider.
pub struct Executor<'a> {
    git: &'a Git,
    forge: &'a dyn Forge,
    reporter: &'a dyn Reporter,
    options: ExecOptions,
}

impl<'a> Executor<'a> {
    pub fn new(
        git: &'a Git,
        forge: &'a dyn Forge,
        reporter: &'a dyn Reporter,
        options: ExecOptions,
    ) -> Self {
        Self {
            git,
            forge,
            reporter,
            options,
        }
    }

    /// Execute (or simulate) `requirements`.
    ///
    /// # Errors
    ///
    /// [`ExecuteError::InvalidPlan`] before anything is touched; otherwise
    /// the first failing step's error.
    pub async fn execute(
        &self,
        requirements: &Requirements,
    ) -> Result<ExecutionReport, ExecuteError> {
        requirements.validate()?;

        let dry_run = self.options.dry_run;
        let mut report = ExecutionReport {
            dry_run,
            ..Default::default()
        };

        for action in planned_actions(requirements, &self.options) {
            debug!(%action, dry_run, "executing");
            if let Err(err) = self.apply(&action, requirements, &mut report).await {
                self.reporter.error(&format!(
                    "Stopped at '{}'; {} earlier step(s) were kept",
                    action,
                    report.actions.len()
                ));
                return Err(err);
            }
            report.actions.push(action);
        }

        info!(actions = report.actions.len(), dry_run, "execution finished");
        Ok(report)
    }

    async fn apply(
        &self,
        action: &Action,
        requirements: &Requirements,
        report: &mut ExecutionReport,
    ) -> Result<(), ExecuteError> {
        let dry_run = self.options.dry_run;

        match action {
            Action::CreateBranch { branch } => {
                if dry_run {
                    self.reporter
                        .info(&format!("[dry-run] Would create branch '{}'", branch));
                } else {
                    self.git.create_branch(&branch_name(branch)?)?;
                }
            }
            Action::CheckoutBranch { branch } => {
                if dry_run {
                    self.reporter
                        .info(&format!("[dry-run] Would check out '{}'", branch));
                } else {
                    self.git.checkout_branch(&branch_name(branch)?)?;
                    self.reporter.success(&format!(
                        "Branch '{}' created and checked out successfully",
                        branch
                    ));
                }
            }
            Action::PushBranch { branch, remote } => {
                if dry_run {
                    self.reporter
                        .info(&format!("[dry-run] Would push '{}' to {}", branch, remote));
                } else {
                    self.git
                        .push_branch(&branch_name(branch)?, remote)?;
                    self.reporter
                        .success(&format!("Pushed '{}' to {}", branch, remote));
                }
            }
            Action::ResolveRemote { remote } => {
                let url = self.git.remote_url(remote)?;
                let slug = parse_github_url(&url).map_err(|source| ExecuteError::RemoteUrl {
                    remote: remote.clone(),
                    source,
                })?;
                debug!(remote = %remote, %slug, "resolved repository");
                report.slug = Some(slug);
            }
            Action::CreatePullRequest { head, base } => {
                let slug = self.slug(report)?;
                if dry_run {
                    self.reporter.info(&format!(
                        "[dry-run] Would open pull request in {}: {} -> {} \"{}\"",
                        slug, head, base, requirements.pull_request_title
                    ));
                    return Ok(());
                }

                let pr = self
                    .forge
                    .create_pr(CreatePrRequest {
                        owner: slug.owner,
                        repo: slug.repo,
                        title: requirements.pull_request_title.clone(),
                        body: requirements.pull_request_description.clone(),
                        head: head.clone(),
                        base: base.clone(),
                    })
                    .await?;
                self.reporter.success(&format!(
                    "Pull request #{} created: {}",
                    pr.number, pr.url
                ));
                report.pull_request = Some(pr);
            }
            Action::MergePullRequest { method } => {
                let slug = self.slug(report)?;
                if dry_run {
                    self.reporter.info(&format!(
                        "[dry-run] Would merge the pull request using {}",
                        method
                    ));
                    return Ok(());
                }

                let number = report
                    .pull_request
                    .as_ref()
                    .map(|pr| pr.number)
                    .ok_or(PlanError::MergeWithoutPullRequest)?;
                let outcome = self
                    .forge
                    .merge_pr(MergePrRequest {
                        owner: slug.owner,
                        repo: slug.repo,
                        number,
                        method: *method,
                    })
                    .await?;

                if outcome.merged {
                    let sha = outcome.sha.as_deref().unwrap_or("unknown");
                    self.reporter
                        .success(&format!("Pull request #{} merged ({})", number, sha));
                } else {
                    self.reporter.warn(&format!(
                        "Pull request #{} was not merged: {}",
                        number, outcome.message
                    ));
                }
                report.merge = Some(outcome);
            }
        }

        Ok(())
    }

    fn slug(&self, report: &ExecutionReport) -> Result<RepoSlug, ExecuteError> {
        // ResolveRemote always precedes forge steps in planned_actions.
        report.slug.clone().ok_or_else(|| {
            ExecuteError::Git(GitError::RemoteNotFound {
                remote: self.options.remote.clone(),
            })
        })
    }
}

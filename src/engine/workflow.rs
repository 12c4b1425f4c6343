//! engine::workflow
//!
//! One run of the tool: inspect, generate, plan, confirm, execute.
//!
//! # Flows
//!
//! On the trunk, commits ahead of the remote trunk become a new feature
//! branch. On a feature branch, the branch is pushed if needed and a pull
//! request is opened against the trunk.
//!
//! Content generation failures fall back to the prompt when one is
//! available; without a prompt they end the run. An empty generated value
//! also falls back to the prompt, and otherwise flows to the planner,
//! which rejects it with its own error.

use thiserror::Error;
use tracing::{debug, info};

use super::exec::{planned_actions, ExecOptions, ExecuteError, ExecutionReport, Executor};
use super::plan::{Findings, GeneratedContent, PlanError, Planner, Requirements};
use crate::core::naming::clean_branch_name;
use crate::forge::{Forge, MergeMethod};
use crate::generate::{ContentGenerator, GenerateError};
use crate::git::{DiffInfo, Git, GitError, RepoInfo};
use crate::ui::output::Reporter;
use crate::ui::prompts::{Prompt, PromptError};

/// Errors that end a run.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Git(#[from] GitError),

    /// Content generation failed and no prompt was available.
    #[error("failed to generate {what}: {source}")]
    Generate {
        /// Which field was being generated
        what: &'static str,
        #[source]
        source: GenerateError,
    },

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error(transparent)]
    Execute(#[from] ExecuteError),

    #[error(transparent)]
    Prompt(#[from] PromptError),
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing ahead of the remote trunk.
    UpToDate,
    /// The user declined the plan; nothing changed.
    Declined,
    Executed(ExecutionReport),
}

/// Settings for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowOptions {
    /// Prefix for generated branch names
    pub branch_prefix: String,
    /// Remote that holds the trunk and receives pushes
    pub remote: String,
    /// Merge the pull request after creating it
    pub merge: bool,
    pub merge_method: MergeMethod,
    /// Tags recorded on pull request plans
    pub tags: Vec<String>,
    pub dry_run: bool,
    /// Skip the confirmation prompt
    pub assume_yes: bool,
}

impl Default for WorkflowOptions {
    fn default() -> Self {
        Self {
            branch_prefix: String::new(),
            remote: "origin".to_string(),
            merge: false,
            merge_method: MergeMethod::default(),
            tags: Vec::new(),
            dry_run: false,
            assume_yes: false,
        }
    }
}

/// Wires the inspector, generator, planner and executor together.
pub struct Workflow<'a> {
    git: &'a Git,
    generator: &'a dyn ContentGenerator,
    forge: &'a dyn Forge,
    reporter: &'a dyn Reporter,
    prompt: Option<&'a mut dyn Prompt>,
    options: WorkflowOptions,
}

impl<'a> Workflow<'a> {
    pub fn new(
        git: &'a Git,
        generator: &'a dyn ContentGenerator,
        forge: &'a dyn Forge,
        reporter: &'a dyn Reporter,
        options: WorkflowOptions,
    ) -> Self {
        Self {
            git,
            generator,
            forge,
            reporter,
            prompt: None,
            options,
        }
    }

    /// Ask the user through `prompt` (interactive mode).
    pub fn with_prompt(mut self, prompt: &'a mut dyn Prompt) -> Self {
        self.prompt = Some(prompt);
        self
    }

    /// Run once.
    pub async fn run(&mut self) -> Result<Outcome, WorkflowError> {
        let repo = self.git.repo_info()?;
        info!(
            current = %repo.current_branch,
            trunk = %repo.main_branch,
            generator = self.generator.name(),
            "starting run"
        );

        if repo.is_on_main {
            self.run_on_trunk(&repo).await
        } else {
            self.run_on_feature(&repo).await
        }
    }

    async fn run_on_trunk(&mut self, repo: &RepoInfo) -> Result<Outcome, WorkflowError> {
        self.reporter.info(&format!(
            "You are on the trunk branch '{}'.",
            repo.main_branch
        ));

        let range = self.git.diff_between(
            &self.options.remote,
            &repo.main_branch,
            &repo.current_branch,
        )?;
        if range.is_empty() {
            self.reporter
                .info("No local commits found ahead of origin. Your branch is up to date.");
            return Ok(Outcome::UpToDate);
        }
        self.report_commits(&range);

        let generated = self
            .generator
            .branch_name(&range.diff)
            .await
            .map(|raw| clean_branch_name(&raw));
        let branch_name = self.settle("branch name", "Enter branch name", generated)?;

        let findings = Findings {
            commits_ahead: range.commits.len(),
            branch_on_remote: None,
            content: GeneratedContent {
                branch_name,
                ..Default::default()
            },
        };
        let requirements = self.planner().plan(repo, &findings)?;

        let outcome = self.confirm_and_execute(&requirements).await?;
        if let Outcome::Executed(report) = &outcome {
            if !report.dry_run {
                self.reporter.info(&format!(
                    "Run branchtale again on '{}' to push it and open a pull request.",
                    requirements.branch_name
                ));
            }
        }
        Ok(outcome)
    }

    async fn run_on_feature(&mut self, repo: &RepoInfo) -> Result<Outcome, WorkflowError> {
        let remote = self.options.remote.clone();
        // Measured from the fork point; the remote trunk may have moved on
        // since the branch was cut.
        let fork_point = self
            .git
            .merge_base(&remote, &repo.main_branch, &repo.current_branch)?;
        debug!(branch = %repo.current_branch, fork_point = %fork_point.short(8), "fork point");
        let range = self.git.diff_from(&fork_point, &repo.current_branch)?;
        if range.is_empty() {
            self.reporter.info(&format!(
                "'{}' has no commits ahead of {}/{}. Nothing to open.",
                repo.current_branch, remote, repo.main_branch
            ));
            return Ok(Outcome::UpToDate);
        }
        self.report_commits(&range);

        let on_remote = self
            .git
            .branch_exists_on_remote(&repo.current_branch, &remote)?;
        debug!(branch = %repo.current_branch, on_remote, "remote branch check");

        let generated = self.generator.pr_title(&range.diff).await;
        let title = self.settle("pull request title", "Enter PR title", generated)?;
        let generated = self.generator.pr_description(&range.diff).await;
        let description =
            self.settle("pull request description", "Enter PR description", generated)?;

        let findings = Findings {
            commits_ahead: range.commits.len(),
            branch_on_remote: Some(on_remote),
            content: GeneratedContent {
                title,
                description,
                ..Default::default()
            },
        };
        let requirements = self.planner().plan(repo, &findings)?;

        self.confirm_and_execute(&requirements).await
    }

    fn planner(&self) -> Planner {
        Planner::new(self.options.branch_prefix.as_str())
            .with_merge(self.options.merge)
            .with_tags(self.options.tags.clone())
    }

    fn exec_options(&self) -> ExecOptions {
        ExecOptions {
            dry_run: self.options.dry_run,
            remote: self.options.remote.clone(),
            merge_method: self.options.merge_method,
        }
    }

    fn report_commits(&self, range: &DiffInfo) {
        self.reporter.info(&format!(
            "Found {} local commit(s) ahead of {}:",
            range.commits.len(),
            self.options.remote
        ));
        for (i, commit) in range.commits.iter().enumerate() {
            self.reporter.info(&format!(
                "  {}. {} - {}",
                i + 1,
                commit.oid.short(8),
                commit.summary
            ));
        }
    }

    /// Resolve a generated value, asking the user when generation gave
    /// nothing usable.
    fn settle(
        &mut self,
        what: &'static str,
        question: &str,
        generated: Result<String, GenerateError>,
    ) -> Result<String, WorkflowError> {
        match generated {
            Ok(text) if !text.trim().is_empty() => Ok(text.trim().to_string()),
            Ok(_) => match self.prompt.as_deref_mut() {
                Some(prompt) => Ok(prompt.input(question)?),
                None => Ok(String::new()),
            },
            Err(source) => match self.prompt.as_deref_mut() {
                Some(prompt) => {
                    self.reporter
                        .warn(&format!("Failed to generate {}: {}", what, source));
                    Ok(prompt.input(question)?)
                }
                None => Err(WorkflowError::Generate { what, source }),
            },
        }
    }

    async fn confirm_and_execute(
        &mut self,
        requirements: &Requirements,
    ) -> Result<Outcome, WorkflowError> {
        let options = self.exec_options();

        self.reporter.info("Plan:");
        for action in planned_actions(requirements, &options) {
            self.reporter.info(&format!("  - {}", action));
        }
        self.reporter
            .debug(&format!("plan digest {}", requirements.digest()));

        if !self.options.dry_run && !self.options.assume_yes {
            if let Some(prompt) = self.prompt.as_deref_mut() {
                let question = if requirements.create_branch {
                    format!("Create branch '{}'?", requirements.branch_name)
                } else {
                    format!(
                        "Open pull request '{}' into '{}'?",
                        requirements.pull_request_title, requirements.base_branch
                    )
                };
                if !prompt.confirm(&question, false)? {
                    self.reporter.info("Aborted. Nothing was changed.");
                    return Ok(Outcome::Declined);
                }
            }
        }

        let executor = Executor::new(self.git, self.forge, self.reporter, options);
        let report = executor.execute(requirements).await?;

        if report.dry_run {
            self.reporter.info("Dry run: no changes were made.");
        }
        Ok(Outcome::Executed(report))
    }
}

//! Shared fixtures for integration tests.
//!
//! [`TestRepo`] builds a working repository with a bare repository as its
//! `origin`. The remote URL is a GitHub SSH URL, rewritten by
//! `url.<path>.insteadOf` so that `git push` and `git ls-remote` reach the
//! local bare repository while URL parsing still sees github.com.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Command;

use async_trait::async_trait;
use tempfile::TempDir;

use branchtale::generate::{ContentGenerator, GenerateError};
use branchtale::git::Git;

/// Remote URL every test repository reports.
pub const ORIGIN_URL: &str = "git@github.com:acme/widgets.git";

/// A working repository plus its bare `origin`.
pub struct TestRepo {
    dir: TempDir,
}

impl TestRepo {
    /// Repository on `main` with one commit pushed to origin.
    pub fn new() -> Self {
        Self::with_trunk("main")
    }

    /// Repository whose first branch is `trunk`, pushed to origin.
    pub fn with_trunk(trunk: &str) -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let origin = dir.path().join("origin.git");
        let work = dir.path().join("work");

        run_git(dir.path(), &["init", "--bare", "-b", trunk, "origin.git"]);
        run_git(dir.path(), &["init", "-b", trunk, "work"]);
        run_git(&work, &["config", "user.email", "test@example.com"]);
        run_git(&work, &["config", "user.name", "Test User"]);
        run_git(&work, &["config", "commit.gpgsign", "false"]);
        run_git(&work, &["remote", "add", "origin", ORIGIN_URL]);
        let rewrite = format!("url.{}.insteadOf", origin.display());
        run_git(&work, &["config", &rewrite, ORIGIN_URL]);

        let repo = Self { dir };
        repo.commit_file("README.md", "# Widgets\n", "Initial commit");
        repo.push(trunk);
        repo
    }

    /// The working tree.
    pub fn path(&self) -> PathBuf {
        self.dir.path().join("work")
    }

    /// The bare origin.
    pub fn origin_path(&self) -> PathBuf {
        self.dir.path().join("origin.git")
    }

    /// Open the repository through the crate.
    pub fn git(&self) -> Git {
        Git::open(&self.path()).expect("failed to open test repo")
    }

    /// Write, stage and commit a file; returns the new commit id.
    pub fn commit_file(&self, path: &str, content: &str, message: &str) -> String {
        std::fs::write(self.path().join(path), content).unwrap();
        run_git(&self.path(), &["add", path]);
        run_git(&self.path(), &["commit", "-m", message]);
        self.rev_parse("HEAD")
    }

    /// Remove and commit a file; returns the new commit id.
    pub fn remove_file(&self, path: &str, message: &str) -> String {
        run_git(&self.path(), &["rm", "-q", path]);
        run_git(&self.path(), &["commit", "-m", message]);
        self.rev_parse("HEAD")
    }

    /// Push `branch` to origin (updating `refs/remotes/origin/<branch>`).
    pub fn push(&self, branch: &str) {
        run_git(&self.path(), &["push", "-q", "origin", branch]);
    }

    pub fn checkout_new(&self, branch: &str) {
        run_git(&self.path(), &["checkout", "-q", "-b", branch]);
    }

    pub fn checkout(&self, branch: &str) {
        run_git(&self.path(), &["checkout", "-q", branch]);
    }

    /// Merge `rev` into the current branch with a merge commit.
    pub fn merge(&self, rev: &str) {
        run_git(&self.path(), &["merge", "-q", "--no-ff", "--no-edit", rev]);
    }

    pub fn branch(&self, name: &str) {
        run_git(&self.path(), &["branch", name]);
    }

    pub fn detach(&self) {
        run_git(&self.path(), &["checkout", "-q", "--detach"]);
    }

    pub fn reset_hard(&self, rev: &str) {
        run_git(&self.path(), &["reset", "-q", "--hard", rev]);
    }

    /// Full id of `rev` in the working repository.
    pub fn rev_parse(&self, rev: &str) -> String {
        git_output(&self.path(), &["rev-parse", rev])
    }

    /// Name of the checked-out branch.
    pub fn current_branch(&self) -> String {
        git_output(&self.path(), &["symbolic-ref", "--short", "HEAD"])
    }

    /// Whether the working repository has `refs/heads/<branch>`.
    pub fn has_local_branch(&self, branch: &str) -> bool {
        Command::new("git")
            .args(["rev-parse", "--verify", "-q", &format!("refs/heads/{branch}")])
            .current_dir(self.path())
            .output()
            .expect("git rev-parse failed")
            .status
            .success()
    }

    /// Id of `refs/heads/<branch>` in the bare origin, if present.
    pub fn origin_head(&self, branch: &str) -> Option<String> {
        let output = Command::new("git")
            .args(["rev-parse", "--verify", "-q", &format!("refs/heads/{branch}")])
            .current_dir(self.origin_path())
            .output()
            .expect("git rev-parse failed");
        output
            .status
            .success()
            .then(|| String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// Run a git command and panic on failure.
pub fn run_git(dir: &Path, args: &[&str]) {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .env("GIT_TERMINAL_PROMPT", "0")
        .output()
        .expect("failed to run git");

    if !output.status.success() {
        panic!(
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
    }
}

fn git_output(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("failed to run git");
    assert!(output.status.success(), "git {:?} failed", args);
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Generator returning fixed text.
#[derive(Debug, Clone, Default)]
pub struct FixedGenerator {
    pub branch_name: String,
    pub title: String,
    pub description: String,
}

impl FixedGenerator {
    pub fn branch(name: &str) -> Self {
        Self {
            branch_name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn pull_request(title: &str, description: &str) -> Self {
        Self {
            title: title.to_string(),
            description: description.to_string(),
            ..Default::default()
        }
    }
}

#[async_trait]
impl ContentGenerator for FixedGenerator {
    fn name(&self) -> &'static str {
        "fixed"
    }

    async fn branch_name(&self, _diff: &str) -> Result<String, GenerateError> {
        Ok(self.branch_name.clone())
    }

    async fn pr_title(&self, _diff: &str) -> Result<String, GenerateError> {
        Ok(self.title.clone())
    }

    async fn pr_description(&self, _diff: &str) -> Result<String, GenerateError> {
        Ok(self.description.clone())
    }
}

/// Generator that always fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingGenerator;

#[async_trait]
impl ContentGenerator for FailingGenerator {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn branch_name(&self, _diff: &str) -> Result<String, GenerateError> {
        Err(GenerateError::EmptyResponse)
    }

    async fn pr_title(&self, _diff: &str) -> Result<String, GenerateError> {
        Err(GenerateError::EmptyResponse)
    }

    async fn pr_description(&self, _diff: &str) -> Result<String, GenerateError> {
        Err(GenerateError::EmptyResponse)
    }
}

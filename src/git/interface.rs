//! The Git interface implementation.
//!
//! Local reads and ref/worktree writes go through `git2`. The two
//! operations that talk to the remote (`ls-remote` and `push`) shell out
//! to the `git` CLI so they pick up the user's credential helpers, ssh
//! agent and `insteadOf` rewrites exactly as a manual `git push` would.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use thiserror::Error;
use tracing::debug;

use crate::core::types::{BranchName, Oid, TypeError};

/// Branch names that count as trunk, in priority order.
const TRUNK_CANDIDATES: [&str; 2] = ["main", "master"];

/// Trunk name assumed when no candidate exists locally.
const DEFAULT_TRUNK: &str = "master";

/// Errors from Git operations.
///
/// Every variant that concerns a particular ref, branch or remote names
/// it, so a failed run always tells the user what it was looking at.
#[derive(Debug, Error)]
pub enum GitError {
    /// Not inside a Git repository.
    #[error("not a git repository: {path}")]
    NotARepo {
        /// The path that was searched
        path: PathBuf,
    },

    /// Repository is bare (no working directory).
    #[error("bare repository not supported")]
    BareRepo,

    /// HEAD is unborn or unreadable.
    #[error("cannot resolve HEAD: {message}")]
    HeadUnresolved {
        /// Underlying reason
        message: String,
    },

    /// HEAD does not point at a branch.
    #[error("HEAD is detached; check out a branch first")]
    DetachedHead,

    /// Requested ref does not exist.
    #[error("ref not found: {refname}")]
    RefNotFound {
        /// The ref that was not found
        refname: String,
    },

    /// A ref we were asked to create already exists.
    #[error("ref already exists: {refname}")]
    RefAlreadyExists {
        /// The existing ref
        refname: String,
    },

    /// The branch to check out does not exist locally.
    #[error("branch not found: {branch}")]
    BranchNotFound {
        /// The missing branch
        branch: String,
    },

    /// Walking back from the tip never met the base commit.
    #[error("{base} is not an ancestor of {tip}; histories have diverged")]
    BaseNotReachable {
        /// The base-side ref
        base: String,
        /// The tip-side ref
        tip: String,
    },

    /// Checkout could not update HEAD or the working tree.
    #[error("cannot check out '{branch}': {message}")]
    Worktree {
        /// Branch being checked out
        branch: String,
        /// Underlying reason
        message: String,
    },

    /// No remote with this name is configured.
    #[error("remote not found: {remote}")]
    RemoteNotFound {
        /// The remote name
        remote: String,
    },

    /// The remote refused our credentials.
    #[error("authentication with remote '{remote}' failed: {message}")]
    RemoteAuth {
        /// The remote name
        remote: String,
        /// Output from git
        message: String,
    },

    /// The remote could not be reached.
    #[error("cannot reach remote '{remote}': {message}")]
    RemoteNetwork {
        /// The remote name
        remote: String,
        /// Output from git
        message: String,
    },

    /// The remote rejected a push that would lose commits.
    #[error("push of '{branch}' to '{remote}' rejected: remote has commits not present locally")]
    NonFastForward {
        /// The pushed branch
        branch: String,
        /// The remote name
        remote: String,
    },

    /// Any other failure of a `git` subprocess talking to the remote.
    #[error("git command for remote '{remote}' failed: {message}")]
    RemoteCommand {
        /// The remote name
        remote: String,
        /// Output from git, or the spawn error
        message: String,
    },

    /// A name read from the repository is not a valid branch name.
    #[error("invalid branch name: {message}")]
    InvalidBranchName {
        /// Description of the problem
        message: String,
    },

    /// Internal git2 error.
    #[error("git error: {message}")]
    Internal {
        /// The error message
        message: String,
    },
}

impl GitError {
    fn internal(context: &str, err: git2::Error) -> Self {
        GitError::Internal {
            message: format!("{}: {}", context, err.message()),
        }
    }
}

impl From<git2::Error> for GitError {
    fn from(err: git2::Error) -> Self {
        GitError::Internal {
            message: err.message().to_string(),
        }
    }
}

impl From<TypeError> for GitError {
    fn from(err: TypeError) -> Self {
        GitError::InvalidBranchName {
            message: err.to_string(),
        }
    }
}

/// Snapshot of where the user is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoInfo {
    /// The checked-out branch
    pub current_branch: BranchName,
    /// The detected trunk branch
    pub main_branch: BranchName,
    /// `current_branch == main_branch`
    pub is_on_main: bool,
}

/// Information about a commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    /// The commit OID
    pub oid: Oid,
    /// First line of the commit message
    pub summary: String,
    /// Full commit message
    pub message: String,
    /// Author name
    pub author_name: String,
    /// Author email
    pub author_email: String,
    /// Author timestamp
    pub author_time: chrono::DateTime<chrono::Utc>,
}

/// The change set between a base ref and a tip ref.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffInfo {
    /// Unified patch from the base tree to the tip tree
    pub diff: String,
    /// Commits on the tip side, newest first, base excluded
    pub commits: Vec<CommitInfo>,
}

impl DiffInfo {
    /// True when the tip has nothing the base lacks.
    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }
}

/// The Git interface.
///
/// Every repository read and write in the crate goes through here; no
/// other module imports `git2` or spawns `git`.
///
/// # Example
///
/// ```ignore
/// use branchtale::git::Git;
/// use std::path::Path;
///
/// let git = Git::open(Path::new("."))?;
/// let info = git.repo_info()?;
/// let ahead = git.diff_between("origin", &info.main_branch, &info.current_branch)?;
/// println!("{} commit(s) ahead", ahead.commits.len());
/// ```
pub struct Git {
    repo: git2::Repository,
    ssh_key: Option<PathBuf>,
}

impl std::fmt::Debug for Git {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Git")
            .field("path", &self.repo.path())
            .field("ssh_key", &self.ssh_key)
            .finish()
    }
}

impl Git {
    // =========================================================================
    // Opening
    // =========================================================================

    /// Open the repository containing `path`.
    ///
    /// Uses `git2::Repository::discover`, so `path` can be any directory
    /// within the working tree.
    ///
    /// # Errors
    ///
    /// - [`GitError::NotARepo`] if no repository is found
    /// - [`GitError::BareRepo`] if the repository has no working directory
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let repo = git2::Repository::discover(path).map_err(|_| GitError::NotARepo {
            path: path.to_path_buf(),
        })?;

        if repo.is_bare() {
            return Err(GitError::BareRepo);
        }

        Ok(Self {
            repo,
            ssh_key: None,
        })
    }

    /// Use a specific SSH identity for remote operations.
    pub fn with_ssh_key(mut self, key: Option<PathBuf>) -> Self {
        self.ssh_key = key;
        self
    }

    /// Root of the working tree.
    pub fn work_dir(&self) -> Result<&Path, GitError> {
        self.repo.workdir().ok_or(GitError::BareRepo)
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    /// Current branch and trunk.
    ///
    /// # Errors
    ///
    /// - [`GitError::HeadUnresolved`] for an empty repository or broken HEAD
    /// - [`GitError::DetachedHead`] when no branch is checked out
    pub fn repo_info(&self) -> Result<RepoInfo, GitError> {
        let head = self.repo.head().map_err(|e| GitError::HeadUnresolved {
            message: e.message().to_string(),
        })?;

        if !head.is_branch() {
            return Err(GitError::DetachedHead);
        }

        let name = head.shorthand().ok_or_else(|| GitError::HeadUnresolved {
            message: "branch name is not valid UTF-8".to_string(),
        })?;
        let current_branch = BranchName::new(name)?;

        let branches = self.list_branches()?;
        let main_branch = BranchName::new(detect_trunk(&branches))?;
        let is_on_main = current_branch == main_branch;

        debug!(current = %current_branch, trunk = %main_branch, "inspected HEAD");

        Ok(RepoInfo {
            current_branch,
            main_branch,
            is_on_main,
        })
    }

    /// All local branches, sorted by name.
    pub fn list_branches(&self) -> Result<Vec<BranchName>, GitError> {
        let branches = self
            .repo
            .branches(Some(git2::BranchType::Local))
            .map_err(|e| GitError::internal("listing branches", e))?;

        let mut names = Vec::new();
        for branch in branches {
            let (branch, _) = branch.map_err(|e| GitError::internal("listing branches", e))?;
            if let Some(name) = branch.name().ok().flatten() {
                // Skip names git accepted but we cannot represent
                if let Ok(branch_name) = BranchName::new(name) {
                    names.push(branch_name);
                }
            }
        }

        names.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        Ok(names)
    }

    /// Commits and patch that `local_branch` has over `remote/remote_branch`.
    ///
    /// The patch goes from the remote tree to the local tree. Commits are
    /// every commit reachable from the local tip but not from the remote
    /// commit, newest first.
    ///
    /// # Errors
    ///
    /// - [`GitError::RefNotFound`] if either ref is missing
    /// - [`GitError::BaseNotReachable`] if the remote commit is not in the
    ///   local history
    pub fn diff_between(
        &self,
        remote: &str,
        remote_branch: &BranchName,
        local_branch: &BranchName,
    ) -> Result<DiffInfo, GitError> {
        let base_ref = remote_branch.remote_ref_name(remote);
        let tip_ref = local_branch.ref_name();

        let base = self.peel_commit(&base_ref)?;
        let tip = self.peel_commit(&tip_ref)?;

        self.range(&base, &base_ref, &tip, &tip_ref)
    }

    /// The commit where `local_branch` forked from `remote/remote_branch`.
    ///
    /// # Errors
    ///
    /// - [`GitError::RefNotFound`] if either ref is missing
    /// - [`GitError::BaseNotReachable`] if the histories share no commit
    pub fn merge_base(
        &self,
        remote: &str,
        remote_branch: &BranchName,
        local_branch: &BranchName,
    ) -> Result<Oid, GitError> {
        let base_ref = remote_branch.remote_ref_name(remote);
        let tip_ref = local_branch.ref_name();

        let base = self.peel_commit(&base_ref)?;
        let tip = self.peel_commit(&tip_ref)?;

        match self.repo.merge_base(base.id(), tip.id()) {
            Ok(oid) => Ok(Oid::from(oid)),
            Err(e) if e.code() == git2::ErrorCode::NotFound => {
                Err(GitError::BaseNotReachable {
                    base: base_ref,
                    tip: tip_ref,
                })
            }
            Err(e) => Err(GitError::internal("finding merge base", e)),
        }
    }

    /// Commits and patch that `local_branch` has over the commit `base`.
    ///
    /// Same shape as [`Git::diff_between`], but measured from a fixed
    /// commit, typically a [`Git::merge_base`].
    pub fn diff_from(&self, base: &Oid, local_branch: &BranchName) -> Result<DiffInfo, GitError> {
        let tip_ref = local_branch.ref_name();
        let tip = self.peel_commit(&tip_ref)?;

        let base_oid = git2::Oid::from_str(base.as_str())?;
        let base_commit = self.repo.find_commit(base_oid).map_err(|_| GitError::RefNotFound {
            refname: base.to_string(),
        })?;

        self.range(&base_commit, base.as_str(), &tip, &tip_ref)
    }

    fn range(
        &self,
        base: &git2::Commit<'_>,
        base_label: &str,
        tip: &git2::Commit<'_>,
        tip_label: &str,
    ) -> Result<DiffInfo, GitError> {
        if base.tree_id() == tip.tree_id() {
            debug!(base = %base_label, tip = %tip_label, "trees identical");
            return Ok(DiffInfo::default());
        }

        let base_tree = base.tree()?;
        let tip_tree = tip.tree()?;
        let diff = self
            .repo
            .diff_tree_to_tree(Some(&base_tree), Some(&tip_tree), None)
            .map_err(|e| GitError::internal("computing diff", e))?;
        let diff = patch_text(&diff)?;

        let commits = self
            .commits_since(tip.id(), base.id())?
            .ok_or_else(|| GitError::BaseNotReachable {
                base: base_label.to_string(),
                tip: tip_label.to_string(),
            })?;

        debug!(base = %base_label, tip = %tip_label, commits = commits.len(), "computed range");

        Ok(DiffInfo { diff, commits })
    }

    /// Commits reachable from `tip` but not from `base`, newest first.
    ///
    /// Returns `None` when `base` is not in the history of `tip`.
    fn commits_since(
        &self,
        tip: git2::Oid,
        base: git2::Oid,
    ) -> Result<Option<Vec<CommitInfo>>, GitError> {
        if tip != base && !self.repo.graph_descendant_of(tip, base)? {
            return Ok(None);
        }

        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(git2::Sort::TOPOLOGICAL | git2::Sort::TIME)?;
        revwalk.push(tip)?;
        revwalk.hide(base)?;

        let mut commits = Vec::new();
        for oid in revwalk {
            commits.push(self.commit_info(oid?)?);
        }
        Ok(Some(commits))
    }

    fn commit_info(&self, oid: git2::Oid) -> Result<CommitInfo, GitError> {
        let commit = self.repo.find_commit(oid)?;
        let author = commit.author();
        let author_time = chrono::DateTime::from_timestamp(author.when().seconds(), 0)
            .unwrap_or(chrono::DateTime::UNIX_EPOCH);

        Ok(CommitInfo {
            oid: Oid::from(oid),
            summary: commit.summary().unwrap_or("").to_string(),
            message: commit.message().unwrap_or("").to_string(),
            author_name: author.name().unwrap_or("").to_string(),
            author_email: author.email().unwrap_or("").to_string(),
            author_time,
        })
    }

    fn peel_commit(&self, refname: &str) -> Result<git2::Commit<'_>, GitError> {
        let reference = self.repo.find_reference(refname).map_err(|e| match e.code() {
            git2::ErrorCode::NotFound | git2::ErrorCode::InvalidSpec => GitError::RefNotFound {
                refname: refname.to_string(),
            },
            _ => GitError::internal(refname, e),
        })?;

        reference
            .peel_to_commit()
            .map_err(|e| GitError::internal(refname, e))
    }

    /// Whether `remote` has exactly `refs/heads/<branch>`.
    ///
    /// Never reports an unreachable or unauthenticated remote as "absent";
    /// those come back as [`GitError::RemoteAuth`], [`GitError::RemoteNetwork`]
    /// or [`GitError::RemoteCommand`].
    pub fn branch_exists_on_remote(
        &self,
        branch: &BranchName,
        remote: &str,
    ) -> Result<bool, GitError> {
        let output = self.run_remote_git(remote, &["ls-remote", "--heads", remote])?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(classify_remote_failure(remote, None, &stderr));
        }

        let listing = String::from_utf8_lossy(&output.stdout);
        let exists = remote_heads_contain(&listing, branch);
        debug!(branch = %branch, remote = %remote, exists, "checked remote heads");
        Ok(exists)
    }

    /// Configured URL of `remote`, as written in the repository config.
    pub fn remote_url(&self, remote: &str) -> Result<String, GitError> {
        let config = self.repo.config()?;
        match config.get_string(&format!("remote.{remote}.url")) {
            Ok(url) => Ok(url),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Err(GitError::RemoteNotFound {
                remote: remote.to_string(),
            }),
            Err(e) => Err(GitError::internal("reading remote url", e)),
        }
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Create `name` at HEAD without checking it out.
    pub fn create_branch(&self, name: &BranchName) -> Result<(), GitError> {
        let refname = name.ref_name();
        if self.repo.find_reference(&refname).is_ok() {
            return Err(GitError::RefAlreadyExists { refname });
        }

        let head = self
            .repo
            .head()
            .and_then(|h| h.peel_to_commit())
            .map_err(|e| GitError::HeadUnresolved {
                message: e.message().to_string(),
            })?;

        self.repo
            .branch(name.as_str(), &head, false)
            .map_err(|e| match e.code() {
                git2::ErrorCode::Exists => GitError::RefAlreadyExists {
                    refname: refname.clone(),
                },
                _ => GitError::internal(&refname, e),
            })?;

        debug!(branch = %name, "created branch");
        Ok(())
    }

    /// Switch HEAD and the working tree to `name`.
    ///
    /// Uses a safe checkout: local modifications that would be overwritten
    /// abort the checkout instead of being discarded.
    pub fn checkout_branch(&self, name: &BranchName) -> Result<(), GitError> {
        let refname = name.ref_name();
        let reference =
            self.repo
                .find_reference(&refname)
                .map_err(|_| GitError::BranchNotFound {
                    branch: name.to_string(),
                })?;

        let worktree_err = |e: git2::Error| GitError::Worktree {
            branch: name.to_string(),
            message: e.message().to_string(),
        };

        let target = reference
            .peel(git2::ObjectType::Commit)
            .map_err(worktree_err)?;

        let mut opts = git2::build::CheckoutBuilder::new();
        opts.safe();
        self.repo
            .checkout_tree(&target, Some(&mut opts))
            .map_err(worktree_err)?;
        self.repo.set_head(&refname).map_err(worktree_err)?;

        debug!(branch = %name, "checked out branch");
        Ok(())
    }

    /// Push `refs/heads/<branch>` to the same ref on `remote`.
    pub fn push_branch(&self, branch: &BranchName, remote: &str) -> Result<(), GitError> {
        let refspec = format!("{0}:{0}", branch.ref_name());
        let output = self.run_remote_git(remote, &["push", remote, &refspec])?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(classify_remote_failure(remote, Some(branch), &stderr));
        }

        debug!(branch = %branch, remote = %remote, "pushed branch");
        Ok(())
    }

    /// Run `git` in the working tree for a remote operation.
    fn run_remote_git(&self, remote: &str, args: &[&str]) -> Result<Output, GitError> {
        let mut cmd = Command::new("git");
        cmd.args(args)
            .current_dir(self.work_dir()?)
            .env("GIT_TERMINAL_PROMPT", "0");

        if let Some(key) = &self.ssh_key {
            cmd.env(
                "GIT_SSH_COMMAND",
                format!("ssh -i {} -o IdentitiesOnly=yes", key.display()),
            );
        }

        debug!(?args, "running git");
        cmd.output().map_err(|e| GitError::RemoteCommand {
            remote: remote.to_string(),
            message: format!("failed to run git: {e}"),
        })
    }
}

/// Render a diff as unified patch text.
fn patch_text(diff: &git2::Diff<'_>) -> Result<String, GitError> {
    let mut text = String::new();
    diff.print(git2::DiffFormat::Patch, |_delta, _hunk, line| {
        if matches!(line.origin(), '+' | '-' | ' ') {
            text.push(line.origin());
        }
        text.push_str(&String::from_utf8_lossy(line.content()));
        true
    })
    .map_err(|e| GitError::internal("rendering diff", e))?;
    Ok(text)
}

/// Pick the trunk from a set of local branches.
///
/// Enumeration order never matters: names are sorted and `main` wins
/// over `master`. With neither present the trunk is `master`.
pub fn detect_trunk(branches: &[BranchName]) -> &'static str {
    let mut names: Vec<&str> = branches.iter().map(BranchName::as_str).collect();
    names.sort_unstable();

    TRUNK_CANDIDATES
        .iter()
        .copied()
        .find(|candidate| names.binary_search(candidate).is_ok())
        .unwrap_or(DEFAULT_TRUNK)
}

/// Whether `git ls-remote --heads` output lists exactly `refs/heads/<branch>`.
pub fn remote_heads_contain(listing: &str, branch: &BranchName) -> bool {
    let wanted = branch.ref_name();
    listing
        .lines()
        .filter_map(|line| line.split_whitespace().nth(1))
        .any(|refname| refname == wanted)
}

/// Map the stderr of a failed remote `git` command to an error.
///
/// `branch` is set for pushes, where a rejection means non-fast-forward.
pub fn classify_remote_failure(
    remote: &str,
    branch: Option<&BranchName>,
    stderr: &str,
) -> GitError {
    const AUTH: [&str; 7] = [
        "permission denied",
        "authentication failed",
        "could not read username",
        "could not read password",
        "returned error: 403",
        "returned error: 401",
        "repository not found",
    ];
    const NETWORK: [&str; 7] = [
        "could not resolve host",
        "connection refused",
        "connection timed out",
        "operation timed out",
        "network is unreachable",
        "connection reset",
        "could not connect",
    ];
    const REJECTED: [&str; 3] = ["non-fast-forward", "[rejected]", "fetch first"];

    let lower = stderr.to_lowercase();
    let message = stderr.trim().to_string();
    let remote = remote.to_string();

    if let Some(branch) = branch {
        if REJECTED.iter().any(|m| lower.contains(m)) {
            return GitError::NonFastForward {
                branch: branch.to_string(),
                remote,
            };
        }
    }
    if AUTH.iter().any(|m| lower.contains(m)) {
        return GitError::RemoteAuth { remote, message };
    }
    if NETWORK.iter().any(|m| lower.contains(m)) {
        return GitError::RemoteNetwork { remote, message };
    }
    GitError::RemoteCommand { remote, message }
}

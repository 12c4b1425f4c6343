//! git
//!
//! Single interface for all Git operations.
//!
//! # Architecture
//!
//! This module is the **only doorway** to Git. Nothing else in the crate
//! opens a repository or spawns the `git` binary; outside this module
//! `git2` only appears in the `Oid` conversion.
//!
//! # Responsibilities
//!
//! - Repository discovery and opening
//! - Current branch and trunk detection
//! - Commit ranges and unified diffs between a remote-tracking ref and a
//!   local branch
//! - Remote branch existence (`git ls-remote`)
//! - Branch creation, checkout and push
//! - Remote URL lookup
//!
//! # Invariants
//!
//! - Trunk detection is deterministic: `main` beats `master` no matter the
//!   order branches are enumerated in
//! - Commit ranges are newest-first and never include the base commit
//! - Remote failures are classified (auth, network, rejected), never
//!   reported as "branch absent"
//!
//! # Example
//!
//! ```ignore
//! use branchtale::git::Git;
//! use std::path::Path;
//!
//! let git = Git::open(Path::new("."))?;
//! let info = git.repo_info()?;
//! if !git.branch_exists_on_remote(&info.current_branch, "origin")? {
//!     git.push_branch(&info.current_branch, "origin")?;
//! }
//! ```

mod interface;

pub use interface::{
    classify_remote_failure, detect_trunk, remote_heads_contain, CommitInfo, DiffInfo, Git,
    GitError, RepoInfo,
};

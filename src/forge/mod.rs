//! forge
//!
//! Abstraction for the pull-request provider.
//!
//! # Architecture
//!
//! The `Forge` trait defines the interface the executor uses to open and
//! merge pull requests. Forge operations only run after the local steps of
//! a plan (branch creation, push) have succeeded; a forge failure never
//! rolls those back.
//!
//! # Modules
//!
//! - `traits`: Core `Forge` trait and request/response types
//! - [`github`]: GitHub implementation over the REST API, plus remote URL
//!   parsing
//! - [`mock`]: Mock implementation for deterministic testing
//!
//! # Example
//!
//! ```ignore
//! use branchtale::forge::github::{parse_github_url, GitHubForge};
//! use branchtale::forge::{CreatePrRequest, Forge};
//!
//! let slug = parse_github_url("git@github.com:acme/widgets.git")?;
//! let forge = GitHubForge::new(token);
//! let pr = forge.create_pr(CreatePrRequest {
//!     owner: slug.owner,
//!     repo: slug.repo,
//!     title: "Add retry logic".to_string(),
//!     body: String::new(),
//!     head: "fix/timeout".to_string(),
//!     base: "main".to_string(),
//! }).await?;
//!
//! println!("Created PR #{}: {}", pr.number, pr.url);
//! ```

pub mod github;
pub mod mock;
mod traits;

pub use github::{parse_github_url, RemoteUrlError};
pub use traits::*;

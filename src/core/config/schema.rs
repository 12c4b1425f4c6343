//! core::config::schema
//!
//! Configuration file schema.
//!
//! # Location
//!
//! Searched in order, first existing file wins:
//! 1. `$BRANCHTALE_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/branchtale/config.toml`
//! 3. `~/.branchtale/config.toml`
//!
//! # Validation
//!
//! Unknown keys are rejected at parse time. Enumerated values
//! (`content_generation`, `merge_method`) and the branch prefix are
//! checked after merging with the environment, in [`super::Config`].

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// File configuration (user scope).
///
/// Every field is optional; absent fields fall through to the
/// environment or to built-in defaults.
///
/// # Example
///
/// ```toml
/// branch_prefix = "feat/"
/// content_generation = "yandex"
/// merge_method = "squash"
/// interactive = true
/// ssh_key = "~/.ssh/id_ed25519_work"
/// github_api_base = "https://github.example.com/api/v3"
/// yandex_model = "yandexgpt/latest"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Prefix prepended to generated branch names
    pub branch_prefix: Option<String>,

    /// `local` or `yandex`
    pub content_generation: Option<String>,

    /// `merge`, `squash` or `rebase`
    pub merge_method: Option<String>,

    /// Whether prompting is allowed
    pub interactive: Option<bool>,

    /// SSH identity used for `ls-remote` and `push`
    pub ssh_key: Option<PathBuf>,

    /// GitHub REST API base URL
    pub github_api_base: Option<String>,

    /// Yandex model path, the part after `gpt://<folder>/`
    pub yandex_model: Option<String>,
}

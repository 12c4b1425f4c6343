//! core::config
//!
//! Configuration schema and loading.
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Config file (see [`schema`] for locations)
//! 3. Environment variables
//! 4. CLI flags, passed in as [`Overrides`]
//!
//! # Environment
//!
//! | Variable | Meaning |
//! |---|---|
//! | `GITHUB_TOKEN` | GitHub token (required) |
//! | `CONTENT_GENERATION` | `local` or `yandex` |
//! | `YANDEX_GPT_API_KEY` | Yandex API key (required for `yandex`) |
//! | `YANDEX_FOLDER_ID` | Yandex folder (required for `yandex`) |
//! | `BRANCHTALE_BRANCH_PREFIX` | prefix for generated branch names |
//! | `BRANCHTALE_SSH_KEY` | SSH identity for remote operations |
//! | `BRANCHTALE_CONFIG` | explicit config file path |
//!
//! Empty variables count as unset. Environment lookup is a closure so tests
//! never touch the process environment.
//!
//! # Example
//!
//! ```no_run
//! use branchtale::core::config::{Config, Overrides};
//!
//! let config = Config::load(&Overrides::default()).unwrap();
//! println!("Content generation: {}", config.content_generation);
//! println!("Merge method: {}", config.merge_method);
//! ```

pub mod schema;

pub use schema::FileConfig;

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;

use crate::core::types::BranchName;
use crate::forge::github::DEFAULT_API_BASE;
use crate::forge::MergeMethod;

/// Default Yandex model path.
pub const DEFAULT_YANDEX_MODEL: &str = "yandexgpt-lite/latest";

/// Remote every operation targets.
pub const DEFAULT_REMOTE: &str = "origin";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("{0} environment variable is required")]
    MissingEnv(&'static str),

    #[error("local content generation requires interactive mode")]
    LocalRequiresInteractive,

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// How branch names, titles and descriptions are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentGeneration {
    /// The user types everything at a prompt
    #[default]
    Local,
    /// Yandex GPT proposes, the user may still be asked on failure
    Yandex,
}

impl std::fmt::Display for ContentGeneration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentGeneration::Local => write!(f, "local"),
            ContentGeneration::Yandex => write!(f, "yandex"),
        }
    }
}

impl FromStr for ContentGeneration {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(ContentGeneration::Local),
            "yandex" => Ok(ContentGeneration::Yandex),
            other => Err(ConfigError::InvalidValue(format!(
                "unknown content generation '{}', must be one of: local, yandex",
                other
            ))),
        }
    }
}

/// Credentials for the Yandex completion API.
#[derive(Clone, PartialEq, Eq)]
pub struct YandexCredentials {
    /// `YANDEX_GPT_API_KEY`
    pub api_key: String,
    /// `YANDEX_FOLDER_ID`
    pub folder_id: String,
}

impl std::fmt::Debug for YandexCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YandexCredentials")
            .field("folder_id", &self.folder_id)
            .finish_non_exhaustive()
    }
}

/// Values supplied on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub branch_prefix: Option<String>,
    pub content_generation: Option<String>,
    pub merge_method: Option<String>,
    pub interactive: Option<bool>,
}

/// Merged configuration from all sources.
#[derive(Clone)]
pub struct Config {
    /// GitHub token
    pub github_token: String,
    /// Selected content generator
    pub content_generation: ContentGeneration,
    /// Present exactly when `content_generation` is `Yandex`
    pub yandex: Option<YandexCredentials>,
    /// Model path for the Yandex generator
    pub yandex_model: String,
    /// Prefix for generated branch names (may be empty)
    pub branch_prefix: String,
    /// How `--merge` merges
    pub merge_method: MergeMethod,
    /// Whether prompting is allowed
    pub interactive: bool,
    /// SSH identity for remote operations
    pub ssh_key: Option<PathBuf>,
    /// GitHub REST API base URL
    pub github_api_base: String,
    /// Remote name
    pub remote: String,
    /// Config file this was loaded from, if any
    loaded_from: Option<PathBuf>,
}

// Custom Debug to avoid exposing the token
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("content_generation", &self.content_generation)
            .field("yandex", &self.yandex)
            .field("yandex_model", &self.yandex_model)
            .field("branch_prefix", &self.branch_prefix)
            .field("merge_method", &self.merge_method)
            .field("interactive", &self.interactive)
            .field("ssh_key", &self.ssh_key)
            .field("github_api_base", &self.github_api_base)
            .field("remote", &self.remote)
            .field("loaded_from", &self.loaded_from)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Load configuration from the process environment and default locations.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be parsed, or if
    /// the merged values fail validation.
    pub fn load(overrides: &Overrides) -> Result<Config, ConfigError> {
        Self::load_with(|key| std::env::var(key).ok(), overrides)
    }

    /// Load configuration with an injected environment lookup.
    pub fn load_with<F>(env: F, overrides: &Overrides) -> Result<Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let home = dirs::home_dir();
        let (file, path) = match Self::find_config_file(&env, home.as_deref()) {
            Some(path) => (Self::read_file(&path)?, Some(path)),
            None => (FileConfig::default(), None),
        };

        let mut config = Self::resolve(file, env, overrides)?;
        config.loaded_from = path;
        Ok(config)
    }

    /// Locate the config file.
    ///
    /// An explicit `$BRANCHTALE_CONFIG` is returned even if missing so a
    /// mistyped path is reported rather than silently ignored.
    pub fn find_config_file<F>(env: &F, home: Option<&Path>) -> Option<PathBuf>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = non_empty(env("BRANCHTALE_CONFIG")) {
            return Some(PathBuf::from(path));
        }

        if let Some(xdg_home) = non_empty(env("XDG_CONFIG_HOME")) {
            let path = PathBuf::from(xdg_home).join("branchtale/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        let path = home?.join(".branchtale/config.toml");
        path.exists().then_some(path)
    }

    /// Read and parse a config file.
    pub fn read_file(path: &Path) -> Result<FileConfig, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Merge file values, environment and CLI overrides, then validate.
    pub fn resolve<F>(
        file: FileConfig,
        env: F,
        overrides: &Overrides,
    ) -> Result<Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| non_empty(env(key));

        let github_token = var("GITHUB_TOKEN").ok_or(ConfigError::MissingEnv("GITHUB_TOKEN"))?;

        let content_generation = match overrides
            .content_generation
            .clone()
            .or_else(|| var("CONTENT_GENERATION"))
            .or(file.content_generation)
        {
            Some(name) => name.parse()?,
            None => ContentGeneration::default(),
        };

        let yandex = match content_generation {
            ContentGeneration::Yandex => Some(YandexCredentials {
                api_key: var("YANDEX_GPT_API_KEY")
                    .ok_or(ConfigError::MissingEnv("YANDEX_GPT_API_KEY"))?,
                folder_id: var("YANDEX_FOLDER_ID")
                    .ok_or(ConfigError::MissingEnv("YANDEX_FOLDER_ID"))?,
            }),
            ContentGeneration::Local => None,
        };

        let interactive = overrides.interactive.or(file.interactive).unwrap_or(true);
        if content_generation == ContentGeneration::Local && !interactive {
            return Err(ConfigError::LocalRequiresInteractive);
        }

        let merge_method = match overrides.merge_method.clone().or(file.merge_method) {
            Some(name) => MergeMethod::from_str(&name).map_err(ConfigError::InvalidValue)?,
            None => MergeMethod::default(),
        };

        let branch_prefix = overrides
            .branch_prefix
            .clone()
            .or_else(|| var("BRANCHTALE_BRANCH_PREFIX"))
            .or(file.branch_prefix)
            .unwrap_or_default();
        validate_prefix(&branch_prefix)?;

        let ssh_key = var("BRANCHTALE_SSH_KEY")
            .map(PathBuf::from)
            .or(file.ssh_key)
            .map(|p| expand_home(&p));

        Ok(Config {
            github_token,
            content_generation,
            yandex,
            yandex_model: file
                .yandex_model
                .unwrap_or_else(|| DEFAULT_YANDEX_MODEL.to_string()),
            branch_prefix,
            merge_method,
            interactive,
            ssh_key,
            github_api_base: file
                .github_api_base
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            remote: DEFAULT_REMOTE.to_string(),
            loaded_from: None,
        })
    }

    /// Get the path to the loaded config file.
    pub fn loaded_from(&self) -> Option<&Path> {
        self.loaded_from.as_deref()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// A prefix must still yield a valid branch name once a name is appended.
fn validate_prefix(prefix: &str) -> Result<(), ConfigError> {
    if prefix.is_empty() {
        return Ok(());
    }
    BranchName::new(format!("{prefix}x"))
        .map(|_| ())
        .map_err(|e| ConfigError::InvalidValue(format!("branch prefix '{prefix}': {e}")))
}

/// Expand a leading `~/` to the home directory.
fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

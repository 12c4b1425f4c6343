//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Flags
//!
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--cwd <path>`: Run as if in that directory
//! - `--verbose` / `-v`: Debug logging and plan detail
//! - `--quiet` / `-q`: Minimal output; implies `--no-interactive`
//! - `--no-interactive`: Never prompt

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::core::config::{ContentGeneration, Overrides};
use crate::forge::MergeMethod;

/// branchtale - turn local commits into a branch and a pull request
#[derive(Parser, Debug)]
#[command(name = "branchtale")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "\
WORKFLOW EXAMPLES:
    # On main with unpushed commits: move them onto a new feature branch
    branchtale --prefix feat/

    # On the feature branch: push it and open a pull request
    branchtale

    # See what would happen without touching anything
    branchtale --dry-run

    # Open, merge with a squash, and show the PR in the browser
    branchtale --merge --merge-method squash --open")]
pub struct Cli {
    /// Branch name prefix (e.g. 'feat/')
    #[arg(short, long, value_name = "PREFIX")]
    pub prefix: Option<String>,

    /// Where branch names, titles and descriptions come from
    #[arg(short, long, value_name = "MODE", value_parser = parse_content_generation)]
    pub content_generation: Option<ContentGeneration>,

    /// Plan and report, mutate nothing
    #[arg(long)]
    pub dry_run: bool,

    /// Merge the pull request after creating it
    #[arg(long)]
    pub merge: bool,

    /// How to merge with --merge
    #[arg(long, value_name = "METHOD", value_parser = parse_merge_method)]
    pub merge_method: Option<MergeMethod>,

    /// Pull request tag recorded in the plan (repeatable)
    #[arg(long = "tag", value_name = "TAG")]
    pub tags: Vec<String>,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Open the created pull request in a browser
    #[arg(long)]
    pub open: bool,

    /// Never prompt
    #[arg(long, global = true)]
    pub no_interactive: bool,

    /// Run as if branchtale was started in this directory
    #[arg(long, global = true, value_name = "PATH")]
    pub cwd: Option<PathBuf>,

    /// Debug logging and plan detail
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Minimal output; implies --no-interactive
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }

    /// Configuration overrides carried by flags.
    ///
    /// Interactivity is only overridden downward: flags can switch prompts
    /// off but never force them on.
    pub fn overrides(&self) -> Overrides {
        Overrides {
            branch_prefix: self.prefix.clone(),
            content_generation: self.content_generation.map(|mode| mode.to_string()),
            merge_method: self.merge_method.map(|method| method.to_string()),
            interactive: (self.no_interactive || self.quiet).then_some(false),
        }
    }
}

fn parse_content_generation(value: &str) -> Result<ContentGeneration, String> {
    value.parse().map_err(|e: crate::core::config::ConfigError| e.to_string())
}

fn parse_merge_method(value: &str) -> Result<MergeMethod, String> {
    value.parse()
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate shell completion scripts
    #[command(after_help = "\
EXAMPLES:
    branchtale completion bash > ~/.local/share/bash-completion/completions/branchtale
    branchtale completion zsh > \"${fpath[1]}/_branchtale\"")]
    Completion {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

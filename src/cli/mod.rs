//! cli
//!
//! Command-line interface layer for branchtale.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments
//! - Initialise logging
//! - Load configuration and build the collaborators (repository, content
//!   generator, GitHub client, reporter, prompter)
//! - Drive one workflow run on a current-thread runtime
//!
//! # Architecture
//!
//! The CLI layer is thin. Every decision about what to do lives in
//! [`crate::engine`]; this module only wires things up and turns the
//! outcome into an exit status.

pub mod args;

pub use args::{Cli, Command, Shell};

use anyhow::{Context, Result};
use clap::CommandFactory;
use clap_complete::{generate, shells};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::core::config::Config;
use crate::engine::{Outcome, Workflow, WorkflowOptions};
use crate::forge::github::GitHubForge;
use crate::generate::create_generator;
use crate::git::Git;
use crate::ui::output::{ConsoleReporter, Reporter, Verbosity};
use crate::ui::prompts::Prompter;

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();
    init_logging(cli.verbose);

    match cli.command {
        Some(Command::Completion { shell }) => completion(shell),
        None => run_workflow(&cli),
    }
}

/// Install the tracing subscriber.
///
/// `RUST_LOG` wins; otherwise `--verbose` turns on debug output for this
/// crate and everything else stays at warnings. Logs go to stderr.
fn init_logging(verbose: bool) {
    let fallback = if verbose { "branchtale=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}

fn run_workflow(cli: &Cli) -> Result<()> {
    let config = Config::load(&cli.overrides())?;
    debug!(?config, "configuration loaded");

    let cwd = match &cli.cwd {
        Some(path) => path.clone(),
        None => std::env::current_dir().context("failed to read current directory")?,
    };
    let git = Git::open(&cwd)?.with_ssh_key(config.ssh_key.clone());

    let generator = create_generator(&config);
    let forge = GitHubForge::with_api_base(
        config.github_token.clone(),
        config.github_api_base.clone(),
    );
    let reporter = ConsoleReporter::new(Verbosity::from_flags(cli.quiet, cli.verbose));
    let mut prompter = Prompter::stdio();

    let options = WorkflowOptions {
        branch_prefix: config.branch_prefix.clone(),
        remote: config.remote.clone(),
        merge: cli.merge,
        merge_method: config.merge_method,
        tags: cli.tags.clone(),
        dry_run: cli.dry_run,
        assume_yes: cli.yes,
    };

    let mut workflow = Workflow::new(&git, generator.as_ref(), &forge, &reporter, options);
    if config.interactive {
        workflow = workflow.with_prompt(&mut prompter);
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    let outcome = runtime.block_on(workflow.run())?;

    if cli.open {
        open_pull_request(&outcome, &reporter);
    }
    Ok(())
}

fn open_pull_request(outcome: &Outcome, reporter: &dyn Reporter) {
    let Outcome::Executed(report) = outcome else {
        return;
    };
    let Some(pr) = &report.pull_request else {
        return;
    };

    if let Err(e) = open::that(&pr.url) {
        reporter.warn(&format!("Could not open {} in a browser: {}", pr.url, e));
    }
}

/// Generate shell completion scripts.
fn completion(shell: Shell) -> Result<()> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    let mut out = std::io::stdout();

    match shell {
        Shell::Bash => generate(shells::Bash, &mut cmd, &name, &mut out),
        Shell::Zsh => generate(shells::Zsh, &mut cmd, &name, &mut out),
        Shell::Fish => generate(shells::Fish, &mut cmd, &name, &mut out),
        Shell::PowerShell => generate(shells::PowerShell, &mut cmd, &name, &mut out),
    }

    Ok(())
}

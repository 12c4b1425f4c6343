//! branchtale - turn local commits into a branch and a GitHub pull request
//!
//! Run on the trunk with unpushed commits and branchtale moves them onto a
//! new feature branch with a generated name. Run on a feature branch and it
//! pushes the branch and opens a pull request with a generated title and
//! description.
//!
//! # Architecture
//!
//! The codebase follows a strict layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, wires collaborators)
//! - [`engine`] - Orchestrates Inspect -> Plan -> Execute
//! - [`core`] - Domain types, naming and configuration
//! - [`git`] - Single interface for all Git operations
//! - [`forge`] - Pull-request provider abstraction (GitHub)
//! - [`generate`] - Content generation (manual or Yandex GPT)
//! - [`ui`] - Reporting and prompting
//!
//! # Correctness Invariants
//!
//! 1. Every mutation is described by a plan before it happens
//! 2. A dry run walks the same steps as a live run, minus the mutations
//! 3. Plans are validated before the first mutation
//! 4. The first failure ends the run; nothing is retried or rolled back

pub mod cli;
pub mod core;
pub mod engine;
pub mod forge;
pub mod generate;
pub mod git;
pub mod ui;

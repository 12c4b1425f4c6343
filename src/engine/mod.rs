//! engine
//!
//! Orchestrates a run: Inspect -> Plan -> Execute.
//!
//! # Architecture
//!
//! - [`plan`]: turns repository state and generated content into
//!   [`plan::Requirements`], with no I/O
//! - [`exec`]: performs (or simulates) a plan against the repository and
//!   the pull-request provider
//! - [`workflow`]: the glue that inspects, generates, plans, confirms and
//!   executes
//!
//! Data flows one way. A failed plan or execution aborts the run; no stage
//! is retried and nothing is persisted between runs.
//!
//! # Example
//!
//! ```ignore
//! use branchtale::engine::workflow::{Workflow, WorkflowOptions};
//!
//! let mut workflow = Workflow::new(&git, generator.as_ref(), &forge, &reporter, options)
//!     .with_prompt(&mut prompter);
//! let outcome = workflow.run().await?;
//! ```

pub mod exec;
pub mod plan;
pub mod workflow;

pub use exec::{Action, ExecOptions, ExecuteError, ExecutionReport, Executor};
pub use plan::{Findings, GeneratedContent, PlanError, Planner, Requirements};
pub use workflow::{Outcome, Workflow, WorkflowError, WorkflowOptions};

//! ui
//!
//! User interaction utilities.
//!
//! # Modules
//!
//! - [`prompts`] - Interactive prompts and confirmations
//! - [`output`] - Reporting user-facing messages
//!
//! # Design
//!
//! The engine never prints or reads the terminal itself. It is handed a
//! [`output::Reporter`] and, in interactive mode, a [`prompts::Prompt`],
//! so every stage runs the same under test as in the terminal.

pub mod output;
pub mod prompts;

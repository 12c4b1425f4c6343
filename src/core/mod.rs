//! core
//!
//! Core domain types and configuration for branchtale.
//!
//! # Modules
//!
//! - [`types`] - Strong types: BranchName, Oid
//! - [`naming`] - Turning generated text into branch names
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Schemas are strict and self-describing

pub mod config;
pub mod naming;
pub mod types;

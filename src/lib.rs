#![forbid(unsafe_code)]
//! crossrun: cross-engine test harness
//!
//! Assembles self-contained test programs from independently authored fragments, runs each one on every
//! installed standalone script engine and aggregates the reported spec results.
//!
//! ## Panic Policy
//!
//! This codebase follows explicit error handling:
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` module enforces
//!   `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.
//!
//! - **True invariants**: If a panic represents a harness bug (logic error), use `.expect("INVARIANT: reason")` with
//!   a clear explanation.

pub mod cli;
pub mod harness;
pub mod version;

pub use crossrun_core::protocol;
pub use crossrun_syntax::preprocess;

pub use harness::assembler::{AssembledProgram, TestAssembler};
pub use harness::config::HarnessConfig;
pub use harness::report::{JsonReporter, Report, Reporter, TextReporter, aggregate};
pub use harness::runner::{EngineExecutor, ExecutionOutcome, ProcessExecutor, run_matrix};
pub use harness::{Harness, HarnessError};

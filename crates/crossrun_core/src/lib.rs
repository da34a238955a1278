//! Provide shared vocabulary and the engine result protocol for the crossrun harness.
//!
//! This crate is intentionally small and dependency-light. It contains deterministic, pure definitions that both:
//! - the syntax frontend can use to classify script tokens (keywords, punctuation), and
//! - the harness can use to assemble programs, configure bundles and interpret engine output.
//!
//! ## Notes
//!
//! - This is a “vocabulary core” crate: **no IO**, no global state, no process handling.
//! - Current scope: script keyword/punctuation registries, the fragment-role registry that fixes assembly order,
//!   the bundler plugin registry and the versioned spec-result payload schema.

pub mod fragments;
pub mod lang;
pub mod plugins;
pub mod protocol;

pub use fragments::FragmentRole;
pub use plugins::{Plugin, PluginChain, PluginChainError};
pub use protocol::{FailedExpectation, PayloadError, SpecResult, SpecStatus, parse_payload};

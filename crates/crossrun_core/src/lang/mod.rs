//! Script language vocabulary used by the syntax frontend.
//!
//! Registries are `const` tables: a stable id plus canonical spelling and a few classification flags.
//! They do not tokenize anything themselves.

pub mod keywords;
pub mod operators;
pub mod punctuation;

//! Fragment-role vocabulary.
//!
//! Every assembled program is a concatenation of fragments, each with a fixed semantic role. The order of
//! [`FRAGMENT_ROLES`] *is* the assembly order: later fragments may rely on globals established by earlier ones.
//!
//! ## Notes
//! - Only [`FragmentRole::SpecUnderTest`] varies between assembled programs; every other role is shared.
//! - [`FragmentRole::ExecutorDriver`] is always last; it starts the framework once everything is defined.
//!
//! ## Examples
//! ```rust
//! use crossrun_core::fragments::{self, FragmentRole};
//!
//! assert_eq!(fragments::from_str("reporter"), Some(FragmentRole::Reporter));
//! assert_eq!(fragments::canonical_order().last(), Some(&FragmentRole::ExecutorDriver));
//! ```

/// Stable identifier for each fragment role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FragmentRole {
    /// Host environment definitions the framework expects (timers, console shims).
    EnvironmentShim,
    /// Bundled test framework core plus its setup.
    FrameworkSetup,
    /// Bundled expectation/assertion library.
    ExpectationLibrary,
    /// Reporter printing results as a JSON array.
    Reporter,
    /// Bundled library under test.
    LibraryUnderTest,
    /// Preprocessed spec file (varies per program).
    SpecUnderTest,
    /// Starts the framework run.
    ExecutorDriver,
}

/// Metadata for a fragment role.
#[derive(Debug, Clone, Copy)]
pub struct FragmentRoleInfo {
    pub id: FragmentRole,
    pub canonical: &'static str,
    pub description: &'static str,
    /// Whether the fragment text is identical for every assembled program.
    pub shared: bool,
}

/// Registry of all fragment roles, in assembly order.
pub const FRAGMENT_ROLES: &[FragmentRoleInfo] = &[
    info(
        FragmentRole::EnvironmentShim,
        "environment",
        "host definitions required by the framework in an embedded engine",
        true,
    ),
    info(
        FragmentRole::FrameworkSetup,
        "framework",
        "bundled framework core and setup",
        true,
    ),
    info(
        FragmentRole::ExpectationLibrary,
        "expect",
        "bundled assertion library exposing a global `expect`",
        true,
    ),
    info(
        FragmentRole::Reporter,
        "reporter",
        "reporter writing spec results as JSON to stdout",
        true,
    ),
    info(
        FragmentRole::LibraryUnderTest,
        "library",
        "bundled library under test",
        true,
    ),
    info(
        FragmentRole::SpecUnderTest,
        "spec",
        "preprocessed spec file",
        false,
    ),
    info(
        FragmentRole::ExecutorDriver,
        "driver",
        "framework execution entry point",
        true,
    ),
];

const fn info(id: FragmentRole, canonical: &'static str, description: &'static str, shared: bool) -> FragmentRoleInfo {
    FragmentRoleInfo {
        id,
        canonical,
        description,
        shared,
    }
}

/// Return the roles in assembly order.
pub fn canonical_order() -> Vec<FragmentRole> {
    FRAGMENT_ROLES.iter().map(|r| r.id).collect()
}

/// Return the registry metadata for a role.
pub fn info_for(id: FragmentRole) -> &'static FragmentRoleInfo {
    FRAGMENT_ROLES
        .iter()
        .find(|r| r.id == id)
        .expect("INVARIANT: every FragmentRole has a registry entry")
}

/// Return the canonical spelling for a role.
pub fn as_str(id: FragmentRole) -> &'static str {
    info_for(id).canonical
}

/// Resolve a role spelling (case-sensitive).
pub fn from_str(s: &str) -> Option<FragmentRole> {
    FRAGMENT_ROLES.iter().find(|r| r.canonical == s).map(|r| r.id)
}

/// Position of a role in the assembly order.
pub fn position(id: FragmentRole) -> usize {
    FRAGMENT_ROLES
        .iter()
        .position(|r| r.id == id)
        .expect("INVARIANT: every FragmentRole has a registry entry")
}

impl std::fmt::Display for FragmentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(as_str(*self))
    }
}

//! Bundler plugin vocabulary.
//!
//! Bundles that pull in legacy-shaped packages need a plugin chain, and resolution only works when the chain
//! runs in the order of [`PLUGINS`]: module-interop shim first, then built-in polyfills, then bare-module
//! resolution. [`PluginChain`] refuses any other order.
//!
//! ## Examples
//! ```rust
//! use crossrun_core::plugins::{Plugin, PluginChain};
//!
//! let chain = PluginChain::full();
//! assert_eq!(chain.plugins(), &[Plugin::CommonJs, Plugin::NodePolyfills, Plugin::NodeResolve]);
//! assert!(PluginChain::new(vec![Plugin::NodeResolve, Plugin::CommonJs]).is_err());
//! ```

use thiserror::Error;

/// Stable identifier for a bundler plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Plugin {
    /// Converts CommonJS modules so they can join an ES module graph.
    CommonJs,
    /// Replaces built-in host modules with portable polyfills.
    NodePolyfills,
    /// Resolves bare module specifiers from installed packages.
    NodeResolve,
}

/// Metadata for a plugin.
#[derive(Debug, Clone, Copy)]
pub struct PluginInfo {
    pub id: Plugin,
    /// Name passed to the bundler's `--plugin` flag.
    pub canonical: &'static str,
}

/// Registry of plugins, in the only order the bundler accepts them.
pub const PLUGINS: &[PluginInfo] = &[
    PluginInfo {
        id: Plugin::CommonJs,
        canonical: "commonjs",
    },
    PluginInfo {
        id: Plugin::NodePolyfills,
        canonical: "polyfill-node",
    },
    PluginInfo {
        id: Plugin::NodeResolve,
        canonical: "node-resolve",
    },
];

/// Return the bundler spelling for a plugin.
pub fn as_str(id: Plugin) -> &'static str {
    PLUGINS
        .iter()
        .find(|p| p.id == id)
        .map(|p| p.canonical)
        .expect("INVARIANT: every Plugin has a registry entry")
}

/// Resolve a plugin spelling (case-sensitive).
pub fn from_str(s: &str) -> Option<Plugin> {
    PLUGINS.iter().find(|p| p.canonical == s).map(|p| p.id)
}

fn position(id: Plugin) -> usize {
    PLUGINS
        .iter()
        .position(|p| p.id == id)
        .expect("INVARIANT: every Plugin has a registry entry")
}

impl std::fmt::Display for Plugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(as_str(*self))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PluginChainError {
    #[error("plugin `{0}` appears more than once")]
    Duplicate(Plugin),

    #[error("plugin `{later}` must not run before `{earlier}`")]
    OutOfOrder { earlier: Plugin, later: Plugin },
}

/// An ordered, validated list of plugins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PluginChain {
    plugins: Vec<Plugin>,
}

impl PluginChain {
    /// Validate a chain against the registry order.
    ///
    /// Subsets are allowed (`[CommonJs, NodeResolve]`), reordering is not.
    pub fn new(plugins: Vec<Plugin>) -> Result<Self, PluginChainError> {
        for pair in plugins.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if a == b {
                return Err(PluginChainError::Duplicate(a));
            }
            if position(a) > position(b) {
                return Err(PluginChainError::OutOfOrder { earlier: b, later: a });
            }
        }
        // Strictly increasing positions also rule out non-adjacent duplicates.
        Ok(Self { plugins })
    }

    /// A chain with no plugins, for sources that are already module-shaped.
    pub fn none() -> Self {
        Self::default()
    }

    /// Every plugin, in registry order.
    pub fn full() -> Self {
        Self {
            plugins: PLUGINS.iter().map(|p| p.id).collect(),
        }
    }

    pub fn plugins(&self) -> &[Plugin] {
        &self.plugins
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

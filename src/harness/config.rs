//! Harness configuration
//!
//! Paths follow the conventional embedded-package layout: the engine registry and engines directory sit next to
//! the package, fragments live under `test/__bootstrap__/`, and specs are borrowed from a sibling package.
//!
//! A JSON config file may override any field; missing fields keep their defaults. Relative paths are resolved
//! against the working directory.

use std::fs;
use std::path::{Path, PathBuf};

use crossrun_core::plugins::{self, PluginChain, PluginChainError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors loading or resolving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unknown bundler plugin `{name}`")]
    UnknownPlugin { name: String },

    #[error("invalid expectation plugin chain: {0}")]
    PluginChain(#[from] PluginChainError),
}

/// Harness configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarnessConfig {
    /// Engine registry document (`installed` mapping)
    pub registry: PathBuf,
    /// Directory holding one executable per registered engine
    pub engines_dir: PathBuf,
    /// Glob selecting the spec files to run
    pub spec_glob: String,
    /// Bundled library under test
    pub library: PathBuf,
    /// Environment shim defining host globals
    pub environment: PathBuf,
    /// Reporter printing spec results as JSON
    pub reporter: PathBuf,
    /// Driver that starts the test framework; always the last fragment
    pub driver: PathBuf,
    /// Entry module for the framework core and setup bundle
    pub framework_entry: PathBuf,
    /// Entry module for the expectation library bundle
    pub expect_entry: PathBuf,
    /// Plugins for the expectation library bundle, by bundler spelling
    pub expect_plugins: Vec<String>,
    /// Bundler command
    pub bundler: String,
    /// Write generated bundles here for inspection
    pub emit_bundles: Option<PathBuf>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            registry: PathBuf::from("./status.json"),
            engines_dir: PathBuf::from("./engines"),
            spec_glob: "../near-membrane-node/src/__tests__/*.spec.js".to_string(),
            library: PathBuf::from("./lib/index.js"),
            environment: PathBuf::from("./test/__bootstrap__/environment.js"),
            reporter: PathBuf::from("./test/__bootstrap__/jasmine-reporter.js"),
            driver: PathBuf::from("./test/__bootstrap__/jasmine-exec.js"),
            framework_entry: PathBuf::from("./test/__bootstrap__/jasmine-setup.js"),
            expect_entry: PathBuf::from("./node_modules/expect/build/index.js"),
            expect_plugins: plugins::PLUGINS.iter().map(|p| p.canonical.to_string()).collect(),
            bundler: "rollup".to_string(),
            emit_bundles: None,
        }
    }
}

impl HarnessConfig {
    /// Create a new config with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a JSON config file on top of the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn with_registry(mut self, path: impl Into<PathBuf>) -> Self {
        self.registry = path.into();
        self
    }

    pub fn with_engines_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.engines_dir = path.into();
        self
    }

    pub fn with_spec_glob(mut self, glob: impl Into<String>) -> Self {
        self.spec_glob = glob.into();
        self
    }

    pub fn with_bundler(mut self, bundler: impl Into<String>) -> Self {
        self.bundler = bundler.into();
        self
    }

    /// Resolve `expect_plugins` into a validated chain.
    pub fn expect_plugin_chain(&self) -> Result<PluginChain, ConfigError> {
        let resolved = self
            .expect_plugins
            .iter()
            .map(|name| plugins::from_str(name).ok_or_else(|| ConfigError::UnknownPlugin { name: name.clone() }))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(PluginChain::new(resolved)?)
    }

    pub fn with_emit_bundles(mut self, dir: impl Into<PathBuf>) -> Self {
        self.emit_bundles = Some(dir.into());
        self
    }

    /// Point every fragment path at `<root>/...` using the conventional layout.
    pub fn with_package_root(self, root: &Path) -> Self {
        let defaults = Self::default();
        let rebase = |p: &Path| root.join(p.strip_prefix(".").unwrap_or(p));
        Self {
            registry: rebase(&defaults.registry),
            engines_dir: rebase(&defaults.engines_dir),
            library: rebase(&defaults.library),
            environment: rebase(&defaults.environment),
            reporter: rebase(&defaults.reporter),
            driver: rebase(&defaults.driver),
            framework_entry: rebase(&defaults.framework_entry),
            expect_entry: rebase(&defaults.expect_entry),
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout() {
        let config = HarnessConfig::default();
        assert_eq!(config.registry, PathBuf::from("./status.json"));
        assert_eq!(config.engines_dir, PathBuf::from("./engines"));
        assert_eq!(config.spec_glob, "../near-membrane-node/src/__tests__/*.spec.js");
        assert_eq!(config.bundler, "rollup");
        assert!(config.emit_bundles.is_none());
    }

    #[test]
    fn test_builders_only_touch_their_field() {
        let config = HarnessConfig::new()
            .with_registry("r.json")
            .with_spec_glob("specs/**/*.js")
            .with_emit_bundles("out");
        assert_eq!(config.registry, PathBuf::from("r.json"));
        assert_eq!(config.spec_glob, "specs/**/*.js");
        assert_eq!(config.emit_bundles, Some(PathBuf::from("out")));
        assert_eq!(config.engines_dir, HarnessConfig::default().engines_dir);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = HarnessConfig::from_json(r#"{"bundler": "npx rollup", "engines_dir": "/opt/engines"}"#).unwrap();
        assert_eq!(config.bundler, "npx rollup");
        assert_eq!(config.engines_dir, PathBuf::from("/opt/engines"));
        assert_eq!(config.registry, PathBuf::from("./status.json"));
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(HarnessConfig::from_json(r#"{"engine_dir": "x"}"#).is_err());
    }

    #[test]
    fn test_package_root_rebases_fragments() {
        let config = HarnessConfig::new().with_package_root(Path::new("/pkg"));
        assert_eq!(config.registry, PathBuf::from("/pkg/status.json"));
        assert_eq!(config.driver, PathBuf::from("/pkg/test/__bootstrap__/jasmine-exec.js"));
        assert_eq!(config.spec_glob, HarnessConfig::default().spec_glob);
    }

    #[test]
    fn test_default_expect_plugins_are_the_full_chain() {
        assert_eq!(HarnessConfig::default().expect_plugin_chain().unwrap(), PluginChain::full());
    }

    #[test]
    fn test_expect_plugins_validated() {
        let config = HarnessConfig::from_json(r#"{"expect_plugins": ["commonjs", "node-resolve"]}"#).unwrap();
        assert_eq!(config.expect_plugin_chain().unwrap().plugins().len(), 2);

        let config = HarnessConfig::from_json(r#"{"expect_plugins": ["node-resolve", "commonjs"]}"#).unwrap();
        assert!(matches!(config.expect_plugin_chain(), Err(ConfigError::PluginChain(_))));

        let config = HarnessConfig::from_json(r#"{"expect_plugins": ["babel"]}"#).unwrap();
        let err = config.expect_plugin_chain().unwrap_err();
        assert_eq!(err.to_string(), "unknown bundler plugin `babel`");
    }

    #[test]
    fn test_load_reports_path() {
        let err = HarnessConfig::load(Path::new("/definitely/missing/crossrun.json")).unwrap_err();
        assert!(err.to_string().contains("/definitely/missing/crossrun.json"));
    }
}

//! Engine registry
//!
//! The registry is a JSON document produced by the engine installer. Only the keys of its `installed` mapping
//! matter: each key names an engine whose executable is `<engines_dir>/<key>`. Key order is discovery order.
//!
//! ```json
//! { "installed": { "v8": "11.9.2", "quickjs": "2024-01-13" } }
//! ```
//!
//! An empty registry file means no engines are installed.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Errors reading the engine registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("failed to read engine registry {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid engine registry {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("engine registry {} has no `installed` object", path.display())]
    MissingInstalled { path: PathBuf },
}

/// One installed engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineDescriptor {
    pub name: String,
    /// Executable invoked with a single program path.
    pub path: PathBuf,
}

impl EngineDescriptor {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

/// Engines available for this run, in registry order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineRegistry {
    engines: Vec<EngineDescriptor>,
}

impl EngineRegistry {
    pub fn new(engines: Vec<EngineDescriptor>) -> Self {
        Self { engines }
    }

    /// Read the registry at `path`, resolving executables under `engines_dir`.
    #[tracing::instrument(skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path, engines_dir: &Path) -> Result<Self, RegistryError> {
        let text = fs::read_to_string(path).map_err(|source| RegistryError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let registry = Self::parse(&text, path, engines_dir)?;
        tracing::debug!(engines = ?registry.names(), "loaded engine registry");
        Ok(registry)
    }

    /// Parse registry text. `origin` is only used in error messages.
    pub fn parse(text: &str, origin: &Path, engines_dir: &Path) -> Result<Self, RegistryError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }

        let document: Value = serde_json::from_str(text).map_err(|source| RegistryError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;
        let installed = document
            .get("installed")
            .and_then(Value::as_object)
            .ok_or_else(|| RegistryError::MissingInstalled {
                path: origin.to_path_buf(),
            })?;

        let engines = installed
            .keys()
            .map(|name| EngineDescriptor::new(name.clone(), engines_dir.join(name)))
            .collect();
        Ok(Self { engines })
    }

    pub fn engines(&self) -> &[EngineDescriptor] {
        &self.engines
    }

    pub fn names(&self) -> Vec<&str> {
        self.engines.iter().map(|e| e.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<EngineRegistry, RegistryError> {
        EngineRegistry::parse(text, Path::new("status.json"), Path::new("engines"))
    }

    #[test]
    fn test_keys_in_document_order() {
        let registry = parse(r#"{"installed": {"v8": "1", "quickjs": "2", "engine262": "3"}}"#).unwrap();
        assert_eq!(registry.names(), vec!["v8", "quickjs", "engine262"]);
        assert_eq!(registry.engines()[1].path, PathBuf::from("engines/quickjs"));
    }

    #[test]
    fn test_empty_file_has_no_engines() {
        assert!(parse("").unwrap().is_empty());
        assert!(parse("  \n").unwrap().is_empty());
    }

    #[test]
    fn test_missing_installed() {
        let err = parse(r#"{"engines": {}}"#).unwrap_err();
        assert!(matches!(err, RegistryError::MissingInstalled { .. }));
        assert_eq!(err.to_string(), "engine registry status.json has no `installed` object");
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(parse("{"), Err(RegistryError::Parse { .. })));
    }
}

//! Bundle generation
//!
//! Two fragments are produced by an external bundler rather than read from disk:
//!
//! - the test framework core plus its setup, as an ES module evaluated with `globalThis` as `this`;
//! - the expectation library, as an IIFE assigning the global `expect`, built with the full plugin chain.
//!
//! The bundler is a command invoked as
//! `<bundler> <entry> --format <es|iife> [--name N] [--context C] [--plugin P]...`
//! that writes the bundled source to stdout. Its internals are not this crate's concern.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use crossrun_core::PluginChain;
use crossrun_core::plugins;
use thiserror::Error;

/// Errors generating a bundle.
#[derive(Debug, Error)]
pub enum BundleError {
    #[error("failed to start bundler `{command}` for {}: {source}", entry.display())]
    Spawn {
        command: String,
        entry: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("bundler failed for {} ({status}):\n{stderr}", entry.display())]
    Failed {
        entry: PathBuf,
        status: String,
        stderr: String,
    },

    #[error("bundler produced no output for {}", entry.display())]
    EmptyOutput { entry: PathBuf },

    #[error("bundler output for {} is not valid UTF-8", entry.display())]
    InvalidUtf8 { entry: PathBuf },

    #[error("failed to write bundle {}: {source}", path.display())]
    Emit {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Module format of the emitted bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BundleFormat {
    Es,
    /// Immediately invoked function expression assigning the global `name`.
    Iife { name: String },
}

impl BundleFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            BundleFormat::Es => "es",
            BundleFormat::Iife { .. } => "iife",
        }
    }
}

/// One bundle to generate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleRequest {
    pub entry: PathBuf,
    pub format: BundleFormat,
    pub plugins: PluginChain,
    /// Value of `this` at module top level.
    pub context: Option<String>,
}

impl BundleRequest {
    /// Framework core + setup: ES format, `globalThis` context, no plugins.
    pub fn framework(entry: impl Into<PathBuf>) -> Self {
        Self {
            entry: entry.into(),
            format: BundleFormat::Es,
            plugins: PluginChain::none(),
            context: Some("globalThis".to_string()),
        }
    }

    /// Expectation library: IIFE named `expect`, built with `plugins` (normally the full chain).
    pub fn expectation_library(entry: impl Into<PathBuf>, plugins: PluginChain) -> Self {
        Self {
            entry: entry.into(),
            format: BundleFormat::Iife {
                name: "expect".to_string(),
            },
            plugins,
            context: None,
        }
    }

    /// Bundler arguments after the command itself.
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            self.entry.to_string_lossy().into_owned(),
            "--format".to_string(),
            self.format.as_str().to_string(),
        ];
        if let BundleFormat::Iife { name } = &self.format {
            args.push("--name".to_string());
            args.push(name.clone());
        }
        if let Some(context) = &self.context {
            args.push("--context".to_string());
            args.push(context.clone());
        }
        for plugin in self.plugins.plugins() {
            args.push("--plugin".to_string());
            args.push(plugins::as_str(*plugin).to_string());
        }
        args
    }

    /// File name used when the bundle is written out for inspection.
    pub fn output_name(&self) -> String {
        match &self.format {
            BundleFormat::Iife { name } => format!("{}.js", name),
            BundleFormat::Es => self
                .entry
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "bundle.js".to_string()),
        }
    }
}

/// Produces bundled source text for a request.
pub trait Bundler {
    fn generate(&self, request: &BundleRequest) -> impl Future<Output = Result<String, BundleError>> + Send;
}

/// Runs an external bundler command and reads the bundle from its stdout.
#[derive(Debug, Clone)]
pub struct CommandBundler {
    program: String,
    /// Leading arguments from a multi-word command such as `npx rollup`.
    prefix: Vec<String>,
}

impl CommandBundler {
    /// `command` is split on whitespace; the first word is the program.
    pub fn new(command: &str) -> Self {
        let mut words = command.split_whitespace().map(str::to_string);
        let program = words.next().unwrap_or_default();
        Self {
            program,
            prefix: words.collect(),
        }
    }

    fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.prefix.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Bundler for CommandBundler {
    async fn generate(&self, request: &BundleRequest) -> Result<String, BundleError> {
        let args = request.args();
        tracing::debug!(command = %self.command_line(), ?args, "running bundler");

        let output = tokio::process::Command::new(&self.program)
            .args(&self.prefix)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| BundleError::Spawn {
                command: self.command_line(),
                entry: request.entry.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(BundleError::Failed {
                entry: request.entry.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        let text = String::from_utf8(output.stdout).map_err(|_| BundleError::InvalidUtf8 {
            entry: request.entry.clone(),
        })?;
        if text.trim().is_empty() {
            return Err(BundleError::EmptyOutput {
                entry: request.entry.clone(),
            });
        }
        Ok(text)
    }
}

/// Write a generated bundle into `dir` and return its path.
pub async fn emit_bundle(dir: &Path, request: &BundleRequest, text: &str) -> Result<PathBuf, BundleError> {
    let path = dir.join(request.output_name());
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| BundleError::Emit {
            path: path.clone(),
            source,
        })?;
    tokio::fs::write(&path, text)
        .await
        .map_err(|source| BundleError::Emit {
            path: path.clone(),
            source,
        })?;
    tracing::info!(path = %path.display(), "wrote bundle");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_framework_args() {
        let request = BundleRequest::framework("setup.js");
        assert_eq!(request.args(), vec!["setup.js", "--format", "es", "--context", "globalThis"]);
        assert_eq!(request.output_name(), "setup.js");
    }

    #[test]
    fn test_expectation_library_args_keep_plugin_order() {
        let request = BundleRequest::expectation_library("expect/index.js", PluginChain::full());
        assert_eq!(
            request.args(),
            vec![
                "expect/index.js",
                "--format",
                "iife",
                "--name",
                "expect",
                "--plugin",
                "commonjs",
                "--plugin",
                "polyfill-node",
                "--plugin",
                "node-resolve",
            ]
        );
        assert_eq!(request.output_name(), "expect.js");
    }

    #[test]
    fn test_multi_word_command() {
        let bundler = CommandBundler::new("npx  rollup");
        assert_eq!(bundler.program, "npx");
        assert_eq!(bundler.prefix, vec!["rollup"]);
        assert_eq!(bundler.command_line(), "npx rollup");
    }

    #[tokio::test]
    async fn test_missing_bundler_is_spawn_error() {
        let bundler = CommandBundler::new("crossrun-no-such-bundler");
        let err = bundler.generate(&BundleRequest::framework("a.js")).await.unwrap_err();
        assert!(matches!(err, BundleError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_bundle_read_from_stdout() {
        let bundler = CommandBundler::new("echo");
        let text = bundler.generate(&BundleRequest::framework("a.js")).await.unwrap();
        assert_eq!(text, "a.js --format es --context globalThis\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_bundler() {
        let bundler = CommandBundler::new("false");
        let err = bundler.generate(&BundleRequest::framework("a.js")).await.unwrap_err();
        assert!(matches!(err, BundleError::Failed { .. }));
    }

    #[tokio::test]
    async fn test_emit_bundle() {
        let dir = tempfile::tempdir().unwrap();
        let request = BundleRequest::expectation_library("index.js", PluginChain::full());
        let path = emit_bundle(&dir.path().join("bundles"), &request, "var expect;").await.unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "var expect;");
    }
}

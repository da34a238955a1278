//! Spec discovery and program assembly
//!
//! One program is assembled per discovered spec file. Fragments are trimmed and joined with a blank line in
//! fragment-registry order, so the executor driver always comes last:
//!
//! ```text
//! environment ⏎⏎ framework ⏎⏎ expect ⏎⏎ reporter ⏎⏎ library ⏎⏎ <preprocessed spec> ⏎⏎ driver
//! ```

use std::fs;
use std::path::{Component, Path, PathBuf};

use crossrun_core::FragmentRole;
use crossrun_core::fragments;
use crossrun_syntax::{Preprocessor, format_error};
use globset::{GlobBuilder, GlobMatcher};
use thiserror::Error;
use tokio::task::JoinSet;

use super::fragments::FragmentSet;

/// Errors discovering, reading, preparing or writing programs.
#[derive(Debug, Error)]
pub enum AssembleError {
    #[error("invalid spec glob `{glob}`: {source}")]
    InvalidGlob {
        glob: String,
        #[source]
        source: globset::Error,
    },

    #[error("no spec files match `{glob}`")]
    NoSpecs { glob: String },

    #[error("failed to scan {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read {role} fragment {}: {source}", path.display())]
    ReadFragment {
        role: FragmentRole,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read spec {}: {source}", path.display())]
    ReadSpec {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `rendered` holds every syntax error formatted with source context.
    #[error("failed to preprocess {}:\n{rendered}", path.display())]
    Preprocess { path: PathBuf, rendered: String },

    #[error("failed to write program {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("spec preparation task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

// ============================================================================
// Discovery
// ============================================================================

/// Files matching `pattern`, sorted.
///
/// The walk starts at the pattern's literal prefix (`../pkg/src/__tests__` for
/// `../pkg/src/__tests__/*.spec.js`); `*` does not cross directory separators, `**` does.
#[tracing::instrument(skip_all, fields(pattern = %pattern))]
pub fn discover_spec_files(pattern: &str) -> Result<Vec<PathBuf>, AssembleError> {
    let matcher = compile_glob(pattern)?;
    let base = literal_base(pattern);

    let mut files = Vec::new();
    if base.is_file() {
        if matcher.is_match(&base) {
            files.push(base);
        }
    } else if base.is_dir() {
        walk(&base, &matcher, &mut files)?;
    }

    if files.is_empty() {
        return Err(AssembleError::NoSpecs {
            glob: pattern.to_string(),
        });
    }
    files.sort();
    tracing::debug!(count = files.len(), "discovered spec files");
    Ok(files)
}

fn compile_glob(pattern: &str) -> Result<GlobMatcher, AssembleError> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map(|glob| glob.compile_matcher())
        .map_err(|source| AssembleError::InvalidGlob {
            glob: pattern.to_string(),
            source,
        })
}

fn has_glob_meta(component: &str) -> bool {
    component.contains(['*', '?', '[', '{'])
}

/// Leading path components without glob metacharacters.
fn literal_base(pattern: &str) -> PathBuf {
    let mut base = PathBuf::new();
    for component in Path::new(pattern).components() {
        match component {
            Component::Normal(part) if has_glob_meta(&part.to_string_lossy()) => break,
            _ => base.push(component),
        }
    }
    if base.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        base
    }
}

fn walk(dir: &Path, matcher: &GlobMatcher, files: &mut Vec<PathBuf>) -> Result<(), AssembleError> {
    let entries = fs::read_dir(dir).map_err(|source| AssembleError::Walk {
        path: dir.to_path_buf(),
        source,
    })?;
    for entry in entries {
        let entry = entry.map_err(|source| AssembleError::Walk {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_dir() {
            let name = entry.file_name();
            if name != "node_modules" && !name.to_string_lossy().starts_with('.') {
                walk(&path, matcher, files)?;
            }
        } else if matcher.is_match(&path) {
            files.push(path);
        }
    }
    Ok(())
}

// ============================================================================
// Preparation
// ============================================================================

/// A spec file after preprocessing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedSpec {
    pub path: PathBuf,
    pub source: String,
}

/// Preprocess one spec source. Syntax errors are rendered against `path`.
pub fn prepare_spec(preprocessor: &Preprocessor, path: &Path, source: &str) -> Result<PreparedSpec, AssembleError> {
    let prepared = preprocessor.run(source).map_err(|errors| AssembleError::Preprocess {
        path: path.to_path_buf(),
        rendered: errors
            .iter()
            .map(|e| format_error(&path.display().to_string(), source, e))
            .collect::<Vec<_>>()
            .join("\n"),
    })?;
    Ok(PreparedSpec {
        path: path.to_path_buf(),
        source: prepared,
    })
}

/// Read and preprocess every spec concurrently. Output order matches `paths`.
#[tracing::instrument(skip_all, fields(count = paths.len()))]
pub async fn prepare_specs(paths: &[PathBuf]) -> Result<Vec<PreparedSpec>, AssembleError> {
    let mut tasks = JoinSet::new();
    for (index, path) in paths.iter().cloned().enumerate() {
        tasks.spawn(async move {
            let source = tokio::fs::read_to_string(&path)
                .await
                .map_err(|source| AssembleError::ReadSpec {
                    path: path.clone(),
                    source,
                })?;
            let prepared = prepare_spec(&Preprocessor::default(), &path, &source)?;
            Ok::<_, AssembleError>((index, prepared))
        });
    }

    let mut prepared = Vec::with_capacity(paths.len());
    while let Some(joined) = tasks.join_next().await {
        prepared.push(joined??);
    }
    prepared.sort_by_key(|(index, _)| *index);
    Ok(prepared.into_iter().map(|(_, spec)| spec).collect())
}

// ============================================================================
// Assembly
// ============================================================================

/// One self-contained program, reused for every engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledProgram {
    pub spec_path: PathBuf,
    pub source: String,
}

/// Concatenates shared fragments around each prepared spec.
pub struct TestAssembler<'a> {
    fragments: &'a FragmentSet,
}

impl<'a> TestAssembler<'a> {
    pub fn new(fragments: &'a FragmentSet) -> Self {
        Self { fragments }
    }

    pub fn assemble(&self, spec: &PreparedSpec) -> AssembledProgram {
        let parts: Vec<&str> = fragments::canonical_order()
            .into_iter()
            .map(|role| self.fragments.get(role).unwrap_or(spec.source.as_str()).trim())
            .collect();
        AssembledProgram {
            spec_path: spec.path.clone(),
            source: parts.join("\n\n").trim().to_string(),
        }
    }

    pub fn assemble_all(&self, specs: &[PreparedSpec]) -> Vec<AssembledProgram> {
        specs.iter().map(|spec| self.assemble(spec)).collect()
    }
}

/// Write programs into `dir` as `NNN-<spec file name>` and return their paths.
pub fn write_programs(dir: &Path, programs: &[AssembledProgram]) -> Result<Vec<PathBuf>, AssembleError> {
    fs::create_dir_all(dir).map_err(|source| AssembleError::Write {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut written = Vec::with_capacity(programs.len());
    for (index, program) in programs.iter().enumerate() {
        let name = program
            .spec_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "spec.js".to_string());
        let path = dir.join(format!("{:03}-{}", index, name));
        fs::write(&path, &program.source).map_err(|source| AssembleError::Write {
            path: path.clone(),
            source,
        })?;
        written.push(path);
    }
    Ok(written)
}

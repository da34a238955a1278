//! Cross-engine test harness
//!
//! ## Pipeline
//!
//! ```text
//! registry ─┐
//! fragments ├─ prepare (async, concurrent) ─→ TestAssembler ─→ run_matrix (sequential) ─→ aggregate ─→ Reporter
//! specs ────┘
//! ```
//!
//! Preparation errors abort the run. Execution never aborts: each failing pair becomes a diagnostic and the
//! remaining pairs still run.
//!
//! ## Modules
//!
//! - `config` - Paths and bundler command
//! - `registry` - Installed engines
//! - `bundler` - External bundler invocation
//! - `fragments` - Shared program fragments
//! - `assembler` - Spec discovery, preprocessing and program assembly
//! - `runner` - Engine execution and outcome classification
//! - `report` - Aggregation and reporters

pub mod assembler;
pub mod bundler;
pub mod config;
pub mod fragments;
pub mod registry;
pub mod report;
pub mod runner;

use thiserror::Error;

use assembler::{AssembleError, AssembledProgram, TestAssembler, discover_spec_files, prepare_specs};
use bundler::{BundleError, Bundler};
use config::{ConfigError, HarnessConfig};
use fragments::FragmentSet;
use registry::{EngineDescriptor, EngineRegistry, RegistryError};
use report::{Report, aggregate};
use runner::{EngineExecutor, RunRecord, run_matrix};

/// Errors that abort a run before any engine is started.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Bundle(#[from] BundleError),

    #[error(transparent)]
    Assemble(#[from] AssembleError),
}

/// A prepared run: engines known, every program assembled.
#[derive(Debug, Clone)]
pub struct Harness {
    engines: EngineRegistry,
    programs: Vec<AssembledProgram>,
}

impl Harness {
    pub fn new(engines: EngineRegistry, programs: Vec<AssembledProgram>) -> Self {
        Self { engines, programs }
    }

    /// Load the registry, then read fragments, generate bundles and preprocess specs concurrently.
    #[tracing::instrument(skip_all, fields(spec_glob = %config.spec_glob))]
    pub async fn prepare<B: Bundler>(config: &HarnessConfig, bundler: &B) -> Result<Self, HarnessError> {
        let engines = EngineRegistry::load(&config.registry, &config.engines_dir)?;
        if engines.is_empty() {
            tracing::warn!(registry = %config.registry.display(), "no engines installed");
        }

        let programs = assemble_programs(config, bundler).await?;
        tracing::info!(engines = engines.len(), programs = programs.len(), "harness prepared");
        Ok(Self { engines, programs })
    }

    pub fn engines(&self) -> &[EngineDescriptor] {
        self.engines.engines()
    }

    pub fn programs(&self) -> &[AssembledProgram] {
        &self.programs
    }

    /// Execute every (engine, program) pair.
    pub fn execute<E: EngineExecutor>(&self, executor: &E) -> Vec<RunRecord> {
        run_matrix(executor, self.engines.engines(), &self.programs)
    }

    /// Execute and aggregate.
    pub fn run<E: EngineExecutor>(&self, executor: &E) -> Report {
        aggregate(&self.execute(executor))
    }
}

/// Discover, preprocess and assemble every spec without touching the engine registry.
pub async fn assemble_programs<B: Bundler>(
    config: &HarnessConfig,
    bundler: &B,
) -> Result<Vec<AssembledProgram>, HarnessError> {
    let spec_paths = discover_spec_files(&config.spec_glob)?;
    let (fragments, specs) = tokio::try_join!(FragmentSet::load(config, bundler), async {
        prepare_specs(&spec_paths).await.map_err(HarnessError::from)
    })?;
    Ok(TestAssembler::new(&fragments).assemble_all(&specs))
}

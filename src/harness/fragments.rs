//! Shared program fragments
//!
//! Every fragment except the spec itself is identical across assembled programs, so they are loaded once
//! (file reads and bundle generation concurrently) and then handed to the assembler by reference.

use std::path::{Path, PathBuf};

use crossrun_core::FragmentRole;

use super::HarnessError;
use super::assembler::AssembleError;
use super::bundler::{BundleRequest, Bundler, emit_bundle};
use super::config::HarnessConfig;

/// Text of every shared fragment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FragmentSet {
    pub environment: String,
    pub framework: String,
    pub expectation: String,
    pub reporter: String,
    pub library: String,
    pub driver: String,
}

impl FragmentSet {
    /// Text for a shared role; `None` for [`FragmentRole::SpecUnderTest`].
    pub fn get(&self, role: FragmentRole) -> Option<&str> {
        match role {
            FragmentRole::EnvironmentShim => Some(&self.environment),
            FragmentRole::FrameworkSetup => Some(&self.framework),
            FragmentRole::ExpectationLibrary => Some(&self.expectation),
            FragmentRole::Reporter => Some(&self.reporter),
            FragmentRole::LibraryUnderTest => Some(&self.library),
            FragmentRole::SpecUnderTest => None,
            FragmentRole::ExecutorDriver => Some(&self.driver),
        }
    }

    /// Read the on-disk fragments and generate both bundles.
    #[tracing::instrument(skip_all)]
    pub async fn load<B: Bundler>(config: &HarnessConfig, bundler: &B) -> Result<Self, HarnessError> {
        let framework_request = BundleRequest::framework(&config.framework_entry);
        let expect_request = BundleRequest::expectation_library(&config.expect_entry, config.expect_plugin_chain()?);

        let (environment, reporter, library, driver, framework, expectation) = tokio::try_join!(
            read_fragment(FragmentRole::EnvironmentShim, &config.environment),
            read_fragment(FragmentRole::Reporter, &config.reporter),
            read_fragment(FragmentRole::LibraryUnderTest, &config.library),
            read_fragment(FragmentRole::ExecutorDriver, &config.driver),
            async { bundler.generate(&framework_request).await.map_err(HarnessError::from) },
            async { bundler.generate(&expect_request).await.map_err(HarnessError::from) },
        )?;

        if let Some(dir) = &config.emit_bundles {
            emit_bundle(dir, &framework_request, &framework).await?;
            emit_bundle(dir, &expect_request, &expectation).await?;
        }

        tracing::debug!(
            framework_len = framework.len(),
            expectation_len = expectation.len(),
            "fragments ready"
        );
        Ok(Self {
            environment,
            framework,
            expectation,
            reporter,
            library,
            driver,
        })
    }
}

async fn read_fragment(role: FragmentRole, path: &Path) -> Result<String, HarnessError> {
    tokio::fs::read_to_string(path).await.map_err(|source| {
        AssembleError::ReadFragment {
            role,
            path: PathBuf::from(path),
            source,
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::bundler::BundleError;
    use crossrun_core::fragments;

    struct EchoEntry;

    impl Bundler for EchoEntry {
        async fn generate(&self, request: &BundleRequest) -> Result<String, BundleError> {
            Ok(format!("/* bundle {} */", request.format.as_str()))
        }
    }

    #[test]
    fn test_every_shared_role_has_text() {
        for role in fragments::canonical_order() {
            assert_eq!(
                FragmentSet::default().get(role).is_some(),
                fragments::info_for(role).shared,
                "{role}"
            );
        }
    }

    #[tokio::test]
    async fn test_load_reads_and_bundles() {
        let dir = tempfile::tempdir().unwrap();
        let config = HarnessConfig::new().with_package_root(dir.path());
        for path in [&config.environment, &config.reporter, &config.library, &config.driver] {
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, format!("// {}", path.file_name().unwrap().to_string_lossy())).unwrap();
        }

        let set = FragmentSet::load(&config, &EchoEntry).await.unwrap();
        assert_eq!(set.environment, "// environment.js");
        assert_eq!(set.driver, "// jasmine-exec.js");
        assert_eq!(set.framework, "/* bundle es */");
        assert_eq!(set.expectation, "/* bundle iife */");
    }

    #[tokio::test]
    async fn test_missing_fragment_names_role() {
        let dir = tempfile::tempdir().unwrap();
        let config = HarnessConfig::new().with_package_root(dir.path());
        let err = FragmentSet::load(&config, &EchoEntry).await.unwrap_err();
        assert!(err.to_string().contains("fragment"), "{err}");
    }

    #[tokio::test]
    async fn test_invalid_plugin_chain_is_a_config_error() {
        let config = HarnessConfig {
            expect_plugins: vec!["node-resolve".to_string(), "commonjs".to_string()],
            ..HarnessConfig::new()
        };
        let err = FragmentSet::load(&config, &EchoEntry).await.unwrap_err();
        assert!(matches!(err, HarnessError::Config(_)), "{err}");
    }
}

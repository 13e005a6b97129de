//! Package manager contract.
//!
//! This module does not implement npm dependency resolution itself; it
//! describes the contract (`PackageInstaller`) an external package manager
//! satisfies, plus a `NoopInstaller` for projects that arrive with
//! `node_modules` already populated.

mod error;
mod installer;

pub use error::{PmError, PmResult};
pub use installer::{InstallReport, NoopInstaller, PackageInstaller, PackageManager, PackageManagerConfig};

/// Default npm registry URL
pub const DEFAULT_REGISTRY: &str = "https://registry.npmjs.org/";

/// Default concurrency for parallel operations
pub const DEFAULT_CONCURRENCY: usize = 50;

//! Run spec construction and replay (spec.md §4.9, §6.5).

use std::collections::BTreeMap;
use std::path::Path;

use base64::Engine;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::vfs::VirtualFs;

use super::detect::ProjectKind;

/// The deterministic option whitelist a run spec captures (spec.md §4.9).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunOptions {
    pub include_dev_dependencies: bool,
    pub include_optional_dependencies: bool,
    pub include_workspaces: bool,
    pub prefer_lockfile: bool,
    pub prefer_published_workspaces: bool,
    pub project_source_transform: bool,
    pub preflight_mode: String,
    pub start_timeout_ms: u64,
    pub client_hmr_injection: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            include_dev_dependencies: false,
            include_optional_dependencies: false,
            include_workspaces: true,
            prefer_lockfile: true,
            prefer_published_workspaces: false,
            project_source_transform: true,
            preflight_mode: "warn".to_string(),
            start_timeout_ms: 10_000,
            client_hmr_injection: false,
        }
    }
}

/// Runtime-only overrides a replay may apply on top of the deterministic
/// whitelist, without affecting `reproducible` (spec.md §4.9).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReplayOverrides {
    pub logging: Option<String>,
    pub progress: Option<bool>,
    pub trace: Option<bool>,
    pub port: Option<u16>,
    pub env: Option<BTreeMap<String, String>>,
}

const LOCKFILE_NAMES: &[&str] = &["package-lock.json", "pnpm-lock.yaml", "yarn.lock", "bun.lockb"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSpec {
    pub version: u8,
    pub generated_at: String,
    pub repo: String,
    pub project_path: String,
    pub detected_kind: ProjectKind,
    pub options: RunOptions,
    /// content hash, keyed by lockfile filename, for every variant present
    /// at capture time.
    pub lock_hashes: BTreeMap<String, String>,
}

#[derive(Debug, Error)]
pub enum RunSpecError {
    #[error("run spec is not valid base64: {0}")]
    InvalidBase64(String),
    #[error("run spec is not valid JSON: {0}")]
    InvalidJson(String),
    #[error("unsupported run spec version {0} (expected 1)")]
    UnsupportedVersion(u8),
}

pub type RunSpecResult<T> = Result<T, RunSpecError>;

fn hash_hex(bytes: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Content-hashes every lockfile variant present at `project_path`.
pub fn lockfile_hashes(vfs: &dyn VirtualFs, project_path: &Path) -> BTreeMap<String, String> {
    let mut hashes = BTreeMap::new();
    for name in LOCKFILE_NAMES {
        if let Ok(bytes) = vfs.read_file(&project_path.join(name)) {
            hashes.insert(name.to_string(), hash_hex(&bytes));
        }
    }
    hashes
}

impl RunSpec {
    pub fn new(
        repo: String,
        project_path: String,
        detected_kind: ProjectKind,
        options: RunOptions,
        vfs: &dyn VirtualFs,
        generated_at: String,
    ) -> Self {
        let lock_hashes = lockfile_hashes(vfs, Path::new(&project_path));
        Self { version: 1, generated_at, repo, project_path, detected_kind, options, lock_hashes }
    }

    /// URL-safe base64 of the JSON form (spec.md §6.5).
    pub fn encode(&self) -> String {
        let json = serde_json::to_vec(self).expect("RunSpec always serializes");
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(json)
    }

    pub fn decode(encoded: &str) -> RunSpecResult<Self> {
        let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(encoded)
            .map_err(|e| RunSpecError::InvalidBase64(e.to_string()))?;
        let spec: RunSpec = serde_json::from_slice(&bytes).map_err(|e| RunSpecError::InvalidJson(e.to_string()))?;
        if spec.version != 1 {
            return Err(RunSpecError::UnsupportedVersion(spec.version));
        }
        Ok(spec)
    }
}

/// Result of replaying a captured run spec: whether the observed lockfile
/// hashes still match the captured ones (spec.md §4.9).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayReport {
    pub reproducible: bool,
    pub diverged: Vec<String>,
}

/// Re-hashes the same lockfile variants captured in `spec` against the
/// current state of `vfs` and reports whether every hash still matches.
pub fn check_reproducible(spec: &RunSpec, vfs: &dyn VirtualFs) -> ReplayReport {
    let observed = lockfile_hashes(vfs, Path::new(&spec.project_path));
    let mut diverged = Vec::new();
    for (name, expected) in &spec.lock_hashes {
        match observed.get(name) {
            Some(actual) if actual == expected => {}
            _ => diverged.push(name.clone()),
        }
    }
    ReplayReport { reproducible: diverged.is_empty(), diverged }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vfs::MemoryFs;

    #[test]
    fn run_spec_round_trips_through_base64() {
        let vfs = MemoryFs::new();
        vfs.seed_file("/project/package-lock.json", "{}");
        let spec = RunSpec::new(
            "https://github.com/owner/repo".to_string(),
            "/project".to_string(),
            ProjectKind::Static,
            RunOptions::default(),
            &vfs,
            "2026-01-01T00:00:00Z".to_string(),
        );
        let encoded = spec.encode();
        let decoded = RunSpec::decode(&encoded).unwrap();
        assert_eq!(decoded.repo, spec.repo);
        assert_eq!(decoded.lock_hashes, spec.lock_hashes);
    }

    #[test]
    fn rejects_non_version_one_specs() {
        let mut spec = RunSpec::new(
            "https://github.com/owner/repo".to_string(),
            "/project".to_string(),
            ProjectKind::Static,
            RunOptions::default(),
            &MemoryFs::new(),
            "2026-01-01T00:00:00Z".to_string(),
        );
        spec.version = 2;
        let encoded = spec.encode();
        assert!(matches!(RunSpec::decode(&encoded), Err(RunSpecError::UnsupportedVersion(2))));
    }

    #[test]
    fn reproducible_when_lockfile_hash_unchanged() {
        let vfs = MemoryFs::new();
        vfs.seed_file("/project/package-lock.json", "{}");
        let spec = RunSpec::new(
            "https://github.com/owner/repo".to_string(),
            "/project".to_string(),
            ProjectKind::Static,
            RunOptions::default(),
            &vfs,
            "2026-01-01T00:00:00Z".to_string(),
        );
        assert!(check_reproducible(&spec, &vfs).reproducible);
    }

    #[test]
    fn not_reproducible_when_lockfile_changes() {
        let vfs = MemoryFs::new();
        vfs.seed_file("/project/package-lock.json", "{}");
        let spec = RunSpec::new(
            "https://github.com/owner/repo".to_string(),
            "/project".to_string(),
            ProjectKind::Static,
            RunOptions::default(),
            &vfs,
            "2026-01-01T00:00:00Z".to_string(),
        );
        vfs.seed_file("/project/package-lock.json", "{\"changed\": true}");
        let report = check_reproducible(&spec, &vfs);
        assert!(!report.reproducible);
        assert_eq!(report.diverged, vec!["package-lock.json".to_string()]);
    }
}

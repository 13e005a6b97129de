//! The orchestrator (spec.md §4.8-4.9, §6.3): turns a repository URL into a
//! running, detected project. Bootstrap, preflight, detect, and start are
//! the four phases that can fail; observe only ever emits events.
//!
//! Grounded in the teacher's `server` module's "build a dedicated tokio
//! runtime, `block_on` the async pipeline" idiom (`Server::start`), and in
//! `pm`'s pattern of a small `Config` struct with a `Default` impl sitting
//! next to the thing it configures.

pub mod bootstrap;
pub mod detect;
pub mod preflight;
pub mod run_spec;
pub mod start;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::diagnostics::{classify, Diagnosis, DiagnosisCode};
use crate::resolver::ModuleResolver;
use crate::vfs::{MemoryFs, SharedVfs};

pub use bootstrap::{BootstrapError, RepoCoordinates};
pub use detect::{DetectedRunnableProject, ProjectKind};
pub use preflight::{PreflightIssue, PreflightMode, PreflightSeverity};
pub use run_spec::{check_reproducible, ReplayOverrides, ReplayReport, RunOptions, RunSpec, RunSpecError};
pub use start::{RunningProject, StartError};

/// A single pipeline step's trace record (spec.md §4.8, §6.3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEvent {
    pub sequence: u64,
    pub at_ms: u64,
    pub phase: &'static str,
    pub message: String,
    pub data: Option<Value>,
}

/// SLO breach/cache-provenance summary produced by the observe phase
/// (spec.md §4.8 step 5). Breaches never fail a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObservabilityReport {
    pub phase_durations_ms: Vec<(&'static str, u64)>,
    pub slo_breaches: Vec<String>,
    pub cache_provenance: Vec<String>,
}

/// Per-phase budgets the observe phase checks durations against. Not user
/// configurable yet; kept as constants next to the report they feed.
const PHASE_BUDGET_MS: &[(&str, u64)] =
    &[("bootstrap", 15_000), ("preflight", 2_000), ("detect", 1_000), ("start", 10_000)];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorOptions {
    pub destination: PathBuf,
    pub preflight_mode: PreflightMode,
    pub fallback_search_depth: usize,
    pub port_override: Option<u16>,
    pub run_options: RunOptions,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            destination: PathBuf::from("/project"),
            preflight_mode: PreflightMode::Warn,
            fallback_search_depth: 3,
            port_override: None,
            run_options: RunOptions::default(),
        }
    }
}

/// A structured orchestrator failure (spec.md §6.3, §7): a classified code,
/// the phase it occurred in, and actionable hints.
#[derive(Debug, Error)]
#[error("{phase}: {diagnosis}")]
pub struct OrchestratorFailure {
    pub phase: &'static str,
    pub diagnosis: Diagnosis,
    pub hints: Vec<String>,
    pub preflight_issue_codes: Vec<String>,
    pub trace: Vec<TraceEvent>,
}

pub type OrchestratorResult<T> = Result<T, OrchestratorFailure>;

/// Everything `bootstrap_and_run_github_project` hands back on success
/// (spec.md §6.3).
pub struct BootstrapAndRunOutcome {
    pub vfs: SharedVfs,
    pub repo: RepoCoordinates,
    pub preflight: Vec<PreflightIssue>,
    pub detected: DetectedRunnableProject,
    pub running: RunningProject,
    pub trace: Vec<TraceEvent>,
    pub observability: ObservabilityReport,
}

/// Drives the five-phase pipeline. Stateless beyond its `OrchestratorOptions`;
/// every run gets a fresh in-memory VFS unless one is supplied.
pub struct Orchestrator {
    options: OrchestratorOptions,
    trace: Vec<TraceEvent>,
    sequence: u64,
    start_instant: Instant,
}

impl Orchestrator {
    pub fn new(options: OrchestratorOptions) -> Self {
        Self { options, trace: Vec::new(), sequence: 0, start_instant: Instant::now() }
    }

    fn push_trace(&mut self, phase: &'static str, message: String, data: Option<Value>) {
        self.sequence += 1;
        let at_ms = self.start_instant.elapsed().as_millis() as u64;
        tracing::info!(phase, at_ms, "{message}");
        self.trace.push(TraceEvent { sequence: self.sequence, at_ms, phase, message, data });
    }

    /// Synchronous entry point: builds its own tokio runtime and blocks on
    /// the async pipeline, mirroring `server::Server::start`'s idiom.
    pub fn run_blocking(&mut self, repo_url: &str) -> OrchestratorResult<BootstrapAndRunOutcome> {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("failed to build tokio runtime for orchestrator");
        rt.block_on(self.bootstrap_and_run_github_project(repo_url))
    }

    /// `bootstrapAndRunGitHubProject` (spec.md §6.3).
    pub async fn bootstrap_and_run_github_project(&mut self, repo_url: &str) -> OrchestratorResult<BootstrapAndRunOutcome> {
        let vfs: SharedVfs = Arc::new(MemoryFs::new());
        let destination = self.options.destination.clone();

        let bootstrap_start = Instant::now();
        self.push_trace("bootstrap", format!("fetching {repo_url}"), None);
        let repo = bootstrap::bootstrap(vfs.as_ref(), repo_url, &destination).await.map_err(|e| {
            self.failure("bootstrap", anyhow::anyhow!(e.to_string()), vec!["check network connectivity and the repository URL".to_string()])
        })?;
        self.push_trace("bootstrap", format!("extracted {}/{}", repo.owner, repo.repo), None);
        self.record_duration("bootstrap", bootstrap_start.elapsed());

        let preflight_start = Instant::now();
        let resolver = ModuleResolver::new(vfs.clone(), destination.clone());
        let issues = preflight::run_preflight(vfs.as_ref(), &destination, &resolver);
        self.push_trace("preflight", format!("{} issue(s)", issues.len()), None);
        self.record_duration("preflight", preflight_start.elapsed());

        if self.options.preflight_mode == PreflightMode::Strict {
            if let Some(issue) = issues.iter().find(|i| i.severity == PreflightSeverity::Error) {
                let codes: Vec<String> = issues.iter().map(|i| i.code.clone()).collect();
                return Err(OrchestratorFailure {
                    phase: "preflight",
                    diagnosis: Diagnosis::new(DiagnosisCode::PreflightWorkspaceRootMissing, issue.message.clone()),
                    hints: vec!["resolve the flagged issue or relax --preflight to warn".to_string()],
                    preflight_issue_codes: codes,
                    trace: self.trace.clone(),
                });
            }
        }

        let detect_start = Instant::now();
        let detected = detect::detect_runnable_project(vfs.as_ref(), &destination, Some(self.options.fallback_search_depth))
            .ok_or_else(|| {
                self.failure(
                    "detect",
                    anyhow::anyhow!("could not classify project at {}", destination.display()),
                    vec!["no recognizable entry point, dist output, or index.html was found".to_string()],
                )
            })?;
        self.push_trace("detect", format!("kind={:?} root={}", detected.kind, detected.root.display()), None);
        self.record_duration("detect", detect_start.elapsed());

        let start_phase_start = Instant::now();
        let running = start::start_detected_project(&vfs, &detected, self.options.port_override).map_err(|e| {
            self.failure("start", anyhow::anyhow!(e.to_string()), vec!["increase the start timeout or check the entry script for a listen() call".to_string()])
        })?;
        self.push_trace("start", format!("listening on {}", running.url), None);
        self.record_duration("start", start_phase_start.elapsed());

        let observability = self.observe();

        Ok(BootstrapAndRunOutcome { vfs, repo, preflight: issues, detected, running, trace: self.trace.clone(), observability })
    }

    fn record_duration(&mut self, phase: &'static str, elapsed: Duration) {
        let ms = elapsed.as_millis() as u64;
        if let Some(&(_, budget)) = PHASE_BUDGET_MS.iter().find(|(p, _)| *p == phase) {
            if ms > budget {
                tracing::warn!(phase, ms, budget, "phase exceeded its budget");
            }
        }
    }

    fn observe(&mut self) -> ObservabilityReport {
        let mut report = ObservabilityReport::default();
        for (phase, budget) in PHASE_BUDGET_MS {
            let observed = self
                .trace
                .iter()
                .filter(|e| e.phase == *phase)
                .map(|e| e.at_ms)
                .max()
                .unwrap_or(0);
            report.phase_durations_ms.push((phase, observed));
            if observed > *budget {
                report.slo_breaches.push(format!("{phase} exceeded {budget}ms budget ({observed}ms observed)"));
            }
        }
        report.cache_provenance.push("resolver caches: cold (fresh orchestrator run)".to_string());
        self.push_trace("observe", "computed phase durations and cache provenance".to_string(), None);
        report
    }

    fn failure(&self, phase: &'static str, err: anyhow::Error, hints: Vec<String>) -> OrchestratorFailure {
        OrchestratorFailure { phase, diagnosis: classify(&err), hints, preflight_issue_codes: Vec::new(), trace: self.trace.clone() }
    }
}

/// `detectRunnableProject` (spec.md §6.3), exposed standalone for callers
/// that already own a VFS and don't need the full bootstrap pipeline.
pub fn detect_runnable_project(vfs: &SharedVfs, project_path: &Path, fallback_search_depth: usize) -> Option<DetectedRunnableProject> {
    detect::detect_runnable_project(vfs.as_ref(), project_path, Some(fallback_search_depth))
}

/// `startDetectedProject` (spec.md §6.3), exposed standalone to mirror
/// `detect_runnable_project`.
pub fn start_detected_project(
    vfs: &SharedVfs,
    detected: &DetectedRunnableProject,
    port_override: Option<u16>,
) -> Result<RunningProject, StartError> {
    start::start_detected_project(vfs, detected, port_override)
}

/// Rebuilds an `OrchestratorOptions`/run bundle from a captured `RunSpec`'s
/// deterministic whitelist overlaid with runtime-only overrides, then
/// re-runs the pipeline (spec.md §4.9 replay).
pub async fn replay(spec: &RunSpec, overrides: ReplayOverrides) -> OrchestratorResult<(BootstrapAndRunOutcome, ReplayReport)> {
    let options = OrchestratorOptions {
        destination: PathBuf::from(&spec.project_path),
        preflight_mode: match spec.options.preflight_mode.as_str() {
            "strict" => PreflightMode::Strict,
            "off" => PreflightMode::Off,
            _ => PreflightMode::Warn,
        },
        port_override: overrides.port,
        run_options: spec.options.clone(),
        ..Default::default()
    };

    let mut orchestrator = Orchestrator::new(options);
    let outcome = orchestrator.bootstrap_and_run_github_project(&spec.repo).await?;
    let report = check_reproducible(spec, outcome.vfs.as_ref());
    Ok((outcome, report))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orchestrator_options_default_is_sane() {
        let options = OrchestratorOptions::default();
        assert_eq!(options.preflight_mode, PreflightMode::Warn);
        assert_eq!(options.fallback_search_depth, 3);
    }
}

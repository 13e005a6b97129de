//! Error taxonomy and classification for the orchestrator pipeline.
//!
//! Individual modules (`resolver`, `transpiler`, `runtime`, `bus`, `pm`) each
//! carry their own `thiserror` enum for precise, structured errors. The
//! orchestrator sits above all of them and needs to classify whatever bubbles
//! up — including errors from `reqwest`/`tar`/`io` that have no domain-specific
//! variant — into one of a fixed set of externally meaningful codes. That's
//! what this module does.

use thiserror::Error;

/// The fixed taxonomy of orchestrator-visible failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosisCode {
    ModuleNotFound,
    LoadFailed,
    NativeUnsupported,
    TransformAmbiguous,
    PreflightWorkspaceRootMissing,
    PreflightNativeUnsupported,
    PreflightExportsSubpathMissing,
    BootstrapNetworkFailed,
    ServerStartupTimeout,
    ReplayNotReproducible,
    Unknown,
}

impl DiagnosisCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ModuleNotFound => "MODULE_NOT_FOUND",
            Self::LoadFailed => "LOAD_FAILED",
            Self::NativeUnsupported => "NATIVE_UNSUPPORTED",
            Self::TransformAmbiguous => "TRANSFORM_AMBIGUOUS",
            Self::PreflightWorkspaceRootMissing => "PREFLIGHT_WORKSPACE_ROOT_MISSING",
            Self::PreflightNativeUnsupported => "PREFLIGHT_NATIVE_UNSUPPORTED",
            Self::PreflightExportsSubpathMissing => "PREFLIGHT_EXPORTS_SUBPATH_MISSING",
            Self::BootstrapNetworkFailed => "BOOTSTRAP_NETWORK_FAILED",
            Self::ServerStartupTimeout => "SERVER_STARTUP_TIMEOUT",
            Self::ReplayNotReproducible => "REPLAY_NOT_REPRODUCIBLE",
            Self::Unknown => "UNKNOWN",
        }
    }
}

/// A classified failure, attached to whatever triggered it.
#[derive(Debug, Error)]
#[error("{code}: {message}")]
pub struct Diagnosis {
    pub code: DiagnosisCode,
    pub message: String,
}

impl Diagnosis {
    pub fn new(code: DiagnosisCode, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }
}

impl std::fmt::Display for DiagnosisCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies an opaque downstream error into a `Diagnosis`, matching on
/// message substrings the way the teacher's CLI already pattern-matches
/// resolver/runtime error text for user-facing hints.
pub fn classify(err: &anyhow::Error) -> Diagnosis {
    let message = err.to_string();
    let lower = message.to_lowercase();

    let code = if lower.contains("cannot find module") || lower.contains("module not found") {
        DiagnosisCode::ModuleNotFound
    } else if lower.contains("native") && lower.contains("unsupported") {
        DiagnosisCode::NativeUnsupported
    } else if lower.contains("ambiguous") {
        DiagnosisCode::TransformAmbiguous
    } else if lower.contains("workspace root") {
        DiagnosisCode::PreflightWorkspaceRootMissing
    } else if lower.contains("exports") && lower.contains("subpath") {
        DiagnosisCode::PreflightExportsSubpathMissing
    } else if lower.contains("network") || lower.contains("connection") || lower.contains("dns") {
        DiagnosisCode::BootstrapNetworkFailed
    } else if lower.contains("timed out") || lower.contains("timeout") {
        DiagnosisCode::ServerStartupTimeout
    } else if lower.contains("lockfile") && lower.contains("mismatch") {
        DiagnosisCode::ReplayNotReproducible
    } else if lower.contains("failed to load") || lower.contains("load error") {
        DiagnosisCode::LoadFailed
    } else {
        DiagnosisCode::Unknown
    };

    Diagnosis::new(code, message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_module_not_found() {
        let err = anyhow::anyhow!("Cannot find module 'left-pad'");
        assert_eq!(classify(&err).code, DiagnosisCode::ModuleNotFound);
    }

    #[test]
    fn classifies_network_failures() {
        let err = anyhow::anyhow!("network error while fetching archive");
        assert_eq!(classify(&err).code, DiagnosisCode::BootstrapNetworkFailed);
    }

    #[test]
    fn falls_back_to_unknown() {
        let err = anyhow::anyhow!("something inscrutable happened");
        assert_eq!(classify(&err).code, DiagnosisCode::Unknown);
    }
}

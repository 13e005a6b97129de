//! Platform-module registry (spec.md §2.2, §4.6, §6.4)
//!
//! A static, data-driven mapping from reserved module names to the kind of
//! in-process substitute the runtime must provide. This is the
//! single-source-of-truth list consumed by both the resolver (to short-
//! circuit resolution, §4.1 step 2) and the preflight analyzer
//! (`orchestrator::preflight`) to flag native-only packages.
//!
//! Bodies live next to the teacher's existing `runtime::*` registration
//! functions; this module only owns the *routing* decision.

use std::collections::HashSet;
use std::sync::OnceLock;

/// How a reserved specifier is satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubstituteKind {
    /// A pure library substitute with no runtime-constructed state
    /// (crypto, zlib, querystring, assert, string_decoder, ...).
    Static,
    /// Built fresh per runtime, bound to runtime-specific state
    /// (filesystem bound to the VFS, process bound to cwd/env/argv, the
    /// in-memory child-process shell, the `Bun`/`Viper` capability object).
    Constructed,
    /// Always intercepted even if a same-named package exists in
    /// `node_modules`, because its native behavior cannot run in-process.
    ForcedIntercept,
}

/// One entry in the reserved-name table.
#[derive(Debug, Clone, Copy)]
pub struct PlatformModule {
    pub name: &'static str,
    pub kind: SubstituteKind,
}

/// The full reserved-name table (spec.md §6.4). Node aliases are expanded
/// with their `node:` prefix at lookup time, not stored twice here.
const TABLE: &[PlatformModule] = &[
    PlatformModule { name: "fs", kind: SubstituteKind::Constructed },
    PlatformModule { name: "fs/promises", kind: SubstituteKind::Constructed },
    PlatformModule { name: "path", kind: SubstituteKind::Static },
    PlatformModule { name: "process", kind: SubstituteKind::Constructed },
    PlatformModule { name: "events", kind: SubstituteKind::Static },
    PlatformModule { name: "stream", kind: SubstituteKind::Static },
    PlatformModule { name: "buffer", kind: SubstituteKind::Static },
    PlatformModule { name: "url", kind: SubstituteKind::Static },
    PlatformModule { name: "querystring", kind: SubstituteKind::Static },
    PlatformModule { name: "util", kind: SubstituteKind::Static },
    PlatformModule { name: "util/types", kind: SubstituteKind::Static },
    PlatformModule { name: "tty", kind: SubstituteKind::Static },
    PlatformModule { name: "os", kind: SubstituteKind::Static },
    PlatformModule { name: "crypto", kind: SubstituteKind::Static },
    PlatformModule { name: "zlib", kind: SubstituteKind::Static },
    PlatformModule { name: "dns", kind: SubstituteKind::Static },
    PlatformModule { name: "child_process", kind: SubstituteKind::Constructed },
    PlatformModule { name: "assert", kind: SubstituteKind::Static },
    PlatformModule { name: "constants", kind: SubstituteKind::Static },
    PlatformModule { name: "string_decoder", kind: SubstituteKind::Static },
    PlatformModule { name: "timers", kind: SubstituteKind::Static },
    PlatformModule { name: "http", kind: SubstituteKind::Constructed },
    PlatformModule { name: "https", kind: SubstituteKind::Constructed },
    PlatformModule { name: "net", kind: SubstituteKind::Static },
    PlatformModule { name: "tls", kind: SubstituteKind::Static },
    PlatformModule { name: "http2", kind: SubstituteKind::Static },
    PlatformModule { name: "readline", kind: SubstituteKind::Static },
    PlatformModule { name: "cluster", kind: SubstituteKind::Static },
    PlatformModule { name: "dgram", kind: SubstituteKind::Static },
    PlatformModule { name: "vm", kind: SubstituteKind::Static },
    PlatformModule { name: "inspector", kind: SubstituteKind::Static },
    PlatformModule { name: "inspector/promises", kind: SubstituteKind::Static },
    PlatformModule { name: "perf_hooks", kind: SubstituteKind::Static },
    PlatformModule { name: "worker_threads", kind: SubstituteKind::Constructed },
    PlatformModule { name: "async_hooks", kind: SubstituteKind::Constructed },
    PlatformModule { name: "domain", kind: SubstituteKind::Static },
    PlatformModule { name: "diagnostics_channel", kind: SubstituteKind::Static },
    PlatformModule { name: "wasi", kind: SubstituteKind::Static },
    PlatformModule { name: "v8", kind: SubstituteKind::Static },
    PlatformModule { name: "module", kind: SubstituteKind::Constructed },
    PlatformModule { name: "bun", kind: SubstituteKind::Constructed },
    PlatformModule { name: "bun:sqlite", kind: SubstituteKind::Constructed },
    PlatformModule { name: "bun:test", kind: SubstituteKind::Constructed },
    PlatformModule { name: "bun:ffi", kind: SubstituteKind::Static },
    PlatformModule { name: "bun:jsc", kind: SubstituteKind::Static },
    PlatformModule { name: "node:sqlite", kind: SubstituteKind::Constructed },
];

/// Packages intercepted regardless of `node_modules` presence (spec.md §4.6):
/// native binaries that can't run in-process, or CJS/ESM interop that
/// conflicts with this evaluator's `createRequire` model.
const FORCED_INTERCEPTS: &[&str] = &["esbuild", "prettier", "@opentelemetry/instrumentation"];

fn node_table() -> &'static HashSet<&'static str> {
    static TABLE_SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    TABLE_SET.get_or_init(|| TABLE.iter().map(|m| m.name).collect())
}

fn forced_set() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| FORCED_INTERCEPTS.iter().copied().collect())
}

/// Strip a leading `node:` or `bun:` (for non-bun-reserved names) prefix,
/// per spec.md §4.1 step 1 / §4.6 routing rules.
pub fn strip_node_prefix(specifier: &str) -> &str {
    specifier.strip_prefix("node:").unwrap_or(specifier)
}

/// True if `specifier` (after `node:` stripping) short-circuits resolution
/// to a platform route, per spec.md §4.1 steps 1-2.
pub fn is_reserved(specifier: &str) -> bool {
    if specifier.starts_with("bun:") {
        return node_table().contains(specifier);
    }
    let stripped = strip_node_prefix(specifier);
    matches!(stripped, "fs" | "fs/promises" | "process" | "bun") || node_table().contains(stripped)
}

/// True if `package_name` is force-intercepted even when present on disk.
pub fn is_forced_intercept(package_name: &str) -> bool {
    forced_set().contains(package_name)
}

/// Canonical routing key for a reserved specifier: `node:`-stripped, with
/// trailing slashes removed (spec.md §4.1 step 1, §8 boundary behavior).
pub fn canonical_name(specifier: &str) -> String {
    let trimmed = specifier.trim_end_matches('/');
    strip_node_prefix(trimmed).to_string()
}

/// All reserved names, for the preflight analyzer's package.json scan.
pub fn reserved_names() -> impl Iterator<Item = &'static str> {
    TABLE.iter().map(|m| m.name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_prefixed_specifiers_route_to_platform() {
        assert!(is_reserved("node:fs"));
        assert!(is_reserved("fs"));
        assert!(is_reserved("node:crypto"));
        assert!(!is_reserved("lodash"));
    }

    #[test]
    fn bun_prefixed_names_are_reserved_only_when_listed() {
        assert!(is_reserved("bun:sqlite"));
        assert!(!is_reserved("bun:unknown"));
    }

    #[test]
    fn trailing_slash_is_stripped_before_lookup() {
        assert_eq!(canonical_name("node:path/"), "path");
    }
}

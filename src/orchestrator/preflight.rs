//! Preflight phase (spec.md §4.8 step 2): a read-only scan of the bootstrap
//! destination for conditions that would make a run fail predictably.

use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::resolver::ModuleResolver;
use crate::vfs::VirtualFs;

/// How strictly preflight issues gate the start phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreflightMode {
    Off,
    Warn,
    Strict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreflightSeverity {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreflightIssue {
    pub code: String,
    pub severity: PreflightSeverity,
    pub message: String,
    pub path: String,
}

/// Packages known to have no viable in-process substitute: native addons
/// (`.node` binaries) or OS-level daemons the sandbox can't run. Extension
/// point only, per spec.md §9 ("the set is extension-only and not normative").
const NATIVE_ONLY_PACKAGES: &[&str] =
    &["better-sqlite3", "sharp", "node-sass", "fsevents", "bcrypt", "canvas", "sqlite3", "puppeteer"];

lazy_static! {
    static ref IMPORT_SPECIFIER: Regex =
        Regex::new(r#"(?:require\(\s*['"]([^'"]+)['"]\s*\)|from\s*['"]([^'"]+)['"])"#).unwrap();
}

const SOURCE_SCAN_LIMIT: usize = 200;

/// Runs every check in spec.md §4.8 step 2 and returns the full issue list
/// regardless of `mode`; the caller (`Orchestrator`) decides whether `strict`
/// aborts based on the returned severities.
pub fn run_preflight(vfs: &dyn VirtualFs, root: &Path, resolver: &ModuleResolver) -> Vec<PreflightIssue> {
    let mut issues = Vec::new();

    let manifest_path = root.join("package.json");
    let Ok(manifest_text) = vfs.read_to_string(&manifest_path) else {
        return issues;
    };
    let Ok(manifest): Result<Value, _> = serde_json::from_str(&manifest_text) else {
        issues.push(PreflightIssue {
            code: "package-json-missing".to_string(),
            severity: PreflightSeverity::Error,
            message: "package.json is not valid JSON".to_string(),
            path: manifest_path.display().to_string(),
        });
        return issues;
    };

    check_workspace_root(&manifest, vfs, root, &mut issues);
    check_native_unsupported(&manifest, &manifest_path, &mut issues);
    check_exports_subpaths(vfs, root, resolver, &mut issues);

    issues
}

fn dependency_names(manifest: &Value) -> Vec<String> {
    let mut names = Vec::new();
    for field in ["dependencies", "devDependencies", "optionalDependencies"] {
        if let Some(Value::Object(map)) = manifest.get(field) {
            names.extend(map.keys().cloned());
        }
    }
    names
}

fn has_workspace_specifier(manifest: &Value) -> bool {
    for field in ["dependencies", "devDependencies"] {
        if let Some(Value::Object(map)) = manifest.get(field) {
            if map.values().any(|v| v.as_str().is_some_and(|s| s.starts_with("workspace:"))) {
                return true;
            }
        }
    }
    false
}

fn check_workspace_root(manifest: &Value, vfs: &dyn VirtualFs, root: &Path, issues: &mut Vec<PreflightIssue>) {
    if !has_workspace_specifier(manifest) {
        return;
    }
    let declares_workspaces = manifest.get("workspaces").is_some();
    let has_pnpm_workspace = vfs.exists(&root.join("pnpm-workspace.yaml"));
    if !declares_workspaces && !has_pnpm_workspace {
        issues.push(PreflightIssue {
            code: "workspace-root-missing".to_string(),
            severity: PreflightSeverity::Error,
            message: "dependencies use the workspace: protocol but no workspace root was found".to_string(),
            path: root.display().to_string(),
        });
    }
}

fn check_native_unsupported(manifest: &Value, manifest_path: &Path, issues: &mut Vec<PreflightIssue>) {
    for name in dependency_names(manifest) {
        if NATIVE_ONLY_PACKAGES.contains(&name.as_str()) {
            issues.push(PreflightIssue {
                code: "native-unsupported".to_string(),
                severity: PreflightSeverity::Warning,
                message: format!(
                    "'{name}' has no in-process substitute; calls into it will fail with a clear native-unsupported error"
                ),
                path: manifest_path.display().to_string(),
            });
        }
    }
}

fn check_exports_subpaths(vfs: &dyn VirtualFs, root: &Path, resolver: &ModuleResolver, issues: &mut Vec<PreflightIssue>) {
    let mut files = Vec::new();
    collect_source_files(vfs, root, &mut files, SOURCE_SCAN_LIMIT);

    for file in files {
        let Ok(text) = vfs.read_to_string(&file) else { continue };
        let dir = file.parent().unwrap_or(root).to_path_buf();
        for caps in IMPORT_SPECIFIER.captures_iter(&text) {
            let specifier = caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str()).unwrap_or_default();
            if specifier.starts_with('.') || specifier.starts_with('/') || !specifier.contains('/') {
                continue;
            }
            if resolver.resolve_from_dir(specifier, &dir).is_err() {
                issues.push(PreflightIssue {
                    code: "exports-subpath-missing".to_string(),
                    severity: PreflightSeverity::Warning,
                    message: format!("'{specifier}' is not an authorized sub-path export"),
                    path: file.display().to_string(),
                });
            }
        }
    }
}

/// Bounded, depth-first walk collecting `.js`/`.ts`/`.jsx`/`.tsx` files,
/// skipping `node_modules` (its own packages are resolved, not scanned).
fn collect_source_files(vfs: &dyn VirtualFs, dir: &Path, out: &mut Vec<PathBuf>, limit: usize) {
    if out.len() >= limit {
        return;
    }
    let Ok(entries) = vfs.read_dir(dir) else { return };
    for name in entries {
        if out.len() >= limit {
            return;
        }
        if name == "node_modules" || name.starts_with('.') {
            continue;
        }
        let path = dir.join(&name);
        match vfs.stat(&path) {
            Ok(stat) if stat.is_directory() => collect_source_files(vfs, &path, out, limit),
            Ok(stat) if stat.is_file() => {
                if matches!(path.extension().and_then(|e| e.to_str()), Some("js" | "ts" | "jsx" | "tsx" | "mjs" | "cjs")) {
                    out.push(path);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vfs::MemoryFs;
    use std::sync::Arc;

    fn resolver_over(vfs: &Arc<MemoryFs>, root: &str) -> ModuleResolver {
        ModuleResolver::new(vfs.clone(), root)
    }

    #[test]
    fn flags_missing_workspace_root() {
        let vfs = Arc::new(MemoryFs::new());
        vfs.seed_file(
            "/project/package.json",
            r#"{"dependencies": {"shared": "workspace:*"}}"#,
        );
        let resolver = resolver_over(&vfs, "/project");
        let issues = run_preflight(vfs.as_ref(), Path::new("/project"), &resolver);
        assert!(issues.iter().any(|i| i.code == "workspace-root-missing"));
    }

    #[test]
    fn flags_native_only_dependency() {
        let vfs = Arc::new(MemoryFs::new());
        vfs.seed_file("/project/package.json", r#"{"dependencies": {"sharp": "^0.33.0"}}"#);
        let resolver = resolver_over(&vfs, "/project");
        let issues = run_preflight(vfs.as_ref(), Path::new("/project"), &resolver);
        assert!(issues.iter().any(|i| i.code == "native-unsupported"));
    }

    #[test]
    fn clean_project_has_no_issues() {
        let vfs = Arc::new(MemoryFs::new());
        vfs.seed_file("/project/package.json", r#"{"dependencies": {}}"#);
        let resolver = resolver_over(&vfs, "/project");
        let issues = run_preflight(vfs.as_ref(), Path::new("/project"), &resolver);
        assert!(issues.is_empty());
    }
}

//! Node.js-compatible module resolution against a virtual filesystem.
//!
//! Implements the eight-step algorithm: platform short-circuit, the
//! specifier-resolution cache, relative/absolute probing, tsconfig/jsconfig
//! path aliases, the node_modules walk (including pnpm's flattened store
//! layout), conditional `exports`, and the file-or-directory probe with the
//! full extension list. `oxc_resolver` resolves against the real OS
//! filesystem only, so this is hand-rolled against `VirtualFs` instead.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde_json::Value;
use thiserror::Error;

use crate::platform;
use crate::vfs::{SharedVfs, VfsError};

#[derive(Error, Debug)]
pub enum ResolverError {
    #[error("Cannot find module '{specifier}' from '{anchor}'")]
    ModuleNotFound { specifier: String, anchor: String },

    #[error("filesystem error: {0}")]
    Vfs(#[from] VfsError),

    #[error("malformed package.json at '{0}': {1}")]
    MalformedManifest(String, String),
}

pub type ResolverResult<T> = Result<T, ResolverError>;

/// What a specifier resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    /// A reserved name routed to the platform registry; carries the
    /// `node:`-stripped canonical name.
    Platform(String),
    /// A concrete absolute path inside the VFS.
    Path(PathBuf),
}

/// Condition set consulted against a package's `exports` map, in the order
/// the resolver tries them (spec.md §4.1 step 7: `{require}` then `{}`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConditionSet {
    Require,
    Default,
}

impl ConditionSet {
    fn condition_name(self) -> Option<&'static str> {
        match self {
            ConditionSet::Require => Some("require"),
            ConditionSet::Default => None,
        }
    }
}

const PROBE_EXTENSIONS: &[&str] =
    &[".js", ".json", ".node", ".mjs", ".cjs", ".ts", ".tsx", ".mts", ".cts", ".jsx"];

#[derive(Debug, Clone)]
struct TsconfigAliases {
    base_url: String,
    paths: Vec<(String, Vec<String>)>,
}

/// Node-compatible resolver. Holds the five caches described in spec.md §3;
/// all are monotonic within a process and invalidated only by `clear_caches`.
pub struct ModuleResolver {
    vfs: SharedVfs,
    base_path: PathBuf,
    specifier_cache: Mutex<HashMap<(PathBuf, String), Option<PathBuf>>>,
    manifest_cache: Mutex<HashMap<PathBuf, Option<Value>>>,
    tsconfig_dir_cache: Mutex<HashMap<PathBuf, Option<PathBuf>>>,
    tsconfig_alias_cache: Mutex<HashMap<PathBuf, TsconfigAliases>>,
    pnpm_candidate_cache: Mutex<HashMap<(PathBuf, String), Vec<PathBuf>>>,
}

impl ModuleResolver {
    pub fn new(vfs: SharedVfs, base_path: impl AsRef<Path>) -> Self {
        Self {
            vfs,
            base_path: base_path.as_ref().to_path_buf(),
            specifier_cache: Mutex::new(HashMap::new()),
            manifest_cache: Mutex::new(HashMap::new()),
            tsconfig_dir_cache: Mutex::new(HashMap::new()),
            tsconfig_alias_cache: Mutex::new(HashMap::new()),
            pnpm_candidate_cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn clear_caches(&self) {
        self.specifier_cache.lock().unwrap().clear();
        self.manifest_cache.lock().unwrap().clear();
        self.tsconfig_dir_cache.lock().unwrap().clear();
        self.tsconfig_alias_cache.lock().unwrap().clear();
        self.pnpm_candidate_cache.lock().unwrap().clear();
    }

    /// Resolve `specifier` from anchor file `referrer` (step 1-8).
    pub fn resolve(&self, specifier: &str, referrer: &Path) -> ResolverResult<Resolved> {
        let anchor_dir = referrer.parent().unwrap_or(&self.base_path).to_path_buf();
        self.resolve_from_dir(specifier, &anchor_dir)
    }

    pub fn resolve_from_dir(&self, specifier: &str, anchor_dir: &Path) -> ResolverResult<Resolved> {
        // Step 1: normalize.
        let trimmed = specifier.trim_end_matches('/');
        if let Some(bun_name) = trimmed.strip_prefix("bun:") {
            if platform::is_reserved(trimmed) {
                return Ok(Resolved::Platform(format!("bun:{bun_name}")));
            }
        }

        // Step 2: platform short-circuit.
        if platform::is_reserved(trimmed) {
            return Ok(Resolved::Platform(platform::canonical_name(trimmed)));
        }

        // Step 3: specifier-resolution cache.
        let cache_key = (anchor_dir.to_path_buf(), trimmed.to_string());
        if let Some(cached) = self.specifier_cache.lock().unwrap().get(&cache_key) {
            return match cached {
                Some(path) => Ok(Resolved::Path(path.clone())),
                None => Err(ResolverError::ModuleNotFound {
                    specifier: specifier.to_string(),
                    anchor: anchor_dir.display().to_string(),
                }),
            };
        }

        let result = self.resolve_uncached(trimmed, anchor_dir);
        let mut cache = self.specifier_cache.lock().unwrap();
        cache.insert(cache_key, result.clone());
        drop(cache);

        match result {
            Some(path) => Ok(Resolved::Path(path)),
            None => Err(ResolverError::ModuleNotFound {
                specifier: specifier.to_string(),
                anchor: anchor_dir.display().to_string(),
            }),
        }
    }

    fn resolve_uncached(&self, specifier: &str, anchor_dir: &Path) -> Option<PathBuf> {
        // Step 4: relative or absolute.
        if specifier.starts_with('.') || specifier.starts_with('/') {
            let base = if specifier.starts_with('/') {
                PathBuf::from(specifier)
            } else {
                anchor_dir.join(specifier)
            };
            return self.file_or_directory_probe(&base);
        }

        // Step 5: tsconfig/jsconfig alias.
        if let Some(path) = self.resolve_via_tsconfig(specifier, anchor_dir) {
            return Some(path);
        }

        // Step 6: node_modules walk.
        let mut dir = Some(anchor_dir.to_path_buf());
        while let Some(current) = dir {
            let nm = current.join("node_modules");
            if let Some(path) = self.resolve_package(specifier, &nm) {
                return Some(path);
            }
            dir = current.parent().map(|p| p.to_path_buf());
        }
        self.resolve_package(specifier, Path::new("/node_modules"))
    }

    fn resolve_via_tsconfig(&self, specifier: &str, anchor_dir: &Path) -> Option<PathBuf> {
        let tsconfig_dir = self.nearest_tsconfig_dir(anchor_dir)?;
        let aliases = self.tsconfig_aliases(&tsconfig_dir);

        for (pattern, targets) in &aliases.paths {
            if let Some(capture) = match_single_wildcard(pattern, specifier) {
                for target in targets {
                    let resolved_target = target.replacen('*', &capture, 1);
                    let base = tsconfig_dir.join(&aliases.base_url).join(resolved_target);
                    if let Some(path) = self.file_or_directory_probe(&base) {
                        return Some(path);
                    }
                }
            }
        }

        if specifier.contains('/') && !specifier.starts_with('@') {
            let base = tsconfig_dir.join(&aliases.base_url).join(specifier);
            if let Some(path) = self.file_or_directory_probe(&base) {
                return Some(path);
            }
        }
        None
    }

    fn nearest_tsconfig_dir(&self, start: &Path) -> Option<PathBuf> {
        if let Some(cached) = self.tsconfig_dir_cache.lock().unwrap().get(start) {
            return cached.clone();
        }
        let mut dir = Some(start.to_path_buf());
        let found = loop {
            let Some(current) = dir else { break None };
            let has_tsconfig = ["tsconfig.json", "jsconfig.json"]
                .iter()
                .any(|name| self.vfs.exists(&current.join(name)));
            if has_tsconfig {
                break Some(current);
            }
            dir = current.parent().map(|p| p.to_path_buf());
        };
        self.tsconfig_dir_cache.lock().unwrap().insert(start.to_path_buf(), found.clone());
        found
    }

    fn tsconfig_aliases(&self, tsconfig_dir: &Path) -> TsconfigAliases {
        if let Some(cached) = self.tsconfig_alias_cache.lock().unwrap().get(tsconfig_dir) {
            return cached.clone();
        }
        let mut base_url = ".".to_string();
        let mut paths = Vec::new();
        for name in ["tsconfig.json", "jsconfig.json"] {
            let candidate = tsconfig_dir.join(name);
            if let Ok(text) = self.vfs.read_to_string(&candidate) {
                if let Ok(json) = serde_json::from_str::<Value>(&strip_jsonc_comments(&text)) {
                    if let Some(opts) = json.get("compilerOptions") {
                        if let Some(b) = opts.get("baseUrl").and_then(Value::as_str) {
                            base_url = b.to_string();
                        }
                        if let Some(Value::Object(map)) = opts.get("paths") {
                            for (pattern, targets) in map {
                                let target_list: Vec<String> = targets
                                    .as_array()
                                    .map(|arr| arr.iter().filter_map(Value::as_str).map(String::from).collect())
                                    .unwrap_or_default();
                                paths.push((pattern.clone(), target_list));
                            }
                        }
                    }
                }
                break;
            }
        }
        let aliases = TsconfigAliases { base_url, paths };
        self.tsconfig_alias_cache.lock().unwrap().insert(tsconfig_dir.to_path_buf(), aliases.clone());
        aliases
    }

    /// Step 7: package resolution at a given node_modules root.
    fn resolve_package(&self, specifier: &str, node_modules: &Path) -> Option<PathBuf> {
        if !self.vfs.exists(node_modules) {
            return None;
        }
        let (package_name, sub_path) = split_package_specifier(specifier);

        let mut roots = vec![node_modules.join(&package_name)];
        roots.extend(self.pnpm_candidates(node_modules, &package_name));

        for root in &roots {
            if !self.vfs.exists(root) {
                continue;
            }
            let manifest = self.read_manifest(&root.join("package.json"));

            if let Some(exports) = manifest.as_ref().and_then(|m| m.get("exports")) {
                let sub_request = format!("./{sub_path}");
                let request = if sub_path == "." { "." } else { sub_request.as_str() };
                for condition_set in [ConditionSet::Require, ConditionSet::Default] {
                    if let Some(rel) = match_exports(exports, request, condition_set) {
                        let base = root.join(rel.trim_start_matches("./"));
                        if let Some(path) = self.file_or_directory_probe(&base) {
                            return Some(path);
                        }
                    }
                }
            }

            if sub_path == "." {
                if let Some(manifest) = &manifest {
                    for field in ["main", "module"] {
                        if let Some(entry) = manifest.get(field).and_then(Value::as_str) {
                            if let Some(path) = self.file_or_directory_probe(&root.join(entry)) {
                                return Some(path);
                            }
                        }
                    }
                }
                if let Some(path) = self.file_or_directory_probe(root) {
                    return Some(path);
                }
            } else if let Some(path) = self.file_or_directory_probe(&root.join(&sub_path)) {
                return Some(path);
            }
        }

        self.file_or_directory_probe(&node_modules.join(specifier))
    }

    /// pnpm's flattened store: `<nm>/.pnpm/<flattened>/node_modules/<pkg>`,
    /// one candidate per store entry whose name contains `<pkg>@`, sorted
    /// deterministically by store-entry name.
    fn pnpm_candidates(&self, node_modules: &Path, package_name: &str) -> Vec<PathBuf> {
        let key = (node_modules.to_path_buf(), package_name.to_string());
        if let Some(cached) = self.pnpm_candidate_cache.lock().unwrap().get(&key) {
            return cached.clone();
        }
        let store = node_modules.join(".pnpm");
        let needle = format!("{package_name}@");
        let mut entries: Vec<String> = self
            .vfs
            .read_dir(&store)
            .unwrap_or_default()
            .into_iter()
            .filter(|name| name.contains(&needle))
            .collect();
        entries.sort();
        let candidates: Vec<PathBuf> =
            entries.into_iter().map(|entry| store.join(entry).join("node_modules").join(package_name)).collect();
        self.pnpm_candidate_cache.lock().unwrap().insert(key, candidates.clone());
        candidates
    }

    fn read_manifest(&self, path: &Path) -> Option<Value> {
        if let Some(cached) = self.manifest_cache.lock().unwrap().get(path) {
            return cached.clone();
        }
        let parsed = self.vfs.read_to_string(path).ok().and_then(|text| serde_json::from_str(&text).ok());
        self.manifest_cache.lock().unwrap().insert(path.to_path_buf(), parsed.clone());
        parsed
    }

    /// Step 8: file-or-directory probe.
    fn file_or_directory_probe(&self, base: &Path) -> Option<PathBuf> {
        if let Ok(stat) = self.vfs.stat(base) {
            if stat.is_file() {
                return Some(base.to_path_buf());
            }
            if stat.is_directory() {
                if let Some(manifest) = self.read_manifest(&base.join("package.json")) {
                    for field in ["main", "module"] {
                        if let Some(entry) = manifest.get(field).and_then(Value::as_str) {
                            if let Some(path) = self.file_or_directory_probe(&base.join(entry)) {
                                return Some(path);
                            }
                        }
                    }
                }
                for ext in PROBE_EXTENSIONS {
                    let candidate = base.join(format!("index{ext}"));
                    if self.vfs.stat(&candidate).map(|s| s.is_file()).unwrap_or(false) {
                        return Some(candidate);
                    }
                }
                return None;
            }
        }
        for ext in PROBE_EXTENSIONS {
            let mut candidate = base.as_os_str().to_os_string();
            candidate.push(ext);
            let candidate = PathBuf::from(candidate);
            if self.vfs.stat(&candidate).map(|s| s.is_file()).unwrap_or(false) {
                return Some(candidate);
            }
        }
        None
    }
}

/// Splits `@scope/pkg/sub/path` or `pkg/sub/path` into (package name, sub-path).
/// Sub-path is `.` when the specifier equals the package name.
fn split_package_specifier(specifier: &str) -> (String, String) {
    let mut parts = specifier.splitn(if specifier.starts_with('@') { 3 } else { 2 }, '/');
    let package_name = if specifier.starts_with('@') {
        let scope = parts.next().unwrap_or_default();
        let name = parts.next().unwrap_or_default();
        format!("{scope}/{name}")
    } else {
        parts.next().unwrap_or_default().to_string()
    };
    let sub_path = parts.next().unwrap_or(".").to_string();
    (package_name, if sub_path.is_empty() { ".".to_string() } else { sub_path })
}

/// Tests `specifier` against a tsconfig `paths` pattern with exactly one
/// `*`; returns the captured middle segment on match.
fn match_single_wildcard(pattern: &str, specifier: &str) -> Option<String> {
    match pattern.find('*') {
        Some(star_idx) => {
            let prefix = &pattern[..star_idx];
            let suffix = &pattern[star_idx + 1..];
            specifier
                .strip_prefix(prefix)
                .and_then(|rest| rest.strip_suffix(suffix))
                .map(String::from)
        }
        None => (pattern == specifier).then(|| String::new()),
    }
}

/// Flattens an `exports` value depth-first under `condition_set`, returning
/// the first matching relative path for `request` (`.` or `./sub`).
fn match_exports(exports: &Value, request: &str, condition_set: ConditionSet) -> Option<String> {
    match exports {
        Value::String(s) if request == "." => Some(s.clone()),
        Value::Array(items) => items.iter().find_map(|item| match_exports(item, request, condition_set)),
        Value::Object(map) => {
            if let Some(direct) = map.get(request) {
                return flatten_conditions(direct, condition_set);
            }
            if request == "." {
                if let Some(direct) = map.get(".") {
                    return flatten_conditions(direct, condition_set);
                }
            }
            // Not keyed by sub-path: the object itself may be a condition map.
            if !map.keys().any(|k| k.starts_with('.')) {
                return flatten_conditions(exports, condition_set);
            }
            None
        }
        _ => None,
    }
}

fn flatten_conditions(value: &Value, condition_set: ConditionSet) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => items.iter().find_map(|item| flatten_conditions(item, condition_set)),
        Value::Object(map) => {
            if let Some(name) = condition_set.condition_name() {
                if let Some(nested) = map.get(name) {
                    if let Some(hit) = flatten_conditions(nested, condition_set) {
                        return Some(hit);
                    }
                }
            }
            map.get("default").and_then(|nested| flatten_conditions(nested, condition_set))
        }
        _ => None,
    }
}

/// tsconfig.json commonly carries `//` and `/* */` comments; strip them
/// before handing the text to `serde_json`.
fn strip_jsonc_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut in_string = false;
    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            if c == '\\' {
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            '/' if chars.peek() == Some(&'/') => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = ' ';
                for c in chars.by_ref() {
                    if prev == '*' && c == '/' {
                        break;
                    }
                    prev = c;
                }
            }
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vfs::MemoryFs;
    use std::sync::Arc;

    fn vfs_with(files: &[(&str, &str)]) -> SharedVfs {
        let fs = MemoryFs::new();
        for (path, content) in files {
            fs.seed_file(path, content.as_bytes().to_vec());
        }
        Arc::new(fs)
    }

    #[test]
    fn reserved_names_short_circuit() {
        let vfs = vfs_with(&[]);
        let resolver = ModuleResolver::new(vfs, "/project");
        let resolved = resolver.resolve_from_dir("node:fs", Path::new("/project")).unwrap();
        assert_eq!(resolved, Resolved::Platform("fs".to_string()));
    }

    #[test]
    fn relative_specifier_resolves_with_extension() {
        let vfs = vfs_with(&[("/project/lib/helper.js", "module.exports = {};")]);
        let resolver = ModuleResolver::new(vfs, "/project");
        let resolved = resolver.resolve("./lib/helper", Path::new("/project/index.js")).unwrap();
        assert_eq!(resolved, Resolved::Path(PathBuf::from("/project/lib/helper.js")));
    }

    #[test]
    fn conditional_exports_prefer_require_condition() {
        let manifest = r#"{"exports": {".": {"require": "./r.js", "default": "./d.js"}, "./feature": {"require": "./fr.js", "default": "./fd.js"}}}"#;
        let vfs = vfs_with(&[
            ("/project/node_modules/cond-pkg/package.json", manifest),
            ("/project/node_modules/cond-pkg/r.js", "module.exports = 1;"),
            ("/project/node_modules/cond-pkg/fr.js", "module.exports = 2;"),
        ]);
        let resolver = ModuleResolver::new(vfs, "/project");
        let main = resolver.resolve("cond-pkg", Path::new("/project/index.js")).unwrap();
        assert_eq!(main, Resolved::Path(PathBuf::from("/project/node_modules/cond-pkg/r.js")));
        let feature = resolver.resolve("cond-pkg/feature", Path::new("/project/index.js")).unwrap();
        assert_eq!(feature, Resolved::Path(PathBuf::from("/project/node_modules/cond-pkg/fr.js")));
    }

    #[test]
    fn main_field_takes_precedence_over_module() {
        let manifest = r#"{"main": "dist/index.cjs", "module": "dist/index.mjs"}"#;
        let vfs = vfs_with(&[
            ("/project/node_modules/pkg/package.json", manifest),
            ("/project/node_modules/pkg/dist/index.cjs", "module.exports = 1;"),
            ("/project/node_modules/pkg/dist/index.mjs", "export default 1;"),
        ]);
        let resolver = ModuleResolver::new(vfs, "/project");
        let resolved = resolver.resolve("pkg", Path::new("/project/index.js")).unwrap();
        assert_eq!(resolved, Resolved::Path(PathBuf::from("/project/node_modules/pkg/dist/index.cjs")));
    }

    #[test]
    fn unresolved_specifier_fails_and_caches_miss() {
        let vfs = vfs_with(&[]);
        let resolver = ModuleResolver::new(vfs, "/project");
        assert!(resolver.resolve("does-not-exist", Path::new("/project/index.js")).is_err());
        assert!(resolver.resolve("does-not-exist", Path::new("/project/index.js")).is_err());
    }

    #[test]
    fn pnpm_store_layout_resolves() {
        let manifest = r#"{"main": "index.js"}"#;
        let vfs = vfs_with(&[
            ("/project/node_modules/.pnpm/left-pad@1.3.0/node_modules/left-pad/package.json", manifest),
            ("/project/node_modules/.pnpm/left-pad@1.3.0/node_modules/left-pad/index.js", "module.exports = {};"),
        ]);
        let resolver = ModuleResolver::new(vfs, "/project");
        let resolved = resolver.resolve("left-pad", Path::new("/project/index.js")).unwrap();
        assert_eq!(
            resolved,
            Resolved::Path(PathBuf::from(
                "/project/node_modules/.pnpm/left-pad@1.3.0/node_modules/left-pad/index.js"
            ))
        );
    }
}

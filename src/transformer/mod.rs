//! ESM-to-CommonJS rewrite and the dynamic-import shim, both deliberately
//! textual rather than AST-based (the syntax transform stage that needs full
//! AST precision — TypeScript/JSX stripping — lives in `crate::transpiler`
//! and runs first; this module only ever sees plain JS).
//!
//! Three passes, in order: shebang strip, ESM→CJS rewrite (triggered only
//! when the source shows an import/export/`import.meta` token and isn't
//! already CJS), dynamic-import rewrite. The result is cached by
//! `(path, content hash)` so unchanged bytes are never retransformed.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use lazy_static::lazy_static;
use regex::Regex;

/// Cache of processed source, keyed by resolved path and a hash of the raw
/// bytes that produced it (spec.md §3 "Processed-code cache").
pub struct Transformer {
    cache: Mutex<HashMap<(PathBuf, u64), String>>,
}

impl Default for Transformer {
    fn default() -> Self {
        Self::new()
    }
}

impl Transformer {
    pub fn new() -> Self {
        Self { cache: Mutex::new(HashMap::new()) }
    }

    pub fn transform(&self, path: &Path, source: &str) -> String {
        let hash = hash_source(source);
        let key = (path.to_path_buf(), hash);
        if let Some(cached) = self.cache.lock().unwrap().get(&key) {
            return cached.clone();
        }
        let result = transform_uncached(source);
        self.cache.lock().unwrap().insert(key, result.clone());
        result
    }
}

fn hash_source(source: &str) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    source.hash(&mut hasher);
    hasher.finish()
}

/// Runs the three textual passes with no caching; exposed directly for
/// tests and for callers that manage their own cache.
pub fn transform_uncached(source: &str) -> String {
    let stripped = strip_shebang(source);
    let rewritten = if should_rewrite_esm(&stripped) { rewrite_esm_to_cjs(&stripped) } else { stripped };
    rewrite_dynamic_import(&rewritten)
}

fn strip_shebang(source: &str) -> String {
    if let Some(rest) = source.strip_prefix("#!") {
        match rest.find('\n') {
            Some(idx) => rest[idx + 1..].to_string(),
            None => String::new(),
        }
    } else {
        source.to_string()
    }
}

lazy_static! {
    static ref IMPORT_EXPORT_TOKEN: Regex =
        Regex::new(r"(?m)^\s*(import\s|export\s|export\{)|import\.meta").unwrap();
    static ref IMPORT_NAMED: Regex =
        Regex::new(r#"(?m)^import\s*\{([^}]*)\}\s*from\s*['"]([^'"]+)['"]\s*;?"#).unwrap();
    static ref IMPORT_DEFAULT_AND_NAMED: Regex =
        Regex::new(r#"(?m)^import\s+(\w+)\s*,\s*\{([^}]*)\}\s*from\s*['"]([^'"]+)['"]\s*;?"#).unwrap();
    static ref IMPORT_DEFAULT: Regex =
        Regex::new(r#"(?m)^import\s+(\w+)\s*from\s*['"]([^'"]+)['"]\s*;?"#).unwrap();
    static ref IMPORT_NAMESPACE: Regex =
        Regex::new(r#"(?m)^import\s*\*\s*as\s+(\w+)\s*from\s*['"]([^'"]+)['"]\s*;?"#).unwrap();
    static ref IMPORT_SIDE_EFFECT: Regex =
        Regex::new(r#"(?m)^import\s*['"]([^'"]+)['"]\s*;?"#).unwrap();
    static ref EXPORT_DEFAULT: Regex = Regex::new(r"(?m)^export\s+default\s+").unwrap();
    static ref EXPORT_STAR: Regex =
        Regex::new(r#"(?m)^export\s*\*\s*from\s*['"]([^'"]+)['"]\s*;?"#).unwrap();
    static ref EXPORT_NAMED_FROM: Regex =
        Regex::new(r#"(?m)^export\s*\{([^}]*)\}\s*from\s*['"]([^'"]+)['"]\s*;?"#).unwrap();
    static ref EXPORT_INLINE: Regex = Regex::new(r"(?m)^export\s*\{([^}]*)\}\s*;?").unwrap();
    static ref EXPORT_DECL: Regex = Regex::new(r"(?m)^export\s+(const|let|var)\s+(\w+)").unwrap();
    static ref EXPORT_FUNCTION: Regex =
        Regex::new(r"(?m)^export\s+(async\s+function|function|class)\s+(\w+)").unwrap();
    static ref IMPORT_META_URL: Regex = Regex::new(r"import\.meta\.url").unwrap();
    static ref IMPORT_META_DIRNAME: Regex = Regex::new(r"import\.meta\.dirname").unwrap();
    static ref IMPORT_META_FILENAME: Regex = Regex::new(r"import\.meta\.filename").unwrap();
    static ref DYNAMIC_IMPORT: Regex = Regex::new(r"(?:^|[^\w$])import\s*\(").unwrap();
}

/// Heuristic CJS detection: `.cjs`-shaped files are skipped upstream by the
/// caller; here we only guard against sources that already assign to
/// `module.exports`/`exports.` with no ESM token, which the regex above
/// already excludes by requiring a leading `import`/`export` keyword.
fn should_rewrite_esm(source: &str) -> bool {
    IMPORT_EXPORT_TOKEN.is_match(source)
}

/// Rewrites ESM syntax to CommonJS, appending `module.exports` assignments
/// at end of file so forward references to declared exports work
/// regardless of where in the file they're declared (spec.md §4.2 step 2).
fn rewrite_esm_to_cjs(source: &str) -> String {
    let mut out = source.to_string();
    let mut trailing_exports: Vec<String> = Vec::new();

    out = IMPORT_DEFAULT_AND_NAMED
        .replace_all(&out, |caps: &regex::Captures| {
            let default_name = &caps[1];
            let named = &caps[2];
            let spec = &caps[3];
            let mut lines = vec![format!("const {default_name} = require('{spec}').default ?? require('{spec}');")];
            for binding in split_named_bindings(named) {
                lines.push(format!("const {} = require('{spec}').{};", binding.local, binding.imported));
            }
            lines.join("\n")
        })
        .into_owned();

    out = IMPORT_NAMED
        .replace_all(&out, |caps: &regex::Captures| {
            let named = &caps[1];
            let spec = &caps[2];
            split_named_bindings(named)
                .into_iter()
                .map(|b| format!("const {} = require('{spec}').{};", b.local, b.imported))
                .collect::<Vec<_>>()
                .join("\n")
        })
        .into_owned();

    out = IMPORT_NAMESPACE
        .replace_all(&out, |caps: &regex::Captures| format!("const {} = require('{}');", &caps[1], &caps[2]))
        .into_owned();

    out = IMPORT_DEFAULT
        .replace_all(&out, |caps: &regex::Captures| {
            format!("const {} = require('{}').default ?? require('{}');", &caps[1], &caps[2], &caps[2])
        })
        .into_owned();

    out = IMPORT_SIDE_EFFECT.replace_all(&out, |caps: &regex::Captures| format!("require('{}');", &caps[1])).into_owned();

    out = EXPORT_STAR
        .replace_all(&out, |caps: &regex::Captures| {
            format!("Object.assign(module.exports, require('{}'));", &caps[1])
        })
        .into_owned();

    out = EXPORT_NAMED_FROM
        .replace_all(&out, |caps: &regex::Captures| {
            let spec = &caps[2];
            split_named_bindings(&caps[1])
                .into_iter()
                .map(|b| format!("module.exports.{} = require('{spec}').{};", b.local, b.imported))
                .collect::<Vec<_>>()
                .join("\n")
        })
        .into_owned();

    out = EXPORT_INLINE
        .replace_all(&out, |caps: &regex::Captures| {
            split_named_bindings(&caps[1])
                .into_iter()
                .map(|b| format!("module.exports.{} = {};", b.imported, b.local))
                .collect::<Vec<_>>()
                .join("\n")
        })
        .into_owned();

    out = EXPORT_DECL.replace_all(&out, "$1 ").into_owned();
    // Collect names declared via `export const|let|var NAME` (post-rewrite the
    // `export` keyword above is already stripped, so re-scan the original).
    for caps in EXPORT_DECL.captures_iter(source) {
        trailing_exports.push(caps[2].to_string());
    }

    out = EXPORT_FUNCTION.replace_all(&out, "$1 ").into_owned();
    for caps in EXPORT_FUNCTION.captures_iter(source) {
        trailing_exports.push(caps[2].to_string());
    }

    out = EXPORT_DEFAULT.replace_all(&out, "module.exports.default = ").into_owned();

    out = IMPORT_META_URL.replace_all(&out, "__import_meta.url").into_owned();
    out = IMPORT_META_DIRNAME.replace_all(&out, "__import_meta.dirname").into_owned();
    out = IMPORT_META_FILENAME.replace_all(&out, "__import_meta.filename").into_owned();

    if !trailing_exports.is_empty() {
        out.push('\n');
        for name in trailing_exports {
            out.push_str(&format!("module.exports.{name} = {name};\n"));
        }
    }
    out.push_str("\nmodule.exports.__esModule = true;\n");
    out
}

struct NamedBinding {
    imported: String,
    local: String,
}

/// Splits `"a, b as c, d"` into `[{imported:a,local:a},{imported:b,local:c},{imported:d,local:d}]`.
fn split_named_bindings(list: &str) -> Vec<NamedBinding> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|entry| {
            if let Some((imported, local)) = entry.split_once(" as ") {
                NamedBinding { imported: imported.trim().to_string(), local: local.trim().to_string() }
            } else {
                NamedBinding { imported: entry.to_string(), local: entry.to_string() }
            }
        })
        .collect()
}

/// Rewrites `import(` (not preceded by a word character or `$`, per
/// spec.md §4.2 step 3) to the sentinel `__dynamicImport(`.
fn rewrite_dynamic_import(source: &str) -> String {
    DYNAMIC_IMPORT
        .replace_all(source, |caps: &regex::Captures| {
            let matched = &caps[0];
            let prefix_len = matched.len() - "import(".len();
            format!("{}__dynamicImport(", &matched[..prefix_len])
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shebang_only_source_is_a_noop_after_strip() {
        let out = transform_uncached("#!/usr/bin/env node\nconsole.log(1);");
        assert_eq!(out.trim(), "console.log(1);");
    }

    #[test]
    fn named_and_default_export_round_trip() {
        let src = "import Foo from 'x';\nexport const bar = Foo + 1;\nexport default bar;\n";
        let out = transform_uncached(src);
        assert!(out.contains("const Foo = require('x').default ?? require('x');"));
        assert!(out.contains("const bar = Foo + 1;"));
        assert!(out.contains("module.exports.bar = bar;"));
        assert!(out.contains("module.exports.default = bar;"));
        assert!(out.contains("module.exports.__esModule = true;"));
    }

    #[test]
    fn dynamic_import_gets_sentinel_rewrite() {
        let out = transform_uncached("doThing(); const p = import('./x.js');");
        assert!(out.contains("__dynamicImport('./x.js')"));
    }

    #[test]
    fn plain_cjs_source_is_untouched_by_esm_pass() {
        let src = "const x = require('y');\nmodule.exports = x;\n";
        let out = transform_uncached(src);
        assert_eq!(out, src);
    }

    #[test]
    fn import_meta_url_is_rewritten() {
        let out = transform_uncached("export const here = import.meta.url;\n");
        assert!(out.contains("__import_meta.url"));
    }
}

//! Detect phase (spec.md §4.8 step 3): classify a bootstrapped project into
//! one of five runnable kinds.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::vfs::VirtualFs;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectKind {
    Dist,
    Ssr,
    ClientBundler,
    ScriptedEntry,
    Static,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectedRunnableProject {
    pub kind: ProjectKind,
    pub root: PathBuf,
    pub entry: Option<PathBuf>,
    /// Default port a `start` phase should prefer before walking upward.
    pub port_hint: u16,
}

/// Dependencies whose presence marks a project as SSR-framework-driven.
const SSR_DEPENDENCIES: &[&str] = &["next", "nuxt", "@remix-run/node", "astro", "sveltekit", "@sveltejs/kit"];
const SSR_CONFIG_FILES: &[&str] =
    &["next.config.js", "next.config.mjs", "nuxt.config.ts", "astro.config.mjs", "svelte.config.js"];

const CLIENT_BUNDLER_DEPENDENCIES: &[&str] = &["vite", "webpack", "parcel", "rollup", "esbuild"];
const CLIENT_BUNDLER_CONFIG_FILES: &[&str] = &["vite.config.ts", "vite.config.js", "webpack.config.js"];

const SCRIPT_FIELDS: &[&str] = &["bun", "dev", "start", "serve", "preview"];
const DEFAULT_ENTRY_CANDIDATES: &[&str] = &["index.js", "index.ts", "server.js", "main.js"];

const FALLBACK_SEARCH_DEPTH_DEFAULT: usize = 3;

/// Starting from `project_path`, attempts to classify the project per
/// spec.md §4.8 step 3's ordered preference, descending up to
/// `fallback_search_depth` directories if the root itself carries no signal.
pub fn detect_runnable_project(
    vfs: &dyn VirtualFs,
    project_path: &Path,
    fallback_search_depth: Option<usize>,
) -> Option<DetectedRunnableProject> {
    if let Some(detected) = classify_at(vfs, project_path) {
        return Some(detected);
    }

    let depth = fallback_search_depth.unwrap_or(FALLBACK_SEARCH_DEPTH_DEFAULT);
    let mut candidates: Vec<(DetectedRunnableProject, i32)> = Vec::new();
    descend_and_score(vfs, project_path, depth, 0, &mut candidates);
    candidates.sort_by(|a, b| b.1.cmp(&a.1));
    candidates.into_iter().next().map(|(detected, _)| detected)
}

fn descend_and_score(
    vfs: &dyn VirtualFs,
    dir: &Path,
    max_depth: usize,
    current_depth: usize,
    out: &mut Vec<(DetectedRunnableProject, i32)>,
) {
    if current_depth > max_depth {
        return;
    }
    if let Some(detected) = classify_at(vfs, dir) {
        let depth_penalty = current_depth as i32;
        let ssr_bonus = if detected.kind == ProjectKind::Ssr { 10 } else { 0 };
        out.push((detected, ssr_bonus - depth_penalty));
    }
    if current_depth == max_depth {
        return;
    }
    let Ok(entries) = vfs.read_dir(dir) else { return };
    for name in entries {
        if name == "node_modules" || name.starts_with('.') {
            continue;
        }
        let child = dir.join(&name);
        if matches!(vfs.stat(&child), Ok(stat) if stat.is_directory()) {
            descend_and_score(vfs, &child, max_depth, current_depth + 1, out);
        }
    }
}

fn read_manifest(vfs: &dyn VirtualFs, root: &Path) -> Option<Value> {
    vfs.read_to_string(&root.join("package.json")).ok().and_then(|text| serde_json::from_str(&text).ok())
}

fn classify_at(vfs: &dyn VirtualFs, root: &Path) -> Option<DetectedRunnableProject> {
    classify_dist(vfs, root)
        .or_else(|| classify_ssr(vfs, root))
        .or_else(|| classify_client_bundler(vfs, root))
        .or_else(|| classify_scripted_entry(vfs, root))
        .or_else(|| classify_static(vfs, root))
}

fn classify_dist(vfs: &dyn VirtualFs, root: &Path) -> Option<DetectedRunnableProject> {
    let dist = root.join("dist");
    if !vfs.exists(&dist) {
        return None;
    }
    let has_manifest = vfs.exists(&dist.join("routes-manifest.json")) || vfs.exists(&dist.join("api-manifest.json"));
    has_manifest.then(|| DetectedRunnableProject {
        kind: ProjectKind::Dist,
        root: root.to_path_buf(),
        entry: Some(dist),
        port_hint: 3000,
    })
}

fn classify_ssr(vfs: &dyn VirtualFs, root: &Path) -> Option<DetectedRunnableProject> {
    let manifest = read_manifest(vfs, root);
    let dep_hit = manifest
        .as_ref()
        .map(|m| dependency_names(m).iter().any(|d| SSR_DEPENDENCIES.contains(&d.as_str())))
        .unwrap_or(false);
    let config_hit = SSR_CONFIG_FILES.iter().any(|f| vfs.exists(&root.join(f)));
    let dir_hit = vfs.exists(&root.join("pages")) || vfs.exists(&root.join("app")) || vfs.exists(&root.join("src/pages"));

    if !(dep_hit || config_hit || dir_hit) {
        return None;
    }
    let entry = ["pages/index.tsx", "pages/index.js", "app/page.tsx", "src/pages/index.tsx"]
        .into_iter()
        .map(|p| root.join(p))
        .find(|p| vfs.exists(p));

    Some(DetectedRunnableProject { kind: ProjectKind::Ssr, root: root.to_path_buf(), entry, port_hint: 3000 })
}

fn classify_client_bundler(vfs: &dyn VirtualFs, root: &Path) -> Option<DetectedRunnableProject> {
    let manifest = read_manifest(vfs, root);
    let dep_hit = manifest
        .as_ref()
        .map(|m| dependency_names(m).iter().any(|d| CLIENT_BUNDLER_DEPENDENCIES.contains(&d.as_str())))
        .unwrap_or(false);
    let config_hit = CLIENT_BUNDLER_CONFIG_FILES.iter().any(|f| vfs.exists(&root.join(f)));
    let index_html = vfs.exists(&root.join("index.html"));

    if !(dep_hit || config_hit || index_html) {
        return None;
    }
    Some(DetectedRunnableProject {
        kind: ProjectKind::ClientBundler,
        root: root.to_path_buf(),
        entry: index_html.then(|| root.join("index.html")),
        port_hint: 5173,
    })
}

fn classify_scripted_entry(vfs: &dyn VirtualFs, root: &Path) -> Option<DetectedRunnableProject> {
    let manifest = read_manifest(vfs, root)?;
    let scripts = manifest.get("scripts")?.as_object()?;

    for field in SCRIPT_FIELDS {
        let Some(command) = scripts.get(*field).and_then(Value::as_str) else { continue };
        if let Some(entry) = first_local_source_file(command, root, vfs) {
            return Some(DetectedRunnableProject {
                kind: ProjectKind::ScriptedEntry,
                root: root.to_path_buf(),
                entry: Some(entry),
                port_hint: 3000,
            });
        }
    }

    if let Some(main) = manifest.get("main").and_then(Value::as_str) {
        let entry = root.join(main);
        if vfs.exists(&entry) {
            return Some(DetectedRunnableProject {
                kind: ProjectKind::ScriptedEntry,
                root: root.to_path_buf(),
                entry: Some(entry),
                port_hint: 3000,
            });
        }
    }

    DEFAULT_ENTRY_CANDIDATES.iter().map(|c| root.join(c)).find(|p| vfs.exists(p)).map(|entry| {
        DetectedRunnableProject { kind: ProjectKind::ScriptedEntry, root: root.to_path_buf(), entry: Some(entry), port_hint: 3000 }
    })
}

/// Pulls the first whitespace-separated token out of a script command that
/// resolves to a file under `root`, per spec.md §4.8's "first command
/// resolves to a local source file" rule.
fn first_local_source_file(command: &str, root: &Path, vfs: &dyn VirtualFs) -> Option<PathBuf> {
    command.split_whitespace().find_map(|token| {
        let candidate = root.join(token);
        vfs.exists(&candidate).then_some(candidate)
    })
}

fn classify_static(vfs: &dyn VirtualFs, root: &Path) -> Option<DetectedRunnableProject> {
    let has_html = vfs.exists(&root.join("index.html"));
    has_html.then(|| DetectedRunnableProject {
        kind: ProjectKind::Static,
        root: root.to_path_buf(),
        entry: Some(root.join("index.html")),
        port_hint: 8080,
    })
}

fn dependency_names(manifest: &Value) -> Vec<String> {
    let mut names = Vec::new();
    for field in ["dependencies", "devDependencies"] {
        if let Some(Value::Object(map)) = manifest.get(field) {
            names.extend(map.keys().cloned());
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vfs::MemoryFs;

    #[test]
    fn detects_static_site_from_index_html() {
        let vfs = MemoryFs::new();
        vfs.seed_file("/project/index.html", "<html></html>");
        let detected = detect_runnable_project(&vfs, Path::new("/project"), None).unwrap();
        assert_eq!(detected.kind, ProjectKind::Static);
    }

    #[test]
    fn dist_output_takes_precedence_over_static() {
        let vfs = MemoryFs::new();
        vfs.seed_file("/project/index.html", "<html></html>");
        vfs.seed_file("/project/dist/routes-manifest.json", "{}");
        let detected = detect_runnable_project(&vfs, Path::new("/project"), None).unwrap();
        assert_eq!(detected.kind, ProjectKind::Dist);
    }

    #[test]
    fn ssr_dependency_is_detected() {
        let vfs = MemoryFs::new();
        vfs.seed_file("/project/package.json", r#"{"dependencies": {"next": "14.0.0"}}"#);
        vfs.seed_file("/project/pages/index.tsx", "export default function Page() {}");
        let detected = detect_runnable_project(&vfs, Path::new("/project"), None).unwrap();
        assert_eq!(detected.kind, ProjectKind::Ssr);
    }

    #[test]
    fn scripted_entry_resolves_dev_script_target() {
        let vfs = MemoryFs::new();
        vfs.seed_file("/project/package.json", r#"{"scripts": {"dev": "node server.js"}}"#);
        vfs.seed_file("/project/server.js", "require('http').createServer().listen(3000);");
        let detected = detect_runnable_project(&vfs, Path::new("/project"), None).unwrap();
        assert_eq!(detected.kind, ProjectKind::ScriptedEntry);
        assert_eq!(detected.entry, Some(PathBuf::from("/project/server.js")));
    }

    #[test]
    fn descends_bounded_depth_for_nested_packages() {
        let vfs = MemoryFs::new();
        vfs.seed_file("/project/packages/web/index.html", "<html></html>");
        let detected = detect_runnable_project(&vfs, Path::new("/project"), Some(3)).unwrap();
        assert_eq!(detected.kind, ProjectKind::Static);
        assert_eq!(detected.root, PathBuf::from("/project/packages/web"));
    }
}

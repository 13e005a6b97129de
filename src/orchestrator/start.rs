//! Start phase (spec.md §4.8 step 4): pick a port, instantiate the
//! kind-specific framework handler, and register it with the bus.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::bus::{Bus, RequestInfo, ResponseInfo, ServerHandler};
use crate::runtime::{Runtime, RuntimeConfig};
use crate::vfs::SharedVfs;

use super::detect::{DetectedRunnableProject, ProjectKind};

#[derive(Debug, Error)]
pub enum StartError {
    #[error("port {0} is already in use")]
    PortInUse(u16),
    #[error("'{entry}' did not register an HTTP server within {timeout_ms}ms")]
    ServerStartupTimeout { entry: String, timeout_ms: u64 },
    #[error("script execution failed: {0}")]
    ScriptFailed(String),
}

pub type StartResult<T> = Result<T, StartError>;

const SERVER_READY_TIMEOUT: Duration = Duration::from_secs(10);

/// A started project, owning the bus registration it created. Dropping
/// without calling `stop` leaves the handler registered; callers that want
/// deterministic teardown must call `stop` explicitly.
pub struct RunningProject {
    pub port: u16,
    pub url: String,
    pub kind: ProjectKind,
    owns_registration: bool,
}

impl RunningProject {
    pub fn stop(&mut self) {
        if self.owns_registration {
            Bus::global().unregister_server(self.port);
            self.owns_registration = false;
        }
    }
}

impl Drop for RunningProject {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Serves a directory out of the VFS verbatim: `GET /` maps to `index.html`,
/// any other path maps to `root/path` with a directory falling back to its
/// own `index.html`. Used for `Static` and `Dist` kinds (spec.md §4.6's
/// "dist project" is just a static server over a different root).
struct StaticFileHandler {
    vfs: SharedVfs,
    root: PathBuf,
}

impl ServerHandler for StaticFileHandler {
    fn handle_request(&self, request: RequestInfo) -> ResponseInfo {
        let url_path = request.url.split('?').next().unwrap_or("/");
        let relative = url_path.trim_start_matches('/');
        let mut candidate = if relative.is_empty() { self.root.join("index.html") } else { self.root.join(relative) };

        if matches!(self.vfs.stat(&candidate), Ok(stat) if stat.is_directory()) {
            candidate = candidate.join("index.html");
        }

        match self.vfs.read_file(&candidate) {
            Ok(bytes) => {
                let mut headers = HashMap::new();
                headers.insert("content-type".to_string(), content_type_for(&candidate));
                ResponseInfo { status: 200, headers, body: String::from_utf8_lossy(&bytes).into_owned() }
            }
            Err(_) => {
                let mut headers = HashMap::new();
                headers.insert("content-type".to_string(), "text/plain".to_string());
                ResponseInfo { status: 404, headers, body: format!("not found: {url_path}") }
            }
        }
    }
}

fn content_type_for(path: &Path) -> String {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html") => "text/html; charset=utf-8",
        Some("js" | "mjs") => "text/javascript; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("json") => "application/json",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
    .to_string()
}

/// Registers `handler` at `preferred_port`, falling back to the bus's
/// port-selection walk (spec.md §4.7) when a port isn't explicitly chosen.
fn register(preferred_port: u16, handler: Arc<dyn ServerHandler>) -> StartResult<u16> {
    Bus::global().register_server(preferred_port, handler).map_err(|_| StartError::PortInUse(preferred_port))
}

/// Starts the detected project and returns the `RunningProject` handle the
/// orchestrator's observe phase (and tests) dispatch requests through.
pub fn start_detected_project(
    vfs: &SharedVfs,
    detected: &DetectedRunnableProject,
    port_override: Option<u16>,
) -> StartResult<RunningProject> {
    let port_request = port_override.unwrap_or(detected.port_hint);

    match detected.kind {
        ProjectKind::Static | ProjectKind::Dist | ProjectKind::ClientBundler => {
            let serve_root = match detected.kind {
                ProjectKind::Dist => detected.root.join("dist"),
                _ => detected.root.clone(),
            };
            let handler = Arc::new(StaticFileHandler { vfs: vfs.clone(), root: serve_root });
            let port = register(port_request, handler)?;
            Ok(RunningProject {
                port,
                url: Bus::global().get_server_url(port).unwrap_or_default(),
                kind: detected.kind,
                owns_registration: true,
            })
        }
        ProjectKind::Ssr | ProjectKind::ScriptedEntry => start_node_script(vfs, detected, port_request),
    }
}

/// Runs the detected entry file to completion of its top-level module body
/// on a dedicated OS thread (the evaluator's `Context` is not `Send`, so it
/// cannot hop threads once created — see `runtime::http`'s thread-local
/// bridge), then polls the bus for a newly registered port up to
/// `SERVER_READY_TIMEOUT`, matching spec.md §4.8 step 4's "wait up to a
/// bounded timeout for a server-ready signal."
///
/// The runtime currently reads source off the real filesystem rather than
/// the `VirtualFs` passed in (that generalization is still in progress — see
/// DESIGN.md), so an in-memory VFS is materialized to a temp directory first.
fn start_node_script(vfs: &SharedVfs, detected: &DetectedRunnableProject, _preferred_port: u16) -> StartResult<RunningProject> {
    // `_preferred_port` is advisory only for node-script kinds: the script
    // itself chooses its listen port via `Viper.serve`/`http.createServer`.
    let entry = detected
        .entry
        .clone()
        .ok_or_else(|| StartError::ScriptFailed("no entry file detected".to_string()))?;

    let materialized_root = materialize_to_tempdir(vfs, &detected.root)
        .map_err(|e| StartError::ScriptFailed(format!("failed to materialize project for execution: {e}")))?;
    let relative_entry = entry.strip_prefix(&detected.root).unwrap_or(&entry);
    let real_entry = materialized_root.join(relative_entry);

    let ports_before = Bus::global().get_server_ports();
    let entry_display = entry.display().to_string();

    std::thread::spawn(move || {
        let config = RuntimeConfig { base_path: materialized_root.clone(), ..Default::default() };
        match Runtime::with_config(config) {
            Ok(mut runtime) => {
                if let Err(e) = runtime.run_file(&real_entry) {
                    tracing::error!(entry = %real_entry.display(), error = %e, "scripted entry failed");
                }
            }
            Err(e) => tracing::error!(error = %e, "failed to construct runtime for scripted entry"),
        }
    });

    let deadline = std::time::Instant::now() + SERVER_READY_TIMEOUT;
    loop {
        let now_ports = Bus::global().get_server_ports();
        if let Some(&port) = now_ports.iter().find(|p| !ports_before.contains(p)) {
            return Ok(RunningProject {
                port,
                url: Bus::global().get_server_url(port).unwrap_or_default(),
                kind: detected.kind,
                owns_registration: false,
            });
        }
        if std::time::Instant::now() >= deadline {
            return Err(StartError::ServerStartupTimeout {
                entry: entry_display,
                timeout_ms: SERVER_READY_TIMEOUT.as_millis() as u64,
            });
        }
        std::thread::sleep(Duration::from_millis(25));
    }
}

fn materialize_to_tempdir(vfs: &SharedVfs, root: &Path) -> std::io::Result<PathBuf> {
    use std::sync::atomic::{AtomicU64, Ordering};
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let unique = COUNTER.fetch_add(1, Ordering::Relaxed);
    let dest = std::env::temp_dir().join(format!("viper-run-{}-{unique}", std::process::id()));
    copy_tree(vfs, root, &dest)?;
    Ok(dest)
}

fn copy_tree(vfs: &SharedVfs, src: &Path, dest: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dest)?;
    let Ok(entries) = vfs.read_dir(src) else { return Ok(()) };
    for name in entries {
        let src_path = src.join(&name);
        let dest_path = dest.join(&name);
        match vfs.stat(&src_path) {
            Ok(stat) if stat.is_directory() => copy_tree(vfs, &src_path, &dest_path)?,
            Ok(stat) if stat.is_file() => {
                if let Ok(bytes) = vfs.read_file(&src_path) {
                    std::fs::write(&dest_path, bytes)?;
                }
            }
            _ => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vfs::MemoryFs;
    use std::sync::Arc;

    #[test]
    fn static_handler_serves_index_html() {
        let vfs: SharedVfs = Arc::new(MemoryFs::new());
        vfs.write_file(Path::new("/project/index.html"), b"<h1>hi</h1>").unwrap();
        let detected = DetectedRunnableProject {
            kind: ProjectKind::Static,
            root: PathBuf::from("/project"),
            entry: Some(PathBuf::from("/project/index.html")),
            port_hint: 0,
        };
        let mut running = start_detected_project(&vfs, &detected, None).unwrap();
        let response = Bus::global().handle_request(
            running.port,
            RequestInfo { method: "GET".into(), url: "/".into(), headers: HashMap::new(), body: String::new() },
        );
        assert_eq!(response.status, 200);
        assert!(response.body.contains("hi"));
        running.stop();
    }

    #[test]
    fn static_handler_404s_on_missing_file() {
        let vfs: SharedVfs = Arc::new(MemoryFs::new());
        vfs.write_file(Path::new("/project/index.html"), b"<h1>hi</h1>").unwrap();
        let detected = DetectedRunnableProject {
            kind: ProjectKind::Static,
            root: PathBuf::from("/project"),
            entry: Some(PathBuf::from("/project/index.html")),
            port_hint: 0,
        };
        let mut running = start_detected_project(&vfs, &detected, None).unwrap();
        let response = Bus::global().handle_request(
            running.port,
            RequestInfo { method: "GET".into(), url: "/missing.js".into(), headers: HashMap::new(), body: String::new() },
        );
        assert_eq!(response.status, 404);
        running.stop();
    }
}

//! Bootstrap phase (spec.md §4.8 step 1): repo URL parsing, archive fetch
//! with retry, and extraction into the destination VFS root.
//!
//! Grounded in the teacher's `server::hyper_server`/`server::mod` use of a
//! dedicated tokio runtime per async entry point; this module's async
//! functions are driven the same way from `Orchestrator::run_blocking`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use flate2::read::GzDecoder;
use lazy_static::lazy_static;
use regex::Regex;
use tar::Archive;
use thiserror::Error;

use crate::vfs::VirtualFs;

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("could not parse repository URL '{0}'")]
    InvalidRepoUrl(String),

    #[error("archive fetch failed for {owner}/{repo} after {attempts} attempt(s): {cause}")]
    NetworkFailed { owner: String, repo: String, attempts: u32, cause: String },

    #[error("failed to extract archive into '{0}': {1}")]
    ExtractFailed(String, String),
}

pub type BootstrapResult<T> = Result<T, BootstrapError>;

/// Parsed repository coordinates, shared by the archive and tree-listing
/// fetch paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoCoordinates {
    pub host: String,
    pub owner: String,
    pub repo: String,
    pub git_ref: Option<String>,
    pub subdir: Option<String>,
}

impl RepoCoordinates {
    fn effective_ref(&self) -> &str {
        self.git_ref.as_deref().unwrap_or("HEAD")
    }
}

lazy_static! {
    // https://host/owner/repo/tree/<ref>[/subdir]
    static ref TREE_URL: Regex = Regex::new(
        r"^https://(?P<host>[^/]+)/(?P<owner>[^/]+)/(?P<repo>[^/]+)/tree/(?P<ref>[^/]+)(?:/(?P<subdir>.+))?/?$"
    ).unwrap();
    // https://host/owner/repo[.git]
    static ref PLAIN_URL: Regex =
        Regex::new(r"^https://(?P<host>[^/]+)/(?P<owner>[^/]+)/(?P<repo>[^/]+?)(?:\.git)?/?$").unwrap();
    // git+https://host/owner/repo[.git]#ref
    static ref GIT_PLUS_URL: Regex = Regex::new(
        r"^git\+https://(?P<host>[^/]+)/(?P<owner>[^/]+)/(?P<repo>[^/#]+?)(?:\.git)?(?:#(?P<ref>.+))?$"
    ).unwrap();
    // host:owner/repo#ref
    static ref SHORT_FORM: Regex =
        Regex::new(r"^(?P<host>[^:/]+):(?P<owner>[^/]+)/(?P<repo>[^#]+)(?:#(?P<ref>.+))?$").unwrap();
}

/// Parses the four accepted repository-URL shapes from spec.md §4.8 step 1.
pub fn parse_repo_url(url: &str) -> BootstrapResult<RepoCoordinates> {
    if let Some(caps) = TREE_URL.captures(url) {
        return Ok(RepoCoordinates {
            host: caps["host"].to_string(),
            owner: caps["owner"].to_string(),
            repo: caps["repo"].to_string(),
            git_ref: Some(caps["ref"].to_string()),
            subdir: caps.name("subdir").map(|m| m.as_str().to_string()),
        });
    }
    if let Some(caps) = GIT_PLUS_URL.captures(url) {
        return Ok(RepoCoordinates {
            host: caps["host"].to_string(),
            owner: caps["owner"].to_string(),
            repo: caps["repo"].to_string(),
            git_ref: caps.name("ref").map(|m| m.as_str().to_string()),
            subdir: None,
        });
    }
    if let Some(caps) = SHORT_FORM.captures(url) {
        return Ok(RepoCoordinates {
            host: caps["host"].to_string(),
            owner: caps["owner"].to_string(),
            repo: caps["repo"].to_string(),
            git_ref: caps.name("ref").map(|m| m.as_str().to_string()),
            subdir: None,
        });
    }
    if let Some(caps) = PLAIN_URL.captures(url) {
        return Ok(RepoCoordinates {
            host: caps["host"].to_string(),
            owner: caps["owner"].to_string(),
            repo: caps["repo"].to_string(),
            git_ref: None,
            subdir: None,
        });
    }
    Err(BootstrapError::InvalidRepoUrl(url.to_string()))
}

/// codeload.github.com-style archive endpoint. Hosts other than github.com
/// are assumed to mirror the same `codeload.<host>` convention; that
/// assumption is documented in DESIGN.md.
fn codeload_url(coords: &RepoCoordinates) -> String {
    let codeload_host = if coords.host == "github.com" {
        "codeload.github.com".to_string()
    } else {
        format!("codeload.{}", coords.host)
    };
    format!(
        "https://{codeload_host}/{}/{}/tar.gz/{}",
        coords.owner,
        coords.repo,
        coords.effective_ref()
    )
}

fn tree_api_url(coords: &RepoCoordinates) -> String {
    format!(
        "https://api.{}/repos/{}/{}/git/trees/{}?recursive=1",
        coords.host,
        coords.owner,
        coords.repo,
        coords.effective_ref()
    )
}

fn raw_file_url(coords: &RepoCoordinates, path: &str) -> String {
    format!(
        "https://raw.{}usercontent.com/{}/{}/{}/{}",
        coords.host,
        coords.owner,
        coords.repo,
        coords.effective_ref(),
        path
    )
}

const MAX_ATTEMPTS: u32 = 3;
const ATTEMPT_TIMEOUT: Duration = Duration::from_secs(20);

/// Fetches and extracts the repository named by `repo_url` into `dest` on
/// `vfs`, stripping the single leading archive directory (spec.md §4.8 step
/// 1). Falls back to a tree-listing + per-file raw fetch when the archive
/// download is exhausted.
pub async fn bootstrap(
    vfs: &dyn VirtualFs,
    repo_url: &str,
    dest: &Path,
) -> BootstrapResult<RepoCoordinates> {
    let coords = parse_repo_url(repo_url)?;
    let client = reqwest::Client::new();

    match fetch_archive(&client, &coords).await {
        Ok(bytes) => {
            extract_archive(vfs, &bytes, dest, coords.subdir.as_deref())?;
            Ok(coords)
        }
        Err(archive_err) => match fetch_via_tree_listing(&client, &coords, vfs, dest).await {
            Ok(()) => Ok(coords),
            Err(_) => Err(archive_err),
        },
    }
}

async fn fetch_archive(client: &reqwest::Client, coords: &RepoCoordinates) -> BootstrapResult<Vec<u8>> {
    let url = codeload_url(coords);
    let mut last_err = String::new();
    for attempt in 1..=MAX_ATTEMPTS {
        let outcome = tokio::time::timeout(ATTEMPT_TIMEOUT, client.get(&url).send()).await;
        match outcome {
            Ok(Ok(response)) if response.status().is_success() => {
                return response.bytes().await.map(|b| b.to_vec()).map_err(|e| {
                    BootstrapError::NetworkFailed {
                        owner: coords.owner.clone(),
                        repo: coords.repo.clone(),
                        attempts: attempt,
                        cause: e.to_string(),
                    }
                });
            }
            Ok(Ok(response)) => {
                last_err = format!("HTTP {}", response.status());
            }
            Ok(Err(e)) => last_err = e.to_string(),
            Err(_) => last_err = "timed out".to_string(),
        }
        tracing::warn!(attempt, %url, cause = %last_err, "archive fetch attempt failed");
    }
    Err(BootstrapError::NetworkFailed {
        owner: coords.owner.clone(),
        repo: coords.repo.clone(),
        attempts: MAX_ATTEMPTS,
        cause: last_err,
    })
}

/// Fallback path (spec.md §4.8 step 1: "fall back to a tree-listing API and
/// per-file raw fetches"). Best-effort: any single file failure aborts, the
/// caller then reports the original archive error.
async fn fetch_via_tree_listing(
    client: &reqwest::Client,
    coords: &RepoCoordinates,
    vfs: &dyn VirtualFs,
    dest: &Path,
) -> BootstrapResult<()> {
    let tree_url = tree_api_url(coords);
    let body = client
        .get(&tree_url)
        .send()
        .await
        .map_err(|e| network_failed(coords, e.to_string()))?
        .json::<serde_json::Value>()
        .await
        .map_err(|e| network_failed(coords, e.to_string()))?;

    let entries = body
        .get("tree")
        .and_then(|t| t.as_array())
        .cloned()
        .unwrap_or_default();

    for entry in entries {
        let Some("blob") = entry.get("type").and_then(|t| t.as_str()) else { continue };
        let Some(path) = entry.get("path").and_then(|p| p.as_str()) else { continue };
        let raw_url = raw_file_url(coords, path);
        let bytes = client
            .get(&raw_url)
            .send()
            .await
            .map_err(|e| network_failed(coords, e.to_string()))?
            .bytes()
            .await
            .map_err(|e| network_failed(coords, e.to_string()))?;
        vfs.write_file(&dest.join(path), &bytes)
            .map_err(|e| BootstrapError::ExtractFailed(dest.display().to_string(), e.to_string()))?;
    }
    Ok(())
}

fn network_failed(coords: &RepoCoordinates, cause: String) -> BootstrapError {
    BootstrapError::NetworkFailed { owner: coords.owner.clone(), repo: coords.repo.clone(), attempts: 1, cause }
}

/// Extracts a gzip'd tarball into `vfs` at `dest`, stripping the single
/// leading path component every codeload-style archive wraps its files in,
/// and optionally re-rooting at `subdir` when the URL named a subdirectory.
fn extract_archive(vfs: &dyn VirtualFs, bytes: &[u8], dest: &Path, subdir: Option<&str>) -> BootstrapResult<()> {
    let decoder = GzDecoder::new(bytes);
    let mut archive = Archive::new(decoder);
    let entries = archive
        .entries()
        .map_err(|e| BootstrapError::ExtractFailed(dest.display().to_string(), e.to_string()))?;

    for entry in entries {
        let mut entry = entry.map_err(|e| BootstrapError::ExtractFailed(dest.display().to_string(), e.to_string()))?;
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let raw_path = entry.path().map_err(|e| BootstrapError::ExtractFailed(dest.display().to_string(), e.to_string()))?;
        let stripped: PathBuf = raw_path.components().skip(1).collect();
        let relative = match subdir {
            Some(sub) => match stripped.strip_prefix(sub) {
                Ok(rest) => rest.to_path_buf(),
                Err(_) => continue,
            },
            None => stripped,
        };
        if relative.as_os_str().is_empty() {
            continue;
        }
        let mut contents = Vec::new();
        std::io::Read::read_to_end(&mut entry, &mut contents)
            .map_err(|e| BootstrapError::ExtractFailed(dest.display().to_string(), e.to_string()))?;
        vfs.write_file(&dest.join(&relative), &contents)
            .map_err(|e| BootstrapError::ExtractFailed(dest.display().to_string(), e.to_string()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_https_url() {
        let coords = parse_repo_url("https://github.com/owner/repo").unwrap();
        assert_eq!(coords.owner, "owner");
        assert_eq!(coords.repo, "repo");
        assert_eq!(coords.git_ref, None);
    }

    #[test]
    fn parses_dot_git_suffix() {
        let coords = parse_repo_url("https://github.com/owner/repo.git").unwrap();
        assert_eq!(coords.repo, "repo");
    }

    #[test]
    fn parses_tree_url_with_ref_and_subdir() {
        let coords = parse_repo_url("https://github.com/owner/repo/tree/main/examples/demo").unwrap();
        assert_eq!(coords.git_ref.as_deref(), Some("main"));
        assert_eq!(coords.subdir.as_deref(), Some("examples/demo"));
    }

    #[test]
    fn parses_git_plus_url_with_fragment_ref() {
        let coords = parse_repo_url("git+https://github.com/owner/repo#v1.2.3").unwrap();
        assert_eq!(coords.git_ref.as_deref(), Some("v1.2.3"));
    }

    #[test]
    fn parses_short_form() {
        let coords = parse_repo_url("github.com:owner/repo#main").unwrap();
        assert_eq!(coords.host, "github.com");
        assert_eq!(coords.git_ref.as_deref(), Some("main"));
    }

    #[test]
    fn rejects_unrecognized_shapes() {
        assert!(parse_repo_url("not a url").is_err());
    }

    #[test]
    fn codeload_url_uses_github_codeload_host() {
        let coords = parse_repo_url("https://github.com/owner/repo").unwrap();
        assert_eq!(codeload_url(&coords), "https://codeload.github.com/owner/repo/tar.gz/HEAD");
    }
}

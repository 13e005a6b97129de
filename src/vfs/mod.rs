//! Virtual filesystem capability consumed by the rest of the runtime
//!
//! The module-execution runtime never touches `std::fs` directly: every read,
//! write, directory listing, and watch goes through the [`VirtualFs`] trait
//! defined here. This mirrors how the teacher's `fs::fast` module wrapped
//! direct syscalls behind a handful of free functions, except the backing
//! store is now swappable.
//!
//! Two implementations ship with this crate:
//! - [`MemoryFs`], a byte-addressed in-memory tree, used by the orchestrator
//!   once a repository has been fetched and extracted.
//! - [`NativeFs`], a thin `std::fs` adapter for local development (`viper run
//!   ./file.ts` against a real checkout).
//!
//! All paths are POSIX-style and absolute; no symlinks are modeled.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by a [`VirtualFs`] implementation.
#[derive(Error, Debug, Clone)]
pub enum VfsError {
    #[error("no such file or directory: {0}")]
    NotFound(String),

    #[error("not a file: {0}")]
    NotAFile(String),

    #[error("not a directory: {0}")]
    NotADirectory(String),

    #[error("io error at {path}: {message}")]
    Io { path: String, message: String },
}

pub type VfsResult<T> = Result<T, VfsError>;

/// File-or-directory classification, mirroring `fs.Stats.isFile()`/`isDirectory()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// Minimal stat record, matching spec.md's `statSync` contract.
#[derive(Debug, Clone, Copy)]
pub struct Stat {
    pub kind: EntryKind,
    pub size: u64,
}

impl Stat {
    pub fn is_file(&self) -> bool {
        matches!(self.kind, EntryKind::File)
    }

    pub fn is_directory(&self) -> bool {
        matches!(self.kind, EntryKind::Directory)
    }
}

/// A watch event delivered to a registered callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchEvent {
    Change,
    Rename,
}

/// Handle returned by `watch`; dropping or calling `close` stops delivery.
pub trait WatchHandle {
    fn close(&self);
}

struct NoopWatch;
impl WatchHandle for NoopWatch {
    fn close(&self) {}
}

/// The narrow capability set the module-execution runtime consumes (§6.1).
///
/// Implementations must normalize paths to POSIX-absolute form themselves;
/// callers always pass already-normalized paths constructed by the resolver.
pub trait VirtualFs: Send + Sync {
    fn read_file(&self, path: &Path) -> VfsResult<Vec<u8>>;
    fn write_file(&self, path: &Path, contents: &[u8]) -> VfsResult<()>;
    fn read_dir(&self, path: &Path) -> VfsResult<Vec<String>>;
    fn stat(&self, path: &Path) -> VfsResult<Stat>;
    fn exists(&self, path: &Path) -> bool {
        self.stat(path).is_ok()
    }
    fn mkdir(&self, path: &Path, recursive: bool) -> VfsResult<()>;
    fn remove(&self, path: &Path, recursive: bool) -> VfsResult<()>;

    /// Register a watch callback. The default implementation is a no-op that
    /// never fires, satisfying the contract for backends with no change feed.
    fn watch(
        &self,
        _path: &Path,
        _recursive: bool,
        _callback: Box<dyn Fn(WatchEvent, &str) + Send + Sync>,
    ) -> Box<dyn WatchHandle> {
        Box::new(NoopWatch)
    }

    /// Read a file as UTF-8 text. Convenience built on `read_file`.
    fn read_to_string(&self, path: &Path) -> VfsResult<String> {
        let bytes = self.read_file(path)?;
        String::from_utf8(bytes).map_err(|e| VfsError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }
}

/// In-memory tree, the VFS an orchestrator run materializes a clone into.
pub struct MemoryFs {
    inner: Mutex<MemoryFsInner>,
}

#[derive(Default)]
struct MemoryFsInner {
    files: BTreeMap<String, Vec<u8>>,
    // Directories are tracked explicitly so empty dirs and `mkdir -p` work;
    // any prefix of a file path is implicitly a directory too.
    dirs: std::collections::BTreeSet<String>,
}

fn normalize(path: &Path) -> String {
    let s = path.to_string_lossy().replace('\\', "/");
    let mut parts = Vec::new();
    for part in s.split('/') {
        match part {
            "" | "." => continue,
            ".." => {
                parts.pop();
            }
            p => parts.push(p),
        }
    }
    format!("/{}", parts.join("/"))
}

fn parent_of(normalized: &str) -> String {
    match normalized.rfind('/') {
        Some(0) => "/".to_string(),
        Some(idx) => normalized[..idx].to_string(),
        None => "/".to_string(),
    }
}

impl MemoryFs {
    pub fn new() -> Self {
        let mut inner = MemoryFsInner::default();
        inner.dirs.insert("/".to_string());
        Self {
            inner: Mutex::new(inner),
        }
    }

    /// Insert a file, creating ancestor directories implicitly. Used by the
    /// orchestrator's archive-extraction step.
    pub fn seed_file(&self, path: impl AsRef<Path>, contents: impl Into<Vec<u8>>) {
        let normalized = normalize(path.as_ref());
        let mut inner = self.inner.lock().unwrap();
        let mut ancestor = parent_of(&normalized);
        loop {
            let inserted = inner.dirs.insert(ancestor.clone());
            if ancestor == "/" || !inserted {
                break;
            }
            ancestor = parent_of(&ancestor);
        }
        inner.files.insert(normalized, contents.into());
    }

    pub fn seed_dir(&self, path: impl AsRef<Path>) {
        let normalized = normalize(path.as_ref());
        self.inner.lock().unwrap().dirs.insert(normalized);
    }
}

impl Default for MemoryFs {
    fn default() -> Self {
        Self::new()
    }
}

impl VirtualFs for MemoryFs {
    fn read_file(&self, path: &Path) -> VfsResult<Vec<u8>> {
        let key = normalize(path);
        let inner = self.inner.lock().unwrap();
        inner
            .files
            .get(&key)
            .cloned()
            .ok_or_else(|| VfsError::NotFound(key))
    }

    fn write_file(&self, path: &Path, contents: &[u8]) -> VfsResult<()> {
        let key = normalize(path);
        let mut inner = self.inner.lock().unwrap();
        let mut ancestor = parent_of(&key);
        loop {
            let inserted = inner.dirs.insert(ancestor.clone());
            if ancestor == "/" || !inserted {
                break;
            }
            ancestor = parent_of(&ancestor);
        }
        inner.files.insert(key, contents.to_vec());
        Ok(())
    }

    fn read_dir(&self, path: &Path) -> VfsResult<Vec<String>> {
        let key = normalize(path);
        let inner = self.inner.lock().unwrap();
        if !inner.dirs.contains(&key) {
            return Err(VfsError::NotADirectory(key));
        }
        let prefix = if key == "/" {
            "/".to_string()
        } else {
            format!("{key}/")
        };
        let mut names = std::collections::BTreeSet::new();
        for file_path in inner.files.keys() {
            if let Some(rest) = file_path.strip_prefix(&prefix) {
                if let Some(first) = rest.split('/').next() {
                    names.insert(first.to_string());
                }
            }
        }
        for dir_path in inner.dirs.iter() {
            if dir_path == &key {
                continue;
            }
            if let Some(rest) = dir_path.strip_prefix(&prefix) {
                if let Some(first) = rest.split('/').next() {
                    if !first.is_empty() {
                        names.insert(first.to_string());
                    }
                }
            }
        }
        Ok(names.into_iter().collect())
    }

    fn stat(&self, path: &Path) -> VfsResult<Stat> {
        let key = normalize(path);
        let inner = self.inner.lock().unwrap();
        if let Some(bytes) = inner.files.get(&key) {
            return Ok(Stat {
                kind: EntryKind::File,
                size: bytes.len() as u64,
            });
        }
        if inner.dirs.contains(&key) {
            return Ok(Stat {
                kind: EntryKind::Directory,
                size: 0,
            });
        }
        Err(VfsError::NotFound(key))
    }

    fn mkdir(&self, path: &Path, recursive: bool) -> VfsResult<()> {
        let key = normalize(path);
        let mut inner = self.inner.lock().unwrap();
        if !recursive {
            let parent = parent_of(&key);
            if !inner.dirs.contains(&parent) {
                return Err(VfsError::NotFound(parent));
            }
        }
        let mut ancestor = key;
        loop {
            let inserted = inner.dirs.insert(ancestor.clone());
            if ancestor == "/" || !inserted {
                break;
            }
            ancestor = parent_of(&ancestor);
        }
        Ok(())
    }

    fn remove(&self, path: &Path, recursive: bool) -> VfsResult<()> {
        let key = normalize(path);
        let mut inner = self.inner.lock().unwrap();
        if inner.files.remove(&key).is_some() {
            return Ok(());
        }
        if inner.dirs.remove(&key) {
            if recursive {
                let prefix = format!("{key}/");
                inner.files.retain(|k, _| !k.starts_with(&prefix));
                inner.dirs.retain(|k| !k.starts_with(&prefix));
            }
            return Ok(());
        }
        Err(VfsError::NotFound(key))
    }
}

/// Adapter over the real filesystem, for running a local checkout directly
/// without going through the orchestrator's fetch-and-extract pipeline.
pub struct NativeFs {
    root: PathBuf,
}

impl NativeFs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn to_real(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

impl VirtualFs for NativeFs {
    fn read_file(&self, path: &Path) -> VfsResult<Vec<u8>> {
        std::fs::read(self.to_real(path)).map_err(|e| VfsError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    fn write_file(&self, path: &Path, contents: &[u8]) -> VfsResult<()> {
        std::fs::write(self.to_real(path), contents).map_err(|e| VfsError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    fn read_dir(&self, path: &Path) -> VfsResult<Vec<String>> {
        let entries = std::fs::read_dir(self.to_real(path)).map_err(|e| VfsError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| VfsError::Io {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
            names.push(entry.file_name().to_string_lossy().to_string());
        }
        Ok(names)
    }

    fn stat(&self, path: &Path) -> VfsResult<Stat> {
        let metadata = std::fs::metadata(self.to_real(path)).map_err(|_| {
            VfsError::NotFound(path.display().to_string())
        })?;
        Ok(Stat {
            kind: if metadata.is_dir() {
                EntryKind::Directory
            } else {
                EntryKind::File
            },
            size: metadata.len(),
        })
    }

    fn mkdir(&self, path: &Path, recursive: bool) -> VfsResult<()> {
        let real = self.to_real(path);
        let result = if recursive {
            std::fs::create_dir_all(&real)
        } else {
            std::fs::create_dir(&real)
        };
        result.map_err(|e| VfsError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    fn remove(&self, path: &Path, recursive: bool) -> VfsResult<()> {
        let real = self.to_real(path);
        let metadata = std::fs::metadata(&real).map_err(|_| {
            VfsError::NotFound(path.display().to_string())
        })?;
        let result = if metadata.is_dir() {
            if recursive {
                std::fs::remove_dir_all(&real)
            } else {
                std::fs::remove_dir(&real)
            }
        } else {
            std::fs::remove_file(&real)
        };
        result.map_err(|e| VfsError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }
}

/// Shared handle type threaded through the resolver, evaluator, and fs bindings.
pub type SharedVfs = Arc<dyn VirtualFs>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_roundtrips() {
        let fs = MemoryFs::new();
        fs.write_file(Path::new("/project/index.ts"), b"export const x = 1;")
            .unwrap();
        let bytes = fs.read_file(Path::new("/project/index.ts")).unwrap();
        assert_eq!(bytes, b"export const x = 1;");
    }

    #[test]
    fn seeded_ancestors_are_listable() {
        let fs = MemoryFs::new();
        fs.seed_file("/project/src/a.ts", "a");
        fs.seed_file("/project/src/b.ts", "b");
        let mut names = fs.read_dir(Path::new("/project/src")).unwrap();
        names.sort();
        assert_eq!(names, vec!["a.ts".to_string(), "b.ts".to_string()]);
        let root_names = fs.read_dir(Path::new("/project")).unwrap();
        assert_eq!(root_names, vec!["src".to_string()]);
    }

    #[test]
    fn stat_distinguishes_files_and_dirs() {
        let fs = MemoryFs::new();
        fs.seed_file("/project/a.ts", "a");
        assert!(fs.stat(Path::new("/project/a.ts")).unwrap().is_file());
        assert!(fs.stat(Path::new("/project")).unwrap().is_directory());
        assert!(fs.stat(Path::new("/nope")).is_err());
    }

    #[test]
    fn recursive_remove_drops_descendants() {
        let fs = MemoryFs::new();
        fs.seed_file("/project/src/a.ts", "a");
        fs.remove(Path::new("/project"), true).unwrap();
        assert!(fs.stat(Path::new("/project/src/a.ts")).is_err());
    }
}

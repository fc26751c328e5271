//! [`LocalTree`] builder for local-directory test scenarios.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// A temporary directory holding a tree of config files.
///
/// Paths passed to the helpers are relative and slash-delimited.
pub struct LocalTree {
    dir: TempDir,
}

impl LocalTree {
    /// An empty tree.
    ///
    /// # Panics
    /// Panics if the temporary directory cannot be created.
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap_or_else(|e| panic!("LocalTree: failed to create temp dir: {e}"));
        Self { dir }
    }

    /// A tree pre-populated with `files`.
    pub fn with_files(files: &[(&str, &str)]) -> Self {
        let tree = Self::new();
        for (rel, content) in files {
            tree.write(rel, content);
        }
        tree
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Absolute path of `rel` inside the tree.
    pub fn join(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    /// Write `content` at `rel`, creating parent directories.
    pub fn write(&self, rel: &str, content: impl AsRef<[u8]>) {
        let path = self.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .unwrap_or_else(|e| panic!("LocalTree: failed to create {}: {e}", parent.display()));
        }
        fs::write(&path, content)
            .unwrap_or_else(|e| panic!("LocalTree: failed to write {}: {e}", path.display()));
    }

    /// Create an empty directory at `rel`.
    pub fn mkdir(&self, rel: &str) {
        let path = self.join(rel);
        fs::create_dir_all(&path)
            .unwrap_or_else(|e| panic!("LocalTree: failed to create {}: {e}", path.display()));
    }

    /// Remove the file at `rel`.
    pub fn remove(&self, rel: &str) {
        let path = self.join(rel);
        fs::remove_file(&path)
            .unwrap_or_else(|e| panic!("LocalTree: failed to remove {}: {e}", path.display()));
    }

    /// Read the file at `rel`.
    pub fn read(&self, rel: &str) -> Vec<u8> {
        let path = self.join(rel);
        fs::read(&path).unwrap_or_else(|e| panic!("LocalTree: failed to read {}: {e}", path.display()))
    }

    /// Every regular file in the tree, keyed by relative slash path.
    pub fn snapshot(&self) -> BTreeMap<String, Vec<u8>> {
        let mut files = BTreeMap::new();
        collect(self.path(), self.path(), &mut files);
        files
    }
}

impl Default for LocalTree {
    fn default() -> Self {
        Self::new()
    }
}

fn collect(root: &Path, dir: &Path, files: &mut BTreeMap<String, Vec<u8>>) {
    let entries = fs::read_dir(dir)
        .unwrap_or_else(|e| panic!("LocalTree: failed to list {}: {e}", dir.display()));
    for entry in entries {
        let path = entry
            .unwrap_or_else(|e| panic!("LocalTree: bad entry in {}: {e}", dir.display()))
            .path();
        if path.is_dir() {
            collect(root, &path, files);
        } else {
            let rel = path
                .strip_prefix(root)
                .unwrap_or(&path)
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            let content = fs::read(&path)
                .unwrap_or_else(|e| panic!("LocalTree: failed to read {}: {e}", path.display()));
            files.insert(rel, content);
        }
    }
}

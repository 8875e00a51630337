//! Read-only inspection of a hub cache directory.
//!
//! The layout belongs to the hub client:
//! ```text
//! /opt/huggingface_cache/
//! ├── models--HiDream-ai--HiDream-I1-Full/
//! │   ├── blobs/
//! │   ├── refs/
//! │   │   └── main
//! │   └── snapshots/
//! │       └── {revision}/
//! │           ├── config.json
//! │           └── vae/
//! └── models--unsloth--Meta-Llama-3.1-8B-Instruct/
//!     └── ...
//! ```

use crate::error::Result;
use std::path::{Path, PathBuf};

pub const GIB: u64 = 1024 * 1024 * 1024;

pub fn bytes_to_gib(bytes: u64) -> f64 {
    bytes as f64 / GIB as f64
}

/// `"org/name"` -> `"models--org--name"`
pub fn repo_folder_name(repo_id: &str) -> String {
    format!("models--{}", repo_id.replace('/', "--"))
}

#[derive(Debug, Clone)]
pub struct HubCache {
    root: PathBuf,
}

impl HubCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn exists(&self) -> bool {
        self.root.is_dir()
    }

    /// Local path of `filename` in the repository's current snapshot, without
    /// touching the network.
    pub fn lookup(&self, repo_id: &str, filename: &str) -> Option<PathBuf> {
        let found = hf_hub::Cache::new(self.root.clone())
            .model(repo_id.to_string())
            .get(filename);
        tracing::debug!(repo_id = %repo_id, file = %filename, hit = found.is_some(), "cache lookup");
        found
    }

    /// Bytes held by regular files below the root. Snapshot entries are
    /// symlinks into `blobs/`, so they are skipped rather than counted twice.
    pub fn total_size(&self) -> Result<u64> {
        dir_size(&self.root)
    }

    /// Top-level directory names containing `token`, compared case-insensitively.
    pub fn dirs_matching(&self, token: &str) -> Result<Vec<String>> {
        let token = token.to_lowercase();
        let mut matches = Vec::new();

        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if name.to_lowercase().contains(&token) {
                matches.push(name);
            }
        }

        matches.sort();
        Ok(matches)
    }
}

fn dir_size(path: &Path) -> Result<u64> {
    let mut size = 0;

    for entry in std::fs::read_dir(path)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            size += dir_size(&entry.path())?;
        } else if file_type.is_file() {
            size += entry.metadata()?.len();
        }
    }

    Ok(size)
}

/// Test helper: lay out a repository snapshot the way the hub client does.
#[cfg(test)]
pub(crate) fn write_snapshot(root: &Path, repo_id: &str, files: &[(&str, &[u8])]) -> PathBuf {
    let repo_dir = root.join(repo_folder_name(repo_id));
    let revision = "0123456789abcdef";
    std::fs::create_dir_all(repo_dir.join("refs")).unwrap();
    std::fs::write(repo_dir.join("refs").join("main"), revision).unwrap();

    let snapshot = repo_dir.join("snapshots").join(revision);
    for (name, content) in files {
        let path = snapshot.join(name);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, content).unwrap();
    }
    snapshot
}

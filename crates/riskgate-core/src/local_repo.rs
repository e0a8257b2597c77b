//! Repository snapshot backed by a local checkout.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;

use crate::collaborators::{DirEntry, RepoSnapshot};

/// Reads files and directories below `root`.
///
/// Paths are repository-relative with `/` separators; paths escaping the
/// root are reported as not found.
#[derive(Debug, Clone)]
pub struct LocalRepoSnapshot {
    root: PathBuf,
}

impl LocalRepoSnapshot {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Option<PathBuf> {
        let rel = Path::new(path.trim_start_matches('/'));
        if rel
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return None;
        }
        Some(self.root.join(rel))
    }
}

/// Whether `path` exists and is a directory (`dir`) or a regular file.
async fn is_kind(path: &Path, dir: bool) -> std::io::Result<bool> {
    match tokio::fs::metadata(path).await {
        Ok(meta) => Ok(if dir { meta.is_dir() } else { meta.is_file() }),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

#[async_trait]
impl RepoSnapshot for LocalRepoSnapshot {
    async fn read_file(&self, path: &str) -> anyhow::Result<Option<String>> {
        let Some(full) = self.resolve(path) else {
            return Ok(None);
        };
        if !is_kind(&full, false).await? {
            return Ok(None);
        }
        Ok(Some(tokio::fs::read_to_string(&full).await?))
    }

    async fn list_dir(&self, path: &str) -> anyhow::Result<Option<Vec<DirEntry>>> {
        let Some(full) = self.resolve(path) else {
            return Ok(None);
        };
        if !is_kind(&full, true).await? {
            return Ok(None);
        }
        let mut reader = tokio::fs::read_dir(&full).await?;

        let mut entries = Vec::new();
        while let Some(entry) = reader.next_entry().await? {
            let is_dir = entry.file_type().await?.is_dir();
            entries.push(DirEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                is_dir,
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(Some(entries))
    }
}

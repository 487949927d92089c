//! Filesystem-backed block store: one file per key below a root directory.

use crate::key::Key;
use crate::store::{BlockStore, Result, StoreError};
use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Store mapping the key `/a/b/c` to the file `<root>/a/b/c`.
#[derive(Clone, Debug)]
pub struct FsBlockStore {
    root: PathBuf,
}

impl FsBlockStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FsBlockStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a key to a path under the root. Keys containing `.` or `..`
    /// segments have no path.
    fn path_for(&self, key: &Key) -> Option<PathBuf> {
        let mut path = self.root.clone();
        for segment in key.segments() {
            if segment == "." || segment == ".." {
                return None;
            }
            path.push(segment);
        }
        Some(path)
    }

    /// Write `value` under `key`, creating parent directories.
    pub async fn put(&self, key: &Key, value: &[u8]) -> io::Result<()> {
        let path = self.path_for(key).ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, format!("invalid key {}", key))
        })?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, value).await
    }
}

#[async_trait]
impl BlockStore for FsBlockStore {
    async fn get(&self, key: &Key) -> Result<Vec<u8>> {
        let path = self
            .path_for(key)
            .ok_or_else(|| StoreError::NotFound(key.clone()))?;
        let err = match tokio::fs::read(&path).await {
            Ok(bytes) => return Ok(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => StoreError::NotFound(key.clone()),
            Err(e) => StoreError::Read {
                key: key.clone(),
                reason: e.to_string(),
            },
        };
        // A vanished root fails every later read too.
        self.check().await?;
        Err(err)
    }

    async fn keys(&self, prefix: &Key) -> Result<Vec<Key>> {
        let Some(start) = self.path_for(prefix) else {
            return Ok(Vec::new());
        };

        let mut found = Vec::new();
        let mut pending = vec![(start, prefix.clone())];
        while let Some((dir, dir_key)) = pending.pop() {
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => {
                    return Err(StoreError::Read {
                        key: dir_key,
                        reason: e.to_string(),
                    })
                }
            };
            let read_err = |e: io::Error| StoreError::Read {
                key: dir_key.clone(),
                reason: e.to_string(),
            };
            while let Some(entry) = entries.next_entry().await.map_err(read_err)? {
                let name = entry.file_name();
                let Some(name) = name.to_str() else {
                    debug!(path = %entry.path().display(), "skipping non-utf8 entry");
                    continue;
                };
                let key = dir_key.child(name);
                if entry.file_type().await.map_err(read_err)?.is_dir() {
                    pending.push((entry.path(), key));
                } else {
                    found.push(key);
                }
            }
        }

        found.sort();
        Ok(found)
    }

    async fn check(&self) -> Result<()> {
        match tokio::fs::metadata(&self.root).await {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(StoreError::Unavailable(format!(
                "{} is not a directory",
                self.root.display()
            ))),
            Err(e) => Err(StoreError::Unavailable(format!(
                "{}: {}",
                self.root.display(),
                e
            ))),
        }
    }
}

//! Service configuration read from `service.json` in the configuration folder.
//!
//! ```json
//! {
//!   "crdt": { "datastore_namespace": "/crdt" },
//!   "datastore": { "path": "datastore" },
//!   "export": { "concurrency": 16, "timeout_secs": 30, "verify_blocks": true }
//! }
//! ```
//!
//! Every field is optional.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILE: &str = "service.json";
pub const DEFAULT_FOLDER: &str = ".crdtdot";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub crdt: CrdtSection,
    pub datastore: DatastoreSection,
    pub export: ExportSection,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrdtSection {
    /// Root key under which the replica keeps its blocks and heads.
    pub datastore_namespace: String,
}

impl Default for CrdtSection {
    fn default() -> Self {
        CrdtSection {
            datastore_namespace: "/crdt".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatastoreSection {
    /// Relative paths are resolved against the configuration folder.
    pub path: PathBuf,
}

impl Default for DatastoreSection {
    fn default() -> Self {
        DatastoreSection {
            path: PathBuf::from("datastore"),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSection {
    pub concurrency: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub verify_blocks: Option<bool>,
}

impl ExportSection {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl ServiceConfig {
    /// Load `service.json` from `folder`. A missing file yields the defaults.
    pub fn load(folder: &Path) -> Result<Self> {
        let path = folder.join(CONFIG_FILE);
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no service configuration, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("reading {}", path.display()));
            }
        };
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
    }

    /// Location of the block store.
    pub fn datastore_path(&self, folder: &Path) -> PathBuf {
        if self.datastore.path.is_absolute() {
            self.datastore.path.clone()
        } else {
            folder.join(&self.datastore.path)
        }
    }
}

/// `$HOME/.crdtdot`, or `.crdtdot` in the working directory when there is no home.
pub fn default_folder() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(DEFAULT_FOLDER))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_FOLDER))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = ServiceConfig::load(dir.path()).unwrap();
        assert_eq!(config, ServiceConfig::default());
        assert_eq!(config.crdt.datastore_namespace, "/crdt");
        assert_eq!(config.datastore_path(dir.path()), dir.path().join("datastore"));
        assert_eq!(config.export.timeout(), None);
    }

    #[test]
    fn test_partial_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            r#"{"crdt": {"datastore_namespace": "/cluster/crdt"}, "export": {"timeout_secs": 5}}"#,
        )
        .unwrap();

        let config = ServiceConfig::load(dir.path()).unwrap();
        assert_eq!(config.crdt.datastore_namespace, "/cluster/crdt");
        assert_eq!(config.datastore, DatastoreSection::default());
        assert_eq!(config.export.timeout(), Some(Duration::from_secs(5)));
        assert_eq!(config.export.concurrency, None);
    }

    #[test]
    fn test_absolute_datastore_path_kept() {
        let dir = TempDir::new().unwrap();
        let store = TempDir::new().unwrap();
        let config = ServiceConfig {
            datastore: DatastoreSection {
                path: store.path().to_path_buf(),
            },
            ..ServiceConfig::default()
        };
        assert_eq!(config.datastore_path(dir.path()), store.path());
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "{ not json").unwrap();

        let err = ServiceConfig::load(dir.path()).unwrap_err();
        assert!(err.to_string().contains("service.json"));
    }

    #[test]
    fn test_default_folder_name() {
        assert!(default_folder().ends_with(DEFAULT_FOLDER));
    }
}

//! The upload root directory.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{StorageError, StorageResult};
use crate::fs_utils::write_atomic;
use crate::key::StorageKey;

/// An upload persisted under the root.
#[derive(Debug, Clone)]
pub struct StoredUpload {
    pub key: StorageKey,
    /// Client-supplied filename, display metadata only
    pub original_filename: String,
    pub path: PathBuf,
    pub size_bytes: u64,
}

/// A single flat directory holding originals and their derivatives,
/// plus the URL prefix they are served under.
#[derive(Debug, Clone)]
pub struct StorageRoot {
    dir: PathBuf,
    public_prefix: String,
}

impl StorageRoot {
    /// Create a root. Nothing touches the filesystem until [`StorageRoot::init`].
    pub fn new(dir: impl Into<PathBuf>, public_prefix: impl AsRef<str>) -> Self {
        Self {
            dir: dir.into(),
            public_prefix: public_prefix.as_ref().trim_matches('/').to_string(),
        }
    }

    /// Create the directory if absent. Idempotent; called once at startup.
    pub async fn init(&self) -> StorageResult<()> {
        if self.public_prefix.is_empty() {
            return Err(StorageError::config_error("public prefix must not be empty"));
        }
        fs::create_dir_all(&self.dir).await?;
        info!("Upload root ready at {}", self.dir.display());
        Ok(())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn public_prefix(&self) -> &str {
        &self.public_prefix
    }

    pub fn resolve(&self, key: &StorageKey) -> PathBuf {
        self.dir.join(key.as_str())
    }

    pub fn resolve_derived(&self, key: &StorageKey) -> PathBuf {
        self.resolve(&key.derived())
    }

    /// URL path the object is served at, e.g. `/uploads/<key>`.
    pub fn public_url(&self, key: &StorageKey) -> String {
        format!("/{}/{}", self.public_prefix, key)
    }

    /// Persist raw upload bytes verbatim under a freshly generated key.
    pub async fn persist(&self, original_filename: &str, bytes: &[u8]) -> StorageResult<StoredUpload> {
        let key = StorageKey::generate(original_filename);
        let path = self.resolve(&key);

        write_atomic(&path, bytes).await?;
        debug!(key = %key, size_bytes = bytes.len(), "Stored upload");

        Ok(StoredUpload {
            key,
            original_filename: original_filename.to_string(),
            path,
            size_bytes: bytes.len() as u64,
        })
    }

    /// Read a stored object.
    pub async fn read(&self, key: &StorageKey) -> StorageResult<Vec<u8>> {
        match fs::read(self.resolve(key)).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::not_found(key.as_str()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Probe that the directory accepts writes. Used by readiness checks.
    ///
    /// Each call writes its own probe file, so overlapping checks don't
    /// remove each other's.
    pub async fn check_writable(&self) -> StorageResult<()> {
        let probe = self
            .dir
            .join(format!(".ready-probe.{}", Uuid::new_v4().simple()));
        write_atomic(&probe, b"ok").await?;
        fs::remove_file(&probe).await?;
        Ok(())
    }
}

//! Filesystem helpers for writing stored objects.

use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

use crate::error::{StorageError, StorageResult};

/// Write `bytes` to `dst` so that readers see either nothing or the whole file.
///
/// The data goes to a hidden temp file next to `dst` first and is then renamed
/// over it. The temp file lives in the same directory so the rename never
/// crosses filesystems.
pub async fn write_atomic(dst: impl AsRef<Path>, bytes: &[u8]) -> StorageResult<()> {
    let dst = dst.as_ref();
    let tmp = temp_sibling(dst);

    if let Err(e) = fs::write(&tmp, bytes).await {
        let _ = fs::remove_file(&tmp).await;
        tracing::error!("Failed to write temp file {}: {}", tmp.display(), e);
        return Err(StorageError::write_failed(dst, e));
    }

    if let Err(e) = fs::rename(&tmp, dst).await {
        let _ = fs::remove_file(&tmp).await;
        tracing::error!(
            "Failed to rename temp file {} -> {}: {}",
            tmp.display(),
            dst.display(),
            e
        );
        return Err(StorageError::write_failed(dst, e));
    }

    Ok(())
}

/// `<dir>/.<name>.<random>.tmp`
fn temp_sibling(dst: &Path) -> PathBuf {
    let name = dst
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp_name = format!(".{}.{}.tmp", name, Uuid::new_v4().simple());
    match dst.parent() {
        Some(parent) => parent.join(tmp_name),
        None => PathBuf::from(tmp_name),
    }
}

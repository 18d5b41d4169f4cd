//! File-backed `StateStorage`: one JSON document per key inside a directory.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use rbx_wizard_core::error::{CoreError, CoreResult};
use rbx_wizard_core::traits::StateStorage;
use tokio::sync::Mutex;

/// Maximum accepted size of one stored value (4 MB).
const MAX_VALUE_FILE_SIZE: u64 = 4 * 1024 * 1024;

/// Stores each key as `<dir>/<key>.json`.
///
/// Writes go to a temporary file that is then renamed over the target, so a
/// crash mid-write never leaves a truncated document behind.
pub struct JsonFileStateStorage {
    dir: PathBuf,
    /// Serializes writers; readers never see a partial file thanks to the rename.
    write_lock: Mutex<()>,
}

impl JsonFileStateStorage {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing `key`. Characters outside `[A-Za-z0-9._-]` become `_`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{file_name}.json"))
    }
}

#[async_trait]
impl StateStorage for JsonFileStateStorage {
    async fn load(&self, key: &str) -> CoreResult<Option<String>> {
        let path = self.path_for(key);

        let metadata = match tokio::fs::metadata(&path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("State file does not exist: {}", path.display());
                return Ok(None);
            }
            Err(e) => {
                return Err(CoreError::StorageError(format!(
                    "Failed to read state file metadata: {e}"
                )));
            }
        };

        if metadata.len() > MAX_VALUE_FILE_SIZE {
            return Err(CoreError::StorageError(format!(
                "State file too large: {} bytes (max: {MAX_VALUE_FILE_SIZE} bytes)",
                metadata.len()
            )));
        }

        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| CoreError::StorageError(format!("Failed to read state file: {e}")))?;
        Ok(Some(content))
    }

    async fn store(&self, key: &str, value: &str) -> CoreResult<()> {
        let path = self.path_for(key);
        let _guard = self.write_lock.lock().await;

        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            CoreError::StorageError(format!("Failed to create state directory: {e}"))
        })?;

        let temp_path = path.with_extension(format!("{}.tmp", uuid::Uuid::new_v4().simple()));
        tokio::fs::write(&temp_path, value)
            .await
            .map_err(|e| CoreError::StorageError(format!("Failed to write state file: {e}")))?;

        if let Err(e) = tokio::fs::rename(&temp_path, &path).await {
            if let Err(cleanup) = tokio::fs::remove_file(&temp_path).await {
                log::warn!("Failed to remove {}: {cleanup}", temp_path.display());
            }
            return Err(CoreError::StorageError(format!(
                "Failed to finalize state file: {e}"
            )));
        }

        log::debug!("Stored {} bytes to {}", value.len(), path.display());
        Ok(())
    }
}

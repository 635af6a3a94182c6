use crate::store::{ConversationState, ConversationStore};
use crate::types::{AppError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// One pretty-printed JSON document per conversation under `root`.
#[derive(Debug, Clone)]
pub struct FileConversationStore {
    root: PathBuf,
}

impl FileConversationStore {
    /// Open (and create if needed) the store directory.
    pub async fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&root).await.map_err(|e| {
            AppError::Store(format!("cannot create {}: {}", root.display(), e))
        })?;
        let store = Self { root };
        store.remove_stale_temp_files().await?;
        Ok(store)
    }

    /// Temp files from a process that died between write and rename.
    async fn remove_stale_temp_files(&self) -> Result<()> {
        let mut entries = tokio::fs::read_dir(&self.root).await.map_err(|e| {
            AppError::Store(format!("cannot list {}: {}", self.root.display(), e))
        })?;
        while let Ok(Some(entry)) = entries.next_entry().await {
            if entry.file_name().to_string_lossy().contains(TEMP_MARKER) {
                warn!(path = %entry.path().display(), "Removing stale temp file");
                let _ = tokio::fs::remove_file(entry.path()).await;
            }
        }
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `None` when `id` contains anything outside `[A-Za-z0-9_-]`.
    fn path_for(&self, id: &str) -> Option<PathBuf> {
        let valid = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        valid.then(|| self.root.join(format!("{}.json", id)))
    }
}

const TEMP_MARKER: &str = ".json.tmp.";

fn replace_file(tmp_path: &Path, path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let written = std::fs::write(tmp_path, contents).and_then(|_| std::fs::rename(tmp_path, path));
    if written.is_err() {
        let _ = std::fs::remove_file(tmp_path);
    }
    written
}

#[async_trait]
impl ConversationStore for FileConversationStore {
    async fn get(&self, id: &str) -> Result<Option<ConversationState>> {
        let Some(path) = self.path_for(id) else {
            return Ok(None);
        };

        let raw = match tokio::fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(AppError::Store(format!(
                    "cannot read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        serde_json::from_slice(&raw)
            .map(Some)
            .map_err(|e| AppError::Store(format!("corrupt conversation {}: {}", id, e)))
    }

    async fn save(&self, id: &str, state: &ConversationState) -> Result<()> {
        let path = self
            .path_for(id)
            .ok_or_else(|| AppError::Store(format!("invalid conversation id '{}'", id)))?;
        let contents = serde_json::to_vec_pretty(state)
            .map_err(|e| AppError::Store(format!("cannot serialize {}: {}", id, e)))?;

        let tmp_path = self.root.join(format!(
            "{}{}{}",
            id,
            TEMP_MARKER,
            uuid::Uuid::new_v4().simple()
        ));
        // Write and rename on one blocking task: dropping this future does
        // not stop the task, so the file is either replaced or untouched.
        let target = path.clone();
        tokio::task::spawn_blocking(move || replace_file(&tmp_path, &target, &contents))
            .await
            .map_err(|e| AppError::Store(format!("write task for {} failed: {}", id, e)))?
            .map_err(|e| AppError::Store(format!("cannot replace {}: {}", path.display(), e)))?;

        debug!(conversation_id = %id, path = %path.display(), "Conversation saved");
        Ok(())
    }
}

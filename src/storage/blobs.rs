//! Flat-file blob store for uploaded documents and profile images.
//!
//! Files are write-once: nothing ever rewrites an existing blob. Replacement
//! writes a new blob under a fresh generated name and deletes the old one
//! afterwards. Database columns reference blobs by storage-relative path
//! (`<area>/<generated name>`), so the store can be relocated by moving the
//! root directory.

use std::path::{Component, Path, PathBuf};

use chrono::Utc;
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("file not found in storage: {0}")]
    NotFound(String),

    #[error("invalid storage path: {0}")]
    InvalidPath(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Storage area a blob lives under. Every stored path starts with one of
/// these directory names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Area {
    Profiles,
    Documents,
}

impl Area {
    pub fn dir_name(&self) -> &'static str {
        match self {
            Area::Profiles => "profiles",
            Area::Documents => "documents",
        }
    }
}

#[derive(Debug, Clone)]
pub struct BlobStore {
    root: PathBuf,
}

impl BlobStore {
    /// Opens the store rooted at `root`, creating the root and both area
    /// directories on first run.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        for area in [Area::Profiles, Area::Documents] {
            fs::create_dir_all(root.join(area.dir_name())).await?;
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes a new blob and returns its storage-relative path. The generated
    /// name keeps the original extension but never the original file name,
    /// so hostile names cannot reach the filesystem.
    pub async fn store(
        &self,
        area: Area,
        slot_field: &str,
        original_name: &str,
        bytes: &[u8],
    ) -> Result<String, StorageError> {
        let relative = format!("{}/{}", area.dir_name(), generated_name(slot_field, original_name));
        let path = self.root.join(&relative);

        // create_new catches the generator ever producing a duplicate
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;
        file.write_all(bytes).await?;
        file.flush().await?;

        debug!(path = %relative, size = bytes.len(), "stored blob");
        Ok(relative)
    }

    /// Removes a blob if present. A missing blob is not an error; cleanup of
    /// a superseded file may race with an earlier partial cleanup.
    pub async fn delete(&self, relative: &str) -> Result<bool, StorageError> {
        let path = self.checked_path(relative)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(path = %relative, "deleted blob");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Absolute path of a stored blob, verified to exist on disk.
    pub async fn resolve(&self, relative: &str) -> Result<PathBuf, StorageError> {
        let path = self.checked_path(relative)?;
        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(path),
            Ok(_) => Err(StorageError::NotFound(relative.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(relative.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Stored paths come from our own database, but they still must not be
    /// able to escape the root.
    fn checked_path(&self, relative: &str) -> Result<PathBuf, StorageError> {
        let ok = !relative.is_empty()
            && Path::new(relative)
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !ok {
            return Err(StorageError::InvalidPath(relative.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

/// `<slot field>-<millis>-<random><ext>`, e.g. `doc1-1724380000000-9f2c51a0b3d4.pdf`.
fn generated_name(slot_field: &str, original_name: &str) -> String {
    let millis = Utc::now().timestamp_millis();
    let random = Uuid::new_v4().simple().to_string();
    let ext = Path::new(original_name)
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    format!("{}-{}-{}{}", slot_field, millis, &random[..12], ext)
}

//! Book file storage.
//!
//! Each book owns exactly one PDF, stored as `<book-id>.pdf` in a flat
//! directory. Keys are typed as [`Uuid`] so a caller can never name a path
//! outside the storage directory.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tokio::fs;
use uuid::Uuid;

/// Error type for file storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("File not found")]
    NotFound,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Storage backend for book PDFs
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Store the content for a book, replacing any previous file
    async fn save(&self, id: Uuid, content: &[u8]) -> Result<(), StorageError>;

    /// Read the whole file for a book
    async fn read(&self, id: Uuid) -> Result<Vec<u8>, StorageError>;

    /// Remove the file for a book. A missing file is not an error.
    async fn delete(&self, id: Uuid) -> Result<(), StorageError>;
}

/// Local filesystem storage
#[derive(Debug, Clone)]
pub struct LocalFileStore {
    base_dir: PathBuf,
}

impl LocalFileStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Create the storage directory if needed
    pub async fn init(&self) -> Result<(), StorageError> {
        fs::create_dir_all(&self.base_dir).await?;
        Ok(())
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn file_path(&self, id: Uuid) -> PathBuf {
        self.base_dir.join(format!("{}.pdf", id))
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn save(&self, id: Uuid, content: &[u8]) -> Result<(), StorageError> {
        let path = self.file_path(id);
        let partial = path.with_extension("pdf.part");

        // Readers never observe a half-written file
        fs::write(&partial, content).await?;
        if let Err(e) = fs::rename(&partial, &path).await {
            let _ = fs::remove_file(&partial).await;
            return Err(e.into());
        }

        tracing::debug!("Stored book file {} ({} bytes)", path.display(), content.len());
        Ok(())
    }

    async fn read(&self, id: Uuid) -> Result<Vec<u8>, StorageError> {
        match fs::read(self.file_path(id)).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StorageError::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<(), StorageError> {
        match fs::remove_file(self.file_path(id)).await {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

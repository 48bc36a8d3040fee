//! Book catalog service: metadata plus the attached PDF

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::book::{is_pdf, Book, NewBook, UpdateBook, MAX_BOOK_FILE_SIZE},
    repository::Repository,
    storage::FileStore,
};

#[derive(Clone)]
pub struct BooksService {
    repository: Repository,
    files: Arc<dyn FileStore>,
}

impl BooksService {
    pub fn new(repository: Repository, files: Arc<dyn FileStore>) -> Self {
        Self { repository, files }
    }

    pub async fn list(&self) -> AppResult<Vec<Book>> {
        self.repository.books_list().await
    }

    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Book> {
        self.repository.books_get_by_id(id).await
    }

    /// PDF content of an existing book
    pub async fn read_file(&self, id: Uuid) -> AppResult<Vec<u8>> {
        self.repository.books_get_by_id(id).await?;
        Ok(self.files.read(id).await?)
    }

    /// Store the file, then the metadata. If the metadata insert fails the
    /// file is removed again so no orphan is left behind.
    pub async fn create(&self, data: NewBook, content: Vec<u8>) -> AppResult<Book> {
        check_book_file(&content)?;

        let book = data.into_book(Uuid::new_v4());
        self.files.save(book.id, &content).await?;

        match self.repository.books_create(&book).await {
            Ok(created) => {
                tracing::info!("Created book {} ({} bytes)", created.id, content.len());
                Ok(created)
            }
            Err(e) => {
                if let Err(cleanup) = self.files.delete(book.id).await {
                    tracing::error!("Failed to remove file of unsaved book {}: {}", book.id, cleanup);
                }
                Err(e)
            }
        }
    }

    pub async fn update(&self, id: Uuid, data: UpdateBook) -> AppResult<Book> {
        self.repository.books_update(id, &data.normalized()).await
    }

    /// Delete the record, then its file
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.repository.books_delete(id).await?;

        if let Err(e) = self.files.delete(id).await {
            tracing::warn!("Book {} deleted but its file could not be removed: {}", id, e);
        }
        tracing::info!("Deleted book {}", id);
        Ok(())
    }
}

/// Reject uploads that are too large or are not PDF documents
pub fn check_book_file(content: &[u8]) -> AppResult<()> {
    if content.len() > MAX_BOOK_FILE_SIZE {
        return Err(AppError::BadRequest(format!(
            "book file exceeds the maximum size of {} bytes",
            MAX_BOOK_FILE_SIZE
        )));
    }
    if !is_pdf(content) {
        return Err(AppError::BadRequest("only pdf files are supported".to_string()));
    }
    Ok(())
}

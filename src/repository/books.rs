//! Book domain methods on Repository

use uuid::Uuid;

use super::Repository;
use crate::{
    error::{AppError, AppResult},
    models::book::{Book, UpdateBook},
};

impl Repository {
    /// List all books
    pub async fn books_list(&self) -> AppResult<Vec<Book>> {
        let rows = sqlx::query_as::<_, Book>(
            "SELECT id, title, author, subject FROM books ORDER BY title, id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Get book by ID
    pub async fn books_get_by_id(&self, id: Uuid) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT id, title, author, subject FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("book with id: {} not found", id)))
    }

    /// Insert a book record
    pub async fn books_create(&self, book: &Book) -> AppResult<Book> {
        let row = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (id, title, author, subject)
            VALUES ($1, $2, $3, $4)
            RETURNING id, title, author, subject
            "#,
        )
        .bind(book.id)
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.subject)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// Overwrite the supplied fields of a book, keeping the others
    pub async fn books_update(&self, id: Uuid, data: &UpdateBook) -> AppResult<Book> {
        if data.is_empty() {
            return self.books_get_by_id(id).await;
        }

        let mut sets = Vec::new();
        let mut idx = 2;

        macro_rules! add_field {
            ($field:expr, $name:expr) => {
                if $field.is_some() {
                    sets.push(format!("{} = ${}", $name, idx));
                    idx += 1;
                }
            };
        }

        add_field!(data.title, "title");
        add_field!(data.author, "author");
        add_field!(data.subject, "subject");

        let query = format!(
            "UPDATE books SET {} WHERE id = $1 RETURNING id, title, author, subject",
            sets.join(", ")
        );

        let mut builder = sqlx::query_as::<_, Book>(&query).bind(id);

        macro_rules! bind_field {
            ($field:expr) => {
                if let Some(ref val) = $field {
                    builder = builder.bind(val);
                }
            };
        }

        bind_field!(data.title);
        bind_field!(data.author);
        bind_field!(data.subject);

        builder
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("book with id: {} not found", id)))
    }

    /// Delete a book record
    pub async fn books_delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("book with id: {} not found", id)));
        }
        Ok(())
    }
}

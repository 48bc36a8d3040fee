//! Book model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use super::non_empty;

/// Largest accepted book file (10 MiB)
pub const MAX_BOOK_FILE_SIZE: usize = 10 << 20;

/// Leading bytes of every PDF document
const PDF_SIGNATURE: &[u8] = b"%PDF-";

/// Book metadata. The PDF itself lives in the file store under the same id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub subject: String,
}

/// Metadata fields collected from the upload form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub subject: String,
}

impl NewBook {
    pub fn into_book(self, id: Uuid) -> Book {
        Book {
            id,
            title: self.title,
            author: self.author,
            subject: self.subject,
        }
    }
}

/// Multipart form accepted by `POST /books` (documentation only)
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookForm {
    pub title: String,
    pub author: String,
    pub subject: String,
    /// PDF document, at most 10 MiB
    #[schema(value_type = String, format = Binary)]
    pub book_file: Vec<u8>,
}

/// Update book request (merge-patch: empty or missing fields keep their value)
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, ToSchema)]
pub struct UpdateBook {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
}

impl UpdateBook {
    /// Drop empty strings so they read as "not supplied"
    pub fn normalized(self) -> Self {
        Self {
            title: non_empty(self.title),
            author: non_empty(self.author),
            subject: non_empty(self.subject),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.author.is_none() && self.subject.is_none()
    }
}

/// Content sniffing: true when the bytes start with the PDF signature.
/// File names and declared content types are never consulted.
pub fn is_pdf(content: &[u8]) -> bool {
    content.starts_with(PDF_SIGNATURE)
}

//! Book endpoints

use axum::{
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::{
    multipart::{MultipartError, MultipartRejection},
    Multipart, WithRejection,
};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, CreateBookForm, NewBook, UpdateBook, MAX_BOOK_FILE_SIZE},
    AppState,
};

use super::{AuthenticatedUser, MaybeUser, MessageResponse, ResourceId};

/// List all books
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All books", body = Vec<Book>),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_books(
    State(state): State<AppState>,
    MaybeUser(claims): MaybeUser,
) -> AppResult<Json<Vec<Book>>> {
    if claims.is_none() && !state.config.access.public_book_list {
        return Err(AppError::Authentication("missing authorization header".to_string()));
    }

    let books = state.services.books.list().await?;
    Ok(Json(books))
}

/// Get book metadata by ID
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book details", body = Book),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_book(
    ResourceId(id): ResourceId,
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
) -> AppResult<Json<Book>> {
    let book = state.services.books.get_by_id(id).await?;
    Ok(Json(book))
}

/// Download the PDF of a book
#[utoipa::path(
    get,
    path = "/books/{id}/file",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Book ID")),
    responses(
        (status = 200, description = "PDF content", content_type = "application/pdf", body = Vec<u8>),
        (status = 404, description = "Book or file not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_book_file(
    ResourceId(id): ResourceId,
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
) -> AppResult<Response> {
    let content = state.services.books.read_file(id).await?;

    let disposition = HeaderValue::try_from(format!("inline; filename=\"{}.pdf\"", id))
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/pdf")),
            (header::CONTENT_LENGTH, HeaderValue::from(content.len())),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        content,
    )
        .into_response())
}

/// Upload a new book (multipart: title, author, subject, bookFile)
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body(content = CreateBookForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Book created", body = MessageResponse),
        (status = 400, description = "Not a PDF, too large or malformed form", body = crate::error::ErrorResponse),
        (status = 401, description = "Administrator privileges required", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<(StatusCode, Json<MessageResponse>)> {
    claims.require_admin()?;

    let mut multipart = multipart.map_err(|e| AppError::BadRequest(e.to_string()))?;
    let bad_form = |e: MultipartError| AppError::BadRequest(e.to_string());

    let mut data = NewBook::default();
    let mut content: Option<Vec<u8>> = None;

    while let Some(mut field) = multipart.next_field().await.map_err(bad_form)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "title" => data.title = field.text().await.map_err(bad_form)?,
            "author" => data.author = field.text().await.map_err(bad_form)?,
            "subject" => data.subject = field.text().await.map_err(bad_form)?,
            "bookFile" => {
                // Stop reading as soon as the file is over the limit
                let mut buf = Vec::new();
                while let Some(chunk) = field.chunk().await.map_err(bad_form)? {
                    if buf.len() + chunk.len() > MAX_BOOK_FILE_SIZE {
                        return Err(AppError::BadRequest(format!(
                            "book file exceeds the maximum size of {} bytes",
                            MAX_BOOK_FILE_SIZE
                        )));
                    }
                    buf.extend_from_slice(&chunk);
                }
                content = Some(buf);
            }
            other => tracing::debug!("Ignoring unexpected form field {:?}", other),
        }
    }

    let content =
        content.ok_or_else(|| AppError::BadRequest("bookFile is required".to_string()))?;

    let book = state.services.books.create(data, content).await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::created(
            format!("book created with id: {}", book.id),
            book.id,
        )),
    ))
}

/// Update a book (only non-empty fields are applied)
#[utoipa::path(
    put,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Book ID")),
    request_body = UpdateBook,
    responses(
        (status = 200, description = "Book updated", body = MessageResponse),
        (status = 401, description = "Administrator privileges required", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_book(
    ResourceId(id): ResourceId,
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    WithRejection(Json(data), _): WithRejection<Json<UpdateBook>, AppError>,
) -> AppResult<Json<MessageResponse>> {
    claims.require_admin()?;

    state.services.books.update(id, data).await?;
    Ok(Json(MessageResponse::new("book updated")))
}

/// Delete a book and its file
#[utoipa::path(
    delete,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book deleted", body = MessageResponse),
        (status = 401, description = "Administrator privileges required", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_book(
    ResourceId(id): ResourceId,
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<MessageResponse>> {
    claims.require_admin()?;

    state.services.books.delete(id).await?;
    Ok(Json(MessageResponse::new("book deleted")))
}

//! Book catalogue endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    error::{AppError, AppResult, ErrorResponse},
    models::{Book, CreateBook, UpdateBook},
};

use super::{AppJson, AppQuery};

/// `?id=` selector for checkout and return
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BookIdQuery {
    /// Book ID
    pub id: Option<String>,
}

impl BookIdQuery {
    fn require(self) -> AppResult<String> {
        self.id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| AppError::BadRequest("Missing id parameter".to_string()))
    }
}

/// List all books
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    responses(
        (status = 200, description = "All books", body = Vec<Book>),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
pub async fn list_books(State(state): State<crate::AppState>) -> AppResult<Json<Vec<Book>>> {
    let books = state.services.books.list().await?;
    Ok(Json(books))
}

/// Create a book
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    request_body = CreateBook,
    responses(
        (status = 201, description = "Book created", body = Book),
        (status = 400, description = "Invalid request body", body = ErrorResponse),
        (status = 409, description = "A book with this id already exists", body = ErrorResponse)
    )
)]
pub async fn create_book(
    State(state): State<crate::AppState>,
    AppJson(data): AppJson<CreateBook>,
) -> AppResult<(StatusCode, Json<Book>)> {
    let book = state.services.books.create(data).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

/// Get a book by ID
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    params(("id" = String, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book details", body = Book),
        (status = 404, description = "Book not found", body = ErrorResponse)
    )
)]
pub async fn get_book(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Book>> {
    let book = state.services.books.get_by_id(&id).await?;
    Ok(Json(book))
}

/// Edit a book's title, author or quantity
#[utoipa::path(
    put,
    path = "/books/{id}",
    tag = "books",
    params(("id" = String, Path, description = "Book ID")),
    request_body = UpdateBook,
    responses(
        (status = 200, description = "Book updated", body = Book),
        (status = 400, description = "Invalid request body", body = ErrorResponse),
        (status = 404, description = "Book not found", body = ErrorResponse)
    )
)]
pub async fn update_book(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
    AppJson(data): AppJson<UpdateBook>,
) -> AppResult<Json<Book>> {
    let book = state.services.books.update(&id, data).await?;
    Ok(Json(book))
}

/// Check out one copy of a book
#[utoipa::path(
    patch,
    path = "/checkout",
    tag = "lending",
    params(BookIdQuery),
    responses(
        (status = 200, description = "Copy checked out", body = Book),
        (status = 400, description = "Missing id or no copies available", body = ErrorResponse),
        (status = 404, description = "Book not found", body = ErrorResponse)
    )
)]
pub async fn checkout_book(
    State(state): State<crate::AppState>,
    AppQuery(query): AppQuery<BookIdQuery>,
) -> AppResult<Json<Book>> {
    let id = query.require()?;
    let book = state.services.books.checkout(&id).await?;
    Ok(Json(book))
}

/// Return one copy of a book
#[utoipa::path(
    patch,
    path = "/return",
    tag = "lending",
    params(BookIdQuery),
    responses(
        (status = 200, description = "Copy returned", body = Book),
        (status = 400, description = "Missing id", body = ErrorResponse),
        (status = 404, description = "Book not found", body = ErrorResponse)
    )
)]
pub async fn return_book(
    State(state): State<crate::AppState>,
    AppQuery(query): AppQuery<BookIdQuery>,
) -> AppResult<Json<Book>> {
    let id = query.require()?;
    let book = state.services.books.return_book(&id).await?;
    Ok(Json(book))
}

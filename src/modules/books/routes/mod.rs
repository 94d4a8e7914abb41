//! HTTP handlers for the Books module.
//!
//! Status codes follow the published contract, including its uneven mapping
//! of store failures: list and update answer 400, create and delete answer 500.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use bookshelf_http::error::{AppError, ErrorBody};
use serde_json::json;
use utoipa::OpenApi;
use utoipa_axum::{router::OpenApiRouter, routes};

use super::models::{Book, BookListResponse, BookPayload, UpdateResponse, UpdateResult};
use super::store::BookStore;
use super::validation::validate;

const SUCCESS: &str = "Success";

#[derive(OpenApi)]
#[openapi(
    components(schemas(Book, BookPayload, BookListResponse, UpdateResponse, UpdateResult, ErrorBody)),
    tags((name = "Books", description = "Book catalogue management"))
)]
struct BooksApi;

/// Routes of the Books module together with their OpenAPI description.
pub fn router(store: BookStore) -> OpenApiRouter {
    OpenApiRouter::with_openapi(BooksApi::openapi())
        .routes(routes!(list_books, create_book))
        .routes(routes!(get_book, update_book, delete_book))
        .with_state(store)
}

/// Create a book
#[utoipa::path(
    post,
    path = "/",
    tag = "Books",
    request_body = BookPayload,
    responses(
        (status = 200, description = "Created book", body = Book),
        (status = 400, description = "Invalid payload or name already taken", body = ErrorBody),
        (status = 500, description = "Store failure", body = ErrorBody)
    )
)]
async fn create_book(
    State(store): State<BookStore>,
    payload: Result<Json<BookPayload>, JsonRejection>,
) -> Result<Json<Book>, AppError> {
    let Json(payload) = payload?;
    let book = validate(&payload)?;

    let exists = store.exists_by_name(&book.name).await.map_err(|e| {
        tracing::error!(error = %e, name = %book.name, "name lookup failed");
        AppError::internal(e)
    })?;
    if exists {
        return Err(AppError::duplicate("already exists", Some(json!(book.name))));
    }

    let created = store.create(&book).await.map_err(|e| {
        tracing::error!(error = %e, name = %book.name, "failed to persist book");
        AppError::internal(e)
    })?;

    tracing::info!(book_id = %created.id, name = %created.name, "book created");
    Ok(Json(created))
}

/// List all books
#[utoipa::path(
    get,
    path = "/",
    tag = "Books",
    responses(
        (status = 200, description = "All books", body = BookListResponse),
        (status = 400, description = "Store failure", body = ErrorBody)
    )
)]
async fn list_books(State(store): State<BookStore>) -> Result<Json<BookListResponse>, AppError> {
    let books = store.find_all().await.map_err(|e| {
        tracing::error!(error = %e, "failed to list books");
        AppError::bad_request_with("failed to list books", &e)
    })?;

    Ok(Json(BookListResponse {
        message: SUCCESS.to_string(),
        data: books,
    }))
}

/// Fetch a book by id
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Books",
    params(("id" = String, Path, description = "Book identifier")),
    responses(
        (status = 200, description = "The book", body = Book),
        (status = 404, description = "No such book, or malformed id")
    )
)]
async fn get_book(
    State(store): State<BookStore>,
    Path(id): Path<String>,
) -> Result<Json<Book>, AppError> {
    match store.find_by_id(&id).await {
        Ok(Some(book)) => Ok(Json(book)),
        Ok(None) => Err(AppError::NotFound),
        Err(e) => {
            tracing::warn!(book_id = %id, error = %e, "book lookup failed");
            Err(AppError::NotFound)
        }
    }
}

/// Replace a book's fields
#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Books",
    params(("id" = String, Path, description = "Book identifier")),
    request_body = BookPayload,
    responses(
        (status = 200, description = "Update counts", body = UpdateResponse),
        (status = 400, description = "Missing id, invalid payload, or store rejection", body = ErrorBody),
        (status = 500, description = "Store failure", body = ErrorBody)
    )
)]
async fn update_book(
    State(store): State<BookStore>,
    Path(id): Path<String>,
    payload: Result<Json<BookPayload>, JsonRejection>,
) -> Result<Json<UpdateResponse>, AppError> {
    if id.trim().is_empty() {
        return Err(AppError::bad_request("missing book id"));
    }

    // A miss is fine here; the update then reports zero matches.
    let existing = store.find_by_id(&id).await.map_err(|e| {
        tracing::warn!(book_id = %id, error = %e, "book lookup failed before update");
        AppError::bad_request_with("failed to look up book", &e)
    })?;
    tracing::debug!(book_id = %id, found = existing.is_some(), "updating book");

    let Json(payload) = payload?;
    let book = validate(&payload)?;

    let outcome = store.update_by_id(&id, &book).await.map_err(|e| {
        if e.is_rejection() {
            tracing::warn!(book_id = %id, error = %e, "store rejected update");
            AppError::bad_request_with("failed to update book", &e)
        } else {
            tracing::error!(book_id = %id, error = %e, "book update failed");
            AppError::internal(e)
        }
    })?;

    tracing::info!(
        book_id = %id,
        matched = outcome.matched_count,
        modified = outcome.modified_count,
        "book updated"
    );
    Ok(Json(UpdateResponse {
        message: SUCCESS.to_string(),
        data: outcome.into(),
    }))
}

/// Delete a book
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Books",
    params(("id" = String, Path, description = "Book identifier")),
    responses(
        (status = 200, description = "The deleted book", body = Book),
        (status = 400, description = "Store rejected the id", body = ErrorBody),
        (status = 404, description = "No such book"),
        (status = 500, description = "Store failure", body = ErrorBody)
    )
)]
async fn delete_book(
    State(store): State<BookStore>,
    Path(id): Path<String>,
) -> Result<Json<Book>, AppError> {
    match store.delete_by_id(&id).await {
        Ok(Some(book)) => {
            tracing::info!(book_id = %id, "book deleted");
            Ok(Json(book))
        }
        Ok(None) => Err(AppError::NotFound),
        Err(e) if e.is_rejection() => {
            tracing::warn!(book_id = %id, error = %e, "store rejected delete");
            Err(AppError::bad_request_with("failed to delete book", &e))
        }
        Err(e) => {
            tracing::error!(book_id = %id, error = %e, "book delete failed");
            Err(AppError::internal(e))
        }
    }
}

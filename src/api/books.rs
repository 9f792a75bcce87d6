//! Book (catalog) endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::book::{Book, BookPage, BookQuery, CreateBook, GetBookParams, UpdateBook},
    models::user::Permission,
};

use super::{AuthenticatedUser, ValidatedJson};

/// List books with filters and pagination (public)
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    params(BookQuery),
    responses(
        (status = 200, description = "Paginated id + title projections", body = BookPage)
    )
)]
pub async fn list_books(
    State(state): State<crate::AppState>,
    Query(query): Query<BookQuery>,
) -> AppResult<Json<BookPage>> {
    let page = state.services.catalog.list(&query).await?;
    Ok(Json(page))
}

/// Get book details by ID (public)
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    params(
        ("id" = Uuid, Path, description = "Book ID"),
        GetBookParams
    ),
    responses(
        (status = 200, description = "Book details", body = Book),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(
    State(state): State<crate::AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<GetBookParams>,
) -> AppResult<Json<Book>> {
    let book = state
        .services
        .catalog
        .get(id, params.include_inactive.unwrap_or(false))
        .await?;
    Ok(Json(book))
}

/// Add a book to the catalog
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = CreateBook,
    responses(
        (status = 201, description = "Book created", body = Book),
        (status = 400, description = "Missing fields"),
        (status = 403, description = "Missing create-book")
    )
)]
pub async fn create_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    ValidatedJson(request): ValidatedJson<CreateBook>,
) -> AppResult<(StatusCode, Json<Book>)> {
    actor.require(Permission::CreateBook)?;

    let book = state.services.catalog.create(request).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

/// Update an existing book
#[utoipa::path(
    put,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Book ID")
    ),
    request_body = UpdateBook,
    responses(
        (status = 200, description = "Book updated", body = Book),
        (status = 403, description = "Missing update-book"),
        (status = 404, description = "Book not found or inactive")
    )
)]
pub async fn update_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<Uuid>,
    ValidatedJson(update): ValidatedJson<UpdateBook>,
) -> AppResult<Json<Book>> {
    actor.require(Permission::UpdateBook)?;

    let book = state.services.catalog.update(id, update).await?;
    Ok(Json(book))
}

/// Deactivate a book (soft delete)
#[utoipa::path(
    delete,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Book ID")
    ),
    responses(
        (status = 204, description = "Book deactivated"),
        (status = 403, description = "Missing delete-book"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn delete_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    actor.require(Permission::DeleteBook)?;

    state.services.catalog.deactivate(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

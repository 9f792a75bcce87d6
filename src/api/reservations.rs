//! Reservation endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::reservation::{BookReservationView, Reservation, UserReservationView},
    models::user::Permission,
};

use super::AuthenticatedUser;

/// Return response with the closed reservation
#[derive(Serialize, ToSchema)]
pub struct ReturnResponse {
    pub status: String,
    pub reservation: Reservation,
}

/// Reserve a book for the calling user
#[utoipa::path(
    post,
    path = "/reservations/books/{book_id}/reserve",
    tag = "reservations",
    security(("bearer_auth" = [])),
    params(
        ("book_id" = Uuid, Path, description = "Book ID")
    ),
    responses(
        (status = 201, description = "Reservation created", body = Reservation),
        (status = 400, description = "Book already reserved"),
        (status = 404, description = "Book not found or inactive")
    )
)]
pub async fn reserve_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(book_id): Path<Uuid>,
) -> AppResult<(StatusCode, Json<Reservation>)> {
    let reservation = state
        .services
        .reservations
        .reserve(book_id, actor.id)
        .await?;
    Ok((StatusCode::CREATED, Json(reservation)))
}

/// Return a book reserved by the calling user
#[utoipa::path(
    post,
    path = "/reservations/books/{book_id}/return",
    tag = "reservations",
    security(("bearer_auth" = [])),
    params(
        ("book_id" = Uuid, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book returned", body = ReturnResponse),
        (status = 400, description = "No open reservation for this user"),
        (status = 404, description = "Book not found or inactive")
    )
)]
pub async fn return_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(book_id): Path<Uuid>,
) -> AppResult<Json<ReturnResponse>> {
    let reservation = state
        .services
        .reservations
        .return_book(book_id, actor.id)
        .await?;

    Ok(Json(ReturnResponse {
        status: "returned".to_string(),
        reservation,
    }))
}

/// Get a user's reservation history
#[utoipa::path(
    get,
    path = "/reservations/users/{user_id}",
    tag = "reservations",
    security(("bearer_auth" = [])),
    params(
        ("user_id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Reservations with book titles", body = Vec<UserReservationView>),
        (status = 403, description = "Not self and missing read-users")
    )
)]
pub async fn user_reservations(
    State(state): State<crate::AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<Vec<UserReservationView>>> {
    actor.require_self_or(user_id, Permission::ReadUsers)?;

    let history = state.services.reservations.user_history(user_id).await?;
    Ok(Json(history))
}

/// Get a book's reservation history
#[utoipa::path(
    get,
    path = "/reservations/books/{book_id}",
    tag = "reservations",
    security(("bearer_auth" = [])),
    params(
        ("book_id" = Uuid, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Reservations with borrower names", body = Vec<BookReservationView>)
    )
)]
pub async fn book_reservations(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_actor): AuthenticatedUser,
    Path(book_id): Path<Uuid>,
) -> AppResult<Json<Vec<BookReservationView>>> {
    let history = state.services.reservations.book_history(book_id).await?;
    Ok(Json(history))
}

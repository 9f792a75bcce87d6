//! API handlers for Biblio REST endpoints

pub mod auth;
pub mod books;
pub mod health;
pub mod openapi;
pub mod reservations;
pub mod users;

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Request},
    http::{header::AUTHORIZATION, request::Parts},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::de::DeserializeOwned;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use validator::Validate;

use crate::{error::AppError, models::user::User, AppState};

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let routes = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Authentication
        .route("/auth/login", post(auth::login))
        // Users
        .route("/users", post(users::register))
        .route("/users/:id", get(users::get_user))
        .route("/users/:id", put(users::update_user))
        .route("/users/:id", delete(users::delete_user))
        // Books (catalog)
        .route("/books", get(books::list_books))
        .route("/books", post(books::create_book))
        .route("/books/:id", get(books::get_book))
        .route("/books/:id", put(books::update_book))
        .route("/books/:id", delete(books::delete_book))
        // Reservations
        .route(
            "/reservations/books/:book_id/reserve",
            post(reservations::reserve_book),
        )
        .route(
            "/reservations/books/:book_id/return",
            post(reservations::return_book),
        )
        .route(
            "/reservations/users/:user_id",
            get(reservations::user_reservations),
        )
        .route(
            "/reservations/books/:book_id",
            get(reservations::book_reservations),
        )
        .with_state(state);

    Router::new()
        .merge(routes)
        .merge(openapi::create_openapi_router())
        .fallback(endpoint_not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

async fn endpoint_not_found() -> AppError {
    AppError::NotFound("Endpoint not found".to_string())
}

/// Extractor for the authenticated user behind a bearer token.
///
/// Decodes the token, then re-loads the account from the store: a missing or
/// deactivated account is rejected even when the token itself is still
/// valid, and capability changes made since login take effect immediately.
pub struct AuthenticatedUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("Missing authorization header".to_string()))?;

        if !auth_header.starts_with("Bearer ") {
            return Err(AppError::Unauthorized(
                "Invalid authorization header format".to_string(),
            ));
        }

        let token = &auth_header[7..];
        let claims = state.services.users.decode_token(token)?;

        let user = state
            .services
            .users
            .get_active(claims.user_id)
            .await
            .map_err(|_| AppError::Unauthorized("User account is not valid".to_string()))?;

        Ok(AuthenticatedUser(user))
    }
}

/// JSON extractor that turns both deserialization failures and validator
/// reports into `Validation` errors (HTTP 400)
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::Validation(rejection.body_text()))?;

        value
            .validate()
            .map_err(|report| AppError::Validation(report.to_string()))?;

        Ok(ValidatedJson(value))
    }
}

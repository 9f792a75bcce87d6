//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, books, health, reservations, users};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Biblio API",
        version = "0.1.0",
        description = "Library Lending System REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    paths(
        // Health
        health::health_check,
        // Auth
        auth::login,
        // Users
        users::register,
        users::get_user,
        users::update_user,
        users::delete_user,
        // Books
        books::list_books,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
        // Reservations
        reservations::reserve_book,
        reservations::return_book,
        reservations::user_reservations,
        reservations::book_reservations,
    ),
    components(
        schemas(
            // Auth
            auth::LoginRequest,
            auth::LoginResponse,
            // Users
            crate::models::user::UserView,
            crate::models::user::RegisterUser,
            crate::models::user::UpdateUser,
            crate::models::user::PermissionSet,
            crate::models::user::PermissionPatch,
            // Books
            crate::models::book::Book,
            crate::models::book::BookSummary,
            crate::models::book::BookPage,
            crate::models::book::Pagination,
            crate::models::book::CreateBook,
            crate::models::book::UpdateBook,
            // Reservations
            crate::models::reservation::Reservation,
            crate::models::reservation::UserReservationView,
            crate::models::reservation::BookReservationView,
            reservations::ReturnResponse,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication endpoints"),
        (name = "users", description = "User account management"),
        (name = "books", description = "Book catalog management"),
        (name = "reservations", description = "Reservation lifecycle")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

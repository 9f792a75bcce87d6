//! User management endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::user::{Permission, RegisterUser, UpdateUser, UserView},
};

use super::{AuthenticatedUser, ValidatedJson};

/// Register a new user (public)
#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    request_body = RegisterUser,
    responses(
        (status = 201, description = "User registered", body = UserView),
        (status = 400, description = "Missing fields or duplicate email")
    )
)]
pub async fn register(
    State(state): State<crate::AppState>,
    ValidatedJson(request): ValidatedJson<RegisterUser>,
) -> AppResult<(StatusCode, Json<UserView>)> {
    let user = state.services.users.register(request).await?;
    Ok((StatusCode::CREATED, Json(UserView::from(&user))))
}

/// Get user details by ID
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User details", body = UserView),
        (status = 403, description = "Not self and missing read-users"),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(
    State(state): State<crate::AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<UserView>> {
    actor.require_self_or(id, Permission::ReadUsers)?;

    let user = state.services.users.get_active(id).await?;
    Ok(Json(UserView::from(&user)))
}

/// Update an existing user
#[utoipa::path(
    put,
    path = "/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    request_body = UpdateUser,
    responses(
        (status = 200, description = "User updated", body = UserView),
        (status = 403, description = "Not self and missing update-user"),
        (status = 404, description = "User not found")
    )
)]
pub async fn update_user(
    State(state): State<crate::AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<Uuid>,
    ValidatedJson(update): ValidatedJson<UpdateUser>,
) -> AppResult<Json<UserView>> {
    actor.require_self_or(id, Permission::UpdateUser)?;

    // Capability grants always need update-user, even on oneself
    let may_assign_permissions = actor.permissions.allows(Permission::UpdateUser);
    let user = state
        .services
        .users
        .update(id, update, may_assign_permissions)
        .await?;
    Ok(Json(UserView::from(&user)))
}

/// Deactivate a user (soft delete)
#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 204, description = "User deactivated"),
        (status = 403, description = "Not self and missing delete-user"),
        (status = 404, description = "User not found")
    )
)]
pub async fn delete_user(
    State(state): State<crate::AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    actor.require_self_or(id, Permission::DeleteUser)?;

    state.services.users.deactivate(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

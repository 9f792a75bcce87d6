//! User model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};

/// Named capabilities a user may hold.
///
/// Capabilities are independent of each other; holding one implies nothing
/// about any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    CreateBook,
    UpdateBook,
    DeleteBook,
    UpdateUser,
    DeleteUser,
    ReadUsers,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::CreateBook => "create_book",
            Permission::UpdateBook => "update_book",
            Permission::DeleteBook => "delete_book",
            Permission::UpdateUser => "update_user",
            Permission::DeleteUser => "delete_user",
            Permission::ReadUsers => "read_users",
        }
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The full capability set attached to a user.
///
/// Missing fields deserialize to `false`, so a partial object is accepted at
/// registration time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct PermissionSet {
    pub can_create_book: bool,
    pub can_update_book: bool,
    pub can_delete_book: bool,
    pub can_update_user: bool,
    pub can_delete_user: bool,
    pub can_read_users: bool,
}

impl PermissionSet {
    /// Whether this set grants the given capability
    pub fn allows(&self, permission: Permission) -> bool {
        match permission {
            Permission::CreateBook => self.can_create_book,
            Permission::UpdateBook => self.can_update_book,
            Permission::DeleteBook => self.can_delete_book,
            Permission::UpdateUser => self.can_update_user,
            Permission::DeleteUser => self.can_delete_user,
            Permission::ReadUsers => self.can_read_users,
        }
    }

    /// Set granting every capability (used for the seeded admin account)
    pub fn all() -> Self {
        Self {
            can_create_book: true,
            can_update_book: true,
            can_delete_book: true,
            can_update_user: true,
            can_delete_user: true,
            can_read_users: true,
        }
    }
}

/// Per-capability patch applied on user update.
///
/// Only the provided flags change; the rest of the set is left untouched.
#[derive(Debug, Clone, Copy, Default, Deserialize, ToSchema)]
pub struct PermissionPatch {
    pub can_create_book: Option<bool>,
    pub can_update_book: Option<bool>,
    pub can_delete_book: Option<bool>,
    pub can_update_user: Option<bool>,
    pub can_delete_user: Option<bool>,
    pub can_read_users: Option<bool>,
}

impl PermissionPatch {
    pub fn apply(&self, set: &mut PermissionSet) {
        if let Some(v) = self.can_create_book {
            set.can_create_book = v;
        }
        if let Some(v) = self.can_update_book {
            set.can_update_book = v;
        }
        if let Some(v) = self.can_delete_book {
            set.can_delete_book = v;
        }
        if let Some(v) = self.can_update_user {
            set.can_update_user = v;
        }
        if let Some(v) = self.can_delete_user {
            set.can_delete_user = v;
        }
        if let Some(v) = self.can_read_users {
            set.can_read_users = v;
        }
    }
}

/// Full user record.
///
/// Users are never physically deleted; `is_active = false` is a terminal
/// soft-delete.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    /// Hashed password (argon2)
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub permissions: PermissionSet,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(name: String, email: String, password_hash: String, permissions: PermissionSet) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            email,
            password_hash,
            permissions,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Require a capability, regardless of the target resource
    pub fn require(&self, permission: Permission) -> AppResult<()> {
        if self.permissions.allows(permission) {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "Missing required permission: {}",
                permission
            )))
        }
    }

    /// Require a capability unless acting on one's own resources.
    ///
    /// Self-access never needs a capability; cross-user access needs the
    /// specific one for the operation.
    pub fn require_self_or(&self, target: Uuid, permission: Permission) -> AppResult<()> {
        if self.id == target {
            Ok(())
        } else {
            self.require(permission)
        }
    }
}

/// Public user representation returned by the API
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserView {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub permissions: PermissionSet,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            permissions: user.permissions,
        }
    }
}

/// Registration request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterUser {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
    /// Initial capability set; defaults to no capabilities
    pub permissions: Option<PermissionSet>,
}

/// Update user request (partial patch)
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateUser {
    pub name: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    pub password: Option<String>,
    /// Honored only when the acting user holds the update-user capability
    pub permissions: Option<PermissionPatch>,
}

/// JWT claims for authenticated users
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: String,
    pub user_id: Uuid,
    pub permissions: PermissionSet,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }
}

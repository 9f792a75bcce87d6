//! User account and authentication service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    config::{AdminConfig, AuthConfig},
    error::{AppError, AppResult},
    models::user::{PermissionSet, RegisterUser, UpdateUser, User, UserClaims},
    repository::Repository,
};

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
    config: AuthConfig,
}

impl UsersService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Register a new account.
    ///
    /// Email uniqueness is global: a deactivated account still holds its
    /// address.
    pub async fn register(&self, request: RegisterUser) -> AppResult<User> {
        if self
            .repository
            .users
            .find_by_email(&request.email)
            .await?
            .is_some()
        {
            return Err(AppError::Validation(
                "Email is already registered".to_string(),
            ));
        }

        let password_hash = hash_password(&request.password)?;
        let user = User::new(
            request.name,
            request.email,
            password_hash,
            request.permissions.unwrap_or_default(),
        );
        let user = self.repository.users.insert(user).await?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Authenticate by email and password, returning a bearer token
    pub async fn authenticate(&self, email: &str, password: &str) -> AppResult<(String, User)> {
        let user = self
            .repository
            .users
            .find_active_by_email(email)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Invalid email or password".to_string()))?;

        if !verify_password(&user.password_hash, password) {
            return Err(AppError::Unauthorized(
                "Invalid email or password".to_string(),
            ));
        }

        let now = Utc::now().timestamp();
        let exp = now + (self.config.jwt_expiration_hours as i64 * 3600);

        let claims = UserClaims {
            sub: user.email.clone(),
            user_id: user.id,
            permissions: user.permissions,
            exp,
            iat: now,
        };

        let token = claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))?;

        Ok((token, user))
    }

    /// Decode a bearer token into its claims
    pub fn decode_token(&self, token: &str) -> AppResult<UserClaims> {
        UserClaims::from_token(token, &self.config.jwt_secret)
            .map_err(|e| AppError::Unauthorized(e.to_string()))
    }

    /// Get an active user by id
    pub async fn get_active(&self, id: Uuid) -> AppResult<User> {
        self.repository
            .users
            .find_active_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    /// Apply a partial patch to an active user.
    ///
    /// `may_assign_permissions` reflects whether the *acting* user holds the
    /// update-user capability; without it a supplied permissions patch is
    /// dropped, so nobody can self-grant.
    pub async fn update(
        &self,
        id: Uuid,
        update: UpdateUser,
        may_assign_permissions: bool,
    ) -> AppResult<User> {
        let mut user = self
            .repository
            .users
            .find_active_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if let Some(name) = update.name.filter(|s| !s.is_empty()) {
            user.name = name;
        }
        if let Some(email) = update.email.filter(|s| !s.is_empty()) {
            user.email = email;
        }
        if let Some(password) = update.password.filter(|s| !s.is_empty()) {
            user.password_hash = hash_password(&password)?;
        }
        if let Some(patch) = update.permissions {
            if may_assign_permissions {
                patch.apply(&mut user.permissions);
            }
        }
        user.updated_at = Utc::now();

        self.repository.users.update(user).await
    }

    /// Terminal soft-delete; the record and its reservation history survive
    pub async fn deactivate(&self, id: Uuid) -> AppResult<()> {
        let mut user = self
            .repository
            .users
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        user.is_active = false;
        user.updated_at = Utc::now();
        self.repository.users.update(user).await?;

        tracing::info!(user_id = %id, "User deactivated");
        Ok(())
    }

    pub async fn count(&self) -> AppResult<usize> {
        self.repository.users.count().await
    }

    /// Seed the admin account when the store is empty
    pub async fn seed_admin(&self, admin: &AdminConfig) -> AppResult<()> {
        if self.count().await? > 0 {
            return Ok(());
        }

        let user = self
            .register(RegisterUser {
                name: admin.name.clone(),
                email: admin.email.clone(),
                password: admin.password.clone(),
                permissions: Some(PermissionSet::all()),
            })
            .await?;

        tracing::info!(user_id = %user.id, email = %admin.email, "Admin user created");
        Ok(())
    }
}

fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

fn verify_password(hash: &str, password: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

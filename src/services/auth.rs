//! Authentication service: password hashing, sign-in and token handling

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::{User, UserClaims},
    repository::Repository,
};

#[derive(Clone)]
pub struct AuthService {
    repository: Repository,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Check credentials and issue an access token.
    /// Unknown usernames are `NotFound`, wrong passwords `Authentication`.
    pub async fn sign_in(&self, username: &str, password: &str) -> AppResult<(String, User)> {
        let user = self
            .repository
            .users_get_by_username(username)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {} not found", username)))?;

        if !verify_password(password.to_string(), user.password.clone()).await? {
            tracing::info!("Rejected sign-in for {}: wrong password", username);
            return Err(AppError::Authentication("invalid username or password".to_string()));
        }

        let token = self.issue_token(&user)?;
        tracing::info!("User {} signed in as {}", user.username, user.role);

        Ok((token, user))
    }

    /// Create a signed token for a user
    pub fn issue_token(&self, user: &User) -> AppResult<String> {
        let lifetime = self.config.token_lifetime().ok_or_else(|| {
            AppError::Internal(format!(
                "invalid token lifetime: {} minutes",
                self.config.jwt_expiration_minutes
            ))
        })?;
        UserClaims::new(user.username.clone(), user.role, lifetime)
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("unable to sign JWT: {}", e)))
    }

    /// Verify a bearer token and return its claims
    pub fn verify_token(&self, token: &str) -> AppResult<UserClaims> {
        UserClaims::from_token(token, &self.config.jwt_secret)
            .map_err(|e| AppError::Authentication(e.to_string()))
    }
}

/// Hash a password using Argon2 with a random salt
pub async fn hash_password(password: String) -> AppResult<String> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
    })
    .await
    .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))?
}

/// Verify a password against a stored PHC hash
pub async fn verify_password(password: String, hash: String) -> AppResult<bool> {
    tokio::task::spawn_blocking(move || {
        let parsed_hash = PasswordHash::new(&hash)
            .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    })
    .await
    .map_err(|e| AppError::Internal(format!("Password verification task failed: {}", e)))?
}

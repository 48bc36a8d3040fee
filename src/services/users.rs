//! User management service

use uuid::Uuid;
use validator::Validate;

use crate::{
    config::UsersConfig,
    error::{AppError, AppResult},
    models::user::{CreateUser, Role, UpdateUser, User, UserChanges, UserClaims},
    repository::Repository,
};

use super::auth::hash_password;

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
}

impl UsersService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self) -> AppResult<Vec<User>> {
        self.repository.users_list().await
    }

    pub async fn get_by_id(&self, id: Uuid) -> AppResult<User> {
        self.repository.users_get_by_id(id).await
    }

    /// Create a new user. `caller` is the authenticated requester, if any;
    /// `open_registration` lets anonymous callers create reader accounts.
    pub async fn create_user(
        &self,
        user: CreateUser,
        caller: Option<&UserClaims>,
        open_registration: bool,
    ) -> AppResult<User> {
        user.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        let role: Role = user.role.parse()?;

        check_registration(caller, role, open_registration)?;

        let new_user = User {
            id: Uuid::new_v4(),
            username: user.username,
            password: hash_password(user.password).await?,
            role,
        };

        // Uniqueness is enforced by the users_username_key constraint
        let created = self.repository.users_create(&new_user).await?;
        tracing::info!("Created user {} ({})", created.username, created.role);
        Ok(created)
    }

    /// Update an existing user; only supplied, non-empty fields change
    pub async fn update_user(&self, id: Uuid, user: UpdateUser) -> AppResult<User> {
        let user = user.normalized();

        let role = user.role.as_deref().map(str::parse::<Role>).transpose()?;
        let password_hash = match user.password {
            Some(password) => Some(hash_password(password).await?),
            None => None,
        };

        let changes = UserChanges {
            username: user.username,
            password_hash,
            role,
        };

        self.repository.users_update(id, &changes).await
    }

    pub async fn delete_user(&self, id: Uuid) -> AppResult<()> {
        self.repository.users_delete(id).await?;
        tracing::info!("Deleted user {}", id);
        Ok(())
    }

    /// Create the configured administrator when none exists yet
    pub async fn ensure_bootstrap_admin(&self, config: &UsersConfig) -> AppResult<()> {
        let (Some(username), Some(password)) = (
            config.bootstrap_admin_username.as_ref(),
            config.bootstrap_admin_password.as_ref(),
        ) else {
            return Ok(());
        };

        if self.repository.users_admin_exists().await? {
            return Ok(());
        }

        let admin = User {
            id: Uuid::new_v4(),
            username: username.clone(),
            password: hash_password(password.clone()).await?,
            role: Role::Administrator,
        };

        match self.repository.users_create(&admin).await {
            Ok(_) => {
                tracing::info!("Created bootstrap administrator {}", username);
                Ok(())
            }
            // Another instance created it first, or the name belongs to a reader
            Err(AppError::Conflict(_)) => {
                tracing::warn!("Bootstrap administrator {} not created: username taken", username);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

/// Who may create an account with `role`: administrators always; anonymous
/// or reader callers only for reader accounts, and only with open registration.
pub fn check_registration(
    caller: Option<&UserClaims>,
    role: Role,
    open_registration: bool,
) -> AppResult<()> {
    if caller.map(UserClaims::is_admin).unwrap_or(false) {
        return Ok(());
    }
    if open_registration && role == Role::Reader {
        return Ok(());
    }
    Err(AppError::Authorization("unauthorized".to_string()))
}

//! User domain methods on Repository

use uuid::Uuid;

use super::Repository;
use crate::{
    error::{AppError, AppResult},
    models::user::{Role, User, UserChanges},
};

impl Repository {
    /// List all users
    pub async fn users_list(&self) -> AppResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            "SELECT id, username, password, role FROM users ORDER BY username",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    /// Get user by ID
    pub async fn users_get_by_id(&self, id: Uuid) -> AppResult<User> {
        sqlx::query_as::<_, User>("SELECT id, username, password, role FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user with id: {} not found", id)))
    }

    /// Get user by username (authentication)
    pub async fn users_get_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password, role FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    /// Check whether at least one administrator exists
    pub async fn users_admin_exists(&self) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE role = $1)")
                .bind(Role::Administrator)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    /// Insert a user. A taken username fails with `Conflict` from the
    /// unique constraint.
    pub async fn users_create(&self, user: &User) -> AppResult<User> {
        let row = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, username, password, role)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, password, role
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.password)
        .bind(user.role)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// Overwrite the supplied columns of a user, keeping the others
    pub async fn users_update(&self, id: Uuid, changes: &UserChanges) -> AppResult<User> {
        if changes.is_empty() {
            return self.users_get_by_id(id).await;
        }

        let mut sets = Vec::new();
        let mut param_idx = 2;

        macro_rules! add_field {
            ($field:expr, $name:expr) => {
                if $field.is_some() {
                    sets.push(format!("{} = ${}", $name, param_idx));
                    param_idx += 1;
                }
            };
        }

        add_field!(changes.username, "username");
        add_field!(changes.password_hash, "password");
        add_field!(changes.role, "role");

        let query = format!(
            "UPDATE users SET {} WHERE id = $1 RETURNING id, username, password, role",
            sets.join(", ")
        );

        let mut builder = sqlx::query_as::<_, User>(&query).bind(id);

        macro_rules! bind_field {
            ($field:expr) => {
                if let Some(ref val) = $field {
                    builder = builder.bind(val);
                }
            };
        }

        bind_field!(changes.username);
        bind_field!(changes.password_hash);
        bind_field!(changes.role);

        builder
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user with id: {} not found", id)))
    }

    /// Delete a user
    pub async fn users_delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("user with id: {} not found", id)));
        }
        Ok(())
    }
}

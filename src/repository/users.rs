//! Users repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::user::{NewUser, ProfileChanges, User},
    repository::UserStore,
};

/// Maps a store-level unique violation on the username column to the
/// Conflict error kind; everything else passes through as a database error.
fn translate_unique_violation(e: sqlx::Error) -> AppError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Conflict("username already exists".to_string())
        }
        _ => AppError::Database(e),
    }
}

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Postgres>,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for UsersRepository {
    /// Get user by username (primary identifier)
    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT username, name, password, role FROM users WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn create(&self, user: &NewUser) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (username, name, password, role)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&user.username)
        .bind(&user.name)
        .bind(&user.password)
        .bind(user.role)
        .execute(&self.pool)
        .await
        .map_err(translate_unique_violation)?;

        Ok(())
    }

    async fn update_profile(&self, username: &str, changes: &ProfileChanges) -> AppResult<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET username = COALESCE($2, username),
                name = COALESCE($3, name),
                password = COALESCE($4, password)
            WHERE username = $1
            RETURNING username, name, password, role
            "#,
        )
        .bind(username)
        .bind(changes.username.as_deref())
        .bind(changes.name.as_deref())
        .bind(changes.password.as_deref())
        .fetch_optional(&self.pool)
        .await
        .map_err(translate_unique_violation)?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", username)))?;

        Ok(user)
    }
}

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

use crate::db::models::User;
use crate::error::AppError;

/// User directory backing the identity boundary and the HTTP API.
///
/// Credential handling lives with the external identity provider; this
/// only stores the records other components reference by id.
#[derive(Debug, Clone)]
pub struct UserDirectory {
    pool: SqlitePool,
}

impl UserDirectory {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create_user(&self, username: &str, email: Option<&str>) -> Result<User, AppError> {
        if username.trim().is_empty() {
            return Err(AppError::Validation("username is required".to_string()));
        }

        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (username, email, created_at) VALUES (?, ?, ?) \
             RETURNING id, username, email, created_at",
        )
        .bind(username)
        .bind(email)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e.as_database_error() {
            Some(db) if db.is_unique_violation() => {
                AppError::Validation(format!("username {} is already taken", username))
            }
            _ => AppError::from(e),
        })?;

        info!("Created user {} ({})", user.username, user.id);
        Ok(user)
    }

    pub async fn get_user(&self, id: i64) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(
            "SELECT id, username, email, created_at FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {}", id)))
    }
}

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

use crate::db::models::Message;
use crate::error::AppError;

/// Durable record of chat messages, keyed by room.
///
/// Participant bookkeeping is deliberately not done here; callers that
/// want "sender becomes a participant" semantics go through
/// [`crate::db::RoomRegistry::add_participant`].
#[derive(Debug, Clone)]
pub struct MessageStore {
    pool: SqlitePool,
}

impl MessageStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Append a message with a fresh id and current timestamps.
    ///
    /// Fails with `NotFound` if the room or the author does not exist and
    /// `Validation` if the body is empty.
    pub async fn create_message(
        &self,
        room_id: i64,
        user_id: i64,
        body: &str,
    ) -> Result<Message, AppError> {
        if body.trim().is_empty() {
            return Err(AppError::Validation("message body is required".to_string()));
        }

        let room: Option<i64> = sqlx::query_scalar("SELECT id FROM rooms WHERE id = ?")
            .bind(room_id)
            .fetch_optional(&self.pool)
            .await?;
        if room.is_none() {
            return Err(AppError::NotFound(format!("room {}", room_id)));
        }

        let user: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        if user.is_none() {
            return Err(AppError::NotFound(format!("user {}", user_id)));
        }

        let now = Utc::now();
        let message = sqlx::query_as::<_, Message>(
            "INSERT INTO messages (room_id, user_id, body, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?) \
             RETURNING id, room_id, user_id, body, created_at, updated_at",
        )
        .bind(room_id)
        .bind(user_id)
        .bind(body)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(message)
    }

    pub async fn get_message(&self, id: i64) -> Result<Message, AppError> {
        sqlx::query_as::<_, Message>(
            "SELECT id, room_id, user_id, body, created_at, updated_at \
             FROM messages WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("message {}", id)))
    }

    /// Replace a message's body. Only its author may do so; edits bump
    /// `updated_at` and leave `created_at` untouched.
    pub async fn update_message(
        &self,
        id: i64,
        requester_id: i64,
        body: &str,
    ) -> Result<Message, AppError> {
        if body.trim().is_empty() {
            return Err(AppError::Validation("message body is required".to_string()));
        }

        let message = self.get_message(id).await?;
        if message.user_id != requester_id {
            return Err(AppError::Authorization(
                "only the author may edit a message".to_string(),
            ));
        }

        let message = sqlx::query_as::<_, Message>(
            "UPDATE messages SET body = ?, updated_at = ? WHERE id = ? \
             RETURNING id, room_id, user_id, body, created_at, updated_at",
        )
        .bind(body)
        .bind(Utc::now())
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(message)
    }

    /// Hard-delete a message. Only its author may do so.
    pub async fn delete_message(&self, id: i64, requester_id: i64) -> Result<(), AppError> {
        let message = self.get_message(id).await?;
        if message.user_id != requester_id {
            return Err(AppError::Authorization(
                "only the author may delete a message".to_string(),
            ));
        }

        sqlx::query("DELETE FROM messages WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        info!("User {} deleted message {}", requester_id, id);
        Ok(())
    }

    /// All messages in a room, oldest first.
    pub async fn list_by_room(&self, room_id: i64) -> Result<Vec<Message>, AppError> {
        let messages = sqlx::query_as::<_, Message>(
            "SELECT id, room_id, user_id, body, created_at, updated_at \
             FROM messages WHERE room_id = ? ORDER BY created_at ASC, id ASC",
        )
        .bind(room_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }
}

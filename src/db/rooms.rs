use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::info;

use crate::db::models::{Room, RoomUpdate, Topic};
use crate::error::AppError;

/// Tracks which rooms exist and which users currently participate in them.
///
/// The durable participant set here is the source of truth for room
/// membership; the broadcast layer's per-room subscriber sets are ephemeral
/// connection state and must never be read as membership.
#[derive(Debug, Clone)]
pub struct RoomRegistry {
    pool: SqlitePool,
}

impl RoomRegistry {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a room under `topic_name` (looked up by exact name, created
    /// if absent) with the host as its first participant.
    pub async fn create_room(
        &self,
        host_id: i64,
        topic_name: &str,
        name: &str,
        description: Option<&str>,
    ) -> Result<Room, AppError> {
        if name.trim().is_empty() {
            return Err(AppError::Validation("room name is required".to_string()));
        }
        if topic_name.trim().is_empty() {
            return Err(AppError::Validation("topic name is required".to_string()));
        }

        let host: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE id = ?")
            .bind(host_id)
            .fetch_optional(&self.pool)
            .await?;
        if host.is_none() {
            return Err(AppError::NotFound(format!("user {}", host_id)));
        }

        let mut tx = self.pool.begin().await?;

        let topic = get_or_create_topic(&mut tx, topic_name).await?;

        let now = Utc::now();
        let room = sqlx::query_as::<_, Room>(
            "INSERT INTO rooms (host_id, topic_id, name, description, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?) \
             RETURNING id, host_id, topic_id, name, description, created_at, updated_at",
        )
        .bind(host_id)
        .bind(topic.id)
        .bind(name)
        .bind(description)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        // Host is always an implicit participant.
        sqlx::query("INSERT OR IGNORE INTO room_participants (room_id, user_id) VALUES (?, ?)")
            .bind(room.id)
            .bind(host_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!("User {} created room {} ({})", host_id, room.name, room.id);
        Ok(room)
    }

    pub async fn get_room(&self, id: i64) -> Result<Room, AppError> {
        sqlx::query_as::<_, Room>(
            "SELECT id, host_id, topic_id, name, description, created_at, updated_at \
             FROM rooms WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("room {}", id)))
    }

    pub async fn list_rooms(&self) -> Result<Vec<Room>, AppError> {
        let rooms = sqlx::query_as::<_, Room>(
            "SELECT id, host_id, topic_id, name, description, created_at, updated_at \
             FROM rooms ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rooms)
    }

    pub async fn list_topics(&self) -> Result<Vec<Topic>, AppError> {
        let topics = sqlx::query_as::<_, Topic>("SELECT id, name FROM topics ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;

        Ok(topics)
    }

    /// Current participant user ids of a room.
    pub async fn participants(&self, room_id: i64) -> Result<Vec<i64>, AppError> {
        let ids: Vec<i64> = sqlx::query_scalar(
            "SELECT user_id FROM room_participants WHERE room_id = ? ORDER BY user_id ASC",
        )
        .bind(room_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    /// Idempotent: adding an existing participant is a no-op.
    pub async fn add_participant(&self, room_id: i64, user_id: i64) -> Result<(), AppError> {
        self.get_room(room_id).await?;

        sqlx::query("INSERT OR IGNORE INTO room_participants (room_id, user_id) VALUES (?, ?)")
            .bind(room_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Idempotent: removing a non-participant is a no-op. Removing the host
    /// is also a no-op, so the host stays an implicit participant.
    pub async fn remove_participant(&self, room_id: i64, user_id: i64) -> Result<(), AppError> {
        let room = self.get_room(room_id).await?;
        if room.host_id == user_id {
            return Ok(());
        }

        sqlx::query("DELETE FROM room_participants WHERE room_id = ? AND user_id = ?")
            .bind(room_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Apply host edits. Fails with `Authorization` unless the requester is
    /// the host.
    pub async fn update_room(
        &self,
        room_id: i64,
        requester_id: i64,
        fields: RoomUpdate,
    ) -> Result<Room, AppError> {
        if matches!(&fields.name, Some(name) if name.trim().is_empty()) {
            return Err(AppError::Validation("room name is required".to_string()));
        }
        if matches!(&fields.topic_name, Some(topic) if topic.trim().is_empty()) {
            return Err(AppError::Validation("topic name is required".to_string()));
        }

        let room = self.get_room(room_id).await?;
        if room.host_id != requester_id {
            return Err(AppError::Authorization(
                "only the host may edit a room".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        let topic_id = match fields.topic_name.as_deref() {
            Some(topic_name) => get_or_create_topic(&mut tx, topic_name).await?.id,
            None => room.topic_id,
        };

        let room = sqlx::query_as::<_, Room>(
            "UPDATE rooms SET name = ?, description = ?, topic_id = ?, updated_at = ? \
             WHERE id = ? \
             RETURNING id, host_id, topic_id, name, description, created_at, updated_at",
        )
        .bind(fields.name.unwrap_or(room.name))
        .bind(fields.description.or(room.description))
        .bind(topic_id)
        .bind(Utc::now())
        .bind(room_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(room)
    }

    /// Delete a room and everything that depends on it. Host only.
    pub async fn delete_room(&self, room_id: i64, requester_id: i64) -> Result<(), AppError> {
        let room = self.get_room(room_id).await?;
        if room.host_id != requester_id {
            return Err(AppError::Authorization(
                "only the host may delete a room".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM messages WHERE room_id = ?")
            .bind(room_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM room_participants WHERE room_id = ?")
            .bind(room_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM rooms WHERE id = ?")
            .bind(room_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!("User {} deleted room {}", requester_id, room_id);
        Ok(())
    }
}

/// Exact, case-sensitive lookup; "Math" and "math" stay separate topics.
async fn get_or_create_topic(
    tx: &mut Transaction<'_, Sqlite>,
    name: &str,
) -> Result<Topic, AppError> {
    let existing = sqlx::query_as::<_, Topic>("SELECT id, name FROM topics WHERE name = ?")
        .bind(name)
        .fetch_optional(&mut **tx)
        .await?;

    if let Some(topic) = existing {
        return Ok(topic);
    }

    let topic = sqlx::query_as::<_, Topic>(
        "INSERT INTO topics (name) VALUES (?) RETURNING id, name",
    )
    .bind(name)
    .fetch_one(&mut **tx)
    .await?;

    Ok(topic)
}

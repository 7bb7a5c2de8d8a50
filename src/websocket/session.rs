use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;
use tracing::{info, warn};

use crate::broadcast::BroadcastGroups;
use crate::db::{MessageStore, RoomRegistry};
use crate::error::AppError;
use crate::identity::IdentityProvider;
use crate::websocket::{ClientEvent, ServerEvent};

/// Services a chat session operates against, shared by every connection.
pub struct ChatContext {
    pub store: MessageStore,
    pub registry: RoomRegistry,
    pub groups: Arc<BroadcastGroups>,
    pub identity: Arc<dyn IdentityProvider>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Joined,
    Closed,
}

/// Per-connection state machine, bound to exactly one room for its whole
/// lifetime: `Connecting -> Joined -> Closed`.
///
/// The session is transport-agnostic. It receives parsed inbound events
/// and emits outbound events through the same unbounded handle its
/// broadcast group holds; the transport layer drains that channel.
pub struct ChatSession {
    id: Uuid,
    room_id: i64,
    state: SessionState,
    handle: mpsc::UnboundedSender<ServerEvent>,
    ctx: Arc<ChatContext>,
}

impl ChatSession {
    pub fn new(
        room_id: i64,
        handle: mpsc::UnboundedSender<ServerEvent>,
        ctx: Arc<ChatContext>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            room_id,
            state: SessionState::Connecting,
            handle,
            ctx,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn room_id(&self) -> i64 {
        self.room_id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// `Connecting -> Joined`: verify the room exists, then register with
    /// its broadcast group.
    pub async fn join(&mut self) -> Result<(), AppError> {
        if self.state != SessionState::Connecting {
            return Err(AppError::Internal(format!(
                "session {} cannot join from state {:?}",
                self.id, self.state
            )));
        }

        self.ctx.registry.get_room(self.room_id).await?;
        self.ctx
            .groups
            .join(self.room_id, self.id, self.handle.clone())
            .await;
        self.state = SessionState::Joined;

        info!("Session {} joined room {}", self.id, self.room_id);
        Ok(())
    }

    /// Handle one inbound event. Failures are reported only on this
    /// session's own handle and never tear the session down.
    pub async fn handle_event(&mut self, event: ClientEvent) {
        if self.state != SessionState::Joined {
            self.report_error("session is not joined to a room");
            return;
        }

        match event {
            ClientEvent::Message { user_id, message } => {
                if let Err(e) = self.publish_message(user_id, &message).await {
                    warn!(
                        "Session {} failed to publish message in room {}: {}",
                        self.id, self.room_id, e
                    );
                    self.report_error(&e.to_string());
                }
            }
        }
    }

    /// Persist, record participation, then fan out. Broadcast strictly
    /// follows successful persistence; a message that was not stored is
    /// never seen by any subscriber.
    async fn publish_message(&self, user_id: i64, body: &str) -> Result<(), AppError> {
        let message = self
            .ctx
            .store
            .create_message(self.room_id, user_id, body)
            .await?;

        // Always attempted; a no-op for existing participants.
        self.ctx
            .registry
            .add_participant(self.room_id, user_id)
            .await?;

        let username = self.ctx.identity.resolve_username(user_id).await?;

        self.ctx
            .groups
            .broadcast(
                self.room_id,
                &ServerEvent::Message {
                    message_id: message.id,
                    user_id,
                    username,
                    message: message.body,
                    created: message.created_at.to_rfc3339(),
                },
            )
            .await;

        Ok(())
    }

    /// `-> Closed`: leave the broadcast group. Idempotent, and safe even if
    /// the join never completed.
    pub async fn close(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }

        self.ctx.groups.leave(self.room_id, self.id).await;
        self.state = SessionState::Closed;
        info!("Session {} closed (room {})", self.id, self.room_id);
    }

    fn report_error(&self, message: &str) {
        let _ = self.handle.send(ServerEvent::Error {
            message: message.to_string(),
        });
    }
}

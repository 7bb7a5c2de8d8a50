pub mod api;
pub mod broadcast;
pub mod config;
pub mod db;
pub mod error;
pub mod identity;
pub mod websocket;

use std::sync::Arc;
use sqlx::SqlitePool;
use actix_web::HttpResponse;

pub use error::AppError;
pub type Result<T> = std::result::Result<T, AppError>;
pub use config::Settings;

pub use broadcast::BroadcastGroups;
pub use db::{MessageStore, RoomRegistry, UserDirectory};
pub use identity::{DirectoryIdentity, IdentityProvider};
pub use websocket::{ChatContext, ChatServer, ChatSession};

/// Health check endpoint handler
/// Returns a JSON response with server status and timestamp
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Application state shared across all components
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub db_pool: SqlitePool,
    pub store: MessageStore,
    pub registry: RoomRegistry,
    pub users: UserDirectory,
    pub groups: Arc<BroadcastGroups>,
    pub identity: Arc<dyn IdentityProvider>,
}

impl AppState {
    pub async fn new(config: Settings) -> Result<Self> {
        let db_pool = db::connect(&config.database.url, config.database.max_connections).await?;

        let users = UserDirectory::new(db_pool.clone());
        Ok(Self {
            config: Arc::new(config),
            store: MessageStore::new(db_pool.clone()),
            registry: RoomRegistry::new(db_pool.clone()),
            identity: Arc::new(DirectoryIdentity::new(users.clone())),
            users,
            groups: Arc::new(BroadcastGroups::new()),
            db_pool,
        })
    }

    /// Context handed to every chat session.
    pub fn chat_context(&self) -> Arc<ChatContext> {
        Arc::new(ChatContext {
            store: self.store.clone(),
            registry: self.registry.clone(),
            groups: self.groups.clone(),
            identity: self.identity.clone(),
        })
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.db_pool.close().await;
        Ok(())
    }
}

//! Identity boundary. The chat core trusts whatever identity it is handed;
//! this trait only resolves display names for outbound event payloads.

use async_trait::async_trait;

use crate::db::UserDirectory;
use crate::error::AppError;

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolve a display username for `user_id`, `NotFound` if no such user.
    async fn resolve_username(&self, user_id: i64) -> Result<String, AppError>;
}

/// Identity provider backed by the local user directory.
#[derive(Debug, Clone)]
pub struct DirectoryIdentity {
    users: UserDirectory,
}

impl DirectoryIdentity {
    pub fn new(users: UserDirectory) -> Self {
        Self { users }
    }
}

#[async_trait]
impl IdentityProvider for DirectoryIdentity {
    async fn resolve_username(&self, user_id: i64) -> Result<String, AppError> {
        Ok(self.users.get_user(user_id).await?.username)
    }
}

//! services/cli/src/auth.rs
//!
//! Stub login/logout session handling. There is no password and no token:
//! "logging in" just records who is using the tool, persisted under the user
//! key so the session survives restarts.

use std::sync::Arc;

use kivo_core::domain::User;
use kivo_core::ports::{PersistentStore, PortError, PortResult};
use kivo_core::store::USER_KEY;
use uuid::Uuid;

/// Owns the persisted user profile.
pub struct SessionManager {
    storage: Arc<dyn PersistentStore>,
}

impl SessionManager {
    pub fn new(storage: Arc<dyn PersistentStore>) -> Self {
        Self { storage }
    }

    /// Creates a fresh user profile and persists it, replacing any previous one.
    pub async fn login(&self, name: &str, email: &str) -> PortResult<User> {
        let user = User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
        };
        let serialized = serde_json::to_string(&user)
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        self.storage.save(USER_KEY, &serialized).await?;
        Ok(user)
    }

    /// Loads the persisted user profile, if someone is logged in.
    pub async fn current_user(&self) -> PortResult<Option<User>> {
        match self.storage.load(USER_KEY).await? {
            Some(serialized) => serde_json::from_str(&serialized)
                .map(Some)
                .map_err(|e| PortError::Unexpected(format!("Stored user is unreadable: {e}"))),
            None => Ok(None),
        }
    }

    /// Clears the persisted user profile.
    pub async fn logout(&self) -> PortResult<()> {
        self.storage.remove(USER_KEY).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::FileStore;

    #[tokio::test]
    async fn login_round_trips_through_current_user() {
        let dir = tempfile::tempdir().unwrap();
        let sessions = SessionManager::new(Arc::new(FileStore::new(dir.path())));

        let user = sessions.login("Ada", "ada@example.com").await.unwrap();
        let loaded = sessions.current_user().await.unwrap();

        assert_eq!(loaded, Some(user));
    }

    #[tokio::test]
    async fn relogin_replaces_the_profile_wholesale() {
        let dir = tempfile::tempdir().unwrap();
        let sessions = SessionManager::new(Arc::new(FileStore::new(dir.path())));

        let first = sessions.login("Ada", "ada@example.com").await.unwrap();
        let second = sessions.login("Grace", "grace@example.com").await.unwrap();

        let loaded = sessions.current_user().await.unwrap().unwrap();
        assert_eq!(loaded, second);
        assert_ne!(loaded.id, first.id);
    }

    #[tokio::test]
    async fn logout_clears_the_session() {
        let dir = tempfile::tempdir().unwrap();
        let sessions = SessionManager::new(Arc::new(FileStore::new(dir.path())));

        sessions.login("Ada", "ada@example.com").await.unwrap();
        sessions.logout().await.unwrap();

        assert_eq!(sessions.current_user().await.unwrap(), None);
    }
}

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    error::DirectoryError,
    types::{Login, PasswordHash, User, UserId},
};

/// User record storage. Implementations own login uniqueness and must be safe to call concurrently.
#[async_trait]
pub trait UserDirectory: Send + Sync + 'static {
    /// Store a new user and return it. Fails with [`DirectoryError::LoginConflict`] if the
    /// login is already taken.
    async fn create(&self, login: &Login, password_hash: &PasswordHash)
        -> Result<User, DirectoryError>;

    /// Retrieve the user registered under `login`, if any.
    async fn find_by_login(&self, login: &Login) -> Result<Option<User>, DirectoryError>;
}

/// Directory kept in process memory, keyed by login.
#[derive(Default)]
pub struct MemoryDirectory {
    storage: RwLock<HashMap<String, User>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.storage.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.storage.read().await.is_empty()
    }
}

#[async_trait]
impl UserDirectory for MemoryDirectory {
    async fn create(
        &self,
        login: &Login,
        password_hash: &PasswordHash,
    ) -> Result<User, DirectoryError> {
        let mut storage = self.storage.write().await;

        if storage.contains_key(&login.0) {
            return Err(DirectoryError::LoginConflict);
        }

        let user = User {
            id: UserId(Uuid::new_v4().to_string()),
            login: login.clone(),
            password_hash: password_hash.clone(),
        };
        storage.insert(login.0.clone(), user.clone());

        Ok(user)
    }

    async fn find_by_login(&self, login: &Login) -> Result<Option<User>, DirectoryError> {
        Ok(self.storage.read().await.get(&login.0).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_then_find() {
        let directory = MemoryDirectory::new();
        let login = Login("alice".into());
        let hash = PasswordHash("$argon2id$stub".into());

        let created = directory.create(&login, &hash).await.unwrap();
        let found = directory.find_by_login(&login).await.unwrap().unwrap();

        assert_eq!(found.id, created.id);
        assert_eq!(found.password_hash, hash);
        assert!(directory
            .find_by_login(&Login("bob".into()))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn duplicate_login_conflicts() {
        let directory = MemoryDirectory::new();
        let login = Login("alice".into());
        let hash = PasswordHash("$argon2id$stub".into());

        directory.create(&login, &hash).await.unwrap();
        let second = directory.create(&login, &hash).await;

        assert!(matches!(second, Err(DirectoryError::LoginConflict)));
        assert_eq!(directory.len().await, 1);
    }
}

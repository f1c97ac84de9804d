//! Read-only access to users for eligibility and fee checks.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::DomainError;
use crate::event::{User, UserId};

/// Looks up users by id. Events never write through this port.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Returns the user, or `UserNotFound`.
    async fn find_user(&self, user_id: UserId) -> Result<User, DomainError>;
}

/// In-memory user directory.
#[derive(Clone, Default)]
pub struct InMemoryUserDirectory {
    users: Arc<RwLock<HashMap<UserId, User>>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a directory pre-filled with `users`.
    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        let users = users.into_iter().map(|user| (user.id(), user)).collect();
        Self {
            users: Arc::new(RwLock::new(users)),
        }
    }

    /// Adds or replaces a user.
    pub async fn insert(&self, user: User) {
        self.users.write().await.insert(user.id(), user);
    }

    pub async fn remove(&self, user_id: UserId) -> Option<User> {
        self.users.write().await.remove(&user_id)
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_user(&self, user_id: UserId) -> Result<User, DomainError> {
        self.users
            .read()
            .await
            .get(&user_id)
            .cloned()
            .ok_or(DomainError::UserNotFound(user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Generation, Role};
    use uuid::Uuid;

    fn user(n: u128) -> User {
        User::new(
            UserId::from_uuid(Uuid::from_u128(n)),
            format!("user-{n}"),
            [Role::new("member").unwrap()],
            Generation::new("2022").unwrap(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_find_user() {
        let directory = InMemoryUserDirectory::with_users([user(1)]);
        assert_eq!(directory.find_user(user(1).id()).await.unwrap(), user(1));
        assert!(matches!(
            directory.find_user(user(2).id()).await,
            Err(DomainError::UserNotFound(id)) if id == user(2).id()
        ));
    }

    #[tokio::test]
    async fn test_insert_and_remove() {
        let directory = InMemoryUserDirectory::new();
        assert!(directory.is_empty().await);

        directory.insert(user(1)).await;
        directory.insert(user(1)).await;
        assert_eq!(directory.len().await, 1);

        assert!(directory.remove(user(1).id()).await.is_some());
        assert!(directory.find_user(user(1).id()).await.is_err());
    }
}

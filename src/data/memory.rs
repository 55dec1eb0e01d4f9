use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument, trace};

use crate::domain::error::DomainError;
use crate::domain::repository::UserRepository;
use crate::domain::user::{CreateUserData, User};

struct UserTable {
    rows: HashMap<u32, User>,
    next_id: u32,
}

#[derive(Clone)]
pub struct InMemoryUserRepository {
    storage: Arc<RwLock<UserTable>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self {
            storage: Arc::new(RwLock::new(UserTable {
                rows: HashMap::new(),
                next_id: 1,
            })),
        }
    }
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    // Uniqueness check and insert happen under one write lock, so a race
    // between two creates for the same email resolves here, not at the
    // service's optimistic pre-check.
    #[instrument(skip(self, data), fields(email = %data.email))]
    async fn create(&self, data: CreateUserData) -> Result<User> {
        let mut table = self.storage.write().await;
        if table.rows.values().any(|u| u.email == data.email) {
            return Err(DomainError::Conflict("Email already exists".to_string()).into());
        }

        let now = Utc::now();
        let id = table.next_id;
        table.next_id += 1;

        let user = User {
            id,
            name: data.name,
            email: data.email,
            phone: data.phone,
            is_active: data.is_active,
            department: data.department,
            created_at: now,
            updated_at: now,
        };
        table.rows.insert(id, user.clone());
        debug!(user_id = id, "User row inserted");
        Ok(user)
    }

    async fn find_by_id(&self, id: u32) -> Result<Option<User>> {
        let table = self.storage.read().await;
        Ok(table.rows.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let table = self.storage.read().await;
        Ok(table.rows.values().find(|u| u.email == email).cloned())
    }

    async fn find_all(&self) -> Result<Vec<User>> {
        let table = self.storage.read().await;
        let mut users: Vec<User> = table.rows.values().cloned().collect();
        users.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        trace!(count = users.len(), "Listed user rows");
        Ok(users)
    }

    async fn update(&self, user: User) -> Result<User> {
        let mut table = self.storage.write().await;
        let existing = table
            .rows
            .get(&user.id)
            .ok_or_else(|| DomainError::NotFound("User not found".to_string()))?;

        if table
            .rows
            .values()
            .any(|u| u.id != user.id && u.email == user.email)
        {
            return Err(DomainError::Conflict("Email already exists".to_string()).into());
        }

        let stored = User {
            created_at: existing.created_at,
            updated_at: Utc::now(),
            ..user
        };
        table.rows.insert(stored.id, stored.clone());
        debug!(user_id = stored.id, "User row updated");
        Ok(stored)
    }

    async fn delete(&self, id: u32) -> Result<()> {
        let mut table = self.storage.write().await;
        table
            .rows
            .remove(&id)
            .ok_or_else(|| DomainError::NotFound("User not found".to_string()))?;
        debug!(user_id = id, "User row deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_data(name: &str, email: &str) -> CreateUserData {
        CreateUserData {
            name: name.to_string(),
            email: email.to_string(),
            phone: "1234567890".to_string(),
            is_active: true,
            department: None,
        }
    }

    #[tokio::test]
    async fn test_create_assigns_sequential_ids_and_timestamps() {
        let repo = InMemoryUserRepository::new();

        let a = repo.create(create_data("A", "a@example.com")).await.unwrap();
        let b = repo.create(create_data("B", "b@example.com")).await.unwrap();

        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert_eq!(a.created_at, a.updated_at);
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_email() {
        let repo = InMemoryUserRepository::new();
        repo.create(create_data("A", "dup@example.com")).await.unwrap();

        let err = repo
            .create(create_data("B", "dup@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DomainError>(),
            Some(DomainError::Conflict(_))
        ));

        let all = repo.find_all().await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_find_all_returns_newest_first() {
        let repo = InMemoryUserRepository::new();
        let a = repo.create(create_data("A", "a@example.com")).await.unwrap();
        let b = repo.create(create_data("B", "b@example.com")).await.unwrap();

        let all = repo.find_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, b.id);
        assert_eq!(all[1].id, a.id);
    }

    #[tokio::test]
    async fn test_update_preserves_created_at_and_bumps_updated_at() {
        let repo = InMemoryUserRepository::new();
        let user = repo.create(create_data("A", "a@example.com")).await.unwrap();

        let mut changed = user.clone();
        changed.name = "Renamed".to_string();
        let stored = repo.update(changed).await.unwrap();

        assert_eq!(stored.created_at, user.created_at);
        assert!(stored.updated_at >= user.updated_at);
        assert_eq!(stored.name, "Renamed");
    }

    #[tokio::test]
    async fn test_update_rejects_email_owned_by_another_user() {
        let repo = InMemoryUserRepository::new();
        repo.create(create_data("A", "a@example.com")).await.unwrap();
        let b = repo.create(create_data("B", "b@example.com")).await.unwrap();

        let mut changed = b.clone();
        changed.email = "a@example.com".to_string();
        let err = repo.update(changed).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DomainError>(),
            Some(DomainError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_removes_row() {
        let repo = InMemoryUserRepository::new();
        let user = repo.create(create_data("A", "a@example.com")).await.unwrap();

        repo.delete(user.id).await.unwrap();
        assert!(repo.find_by_id(user.id).await.unwrap().is_none());

        let err = repo.delete(user.id).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DomainError>(),
            Some(DomainError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_concurrent_creates_respect_uniqueness() {
        let repo = InMemoryUserRepository::new();

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let repo = repo.clone();
                tokio::spawn(async move {
                    repo.create(create_data("Race", "race@example.com")).await
                })
            })
            .collect();

        let mut ok = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                ok += 1;
            }
        }
        assert_eq!(ok, 1);
        assert_eq!(repo.find_all().await.unwrap().len(), 1);
    }
}

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument, trace};

use crate::domain::error::DomainError;
use crate::domain::repository::CredentialRepository;
use crate::domain::user::Credential;

struct CredentialTable {
    rows: HashMap<u32, Credential>,
    next_id: u32,
}

#[derive(Clone)]
pub struct InMemoryCredentialRepository {
    storage: Arc<RwLock<CredentialTable>>,
}

impl InMemoryCredentialRepository {
    pub fn new() -> Self {
        Self {
            storage: Arc::new(RwLock::new(CredentialTable {
                rows: HashMap::new(),
                next_id: 1,
            })),
        }
    }
}

impl Default for InMemoryCredentialRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialRepository for InMemoryCredentialRepository {
    // Check-and-insert under one write lock, same as the user table.
    #[instrument(skip(self, password_hash), fields(email = %email))]
    async fn create(&self, email: String, password_hash: String) -> Result<Credential> {
        let mut table = self.storage.write().await;
        if table.rows.values().any(|c| c.email == email) {
            return Err(DomainError::Conflict("Email already registered".to_string()).into());
        }

        let id = table.next_id;
        table.next_id += 1;
        let credential = Credential {
            id,
            email,
            password_hash,
            created_at: Utc::now(),
        };
        table.rows.insert(id, credential.clone());
        debug!(credential_id = id, "Credential row inserted");
        Ok(credential)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Credential>> {
        let table = self.storage.read().await;
        let credential = table.rows.values().find(|c| c.email == email).cloned();
        trace!(found = credential.is_some(), "Credential lookup by email");
        Ok(credential)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_and_find_by_email() {
        let repo = InMemoryCredentialRepository::new();

        let credential = repo
            .create("alice@example.com".to_string(), "hash".to_string())
            .await
            .unwrap();
        assert_eq!(credential.id, 1);

        let found = repo.find_by_email("alice@example.com").await.unwrap();
        assert!(found.is_some());
        assert_eq!(found.unwrap().password_hash, "hash");
    }

    #[tokio::test]
    async fn test_find_missing_email_returns_none() {
        let repo = InMemoryCredentialRepository::new();
        assert!(repo.find_by_email("nobody@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict() {
        let repo = InMemoryCredentialRepository::new();
        repo.create("dup@example.com".to_string(), "h1".to_string())
            .await
            .unwrap();

        let err = repo
            .create("dup@example.com".to_string(), "h2".to_string())
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DomainError>(),
            Some(DomainError::Conflict(_))
        ));
    }
}

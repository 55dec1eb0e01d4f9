use anyhow::Result;
use async_trait::async_trait;

use crate::domain::user::{CreateUserData, Credential, User};

/// Store contract for the user table. The store owns id assignment,
/// timestamps and unique-email enforcement.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, data: CreateUserData) -> Result<User>;
    async fn find_by_id(&self, id: u32) -> Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    /// Newest first by creation time.
    async fn find_all(&self) -> Result<Vec<User>>;
    async fn update(&self, user: User) -> Result<User>;
    async fn delete(&self, id: u32) -> Result<()>;
}

#[async_trait]
pub trait CredentialRepository: Send + Sync {
    async fn create(&self, email: String, password_hash: String) -> Result<Credential>;
    async fn find_by_email(&self, email: &str) -> Result<Option<Credential>>;
}

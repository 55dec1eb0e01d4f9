use anyhow::Result;
use std::sync::Arc;

use crate::domain::error::DomainError;
use crate::domain::repository::UserRepository;
use crate::domain::user::{CreateUserData, UpdateUserData, User};

pub struct UserService<R: UserRepository> {
    repository: Arc<R>,
}

impl<R: UserRepository> UserService<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    pub async fn create_user(&self, data: CreateUserData) -> Result<User> {
        // Optimistic pre-check for a precise message; the store enforces
        // uniqueness atomically if a concurrent create slips past it.
        if self.repository.find_by_email(&data.email).await?.is_some() {
            return Err(DomainError::Conflict("Email already exists".to_string()).into());
        }
        self.repository.create(data).await
    }

    pub async fn get_all_users(&self) -> Result<Vec<User>> {
        self.repository.find_all().await
    }

    /// Internal lookup; absence is a plain `None`, not an error.
    pub async fn get_user_by_id(&self, id: u32) -> Result<Option<User>> {
        self.repository.find_by_id(id).await
    }

    pub async fn update_user(&self, id: u32, data: UpdateUserData) -> Result<User> {
        let existing = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::NotFound("User not found".to_string()))?;

        if let Some(email) = &data.email {
            if *email != existing.email
                && self.repository.find_by_email(email).await?.is_some()
            {
                return Err(DomainError::Conflict("Email already exists".to_string()).into());
            }
        }

        let mut merged = existing;
        if let Some(name) = data.name {
            merged.name = name;
        }
        if let Some(email) = data.email {
            merged.email = email;
        }
        if let Some(phone) = data.phone {
            merged.phone = phone;
        }
        if let Some(is_active) = data.is_active {
            merged.is_active = is_active;
        }
        if let Some(department) = data.department {
            merged.department = department;
        }

        self.repository.update(merged).await
    }

    pub async fn delete_user(&self, id: u32) -> Result<()> {
        if self.repository.find_by_id(id).await?.is_none() {
            return Err(DomainError::NotFound("User not found".to_string()).into());
        }
        self.repository.delete(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::memory::InMemoryUserRepository;

    fn service() -> UserService<InMemoryUserRepository> {
        UserService::new(Arc::new(InMemoryUserRepository::new()))
    }

    fn create_data(email: &str) -> CreateUserData {
        CreateUserData {
            name: "Alice".to_string(),
            email: email.to_string(),
            phone: "1234567890".to_string(),
            is_active: true,
            department: None,
        }
    }

    #[tokio::test]
    async fn test_create_then_read_back_round_trip() {
        let service = service();

        let created = service.create_user(create_data("a@example.com")).await.unwrap();
        let read = service.get_user_by_id(created.id).await.unwrap().unwrap();

        assert_eq!(read.name, created.name);
        assert_eq!(read.email, created.email);
        assert_eq!(read.phone, created.phone);
        assert_eq!(read.department, None);
        assert!(read.is_active);
    }

    #[tokio::test]
    async fn test_create_duplicate_email_is_conflict() {
        let service = service();
        service.create_user(create_data("dup@example.com")).await.unwrap();

        let err = service
            .create_user(create_data("dup@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DomainError>(),
            Some(DomainError::Conflict(_))
        ));
        assert_eq!(service.get_all_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_missing_user_is_not_found() {
        let service = service();
        let data = UpdateUserData {
            name: Some("X".to_string()),
            ..Default::default()
        };

        let err = service.update_user(999, data).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DomainError>(),
            Some(DomainError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_merges_only_supplied_fields() {
        let service = service();
        let created = service.create_user(create_data("a@example.com")).await.unwrap();

        let updated = service
            .update_user(
                created.id,
                UpdateUserData {
                    name: Some("Renamed".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Renamed");
        assert_eq!(updated.email, created.email);
        assert_eq!(updated.phone, created.phone);
    }

    #[tokio::test]
    async fn test_update_to_taken_email_is_conflict() {
        let service = service();
        service.create_user(create_data("a@example.com")).await.unwrap();
        let b = service.create_user(create_data("b@example.com")).await.unwrap();

        let err = service
            .update_user(
                b.id,
                UpdateUserData {
                    email: Some("a@example.com".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DomainError>(),
            Some(DomainError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_update_keeping_own_email_is_allowed() {
        let service = service();
        let created = service.create_user(create_data("a@example.com")).await.unwrap();

        let updated = service
            .update_user(
                created.id,
                UpdateUserData {
                    email: Some("a@example.com".to_string()),
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(!updated.is_active);
    }

    #[tokio::test]
    async fn test_update_can_clear_department() {
        let service = service();
        let mut data = create_data("a@example.com");
        data.department = Some("Engineering".to_string());
        let created = service.create_user(data).await.unwrap();

        let updated = service
            .update_user(
                created.id,
                UpdateUserData {
                    department: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.department, None);
    }

    #[tokio::test]
    async fn test_delete_then_lookup_returns_none_then_not_found() {
        let service = service();
        let created = service.create_user(create_data("a@example.com")).await.unwrap();

        service.delete_user(created.id).await.unwrap();
        assert!(service.get_user_by_id(created.id).await.unwrap().is_none());

        let err = service.delete_user(created.id).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DomainError>(),
            Some(DomainError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_get_all_users_newest_first() {
        let service = service();
        let a = service.create_user(create_data("a@example.com")).await.unwrap();
        let b = service.create_user(create_data("b@example.com")).await.unwrap();

        let all = service.get_all_users().await.unwrap();
        assert_eq!(
            all.iter().map(|u| u.id).collect::<Vec<_>>(),
            vec![b.id, a.id]
        );
    }
}

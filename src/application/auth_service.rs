use anyhow::Result;
use std::sync::Arc;
use tracing::{error, info, instrument, trace, warn};

use crate::domain::error::DomainError;
use crate::domain::repository::CredentialRepository;
use crate::domain::user::{LoginData, RegisterData};
use crate::infrastructure::security::{generate_token, hash_password, verify_password};

pub struct AuthService<R: CredentialRepository> {
    credentials: Arc<R>,
    jwt_secret: String,
}

impl<R: CredentialRepository> AuthService<R> {
    pub fn new(credentials: Arc<R>, jwt_secret: String) -> Self {
        Self {
            credentials,
            jwt_secret,
        }
    }

    /// Registers a new credential and immediately issues a bearer token.
    #[instrument(skip(self, req), fields(email = %req.email))]
    pub async fn register(&self, req: RegisterData) -> Result<String> {
        trace!("Starting registration");

        if self.credentials.find_by_email(&req.email).await?.is_some() {
            warn!("Registration rejected, email already taken");
            return Err(DomainError::Conflict("Email already registered".to_string()).into());
        }

        let password_hash = hash_password(&req.password).map_err(|e| {
            error!(error = %e, "Failed to hash password");
            DomainError::Internal(format!("Failed to hash password: {e}"))
        })?;

        let credential = self.credentials.create(req.email, password_hash).await?;

        let token = generate_token(credential.id, &credential.email, &self.jwt_secret)
            .map_err(|e| {
                error!(error = %e, "Failed to sign token");
                DomainError::Internal(format!("Failed to sign token: {e}"))
            })?;

        info!(credential_id = credential.id, "User registered successfully");
        Ok(token)
    }

    /// Verifies credentials and mints a fresh 1-hour token. Unknown email
    /// and wrong password produce the same message so callers cannot
    /// enumerate accounts.
    #[instrument(skip(self, req), fields(email = %req.email))]
    pub async fn login(&self, req: LoginData) -> Result<String> {
        trace!("Starting login");

        let credential = self
            .credentials
            .find_by_email(&req.email)
            .await?
            .ok_or_else(|| {
                warn!("Login attempt for unknown email");
                DomainError::Authentication("Invalid credentials".to_string())
            })?;

        let is_valid =
            verify_password(&req.password, &credential.password_hash).map_err(|e| {
                error!(error = %e, "Failed to verify password");
                DomainError::Internal(format!("Failed to verify password: {e}"))
            })?;

        if !is_valid {
            warn!(credential_id = credential.id, "Invalid password during login");
            return Err(DomainError::Authentication("Invalid credentials".to_string()).into());
        }

        let token = generate_token(credential.id, &credential.email, &self.jwt_secret)
            .map_err(|e| {
                error!(error = %e, "Failed to sign token");
                DomainError::Internal(format!("Failed to sign token: {e}"))
            })?;

        info!(credential_id = credential.id, "Login successful");
        Ok(token)
    }
}

use actix_web::{FromRequest, HttpMessage, HttpResponse, ResponseError, web};
use serde::Serialize;
use std::pin::Pin;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

use crate::application::auth_service::AuthService;
use crate::application::user_service::UserService;
use crate::data::credentials::InMemoryCredentialRepository;
use crate::data::memory::InMemoryUserRepository;
use crate::domain::error::DomainError;
use crate::domain::user::{CreateUserData, UpdateUserData, User};
use crate::domain::validation;
use crate::presentation::middleware::AuthenticatedUser;

pub struct AppState {
    pub user_service: UserService<InMemoryUserRepository>,
    pub auth_service: AuthService<InMemoryCredentialRepository>,
}

// Uniform envelopes: every response is exactly one of these shapes.
#[derive(Serialize)]
struct DataEnvelope<T: Serialize> {
    success: bool,
    data: T,
}

#[derive(Serialize)]
struct MessageEnvelope {
    success: bool,
    message: String,
}

/// Central error translator. The only place a failure kind becomes an
/// HTTP status and JSON envelope.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Invariant(String),
    #[error("{0}")]
    Authentication(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Internal(String),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        match self {
            ApiError::Invariant(_) => actix_web::http::StatusCode::BAD_REQUEST,
            ApiError::Authentication(_) => actix_web::http::StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => actix_web::http::StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => actix_web::http::StatusCode::CONFLICT,
            ApiError::Internal(_) => actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = self.to_string();

        match self {
            ApiError::Internal(_) => {
                error!(error = %message, status = %status, "Unexpected fault")
            }
            _ => warn!(error = %message, status = %status, "Request rejected"),
        }

        let message = if message.is_empty() {
            "Internal server error".to_string()
        } else {
            message
        };

        HttpResponse::build(status).json(MessageEnvelope {
            success: false,
            message,
        })
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Conflict(msg) => ApiError::Conflict(msg),
            DomainError::Authentication(msg) => ApiError::Authentication(msg),
            DomainError::NotFound(msg) => ApiError::NotFound(msg),
            DomainError::Invariant(msg) => ApiError::Invariant(msg),
            DomainError::Internal(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast_ref::<DomainError>() {
            Some(DomainError::Conflict(msg)) => ApiError::Conflict(msg.clone()),
            Some(DomainError::Authentication(msg)) => ApiError::Authentication(msg.clone()),
            Some(DomainError::NotFound(msg)) => ApiError::NotFound(msg.clone()),
            Some(DomainError::Invariant(msg)) => ApiError::Invariant(msg.clone()),
            Some(DomainError::Internal(msg)) => ApiError::Internal(msg.clone()),
            None => ApiError::Internal(err.to_string()),
        }
    }
}

// AuthenticatedUser extractor, populated by JwtAuthMiddleware.
impl FromRequest for AuthenticatedUser {
    type Error = ApiError;
    type Future = Pin<Box<dyn std::future::Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(
        req: &actix_web::HttpRequest,
        _payload: &mut actix_web::dev::Payload,
    ) -> Self::Future {
        let user = req.extensions().get::<AuthenticatedUser>().cloned();
        Box::pin(async move {
            user.ok_or_else(|| ApiError::Authentication("User not authenticated".to_string()))
        })
    }
}

// Handlers

pub async fn index() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "message": "User Management API" }))
}

pub async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(MessageEnvelope {
        success: false,
        message: "Route not found".to_string(),
    })
}

#[instrument(skip(state, payload), fields(actor = %actor.email, email = %payload.email))]
pub async fn create_user(
    state: web::Data<AppState>,
    actor: AuthenticatedUser,
    payload: web::Json<CreateUserData>,
) -> Result<HttpResponse, ApiError> {
    let data = payload.into_inner();
    validation::validate_payload(&data)?;

    let user = state.user_service.create_user(data).await.map_err(|e| {
        error!(error = %e, "Failed to create user");
        ApiError::from(e)
    })?;

    info!(user_id = user.id, "User created successfully");
    Ok(HttpResponse::Created().json(DataEnvelope {
        success: true,
        data: user,
    }))
}

#[instrument(skip(state))]
pub async fn get_all_users(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let users: Vec<User> = state.user_service.get_all_users().await.map_err(|e| {
        error!(error = %e, "Failed to list users");
        ApiError::from(e)
    })?;

    Ok(HttpResponse::Ok().json(DataEnvelope {
        success: true,
        data: users,
    }))
}

#[instrument(skip(state, payload), fields(actor = %actor.email, user_id = %*path))]
pub async fn update_user(
    state: web::Data<AppState>,
    actor: AuthenticatedUser,
    path: web::Path<u32>,
    payload: web::Json<UpdateUserData>,
) -> Result<HttpResponse, ApiError> {
    let user_id = path.into_inner();
    let data = payload.into_inner();
    validation::validate_update(&data)?;

    let user = state
        .user_service
        .update_user(user_id, data)
        .await
        .map_err(|e| {
            error!(user_id = user_id, error = %e, "Failed to update user");
            ApiError::from(e)
        })?;

    info!(user_id = user.id, "User updated successfully");
    Ok(HttpResponse::Ok().json(DataEnvelope {
        success: true,
        data: user,
    }))
}

#[instrument(skip(state), fields(actor = %actor.email, user_id = %*path))]
pub async fn delete_user(
    state: web::Data<AppState>,
    actor: AuthenticatedUser,
    path: web::Path<u32>,
) -> Result<HttpResponse, ApiError> {
    let user_id = path.into_inner();

    state.user_service.delete_user(user_id).await.map_err(|e| {
        error!(user_id = user_id, error = %e, "Failed to delete user");
        ApiError::from(e)
    })?;

    info!(user_id = user_id, "User deleted successfully");
    Ok(HttpResponse::Ok().json(MessageEnvelope {
        success: true,
        message: "User deleted".to_string(),
    }))
}

use actix_web::{HttpResponse, web};
use serde::Serialize;
use tracing::{error, info, instrument};

use crate::domain::user::{LoginData, RegisterData};
use crate::domain::validation;
use crate::presentation::handlers::{ApiError, AppState};

#[derive(Serialize)]
struct TokenEnvelope {
    success: bool,
    message: String,
    token: String,
}

#[instrument(skip(state, payload), fields(email = %payload.email))]
pub async fn register(
    state: web::Data<AppState>,
    payload: web::Json<RegisterData>,
) -> Result<HttpResponse, ApiError> {
    let data = payload.into_inner();
    validation::validate_payload(&data)?;

    let token = state.auth_service.register(data).await.map_err(|e| {
        error!(error = %e, "Failed to register");
        ApiError::from(e)
    })?;

    info!("Registration completed");
    Ok(HttpResponse::Created().json(TokenEnvelope {
        success: true,
        message: "Registered successfully".to_string(),
        token,
    }))
}

#[instrument(skip(state, payload), fields(email = %payload.email))]
pub async fn login(
    state: web::Data<AppState>,
    payload: web::Json<LoginData>,
) -> Result<HttpResponse, ApiError> {
    let data = payload.into_inner();
    validation::validate_payload(&data)?;

    let token = state.auth_service.login(data).await.map_err(|e| {
        error!(error = %e, "Failed to login");
        ApiError::from(e)
    })?;

    Ok(HttpResponse::Ok().json(TokenEnvelope {
        success: true,
        message: "Login successful".to_string(),
        token,
    }))
}

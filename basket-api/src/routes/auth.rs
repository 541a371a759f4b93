//! Authentication endpoints
//!
//! - `POST /users/register`: create an account
//! - `POST /users/login`: exchange credentials for a session token
//! - `POST /users/logout`: revoke the caller's current token

use axum::{extract::State, http::StatusCode, Extension, Json};
use basket_shared::{
    auth::{middleware::AuthContext, password, session},
    models::user::{CreateUser, User},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::not_blank;
use crate::{app::AppState, error::ApiResult};

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 8, max = 128, message = "Password must be 8 to 128 characters"))]
    pub password: String,

    #[validate(
        custom(function = "not_blank", message = "Name is required"),
        length(max = 255, message = "Name must be at most 255 characters")
    )]
    pub name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            message: message.into(),
        })
    }
}

/// POST /users/register
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    req.validate()?;

    let password_hash = password::hash_password(&req.password)?;

    // A duplicate active email trips users_email_active_idx and maps to 409
    let user = User::create(
        &state.db,
        CreateUser {
            email: req.email.trim().to_string(),
            password_hash,
            name: req.name.trim().to_string(),
        },
    )
    .await?;

    tracing::info!(user_id = %user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        MessageResponse::new("User registered successfully"),
    ))
}

/// POST /users/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    req.validate()?;

    let issued = session::login(
        &state.db,
        state.jwt_secret(),
        state.config.jwt.lifetime(),
        req.email.trim(),
        &req.password,
    )
    .await?;

    Ok(Json(LoginResponse {
        token: issued.token,
        name: issued.user.name,
        email: issued.user.email,
    }))
}

/// POST /users/logout
pub async fn logout(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<MessageResponse>> {
    session::revoke(&state.db, auth.user_id).await?;

    Ok(MessageResponse::new("Logged out successfully"))
}

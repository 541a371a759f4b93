//! Bearer authentication middleware for Axum
//!
//! The middleware resolves `Authorization: Bearer <token>` to a user through
//! [`session::resolve`](super::session::resolve) and stores an
//! [`AuthContext`] in the request extensions. Handlers read it with
//! `Extension<AuthContext>`.
//!
//! ```no_run
//! use axum::{middleware, routing::get, Extension, Router};
//! use basket_shared::auth::middleware::{create_session_middleware, AuthContext};
//! use sqlx::PgPool;
//!
//! async fn whoami(Extension(auth): Extension<AuthContext>) -> String {
//!     auth.email
//! }
//!
//! # fn example(pool: PgPool) {
//! let app: Router = Router::new()
//!     .route("/whoami", get(whoami))
//!     .layer(middleware::from_fn(create_session_middleware(
//!         pool,
//!         "a-secret-key-that-is-at-least-32-bytes",
//!     )));
//! # }
//! ```

use std::future::Future;
use std::pin::Pin;

use axum::{
    extract::Request,
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use super::jwt::JwtError;
use super::session;

/// Identity of the caller, attached to every authenticated request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub email: String,
}

/// Why a request could not be authenticated
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing credentials")]
    MissingCredentials,

    #[error("{0}")]
    InvalidFormat(String),

    #[error("{0}")]
    InvalidToken(String),

    /// Signature is fine but the token is no longer the user's current one
    #[error("Session has been revoked")]
    Revoked,

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

impl From<JwtError> for AuthError {
    fn from(e: JwtError) -> Self {
        match e {
            JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
            JwtError::InvalidIssuer => AuthError::InvalidToken("Invalid issuer".to_string()),
            other => AuthError::InvalidToken(format!("Invalid token: {}", other)),
        }
    }
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = match &self {
            AuthError::DatabaseError(e) => {
                tracing::error!(error = %e, "Database error during authentication");
                "Internal server error".to_string()
            }
            other => {
                tracing::debug!(reason = %other, "Rejected unauthenticated request");
                other.to_string()
            }
        };

        let code = if status == StatusCode::UNAUTHORIZED {
            "unauthorized"
        } else {
            "internal_error"
        };

        (status, Json(json!({ "error": code, "message": message }))).into_response()
    }
}

/// Extracts the token from an `Authorization: Bearer` header
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingCredentials)?
        .to_str()
        .map_err(|_| AuthError::InvalidFormat("Authorization header is not valid ASCII".to_string()))?;

    let token = value
        .strip_prefix("Bearer ")
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))?
        .trim();

    if token.is_empty() {
        return Err(AuthError::MissingCredentials);
    }

    Ok(token)
}

/// Authenticates the request and attaches an [`AuthContext`]
pub async fn session_auth_middleware(
    pool: PgPool,
    secret: String,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = bearer_token(req.headers())?;
    let auth_context = session::resolve(&pool, &secret, token).await?;

    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}

type MiddlewareFuture = Pin<Box<dyn Future<Output = Result<Response, AuthError>> + Send>>;

/// Builds a closure usable with `axum::middleware::from_fn`
pub fn create_session_middleware(
    pool: PgPool,
    secret: impl Into<String>,
) -> impl Fn(Request, Next) -> MiddlewareFuture + Clone {
    let secret = secret.into();
    move |req, next| {
        let pool = pool.clone();
        let secret = secret.clone();
        Box::pin(session_auth_middleware(pool, secret, req, next))
    }
}

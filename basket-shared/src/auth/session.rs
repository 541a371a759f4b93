//! Session issue, resolution and revocation
//!
//! Each user has at most one live session: the SHA-256 digest of the token
//! issued at the last login is stored on the user row. A token resolves
//! only while its digest still matches, so logging in again or logging out
//! invalidates every earlier token without keeping a blocklist.

use chrono::Duration;
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use uuid::Uuid;

use super::jwt::{create_token, validate_token, Claims, JwtError};
use super::middleware::{AuthContext, AuthError};
use super::password::{verify_password, PasswordError};
use crate::models::user::User;

/// Error type for login
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Unknown email, deleted account or wrong password
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Jwt(#[from] JwtError),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// A freshly issued session
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub user: User,
}

/// Hex-encoded SHA-256 of a token, as stored in `users.active_token_hash`
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Checks credentials and makes a new token the user's current one
pub async fn login(
    pool: &PgPool,
    secret: &str,
    lifetime: Duration,
    email: &str,
    password: &str,
) -> Result<IssuedSession, SessionError> {
    let user = User::find_active_by_email(pool, email)
        .await?
        .ok_or(SessionError::InvalidCredentials)?;

    if !verify_password(password, &user.password_hash)? {
        tracing::debug!(user_id = %user.id, "Password mismatch on login");
        return Err(SessionError::InvalidCredentials);
    }

    let claims = Claims::new(user.id, user.email.clone(), lifetime);
    let token = create_token(&claims, secret)?;

    // The user may have been deleted since the lookup
    if !User::set_active_token_hash(pool, user.id, Some(&hash_token(&token))).await? {
        return Err(SessionError::InvalidCredentials);
    }

    tracing::info!(user_id = %user.id, "Session issued");

    Ok(IssuedSession { token, user })
}

/// Maps a bearer token to the caller's identity
///
/// Fails unless the signature, issuer and lifetime are valid, the user is
/// still active, and the token is the user's current one.
pub async fn resolve(pool: &PgPool, secret: &str, token: &str) -> Result<AuthContext, AuthError> {
    let claims = validate_token(token, secret)?;

    let user = User::find_active_by_id(pool, claims.sub)
        .await?
        .ok_or_else(|| AuthError::InvalidToken("Unknown user".to_string()))?;

    match user.active_token_hash.as_deref() {
        Some(stored) if stored == hash_token(token) => Ok(AuthContext {
            user_id: user.id,
            email: user.email,
        }),
        _ => Err(AuthError::Revoked),
    }
}

/// Clears the user's current session; returns false for an unknown user
pub async fn revoke(pool: &PgPool, user_id: Uuid) -> Result<bool, sqlx::Error> {
    let revoked = User::set_active_token_hash(pool, user_id, None).await?;

    if revoked {
        tracing::info!(user_id = %user_id, "Session revoked");
    }

    Ok(revoked)
}

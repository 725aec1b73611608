//! 身份错误类型定义

use crate::error::ApiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Email is already registered")]
    EmailTaken,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Missing, unknown or expired session token")]
    InvalidToken,

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Password hashing error: {0}")]
    Hashing(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::EmailTaken => {
                ApiError::Conflict("Email is already registered".to_string())
            }
            IdentityError::InvalidCredentials => {
                ApiError::Unauthorized("Invalid email or password".to_string())
            }
            IdentityError::InvalidToken => {
                ApiError::Unauthorized("Authentication required".to_string())
            }
            IdentityError::UserNotFound(_) => ApiError::NotFound("User not found".to_string()),
            IdentityError::Hashing(e) => ApiError::Internal(format!("password hashing: {e}")),
            IdentityError::Database(e) => ApiError::Internal(format!("identity store: {e}")),
        }
    }
}

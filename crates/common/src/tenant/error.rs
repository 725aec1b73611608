//! 租户错误类型定义

use crate::error::ApiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TenantError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Tenant '{0}' not found")]
    NotFound(String),

    #[error("Tenant '{0}' already exists")]
    AlreadyExists(String),

    #[error("User is already linked to tenant '{0}'")]
    AlreadyLinked(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<TenantError> for ApiError {
    fn from(err: TenantError) -> Self {
        match err {
            TenantError::Validation(msg) => ApiError::BadRequest(msg),
            TenantError::NotFound(_) => ApiError::NotFound("Tenant not found".to_string()),
            TenantError::AlreadyExists(_) => {
                ApiError::Conflict("Tenant ID is already taken".to_string())
            }
            TenantError::AlreadyLinked(_) => {
                ApiError::Conflict("User is already an administrator of this tenant".to_string())
            }
            TenantError::Database(e) => ApiError::Internal(format!("tenant store: {e}")),
            TenantError::Parse(e) => ApiError::Internal(format!("tenant decode: {e}")),
        }
    }
}

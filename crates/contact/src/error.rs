//! 联系表单服务错误定义

use portfolify_common::{ApiError, TenantError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContactError {
    #[error("Invalid message: {0}")]
    Validation(String),

    #[error("Tenant '{0}' not found")]
    TenantNotFound(String),

    #[error("Message '{0}' not found")]
    MessageNotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Tenant directory error: {0}")]
    Directory(#[from] TenantError),

    #[error("Mail error: {0}")]
    Mail(String),
}

impl From<ContactError> for ApiError {
    fn from(err: ContactError) -> Self {
        match err {
            ContactError::Validation(msg) => ApiError::BadRequest(msg),
            ContactError::TenantNotFound(_) => ApiError::NotFound("Tenant not found".to_string()),
            ContactError::MessageNotFound(_) => {
                ApiError::NotFound("Message not found".to_string())
            }
            ContactError::Directory(e) => e.into(),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

pub type ContactResult<T> = Result<T, ContactError>;

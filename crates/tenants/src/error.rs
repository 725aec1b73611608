//! 注册流程错误定义

use portfolify_common::{ApiError, IdentityError, TenantError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("Invalid registration: {0}")]
    Validation(String),

    #[error("Tenant ID '{0}' is already taken")]
    TenantIdTaken(String),

    #[error("Email is already registered")]
    EmailTaken,

    /// slug 检查本身失败
    #[error("Tenant lookup failed: {0}")]
    Lookup(TenantError),

    #[error("Failed to create identity: {0}")]
    Identity(IdentityError),

    #[error("Failed to create tenant: {0}")]
    TenantCreation(TenantError),

    #[error("Failed to link administrator: {0}")]
    AdminLink(TenantError),
}

impl RegistrationError {
    /// 用于 `portfolify_registrations_total{outcome}` 的标签
    pub fn outcome(&self) -> &'static str {
        match self {
            RegistrationError::Validation(_) => "invalid",
            RegistrationError::TenantIdTaken(_) => "tenant_taken",
            RegistrationError::EmailTaken => "email_taken",
            RegistrationError::Lookup(_) => "lookup_failed",
            RegistrationError::Identity(_) => "identity_failed",
            RegistrationError::TenantCreation(_) => "tenant_failed",
            RegistrationError::AdminLink(_) => "admin_link_failed",
        }
    }
}

impl From<RegistrationError> for ApiError {
    fn from(err: RegistrationError) -> Self {
        match err {
            RegistrationError::Validation(msg) => ApiError::BadRequest(msg),
            RegistrationError::TenantIdTaken(_) => {
                ApiError::Conflict("Tenant ID is already taken".to_string())
            }
            RegistrationError::EmailTaken => {
                ApiError::Conflict("Email is already registered".to_string())
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

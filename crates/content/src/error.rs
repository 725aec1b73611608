use portfolify_common::{ApiError, TenantError};
use thiserror::Error;

use crate::section::Section;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("Unknown section '{0}'")]
    UnknownSection(String),

    #[error("Section '{0}' holds a single entry and has no item routes")]
    NotACollection(Section),

    #[error("Section '{0}' is a list, use the item routes")]
    NotASingleton(Section),

    #[error("Content payload must be a JSON object")]
    InvalidPayload,

    #[error("Tenant '{0}' not found")]
    TenantNotFound(String),

    #[error("Item '{0}' not found")]
    ItemNotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Tenant directory error: {0}")]
    Directory(#[from] TenantError),
}

impl From<ContentError> for ApiError {
    fn from(err: ContentError) -> Self {
        match err {
            ContentError::UnknownSection(_) => ApiError::NotFound(err.to_string()),
            ContentError::NotACollection(_)
            | ContentError::NotASingleton(_)
            | ContentError::InvalidPayload => ApiError::BadRequest(err.to_string()),
            ContentError::TenantNotFound(_) => ApiError::NotFound("Tenant not found".to_string()),
            ContentError::ItemNotFound(_) => ApiError::NotFound("Item not found".to_string()),
            ContentError::Directory(e) => e.into(),
            ContentError::Database(e) => ApiError::Internal(format!("content store: {e}")),
        }
    }
}

pub type ContentResult<T> = Result<T, ContentError>;

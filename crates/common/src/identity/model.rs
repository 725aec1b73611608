//! 身份数据结构

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// 已注册的用户（不含口令哈希）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, FromRow)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// 登录会话
///
/// `access_token` 只在创建时返回一次，数据库中只保存其 SHA-256 摘要。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    pub access_token: String,
    pub token_type: String,
    pub user_id: String,
    pub expires_at: i64,
}

impl Session {
    pub(crate) fn bearer(access_token: String, user_id: String, expires_at: i64) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
            user_id,
            expires_at,
        }
    }
}

/// `auth_users` 表中的完整行
#[derive(Debug, Clone, FromRow)]
pub(crate) struct UserRecord {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<UserRecord> for AuthUser {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id,
            email: record.email,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

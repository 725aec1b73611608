//! 留言数据结构

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// 已保存的访客留言
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct Message {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub email: String,
    pub subject: Option<String>,
    pub message: String,
    pub is_read: bool,
    pub created_at: i64,
}

/// 公开联系表单提交的内容
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ContactRequest {
    #[validate(length(min = 1, max = 100, message = "must be 1-100 characters"))]
    pub name: String,

    #[validate(email(message = "must be a valid e-mail address"))]
    pub email: String,

    #[validate(length(max = 200, message = "must be at most 200 characters"))]
    #[serde(default)]
    pub subject: Option<String>,

    #[validate(length(min = 1, max = 5000, message = "must be 1-5000 characters"))]
    pub message: String,
}

impl ContactRequest {
    /// 去除首尾空白，空主题视为未填写
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            subject: self
                .subject
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            message: self.message.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageQuery {
    #[serde(default)]
    pub unread: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MarkRead {
    pub is_read: bool,
}

//! 租户管理员关联
//!
//! `admin_users` 表把身份用户与租户 slug 关联起来，是所有写操作的授权依据。

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use strum::{Display, EnumString};

/// 管理员角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AdminRole {
    /// 注册时创建的所有者
    Owner,
    Admin,
}

impl TryFrom<String> for AdminRole {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// 管理员关联记录
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct AdminUser {
    pub id: String,
    pub user_id: String,
    pub tenant_id: String,
    #[sqlx(try_from = "String")]
    pub role: AdminRole,
    pub created_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_text_form() {
        assert_eq!(AdminRole::Owner.to_string(), "owner");
        assert_eq!("admin".parse::<AdminRole>().unwrap(), AdminRole::Admin);
        assert!(AdminRole::try_from("root".to_string()).is_err());
        assert_eq!(
            serde_json::to_string(&AdminRole::Owner).unwrap(),
            "\"owner\""
        );
    }
}

use async_trait::async_trait;

use super::error::IdentityError;
use super::model::{AuthUser, Session};

/// 身份提供者
///
/// 注册流程在创建租户之前调用 `create_user`，失败补偿时调用 `delete_user`。
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// 创建账户；邮箱已存在时返回 [`IdentityError::EmailTaken`]
    async fn create_user(&self, email: &str, password: &str) -> Result<AuthUser, IdentityError>;

    /// 删除账户及其会话，返回是否确实删除了记录
    async fn delete_user(&self, user_id: &str) -> Result<bool, IdentityError>;

    async fn sign_in(&self, email: &str, password: &str)
    -> Result<(AuthUser, Session), IdentityError>;

    /// 注销会话，返回令牌是否曾经有效
    async fn sign_out(&self, access_token: &str) -> Result<bool, IdentityError>;

    /// 根据 bearer 令牌解析当前用户
    async fn authenticate(&self, access_token: &str) -> Result<AuthUser, IdentityError>;
}

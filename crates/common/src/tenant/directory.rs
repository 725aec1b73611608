//! 租户目录抽象
//!
//! 注册流程与各路由服务只通过该 trait 访问租户数据，
//! 测试中可以替换为会失败的实现来验证补偿逻辑。

use async_trait::async_trait;

use super::admin::{AdminRole, AdminUser};
use super::error::TenantError;
use super::model::{NewTenant, Tenant, TenantUpdate};

#[async_trait]
pub trait TenantDirectory: Send + Sync {
    /// slug 是否已被占用（包括已停用的租户）
    async fn slug_exists(&self, slug: &str) -> Result<bool, TenantError>;

    /// 创建租户；slug 冲突时返回 [`TenantError::AlreadyExists`]
    async fn create_tenant(&self, new_tenant: NewTenant) -> Result<Tenant, TenantError>;

    /// 删除租户，返回是否确实删除了记录
    async fn delete_tenant(&self, slug: &str) -> Result<bool, TenantError>;

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Tenant>, TenantError>;

    /// 部分更新租户；租户不存在时返回 [`TenantError::NotFound`]
    async fn update_tenant(&self, slug: &str, update: TenantUpdate)
    -> Result<Tenant, TenantError>;

    async fn link_admin(
        &self,
        user_id: &str,
        slug: &str,
        role: AdminRole,
    ) -> Result<AdminUser, TenantError>;

    /// 查询用户在租户中的角色，没有关联时返回 `None`
    async fn admin_role(&self, user_id: &str, slug: &str)
    -> Result<Option<AdminRole>, TenantError>;

    /// 用户管理的所有租户
    async fn tenants_for_user(&self, user_id: &str)
    -> Result<Vec<(Tenant, AdminRole)>, TenantError>;

    /// 租户所有者的邮箱地址
    async fn owner_emails(&self, slug: &str) -> Result<Vec<String>, TenantError>;
}

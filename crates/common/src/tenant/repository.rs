//! 租户数据库操作
//!
//! [`TenantDirectory`] 的 SQLite 实现

use async_trait::async_trait;
use chrono::Utc;
use sqlx::types::Json;

use super::admin::{AdminRole, AdminUser};
use super::directory::TenantDirectory;
use super::error::TenantError;
use super::model::{NewTenant, Tenant, TenantUpdate};
use crate::storage::{Database, is_unique_violation};

const TENANT_COLUMNS: &str =
    "id, tenant_id, name, logo_url, theme_config, is_active, created_at, updated_at";

/// 基于 SQLite 的租户目录
#[derive(Clone, Debug)]
pub struct TenantRepository {
    db: Database,
}

impl TenantRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TenantDirectory for TenantRepository {
    async fn slug_exists(&self, slug: &str) -> Result<bool, TenantError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tenants WHERE tenant_id = ?")
            .bind(slug)
            .fetch_one(self.db.get_pool())
            .await?;
        Ok(count > 0)
    }

    async fn create_tenant(&self, new_tenant: NewTenant) -> Result<Tenant, TenantError> {
        let tenant = new_tenant.into_tenant();

        let result = sqlx::query(
            "INSERT INTO tenants (id, tenant_id, name, logo_url, theme_config, is_active, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&tenant.id)
        .bind(&tenant.tenant_id)
        .bind(&tenant.name)
        .bind(&tenant.logo_url)
        .bind(Json(&tenant.theme_config))
        .bind(tenant.is_active)
        .bind(tenant.created_at)
        .bind(tenant.updated_at)
        .execute(self.db.get_pool())
        .await;

        match result {
            Ok(_) => {
                tracing::info!("Tenant created: {}", tenant.tenant_id);
                Ok(tenant)
            }
            Err(e) if is_unique_violation(&e) => Err(TenantError::AlreadyExists(tenant.tenant_id)),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_tenant(&self, slug: &str) -> Result<bool, TenantError> {
        let result = sqlx::query("DELETE FROM tenants WHERE tenant_id = ?")
            .bind(slug)
            .execute(self.db.get_pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Tenant>, TenantError> {
        let tenant = sqlx::query_as::<_, Tenant>(&format!(
            "SELECT {TENANT_COLUMNS} FROM tenants WHERE tenant_id = ?"
        ))
        .bind(slug)
        .fetch_optional(self.db.get_pool())
        .await?;
        Ok(tenant)
    }

    async fn update_tenant(
        &self,
        slug: &str,
        update: TenantUpdate,
    ) -> Result<Tenant, TenantError> {
        let mut tenant = self
            .get_by_slug(slug)
            .await?
            .ok_or_else(|| TenantError::NotFound(slug.to_string()))?;

        update.apply_to(&mut tenant);

        sqlx::query(
            "UPDATE tenants SET name = ?, logo_url = ?, theme_config = ?, is_active = ?, updated_at = ?
             WHERE tenant_id = ?",
        )
        .bind(&tenant.name)
        .bind(&tenant.logo_url)
        .bind(Json(&tenant.theme_config))
        .bind(tenant.is_active)
        .bind(tenant.updated_at)
        .bind(slug)
        .execute(self.db.get_pool())
        .await?;

        Ok(tenant)
    }

    async fn link_admin(
        &self,
        user_id: &str,
        slug: &str,
        role: AdminRole,
    ) -> Result<AdminUser, TenantError> {
        let admin = AdminUser {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            tenant_id: slug.to_string(),
            role,
            created_at: Utc::now().timestamp(),
        };

        let result = sqlx::query(
            "INSERT INTO admin_users (id, user_id, tenant_id, role, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&admin.id)
        .bind(&admin.user_id)
        .bind(&admin.tenant_id)
        .bind(admin.role.to_string())
        .bind(admin.created_at)
        .execute(self.db.get_pool())
        .await;

        match result {
            Ok(_) => Ok(admin),
            Err(e) if is_unique_violation(&e) => Err(TenantError::AlreadyLinked(slug.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    async fn admin_role(
        &self,
        user_id: &str,
        slug: &str,
    ) -> Result<Option<AdminRole>, TenantError> {
        let role: Option<(String,)> =
            sqlx::query_as("SELECT role FROM admin_users WHERE user_id = ? AND tenant_id = ?")
                .bind(user_id)
                .bind(slug)
                .fetch_optional(self.db.get_pool())
                .await?;

        role.map(|(r,)| AdminRole::try_from(r).map_err(|e| TenantError::Parse(e.to_string())))
            .transpose()
    }

    async fn tenants_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<(Tenant, AdminRole)>, TenantError> {
        let links = sqlx::query_as::<_, AdminUser>(
            "SELECT id, user_id, tenant_id, role, created_at FROM admin_users
             WHERE user_id = ? ORDER BY created_at",
        )
        .bind(user_id)
        .fetch_all(self.db.get_pool())
        .await?;

        let mut tenants = Vec::with_capacity(links.len());
        for link in links {
            if let Some(tenant) = self.get_by_slug(&link.tenant_id).await? {
                tenants.push((tenant, link.role));
            }
        }
        Ok(tenants)
    }

    async fn owner_emails(&self, slug: &str) -> Result<Vec<String>, TenantError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT u.email FROM admin_users a
             JOIN auth_users u ON u.id = a.user_id
             WHERE a.tenant_id = ? AND a.role = ?
             ORDER BY a.created_at",
        )
        .bind(slug)
        .bind(AdminRole::Owner.to_string())
        .fetch_all(self.db.get_pool())
        .await?;

        Ok(rows.into_iter().map(|(email,)| email).collect())
    }
}

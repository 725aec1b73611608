//! 租户核心数据结构

use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use sqlx::FromRow;

use super::error::TenantError;
use super::validation::is_valid_logo_url;

/// 租户结构体
///
/// 一个租户对应一个作品集站点，`tenant_id` 是出现在 URL 中的 slug，全局唯一；
/// `id` 是内部 UUID。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct Tenant {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub logo_url: Option<String>,
    #[sqlx(json)]
    pub theme_config: Value,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// 创建租户所需的字段
#[derive(Debug, Clone)]
pub struct NewTenant {
    pub tenant_id: String,
    pub name: String,
    pub logo_url: Option<String>,
}

impl NewTenant {
    pub fn new(tenant_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            name: name.into(),
            logo_url: None,
        }
    }

    pub fn with_logo(mut self, logo_url: Option<String>) -> Self {
        self.logo_url = logo_url;
        self
    }

    /// 生成待插入的租户行
    pub(crate) fn into_tenant(self) -> Tenant {
        let now = Utc::now().timestamp();
        Tenant {
            id: uuid::Uuid::new_v4().to_string(),
            tenant_id: self.tenant_id,
            name: self.name,
            logo_url: self.logo_url,
            theme_config: Value::Object(Default::default()),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// 租户的部分更新
///
/// 未出现的字段保持不变；`logo_url: null` 表示清除 logo。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TenantUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "present_or_null")]
    pub logo_url: Option<Option<String>>,
    #[serde(default)]
    pub theme_config: Option<Value>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl TenantUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.logo_url.is_none()
            && self.theme_config.is_none()
            && self.is_active.is_none()
    }

    /// 规整并检查字段：名称去除首尾空白后 2 到 100 个字符，主题配置必须是 JSON 对象
    pub fn normalize(mut self) -> Result<Self, TenantError> {
        if let Some(name) = self.name.take() {
            let name = name.trim().to_string();
            let len = name.chars().count();
            if !(2..=100).contains(&len) {
                return Err(TenantError::Validation(
                    "name: must be 2-100 characters".to_string(),
                ));
            }
            self.name = Some(name);
        }

        if let Some(theme) = &self.theme_config {
            if !theme.is_object() {
                return Err(TenantError::Validation(
                    "theme_config: must be a JSON object".to_string(),
                ));
            }
        }

        if let Some(Some(logo)) = &self.logo_url {
            if !is_valid_logo_url(logo) {
                return Err(TenantError::Validation(
                    "logo_url: must be an http(s) URL".to_string(),
                ));
            }
        }

        Ok(self)
    }

    /// 将更新应用到已有租户上
    pub fn apply_to(self, tenant: &mut Tenant) {
        if let Some(name) = self.name {
            tenant.name = name;
        }
        if let Some(logo_url) = self.logo_url {
            tenant.logo_url = logo_url;
        }
        if let Some(theme) = self.theme_config {
            tenant.theme_config = theme;
        }
        if let Some(active) = self.is_active {
            tenant.is_active = active;
        }
        tenant.updated_at = Utc::now().timestamp();
    }
}

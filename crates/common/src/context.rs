//! 路由服务共享的运行时上下文
//!
//! 由启动器构建一次，克隆后交给每个路由服务；
//! 身份与租户目录以 trait 对象持有，测试时可以替换。

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{PortfolifyConfig, RateLimitConfig};
use crate::identity::{IdentityProvider, SqliteIdentityStore};
use crate::security::{AccessGuard, RateLimiter};
use crate::storage::Database;
use crate::tenant::{TenantDirectory, TenantRepository};

#[derive(Clone)]
pub struct ServiceContext {
    pub db: Database,
    pub identity: Arc<dyn IdentityProvider>,
    pub tenants: Arc<dyn TenantDirectory>,
    pub guard: AccessGuard,
    pub limiter: RateLimiter,
    pub rate_limits: RateLimitConfig,
}

impl ServiceContext {
    pub fn new(
        db: Database,
        identity: Arc<dyn IdentityProvider>,
        tenants: Arc<dyn TenantDirectory>,
        rate_limits: RateLimitConfig,
    ) -> Self {
        let guard = AccessGuard::new(identity.clone(), tenants.clone());
        let limiter = RateLimiter::new(db.clone(), rate_limits.enabled)
            .with_retention(rate_limits.max_window());
        Self {
            db,
            identity,
            tenants,
            guard,
            limiter,
            rate_limits,
        }
    }

    /// 打开 `{sqlite_path}/portfolify.db` 并装配 SQLite 实现
    pub async fn from_config(config: &PortfolifyConfig) -> Result<Self> {
        let db = Database::new(&config.sqlite_path)
            .await
            .with_context(|| format!("Failed to open database under {:?}", config.sqlite_path))?;
        Ok(Self::with_database(db, config))
    }

    pub fn with_database(db: Database, config: &PortfolifyConfig) -> Self {
        let identity = Arc::new(SqliteIdentityStore::new(
            db.clone(),
            Duration::from_secs(config.services.auth.session_ttl_secs),
        ));
        let tenants = Arc::new(TenantRepository::new(db.clone()));
        Self::new(db, identity, tenants, config.rate_limit.clone())
    }
}

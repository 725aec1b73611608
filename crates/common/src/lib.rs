//! Portfolify 基础设施库
//!
//! 为各个 HTTP 路由服务提供共享组件：配置、存储、租户目录、身份认证、
//! 速率限制、访问控制与监控指标

pub mod config;
pub mod context;
pub mod error;
pub mod identity;
pub mod metrics;
pub mod security;
pub mod storage;
pub mod tenant;
pub mod util;

// Re-export commonly used types for convenience
pub use config::PortfolifyConfig;
pub use context::ServiceContext;
pub use error::{ApiError, ApiJson, ApiResult, validation_message};
pub use identity::{AuthUser, IdentityError, IdentityProvider, Session, SqliteIdentityStore};
pub use security::{
    AccessGuard, AdminContext, BearerToken, ClientIp, RateLimitDecision, RateLimiter, TrustedProxies,
};
pub use storage::Database;
pub use tenant::{
    AdminRole, AdminUser, NewTenant, Tenant, TenantDirectory, TenantError, TenantRepository,
    TenantUpdate,
};
pub use util::TlsConfigurer;

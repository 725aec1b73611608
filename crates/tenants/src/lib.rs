//! 租户服务
//!
//! 挂载在 `/tenants` 下：
//! - `POST /register` 自助注册（身份 + 租户 + 所有者关联），失败时逐步补偿
//! - `GET /{slug}` 公开查询已启用的租户
//! - `GET /{slug}/availability` slug 可用性检查
//! - `PUT /{slug}` 管理员更新租户设置

pub mod error;
pub mod handlers;
pub mod registration;

pub use error::RegistrationError;
pub use handlers::{TenantsState, create_router};
pub use registration::{RegistrationOutcome, RegistrationRequest, RegistrationService};

use axum::Router;
use portfolify_common::ServiceContext;
use tracing::info;

/// 创建租户路由器
pub fn create_tenants_router(ctx: &ServiceContext) -> Router {
    info!("Creating tenants router");
    create_router(TenantsState::new(ctx.clone()))
}

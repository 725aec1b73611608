//! 认证服务
//!
//! 挂载在 `/auth` 下：
//! - `POST /login` 邮箱口令登录，按 `login` 策略限流
//! - `POST /logout` 注销当前 bearer 会话
//! - `GET /me` 当前用户及其管理的租户

pub mod handlers;

pub use handlers::create_router;

use axum::Router;
use portfolify_common::ServiceContext;
use tracing::info;

/// 创建认证路由器
pub fn create_auth_router(ctx: &ServiceContext) -> Router {
    info!("Creating auth router");
    create_router(ctx.clone())
}

//! 内容服务
//!
//! 挂载在 `/content` 下，读写租户作品集的各个区块：
//! - 单行区块 `hero`、`about`、`contact_info`：`GET`/`PUT /{slug}/{section}`
//! - 列表区块 `skills`、`projects`、`experience`：`GET`/`POST /{slug}/{section}`，
//!   `PUT`/`DELETE /{slug}/{section}/{id}`
//!
//! 读取公开，写入要求租户管理员。

pub mod error;
pub mod handlers;
pub mod model;
pub mod section;
pub mod store;

pub use error::ContentError;
pub use handlers::{ContentState, create_router};
pub use section::Section;
pub use store::ContentStore;

use axum::Router;
use portfolify_common::ServiceContext;
use tracing::info;

/// 创建内容路由器
pub fn create_content_router(ctx: &ServiceContext) -> Router {
    info!("Creating content router");
    create_router(ContentState::new(ctx.clone()))
}

//! 内容 HTTP 服务

use crate::service::{HttpRouterService, ServiceType, info::ServiceInfo};
use anyhow::Result;
use async_trait::async_trait;
use axum::Router;
use portfolify_common::{ServiceContext, config::PortfolifyConfig};

pub struct ContentHttpService {
    info: ServiceInfo,
    ctx: ServiceContext,
}

impl std::fmt::Debug for ContentHttpService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentHttpService")
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

impl ContentHttpService {
    pub fn new(ctx: ServiceContext, config: &PortfolifyConfig) -> Self {
        Self {
            info: ServiceInfo::new(
                "Content Service",
                ServiceType::Content,
                Some("作品集区块的读取与管理".to_string()),
                config,
            ),
            ctx,
        }
    }
}

#[async_trait]
impl HttpRouterService for ContentHttpService {
    fn info(&self) -> &ServiceInfo {
        &self.info
    }

    fn info_mut(&mut self) -> &mut ServiceInfo {
        &mut self.info
    }

    async fn build_router(&mut self) -> Result<Router> {
        Ok(::content::create_content_router(&self.ctx))
    }

    fn route_prefix(&self) -> &str {
        "/content"
    }
}

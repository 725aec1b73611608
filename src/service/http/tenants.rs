//! 租户 HTTP 服务

use crate::service::{HttpRouterService, ServiceType, info::ServiceInfo};
use anyhow::Result;
use async_trait::async_trait;
use axum::Router;
use portfolify_common::{ServiceContext, config::PortfolifyConfig};
use tracing::info;

pub struct TenantsHttpService {
    info: ServiceInfo,
    ctx: ServiceContext,
}

impl std::fmt::Debug for TenantsHttpService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TenantsHttpService")
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

impl TenantsHttpService {
    pub fn new(ctx: ServiceContext, config: &PortfolifyConfig) -> Self {
        Self {
            info: ServiceInfo::new(
                "Tenants Service",
                ServiceType::Tenants,
                Some("租户自助注册、公开查询与设置管理".to_string()),
                config,
            ),
            ctx,
        }
    }
}

#[async_trait]
impl HttpRouterService for TenantsHttpService {
    fn info(&self) -> &ServiceInfo {
        &self.info
    }

    fn info_mut(&mut self) -> &mut ServiceInfo {
        &mut self.info
    }

    async fn build_router(&mut self) -> Result<Router> {
        let router = ::tenants::create_tenants_router(&self.ctx);
        info!("Tenants router built successfully");
        Ok(router)
    }

    fn route_prefix(&self) -> &str {
        "/tenants"
    }
}

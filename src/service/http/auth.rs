//! 认证 HTTP 服务

use crate::service::{HttpRouterService, ServiceType, info::ServiceInfo};
use anyhow::Result;
use async_trait::async_trait;
use axum::Router;
use portfolify_common::{ServiceContext, config::PortfolifyConfig};

pub struct AuthHttpService {
    info: ServiceInfo,
    ctx: ServiceContext,
}

impl std::fmt::Debug for AuthHttpService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthHttpService")
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

impl AuthHttpService {
    pub fn new(ctx: ServiceContext, config: &PortfolifyConfig) -> Self {
        Self {
            info: ServiceInfo::new(
                "Auth Service",
                ServiceType::Auth,
                Some("登录、注销与当前用户信息".to_string()),
                config,
            ),
            ctx,
        }
    }
}

#[async_trait]
impl HttpRouterService for AuthHttpService {
    fn info(&self) -> &ServiceInfo {
        &self.info
    }

    fn info_mut(&mut self) -> &mut ServiceInfo {
        &mut self.info
    }

    async fn build_router(&mut self) -> Result<Router> {
        Ok(::auth::create_auth_router(&self.ctx))
    }

    fn route_prefix(&self) -> &str {
        "/auth"
    }
}

//! 联系表单 HTTP 服务

use crate::service::{HttpRouterService, ServiceType, info::ServiceInfo};
use anyhow::Result;
use async_trait::async_trait;
use axum::Router;
use portfolify_common::{ServiceContext, config::PortfolifyConfig};

/// 联系表单服务，SMTP 设置来自 `services.contact`
pub struct ContactHttpService {
    info: ServiceInfo,
    ctx: ServiceContext,
    config: PortfolifyConfig,
}

impl std::fmt::Debug for ContactHttpService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContactHttpService")
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

impl ContactHttpService {
    pub fn new(ctx: ServiceContext, config: &PortfolifyConfig) -> Self {
        Self {
            info: ServiceInfo::new(
                "Contact Service",
                ServiceType::Contact,
                Some("访客留言与通知邮件".to_string()),
                config,
            ),
            ctx,
            config: config.clone(),
        }
    }
}

#[async_trait]
impl HttpRouterService for ContactHttpService {
    fn info(&self) -> &ServiceInfo {
        &self.info
    }

    fn info_mut(&mut self) -> &mut ServiceInfo {
        &mut self.info
    }

    async fn build_router(&mut self) -> Result<Router> {
        Ok(::contact::create_contact_router(&self.ctx, &self.config))
    }

    fn route_prefix(&self) -> &str {
        "/contact"
    }
}

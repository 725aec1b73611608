//! 服务容器模块 - 封装不同类型的服务

use super::HttpRouterService;
use super::{AuthHttpService, ContactHttpService, ContentHttpService, TenantsHttpService};
use crate::service::info::ServiceInfo;
use axum::Router;
use url::Url;

/// 服务容器，用于封装不同类型的服务
#[derive(Debug)]
pub enum ServiceContainer {
    Auth(AuthHttpService),
    Tenants(TenantsHttpService),
    Contact(ContactHttpService),
    Content(ContentHttpService),
}

impl ServiceContainer {
    pub fn auth(service: AuthHttpService) -> Self {
        Self::Auth(service)
    }

    pub fn tenants(service: TenantsHttpService) -> Self {
        Self::Tenants(service)
    }

    pub fn contact(service: ContactHttpService) -> Self {
        Self::Contact(service)
    }

    pub fn content(service: ContentHttpService) -> Self {
        Self::Content(service)
    }

    fn as_service(&self) -> &dyn HttpRouterService {
        match self {
            ServiceContainer::Auth(service) => service,
            ServiceContainer::Tenants(service) => service,
            ServiceContainer::Contact(service) => service,
            ServiceContainer::Content(service) => service,
        }
    }

    fn as_service_mut(&mut self) -> &mut dyn HttpRouterService {
        match self {
            ServiceContainer::Auth(service) => service,
            ServiceContainer::Tenants(service) => service,
            ServiceContainer::Contact(service) => service,
            ServiceContainer::Content(service) => service,
        }
    }

    pub fn info(&self) -> &ServiceInfo {
        self.as_service().info()
    }

    pub fn route_prefix(&self) -> &str {
        self.as_service().route_prefix()
    }

    pub async fn build_router(&mut self) -> anyhow::Result<Router> {
        self.as_service_mut().build_router().await
    }

    pub async fn on_start(&mut self, base_url: Url) -> anyhow::Result<()> {
        self.as_service_mut().on_start(base_url).await
    }

    pub async fn on_stop(&mut self) -> anyhow::Result<()> {
        self.as_service_mut().on_stop().await
    }

    pub fn set_error(&mut self, error: impl Into<String>) {
        self.as_service_mut().info_mut().set_error(error);
    }
}

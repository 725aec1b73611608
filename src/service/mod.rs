//! 服务管理模块
//!
//! 每个业务模块以一个 HTTP 路由服务的形式挂载到同一个 axum 服务器上。
//!
//! ## 核心概念
//!
//! - `HttpRouterService`: HTTP 路由服务的核心 trait，提供 axum 路由器
//! - `ServiceInfo`: 服务的基本信息与运行状态
//! - `ServiceManager`: 服务管理器，负责合并路由并管理服务器生命周期

pub mod container;
pub mod http;
pub mod info;
pub mod manager;
pub mod trace;

use anyhow::Result;
use async_trait::async_trait;
use axum::Router;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use strum::Display;
use tracing::info;
use url::Url;

pub use container::ServiceContainer;
pub use http::{AuthHttpService, ContactHttpService, ContentHttpService, TenantsHttpService};
pub use info::{ServiceInfo, ServiceStatus};
pub use manager::ServiceManager;

/// 服务类型
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Display, PartialEq, Eq)]
pub enum ServiceType {
    Auth,
    Tenants,
    Contact,
    Content,
}

/// HTTP 路由服务的核心 trait - 为 axum 提供路由器
#[async_trait]
pub trait HttpRouterService: Send + Sync + Debug {
    /// 获取服务信息
    fn info(&self) -> &ServiceInfo;

    /// 获取可变的服务信息
    fn info_mut(&mut self) -> &mut ServiceInfo;

    /// 构建 axum 路由器
    async fn build_router(&mut self) -> Result<Router>;

    /// 服务启动回调（路由器已挂载并开始监听后调用）
    async fn on_start(&mut self, base_url: Url) -> Result<()> {
        self.info_mut().set_running(base_url);
        Ok(())
    }

    /// 服务停止回调
    async fn on_stop(&mut self) -> Result<()> {
        info!("HTTP router service '{}' stopped", self.info().name);
        self.info_mut().status = ServiceStatus::Unknown;
        Ok(())
    }

    /// 获取路由前缀（如 "/auth"、"/tenants"）
    fn route_prefix(&self) -> &str;
}

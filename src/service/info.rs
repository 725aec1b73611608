//! 服务信息管理模块

use portfolify_common::config::PortfolifyConfig;
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use url::Url;

use super::ServiceType;

/// 服务运行状态
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ServiceStatus {
    Unknown,
    Running(String),
    Error(String),
}

/// 服务基本信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceInfo {
    /// 服务名称
    pub name: String,
    pub service_type: ServiceType,
    /// 对外地址，如 `http://localhost:3001`
    pub public_base: String,
    /// 服务状态
    pub status: ServiceStatus,
    /// 服务描述
    pub description: Option<String>,
}

/// 开发环境优先使用 HTTP，其他环境使用 HTTPS
pub fn public_base(config: &PortfolifyConfig) -> String {
    if config.env == "dev"
        && let Some(http) = &config.bind.http
    {
        return format!("http://{}:{}", http.domain_name, http.port);
    }

    match &config.bind.https {
        Some(https) => format!("https://{}:{}", https.domain_name, https.port),
        None => "https://localhost".to_string(),
    }
}

impl ServiceInfo {
    pub fn new(
        name: impl Into<String>,
        service_type: ServiceType,
        description: Option<String>,
        config: &PortfolifyConfig,
    ) -> Self {
        Self {
            name: name.into(),
            service_type,
            public_base: public_base(config),
            status: ServiceStatus::Unknown,
            description,
        }
    }

    /// 设置服务状态为运行中
    pub fn set_running(&mut self, url: Url) {
        self.status = ServiceStatus::Running(url.to_string());
        info!("Service '{}' is now running at {}", self.name, self.url());
    }

    /// 设置服务状态为错误
    pub fn set_error(&mut self, error: impl Into<String>) {
        let error_msg = error.into();
        error!("Service '{}' encountered error: {}", self.name, error_msg);
        self.status = ServiceStatus::Error(error_msg);
    }

    pub fn is_running(&self) -> bool {
        matches!(self.status, ServiceStatus::Running(_))
    }

    /// 获取服务状态的 URL（如果是运行状态）
    pub fn url(&self) -> String {
        match &self.status {
            ServiceStatus::Running(url) => url.to_string(),
            _ => "N/A".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portfolify_common::config::bind::https::HttpsBindConfig;

    #[test]
    fn test_public_base_by_environment() {
        let mut config = PortfolifyConfig::default();
        assert_eq!(public_base(&config), "http://localhost:3001");

        config.env = "prod".to_string();
        assert_eq!(public_base(&config), "https://localhost");

        config.bind.https = Some(HttpsBindConfig {
            domain_name: "portfolify.example.com".to_string(),
            ..Default::default()
        });
        assert_eq!(public_base(&config), "https://portfolify.example.com:3443");
    }

    #[test]
    fn test_status_transitions() {
        let mut info = ServiceInfo::new(
            "Auth Service",
            ServiceType::Auth,
            None,
            &PortfolifyConfig::default(),
        );
        assert!(!info.is_running());
        assert_eq!(info.url(), "N/A");

        info.set_running(Url::parse("http://localhost:3001/auth").unwrap());
        assert!(info.is_running());
        assert_eq!(info.url(), "http://localhost:3001/auth");

        info.set_error("boom");
        assert_eq!(info.status, ServiceStatus::Error("boom".to_string()));
    }
}

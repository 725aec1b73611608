//! 全局 IP 突发防护
//!
//! 使用 tower-governor 在进程内按 IP 限制请求速率，作用于整个 HTTP 服务，
//! 与基于数据库的路由级限流相互独立。客户端 IP 的判定规则与路由级限流相同。

use axum::body::Body;
use governor::middleware::NoOpMiddleware;
use std::sync::Arc;
use tower_governor::{GovernorLayer, governor::GovernorConfigBuilder};

use crate::config::IpShieldConfig;
use crate::security::client_ip::ClientIpKeyExtractor;

/// 根据配置创建 IP 限流层；参数无效时返回 `None`
pub fn ip_shield(
    config: &IpShieldConfig,
) -> Option<GovernorLayer<ClientIpKeyExtractor, NoOpMiddleware, Body>> {
    let governor_conf = GovernorConfigBuilder::default()
        .per_second(config.per_second)
        .burst_size(config.burst_size)
        .key_extractor(ClientIpKeyExtractor)
        .finish()?;

    Some(GovernorLayer::new(Arc::new(governor_conf)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ip_shield_creation() {
        assert!(ip_shield(&IpShieldConfig::default()).is_some());
    }

    #[test]
    fn test_zero_burst_is_rejected() {
        let config = IpShieldConfig {
            enabled: true,
            per_second: 1,
            burst_size: 0,
        };
        assert!(ip_shield(&config).is_none());
    }
}

//! 速率限制配置
//!
//! 每个受保护的路由对应一条策略：窗口期内最多允许 `limit` 次请求。

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::time::Duration;

/// 单条限流策略
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    /// 窗口内允许的最大请求数
    pub limit: u32,
    /// 滑动窗口长度（秒）
    pub window_secs: u64,
}

impl RateLimitPolicy {
    pub const fn new(limit: u32, window_secs: u64) -> Self {
        Self { limit, window_secs }
    }

    pub fn window_ms(&self) -> i64 {
        i64::try_from(self.window_secs)
            .unwrap_or(i64::MAX)
            .saturating_mul(1000)
    }
}

/// 速率限制配置
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RateLimitConfig {
    /// 关闭后所有请求直接放行
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_login")]
    pub login: RateLimitPolicy,

    #[serde(default = "default_register")]
    pub register: RateLimitPolicy,

    #[serde(default = "default_contact")]
    pub contact: RateLimitPolicy,

    #[serde(default = "default_availability")]
    pub availability: RateLimitPolicy,

    /// 只有来自这些地址的连接才采信 `X-Forwarded-For` / `X-Real-IP`
    #[serde(default = "default_trusted_proxies")]
    pub trusted_proxies: Vec<IpAddr>,

    /// 进程内的全局 IP 防护（tower_governor），默认关闭
    #[serde(default)]
    pub ip_shield: IpShieldConfig,
}

/// 全局 IP 防护配置
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct IpShieldConfig {
    #[serde(default)]
    pub enabled: bool,

    /// 令牌补充周期（秒）
    #[serde(default = "default_shield_per_second")]
    pub per_second: u64,

    /// 突发容量
    #[serde(default = "default_shield_burst")]
    pub burst_size: u32,
}

fn default_true() -> bool {
    true
}

fn default_login() -> RateLimitPolicy {
    RateLimitPolicy::new(10, 15 * 60)
}

fn default_register() -> RateLimitPolicy {
    RateLimitPolicy::new(5, 60 * 60)
}

fn default_contact() -> RateLimitPolicy {
    RateLimitPolicy::new(5, 60 * 60)
}

fn default_availability() -> RateLimitPolicy {
    RateLimitPolicy::new(60, 60)
}

fn default_trusted_proxies() -> Vec<IpAddr> {
    vec![IpAddr::V4(Ipv4Addr::LOCALHOST), IpAddr::V6(Ipv6Addr::LOCALHOST)]
}

fn default_shield_per_second() -> u64 {
    1
}

fn default_shield_burst() -> u32 {
    50
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            login: default_login(),
            register: default_register(),
            contact: default_contact(),
            availability: default_availability(),
            trusted_proxies: default_trusted_proxies(),
            ip_shield: IpShieldConfig::default(),
        }
    }
}

impl Default for IpShieldConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            per_second: default_shield_per_second(),
            burst_size: default_shield_burst(),
        }
    }
}

impl RateLimitConfig {
    /// 所有策略中最长的窗口
    pub fn max_window(&self) -> Duration {
        let secs = [self.login, self.register, self.contact, self.availability]
            .iter()
            .map(|policy| policy.window_secs)
            .max()
            .unwrap_or(0);
        Duration::from_secs(secs)
    }

    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if !self.enabled {
            errors.push("Warning: rate limiting is disabled".to_string());
        }

        for (name, policy) in [
            ("login", &self.login),
            ("register", &self.register),
            ("contact", &self.contact),
            ("availability", &self.availability),
        ] {
            if policy.limit == 0 {
                errors.push(format!("rate_limit.{name}.limit must be greater than 0"));
            }
            if policy.window_secs == 0 {
                errors.push(format!("rate_limit.{name}.window_secs must be greater than 0"));
            }
        }

        if self.ip_shield.enabled && (self.ip_shield.per_second == 0 || self.ip_shield.burst_size == 0) {
            errors.push(
                "rate_limit.ip_shield.per_second and burst_size must be greater than 0".to_string(),
            );
        }

        errors
    }
}

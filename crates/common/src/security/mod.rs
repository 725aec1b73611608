//! 请求安全组件
//!
//! - `ratelimit.rs` - 基于 SQLite 的滑动窗口限流（存储故障时放行）
//! - `client_ip.rs` - 客户端 IP 提取（只采信受信任代理的转发头）
//! - `access.rs` - bearer 令牌认证与租户管理员授权
//! - `shield.rs` - 进程内的全局 IP 突发防护

pub mod access;
pub mod client_ip;
pub mod ratelimit;
pub mod shield;

pub use access::{AccessGuard, AdminContext, BearerToken};
pub use client_ip::{ClientIp, ClientIpKeyExtractor, TrustedProxies};
pub use ratelimit::{RateLimitDecision, RateLimiter};
pub use shield::ip_shield;

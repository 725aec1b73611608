//! 客户端 IP 提取
//!
//! 只有当 TCP 对端是受信任的代理时才采信转发头，此时优先级为：`X-Forwarded-For` 第一跳、
//! `X-Real-IP`、对端地址。对端不受信任时直接使用对端地址，都没有时为 "unknown"。
//! 请求上没有连接信息（进程内调用）时没有可核对的对端，转发头照常采信。

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::{Extensions, HeaderMap, Request, request::Parts};
use std::convert::Infallible;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use tower_governor::{GovernorError, key_extractor::KeyExtractor};

/// 允许设置转发头的代理地址，作为请求扩展注入
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustedProxies(Arc<[IpAddr]>);

impl TrustedProxies {
    pub fn new(addrs: impl IntoIterator<Item = IpAddr>) -> Self {
        Self(addrs.into_iter().map(|ip| ip.to_canonical()).collect())
    }

    pub fn trusts(&self, ip: IpAddr) -> bool {
        self.0.contains(&ip.to_canonical())
    }
}

impl Default for TrustedProxies {
    fn default() -> Self {
        Self::new([IpAddr::V4(Ipv4Addr::LOCALHOST), IpAddr::V6(Ipv6Addr::LOCALHOST)])
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub String);

impl ClientIp {
    pub fn resolve(headers: &HeaderMap, peer: Option<SocketAddr>, trusted: &TrustedProxies) -> Self {
        if let Some(addr) = peer
            && !trusted.trusts(addr.ip())
        {
            return Self(addr.ip().to_string());
        }

        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };

        if let Some(forwarded) = header("x-forwarded-for")
            && let Some(first) = forwarded.split(',').map(str::trim).find(|s| !s.is_empty())
        {
            return Self(first.to_string());
        }

        if let Some(real_ip) = header("x-real-ip") {
            return Self(real_ip.to_string());
        }

        match peer {
            Some(addr) => Self(addr.ip().to_string()),
            None => Self("unknown".to_string()),
        }
    }

    /// 从请求头和扩展中解析：对端来自 `ConnectInfo`，代理列表来自 `TrustedProxies` 扩展
    pub fn from_http(headers: &HeaderMap, extensions: &Extensions) -> Self {
        let peer = extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        match extensions.get::<TrustedProxies>() {
            Some(trusted) => Self::resolve(headers, peer, trusted),
            None => Self::resolve(headers, peer, &TrustedProxies::default()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientIp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_http(&parts.headers, &parts.extensions))
    }
}

/// tower_governor 的 key 提取器，与路由级限流使用同一套客户端 IP 规则
#[derive(Debug, Clone, Copy, Default)]
pub struct ClientIpKeyExtractor;

impl KeyExtractor for ClientIpKeyExtractor {
    type Key = String;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        Ok(ClientIp::from_http(req.headers(), req.extensions()).0)
    }
}

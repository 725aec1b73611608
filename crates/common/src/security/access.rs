//! 访问控制
//!
//! 写操作先要求有效的 bearer 令牌（否则 401），再要求当前用户是目标租户的管理员（否则 403）。
//! 租户不存在时同样返回 403，不暴露租户是否存在。

use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, header, request::Parts};
use std::sync::Arc;

use crate::error::ApiError;
use crate::identity::{AuthUser, IdentityError, IdentityProvider};
use crate::metrics::AUTH_FAILURES;
use crate::tenant::{AdminRole, TenantDirectory};

/// `Authorization: Bearer <token>` 中的令牌
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BearerToken(pub String);

impl BearerToken {
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
        let (scheme, token) = value.trim().split_once(' ')?;
        let token = token.trim();
        if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
            return None;
        }
        Some(Self(token.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Self::from_headers(&parts.headers).ok_or_else(|| {
            AUTH_FAILURES.with_label_values(&["missing_token"]).inc();
            ApiError::Unauthorized("Authentication required".to_string())
        })
    }
}

/// 通过授权检查后的调用者
#[derive(Debug, Clone)]
pub struct AdminContext {
    pub user: AuthUser,
    pub role: AdminRole,
}

#[derive(Clone)]
pub struct AccessGuard {
    identity: Arc<dyn IdentityProvider>,
    tenants: Arc<dyn TenantDirectory>,
}

impl AccessGuard {
    pub fn new(identity: Arc<dyn IdentityProvider>, tenants: Arc<dyn TenantDirectory>) -> Self {
        Self { identity, tenants }
    }

    /// 解析令牌对应的用户
    pub async fn authenticate(&self, token: &BearerToken) -> Result<AuthUser, ApiError> {
        match self.identity.authenticate(token.as_str()).await {
            Ok(user) => Ok(user),
            Err(IdentityError::InvalidToken) => {
                AUTH_FAILURES.with_label_values(&["invalid_token"]).inc();
                Err(IdentityError::InvalidToken.into())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// 要求调用者是 `slug` 租户的管理员
    pub async fn require_admin(
        &self,
        token: &BearerToken,
        slug: &str,
    ) -> Result<AdminContext, ApiError> {
        let user = self.authenticate(token).await?;

        match self.tenants.admin_role(&user.id, slug).await? {
            Some(role) => Ok(AdminContext { user, role }),
            None => {
                tracing::info!("User {} denied admin access to tenant {}", user.id, slug);
                AUTH_FAILURES.with_label_values(&["not_admin"]).inc();
                Err(ApiError::Forbidden(
                    "You do not have access to this tenant".to_string(),
                ))
            }
        }
    }
}

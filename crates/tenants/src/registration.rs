//! 租户自助注册
//!
//! 注册跨越三个写操作：身份账户、租户记录、所有者关联。它们之间没有共享事务，
//! 任一步失败时按相反顺序删除已经创建的记录。补偿只尝试一次，
//! 补偿失败会记录 error 日志并计入 `portfolify_compensation_failures_total`。

use portfolify_common::{
    AdminRole, AuthUser, IdentityError, IdentityProvider, NewTenant, Session, Tenant,
    TenantDirectory, TenantError,
    metrics::{COMPENSATION_FAILURES, REGISTRATIONS_TOTAL},
    tenant::{validate_logo_url, validate_slug},
    validation_message,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};
use validator::{Validate, ValidationError};

use crate::error::RegistrationError;

/// 注册请求（camelCase JSON）
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
    #[validate(custom(function = "validate_tenant_name"))]
    pub tenant_name: String,

    #[validate(custom(function = "validate_slug"))]
    pub tenant_id: String,

    #[validate(email(message = "must be a valid e-mail address"))]
    pub admin_email: String,

    #[validate(length(min = 8, message = "must be at least 8 characters"))]
    pub password: String,

    #[validate(custom(function = "validate_logo_url"))]
    #[serde(default)]
    pub logo: Option<String>,
}

fn validate_tenant_name(name: &str) -> Result<(), ValidationError> {
    let len = name.trim().chars().count();
    if (2..=100).contains(&len) {
        Ok(())
    } else {
        let mut err = ValidationError::new("length");
        err.message = Some("must be 2-100 characters".into());
        Err(err)
    }
}

/// 注册成功的结果；登录失败时 `session` 为 `None`
#[derive(Debug, Clone, Serialize)]
pub struct RegistrationOutcome {
    pub tenant: Tenant,
    pub user: AuthUser,
    pub session: Option<Session>,
}

pub struct RegistrationService {
    identity: Arc<dyn IdentityProvider>,
    tenants: Arc<dyn TenantDirectory>,
}

impl RegistrationService {
    pub fn new(identity: Arc<dyn IdentityProvider>, tenants: Arc<dyn TenantDirectory>) -> Self {
        Self { identity, tenants }
    }

    pub async fn register(
        &self,
        request: RegistrationRequest,
    ) -> Result<RegistrationOutcome, RegistrationError> {
        let result = self.run(request).await;
        let outcome = match &result {
            Ok(_) => "success",
            Err(e) => e.outcome(),
        };
        REGISTRATIONS_TOTAL.with_label_values(&[outcome]).inc();
        result
    }

    async fn run(
        &self,
        request: RegistrationRequest,
    ) -> Result<RegistrationOutcome, RegistrationError> {
        request
            .validate()
            .map_err(|e| RegistrationError::Validation(validation_message(&e)))?;

        let slug = request.tenant_id.clone();

        // 1. slug 可用性
        match self.tenants.slug_exists(&slug).await {
            Ok(false) => {}
            Ok(true) => return Err(RegistrationError::TenantIdTaken(slug)),
            Err(e) => return Err(RegistrationError::Lookup(e)),
        }

        // 2. 身份账户
        let user = match self
            .identity
            .create_user(&request.admin_email, &request.password)
            .await
        {
            Ok(user) => user,
            Err(IdentityError::EmailTaken) => return Err(RegistrationError::EmailTaken),
            Err(e) => return Err(RegistrationError::Identity(e)),
        };

        // 3. 租户记录
        let new_tenant = NewTenant::new(slug.clone(), request.tenant_name.trim())
            .with_logo(request.logo.clone());
        let tenant = match self.tenants.create_tenant(new_tenant).await {
            Ok(tenant) => tenant,
            Err(e) => {
                error!("Tenant creation failed for {}: {}", slug, e);
                self.compensate_identity(&user.id).await;
                return Err(match e {
                    TenantError::AlreadyExists(slug) => RegistrationError::TenantIdTaken(slug),
                    other => RegistrationError::TenantCreation(other),
                });
            }
        };

        // 4. 所有者关联
        if let Err(e) = self
            .tenants
            .link_admin(&user.id, &slug, AdminRole::Owner)
            .await
        {
            error!("Admin link failed for {}: {}", slug, e);
            self.compensate_tenant(&slug).await;
            self.compensate_identity(&user.id).await;
            return Err(RegistrationError::AdminLink(e));
        }

        // 5. 登录获取会话，失败不影响注册结果
        let session = match self
            .identity
            .sign_in(&request.admin_email, &request.password)
            .await
        {
            Ok((_, session)) => Some(session),
            Err(e) => {
                warn!("Registered {} but sign-in failed: {}", slug, e);
                None
            }
        };

        info!("Tenant {} registered by user {}", slug, user.id);
        Ok(RegistrationOutcome {
            tenant,
            user,
            session,
        })
    }

    async fn compensate_identity(&self, user_id: &str) {
        match self.identity.delete_user(user_id).await {
            Ok(true) => info!("Compensation: removed identity {}", user_id),
            Ok(false) => warn!("Compensation: identity {} was already absent", user_id),
            Err(e) => {
                error!("Compensation failed, orphaned identity {}: {}", user_id, e);
                COMPENSATION_FAILURES
                    .with_label_values(&["delete_identity"])
                    .inc();
            }
        }
    }

    async fn compensate_tenant(&self, slug: &str) {
        match self.tenants.delete_tenant(slug).await {
            Ok(true) => info!("Compensation: removed tenant {}", slug),
            Ok(false) => warn!("Compensation: tenant {} was already absent", slug),
            Err(e) => {
                error!("Compensation failed, orphaned tenant {}: {}", slug, e);
                COMPENSATION_FAILURES
                    .with_label_values(&["delete_tenant"])
                    .inc();
            }
        }
    }
}

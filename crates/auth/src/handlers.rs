//! 认证 HTTP Handler

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use portfolify_common::{
    ApiError, ApiJson, ApiResult, AuthUser, BearerToken, ClientIp, IdentityError,
    ServiceContext, Session, Tenant, metrics::AUTH_FAILURES, tenant::AdminRole,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info};
use validator::Validate;

pub fn create_router(ctx: ServiceContext) -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
        .with_state(ctx)
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "must be a valid e-mail address"))]
    pub email: String,
    #[validate(length(min = 1, message = "is required"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: AuthUser,
    pub session: Session,
}

#[derive(Debug, Serialize)]
pub struct TenantMembership {
    pub tenant: Tenant,
    pub role: AdminRole,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: AuthUser,
    pub tenants: Vec<TenantMembership>,
}

async fn login(
    State(ctx): State<ServiceContext>,
    client_ip: ClientIp,
    ApiJson(request): ApiJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    ctx.limiter
        .enforce("login", ctx.rate_limits.login, &client_ip)
        .await?;
    request.validate()?;

    match ctx.identity.sign_in(&request.email, &request.password).await {
        Ok((user, session)) => {
            info!("User {} signed in", user.id);
            Ok(Json(LoginResponse { user, session }))
        }
        Err(IdentityError::InvalidCredentials) => {
            debug!("Rejected sign-in from {}", client_ip);
            AUTH_FAILURES.with_label_values(&["bad_credentials"]).inc();
            Err(IdentityError::InvalidCredentials.into())
        }
        Err(e) => Err(e.into()),
    }
}

async fn logout(
    State(ctx): State<ServiceContext>,
    token: BearerToken,
) -> ApiResult<Json<Value>> {
    if !ctx.identity.sign_out(token.as_str()).await? {
        return Err(IdentityError::InvalidToken.into());
    }
    Ok(Json(json!({ "success": true })))
}

async fn me(State(ctx): State<ServiceContext>, token: BearerToken) -> ApiResult<Json<MeResponse>> {
    let user = ctx.guard.authenticate(&token).await?;
    let tenants = ctx
        .tenants
        .tenants_for_user(&user.id)
        .await
        .map_err(ApiError::from)?
        .into_iter()
        .map(|(tenant, role)| TenantMembership { tenant, role })
        .collect();

    Ok(Json(MeResponse { user, tenants }))
}

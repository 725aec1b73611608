//! 租户 HTTP Handler

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use portfolify_common::{
    ApiError, ApiJson, ApiResult, BearerToken, ClientIp, ServiceContext, Tenant, TenantUpdate,
    tenant::is_valid_slug,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::registration::{RegistrationOutcome, RegistrationRequest, RegistrationService};

/// 租户服务状态
#[derive(Clone)]
pub struct TenantsState {
    pub ctx: ServiceContext,
    pub registration: Arc<RegistrationService>,
}

impl TenantsState {
    pub fn new(ctx: ServiceContext) -> Self {
        let registration = Arc::new(RegistrationService::new(
            ctx.identity.clone(),
            ctx.tenants.clone(),
        ));
        Self { ctx, registration }
    }
}

pub fn create_router(state: TenantsState) -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/{slug}", get(get_tenant).put(update_tenant))
        .route("/{slug}/availability", get(check_availability))
        .with_state(state)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityResponse {
    pub tenant_id: String,
    pub available: bool,
}

async fn register(
    State(state): State<TenantsState>,
    client_ip: ClientIp,
    ApiJson(request): ApiJson<RegistrationRequest>,
) -> ApiResult<(StatusCode, Json<RegistrationOutcome>)> {
    let ctx = &state.ctx;
    ctx.limiter
        .enforce("register", ctx.rate_limits.register, &client_ip)
        .await?;

    let outcome = state.registration.register(request).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

async fn get_tenant(
    State(state): State<TenantsState>,
    Path(slug): Path<String>,
) -> ApiResult<Json<Tenant>> {
    match state.ctx.tenants.get_by_slug(&slug).await? {
        Some(tenant) if tenant.is_active => Ok(Json(tenant)),
        _ => Err(ApiError::NotFound("Tenant not found".to_string())),
    }
}

async fn check_availability(
    State(state): State<TenantsState>,
    Path(slug): Path<String>,
    client_ip: ClientIp,
) -> ApiResult<Json<AvailabilityResponse>> {
    let ctx = &state.ctx;
    ctx.limiter
        .enforce("availability", ctx.rate_limits.availability, &client_ip)
        .await?;

    if !is_valid_slug(&slug) {
        return Err(ApiError::BadRequest(
            "Tenant ID must be 3-50 characters of lowercase letters, digits or hyphens"
                .to_string(),
        ));
    }

    let available = !ctx.tenants.slug_exists(&slug).await?;
    Ok(Json(AvailabilityResponse {
        tenant_id: slug,
        available,
    }))
}

async fn update_tenant(
    State(state): State<TenantsState>,
    Path(slug): Path<String>,
    token: BearerToken,
    ApiJson(update): ApiJson<TenantUpdate>,
) -> ApiResult<Json<Tenant>> {
    let ctx = &state.ctx;
    let admin = ctx.guard.require_admin(&token, &slug).await?;

    let update = update.normalize()?;
    let tenant = ctx.tenants.update_tenant(&slug, update).await?;

    info!("Tenant {} updated by {}", slug, admin.user.id);
    Ok(Json(tenant))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{Body, to_bytes},
        http::{Request, header},
        response::Response,
    };
    use portfolify_common::{Database, PortfolifyConfig};
    use serde_json::{Value, json};
    use tempfile::TempDir;
    use tower::ServiceExt;

    async fn create_test_app(config: PortfolifyConfig) -> (Router, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::new(temp_dir.path()).await.unwrap();
        let ctx = ServiceContext::with_database(db, &config);
        (create_router(TenantsState::new(ctx)), temp_dir)
    }

    fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-forwarded-for", "198.51.100.20");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn registration(slug: &str, email: &str) -> Value {
        json!({
            "tenantName": "Jane Doe",
            "tenantId": slug,
            "adminEmail": email,
            "password": "long-enough-password",
            "logo": "https://cdn.example.com/logo.png"
        })
    }

    async fn register(app: &Router, slug: &str, email: &str) -> Value {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/register",
                None,
                registration(slug, email),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        body_json(response).await
    }

    #[tokio::test]
    async fn test_register_then_lookup() {
        let (app, _dir) = create_test_app(PortfolifyConfig::default()).await;

        let body = register(&app, "jane-doe", "jane@example.com").await;
        assert_eq!(body["tenant"]["tenant_id"], "jane-doe");
        assert_eq!(body["tenant"]["logo_url"], "https://cdn.example.com/logo.png");
        assert_eq!(body["user"]["email"], "jane@example.com");
        assert!(body["session"]["access_token"].is_string());

        let response = app.clone().oneshot(get("/jane-doe")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["name"], "Jane Doe");

        let response = app.oneshot(get("/nobody")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["code"], 404);
    }

    #[tokio::test]
    async fn test_duplicate_slug_conflict_and_availability() {
        let (app, _dir) = create_test_app(PortfolifyConfig::default()).await;

        let response = app.clone().oneshot(get("/jane-doe/availability")).await.unwrap();
        assert_eq!(
            body_json(response).await,
            json!({"tenantId": "jane-doe", "available": true})
        );

        register(&app, "jane-doe", "jane@example.com").await;

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/register",
                None,
                registration("jane-doe", "other@example.com"),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = app.clone().oneshot(get("/jane-doe/availability")).await.unwrap();
        assert_eq!(
            body_json(response).await,
            json!({"tenantId": "jane-doe", "available": false})
        );

        let response = app.oneshot(get("/Bad_Slug/availability")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_invalid_registration_body() {
        let (app, _dir) = create_test_app(PortfolifyConfig::default()).await;

        let mut body = registration("jane-doe", "jane@example.com");
        body["password"] = json!("short");
        let response = app
            .clone()
            .oneshot(json_request("POST", "/register", None, body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/register")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], 400);
    }

    #[tokio::test]
    async fn test_update_requires_admin() {
        let (app, _dir) = create_test_app(PortfolifyConfig::default()).await;
        let owner = register(&app, "jane-doe", "jane@example.com").await;
        let other = register(&app, "john-doe", "john@example.com").await;
        let owner_token = owner["session"]["access_token"].as_str().unwrap();
        let other_token = other["session"]["access_token"].as_str().unwrap();

        let update = json!({"name": "Jane D.", "theme_config": {"accent": "teal"}, "logo_url": null});

        let response = app
            .clone()
            .oneshot(json_request("PUT", "/jane-doe", None, update.clone()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app
            .clone()
            .oneshot(json_request("PUT", "/jane-doe", Some(other_token), update.clone()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = app
            .clone()
            .oneshot(json_request("PUT", "/jane-doe", Some(owner_token), update))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["name"], "Jane D.");
        assert_eq!(body["theme_config"], json!({"accent": "teal"}));
        assert!(body["logo_url"].is_null());

        let response = app
            .clone()
            .oneshot(json_request(
                "PUT",
                "/jane-doe",
                Some(owner_token),
                json!({"theme_config": "dark"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        // 停用后公开查询返回 404
        let response = app
            .clone()
            .oneshot(json_request(
                "PUT",
                "/jane-doe",
                Some(owner_token),
                json!({"is_active": false}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let response = app.oneshot(get("/jane-doe")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_register_is_rate_limited() {
        let mut config = PortfolifyConfig::default();
        config.rate_limit.register.limit = 1;
        let (app, _dir) = create_test_app(config).await;

        register(&app, "jane-doe", "jane@example.com").await;

        let response = app
            .oneshot(json_request(
                "POST",
                "/register",
                None,
                registration("john-doe", "john@example.com"),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "3600");
        assert_eq!(response.headers()["x-ratelimit-remaining"], "0");
    }
}

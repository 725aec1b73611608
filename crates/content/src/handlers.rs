//! 内容 HTTP Handler

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
};
use portfolify_common::{ApiJson, ApiResult, BearerToken, ServiceContext, Tenant};
use serde::Serialize;
use serde_json::Value;
use std::str::FromStr;
use tracing::info;

use crate::error::{ContentError, ContentResult};
use crate::model::{CollectionItem, ItemPayload, SingletonEntry, ensure_object};
use crate::section::Section;
use crate::store::ContentStore;

#[derive(Clone)]
pub struct ContentState {
    pub ctx: ServiceContext,
    pub store: ContentStore,
}

impl ContentState {
    pub fn new(ctx: ServiceContext) -> Self {
        let store = ContentStore::new(ctx.db.clone());
        Self { ctx, store }
    }

    async fn active_tenant(&self, slug: &str) -> ContentResult<Tenant> {
        match self.ctx.tenants.get_by_slug(slug).await? {
            Some(tenant) if tenant.is_active => Ok(tenant),
            _ => Err(ContentError::TenantNotFound(slug.to_string())),
        }
    }
}

pub fn create_router(state: ContentState) -> Router {
    Router::new()
        .route(
            "/{slug}/{section}",
            get(get_section).put(put_singleton).post(create_item),
        )
        .route("/{slug}/{section}/{id}", put(replace_item).delete(delete_item))
        .with_state(state)
}

/// 区块读取结果：单行区块为对象或 `null`，列表区块为数组
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum SectionContent {
    Single(Option<SingletonEntry>),
    Items(Vec<CollectionItem>),
}

fn parse_section(raw: &str) -> ContentResult<Section> {
    Section::from_str(raw).map_err(|_| ContentError::UnknownSection(raw.to_string()))
}

fn collection(raw: &str) -> ContentResult<Section> {
    let section = parse_section(raw)?;
    if section.is_singleton() {
        return Err(ContentError::NotACollection(section));
    }
    Ok(section)
}

async fn get_section(
    State(state): State<ContentState>,
    Path((slug, section)): Path<(String, String)>,
) -> ApiResult<Json<SectionContent>> {
    let section = parse_section(&section)?;
    let tenant = state.active_tenant(&slug).await?;

    let content = if section.is_singleton() {
        SectionContent::Single(state.store.get_singleton(section, &tenant.tenant_id).await?)
    } else {
        SectionContent::Items(state.store.list_items(section, &tenant.tenant_id).await?)
    };
    Ok(Json(content))
}

async fn put_singleton(
    State(state): State<ContentState>,
    Path((slug, section)): Path<(String, String)>,
    token: BearerToken,
    ApiJson(data): ApiJson<Value>,
) -> ApiResult<Json<SingletonEntry>> {
    let section = parse_section(&section)?;
    if !section.is_singleton() {
        return Err(ContentError::NotASingleton(section).into());
    }
    let admin = state.ctx.guard.require_admin(&token, &slug).await?;
    ensure_object(&data)?;

    let entry = state.store.upsert_singleton(section, &slug, &data).await?;
    info!("Section {} of tenant {} updated by {}", section, slug, admin.user.id);
    Ok(Json(entry))
}

async fn create_item(
    State(state): State<ContentState>,
    Path((slug, section)): Path<(String, String)>,
    token: BearerToken,
    ApiJson(payload): ApiJson<ItemPayload>,
) -> ApiResult<(StatusCode, Json<CollectionItem>)> {
    let section = collection(&section)?;
    state.ctx.guard.require_admin(&token, &slug).await?;
    ensure_object(&payload.data)?;

    let item = state
        .store
        .create_item(section, &slug, &payload.data, payload.sort_order)
        .await?;
    Ok((StatusCode::CREATED, Json(item)))
}

async fn replace_item(
    State(state): State<ContentState>,
    Path((slug, section, id)): Path<(String, String, String)>,
    token: BearerToken,
    ApiJson(payload): ApiJson<ItemPayload>,
) -> ApiResult<Json<CollectionItem>> {
    let section = collection(&section)?;
    state.ctx.guard.require_admin(&token, &slug).await?;
    ensure_object(&payload.data)?;

    state
        .store
        .replace_item(section, &slug, &id, &payload.data, payload.sort_order)
        .await?
        .map(Json)
        .ok_or_else(|| ContentError::ItemNotFound(id).into())
}

async fn delete_item(
    State(state): State<ContentState>,
    Path((slug, section, id)): Path<(String, String, String)>,
    token: BearerToken,
) -> ApiResult<StatusCode> {
    let section = collection(&section)?;
    state.ctx.guard.require_admin(&token, &slug).await?;

    if state.store.delete_item(section, &slug, &id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ContentError::ItemNotFound(id).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{Body, to_bytes},
        http::{Request, header},
        response::Response,
    };
    use portfolify_common::{AdminRole, Database, NewTenant, PortfolifyConfig};
    use serde_json::json;
    use tempfile::TempDir;
    use tower::ServiceExt;

    struct TestApp {
        app: Router,
        token: String,
        _dir: TempDir,
    }

    async fn create_test_app() -> TestApp {
        let dir = TempDir::new().unwrap();
        let db = Database::new(dir.path()).await.unwrap();
        let ctx = ServiceContext::with_database(db, &PortfolifyConfig::default());

        ctx.tenants
            .create_tenant(NewTenant::new("jane-doe", "Jane Doe"))
            .await
            .unwrap();
        let user = ctx
            .identity
            .create_user("jane@example.com", "long-enough-password")
            .await
            .unwrap();
        ctx.tenants
            .link_admin(&user.id, "jane-doe", AdminRole::Owner)
            .await
            .unwrap();
        let token = ctx
            .identity
            .sign_in("jane@example.com", "long-enough-password")
            .await
            .unwrap()
            .1
            .access_token;

        TestApp {
            app: create_router(ContentState::new(ctx)),
            token,
            _dir: dir,
        }
    }

    fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty);
        builder.body(body).unwrap()
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let response: Response = app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    #[tokio::test]
    async fn test_singleton_section() {
        let test = create_test_app().await;
        let token = Some(test.token.as_str());

        let (status, body) = send(&test.app, request("GET", "/jane-doe/hero", None, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.is_null());

        let hero = json!({"title": "Jane Doe", "subtitle": "Engineer"});
        let (status, _) = send(
            &test.app,
            request("PUT", "/jane-doe/hero", None, Some(hero.clone())),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = send(
            &test.app,
            request("PUT", "/jane-doe/hero", token, Some(hero.clone())),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], hero);

        let (_, body) = send(&test.app, request("GET", "/jane-doe/hero", None, None)).await;
        assert_eq!(body["data"]["subtitle"], "Engineer");

        let (status, _) = send(
            &test.app,
            request("PUT", "/jane-doe/hero", token, Some(json!(["not", "object"]))),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_collection_section() {
        let test = create_test_app().await;
        let token = Some(test.token.as_str());

        let (status, first) = send(
            &test.app,
            request(
                "POST",
                "/jane-doe/projects",
                token,
                Some(json!({"data": {"title": "Portfolify"}, "sort_order": 2})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (_, second) = send(
            &test.app,
            request(
                "POST",
                "/jane-doe/projects",
                token,
                Some(json!({"data": {"title": "Earlier"}, "sort_order": 1})),
            ),
        )
        .await;

        let (status, list) = send(&test.app, request("GET", "/jane-doe/projects", None, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list[0]["id"], second["id"]);
        assert_eq!(list[1]["id"], first["id"]);

        let uri = format!("/jane-doe/projects/{}", first["id"].as_str().unwrap());
        let (status, body) = send(
            &test.app,
            request("PUT", &uri, token, Some(json!({"data": {"title": "Renamed"}}))),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["title"], "Renamed");
        assert_eq!(body["sort_order"], 2);

        let (status, _) = send(&test.app, request("DELETE", &uri, token, None)).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&test.app, request("DELETE", &uri, token, None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_route_kind_and_unknown_section() {
        let test = create_test_app().await;
        let token = Some(test.token.as_str());

        let (status, _) = send(&test.app, request("GET", "/jane-doe/secrets", None, None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&test.app, request("GET", "/nobody/hero", None, None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(
            &test.app,
            request("PUT", "/jane-doe/skills", token, Some(json!({"name": "Rust"}))),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &test.app,
            request("POST", "/jane-doe/about", token, Some(json!({"data": {}}))),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &test.app,
            request("DELETE", "/jane-doe/hero/some-id", token, None),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &test.app,
            request("POST", "/jane-doe/skills", token, Some(json!({"data": "Rust"}))),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}

//! 联系表单 HTTP Handler

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
};
use portfolify_common::{
    ApiError, ApiJson, ApiResult, BearerToken, ClientIp, ServiceContext, validation_message,
};
use serde::Serialize;
use tracing::{info, warn};
use validator::Validate;

use crate::error::ContactError;
use crate::mailer::Notifier;
use crate::model::{ContactRequest, MarkRead, Message, MessageQuery};
use crate::store::MessageStore;

/// 联系表单服务状态
#[derive(Clone)]
pub struct ContactState {
    pub ctx: ServiceContext,
    pub store: MessageStore,
    pub notifier: Notifier,
}

impl ContactState {
    pub fn new(ctx: ServiceContext, notifier: Notifier) -> Self {
        let store = MessageStore::new(ctx.db.clone());
        Self {
            ctx,
            store,
            notifier,
        }
    }
}

pub fn create_router(state: ContactState) -> Router {
    Router::new()
        .route("/{slug}", post(submit_message))
        .route("/{slug}/messages", get(list_messages))
        .route(
            "/{slug}/messages/{id}",
            patch(mark_message).delete(delete_message),
        )
        .with_state(state)
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub success: bool,
    pub id: String,
}

async fn submit_message(
    State(state): State<ContactState>,
    Path(slug): Path<String>,
    client_ip: ClientIp,
    ApiJson(request): ApiJson<ContactRequest>,
) -> ApiResult<(StatusCode, Json<SubmitResponse>)> {
    let ctx = &state.ctx;
    ctx.limiter
        .enforce("contact", ctx.rate_limits.contact, &client_ip)
        .await?;

    let request = request.normalized();
    request
        .validate()
        .map_err(|e| ContactError::Validation(validation_message(&e)))?;

    let tenant = match ctx.tenants.get_by_slug(&slug).await? {
        Some(tenant) if tenant.is_active => tenant,
        _ => return Err(ContactError::TenantNotFound(slug).into()),
    };

    let message = state.store.create(&tenant.tenant_id, &request).await?;
    info!("Stored contact message {} for tenant {}", message.id, tenant.tenant_id);

    let id = message.id.clone();
    let tenants = ctx.tenants.clone();
    let notifier = state.notifier.clone();
    tokio::spawn(async move {
        let owners = match tenants.owner_emails(&tenant.tenant_id).await {
            Ok(owners) => owners,
            Err(e) => {
                warn!("Failed to load owners of tenant {}: {}", tenant.tenant_id, e);
                Vec::new()
            }
        };
        let recipients = notifier.recipients(owners);
        notifier.deliver(recipients, message, tenant.name).await;
    });

    Ok((StatusCode::CREATED, Json(SubmitResponse { success: true, id })))
}

async fn list_messages(
    State(state): State<ContactState>,
    Path(slug): Path<String>,
    token: BearerToken,
    Query(query): Query<MessageQuery>,
) -> ApiResult<Json<Vec<Message>>> {
    state.ctx.guard.require_admin(&token, &slug).await?;

    let messages = state
        .store
        .list(&slug, query.unread.unwrap_or(false))
        .await?;
    Ok(Json(messages))
}

async fn mark_message(
    State(state): State<ContactState>,
    Path((slug, id)): Path<(String, String)>,
    token: BearerToken,
    ApiJson(body): ApiJson<MarkRead>,
) -> ApiResult<Json<Message>> {
    state.ctx.guard.require_admin(&token, &slug).await?;

    match state.store.set_read(&slug, &id, body.is_read).await? {
        Some(message) => Ok(Json(message)),
        None => Err(ContactError::MessageNotFound(id).into()),
    }
}

async fn delete_message(
    State(state): State<ContactState>,
    Path((slug, id)): Path<(String, String)>,
    token: BearerToken,
) -> ApiResult<StatusCode> {
    let admin = state.ctx.guard.require_admin(&token, &slug).await?;

    if state.store.delete(&slug, &id).await? {
        info!("Message {} of tenant {} deleted by {}", id, slug, admin.user.id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::from(ContactError::MessageNotFound(id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ContactResult;
    use crate::mailer::Mailer;
    use async_trait::async_trait;
    use axum::{
        body::{Body, to_bytes},
        http::{Request, header},
        response::Response,
    };
    use portfolify_common::{AdminRole, Database, NewTenant, PortfolifyConfig};
    use serde_json::{Value, json};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tempfile::TempDir;
    use tower::ServiceExt;

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<(Vec<String>, String)>>,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, recipients: &[String], message: &Message, _: &str) -> ContactResult<()> {
            self.sent
                .lock()
                .unwrap()
                .push((recipients.to_vec(), message.id.clone()));
            Ok(())
        }
    }

    struct TestApp {
        app: Router,
        owner_token: String,
        outsider_token: String,
        mailer: Arc<RecordingMailer>,
        _dir: TempDir,
    }

    async fn create_test_app(config: PortfolifyConfig) -> TestApp {
        let dir = TempDir::new().unwrap();
        let db = Database::new(dir.path()).await.unwrap();
        let ctx = ServiceContext::with_database(db, &config);

        ctx.tenants
            .create_tenant(NewTenant::new("jane-doe", "Jane Doe"))
            .await
            .unwrap();
        let owner = ctx
            .identity
            .create_user("jane@example.com", "long-enough-password")
            .await
            .unwrap();
        ctx.tenants
            .link_admin(&owner.id, "jane-doe", AdminRole::Owner)
            .await
            .unwrap();
        ctx.identity
            .create_user("john@example.com", "long-enough-password")
            .await
            .unwrap();

        let owner_token = ctx
            .identity
            .sign_in("jane@example.com", "long-enough-password")
            .await
            .unwrap()
            .1
            .access_token;
        let outsider_token = ctx
            .identity
            .sign_in("john@example.com", "long-enough-password")
            .await
            .unwrap()
            .1
            .access_token;

        let mailer = Arc::new(RecordingMailer::default());
        let notifier = Notifier::new(Some(mailer.clone()), config.services.contact.receiver_email.clone());
        TestApp {
            app: create_router(ContactState::new(ctx, notifier)),
            owner_token,
            outsider_token,
            mailer,
            _dir: dir,
        }
    }

    fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-forwarded-for", "203.0.113.7");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty);
        builder.body(body).unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn contact_form() -> Value {
        json!({
            "name": "Visitor",
            "email": "visitor@example.com",
            "subject": "Hiring",
            "message": "Would love to chat."
        })
    }

    async fn submit(app: &Router) -> String {
        let response = app
            .clone()
            .oneshot(request("POST", "/jane-doe", None, Some(contact_form())))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        body["id"].as_str().unwrap().to_string()
    }

    async fn wait_for_mail(mailer: &RecordingMailer, count: usize) {
        for _ in 0..50 {
            if mailer.sent.lock().unwrap().len() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }

    #[tokio::test]
    async fn test_submit_notifies_owner() {
        let test = create_test_app(PortfolifyConfig::default()).await;
        let id = submit(&test.app).await;

        wait_for_mail(&test.mailer, 1).await;
        let sent = test.mailer.sent.lock().unwrap().clone();
        assert_eq!(sent, vec![(vec!["jane@example.com".to_string()], id)]);
    }

    #[tokio::test]
    async fn test_submit_uses_configured_receiver() {
        let mut config = PortfolifyConfig::default();
        config.services.contact.receiver_email = Some("inbox@example.com".to_string());
        let test = create_test_app(config).await;
        submit(&test.app).await;

        wait_for_mail(&test.mailer, 1).await;
        let sent = test.mailer.sent.lock().unwrap().clone();
        assert_eq!(sent[0].0, vec!["inbox@example.com".to_string()]);
    }

    #[tokio::test]
    async fn test_submit_rejections() {
        let test = create_test_app(PortfolifyConfig::default()).await;

        let response = test
            .app
            .clone()
            .oneshot(request("POST", "/nobody", None, Some(contact_form())))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let mut form = contact_form();
        form["email"] = json!("not-an-email");
        let response = test
            .app
            .clone()
            .oneshot(request("POST", "/jane-doe", None, Some(form)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("email"));
    }

    #[tokio::test]
    async fn test_submit_is_rate_limited() {
        let mut config = PortfolifyConfig::default();
        config.rate_limit.contact.limit = 2;
        let test = create_test_app(config).await;

        submit(&test.app).await;
        submit(&test.app).await;

        let response = test
            .app
            .oneshot(request("POST", "/jane-doe", None, Some(contact_form())))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn test_admin_message_management() {
        let test = create_test_app(PortfolifyConfig::default()).await;
        let first = submit(&test.app).await;
        let second = submit(&test.app).await;
        let owner = Some(test.owner_token.as_str());

        let response = test
            .app
            .clone()
            .oneshot(request("GET", "/jane-doe/messages", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = test
            .app
            .clone()
            .oneshot(request(
                "GET",
                "/jane-doe/messages",
                Some(&test.outsider_token),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = test
            .app
            .clone()
            .oneshot(request("GET", "/jane-doe/messages", owner, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body[0]["id"], second.as_str());
        assert_eq!(body[1]["id"], first.as_str());

        let response = test
            .app
            .clone()
            .oneshot(request(
                "PATCH",
                &format!("/jane-doe/messages/{second}"),
                owner,
                Some(json!({"is_read": true})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["is_read"], true);

        let response = test
            .app
            .clone()
            .oneshot(request("GET", "/jane-doe/messages?unread=true", owner, None))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["id"], first.as_str());

        let uri = format!("/jane-doe/messages/{first}");
        let response = test
            .app
            .clone()
            .oneshot(request("DELETE", &uri, owner, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = test
            .app
            .oneshot(request("DELETE", &uri, owner, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

//! 联系表单服务
//!
//! 挂载在 `/contact` 下。访客通过 `POST /{slug}` 给租户留言，
//! 留言保存后异步发送通知邮件；租户管理员可以查看、标记和删除留言。

pub mod error;
pub mod handlers;
pub mod mailer;
pub mod model;
pub mod store;

pub use error::ContactError;
pub use handlers::{ContactState, create_router};
pub use mailer::{LettreMailer, Mailer, Notifier};
pub use model::{ContactRequest, Message};
pub use store::MessageStore;

use axum::Router;
use portfolify_common::{PortfolifyConfig, ServiceContext};
use std::sync::Arc;
use tracing::{info, warn};

/// 创建联系表单路由器
///
/// SMTP 配置无效时仍然提供服务，只是不发送通知。
pub fn create_contact_router(ctx: &ServiceContext, config: &PortfolifyConfig) -> Router {
    info!("Creating contact router");
    let contact = &config.services.contact;

    let mailer: Option<Arc<dyn Mailer>> = match &contact.smtp {
        Some(smtp) => match LettreMailer::from_config(smtp) {
            Ok(mailer) => Some(Arc::new(mailer)),
            Err(e) => {
                warn!("Invalid SMTP configuration, notifications disabled: {}", e);
                None
            }
        },
        None => {
            info!("SMTP not configured, contact notifications disabled");
            None
        }
    };

    let notifier = Notifier::new(mailer, contact.receiver_email.clone());
    create_router(ContactState::new(ctx.clone(), notifier))
}

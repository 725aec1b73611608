//! 留言通知邮件
//!
//! 留言入库后在后台任务中发送，发送结果只记录日志和指标，不影响 HTTP 响应。

use async_trait::async_trait;
use lettre::message::{Mailbox, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use portfolify_common::config::SmtpConfig;
use portfolify_common::metrics::NOTIFICATIONS_TOTAL;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{ContactError, ContactResult};
use crate::model::Message;

/// 通知邮件发送器
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, recipients: &[String], message: &Message, tenant_name: &str)
    -> ContactResult<()>;
}

/// 基于 SMTP 的发送器
pub struct LettreMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl LettreMailer {
    pub fn from_config(config: &SmtpConfig) -> anyhow::Result<Self> {
        let builder = if config.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
        };

        let mut builder = builder.port(config.port);
        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        let from = config.from.parse::<Mailbox>()?;
        info!(
            "SMTP notifications enabled via {}:{} (starttls: {})",
            config.host, config.port, config.starttls
        );

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

fn render_body(message: &Message, tenant_name: &str) -> String {
    format!(
        "New message for {tenant_name}\n\nFrom: {} <{}>\nSubject: {}\n\n{}\n",
        message.name,
        message.email,
        message.subject.as_deref().unwrap_or("(none)"),
        message.message
    )
}

#[async_trait]
impl Mailer for LettreMailer {
    async fn send(
        &self,
        recipients: &[String],
        message: &Message,
        tenant_name: &str,
    ) -> ContactResult<()> {
        let mut builder = lettre::Message::builder()
            .from(self.from.clone())
            .subject(format!(
                "[{tenant_name}] {}",
                message.subject.as_deref().unwrap_or("New contact message")
            ))
            .header(ContentType::TEXT_PLAIN);

        for recipient in recipients {
            let mailbox = recipient
                .parse::<Mailbox>()
                .map_err(|e| ContactError::Mail(format!("bad recipient '{recipient}': {e}")))?;
            builder = builder.to(mailbox);
        }
        if let Ok(reply_to) = message.email.parse::<Mailbox>() {
            builder = builder.reply_to(reply_to);
        }

        let email = builder
            .body(render_body(message, tenant_name))
            .map_err(|e| ContactError::Mail(e.to_string()))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| ContactError::Mail(e.to_string()))?;
        Ok(())
    }
}

/// 通知分发：决定收件人并在后台发送
#[derive(Clone)]
pub struct Notifier {
    mailer: Option<Arc<dyn Mailer>>,
    receiver_email: Option<String>,
}

impl Notifier {
    pub fn new(mailer: Option<Arc<dyn Mailer>>, receiver_email: Option<String>) -> Self {
        Self {
            mailer,
            receiver_email,
        }
    }

    pub fn disabled() -> Self {
        Self::new(None, None)
    }

    pub fn is_enabled(&self) -> bool {
        self.mailer.is_some()
    }

    /// 配置的接收地址优先，否则使用租户所有者的邮箱
    pub fn recipients(&self, owner_emails: Vec<String>) -> Vec<String> {
        match &self.receiver_email {
            Some(email) if !email.trim().is_empty() => vec![email.trim().to_string()],
            _ => owner_emails,
        }
    }

    /// 发送通知并记录结果
    pub async fn deliver(&self, recipients: Vec<String>, message: Message, tenant_name: String) {
        let Some(mailer) = &self.mailer else {
            debug!("Notifications disabled, message {} stored only", message.id);
            NOTIFICATIONS_TOTAL.with_label_values(&["skipped"]).inc();
            return;
        };

        if recipients.is_empty() {
            warn!("No recipients for message {} of tenant {}", message.id, message.tenant_id);
            NOTIFICATIONS_TOTAL.with_label_values(&["skipped"]).inc();
            return;
        }

        match mailer.send(&recipients, &message, &tenant_name).await {
            Ok(()) => {
                info!("Notification for message {} sent to {} recipient(s)", message.id, recipients.len());
                NOTIFICATIONS_TOTAL.with_label_values(&["sent"]).inc();
            }
            Err(e) => {
                warn!("Failed to send notification for message {}: {}", message.id, e);
                NOTIFICATIONS_TOTAL.with_label_values(&["failed"]).inc();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<Vec<String>>>,
        fail: bool,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, recipients: &[String], _: &Message, _: &str) -> ContactResult<()> {
            self.sent.lock().unwrap().push(recipients.to_vec());
            if self.fail {
                Err(ContactError::Mail("connection refused".to_string()))
            } else {
                Ok(())
            }
        }
    }

    fn message() -> Message {
        Message {
            id: "m-1".to_string(),
            tenant_id: "jane-doe".to_string(),
            name: "Visitor".to_string(),
            email: "visitor@example.com".to_string(),
            subject: None,
            message: "Hello".to_string(),
            is_read: false,
            created_at: 0,
        }
    }

    #[test]
    fn test_recipient_fallback() {
        let owners = vec!["owner@example.com".to_string()];

        let notifier = Notifier::new(None, Some("inbox@example.com".to_string()));
        assert_eq!(notifier.recipients(owners.clone()), vec!["inbox@example.com"]);

        let notifier = Notifier::new(None, Some("  ".to_string()));
        assert_eq!(notifier.recipients(owners.clone()), owners);

        assert_eq!(Notifier::disabled().recipients(owners.clone()), owners);
    }

    #[tokio::test]
    async fn test_delivery_failure_is_swallowed() {
        let mailer = Arc::new(RecordingMailer {
            fail: true,
            ..Default::default()
        });
        let notifier = Notifier::new(Some(mailer.clone()), None);

        notifier
            .deliver(vec!["owner@example.com".to_string()], message(), "Jane".to_string())
            .await;
        notifier.deliver(Vec::new(), message(), "Jane".to_string()).await;

        assert_eq!(mailer.sent.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_body_mentions_sender() {
        let body = render_body(&message(), "Jane Doe");
        assert!(body.contains("Visitor <visitor@example.com>"));
        assert!(body.contains("Subject: (none)"));
    }
}

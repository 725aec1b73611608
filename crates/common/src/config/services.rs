//! 服务配置集合

use serde::{Deserialize, Serialize};

/// 所有路由服务的配置集合
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ServicesConfig {
    /// 认证服务配置
    #[serde(default)]
    pub auth: AuthConfig,

    /// 联系表单服务配置
    #[serde(default)]
    pub contact: ContactConfig,
}

/// 认证服务配置
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AuthConfig {
    /// 会话有效期（秒），默认 7 天
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
}

fn default_session_ttl_secs() -> u64 {
    7 * 24 * 3600
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_ttl_secs: default_session_ttl_secs(),
        }
    }
}

impl AuthConfig {
    pub fn validate(&self) -> Vec<String> {
        if self.session_ttl_secs == 0 {
            vec!["services.auth.session_ttl_secs must be greater than 0".to_string()]
        } else {
            Vec::new()
        }
    }
}

/// 联系表单服务配置
///
/// 未配置 `smtp` 时仅保存留言，不发送通知邮件。
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ContactConfig {
    /// 通知邮件接收地址；为空时发送给租户的所有者
    #[serde(default)]
    pub receiver_email: Option<String>,

    /// SMTP 发送配置
    #[serde(default)]
    pub smtp: Option<SmtpConfig>,
}

impl ContactConfig {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        match &self.smtp {
            Some(smtp) => {
                if smtp.host.trim().is_empty() {
                    errors.push("services.contact.smtp.host cannot be empty".to_string());
                }
                if smtp.port == 0 {
                    errors.push("services.contact.smtp.port must be greater than 0".to_string());
                }
                if !smtp.from.contains('@') {
                    errors.push(format!(
                        "services.contact.smtp.from '{}' is not a valid email address",
                        smtp.from
                    ));
                }
                if smtp.username.is_some() != smtp.password.is_some() {
                    errors.push(
                        "services.contact.smtp.username and password must be set together"
                            .to_string(),
                    );
                }
            }
            None => errors.push(
                "Warning: services.contact.smtp is not configured, contact notifications are disabled"
                    .to_string(),
            ),
        }

        if let Some(receiver) = &self.receiver_email {
            if !receiver.contains('@') {
                errors.push(format!(
                    "services.contact.receiver_email '{receiver}' is not a valid email address"
                ));
            }
        }

        errors
    }
}

/// SMTP 发送配置
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SmtpConfig {
    pub host: String,

    #[serde(default = "default_smtp_port")]
    pub port: u16,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    /// 发件人地址
    #[serde(default = "default_smtp_from")]
    pub from: String,

    /// 使用 STARTTLS 升级连接（默认 true）；关闭时使用明文连接，仅适合本地调试
    #[serde(default = "default_starttls")]
    pub starttls: bool,
}

fn default_smtp_port() -> u16 {
    587
}

fn default_smtp_from() -> String {
    "noreply@portfolify.local".to_string()
}

fn default_starttls() -> bool {
    true
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: default_smtp_port(),
            username: None,
            password: None,
            from: default_smtp_from(),
            starttls: default_starttls(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_smtp_is_only_a_warning() {
        let errors = ContactConfig::default().validate();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("Warning:"));
    }

    #[test]
    fn test_smtp_credentials_must_pair() {
        let config = ContactConfig {
            receiver_email: Some("owner@example.com".to_string()),
            smtp: Some(SmtpConfig {
                host: "smtp.example.com".to_string(),
                username: Some("mailer".to_string()),
                ..Default::default()
            }),
        };

        let errors = config.validate();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("set together"));
    }
}

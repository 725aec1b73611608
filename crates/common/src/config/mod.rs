//! 统一配置管理系统
//!
//! 本模块是 Portfolify 服务配置的"单一真理之源"。
//! 所有配置项的定义、文档、默认值都在这里统一管理。

pub mod bind;
pub mod ratelimit;
pub mod services;
pub mod tracing;

pub use crate::config::bind::BindConfig;
pub use crate::config::ratelimit::{IpShieldConfig, RateLimitConfig, RateLimitPolicy};
pub use crate::config::services::{AuthConfig, ContactConfig, ServicesConfig, SmtpConfig};
pub use crate::config::tracing::TracingConfig;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::path::{Path, PathBuf};

/// Portfolify 的主配置结构体
///
/// 配置文件使用 TOML 格式；部分字段支持环境变量覆盖，
/// 参见 [`PortfolifyConfig::apply_env_overrides`]。
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PortfolifyConfig {
    /// Service enable flags (bitmask)
    ///
    /// Bit positions:
    /// - Bit 0 (1): Auth service (`/auth`)
    /// - Bit 1 (2): Tenant service (`/tenants`)
    /// - Bit 2 (4): Contact service (`/contact`)
    /// - Bit 3 (8): Content service (`/content`)
    ///
    /// `enable = 15` enables everything.
    #[serde(default = "default_enable")]
    pub enable: u8,

    /// 服务器实例名称
    pub name: String,

    /// 运行环境标识
    ///
    /// - "dev": 开发环境，允许 HTTP
    /// - "prod": 生产环境，要求 HTTPS
    /// - "test": 测试环境
    pub env: String,

    /// 网络绑定配置
    #[serde(default)]
    pub bind: BindConfig,

    /// 服务配置集合
    #[serde(default)]
    pub services: ServicesConfig,

    /// 速率限制配置
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// SQLite 数据库文件存储目录路径
    ///
    /// 主数据库文件将存储为 `{sqlite_path}/portfolify.db`，
    /// 包括身份、会话、租户、内容、留言和限流记录。
    #[serde(
        serialize_with = "serialize_pathbuf",
        deserialize_with = "deserialize_pathbuf"
    )]
    pub sqlite_path: PathBuf,

    /// 可观测性配置（日志 + 追踪）
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// 可观测性配置
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ObservabilityConfig {
    /// 过滤级别（用于日志与追踪）
    ///
    /// 支持 EnvFilter 语法（如 "info,sqlx=warn"）。默认值 "info"。
    #[serde(default = "default_filter_level")]
    pub filter_level: String,

    #[serde(default)]
    pub log: LogConfig,

    /// OpenTelemetry 追踪配置（可选）
    ///
    /// 需要编译时启用 `opentelemetry` feature。
    #[serde(default)]
    pub tracing: TracingConfig,
}

/// 日志配置
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LogConfig {
    /// 日志输出目标："console"（默认）或 "file"
    #[serde(default = "default_log_output")]
    pub output: String,

    /// 当 output = "file" 时按天轮转
    #[serde(default)]
    pub rotate: bool,

    /// 日志文件目录
    #[serde(default = "default_log_path")]
    pub path: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log: LogConfig::default(),
            filter_level: default_filter_level(),
            tracing: TracingConfig::default(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            output: default_log_output(),
            rotate: false,
            path: default_log_path(),
        }
    }
}

fn default_enable() -> u8 {
    ENABLE_ALL
}

fn default_log_output() -> String {
    "console".to_string()
}

fn default_log_path() -> String {
    "logs/".to_string()
}

fn default_filter_level() -> String {
    "info".to_string()
}

fn serialize_pathbuf<S>(path: &Path, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    path.display().to_string().serialize(serializer)
}

fn deserialize_pathbuf<'de, D>(deserializer: D) -> Result<PathBuf, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    Ok(PathBuf::from(s))
}

impl Default for PortfolifyConfig {
    fn default() -> Self {
        Self {
            enable: default_enable(),
            name: "portfolify-default".to_string(),
            env: "dev".to_string(),
            bind: BindConfig::default(),
            services: ServicesConfig::default(),
            rate_limit: RateLimitConfig::default(),
            sqlite_path: PathBuf::from("database"),
            observability: ObservabilityConfig::default(),
        }
    }
}

// 服务启用标志位常量
pub const ENABLE_AUTH: u8 = 0b0001;
pub const ENABLE_TENANTS: u8 = 0b0010;
pub const ENABLE_CONTACT: u8 = 0b0100;
pub const ENABLE_CONTENT: u8 = 0b1000;
pub const ENABLE_ALL: u8 = ENABLE_AUTH | ENABLE_TENANTS | ENABLE_CONTACT | ENABLE_CONTENT;

impl PortfolifyConfig {
    /// 检查是否启用了认证服务
    pub fn is_auth_enabled(&self) -> bool {
        self.enable & ENABLE_AUTH != 0
    }

    /// 检查是否启用了租户服务（注册、查询、更新）
    pub fn is_tenants_enabled(&self) -> bool {
        self.enable & ENABLE_TENANTS != 0
    }

    /// 检查是否启用了联系表单服务
    pub fn is_contact_enabled(&self) -> bool {
        self.enable & ENABLE_CONTACT != 0
    }

    /// 检查是否启用了内容管理服务
    pub fn is_content_enabled(&self) -> bool {
        self.enable & ENABLE_CONTENT != 0
    }

    /// 返回可观测性配置引用
    pub fn observability_config(&self) -> &ObservabilityConfig {
        &self.observability
    }

    /// 获取追踪配置
    pub fn tracing_config(&self) -> &TracingConfig {
        &self.observability.tracing
    }

    /// 返回日志配置引用
    pub fn log_config(&self) -> &LogConfig {
        &self.observability.log
    }

    /// 从文件加载配置，并应用环境变量覆盖
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let path_ref = path.as_ref();

        if !path_ref.exists() {
            return Err(format!("Configuration file does not exist: {path_ref:?}").into());
        }

        if !path_ref.is_file() {
            return Err(format!("Path is not a valid file: {path_ref:?}").into());
        }

        let content = std::fs::read_to_string(path_ref)?;
        let mut config: PortfolifyConfig = toml::from_str(&content)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());

        Ok(config)
    }

    /// 从 TOML 字符串加载配置
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// 将配置序列化为 TOML 字符串
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string(self)
    }

    /// 应用环境变量覆盖
    ///
    /// 支持的变量：`PORTFOLIFY_PORT`（或 `PORT`）、`PORTFOLIFY_DATABASE_PATH`、
    /// `SMTP_HOST`、`SMTP_PORT`、`SMTP_USER`、`SMTP_PASS`、`SMTP_FROM`、`RECEIVER_EMAIL`。
    ///
    /// 变量读取通过 `lookup` 注入，便于测试。
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(port) = get("PORTFOLIFY_PORT")
            .or_else(|| get("PORT"))
            .and_then(|p| p.parse::<u16>().ok())
        {
            let http = self.bind.http.get_or_insert_with(Default::default);
            http.port = port;
        }

        if let Some(path) = get("PORTFOLIFY_DATABASE_PATH") {
            self.sqlite_path = PathBuf::from(path);
        }

        let contact = &mut self.services.contact;
        if let Some(receiver) = get("RECEIVER_EMAIL") {
            contact.receiver_email = Some(receiver);
        }

        if let Some(host) = get("SMTP_HOST") {
            let smtp = contact.smtp.get_or_insert_with(SmtpConfig::default);
            smtp.host = host;
        }
        if let Some(smtp) = contact.smtp.as_mut() {
            if let Some(port) = get("SMTP_PORT").and_then(|p| p.parse::<u16>().ok()) {
                smtp.port = port;
            }
            if let Some(user) = get("SMTP_USER") {
                smtp.username = Some(user);
            }
            if let Some(pass) = get("SMTP_PASS") {
                smtp.password = Some(pass);
            }
            if let Some(from) = get("SMTP_FROM") {
                smtp.from = from;
            }
        }
    }

    /// 验证配置有效性
    ///
    /// 返回所有发现的问题；以 "Warning:" 开头的条目不阻止启动。
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.enable > ENABLE_ALL {
            errors.push(format!(
                "Invalid enable bitmask value: {}. Must be between 0 and {ENABLE_ALL} (4 bits)",
                self.enable
            ));
        }

        if self.enable == 0 {
            errors.push("Warning: no service is enabled (enable = 0)".to_string());
        }

        if self.name.trim().is_empty() {
            errors.push("Instance name cannot be empty".to_string());
        }

        if !["dev", "prod", "test"].contains(&self.env.as_str()) {
            errors.push(format!(
                "Invalid environment '{}', must be one of: dev, prod, test",
                self.env
            ));
        }

        {
            let main_level = self
                .observability
                .filter_level
                .split(',')
                .next()
                .unwrap_or("")
                .trim();
            if !["trace", "debug", "info", "warn", "error"].contains(&main_level) {
                errors.push(format!(
                    "Invalid filter level '{}', must start with one of: trace, debug, info, warn, error",
                    self.observability.filter_level
                ));
            }
        }

        if !["console", "file"].contains(&self.observability.log.output.as_str()) {
            errors.push(format!(
                "Invalid log output '{}' (observability.log.output), must be 'console' or 'file'",
                self.observability.log.output
            ));
        }

        if self
            .sqlite_path
            .to_str()
            .map(|s| s.trim().is_empty())
            .unwrap_or(true)
        {
            errors.push("SQLite database path cannot be empty".to_string());
        }

        if self.bind.http.is_none() && self.bind.https.is_none() {
            errors.push("Either bind.http or bind.https must be configured".to_string());
        }

        if let Err(e) = self.observability.tracing.validate() {
            errors.push(format!("Tracing configuration error: {e}"));
        }

        errors.extend(self.rate_limit.validate());
        errors.extend(self.services.auth.validate());

        if self.is_contact_enabled() {
            errors.extend(self.services.contact.validate());
        }

        if self.env == "prod" {
            match self.bind.https {
                Some(ref https) if https.port != 0 => {}
                _ => errors.push("Production environment should enable HTTPS".to_string()),
            }

            if self.observability.log.output == "console" {
                errors.push("Warning: Production environment should use file logging (observability.log.output = \"file\")".to_string());
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

pub mod http;
pub mod https;

pub use crate::config::bind::http::HttpBindConfig;
pub use crate::config::bind::https::HttpsBindConfig;
use serde::{Deserialize, Serialize};

/// 网络绑定配置
///
/// `env = "dev"` 时使用 HTTP 监听，其余环境使用 HTTPS。
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BindConfig {
    /// HTTP 服务绑定配置（可选）
    #[serde(default)]
    pub http: Option<HttpBindConfig>,

    /// HTTPS 服务绑定配置（可选，生产环境必需）
    #[serde(default)]
    pub https: Option<HttpsBindConfig>,
}

impl Default for BindConfig {
    fn default() -> Self {
        Self {
            http: Some(HttpBindConfig::default()),
            https: None,
        }
    }
}

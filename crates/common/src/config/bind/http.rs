use serde::{Deserialize, Serialize};

/// HTTP 服务绑定配置
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HttpBindConfig {
    /// 对外公开的域名，用于日志中的访问地址
    #[serde(default = "default_domain_name")]
    pub domain_name: String,

    /// 对外宣告的 IP 地址
    #[serde(default = "default_advertised_ip")]
    pub advertised_ip: String,

    /// 实际绑定的网络接口地址，通常为 "0.0.0.0"
    #[serde(default = "default_ip")]
    pub ip: String,

    /// 监听端口，可被 `PORTFOLIFY_PORT` / `PORT` 覆盖
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_domain_name() -> String {
    "localhost".to_string()
}

fn default_advertised_ip() -> String {
    "127.0.0.1".to_string()
}

fn default_ip() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3001
}

impl Default for HttpBindConfig {
    fn default() -> Self {
        Self {
            domain_name: default_domain_name(),
            advertised_ip: default_advertised_ip(),
            ip: default_ip(),
            port: default_port(),
        }
    }
}

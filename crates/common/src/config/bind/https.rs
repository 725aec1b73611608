use serde::{Deserialize, Serialize};

/// HTTPS 服务绑定配置
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HttpsBindConfig {
    /// 域名，必须与证书中的域名匹配
    pub domain_name: String,

    /// 对外宣告的 IP 地址
    pub advertised_ip: String,

    /// 实际绑定的网络接口地址
    pub ip: String,

    /// HTTPS 监听端口
    pub port: u16,

    /// PEM 格式证书文件路径
    pub cert: String,

    /// PEM 格式私钥文件路径
    pub key: String,
}

impl Default for HttpsBindConfig {
    fn default() -> Self {
        Self {
            domain_name: "localhost".to_string(),
            advertised_ip: "127.0.0.1".to_string(),
            ip: "0.0.0.0".to_string(),
            port: 3443,
            cert: "certificates/server.crt".to_string(),
            key: "certificates/server.key".to_string(),
        }
    }
}

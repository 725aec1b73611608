//! TLS 配置实现

use anyhow::{Context, Result};
use rustls::ServerConfig;
use rustls_pki_types::{CertificateDer, PrivateKeyDer};
use std::fs;
use std::io::BufReader;

/// TLS configuration utilities
pub struct TlsConfigurer;

impl TlsConfigurer {
    /// 从 PEM 证书与私钥创建服务器 TLS 配置（ALPN: h2, http/1.1）
    pub fn create_tls_config(cert_path: &str, key_path: &str) -> Result<ServerConfig> {
        let cert_file = fs::File::open(cert_path)
            .with_context(|| format!("Failed to open certificate file: {cert_path}"))?;
        let key_file = fs::File::open(key_path)
            .with_context(|| format!("Failed to open private key file: {key_path}"))?;

        let mut cert_reader = BufReader::new(cert_file);
        let mut key_reader = BufReader::new(key_file);

        let cert_chain: Vec<CertificateDer> =
            rustls_pemfile::certs(&mut cert_reader).collect::<Result<Vec<_>, _>>()?;
        if cert_chain.is_empty() {
            anyhow::bail!("No certificate found in {cert_path}");
        }

        let private_key: PrivateKeyDer = rustls_pemfile::private_key(&mut key_reader)?
            .ok_or_else(|| anyhow::anyhow!("No private key found in {key_path}"))?;

        let mut config = ServerConfig::builder()
            .with_no_client_auth()
            .with_single_cert(cert_chain, private_key)?;
        config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];

        Ok(config)
    }

    /// 安装加密提供程序
    pub fn install_crypto_provider() {
        let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_files_are_reported() {
        let err = TlsConfigurer::create_tls_config("/nonexistent/cert.pem", "/nonexistent/key.pem")
            .unwrap_err();
        assert!(err.to_string().contains("certificate file"));
    }

    #[test]
    fn test_empty_certificate_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let cert = dir.path().join("cert.pem");
        let key = dir.path().join("key.pem");
        std::fs::File::create(&cert).unwrap();
        std::fs::File::create(&key)
            .unwrap()
            .write_all(b"")
            .unwrap();

        TlsConfigurer::install_crypto_provider();
        let err = TlsConfigurer::create_tls_config(
            cert.to_str().unwrap(),
            key.to_str().unwrap(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("No certificate"));
    }
}

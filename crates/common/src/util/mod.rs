//! 通用工具

pub mod tls;

pub use tls::TlsConfigurer;

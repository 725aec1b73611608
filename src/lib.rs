//! # portfolify
//!
//! 多租户作品集站点服务，包括认证、租户注册、联系表单和内容管理路由

pub mod service;

// Re-export commonly used types
pub use portfolify_common::config::PortfolifyConfig;
pub use service::{ServiceContainer, ServiceManager};

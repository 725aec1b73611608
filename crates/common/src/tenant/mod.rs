//! 租户管理模块
//!
//! 按照概念独立性原则组织，每个概念都有独立的文件：
//! - `model.rs` - 核心租户数据结构
//! - `admin.rs` - 租户管理员关联
//! - `directory.rs` - 租户目录抽象
//! - `repository.rs` - 基于 SQLite 的租户目录实现
//! - `validation.rs` - slug 与 logo 地址验证

pub mod admin;
pub mod directory;
pub mod error;
pub mod model;
pub mod repository;
pub mod validation;

pub use admin::{AdminRole, AdminUser};
pub use directory::TenantDirectory;
pub use error::TenantError;
pub use model::{NewTenant, Tenant, TenantUpdate};
pub use repository::TenantRepository;
pub use validation::{is_valid_logo_url, is_valid_slug, validate_logo_url, validate_slug};

//! 身份认证模块
//!
//! 邮箱 + 密码账户、argon2 口令哈希、不透明 bearer 会话令牌。
//! 注册流程只通过 [`IdentityProvider`] 访问本模块。

pub mod error;
pub mod model;
pub mod password;
pub mod provider;
pub mod store;

pub use error::IdentityError;
pub use model::{AuthUser, Session};
pub use provider::IdentityProvider;
pub use store::SqliteIdentityStore;

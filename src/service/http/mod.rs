//! HTTP 路由服务
//!
//! 每个业务 crate 对应一个路由服务，挂载在各自的前缀下

mod auth;
mod contact;
mod content;
mod tenants;

pub use self::auth::AuthHttpService;
pub use self::contact::ContactHttpService;
pub use self::content::ContentHttpService;
pub use self::tenants::TenantsHttpService;

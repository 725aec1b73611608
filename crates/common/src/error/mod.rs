//! 错误处理模块
//!
//! 各路由服务的领域错误最终都映射为 [`ApiError`]，
//! 由它统一生成 `{"error", "code"}` 格式的 HTTP 响应。

mod api_error;
mod extract;
mod validation;

pub use api_error::{ApiError, ApiResult};
pub use extract::ApiJson;
pub use validation::validation_message;

//! 内容数据结构

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

use crate::error::{ContentError, ContentResult};

/// 单行区块（hero、about、contact_info）
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SingletonEntry {
    pub id: String,
    pub tenant_id: String,
    #[sqlx(json)]
    pub data: Value,
    pub updated_at: i64,
}

/// 列表区块中的一项（skills、projects、experience）
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CollectionItem {
    pub id: String,
    pub tenant_id: String,
    #[sqlx(json)]
    pub data: Value,
    pub sort_order: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// 创建或替换列表项的请求体
#[derive(Debug, Clone, Deserialize)]
pub struct ItemPayload {
    pub data: Value,
    #[serde(default)]
    pub sort_order: Option<i64>,
}

/// 内容负载必须是 JSON 对象
pub fn ensure_object(data: &Value) -> ContentResult<()> {
    if data.is_object() {
        Ok(())
    } else {
        Err(ContentError::InvalidPayload)
    }
}

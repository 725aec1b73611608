//! 内容存储
//!
//! 表名只来自 [`Section`]，不会拼接外部输入。

use chrono::Utc;
use portfolify_common::Database;
use serde_json::Value;
use uuid::Uuid;

use crate::error::ContentResult;
use crate::model::{CollectionItem, SingletonEntry};
use crate::section::Section;

#[derive(Clone, Debug)]
pub struct ContentStore {
    db: Database,
}

impl ContentStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn get_singleton(
        &self,
        section: Section,
        tenant_id: &str,
    ) -> ContentResult<Option<SingletonEntry>> {
        let entry = sqlx::query_as::<_, SingletonEntry>(&format!(
            "SELECT * FROM {} WHERE tenant_id = ?",
            section.table()
        ))
        .bind(tenant_id)
        .fetch_optional(self.db.get_pool())
        .await?;
        Ok(entry)
    }

    /// 写入单行区块，已存在时整体替换 `data`
    pub async fn upsert_singleton(
        &self,
        section: Section,
        tenant_id: &str,
        data: &Value,
    ) -> ContentResult<SingletonEntry> {
        let entry = sqlx::query_as::<_, SingletonEntry>(&format!(
            "INSERT INTO {} (id, tenant_id, data, updated_at) VALUES (?, ?, ?, ?)
             ON CONFLICT(tenant_id) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at
             RETURNING *",
            section.table()
        ))
        .bind(Uuid::new_v4().to_string())
        .bind(tenant_id)
        .bind(data.to_string())
        .bind(Utc::now().timestamp())
        .fetch_one(self.db.get_pool())
        .await?;
        Ok(entry)
    }

    /// 按 `sort_order`、`created_at` 排序的列表项
    pub async fn list_items(
        &self,
        section: Section,
        tenant_id: &str,
    ) -> ContentResult<Vec<CollectionItem>> {
        let items = sqlx::query_as::<_, CollectionItem>(&format!(
            "SELECT * FROM {} WHERE tenant_id = ? ORDER BY sort_order ASC, created_at ASC, rowid ASC",
            section.table()
        ))
        .bind(tenant_id)
        .fetch_all(self.db.get_pool())
        .await?;
        Ok(items)
    }

    /// 新建列表项；未指定 `sort_order` 时排在末尾
    pub async fn create_item(
        &self,
        section: Section,
        tenant_id: &str,
        data: &Value,
        sort_order: Option<i64>,
    ) -> ContentResult<CollectionItem> {
        let table = section.table();
        let sort_order = match sort_order {
            Some(order) => order,
            None => {
                let (max,): (Option<i64>,) = sqlx::query_as(&format!(
                    "SELECT MAX(sort_order) FROM {table} WHERE tenant_id = ?"
                ))
                .bind(tenant_id)
                .fetch_one(self.db.get_pool())
                .await?;
                max.map_or(0, |m| m.saturating_add(1))
            }
        };

        let now = Utc::now().timestamp();
        let item = sqlx::query_as::<_, CollectionItem>(&format!(
            "INSERT INTO {table} (id, tenant_id, data, sort_order, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?) RETURNING *"
        ))
        .bind(Uuid::new_v4().to_string())
        .bind(tenant_id)
        .bind(data.to_string())
        .bind(sort_order)
        .bind(now)
        .bind(now)
        .fetch_one(self.db.get_pool())
        .await?;
        Ok(item)
    }

    /// 替换列表项内容；未指定 `sort_order` 时保留原顺序
    pub async fn replace_item(
        &self,
        section: Section,
        tenant_id: &str,
        id: &str,
        data: &Value,
        sort_order: Option<i64>,
    ) -> ContentResult<Option<CollectionItem>> {
        let item = sqlx::query_as::<_, CollectionItem>(&format!(
            "UPDATE {} SET data = ?, sort_order = COALESCE(?, sort_order), updated_at = ?
             WHERE id = ? AND tenant_id = ? RETURNING *",
            section.table()
        ))
        .bind(data.to_string())
        .bind(sort_order)
        .bind(Utc::now().timestamp())
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(self.db.get_pool())
        .await?;
        Ok(item)
    }

    pub async fn delete_item(&self, section: Section, tenant_id: &str, id: &str) -> ContentResult<bool> {
        let result = sqlx::query(&format!(
            "DELETE FROM {} WHERE id = ? AND tenant_id = ?",
            section.table()
        ))
        .bind(id)
        .bind(tenant_id)
        .execute(self.db.get_pool())
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

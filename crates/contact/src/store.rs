//! 留言存储

use chrono::Utc;
use portfolify_common::Database;
use uuid::Uuid;

use crate::error::ContactResult;
use crate::model::{ContactRequest, Message};

#[derive(Clone, Debug)]
pub struct MessageStore {
    db: Database,
}

impl MessageStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// 保存一条访客留言
    pub async fn create(&self, tenant_id: &str, request: &ContactRequest) -> ContactResult<Message> {
        let message = Message {
            id: Uuid::new_v4().to_string(),
            tenant_id: tenant_id.to_string(),
            name: request.name.clone(),
            email: request.email.clone(),
            subject: request.subject.clone(),
            message: request.message.clone(),
            is_read: false,
            created_at: Utc::now().timestamp(),
        };

        sqlx::query(
            r#"
            INSERT INTO messages (id, tenant_id, name, email, subject, message, is_read, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&message.id)
        .bind(&message.tenant_id)
        .bind(&message.name)
        .bind(&message.email)
        .bind(&message.subject)
        .bind(&message.message)
        .bind(message.is_read)
        .bind(message.created_at)
        .execute(self.db.get_pool())
        .await?;

        Ok(message)
    }

    /// 租户的留言，最新的在前
    pub async fn list(&self, tenant_id: &str, unread_only: bool) -> ContactResult<Vec<Message>> {
        let sql = if unread_only {
            "SELECT * FROM messages WHERE tenant_id = ? AND is_read = 0 \
             ORDER BY created_at DESC, rowid DESC"
        } else {
            "SELECT * FROM messages WHERE tenant_id = ? ORDER BY created_at DESC, rowid DESC"
        };

        let messages = sqlx::query_as::<_, Message>(sql)
            .bind(tenant_id)
            .fetch_all(self.db.get_pool())
            .await?;
        Ok(messages)
    }

    /// 修改已读状态；留言不属于该租户时返回 `None`
    pub async fn set_read(
        &self,
        tenant_id: &str,
        id: &str,
        is_read: bool,
    ) -> ContactResult<Option<Message>> {
        let message = sqlx::query_as::<_, Message>(
            "UPDATE messages SET is_read = ? WHERE id = ? AND tenant_id = ? RETURNING *",
        )
        .bind(is_read)
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(self.db.get_pool())
        .await?;
        Ok(message)
    }

    pub async fn delete(&self, tenant_id: &str, id: &str) -> ContactResult<bool> {
        let result = sqlx::query("DELETE FROM messages WHERE id = ? AND tenant_id = ?")
            .bind(id)
            .bind(tenant_id)
            .execute(self.db.get_pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

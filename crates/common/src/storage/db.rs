//! 数据库连接和操作管理
//!
//! 提供基于 sqlx 的数据库连接池和表结构初始化

use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// 单例内容区块的表（每个租户至多一行）
pub const SINGLETON_CONTENT_TABLES: [&str; 3] = ["hero", "about", "contact_info"];

/// 列表内容区块的表（每个租户多行，按 sort_order 排序）
pub const COLLECTION_CONTENT_TABLES: [&str; 3] = ["skills", "projects", "experience"];

/// 数据库管理器
#[derive(Clone, Debug)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// 创建新的数据库实例
    ///
    /// # Arguments
    /// * `path` - 数据库文件存储目录路径，不存在时会被创建。
    ///   主数据库文件将存储为 `{path}/portfolify.db`
    pub async fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        std::fs::create_dir_all(path.as_ref())?;
        let db_file = path.as_ref().join("portfolify.db");

        // 创建连接选项并启用 WAL 模式
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_file.display()))?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(10)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.initialize_schema().await?;

        Ok(db)
    }

    /// 初始化数据库表结构
    async fn initialize_schema(&self) -> Result<()> {
        // 身份：用户与会话
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS auth_users (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE COLLATE NOCASE,
                password_hash TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        // 只保存令牌的 SHA-256 摘要
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS auth_sessions (
                token_hash TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES auth_users(id) ON DELETE CASCADE,
                created_at INTEGER NOT NULL,
                expires_at INTEGER NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS tenants (
                id TEXT PRIMARY KEY,
                tenant_id TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                logo_url TEXT,
                theme_config TEXT NOT NULL DEFAULT '{}',
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS admin_users (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES auth_users(id) ON DELETE CASCADE,
                tenant_id TEXT NOT NULL REFERENCES tenants(tenant_id) ON DELETE CASCADE,
                role TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                UNIQUE(user_id, tenant_id)
            )",
        )
        .execute(&self.pool)
        .await?;

        for table in SINGLETON_CONTENT_TABLES {
            sqlx::query(&format!(
                "CREATE TABLE IF NOT EXISTS {table} (
                    id TEXT PRIMARY KEY,
                    tenant_id TEXT NOT NULL UNIQUE REFERENCES tenants(tenant_id) ON DELETE CASCADE,
                    data TEXT NOT NULL,
                    updated_at INTEGER NOT NULL
                )"
            ))
            .execute(&self.pool)
            .await?;
        }

        for table in COLLECTION_CONTENT_TABLES {
            sqlx::query(&format!(
                "CREATE TABLE IF NOT EXISTS {table} (
                    id TEXT PRIMARY KEY,
                    tenant_id TEXT NOT NULL REFERENCES tenants(tenant_id) ON DELETE CASCADE,
                    data TEXT NOT NULL,
                    sort_order INTEGER NOT NULL DEFAULT 0,
                    created_at INTEGER NOT NULL,
                    updated_at INTEGER NOT NULL
                )"
            ))
            .execute(&self.pool)
            .await?;

            sqlx::query(&format!(
                "CREATE INDEX IF NOT EXISTS idx_{table}_tenant_order
                 ON {table}(tenant_id, sort_order)"
            ))
            .execute(&self.pool)
            .await?;
        }

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS messages (
                id TEXT PRIMARY KEY,
                tenant_id TEXT NOT NULL REFERENCES tenants(tenant_id) ON DELETE CASCADE,
                name TEXT NOT NULL,
                email TEXT NOT NULL,
                subject TEXT,
                message TEXT NOT NULL,
                is_read INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        // 滑动窗口限流记录，hit_at 为毫秒时间戳
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS rate_limit_hits (
                rowid INTEGER PRIMARY KEY AUTOINCREMENT,
                key TEXT NOT NULL,
                hit_at INTEGER NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        // 创建索引
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_auth_sessions_user_id
             ON auth_sessions(user_id)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_admin_users_tenant_id
             ON admin_users(tenant_id)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_messages_tenant_created
             ON messages(tenant_id, created_at)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_rate_limit_hits_key_hit_at
             ON rate_limit_hits(key, hit_at)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_rate_limit_hits_hit_at
             ON rate_limit_hits(hit_at)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// 获取数据库连接池
    pub fn get_pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// 执行 SQL 语句并返回影响的行数
    pub async fn execute(&self, sql: &str) -> Result<u64> {
        let result = sqlx::query(sql).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    /// 关闭连接池，之后的所有查询都会失败
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// 判断 sqlx 错误是否为唯一约束冲突
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_schema_initialization_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();

        let db = Database::new(temp_dir.path()).await.unwrap();
        drop(db);
        let db = Database::new(temp_dir.path()).await.unwrap();

        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .fetch_all(db.get_pool())
        .await
        .unwrap();
        let names: Vec<&str> = tables.iter().map(|(n,)| n.as_str()).collect();

        for expected in [
            "about",
            "admin_users",
            "auth_sessions",
            "auth_users",
            "contact_info",
            "experience",
            "hero",
            "messages",
            "projects",
            "rate_limit_hits",
            "skills",
            "tenants",
        ] {
            assert!(names.contains(&expected), "missing table {expected}");
        }
        assert!(temp_dir.path().join("portfolify.db").exists());
    }

    #[tokio::test]
    async fn test_unique_violation_detection() {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::new(temp_dir.path()).await.unwrap();

        let insert = "INSERT INTO auth_users (id, email, password_hash, created_at, updated_at)
                      VALUES ('u1', 'a@example.com', 'x', 0, 0)";
        db.execute(insert).await.unwrap();

        let err = sqlx::query(
            "INSERT INTO auth_users (id, email, password_hash, created_at, updated_at)
             VALUES ('u2', 'A@example.com', 'x', 0, 0)",
        )
        .execute(db.get_pool())
        .await
        .unwrap_err();
        assert!(is_unique_violation(&err));
    }
}

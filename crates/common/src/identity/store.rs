//! 基于 SQLite 的身份存储

use async_trait::async_trait;
use chrono::Utc;
use std::time::Duration;

use super::error::IdentityError;
use super::model::{AuthUser, Session, UserRecord};
use super::password::{generate_token, hash_password, token_digest, verify_password};
use super::provider::IdentityProvider;
use crate::storage::{Database, is_unique_violation};

/// [`IdentityProvider`] 的 SQLite 实现
///
/// argon2 计算在阻塞线程池中执行，避免占用异步运行时。
#[derive(Clone, Debug)]
pub struct SqliteIdentityStore {
    db: Database,
    session_ttl: Duration,
}

impl SqliteIdentityStore {
    pub fn new(db: Database, session_ttl: Duration) -> Self {
        Self { db, session_ttl }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, IdentityError> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT id, email, password_hash, created_at, updated_at
             FROM auth_users WHERE email = ?",
        )
        .bind(normalize_email(email))
        .fetch_optional(self.db.get_pool())
        .await?;
        Ok(record)
    }

    async fn issue_session(&self, user_id: &str) -> Result<Session, IdentityError> {
        let token = generate_token();
        let now = Utc::now().timestamp();
        let ttl_secs = i64::try_from(self.session_ttl.as_secs()).unwrap_or(i64::MAX);
        let expires_at = now.saturating_add(ttl_secs);

        // 顺带清理该用户已过期的会话
        sqlx::query("DELETE FROM auth_sessions WHERE user_id = ? AND expires_at <= ?")
            .bind(user_id)
            .bind(now)
            .execute(self.db.get_pool())
            .await?;

        sqlx::query(
            "INSERT INTO auth_sessions (token_hash, user_id, created_at, expires_at)
             VALUES (?, ?, ?, ?)",
        )
        .bind(token_digest(&token))
        .bind(user_id)
        .bind(now)
        .bind(expires_at)
        .execute(self.db.get_pool())
        .await?;

        Ok(Session::bearer(token, user_id.to_string(), expires_at))
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

async fn blocking<T, F>(f: F) -> Result<T, IdentityError>
where
    F: FnOnce() -> Result<T, IdentityError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| IdentityError::Hashing(format!("hashing task failed: {e}")))?
}

#[async_trait]
impl IdentityProvider for SqliteIdentityStore {
    async fn create_user(&self, email: &str, password: &str) -> Result<AuthUser, IdentityError> {
        let password = password.to_string();
        let password_hash = blocking(move || hash_password(&password)).await?;

        let now = Utc::now().timestamp();
        let user = AuthUser {
            id: uuid::Uuid::new_v4().to_string(),
            email: normalize_email(email),
            created_at: now,
            updated_at: now,
        };

        let result = sqlx::query(
            "INSERT INTO auth_users (id, email, password_hash, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&password_hash)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(self.db.get_pool())
        .await;

        match result {
            Ok(_) => {
                tracing::debug!("Identity created: {}", user.id);
                Ok(user)
            }
            Err(e) if is_unique_violation(&e) => Err(IdentityError::EmailTaken),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_user(&self, user_id: &str) -> Result<bool, IdentityError> {
        let result = sqlx::query("DELETE FROM auth_users WHERE id = ?")
            .bind(user_id)
            .execute(self.db.get_pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(AuthUser, Session), IdentityError> {
        let record = self
            .find_by_email(email)
            .await?
            .ok_or(IdentityError::InvalidCredentials)?;

        let password = password.to_string();
        let hash = record.password_hash.clone();
        let matches = blocking(move || verify_password(&password, &hash)).await?;
        if !matches {
            return Err(IdentityError::InvalidCredentials);
        }

        let session = self.issue_session(&record.id).await?;
        Ok((record.into(), session))
    }

    async fn sign_out(&self, access_token: &str) -> Result<bool, IdentityError> {
        let result = sqlx::query("DELETE FROM auth_sessions WHERE token_hash = ?")
            .bind(token_digest(access_token))
            .execute(self.db.get_pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn authenticate(&self, access_token: &str) -> Result<AuthUser, IdentityError> {
        let row = sqlx::query_as::<_, (String, String, i64, i64, i64)>(
            "SELECT u.id, u.email, u.created_at, u.updated_at, s.expires_at
             FROM auth_sessions s JOIN auth_users u ON u.id = s.user_id
             WHERE s.token_hash = ?",
        )
        .bind(token_digest(access_token))
        .fetch_optional(self.db.get_pool())
        .await?;

        let (id, email, created_at, updated_at, expires_at) =
            row.ok_or(IdentityError::InvalidToken)?;

        if expires_at <= Utc::now().timestamp() {
            self.sign_out(access_token).await?;
            return Err(IdentityError::InvalidToken);
        }

        Ok(AuthUser {
            id,
            email,
            created_at,
            updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn setup(ttl: Duration) -> (TempDir, SqliteIdentityStore) {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::new(temp_dir.path()).await.unwrap();
        (temp_dir, SqliteIdentityStore::new(db, ttl))
    }

    #[tokio::test]
    async fn test_create_and_sign_in() {
        let (_dir, store) = setup(Duration::from_secs(3600)).await;

        let user = store
            .create_user(" Jane@Example.com ", "s3cret-pass")
            .await
            .unwrap();
        assert_eq!(user.email, "jane@example.com");

        let (signed_in, session) = store
            .sign_in("JANE@example.com", "s3cret-pass")
            .await
            .unwrap();
        assert_eq!(signed_in, user);
        assert_eq!(session.user_id, user.id);
        assert_eq!(session.token_type, "bearer");

        let current = store.authenticate(&session.access_token).await.unwrap();
        assert_eq!(current.id, user.id);
    }

    #[tokio::test]
    async fn test_huge_ttl_saturates_instead_of_expiring() {
        let (_dir, store) = setup(Duration::from_secs(u64::MAX)).await;
        store.create_user("jane@example.com", "s3cret-pass").await.unwrap();

        let (_, session) = store.sign_in("jane@example.com", "s3cret-pass").await.unwrap();
        assert_eq!(session.expires_at, i64::MAX);
        assert!(store.authenticate(&session.access_token).await.is_ok());
    }

    #[tokio::test]
    async fn test_duplicate_email() {
        let (_dir, store) = setup(Duration::from_secs(3600)).await;

        store
            .create_user("jane@example.com", "password-1")
            .await
            .unwrap();
        let result = store.create_user("JANE@example.com", "password-2").await;
        assert!(matches!(result, Err(IdentityError::EmailTaken)));
    }

    #[tokio::test]
    async fn test_bad_credentials() {
        let (_dir, store) = setup(Duration::from_secs(3600)).await;
        store
            .create_user("jane@example.com", "password-1")
            .await
            .unwrap();

        let wrong_password = store.sign_in("jane@example.com", "password-2").await;
        assert!(matches!(wrong_password, Err(IdentityError::InvalidCredentials)));

        let unknown = store.sign_in("nobody@example.com", "password-1").await;
        assert!(matches!(unknown, Err(IdentityError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_sign_out_invalidates_token() {
        let (_dir, store) = setup(Duration::from_secs(3600)).await;
        store
            .create_user("jane@example.com", "password-1")
            .await
            .unwrap();
        let (_, session) = store
            .sign_in("jane@example.com", "password-1")
            .await
            .unwrap();

        assert!(store.sign_out(&session.access_token).await.unwrap());
        assert!(!store.sign_out(&session.access_token).await.unwrap());
        assert!(matches!(
            store.authenticate(&session.access_token).await,
            Err(IdentityError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn test_expired_session_rejected() {
        let (_dir, store) = setup(Duration::ZERO).await;
        store
            .create_user("jane@example.com", "password-1")
            .await
            .unwrap();
        let (_, session) = store
            .sign_in("jane@example.com", "password-1")
            .await
            .unwrap();

        assert!(matches!(
            store.authenticate(&session.access_token).await,
            Err(IdentityError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn test_delete_user_removes_sessions() {
        let (_dir, store) = setup(Duration::from_secs(3600)).await;
        let user = store
            .create_user("jane@example.com", "password-1")
            .await
            .unwrap();
        let (_, session) = store
            .sign_in("jane@example.com", "password-1")
            .await
            .unwrap();

        assert!(store.delete_user(&user.id).await.unwrap());
        assert!(!store.delete_user(&user.id).await.unwrap());
        assert!(store.authenticate(&session.access_token).await.is_err());
        assert!(store.create_user("jane@example.com", "again-123").await.is_ok());
    }
}

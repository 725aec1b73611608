//! 滑动窗口限流
//!
//! 每次请求在 `rate_limit_hits` 中记录一条命中。在同一个事务内先清理窗口外的记录，
//! 再统计窗口内的命中数：达到上限则拒绝（不记录本次命中），否则记录并放行。
//!
//! 清理时同时删除所有 key 中早于保留期（最长策略窗口）的记录，不再出现的 key 不会一直留在表里。
//!
//! 存储出现任何故障时放行请求，只记录日志和指标。

use chrono::Utc;
use serde::Serialize;
use std::time::Duration;

use crate::config::RateLimitPolicy;
use crate::error::ApiError;
use crate::metrics::{RATE_LIMIT_ERRORS, RATE_LIMIT_EXCEEDED};
use crate::security::ClientIp;
use crate::storage::Database;

/// 限流判定结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub remaining: u32,
}

#[derive(Clone, Debug)]
pub struct RateLimiter {
    db: Database,
    enabled: bool,
    retention_ms: i64,
}

impl RateLimiter {
    pub fn new(db: Database, enabled: bool) -> Self {
        Self {
            db,
            enabled,
            retention_ms: 0,
        }
    }

    /// 设置命中记录的保留期，应不小于最长的策略窗口
    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention_ms = i64::try_from(retention.as_millis()).unwrap_or(i64::MAX);
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// 检查 `key` 在 `window` 内是否还有配额
    pub async fn check_rate_limit(
        &self,
        key: &str,
        limit: u32,
        window: Duration,
    ) -> RateLimitDecision {
        self.check_at(key, limit, window, Utc::now().timestamp_millis())
            .await
    }

    /// 以给定的当前时间（毫秒）执行检查
    pub async fn check_at(
        &self,
        key: &str,
        limit: u32,
        window: Duration,
        now_ms: i64,
    ) -> RateLimitDecision {
        if !self.enabled {
            return RateLimitDecision {
                allowed: true,
                remaining: limit,
            };
        }

        let window_ms = i64::try_from(window.as_millis()).unwrap_or(i64::MAX);
        match self.record_hit(key, limit, window_ms, now_ms).await {
            Ok(decision) => decision,
            Err(e) => {
                let route = key.split(':').next().unwrap_or(key);
                tracing::warn!("Rate limiter store failed for '{}', allowing request: {}", key, e);
                RATE_LIMIT_ERRORS.with_label_values(&[route]).inc();
                RateLimitDecision {
                    allowed: true,
                    remaining: limit,
                }
            }
        }
    }

    async fn record_hit(
        &self,
        key: &str,
        limit: u32,
        window_ms: i64,
        now_ms: i64,
    ) -> Result<RateLimitDecision, sqlx::Error> {
        let mut tx = self.db.get_pool().begin().await?;

        // 先执行写操作，让事务立即持有写锁
        sqlx::query("DELETE FROM rate_limit_hits WHERE key = ? AND hit_at <= ?")
            .bind(key)
            .bind(now_ms.saturating_sub(window_ms))
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM rate_limit_hits WHERE hit_at <= ?")
            .bind(now_ms.saturating_sub(window_ms.max(self.retention_ms)))
            .execute(&mut *tx)
            .await?;

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM rate_limit_hits WHERE key = ?")
            .bind(key)
            .fetch_one(&mut *tx)
            .await?;
        let count = u32::try_from(count).unwrap_or(u32::MAX);

        if count >= limit {
            tx.commit().await?;
            return Ok(RateLimitDecision {
                allowed: false,
                remaining: 0,
            });
        }

        sqlx::query("INSERT INTO rate_limit_hits (key, hit_at) VALUES (?, ?)")
            .bind(key)
            .bind(now_ms)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(RateLimitDecision {
            allowed: true,
            remaining: limit - count - 1,
        })
    }

    /// 按命名策略对客户端限流，超限时返回 429
    pub async fn enforce(
        &self,
        route: &str,
        policy: RateLimitPolicy,
        client_ip: &ClientIp,
    ) -> Result<RateLimitDecision, ApiError> {
        let key = format!("{route}:{client_ip}");
        let decision = self
            .check_rate_limit(&key, policy.limit, Duration::from_secs(policy.window_secs))
            .await;

        if decision.allowed {
            Ok(decision)
        } else {
            tracing::info!("Rate limit exceeded: {}", key);
            RATE_LIMIT_EXCEEDED.with_label_values(&[route]).inc();
            Err(ApiError::TooManyRequests {
                retry_after_secs: policy.window_secs,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn setup(enabled: bool) -> (TempDir, RateLimiter) {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::new(temp_dir.path()).await.unwrap();
        (temp_dir, RateLimiter::new(db, enabled))
    }

    const WINDOW: Duration = Duration::from_secs(60);

    #[tokio::test]
    async fn test_rejects_request_over_limit() {
        let (_dir, limiter) = setup(true).await;
        let now = 1_000_000;

        for expected_remaining in [2, 1, 0] {
            let decision = limiter.check_at("login:1.2.3.4", 3, WINDOW, now).await;
            assert!(decision.allowed);
            assert_eq!(decision.remaining, expected_remaining);
        }

        let decision = limiter.check_at("login:1.2.3.4", 3, WINDOW, now).await;
        assert_eq!(
            decision,
            RateLimitDecision {
                allowed: false,
                remaining: 0
            }
        );

        // 其他 key 不受影响
        let other = limiter.check_at("login:5.6.7.8", 3, WINDOW, now).await;
        assert!(other.allowed);
    }

    #[tokio::test]
    async fn test_rejected_hits_are_not_recorded() {
        let (_dir, limiter) = setup(true).await;

        assert!(limiter.check_at("k", 1, WINDOW, 0).await.allowed);
        for t in [1_000, 2_000, 3_000] {
            assert!(!limiter.check_at("k", 1, WINDOW, t).await.allowed);
        }
        // 只有第一次命中被记录，窗口从它开始计算
        assert!(limiter.check_at("k", 1, WINDOW, 60_000).await.allowed);
    }

    #[tokio::test]
    async fn test_window_slides() {
        let (_dir, limiter) = setup(true).await;

        assert!(limiter.check_at("k", 2, WINDOW, 0).await.allowed);
        assert!(limiter.check_at("k", 2, WINDOW, 30_000).await.allowed);
        assert!(!limiter.check_at("k", 2, WINDOW, 59_999).await.allowed);

        let decision = limiter.check_at("k", 2, WINDOW, 60_000).await;
        assert!(decision.allowed);
        assert_eq!(decision.remaining, 0);
    }

    #[tokio::test]
    async fn test_disabled_limiter_always_allows() {
        let (_dir, limiter) = setup(false).await;

        for _ in 0..5 {
            let decision = limiter.check_at("k", 1, WINDOW, 0).await;
            assert_eq!(
                decision,
                RateLimitDecision {
                    allowed: true,
                    remaining: 1
                }
            );
        }
    }

    #[tokio::test]
    async fn test_fails_open_when_store_is_unavailable() {
        let (_dir, limiter) = setup(true).await;
        let _ = crate::metrics::register_metrics();
        let before = RATE_LIMIT_ERRORS.with_label_values(&["contact"]).get();

        limiter.db.close().await;

        for _ in 0..3 {
            let decision = limiter.check_rate_limit("contact:1.2.3.4", 1, WINDOW).await;
            assert_eq!(
                decision,
                RateLimitDecision {
                    allowed: true,
                    remaining: 1
                }
            );
        }

        let after = RATE_LIMIT_ERRORS.with_label_values(&["contact"]).get();
        assert!(after >= before + 3);
    }

    async fn stored_hits(limiter: &RateLimiter) -> i64 {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM rate_limit_hits")
            .fetch_one(limiter.db.get_pool())
            .await
            .unwrap();
        count
    }

    #[tokio::test]
    async fn test_expired_hits_of_other_keys_are_pruned() {
        let (_dir, limiter) = setup(true).await;
        let limiter = limiter.with_retention(Duration::from_secs(3600));

        for i in 0..50 {
            let key = format!("contact:198.51.100.{i}");
            assert!(limiter.check_at(&key, 5, WINDOW, 0).await.allowed);
        }
        assert_eq!(stored_hits(&limiter).await, 50);

        // 仍在保留期内的其他 key 不会被清理
        assert!(limiter.check_at("login:1.2.3.4", 5, WINDOW, 1_800_000).await.allowed);
        assert_eq!(stored_hits(&limiter).await, 51);

        let next_day = 24 * 3600 * 1000;
        assert!(limiter.check_at("login:5.6.7.8", 5, WINDOW, next_day).await.allowed);
        assert_eq!(stored_hits(&limiter).await, 1);
    }

    #[tokio::test]
    async fn test_enforce_returns_too_many_requests() {
        let (_dir, limiter) = setup(true).await;
        let ip = ClientIp("203.0.113.7".to_string());
        let policy = RateLimitPolicy::new(1, 3600);

        assert!(limiter.enforce("register", policy, &ip).await.is_ok());
        match limiter.enforce("register", policy, &ip).await {
            Err(ApiError::TooManyRequests { retry_after_secs }) => {
                assert_eq!(retry_after_secs, 3600)
            }
            other => panic!("expected 429, got {other:?}"),
        }
    }
}

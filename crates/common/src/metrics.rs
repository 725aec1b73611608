//! Prometheus 监控指标模块
//!
//! 提供全局指标收集和导出功能，由服务管理器挂载在 `/metrics`

use lazy_static::lazy_static;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry};
use std::sync::Once;
use std::time::Instant;

static METRICS_INIT: Once = Once::new();

lazy_static! {
    /// 全局 Prometheus Registry
    pub static ref REGISTRY: Registry = Registry::new();

    // ========== 业务指标 ==========

    /// 租户注册结果
    pub static ref REGISTRATIONS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("registrations_total", "Tenant registrations by outcome")
            .namespace("portfolify"),
        &["outcome"]
    ).unwrap();

    /// 注册补偿步骤失败次数（会留下孤立数据）
    pub static ref COMPENSATION_FAILURES: IntCounterVec = IntCounterVec::new(
        Opts::new("compensation_failures_total", "Failed compensating actions during registration")
            .namespace("portfolify"),
        &["step"]
    ).unwrap();

    /// 联系表单通知邮件
    pub static ref NOTIFICATIONS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("contact_notifications_total", "Contact notification e-mails by status")
            .namespace("portfolify"),
        &["status"]
    ).unwrap();

    // ========== 性能指标 ==========

    /// HTTP 请求延迟（秒）
    pub static ref REQUEST_DURATION: HistogramVec = HistogramVec::new(
        HistogramOpts::new("request_duration_seconds", "HTTP request duration in seconds")
            .namespace("portfolify")
            .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
        &["method", "status"]
    ).unwrap();

    /// HTTP 请求总数
    pub static ref REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("requests_total", "Total number of HTTP requests")
            .namespace("portfolify"),
        &["method", "status"]
    ).unwrap();

    // ========== 安全指标 ==========

    /// 速率限制拒绝次数
    pub static ref RATE_LIMIT_EXCEEDED: IntCounterVec = IntCounterVec::new(
        Opts::new("rate_limit_exceeded_total", "Requests rejected by the rate limiter")
            .namespace("portfolify"),
        &["policy"]
    ).unwrap();

    /// 速率限制存储故障次数（故障时放行）
    pub static ref RATE_LIMIT_ERRORS: IntCounterVec = IntCounterVec::new(
        Opts::new("rate_limit_errors_total", "Rate limiter store failures (request allowed)")
            .namespace("portfolify"),
        &["policy"]
    ).unwrap();

    /// 认证与授权失败次数
    pub static ref AUTH_FAILURES: IntCounterVec = IntCounterVec::new(
        Opts::new("auth_failures_total", "Authentication and authorization failures")
            .namespace("portfolify"),
        &["reason"]
    ).unwrap();
}

/// 注册所有指标到全局 Registry
///
/// 可重复调用，只有第一次调用会真正注册。
pub fn register_metrics() -> Result<(), prometheus::Error> {
    let mut result = Ok(());

    METRICS_INIT.call_once(|| {
        let register_result = (|| {
            // 业务指标
            REGISTRY.register(Box::new(REGISTRATIONS_TOTAL.clone()))?;
            REGISTRY.register(Box::new(COMPENSATION_FAILURES.clone()))?;
            REGISTRY.register(Box::new(NOTIFICATIONS_TOTAL.clone()))?;

            // 性能指标
            REGISTRY.register(Box::new(REQUEST_DURATION.clone()))?;
            REGISTRY.register(Box::new(REQUESTS_TOTAL.clone()))?;

            // 安全指标
            REGISTRY.register(Box::new(RATE_LIMIT_EXCEEDED.clone()))?;
            REGISTRY.register(Box::new(RATE_LIMIT_ERRORS.clone()))?;
            REGISTRY.register(Box::new(AUTH_FAILURES.clone()))?;

            Ok::<(), prometheus::Error>(())
        })();

        if let Err(e) = register_result {
            result = Err(e);
        }
    });

    result
}

/// HTTP 请求计时器
pub struct RequestTimer {
    start: Instant,
    method: String,
}

impl RequestTimer {
    pub fn new(method: &str) -> Self {
        Self {
            start: Instant::now(),
            method: method.to_string(),
        }
    }

    /// 完成计时并记录指标
    pub fn observe(self, status: u16) {
        let duration = self.start.elapsed().as_secs_f64();
        let status_str = status.to_string();

        REQUEST_DURATION
            .with_label_values(&[self.method.as_str(), status_str.as_str()])
            .observe(duration);

        REQUESTS_TOTAL
            .with_label_values(&[self.method.as_str(), status_str.as_str()])
            .inc();
    }
}

/// 导出 Prometheus 文本格式的指标
pub fn export_metrics() -> String {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::new();
    }

    String::from_utf8_lossy(&buffer).into_owned()
}

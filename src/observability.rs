//! 日志与追踪初始化
//!
//! `RUST_LOG` 优先于 `observability.filter_level`；日志输出到控制台或文件，
//! 启用 `opentelemetry` feature 后额外通过 OTLP 导出 span。

use portfolify_common::config::{LogConfig, ObservabilityConfig, PortfolifyConfig};
use std::fs;
use std::path::Path;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

#[cfg(feature = "opentelemetry")]
use crate::error::Error;
use crate::error::Result;
#[cfg(feature = "opentelemetry")]
use opentelemetry::KeyValue;
#[cfg(feature = "opentelemetry")]
use opentelemetry_otlp::WithExportConfig;
#[cfg(feature = "opentelemetry")]
use opentelemetry_sdk::propagation::TraceContextPropagator;
#[cfg(feature = "opentelemetry")]
use opentelemetry_sdk::{Resource, trace::SdkTracerProvider};

const LOG_FILE_NAME: &str = "portfolify.log";

/// 持有日志写入线程和 tracer provider，drop 时刷新并关闭
#[derive(Default)]
pub struct ObservabilityGuard {
    #[cfg(feature = "opentelemetry")]
    tracer_provider: Option<SdkTracerProvider>,
    _log_guard: Option<WorkerGuard>,
}

impl Drop for ObservabilityGuard {
    fn drop(&mut self) {
        #[cfg(feature = "opentelemetry")]
        if let Some(provider) = self.tracer_provider.take()
            && let Err(e) = provider.shutdown()
        {
            eprintln!("Failed to shutdown tracer provider: {e:?}");
        }
    }
}

pub fn init_observability(config: &PortfolifyConfig) -> Result<ObservabilityGuard> {
    let mut guard = ObservabilityGuard::default();
    let log = config.log_config();

    if log.output == "file" {
        fs::create_dir_all(&log.path)?;
        let (writer, worker_guard) = build_file_writer(log)?;
        guard._log_guard = Some(worker_guard);
        init_subscriber(writer, false, &mut guard, config)?;
    } else {
        init_subscriber(std::io::stdout, true, &mut guard, config)?;
    }

    Ok(guard)
}

fn filter_directive(config: &ObservabilityConfig, rust_log: Option<String>) -> String {
    rust_log
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| config.filter_level.clone())
}

fn create_env_filter(config: &ObservabilityConfig) -> EnvFilter {
    let directive = filter_directive(config, std::env::var("RUST_LOG").ok());
    EnvFilter::try_new(&directive).unwrap_or_else(|_| {
        println!("Invalid filter directive '{directive}', falling back to info");
        EnvFilter::new("info")
    })
}

fn init_subscriber<W>(
    writer: W,
    use_ansi: bool,
    #[cfg_attr(not(feature = "opentelemetry"), allow(unused_variables))]
    guard: &mut ObservabilityGuard,
    config: &PortfolifyConfig,
) -> Result<()>
where
    W: for<'a> fmt::MakeWriter<'a> + Send + Sync + 'static,
{
    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_line_number(true)
        .with_ansi(use_ansi)
        .with_writer(writer);
    let filter = create_env_filter(config.observability_config());

    #[cfg(feature = "opentelemetry")]
    if let Some(provider) = build_tracing_provider(config)? {
        use opentelemetry::trace::TracerProvider as _;
        let tracer = provider.tracer(config.tracing_config().service_name().to_string());
        guard.tracer_provider = Some(provider);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .with(tracing_opentelemetry::layer().with_tracer(tracer))
            .try_init()
            .ok();
        return Ok(());
    }

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .ok();
    Ok(())
}

fn build_file_writer(log: &LogConfig) -> Result<(NonBlocking, WorkerGuard)> {
    println!(
        "Logging to {} (daily rotation: {})",
        Path::new(&log.path).join(LOG_FILE_NAME).display(),
        log.rotate
    );

    if log.rotate {
        let appender = tracing_appender::rolling::daily(&log.path, LOG_FILE_NAME);
        Ok(tracing_appender::non_blocking(appender))
    } else {
        let file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(Path::new(&log.path).join(LOG_FILE_NAME))?;
        Ok(tracing_appender::non_blocking(file))
    }
}

#[cfg(feature = "opentelemetry")]
fn build_tracing_provider(config: &PortfolifyConfig) -> Result<Option<SdkTracerProvider>> {
    let tracing_cfg = config.tracing_config();
    if !tracing_cfg.is_enabled() {
        return Ok(None);
    }
    tracing_cfg.validate().map_err(Error::custom)?;

    println!(
        "Initializing OpenTelemetry tracing: service_name={}, endpoint={}",
        tracing_cfg.service_name(),
        tracing_cfg.endpoint()
    );

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(tracing_cfg.endpoint())
        .build()
        .map_err(|e| Error::custom(format!("Failed to build OTLP exporter: {e}")))?;

    let resource = Resource::builder()
        .with_service_name(tracing_cfg.service_name().to_string())
        .with_attributes([
            KeyValue::new("service.instance.id", config.name.clone()),
            KeyValue::new("service.environment", config.env.clone()),
        ])
        .build();

    let tracer_provider = SdkTracerProvider::builder()
        .with_resource(resource)
        .with_sampler(opentelemetry_sdk::trace::Sampler::TraceIdRatioBased(
            tracing_cfg.sample_ratio,
        ))
        .with_batch_exporter(exporter)
        .build();

    opentelemetry::global::set_tracer_provider(tracer_provider.clone());
    opentelemetry::global::set_text_map_propagator(TraceContextPropagator::new());

    Ok(Some(tracer_provider))
}

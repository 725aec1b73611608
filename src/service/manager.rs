//! 服务管理器模块 - 合并所有路由服务并管理 HTTP(S) 服务器的生命周期

use crate::service::container::ServiceContainer;
use crate::service::info::{ServiceInfo, public_base};
use crate::service::trace::http_trace_layer;
use anyhow::{Context, Result};
use axum::{
    Extension, Json, Router,
    extract::Request,
    middleware::{self, Next},
    response::Response,
    routing::get,
};
use axum_server::tls_rustls::RustlsConfig;
use portfolify_common::{
    TlsConfigurer, TrustedProxies, config::PortfolifyConfig, metrics::RequestTimer,
    security::ip_shield,
};
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};
use url::Url;

/// 服务管理器，负责管理多个服务的生命周期
#[derive(Debug)]
pub struct ServiceManager {
    services: Vec<ServiceContainer>,
    shutdown_tx: tokio::sync::broadcast::Sender<()>,
    config: PortfolifyConfig,
    local_addr: Option<SocketAddr>,
}

impl ServiceManager {
    pub fn new(config: PortfolifyConfig, shutdown_tx: tokio::sync::broadcast::Sender<()>) -> Self {
        Self {
            services: Vec::new(),
            shutdown_tx,
            config,
            local_addr: None,
        }
    }

    /// 添加服务到管理器
    pub fn add_service(&mut self, service: ServiceContainer) {
        info!("Adding service '{}' to manager", service.info().name);
        self.services.push(service);
    }

    /// 已添加服务的信息
    pub fn service_infos(&self) -> Vec<ServiceInfo> {
        self.services.iter().map(|s| s.info().clone()).collect()
    }

    /// 服务器实际监听的地址（启动后可用，端口 0 时为系统分配的端口）
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// 合并所有路由服务，加上 `/health`、`/metrics` 和全局中间件
    pub async fn build_app(&mut self) -> Result<Router> {
        let public_url = Url::parse(&public_base(&self.config))
            .with_context(|| "Failed to parse public URL")?;

        if let Err(e) = portfolify_common::metrics::register_metrics() {
            warn!("Prometheus metrics registration warning: {}", e);
        }

        let mut app = Router::new();
        let mut mounted = Vec::new();

        for service in &mut self.services {
            let route_prefix = service.route_prefix().to_string();
            let service_name = service.info().name.clone();

            match service.build_router().await {
                Ok(router) => {
                    info!(
                        "Adding route '{}' for service '{}'",
                        route_prefix, service_name
                    );
                    app = app.nest(&route_prefix, router);
                    mounted.push(service_name.clone());

                    let base_url = public_url
                        .join(&route_prefix)
                        .unwrap_or_else(|_| public_url.clone());
                    if let Err(e) = service.on_start(base_url).await {
                        error!("Failed to start service '{}': {:?}", service_name, e);
                    }
                }
                Err(e) => {
                    error!(
                        "Failed to build router for service '{}': {:?}",
                        service_name, e
                    );
                    service.set_error(e.to_string());
                }
            }
        }

        let health = json!({ "status": "healthy", "services": mounted });
        app = app
            .route("/health", get(move || health_handler(health.clone())))
            .route("/metrics", get(metrics_handler));

        app = app
            .layer(middleware::from_fn(track_metrics))
            .layer(http_trace_layer())
            .layer(CorsLayer::permissive());

        let shield = &self.config.rate_limit.ip_shield;
        if shield.enabled {
            match ip_shield(shield) {
                Some(layer) => {
                    info!(
                        "IP shield enabled: {} req/s, burst {}",
                        shield.per_second, shield.burst_size
                    );
                    app = app.layer(layer);
                }
                None => warn!("Invalid ip_shield configuration, shield disabled"),
            }
        }

        // 最外层注入，追踪、IP 防护和各个 handler 都能读到
        let trusted = TrustedProxies::new(self.config.rate_limit.trusted_proxies.iter().copied());
        app = app.layer(Extension(trusted));

        Ok(app)
    }

    /// 启动 HTTP(S) 服务器
    ///
    /// 开发环境优先使用 HTTP；其他环境必须配置 HTTPS。
    pub async fn start_all(&mut self) -> Result<Vec<JoinHandle<()>>> {
        let is_dev = self.config.env.eq_ignore_ascii_case("dev");

        let (bind_addr, tls_config) = match (
            is_dev,
            self.config.bind.http.as_ref(),
            self.config.bind.https.as_ref(),
        ) {
            (true, Some(http), _) => (format!("{}:{}", http.ip, http.port), None),
            (_, _, Some(https)) => {
                TlsConfigurer::install_crypto_provider();
                let server_config = TlsConfigurer::create_tls_config(&https.cert, &https.key)?;
                (
                    format!("{}:{}", https.ip, https.port),
                    Some(RustlsConfig::from_config(Arc::new(server_config))),
                )
            }
            (true, None, None) => {
                return Err(anyhow::anyhow!(
                    "No HTTP or HTTPS binding configuration found"
                ));
            }
            (false, _, None) => {
                return Err(anyhow::anyhow!(
                    "HTTPS binding configuration is required for '{}' environment",
                    self.config.env
                ));
            }
        };

        let protocol = if tls_config.is_some() { "HTTPS" } else { "HTTP" };
        info!(
            "Starting {} server with {} route services (environment: {})",
            protocol,
            self.services.len(),
            self.config.env
        );

        let addr: SocketAddr = bind_addr
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid bind address '{bind_addr}': {e}"))?;
        let app = self.build_app().await?;
        let shutdown_tx = self.shutdown_tx.clone();

        let handle = if let Some(tls_config) = tls_config {
            let server = axum_server::bind_rustls(addr, tls_config)
                .serve(app.into_make_service_with_connect_info::<SocketAddr>());
            self.local_addr = Some(addr);
            info!("{} server listening on {}", protocol, addr);

            tokio::spawn(async move {
                let mut shutdown_rx = shutdown_tx.subscribe();
                tokio::select! {
                    result = server => {
                        if let Err(e) = result {
                            error!("HTTPS server error: {}", e);
                            let _ = shutdown_tx.send(());
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        info!("HTTPS server received shutdown signal");
                    }
                }
                info!("HTTPS server stopped");
            })
        } else {
            let listener = tokio::net::TcpListener::bind(addr)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to bind to address '{addr}': {e}"))?;
            let local_addr = listener.local_addr()?;
            self.local_addr = Some(local_addr);
            info!("{} server listening on {}", protocol, local_addr);

            tokio::spawn(async move {
                let mut shutdown_rx = shutdown_tx.subscribe();
                let server = axum::serve(
                    listener,
                    app.into_make_service_with_connect_info::<SocketAddr>(),
                )
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.recv().await;
                    info!("HTTP server received shutdown signal");
                });
                if let Err(e) = server.await {
                    error!("HTTP server error: {}", e);
                    let _ = shutdown_tx.send(());
                }
                info!("HTTP server stopped");
            })
        };

        Ok(vec![handle])
    }

    /// Stop all services
    pub async fn stop_all(&mut self) -> Result<()> {
        info!("Stopping all services");

        let _ = self.shutdown_tx.send(());
        for service in &mut self.services {
            if let Err(e) = service.on_stop().await {
                warn!("Failed to stop service '{}': {}", service.info().name, e);
            }
        }

        info!("All services stopped");
        Ok(())
    }
}

async fn health_handler(body: Value) -> Json<Value> {
    Json(body)
}

/// Prometheus metrics endpoint handler
async fn metrics_handler() -> String {
    portfolify_common::metrics::export_metrics()
}

/// 记录每个请求的耗时和状态码
async fn track_metrics(request: Request, next: Next) -> Response {
    let timer = RequestTimer::new(request.method().as_str());
    let response = next.run(request).await;
    timer.observe(response.status().as_u16());
    response
}

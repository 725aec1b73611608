//! Portfolify 服务主程序
//!
//! 加载配置、初始化数据库和可观测性，然后在同一个 HTTP(S) 服务器上
//! 启动认证、租户、联系表单和内容服务

mod cli;
mod error;
mod observability;

use anyhow::Context;
use clap::Parser;
use observability::init_observability;
use portfolify::service::{
    AuthHttpService, ContactHttpService, ContentHttpService, ServiceContainer, ServiceManager,
    TenantsHttpService,
};
use portfolify_common::{ServiceContext, config::PortfolifyConfig};
use std::path::{Path, PathBuf};
use tokio::task::JoinHandle;

use tracing::{error, info};

macro_rules! bootstrap_info {
    ($($arg:tt)*) => {
        println!($($arg)*);
    };
}

macro_rules! bootstrap_error {
    ($($arg:tt)*) => {
        eprintln!($($arg)*);
    };
}

use cli::{Cli, Commands};
use error::{Error, Result};

/// Application launcher utilities
struct ApplicationLauncher;

fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Some(Commands::Test { config_file }) => {
            let config_path =
                ApplicationLauncher::find_config_file(config_file.as_ref().unwrap_or(&cli.config))?;
            ApplicationLauncher::test_config_file(&config_path)
        }
        None => {
            let config_path = ApplicationLauncher::find_config_file(&cli.config)?;

            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;

            runtime.block_on(ApplicationLauncher::run_application(&config_path))
        }
    }
}

/// 按严重程度输出配置检查结果，存在非警告问题时返回 `true`
fn report_validation_problems(errors: &[String]) -> bool {
    let mut has_critical_errors = false;
    for (i, err) in errors.iter().enumerate() {
        if err.starts_with("Warning:") {
            bootstrap_info!("  {}. ⚠️  {}", i + 1, err);
        } else {
            bootstrap_error!("  {}. ❌ {}", i + 1, err);
            has_critical_errors = true;
        }
    }
    has_critical_errors
}

impl ApplicationLauncher {
    /// Find config file with fallback locations
    fn find_config_file(provided_path: &PathBuf) -> Result<PathBuf> {
        if provided_path != Path::new("config.toml") {
            if provided_path.exists() {
                bootstrap_info!("Using provided config file: {:?}", provided_path);
                return Ok(provided_path.clone());
            }
            bootstrap_error!("Provided config file not found: {:?}", provided_path);
            return Err(Error::custom(format!(
                "Config file not found: {provided_path:?}"
            )));
        }

        let fallback_paths = [
            PathBuf::from("config.toml"),
            PathBuf::from("/etc/portfolify/config.toml"),
        ];

        bootstrap_info!("Searching for config file in default locations...");
        for path in &fallback_paths {
            if path.exists() {
                bootstrap_info!("Found config file: {:?}", path);
                return Ok(path.clone());
            }
            bootstrap_info!("Config not found at: {:?}", path);
        }

        bootstrap_error!("No configuration file found!");
        bootstrap_error!("Please create a config file in one of these locations:");
        for (i, path) in fallback_paths.iter().enumerate() {
            bootstrap_error!("  {}. {:?}", i + 1, path);
        }
        bootstrap_error!("Or specify a custom path with: portfolify --config <path>");

        Err(Error::custom(
            "No configuration file found. Please create one or specify path with --config",
        ))
    }

    /// 测试配置文件是否有效
    fn test_config_file(config_path: &Path) -> Result<()> {
        let config = PortfolifyConfig::from_file(config_path).map_err(|e| {
            bootstrap_error!("❌ 配置文件解析失败: {}", e);
            Error::service_validation(format!("配置解析失败: {e}"))
        })?;
        bootstrap_info!("✅ 配置文件解析成功: {:?}", config_path);

        if let Err(errors) = config.validate() {
            bootstrap_info!("配置验证发现问题:");
            if report_validation_problems(&errors) {
                bootstrap_error!("❌ 配置验证失败");
                return Err(Error::service_validation("配置验证失败"));
            }
        }

        bootstrap_info!("✅ 配置验证通过");
        Ok(())
    }

    /// 运行应用程序的主入口
    async fn run_application(config_path: &Path) -> Result<()> {
        bootstrap_info!("📄 加载配置文件: {:?}", config_path);

        let config = match PortfolifyConfig::from_file(config_path) {
            Ok(config) => config,
            Err(e) => {
                bootstrap_error!("❌ 配置加载失败: {}", e);
                return Err(Error::custom(format!("配置加载失败: {e}")));
            }
        };

        if let Err(errors) = config.validate() {
            bootstrap_error!("配置验证发现问题:");
            if report_validation_problems(&errors) {
                return Err(Error::service_validation("配置验证失败，请修复上述错误"));
            }
        }

        if !config.sqlite_path.exists() {
            std::fs::create_dir_all(&config.sqlite_path).with_context(|| {
                format!(
                    "Failed to create SQLite data directory: {}",
                    config.sqlite_path.display()
                )
            })?;
        }

        let _observability_guard = init_observability(&config)?;

        Self::run_services(config).await
    }

    async fn run_services(config: PortfolifyConfig) -> Result<()> {
        info!("🚀 启动 Portfolify 服务");

        let ctx = ServiceContext::from_config(&config)
            .await
            .map_err(|e| Error::service_startup(format!("数据库初始化失败: {e:#}")))?;
        info!("✅ 数据库初始化完成: {}", config.sqlite_path.display());

        let (shutdown_tx, _) = tokio::sync::broadcast::channel::<()>(10);
        setup_ctrl_c_handler(shutdown_tx.clone()).await;

        let mut service_manager = Self::create_service_manager(&config, &ctx, shutdown_tx.clone());
        let handles: Vec<JoinHandle<()>> = service_manager
            .start_all()
            .await
            .map_err(|e| Error::service_startup(format!("{e:#}")))?;

        Self::display_service_info(&config, &service_manager);

        for handle in handles {
            if let Err(e) = handle.await {
                error!("Service task terminated unexpectedly: {}", e);
                let _ = shutdown_tx.send(());
            }
        }
        service_manager.stop_all().await?;
        ctx.db.close().await;

        info!("🛑 所有服务已安全关闭");
        Ok(())
    }

    fn create_service_manager(
        config: &PortfolifyConfig,
        ctx: &ServiceContext,
        shutdown_tx: tokio::sync::broadcast::Sender<()>,
    ) -> ServiceManager {
        info!("📊 计划启动的服务:");
        let mut service_manager = ServiceManager::new(config.clone(), shutdown_tx);

        if config.is_auth_enabled() {
            info!("  - Auth Service (/auth)");
            let service = AuthHttpService::new(ctx.clone(), config);
            service_manager.add_service(ServiceContainer::auth(service));
        }

        if config.is_tenants_enabled() {
            info!("  - Tenants Service (/tenants)");
            let service = TenantsHttpService::new(ctx.clone(), config);
            service_manager.add_service(ServiceContainer::tenants(service));
        }

        if config.is_contact_enabled() {
            info!("  - Contact Service (/contact)");
            let service = ContactHttpService::new(ctx.clone(), config);
            service_manager.add_service(ServiceContainer::contact(service));
        }

        if config.is_content_enabled() {
            info!("  - Content Service (/content)");
            let service = ContentHttpService::new(ctx.clone(), config);
            service_manager.add_service(ServiceContainer::content(service));
        }

        service_manager
    }

    fn display_service_info(config: &PortfolifyConfig, manager: &ServiceManager) {
        info!("✅ 所有服务已启动 (environment: {})", config.env);
        if let Some(addr) = manager.local_addr() {
            info!("📡 服务器监听在: {}", addr);
        }

        info!("🔧 可用的API端点:");
        for service in manager.service_infos() {
            info!("  - {} -> {}", service.name, service.url());
        }
        info!("  - /health");
        info!("  - /metrics");
    }
}

/// 设置Ctrl-C信号处理程序
async fn setup_ctrl_c_handler(shutdown_tx: tokio::sync::broadcast::Sender<()>) {
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("无法监听Ctrl-C信号: {}", e);
            return;
        }
        info!("收到Ctrl-C信号，开始优雅关闭...");
        let _ = shutdown_tx.send(());
    });
}
